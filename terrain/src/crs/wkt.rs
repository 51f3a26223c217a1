//! Well-Known-Text tokenizer and tree.
//!
//! Both WKT1 (`PROJCS[...]`) and WKT2 (`PROJCRS[...]`) share the same
//! grammar: a keyword followed by a bracketed, comma-separated list of
//! quoted strings, numbers, bare identifiers and nested nodes. Round
//! brackets are accepted in place of square ones.

use crate::TerrainError;
use std::{iter::Peekable, str::Chars};

/// One `KEYWORD[args...]` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub keyword: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    /// Unquoted enumeration value such as `EAST` in `AXIS["x",EAST]`.
    Ident(String),
    Node(Node),
}

impl Node {
    /// Returns the first child node whose keyword is one of `keywords`.
    pub fn child(&self, keywords: &[&str]) -> Option<&Node> {
        self.children()
            .find(|node| keywords.iter().any(|k| node.keyword.eq_ignore_ascii_case(k)))
    }

    /// Returns every child node.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.args.iter().filter_map(|arg| match arg {
            Value::Node(node) => Some(node),
            _ => None,
        })
    }

    /// Depth-first search for a node whose keyword is one of
    /// `keywords`, `self` included.
    pub fn find(&self, keywords: &[&str]) -> Option<&Node> {
        if keywords.iter().any(|k| self.keyword.eq_ignore_ascii_case(k)) {
            return Some(self);
        }
        self.children().find_map(|child| child.find(keywords))
    }

    /// Returns the first quoted string argument, conventionally the
    /// element's name.
    pub fn name(&self) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Returns the `n`th numeric argument.
    pub fn num(&self, n: usize) -> Option<f64> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                Value::Num(v) => Some(*v),
                _ => None,
            })
            .nth(n)
    }

    pub fn is(&self, keyword: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(keyword)
    }
}

/// Parses `text` into its root node.
pub fn parse(text: &str) -> Result<Node, TerrainError> {
    let mut parser = Parser {
        chars: text.chars().peekable(),
    };
    let node = parser.node()?;
    parser.skip_ws();
    match parser.chars.next() {
        None => Ok(node),
        Some(c) => Err(err(format!("trailing {c:?} after WKT"))),
    }
}

fn err(msg: String) -> TerrainError {
    TerrainError::CoordinateSystem(msg)
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_alphanumeric() || *c == '_') {
            word.push(c);
        }
        word
    }

    fn node(&mut self) -> Result<Node, TerrainError> {
        self.skip_ws();
        let keyword = self.word();
        if keyword.is_empty() {
            return Err(err("expected a WKT keyword".to_owned()));
        }
        self.skip_ws();
        let close = match self.chars.next() {
            Some('[') => ']',
            Some('(') => ')',
            other => return Err(err(format!("expected '[' after {keyword}, got {other:?}"))),
        };
        let mut args = Vec::new();
        loop {
            self.skip_ws();
            if args.is_empty() && self.chars.next_if_eq(&close).is_some() {
                break;
            }
            args.push(self.value()?);
            self.skip_ws();
            match self.chars.next() {
                Some(',') => continue,
                Some(c) if c == close => break,
                other => {
                    return Err(err(format!(
                        "expected ',' or {close:?} in {keyword}, got {other:?}"
                    )))
                }
            }
        }
        Ok(Node { keyword, args })
    }

    fn value(&mut self) -> Result<Value, TerrainError> {
        match self.chars.peek().copied() {
            Some('"') => self.string().map(Value::Str),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                self.number().map(Value::Num)
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let mut lookahead = self.chars.clone();
                while lookahead
                    .next_if(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .is_some()
                {}
                while lookahead.next_if(|c| c.is_whitespace()).is_some() {}
                if matches!(lookahead.peek(), Some('[' | '(')) {
                    self.node().map(Value::Node)
                } else {
                    Ok(Value::Ident(self.word()))
                }
            }
            other => Err(err(format!("unexpected {other:?} in WKT"))),
        }
    }

    fn string(&mut self) -> Result<String, TerrainError> {
        self.chars.next();
        let mut s = String::new();
        loop {
            match self.chars.next() {
                // A doubled quote is an escaped quote.
                Some('"') if self.chars.next_if_eq(&'"').is_some() => s.push('"'),
                Some('"') => return Ok(s),
                Some(c) => s.push(c),
                None => return Err(err("unterminated string in WKT".to_owned())),
            }
        }
    }

    fn number(&mut self) -> Result<f64, TerrainError> {
        let mut s = String::new();
        while let Some(c) = self
            .chars
            .next_if(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            s.push(c);
        }
        s.parse()
            .map_err(|_| err(format!("invalid number {s:?} in WKT")))
    }
}
