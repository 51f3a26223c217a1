//! Element-wise forms of the [`math`](crate::math) functions.
//!
//! Each argument is an [`Operand`]: either a slice or a scalar which is
//! broadcast against the slices. All slice arguments of one call must
//! have the same length, which is the length of the result. A call
//! with only scalar arguments returns one value.
//!
//! ```
//! use terrain::math::batch;
//!
//! let lats = [43.2, 43.5, 43.8];
//! let longs = [1.2, 1.5, 1.8];
//! let distances =
//!     batch::distance_between_wgs84_coordinates(43.2, 1.2, &lats[..], &longs[..]).unwrap();
//! assert_eq!(distances.len(), 3);
//! assert_eq!(distances[0], 0.0);
//! ```

use crate::TerrainError;
use num_traits::{Float, FromPrimitive};

/// One argument of a batch function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand<'a, T> {
    /// Broadcast to every element.
    Scalar(T),
    /// One value per element.
    Slice(&'a [T]),
}

impl<'a, T: Copy> Operand<'a, T> {
    fn len(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Slice(values) => Some(values.len()),
        }
    }

    fn get(&self, i: usize) -> T {
        match self {
            Self::Scalar(value) => *value,
            Self::Slice(values) => values[i],
        }
    }
}

macro_rules! impl_scalar_operand {
    ($($t:ty),*) => {
        $(
            impl<'a> From<$t> for Operand<'a, $t> {
                fn from(value: $t) -> Self {
                    Self::Scalar(value)
                }
            }
        )*
    };
}

impl_scalar_operand!(f32, f64);

impl<'a, T> From<&'a [T]> for Operand<'a, T> {
    fn from(values: &'a [T]) -> Self {
        Self::Slice(values)
    }
}

impl<'a, T> From<&'a Vec<T>> for Operand<'a, T> {
    fn from(values: &'a Vec<T>) -> Self {
        Self::Slice(values)
    }
}

/// Returns the common length of `operands`.
fn broadcast_len<T: Copy>(operands: &[Operand<'_, T>]) -> Result<usize, TerrainError> {
    let mut len = None;
    for operand in operands {
        match (len, operand.len()) {
            (_, None) => (),
            (None, Some(n)) => len = Some(n),
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(TerrainError::Shape { expected, actual })
            }
            (Some(_), Some(_)) => (),
        }
    }
    Ok(len.unwrap_or(1))
}

fn map2<'a, T, F>(
    a: impl Into<Operand<'a, T>>,
    b: impl Into<Operand<'a, T>>,
    f: F,
) -> Result<Vec<T>, TerrainError>
where
    T: Copy + 'a,
    F: Fn(T, T) -> T,
{
    let (a, b) = (a.into(), b.into());
    let len = broadcast_len(&[a, b])?;
    Ok((0..len).map(|i| f(a.get(i), b.get(i))).collect())
}

fn map4<'a, T, F>(
    a: impl Into<Operand<'a, T>>,
    b: impl Into<Operand<'a, T>>,
    c: impl Into<Operand<'a, T>>,
    d: impl Into<Operand<'a, T>>,
    f: F,
) -> Result<Vec<T>, TerrainError>
where
    T: Copy + 'a,
    F: Fn(T, T, T, T) -> T,
{
    let (a, b, c, d) = (a.into(), b.into(), c.into(), d.into());
    let len = broadcast_len(&[a, b, c, d])?;
    Ok((0..len)
        .map(|i| f(a.get(i), b.get(i), c.get(i), d.get(i)))
        .collect())
}

/// Element-wise [`half_central_angle`](super::half_central_angle).
pub fn half_central_angle<'a, T: Float + 'a>(
    lat1: impl Into<Operand<'a, T>>,
    long1: impl Into<Operand<'a, T>>,
    lat2: impl Into<Operand<'a, T>>,
    long2: impl Into<Operand<'a, T>>,
) -> Result<Vec<T>, TerrainError> {
    map4(lat1, long1, lat2, long2, super::half_central_angle)
}

/// Element-wise
/// [`distance_between_wgs84_coordinates`](super::distance_between_wgs84_coordinates).
pub fn distance_between_wgs84_coordinates<'a, T: Float + FromPrimitive + 'a>(
    lat1: impl Into<Operand<'a, T>>,
    long1: impl Into<Operand<'a, T>>,
    lat2: impl Into<Operand<'a, T>>,
    long2: impl Into<Operand<'a, T>>,
) -> Result<Vec<T>, TerrainError> {
    map4(lat1, long1, lat2, long2, super::distance_between_wgs84_coordinates)
}

/// Element-wise [`overhead_height`](super::overhead_height).
pub fn overhead_height<'a, T: Float + 'a>(
    angle: impl Into<Operand<'a, T>>,
    radius: impl Into<Operand<'a, T>>,
) -> Result<Vec<T>, TerrainError> {
    map2(angle, radius, super::overhead_height)
}

/// Element-wise [`quadratic_mean`](super::quadratic_mean).
pub fn quadratic_mean<'a, T: Float + 'a>(
    a: impl Into<Operand<'a, T>>,
    b: impl Into<Operand<'a, T>>,
) -> Result<Vec<T>, TerrainError> {
    map2(a, b, super::quadratic_mean)
}

#[cfg(test)]
mod tests {
    use super::{
        distance_between_wgs84_coordinates, half_central_angle, overhead_height, quadratic_mean,
        Operand,
    };
    use crate::{constants::EARTH_RADIUS, math, TerrainError};
    use approx::assert_relative_eq;

    #[test]
    fn test_matches_scalar_form() {
        let lats = vec![43.2, 43.5, 43.8];
        let longs = vec![1.2, 1.5, 1.8];
        let distances = distance_between_wgs84_coordinates(43.2, 1.2, &lats, &longs).unwrap();
        for ((d, lat), long) in distances.iter().zip(&lats).zip(&longs) {
            assert_relative_eq!(
                *d,
                math::distance_between_wgs84_coordinates(43.2, 1.2, *lat, *long)
            );
        }

        let angles = [0.0, 0.000_926_29, 0.01];
        let heights = overhead_height(&angles[..], EARTH_RADIUS).unwrap();
        assert_eq!(heights[0], 0.0);
        assert_relative_eq!(heights[1], math::overhead_height(0.000_926_29, EARTH_RADIUS));
    }

    #[test]
    fn test_all_scalars() {
        assert_eq!(quadratic_mean(3.0_f32, 3.0).unwrap(), vec![3.0]);
        let hca = half_central_angle(0.0_f64, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(hca, vec![0.0]);
    }

    #[test]
    fn test_mismatched_slices() {
        let a = [1.0, 2.0];
        let b = [1.0, 2.0, 3.0];
        assert!(matches!(
            quadratic_mean(Operand::Slice(&a[..]), Operand::Slice(&b[..])),
            Err(TerrainError::Shape {
                expected: 2,
                actual: 3
            })
        ));
    }
}
