use num_traits::{Float, FromPrimitive};

/// Returns `n` evenly spaced values from `start` to `end`.
///
/// The last value is exactly `end`, and `n == 1` yields only `start`.
pub fn linspace<T>(start: T, end: T, n: usize) -> impl Iterator<Item = T>
where
    T: Float + FromPrimitive,
{
    let last = n.saturating_sub(1);
    let steps = T::from_usize(last.max(1)).unwrap_or_else(T::one);
    let delta = end - start;
    (0..n).map(move |i| {
        if i == last && i != 0 {
            end
        } else {
            let i = T::from_usize(i).unwrap_or_else(T::zero);
            start + delta * i / steps
        }
    })
}
