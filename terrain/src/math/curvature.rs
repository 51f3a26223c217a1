use num_traits::Float;

/// Returns `sqrt((a² + b²) / 2)`.
pub fn quadratic_mean<T: Float>(a: T, b: T) -> T {
    let two = T::one() + T::one();
    ((a * a + b * b) / two).sqrt()
}

/// Returns the height of the circular segment cut by `angle` (radians)
/// on a circle of `radius`: `2 r sin²(angle / 2)`.
///
/// This is how far the Earth's surface bulges above the chord between
/// two points `angle` apart.
pub fn overhead_height<T: Float>(angle: T, radius: T) -> T {
    let two = T::one() + T::one();
    let s = (angle / two).sin();
    two * radius * s * s
}
