/// A GDAL-style affine geo-transform.
///
/// `[origin_x, pixel_width, rotation_x, origin_y, rotation_y,
/// pixel_height]`, mapping pixel `(col, row)` to projected
///
/// ```text
/// x = origin_x + col * pixel_width + row * rotation_x
/// y = origin_y + col * rotation_y + row * pixel_height
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// Returns a transform without rotation terms.
    pub const fn north_up(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        Self([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    pub fn origin_x(&self) -> f64 {
        self.0[0]
    }

    pub fn pixel_width(&self) -> f64 {
        self.0[1]
    }

    pub fn rotation_x(&self) -> f64 {
        self.0[2]
    }

    pub fn origin_y(&self) -> f64 {
        self.0[3]
    }

    pub fn rotation_y(&self) -> f64 {
        self.0[4]
    }

    pub fn pixel_height(&self) -> f64 {
        self.0[5]
    }

    /// Returns `true` if neither rotation term is set.
    pub fn is_north_up(&self) -> bool {
        self.rotation_x() == 0.0 && self.rotation_y() == 0.0
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }
}
