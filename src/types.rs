//! Common value types and traits for box-shaped cargo.
//!
//! Every length in this crate uses one linear unit (centimeters in the
//! default catalog) and every weight one mass unit (kilograms).

use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Cubic centimeters per cubic meter, used for CBM conversions.
pub const CM3_PER_M3: f64 = 1_000_000.0;

/// Three axis-aligned extents: width, height (vertical) and depth.
///
/// For containers these are the internal dimensions along the fixed
/// container axes. For items they are the nominal dimensions before any
/// orientation is applied.
///
/// # Examples
/// ```
/// use container_fit::types::Dims;
///
/// let dims = Dims::new(100.0, 50.0, 20.0);
/// assert_eq!(dims.volume(), 100_000.0);
/// assert!((dims.cbm() - 0.1).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"width": 589.0, "height": 239.0, "depth": 233.0}))]
pub struct Dims {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Dims {
    /// Creates a new set of dimensions.
    #[inline]
    pub const fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Product of all three extents.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.width * self.height * self.depth
    }

    /// Volume expressed in cubic meters, assuming centimeter extents.
    #[inline]
    pub fn cbm(&self) -> f64 {
        self.volume() / CM3_PER_M3
    }

    /// Component-wise `<=` without tolerance.
    #[inline]
    pub fn fits_within(&self, container: &Self) -> bool {
        self.width <= container.width
            && self.height <= container.height
            && self.depth <= container.depth
    }
}

impl From<(f64, f64, f64)> for Dims {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }
}

impl std::fmt::Display for Dims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {} x {}", self.width, self.height, self.depth)
    }
}

/// Trait for objects with box-shaped extent.
pub trait Dimensional {
    /// Returns the dimensions of the object.
    fn dimensions(&self) -> Dims;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }

    /// Calculates the volume in cubic meters.
    fn cbm(&self) -> f64 {
        self.dimensions().cbm()
    }
}

/// Scalar validation shared by containers and item types.
pub mod validation {
    use super::Dims;

    /// Validates a single dimension: must be positive and finite.
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a unit weight. Zero is allowed and means "weightless".
    pub fn validate_weight(value: f64) -> Result<(), String> {
        if value.is_nan() {
            return Err("Weight must not be NaN".to_string());
        }
        if value.is_infinite() {
            return Err("Weight must not be infinite".to_string());
        }
        if value < 0.0 {
            return Err(format!("Weight must not be negative, got: {}", value));
        }
        Ok(())
    }

    /// Validates a weight limit, which unlike a unit weight must be positive.
    pub fn validate_weight_limit(value: f64) -> Result<(), String> {
        validate_weight(value)?;
        if value == 0.0 {
            return Err("Weight limit must be positive, got: 0".to_string());
        }
        Ok(())
    }

    /// Validates all three extents.
    pub fn validate_dims(dims: &Dims, prefix: &str) -> Result<(), String> {
        validate_dimension(dims.width, &format!("{prefix}width"))?;
        validate_dimension(dims.height, &format!("{prefix}height"))?;
        validate_dimension(dims.depth, &format!("{prefix}depth"))?;
        Ok(())
    }
}
