//! Fixed-point scales and gate defaults

/// Milliseconds of arc per degree
pub const ANGLE_SCALE: i64 = 3_600_000;

/// Milliseconds of arc per minute of arc
pub const MINUTE_SCALE: i64 = 60_000;

/// Milliseconds of arc per fractional-minute digit unit
pub const FRACTION_SCALE: i64 = 6;

/// Decimeters per meter
pub const ALTITUDE_SCALE: i64 = 10;

/// Centi-units per DOP unit
pub const DOP_SCALE: i64 = 100;

/// Degree digits in a latitude field
pub const LATITUDE_DEGREE_DIGITS: usize = 2;

/// Degree digits in a longitude field
pub const LONGITUDE_DEGREE_DIGITS: usize = 3;

/// Minute digits following the degrees
pub const MINUTE_DIGITS: usize = 2;

/// Expected raw latitude width (ddmm.ffff)
pub const DEFAULT_LATITUDE_WIDTH: usize = 9;

/// Expected raw longitude width (dddmm.ffff)
pub const DEFAULT_LONGITUDE_WIDTH: usize = 10;

/// Highest admitted PDOP in centi-units (2.10)
pub const DEFAULT_PDOP_CUTOFF: i64 = 210;

/// Status character of a valid recommended-minimum sentence
pub const VALID_STATUS: &str = "A";
