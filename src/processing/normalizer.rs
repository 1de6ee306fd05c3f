//! Exact fixed-point normalization of raw sentence fields
//!
//! Every conversion works on the textual digit groups with integer
//! arithmetic. Floating values are derived from the fixed-point result
//! only, so identical raw text always yields bit-identical values.

use thiserror::Error;

use crate::core::{
    MeasurementRecord, Quantity, ALTITUDE_SCALE, ANGLE_SCALE, DOP_SCALE, FRACTION_SCALE,
    LATITUDE_DEGREE_DIGITS, LONGITUDE_DEGREE_DIGITS, MINUTE_DIGITS, MINUTE_SCALE,
};

/// Reasons a raw field cannot be normalized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("empty {quantity} field")]
    Empty { quantity: Quantity },
    #[error("non-digit characters in {quantity} field '{text}'")]
    InvalidDigits { quantity: Quantity, text: String },
    #[error("{quantity} field '{text}' does not match the expected layout")]
    WrongShape { quantity: Quantity, text: String },
    #[error("{quantity} field '{text}' overflows the fixed-point range")]
    Overflow { quantity: Quantity, text: String },
}

/// Converts raw text into canonical text, fixed-point and natural values
pub struct ValueNormalizer;

impl ValueNormalizer {
    /// Normalize a `ddmm.ffff` latitude with its N/S hemisphere
    pub fn latitude(raw: &str, hemisphere: Option<&str>) -> Result<MeasurementRecord, NormalizeError> {
        Self::sexagesimal(Quantity::Latitude, raw, hemisphere, LATITUDE_DEGREE_DIGITS)
    }

    /// Normalize a `dddmm.ffff` longitude with its E/W hemisphere
    pub fn longitude(raw: &str, hemisphere: Option<&str>) -> Result<MeasurementRecord, NormalizeError> {
        Self::sexagesimal(Quantity::Longitude, raw, hemisphere, LONGITUDE_DEGREE_DIGITS)
    }

    /// Normalize an altitude in meters to decimeters
    pub fn altitude(raw: &str) -> Result<MeasurementRecord, NormalizeError> {
        Self::signed_decimal(Quantity::Altitude, raw, ALTITUDE_SCALE)
    }

    /// Normalize a dilution of precision to centi-units
    pub fn dop(raw: &str) -> Result<MeasurementRecord, NormalizeError> {
        Self::signed_decimal(Quantity::Dop, raw, DOP_SCALE)
    }

    /// Whether a hemisphere letter makes the coordinate negative
    pub fn is_negative_hemisphere(hemisphere: Option<&str>) -> bool {
        matches!(hemisphere, Some("S") | Some("W"))
    }

    fn sexagesimal(
        quantity: Quantity,
        raw: &str,
        hemisphere: Option<&str>,
        degree_digits: usize,
    ) -> Result<MeasurementRecord, NormalizeError> {
        if raw.is_empty() {
            return Err(NormalizeError::Empty { quantity });
        }

        let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
        if whole.len() != degree_digits + MINUTE_DIGITS {
            return Err(NormalizeError::WrongShape {
                quantity,
                text: raw.to_string(),
            });
        }

        // ASCII only, so the byte split below lands on char boundaries
        if !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NormalizeError::InvalidDigits {
                quantity,
                text: raw.to_string(),
            });
        }
        let degrees = digits(quantity, raw, &whole[..degree_digits])?;
        let minutes = digits(quantity, raw, &whole[degree_digits..])?;
        let fraction = if fraction.is_empty() { 0 } else { digits(quantity, raw, fraction)? };

        // Fraction digits are taken as ten-thousandths of a minute
        let magnitude = degrees
            .checked_mul(ANGLE_SCALE)
            .and_then(|v| v.checked_add(minutes.checked_mul(MINUTE_SCALE)?))
            .and_then(|v| v.checked_add(fraction.checked_mul(FRACTION_SCALE)?))
            .ok_or_else(|| NormalizeError::Overflow {
                quantity,
                text: raw.to_string(),
            })?;

        let negative = Self::is_negative_hemisphere(hemisphere);
        let fixed_point_value = if negative { -magnitude } else { magnitude };
        let canonical_text = if negative { format!("-{}", raw) } else { raw.to_string() };

        Ok(MeasurementRecord::new(
            canonical_text,
            fixed_point_value,
            fixed_point_value as f64 / ANGLE_SCALE as f64,
        ))
    }

    fn signed_decimal(quantity: Quantity, raw: &str, scale: i64) -> Result<MeasurementRecord, NormalizeError> {
        let (negative, body) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        if body.is_empty() || body == "." {
            return Err(NormalizeError::Empty { quantity });
        }

        let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
        let whole = if whole.is_empty() { 0 } else { digits(quantity, raw, whole)? };
        let fraction = if fraction.is_empty() { 0 } else { digits(quantity, raw, fraction)? };

        // Fraction digits are added as-is, without aligning to the scale
        let magnitude = whole
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(|| NormalizeError::Overflow {
                quantity,
                text: raw.to_string(),
            })?;
        let fixed_point_value = if negative { -magnitude } else { magnitude };

        Ok(MeasurementRecord::new(
            raw.to_string(),
            fixed_point_value,
            fixed_point_value as f64 / scale as f64,
        ))
    }
}

/// Parse a run of ASCII digits as a non-negative integer
fn digits(quantity: Quantity, raw: &str, group: &str) -> Result<i64, NormalizeError> {
    if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NormalizeError::InvalidDigits {
            quantity,
            text: raw.to_string(),
        });
    }

    group.bytes().try_fold(0i64, |acc, b| {
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(i64::from(b - b'0')))
            .ok_or_else(|| NormalizeError::Overflow {
                quantity,
                text: raw.to_string(),
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_reference_value() {
        let record = ValueNormalizer::latitude("4807.038", Some("N")).unwrap();
        assert_eq!(record.fixed_point_value, 48 * 3_600_000 + 7 * 60_000 + 38 * 6);
        assert_eq!(record.fixed_point_value, 173_220_228);
        assert_eq!(record.canonical_text, "4807.038");
        assert!((record.natural_value - 48.1167300).abs() < 1e-7);
    }

    #[test]
    fn test_latitude_four_fraction_digits() {
        let record = ValueNormalizer::latitude("4807.0380", Some("N")).unwrap();
        assert_eq!(record.fixed_point_value, 173_222_280);
        assert!((record.natural_value - 48.1173).abs() < 1e-9);
    }

    #[test]
    fn test_southern_latitude_is_negative() {
        let record = ValueNormalizer::latitude("3352.1234", Some("S")).unwrap();
        assert_eq!(record.canonical_text, "-3352.1234");
        assert_eq!(record.fixed_point_value, -(33 * 3_600_000 + 52 * 60_000 + 1234 * 6));
        assert!(record.natural_value < 0.0);
    }

    #[test]
    fn test_longitude_hemispheres() {
        let east = ValueNormalizer::longitude("01131.0000", Some("E")).unwrap();
        assert_eq!(east.canonical_text, "01131.0000");
        assert_eq!(east.fixed_point_value, 11 * 3_600_000 + 31 * 60_000);
        assert!((east.natural_value - 11.5166666667).abs() < 1e-9);

        let west = ValueNormalizer::longitude("01131.0000", Some("W")).unwrap();
        assert_eq!(west.canonical_text, "-01131.0000");
        assert_eq!(west.fixed_point_value, -east.fixed_point_value);
        assert_eq!(west.natural_value, -east.natural_value);
    }

    #[test]
    fn test_missing_hemisphere_is_positive() {
        let record = ValueNormalizer::longitude("12000.0000", None).unwrap();
        assert!(record.fixed_point_value > 0);
        assert!(!ValueNormalizer::is_negative_hemisphere(Some("N")));
        assert!(!ValueNormalizer::is_negative_hemisphere(Some("E")));
    }

    #[test]
    fn test_malformed_coordinates() {
        assert!(matches!(
            ValueNormalizer::latitude("", Some("N")),
            Err(NormalizeError::Empty { .. })
        ));
        assert!(matches!(
            ValueNormalizer::latitude("807.0380", Some("N")),
            Err(NormalizeError::WrongShape { .. })
        ));
        assert!(matches!(
            ValueNormalizer::latitude("48x7.0380", Some("N")),
            Err(NormalizeError::InvalidDigits { .. })
        ));
        assert!(matches!(
            ValueNormalizer::longitude("01131.00a0", Some("E")),
            Err(NormalizeError::InvalidDigits { .. })
        ));
    }

    #[test]
    fn test_altitude_conversion() {
        let record = ValueNormalizer::altitude("545.4").unwrap();
        assert_eq!(record.canonical_text, "545.4");
        assert_eq!(record.fixed_point_value, 5454);
        assert!((record.natural_value - 545.4).abs() < 1e-9);

        let whole = ValueNormalizer::altitude("12").unwrap();
        assert_eq!(whole.fixed_point_value, 120);
    }

    #[test]
    fn test_negative_altitude_keeps_sign_on_fraction() {
        let record = ValueNormalizer::altitude("-12.3").unwrap();
        assert_eq!(record.canonical_text, "-12.3");
        assert_eq!(record.fixed_point_value, -123);

        let small = ValueNormalizer::altitude("-0.5").unwrap();
        assert_eq!(small.fixed_point_value, -5);
        assert!((small.natural_value + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_dop_conversion() {
        let record = ValueNormalizer::dop("1.50").unwrap();
        assert_eq!(record.fixed_point_value, 150);
        assert!((record.natural_value - 1.5).abs() < 1e-12);

        let cutoff = ValueNormalizer::dop("2.10").unwrap();
        assert_eq!(cutoff.fixed_point_value, 210);
    }

    #[test]
    fn test_dop_fraction_is_not_aligned() {
        // A single fraction digit is read as centi-units
        let record = ValueNormalizer::dop("2.1").unwrap();
        assert_eq!(record.fixed_point_value, 201);
    }

    #[test]
    fn test_malformed_decimals() {
        assert!(ValueNormalizer::altitude("").is_err());
        assert!(ValueNormalizer::altitude("-").is_err());
        assert!(ValueNormalizer::altitude("1.2.3").is_err());
        assert!(ValueNormalizer::dop("abc").is_err());
        assert!(matches!(
            ValueNormalizer::dop("99999999999999999999.0"),
            Err(NormalizeError::Overflow { .. })
        ));
    }

    #[test]
    fn test_repeated_input_is_bit_identical() {
        let a = ValueNormalizer::latitude("5130.1234", Some("N")).unwrap();
        let b = ValueNormalizer::latitude("5130.1234", Some("N")).unwrap();
        assert_eq!(a.natural_value.to_bits(), b.natural_value.to_bits());
        assert_eq!(a, b);
    }
}
