// Dimensioned values: a float with an optional Unit.
//
// A value without a unit is a plain scalar. It adds to anything as if it
// were in the other operand's unit and multiplies as dimensionless.

use std::fmt;
use std::str::FromStr;

use crate::dim::error::UnitError;
use crate::dim::registry::parse_number;
use crate::dim::unit::Unit;

/// Relative tolerance used when neither side declares a precision.
const SCALAR_RTOL: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Quantity {
    value: f64,
    unit: Option<Unit>,
}

impl Quantity {
    pub fn new(value: f64, unit: Option<Unit>) -> Self {
        Self { value, unit }
    }

    pub fn scalar(value: f64) -> Self {
        Self { value, unit: None }
    }

    pub fn with_unit(value: f64, spec: &str) -> Result<Self, UnitError> {
        Ok(Self {
            value,
            unit: Some(Unit::new(spec)?),
        })
    }

    /// Parse `"VALUE UNIT"` or a bare number.
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let text = text.trim();
        match text.split_once(char::is_whitespace) {
            None => parse_number(text)
                .map(Self::scalar)
                .ok_or_else(|| UnitError::Malformed(format!("'{}' is not a number", text))),
            Some((number, spec)) => {
                let value = parse_number(number).ok_or_else(|| {
                    UnitError::Malformed(format!("'{}' is not a number in '{}'", number, text))
                })?;
                Self::with_unit(value, spec.trim())
            }
        }
    }

    /// Parse `text` and apply `unit`, which is only allowed when `text` has none.
    pub fn from_parts(text: &str, unit: Option<&str>) -> Result<Self, UnitError> {
        let parsed = Self::parse(text)?;
        match unit {
            None => Ok(parsed),
            Some(spec) => {
                if parsed.unit.is_some() {
                    return Err(UnitError::Malformed(format!(
                        "'{}' already has a unit, cannot also apply '{}'",
                        text.trim(),
                        spec
                    )));
                }
                Self::with_unit(parsed.value, spec)
            }
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    pub fn unit_name(&self) -> Option<&str> {
        self.unit.as_ref().map(Unit::name)
    }

    pub fn add(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        self.combine_additive(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        self.combine_additive(other, |a, b| a - b)
    }

    // The right operand is rescaled by ratio only; its offset is not applied.
    fn combine_additive(
        &self,
        other: &Quantity,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<Quantity, UnitError> {
        match (&self.unit, &other.unit) {
            (Some(a), Some(b)) => {
                a.ensure_matches(Some(b), false)?;
                let rhs = other.value / a.scale() * b.scale();
                Ok(Quantity::new(op(self.value, rhs), Some(a.clone())))
            }
            _ => Ok(Quantity::new(
                op(self.value, other.value),
                self.unit.clone().or_else(|| other.unit.clone()),
            )),
        }
    }

    pub fn mul(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        let unit = self.combine_units(other, Unit::multiply)?;
        Ok(Quantity::new(self.value * other.value, unit))
    }

    pub fn div(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        let unit = self.combine_units(other, Unit::divide)?;
        Ok(Quantity::new(self.value / other.value, unit))
    }

    pub fn floor_div(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        let unit = self.combine_units(other, Unit::divide)?;
        Ok(Quantity::new((self.value / other.value).floor(), unit))
    }

    /// Floored modulo: the result takes the sign of the divisor.
    pub fn rem(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        let unit = self.combine_units(other, Unit::divide)?;
        let r = self.value % other.value;
        let value = if r != 0.0 && (r < 0.0) != (other.value < 0.0) {
            r + other.value
        } else {
            r
        };
        Ok(Quantity::new(value, unit))
    }

    fn combine_units(
        &self,
        other: &Quantity,
        op: impl Fn(&Unit, &Unit) -> Result<Unit, UnitError>,
    ) -> Result<Option<Unit>, UnitError> {
        match (&self.unit, &other.unit) {
            (None, None) => Ok(None),
            (Some(u), None) | (None, Some(u)) => Ok(Some(u.clone())),
            (Some(a), Some(b)) => op(a, b).map(Some),
        }
    }

    /// Raise to a power given as a quantity; it must be a unitless integer.
    pub fn pow(&self, exponent: &Quantity) -> Result<Quantity, UnitError> {
        let n = match &exponent.unit {
            None => exponent.value,
            Some(u) if u.dims().is_dimensionless() => exponent.value * u.scale(),
            Some(_) => return Err(UnitError::NonIntegerPower(exponent.to_string())),
        };
        if !n.is_finite() || n.fract() != 0.0 || n.abs() > i32::MAX as f64 {
            return Err(UnitError::NonIntegerPower(exponent.to_string()));
        }
        self.powi(n as i32)
    }

    pub fn powi(&self, n: i32) -> Result<Quantity, UnitError> {
        let unit = match &self.unit {
            Some(u) => Some(u.power(n)?),
            None => None,
        };
        Ok(Quantity::new(self.value.powi(n), unit))
    }

    /// Convert into `target`, honouring offsets, rounded to the target's precision.
    pub fn convert(&self, target: &Unit) -> Result<Quantity, UnitError> {
        let value = match &self.unit {
            None => self.value,
            Some(unit) => {
                target.ensure_matches(Some(unit), false)?;
                (self.value - unit.offset()) * unit.scale() / target.scale() + target.offset()
            }
        };
        Ok(Quantity::new(
            round_to_precision(value, target.precision()),
            Some(target.clone()),
        ))
    }

    pub fn convert_to(&self, spec: &str) -> Result<Quantity, UnitError> {
        self.convert(&Unit::new(spec)?)
    }

    /// Compare after converting `other` into this value's unit.
    pub fn equals(&self, other: &Quantity) -> Result<bool, UnitError> {
        let rhs = match (&self.unit, &other.unit) {
            (Some(unit), Some(_)) => other.convert(unit)?.value,
            _ => other.value,
        };
        let (rtol, atol) = tolerance(self.precision(), other.precision());
        Ok(is_close(self.value, rhs, rtol, atol))
    }

    fn precision(&self) -> Option<i32> {
        self.unit.as_ref().map(Unit::precision)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or(false)
    }
}

impl PartialEq<f64> for Quantity {
    fn eq(&self, other: &f64) -> bool {
        self.equals(&Quantity::scalar(*other)).unwrap_or(false)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} {}", format_g(self.value), unit),
            None => write!(f, "{}", format_g(self.value)),
        }
    }
}

impl FromStr for Quantity {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::parse(s)
    }
}

/// Each tolerance is the looser of the two sides: relative from the smallest
/// positive precision, absolute from the largest negative one.
fn tolerance(a: Option<i32>, b: Option<i32>) -> (f64, f64) {
    let precisions = [a, b];
    let rtol = precisions
        .iter()
        .flatten()
        .filter(|p| **p > 0)
        .min()
        .map(|p| 10f64.powi(-p))
        .unwrap_or(0.0);
    let atol = precisions
        .iter()
        .flatten()
        .filter(|p| **p < 0)
        .max()
        .map(|p| 10f64.powi(*p))
        .unwrap_or(0.0);

    if rtol == 0.0 && atol == 0.0 {
        (SCALAR_RTOL, 0.0)
    } else {
        (rtol, atol)
    }
}

fn is_close(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    a == b || (a - b).abs() <= (rtol * a.abs().max(b.abs())).max(atol)
}

/// Round to `precision` significant digits, or to `-precision` decimal places when negative.
pub fn round_to_precision(value: f64, precision: i32) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    let decimals = if precision > 0 {
        precision - 1 - value.abs().log10().floor() as i32
    } else {
        -precision
    };
    let factor = 10f64.powi(decimals);
    if !factor.is_finite() || factor == 0.0 {
        return value;
    }
    (value * factor).round() / factor
}

/// Render like C's `%g`: six significant digits, trailing zeros dropped.
pub fn format_g(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:.5e}", value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs())
    } else {
        let decimals = (5 - exp) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
