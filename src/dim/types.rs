use std::fmt;

use serde::Serialize;

/// Names of the base dimensions, in vector order.
pub const BASE_DIMENSIONS: [&str; 6] = ["m", "A", "s", "K", "g", "$"];

/// Significant digits carried by base units and everything derived from them.
pub const DEFAULT_PRECISION: i32 = 7;

/// Precision of affine units: absolute, hundredths.
pub const OFFSET_PRECISION: i32 = -2;

/// Exponents over (length, current, time, temperature, mass, currency).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions(pub [i32; 6]);

impl Dimensions {
    pub const NONE: Dimensions = Dimensions([0; 6]);

    pub const fn new(m: i32, a: i32, s: i32, k: i32, g: i32, currency: i32) -> Self {
        Self([m, a, s, k, g, currency])
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|e| *e == 0)
    }

    /// Component-wise sum, `None` if an exponent overflows.
    pub fn checked_add(self, rhs: Dimensions) -> Option<Dimensions> {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o = o.checked_add(r)?;
        }
        Some(Dimensions(out))
    }

    /// Every exponent times `n`, `None` on overflow.
    pub fn checked_mul(self, n: i32) -> Option<Dimensions> {
        let mut out = self.0;
        for o in out.iter_mut() {
            *o = o.checked_mul(n)?;
        }
        Some(Dimensions(out))
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", parts.join(" "))
    }
}

/// A registry entry: what one unit of a symbol means in base units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitDef {
    pub dims: Dimensions,
    /// Multiplier from this unit to base units.
    pub scale: f64,
    /// Reading of this unit at base zero; non-zero only for affine units.
    pub offset: f64,
    /// Positive: significant digits. Negative: absolute decimal places.
    pub precision: i32,
}

impl UnitDef {
    pub const fn base(dims: Dimensions) -> Self {
        Self {
            dims,
            scale: 1.0,
            offset: 0.0,
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn scalar(scale: f64) -> Self {
        Self {
            scale,
            ..Self::base(Dimensions::NONE)
        }
    }

    pub fn is_affine(&self) -> bool {
        self.offset != 0.0
    }

    /// Raise to an integer power. Offset is not carried. `None` if an exponent overflows.
    pub fn powi(&self, exp: i32) -> Option<Self> {
        Some(Self {
            dims: self.dims.checked_mul(exp)?,
            scale: self.scale.powi(exp),
            offset: 0.0,
            precision: self.precision,
        })
    }

    /// Product of two definitions. Offset is not carried. `None` if an exponent overflows.
    pub fn combine(&self, other: &UnitDef) -> Option<Self> {
        Some(Self {
            dims: self.dims.checked_add(other.dims)?,
            scale: self.scale * other.scale,
            offset: 0.0,
            precision: self.precision.min(other.precision),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_arithmetic() {
        let force = Dimensions::new(1, 0, -2, 0, 1, 0);
        let length = Dimensions::new(1, 0, 0, 0, 0, 0);
        assert_eq!(
            force.checked_add(length),
            Some(Dimensions::new(2, 0, -2, 0, 1, 0))
        );
        assert_eq!(length.checked_mul(3), Some(Dimensions::new(3, 0, 0, 0, 0, 0)));
        let inverse = force.checked_mul(-1).unwrap();
        assert!(force.checked_add(inverse).unwrap().is_dimensionless());
    }

    #[test]
    fn test_dimension_overflow_is_none() {
        let huge = Dimensions::new(2_000_000_000, 0, 0, 0, 0, 0);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(Dimensions::new(2, 0, 0, 0, 0, 0).checked_mul(1_073_741_824), None);

        let def = UnitDef::base(huge);
        assert!(def.combine(&def).is_none());
        assert!(def.powi(2).is_none());
    }

    #[test]
    fn test_def_combine_takes_min_precision() {
        let a = UnitDef::base(Dimensions::new(1, 0, 0, 0, 0, 0));
        let b = UnitDef {
            precision: 3,
            scale: 2.0,
            ..UnitDef::base(Dimensions::new(0, 0, 1, 0, 0, 0))
        };
        let c = a.combine(&b).unwrap();
        assert_eq!(c.precision, 3);
        assert_eq!(c.scale, 2.0);
        assert_eq!(c.dims, Dimensions::new(1, 0, 1, 0, 0, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Dimensions::new(1, 0, -2, 0, 1, 0).to_string(), "[1 0 -2 0 1 0]");
    }
}
