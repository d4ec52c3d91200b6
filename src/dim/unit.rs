use std::fmt;
use std::str::FromStr;

use crate::dim::error::UnitError;
use crate::dim::registry::{self, parse_factors, split_fraction, Registry, SpecForm};
use crate::dim::types::{Dimensions, UnitDef};

/// Symbol -> net exponent, in first-appearance order, zero exponents dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terms(Vec<(String, i32)>);

impl Terms {
    /// Canonical terms of a spec. Scaled and offset specs become a single opaque term.
    pub fn parse(spec: &str) -> Result<Self, UnitError> {
        let spec = spec.trim();
        let mut terms = Terms::default();
        if SpecForm::classify(spec) != SpecForm::Defn {
            terms.add(spec, 1)?;
            return Ok(terms);
        }

        let (num, den) = split_fraction(spec)?;
        for (symbol, exp) in parse_factors(spec, num)? {
            terms.add(symbol, exp)?;
        }
        for (symbol, exp) in parse_factors(spec, den)? {
            let exp = exp
                .checked_neg()
                .ok_or_else(|| UnitError::exponent_overflow(spec))?;
            terms.add(symbol, exp)?;
        }
        Ok(terms)
    }

    fn add(&mut self, symbol: &str, exp: i32) -> Result<(), UnitError> {
        // dimensionless placeholders carry nothing
        if symbol == "unit" || symbol == "1" {
            return Ok(());
        }
        match self.0.iter_mut().find(|(s, _)| s == symbol) {
            Some((_, e)) => {
                *e = e
                    .checked_add(exp)
                    .ok_or_else(|| UnitError::exponent_overflow(symbol))?;
            }
            None => self.0.push((symbol.to_string(), exp)),
        }
        self.0.retain(|(_, e)| *e != 0);
        Ok(())
    }

    pub fn merge(&self, other: &Terms, sign: i32) -> Result<Terms, UnitError> {
        let mut merged = self.clone();
        for (symbol, exp) in &other.0 {
            let exp = exp
                .checked_mul(sign)
                .ok_or_else(|| UnitError::exponent_overflow(symbol))?;
            merged.add(symbol, exp)?;
        }
        Ok(merged)
    }

    pub fn scale(&self, n: i32) -> Result<Terms, UnitError> {
        let mut scaled = Terms::default();
        for (symbol, exp) in &self.0 {
            let exp = exp
                .checked_mul(n)
                .ok_or_else(|| UnitError::exponent_overflow(symbol))?;
            scaled.add(symbol, exp)?;
        }
        Ok(scaled)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(s, e)| (s.as_str(), *e))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `num*num^2/den*den^3`, `1/den` or `unit`.
    ///
    /// A scaled or offset term is written bare only when it stands alone with
    /// exponent 1; anywhere else it is parenthesized, e.g. `(0.3048 m)^2`.
    pub fn canonical(&self) -> String {
        let alone = self.0.len() == 1;
        let factors: Vec<(String, i32)> = self
            .iter()
            .map(|(s, e)| {
                let opaque = SpecForm::classify(s) != SpecForm::Defn;
                if opaque && !(alone && e == 1) {
                    (format!("({})", s), e)
                } else {
                    (s.to_string(), e)
                }
            })
            .collect();

        fn join<'a>(factors: impl Iterator<Item = (&'a str, i32)>) -> String {
            factors
                .map(|(s, e)| if e == 1 { s.to_string() } else { format!("{}^{}", s, e) })
                .collect::<Vec<_>>()
                .join("*")
        }

        let num = join(factors.iter().filter(|(_, e)| *e > 0).map(|(s, e)| (s.as_str(), *e)));
        let den = join(
            factors
                .iter()
                .filter(|(_, e)| *e < 0)
                .map(|(s, e)| (s.as_str(), -*e)),
        );
        match (num.is_empty(), den.is_empty()) {
            (true, true) => "unit".to_string(),
            (false, true) => num,
            (true, false) => format!("1/{}", den),
            (false, false) => format!("{}/{}", num, den),
        }
    }
}

/// An immutable unit expression backed by a registry entry.
#[derive(Debug, Clone)]
pub struct Unit {
    name: String,
    terms: Terms,
    def: UnitDef,
}

impl Unit {
    /// Parse a unit spec against the process-wide registry.
    pub fn new(spec: &str) -> Result<Self, UnitError> {
        registry::global().unit(spec)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn terms(&self) -> &Terms {
        &self.terms
    }

    pub fn def(&self) -> &UnitDef {
        &self.def
    }

    pub fn dims(&self) -> Dimensions {
        self.def.dims
    }

    pub fn scale(&self) -> f64 {
        self.def.scale
    }

    pub fn offset(&self) -> f64 {
        self.def.offset
    }

    pub fn precision(&self) -> i32 {
        self.def.precision
    }

    pub fn multiply(&self, other: &Unit) -> Result<Unit, UnitError> {
        registry::global().multiply(self, other)
    }

    pub fn divide(&self, other: &Unit) -> Result<Unit, UnitError> {
        registry::global().divide(self, other)
    }

    pub fn power(&self, n: i32) -> Result<Unit, UnitError> {
        registry::global().power(self, n)
    }

    /// Same dimensions and scale. Offset and precision are not compared.
    pub fn equals(&self, other: &Unit) -> bool {
        self.def.dims == other.def.dims && self.def.scale == other.def.scale
    }

    /// Whether a value in `other` may be added to or converted into this unit.
    ///
    /// A scalar (`None`) matches anything unless `strict` is set.
    pub fn matches(&self, other: Option<&Unit>, strict: bool) -> bool {
        match other {
            None => !strict,
            Some(other) => self.def.dims == other.def.dims,
        }
    }

    /// Like [`Unit::matches`], but reports the mismatch as an error.
    pub fn ensure_matches(&self, other: Option<&Unit>, strict: bool) -> Result<(), UnitError> {
        if self.matches(other, strict) {
            return Ok(());
        }
        let (right, right_dims) = match other {
            Some(u) => (u.name.clone(), u.def.dims),
            None => ("(none)".to_string(), Dimensions::NONE),
        };
        Err(UnitError::DimensionMismatch {
            left: self.name.clone(),
            left_dims: self.def.dims,
            right,
            right_dims,
        })
    }

    fn ensure_not_affine(&self) -> Result<(), UnitError> {
        if self.def.is_affine() {
            return Err(UnitError::OffsetUnit(self.name.clone()));
        }
        Ok(())
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::new(s)
    }
}

impl Registry {
    /// Build a unit from a spec and memoize it under its canonical name.
    pub fn unit(&mut self, spec: &str) -> Result<Unit, UnitError> {
        let spec = spec.trim();
        let def = self.derive(spec)?;
        let terms = Terms::parse(spec)?;
        let name = if terms.is_empty() {
            "unit".to_string()
        } else {
            terms.canonical()
        };
        self.insert_if_absent(&name, def);
        Ok(Unit { name, terms, def })
    }

    pub fn multiply(&mut self, a: &Unit, b: &Unit) -> Result<Unit, UnitError> {
        a.ensure_not_affine()?;
        b.ensure_not_affine()?;
        let terms = a.terms.merge(&b.terms, 1)?;
        let def = a
            .def
            .combine(&b.def)
            .ok_or_else(|| UnitError::exponent_overflow(&terms.canonical()))?;
        Ok(self.memoize(terms, def))
    }

    pub fn divide(&mut self, a: &Unit, b: &Unit) -> Result<Unit, UnitError> {
        a.ensure_not_affine()?;
        b.ensure_not_affine()?;
        let terms = a.terms.merge(&b.terms, -1)?;
        let def = b
            .def
            .powi(-1)
            .and_then(|inverse| a.def.combine(&inverse))
            .ok_or_else(|| UnitError::exponent_overflow(&terms.canonical()))?;
        Ok(self.memoize(terms, def))
    }

    pub fn power(&mut self, a: &Unit, n: i32) -> Result<Unit, UnitError> {
        a.ensure_not_affine()?;
        let terms = a.terms.scale(n)?;
        let def = a
            .def
            .powi(n)
            .ok_or_else(|| UnitError::exponent_overflow(&a.name))?;
        Ok(self.memoize(terms, def))
    }

    // Reuse the registered entry for the canonical name, or register the computed one.
    fn memoize(&mut self, terms: Terms, computed: UnitDef) -> Unit {
        let name = terms.canonical();
        let def = match self.lookup(&name) {
            Some(def) => *def,
            None => {
                self.insert_if_absent(&name, computed);
                computed
            }
        };
        Unit { name, terms, def }
    }
}
