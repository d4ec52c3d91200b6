// Unit registry: base units, SI prefixes and the built-in derived unit specs.
// Entries are only ever added; a spec is inserted once it fully resolves.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lazy_static::lazy_static;
use tracing::{debug, error, trace};

use crate::dim::error::UnitError;
use crate::dim::types::{Dimensions, UnitDef, OFFSET_PRECISION};

/// SI prefixes and their power of ten. Two-letter prefixes come first.
pub const PREFIXES: &[(&str, i32)] = &[
    ("da", 1),
    ("Y", 24),
    ("Z", 21),
    ("E", 18),
    ("P", 15),
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
    ("h", 2),
    ("d", -1),
    ("c", -2),
    ("m", -3),
    ("u", -6),
    ("n", -9),
    ("p", -12),
    ("f", -15),
    ("a", -18),
    ("z", -21),
    ("y", -24),
];

pub const BASE_UNITS: &[(&str, Dimensions)] = &[
    ("unit", Dimensions::NONE),
    ("m", Dimensions::new(1, 0, 0, 0, 0, 0)),
    ("A", Dimensions::new(0, 1, 0, 0, 0, 0)),
    ("s", Dimensions::new(0, 0, 1, 0, 0, 0)),
    ("K", Dimensions::new(0, 0, 0, 1, 0, 0)),
    ("g", Dimensions::new(0, 0, 0, 0, 1, 0)),
    ("cd", Dimensions::NONE),
    ("$", Dimensions::new(0, 0, 0, 0, 0, 1)),
];

/// Derived units, in dependency order.
pub const DERIVED_SPECS: &[(&str, &str)] = &[
    // time
    ("min", "60 s"),
    ("h", "60 min"),
    ("hr", "h"),
    ("day", "24 h"),
    ("week", "7 day"),
    ("yr", "365 day"),
    // length
    ("in", "2.54 cm"),
    ("ft", "12 in"),
    ("yd", "3 ft"),
    ("mile", "5280 ft"),
    ("nmi", "1852 m"),
    ("mil", "0.001 in"),
    // area
    ("sf", "ft^2"),
    ("sy", "yd^2"),
    ("ha", "10000 m^2"),
    ("acre", "43560 sf"),
    ("cmil", "0.7853981633974483 mil^2"),
    // volume
    ("L", "dm^3"),
    ("gal", "231 in^3"),
    ("qt", "0.25 gal"),
    ("pt", "0.5 qt"),
    ("floz", "0.0078125 gal"),
    ("cf", "ft^3"),
    ("cy", "yd^3"),
    ("bbl", "42 gal"),
    // mass
    ("lb", "453.59237 g"),
    ("oz", "0.0625 lb"),
    ("ton", "2000 lb"),
    ("tonne", "1000 kg"),
    // velocity
    ("mps", "m/s"),
    ("fps", "ft/s"),
    ("mph", "mile/h"),
    ("kph", "km/h"),
    ("knot", "nmi/h"),
    // flow
    ("gpm", "gal/min"),
    ("gph", "gal/h"),
    ("lpm", "L/min"),
    ("cfm", "ft^3/min"),
    ("cfs", "ft^3/s"),
    // frequency
    ("Hz", "1/s"),
    ("rpm", "1/min"),
    // force
    ("N", "kg*m/s^2"),
    ("lbf", "4.4482216152605 N"),
    ("dyn", "1e-5 N"),
    // pressure
    ("Pa", "N/m^2"),
    ("bar", "100000 Pa"),
    ("atm", "101325 Pa"),
    ("psi", "lbf/in^2"),
    ("inHg", "3386.389 Pa"),
    ("mmHg", "133.322387415 Pa"),
    ("torr", "133.32236842105263 Pa"),
    // energy and power
    ("J", "N*m"),
    ("W", "J/s"),
    ("Wh", "W*h"),
    ("cal", "4.184 J"),
    ("Btu", "1055.05585262 J"),
    ("therm", "100000 Btu"),
    ("eV", "1.602176634e-19 J"),
    ("erg", "1e-7 J"),
    ("hp", "745.69987158227 W"),
    ("Btuh", "Btu/h"),
    ("TR", "12000 Btu/h"),
    // electromagnetic
    ("C", "A*s"),
    ("V", "W/A"),
    ("VA", "V*A"),
    ("VAr", "V*A"),
    ("var", "VAr"),
    ("ohm", "V/A"),
    ("S", "A/V"),
    ("mho", "S"),
    ("F", "C/V"),
    ("H", "V*s/A"),
    ("Wb", "V*s"),
    ("T", "Wb/m^2"),
    ("Ah", "A*h"),
    // temperature
    ("degC", "K-273.15"),
    ("degR", "0.5555555555555556 K"),
    ("degF", "degR-459.67"),
    // angle and ratio
    ("rad", "unit"),
    ("sr", "unit"),
    ("deg", "0.017453292519943295 rad"),
    ("pu", "unit"),
    ("%", "0.01 unit"),
    ("ppm", "1e-6 unit"),
    // photometric
    ("lm", "cd*sr"),
    ("lx", "lm/m^2"),
    // currency
    ("cent", "0.01 $"),
];

lazy_static! {
    static ref GLOBAL: Mutex<Registry> = Mutex::new(Registry::with_builtins());
}

/// Lock the process-wide registry.
///
/// Entries are append-only, so a poisoned lock still holds a consistent registry.
pub fn global() -> MutexGuard<'static, Registry> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parse a numeric literal. Words such as `inf` or `nan` are not numbers here.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let first = text.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '.' | '+' | '-')) {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// The textual forms a unit spec can take.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SpecForm<'a> {
    /// `60`
    Numeric(f64),
    /// `60 s`
    Scaled { scale: f64, defn: &'a str },
    /// `K-273.15`
    Offset { defn: &'a str, offset: f64 },
    /// `kg*m/s^2`
    Defn,
}

impl<'a> SpecForm<'a> {
    pub(crate) fn classify(spec: &'a str) -> Self {
        if let Some(value) = parse_number(spec) {
            return SpecForm::Numeric(value);
        }

        if let Some((head, tail)) = spec.split_once(char::is_whitespace) {
            if let Some(scale) = parse_number(head) {
                return SpecForm::Scaled {
                    scale,
                    defn: tail.trim(),
                };
            }
        }

        if let Some(idx) = spec.rfind(|c| c == '+' || c == '-') {
            let (defn, offset) = spec.split_at(idx);
            if !defn.is_empty() && !defn.ends_with('^') && parse_number(defn).is_none() {
                if let Some(offset) = parse_number(offset) {
                    return SpecForm::Offset {
                        defn: defn.trim(),
                        offset,
                    };
                }
            }
        }

        SpecForm::Defn
    }
}

// Split at `sep` outside parentheses.
fn split_top_level<'a>(spec: &str, text: &'a str, sep: char) -> Result<Vec<&'a str>, UnitError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| UnitError::invalid_spec(spec, "unbalanced parentheses"))?;
            }
            c if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(UnitError::invalid_spec(spec, "unbalanced parentheses"));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

/// Split `NUM/DEN` into its two halves. Only one top-level `/` is allowed.
pub(crate) fn split_fraction(spec: &str) -> Result<(&str, &str), UnitError> {
    match split_top_level(spec, spec, '/')?.as_slice() {
        [num] => Ok((*num, "")),
        [num, den] => {
            if num.trim().is_empty() || den.trim().is_empty() {
                return Err(UnitError::invalid_spec(spec, "empty side of '/'"));
            }
            Ok((*num, *den))
        }
        _ => Err(UnitError::invalid_spec(spec, "more than one '/'")),
    }
}

/// Split `a*b^2*(0.3048 m)^3` into `(symbol, exponent)` pairs.
///
/// A parenthesized factor is one symbol; its content may itself be a scaled spec.
pub(crate) fn parse_factors<'a>(spec: &str, part: &'a str) -> Result<Vec<(&'a str, i32)>, UnitError> {
    if part.trim().is_empty() {
        return Ok(Vec::new());
    }

    split_top_level(spec, part, '*')?
        .into_iter()
        .map(|factor| {
            let factor = factor.trim();
            let (symbol, exp) = match factor.strip_prefix('(') {
                Some(rest) => {
                    let close = rest
                        .rfind(')')
                        .ok_or_else(|| UnitError::invalid_spec(spec, "unbalanced parentheses"))?;
                    let tail = rest[close + 1..].trim();
                    let exp = match tail.strip_prefix('^') {
                        Some(exp) => Some(exp),
                        None if tail.is_empty() => None,
                        None => {
                            return Err(UnitError::invalid_spec(
                                spec,
                                format!("unexpected '{}' after ')'", tail),
                            ))
                        }
                    };
                    (rest[..close].trim(), exp)
                }
                None => match factor.split_once('^') {
                    Some((symbol, exp)) => (symbol.trim(), Some(exp)),
                    None => (factor, None),
                },
            };
            let exp = match exp {
                Some(exp) => exp.trim().parse::<i32>().map_err(|_| {
                    UnitError::invalid_spec(spec, format!("invalid exponent in '{}'", factor))
                })?,
                None => 1,
            };
            if symbol.is_empty() {
                return Err(UnitError::invalid_spec(spec, "empty unit term"));
            }
            Ok((symbol, exp))
        })
        .collect()
}

pub struct Registry {
    entries: HashMap<String, UnitDef>,
    // name -> spec, for listing
    definitions: Vec<(String, String)>,
}

impl Registry {
    /// A registry holding only the base units.
    pub fn new() -> Self {
        let entries = BASE_UNITS
            .iter()
            .map(|(symbol, dims)| (symbol.to_string(), UnitDef::base(*dims)))
            .collect();
        Self {
            entries,
            definitions: Vec::new(),
        }
    }

    /// Base units plus every built-in derived unit.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, spec) in DERIVED_SPECS {
            if let Err(e) = registry.define(name, spec) {
                error!(unit = %name, spec = %spec, "built-in unit failed to derive: {}", e);
            }
        }
        registry
    }

    pub fn lookup(&self, symbol: &str) -> Option<&UnitDef> {
        self.entries.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    /// Insert `def` under `key` unless the key is taken. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, key: &str, def: UnitDef) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        debug!(unit = %key, dims = %def.dims, scale = def.scale, "registered unit");
        self.entries.insert(key.to_string(), def);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registered symbols, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Named derived units in definition order, as `(name, spec)`.
    pub fn definitions(&self) -> &[(String, String)] {
        &self.definitions
    }

    /// Register `name` as the unit described by `spec`.
    pub fn define(&mut self, name: &str, spec: &str) -> Result<UnitDef, UnitError> {
        let name = name.trim();
        let plain = SpecForm::classify(name) == SpecForm::Defn
            && !name.is_empty()
            && !name.contains(|c: char| c.is_whitespace() || matches!(c, '*' | '/' | '^'));
        if !plain {
            return Err(UnitError::invalid_spec(name, "not a valid unit name"));
        }
        if self.contains(name) {
            return Err(UnitError::invalid_spec(name, "unit is already defined"));
        }

        let def = self.derive(spec)?;
        self.insert_if_absent(name, def);
        self.definitions.push((name.to_string(), spec.trim().to_string()));
        Ok(def)
    }

    /// Resolve a spec to its definition, registering any prefixed symbols met on the way.
    pub fn derive(&mut self, spec: &str) -> Result<UnitDef, UnitError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(UnitError::invalid_spec(spec, "empty unit"));
        }
        if let Some(def) = self.entries.get(spec) {
            return Ok(*def);
        }

        match SpecForm::classify(spec) {
            SpecForm::Numeric(scale) => Ok(UnitDef::scalar(scale)),
            SpecForm::Scaled { scale, defn } => {
                let inner = self.derive(defn)?;
                if inner.is_affine() {
                    return Err(UnitError::OffsetUnit(defn.to_string()));
                }
                Ok(UnitDef {
                    scale: inner.scale * scale,
                    ..inner
                })
            }
            SpecForm::Offset { defn, offset } => {
                let inner = self.derive(defn)?;
                if inner.is_affine() {
                    return Err(UnitError::OffsetUnit(defn.to_string()));
                }
                Ok(UnitDef {
                    offset,
                    precision: OFFSET_PRECISION,
                    ..inner
                })
            }
            SpecForm::Defn => self.derive_defn(spec),
        }
    }

    fn derive_defn(&mut self, spec: &str) -> Result<UnitDef, UnitError> {
        let (num, den) = split_fraction(spec)?;
        let mut factors = parse_factors(spec, num)?;
        for (symbol, exp) in parse_factors(spec, den)? {
            let exp = exp
                .checked_neg()
                .ok_or_else(|| UnitError::exponent_overflow(spec))?;
            factors.push((symbol, exp));
        }

        if let [(symbol, 1)] = factors.as_slice() {
            return self.resolve_term(symbol);
        }

        let mut def = UnitDef::scalar(1.0);
        for (symbol, exp) in factors {
            let term = self.resolve_term(symbol)?;
            if term.is_affine() {
                return Err(UnitError::OffsetUnit(symbol.to_string()));
            }
            def = term
                .powi(exp)
                .and_then(|term| def.combine(&term))
                .ok_or_else(|| UnitError::exponent_overflow(spec))?;
        }
        Ok(def)
    }

    // registry -> prefix -> nested spec -> unknown
    fn resolve_term(&mut self, symbol: &str) -> Result<UnitDef, UnitError> {
        if let Some(def) = self.entries.get(symbol) {
            return Ok(*def);
        }
        if let Some(def) = self.resolve_scalar_prefix(symbol) {
            return Ok(def);
        }
        match SpecForm::classify(symbol) {
            SpecForm::Defn => Err(UnitError::UnknownUnit(symbol.to_string())),
            _ => self.derive(symbol),
        }
    }

    /// Synthesize `kW`, `mm`, `dam`... from a prefix and a registered symbol.
    pub fn resolve_scalar_prefix(&mut self, symbol: &str) -> Option<UnitDef> {
        for (prefix, exp) in PREFIXES {
            let Some(base) = symbol.strip_prefix(prefix) else {
                continue;
            };
            let Some(def) = self.entries.get(base).copied() else {
                continue;
            };
            if base.is_empty() || def.is_affine() {
                continue;
            }

            let def = UnitDef {
                scale: def.scale * 10f64.powi(*exp),
                ..def
            };
            trace!(unit = %symbol, prefix = %prefix, base = %base, "synthesized prefixed unit");
            self.insert_if_absent(symbol, def);
            return Some(def);
        }
        None
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::types::DEFAULT_PRECISION;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
    }

    #[test]
    fn test_base_units_present() {
        let registry = Registry::new();
        assert_eq!(registry.len(), BASE_UNITS.len());
        let m = registry.lookup("m").unwrap();
        assert_eq!(m.dims, Dimensions::new(1, 0, 0, 0, 0, 0));
        assert_eq!(m.scale, 1.0);
        assert_eq!(m.precision, DEFAULT_PRECISION);
        assert!(registry.lookup("cd").unwrap().dims.is_dimensionless());
    }

    #[test]
    fn test_all_builtins_derive() {
        let registry = Registry::with_builtins();
        for (name, _) in DERIVED_SPECS {
            assert!(registry.contains(name), "built-in '{}' missing", name);
        }
        assert_eq!(registry.definitions().len(), DERIVED_SPECS.len());
    }

    #[test]
    fn test_classify_forms() {
        assert_eq!(SpecForm::classify("60"), SpecForm::Numeric(60.0));
        assert_eq!(SpecForm::classify("1e-5"), SpecForm::Numeric(1e-5));
        assert_eq!(
            SpecForm::classify("60 s"),
            SpecForm::Scaled {
                scale: 60.0,
                defn: "s"
            }
        );
        assert_eq!(
            SpecForm::classify("K-273.15"),
            SpecForm::Offset {
                defn: "K",
                offset: -273.15
            }
        );
        assert_eq!(SpecForm::classify("m^-2"), SpecForm::Defn);
        assert_eq!(SpecForm::classify("kg*m/s^2"), SpecForm::Defn);
        assert_eq!(SpecForm::classify("inf"), SpecForm::Defn);
    }

    #[test]
    fn test_prefix_synthesis_registers_entry() {
        let mut registry = Registry::new();
        assert!(!registry.contains("km"));
        let km = registry.derive("km").unwrap();
        assert_eq!(km.scale, 1000.0);
        assert!(registry.contains("km"));

        let dam = registry.derive("dam").unwrap();
        assert!(close(dam.scale, 10.0));
    }

    #[test]
    fn test_registered_symbol_wins_over_prefix() {
        let mut registry = Registry::with_builtins();
        // minute, not milli-inch
        let min = registry.derive("min").unwrap();
        assert_eq!(min.scale, 60.0);
        assert_eq!(min.dims, Dimensions::new(0, 0, 1, 0, 0, 0));
    }

    #[test]
    fn test_derive_compound() {
        let mut registry = Registry::with_builtins();
        let n = registry.derive("N").unwrap();
        assert_eq!(n.dims, Dimensions::new(1, 0, -2, 0, 1, 0));
        assert!(close(n.scale, 1000.0));

        let psi = registry.derive("lbf/in^2").unwrap();
        assert_eq!(psi.dims, Dimensions::new(-1, 0, -2, 0, 1, 0));
        assert!(close(psi.scale, 6894.757293168361 * 1000.0));

        let hz = registry.derive("Hz").unwrap();
        assert_eq!(hz.dims, Dimensions::new(0, 0, -1, 0, 0, 0));
    }

    #[test]
    fn test_derive_offset_forces_precision() {
        let mut registry = Registry::with_builtins();
        let deg_c = registry.derive("degC").unwrap();
        assert_eq!(deg_c.offset, -273.15);
        assert_eq!(deg_c.precision, OFFSET_PRECISION);

        let deg_f = registry.derive("degF").unwrap();
        assert_eq!(deg_f.offset, -459.67);
        assert!(close(deg_f.scale, 5.0 / 9.0));
    }

    #[test]
    fn test_offset_unit_rejected_in_compound() {
        let mut registry = Registry::with_builtins();
        let err = registry.derive("degC/s").unwrap_err();
        assert!(matches!(err, UnitError::OffsetUnit(_)));
    }

    #[test]
    fn test_unknown_symbol_leaves_registry_unchanged() {
        let mut registry = Registry::with_builtins();
        let before = registry.len();
        let err = registry.derive("km*furlong/s").unwrap_err();
        assert_eq!(err, UnitError::UnknownUnit("furlong".to_string()));
        // km was synthesized while resolving, the failed spec itself was not stored
        assert!(!registry.contains("km*furlong/s"));
        assert!(registry.len() <= before + 1);
    }

    #[test]
    fn test_invalid_specs() {
        let mut registry = Registry::with_builtins();
        assert!(matches!(
            registry.derive("m/s/s"),
            Err(UnitError::InvalidSpec { .. })
        ));
        assert!(matches!(
            registry.derive("m^x"),
            Err(UnitError::InvalidSpec { .. })
        ));
        assert!(matches!(
            registry.derive("m**s"),
            Err(UnitError::InvalidSpec { .. })
        ));
        assert!(matches!(registry.derive(""), Err(UnitError::InvalidSpec { .. })));
    }

    #[test]
    fn test_parenthesized_scaled_factor() {
        let mut registry = Registry::with_builtins();
        let sq = registry.derive("(0.3048 m)^2").unwrap();
        assert!(close(sq.scale, 0.3048 * 0.3048));
        assert_eq!(sq.dims, Dimensions::new(2, 0, 0, 0, 0, 0));

        let per = registry.derive("s/(0.3048 m)").unwrap();
        assert!(close(per.scale, 1.0 / 0.3048));

        assert!(matches!(registry.derive("(m"), Err(UnitError::InvalidSpec { .. })));
        assert!(matches!(registry.derive("(m)s"), Err(UnitError::InvalidSpec { .. })));
    }

    #[test]
    fn test_exponent_overflow_is_an_error() {
        let mut registry = Registry::with_builtins();
        assert!(matches!(
            registry.derive("m^2000000000*m^2000000000"),
            Err(UnitError::InvalidSpec { .. })
        ));
        assert!(matches!(
            registry.derive("1/m^-2147483648"),
            Err(UnitError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_define_rejects_duplicates_and_bad_names() {
        let mut registry = Registry::with_builtins();
        let def = registry.define("kWh_m2", "kWh/m^2").unwrap();
        assert_eq!(def.dims, Dimensions::new(0, 0, -2, 0, 1, 0));
        assert!(registry.define("kWh_m2", "J").is_err());
        assert!(registry.define("a/b", "J").is_err());
        assert!(registry.define("42", "J").is_err());
    }
}
