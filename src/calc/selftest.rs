// Built-in checks run by the `test` command.

use std::io::Write;

use crate::calc::executor::Calculator;
use crate::calc::parser::parse_tokens;
use crate::dim::registry::{BASE_UNITS, PREFIXES};
use crate::dim::{Quantity, Registry, Unit, UnitError};

type CheckResult = Result<(), String>;

struct Check {
    name: &'static str,
    run: fn() -> CheckResult,
}

const CHECKS: &[Check] = &[
    Check { name: "prefix round trip", run: prefix_round_trip },
    Check { name: "area equality", run: area_equality },
    Check { name: "temperature equality", run: temperature_equality },
    Check { name: "dimension mismatch raises", run: mismatch_raises },
    Check { name: "render", run: render },
    Check { name: "scalar prefix", run: scalar_prefix },
    Check { name: "self inverse", run: self_inverse },
    Check { name: "memoization", run: memoization },
    Check { name: "integer powers only", run: integer_powers },
    Check { name: "gravitational force", run: gravitational_force },
];

fn q(text: &str) -> Result<Quantity, String> {
    Quantity::parse(text).map_err(|e| e.to_string())
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> CheckResult {
    if condition {
        Ok(())
    } else {
        Err(message())
    }
}

fn prefix_round_trip() -> CheckResult {
    for (base, _) in BASE_UNITS {
        for (prefix, exp) in PREFIXES {
            let prefixed = format!("{}{}", prefix, base);
            let one = Quantity::with_unit(1.0, &prefixed).map_err(|e| e.to_string())?;
            let in_base = one.convert_to(base).map_err(|e| e.to_string())?;
            ensure(in_base == 10f64.powi(*exp), || {
                format!("1 {} gave {}", prefixed, in_base)
            })?;
            let back = in_base.convert_to(&prefixed).map_err(|e| e.to_string())?;
            ensure(back == 1.0, || format!("{} back to {} gave {}", in_base, prefixed, back))?;
        }
    }
    Ok(())
}

fn area_equality() -> CheckResult {
    ensure(q("1.000000 m^2")? == q("10.76391 sf")?, || {
        "1 m^2 should equal 10.76391 sf".to_string()
    })?;
    ensure(q("0.999999 m^2")? != q("10.76391 sf")?, || {
        "0.999999 m^2 should not equal 10.76391 sf".to_string()
    })
}

fn temperature_equality() -> CheckResult {
    ensure(q("0 degC")? == q("32 degF")?, || "0 degC should equal 32 degF".to_string())?;
    ensure(q("0.02 degC")? != q("32 degF")?, || {
        "0.02 degC should not equal 32 degF".to_string()
    })
}

fn mismatch_raises() -> CheckResult {
    match q("1 m")?.add(&q("1 s")?) {
        Err(UnitError::DimensionMismatch { .. }) => Ok(()),
        other => Err(format!("expected a mismatch, got {:?}", other)),
    }
}

fn render() -> CheckResult {
    let text = q("1.23 m")?.to_string();
    ensure(text == "1.23 m", || format!("rendered as '{}'", text))
}

fn scalar_prefix() -> CheckResult {
    let plain = q("1 kunit")?.convert_to("unit").map_err(|e| e.to_string())?;
    ensure(plain == 1000.0, || format!("1 kunit gave {}", plain))
}

fn self_inverse() -> CheckResult {
    for spec in ["m", "kW*h", "ft/s^2", "psi", "Btu"] {
        let unit = Unit::new(spec).map_err(|e| e.to_string())?;
        let ratio = unit.divide(&unit).map_err(|e| e.to_string())?;
        ensure(
            ratio.dims().is_dimensionless() && (ratio.scale() - 1.0).abs() < 1e-12,
            || format!("{0}/{0} gave {1} {2}", spec, ratio.dims(), ratio.scale()),
        )?;
    }
    Ok(())
}

fn memoization() -> CheckResult {
    let mut registry = Registry::with_builtins();
    let kw = registry.unit("kW").map_err(|e| e.to_string())?;
    let h = registry.unit("h").map_err(|e| e.to_string())?;
    let first = registry.multiply(&kw, &h).map_err(|e| e.to_string())?;
    let size = registry.len();
    let second = registry.multiply(&kw, &h).map_err(|e| e.to_string())?;
    ensure(first.name() == second.name() && registry.len() == size, || {
        format!("'{}' then '{}', {} -> {} entries", first, second, size, registry.len())
    })
}

fn integer_powers() -> CheckResult {
    match q("2 m")?.pow(&q("0.5")?) {
        Err(UnitError::NonIntegerPower(_)) => Ok(()),
        other => Err(format!("expected a power error, got {:?}", other)),
    }
}

fn gravitational_force() -> CheckResult {
    let tokens = parse_tokens(&["32.2 ft/s^2", "5 lb", "x"]).map_err(|e| e.to_string())?;
    let results = Calculator::new().run(&tokens).map_err(|e| e.to_string())?;
    let force = results
        .first()
        .ok_or_else(|| "empty result".to_string())?
        .convert_to("N")
        .map_err(|e| e.to_string())?;
    ensure((force.value() - 22.259).abs() < 1e-3, || format!("got {}", force))
}

/// Run every check, writing one line each. Returns whether all passed.
pub fn run_selftest<W: Write>(out: &mut W) -> std::io::Result<bool> {
    let mut failed = 0;
    for check in CHECKS {
        match (check.run)() {
            Ok(()) => writeln!(out, "PASS {}", check.name)?,
            Err(reason) => {
                failed += 1;
                writeln!(out, "FAIL {}: {}", check.name, reason)?;
            }
        }
    }
    writeln!(out, "{} passed, {} failed", CHECKS.len() - failed, failed)?;
    Ok(failed == 0)
}
