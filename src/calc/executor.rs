use thiserror::Error;
use tracing::debug;

use crate::calc::parser::{Operator, StackOp, Token};
use crate::dim::{Quantity, Unit, UnitError};

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("'{op}' needs {needed} value(s) but the stack holds {available}")]
    StackUnderflow {
        op: String,
        needed: usize,
        available: usize,
    },
    #[error("Unknown token: {0}")]
    UnknownToken(String),
    #[error("Nothing to print: the stack is empty")]
    EmptyStack,
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// RPN stack machine. The top of the stack is the last element.
#[derive(Debug, Default)]
pub struct Calculator {
    stack: Vec<Quantity>,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack(&self) -> &[Quantity] {
        &self.stack
    }

    pub fn push(&mut self, value: Quantity) {
        self.stack.push(value);
    }

    pub fn apply(&mut self, token: &Token) -> Result<(), CalcError> {
        match token {
            Token::Value(text) => {
                let value = Quantity::parse(text)?;
                debug!(%value, "push");
                self.stack.push(value);
            }
            Token::Op(op) => self.binary(*op)?,
            Token::Stack(op) => self.stack_op(*op)?,
            Token::Command(cmd) => return Err(CalcError::UnknownToken(cmd.name().to_string())),
        }
        Ok(())
    }

    fn binary(&mut self, op: Operator) -> Result<(), CalcError> {
        self.require(op.aliases()[0], 2)?;
        let (Some(b), Some(a)) = (self.stack.pop(), self.stack.pop()) else {
            return Err(CalcError::EmptyStack);
        };
        match op.apply(&a, &b) {
            Ok(result) => {
                debug!(%a, %b, %result, op = op.aliases()[0], "apply");
                self.stack.push(result);
                Ok(())
            }
            Err(e) => {
                // leave the stack as it was
                self.stack.push(a);
                self.stack.push(b);
                Err(e.into())
            }
        }
    }

    fn stack_op(&mut self, op: StackOp) -> Result<(), CalcError> {
        match op {
            StackOp::Copy => {
                self.require(op.name(), 1)?;
                if let Some(top) = self.stack.last().cloned() {
                    self.stack.push(top);
                }
            }
            StackOp::Pop => {
                self.require(op.name(), 1)?;
                self.stack.pop();
            }
            StackOp::Swap => {
                self.require(op.name(), 2)?;
                let n = self.stack.len();
                self.stack.swap(n - 1, n - 2);
            }
            StackOp::Rev => self.stack.reverse(),
            StackOp::Rol => {
                if !self.stack.is_empty() {
                    self.stack.rotate_left(1);
                }
            }
            StackOp::Ror => {
                if !self.stack.is_empty() {
                    self.stack.rotate_right(1);
                }
            }
        }
        Ok(())
    }

    fn require(&self, op: &str, needed: usize) -> Result<(), CalcError> {
        if self.stack.len() < needed {
            return Err(CalcError::StackUnderflow {
                op: op.to_string(),
                needed,
                available: self.stack.len(),
            });
        }
        Ok(())
    }

    /// Apply every token and return the results, top of stack first.
    pub fn run(&mut self, tokens: &[Token]) -> Result<Vec<Quantity>, CalcError> {
        for token in tokens {
            self.apply(token)?;
        }
        if self.stack.is_empty() {
            return Err(CalcError::EmptyStack);
        }
        Ok(self.stack.iter().rev().cloned().collect())
    }
}

/// Convert results pairwise into `units`; results past the end are left alone.
pub fn convert_results(results: Vec<Quantity>, units: &[String]) -> Result<Vec<Quantity>, CalcError> {
    let mut converted = Vec::with_capacity(results.len());
    for (i, result) in results.into_iter().enumerate() {
        match units.get(i) {
            Some(spec) => converted.push(result.convert(&Unit::new(spec)?)?),
            None => converted.push(result),
        }
    }
    Ok(converted)
}

/// Run `tokens` on a fresh stack and convert the results into `units`.
pub fn evaluate(tokens: &[Token], units: &[String]) -> Result<Vec<Quantity>, CalcError> {
    let results = Calculator::new().run(tokens)?;
    convert_results(results, units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::parser::parse_tokens;

    fn run(tokens: &[&str]) -> Result<Vec<String>, CalcError> {
        let tokens = parse_tokens(tokens)?;
        let results = Calculator::new().run(&tokens)?;
        Ok(results.iter().map(|q| q.to_string()).collect())
    }

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(run(&["2", "3", "+"]).unwrap(), vec!["5"]);
        assert_eq!(run(&["10", "4", "-"]).unwrap(), vec!["6"]);
        assert_eq!(run(&["10", "4", "/"]).unwrap(), vec!["2.5"]);
        assert_eq!(run(&["10", "4", "//"]).unwrap(), vec!["2"]);
        assert_eq!(run(&["10", "4", "%"]).unwrap(), vec!["2"]);
        assert_eq!(run(&["2", "10", "^"]).unwrap(), vec!["1024"]);
    }

    #[test]
    fn test_units_flow_through() {
        assert_eq!(run(&["3 m", "4 m", "x"]).unwrap(), vec!["12 m^2"]);
        assert_eq!(run(&["1 m", "1 ft", "+"]).unwrap(), vec!["1.3048 m"]);
        assert_eq!(run(&["100 m", "10 s", "/"]).unwrap(), vec!["10 m/s"]);
    }

    #[test]
    fn test_results_are_top_first() {
        assert_eq!(run(&["1", "2", "3"]).unwrap(), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_stack_ops() {
        assert_eq!(run(&["1", "2", "swap"]).unwrap(), vec!["1", "2"]);
        assert_eq!(run(&["1", "copy"]).unwrap(), vec!["1", "1"]);
        assert_eq!(run(&["1", "2", "pop"]).unwrap(), vec!["1"]);
        assert_eq!(run(&["1", "2", "3", "rev"]).unwrap(), vec!["1", "2", "3"]);
        // bottom to top
        assert_eq!(run(&["1", "2", "3", "rol"]).unwrap(), vec!["1", "3", "2"]);
        // top to bottom
        assert_eq!(run(&["1", "2", "3", "ror"]).unwrap(), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_underflow_and_empty() {
        assert!(matches!(
            run(&["1", "+"]),
            Err(CalcError::StackUnderflow { needed: 2, available: 1, .. })
        ));
        assert!(matches!(run(&["swap"]), Err(CalcError::StackUnderflow { .. })));
        assert!(matches!(run(&["1", "pop"]), Err(CalcError::EmptyStack)));
    }

    #[test]
    fn test_unit_error_leaves_stack_intact() {
        let mut calc = Calculator::new();
        let tokens = parse_tokens(&["1 m", "1 s"]).unwrap();
        calc.run(&tokens).unwrap();
        let add = parse_tokens(&["+"]).unwrap();
        assert!(matches!(calc.apply(&add[0]), Err(CalcError::Unit(_))));
        assert_eq!(calc.stack().len(), 2);
    }

    #[test]
    fn test_convert_results_pairwise() {
        let tokens = parse_tokens(&["1000 m", "60 s"]).unwrap();
        let results = Calculator::new().run(&tokens).unwrap();
        let converted = convert_results(results, &["min".to_string()]).unwrap();
        assert_eq!(converted[0].to_string(), "1 min");
        assert_eq!(converted[1].to_string(), "1000 m");
    }

    #[test]
    fn test_evaluate_gravitational_force() {
        let tokens = parse_tokens(&["32.2 ft/s^2", "5 lb", "x"]).unwrap();
        let results = evaluate(&tokens, &["N".to_string()]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].unit_name(), Some("N"));
        assert!((results[0].value() - 22.259).abs() < 1e-3);
    }

    #[test]
    fn test_evaluate_conversion_mismatch() {
        let tokens = parse_tokens(&["3 m"]).unwrap();
        assert!(matches!(
            evaluate(&tokens, &["s".to_string()]),
            Err(CalcError::Unit(UnitError::DimensionMismatch { .. }))
        ));
    }
}
