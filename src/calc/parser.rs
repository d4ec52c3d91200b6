use crate::calc::executor::CalcError;
use crate::dim::{looks_like_number, looks_like_quantity, Quantity, UnitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::FloorDiv,
        Operator::Mod,
        Operator::Pow,
    ];

    /// Accepted spellings, symbol first.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Operator::Add => &["+", "add", "plus"],
            Operator::Sub => &["-", "sub", "minus"],
            Operator::Mul => &["*", "x", "mul", "times"],
            Operator::Div => &["/", "div", "divide"],
            Operator::FloorDiv => &["//", "floordiv"],
            Operator::Mod => &["%", "mod"],
            Operator::Pow => &["^", "**", "pow"],
        }
    }

    pub fn from_token(token: &str) -> Option<Operator> {
        Self::ALL
            .into_iter()
            .find(|op| op.aliases().contains(&token))
    }

    /// `a OP b`, where `b` was on top of the stack.
    pub fn apply(&self, a: &Quantity, b: &Quantity) -> Result<Quantity, UnitError> {
        match self {
            Operator::Add => a.add(b),
            Operator::Sub => a.sub(b),
            Operator::Mul => a.mul(b),
            Operator::Div => a.div(b),
            Operator::FloorDiv => a.floor_div(b),
            Operator::Mod => a.rem(b),
            Operator::Pow => a.pow(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOp {
    // duplicate the top entry
    Copy,
    Pop,
    Swap,
    // reverse the whole stack
    Rev,
    // bottom entry moves to the top
    Rol,
    // top entry moves to the bottom
    Ror,
}

impl StackOp {
    pub const ALL: [StackOp; 6] = [
        StackOp::Copy,
        StackOp::Pop,
        StackOp::Swap,
        StackOp::Rev,
        StackOp::Rol,
        StackOp::Ror,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StackOp::Copy => "copy",
            StackOp::Pop => "pop",
            StackOp::Swap => "swap",
            StackOp::Rev => "rev",
            StackOp::Rol => "rol",
            StackOp::Ror => "ror",
        }
    }

    pub fn from_token(token: &str) -> Option<StackOp> {
        Self::ALL.into_iter().find(|op| op.name() == token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Test,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::List => "list",
            Command::Test => "test",
        }
    }

    pub fn from_token(token: &str) -> Option<Command> {
        match token {
            "help" => Some(Command::Help),
            "list" => Some(Command::List),
            "test" => Some(Command::Test),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // "5", "32.2 ft/s^2"
    Value(String),
    Op(Operator),
    Stack(StackOp),
    Command(Command),
}

pub fn parse_token(text: &str) -> Result<Token, CalcError> {
    let trimmed = text.trim();

    // Keywords win over values so that "-" is subtraction
    if let Some(op) = Operator::from_token(trimmed) {
        return Ok(Token::Op(op));
    }
    if let Some(op) = StackOp::from_token(trimmed) {
        return Ok(Token::Stack(op));
    }
    if let Some(cmd) = Command::from_token(trimmed) {
        return Ok(Token::Command(cmd));
    }
    if looks_like_number(trimmed) || looks_like_quantity(trimmed) {
        return Ok(Token::Value(trimmed.to_string()));
    }

    Err(CalcError::UnknownToken(text.to_string()))
}

pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Token>, CalcError> {
    tokens.iter().map(|t| parse_token(t.as_ref())).collect()
}
