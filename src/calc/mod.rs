pub mod executor;
pub mod formatter;
pub mod parser;
pub mod selftest;

pub use executor::*;
pub use formatter::*;
pub use parser::*;
pub use selftest::run_selftest;
