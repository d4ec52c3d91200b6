// Dimensional analysis: base dimensions, the unit registry, unit
// expressions and dimensioned values.

pub mod detector;
pub mod error;
pub mod quantity;
pub mod registry;
pub mod types;
pub mod unit;


pub use detector::{looks_like_number, looks_like_quantity};
pub use error::UnitError;
pub use quantity::{format_g, round_to_precision, Quantity};
pub use registry::Registry;
pub use types::{Dimensions, UnitDef, BASE_DIMENSIONS, DEFAULT_PRECISION, OFFSET_PRECISION};
pub use unit::{Terms, Unit};
