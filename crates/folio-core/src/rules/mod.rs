pub mod validation;

pub use validation::{validate_field_bag, validate_reason};
