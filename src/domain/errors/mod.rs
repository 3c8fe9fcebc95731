mod gateway_errors;
mod validation_errors;

pub use gateway_errors::*;
pub use validation_errors::*;
