pub mod errors;
pub mod models;
pub mod value_objects;

// Re-export commonly used types
pub use errors::{ErrorKind, GatewayError, GatewayResult, ValidationError};
pub use models::*;
pub use value_objects::*;
