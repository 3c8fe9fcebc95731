pub mod bucket_handlers;
pub mod object_handlers;
pub mod system_handlers;

pub use bucket_handlers::*;
pub use object_handlers::*;
pub use system_handlers::*;
