pub mod gateway;
pub mod object;
pub mod stats;

pub use gateway::*;
pub use object::*;
pub use stats::*;
