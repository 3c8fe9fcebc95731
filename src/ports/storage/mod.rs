mod backend;
mod connector;

pub use backend::StorageBackend;
pub use connector::BackendConnector;
