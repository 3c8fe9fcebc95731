//! In-memory storage backend used when no live endpoint is available

mod mock_store;

pub use mock_store::{DEMO_BUCKETS, DEMO_OBJECTS, MOCK_URL_BASE, MockStore};
