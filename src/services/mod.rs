mod gateway;
mod stats_aggregator;

pub use gateway::{
    BucketPage, DEFAULT_RECONNECT_BACKOFF, Gateway, GatewayHealth, GatewayPolicy, GatewayState,
    MAX_PRESIGN_EXPIRY_SECS, MockPolicy,
};
pub use stats_aggregator::{DEFAULT_PAGE_SIZE, PageTotals, StatsAggregator, StatsCursor};
