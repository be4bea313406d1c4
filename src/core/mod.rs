pub mod error;
pub mod ids;
pub mod nullable;
pub mod time;

pub use error::{RemoteError, RemoteResult, Result, SyncError};
pub use ids::{LocalIdGenerator, parse_numeric_id};
pub use time::{parse_timestamp, timestamp_from_value};
