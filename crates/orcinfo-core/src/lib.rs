pub mod accessor;
pub mod config;
pub mod error;
pub mod logging;
pub mod orc;
pub mod probe;
pub mod report;
pub mod retry;
pub mod target;
pub mod trailer;

pub use accessor::{ObjectAccessor, RouterAccessor};
pub use error::{ConfigError, ErrorKind, ProbeError};
pub use probe::{run_batch, BatchOptions, BatchProgress, CancelToken, ProbeResult};
pub use target::ObjectLocation;
pub use trailer::{Locator, TrailerInfo};
