//! ORC tail format: protobuf messages, compression streams, and decoding.

pub mod compression;
#[cfg(any(test, feature = "test-util"))]
pub mod fixture;
pub mod proto;
pub mod tail;

pub use compression::Compression;
pub use tail::{read_tail, FileTail, MIN_FILE_LEN, ORC_MAGIC};
