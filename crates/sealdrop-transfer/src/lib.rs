//! sealdrop-transfer: the chunked transfer engine
//!
//! One file moves as a short sequence of fixed-size segments, each
//! encrypted independently and transferred strictly in order. Transient
//! transport failures retry a bounded number of times per segment; an
//! authentication failure on decrypt aborts the whole file. Progress is
//! reported through a throttled callback as a percentage of the total
//! encrypted byte count.

pub mod engine;
pub mod plan;
pub mod progress;
pub mod retry;

pub use engine::{
    download_file, upload_file, DownloadOutcome, FileSpec, SegmentStore, UploadOutcome,
};
pub use plan::{plan_segments, segment_count, SEGMENT_SIZE};
pub use progress::{ProgressFn, ProgressThrottle, REPORT_INTERVAL};
pub use retry::RetryPolicy;
