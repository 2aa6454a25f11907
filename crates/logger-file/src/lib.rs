//! Rotating file sinks for hooklog
//!
//! Records at or above a threshold are written to files that rotate on a
//! fixed period and, optionally, a size cap. Old files are pruned after a
//! retention period and a symlink always points at the file being written.
//!
//! By default every level gets its own file (`app.log.error.2024-01-02`,
//! linked from `app.log.error`); [`FileNaming::Shared`] puts all levels in one.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod error;
mod hook;
mod sink;
mod writer;

pub use error::{Error, Result};
pub use hook::{RotateHookExt, RotateOptions};
pub use sink::{FileNaming, RotatingFileSink, Rotation};
pub use writer::{RotatingWriter, RotatingWriterConfig};
