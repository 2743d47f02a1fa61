//! # shovel
//!
//! Packages a source directory into a timestamped zip archive
//! (`source_YYYY.MM.DD.HHMMSS.zip`) and extracts such archives into a
//! timestamped deploy directory (`deploy_YYYY.MM.DD.HHMMSS`).
//!
//! ```no_run
//! use shovel::{Archiver, RegexIgnore, Timestamp};
//! use std::path::Path;
//!
//! fn main() -> shovel::Result<()> {
//!     let mut archiver = Archiver::new(Some(Timestamp::from_unix(1518044860)?));
//!
//!     let created = archiver.try_create(Path::new("app"), Some(Path::new("builds")), &RegexIgnore::default_pattern())?;
//!     archiver.try_extract(&created.path, Some(Path::new("/srv/www")))?;
//!     Ok(())
//! }
//! ```

pub mod archiver;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod naming;
pub mod platform;
pub mod result;
pub mod tpl;
pub mod utils;

pub use archiver::{Archiver, ExecutionLog, LogEntry, Operation, Outcome};
pub use error::Error;
pub use filter::{Ignore, NoIgnore, RegexIgnore};
pub use naming::{Timestamp, archive_name, deploy_name};
pub use result::Result;
