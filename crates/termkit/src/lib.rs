//! # termkit
//!
//! Small terminal toolkit shared by the serverkit binary.
//!
//! - [`messages`]: one-line status output with a symbol per level
//!   (`✓` success, `✗` error, `⚠` warning, `ℹ` info)
//! - [`layout`]: headers, sections, `key: value` rows and `[n/total]` steps
//! - [`progress`]: [`StageProgress`], which shows a spinner per stage and
//!   replaces it with one result line; the spinner stays silent when stderr
//!   is not a terminal
//! - [`format`]: durations, counts and truncation
//!
//! ```no_run
//! use termkit::{StageProgress, human_duration, kv, header};
//!
//! header("Plan");
//! kv("Profile", "hardened");
//!
//! let mut stages = StageProgress::new(2);
//! stages.start("user");
//! stages.finish("user applied");
//! stages.start("ssh");
//! stages.finish("ssh skipped");
//!
//! assert_eq!(human_duration(std::time::Duration::from_millis(1500)), "1.5s");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format;
pub mod layout;
pub mod messages;
pub mod progress;

pub use format::{human_duration, pluralize, truncate};
pub use layout::{header, kv, section, step};
pub use messages::{dim, error, info, success, warn};
pub use progress::StageProgress;
