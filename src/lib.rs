// Library surface for headless/integration tests and reuse.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod input;
pub mod logger;
pub mod records;
pub mod runtime;
pub mod stopwatch;
pub mod store;
pub mod ui;

pub use duration::{format_duration, parse_duration, RecordedTime};
pub use stopwatch::Stopwatch;
