//! Batch data engine
//!
//! Turns a strategy document plus a row table into one atomic unit per row
//! and dispatches them sequentially.

pub mod engine;
pub mod progress;
pub mod substitute;
pub mod summary;

pub use engine::{build_renders, prepare_operations, BatchEngine, BatchOptions, PreparedOperation};
pub use progress::{LogProgress, ProgressEvent, ProgressSink, ProgressStatus};
pub use substitute::{render_filename, substitute_image_path, substitute_text};
pub use summary::{BatchSummary, SkippedOperation};
