#![forbid(unsafe_code)]

//! Test harness for `treetable-core`.
//!
//! - [`PageModel`]: a render sink that keeps its own copy of the page and a
//!   command log, so tests can check what the engine pushed.
//! - [`TextRenderer`]: draws the page as an indented text tree.
//! - [`ScenarioRunner`]: replays scripted steps and checksums every frame.

pub mod page;
pub mod scenario;
pub mod text;

pub use page::{Divergence, PageModel, SinkCommand};
pub use scenario::{FrameRecord, ScenarioReport, ScenarioRunner, Step, frame_checksum};
pub use text::{TextRenderer, TreeGuides, display_text};
