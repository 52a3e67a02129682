//! Core render engine for diffrow: turns a structured diff document into
//! a display-ready row model with word-level change highlighting,
//! coalesced progress reporting and a cancellable worker.

pub mod model;
pub mod progress;
pub mod render;
pub mod words;
pub mod worker;

pub use model::{DiffDocument, FileDiff, Hunk, Line, LineKind, RenderError};
pub use progress::ProgressReporter;
pub use render::{FileRender, FileStats, RenderModel, RenderRow, RowClass, Span, SpanKind};
pub use worker::{
    RenderMessage, RenderOutcome, RenderRequest, RenderSettings, RenderSink, RenderState,
    RenderWorker,
};
