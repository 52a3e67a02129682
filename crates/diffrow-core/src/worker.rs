//! Render orchestration: settings, message protocol and the worker thread

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::model::{DiffDocument, RenderError};
use crate::progress::ProgressReporter;
use crate::render::{render_file, FileRender, RenderModel};

/// Knobs of one render pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Display width of a tab stop, in character cells
    pub tab_width: u32,
    /// Refine paired removed/added runs with word-level highlighting
    pub word_diff: bool,
    /// Per-side token ceiling above which word diffing falls back to
    /// whole-line rendering
    pub word_diff_limit: usize,
    /// Carry patch byte spans for staging individual lines
    pub staged: bool,
    pub unstaged: bool,
    /// Minimum ratio distance between two progress ticks
    pub tick_step: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            tab_width: 4,
            word_diff: true,
            word_diff_limit: 1000,
            staged: false,
            unstaged: false,
            tick_step: 0.01,
        }
    }
}

/// One render job: the document and the settings to render it under
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub document: DiffDocument,
    pub settings: RenderSettings,
}

/// Messages emitted while a render runs. `Done` and `Failed` are
/// terminal; nothing follows them.
#[derive(Debug, Clone)]
pub enum RenderMessage {
    Progress(f64),
    Log(String),
    Done(RenderModel),
    Failed { kind: &'static str, message: String },
}

/// Observable lifecycle of a render job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RenderState {
    /// Fold one message into the state. Terminal states absorb nothing.
    pub fn absorb(&mut self, message: &RenderMessage) {
        if self.is_terminal() {
            return;
        }
        *self = match message {
            RenderMessage::Progress(_) | RenderMessage::Log(_) => RenderState::Running,
            RenderMessage::Done(_) => RenderState::Completed,
            RenderMessage::Failed { .. } => RenderState::Failed,
        };
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RenderState::Completed | RenderState::Cancelled | RenderState::Failed
        )
    }
}

/// Where a running render reports to. `keep_going` is polled per consumed
/// input line, so a false return stops the render promptly.
pub trait RenderSink {
    fn progress(&mut self, ratio: f64);
    fn log(&mut self, message: &str);
    fn keep_going(&self) -> bool;
}

/// How a render pass ended when it did not error
#[derive(Debug)]
pub enum RenderOutcome {
    Completed(RenderModel),
    Cancelled,
}

/// Render a full document into a display model.
///
/// Validates the document, then renders each file in order behind a
/// background filler entry, reporting coalesced progress through `sink`.
pub fn render(request: &RenderRequest, sink: &mut dyn RenderSink) -> Result<RenderOutcome, RenderError> {
    let document = &request.document;
    document.validate()?;

    log::debug!(
        "rendering {} file(s), {} line(s)",
        document.diff.len(),
        document.lines
    );

    let mut reporter = ProgressReporter::new(document.lines, request.settings.tick_step);
    let mut files = Vec::with_capacity(document.diff.len() + 1);
    files.push(FileRender::background());

    for file in &document.diff {
        let mut progress = |consumed: u64| {
            if let Some(ratio) = reporter.advance(consumed) {
                sink.progress(ratio);
            }
            sink.keep_going()
        };
        match render_file(file, &request.settings, &mut progress) {
            Some(rendered) => files.push(rendered),
            None => {
                sink.log("render cancelled");
                return Ok(RenderOutcome::Cancelled);
            }
        }
    }

    Ok(RenderOutcome::Completed(RenderModel {
        gutter_width: document.maxlines.max(1).to_string().len(),
        files,
    }))
}

/// Sink backed by an mpsc channel and a shared cancellation flag. Once
/// cancelled or disconnected it reports nothing further and asks the
/// render to stop.
pub struct ChannelSink {
    sender: mpsc::Sender<RenderMessage>,
    cancelled: Arc<AtomicBool>,
    disconnected: bool,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<RenderMessage>, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            sender,
            cancelled,
            disconnected: false,
        }
    }

    fn send(&mut self, message: RenderMessage) {
        if self.cancelled.load(Ordering::Relaxed) {
            return;
        }
        if self.sender.send(message).is_err() {
            self.disconnected = true;
        }
    }
}

impl RenderSink for ChannelSink {
    fn progress(&mut self, ratio: f64) {
        self.send(RenderMessage::Progress(ratio));
    }

    fn log(&mut self, message: &str) {
        self.send(RenderMessage::Log(message.to_string()));
    }

    fn keep_going(&self) -> bool {
        !self.disconnected && !self.cancelled.load(Ordering::Relaxed)
    }
}

/// A render job running on its own thread, reporting over a channel
pub struct RenderWorker {
    receiver: mpsc::Receiver<RenderMessage>,
    cancelled: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RenderWorker {
    /// Spawn the render on a background thread. Messages arrive on
    /// [`RenderWorker::messages`]; the stream ends with `Done`, `Failed`,
    /// or silently on cancellation.
    pub fn spawn(request: RenderRequest) -> Self {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = thread::spawn(move || {
            let mut sink = ChannelSink::new(sender, flag);
            // terminal messages go through the sink so a cancel that
            // races completion still silences them
            match render(&request, &mut sink) {
                Ok(RenderOutcome::Completed(model)) => {
                    sink.send(RenderMessage::Done(model));
                }
                Ok(RenderOutcome::Cancelled) => {}
                Err(err) => {
                    sink.send(RenderMessage::Failed {
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                }
            }
        });

        Self {
            receiver,
            cancelled,
            handle: Some(handle),
        }
    }

    pub fn messages(&self) -> &mpsc::Receiver<RenderMessage> {
        &self.receiver
    }

    /// Ask the render to stop. Nothing more is reported after this.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Wait for the worker thread to finish
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}
