//! Typed in-memory representation of the input diff document

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Structural error: {0}")]
    Structural(String),
    #[error("Source fetch error: {0}")]
    SourceFetch(String),
}

impl RenderError {
    /// Stable kind tag for the error payload of a failed render
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::Structural(_) => "structural",
            RenderError::SourceFetch(_) => "source-fetch",
        }
    }
}

/// The kind of a diff line, decoded from the single-byte sentinel the
/// diff source emits. Unknown sentinels are kept explicit so rendering
/// can degrade leniently instead of aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineKind {
    Context,
    Added,
    Removed,
    /// Context line where the old file lacked a trailing newline
    ContextNoNewline,
    /// Added line without a trailing newline
    AddedNoNewline,
    /// Removed line without a trailing newline
    RemovedNoNewline,
    Unknown,
}

impl LineKind {
    pub fn from_code(code: u32) -> Self {
        match code {
            c if c == u32::from(b' ') => LineKind::Context,
            c if c == u32::from(b'+') => LineKind::Added,
            c if c == u32::from(b'-') => LineKind::Removed,
            c if c == u32::from(b'=') => LineKind::ContextNoNewline,
            c if c == u32::from(b'>') => LineKind::AddedNoNewline,
            c if c == u32::from(b'<') => LineKind::RemovedNoNewline,
            _ => LineKind::Unknown,
        }
    }

    /// True if the line occupies a line number in the old revision
    pub fn counts_old(self) -> bool {
        matches!(self, LineKind::Context | LineKind::Removed)
    }

    /// True if the line occupies a line number in the new revision
    pub fn counts_new(self) -> bool {
        matches!(self, LineKind::Context | LineKind::Added)
    }

    /// No-trailing-newline variants carry a sentinel character in front
    /// of their content that must be stripped before display
    pub fn has_sentinel(self) -> bool {
        matches!(
            self,
            LineKind::ContextNoNewline | LineKind::AddedNoNewline | LineKind::RemovedNoNewline
        )
    }
}

fn line_kind_from_code<'de, D>(deserializer: D) -> Result<LineKind, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u32::deserialize(deserializer)?;
    Ok(LineKind::from_code(code))
}

/// A single diff line
#[derive(Debug, Clone, Deserialize)]
pub struct Line {
    #[serde(rename = "type", deserialize_with = "line_kind_from_code")]
    pub kind: LineKind,
    pub content: String,
    /// Byte span into the original patch; opaque to the engine, carried
    /// through for the staging collaborator
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub length: u64,
    /// Trailing whitespace run, split off by the source so it can be
    /// visually distinguished
    #[serde(default)]
    pub trailing_whitespace: Option<String>,
}

impl Line {
    /// Line content with the no-newline sentinel stripped
    pub fn display_content(&self) -> &str {
        if self.kind.has_sentinel() && !self.content.is_empty() {
            let mut chars = self.content.chars();
            chars.next();
            chars.as_str()
        } else {
            &self.content
        }
    }
}

/// One side of a hunk range
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RangeSide {
    pub start: u64,
    pub lines: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HunkRange {
    pub old: RangeSide,
    pub new: RangeSide,
}

/// A contiguous block of a diff: an old/new line range and the lines within
#[derive(Debug, Clone, Deserialize)]
pub struct Hunk {
    pub range: HunkRange,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileSide {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilePaths {
    #[serde(default)]
    pub old: Option<FileSide>,
    #[serde(default)]
    pub new: Option<FileSide>,
}

impl FilePaths {
    pub fn old_path(&self) -> Option<&str> {
        self.old.as_ref().and_then(|s| s.path.as_deref())
    }

    pub fn new_path(&self) -> Option<&str> {
        self.new.as_ref().and_then(|s| s.path.as_deref())
    }
}

/// A single file's diff: paths, rename score and hunks
#[derive(Debug, Clone, Deserialize)]
pub struct FileDiff {
    /// Absent for the background filler entry
    #[serde(default)]
    pub file: Option<FilePaths>,
    /// Rename detection score, 0 if not a rename
    #[serde(default)]
    pub similarity: u32,
    #[serde(default)]
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Display path: the new path when present, otherwise the old one
    pub fn display_path(&self) -> Option<&str> {
        let paths = self.file.as_ref()?;
        paths.new_path().or_else(|| paths.old_path())
    }
}

/// The complete diff document of one render request, as fetched from the
/// diff source: the file diffs plus the pre-computed totals the progress
/// reporter and gutter layout are measured against
#[derive(Debug, Clone, Deserialize)]
pub struct DiffDocument {
    pub diff: Vec<FileDiff>,
    /// Total number of hunk lines across all files
    pub lines: u64,
    /// Highest line number appearing anywhere in the diff
    pub maxlines: u64,
}

impl DiffDocument {
    pub fn from_json(text: &str) -> Result<Self, RenderError> {
        serde_json::from_str(text).map_err(|e| RenderError::SourceFetch(e.to_string()))
    }

    /// Fail-fast shape validation: every file must name at least one path,
    /// and every hunk's declared range must agree with its line count.
    pub fn validate(&self) -> Result<(), RenderError> {
        for (fidx, file) in self.diff.iter().enumerate() {
            if let Some(paths) = &file.file {
                if paths.old_path().is_none() && paths.new_path().is_none() {
                    return Err(RenderError::Structural(format!(
                        "file #{fidx} has neither an old nor a new path"
                    )));
                }
            }
            for (hidx, hunk) in file.hunks.iter().enumerate() {
                let old_count = hunk.lines.iter().filter(|l| l.kind.counts_old()).count() as u64;
                let new_count = hunk.lines.iter().filter(|l| l.kind.counts_new()).count() as u64;
                if old_count != hunk.range.old.lines {
                    return Err(RenderError::Structural(format!(
                        "file #{fidx} hunk #{hidx}: range declares {} old lines, found {}",
                        hunk.range.old.lines, old_count
                    )));
                }
                if new_count != hunk.range.new.lines {
                    return Err(RenderError::Structural(format!(
                        "file #{fidx} hunk #{hidx}: range declares {} new lines, found {}",
                        hunk.range.new.lines, new_count
                    )));
                }
            }
        }
        Ok(())
    }
}
