//! Line/hunk-to-render-row transformation

use crate::model::{FileDiff, Hunk, Line, LineKind};
use crate::words;
use crate::worker::RenderSettings;
use serde::Serialize;

/// Styling tag of a content span within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpanKind {
    Context,
    Added,
    Removed,
    /// Trailing whitespace run, rendered visually distinct
    Trailing,
}

/// A run of text inside a row, tagged for intra-line highlighting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub kind: SpanKind,
}

impl Span {
    pub fn new(text: impl Into<String>, kind: SpanKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Row class, mapped by the markup layer onto its medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowClass {
    Context,
    Added,
    Removed,
    HunkHeader,
}

/// Byte span into the original patch, forwarded untouched for staging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatchRef {
    pub offset: u64,
    pub length: u64,
}

/// One display row of the rendered diff
#[derive(Debug, Clone, Serialize)]
pub struct RenderRow {
    pub class: RowClass,
    pub gutter_old: Option<u64>,
    pub gutter_new: Option<u64>,
    pub spans: Vec<Span>,
    pub patch: Option<PatchRef>,
}

impl RenderRow {
    pub(crate) fn new(class: RowClass, gutter_old: Option<u64>, gutter_new: Option<u64>) -> Self {
        Self {
            class,
            gutter_old,
            gutter_new,
            spans: Vec::new(),
            patch: None,
        }
    }

    pub(crate) fn with_spans(mut self, spans: Vec<Span>) -> Self {
        self.spans = spans;
        self
    }

    fn with_patch(mut self, line: &Line) -> Self {
        self.patch = Some(PatchRef {
            offset: line.offset,
            length: line.length,
        });
        self
    }
}

/// Old/new line-number cursor threaded through one hunk's rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GutterCursor {
    pub old: u64,
    pub new: u64,
}

/// Change-magnitude indicator for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub added: u64,
    pub removed: u64,
    pub added_pct: u64,
    pub removed_pct: u64,
}

impl FileStats {
    /// None when the file has no changed lines; rendering an indicator
    /// for an empty change set would divide by zero, so it is omitted.
    fn from_counts(added: u64, removed: u64) -> Option<Self> {
        let total = added + removed;
        if total == 0 {
            return None;
        }
        let added_pct = added * 100 / total;
        Some(Self {
            added,
            removed,
            added_pct,
            removed_pct: 100 - added_pct,
        })
    }
}

/// The rendered rows of one file, plus its header metadata
#[derive(Debug, Clone, Serialize)]
pub struct FileRender {
    pub path: String,
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub similarity: u32,
    /// The empty filler entry painted behind the file list
    pub background: bool,
    pub stats: Option<FileStats>,
    pub rows: Vec<RenderRow>,
}

impl FileRender {
    /// The filler entry every render model starts with
    pub fn background() -> Self {
        Self {
            path: String::new(),
            old_path: None,
            new_path: None,
            similarity: 0,
            background: true,
            stats: None,
            rows: vec![RenderRow::new(RowClass::Context, None, None)],
        }
    }
}

/// The finished render model of one diff set
#[derive(Debug, Clone, Serialize)]
pub struct RenderModel {
    /// Decimal width of the highest line number, computed once per diff
    /// set; pads the no-number marker on header and background rows
    pub gutter_width: usize,
    pub files: Vec<FileRender>,
}

fn content_spans(line: &Line, kind: SpanKind) -> Vec<Span> {
    let mut spans = vec![Span::new(line.display_content(), kind)];
    if let Some(ws) = &line.trailing_whitespace {
        if !ws.is_empty() {
            spans.push(Span::new(ws.clone(), SpanKind::Trailing));
        }
    }
    spans
}

fn hunk_header_row(hunk: &Hunk) -> RenderRow {
    let header = format!(
        "@@ -{},{} +{},{} @@",
        hunk.range.old.start, hunk.range.old.lines, hunk.range.new.start, hunk.range.new.lines
    );
    RenderRow::new(RowClass::HunkHeader, None, None)
        .with_spans(vec![Span::new(header, SpanKind::Context)])
}

/// Render a single line as a plain row, advancing the gutter cursor
/// according to which sides the line belongs to. Unknown line kinds
/// degrade to a gutterless context row.
fn render_line(line: &Line, cursor: &mut GutterCursor) -> RenderRow {
    let row = match line.kind {
        LineKind::Context => {
            let row = RenderRow::new(
                RowClass::Context,
                Some(cursor.old),
                Some(cursor.new),
            );
            cursor.old += 1;
            cursor.new += 1;
            row
        }
        LineKind::Added => {
            let row = RenderRow::new(RowClass::Added, None, Some(cursor.new));
            cursor.new += 1;
            row
        }
        LineKind::Removed => {
            let row = RenderRow::new(RowClass::Removed, Some(cursor.old), None);
            cursor.old += 1;
            row
        }
        // No-newline variants and unknown kinds take no gutter slot
        LineKind::ContextNoNewline
        | LineKind::AddedNoNewline
        | LineKind::RemovedNoNewline
        | LineKind::Unknown => RenderRow::new(RowClass::Context, None, None),
    };
    let span_kind = match line.kind {
        LineKind::Added => SpanKind::Added,
        LineKind::Removed => SpanKind::Removed,
        _ => SpanKind::Context,
    };
    row.with_spans(content_spans(line, span_kind)).with_patch(line)
}

/// Render one file's hunks into rows.
///
/// Maximal runs of removed/added lines are refined through the word-diff
/// engine when enabled and both blocks are non-empty; everything else is
/// rendered line by line. `progress` is invoked with the number of input
/// lines consumed; returning false stops the render (cancellation), in
/// which case None is returned.
pub fn render_file(
    file: &FileDiff,
    settings: &RenderSettings,
    progress: &mut dyn FnMut(u64) -> bool,
) -> Option<FileRender> {
    let mut rows = Vec::new();
    let mut added: u64 = 0;
    let mut removed: u64 = 0;

    for hunk in &file.hunks {
        rows.push(hunk_header_row(hunk));
        let mut cursor = GutterCursor {
            old: hunk.range.old.start,
            new: hunk.range.new.start,
        };

        let lines = &hunk.lines;
        let mut i = 0;
        while i < lines.len() {
            if matches!(lines[i].kind, LineKind::Removed | LineKind::Added) {
                let start = i;
                while i < lines.len()
                    && matches!(lines[i].kind, LineKind::Removed | LineKind::Added)
                {
                    i += 1;
                }
                let run = &lines[start..i];
                let removed_block: Vec<&Line> = run
                    .iter()
                    .filter(|l| l.kind == LineKind::Removed)
                    .collect();
                let added_block: Vec<&Line> =
                    run.iter().filter(|l| l.kind == LineKind::Added).collect();
                removed += removed_block.len() as u64;
                added += added_block.len() as u64;

                let refined = if settings.word_diff
                    && !removed_block.is_empty()
                    && !added_block.is_empty()
                {
                    words::diff_words(
                        &removed_block,
                        &added_block,
                        cursor,
                        settings.word_diff_limit,
                    )
                } else {
                    None
                };

                match refined {
                    Some((mut word_rows, next)) => {
                        rows.append(&mut word_rows);
                        cursor = next;
                    }
                    None => {
                        for line in run {
                            rows.push(render_line(line, &mut cursor));
                        }
                    }
                }
                if !progress(run.len() as u64) {
                    return None;
                }
            } else {
                rows.push(render_line(&lines[i], &mut cursor));
                i += 1;
                if !progress(1) {
                    return None;
                }
            }
        }
    }

    let (old_path, new_path) = match &file.file {
        Some(paths) => (
            paths.old_path().map(str::to_string),
            paths.new_path().map(str::to_string),
        ),
        None => (None, None),
    };

    Some(FileRender {
        path: file.display_path().unwrap_or_default().to_string(),
        old_path,
        new_path,
        similarity: file.similarity,
        background: file.file.is_none(),
        stats: FileStats::from_counts(added, removed),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilePaths, FileSide, HunkRange, RangeSide};

    fn line(kind: LineKind, content: &str) -> Line {
        Line {
            kind,
            content: content.to_string(),
            offset: 0,
            length: content.len() as u64,
            trailing_whitespace: None,
        }
    }

    fn hunk(old: (u64, u64), new: (u64, u64), lines: Vec<Line>) -> Hunk {
        Hunk {
            range: HunkRange {
                old: RangeSide {
                    start: old.0,
                    lines: old.1,
                },
                new: RangeSide {
                    start: new.0,
                    lines: new.1,
                },
            },
            lines,
        }
    }

    fn file(hunks: Vec<Hunk>) -> FileDiff {
        FileDiff {
            file: Some(FilePaths {
                old: Some(FileSide {
                    path: Some("a.txt".to_string()),
                }),
                new: Some(FileSide {
                    path: Some("a.txt".to_string()),
                }),
            }),
            similarity: 0,
            hunks,
        }
    }

    fn render(file: &FileDiff, settings: &RenderSettings) -> FileRender {
        render_file(file, settings, &mut |_| true).unwrap()
    }

    fn plain_settings() -> RenderSettings {
        RenderSettings {
            word_diff: false,
            ..RenderSettings::default()
        }
    }

    #[test]
    fn test_hunk_line_accounting() {
        // 2 context + 1 removed on the old side, 2 context + 2 added on the new
        let f = file(vec![hunk(
            (10, 3),
            (12, 4),
            vec![
                line(LineKind::Context, "a"),
                line(LineKind::Removed, "b"),
                line(LineKind::Added, "B"),
                line(LineKind::Added, "C"),
                line(LineKind::Context, "d"),
            ],
        )]);
        let rendered = render(&f, &plain_settings());
        let old_rows = rendered
            .rows
            .iter()
            .filter(|r| r.gutter_old.is_some())
            .count();
        let new_rows = rendered
            .rows
            .iter()
            .filter(|r| r.gutter_new.is_some())
            .count();
        assert_eq!(old_rows, 3);
        assert_eq!(new_rows, 4);
    }

    #[test]
    fn test_gutter_numbers_start_at_range() {
        let f = file(vec![hunk(
            (10, 2),
            (20, 1),
            vec![
                line(LineKind::Context, "a"),
                line(LineKind::Removed, "b"),
            ],
        )]);
        let rendered = render(&f, &plain_settings());
        // rows[0] is the hunk header
        assert_eq!(rendered.rows[0].class, RowClass::HunkHeader);
        assert_eq!(rendered.rows[1].gutter_old, Some(10));
        assert_eq!(rendered.rows[1].gutter_new, Some(20));
        assert_eq!(rendered.rows[2].gutter_old, Some(11));
        assert_eq!(rendered.rows[2].gutter_new, None);
    }

    #[test]
    fn test_hunk_header_content() {
        let f = file(vec![hunk((3, 1), (7, 1), vec![line(LineKind::Context, "x")])]);
        let rendered = render(&f, &plain_settings());
        assert_eq!(rendered.rows[0].spans[0].text, "@@ -3,1 +7,1 @@");
        assert_eq!(rendered.rows[0].gutter_old, None);
        assert_eq!(rendered.rows[0].gutter_new, None);
    }

    #[test]
    fn test_unknown_kind_falls_back_to_context() {
        let f = file(vec![hunk(
            (1, 1),
            (1, 1),
            vec![
                line(LineKind::Unknown, "???"),
                line(LineKind::Context, "after"),
            ],
        )]);
        let rendered = render(&f, &plain_settings());
        let unknown = &rendered.rows[1];
        assert_eq!(unknown.class, RowClass::Context);
        assert_eq!(unknown.gutter_old, None);
        assert_eq!(unknown.gutter_new, None);
        // rendering continued past the unknown line
        assert_eq!(rendered.rows[2].spans[0].text, "after");
    }

    #[test]
    fn test_no_newline_strips_sentinel_and_takes_no_gutter() {
        let f = file(vec![hunk(
            (1, 1),
            (1, 1),
            vec![
                line(LineKind::Context, "a"),
                line(LineKind::ContextNoNewline, "=a"),
            ],
        )]);
        let rendered = render(&f, &plain_settings());
        let marker = &rendered.rows[2];
        assert_eq!(marker.class, RowClass::Context);
        assert_eq!(marker.spans[0].text, "a");
        assert_eq!(marker.gutter_old, None);
        assert_eq!(marker.gutter_new, None);
    }

    #[test]
    fn test_stats_percentages() {
        let f = file(vec![hunk(
            (1, 2),
            (1, 1),
            vec![
                line(LineKind::Removed, "x"),
                line(LineKind::Removed, "y"),
                line(LineKind::Added, "z"),
            ],
        )]);
        let rendered = render(&f, &plain_settings());
        let stats = rendered.stats.unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(stats.removed, 2);
        assert_eq!(stats.added_pct, 33);
        assert_eq!(stats.removed_pct, 67);
    }

    #[test]
    fn test_stats_omitted_without_changes() {
        let f = file(vec![hunk(
            (1, 2),
            (1, 2),
            vec![line(LineKind::Context, "a"), line(LineKind::Context, "b")],
        )]);
        let rendered = render(&f, &plain_settings());
        assert!(rendered.stats.is_none());
    }

    #[test]
    fn test_word_diff_refines_paired_blocks() {
        let f = file(vec![hunk(
            (1, 1),
            (1, 1),
            vec![
                line(LineKind::Removed, "a b c"),
                line(LineKind::Added, "a x c"),
            ],
        )]);
        let rendered = render(&f, &RenderSettings::default());
        // header + removed-side row + added-side row
        assert_eq!(rendered.rows.len(), 3);
        let removed_row = &rendered.rows[1];
        assert_eq!(removed_row.class, RowClass::Removed);
        assert!(removed_row
            .spans
            .iter()
            .any(|s| s.kind == SpanKind::Removed && s.text == "b"));
    }

    #[test]
    fn test_word_diff_limit_falls_back_to_plain() {
        let settings = RenderSettings {
            word_diff_limit: 2,
            ..RenderSettings::default()
        };
        let f = file(vec![hunk(
            (1, 1),
            (1, 1),
            vec![
                line(LineKind::Removed, "a b c d e"),
                line(LineKind::Added, "a x c d e"),
            ],
        )]);
        let rendered = render(&f, &settings);
        // plain fallback: one removed row then one added row, whole lines
        assert_eq!(rendered.rows.len(), 3);
        assert_eq!(rendered.rows[1].spans.len(), 1);
        assert_eq!(rendered.rows[1].spans[0].kind, SpanKind::Removed);
        assert_eq!(rendered.rows[2].spans[0].kind, SpanKind::Added);
    }

    #[test]
    fn test_trailing_whitespace_span() {
        let mut l = line(LineKind::Context, "code");
        l.trailing_whitespace = Some("   ".to_string());
        let f = file(vec![hunk((1, 1), (1, 1), vec![l])]);
        let rendered = render(&f, &plain_settings());
        let spans = &rendered.rows[1].spans;
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].kind, SpanKind::Trailing);
        assert_eq!(spans[1].text, "   ");
    }

    #[test]
    fn test_cancel_stops_mid_file() {
        let f = file(vec![hunk(
            (1, 3),
            (1, 3),
            vec![
                line(LineKind::Context, "a"),
                line(LineKind::Context, "b"),
                line(LineKind::Context, "c"),
            ],
        )]);
        let mut seen = 0u64;
        let out = render_file(&f, &plain_settings(), &mut |n| {
            seen += n;
            seen < 2
        });
        assert!(out.is_none());
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_background_file_render() {
        let bg = FileRender::background();
        assert!(bg.background);
        assert!(bg.stats.is_none());
        assert_eq!(bg.rows.len(), 1);
        assert_eq!(bg.rows[0].class, RowClass::Context);
    }
}
