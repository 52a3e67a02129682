//! Word-level refinement of paired removed/added line runs

use crate::model::Line;
use crate::render::{GutterCursor, RenderRow, RowClass, Span, SpanKind};

/// A unit of the word-diff alphabet: a text token or a line boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordToken {
    Text(String),
    Newline,
}

/// Split one line of text at word boundaries. Alphanumeric runs form one
/// token, underscores and tabs are single-character tokens, and any other
/// run of characters is kept together.
pub fn split_words(text: &str) -> Vec<String> {
    #[derive(PartialEq)]
    enum Class {
        Word,
        Other,
    }

    let mut tokens = Vec::new();
    let mut run = String::new();
    let mut class = Class::Other;

    for ch in text.chars() {
        if ch == '_' || ch == '\t' {
            if !run.is_empty() {
                tokens.push(std::mem::take(&mut run));
            }
            tokens.push(ch.to_string());
            continue;
        }
        let next = if ch.is_alphanumeric() {
            Class::Word
        } else {
            Class::Other
        };
        if next != class && !run.is_empty() {
            tokens.push(std::mem::take(&mut run));
        }
        class = next;
        run.push(ch);
    }
    if !run.is_empty() {
        tokens.push(run);
    }
    tokens
}

/// Tokenize a block of lines. Each line contributes its display content
/// followed by its trailing whitespace, then an explicit newline token;
/// the newline after the last line is included so every line is closed.
pub fn tokenize(lines: &[&Line]) -> Vec<WordToken> {
    let mut tokens = Vec::new();
    for line in lines {
        let mut text = line.display_content().to_string();
        if let Some(ws) = &line.trailing_whitespace {
            text.push_str(ws);
        }
        for word in split_words(&text) {
            tokens.push(WordToken::Text(word));
        }
        tokens.push(WordToken::Newline);
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Keep,
    Insert,
    Delete,
    Substitute,
}

/// A minimal edit script between two token sequences
#[derive(Debug, Clone)]
pub struct EditScript {
    pub cost: u32,
    pub ops: Vec<EditOp>,
}

#[derive(Clone, Copy)]
enum Dir {
    Diag,
    Up,
    Left,
}

/// Wagner-Fischer over the token alphabet. Costs are 0 for a kept token,
/// 1 for an insertion or deletion and 2 for a substitution, so replacing
/// a token never beats keeping an equal one. Ties between neighbors are
/// broken toward the diagonal when it is strictly cheaper, then toward
/// insertion over deletion.
pub fn edit_distance(a: &[WordToken], b: &[WordToken]) -> EditScript {
    let n = a.len();
    let m = b.len();
    let w = m + 1;
    let mut cost = vec![0u32; (n + 1) * w];
    let mut dir = vec![Dir::Diag; (n + 1) * w];
    for j in 1..=m {
        cost[j] = j as u32;
        dir[j] = Dir::Left;
    }
    for i in 1..=n {
        cost[i * w] = i as u32;
        dir[i * w] = Dir::Up;
    }

    for i in 1..=n {
        for j in 1..=m {
            let ins = cost[i * w + j - 1];
            let del = cost[(i - 1) * w + j];
            let sub = cost[(i - 1) * w + j - 1];
            let sub_cost = if a[i - 1] == b[j - 1] { 0 } else { 2 };
            let (c, d) = if ins <= del {
                if sub < ins {
                    (sub + sub_cost, Dir::Diag)
                } else {
                    (ins + 1, Dir::Left)
                }
            } else if del <= sub {
                (del + 1, Dir::Up)
            } else {
                (sub + sub_cost, Dir::Diag)
            };
            cost[i * w + j] = c;
            dir[i * w + j] = d;
        }
    }

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        match dir[i * w + j] {
            Dir::Diag => {
                ops.push(if a[i - 1] == b[j - 1] {
                    EditOp::Keep
                } else {
                    EditOp::Substitute
                });
                i -= 1;
                j -= 1;
            }
            Dir::Left => {
                ops.push(EditOp::Insert);
                j -= 1;
            }
            Dir::Up => {
                ops.push(EditOp::Delete);
                i -= 1;
            }
        }
    }
    ops.reverse();

    EditScript {
        cost: cost[n * w + m],
        ops,
    }
}

/// Replay state: one span buffer per side, flushed into rows at line
/// boundaries. The flags track whether the open line pair saw any
/// deletion or insertion, which decides how a shared newline closes it.
struct Replay {
    rows: Vec<RenderRow>,
    old_spans: Vec<Span>,
    new_spans: Vec<Span>,
    has_del: bool,
    has_ins: bool,
    cursor: GutterCursor,
}

fn push_span(spans: &mut Vec<Span>, text: &str, kind: SpanKind) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut() {
        if last.kind == kind {
            last.text.push_str(text);
            return;
        }
    }
    spans.push(Span::new(text, kind));
}

impl Replay {
    fn new(cursor: GutterCursor) -> Self {
        Self {
            rows: Vec::new(),
            old_spans: Vec::new(),
            new_spans: Vec::new(),
            has_del: false,
            has_ins: false,
            cursor,
        }
    }

    fn close_row(&mut self, class: RowClass, old: Option<u64>, new: Option<u64>, spans: Vec<Span>) {
        self.rows
            .push(RenderRow::new(class, old, new).with_spans(spans));
    }

    fn keep(&mut self, token: &WordToken) {
        match token {
            WordToken::Text(t) => {
                push_span(&mut self.old_spans, t, SpanKind::Context);
                push_span(&mut self.new_spans, t, SpanKind::Context);
            }
            WordToken::Newline => {
                let old_spans = std::mem::take(&mut self.old_spans);
                let new_spans = std::mem::take(&mut self.new_spans);
                match (self.has_del, self.has_ins) {
                    (false, false) => {
                        self.close_row(
                            RowClass::Context,
                            Some(self.cursor.old),
                            Some(self.cursor.new),
                            old_spans,
                        );
                    }
                    (true, false) => {
                        self.close_row(
                            RowClass::Removed,
                            Some(self.cursor.old),
                            Some(self.cursor.new),
                            old_spans,
                        );
                    }
                    (false, true) => {
                        self.close_row(
                            RowClass::Added,
                            Some(self.cursor.old),
                            Some(self.cursor.new),
                            new_spans,
                        );
                    }
                    (true, true) => {
                        self.close_row(RowClass::Removed, Some(self.cursor.old), None, old_spans);
                        self.close_row(RowClass::Added, None, Some(self.cursor.new), new_spans);
                    }
                }
                self.cursor.old += 1;
                self.cursor.new += 1;
                self.has_del = false;
                self.has_ins = false;
            }
        }
    }

    fn delete(&mut self, token: &WordToken) {
        match token {
            WordToken::Text(t) => {
                push_span(&mut self.old_spans, t, SpanKind::Removed);
                self.has_del = true;
            }
            WordToken::Newline => {
                let spans = std::mem::take(&mut self.old_spans);
                self.close_row(RowClass::Removed, Some(self.cursor.old), None, spans);
                self.cursor.old += 1;
                self.has_del = false;
            }
        }
    }

    fn insert(&mut self, token: &WordToken) {
        match token {
            WordToken::Text(t) => {
                push_span(&mut self.new_spans, t, SpanKind::Added);
                self.has_ins = true;
            }
            WordToken::Newline => {
                let spans = std::mem::take(&mut self.new_spans);
                self.close_row(RowClass::Added, None, Some(self.cursor.new), spans);
                self.cursor.new += 1;
                self.has_ins = false;
            }
        }
    }
}

/// Refine a paired removed/added block into word-highlighted rows.
///
/// Returns None when either side tokenizes to more than `limit` tokens;
/// the caller then falls back to whole-line rendering. On success the
/// rows and the advanced gutter cursor are returned.
pub fn diff_words(
    removed: &[&Line],
    added: &[&Line],
    cursor: GutterCursor,
    limit: usize,
) -> Option<(Vec<RenderRow>, GutterCursor)> {
    let a = tokenize(removed);
    let b = tokenize(added);
    if a.len().max(b.len()) > limit {
        return None;
    }

    let script = edit_distance(&a, &b);
    let mut replay = Replay::new(cursor);
    let (mut i, mut j) = (0, 0);
    for op in &script.ops {
        match op {
            EditOp::Keep => {
                replay.keep(&a[i]);
                i += 1;
                j += 1;
            }
            EditOp::Delete => {
                replay.delete(&a[i]);
                i += 1;
            }
            EditOp::Insert => {
                replay.insert(&b[j]);
                j += 1;
            }
            EditOp::Substitute => {
                replay.delete(&a[i]);
                replay.insert(&b[j]);
                i += 1;
                j += 1;
            }
        }
    }

    Some((replay.rows, replay.cursor))
}
