//! HTML output for a rendered diff model

use diffrow_core::render::{FileRender, FileStats, RenderRow, RowClass, Span, SpanKind};
use diffrow_core::{RenderModel, RenderSettings};
use rustc_hash::FxHashMap;

use crate::template::Template;

/// Built-in per-file template, used unless the user supplies their own
pub const DEFAULT_FILE_TEMPLATE: &str = r#"<div class="file ${FILE_CLASSES}" data-filename="${FILE_FILENAME}">
  <div class="header">
    <span class="path">${FILE_PATH}</span>
    <span class="stats"><!-- ${FILE_STATS} --></span>
  </div>
  <table class="diff">
    <!-- ${FILE_BODY} -->
  </table>
</div>"#;

pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wrap each tab in a fixed-width span so tab stops render at the
/// configured width. Runs after escaping; tabs survive it untouched.
fn expand_tabs(escaped: &str, tab_width: u32) -> String {
    if !escaped.contains('\t') {
        return escaped.to_string();
    }
    escaped.replace(
        '\t',
        &format!("<span class=\"tab\" style=\"width: {tab_width}ex\">\t</span>"),
    )
}

fn span_html(span: &Span, tab_width: u32) -> String {
    let text = expand_tabs(&html_escape(&span.text), tab_width);
    match span.kind {
        SpanKind::Context => text,
        SpanKind::Added => format!("<span class=\"added\">{text}</span>"),
        SpanKind::Removed => format!("<span class=\"removed\">{text}</span>"),
        SpanKind::Trailing => format!("<span class=\"trailing\">{text}</span>"),
    }
}

fn row_class(class: RowClass) -> &'static str {
    match class {
        RowClass::Context => "context",
        RowClass::Added => "added",
        RowClass::Removed => "removed",
        RowClass::HunkHeader => "hunk-header",
    }
}

/// A gutter cell: the line number, a width-padded dot filler on rows
/// that carry no numbers at all, or an empty cell on the missing side
/// of an added/removed row
fn gutter_cell(side: &str, number: Option<u64>, width: usize, dotted: bool) -> String {
    let text = match number {
        Some(n) => n.to_string(),
        None if dotted => ".".repeat(width),
        None => String::new(),
    };
    format!("<td class=\"gutter {side}\">{text}</td>")
}

fn row_html(
    row: &RenderRow,
    gutter_width: usize,
    settings: &RenderSettings,
    background: bool,
) -> String {
    let mut attrs = String::new();
    if settings.staged || settings.unstaged {
        if let Some(patch) = &row.patch {
            attrs = format!(" data-offset=\"{}\" data-length=\"{}\"", patch.offset, patch.length);
        }
    }
    let spans: String = row
        .spans
        .iter()
        .map(|s| span_html(s, settings.tab_width))
        .collect();
    let dotted = background || row.class == RowClass::HunkHeader;
    format!(
        "<tr class=\"{}\"{}>{}{}<td class=\"content\">{}</td></tr>",
        row_class(row.class),
        attrs,
        gutter_cell("old", row.gutter_old, gutter_width, dotted),
        gutter_cell("new", row.gutter_new, gutter_width, dotted),
        spans,
    )
}

fn stats_html(stats: &FileStats) -> String {
    format!(
        "<span class=\"number added\">+{}</span>\
         <span class=\"number removed\">-{}</span>\
         <span class=\"bar\">\
         <span class=\"added\" style=\"width: {}%;\"></span>\
         <span class=\"removed\" style=\"width: {}%;\"></span>\
         </span>",
        stats.added, stats.removed, stats.added_pct, stats.removed_pct
    )
}

fn display_path(file: &FileRender) -> String {
    match (&file.old_path, &file.new_path) {
        (Some(old), Some(new)) if old != new => format!("{old} \u{2192} {new}"),
        _ => file.path.clone(),
    }
}

fn file_html(
    file: &FileRender,
    gutter_width: usize,
    settings: &RenderSettings,
    template: &Template,
) -> String {
    let body: String = file
        .rows
        .iter()
        .map(|row| row_html(row, gutter_width, settings, file.background))
        .collect::<Vec<_>>()
        .join("\n");

    let filename = file
        .path
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    let mut values: FxHashMap<&str, String> = FxHashMap::default();
    values.insert("FILE_PATH", html_escape(&display_path(file)));
    values.insert("FILE_FILENAME", html_escape(&filename));
    values.insert(
        "FILE_CLASSES",
        if file.background {
            "background".to_string()
        } else {
            String::new()
        },
    );
    values.insert(
        "FILE_STATS",
        file.stats.as_ref().map(stats_html).unwrap_or_default(),
    );
    values.insert("FILE_BODY", body);

    template.render(&values)
}

/// Render the whole model to HTML, one template instantiation per file
pub fn render_html(model: &RenderModel, settings: &RenderSettings, template: &Template) -> String {
    model
        .files
        .iter()
        .map(|file| file_html(file, model.gutter_width, settings, template))
        .collect::<Vec<_>>()
        .join("\n")
}
