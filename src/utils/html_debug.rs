// src/utils/html_debug.rs
use std::fs;
use std::path::Path;
use once_cell::sync::Lazy;
use regex::Regex;
use crate::utils::error::AppError;

// Comments and raw-text elements are matched whole so a `<table` inside them is skipped;
// only group 1 is a real table tag.
static TABLE_OPEN_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?is)<!--.*?-->",
        r"|<script\b.*?</script\s*>",
        r"|<style\b.*?</style\s*>",
        r"|<textarea\b.*?</textarea\s*>",
        r"|<title\b.*?</title\s*>",
        r"|(<table\b[^>]*>)",
    ))
    .expect("Failed to compile TABLE_OPEN_TAG_RE")
});

static HEAD_OPEN_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<head\b[^>]*>").expect("Failed to compile HEAD_OPEN_TAG_RE")
});

const DEBUG_STYLE: &str = "<style>\n.table-marker { background-color: #FFFF00; font: bold 14px monospace; padding: 2px 6px; }\n</style>\n";

/// Byte ranges of every `<table ...>` open tag in the raw markup, in document order.
pub fn find_table_tags(html: &str) -> Vec<(usize, usize)> {
    TABLE_OPEN_TAG_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|mat| (mat.start(), mat.end()))
        .collect()
}

/// Builds a copy of the page where each table open tag is preceded by a visible
/// `#n` marker, `n` being the index to pass to `--number`.
pub fn annotate_tables(html: &str) -> String {
    let head_end = HEAD_OPEN_TAG_RE.find(html).map(|mat| mat.end());

    let mut insertions: Vec<(usize, String)> = find_table_tags(html)
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| {
            let marker = format!(
                "<div class=\"table-marker\" title=\"Position: {}-{}\">#{}</div>",
                start, end, index
            );
            (start, marker)
        })
        .collect();
    if let Some(pos) = head_end {
        insertions.insert(0, (pos, format!("\n{}", DEBUG_STYLE)));
    }
    insertions.sort_by_key(|(pos, _)| *pos); // Stable, so the style stays ahead of a table at the same spot

    let mut annotated = String::with_capacity(html.len() + 256);

    // Without a <head> to hold the styling, wrap the page in a full document
    if head_end.is_none() {
        annotated.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        annotated.push_str(DEBUG_STYLE);
        annotated.push_str("</head>\n<body>\n");
    }

    let mut last_pos = 0;
    for (pos, text) in insertions {
        annotated.push_str(&html[last_pos..pos]);
        annotated.push_str(&text);
        last_pos = pos;
    }

    // Add any remaining content
    annotated.push_str(&html[last_pos..]);

    if head_end.is_none() {
        annotated.push_str("\n</body>\n</html>");
    }
    annotated
}

/// Writes the raw page and its annotated copy into `debug_dir`.
pub fn create_debug_html(html: &str, debug_dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(debug_dir)?;

    let raw_path = debug_dir.join("raw_page.html");
    fs::write(&raw_path, html)?;
    tracing::info!("Saved raw page to: {}", raw_path.display());

    let annotated_path = debug_dir.join("page_annotated.html");
    fs::write(&annotated_path, annotate_tables(html))?;
    tracing::info!("Saved debug HTML to {}", annotated_path.display());

    Ok(())
}
