//! Header-boundary section splitting.
//!
//! Runs over masked text (code regions already replaced by placeholders), so
//! a `#` inside a fenced block never opens a section. Each recognized header
//! starts a new section carrying the header text as the section title.

use std::sync::LazyLock;

use regex::Regex;

static ATX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").expect("static regex"));

static WIKI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(={2,6})\s*(.+?)\s*={2,6}\s*$").expect("static regex"));

static ASCIIDOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(={1,6})\s+(.+)$").expect("static regex"));

static HTML_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<h[1-6][^>]*>(.*?)</h[1-6]>").expect("static regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));

/// One header-delimited slice of a document.
#[derive(Debug)]
pub struct Section {
    /// Header text, `None` for preamble before the first header.
    pub title: Option<String>,
    pub body: String,
}

/// Split `text` into header-delimited sections. Content before the first
/// header becomes an untitled preamble section.
pub fn split_sections(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut sections: Vec<Section> = Vec::new();
    let mut current_title: Option<String> = None;
    let mut current_body: Vec<&str> = Vec::new();
    let mut i = 0;

    let mut flush = |title: &mut Option<String>, body: &mut Vec<&str>, next: Option<String>| {
        let text = body.join("\n");
        if !text.trim().is_empty() || title.is_some() {
            sections.push(Section {
                title: title.take(),
                body: text,
            });
        }
        body.clear();
        *title = next;
    };

    while i < lines.len() {
        let line = lines[i];
        let next_line = lines.get(i + 1).copied();

        if let Some((title, consumed)) = detect_header(line, next_line) {
            flush(&mut current_title, &mut current_body, Some(title));
            i += consumed;
        } else {
            current_body.push(line);
            i += 1;
        }
    }
    flush(&mut current_title, &mut current_body, None);

    sections
}

/// Recognize a header at `line` (possibly spanning into `next_line` for RST
/// underlines). Returns the header text and how many lines it consumed.
fn detect_header(line: &str, next_line: Option<&str>) -> Option<(String, usize)> {
    let trimmed = line.trim_end();

    if let Some(caps) = ATX_RE.captures(trimmed) {
        return Some((caps[2].trim().to_string(), 1));
    }
    if let Some(caps) = WIKI_RE.captures(trimmed) {
        return Some((caps[2].trim().to_string(), 1));
    }
    if let Some(caps) = ASCIIDOC_RE.captures(trimmed) {
        return Some((caps[2].trim().to_string(), 1));
    }
    if let Some(caps) = HTML_HEADER_RE.captures(trimmed) {
        let title = TAG_RE.replace_all(&caps[1], "").trim().to_string();
        if !title.is_empty() {
            return Some((title, 1));
        }
    }

    // RST: a text line underlined with punctuation at least as long.
    if let Some(under) = next_line {
        let under = under.trim_end();
        if is_rst_underline(under, trimmed) {
            return Some((trimmed.trim().to_string(), 2));
        }
    }

    None
}

fn is_rst_underline(under: &str, title: &str) -> bool {
    if title.trim().is_empty() || under.len() < 3 || under.len() < title.trim_end().len() {
        return false;
    }
    let mut chars = under.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !matches!(first, '=' | '-' | '~' | '^' | '"' | '\'' | '*' | '+') {
        return false;
    }
    chars.all(|c| c == first)
}
