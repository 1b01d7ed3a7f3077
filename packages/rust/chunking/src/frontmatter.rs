//! Frontmatter stripping for markdown-ish documents.
//!
//! Handles YAML (`---`), TOML (`+++`) and JSON (`{`) frontmatter at the very
//! start of a document. Values are read with a line-wise key/value scan; the
//! only key the pipeline acts on is `title`.

use std::collections::HashMap;

/// Frontmatter parse result: extracted fields plus the document body with
/// the frontmatter removed.
#[derive(Debug, Default)]
pub struct Frontmatter {
    pub fields: HashMap<String, String>,
    pub body_start: usize,
}

impl Frontmatter {
    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").map(String::as_str)
    }
}

/// Strip leading frontmatter from `content`. Returns the parsed fields and
/// the remaining body. Content without frontmatter passes through untouched.
pub fn strip_frontmatter(content: &str) -> (Frontmatter, &str) {
    let trimmed = content.trim_start();
    let offset = content.len() - trimmed.len();

    if let Some(fm) = parse_delimited(trimmed, "---").or_else(|| parse_delimited(trimmed, "+++")) {
        let body = &content[offset + fm.body_start..];
        return (fm, body.trim_start_matches('\n'));
    }
    if let Some(fm) = parse_json_block(trimmed) {
        let body = &content[offset + fm.body_start..];
        return (fm, body.trim_start_matches('\n'));
    }

    (Frontmatter::default(), content)
}

/// YAML/TOML style: a fence line, `key: value` / `key = value` lines, then
/// the closing fence.
fn parse_delimited(content: &str, fence: &str) -> Option<Frontmatter> {
    let mut lines = content.lines();
    let opening = lines.next()?;
    if opening.trim() != fence {
        return None;
    }

    let mut fields = HashMap::new();
    // Actual line length: the fence may carry trailing whitespace.
    let mut consumed = opening.len() + 1;
    for line in lines {
        let line_len = line.len() + 1;
        if line.trim() == fence {
            consumed += line_len;
            return Some(Frontmatter {
                fields,
                body_start: consumed.min(content.len()),
            });
        }
        if let Some((key, value)) = split_key_value(line) {
            fields.insert(key, value);
        }
        consumed += line_len;
    }

    // Unterminated fence: not frontmatter, treat as body.
    None
}

/// JSON style: a single top-level `{ ... }` object at the start. Only
/// shallow string values are read.
fn parse_json_block(content: &str) -> Option<Frontmatter> {
    if !content.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut end = None;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in content.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end?;

    let mut fields = HashMap::new();
    for line in content[..end].lines() {
        if let Some((key, value)) = split_key_value(line) {
            fields.insert(key, value);
        }
    }

    Some(Frontmatter {
        fields,
        body_start: end,
    })
}

/// Split `key: value`, `key = value` or `"key": "value"` into a trimmed,
/// unquoted pair.
fn split_key_value(line: &str) -> Option<(String, String)> {
    let (key, value) = line
        .split_once(':')
        .or_else(|| line.split_once('='))?;

    let key = key.trim().trim_matches('"').to_string();
    let value = value
        .trim()
        .trim_end_matches(',')
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string();

    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_frontmatter_title_and_body() {
        let content = "---\ntitle: My Page\nauthor: someone\n---\n\nBody text.";
        let (fm, body) = strip_frontmatter(content);
        assert_eq!(fm.title(), Some("My Page"));
        assert_eq!(fm.fields.get("author").map(String::as_str), Some("someone"));
        assert_eq!(body, "Body text.");
    }

    #[test]
    fn toml_frontmatter() {
        let content = "+++\ntitle = \"Quoted Title\"\n+++\nBody.";
        let (fm, body) = strip_frontmatter(content);
        assert_eq!(fm.title(), Some("Quoted Title"));
        assert_eq!(body, "Body.");
    }

    #[test]
    fn json_frontmatter() {
        let content = "{\n  \"title\": \"JSON Title\",\n  \"tags\": \"docs\"\n}\nBody here.";
        let (fm, body) = strip_frontmatter(content);
        assert_eq!(fm.title(), Some("JSON Title"));
        assert_eq!(body.trim(), "Body here.");
    }

    #[test]
    fn fence_trailing_whitespace_does_not_shift_the_body() {
        let content = "---   \ntitle: Padded\n---\nBody.";
        let (fm, body) = strip_frontmatter(content);
        assert_eq!(fm.title(), Some("Padded"));
        assert_eq!(body, "Body.");
    }

    #[test]
    fn no_frontmatter_passes_through() {
        let content = "Just a document.\n\n---\n\nWith a horizontal rule later.";
        let (fm, body) = strip_frontmatter(content);
        assert!(fm.fields.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn unterminated_fence_is_body() {
        let content = "---\ntitle: broken\nno closing fence";
        let (fm, body) = strip_frontmatter(content);
        assert!(fm.title().is_none());
        assert_eq!(body, content);
    }
}
