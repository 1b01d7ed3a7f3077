//! Code-region masking.
//!
//! Code blocks must never be split mid-block, so before any section or
//! budget logic runs, every code region is replaced with a
//! `__CODE_BLOCK_n__` placeholder and stashed for later restoration. The
//! masking rules cover the markup dialects documentation sites actually
//! serve; earlier rules win on overlapping regions.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder prefix; `n` indexes into [`MaskedDocument::blocks`].
const PLACEHOLDER_PREFIX: &str = "__CODE_BLOCK_";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__CODE_BLOCK_(\d+)__").expect("static regex"));

/// Delimited code-region patterns, in priority order.
static DELIMITED_RULES: &[(&str, &str)] = &[
    // markdown fences (``` and ~~~)
    (r"(?s)```[^\n]*\n.*?```", "markdown fence"),
    (r"(?s)~~~[^\n]*\n.*?~~~", "markdown fence"),
    // HTML preformatted blocks
    (r"(?s)<pre[^>]*>.*?</pre>", "html pre"),
    (r"(?s)<code[^>]*>.*?</code>", "html code"),
    // AsciiDoc [source] listing blocks
    (r"(?ms)^\[source[^\]]*\]\s*\n-{4,}\n.*?^-{4,}\s*$", "asciidoc source"),
    // wiki/Trac literal blocks
    (r"(?s)\{\{\{.*?\}\}\}", "wiki literal"),
];

static DELIMITED_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DELIMITED_RULES
        .iter()
        .map(|(pattern, _)| Regex::new(pattern).expect("static regex"))
        .collect()
});

/// Text with code regions replaced by placeholders.
#[derive(Debug)]
pub struct MaskedDocument {
    pub text: String,
    pub blocks: Vec<String>,
}

impl MaskedDocument {
    /// Restore every placeholder in `text` from the stashed blocks. Blocks
    /// can nest (a fence inside a `<pre>`), so restoration repeats until no
    /// known placeholder remains. Unknown indices pass through untouched.
    pub fn restore(&self, text: &str) -> String {
        let mut current = text.to_string();
        for _ in 0..=self.blocks.len() {
            if !PLACEHOLDER_RE.is_match(&current) {
                break;
            }
            let restored = PLACEHOLDER_RE
                .replace_all(&current, |caps: &regex::Captures<'_>| {
                    caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| self.blocks.get(i).cloned())
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned();
            if restored == current {
                break;
            }
            current = restored;
        }
        current
    }

    /// Total characters of code hidden behind placeholders in `text`.
    pub fn code_chars(&self, text: &str) -> usize {
        PLACEHOLDER_RE
            .captures_iter(text)
            .filter_map(|caps| caps[1].parse::<usize>().ok())
            .filter_map(|i| self.blocks.get(i))
            .map(String::len)
            .sum()
    }

    /// True when `text` references at least one masked block.
    pub fn has_code(&self, text: &str) -> bool {
        PLACEHOLDER_RE.is_match(text)
    }

    /// Split `text` into (natural, code) character counts for token
    /// estimation. Placeholder markers themselves count as neither.
    pub fn char_split(&self, text: &str) -> (usize, usize) {
        let mut placeholder_chars = 0usize;
        let mut code_chars = 0usize;
        for caps in PLACEHOLDER_RE.captures_iter(text) {
            placeholder_chars += caps[0].len();
            if let Some(block) = caps[1].parse::<usize>().ok().and_then(|i| self.blocks.get(i)) {
                code_chars += block.len();
            }
        }
        (text.len().saturating_sub(placeholder_chars), code_chars)
    }
}

/// Mask every code region in `content`.
pub fn mask_code_blocks(content: &str) -> MaskedDocument {
    let mut blocks = Vec::new();
    let mut text = content.to_string();

    for re in DELIMITED_RES.iter() {
        text = re
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                stash(&mut blocks, caps[0].to_string())
            })
            .into_owned();
    }

    text = mask_indented_blocks(&text, &mut blocks);

    MaskedDocument { text, blocks }
}

fn stash(blocks: &mut Vec<String>, block: String) -> String {
    let placeholder = format!("{PLACEHOLDER_PREFIX}{}__", blocks.len());
    blocks.push(block);
    placeholder
}

/// Mask RST `.. code-block::` directives and Sphinx `::` literal blocks:
/// the marker line plus the following indented lines.
fn mask_indented_blocks(text: &str, blocks: &mut Vec<String>) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_end();
        let is_marker = trimmed.trim_start().starts_with(".. code-block::")
            || trimmed.trim_start().starts_with(".. sourcecode::")
            || (trimmed.ends_with("::") && !trimmed.trim_start().starts_with(".."));

        if !is_marker {
            out.push(line.to_string());
            i += 1;
            continue;
        }

        // Collect the indented block (blank lines inside it included).
        let mut j = i + 1;
        let mut block_lines: Vec<&str> = Vec::new();
        while j < lines.len() {
            let candidate = lines[j];
            if candidate.trim().is_empty() {
                block_lines.push(candidate);
                j += 1;
            } else if candidate.starts_with(' ') || candidate.starts_with('\t') {
                block_lines.push(candidate);
                j += 1;
            } else {
                break;
            }
        }
        // Trim trailing blank lines back out of the block.
        while block_lines.last().is_some_and(|l| l.trim().is_empty()) {
            block_lines.pop();
            j -= 1;
        }

        if block_lines.is_empty() {
            out.push(line.to_string());
            i += 1;
            continue;
        }

        let block = block_lines.join("\n");
        if trimmed.trim_start().starts_with("..") {
            // Directive line is part of the masked region.
            out.push(stash(blocks, format!("{line}\n{block}")));
        } else {
            // Sphinx shorthand: the `::` line is prose, only the indented
            // part is code.
            out.push(line.to_string());
            out.push(stash(blocks, block));
        }
        i = j;
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_fence_roundtrip() {
        let content = "Intro.\n\n```rust\nfn main() {}\n```\n\nOutro.";
        let masked = mask_code_blocks(content);

        assert!(!masked.text.contains("fn main"));
        assert!(masked.text.contains("__CODE_BLOCK_0__"));
        assert_eq!(masked.restore(&masked.text), content);
    }

    #[test]
    fn html_pre_and_inline_code() {
        let content = "See <pre>let x = 1;</pre> and <code>y</code>.";
        let masked = mask_code_blocks(content);
        assert_eq!(masked.blocks.len(), 2);
        assert_eq!(masked.restore(&masked.text), content);
    }

    #[test]
    fn rst_code_block_directive() {
        let content = "Example:\n\n.. code-block:: python\n\n   def f():\n       return 1\n\nDone.";
        let masked = mask_code_blocks(content);
        assert_eq!(masked.blocks.len(), 1);
        assert!(masked.blocks[0].contains("def f()"));
        assert!(masked.text.contains("Done."));
        assert_eq!(masked.restore(&masked.text), content);
    }

    #[test]
    fn sphinx_literal_block_keeps_prose_line() {
        let content = "Run it like this::\n\n    cargo run --release\n\nAnd wait.";
        let masked = mask_code_blocks(content);
        assert_eq!(masked.blocks.len(), 1);
        assert!(masked.text.contains("Run it like this::"));
        assert!(!masked.text.contains("cargo run"));
        assert_eq!(masked.restore(&masked.text), content);
    }

    #[test]
    fn wiki_literal_block() {
        let content = "Before {{{\ncode here\n}}} after.";
        let masked = mask_code_blocks(content);
        assert_eq!(masked.blocks.len(), 1);
        assert_eq!(masked.restore(&masked.text), content);
    }

    #[test]
    fn asciidoc_source_block() {
        let content = "[source,ruby]\n----\nputs 'hi'\n----\n\nPlain text.";
        let masked = mask_code_blocks(content);
        assert_eq!(masked.blocks.len(), 1);
        assert!(masked.blocks[0].contains("puts"));
        assert_eq!(masked.restore(&masked.text), content);
    }

    #[test]
    fn code_chars_counts_hidden_text() {
        let content = "a\n\n```\n0123456789\n```\n";
        let masked = mask_code_blocks(content);
        assert!(masked.has_code(&masked.text));
        assert_eq!(masked.code_chars(&masked.text), masked.blocks[0].len());
    }

    #[test]
    fn nested_fence_inside_pre_masked_once() {
        let content = "<pre>```\ninner\n```</pre>";
        let masked = mask_code_blocks(content);
        // The fence rule grabs the region first; restoration still
        // reproduces the original text.
        assert_eq!(masked.restore(&masked.text), content);
    }
}
