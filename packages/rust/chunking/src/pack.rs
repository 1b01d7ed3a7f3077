//! Budget-aware packing of section text into chunks.
//!
//! Packing prefers blank-line paragraph boundaries and only descends to
//! sentence splitting (prose) or line splitting (code) when a single unit
//! exceeds the budget. Code regions arrive masked; token accounting charges
//! code characters at a lower rate than natural language.

use crate::mask::MaskedDocument;

/// Characters of natural language per estimated token.
const NATURAL_CHARS_PER_TOKEN: usize = 4;

/// Characters of code per estimated token. Code tokenizes denser per
/// character than prose.
const CODE_CHARS_PER_TOKEN: usize = 6;

/// Heuristic token estimate from a natural/code character split.
pub fn estimate_tokens(natural_chars: usize, code_chars: usize) -> usize {
    natural_chars / NATURAL_CHARS_PER_TOKEN + code_chars / CODE_CHARS_PER_TOKEN
}

/// One packable piece of text: a paragraph, a sentence, or a code line.
#[derive(Debug, Clone)]
struct Unit {
    text: String,
    is_code: bool,
}

impl Unit {
    fn tokens(&self, masked: &MaskedDocument) -> usize {
        if self.is_code {
            estimate_tokens(0, self.text.len())
        } else {
            let (natural, code) = masked.char_split(&self.text);
            estimate_tokens(natural, code)
        }
    }
}

/// A packed chunk body plus what the next chunk's overlap should carry.
#[derive(Debug)]
pub struct PackedChunk {
    /// Restored (unmasked) chunk text.
    pub content: String,
    /// Estimated token count, summed over the packed units.
    pub tokens: usize,
    /// Whether the chunk ends in code; picks the overlap flavor.
    pub ends_with_code: bool,
}

/// Pack one section body (masked text) into chunk bodies.
///
/// `budget` and `overlap` are token counts. Output text is fully restored.
pub fn pack_section(
    body: &str,
    masked: &MaskedDocument,
    budget: usize,
    overlap: usize,
) -> Vec<PackedChunk> {
    let units = section_units(body, masked, budget);
    if units.is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<PackedChunk> = Vec::new();
    let mut current: Vec<Unit> = Vec::new();
    let mut current_tokens = 0usize;

    for unit in units {
        let unit_tokens = unit.tokens(masked);

        if !current.is_empty() && current_tokens + unit_tokens > budget {
            let packed = finish_chunk(&current, masked);
            let carry = overlap_unit(&packed, overlap);
            chunks.push(packed);

            current.clear();
            current_tokens = 0;
            if let Some(carry) = carry {
                current_tokens = carry.tokens(masked);
                current.push(carry);
            }
        }

        current_tokens += unit_tokens;
        current.push(unit);
    }

    if !current.is_empty() {
        chunks.push(finish_chunk(&current, masked));
    }

    chunks
}

/// Break a section body into packable units: paragraphs first, descending
/// into sentences or lines only for paragraphs that overflow the budget on
/// their own.
fn section_units(body: &str, masked: &MaskedDocument, budget: usize) -> Vec<Unit> {
    let mut units = Vec::new();

    for paragraph in split_paragraphs(body) {
        let unit = Unit {
            text: paragraph.clone(),
            is_code: false,
        };
        if unit.tokens(masked) <= budget {
            units.push(unit);
            continue;
        }

        if masked.has_code(&paragraph) {
            // Oversized code: restore and split by lines.
            let restored = masked.restore(&paragraph);
            units.extend(restored.lines().map(|line| Unit {
                text: line.to_string(),
                is_code: true,
            }));
        } else {
            units.extend(split_sentences(&paragraph).into_iter().map(|s| Unit {
                text: s,
                is_code: false,
            }));
        }
    }

    units
}

fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Sentence boundaries: `.`, `!` or `?` followed by whitespace or
/// end-of-text. No lookbehind games; a simple scan is enough here.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?')
            && chars.peek().is_none_or(|next| next.is_whitespace())
        {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }

    let tail = current.trim().to_string();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Assemble units into one restored chunk. Consecutive code lines join with
/// single newlines, everything else with paragraph breaks.
fn finish_chunk(units: &[Unit], masked: &MaskedDocument) -> PackedChunk {
    let mut content = String::new();
    let mut tokens = 0usize;
    let mut prev_code = false;

    for (i, unit) in units.iter().enumerate() {
        if i > 0 {
            if prev_code && unit.is_code {
                content.push('\n');
            } else {
                content.push_str("\n\n");
            }
        }
        content.push_str(&unit.text);
        tokens += unit.tokens(masked);
        prev_code = unit.is_code;
    }

    PackedChunk {
        content: masked.restore(&content),
        tokens,
        ends_with_code: prev_code,
    }
}

/// Build the trailing-overlap unit for the chunk after `packed`: tail lines
/// for code, tail sentences for prose, bounded by the overlap token budget.
fn overlap_unit(packed: &PackedChunk, overlap: usize) -> Option<Unit> {
    if overlap == 0 {
        return None;
    }

    let (pieces, separator): (Vec<&str>, &str) = if packed.ends_with_code {
        (packed.content.lines().collect(), "\n")
    } else {
        return overlap_sentences(&packed.content, overlap);
    };

    let mut taken: Vec<&str> = Vec::new();
    let mut tokens = 0usize;
    for piece in pieces.iter().rev() {
        let piece_tokens = estimate_tokens(0, piece.len());
        if tokens + piece_tokens > overlap && !taken.is_empty() {
            break;
        }
        tokens += piece_tokens;
        taken.push(piece);
        if tokens >= overlap {
            break;
        }
    }
    taken.reverse();

    let text = taken.join(separator).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(Unit {
            text,
            is_code: true,
        })
    }
}

fn overlap_sentences(content: &str, overlap: usize) -> Option<Unit> {
    let sentences = split_sentences(content);
    let mut taken: Vec<&str> = Vec::new();
    let mut tokens = 0usize;

    for sentence in sentences.iter().rev() {
        let sentence_tokens = estimate_tokens(sentence.len(), 0);
        if tokens + sentence_tokens > overlap && !taken.is_empty() {
            break;
        }
        tokens += sentence_tokens;
        taken.push(sentence);
        if tokens >= overlap {
            break;
        }
    }
    taken.reverse();

    let text = taken.join(" ").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(Unit {
            text,
            is_code: false,
        })
    }
}
