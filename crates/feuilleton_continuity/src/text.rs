//! Text utilities shared by the scanner and the boundary validator.
//!
//! The corpus is mixed-script: outlines and bodies are frequently CJK
//! with embedded Latin names. Tokenization therefore handles both:
//! whitespace-delimited words for alphabetic runs, character bigrams for
//! CJK runs (a CJK run of length one yields the single character).

use std::collections::HashSet;
use std::sync::LazyLock;

/// English function words excluded from token sets.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "at", "by", "for", "from", "in", "into", "is", "it", "of", "on", "or",
    "that", "the", "then", "to", "with",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Whether a character belongs to the CJK unified ideograph blocks.
pub fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
    )
}

/// Strip angle-bracket markup, leaving plain text.
///
/// Bodies sometimes arrive with residual tags from the editing surface;
/// entity scans operate on plain text only.
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Tokenize mixed-script text into a lowercase token set.
///
/// Alphabetic runs become lowercased words (length >= 2, stopwords
/// dropped); CJK runs become character bigrams. Digits attach to
/// alphabetic runs.
///
/// # Examples
///
/// ```
/// use feuilleton_continuity::tokenize;
///
/// let tokens = tokenize("进入废土城");
/// assert!(tokens.contains("进入"));
/// assert!(tokens.contains("废土"));
///
/// let tokens = tokenize("The siege of Harrow Keep");
/// assert!(tokens.contains("siege"));
/// assert!(!tokens.contains("the"));
/// ```
pub fn tokenize(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut word = String::new();
    let mut cjk_run: Vec<char> = Vec::new();

    let flush_word = |word: &mut String, tokens: &mut HashSet<String>| {
        if word.chars().count() >= 2 && !STOPWORD_SET.contains(word.as_str()) {
            tokens.insert(std::mem::take(word));
        } else {
            word.clear();
        }
    };
    let flush_cjk = |run: &mut Vec<char>, tokens: &mut HashSet<String>| {
        match run.len() {
            0 => {}
            1 => {
                tokens.insert(run[0].to_string());
            }
            _ => {
                for pair in run.windows(2) {
                    tokens.insert(pair.iter().collect());
                }
            }
        }
        run.clear();
    };

    for ch in text.chars() {
        if is_cjk(ch) {
            flush_word(&mut word, &mut tokens);
            cjk_run.push(ch);
        } else if ch.is_alphanumeric() {
            flush_cjk(&mut cjk_run, &mut tokens);
            word.extend(ch.to_lowercase());
        } else {
            flush_word(&mut word, &mut tokens);
            flush_cjk(&mut cjk_run, &mut tokens);
        }
    }
    flush_word(&mut word, &mut tokens);
    flush_cjk(&mut cjk_run, &mut tokens);
    tokens
}

/// Fraction of `reference` tokens that also occur in `candidate`.
///
/// Returns 0.0 when `reference` is empty.
pub fn containment(reference: &HashSet<String>, candidate: &HashSet<String>) -> f32 {
    if reference.is_empty() {
        return 0.0;
    }
    let shared = reference.intersection(candidate).count();
    shared as f32 / reference.len() as f32
}

/// Token-overlap similarity between two texts: shared tokens over the
/// smaller set. Symmetric; 0.0 when either set is empty.
pub fn similarity(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f32 / smaller as f32
}

/// Character window of radius `radius` around the match starting at
/// byte offset `start` with byte length `len`. Safe on multi-byte text.
pub fn char_window(text: &str, start: usize, len: usize, radius: usize) -> String {
    let before: String = text[..start]
        .chars()
        .rev()
        .take(radius)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let after: String = text[start + len..].chars().take(radius).collect();
    format!("{}{}{}", before, &text[start..start + len], after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cjk_bigrams() {
        let tokens = tokenize("进入废土城");
        let expected: HashSet<String> = ["进入", "入废", "废土", "土城"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn mixed_script_splits_runs() {
        let tokens = tokenize("沈柯 meets the Warden");
        assert!(tokens.contains("沈柯"));
        assert!(tokens.contains("meets"));
        assert!(tokens.contains("warden"));
        assert!(!tokens.contains("the"));
    }

    #[test]
    fn single_cjk_char_is_kept() {
        let tokens = tokenize("城");
        assert!(tokens.contains("城"));
    }

    #[test]
    fn strip_tags_removes_markup() {
        assert_eq!(strip_tags("<p>沈柯死了</p>"), "沈柯死了");
    }

    #[test]
    fn containment_and_similarity() {
        let a = tokenize("进入废土城");
        let b = tokenize("他们终于进入废土城的大门");
        assert!(containment(&a, &b) >= 0.99);
        assert!(similarity(&a, &b) >= 0.99);

        let c = tokenize("离开山村");
        assert!(containment(&a, &c) < 0.01);
    }

    #[test]
    fn char_window_respects_boundaries() {
        let text = "从前有座山，山里有个庙";
        let start = text.find('山').unwrap();
        let w = char_window(text, start, '山'.len_utf8(), 2);
        assert_eq!(w, "有座山，山");
    }
}
