//! Glob-style matching used by pattern subscriptions and `KEYS`.
//!
//! Supported syntax:
//! - `*` matches any run of characters, including the empty one
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match one character from the class; `[^abc]` and `[!abc]` negate it
//! - `\x` matches `x` literally, inside or outside a class
//!
//! Matching is anchored: the whole text has to match the whole pattern.

/// Returns whether `text` matches the glob `pattern`.
pub fn matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    match_chars(&text, &pattern)
}

/// Iterative matcher. On a mismatch it rewinds to the most recent `*` and lets it swallow one
/// more character, which keeps the worst case at O(text * pattern) without recursion.
fn match_chars(text: &[char], pattern: &[char]) -> bool {
    let (mut t, mut p) = (0, 0);
    // Pattern position of the last `*`, and the text position it currently extends to.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        let consumed = match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
                continue;
            }
            Some('?') => Some(1),
            Some('[') => match match_class(&pattern[p..], text[t]) {
                Some((true, len)) => Some(len),
                Some((false, _)) => None,
                // An unterminated class is a literal bracket.
                None => (text[t] == '[').then_some(1),
            },
            Some('\\') if p + 1 < pattern.len() => (pattern[p + 1] == text[t]).then_some(2),
            Some(&c) => (c == text[t]).then_some(1),
            None => None,
        };

        match (consumed, star) {
            (Some(len), _) => {
                p += len;
                t += 1;
            }
            (None, Some((star_p, star_t))) => {
                star = Some((star_p, star_t + 1));
                p = star_p + 1;
                t = star_t + 1;
            }
            (None, None) => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Matches `c` against the class starting at `pattern[0] == '['`.
///
/// Returns whether it matched and how many pattern characters the class spans, or `None` when
/// the class is never closed.
fn match_class(pattern: &[char], c: char) -> Option<(bool, usize)> {
    let mut i = 1;
    let negate = matches!(pattern.get(i), Some('^') | Some('!'));
    if negate {
        i += 1;
    }

    let mut matched = false;
    loop {
        match pattern.get(i) {
            None => return None,
            Some(']') => break,
            Some('\\') if i + 1 < pattern.len() => {
                matched |= pattern[i + 1] == c;
                i += 2;
            }
            Some(&lo) if pattern.get(i + 1) == Some(&'-') && is_range_end(pattern.get(i + 2)) => {
                let hi = pattern[i + 2];
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                matched |= (lo..=hi).contains(&c);
                i += 3;
            }
            Some(&x) => {
                matched |= x == c;
                i += 1;
            }
        }
    }

    Some((matched != negate, i + 1))
}

fn is_range_end(c: Option<&char>) -> bool {
    matches!(c, Some(&c) if c != ']')
}
