// api.rs - Idiomatic Rust surface over the compiled matching engine.
//
// Wraps `engine::Pattern` and `core_matcher` with the Rust-native
// shapes users of a regex crate expect: `Regex`, `RegexBuilder`,
// `Match`, `Captures`, `CapturesIter`, `FindIter`, `CaptureNames`, and
// `Scanner` for manual cursor control over a scan.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use crate::engine::{self, Pattern};
use crate::error::RegexError;

/// A compiled regular expression.
///
/// # Examples
///
/// ```
/// use backtrack_regex::Regex;
///
/// let re = Regex::new(r"\d+").unwrap();
/// assert!(re.is_match("hello 42"));
///
/// let m = re.find("hello 42").unwrap();
/// assert_eq!(m.as_str(), "42");
/// assert_eq!(m.start(), 6);
/// assert_eq!(m.end(), 8);
/// ```
#[derive(Clone)]
pub struct Regex {
    pattern: Arc<Pattern>,
}

impl Regex {
    /// Compile a pattern using the process-wide pattern cache.
    pub fn new(pattern: &str) -> Result<Regex, RegexError> {
        Self::new_bytes(pattern.as_bytes())
    }

    /// Compile a pattern from raw bytes.
    pub fn new_bytes(pattern: &[u8]) -> Result<Regex, RegexError> {
        let pattern = engine::global().compile(pattern)?;
        Ok(Regex { pattern })
    }

    /// Create a [`RegexBuilder`] for fine-grained control over compilation.
    pub fn builder(pattern: &str) -> RegexBuilder {
        RegexBuilder::new(pattern)
    }

    /// Return the first match in `text`, or `None` if no match.
    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.find_bytes(text.as_bytes())
    }

    /// Return the first match in `text` (as bytes), or `None` if no match.
    pub fn find_bytes<'t>(&self, text: &'t [u8]) -> Option<Match<'t>> {
        let m = crate::core_matcher::search(&self.pattern.root, text, 0, self.pattern.max_group as usize)?;
        Some(Match {
            text,
            start: m.start,
            end: m.end,
        })
    }

    /// Check whether `text` matches the pattern anywhere.
    pub fn is_match(&self, text: &str) -> bool {
        self.is_match_bytes(text.as_bytes())
    }

    /// Check whether `text` (as bytes) matches the pattern anywhere.
    pub fn is_match_bytes(&self, text: &[u8]) -> bool {
        crate::core_matcher::search(&self.pattern.root, text, 0, self.pattern.max_group as usize).is_some()
    }

    /// Check whether the pattern matches `text` in its entirety.
    pub fn is_full_match(&self, text: &str) -> bool {
        crate::core_matcher::entire(&self.pattern.root, text.as_bytes(), self.pattern.max_group as usize)
            .is_some()
    }

    /// Return the first match with all capture groups, or `None`.
    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.captures_bytes(text.as_bytes())
    }

    /// Return the first match with all capture groups (bytes), or `None`.
    pub fn captures_bytes<'t>(&self, text: &'t [u8]) -> Option<Captures<'t>> {
        let m = crate::core_matcher::search(&self.pattern.root, text, 0, self.pattern.max_group as usize)?;
        Some(Captures {
            text,
            captures: m.captures,
            pattern: self.pattern.clone(),
        })
    }

    /// Iterate over all non-overlapping matches in `text`.
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> FindIter<'r, 't> {
        self.find_iter_bytes(text.as_bytes())
    }

    /// Iterate over all non-overlapping matches in `text` (as bytes).
    pub fn find_iter_bytes<'r, 't>(&'r self, text: &'t [u8]) -> FindIter<'r, 't> {
        FindIter {
            regex: self,
            text,
            last_end: 0,
            last_match: None,
        }
    }

    /// A cursor-resumable scanner over `text`, for callers that need to
    /// interleave scanning with manual seeking.
    pub fn scanner<'r, 't>(&'r self, text: &'t str) -> Scanner<'r, 't> {
        Scanner {
            regex: self,
            text: text.as_bytes(),
            pos: 0,
            last_match: None,
        }
    }

    /// Number of capture groups in the pattern (excluding group 0).
    pub fn captures_len(&self) -> usize {
        self.pattern.max_group as usize
    }

    /// Iterate over the pattern's named capture groups.
    pub fn capture_names(&self) -> CaptureNames<'_> {
        CaptureNames {
            inner: self.pattern.names.iter(),
        }
    }
}

impl std::fmt::Debug for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Regex")
            .field("source", &String::from_utf8_lossy(&self.pattern.source))
            .finish()
    }
}

// === RegexBuilder ===

/// Builder for compiling a [`Regex`] with resource limits.
///
/// The matching engine carries no notion of case-folding or line modes
/// (those are outside this pattern grammar's scope); the builder's
/// knobs are safety limits on pathological input rather than syntax
/// options.
///
/// # Examples
///
/// ```
/// use backtrack_regex::Regex;
///
/// let re = Regex::builder(r"\d+").build().unwrap();
/// assert!(re.is_match("42"));
/// ```
pub struct RegexBuilder {
    pattern: Vec<u8>,
    max_pattern_len: usize,
}

/// Patterns longer than this are rejected before compilation, as a
/// guard against pathological input to `Regex::new`.
pub const DEFAULT_MAX_PATTERN_LEN: usize = 1 << 16;

impl RegexBuilder {
    /// Create a new builder for the given pattern.
    pub fn new(pattern: &str) -> Self {
        RegexBuilder {
            pattern: pattern.as_bytes().to_vec(),
            max_pattern_len: DEFAULT_MAX_PATTERN_LEN,
        }
    }

    /// Cap the pattern source length accepted by [`build`](Self::build).
    pub fn max_pattern_len(mut self, max: usize) -> Self {
        self.max_pattern_len = max;
        self
    }

    /// Compile the pattern into a [`Regex`].
    pub fn build(self) -> Result<Regex, RegexError> {
        if self.pattern.len() > self.max_pattern_len {
            return Err(RegexError::Internal("pattern exceeds max_pattern_len"));
        }
        Regex::new_bytes(&self.pattern)
    }
}

// === Match ===

/// A single match result referencing the original text.
#[derive(Debug, Clone, Copy)]
pub struct Match<'t> {
    text: &'t [u8],
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    /// Byte offset of the start of the match.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset of the end of the match (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Byte range of the match.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The matched text as a byte slice.
    pub fn as_bytes(&self) -> &'t [u8] {
        &self.text[self.start..self.end]
    }

    /// The matched text as a `&str`.
    ///
    /// # Panics
    ///
    /// Panics if the matched bytes are not valid UTF-8. This cannot
    /// happen for a match produced against a `&str` input, since a
    /// match's boundaries always fall on codepoint boundaries.
    pub fn as_str(&self) -> &'t str {
        std::str::from_utf8(self.as_bytes()).expect("match is not valid UTF-8")
    }

    /// Returns the length of the match in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the match is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// === Captures ===

/// All capture groups from a single match.
///
/// Group 0 is the entire match. Groups 1..N correspond to `(...)` in the pattern.
pub struct Captures<'t> {
    text: &'t [u8],
    captures: crate::capture::CaptureTable,
    pattern: Arc<Pattern>,
}

impl<'t> Captures<'t> {
    /// Get capture group `i`, or `None` if the group did not participate.
    ///
    /// Group 0 is the entire match.
    pub fn get(&self, i: usize) -> Option<Match<'t>> {
        let (start, end) = self.captures.get(i)?;
        Some(Match {
            text: self.text,
            start,
            end,
        })
    }

    /// Get the first capture group with the given name, or `None`.
    pub fn name(&self, name: &str) -> Option<Match<'t>> {
        let n = self.pattern.group_for_name(name)?;
        self.get(n as usize)
    }

    /// Number of capture groups (including group 0).
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// Returns `true` if there are no capture groups (should never happen for a valid match).
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Iterate over all capture groups.
    pub fn iter(&self) -> CapturesIter<'_, 't> {
        CapturesIter {
            captures: self,
            index: 0,
        }
    }
}

impl std::fmt::Debug for Captures<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for i in 0..self.len() {
            list.entry(&self.get(i));
        }
        list.finish()
    }
}

// === CapturesIter ===

/// Iterator over capture groups in a [`Captures`].
pub struct CapturesIter<'c, 't> {
    captures: &'c Captures<'t>,
    index: usize,
}

impl<'c, 't> Iterator for CapturesIter<'c, 't> {
    type Item = Option<Match<'t>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.captures.len() {
            return None;
        }
        let m = self.captures.get(self.index);
        self.index += 1;
        Some(m)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.captures.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CapturesIter<'_, '_> {}

// === CaptureNames ===

/// Iterator over a pattern's `(?<name>...)` group names, in no
/// particular order.
pub struct CaptureNames<'r> {
    inner: std::collections::hash_map::Iter<'r, String, i32>,
}

impl<'r> Iterator for CaptureNames<'r> {
    type Item = (&'r str, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (name, group) = self.inner.next()?;
        Some((name.as_str(), *group as usize))
    }
}

// === FindIter / Scanner shared stepping ===

/// Advance one non-overlapping match from `pos`. An empty match's next
/// cursor is pushed one codepoint past itself, so an empty-matching
/// pattern (e.g. `a*`) still makes forward progress instead of
/// reporting the same empty match forever.
fn step<'t>(pattern: &Pattern, text: &'t [u8], pos: usize) -> Option<(Match<'t>, usize)> {
    if pos > text.len() {
        return None;
    }
    let m = crate::core_matcher::search(&pattern.root, text, pos, pattern.max_group as usize)?;
    let next_pos = if m.start == m.end {
        if m.end >= text.len() {
            text.len() + 1
        } else {
            let (_, len) = crate::codec::decode(text, m.end);
            m.end + len.max(1)
        }
    } else {
        m.end
    };
    Some((
        Match {
            text,
            start: m.start,
            end: m.end,
        },
        next_pos,
    ))
}

// === FindIter ===

/// Iterator over all non-overlapping matches in a text.
pub struct FindIter<'r, 't> {
    regex: &'r Regex,
    text: &'t [u8],
    last_end: usize,
    last_match: Option<usize>,
}

impl<'r, 't> Iterator for FindIter<'r, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Match<'t>> {
        loop {
            let (m, next_pos) = step(&self.regex.pattern, self.text, self.last_end)?;
            self.last_end = next_pos;
            if m.start == m.end && Some(m.end) == self.last_match {
                continue;
            }
            self.last_match = Some(m.end);
            return Some(m);
        }
    }
}

// === Scanner ===

/// A cursor-resumable match iterator: like [`FindIter`], but the
/// cursor can be inspected and manually repositioned between calls.
pub struct Scanner<'r, 't> {
    regex: &'r Regex,
    text: &'t [u8],
    pos: usize,
    last_match: Option<usize>,
}

impl<'r, 't> Scanner<'r, 't> {
    /// The byte offset the next `next()` call will resume from.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Reposition the scan cursor.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
        self.last_match = None;
    }

    /// Match at the current cursor without advancing it.
    pub fn try_match(&self) -> Option<Match<'t>> {
        let m = crate::core_matcher::search(
            &self.regex.pattern.root,
            self.text,
            self.pos,
            self.regex.pattern.max_group as usize,
        )?;
        Some(Match {
            text: self.text,
            start: m.start,
            end: m.end,
        })
    }
}

impl<'r, 't> Iterator for Scanner<'r, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Match<'t>> {
        loop {
            let (m, next_pos) = step(&self.regex.pattern, self.text, self.pos)?;
            self.pos = next_pos;
            if m.start == m.end && Some(m.end) == self.last_match {
                continue;
            }
            self.last_match = Some(m.end);
            return Some(m);
        }
    }
}
