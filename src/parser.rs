// parser.rs - Pattern string -> token tree, with all syntax validation.
//
// A single forward recursive-descent pass (`parse_alts` -> `parse_branch`
// -> `parse_atom`), mirroring the source parser's `prs_alts` / `prs_branch`
// / `prs_exp` call chain but using Rust's call stack to track paren/bracket
// nesting instead of a manual forward bracket-balance scan: a `(` that is
// never closed simply leaves `parse_alts` without having consumed a
// matching `)`, which is exactly the `UNBPAR` condition.
//
// After the tree is built, `weedeat` normalizes it: literal runs are
// fused into byte strings, NUL is lifted out of character classes,
// `atom RANGE POSSESSIVE` is rewritten into an atomic wrapper, stray
// literals are promoted to single-codepoint classes, and every name/
// number reference is resolved or rejected.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::class::Class;
use crate::codec;
use crate::error::RegexError;
use crate::token::{GroupKind, NameRole, Token, MAXREPS};

/// The result of parsing a pattern: its token tree, the name -> group
/// number table, and the highest group number assigned.
#[derive(Debug)]
pub struct ParseResult {
    pub tokens: Vec<Token>,
    pub names: HashMap<String, i32>,
    pub max_group: i32,
}

/// Parse `pattern` into a normalized token tree.
pub fn parse(pattern: &[u8]) -> Result<ParseResult, RegexError> {
    let mut p = Parser {
        pattern,
        pos: 0,
        next_group: 1,
        names: HashMap::new(),
    };
    let tokens = p.parse_alts(false)?;
    if p.pos < p.pattern.len() {
        // A stray ')' with no matching '(' was left unconsumed.
        return Err(RegexError::UnbalancedParen { pos: p.pos });
    }
    let max_group = p.next_group - 1;
    let tokens = weedeat(tokens, &p.names, max_group)?;
    Ok(ParseResult {
        tokens,
        names: p.names,
        max_group,
    })
}

/// The canonical `\w` word-character class, computed once: ASCII
/// alphanumerics plus underscore. Shared between `\w`/`\W` token
/// expansion and the matching engine's word-boundary computation.
pub fn word_class() -> &'static Class {
    static WORD: OnceLock<Class> = OnceLock::new();
    WORD.get_or_init(|| {
        Class::from_ranges([(b'0' as u32, b'9' as u32), (b'A' as u32, b'Z' as u32), (b'a' as u32, b'z' as u32), (b'_' as u32, b'_' as u32)])
    })
}

fn digit_class() -> Class {
    Class::from_ranges([(b'0' as u32, b'9' as u32)])
}

fn space_class() -> Class {
    Class::from_ranges([(0x09, 0x0D), (0x20, 0x20)])
}

fn hspace_class() -> Class {
    Class::from_ranges([(0x09, 0x09), (0x20, 0x20)])
}

fn dot_class() -> Class {
    Class::from_ranges([(0, 0), (0x0A, 0x0A), (0x0B, 0x0B), (0x0C, 0x0C), (0x0D, 0x0D)])
}

struct Parser<'a> {
    pattern: &'a [u8],
    pos: usize,
    next_group: i32,
    names: HashMap<String, i32>,
}

impl<'a> Parser<'a> {
    fn end(&self) -> bool {
        self.pos >= self.pattern.len()
    }

    fn peek(&self) -> Option<u8> {
        self.pattern.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.pattern.get(self.pos + offset).copied()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    // === Top of grammar: alternation, branch ===

    fn parse_alts(&mut self, in_group: bool) -> Result<Vec<Token>, RegexError> {
        let mut tokens = Vec::new();
        loop {
            let branch = self.parse_branch()?;
            tokens.extend(branch);
            match self.peek() {
                Some(b'|') => {
                    self.advance(1);
                    tokens.push(Token::Alternator);
                    continue;
                }
                Some(b')') => {
                    if in_group {
                        self.advance(1);
                    }
                    return Ok(tokens);
                }
                None => {
                    if in_group {
                        return Err(RegexError::UnbalancedParen { pos: self.pos });
                    }
                    return Ok(tokens);
                }
                _ => unreachable!("parse_branch stops only at '|', ')' or end"),
            }
        }
    }

    fn parse_branch(&mut self) -> Result<Vec<Token>, RegexError> {
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'|') | Some(b')') => return Ok(tokens),
                _ => {}
            }
            self.parse_atom(&mut tokens)?;
            self.parse_trailing_quantifier(&mut tokens)?;
        }
    }

    fn parse_trailing_quantifier(&mut self, tokens: &mut Vec<Token>) -> Result<(), RegexError> {
        let Some(c) = self.peek() else { return Ok(()) };
        let range = match c {
            b'?' => {
                self.advance(1);
                Some((0, 1))
            }
            b'*' => {
                self.advance(1);
                Some((0, MAXREPS))
            }
            b'+' => {
                self.advance(1);
                Some((1, MAXREPS))
            }
            b'{' => self.try_parse_interval()?,
            _ => None,
        };
        let Some((lo, hi)) = range else { return Ok(()) };

        if !repeatable(tokens.last()) {
            return Err(RegexError::NothingToRepeat { pos: self.pos });
        }
        tokens.push(Token::Range(lo, hi));

        match self.peek() {
            Some(b'?') => {
                self.advance(1);
                tokens.push(Token::Lazy);
            }
            Some(b'+') => {
                self.advance(1);
                tokens.push(Token::Possessive);
            }
            _ => {}
        }
        Ok(())
    }

    /// Try to parse `{m}`, `{m,}` or `{m,n}` at the current position
    /// (already at `{`). Returns `Ok(None)` if this `{` is not a
    /// quantifier (treated as a literal `{`), leaving `self.pos`
    /// unchanged in that case.
    fn try_parse_interval(&mut self) -> Result<Option<(u32, u32)>, RegexError> {
        let start = self.pos;
        // Only commit to interval parsing if a digit follows `{`
        // (possibly after an immediate comma, e.g. `{,5}`).
        let probe = self.peek_at(1);
        if !matches!(probe, Some(b'0'..=b'9') | Some(b',')) {
            return Ok(None);
        }
        self.advance(1); // consume '{'

        let lo = self.scan_digits()?;
        let lo = match lo {
            Some(v) => v,
            None => 0,
        };
        let (lo, hi) = if self.peek() == Some(b',') {
            self.advance(1);
            match self.scan_digits()? {
                Some(hi) => (lo, hi),
                None => (lo, MAXREPS),
            }
        } else {
            (lo, lo)
        };

        if self.peek() != Some(b'}') {
            self.pos = start;
            return Ok(None);
        }
        self.advance(1);

        if lo > hi {
            return Err(RegexError::BadQuantifier { pos: start });
        }
        Ok(Some((lo, hi)))
    }

    /// Scans a run of ASCII digits. Returns `Err(BadInteger)` rather than
    /// silently clamping when the digits overflow `u32`, so an overlong
    /// bound (`{99999999999}`) or group number is reported instead of
    /// quietly matching some smaller value.
    fn scan_digits(&mut self) -> Result<Option<u32>, RegexError> {
        let start = self.pos;
        let mut value: u32 = 0;
        let mut overflowed = false;
        while let Some(c @ b'0'..=b'9') = self.peek() {
            match value.checked_mul(10).and_then(|v| v.checked_add((c - b'0') as u32)) {
                Some(v) => value = v,
                None => overflowed = true,
            }
            self.advance(1);
        }
        if self.pos == start {
            Ok(None)
        } else if overflowed {
            Err(RegexError::BadInteger { pos: start })
        } else {
            Ok(Some(value))
        }
    }

    // === Atoms ===

    fn parse_atom(&mut self, tokens: &mut Vec<Token>) -> Result<(), RegexError> {
        let c = self.peek().expect("caller checked not at end/`|`/`)`");
        match c {
            b'.' => {
                self.advance(1);
                tokens.push(Token::Class(dot_class(), true));
            }
            b'[' => {
                self.advance(1);
                let (class, invert) = self.parse_class()?;
                tokens.push(Token::Class(class, invert));
            }
            b'\\' => {
                self.advance(1);
                self.parse_escape(tokens)?;
            }
            b'^' => {
                self.advance(1);
                tokens.push(Token::StartAnchor);
            }
            b'$' => {
                self.advance(1);
                tokens.push(Token::EndAnchor);
            }
            b'(' => {
                self.advance(1);
                self.parse_group(tokens)?;
            }
            b'*' | b'+' | b'?' => {
                return Err(RegexError::NothingToRepeat { pos: self.pos });
            }
            b'{' => {
                // A `{` that doesn't form a valid interval is a literal.
                if self.try_parse_interval_is_quantifier_here() {
                    return Err(RegexError::NothingToRepeat { pos: self.pos });
                }
                self.advance(1);
                tokens.push(Token::Literal('{' as u32));
            }
            _ => {
                let (cp, len) = codec::decode(self.pattern, self.pos);
                self.advance(len);
                tokens.push(Token::Literal(cp));
            }
        }
        Ok(())
    }

    fn try_parse_interval_is_quantifier_here(&mut self) -> bool {
        let save = self.pos;
        let result = matches!(self.try_parse_interval(), Ok(Some(_)));
        self.pos = save;
        result
    }

    // === Escapes (outside a class) ===

    fn parse_escape(&mut self, tokens: &mut Vec<Token>) -> Result<(), RegexError> {
        let Some(c) = self.peek() else {
            return Err(RegexError::BadEscape { pos: self.pos });
        };
        match c {
            b'd' => {
                self.advance(1);
                tokens.push(Token::Class(digit_class(), false));
            }
            b'D' => {
                self.advance(1);
                tokens.push(Token::Class(digit_class(), true));
            }
            b'w' => {
                self.advance(1);
                tokens.push(Token::Class(word_class().clone(), false));
            }
            b'W' => {
                self.advance(1);
                tokens.push(Token::Class(word_class().clone(), true));
            }
            b's' => {
                self.advance(1);
                tokens.push(Token::Class(space_class(), false));
            }
            b'S' => {
                self.advance(1);
                tokens.push(Token::Class(space_class(), true));
            }
            b'h' => {
                self.advance(1);
                tokens.push(Token::Class(hspace_class(), false));
            }
            b'H' => {
                self.advance(1);
                tokens.push(Token::Class(hspace_class(), true));
            }
            b'b' => {
                self.advance(1);
                tokens.push(Token::WordAnchor(false));
            }
            b'B' => {
                self.advance(1);
                tokens.push(Token::WordAnchor(true));
            }
            b'Q' => {
                self.advance(1);
                self.parse_quote_block(tokens);
            }
            b'1'..=b'9' => {
                self.advance(1);
                tokens.push(Token::Reference((c - b'0') as i32));
            }
            b'0' => {
                self.advance(1);
                let cp = self.scan_octal_after_leading_zero();
                if cp == 0 {
                    tokens.push(Token::EndAnchor);
                } else {
                    tokens.push(Token::Literal(cp));
                }
            }
            b'x' => {
                self.advance(1);
                let cp = self.parse_hex_escape()?;
                tokens.push(Token::Literal(cp));
            }
            b'g' | b'k' => {
                self.advance(1);
                self.parse_named_or_numbered(tokens, NameRole::Reference)?;
            }
            b'a' => {
                self.advance(1);
                tokens.push(Token::Literal(0x07));
            }
            b't' => {
                self.advance(1);
                tokens.push(Token::Literal(0x09));
            }
            b'n' => {
                self.advance(1);
                tokens.push(Token::Literal(0x0A));
            }
            b'v' => {
                self.advance(1);
                tokens.push(Token::Literal(0x0B));
            }
            b'f' => {
                self.advance(1);
                tokens.push(Token::Literal(0x0C));
            }
            b'r' => {
                self.advance(1);
                tokens.push(Token::Literal(0x0D));
            }
            c if c.is_ascii_alphanumeric() => {
                return Err(RegexError::BadEscape { pos: self.pos });
            }
            _ => {
                let (cp, len) = codec::decode(self.pattern, self.pos);
                self.advance(len);
                tokens.push(Token::Literal(cp));
            }
        }
        Ok(())
    }

    fn parse_quote_block(&mut self, tokens: &mut Vec<Token>) {
        while !self.end() {
            if self.peek() == Some(b'\\') && self.peek_at(1) == Some(b'E') {
                self.advance(2);
                return;
            }
            let (cp, len) = codec::decode(self.pattern, self.pos);
            self.advance(len);
            tokens.push(Token::Literal(cp));
        }
    }

    /// `\0` followed by up to two more octal digits (three octal digits
    /// total, including the already-consumed leading `0`).
    fn scan_octal_after_leading_zero(&mut self) -> u32 {
        let mut value: u32 = 0;
        let mut count = 0;
        while count < 2 {
            match self.peek() {
                Some(c @ b'0'..=b'7') => {
                    value = value * 8 + (c - b'0') as u32;
                    self.advance(1);
                    count += 1;
                }
                _ => break,
            }
        }
        value
    }

    fn parse_hex_escape(&mut self) -> Result<u32, RegexError> {
        let start = self.pos;
        if self.peek() == Some(b'{') {
            self.advance(1);
            let mut value: u32 = 0;
            let mut any = false;
            while let Some(c) = self.peek() {
                if c == b'}' {
                    break;
                }
                let Some(d) = hex_digit_value(c) else {
                    return Err(RegexError::BadHexEscape { pos: start });
                };
                value = value * 16 + d;
                any = true;
                self.advance(1);
            }
            if !any || self.peek() != Some(b'}') {
                return Err(RegexError::BadHexEscape { pos: start });
            }
            self.advance(1);
            return Ok(value);
        }

        let mut value: u32 = 0;
        let mut count = 0;
        while count < 2 {
            match self.peek().and_then(hex_digit_value) {
                Some(d) => {
                    value = value * 16 + d;
                    self.advance(1);
                    count += 1;
                }
                None => break,
            }
        }
        if count == 0 {
            return Err(RegexError::BadHexEscape { pos: start });
        }
        Ok(value)
    }

    /// `\g<N>`, `\g'N'`, `\g<name>`, `\g'name'` and the `\k` equivalents.
    /// Per this engine's grammar, both numbered and named forms of `\g`
    /// and `\k` are backreferences (not subroutine calls).
    fn parse_named_or_numbered(
        &mut self,
        tokens: &mut Vec<Token>,
        role: NameRole,
    ) -> Result<(), RegexError> {
        let start = self.pos;
        let close = match self.peek() {
            Some(b'<') => b'>',
            Some(b'\'') => b'\'',
            _ => return Err(RegexError::BadName { pos: start }),
        };
        self.advance(1);
        let name = self.read_until(close)?;
        if name.is_empty() {
            return Err(RegexError::BadName { pos: start });
        }
        if let Ok(n) = name.parse::<i32>() {
            match role {
                NameRole::Reference => tokens.push(Token::Reference(n)),
                NameRole::Subroutine => tokens.push(Token::Subroutine(n)),
            }
        } else {
            tokens.push(Token::Name(name, role));
        }
        Ok(())
    }

    fn read_until(&mut self, close: u8) -> Result<String, RegexError> {
        let start = self.pos;
        let mut buf = Vec::new();
        while let Some(c) = self.peek() {
            if c == close {
                self.advance(1);
                return String::from_utf8(buf)
                    .map_err(|_| RegexError::BadName { pos: start });
            }
            buf.push(c);
            self.advance(1);
        }
        Err(RegexError::BadName { pos: start })
    }

    // === Groups ===

    fn parse_group(&mut self, tokens: &mut Vec<Token>) -> Result<(), RegexError> {
        let open_pos = self.pos - 1;
        if self.peek() != Some(b'?') {
            let group_no = self.next_group;
            self.next_group += 1;
            let body = self.parse_alts(true)?;
            tokens.push(Token::Group(body, GroupKind::Capturing, Some(group_no)));
            return Ok(());
        }
        self.advance(1); // consume '?'

        match self.peek() {
            Some(b':') => {
                self.advance(1);
                let body = self.parse_alts(true)?;
                tokens.push(Token::Group(body, GroupKind::NonCapturing, None));
            }
            Some(b'>') => {
                self.advance(1);
                let body = self.parse_alts(true)?;
                tokens.push(Token::Group(body, GroupKind::Atomic, None));
            }
            Some(b'=') => {
                self.advance(1);
                let body = self.parse_alts(true)?;
                tokens.push(Token::Group(
                    body,
                    GroupKind::Lookahead { invert: false },
                    None,
                ));
            }
            Some(b'!') => {
                self.advance(1);
                let body = self.parse_alts(true)?;
                tokens.push(Token::Group(
                    body,
                    GroupKind::Lookahead { invert: true },
                    None,
                ));
            }
            Some(b'<') if matches!(self.peek_at(1), Some(b'=') | Some(b'!')) => {
                // Lookbehind syntax is reserved by the grammar but not
                // implemented by the matching engine (see DESIGN.md).
                return Err(RegexError::BadGroupModifier { pos: open_pos });
            }
            Some(b'<') | Some(b'\'') => {
                let name = self.parse_group_name()?;
                let group_no = self.next_group;
                self.next_group += 1;
                self.names.insert(name, group_no);
                let body = self.parse_alts(true)?;
                tokens.push(Token::Group(body, GroupKind::Capturing, Some(group_no)));
            }
            Some(b'P') if self.peek_at(1) == Some(b'<') => {
                self.advance(1);
                let name = self.parse_group_name()?;
                let group_no = self.next_group;
                self.next_group += 1;
                self.names.insert(name, group_no);
                let body = self.parse_alts(true)?;
                tokens.push(Token::Group(body, GroupKind::Capturing, Some(group_no)));
            }
            Some(b'R') => {
                self.advance(1);
                self.expect_close_paren(open_pos)?;
                tokens.push(Token::Subroutine(0));
            }
            Some(b'&') => {
                self.advance(1);
                let start = self.pos;
                let mut buf = String::new();
                while let Some(c) = self.peek() {
                    if c == b')' {
                        break;
                    }
                    buf.push(c as char);
                    self.advance(1);
                }
                if buf.is_empty() {
                    return Err(RegexError::BadName { pos: start });
                }
                self.expect_close_paren(open_pos)?;
                tokens.push(Token::Name(buf, NameRole::Subroutine));
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                let n = self
                    .scan_digits()?
                    .ok_or(RegexError::BadGroupDigits { pos: start })?;
                self.expect_close_paren(open_pos)?;
                tokens.push(Token::Subroutine(n as i32));
            }
            _ => {
                return Err(RegexError::BadGroupModifier { pos: open_pos });
            }
        }
        Ok(())
    }

    fn expect_close_paren(&mut self, open_pos: usize) -> Result<(), RegexError> {
        if self.peek() == Some(b')') {
            self.advance(1);
            Ok(())
        } else if self.end() {
            Err(RegexError::UnbalancedParen { pos: open_pos })
        } else {
            Err(RegexError::BadGroupModifier { pos: open_pos })
        }
    }

    fn parse_group_name(&mut self) -> Result<String, RegexError> {
        let start = self.pos;
        let close = match self.peek() {
            Some(b'<') => b'>',
            Some(b'\'') => b'\'',
            _ => return Err(RegexError::BadName { pos: start }),
        };
        self.advance(1);
        self.read_until(close)
    }

    // === Character classes ===

    fn parse_class(&mut self) -> Result<(Class, bool), RegexError> {
        let start = self.pos - 1;
        let negate = if self.peek() == Some(b'^') {
            self.advance(1);
            true
        } else {
            false
        };

        let mut class = Class::new();
        loop {
            match self.peek() {
                None => return Err(RegexError::UnbalancedBracket { pos: start }),
                Some(b']') => {
                    self.advance(1);
                    break;
                }
                Some(b'-') if self.peek_at(1) == Some(b'[') => {
                    self.advance(2);
                    let (inner, inner_neg) = self.parse_class()?;
                    let inner = materialize(inner, inner_neg);
                    class.difference_with(&inner);
                }
                Some(b'&') if self.peek_at(1) == Some(b'&') && self.peek_at(2) == Some(b'[') => {
                    self.advance(3);
                    let (inner, inner_neg) = self.parse_class()?;
                    let inner = materialize(inner, inner_neg);
                    class.intersect_with(&inner);
                }
                Some(b'[') => {
                    self.advance(1);
                    let (inner, inner_neg) = self.parse_class()?;
                    let inner = materialize(inner, inner_neg);
                    class.union_with(&inner);
                }
                _ => {
                    match self.parse_class_item()? {
                        ClassItem::Set(set) => class.union_with(&set),
                        ClassItem::Cp(lo) => {
                            let is_range = self.peek() == Some(b'-')
                                && !matches!(self.peek_at(1), Some(b']') | Some(b'['));
                            if is_range {
                                self.advance(1);
                                let range_pos = self.pos;
                                let hi = match self.parse_class_item()? {
                                    ClassItem::Cp(hi) => hi,
                                    ClassItem::Set(_) => {
                                        return Err(RegexError::BadRange { pos: range_pos })
                                    }
                                };
                                if lo > hi {
                                    return Err(RegexError::BadRange { pos: range_pos });
                                }
                                class.insert(lo, hi);
                            } else {
                                class.insert(lo, lo);
                            }
                        }
                    }
                }
            }
        }

        if !negate && class.is_empty() {
            return Err(RegexError::EmptyClass { pos: start });
        }
        Ok((class, negate))
    }

    fn parse_class_item(&mut self) -> Result<ClassItem, RegexError> {
        if self.peek() == Some(b'\\') {
            self.advance(1);
            return self.parse_class_escape();
        }
        let (cp, len) = codec::decode(self.pattern, self.pos);
        self.advance(len);
        Ok(ClassItem::Cp(cp))
    }

    fn parse_class_escape(&mut self) -> Result<ClassItem, RegexError> {
        let Some(c) = self.peek() else {
            return Err(RegexError::BadEscape { pos: self.pos });
        };
        let item = match c {
            b'd' => {
                self.advance(1);
                ClassItem::Set(digit_class())
            }
            b'D' => {
                self.advance(1);
                ClassItem::Set(digit_class().complement(crate::class::MAX_CODEPOINT))
            }
            b'w' => {
                self.advance(1);
                ClassItem::Set(word_class().clone())
            }
            b'W' => {
                self.advance(1);
                ClassItem::Set(word_class().complement(crate::class::MAX_CODEPOINT))
            }
            b's' => {
                self.advance(1);
                ClassItem::Set(space_class())
            }
            b'S' => {
                self.advance(1);
                ClassItem::Set(space_class().complement(crate::class::MAX_CODEPOINT))
            }
            b'h' => {
                self.advance(1);
                ClassItem::Set(hspace_class())
            }
            b'H' => {
                self.advance(1);
                ClassItem::Set(hspace_class().complement(crate::class::MAX_CODEPOINT))
            }
            b'b' => {
                self.advance(1);
                ClassItem::Cp(0x08)
            }
            b'a' => {
                self.advance(1);
                ClassItem::Cp(0x07)
            }
            b't' => {
                self.advance(1);
                ClassItem::Cp(0x09)
            }
            b'n' => {
                self.advance(1);
                ClassItem::Cp(0x0A)
            }
            b'v' => {
                self.advance(1);
                ClassItem::Cp(0x0B)
            }
            b'f' => {
                self.advance(1);
                ClassItem::Cp(0x0C)
            }
            b'r' => {
                self.advance(1);
                ClassItem::Cp(0x0D)
            }
            b'x' => {
                self.advance(1);
                ClassItem::Cp(self.parse_hex_escape()?)
            }
            b'0'..=b'7' => {
                let cp = self.scan_octal_full();
                ClassItem::Cp(cp)
            }
            c if c.is_ascii_alphanumeric() => {
                return Err(RegexError::BadEscape { pos: self.pos });
            }
            _ => {
                let (cp, len) = codec::decode(self.pattern, self.pos);
                self.advance(len);
                ClassItem::Cp(cp)
            }
        };
        Ok(item)
    }

    fn scan_octal_full(&mut self) -> u32 {
        let mut value: u32 = 0;
        let mut count = 0;
        while count < 3 {
            match self.peek() {
                Some(c @ b'0'..=b'7') => {
                    value = value * 8 + (c - b'0') as u32;
                    self.advance(1);
                    count += 1;
                }
                _ => break,
            }
        }
        value
    }
}

enum ClassItem {
    Cp(u32),
    Set(Class),
}

fn materialize(class: Class, negated: bool) -> Class {
    if negated {
        class.complement(crate::class::MAX_CODEPOINT)
    } else {
        class
    }
}

fn hex_digit_value(c: u8) -> Option<u32> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as u32),
        b'a'..=b'f' => Some((c - b'a') as u32 + 10),
        b'A'..=b'F' => Some((c - b'A') as u32 + 10),
        _ => None,
    }
}

fn repeatable(last: Option<&Token>) -> bool {
    matches!(
        last,
        Some(Token::Literal(_))
            | Some(Token::Class(_, _))
            | Some(Token::Group(_, _, _))
            | Some(Token::Reference(_))
            | Some(Token::Subroutine(_))
            | Some(Token::Name(_, _))
    )
}

// === weedeat: the post-parse normalization pass ===

fn weedeat(
    tokens: Vec<Token>,
    names: &HashMap<String, i32>,
    max_group: i32,
) -> Result<Vec<Token>, RegexError> {
    let tokens = recurse_into_groups(tokens, names, max_group)?;
    let tokens = denullify(tokens);
    let tokens = stringify(tokens);
    let tokens = promote_literals(tokens);
    let tokens = convert_possessive(tokens);
    badref_check(tokens, names, max_group)
}

fn recurse_into_groups(
    tokens: Vec<Token>,
    names: &HashMap<String, i32>,
    max_group: i32,
) -> Result<Vec<Token>, RegexError> {
    let mut out = Vec::with_capacity(tokens.len());
    for tok in tokens {
        let tok = match tok {
            Token::Group(body, kind, n) => {
                let body = weedeat(body, names, max_group)?;
                Token::Group(body, kind, n)
            }
            other => other,
        };
        out.push(tok);
    }
    Ok(out)
}

fn denullify(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for tok in tokens {
        match tok {
            Token::Class(class, invert) => {
                let effectively_matches_nul = class.contains(0) != invert;
                if effectively_matches_nul {
                    let mut adjusted = class;
                    if invert {
                        adjusted.insert(0, 0);
                    } else {
                        adjusted.delete(0, 0);
                    }
                    out.push(Token::Group(
                        vec![
                            Token::Class(adjusted, invert),
                            Token::Alternator,
                            Token::EndAnchor,
                        ],
                        GroupKind::NonCapturing,
                        None,
                    ));
                } else {
                    out.push(Token::Class(class, invert));
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn stringify(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let Token::Literal(_) = &tokens[i] {
            let run_start = i;
            let mut j = i;
            while j < tokens.len() && matches!(tokens[j], Token::Literal(_)) {
                j += 1;
            }
            // tokens[run_start..j] is the maximal literal run. If the
            // token right after it is a Range, the last literal in the
            // run cannot be fused (the quantifier needs it isolated).
            let fuse_end = if j < tokens.len() && matches!(tokens[j], Token::Range(_, _)) {
                j - 1
            } else {
                j
            };
            if fuse_end > run_start {
                let mut bytes = Vec::new();
                for tok in &tokens[run_start..fuse_end] {
                    if let Token::Literal(cp) = tok {
                        bytes.extend(codec::encode_vec(*cp));
                    }
                }
                out.push(Token::Str(bytes));
            }
            for tok in &tokens[fuse_end..j] {
                out.push(tok.clone());
            }
            i = j;
        } else {
            out.push(tokens[i].clone());
            i += 1;
        }
    }
    out
}

fn convert_possessive(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let Token::Possessive = &tokens[i] {
            if out.len() >= 2 {
                if let Token::Range(lo, hi) = out[out.len() - 1].clone() {
                    let atom = out.pop().unwrap(); // Range, discarded below
                    let _ = atom;
                    let repeated_atom = out.pop().unwrap();
                    out.push(Token::Group(
                        vec![repeated_atom, Token::Range(lo, hi)],
                        GroupKind::Atomic,
                        None,
                    ));
                    i += 1;
                    continue;
                }
            }
            // Malformed tree (should not happen post range_applicable
            // checks); drop the stray Possessive token.
            i += 1;
            continue;
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

fn promote_literals(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|tok| match tok {
            Token::Literal(cp) => Token::Class(Class::single(cp), false),
            other => other,
        })
        .collect()
}

fn badref_check(
    tokens: Vec<Token>,
    names: &HashMap<String, i32>,
    max_group: i32,
) -> Result<Vec<Token>, RegexError> {
    let mut out = Vec::with_capacity(tokens.len());
    for tok in tokens {
        let tok = match tok {
            Token::Name(name, role) => {
                let n = *names
                    .get(&name)
                    .ok_or(RegexError::BadReference { pos: 0 })?;
                match role {
                    NameRole::Reference => Token::Reference(n),
                    NameRole::Subroutine => Token::Subroutine(n),
                }
            }
            Token::Reference(n) => {
                if n < 1 || n > max_group {
                    return Err(RegexError::BadReference { pos: 0 });
                }
                Token::Reference(n)
            }
            Token::Subroutine(n) => {
                if n != 0 && (n < 1 || n > max_group) {
                    return Err(RegexError::BadReference { pos: 0 });
                }
                Token::Subroutine(n)
            }
            Token::Group(body, kind, n) => {
                let body = badref_check(body, names, max_group)?;
                Token::Group(body, kind, n)
            }
            other => other,
        };
        out.push(tok);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(pattern: &str) -> ParseResult {
        parse(pattern.as_bytes()).unwrap_or_else(|e| panic!("{pattern:?} failed to parse: {e}"))
    }

    fn err_code(pattern: &str) -> &'static str {
        parse(pattern.as_bytes())
            .expect_err(&format!("{pattern:?} should not parse"))
            .code()
    }

    #[test]
    fn reference_patterns_all_compile() {
        for p in [
            "",
            "a",
            "a|b",
            "a*",
            "a+?",
            "(a)(b)\\1\\2",
            "(?<x>a)\\g<x>",
            "[a-z&&[^aeiou]]",
            "(?>a+)b",
            "(?R)",
        ] {
            ok(p);
        }
    }

    #[test]
    fn reference_error_patterns() {
        assert_eq!(err_code("["), "UNBBRA");
        assert_eq!(err_code("*"), "NOTREP");
        assert_eq!(err_code("("), "UNBPAR");
        assert_eq!(err_code("(?"), "QUEPAR");
        assert_eq!(err_code("[]"), "EMPCLA");
        assert_eq!(err_code("[b-a]"), "BADRAN");
        assert_eq!(err_code("\\9"), "BADREF");
    }

    #[test]
    fn named_group_and_backreference_resolve() {
        let r = ok("(?<name>123)\\g<name>");
        assert_eq!(r.names.get("name"), Some(&1));
    }

    #[test]
    fn stringify_fuses_literal_runs() {
        let r = ok("abc");
        assert!(matches!(r.tokens.as_slice(), [Token::Str(bytes)] if bytes == b"abc"));
    }

    #[test]
    fn stringify_leaves_quantified_literal_isolated() {
        let r = ok("abc*");
        // "ab" fused, 'c' isolated then promoted to a single-codepoint class.
        assert_eq!(r.tokens.len(), 3);
        assert!(matches!(&r.tokens[0], Token::Str(b) if b == b"ab"));
        assert!(matches!(&r.tokens[1], Token::Class(_, false)));
        assert!(matches!(&r.tokens[2], Token::Range(0, MAXREPS)));
    }

    #[test]
    fn denullify_lifts_nul_out_of_class() {
        let r = ok("[\\x00-\\x05]");
        assert_eq!(r.tokens.len(), 1);
        assert!(matches!(&r.tokens[0], Token::Group(body, GroupKind::NonCapturing, None) if body.len() == 3));
    }

    #[test]
    fn possessive_rewritten_to_atomic() {
        let r = ok("a++");
        assert!(matches!(
            r.tokens.as_slice(),
            [Token::Group(_, GroupKind::Atomic, None)]
        ));
    }

    #[test]
    fn class_set_algebra() {
        let r = ok("[a-z&&[^aeiou]]");
        let Token::Class(class, false) = &r.tokens[0] else {
            panic!("expected class token")
        };
        assert!(class.contains(b'b' as u32));
        assert!(!class.contains(b'a' as u32));
    }

    #[test]
    fn lookbehind_is_rejected_as_unimplemented() {
        assert_eq!(err_code("(?<=a)"), "QUEPAR");
        assert_eq!(err_code("(?<!a)"), "QUEPAR");
    }

    #[test]
    fn literal_brace_without_interval_shape() {
        let r = ok("a{b}");
        assert!(matches!(&r.tokens[0], Token::Str(b) if b == b"a{b}"));
    }
}
