//! Positional cursor over netlist text.

use std::fmt;
use std::ops::BitOr;

/// Byte returned by [`ParseBuffer::current`] past the end of input.
pub const END: u8 = b'\0';

/// Line comment marker (only at the start of a line).
pub const COMMENT: u8 = b'*';

/// Inline comment marker (rest of line).
pub const INLINE_COMMENT: u8 = b';';

/// A location in the netlist, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset from the start of input
    pub offset: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What [`ParseBuffer::skip_whitespace`] is allowed to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skip(u8);

impl Skip {
    /// Spaces, tabs and carriage returns.
    pub const SPACES: Skip = Skip(0b001);
    /// Line feeds.
    pub const NEWLINES: Skip = Skip(0b010);
    /// `*` line comments and `;` inline comments.
    pub const COMMENTS: Skip = Skip(0b100);
    /// Everything above.
    pub const ALL: Skip = Skip(0b111);

    /// Check whether every flag in `other` is set.
    pub fn contains(self, other: Skip) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Skip {
    type Output = Skip;

    fn bitor(self, rhs: Skip) -> Skip {
        Skip(self.0 | rhs.0)
    }
}

/// Cursor over an immutable netlist buffer.
///
/// None of the primitives fail: callers observe a non-match and turn it into
/// a parse error with [`ParseBuffer::position`].
#[derive(Debug, Clone)]
pub struct ParseBuffer<'a> {
    input: &'a [u8],
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> ParseBuffer<'a> {
    /// Create a new cursor at the start of `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Byte under the cursor, or [`END`].
    pub fn current(&self) -> u8 {
        self.input.get(self.offset).copied().unwrap_or(END)
    }

    /// Byte after the cursor, or [`END`].
    pub fn peek_next(&self) -> u8 {
        self.input.get(self.offset + 1).copied().unwrap_or(END)
    }

    /// Check whether the cursor has consumed all input.
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.input.len()
    }

    /// Check whether the cursor sits on a line feed or the end of input.
    pub fn at_line_end(&self) -> bool {
        matches!(self.current(), b'\n' | END)
    }

    /// Move forward `n` bytes, stopping at the end of input.
    pub fn advance(&mut self, n: usize) {
        for _ in 0..n {
            match self.input.get(self.offset) {
                Some(b'\n') => {
                    self.line += 1;
                    self.column = 1;
                }
                Some(_) => self.column += 1,
                None => return,
            }
            self.offset += 1;
        }
    }

    /// Consume `c` if it is under the cursor.
    pub fn match_char(&mut self, c: u8) -> bool {
        if !self.is_at_end() && self.current() == c {
            self.advance(1);
            true
        } else {
            false
        }
    }

    /// Consume `literal` if the input continues with it exactly.
    pub fn match_str(&mut self, literal: &str) -> bool {
        if self.input[self.offset..].starts_with(literal.as_bytes()) {
            self.advance(literal.len());
            true
        } else {
            false
        }
    }

    /// Consume `literal` ignoring ASCII case.
    pub fn match_str_ignore_case(&mut self, literal: &str) -> bool {
        let rest = &self.input[self.offset..];
        if rest.len() >= literal.len() && rest[..literal.len()].eq_ignore_ascii_case(literal.as_bytes()) {
            self.advance(literal.len());
            true
        } else {
            false
        }
    }

    /// Skip whitespace and comments as selected by `flags`.
    pub fn skip_whitespace(&mut self, flags: Skip) {
        loop {
            match self.current() {
                b' ' | b'\t' | b'\r' if flags.contains(Skip::SPACES) => self.advance(1),
                b'\n' if flags.contains(Skip::NEWLINES) => self.advance(1),
                COMMENT if flags.contains(Skip::COMMENTS) && self.column == 1 => self.skip_to_line_end(),
                INLINE_COMMENT if flags.contains(Skip::COMMENTS) => self.skip_to_line_end(),
                _ => break,
            }
        }
    }

    /// Advance up to (not past) the next line feed.
    pub fn skip_to_line_end(&mut self) {
        while !self.at_line_end() {
            self.advance(1);
        }
    }

    /// Consume a run of bytes up to whitespace, a parenthesis, or a comment.
    pub fn read_word(&mut self) -> &'a str {
        let start = self.offset;
        while !self.is_at_end() && !is_delimiter(self.current()) {
            self.advance(1);
        }
        // Words never split a UTF-8 sequence: delimiters are all ASCII.
        std::str::from_utf8(&self.input[start..self.offset]).unwrap_or_default()
    }

    /// Current cursor position.
    pub fn position(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }
}

fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b'(' | b')' | INLINE_COMMENT)
}
