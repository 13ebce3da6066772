// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

/// Character cursor over parser input that tracks 1-based line/column (columns count chars).
#[derive(Debug, Clone, Copy)]
pub(super) struct Cursor<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub(super) fn new(src: &'a str) -> Self {
        Self { src, offset: 0, line: 1, column: 1 }
    }

    pub(super) fn pos(&self) -> SourcePos {
        SourcePos { line: self.line, column: self.column }
    }

    pub(super) fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    pub(super) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(super) fn peek_second(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    pub(super) fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some('\n'))
    }

    pub(super) fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Advances over the next `len` bytes. `len` must land on a char boundary.
    pub(super) fn advance_bytes(&mut self, len: usize) {
        let target = (self.offset + len).min(self.src.len());
        while self.offset < target {
            self.bump();
        }
    }

    pub(super) fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            return true;
        }
        false
    }

    pub(super) fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.bump();
        }
    }

    pub(super) fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Consumes chars while `pred` holds and returns them as a slice.
    pub(super) fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.offset;
        while self.peek().is_some_and(&mut pred) {
            self.bump();
        }
        &self.src[start..self.offset]
    }

    /// Text up to (not including) the next newline.
    pub(super) fn line_rest(&self) -> &'a str {
        let rest = self.rest();
        match memchr::memchr(b'\n', rest.as_bytes()) {
            Some(end) => &rest[..end],
            None => rest,
        }
    }

    /// Consumes and returns the text up to (not including) the next newline.
    pub(super) fn take_line_rest(&mut self) -> &'a str {
        let text = self.line_rest();
        self.advance_bytes(text.len());
        text
    }

    /// Consumes a `quote`-delimited string that must close on the current line.
    ///
    /// Expects the cursor on the opening quote. Returns `None` (cursor unchanged) when the quote
    /// is unterminated.
    pub(super) fn take_quoted_on_line(&mut self, quote: u8) -> Option<&'a str> {
        let body = &self.rest()[1..];
        let end = memchr::memchr2(quote, b'\n', body.as_bytes())?;
        if body.as_bytes()[end] != quote {
            return None;
        }
        let value = &body[..end];
        self.advance_bytes(end + 2);
        Some(value)
    }

    /// The next whitespace-delimited token (at most `max_chars` chars), without consuming it.
    pub(super) fn peek_token(&self, max_chars: usize) -> String {
        self.rest().chars().take_while(|c| !c.is_whitespace()).take(max_chars).collect()
    }
}
