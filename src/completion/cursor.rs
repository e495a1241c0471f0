//! Position-relative, read-only view over a token stream.
//!
//! The classifier works backward from "the last token before the caret", so
//! this cursor is backward-biased: relative offsets are usually zero or
//! negative. Repositioning mutates only the cursor position, never the
//! underlying stream.

use crate::lexer::{Token, TokenKind, TokenStream};

/// Cursor over a [`TokenStream`], anchored at the last token.
///
/// Position `-1` means "no current token"; every accessor then reports
/// [`TokenKind::Invalid`], which callers must treat as a hard stop.
pub struct TokenCursor<'a> {
    stream: &'a TokenStream,
    source: &'a str,
    pos: isize,
}

impl<'a> TokenCursor<'a> {
    /// Anchor a cursor at the last token of `stream`.
    pub fn new(stream: &'a TokenStream, source: &'a str) -> Self {
        Self {
            stream,
            source,
            pos: stream.len() as isize - 1,
        }
    }

    /// Kind of the current token, or `Invalid` when exhausted.
    pub fn kind(&self) -> TokenKind {
        self.kind_at(0)
    }

    /// Kind of the token `rel` positions away from the current one;
    /// `Invalid` when the position falls outside the stream.
    pub fn kind_at(&self, rel: isize) -> TokenKind {
        match self.token_at(rel) {
            Some(token) => token.kind,
            None => TokenKind::Invalid,
        }
    }

    /// The token `rel` positions away, if in bounds.
    pub fn token_at(&self, rel: isize) -> Option<Token> {
        let pos = self.pos + rel;
        if pos >= 0 {
            self.stream.get(pos as usize)
        } else {
            None
        }
    }

    /// Literal source text of the token `rel` positions away; empty for
    /// out-of-bounds positions.
    pub fn text_at(&self, rel: isize) -> &'a str {
        match self.token_at(rel) {
            Some(token) => &self.source[token.begin as usize..token.end as usize],
            None => "",
        }
    }

    /// End offset (exclusive) of the current token; 0 when exhausted.
    pub fn end_offset(&self) -> usize {
        self.token_at(0).map_or(0, |t| t.end as usize)
    }

    /// Move to the previous token. Saturates at `-1`.
    pub fn pop(&mut self) {
        if self.pos >= 0 {
            self.pos -= 1;
        }
    }

    /// Move relative to the current token. Saturates at `-1`; callers honor
    /// the upper boundary themselves (the classifier only ever moves onto
    /// positions it has already inspected).
    pub fn move_to(&mut self, rel: isize) {
        self.pos = (self.pos + rel).max(-1);
        debug_assert!(self.pos < self.stream.len() as isize);
    }

    /// If the token at `*rel` is whitespace, step one further back.
    pub fn skip_whitespace(&self, rel: &mut isize) {
        if self.kind_at(*rel) == TokenKind::Whitespace {
            *rel -= 1;
        }
    }

    /// Check whether the current token is directly preceded by `kinds`,
    /// scanned most-recent-first. Returns the number of positions consumed
    /// (so the earliest matched token sits at relative position
    /// `-(consumed) + 1`), or `None` when the run does not match.
    pub fn prefixed_by(&self, kinds: &[TokenKind], skip_whitespace: bool) -> Option<usize> {
        debug_assert!(!kinds.is_empty());
        let mut steps: isize = 1;
        for &expected in kinds {
            if skip_whitespace && self.kind_at(-steps) == TokenKind::Whitespace {
                steps += 1;
            }
            if self.kind_at(-steps) == expected {
                steps += 1;
            } else {
                return None;
            }
        }
        Some(steps as usize)
    }

    /// With the cursor on a `,` inside a call's argument list, walk backward
    /// to the matching opening parenthesis, balancing nested parentheses.
    /// Leaves the cursor on that parenthesis, or exhausted (`Invalid`) when
    /// the list is unbalanced; callers must treat that as "not a call".
    pub fn remove_other_arguments(&mut self) {
        debug_assert_eq!(self.kind(), TokenKind::Comma);

        let mut open = 0u32;
        loop {
            self.pop();
            match self.kind() {
                TokenKind::RParen => open += 1,
                TokenKind::LParen => {
                    if open == 0 {
                        return;
                    }
                    open -= 1;
                }
                TokenKind::Invalid => return,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn cursor_over(text: &'static str) -> (TokenStream, &'static str) {
        (tokenize(text), text)
    }

    #[test]
    fn anchored_at_last_token() {
        let (stream, text) = cursor_over("<?php Foo::");
        let cursor = TokenCursor::new(&stream, text);
        assert_eq!(cursor.kind(), TokenKind::DoubleColon);
        assert_eq!(cursor.kind_at(-1), TokenKind::Identifier);
        assert_eq!(cursor.text_at(-1), "Foo");
    }

    #[test]
    fn out_of_bounds_is_invalid() {
        let (stream, text) = cursor_over("<?php ");
        let cursor = TokenCursor::new(&stream, text);
        assert_eq!(cursor.kind_at(-10), TokenKind::Invalid);
        assert_eq!(cursor.text_at(-10), "");
    }

    #[test]
    fn prefixed_by_matches_clause_head() {
        // `class A extends `, cursor on the whitespace after `extends`.
        let (stream, text) = cursor_over("<?php class A extends");
        let mut cursor = TokenCursor::new(&stream, text);
        assert_eq!(cursor.kind(), TokenKind::Extends);
        let consumed = cursor.prefixed_by(
            &[
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::Class,
            ],
            false,
        );
        assert!(consumed.is_some());
        // Mismatch: no `class` keyword before the identifier.
        cursor.pop();
        assert!(
            cursor
                .prefixed_by(&[TokenKind::Whitespace, TokenKind::Class], false)
                .is_none()
        );
    }

    #[test]
    fn remove_other_arguments_balances_nesting() {
        // `foo(bar(1, 2), `, cursor on the trailing comma.
        let (stream, text) = cursor_over("<?php foo(bar(1, 2),");
        let mut cursor = TokenCursor::new(&stream, text);
        assert_eq!(cursor.kind(), TokenKind::Comma);
        cursor.remove_other_arguments();
        assert_eq!(cursor.kind(), TokenKind::LParen);
        // It must be foo's parenthesis, not bar's.
        assert_eq!(cursor.text_at(-1), "foo");
    }

    #[test]
    fn remove_other_arguments_unbalanced_exhausts() {
        let (stream, text) = cursor_over("<?php 1, 2,");
        let mut cursor = TokenCursor::new(&stream, text);
        assert_eq!(cursor.kind(), TokenKind::Comma);
        cursor.remove_other_arguments();
        assert_eq!(cursor.kind(), TokenKind::Invalid);
    }
}
