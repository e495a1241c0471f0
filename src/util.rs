//! Position/offset conversion helpers for the LSP surface.

use tower_lsp::lsp_types::Position;

/// Convert an LSP Position (line, character) to a byte offset in content.
/// LSP characters are UTF-16 code units; PHP sources are close enough to
/// ASCII that a char-index mapping suffices here.
pub(crate) fn position_to_offset(content: &str, position: Position) -> Option<usize> {
    let mut offset = 0usize;
    for (i, line) in content.lines().enumerate() {
        if i == position.line as usize {
            let byte_col = line
                .char_indices()
                .nth(position.character as usize)
                .map(|(idx, _)| idx)
                .unwrap_or(line.len());
            return Some(offset + byte_col);
        }
        offset += line.len() + 1;
    }
    // Past the last line: clamp to end of content.
    Some(content.len())
}

/// The rest of the caret's line, used by the classifier to disambiguate
/// partially-typed tokens.
pub(crate) fn line_tail(content: &str, offset: usize) -> &str {
    let rest = &content[offset.min(content.len())..];
    match rest.find('\n') {
        Some(idx) => rest[..idx].trim_end_matches('\r'),
        None => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_maps_to_byte_offset() {
        let content = "<?php\n$a = 1;\n";
        assert_eq!(position_to_offset(content, Position::new(0, 0)), Some(0));
        assert_eq!(position_to_offset(content, Position::new(1, 2)), Some(8));
        assert_eq!(
            position_to_offset(content, Position::new(9, 0)),
            Some(content.len())
        );
    }

    #[test]
    fn line_tail_stops_at_newline() {
        let content = "<?php\n$a->x = 1;\n";
        let offset = position_to_offset(content, Position::new(1, 4)).unwrap();
        assert_eq!(line_tail(content, offset), "x = 1;");
    }
}
