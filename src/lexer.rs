//! PHP token scanner feeding the completion classifier.
//!
//! This is not a general-purpose PHP lexer: it produces exactly the token
//! kinds the backward-looking classifier dispatches on, with begin/end byte
//! offsets into the scanned text window. Heredocs and string interpolation
//! are deliberately flattened (a double-quoted string is one token), since
//! the classifier never offers completion inside them anyway.

use memchr::{memchr, memchr2};

/// Token categories recognised by the scanner.
///
/// The enumeration mirrors the surface grammar closely enough for the
/// classifier's last-token dispatch: every keyword it reacts to gets its own
/// variant, operators in the "normal expression" set get individual variants,
/// and `Invalid` doubles as the out-of-bounds sentinel of [`TokenCursor`].
///
/// [`TokenCursor`]: crate::completion::cursor::TokenCursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Sentinel for out-of-bounds cursor positions; never produced for text.
    Invalid,
    /// Raw text outside `<?php … ?>`.
    InlineHtml,
    OpenTag,
    OpenTagWithEcho,
    CloseTag,
    Whitespace,
    /// `// …`, `# …` (including the terminating newline when present) or a
    /// closed `/* … */` block.
    Comment,
    /// A closed `/** … */` block.
    DocComment,

    /// Bare identifier: class/function/constant names.
    Identifier,
    /// `$name`.
    Variable,
    IntLiteral,
    FloatLiteral,
    /// Single- or double-quoted string, closed or running to end of text.
    ConstantString,

    // Keywords.
    Abstract,
    Array,
    As,
    Break,
    Callable,
    Case,
    Catch,
    Class,
    Clone,
    Const,
    Continue,
    Declare,
    Default,
    Do,
    Echo,
    Else,
    ElseIf,
    Empty,
    EndDeclare,
    EndFor,
    EndForeach,
    EndIf,
    EndSwitch,
    EndWhile,
    Eval,
    Exit,
    Extends,
    Final,
    Finally,
    For,
    Foreach,
    Function,
    Global,
    Goto,
    If,
    Implements,
    Include,
    IncludeOnce,
    InstanceOf,
    InsteadOf,
    Interface,
    Isset,
    List,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Namespace,
    New,
    Print,
    Private,
    Protected,
    Public,
    Require,
    RequireOnce,
    Return,
    Static,
    Switch,
    Throw,
    Trait,
    Try,
    Unset,
    Use,
    Var,
    While,

    // Magic constants.
    FileConstant,
    DirConstant,
    LineConstant,
    ClassNameConstant,
    FunctionConstant,
    MethodConstant,
    NamespaceConstant,

    // Operators and punctuation.
    /// `->` or `?->`.
    Arrow,
    /// `::`.
    DoubleColon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Concat,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Pow,
    Assign,
    PlusAssign,
    MinusAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ConcatAssign,
    PowAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    IsEqual,
    IsIdentical,
    IsNotEqual,
    IsNotIdentical,
    IsSmaller,
    IsGreater,
    IsSmallerOrEqual,
    IsGreaterOrEqual,
    BooleanAnd,
    BooleanOr,
    Bang,
    Question,
    Colon,
    BitAnd,
    BitOr,
    BitXor,
    Tilde,
    Shl,
    Shr,
    Inc,
    Dec,
    DoubleArrow,
    At,
    Dollar,
    Backslash,
    Backtick,
}

impl TokenKind {
    /// Tokens after which an ordinary expression (or a fresh statement) may
    /// start, so plain completion is on offer.
    pub fn is_expression_token(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            AndAssign
                | Assign
                | At
                | Bang
                | BitAnd
                | BitOr
                | BitXor
                | BooleanAnd
                | BooleanOr
                | Colon
                | Concat
                | ConcatAssign
                | Dec
                | Div
                | DivAssign
                | DocComment
                | DoubleArrow
                | Echo
                | Exit
                | Inc
                | IsEqual
                | IsGreater
                | IsGreaterOrEqual
                | IsIdentical
                | IsNotEqual
                | IsNotIdentical
                | IsSmaller
                | IsSmallerOrEqual
                | LBrace
                | LBracket
                | LogicalAnd
                | LogicalOr
                | LogicalXor
                | Minus
                | MinusAssign
                | Mod
                | ModAssign
                | Mul
                | MulAssign
                | OpenTagWithEcho
                | OrAssign
                | Plus
                | PlusAssign
                | Pow
                | PowAssign
                | Print
                | Question
                | RBrace
                | Return
                | Semicolon
                | Shl
                | ShlAssign
                | Shr
                | ShrAssign
                | Identifier
                | Tilde
                | XorAssign
        )
    }

    /// Class-member modifier keywords (`public function …` and friends).
    pub fn is_member_modifier(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Abstract | Const | Final | Public | Private | Protected | Static | Var
        )
    }

    /// Tokens that terminate backward expression extraction.
    pub fn is_expression_stop(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Semicolon
                | Invalid
                | OpenTag
                | OpenTagWithEcho
                | LBrace
                | RBrace
                | If
                | While
                | For
                | Foreach
                | Switch
                | ElseIf
        )
    }
}

/// A single lexed token; offsets are byte positions into the scanned text,
/// with `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub begin: u32,
    pub end: u32,
}

/// Ordered token sequence for one text window. Built once, never mutated.
#[derive(Debug, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Token> {
        self.tokens.get(index).copied()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Keyword lookup, case-insensitive as in PHP.
fn keyword_kind(word: &str) -> Option<TokenKind> {
    use TokenKind::*;
    let lower = word.to_ascii_lowercase();
    let kind = match lower.as_str() {
        "abstract" => Abstract,
        "array" => Array,
        "as" => As,
        "break" => Break,
        "callable" => Callable,
        "case" => Case,
        "catch" => Catch,
        "class" => Class,
        "clone" => Clone,
        "const" => Const,
        "continue" => Continue,
        "declare" => Declare,
        "default" => Default,
        "do" => Do,
        "echo" => Echo,
        "else" => Else,
        "elseif" => ElseIf,
        "empty" => Empty,
        "enddeclare" => EndDeclare,
        "endfor" => EndFor,
        "endforeach" => EndForeach,
        "endif" => EndIf,
        "endswitch" => EndSwitch,
        "endwhile" => EndWhile,
        "eval" => Eval,
        "exit" | "die" => Exit,
        "extends" => Extends,
        "final" => Final,
        "finally" => Finally,
        "for" => For,
        "foreach" => Foreach,
        "function" => Function,
        "global" => Global,
        "goto" => Goto,
        "if" => If,
        "implements" => Implements,
        "include" => Include,
        "include_once" => IncludeOnce,
        "instanceof" => InstanceOf,
        "insteadof" => InsteadOf,
        "interface" => Interface,
        "isset" => Isset,
        "list" => List,
        "and" => LogicalAnd,
        "or" => LogicalOr,
        "xor" => LogicalXor,
        "namespace" => Namespace,
        "new" => New,
        "print" => Print,
        "private" => Private,
        "protected" => Protected,
        "public" => Public,
        "require" => Require,
        "require_once" => RequireOnce,
        "return" => Return,
        "static" => Static,
        "switch" => Switch,
        "throw" => Throw,
        "trait" => Trait,
        "try" => Try,
        "unset" => Unset,
        "use" => Use,
        "var" => Var,
        "while" => While,
        "__file__" => FileConstant,
        "__dir__" => DirConstant,
        "__line__" => LineConstant,
        "__class__" => ClassNameConstant,
        "__function__" => FunctionConstant,
        "__method__" => MethodConstant,
        "__namespace__" => NamespaceConstant,
        _ => return None,
    };
    Some(kind)
}

/// Tokenize a text window.
///
/// Text before the first `<?php`/`<?=` open tag is emitted as one
/// `InlineHtml` token. An unterminated `/*` block comment at the end of the
/// window is *not* emitted; the classifier detects it by peeking at the text
/// following the last token.
pub fn tokenize(text: &str) -> TokenStream {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let mut in_php = false;

    let push = |tokens: &mut Vec<Token>, kind: TokenKind, begin: usize, end: usize| {
        tokens.push(Token {
            kind,
            begin: begin as u32,
            end: end as u32,
        });
    };

    while pos < bytes.len() {
        if !in_php {
            // Scan for an open tag, emitting everything before it as HTML.
            let mut search = pos;
            let tag = loop {
                match memchr(b'<', &bytes[search..]) {
                    Some(off) => {
                        let at = search + off;
                        if bytes[at..].starts_with(b"<?") {
                            break Some(at);
                        }
                        search = at + 1;
                    }
                    None => break None,
                }
            };
            match tag {
                Some(at) => {
                    if at > pos {
                        push(&mut tokens, TokenKind::InlineHtml, pos, at);
                    }
                    if bytes[at..].starts_with(b"<?=") {
                        push(&mut tokens, TokenKind::OpenTagWithEcho, at, at + 3);
                        pos = at + 3;
                    } else if text[at..]
                        .get(..5)
                        .is_some_and(|t| t.eq_ignore_ascii_case("<?php"))
                    {
                        push(&mut tokens, TokenKind::OpenTag, at, at + 5);
                        pos = at + 5;
                    } else {
                        push(&mut tokens, TokenKind::OpenTag, at, at + 2);
                        pos = at + 2;
                    }
                    in_php = true;
                }
                None => {
                    push(&mut tokens, TokenKind::InlineHtml, pos, bytes.len());
                    pos = bytes.len();
                }
            }
            continue;
        }

        let begin = pos;
        let b = bytes[pos];

        // Whitespace runs.
        if b.is_ascii_whitespace() {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            push(&mut tokens, TokenKind::Whitespace, begin, pos);
            continue;
        }

        // Comments.
        if b == b'#' || bytes[pos..].starts_with(b"//") {
            let skip = if b == b'#' { 1 } else { 2 };
            let end = match memchr(b'\n', &bytes[pos + skip..]) {
                // Include the newline, so a terminated line comment is
                // distinguishable from one still being typed.
                Some(off) => pos + skip + off + 1,
                None => bytes.len(),
            };
            push(&mut tokens, TokenKind::Comment, begin, end);
            pos = end;
            continue;
        }
        if bytes[pos..].starts_with(b"/*") {
            let doc = bytes[pos..].starts_with(b"/**");
            match find_subslice(&bytes[pos + 2..], b"*/") {
                Some(off) => {
                    let end = pos + 2 + off + 2;
                    let kind = if doc {
                        TokenKind::DocComment
                    } else {
                        TokenKind::Comment
                    };
                    push(&mut tokens, kind, begin, end);
                    pos = end;
                    continue;
                }
                // Unterminated block comment: stop lexing here. The text
                // after the last emitted token then starts with "/*", which
                // is what the classifier's comment guard looks for.
                None => break,
            }
        }

        // String literals; an unterminated literal runs to the end of the
        // window (that is the include-path completion case).
        if b == b'\'' || b == b'"' {
            let mut i = pos + 1;
            while i < bytes.len() {
                if bytes[i] == b'\\' {
                    i += 2;
                    continue;
                }
                if bytes[i] == b {
                    i += 1;
                    break;
                }
                i += 1;
            }
            let end = i.min(bytes.len());
            push(&mut tokens, TokenKind::ConstantString, begin, end);
            pos = end;
            continue;
        }

        // Variables.
        if b == b'$' {
            let mut i = pos + 1;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            if i == pos + 1 {
                push(&mut tokens, TokenKind::Dollar, begin, pos + 1);
                pos += 1;
            } else {
                push(&mut tokens, TokenKind::Variable, begin, i);
                pos = i;
            }
            continue;
        }

        // Numbers.
        if b.is_ascii_digit() {
            let mut i = pos;
            let mut float = false;
            while i < bytes.len() {
                match bytes[i] {
                    b'0'..=b'9' | b'x' | b'X' | b'a'..=b'f' | b'A'..=b'F' | b'_' => i += 1,
                    b'.' if !float => {
                        float = true;
                        i += 1;
                    }
                    _ => break,
                }
            }
            let kind = if float {
                TokenKind::FloatLiteral
            } else {
                TokenKind::IntLiteral
            };
            push(&mut tokens, kind, begin, i);
            pos = i;
            continue;
        }

        // Identifiers and keywords.
        if b.is_ascii_alphabetic() || b == b'_' {
            let mut i = pos;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let word = &text[pos..i];
            let kind = keyword_kind(word).unwrap_or(TokenKind::Identifier);
            push(&mut tokens, kind, begin, i);
            pos = i;
            continue;
        }

        // Close tag leaves PHP mode.
        if bytes[pos..].starts_with(b"?>") {
            push(&mut tokens, TokenKind::CloseTag, begin, pos + 2);
            pos += 2;
            in_php = false;
            continue;
        }

        // Operators, longest match first.
        let rest = &bytes[pos..];
        let (kind, len) = match rest {
            _ if rest.starts_with(b"?->") => (TokenKind::Arrow, 3),
            _ if rest.starts_with(b"===") => (TokenKind::IsIdentical, 3),
            _ if rest.starts_with(b"!==") => (TokenKind::IsNotIdentical, 3),
            _ if rest.starts_with(b"**=") => (TokenKind::PowAssign, 3),
            _ if rest.starts_with(b"<<=") => (TokenKind::ShlAssign, 3),
            _ if rest.starts_with(b">>=") => (TokenKind::ShrAssign, 3),
            _ if rest.starts_with(b"->") => (TokenKind::Arrow, 2),
            _ if rest.starts_with(b"::") => (TokenKind::DoubleColon, 2),
            _ if rest.starts_with(b"==") => (TokenKind::IsEqual, 2),
            _ if rest.starts_with(b"!=") || rest.starts_with(b"<>") => (TokenKind::IsNotEqual, 2),
            _ if rest.starts_with(b"<=") => (TokenKind::IsSmallerOrEqual, 2),
            _ if rest.starts_with(b">=") => (TokenKind::IsGreaterOrEqual, 2),
            _ if rest.starts_with(b"&&") => (TokenKind::BooleanAnd, 2),
            _ if rest.starts_with(b"||") => (TokenKind::BooleanOr, 2),
            _ if rest.starts_with(b"++") => (TokenKind::Inc, 2),
            _ if rest.starts_with(b"--") => (TokenKind::Dec, 2),
            _ if rest.starts_with(b"=>") => (TokenKind::DoubleArrow, 2),
            _ if rest.starts_with(b"**") => (TokenKind::Pow, 2),
            _ if rest.starts_with(b"<<") => (TokenKind::Shl, 2),
            _ if rest.starts_with(b">>") => (TokenKind::Shr, 2),
            _ if rest.starts_with(b"+=") => (TokenKind::PlusAssign, 2),
            _ if rest.starts_with(b"-=") => (TokenKind::MinusAssign, 2),
            _ if rest.starts_with(b"*=") => (TokenKind::MulAssign, 2),
            _ if rest.starts_with(b"/=") => (TokenKind::DivAssign, 2),
            _ if rest.starts_with(b"%=") => (TokenKind::ModAssign, 2),
            _ if rest.starts_with(b".=") => (TokenKind::ConcatAssign, 2),
            _ if rest.starts_with(b"&=") => (TokenKind::AndAssign, 2),
            _ if rest.starts_with(b"|=") => (TokenKind::OrAssign, 2),
            _ if rest.starts_with(b"^=") => (TokenKind::XorAssign, 2),
            [b'(', ..] => (TokenKind::LParen, 1),
            [b')', ..] => (TokenKind::RParen, 1),
            [b'{', ..] => (TokenKind::LBrace, 1),
            [b'}', ..] => (TokenKind::RBrace, 1),
            [b'[', ..] => (TokenKind::LBracket, 1),
            [b']', ..] => (TokenKind::RBracket, 1),
            [b',', ..] => (TokenKind::Comma, 1),
            [b';', ..] => (TokenKind::Semicolon, 1),
            [b'.', ..] => (TokenKind::Concat, 1),
            [b'+', ..] => (TokenKind::Plus, 1),
            [b'-', ..] => (TokenKind::Minus, 1),
            [b'*', ..] => (TokenKind::Mul, 1),
            [b'/', ..] => (TokenKind::Div, 1),
            [b'%', ..] => (TokenKind::Mod, 1),
            [b'=', ..] => (TokenKind::Assign, 1),
            [b'<', ..] => (TokenKind::IsSmaller, 1),
            [b'>', ..] => (TokenKind::IsGreater, 1),
            [b'!', ..] => (TokenKind::Bang, 1),
            [b'?', ..] => (TokenKind::Question, 1),
            [b':', ..] => (TokenKind::Colon, 1),
            [b'&', ..] => (TokenKind::BitAnd, 1),
            [b'|', ..] => (TokenKind::BitOr, 1),
            [b'^', ..] => (TokenKind::BitXor, 1),
            [b'~', ..] => (TokenKind::Tilde, 1),
            [b'@', ..] => (TokenKind::At, 1),
            [b'\\', ..] => (TokenKind::Backslash, 1),
            [b'`', ..] => (TokenKind::Backtick, 1),
            // Anything else is skipped silently; the classifier treats the
            // surrounding context as unknown anyway.
            _ => {
                pos += 1;
                continue;
            }
        };
        push(&mut tokens, kind, begin, pos + len);
        pos += len;
    }

    TokenStream { tokens }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() != 2 {
        return None;
    }
    let mut search = 0;
    while let Some(off) = memchr2(needle[0], needle[1], &haystack[search..]) {
        let at = search + off;
        if haystack[at] == needle[0] && haystack.get(at + 1) == Some(&needle[1]) {
            return Some(at);
        }
        search = at + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).tokens().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn open_tag_and_member_access() {
        assert_eq!(
            kinds("<?php $x->"),
            vec![
                TokenKind::OpenTag,
                TokenKind::Whitespace,
                TokenKind::Variable,
                TokenKind::Arrow,
            ]
        );
    }

    #[test]
    fn static_access_and_identifier() {
        assert_eq!(
            kinds("<?php Foo::"),
            vec![
                TokenKind::OpenTag,
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::DoubleColon,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let k = kinds("<?php EXTENDS extends Extends");
        assert_eq!(
            k.iter()
                .filter(|&&k| k == TokenKind::Extends)
                .count(),
            3
        );
    }

    #[test]
    fn unterminated_block_comment_is_not_a_token() {
        let stream = tokenize("<?php $x /* partial");
        let last = stream.get(stream.len() - 1).unwrap();
        assert_eq!(last.kind, TokenKind::Whitespace);
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        let stream = tokenize("<?php require '/inc/");
        let last = stream.get(stream.len() - 1).unwrap();
        assert_eq!(last.kind, TokenKind::ConstantString);
        assert_eq!(last.end as usize, "<?php require '/inc/".len());
    }

    #[test]
    fn line_comment_includes_newline() {
        let stream = tokenize("<?php // note\n$x");
        let comment = stream
            .tokens()
            .iter()
            .find(|t| t.kind == TokenKind::Comment)
            .copied()
            .unwrap();
        assert_eq!(&"<?php // note\n$x"[comment.begin as usize..comment.end as usize], "// note\n");
    }

    #[test]
    fn magic_file_constant() {
        assert!(kinds("<?php dirname(__FILE__)").contains(&TokenKind::FileConstant));
    }

    #[test]
    fn die_is_exit() {
        assert!(kinds("<?php die(").contains(&TokenKind::Exit));
    }
}
