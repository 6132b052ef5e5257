use std::{fmt, ops::Range};

#[derive(Copy, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Token {
    pub kind: TokenKind,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            len: span.len,
            lo: span.lo,
        }
    }

    /// Returns the end-of-file token for the given source text.
    pub fn eof_for(src: &str) -> Token {
        Token {
            kind: TokenKind::Eof,
            lo: src.len(),
            len: 0,
        }
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span())
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap())
    }

    pub fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    /// Returns the span covering from the start of `self` up to the end of
    /// `other`.
    pub fn to(self, other: Span) -> Span {
        let hi = other.lo + other.len as usize;
        Span::new_of_bounds(self.lo..hi)
    }

    /// Returns a span with both bounds shifted by the given increments.
    ///
    /// Callers must ensure the resulting bounds stay within the source
    /// string and on character boundaries.
    pub fn offset(self, lo: isize, hi: isize) -> Span {
        let start = self.lo.checked_add_signed(lo).unwrap();
        let end = (self.lo + self.len as usize).checked_add_signed(hi).unwrap();
        Span::new_of_bounds(start..end)
    }

    /// Returns the slice of `src` covered by this span (the lexeme).
    pub fn substr(self, src: &str) -> &str {
        &src[self.lo..self.lo + self.len as usize]
    }

    /// Attaches a value to this span.
    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = lo + self.len as usize;
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

// This is not the most efficient way of representing a token kind, but it
// suffices for this simple compiler implementation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Fn,
    Let,
    If,
    Else,
    While,
    Return,

    True,
    False,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,
    /// `->`
    Arrow,
    Colon,
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,

    Identifier,
    Number,
    String,
    /// A string literal containing at least one escape sequence.
    EscapedString,

    Whitespace,
    LineComment,
    BlockComment,

    Eof,

    ErrorUnexpectedChar,
    ErrorUnclosedString,
    ErrorUnclosedComment,
    ErrorUnescapedLineBreak,
}

impl TokenKind {
    /// Whitespace and comments. The lexer produces them so that the token
    /// stream tiles the entire source text; the parser skips them.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn is_error(self) -> bool {
        self.error_message().is_some()
    }

    /// The diagnostic message for an error token kind.
    pub fn error_message(self) -> Option<&'static str> {
        match self {
            TokenKind::ErrorUnexpectedChar => Some("unexpected character"),
            TokenKind::ErrorUnclosedString => Some("unclosed string"),
            TokenKind::ErrorUnclosedComment => Some("unclosed comment"),
            TokenKind::ErrorUnescapedLineBreak => Some("unescaped line break in string"),
            _ => None,
        }
    }
}

/// Reserved words of the language. Lookup is case-sensitive: `If` is a
/// plain identifier, `if` is the keyword.
pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "fn" => TokenKind::Fn,
    "let" => TokenKind::Let,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "return" => TokenKind::Return,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
};
