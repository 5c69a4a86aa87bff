use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Range;
use std::sync::LazyLock;

/// The hashmap for keywords
pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("and", TokenKind::KeywordAnd);
    map.insert("class", TokenKind::KeywordClass);
    map.insert("else", TokenKind::KeywordElse);
    map.insert("false", TokenKind::KeywordFalse);
    map.insert("for", TokenKind::KeywordFor);
    map.insert("fun", TokenKind::KeywordFun);
    map.insert("if", TokenKind::KeywordIf);
    map.insert("nil", TokenKind::KeywordNil);
    map.insert("or", TokenKind::KeywordOr);
    map.insert("print", TokenKind::KeywordPrint);
    map.insert("return", TokenKind::KeywordReturn);
    map.insert("super", TokenKind::KeywordSuper);
    map.insert("this", TokenKind::KeywordThis);
    map.insert("true", TokenKind::KeywordTrue);
    map.insert("var", TokenKind::KeywordVar);
    map.insert("while", TokenKind::KeywordWhile);
    map
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// The byte position of the start of the token.
    pub start: u32,
    /// The length of the token in bytes.
    pub length: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            length: end.saturating_sub(start) as u32,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn merge(&self, other: &Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span {
            start,
            length: end - start,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Parentheses
    LeftParenthesis,
    RightParenthesis,
    // Braces
    LeftBrace,
    RightBrace,
    // Miscellaneous
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Star,
    // Operators
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Slash,

    // Literals
    NumericLiteral,
    StringLiteral,
    Ident,

    // Keywords
    KeywordAnd,
    KeywordClass,
    KeywordElse,
    KeywordFalse,
    KeywordFor,
    KeywordFun,
    KeywordIf,
    KeywordNil,
    KeywordOr,
    KeywordPrint,
    KeywordReturn,
    KeywordSuper,
    KeywordThis,
    KeywordTrue,
    KeywordVar,
    KeywordWhile,

    // End of file.
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::LeftParenthesis => write!(f, "'('"),
            TokenKind::RightParenthesis => write!(f, "')'"),
            TokenKind::LeftBrace => write!(f, "'{{'"),
            TokenKind::RightBrace => write!(f, "'}}'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::BangEqual => write!(f, "'!='"),
            TokenKind::Equal => write!(f, "'='"),
            TokenKind::EqualEqual => write!(f, "'=='"),
            TokenKind::LessThan => write!(f, "'<'"),
            TokenKind::LessThanEqual => write!(f, "'<='"),
            TokenKind::GreaterThan => write!(f, "'>'"),
            TokenKind::GreaterThanEqual => write!(f, "'>='"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::NumericLiteral => write!(f, "number"),
            TokenKind::StringLiteral => write!(f, "string"),
            TokenKind::Ident => write!(f, "identifier"),
            TokenKind::KeywordAnd => write!(f, "'and'"),
            TokenKind::KeywordClass => write!(f, "'class'"),
            TokenKind::KeywordElse => write!(f, "'else'"),
            TokenKind::KeywordFalse => write!(f, "'false'"),
            TokenKind::KeywordFor => write!(f, "'for'"),
            TokenKind::KeywordFun => write!(f, "'fun'"),
            TokenKind::KeywordIf => write!(f, "'if'"),
            TokenKind::KeywordNil => write!(f, "'nil'"),
            TokenKind::KeywordOr => write!(f, "'or'"),
            TokenKind::KeywordPrint => write!(f, "'print'"),
            TokenKind::KeywordReturn => write!(f, "'return'"),
            TokenKind::KeywordSuper => write!(f, "'super'"),
            TokenKind::KeywordThis => write!(f, "'this'"),
            TokenKind::KeywordTrue => write!(f, "'true'"),
            TokenKind::KeywordVar => write!(f, "'var'"),
            TokenKind::KeywordWhile => write!(f, "'while'"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
