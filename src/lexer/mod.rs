mod error;
mod token;

pub use error::{LexicalError, LexicalErrorKind};
use std::{iter::Peekable, rc::Rc, str::CharIndices};
pub use token::{Span, Token, TokenKind, KEYWORD_HASHMAP};

/// Byte offsets of the start of every line, used to turn spans into line numbers.
#[derive(Debug, Clone)]
pub struct LineBreaks {
    line_starts: Rc<[u32]>,
}

impl LineBreaks {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((offset + 1) as u32);
            }
        }
        Self {
            line_starts: line_starts.into(),
        }
    }

    pub fn get_max_line(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// 1-based line containing the byte `offset`.
    pub fn get_line(&self, offset: u32) -> u32 {
        self.line_starts.partition_point(|&start| start <= offset) as u32
    }

    pub fn get_line_from_span(&self, span: Span) -> u32 {
        self.get_line(span.start)
    }
}

#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    line_breaks: LineBreaks,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line_breaks: LineBreaks::new(source),
        }
    }

    pub fn get_line_breaks(&self) -> LineBreaks {
        self.line_breaks.clone()
    }

    pub fn get_lexeme(&self, span: &Span) -> Option<&'src str> {
        self.source.get(span.range())
    }
}

impl<'src> Lexer<'src> {
    fn eat_if(&mut self, expected: char) -> bool {
        match self.chars.peek() {
            Some(&(_, c)) if c == expected => {
                self.chars.next();
                true
            }
            _ => false,
        }
    }

    fn current_offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(offset, _)| offset)
            .unwrap_or(self.source.len())
    }

    fn skip_trivia(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }
            if c == '/' {
                let mut ahead = self.chars.clone();
                ahead.next();
                if matches!(ahead.peek(), Some(&(_, '/'))) {
                    while let Some(&(_, c)) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                    continue;
                }
            }
            break;
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        self.skip_trivia();

        let Some((start, c)) = self.chars.next() else {
            let end = self.source.len();
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(end, end),
            });
        };

        let just = |kind: TokenKind, length: usize| {
            Ok(Token {
                kind,
                span: Span::new(start, start + length),
            })
        };

        match c {
            // Single character tokens
            '(' => just(TokenKind::LeftParenthesis, 1),
            ')' => just(TokenKind::RightParenthesis, 1),
            '{' => just(TokenKind::LeftBrace, 1),
            '}' => just(TokenKind::RightBrace, 1),
            ',' => just(TokenKind::Comma, 1),
            '.' => just(TokenKind::Dot, 1),
            '-' => just(TokenKind::Minus, 1),
            '+' => just(TokenKind::Plus, 1),
            ';' => just(TokenKind::Semicolon, 1),
            '*' => just(TokenKind::Star, 1),
            '/' => just(TokenKind::Slash, 1),
            // One or two character tokens
            '!' if self.eat_if('=') => just(TokenKind::BangEqual, 2),
            '!' => just(TokenKind::Bang, 1),
            '=' if self.eat_if('=') => just(TokenKind::EqualEqual, 2),
            '=' => just(TokenKind::Equal, 1),
            '<' if self.eat_if('=') => just(TokenKind::LessThanEqual, 2),
            '<' => just(TokenKind::LessThan, 1),
            '>' if self.eat_if('=') => just(TokenKind::GreaterThanEqual, 2),
            '>' => just(TokenKind::GreaterThan, 1),
            '"' => self.lex_string(start),
            '0'..='9' => Ok(self.lex_number(start)),
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.lex_ident_or_keyword(start)),
            c => Err(LexicalError {
                kind: LexicalErrorKind::Unrecognized(c),
                span: Span::new(start, start + c.len_utf8()),
            }),
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<Token, LexicalError> {
        for (offset, c) in self.chars.by_ref() {
            if c == '"' {
                return Ok(Token {
                    kind: TokenKind::StringLiteral,
                    span: Span::new(start, offset + 1),
                });
            }
        }
        Err(LexicalError {
            kind: LexicalErrorKind::UnclosedString,
            span: Span::new(start, self.source.len()),
        })
    }

    fn lex_number(&mut self, start: usize) -> Token {
        while matches!(self.chars.peek(), Some(&(_, '0'..='9'))) {
            self.chars.next();
        }

        // A fractional part needs at least one digit after the dot.
        let mut ahead = self.chars.clone();
        if matches!(ahead.next(), Some((_, '.'))) && matches!(ahead.peek(), Some(&(_, '0'..='9')))
        {
            self.chars.next();
            while matches!(self.chars.peek(), Some(&(_, '0'..='9'))) {
                self.chars.next();
            }
        }

        let end = self.current_offset();
        Token {
            kind: TokenKind::NumericLiteral,
            span: Span::new(start, end),
        }
    }

    fn lex_ident_or_keyword(&mut self, start: usize) -> Token {
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_ascii_alphanumeric() || c == '_')
        {
            self.chars.next();
        }
        let end = self.current_offset();
        let lexeme = &self.source[start..end];
        Token {
            kind: KEYWORD_HASHMAP
                .get(lexeme)
                .cloned()
                .unwrap_or(TokenKind::Ident),
            span: Span::new(start, end),
        }
    }
}
