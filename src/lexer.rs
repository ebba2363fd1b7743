//! Character stream → token vector.
//!
//! The lexer keeps a single character of lookahead (`current`) and advances
//! it one byte at a time; there is no backtracking. Numbers are scanned
//! permissively (see [`Lexer::read_number`]) and validated later, at
//! evaluation time, not here.

use crate::error::{InterpError, Result};
use crate::token::{lookup_keyword, Token, TokenKind};

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    current: char,
    at_end: bool,
    line: usize,
}

const NUL: char = '\0';

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Self {
            chars: source.chars().peekable(),
            current: NUL,
            at_end: false,
            line: 1,
        };
        lexer.advance();
        lexer
    }

    /// Lexes the entire input and returns the token vector, always
    /// terminated by exactly one [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn advance(&mut self) {
        match self.chars.next() {
            Some(c) => {
                if c == '\n' {
                    self.line += 1;
                }
                self.current = c;
            }
            None => {
                self.current = NUL;
                self.at_end = true;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.at_end && self.current.is_whitespace() {
            self.advance();
        }
    }

    fn read_string_value(&mut self) -> Result<Token> {
        let line = self.line;
        let mut s = String::new();
        loop {
            if self.at_end {
                return Err(InterpError::UnterminatedString { line });
            }
            if self.current == '"' {
                self.advance();
                break;
            }
            s.push(self.current);
            self.advance();
        }
        Ok(Token::new(TokenKind::String, s))
    }

    /// Consumes a maximal run of `[0-9.eE+-]`. Admits malformed sequences
    /// like `1e+e-2`; `f64::from_str` rejects those at evaluation time.
    fn read_number(&mut self) -> Token {
        let mut s = String::new();
        while matches!(self.current, '0'..='9' | '.' | 'e' | 'E' | '+' | '-') {
            s.push(self.current);
            self.advance();
        }
        Token::new(TokenKind::Number, s)
    }

    fn read_identifier(&mut self) -> Token {
        let mut s = String::new();
        while self.current.is_ascii_alphanumeric() || self.current == '_' {
            s.push(self.current);
            self.advance();
        }
        match lookup_keyword(&s) {
            Some(kind) => Token::new(kind, s),
            None => Token::new(TokenKind::Identifier, s),
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        if self.at_end {
            return Ok(Token::eof());
        }

        if self.current == '"' {
            self.advance();
            return self.read_string_value();
        }

        if self.current.is_ascii_digit() {
            return Ok(self.read_number());
        }

        if self.current.is_ascii_alphabetic() {
            return Ok(self.read_identifier());
        }

        let first = self.current;
        self.advance();
        let second = self.current;

        let two_char: String = [first, second].iter().collect();
        if two_char == "//" {
            while !self.at_end && self.current != '\n' {
                self.advance();
            }
            return self.next_token();
        }

        if let Some(kind) = lookup_keyword(&two_char) {
            self.advance();
            return Ok(Token::new(kind, two_char));
        }

        let one_char = first.to_string();
        if let Some(kind) = lookup_keyword(&one_char) {
            return Ok(Token::new(kind, one_char));
        }

        Err(InterpError::UnknownSymbol {
            symbol: first,
            line: self.line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_numbers_identifiers_and_eof() {
        assert_eq!(
            kinds("x = 1 + 2"),
            vec![
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators_win_over_one_char() {
        assert_eq!(
            kinds("a <= b"),
            vec![
                TokenKind::Identifier,
                TokenKind::LessEq,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("a < b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(
            kinds("true false nil and or not"),
            vec![
                TokenKind::Bool,
                TokenKind::Bool,
                TokenKind::Nil,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_is_skipped() {
        assert_eq!(
            kinds("x = 1 // this is ignored\ny = 2"),
            vec![
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(matches!(
            Lexer::new("\"abc").tokenize(),
            Err(InterpError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        assert!(matches!(
            Lexer::new("@").tokenize(),
            Err(InterpError::UnknownSymbol { symbol: '@', .. })
        ));
    }
}
