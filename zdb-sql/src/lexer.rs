use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    And,
    Or,

    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Asterisk,

    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,

    Integer(i64),
    String(String),
    Identifier(String),

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token {
            token_type: TokenType::Eof,
            line: self.line,
            column: self.column,
        });
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace_and_comments();

        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        let start_line = self.line;
        let start_column = self.column;
        let c = self.advance().unwrap();

        if c == '\'' {
            return Ok(Some(self.read_string(start_line, start_column)?));
        }
        if c.is_ascii_digit() {
            return Ok(Some(self.read_number(c, start_line, start_column)?));
        }
        if c.is_alphabetic() || c == '_' {
            return Ok(Some(self.read_identifier(c, start_line, start_column)));
        }

        let token_type = match c {
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            ',' => TokenType::Comma,
            ';' => TokenType::Semicolon,
            '*' => TokenType::Asterisk,
            '=' => TokenType::Eq,
            '<' => {
                if self.chars.peek() == Some(&'=') {
                    self.advance();
                    TokenType::Le
                } else if self.chars.peek() == Some(&'>') {
                    self.advance();
                    TokenType::NotEq
                } else {
                    TokenType::Lt
                }
            }
            '>' => {
                if self.chars.peek() == Some(&'=') {
                    self.advance();
                    TokenType::Ge
                } else {
                    TokenType::Gt
                }
            }
            '!' => {
                if self.chars.peek() == Some(&'=') {
                    self.advance();
                    TokenType::NotEq
                } else {
                    return Err(Error::UnexpectedToken {
                        found: c.to_string(),
                        line: start_line,
                        column: start_column,
                    });
                }
            }
            other => {
                return Err(Error::UnexpectedToken {
                    found: other.to_string(),
                    line: start_line,
                    column: start_column,
                });
            }
        };

        Ok(Some(Token {
            token_type,
            line: start_line,
            column: start_column,
        }))
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(c) = c {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(&c) = self.chars.peek() {
                if c.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }
            if self.chars.peek() == Some(&'-') {
                let mut lookahead = self.chars.clone();
                lookahead.next();
                if lookahead.peek() == Some(&'-') {
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                }
            }
            break;
        }
    }

    fn read_string(&mut self, line: usize, column: usize) -> Result<Token> {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('\'') => {
                    return Ok(Token {
                        token_type: TokenType::String(value),
                        line,
                        column,
                    });
                }
                Some(c) => value.push(c),
                None => {
                    return Err(Error::UnexpectedToken {
                        found: "<eof in string literal>".to_string(),
                        line,
                        column,
                    });
                }
            }
        }
    }

    fn read_number(&mut self, first: char, line: usize, column: usize) -> Result<Token> {
        let mut literal = String::new();
        literal.push(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                literal.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let value = literal.parse::<i64>().map_err(|_| Error::IntegerOverflow {
            literal: literal.clone(),
        })?;
        Ok(Token {
            token_type: TokenType::Integer(value),
            line,
            column,
        })
    }

    fn read_identifier(&mut self, first: char, line: usize, column: usize) -> Token {
        let mut value = String::new();
        value.push(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let token_type = match value.to_uppercase().as_str() {
            "INSERT" => TokenType::Insert,
            "INTO" => TokenType::Into,
            "VALUES" => TokenType::Values,
            "SELECT" => TokenType::Select,
            "FROM" => TokenType::From,
            "WHERE" => TokenType::Where,
            "AND" => TokenType::And,
            "OR" => TokenType::Or,
            _ => TokenType::Identifier(value),
        };
        Token {
            token_type,
            line,
            column,
        }
    }
}
