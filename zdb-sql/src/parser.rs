use crate::ast::{BinaryOp, Expr, Statement, Value};
use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token, TokenType};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn parse(input: &str) -> Result<Statement> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = Parser { tokens, position: 0 };
        let statement = parser.parse_statement()?;
        parser.expect_statement_end()?;
        Ok(statement)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        if self.match_token(&TokenType::Insert) {
            return self.parse_insert();
        }
        if self.match_token(&TokenType::Select) {
            return self.parse_select();
        }
        Err(self.unexpected())
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.consume(&TokenType::Into, "expected INTO after INSERT")?;
        let table = self.consume_identifier()?;
        self.consume(&TokenType::Values, "expected VALUES after table name")?;
        self.consume(&TokenType::LeftParen, "expected ( to open VALUES list")?;

        let mut values = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                values.push(self.parse_value()?);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenType::RightParen, "expected ) to close VALUES list")?;

        if values.is_empty() {
            return Err(Error::InvalidSyntax(
                "VALUES list must have at least one column".to_string(),
            ));
        }

        Ok(Statement::Insert { table, values })
    }

    fn parse_select(&mut self) -> Result<Statement> {
        self.consume(&TokenType::Asterisk, "expected * after SELECT")?;
        self.consume(&TokenType::From, "expected FROM after SELECT *")?;
        let table = self.consume_identifier()?;

        let where_clause = if self.match_token(&TokenType::Where) {
            Some(self.parse_or_expr()?)
        } else {
            None
        };

        Ok(Statement::Select { table, where_clause })
    }

    fn parse_or_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_and_expr()?;
        while self.match_token(&TokenType::Or) {
            let right = self.parse_and_expr()?;
            left = Expr::Binary {
                left: Box::new(left),
                op: BinaryOp::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison()?;
        while self.match_token(&TokenType::And) {
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                left: Box::new(left),
                op: BinaryOp::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_operand()?;
        let op = match &self.peek().token_type {
            TokenType::Eq => BinaryOp::Eq,
            TokenType::NotEq => BinaryOp::NotEq,
            TokenType::Lt => BinaryOp::Lt,
            TokenType::Le => BinaryOp::Le,
            TokenType::Gt => BinaryOp::Gt,
            TokenType::Ge => BinaryOp::Ge,
            _ => return Err(self.unexpected()),
        };
        self.advance();
        let right = self.parse_operand()?;
        Ok(Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_operand(&mut self) -> Result<Expr> {
        match self.peek().token_type.clone() {
            TokenType::Integer(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Integer(n)))
            }
            TokenType::String(s) => {
                self.advance();
                Ok(Expr::Literal(Value::Text(s)))
            }
            TokenType::Identifier(name) => {
                self.advance();
                Ok(Expr::Column(name))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek().token_type.clone() {
            TokenType::Integer(n) => {
                self.advance();
                Ok(Value::Integer(n))
            }
            TokenType::String(s) => {
                self.advance();
                Ok(Value::Text(s))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn expect_statement_end(&mut self) -> Result<()> {
        self.match_token(&TokenType::Semicolon);
        if !matches!(self.peek().token_type, TokenType::Eof) {
            return Err(self.unexpected());
        }
        Ok(())
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.position];
        if !matches!(token.token_type, TokenType::Eof) {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenType) -> bool {
        &self.peek().token_type == kind
    }

    fn match_token(&mut self, kind: &TokenType) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenType, message: &str) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            let _ = message;
            Err(self.unexpected())
        }
    }

    fn consume_identifier(&mut self) -> Result<String> {
        match self.peek().token_type.clone() {
            TokenType::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn unexpected(&self) -> Error {
        let token = self.peek();
        Error::UnexpectedToken {
            found: format!("{:?}", token.token_type),
            line: token.line,
            column: token.column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert() {
        let stmt = Parser::parse("INSERT INTO t VALUES(1, 'hello');").unwrap();
        assert_eq!(
            stmt,
            Statement::Insert {
                table: "t".to_string(),
                values: vec![Value::Integer(1), Value::Text("hello".to_string())],
            }
        );
    }

    #[test]
    fn parses_select_without_where() {
        let stmt = Parser::parse("SELECT * FROM t").unwrap();
        assert_eq!(
            stmt,
            Statement::Select {
                table: "t".to_string(),
                where_clause: None,
            }
        );
    }

    #[test]
    fn parses_select_with_where() {
        let stmt = Parser::parse("SELECT * FROM t WHERE col0 = 1;").unwrap();
        match stmt {
            Statement::Select { where_clause: Some(expr), .. } => {
                assert_eq!(
                    expr,
                    Expr::Binary {
                        left: Box::new(Expr::Column("col0".to_string())),
                        op: BinaryOp::Eq,
                        right: Box::new(Expr::Literal(Value::Integer(1))),
                    }
                );
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn and_or_combine_comparisons() {
        let stmt = Parser::parse("SELECT * FROM t WHERE col0 = 1 AND col1 = 2 OR col0 = 3").unwrap();
        let Statement::Select { where_clause: Some(expr), .. } = stmt else {
            panic!("expected select with where clause")
        };
        assert!(matches!(
            expr,
            Expr::Binary { op: BinaryOp::Or, .. }
        ));
    }

    #[test]
    fn empty_values_list_is_invalid_syntax() {
        let err = Parser::parse("INSERT INTO t VALUES();").unwrap_err();
        assert!(matches!(err, Error::InvalidSyntax(_)));
    }

    #[test]
    fn missing_keyword_is_unexpected_token() {
        let err = Parser::parse("INSERT t VALUES(1);").unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));
    }
}
