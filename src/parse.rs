use crate::ast::{BinaryOperator, AST};
use crate::lex::{AnnotatedToken, Keyword, Token};

pub use crate::lex::Error;

const UNEXPECTED_TOKEN_ERROR: &str = "unexpected token";
const MISSING_RPAREN_ERROR: &str = "expected ')'";
const MISSING_RBRACE_ERROR: &str = "missing matching '}'";
const EXPECTED_FUNCTION_NAME_ERROR: &str = "expected function name";
const EXPECTED_PARAMETER_ERROR: &str = "expected parameter name";
const EXPECTED_MODIFY_TARGET_ERROR: &str = "expected target for modification";
const INVALID_ASSIGNMENT_ERROR: &str = "invalid assignment target";

static EOF_TOKEN: AnnotatedToken = AnnotatedToken {
    token: Token::Eof,
    line: 0,
    column: 0,
};

struct Parser<'a> {
    tokens: &'a [AnnotatedToken],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [AnnotatedToken]) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &'a AnnotatedToken {
        self.tokens.get(self.pos).unwrap_or(&EOF_TOKEN)
    }

    fn advance(&mut self) -> &'a AnnotatedToken {
        let current = self.peek();
        if !self.at_end() {
            self.pos += 1;
        }
        current
    }

    fn at_end(&self) -> bool {
        self.peek().token == Token::Eof
    }

    fn check(&self, token: &Token) -> bool {
        &self.peek().token == token
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.check(&Token::Keyword(keyword))
    }

    fn skip_keyword(&mut self, keyword: Keyword) -> bool {
        let found = self.check_keyword(keyword);
        if found {
            self.advance();
        }
        found
    }

    fn error_at(token: &AnnotatedToken, message: &str) -> Error {
        Error::new(token.line, token.column, message.to_string())
    }

    fn unexpected(&self) -> Error {
        let found = self.peek();
        Error::new(
            found.line,
            found.column,
            format!("{}: {}", UNEXPECTED_TOKEN_ERROR, found.token),
        )
    }

    fn expect_rparen(&mut self) -> Result<(), Error> {
        if !self.check(&Token::Rparen) {
            return Err(Self::error_at(self.peek(), MISSING_RPAREN_ERROR));
        }
        self.advance();
        Ok(())
    }

    fn identifier(&mut self, message: &str) -> Result<String, Error> {
        match &self.peek().token {
            Token::Identifier(name) => {
                self.advance();
                Ok(name.clone())
            }
            _ => Err(Self::error_at(self.peek(), message)),
        }
    }

    // returns None for the no-op control words
    fn statement(&mut self) -> Result<Option<AST>, Error> {
        let keyword = match self.peek().token {
            Token::Keyword(keyword) => keyword,
            _ => return self.expression_statement().map(Some),
        };

        let stmt = match keyword {
            Keyword::Define => self.define()?,
            Keyword::If => self.if_statement()?,
            Keyword::While => self.while_statement()?,
            Keyword::Modify => self.modify()?,
            Keyword::Recurse => self.recurse()?,
            Keyword::Return => {
                self.advance();
                AST::Return(Box::new(self.expression()?))
            }
            Keyword::Stop | Keyword::Pause | Keyword::Wait => {
                self.advance();
                return Ok(None);
            }
            _ => self.expression_statement()?,
        };

        Ok(Some(stmt))
    }

    fn expression_statement(&mut self) -> Result<AST, Error> {
        let start = self.peek();
        let expr = self.expression()?;

        if !self.check(&Token::Assign) {
            return Ok(expr);
        }

        match expr {
            AST::Identifier(name) => {
                self.advance();
                let value = self.expression()?;
                Ok(AST::Assign {
                    name,
                    value: Box::new(value),
                })
            }
            _ => Err(Self::error_at(start, INVALID_ASSIGNMENT_ERROR)),
        }
    }

    fn define(&mut self) -> Result<AST, Error> {
        self.advance();
        let name = self.identifier(EXPECTED_FUNCTION_NAME_ERROR)?;

        let mut params = Vec::new();
        if self.check(&Token::Lparen) {
            self.advance();
            if !self.check(&Token::Rparen) {
                params.push(self.identifier(EXPECTED_PARAMETER_ERROR)?);
                while self.check(&Token::Comma) {
                    self.advance();
                    params.push(self.identifier(EXPECTED_PARAMETER_ERROR)?);
                }
            }
            self.expect_rparen()?;
        }

        let body = self.block()?;
        Ok(AST::Define {
            name,
            params,
            body: Box::new(body),
        })
    }

    // Also parses an ELIF arm, which is an IF nested in the else branch.
    fn if_statement(&mut self) -> Result<AST, Error> {
        self.advance();
        let condition = self.expression()?;
        self.skip_keyword(Keyword::Then);

        let then_block = self.block()?;

        let else_block = if self.skip_keyword(Keyword::Else) {
            Some(Box::new(self.block()?))
        } else if self.check_keyword(Keyword::Elif) {
            Some(Box::new(self.if_statement()?))
        } else {
            None
        };

        Ok(AST::If {
            condition: Box::new(condition),
            then_block: Box::new(then_block),
            else_block,
        })
    }

    fn while_statement(&mut self) -> Result<AST, Error> {
        self.advance();
        let condition = self.expression()?;
        self.skip_keyword(Keyword::Do);

        let body = self.block()?;
        Ok(AST::While {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    fn modify(&mut self) -> Result<AST, Error> {
        self.advance();
        let target = self.identifier(EXPECTED_MODIFY_TARGET_ERROR)?;
        let code = self.expression()?;
        Ok(AST::Modify {
            target,
            code: Box::new(code),
        })
    }

    fn recurse(&mut self) -> Result<AST, Error> {
        self.advance();
        let args = if self.check(&Token::Lparen) {
            self.arguments()?
        } else {
            Vec::new()
        };
        Ok(AST::Recurse(args))
    }

    // Brace blocks run to the matching '}'. Otherwise the block runs up to
    // END, which is consumed, or up to ELSE/ELIF, which are left for the
    // enclosing IF.
    fn block(&mut self) -> Result<AST, Error> {
        let mut statements = Vec::new();

        if self.check(&Token::Lbrace) {
            let open = self.advance();
            while !self.check(&Token::Rbrace) && !self.at_end() {
                if let Some(stmt) = self.statement()? {
                    statements.push(stmt);
                }
            }

            if !self.check(&Token::Rbrace) {
                return Err(Self::error_at(open, MISSING_RBRACE_ERROR));
            }
            self.advance();
        } else {
            while !self.at_end()
                && !self.check_keyword(Keyword::End)
                && !self.check_keyword(Keyword::Else)
                && !self.check_keyword(Keyword::Elif)
            {
                if let Some(stmt) = self.statement()? {
                    statements.push(stmt);
                }
            }
        }

        self.skip_keyword(Keyword::End);
        Ok(AST::Block(statements))
    }

    fn expression(&mut self) -> Result<AST, Error> {
        self.comparison()
    }

    fn comparison(&mut self) -> Result<AST, Error> {
        let mut left = self.term()?;

        loop {
            let op = match self.peek().token {
                Token::EqEq => BinaryOperator::Eq,
                Token::NotEq => BinaryOperator::NotEq,
                Token::Lt => BinaryOperator::Lt,
                Token::Gt => BinaryOperator::Gt,
                Token::LtEq => BinaryOperator::LtEq,
                Token::GtEq => BinaryOperator::GtEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.term()?;
            left = binary(op, left, right);
        }
    }

    fn term(&mut self) -> Result<AST, Error> {
        let mut left = self.factor()?;

        loop {
            let op = match self.peek().token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.factor()?;
            left = binary(op, left, right);
        }
    }

    fn factor(&mut self) -> Result<AST, Error> {
        let mut left = self.primary()?;

        loop {
            let op = match self.peek().token {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.primary()?;
            left = binary(op, left, right);
        }
    }

    fn primary(&mut self) -> Result<AST, Error> {
        match &self.peek().token {
            Token::Number(n) => {
                let node = AST::Number(*n);
                self.advance();
                Ok(node)
            }
            Token::Str(s) => {
                let node = AST::String(s.clone());
                self.advance();
                Ok(node)
            }
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                if self.check(&Token::Lparen) {
                    let args = self.arguments()?;
                    Ok(AST::FunctionCall { name, args })
                } else {
                    Ok(AST::Identifier(name))
                }
            }
            Token::Lparen => {
                self.advance();
                let expr = self.expression()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            _ => Err(self.unexpected()),
        }
    }

    // "(" [expr {"," expr}] ")"
    fn arguments(&mut self) -> Result<Vec<AST>, Error> {
        self.advance();

        let mut args = Vec::new();
        if !self.check(&Token::Rparen) {
            args.push(self.expression()?);
            while self.check(&Token::Comma) {
                self.advance();
                args.push(self.expression()?);
            }
        }

        self.expect_rparen()?;
        Ok(args)
    }
}

fn binary(op: BinaryOperator, left: AST, right: AST) -> AST {
    AST::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Builds an `AST::Program` from a token sequence. The first structural
/// problem aborts the parse.
pub fn parse(tokens: &[AnnotatedToken]) -> Result<AST, Error> {
    let mut parser = Parser::new(tokens);
    let mut statements = Vec::new();

    while !parser.at_end() {
        if let Some(stmt) = parser.statement()? {
            statements.push(stmt);
        }
    }

    Ok(AST::Program(statements))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lex::{tokenize, Number};

    fn parse_source(source: &str) -> Result<AST, Error> {
        parse(&tokenize(source).unwrap())
    }

    fn statements(source: &str) -> Vec<AST> {
        match parse_source(source).unwrap() {
            AST::Program(statements) => statements,
            other => panic!("expected program, got {:?}", other),
        }
    }

    fn int(i: i64) -> AST {
        AST::Number(Number::Integer(i))
    }

    fn ident(name: &str) -> AST {
        AST::Identifier(name.to_string())
    }

    #[test]
    fn parses_assignment() {
        assert_eq!(
            statements("x = 10"),
            vec![AST::Assign {
                name: "x".to_string(),
                value: Box::new(int(10)),
            }]
        );
    }

    #[test]
    fn respects_precedence() {
        assert_eq!(
            statements("2 + 3 * 4"),
            vec![binary(
                BinaryOperator::Add,
                int(2),
                binary(BinaryOperator::Mul, int(3), int(4))
            )]
        );
        assert_eq!(
            statements("(2 + 3) * 4"),
            vec![binary(
                BinaryOperator::Mul,
                binary(BinaryOperator::Add, int(2), int(3)),
                int(4)
            )]
        );
    }

    #[test]
    fn comparisons_fold_left() {
        assert_eq!(
            statements("1 < 2 == 3"),
            vec![binary(
                BinaryOperator::Eq,
                binary(BinaryOperator::Lt, int(1), int(2)),
                int(3)
            )]
        );
    }

    #[test]
    fn identifier_followed_by_paren_is_call() {
        assert_eq!(
            statements("f(1, x) g()"),
            vec![
                AST::FunctionCall {
                    name: "f".to_string(),
                    args: vec![int(1), ident("x")],
                },
                AST::FunctionCall {
                    name: "g".to_string(),
                    args: vec![],
                }
            ]
        );
    }

    #[test]
    fn if_then_block_stops_at_else() {
        assert_eq!(
            statements("IF x > 10 THEN r = 1 ELSE r = 2 END r"),
            vec![
                AST::If {
                    condition: Box::new(binary(BinaryOperator::Gt, ident("x"), int(10))),
                    then_block: Box::new(AST::Block(vec![AST::Assign {
                        name: "r".to_string(),
                        value: Box::new(int(1)),
                    }])),
                    else_block: Some(Box::new(AST::Block(vec![AST::Assign {
                        name: "r".to_string(),
                        value: Box::new(int(2)),
                    }]))),
                },
                ident("r")
            ]
        );
    }

    #[test]
    fn elif_nests_in_else_branch() {
        let stmts = statements("IF a THEN 1 ELIF b THEN 2 ELSE 3 END");
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            AST::If {
                else_block: Some(nested),
                ..
            } => assert!(matches!(**nested, AST::If { else_block: Some(_), .. })),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn parses_define_with_and_without_params() {
        assert_eq!(
            statements("DEFINE double(x) RETURN x * 2 END DEFINE nothing END"),
            vec![
                AST::Define {
                    name: "double".to_string(),
                    params: vec!["x".to_string()],
                    body: Box::new(AST::Block(vec![AST::Return(Box::new(binary(
                        BinaryOperator::Mul,
                        ident("x"),
                        int(2)
                    )))])),
                },
                AST::Define {
                    name: "nothing".to_string(),
                    params: vec![],
                    body: Box::new(AST::Block(vec![])),
                }
            ]
        );
    }

    #[test]
    fn parses_brace_blocks() {
        assert_eq!(
            statements("WHILE n { n = n - 1 } END n"),
            vec![
                AST::While {
                    condition: Box::new(ident("n")),
                    body: Box::new(AST::Block(vec![AST::Assign {
                        name: "n".to_string(),
                        value: Box::new(binary(BinaryOperator::Sub, ident("n"), int(1))),
                    }])),
                },
                ident("n")
            ]
        );
    }

    #[test]
    fn parses_modify_and_recurse() {
        assert_eq!(
            statements("MODIFY source \"1\" RECURSE RECURSE(1, 2)"),
            vec![
                AST::Modify {
                    target: "source".to_string(),
                    code: Box::new(AST::String("1".to_string())),
                },
                AST::Recurse(vec![]),
                AST::Recurse(vec![int(1), int(2)])
            ]
        );
    }

    #[test]
    fn control_words_are_skipped() {
        assert_eq!(statements("STOP x PAUSE wait"), vec![ident("x")]);
    }

    #[test]
    fn end_block_may_run_to_end_of_input() {
        assert_eq!(
            statements("WHILE x DO x = 0"),
            vec![AST::While {
                condition: Box::new(ident("x")),
                body: Box::new(AST::Block(vec![AST::Assign {
                    name: "x".to_string(),
                    value: Box::new(int(0)),
                }])),
            }]
        );
    }

    #[test]
    fn handles_missing_rbrace() {
        let err = parse_source("IF x {\n  y = 1\n").unwrap_err();
        assert_eq!(err.line(), 1);
        assert_eq!(err.column(), 6);
    }

    #[test]
    fn handles_missing_rparen() {
        assert!(parse_source("(1 + 2").is_err());
        assert!(parse_source("f(1, 2").is_err());
    }

    #[test]
    fn rejects_stray_tokens() {
        assert!(parse_source("x = 1; y = 2").is_err());
        assert!(parse_source("THEN").is_err());
        assert!(parse_source("EAT").is_err());
        assert!(parse_source("-1").is_err());
    }

    #[test]
    fn rejects_invalid_assignment_target() {
        let err = parse_source("1 + 2 = 3").unwrap_err();
        assert_eq!(err.message(), INVALID_ASSIGNMENT_ERROR);
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "DEFINE f(a, b) { RETURN a + b }\nIF f(1, 2) >= 3 THEN print(\"ok\") END";
        assert_eq!(parse_source(source), parse_source(source));
    }

    #[test]
    fn empty_token_slice_is_empty_program() {
        assert_eq!(parse(&[]), Ok(AST::Program(vec![])));
    }
}
