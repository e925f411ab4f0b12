//! Pratt (precedence-climbing) parser.
//!
//! One function per precedence level, each calling the next-higher level for
//! its operands, from `=` (lowest) down to unary operators and factors
//! (highest). A single cursor (`pos`) into the token stream is threaded
//! through every level; `peek`/`consume` are the only primitives that touch
//! it directly.

use crate::errors::ParseError;
use crate::tokenizer::{Token, TokenKind, tokenize};
use pebble_core::SourceLocation;

use crate::ast::{Expr, ExprKind, Literal};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(file: &str, source: &str) -> Self {
        Parser {
            tokens: tokenize(file, source),
            pos: 0,
        }
    }

    /// Parses the token stream into a single root expression. Returns
    /// `Ok(None)` for an empty token stream — the sentinel "no program".
    pub fn parse(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let expr = if self.peek().kind == TokenKind::Keyword && self.peek().text == "var" {
            self.parse_var_declaration()?
        } else {
            self.parse_expression()?
        };

        if self.pos < self.tokens.len() {
            let tok = &self.tokens[self.pos];
            return Err(ParseError::new(
                tok.location.clone(),
                format!("unexpected token: '{}'", tok.text),
            ));
        }

        Ok(Some(expr))
    }

    // ---- cursor primitives ----------------------------------------------

    fn peek(&self) -> Token {
        if self.pos < self.tokens.len() {
            self.tokens[self.pos].clone()
        } else {
            let location = self
                .tokens
                .last()
                .map(|t| t.location.clone())
                .unwrap_or_else(SourceLocation::any);
            Token {
                text: String::new(),
                kind: TokenKind::End,
                location,
            }
        }
    }

    /// The last token actually consumed, or the current token if nothing has
    /// been consumed yet. Used to tell whether the statement just parsed
    /// ended in `}` (a block, or an `if`/`while` whose body is a block).
    fn peek_backwards(&self) -> Token {
        if self.pos > 0 {
            self.tokens[self.pos - 1].clone()
        } else {
            self.peek()
        }
    }

    fn consume(&mut self, expected: &str) -> Result<Token, ParseError> {
        let tok = self.peek();
        if tok.text != expected {
            return Err(ParseError::new(
                tok.location,
                format!("expected '{expected}'"),
            ));
        }
        self.pos += 1;
        Ok(tok)
    }

    fn consume_any(&mut self) -> Token {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    // ---- factors ----------------------------------------------------------

    fn parse_int_literal(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek();
        if tok.kind != TokenKind::Integer {
            return Err(ParseError::new(tok.location, "expected an integer"));
        }
        self.consume_any();
        let value: i64 = tok
            .text
            .parse()
            .map_err(|_| ParseError::new(tok.location.clone(), "integer literal out of range"))?;
        Ok(Expr::new(
            tok.location,
            ExprKind::Literal(Literal::Int(value)),
        ))
    }

    fn parse_bool_literal(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek();
        if tok.kind != TokenKind::BoolLiteral {
            return Err(ParseError::new(tok.location, "expected a boolean value"));
        }
        self.consume_any();
        let value = matches!(tok.text.as_str(), "true" | "True");
        Ok(Expr::new(
            tok.location,
            ExprKind::Literal(Literal::Bool(value)),
        ))
    }

    fn parse_unit_literal(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek();
        if tok.kind != TokenKind::NullLiteral {
            return Err(ParseError::new(tok.location, "expected 'unit'"));
        }
        self.consume_any();
        Ok(Expr::new(tok.location, ExprKind::Literal(Literal::Unit)))
    }

    fn parse_identifier_name(&mut self) -> Result<(String, SourceLocation), ParseError> {
        let tok = self.peek();
        if tok.kind != TokenKind::Identifier {
            return Err(ParseError::new(tok.location, "expected an identifier"));
        }
        self.consume_any();
        Ok((tok.text, tok.location))
    }

    fn parse_if(&mut self) -> Result<Expr, ParseError> {
        let location = self.peek().location;
        self.consume("if")?;
        let cond = self.parse_expression()?;
        self.consume("then")?;
        let then_branch = self.parse_expression()?;

        let else_branch = if self.peek().text == "else" {
            self.consume("else")?;
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        Ok(Expr::new(
            location,
            ExprKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch,
            },
        ))
    }

    fn parse_while(&mut self) -> Result<Expr, ParseError> {
        let location = self.peek().location;
        self.consume("while")?;
        let cond = self.parse_expression()?;
        self.consume("do")?;
        let body = self.parse_expression()?;

        Ok(Expr::new(
            location,
            ExprKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
        ))
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.consume("(")?;
        let mut args = Vec::new();
        while self.peek().text != ")" {
            if !args.is_empty() {
                self.consume(",")?;
            }
            args.push(self.parse_expression()?);
        }
        self.consume(")")?;
        Ok(args)
    }

    fn parse_var_declaration(&mut self) -> Result<Expr, ParseError> {
        let location = self.peek().location;
        self.consume("var")?;
        let (name, _) = self.parse_identifier_name()?;

        let declared_type_name = if self.peek().text == ":" {
            self.consume(":")?;
            let tok = self.peek();
            if tok.text != "Int" && tok.text != "Bool" {
                return Err(ParseError::new(
                    tok.location,
                    "expected type annotation 'Int' or 'Bool'",
                ));
            }
            self.consume_any();
            Some(tok.text)
        } else {
            None
        };

        self.consume("=")?;
        let value = self.parse_expression()?;

        Ok(Expr::new(
            location,
            ExprKind::VarDecl {
                name,
                declared_type_name,
                value: Box::new(value),
            },
        ))
    }

    fn parse_block(&mut self) -> Result<Expr, ParseError> {
        let location = self.peek().location;
        self.consume("{")?;
        let mut statements = Vec::new();

        while self.peek().text != "}" {
            if self.peek().kind == TokenKind::End {
                return Err(ParseError::new(self.peek().location, "expected '}'"));
            }

            if self.peek().kind == TokenKind::Keyword && self.peek().text == "var" {
                statements.push(self.parse_var_declaration()?);
            } else {
                statements.push(self.parse_expression()?);
            }

            if self.peek().text == ";" {
                let semi_loc = self.peek().location;
                self.consume(";")?;
                if self.peek().text == "}" {
                    statements.push(Expr::new(semi_loc, ExprKind::Literal(Literal::Unit)));
                }
            } else if self.peek_backwards().text == "}" {
                continue;
            } else if self.peek().text != "}" {
                return Err(ParseError::new(self.peek().location, "expected ';' or '}'"));
            }
        }

        self.consume("}")?;
        Ok(Expr::new(location, ExprKind::Block { statements }))
    }

    fn parse_parenthesized(&mut self) -> Result<Expr, ParseError> {
        self.consume("(")?;
        let expr = self.parse_expression()?;
        self.consume(")")?;
        Ok(expr)
    }

    fn parse_unary_op(&mut self) -> Result<Expr, ParseError> {
        let location = self.peek().location;
        let tok = self.peek();
        if tok.text != "-" && tok.text != "not" {
            return Err(ParseError::new(
                location,
                "expected unary operator '-' or 'not'",
            ));
        }
        self.consume_any();
        let operand = self.parse_factor()?;
        Ok(Expr::new(
            location,
            ExprKind::UnaryOp {
                op: tok.text,
                operand: Box::new(operand),
            },
        ))
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek();

        if tok.text == "(" {
            return self.parse_parenthesized();
        }
        if tok.text == "{" {
            return self.parse_block();
        }
        if tok.kind == TokenKind::Integer {
            return self.parse_int_literal();
        }
        if tok.kind == TokenKind::NullLiteral {
            return self.parse_unit_literal();
        }
        if tok.kind == TokenKind::Identifier {
            let (name, location) = self.parse_identifier_name()?;
            if self.peek().text == "(" {
                let args = self.parse_call_args()?;
                return Ok(Expr::new(location, ExprKind::Call { callee: name, args }));
            }
            return Ok(Expr::new(location, ExprKind::Identifier(name)));
        }
        if tok.kind == TokenKind::Keyword {
            if tok.text == "if" {
                return self.parse_if();
            }
            if tok.text == "while" {
                return self.parse_while();
            }
            return Err(ParseError::new(
                tok.location,
                format!("unexpected keyword '{}'", tok.text),
            ));
        }
        if tok.kind == TokenKind::BoolLiteral {
            return self.parse_bool_literal();
        }
        if tok.text == "-" || tok.text == "not" {
            return self.parse_unary_op();
        }

        Err(ParseError::new(
            tok.location,
            "expected integer, identifier, keyword, boolean literal or unary operator",
        ))
    }

    // ---- precedence levels, low to high -----------------------------------

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;
        while matches!(self.peek().text.as_str(), "*" | "/" | "%") {
            let location = self.peek().location;
            let op = self.consume_any().text;
            let right = self.parse_factor()?;
            left = Expr::new(
                location,
                ExprKind::BinaryOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        while matches!(self.peek().text.as_str(), "+" | "-") {
            let location = self.peek().location;
            let op = self.consume_any().text;
            let right = self.parse_term()?;
            left = Expr::new(
                location,
                ExprKind::BinaryOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;
        if matches!(self.peek().text.as_str(), "<" | "<=" | ">" | ">=") {
            let location = self.peek().location;
            let op = self.consume_any().text;
            let right = self.parse_additive()?;
            return Ok(Expr::new(
                location,
                ExprKind::BinaryOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            ));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_comparison()?;
        if matches!(self.peek().text.as_str(), "==" | "!=") {
            let location = self.peek().location;
            let op = self.consume_any().text;
            let right = self.parse_comparison()?;
            return Ok(Expr::new(
                location,
                ExprKind::BinaryOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            ));
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while self.peek().text == "and" {
            let location = self.peek().location;
            let op = self.consume_any().text;
            let right = self.parse_equality()?;
            left = Expr::new(
                location,
                ExprKind::BinaryOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.peek().text == "or" {
            let location = self.peek().location;
            let op = self.consume_any().text;
            let right = self.parse_logical_and()?;
            left = Expr::new(
                location,
                ExprKind::BinaryOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    /// Assignment: right-associative, lowest precedence.
    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_logical_or()?;
        if self.peek().text == "=" {
            let location = self.peek().location;
            self.consume("=")?;
            let right = self.parse_expression()?;
            return Ok(Expr::new(
                location,
                ExprKind::BinaryOp {
                    left: Box::new(left),
                    op: "=".to_string(),
                    right: Box::new(right),
                },
            ));
        }
        Ok(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::{binop, boolean, ident, int};

    fn parse_one(src: &str) -> Expr {
        Parser::new("t.pebble", src).parse().unwrap().unwrap()
    }

    #[test]
    fn additive_is_left_associative() {
        let got = parse_one("a - 7 + 2");
        let want = binop(binop(ident("a"), "-", int(7)), "+", int(2));
        assert_eq!(got, want);
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let got = parse_one("1 + 2 * 3");
        let want = binop(int(1), "+", binop(int(2), "*", int(3)));
        assert_eq!(got, want);
    }

    #[test]
    fn assignment_is_right_associative() {
        let got = parse_one("a = b = c");
        let want = binop(ident("a"), "=", binop(ident("b"), "=", ident("c")));
        assert_eq!(got, want);
    }

    #[test]
    fn comparison_is_non_associative() {
        let err = Parser::new("t.pebble", "1 < 2 < 3").parse();
        assert!(err.is_err());
    }

    #[test]
    fn if_then_else_parses() {
        let got = parse_one("if true then 1 else 2");
        match got.kind {
            ExprKind::If {
                else_branch: Some(_),
                ..
            } => {}
            _ => panic!("expected if/else"),
        }
    }

    #[test]
    fn if_without_else() {
        let got = parse_one("if true then 1");
        match got.kind {
            ExprKind::If {
                else_branch: None, ..
            } => {}
            _ => panic!("expected if without else"),
        }
    }

    #[test]
    fn empty_block_has_no_statements() {
        let got = parse_one("{ }");
        match got.kind {
            ExprKind::Block { statements } => assert!(statements.is_empty()),
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn trailing_semicolon_appends_unit() {
        let got = parse_one("{ 1; }");
        match got.kind {
            ExprKind::Block { statements } => {
                assert_eq!(statements.len(), 2);
                assert!(matches!(
                    statements[1].kind,
                    ExprKind::Literal(Literal::Unit)
                ));
            }
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn adjacent_block_statements_need_no_semicolon() {
        let got = parse_one("{ { 1 } { 2 } }");
        match got.kind {
            ExprKind::Block { statements } => assert_eq!(statements.len(), 2),
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn two_bare_expressions_without_semicolon_is_an_error() {
        let err = Parser::new("t.pebble", "{ 1 2 }").parse();
        assert!(err.is_err());
    }

    #[test]
    fn var_decl_at_top_level() {
        let got = parse_one("var x = 5");
        match got.kind {
            ExprKind::VarDecl { name, .. } => assert_eq!(name, "x"),
            _ => panic!("expected var decl"),
        }
    }

    #[test]
    fn var_decl_with_type_annotation() {
        let got = parse_one("var x: Int = 5");
        match got.kind {
            ExprKind::VarDecl {
                declared_type_name: Some(t),
                ..
            } => assert_eq!(t, "Int"),
            _ => panic!("expected typed var decl"),
        }
    }

    #[test]
    fn var_rejected_inside_if_branch() {
        let err = Parser::new("t.pebble", "{ if true then var x = 5 }").parse();
        assert!(err.is_err());
    }

    #[test]
    fn var_rejected_inside_while_body() {
        let err = Parser::new("t.pebble", "{ while true do var x = 5 }").parse();
        assert!(err.is_err());
    }

    #[test]
    fn var_rejected_inside_call_args() {
        let err = Parser::new("t.pebble", "f(var x = 5)").parse();
        assert!(err.is_err());
    }

    #[test]
    fn var_rejected_inside_parentheses() {
        let err = Parser::new("t.pebble", "(var x = 5)").parse();
        assert!(err.is_err());
    }

    #[test]
    fn var_rejected_as_assignment_right_hand_side() {
        let err = Parser::new("t.pebble", "a = var x = 5").parse();
        assert!(err.is_err());
    }

    #[test]
    fn function_call_parses_args() {
        let got = parse_one("print_int(1, 2)");
        match got.kind {
            ExprKind::Call { callee, args } => {
                assert_eq!(callee, "print_int");
                assert_eq!(args.len(), 2);
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn trailing_comma_is_rejected() {
        let err = Parser::new("t.pebble", "f(1,)").parse();
        assert!(err.is_err());
    }

    #[test]
    fn empty_source_is_no_program() {
        let result = Parser::new("t.pebble", "").parse().unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn leftover_tokens_are_an_error() {
        let err = Parser::new("t.pebble", "1 2").parse();
        assert!(err.is_err());
    }

    #[test]
    fn unary_minus_and_not() {
        let got = parse_one("- x");
        assert!(matches!(got.kind, ExprKind::UnaryOp { .. }));
        let got = parse_one("not x");
        assert!(matches!(got.kind, ExprKind::UnaryOp { .. }));
    }

    #[test]
    fn boolean_literal_variants() {
        let got = parse_one("True");
        assert_eq!(got, boolean(true));
        let got = parse_one("false");
        assert_eq!(got, boolean(false));
    }
}
