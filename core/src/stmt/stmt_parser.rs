use crate::{
    ast::Parser as ExprParser,
    expr::Expr,
    stmt::{Program, Stmt},
    token::{ParseError, Span, Token, offset_to_position},
};
use anyhow::{Result, anyhow};

/// Splits the token stream into statements and hands each expression to
/// the expression parser.
pub struct StmtParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    len: usize,
    token_spans: Option<&'a [Span]>,
}

impl<'a> StmtParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let len = tokens.len();
        Self {
            tokens,
            pos: 0,
            len,
            token_spans: None,
        }
    }

    pub fn new_with_spans(tokens: &'a [Token], spans: &'a [Span]) -> Self {
        let len = tokens.len();
        Self {
            tokens,
            pos: 0,
            len,
            token_spans: Some(spans),
        }
    }

    pub fn parse_program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();
        while !self.eof() {
            // Skip empty statements
            if self.tokens[self.pos] == Token::Semicolon {
                self.pos += 1;
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Program::new(statements))
    }

    /// Parse program with enhanced error reporting
    pub fn parse_program_with_enhanced_errors(&mut self, input: &str) -> std::result::Result<Program, ParseError> {
        let mut statements = Vec::new();
        while !self.eof() {
            if self.tokens[self.pos] == Token::Semicolon {
                self.pos += 1;
                continue;
            }
            let stmt_start = self.pos;
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => return Err(self.locate(err, stmt_start, input)),
            }
        }
        Ok(Program::new(statements))
    }

    pub fn parse_statement(&mut self) -> Result<Stmt> {
        if self.tokens[self.pos] == Token::Const {
            self.pos += 1;
            let name = self.expect_id()?;
            if self.eof() || self.tokens[self.pos] != Token::Assign {
                return Err(anyhow!(self.err("Expected '=' in const declaration")));
            }
            self.pos += 1;
            let value = self.parse_expression()?;
            return Ok(Stmt::Const { name, value });
        }

        if let Some(names) = self.try_define_names() {
            let value = self.parse_expression()?;
            return Ok(Stmt::Define { names, value });
        }

        Ok(Stmt::Expr(self.parse_expression()?))
    }

    /// `a, b :=` prefix; leaves the cursor after `:=` on success.
    fn try_define_names(&mut self) -> Option<Vec<String>> {
        let mut names = Vec::new();
        let mut i = self.pos;
        loop {
            match self.tokens.get(i) {
                Some(Token::Id(name)) => names.push(name.clone()),
                _ => return None,
            }
            match self.tokens.get(i + 1) {
                Some(Token::Comma) => i += 2,
                Some(Token::Define) => {
                    self.pos = i + 2;
                    return Some(names);
                }
                _ => return None,
            }
        }
    }

    /// Parse the expression running up to the next statement separator.
    fn parse_expression(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut end = start;
        while end < self.len {
            match self.tokens[end] {
                Token::LParen | Token::LBrace | Token::LBracket => depth += 1,
                Token::RParen | Token::RBrace | Token::RBracket => depth = depth.saturating_sub(1),
                Token::Semicolon if depth == 0 => break,
                _ => {}
            }
            end += 1;
        }

        if start == end {
            return Err(anyhow!(self.err("Expected expression")));
        }

        let tokens = &self.tokens[start..end];
        let expr = match self.token_spans {
            // Spans are sliced along with the tokens, so positions stay absolute
            Some(spans) => ExprParser::new_with_spans(tokens, &spans[start..end]).parse_with_enhanced_errors("")?,
            None => ExprParser::new(tokens).parse()?,
        };
        self.pos = end;
        Ok(expr)
    }

    fn expect_id(&mut self) -> Result<String> {
        match self.tokens.get(self.pos) {
            Some(Token::Id(id)) => {
                let id = id.clone();
                self.pos += 1;
                Ok(id)
            }
            _ => Err(anyhow!(self.err("Expected identifier"))),
        }
    }

    fn locate(&self, err: anyhow::Error, stmt_start: usize, input: &str) -> ParseError {
        if let Some(located) = err.downcast_ref::<ParseError>() {
            return located.clone();
        }
        if let Some(spans) = &self.token_spans
            && let Some(span) = spans.get(stmt_start)
        {
            return ParseError::at(err.to_string(), *span);
        }
        let position = offset_to_position(input, input.len());
        ParseError::at(err.to_string(), position)
    }

    fn eof(&self) -> bool {
        self.pos >= self.len
    }

    fn err(&self, msg: &str) -> String {
        match self.tokens.get(self.pos) {
            Some(t) => format!("Syntax error: {} ('{:?}' at index {})", msg, t, self.pos),
            None => format!("Syntax error: {} (at end)", msg),
        }
    }
}
