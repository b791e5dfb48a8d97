use crate::{
    expr::{ArrayLen, Element, Expr, IndexNode, Literal, TypeExpr},
    token::{ParseError, Span, Token, offset_to_position},
};
use anyhow::{Result, anyhow};

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    len: usize,
    token_spans: Option<&'a [Span]>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let len = tokens.len();
        Self {
            tokens,
            pos: 0,
            len,
            token_spans: None,
        }
    }

    /// Create a parser with token spans for precise error reporting
    pub fn new_with_spans(tokens: &'a [Token], spans: &'a [Span]) -> Self {
        let len = tokens.len();
        Self {
            tokens,
            pos: 0,
            len,
            token_spans: Some(spans),
        }
    }

    pub fn parse(&mut self) -> Result<Expr> {
        if self.eof() {
            return Err(anyhow!(self.err("Expected expression")));
        }

        let exp = self.parse_expr()?;

        if !self.eof() {
            return Err(anyhow!(self.err("Unexpected tokens at end")));
        }
        Ok(exp)
    }

    /// Parse with enhanced error information that includes position
    pub fn parse_with_enhanced_errors(&mut self, input: &str) -> std::result::Result<Expr, ParseError> {
        match self.parse() {
            Ok(expr) => Ok(expr),
            Err(err) => Err(self.locate(err.to_string(), input)),
        }
    }

    /// Attach the span of the current token, or an estimated position when
    /// spans are not available.
    fn locate(&self, message: String, input: &str) -> ParseError {
        if let Some(spans) = &self.token_spans {
            if self.pos < spans.len() {
                return ParseError::at(message, spans[self.pos]);
            }
            if let Some(last) = spans.last() {
                return ParseError::at(message, last.end);
            }
        }
        let position = offset_to_position(
            input,
            if self.pos < self.tokens.len() && self.pos > 0 {
                self.pos * input.len() / self.tokens.len().max(1)
            } else {
                input.len()
            },
        );
        ParseError::at(message, position)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_unary()
    }

    /// - `-expr`
    /// - `&expr`
    /// - `*expr`
    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eof() {
            return Err(anyhow!(self.err("Expected expression")));
        }
        let start = self.pos;
        let wrap: fn(Box<Expr>) -> Expr = match self.tokens[self.pos] {
            Token::Sub => Expr::Neg,
            Token::Amp => Expr::AddrOf,
            Token::Star => Expr::Deref,
            _ => return self.parse_postfix(),
        };
        self.pos += 1;
        let expr = self.parse_unary()?;
        Ok(self.spanned(wrap(Box::new(expr)), start))
    }

    /// - `primary`
    /// - `primary[expr]`
    /// - `func_name(args)`
    fn parse_postfix(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut expr = self.parse_primary()?;

        loop {
            if !self.eof() && self.tokens[self.pos] == Token::LParen {
                self.pos += 1; // skip '('

                let mut args = Vec::new();
                while !self.eof() && self.tokens[self.pos] != Token::RParen {
                    args.push(self.parse_expr()?);

                    if !self.eof() && self.tokens[self.pos] == Token::Comma {
                        self.pos += 1;
                    } else if self.eof() || self.tokens[self.pos] != Token::RParen {
                        return Err(anyhow!(self.err("Expected ',' or ')' in function call")));
                    }
                }

                if self.eof() {
                    return Err(anyhow!(self.err("Expected ')' to close function call")));
                }
                self.pos += 1; // skip ')'

                expr = self.spanned(Expr::Call(Box::new(expr), args), start);
            } else if !self.eof() && self.tokens[self.pos] == Token::LBracket {
                self.pos += 1; // skip '['

                if self.eof() || !self.is_valid_expr_start() {
                    let msg = format!("Invalid index after '[', {:?}", self.tokens.get(self.pos));
                    return Err(anyhow!(self.err(&msg)));
                }
                let index = self.parse_expr()?;

                if self.eof() || self.tokens[self.pos] != Token::RBracket {
                    let msg = format!("Expecting ']' to close index, found {:?}", self.tokens.get(self.pos));
                    return Err(anyhow!(self.err(&msg)));
                }
                self.pos += 1; // skip ']'

                let mut node = IndexNode::new(expr, index);
                if let Some(span) = self.span_between(start, self.pos - 1) {
                    node = node.with_span(span);
                }
                expr = Expr::Index(node);
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        if self.eof() {
            return Err(anyhow!(self.err("Expected expression")));
        }
        let expr = match &self.tokens[self.pos] {
            Token::Int(v) => Expr::Lit(Literal::Int(*v)),
            Token::Float(v) => Expr::Lit(Literal::Float(*v)),
            Token::Imag(v) => Expr::Lit(Literal::Imag(*v)),
            Token::Char(c) => Expr::Lit(Literal::Char(*c)),
            Token::Str(s) => Expr::Lit(Literal::Str(s.clone())),
            Token::Bool(b) => Expr::Lit(Literal::Bool(*b)),
            Token::Id(name) => Expr::Ident(name.clone()),
            Token::LParen => return self.parse_paren(),
            Token::LBracket | Token::Map => return self.parse_composite(),
            other => {
                let msg = format!("Unexpected token {:?}", other);
                return Err(anyhow!(self.err(&msg)));
            }
        };
        self.pos += 1;
        Ok(self.spanned(expr, self.pos - 1))
    }

    fn parse_paren(&mut self) -> Result<Expr> {
        self.pos += 1; // skip '('
        let inner = self.parse_expr()?;
        if self.eof() || self.tokens[self.pos] != Token::RParen {
            return Err(anyhow!(self.err("Expected ')'")));
        }
        self.pos += 1;
        Ok(Expr::Paren(Box::new(inner)))
    }

    /// `type '{' elements '}'`
    fn parse_composite(&mut self) -> Result<Expr> {
        let start = self.pos;
        let ty = self.parse_type()?;
        if self.eof() || self.tokens[self.pos] != Token::LBrace {
            return Err(anyhow!(self.err("Expected '{' after composite literal type")));
        }
        self.pos += 1; // skip '{'

        let mut elems = Vec::new();
        while !self.eof() && self.tokens[self.pos] != Token::RBrace {
            let first = self.parse_expr()?;
            let elem = if !self.eof() && self.tokens[self.pos] == Token::Colon {
                self.pos += 1;
                Element::keyed(first, self.parse_expr()?)
            } else {
                Element::positional(first)
            };
            elems.push(elem);

            if self.eof() {
                break;
            }
            match self.tokens[self.pos] {
                Token::Comma => self.pos += 1,
                Token::RBrace => {}
                Token::Semicolon => {
                    return Err(anyhow!(self.err("Missing ',' before newline in composite literal")));
                }
                _ => return Err(anyhow!(self.err("Expected ',' or '}' in composite literal"))),
            }
        }

        if self.eof() {
            return Err(anyhow!(self.err("Expected '}' to close composite literal")));
        }
        self.pos += 1; // skip '}'
        Ok(self.spanned(Expr::Composite { ty, elems }, start))
    }

    pub fn parse_type(&mut self) -> Result<TypeExpr> {
        if self.eof() {
            return Err(anyhow!(self.err("Expected type")));
        }
        match &self.tokens[self.pos] {
            Token::Id(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(TypeExpr::Named(name))
            }
            Token::Star => {
                self.pos += 1;
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            Token::Map => {
                self.pos += 1;
                self.expect_token(Token::LBracket, "Expected '[' after 'map'")?;
                let key = self.parse_type()?;
                self.expect_token(Token::RBracket, "Expected ']' after map key type")?;
                let value = self.parse_type()?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            Token::LBracket => {
                self.pos += 1;
                if self.eof() {
                    return Err(anyhow!(self.err("Unexpected end in array type")));
                }
                let len = match &self.tokens[self.pos] {
                    Token::RBracket => None,
                    Token::Ellipsis => {
                        self.pos += 1;
                        Some(ArrayLen::Inferred)
                    }
                    Token::Int(n) => {
                        let n = usize::try_from(*n).map_err(|_| anyhow!(self.err("Invalid array length")))?;
                        self.pos += 1;
                        Some(ArrayLen::Fixed(n))
                    }
                    _ => return Err(anyhow!(self.err("Array length must be an integer literal or '...'"))),
                };
                self.expect_token(Token::RBracket, "Expected ']' in array type")?;
                let elem = Box::new(self.parse_type()?);
                Ok(match len {
                    Some(len) => TypeExpr::Array(len, elem),
                    None => TypeExpr::Slice(elem),
                })
            }
            other => {
                let msg = format!("Expected type, found {:?}", other);
                Err(anyhow!(self.err(&msg)))
            }
        }
    }

    fn expect_token(&mut self, expected: Token, msg: &str) -> Result<()> {
        if self.eof() || self.tokens[self.pos] != expected {
            return Err(anyhow!(self.err(msg)));
        }
        self.pos += 1;
        Ok(())
    }

    fn is_valid_expr_start(&self) -> bool {
        matches!(
            self.tokens.get(self.pos),
            Some(
                Token::Int(_)
                    | Token::Float(_)
                    | Token::Imag(_)
                    | Token::Char(_)
                    | Token::Str(_)
                    | Token::Bool(_)
                    | Token::Id(_)
                    | Token::LParen
                    | Token::LBracket
                    | Token::Map
                    | Token::Sub
                    | Token::Amp
                    | Token::Star
            )
        )
    }

    fn span_between(&self, first: usize, last: usize) -> Option<Span> {
        let spans = self.token_spans?;
        Some(spans.get(first)?.to(*spans.get(last)?))
    }

    /// Wrap `expr` with the range from token `first` through the last one
    /// consumed.
    fn spanned(&self, expr: Expr, first: usize) -> Expr {
        match self.span_between(first, self.pos - 1) {
            Some(span) => Expr::Spanned(Box::new(expr), span),
            None => expr,
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.len
    }

    fn err(&self, msg: &str) -> String {
        let r_idx = (self.pos + 5).min(self.len);
        let l_idx = self.pos.saturating_sub(5);
        let near: Vec<_> = self.tokens[l_idx..r_idx].iter().collect();
        let ctx = if let Some(c) = self.tokens.get(self.pos) {
            format!("'{:?}' at index {}, near '{:?}'", c, self.pos, near)
        } else {
            format!("at end, near '{:?}'", near)
        };
        format!("Syntax error: {} ({})", msg, ctx)
    }
}
