use crate::token::{ParseError, Position, Span};
use anyhow::{Result, anyhow};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Colon,     // :
    Semicolon, // ; or an inserted line break
    Define,    // :=
    Assign,    // =
    Amp,       // &
    Star,      // *
    Sub,       // -
    Ellipsis,  // ...
    // Keywords
    Map,   // map
    Const, // const
    Str(String), // "abc" or `abc`
    Char(char),  // 'a'
    Int(i128),   // 1, 0x1f, 0o17, 0b101
    Float(f64),  // 1.5, 1e3
    Imag(f64),   // 2i, 1.5i
    Bool(bool),  // true, false
    Id(String),  // identifier
}

impl Token {
    /// Tokens after which a line break terminates the statement.
    fn ends_statement(&self) -> bool {
        matches!(
            self,
            Token::RParen
                | Token::RBrace
                | Token::RBracket
                | Token::Str(_)
                | Token::Char(_)
                | Token::Int(_)
                | Token::Float(_)
                | Token::Imag(_)
                | Token::Bool(_)
                | Token::Id(_)
        )
    }
}

#[inline]
fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

#[inline]
fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// [chars] and [idx] can be used for syntax error reporting.
pub struct Tokenizer<'a> {
    chars: Vec<char>,
    idx: usize,
    len: usize,
    pub tokens: Vec<Token>,
    pub token_spans: Option<Vec<Span>>,
    line: u32,
    column: u32,
    input: &'a str,
}

impl<'a> Tokenizer<'a> {
    pub fn tokenize(s: &str) -> Result<Vec<Token>> {
        let chars: Vec<char> = s.chars().collect();
        let mut t = Tokenizer {
            len: chars.len(),
            chars,
            idx: 0,
            tokens: Vec::with_capacity(s.len() / 4),
            token_spans: None,
            line: 1,
            column: 1,
            input: s,
        };
        t.parse()?;
        Ok(t.tokens)
    }

    /// Tokenize and return tokens with precise spans aligned by index
    pub fn tokenize_enhanced_with_spans(s: &str) -> std::result::Result<(Vec<Token>, Vec<Span>), ParseError> {
        let mut t = Tokenizer::new_enhanced(s);
        match t.parse() {
            Ok(()) => Ok((t.tokens, t.token_spans.unwrap_or_default())),
            Err(err) => Err(t.enhanced_error(&format!("{}", err))),
        }
    }

    pub fn enhanced_error(&self, msg: &str) -> ParseError {
        ParseError::at(msg.to_string(), self.current_position())
    }

    pub fn new_enhanced(input: &'a str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        Self {
            len: chars.len(),
            chars,
            idx: 0,
            tokens: Vec::with_capacity(input.len() / 4),
            token_spans: Some(Vec::with_capacity(input.len() / 4)),
            line: 1,
            column: 1,
            input,
        }
    }

    pub fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.idx)
    }

    fn eof(&self) -> bool {
        self.idx >= self.len
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.idx + ahead).copied()
    }

    fn expect(&mut self, s: &str) -> bool {
        let start_idx = self.idx;
        let start_line = self.line;
        let start_column = self.column;

        for c in s.chars() {
            if self.idx >= self.len || self.chars[self.idx] != c {
                self.idx = start_idx;
                self.line = start_line;
                self.column = start_column;
                return false;
            }
            self.advance_char();
        }
        true
    }

    fn err<T: AsRef<str>>(&self, msg: T) -> String {
        // Collect near 10(max) chars around the error position
        let r_idx = (self.idx + 5).min(self.len);
        let l_idx = self.idx.saturating_sub(5);
        let chars: String = self.chars[l_idx..r_idx].iter().collect();
        let ctx = if let Some(&c) = self.chars.get(self.idx) {
            format!("'{}' at index {}, near '{}'", c, self.idx, chars)
        } else {
            format!("at end, near '{}'", chars)
        };

        let line_context = self.get_line_context();
        format!(
            "Syntax error:\n{} ({})\nLine {}: {}",
            msg.as_ref(),
            ctx,
            self.line,
            line_context
        )
    }

    fn get_line_context(&self) -> String {
        let target = (self.line as usize).saturating_sub(1);
        self.input
            .lines()
            .nth(target)
            .map(|line| line.to_string())
            .unwrap_or_default()
    }

    fn advance_char(&mut self) {
        if !self.eof() && self.chars[self.idx] == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.idx += 1;
    }

    /// Skip blanks and comments. A line break after a token that can end a
    /// statement becomes a `Semicolon`.
    fn skip_trivia(&mut self) -> Result<()> {
        while !self.eof() {
            let c = self.chars[self.idx];
            match c {
                '\n' => {
                    let start = self.current_position();
                    self.advance_char();
                    if self.tokens.last().is_some_and(Token::ends_statement) {
                        let end = self.current_position();
                        self.push_with_span(Token::Semicolon, start, end);
                    }
                }
                c if c.is_whitespace() => self.advance_char(),
                '/' if self.peek(1) == Some('/') => {
                    // Stop at the line break so it can still terminate the statement
                    while !self.eof() && self.chars[self.idx] != '\n' {
                        self.advance_char();
                    }
                }
                '/' if self.peek(1) == Some('*') => self.skip_block_comment()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        // Skip past /*
        self.advance_char();
        self.advance_char();

        while !self.eof() {
            if self.chars[self.idx] == '*' && self.peek(1) == Some('/') {
                self.advance_char();
                self.advance_char();
                return Ok(());
            }
            self.advance_char();
        }

        Err(anyhow!(self.err("Block comment not closed")))
    }

    fn parse_escape(&mut self, quote: char) -> Result<char> {
        // Cursor is on the character after '\'
        if self.eof() {
            return Err(anyhow!(self.err("Incomplete escape sequence")));
        }
        let c = self.chars[self.idx];
        self.advance_char();
        let decoded = match c {
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0C',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0B',
            '\\' => '\\',
            c if c == quote => c,
            'x' => return self.parse_hex_escape(2).and_then(|v| self.ascii_escape(v)),
            'u' => return self.parse_hex_escape(4).and_then(|v| self.unicode_escape(v)),
            'U' => return self.parse_hex_escape(8).and_then(|v| self.unicode_escape(v)),
            '0'..='7' => {
                let mut v = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek(0).and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            v = v * 8 + d;
                            self.advance_char();
                        }
                        None => return Err(anyhow!(self.err("Octal escape needs three digits"))),
                    }
                }
                return self.ascii_escape(v);
            }
            other => return Err(anyhow!(self.err(format!("Unknown escape sequence '\\{}'", other)))),
        };
        Ok(decoded)
    }

    fn parse_hex_escape(&mut self, digits: usize) -> Result<u32> {
        let mut v: u32 = 0;
        for _ in 0..digits {
            match self.peek(0).and_then(|d| d.to_digit(16)) {
                Some(d) => {
                    v = v * 16 + d;
                    self.advance_char();
                }
                None => return Err(anyhow!(self.err("Invalid hex digit in escape"))),
            }
        }
        Ok(v)
    }

    // Strings hold UTF-8 text, so byte escapes are limited to ASCII.
    fn ascii_escape(&self, v: u32) -> Result<char> {
        if v < 0x80 {
            char::from_u32(v).ok_or_else(|| anyhow!(self.err("Invalid escape")))
        } else {
            Err(anyhow!(self.err("Byte escape above \\x7f is not valid UTF-8")))
        }
    }

    fn unicode_escape(&self, v: u32) -> Result<char> {
        char::from_u32(v).ok_or_else(|| anyhow!(self.err("Escape is not a valid Unicode code point")))
    }

    fn parse_str(&mut self) -> Result<()> {
        let start_pos = self.current_position();
        let mut content = String::new();
        self.advance_char(); // skip opening quote

        while !self.eof() {
            let c = self.chars[self.idx];
            match c {
                '"' => {
                    self.advance_char();
                    let end_pos = self.current_position();
                    self.push_with_span(Token::Str(content), start_pos, end_pos);
                    return Ok(());
                }
                '\n' => break,
                '\\' => {
                    self.advance_char();
                    let decoded = self.parse_escape('"')?;
                    content.push(decoded);
                }
                _ => {
                    content.push(c);
                    self.advance_char();
                }
            }
        }

        Err(anyhow!(self.err("String not closed")))
    }

    /// Backtick strings: verbatim, may span lines.
    fn parse_raw_str(&mut self) -> Result<()> {
        let start_pos = self.current_position();
        let mut content = String::new();
        self.advance_char(); // '`'

        while !self.eof() {
            let c = self.chars[self.idx];
            self.advance_char();
            if c == '`' {
                let end_pos = self.current_position();
                self.push_with_span(Token::Str(content), start_pos, end_pos);
                return Ok(());
            }
            // Carriage returns are discarded from raw strings
            if c != '\r' {
                content.push(c);
            }
        }

        Err(anyhow!(self.err("Raw string not closed")))
    }

    fn parse_char(&mut self) -> Result<()> {
        let start_pos = self.current_position();
        self.advance_char(); // skip '\''

        let c = match self.peek(0) {
            None | Some('\n') => return Err(anyhow!(self.err("Rune literal not terminated"))),
            Some('\'') => return Err(anyhow!(self.err("Empty rune literal"))),
            Some('\\') => {
                self.advance_char();
                self.parse_escape('\'')?
            }
            Some(c) => {
                self.advance_char();
                c
            }
        };

        if self.peek(0) != Some('\'') {
            return Err(anyhow!(self.err("Rune literal must contain exactly one character")));
        }
        self.advance_char();
        let end_pos = self.current_position();
        self.push_with_span(Token::Char(c), start_pos, end_pos);
        Ok(())
    }

    fn parse_num(&mut self) -> Result<()> {
        let start_pos = self.current_position();

        // Prefixed integers: 0x, 0o, 0b
        let prefix = match self.peek(1) {
            Some('x' | 'X') => Some(16),
            Some('o' | 'O') => Some(8),
            Some('b' | 'B') => Some(2),
            _ => None,
        };
        if self.chars[self.idx] == '0'
            && let Some(radix) = prefix
        {
            self.advance_char();
            self.advance_char();
            let digits = self.take_digits(radix);
            if digits.is_empty() {
                return Err(anyhow!(self.err("Missing digits after base prefix")));
            }
            let value = i128::from_str_radix(&digits, radix)
                .map_err(|_| anyhow!("{}: {}", self.err("Integer literal too large"), digits))?;
            return self.finish_int(value, start_pos);
        }

        let mut num = self.take_digits(10);
        let mut is_float = false;

        if self.peek(0) == Some('.') && self.peek(1) != Some('.') {
            is_float = true;
            num.push('.');
            self.advance_char();
            num.push_str(&self.take_digits(10));
        }
        if matches!(self.peek(0), Some('e' | 'E')) {
            is_float = true;
            num.push('e');
            self.advance_char();
            if let Some(sign @ ('+' | '-')) = self.peek(0) {
                num.push(sign);
                self.advance_char();
            }
            let exp = self.take_digits(10);
            if exp.is_empty() {
                return Err(anyhow!(self.err("Invalid number, incomplete exponent")));
            }
            num.push_str(&exp);
        }
        if num == "." {
            return Err(anyhow!(self.err("Invalid number")));
        }

        if self.peek(0) == Some('i') && !self.peek(1).is_some_and(is_ident_continue) {
            self.advance_char();
            let v: f64 = num
                .parse()
                .map_err(|_| anyhow!("{}: {}", self.err("Invalid imaginary literal"), num))?;
            let end_pos = self.current_position();
            self.push_with_span(Token::Imag(v), start_pos, end_pos);
            return Ok(());
        }

        if is_float {
            let v: f64 = num
                .parse()
                .map_err(|_| anyhow!("{}: {}", self.err("Invalid float"), num))?;
            let end_pos = self.current_position();
            self.push_with_span(Token::Float(v), start_pos, end_pos);
            return Ok(());
        }

        // A leading zero selects octal, as in `0755`
        let (digits, radix) = if num.len() > 1 && num.starts_with('0') {
            (&num[1..], 8)
        } else {
            (num.as_str(), 10)
        };
        let value = i128::from_str_radix(digits, radix)
            .map_err(|_| anyhow!("{}: {}", self.err("Invalid int"), num))?;
        self.finish_int(value, start_pos)
    }

    fn finish_int(&mut self, value: i128, start_pos: Position) -> Result<()> {
        if self.peek(0).is_some_and(is_ident_continue) {
            return Err(anyhow!(self.err("Invalid character in number literal")));
        }
        let end_pos = self.current_position();
        self.push_with_span(Token::Int(value), start_pos, end_pos);
        Ok(())
    }

    /// Digits of `radix` with `_` separators removed.
    fn take_digits(&mut self, radix: u32) -> String {
        let mut digits = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_digit(radix) {
                digits.push(c);
            } else if c != '_' {
                break;
            }
            self.advance_char();
        }
        digits
    }

    fn parse_id(&mut self) -> Result<()> {
        let mut id = String::new();
        let start_pos = self.current_position();
        while !self.eof() {
            let c = self.chars[self.idx];
            if is_ident_continue(c) {
                id.push(c);
                self.advance_char();
            } else {
                break;
            }
        }
        if id.is_empty() {
            return Err(anyhow!(self.err("Invalid identifier start or unknown character")));
        }
        let token = match id.as_str() {
            "map" => Token::Map,
            "const" => Token::Const,
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            _ => Token::Id(id),
        };
        let end_pos = self.current_position();
        self.push_with_span(token, start_pos, end_pos);
        Ok(())
    }

    fn parse_punctuations(&mut self) -> Result<()> {
        let start = self.current_position();
        let token = if self.expect(":=") {
            Token::Define
        } else if self.expect("...") {
            Token::Ellipsis
        } else {
            let token = match self.chars[self.idx] {
                '(' => Token::LParen,
                ')' => Token::RParen,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                ',' => Token::Comma,
                ':' => Token::Colon,
                ';' => Token::Semicolon,
                '=' => Token::Assign,
                '&' => Token::Amp,
                '*' => Token::Star,
                '-' => Token::Sub,
                _ => return Err(anyhow!(self.err("Unknown punctuation"))),
            };
            self.advance_char();
            token
        };
        let end = self.current_position();
        self.push_with_span(token, start, end);
        Ok(())
    }

    fn parse(&mut self) -> Result<()> {
        loop {
            self.skip_trivia()?;
            if self.eof() {
                break;
            }
            let c = self.chars[self.idx];
            match c {
                '"' => self.parse_str()?,
                '`' => self.parse_raw_str()?,
                '\'' => self.parse_char()?,
                '0'..='9' => self.parse_num()?,
                '.' if self.peek(1).is_some_and(|d| d.is_ascii_digit()) => self.parse_num()?,
                c if is_ident_start(c) => self.parse_id()?,
                _ => self.parse_punctuations()?,
            }
        }
        Ok(())
    }
}

impl<'a> Tokenizer<'a> {
    fn push_with_span(&mut self, token: Token, start: Position, end: Position) {
        self.tokens.push(token);
        if let Some(spans) = &mut self.token_spans {
            spans.push(Span::new(start, end));
        }
    }
}
