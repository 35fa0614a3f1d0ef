//! PHP tokenizer
//!
//! Produces just enough structure for the class parser: names, variables,
//! decoded string literals, numbers, doc comments and punctuation. Ordinary
//! comments, whitespace and inline HTML outside `<?php ... ?>` are dropped.

use std::fmt;

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, keyword or backslash-qualified name
    Name(String),
    /// `$name`, stored without the dollar sign
    Variable(String),
    /// String literal with escapes decoded
    Str(String),
    /// Numeric literal, raw text
    Number(String),
    /// Raw text of a `/** ... */` comment
    DocComment(String),
    /// `->` or `?->`
    Arrow,
    /// `::`
    DoubleColon,
    /// `=>`
    DoubleArrow,
    /// Any other single character
    Punct(char),
}

/// A token and the 1-based line it starts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Payload
    pub kind: TokenKind,
    /// Line number
    pub line: usize,
}

impl Token {
    /// Whether this is the name `word`, compared case-insensitively like PHP keywords
    pub fn is_name(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Name(n) if n.eq_ignore_ascii_case(word))
    }

    /// Whether this is the punctuation character `c`
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    /// The name payload, if any
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Name(n) => Some(n),
            _ => None,
        }
    }
}

/// Lexing or parsing failure with the line it was detected on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based line
    pub line: usize,
    /// Description
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for SyntaxError {}

/// Tokenize a PHP source file
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '\\' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '\\' || !c.is_ascii()
}

impl Lexer {
    fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek(i).is_some_and(|p| p.eq_ignore_ascii_case(&c)))
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn push(&mut self, kind: TokenKind, line: usize) {
        self.tokens.push(Token { kind, line });
    }

    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        self.skip_inline_html();
        while let Some(c) = self.peek(0) {
            let line = self.line;
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '?' if self.peek(1) == Some('>') => {
                    self.advance(2);
                    // a close tag terminates the statement like `;`
                    self.push(TokenKind::Punct(';'), line);
                    self.skip_inline_html();
                }
                '?' if self.peek(1) == Some('-') && self.peek(2) == Some('>') => {
                    self.advance(3);
                    self.push(TokenKind::Arrow, line);
                }
                '#' if self.peek(1) == Some('[') => self.skip_attribute()?,
                '#' => self.skip_line_comment(),
                '/' if self.peek(1) == Some('/') => self.skip_line_comment(),
                '/' if self.peek(1) == Some('*') => self.block_comment()?,
                '\'' => {
                    let value = self.single_quoted()?;
                    self.push(TokenKind::Str(value), line);
                }
                '"' => {
                    let value = self.double_quoted()?;
                    self.push(TokenKind::Str(value), line);
                }
                '`' => {
                    let value = self.quoted_raw('`')?;
                    self.push(TokenKind::Str(value), line);
                }
                '<' if self.starts_with("<<<") => {
                    let value = self.heredoc()?;
                    self.push(TokenKind::Str(value), line);
                }
                '$' if self.peek(1).is_some_and(is_name_start) && self.peek(1) != Some('\\') => {
                    self.bump();
                    let name = self.take_while(is_name_char);
                    self.push(TokenKind::Variable(name), line);
                }
                c if c.is_ascii_digit() => {
                    let number = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                    self.push(TokenKind::Number(number), line);
                }
                c if is_name_start(c) => {
                    let name = self.take_while(is_name_char);
                    self.push(TokenKind::Name(name), line);
                }
                '-' if self.peek(1) == Some('>') => {
                    self.advance(2);
                    self.push(TokenKind::Arrow, line);
                }
                ':' if self.peek(1) == Some(':') => {
                    self.advance(2);
                    self.push(TokenKind::DoubleColon, line);
                }
                '=' if self.peek(1) == Some('>') => {
                    self.advance(2);
                    self.push(TokenKind::DoubleArrow, line);
                }
                other => {
                    self.bump();
                    self.push(TokenKind::Punct(other), line);
                }
            }
        }
        Ok(self.tokens)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek(0) {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    /// Skip text outside PHP tags, leaving the cursor after the next open tag
    fn skip_inline_html(&mut self) {
        while self.peek(0).is_some() {
            if self.starts_with("<?php") {
                self.advance(5);
                return;
            }
            if self.starts_with("<?=") {
                self.advance(3);
                return;
            }
            if self.starts_with("<?") {
                self.advance(2);
                return;
            }
            self.bump();
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' || (c == '?' && self.peek(1) == Some('>')) {
                return;
            }
            self.bump();
        }
    }

    fn skip_attribute(&mut self) -> Result<(), SyntaxError> {
        let line = self.line;
        self.advance(2);
        let mut depth = 1usize;
        while let Some(c) = self.peek(0) {
            match c {
                '\'' => {
                    self.single_quoted()?;
                    continue;
                }
                '"' => {
                    self.double_quoted()?;
                    continue;
                }
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        self.bump();
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.bump();
        }
        Err(SyntaxError::new(line, "unterminated attribute"))
    }

    fn block_comment(&mut self) -> Result<(), SyntaxError> {
        let line = self.line;
        let is_doc = self.peek(2) == Some('*') && self.peek(3) != Some('/');
        self.advance(2);
        let mut text = String::new();
        loop {
            match self.peek(0) {
                None => return Err(SyntaxError::new(line, "unterminated comment")),
                Some('*') if self.peek(1) == Some('/') => {
                    self.advance(2);
                    break;
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
        if is_doc {
            self.push(TokenKind::DocComment(format!("/*{text}*/")), line);
        }
        Ok(())
    }

    fn single_quoted(&mut self) -> Result<String, SyntaxError> {
        let line = self.line;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxError::new(line, "unterminated string literal")),
                Some('\'') => return Ok(out),
                Some('\\') => match self.peek(0) {
                    Some(c @ ('\'' | '\\')) => {
                        out.push(c);
                        self.bump();
                    }
                    _ => out.push('\\'),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn double_quoted(&mut self) -> Result<String, SyntaxError> {
        let line = self.line;
        self.bump();
        let mut raw = String::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxError::new(line, "unterminated string literal")),
                Some('"') => return Ok(decode_escapes(&raw, '"')),
                Some('\\') => {
                    raw.push('\\');
                    if let Some(c) = self.bump() {
                        raw.push(c);
                    }
                }
                Some(c) => raw.push(c),
            }
        }
    }

    fn quoted_raw(&mut self, quote: char) -> Result<String, SyntaxError> {
        let line = self.line;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxError::new(line, "unterminated string literal")),
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn heredoc(&mut self) -> Result<String, SyntaxError> {
        let line = self.line;
        self.advance(3);
        self.take_while(|c| c == ' ' || c == '\t');
        let quote = match self.peek(0) {
            Some(q @ ('\'' | '"')) => {
                self.bump();
                Some(q)
            }
            _ => None,
        };
        let label = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        if label.is_empty() {
            return Err(SyntaxError::new(line, "heredoc without a label"));
        }
        if let Some(q) = quote {
            if self.bump() != Some(q) {
                return Err(SyntaxError::new(line, "malformed heredoc label"));
            }
        }
        self.take_while(|c| c != '\n');
        self.bump();

        let mut lines: Vec<String> = Vec::new();
        loop {
            if self.peek(0).is_none() {
                return Err(SyntaxError::new(line, format!("unterminated heredoc '{label}'")));
            }
            let text = self.take_while(|c| c != '\n');
            let trimmed = text.trim_start();
            let closes = trimmed.starts_with(label.as_str())
                && !trimmed[label.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
            if closes {
                let indent = text.len() - trimmed.len();
                // rewind so the terminator's tail (`;`, `)`, ...) is lexed normally
                let tail = trimmed[label.len()..].chars().count();
                self.pos -= tail;
                let body = lines
                    .iter()
                    .map(|l| strip_indent(l, indent))
                    .collect::<Vec<_>>()
                    .join("\n");
                return Ok(if quote == Some('\'') {
                    body
                } else {
                    decode_escapes(&body, '\0')
                });
            }
            lines.push(text);
            self.bump();
        }
    }
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let mut cut = 0;
    for (i, c) in line.char_indices() {
        if i >= indent || !c.is_whitespace() {
            break;
        }
        cut = i + c.len_utf8();
    }
    &line[cut..]
}

/// Decode PHP double-quoted escape sequences; interpolation is left as written
fn decode_escapes(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('v') => out.push('\u{0B}'),
            Some('e') => out.push('\u{1B}'),
            Some('f') => out.push('\u{0C}'),
            Some('\\') => out.push('\\'),
            Some('$') => out.push('$'),
            Some(q) if q == quote => out.push(q),
            Some('x') => {
                chars.next();
                let hex: String = std::iter::from_fn(|| chars.next_if(|c| c.is_ascii_hexdigit()))
                    .take(2)
                    .collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(b) => out.push(char::from(b)),
                    Err(_) => out.push_str("\\x"),
                }
                continue;
            }
            Some('u') => {
                chars.next();
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let hex: String = std::iter::from_fn(|| chars.next_if(|c| *c != '}')).collect();
                    chars.next();
                    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                        Some(ch) => out.push(ch),
                        None => {
                            out.push_str("\\u{");
                            out.push_str(&hex);
                            out.push('}');
                        }
                    }
                } else {
                    out.push_str("\\u");
                }
                continue;
            }
            Some(d) if d.is_digit(8) => {
                let oct: String = std::iter::from_fn(|| chars.next_if(|c| c.is_digit(8)))
                    .take(3)
                    .collect();
                match u8::from_str_radix(&oct, 8) {
                    Ok(b) => out.push(char::from(b)),
                    Err(_) => {
                        out.push('\\');
                        out.push_str(&oct);
                    }
                }
                continue;
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => {
                out.push('\\');
                continue;
            }
        }
        chars.next();
    }
    out
}
