//! Tokenizer shared by the executable and type-system parsers.
//!
//! Commas, whitespace, byte-order marks and `#` comments are insignificant.

use std::fmt;

use crate::error::{Location, QueryError};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Bang,
    Dollar,
    Amp,
    ParenL,
    ParenR,
    Spread,
    Colon,
    Equals,
    At,
    BracketL,
    BracketR,
    BraceL,
    Pipe,
    BraceR,
    Name(String),
    Int(String),
    Float(String),
    String(String),
    BlockString(String),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Bang => write!(f, "\"!\""),
            Token::Dollar => write!(f, "\"$\""),
            Token::Amp => write!(f, "\"&\""),
            Token::ParenL => write!(f, "\"(\""),
            Token::ParenR => write!(f, "\")\""),
            Token::Spread => write!(f, "\"...\""),
            Token::Colon => write!(f, "\":\""),
            Token::Equals => write!(f, "\"=\""),
            Token::At => write!(f, "\"@\""),
            Token::BracketL => write!(f, "\"[\""),
            Token::BracketR => write!(f, "\"]\""),
            Token::BraceL => write!(f, "\"{{\""),
            Token::Pipe => write!(f, "\"|\""),
            Token::BraceR => write!(f, "\"}}\""),
            Token::Name(name) => write!(f, "Name \"{}\"", name),
            Token::Int(v) => write!(f, "Int \"{}\"", v),
            Token::Float(v) => write!(f, "Float \"{}\"", v),
            Token::String(v) => write!(f, "String {:?}", v),
            Token::BlockString(v) => write!(f, "BlockString {:?}", v),
            Token::Eof => write!(f, "<EOF>"),
        }
    }
}

/// Tokenize `source` into a token list terminated by `Token::Eof`.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Location)>, QueryError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    line_start: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.pos - self.line_start + 1)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        } else if c == '\r' {
            if self.peek() == Some('\n') {
                self.pos += 1;
            }
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    fn error(&self, message: impl AsRef<str>, location: Location) -> QueryError {
        QueryError::syntax(message, location)
    }

    fn run(mut self) -> Result<Vec<(Token, Location)>, QueryError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_ignored();
            let start = self.location();
            let Some(c) = self.peek() else {
                tokens.push((Token::Eof, start));
                return Ok(tokens);
            };

            let token = match c {
                '!' => self.single(Token::Bang),
                '$' => self.single(Token::Dollar),
                '&' => self.single(Token::Amp),
                '(' => self.single(Token::ParenL),
                ')' => self.single(Token::ParenR),
                ':' => self.single(Token::Colon),
                '=' => self.single(Token::Equals),
                '@' => self.single(Token::At),
                '[' => self.single(Token::BracketL),
                ']' => self.single(Token::BracketR),
                '{' => self.single(Token::BraceL),
                '|' => self.single(Token::Pipe),
                '}' => self.single(Token::BraceR),
                '.' => {
                    if self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') {
                        self.pos += 3;
                        Token::Spread
                    } else {
                        return Err(self.error("Unexpected character \".\".", start));
                    }
                }
                '"' => {
                    if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') {
                        self.read_block_string(start)?
                    } else {
                        self.read_string()?
                    }
                }
                c if c == '_' || c.is_ascii_alphabetic() => self.read_name(),
                c if c == '-' || c.is_ascii_digit() => self.read_number(start)?,
                other => {
                    return Err(self.error(
                        format!("Unexpected character {:?}.", other.to_string()),
                        start,
                    ))
                }
            };
            tokens.push((token, start));
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn skip_ignored(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | ',' | '\u{feff}' | '\n' | '\r' => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn read_name(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '_' || c.is_ascii_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        Token::Name(self.chars[start..self.pos].iter().collect())
    }

    fn read_digits(&mut self) -> Result<(), QueryError> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {}
            other => {
                return Err(self.error(
                    format!("Invalid number, expected digit but got: {}.", describe_char(other)),
                    self.location(),
                ))
            }
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        Ok(())
    }

    fn read_number(&mut self, start: Location) -> Result<Token, QueryError> {
        let begin = self.pos;
        let mut is_float = false;

        if self.peek() == Some('-') {
            self.pos += 1;
        }
        if self.peek() == Some('0') {
            self.pos += 1;
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                return Err(self.error(
                    format!("Invalid number, unexpected digit after 0: {}.", describe_char(self.peek())),
                    start,
                ));
            }
        } else {
            self.read_digits()?;
        }
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            self.read_digits()?;
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            self.read_digits()?;
        }
        if matches!(self.peek(), Some(c) if c == '.' || c == '_' || c.is_ascii_alphabetic()) {
            return Err(self.error(
                format!("Invalid number, expected digit but got: {}.", describe_char(self.peek())),
                self.location(),
            ));
        }

        let text: String = self.chars[begin..self.pos].iter().collect();
        Ok(if is_float { Token::Float(text) } else { Token::Int(text) })
    }

    fn read_string(&mut self) -> Result<Token, QueryError> {
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(self.error("Unterminated string.", self.location()))
                }
                Some('"') => {
                    self.pos += 1;
                    return Ok(Token::String(value));
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = match self.peek() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => {
                            let hex: String = self
                                .chars
                                .get(self.pos + 1..self.pos + 5)
                                .map(|s| s.iter().collect())
                                .unwrap_or_default();
                            let c = u32::from_str_radix(&hex, 16)
                                .ok()
                                .filter(|_| hex.len() == 4)
                                .and_then(char::from_u32)
                                .ok_or_else(|| {
                                    self.error(
                                        format!("Invalid Unicode escape sequence: \"\\u{}\".", hex),
                                        self.location(),
                                    )
                                })?;
                            self.pos += 4;
                            c
                        }
                        other => {
                            return Err(self.error(
                                format!("Invalid character escape sequence: {}.", describe_char(other)),
                                self.location(),
                            ))
                        }
                    };
                    self.pos += 1;
                    value.push(escaped);
                }
                Some(c) => {
                    self.pos += 1;
                    value.push(c);
                }
            }
        }
    }

    fn read_block_string(&mut self, start: Location) -> Result<Token, QueryError> {
        self.pos += 3;
        let mut raw = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("Unterminated string.", start)),
                Some('"') if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') => {
                    self.pos += 3;
                    return Ok(Token::BlockString(block_string_value(&raw)));
                }
                Some('\\')
                    if self.peek_at(1) == Some('"')
                        && self.peek_at(2) == Some('"')
                        && self.peek_at(3) == Some('"') =>
                {
                    self.pos += 4;
                    raw.push_str("\"\"\"");
                }
                Some(_) => {
                    if let Some(c) = self.bump() {
                        raw.push(if c == '\r' { '\n' } else { c });
                    }
                }
            }
        }
    }
}

fn describe_char(c: Option<char>) -> String {
    match c {
        Some(c) => format!("{:?}", c.to_string()),
        None => "<EOF>".to_string(),
    }
}

/// Strip common indentation and surrounding blank lines from a block string.
fn block_string_value(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut out: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                *line
            } else {
                line.get(common_indent..)
                    .unwrap_or_else(|| line.trim_start_matches([' ', '\t']))
            }
        })
        .collect();

    while out.first().is_some_and(|l| l.trim().is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }
    out.join("\n")
}
