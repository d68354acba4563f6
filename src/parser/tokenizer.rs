// Copyright 2024 Shifa Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tokenizer for condition expressions
//!
//! - keywords are resolved through a compile-time perfect hash (`phf`)
//! - identifier and digit classification use byte lookup tables
//! - identifiers and literals without escapes borrow from the input
//!
//! Both the word and the symbol spellings of the logical operators are
//! accepted (`and`/`&&`, `or`/`||`, `not`/`!`), as are the three equality
//! spellings `=`, `==` and `===`.

use super::error::{ParseError, ParseResult};
use super::span::Spanned;
use phf::phf_map;
use std::borrow::Cow;
use std::fmt;

/// Token with zero-copy string slices where possible
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'input> {
    // Literals
    /// Integer literal (e.g., 42)
    Integer(i64),
    /// Decimal literal as string slice, parsed on demand (e.g., 36.6)
    Decimal(&'input str),
    /// String literal, unescaped (e.g., 'absent', "absent")
    String(Cow<'input, str>),
    /// Boolean literal `true`
    True,
    /// Boolean literal `false`
    False,

    /// Identifier token (field name segment or function name)
    Identifier(&'input str),

    // Operators
    /// Addition operator (+)
    Plus,
    /// Subtraction / negation operator (-)
    Minus,
    /// Multiplication operator (*)
    Multiply,
    /// Division operator (/)
    Divide,
    /// Equality operator (`=`, `==`, `===`)
    Equal,
    /// Inequality operator (`!=`, `!==`)
    NotEqual,
    /// Less than operator (<)
    LessThan,
    /// Less than or equal operator (<=)
    LessThanOrEqual,
    /// Greater than operator (>)
    GreaterThan,
    /// Greater than or equal operator (>=)
    GreaterThanOrEqual,
    /// Logical AND operator (`and`, `&&`)
    And,
    /// Logical OR operator (`or`, `||`)
    Or,
    /// Logical NOT operator (`not`, `!`)
    Not,
    /// Membership operator (in keyword)
    In,
    /// Contains operator (contains keyword)
    Contains,
    /// Range operator (between keyword)
    Between,

    // Punctuation
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left square bracket [
    LeftBracket,
    /// Right square bracket ]
    RightBracket,
    /// Dot (.) joining field path segments
    Dot,
    /// Comma separator (,)
    Comma,
}

impl<'input> Token<'input> {
    /// Check if this token is a keyword (reserved word that cannot be used as identifier)
    #[inline]
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::True
                | Token::False
                | Token::And
                | Token::Or
                | Token::Not
                | Token::In
                | Token::Contains
                | Token::Between
        )
    }

    /// Get identifier string
    #[inline]
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Token::Identifier(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this token is an identifier
    #[inline]
    pub fn is_identifier(&self) -> bool {
        matches!(self, Token::Identifier(_))
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(i) => write!(f, "{i}"),
            Token::Decimal(d) => write!(f, "{d}"),
            Token::String(s) => write!(f, "'{s}'"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Multiply => write!(f, "*"),
            Token::Divide => write!(f, "/"),
            Token::Equal => write!(f, "=="),
            Token::NotEqual => write!(f, "!="),
            Token::LessThan => write!(f, "<"),
            Token::LessThanOrEqual => write!(f, "<="),
            Token::GreaterThan => write!(f, ">"),
            Token::GreaterThanOrEqual => write!(f, ">="),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::In => write!(f, "in"),
            Token::Contains => write!(f, "contains"),
            Token::Between => write!(f, "between"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
        }
    }
}

/// Fast character classification lookup table
/// true = valid identifier character, false = not valid
static ID_CHAR_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = matches!(i as u8,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_'
        );
        i += 1;
    }
    table
};

/// Fast identifier start character check
static ID_START_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = matches!(i as u8, b'A'..=b'Z' | b'a'..=b'z' | b'_');
        i += 1;
    }
    table
};

/// Fast digit validation using lookup table
static DIGIT_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).is_ascii_digit();
        i += 1;
    }
    table
};

/// Single-character punctuation and operators
#[inline(always)]
fn lookup_single_char_operator(byte: u8) -> Option<Token<'static>> {
    match byte {
        b'.' => Some(Token::Dot),
        b'(' => Some(Token::LeftParen),
        b')' => Some(Token::RightParen),
        b',' => Some(Token::Comma),
        b'+' => Some(Token::Plus),
        b'-' => Some(Token::Minus),
        b'*' => Some(Token::Multiply),
        b'/' => Some(Token::Divide),
        b'[' => Some(Token::LeftBracket),
        b']' => Some(Token::RightBracket),
        _ => None,
    }
}

/// Compile-time perfect hash table for keyword recognition
static KEYWORD_TABLE: phf::Map<&'static str, Token<'static>> = phf_map! {
    "true" => Token::True,
    "false" => Token::False,
    "and" => Token::And,
    "or" => Token::Or,
    "not" => Token::Not,
    "in" => Token::In,
    "contains" => Token::Contains,
    "between" => Token::Between,
};

/// Tokenizer for condition expressions
#[derive(Clone)]
pub struct Tokenizer<'input> {
    input: &'input str,
    bytes: &'input [u8],
    pos: usize,
    end: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a new tokenizer
    #[inline]
    pub fn new(input: &'input str) -> Self {
        let bytes = input.as_bytes();
        Self {
            input,
            bytes,
            pos: 0,
            end: bytes.len(),
        }
    }

    /// Multi-character operators starting with `=`, `!`, `<`, `>`, `&`, `|`
    /// Returns (token, consumed_bytes) or None if the byte sequence is not an operator
    #[inline(always)]
    fn lookup_multi_char_operator(rest: &[u8]) -> Option<(Token<'static>, usize)> {
        match rest {
            [b'=', b'=', b'=', ..] => Some((Token::Equal, 3)),
            [b'!', b'=', b'=', ..] => Some((Token::NotEqual, 3)),
            [b'=', b'=', ..] => Some((Token::Equal, 2)),
            [b'!', b'=', ..] => Some((Token::NotEqual, 2)),
            [b'<', b'=', ..] => Some((Token::LessThanOrEqual, 2)),
            [b'>', b'=', ..] => Some((Token::GreaterThanOrEqual, 2)),
            [b'&', b'&', ..] => Some((Token::And, 2)),
            [b'|', b'|', ..] => Some((Token::Or, 2)),

            // Single character fallbacks
            [b'=', ..] => Some((Token::Equal, 1)),
            [b'!', ..] => Some((Token::Not, 1)),
            [b'<', ..] => Some((Token::LessThan, 1)),
            [b'>', ..] => Some((Token::GreaterThan, 1)),

            _ => None,
        }
    }

    /// Input slice between byte positions (always on ASCII boundaries)
    #[inline(always)]
    fn slice(&self, start: usize, end: usize) -> &'input str {
        self.input.get(start..end).unwrap_or("")
    }

    #[inline(always)]
    fn keyword_lookup(ident: &str) -> Option<Token<'input>> {
        if ident.len() < 2 || ident.len() > 8 {
            return None;
        }
        KEYWORD_TABLE.get(ident).cloned()
    }

    #[inline(always)]
    fn is_id_start(ch: u8) -> bool {
        ID_START_TABLE[ch as usize]
    }

    #[inline(always)]
    fn is_id_continue(ch: u8) -> bool {
        ID_CHAR_TABLE[ch as usize]
    }

    #[inline(always)]
    fn is_ascii_digit_fast(byte: u8) -> bool {
        DIGIT_TABLE[byte as usize]
    }

    /// Integer or decimal literal
    fn parse_number(&mut self) -> ParseResult<Token<'input>> {
        let start = self.pos;

        while self.pos < self.end && Self::is_ascii_digit_fast(self.bytes[self.pos]) {
            self.pos += 1;
        }

        // `12.` followed by a non-digit is an integer then a dot
        let is_decimal = self.pos + 1 < self.end
            && self.bytes[self.pos] == b'.'
            && Self::is_ascii_digit_fast(self.bytes[self.pos + 1]);

        if is_decimal {
            self.pos += 1;
            while self.pos < self.end && Self::is_ascii_digit_fast(self.bytes[self.pos]) {
                self.pos += 1;
            }
            return Ok(Token::Decimal(self.slice(start, self.pos)));
        }

        let digits = self.slice(start, self.pos);
        digits
            .parse::<i64>()
            .map(Token::Integer)
            .map_err(|_| ParseError::invalid_integer_literal(digits.to_string(), start))
    }

    /// Identifier made of ASCII letters, digits and underscores
    #[inline]
    fn parse_identifier_fast(&mut self) -> &'input str {
        let start = self.pos;
        while self.pos < self.end && Self::is_id_continue(self.bytes[self.pos]) {
            self.pos += 1;
        }
        self.slice(start, self.pos)
    }

    /// String literal in single or double quotes
    ///
    /// Borrows from the input unless an escape sequence forces a copy.
    fn parse_string_literal(&mut self) -> ParseResult<Cow<'input, str>> {
        let quote = self.bytes[self.pos];
        let open = self.pos;
        self.pos += 1;
        let start = self.pos;
        let mut owned: Option<String> = None;
        let mut chunk_start = start;

        while self.pos < self.end {
            match self.bytes[self.pos] {
                b if b == quote => {
                    let tail = self.slice(chunk_start, self.pos);
                    self.pos += 1;
                    return Ok(match owned {
                        Some(mut buf) => {
                            buf.push_str(tail);
                            Cow::Owned(buf)
                        }
                        None => Cow::Borrowed(tail),
                    });
                }
                b'\\' => {
                    let buf = owned.get_or_insert_with(String::new);
                    buf.push_str(self.slice(chunk_start, self.pos));
                    let escaped = match self.bytes.get(self.pos + 1) {
                        Some(b'\\') => '\\',
                        Some(b'\'') => '\'',
                        Some(b'"') => '"',
                        Some(b'n') => '\n',
                        Some(b't') => '\t',
                        Some(b'r') => '\r',
                        Some(_) => {
                            let sequence = self
                                .input
                                .get(self.pos..)
                                .map(|rest| rest.chars().take(2).collect::<String>())
                                .unwrap_or_default();
                            return Err(ParseError::InvalidEscape {
                                sequence: sequence.into(),
                                position: self.pos,
                            });
                        }
                        None => return Err(ParseError::UnclosedString { position: open }),
                    };
                    buf.push(escaped);
                    self.pos += 2;
                    chunk_start = self.pos;
                }
                _ => self.pos += 1,
            }
        }

        Err(ParseError::UnclosedString { position: open })
    }

    #[inline(always)]
    fn skip_whitespace(&mut self) {
        while self.pos < self.end && matches!(self.bytes[self.pos], b' ' | b'\t' | b'\r' | b'\n')
        {
            self.pos += 1;
        }
    }

    /// Next token with its byte span
    pub fn next_spanned(&mut self) -> ParseResult<Option<Spanned<Token<'input>>>> {
        self.skip_whitespace();
        let start = self.pos;
        Ok(self
            .next_token()?
            .map(|token| Spanned::new(token, start, self.pos)))
    }

    /// Main tokenization function
    pub fn next_token(&mut self) -> ParseResult<Option<Token<'input>>> {
        self.skip_whitespace();

        if self.pos >= self.end {
            return Ok(None);
        }

        let byte = self.bytes[self.pos];

        if let Some(token) = lookup_single_char_operator(byte) {
            self.pos += 1;
            return Ok(Some(token));
        }

        let token = match byte {
            b'=' | b'!' | b'<' | b'>' | b'&' | b'|' => {
                match Self::lookup_multi_char_operator(&self.bytes[self.pos..]) {
                    Some((token, consumed)) => {
                        self.pos += consumed;
                        token
                    }
                    None => {
                        return Err(ParseError::unexpected_token_dynamic(
                            (byte as char).to_string(),
                            self.pos,
                        ));
                    }
                }
            }
            b'0'..=b'9' => self.parse_number()?,
            b'\'' | b'"' => Token::String(self.parse_string_literal()?),

            ch if Self::is_id_start(ch) => {
                let ident = self.parse_identifier_fast();
                Self::keyword_lookup(ident).unwrap_or(Token::Identifier(ident))
            }

            _ => {
                let ch = self
                    .input
                    .get(self.pos..)
                    .and_then(|rest| rest.chars().next())
                    .unwrap_or(byte as char);
                return Err(ParseError::unexpected_token_dynamic(
                    ch.to_string(),
                    self.pos,
                ));
            }
        };

        Ok(Some(token))
    }

    /// Tokenize the whole input with precise spans
    pub fn tokenize_all(&mut self) -> ParseResult<Vec<Spanned<Token<'input>>>> {
        let mut tokens = Vec::with_capacity(16);
        while let Some(token) = self.next_spanned()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Get current position in input
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Check if a string is a keyword without tokenizing
    pub fn is_keyword_str(s: &str) -> bool {
        KEYWORD_TABLE.contains_key(s)
    }
}

/// Tokenize an expression
pub fn tokenize(input: &str) -> ParseResult<Vec<Spanned<Token<'_>>>> {
    Tokenizer::new(input).tokenize_all()
}
