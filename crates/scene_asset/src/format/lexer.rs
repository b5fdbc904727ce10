//! Tokenizer for the block/field text format

use std::iter::Peekable;
use std::str::Chars;

/// Lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Field name or enum token (`position`, `BLEND_MODE_ALPHA`)
    Ident(String),
    /// Numeric literal, kept as source text until a field asks for a type
    Number(String),
    /// Unescaped string literal
    Str(String),
    /// `:`
    Colon,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,` or `;`
    Separator,
    /// End of input
    Eof,
}

/// Token together with the line it starts on (1-based)
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Source line
    pub line: usize,
}

/// Tokenizer failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Source line of the failure
    pub line: usize,
    /// What went wrong
    pub reason: String,
}

/// Streaming tokenizer over a source string
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned at the start of `src`
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn error(&self, reason: impl Into<String>) -> LexError {
        LexError { line: self.line, reason: reason.into() }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while matches!(self.chars.peek(), Some(c) if *c != '\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce the next token
    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_trivia();
        let line = self.line;

        let Some(c) = self.bump() else {
            return Ok(Spanned { token: Token::Eof, line });
        };

        let token = match c {
            ':' => Token::Colon,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' | ';' => Token::Separator,
            '"' | '\'' => Token::Str(self.string_body(c)?),
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                let mut s = String::from(c);
                while let Some(&p) = self.chars.peek() {
                    let exponent_sign = matches!(p, '-' | '+') && matches!(s.chars().last(), Some('e' | 'E'));
                    if p.is_ascii_alphanumeric() || p == '.' || exponent_sign {
                        s.push(p);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Token::Number(s)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut s = String::from(c);
                while let Some(&p) = self.chars.peek() {
                    if p.is_alphanumeric() || p == '_' || p == '.' {
                        s.push(p);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Token::Ident(s)
            }
            other => return Err(LexError { line, reason: format!("unexpected character '{other}'") }),
        };

        Ok(Spanned { token, line })
    }

    /// Read a quoted string after its opening quote, decoding escapes
    ///
    /// Octal escapes produce raw bytes, so the body is collected as bytes and
    /// validated as UTF-8 once the closing quote is found.
    fn string_body(&mut self, quote: char) -> Result<String, LexError> {
        let mut bytes = Vec::new();
        let mut utf8 = [0u8; 4];

        loop {
            let c = match self.bump() {
                Some('\n') | None => return Err(self.error("unterminated string literal")),
                Some(c) => c,
            };

            if c == quote {
                break;
            }

            if c != '\\' {
                bytes.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                continue;
            }

            let escaped = self.bump().ok_or_else(|| self.error("unterminated string literal"))?;
            match escaped {
                'n' => bytes.push(b'\n'),
                't' => bytes.push(b'\t'),
                'r' => bytes.push(b'\r'),
                '"' => bytes.push(b'"'),
                '\'' => bytes.push(b'\''),
                '\\' => bytes.push(b'\\'),
                '0'..='7' => {
                    let mut value = u32::from(escaped) - u32::from('0');
                    for _ in 0..2 {
                        match self.chars.peek().copied() {
                            Some(d) if ('0'..='7').contains(&d) => {
                                value = value * 8 + (u32::from(d) - u32::from('0'));
                                self.bump();
                            }
                            _ => break,
                        }
                    }
                    let byte = u8::try_from(value)
                        .map_err(|_| self.error(format!("octal escape \\{value:o} out of range")))?;
                    bytes.push(byte);
                }
                other => return Err(self.error(format!("unknown escape sequence '\\{other}'"))),
            }
        }

        String::from_utf8(bytes).map_err(|_| self.error("string literal is not valid UTF-8"))
    }
}
