//! Record parser for the block/field text format
//!
//! Produces an untyped tree of named fields. Each top-level field of a
//! document is a *record*; records are numbered from zero so that errors can
//! point at the record they occurred in.

use crate::format::lexer::{LexError, Lexer, Spanned, Token};

/// Scalar field value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Bare identifier, used for enum tokens
    Ident(String),
    /// Numeric literal as written in the source
    Number(String),
    /// String literal with escapes decoded
    Str(String),
}

impl Scalar {
    /// Short name of the scalar kind for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ident(_) => "identifier",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
        }
    }

    /// Interpret the scalar as a float
    ///
    /// Identifiers are accepted so that `inf` and `nan` reach validation
    /// instead of failing here.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Number(text) | Self::Ident(text) => text.parse().ok(),
            Self::Str(_) => None,
        }
    }

    /// The string payload, if this is a string literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The identifier text, if this is a bare identifier
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Ident(s) => Some(s),
            _ => None,
        }
    }
}

/// Field value: a scalar or a nested block
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `name: scalar`
    Scalar(Scalar),
    /// `name { ... }`
    Block(Block),
}

/// Named field with the line it was declared on
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field value
    pub value: Value,
    /// Source line of the field name
    pub line: usize,
}

/// Braced block of fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Fields in declaration order
    pub fields: Vec<Field>,
}

/// Structural failure while reading a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Index of the top-level record being read
    pub record: usize,
    /// Source line
    pub line: usize,
    /// What went wrong
    pub reason: String,
}

/// Parse a whole document into its top-level records
pub fn parse_document(src: &str) -> Result<Vec<Field>, SyntaxError> {
    Parser::new(src)?.parse_document()
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(s) => format!("identifier `{s}`"),
        Token::Number(s) => format!("number `{s}`"),
        Token::Str(_) => "string literal".to_string(),
        Token::Colon => "':'".to_string(),
        Token::LBrace => "'{'".to_string(),
        Token::RBrace => "'}'".to_string(),
        Token::Separator => "separator".to_string(),
        Token::Eof => "end of input".to_string(),
    }
}

/// Deepest block nesting accepted; scene assets use three levels
pub const MAX_DEPTH: usize = 32;

/// Recursive-descent parser with one token of lookahead
struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Spanned,
    record: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, SyntaxError> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token().map_err(|e| Self::lex_error(0, e))?;
        Ok(Self { lexer, current, record: 0, depth: 0 })
    }

    fn lex_error(record: usize, e: LexError) -> SyntaxError {
        SyntaxError { record, line: e.line, reason: e.reason }
    }

    fn error(&self, reason: impl Into<String>) -> SyntaxError {
        SyntaxError { record: self.record, line: self.current.line, reason: reason.into() }
    }

    /// Move to the next token, returning the one just consumed
    fn advance(&mut self) -> Result<Spanned, SyntaxError> {
        let next = self.lexer.next_token().map_err(|e| Self::lex_error(self.record, e))?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn skip_separator(&mut self) -> Result<(), SyntaxError> {
        if self.current.token == Token::Separator {
            self.advance()?;
        }
        Ok(())
    }

    fn parse_document(mut self) -> Result<Vec<Field>, SyntaxError> {
        let mut records = Vec::new();
        while self.current.token != Token::Eof {
            self.record = records.len();
            if self.current.token == Token::RBrace {
                return Err(self.error("unexpected '}' outside of any block"));
            }
            records.push(self.parse_field()?);
            self.skip_separator()?;
        }
        log::trace!("parsed {} top-level records", records.len());
        Ok(records)
    }

    fn parse_field(&mut self) -> Result<Field, SyntaxError> {
        let Spanned { token, line } = self.advance()?;
        let name = match token {
            Token::Ident(name) => name,
            other => {
                return Err(SyntaxError {
                    record: self.record,
                    line,
                    reason: format!("expected field name, found {}", describe(&other)),
                })
            }
        };

        let value = match self.current.token {
            Token::Colon => {
                self.advance()?;
                if self.current.token == Token::LBrace {
                    Value::Block(self.parse_block(&name)?)
                } else {
                    Value::Scalar(self.parse_scalar(&name)?)
                }
            }
            Token::LBrace => Value::Block(self.parse_block(&name)?),
            ref other => {
                return Err(self.error(format!(
                    "expected ':' or '{{' after field `{name}`, found {}",
                    describe(other)
                )))
            }
        };

        Ok(Field { name, value, line })
    }

    fn parse_block(&mut self, name: &str) -> Result<Block, SyntaxError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!(
                "blocks nested too deeply at `{name}` (limit {MAX_DEPTH})"
            )));
        }
        self.depth += 1;
        let block = self.parse_block_fields(name);
        self.depth -= 1;
        block
    }

    fn parse_block_fields(&mut self, name: &str) -> Result<Block, SyntaxError> {
        let open_line = self.advance()?.line;
        let mut block = Block::default();

        loop {
            match self.current.token {
                Token::RBrace => {
                    self.advance()?;
                    return Ok(block);
                }
                Token::Eof => {
                    return Err(self.error(format!(
                        "missing closing '}}' for block `{name}` opened on line {open_line}"
                    )))
                }
                _ => {
                    block.fields.push(self.parse_field()?);
                    self.skip_separator()?;
                }
            }
        }
    }

    fn parse_scalar(&mut self, name: &str) -> Result<Scalar, SyntaxError> {
        match self.current.token.clone() {
            Token::Ident(s) => {
                self.advance()?;
                Ok(Scalar::Ident(s))
            }
            Token::Number(s) => {
                self.advance()?;
                Ok(Scalar::Number(s))
            }
            Token::Str(_) => {
                // Adjacent string literals concatenate
                let mut text = String::new();
                while let Token::Str(part) = &self.current.token {
                    text.push_str(part);
                    self.advance()?;
                }
                Ok(Scalar::Str(text))
            }
            other => Err(self.error(format!(
                "expected a value for field `{name}`, found {}",
                describe(&other)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_records() {
        let src = r#"
components {
  id: "script"
  position {
    x: 1.5
    y: -2.0
  }
}
embedded_components {
  id: "sprite"
}
"#;
        let records = parse_document(src).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "components");
        assert_eq!(records[1].name, "embedded_components");
        assert_eq!(records[1].line, 9);

        let Value::Block(component) = &records[0].value else {
            panic!("components should be a block");
        };
        assert_eq!(component.fields[0].value, Value::Scalar(Scalar::Str("script".into())));

        let Value::Block(position) = &component.fields[1].value else {
            panic!("position should be a block");
        };
        let y = match &position.fields[1].value {
            Value::Scalar(s) => s.as_f32(),
            Value::Block(_) => None,
        };
        assert_eq!(y, Some(-2.0));
    }

    #[test]
    fn test_colon_before_block_and_inline_separators() {
        let records = parse_document("rotation: { x: 0.0, y: 0.0; z: 0.0 w: 1.0 }").unwrap();
        let Value::Block(rotation) = &records[0].value else {
            panic!("rotation should be a block");
        };
        assert_eq!(rotation.fields.len(), 4);
    }

    #[test]
    fn test_adjacent_strings_concatenate() {
        let records = parse_document("data: \"tile_set: \" \"x\"").unwrap();
        assert_eq!(records[0].value, Value::Scalar(Scalar::Str("tile_set: x".into())));
    }

    #[test]
    fn test_missing_closing_brace_reports_record() {
        let src = "components {\n  id: \"a\"\n}\nembedded_components {\n  id: \"b\"\n";
        let err = parse_document(src).unwrap_err();
        assert_eq!(err.record, 1);
        assert!(err.reason.contains("missing closing"), "{}", err.reason);
        assert!(err.reason.contains("line 4"), "{}", err.reason);
    }

    #[test]
    fn test_stray_closing_brace() {
        let err = parse_document("a: 1\n}").unwrap_err();
        assert_eq!(err.record, 1);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_field_without_value() {
        let err = parse_document("components {\n  id\n}").unwrap_err();
        assert!(err.reason.contains("after field `id`"), "{}", err.reason);
    }

    #[test]
    fn test_lex_error_carries_record() {
        let err = parse_document("a { }\nb { id: \"unterminated }").unwrap_err();
        assert_eq!(err.record, 1);
        assert!(err.reason.contains("unterminated"));
    }

    #[test]
    fn test_nesting_limit() {
        let within = format!("{}{}", "a {".repeat(MAX_DEPTH), "}".repeat(MAX_DEPTH));
        assert!(parse_document(&within).is_ok());

        let beyond = format!("{}{}", "a {".repeat(MAX_DEPTH + 1), "}".repeat(MAX_DEPTH + 1));
        let err = parse_document(&beyond).unwrap_err();
        assert!(err.reason.contains("nested too deeply"), "{}", err.reason);
        assert_eq!(err.record, 0);
    }

    #[test]
    fn test_runaway_nesting_is_an_error() {
        let src = format!("components {{ id: \"s\" {} }}", "a {".repeat(200_000));
        let err = parse_document(&src).unwrap_err();
        assert!(err.reason.contains("nested too deeply"), "{}", err.reason);
    }

    #[test]
    fn test_scalar_accessors() {
        assert_eq!(Scalar::Ident("nan".into()).as_f32().map(f32::is_nan), Some(true));
        assert_eq!(Scalar::Number("1675.8176".into()).as_f32(), Some(1675.8176));
        assert_eq!(Scalar::Str("1.0".into()).as_f32(), None);
        assert_eq!(Scalar::Ident("BLEND_MODE_ADD".into()).as_ident(), Some("BLEND_MODE_ADD"));
        assert_eq!(Scalar::Number("2".into()).kind(), "number");
    }
}
