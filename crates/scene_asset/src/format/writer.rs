//! Text writer for the block/field format
//!
//! Emits one field per line with two-space indentation, the layout the
//! format's own tooling produces.

use std::fmt::Write as _;

/// Incremental writer for blocks and scalar fields
#[derive(Debug, Default)]
pub struct TextWriter {
    out: String,
    depth: usize,
}

impl TextWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    /// Open a named block
    pub fn begin_block(&mut self, name: &str) {
        self.indent();
        self.out.push_str(name);
        self.out.push_str(" {\n");
        self.depth += 1;
    }

    /// Close the innermost block
    pub fn end_block(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("}\n");
    }

    /// Write a quoted, escaped string field
    pub fn string(&mut self, name: &str, value: &str) {
        self.indent();
        let _ = writeln!(self.out, "{name}: \"{}\"", escape(value));
    }

    /// Write a float field
    pub fn float(&mut self, name: &str, value: f32) {
        self.indent();
        let _ = writeln!(self.out, "{name}: {}", format_float(value));
    }

    /// Write a bare identifier field (enum token)
    pub fn ident(&mut self, name: &str, value: &str) {
        self.indent();
        let _ = writeln!(self.out, "{name}: {value}");
    }

    /// Consume the writer and return the text
    pub fn finish(self) -> String {
        self.out
    }
}

/// Shortest round-trip float text, always with a decimal point or exponent
pub fn format_float(value: f32) -> String {
    format!("{value:?}")
}

/// Escape a string for use inside double quotes
///
/// Control characters without a short escape are written as three-digit octal.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\{:03o}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::lexer::{Lexer, Token};

    #[test]
    fn test_block_layout() {
        let mut writer = TextWriter::new();
        writer.begin_block("components");
        writer.string("id", "script");
        writer.begin_block("position");
        writer.float("x", 0.0);
        writer.end_block();
        writer.end_block();

        assert_eq!(
            writer.finish(),
            "components {\n  id: \"script\"\n  position {\n    x: 0.0\n  }\n}\n"
        );
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(1675.8176), "1675.8176");
    }

    #[test]
    fn test_escape_matches_source_form() {
        let data = "tile_set: \"/background/background.atlas\"\nblend_mode: BLEND_MODE_ALPHA\n";
        assert_eq!(
            escape(data),
            r#"tile_set: \"/background/background.atlas\"\nblend_mode: BLEND_MODE_ALPHA\n"#
        );
    }

    #[test]
    fn test_escape_is_read_back_by_lexer() {
        let original = "quote \" tick ' slash \\ bell \u{7} café";
        let quoted = format!("\"{}\"", escape(original));
        let token = Lexer::new(&quoted).next_token().unwrap().token;
        assert_eq!(token, Token::Str(original.to_string()));
    }
}
