//! Block/field text format
//!
//! Generic reading and writing of the protobuf-style text layout used by
//! scene assets:
//!
//! ```text
//! components {
//!   id: "script"
//!   position {
//!     x: 0.0
//!   }
//! }
//! ```
//!
//! This layer knows nothing about scenes. It turns text into an untyped tree
//! of [`Field`]s and back; the `scene` module maps that tree onto nodes.

pub mod lexer;
pub mod parser;
pub mod writer;

pub use lexer::{Lexer, LexError, Token};
pub use parser::{parse_document, Block, Field, Scalar, SyntaxError, Value};
pub use writer::TextWriter;
