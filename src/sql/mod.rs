//! SQL parsing and AST types for slotdb.
//!
//! Uses `sqlparser` crate for parsing, then converts to our internal AST
//! representation for planning. Only the shapes the planner can consume
//! are accepted; anything else is rejected here with a [`ParseError`].

mod ast;
mod error;
mod parser;

pub use ast::*;
pub use error::{ParseError, ParseResult};
pub use parser::Parser;
