//! Rule expression parsing, validation, evaluation and combination
//!
//! This module handles rule text like "age > 30 AND department = 'Sales'",
//! structural trees supplied by clients, and evaluation against data records.

mod ast;
pub mod cache;
mod combiner;
mod evaluator;
pub mod parser;
pub mod structure;
pub mod tokenizer;
mod validator;


pub use ast::*;
pub use cache::*;
pub use combiner::*;
pub use evaluator::*;
pub use parser::*;
pub use structure::*;
pub use tokenizer::*;
pub use validator::*;
