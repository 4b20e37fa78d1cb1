//! Data records evaluated against rule trees

mod record;

pub use record::*;
