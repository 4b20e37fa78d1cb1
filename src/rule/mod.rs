//! Named rules and their Python handle

mod definition;
mod session;

pub use definition::*;
pub use session::*;
