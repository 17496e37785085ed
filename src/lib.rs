pub use crate::errors::{ErrorKind, HoistError, SourceContext};
pub use crate::extract::extract;

pub mod cli;
pub mod errors;
pub mod extract;
pub mod parser;
pub mod printer;
pub mod syntax;
