mod ast;
mod error;
mod parser;
mod printer;
mod scanner;
mod token;

pub use ast::*;
pub use error::*;
pub use parser::parse;
pub use scanner::{tokenize, Scanner};
pub use token::*;
