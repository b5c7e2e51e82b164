mod context;
mod data;
mod expr;
mod func;
mod gen;
mod statement;
mod var;

pub use gen::{generate, generate_to_string};
