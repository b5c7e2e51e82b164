mod serializer;
mod structure;

pub use serializer::*;
pub use structure::*;
