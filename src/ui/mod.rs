pub mod bars;

pub use bars::*;
