//! Report output: the summary artifact and the highlight message.

pub mod generator;

pub use generator::*;
