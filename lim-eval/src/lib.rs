//! Tree-walking evaluation of lim programs.

pub mod eval;

pub use eval::{new_error, Evaluator, Node};
