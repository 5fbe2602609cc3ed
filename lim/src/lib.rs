//! lim: a small statically-declared scripting language.
//!
//! ```
//! let result = lim::run("int a = 5; int b = a; a + b + 5").unwrap();
//! assert_eq!(result, lim::Object::Integer(15));
//! ```

pub mod builtin_functions;

pub use lim_eval::{Evaluator, Node};
pub use lim_parser::ast::Program;
pub use lim_source::Diagnostics;
pub use lim_value::{Builtins, Env, Environment, Object};

use lim_parser::parser::Parser;
use lim_source::Source;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Lexical or syntax errors. The program was not evaluated.
    #[error("{0}")]
    Syntax(Diagnostics),
    /// The program stopped on a runtime error.
    #[error("ERROR: {0}")]
    Runtime(String),
}

/// Parses `source`, collecting every syntax error.
pub fn parse(source: &str) -> Result<Program, Error> {
    let source = Source::new(source);
    let program = Parser::new(&source).parse_program();

    if source.has_no_errors() {
        Ok(program)
    } else {
        Err(Error::Syntax(source.diagnostics()))
    }
}

/// Runs `source` in a fresh global environment with the default builtins.
pub fn run(source: &str) -> Result<Object, Error> {
    Interpreter::new().run(source)
}

/// Evaluates programs against a global environment that persists between runs.
pub struct Interpreter {
    evaluator: Evaluator,
    env: Env,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_builtins(builtin_functions::default_builtins())
    }

    pub fn with_builtins(builtins: Builtins) -> Self {
        Self {
            evaluator: Evaluator::new(builtins),
            env: Environment::new(),
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Parses and evaluates `source`. Nothing is evaluated if `source` has syntax errors.
    pub fn run(&self, source: &str) -> Result<Object, Error> {
        let program = parse(source)?;
        match self.evaluator.eval_program(&program, &self.env) {
            Object::Error(message) => Err(Error::Runtime(message)),
            obj => Ok(obj),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
