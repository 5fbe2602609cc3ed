use crate::{Env, Object};
use lim_parser::ast::FunctionDecl;
use std::rc::Rc;

/// Signature of a native function. Errors are reported as [`Object::Error`].
pub type BuiltinFn = fn(&[Object]) -> Object;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub ident: &'static str,
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, args: &[Object]) -> Object {
        (self.func)(args)
    }
}

/// A user function together with the environment it was declared in.
pub struct Closure {
    pub decl: Rc<FunctionDecl>,
    pub env: Env,
}

impl Closure {
    pub fn new(decl: Rc<FunctionDecl>, env: Env) -> Self {
        Self { decl, env }
    }

    /// Number of arguments that the function accepts.
    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }
}
