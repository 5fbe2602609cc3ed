use lim_parser::ast::{Block, Expr, Identifier, IfStmt, Program, Stmt};
use lim_parser::lexer::TokenKind;
use lim_value::{Builtins, Closure, Env, Environment, Object, NULL};
use log::{debug, trace};
use std::rc::Rc;

/// Returns early from the enclosing function if `$obj` evaluates to an [`Object::Error`].
macro_rules! try_obj {
    ($obj:expr) => {
        match $obj {
            err @ Object::Error(_) => return err,
            obj => obj,
        }
    };
}

/// Any node that can be evaluated.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    Block(&'a Block),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

/// Creates an [`Object::Error`]. Runtime errors are values, they travel through the normal
/// evaluation results.
pub fn new_error(message: impl ToString) -> Object {
    let message = message.to_string();
    debug!("runtime error: {}", message);
    Object::Error(message)
}

pub struct Evaluator {
    builtins: Builtins,
}

impl Evaluator {
    pub fn new(builtins: Builtins) -> Self {
        Self { builtins }
    }

    pub fn eval(&self, node: Node<'_>, env: &Env) -> Object {
        match node {
            Node::Program(program) => self.eval_program(program, env),
            Node::Block(block) => self.eval_block(block, env),
            Node::Stmt(stmt) => self.eval_stmt(stmt, env),
            Node::Expr(expr) => self.eval_expr(expr, env),
        }
    }

    /// Evaluates every statement in order and returns the value of the last one.
    /// A `return` or a runtime error stops the program early.
    pub fn eval_program(&self, program: &Program, env: &Env) -> Object {
        let mut result = NULL;
        for stmt in &program.statements {
            match self.eval_stmt(stmt, env) {
                Object::ReturnValue(val) => return *val,
                err @ Object::Error(_) => return err,
                obj => result = obj,
            }
        }
        result
    }

    /// Blocks share the environment they are evaluated in. `ReturnValue`s are passed up as is, so
    /// that they unwind every enclosing block until the function boundary.
    fn eval_block(&self, block: &Block, env: &Env) -> Object {
        let mut result = NULL;
        for stmt in &block.statements {
            result = self.eval_stmt(stmt, env);
            if matches!(result, Object::ReturnValue(_) | Object::Error(_)) {
                return result;
            }
        }
        result
    }

    fn eval_stmt(&self, stmt: &Stmt, env: &Env) -> Object {
        match stmt {
            Stmt::Declaration {
                ident, initializer, ..
            }
            | Stmt::ArrayDeclaration {
                ident, initializer, ..
            } => {
                let val = try_obj!(self.eval_expr(initializer, env));
                env.borrow_mut().set(ident.as_str(), val);
                NULL
            }
            Stmt::Return(None) => Object::ReturnValue(Box::new(NULL)),
            Stmt::Return(Some(expr)) => {
                let val = try_obj!(self.eval_expr(expr, env));
                Object::ReturnValue(Box::new(val))
            }
            Stmt::ExprStmt(expr) => self.eval_expr(expr, env),
            Stmt::If(if_stmt) => self.eval_if(if_stmt, env),
            Stmt::Function(decl) => {
                let closure = Closure::new(decl.clone(), env.clone());
                env.borrow_mut()
                    .set(decl.ident.as_str(), Object::Function(Rc::new(closure)));
                NULL
            }
        }
    }

    fn eval_if(&self, if_stmt: &IfStmt, env: &Env) -> Object {
        for case in if_stmt.cases() {
            match &case.condition {
                Some(condition) => {
                    let condition = try_obj!(self.eval_expr(condition, env));
                    if condition.is_truthy() {
                        return self.eval_block(&case.consequence, env);
                    }
                }
                // else
                None => return self.eval_block(&case.consequence, env),
            }
        }
        NULL
    }

    fn eval_expr(&self, expr: &Expr, env: &Env) -> Object {
        match expr {
            Expr::Identifier(ident) => self.eval_identifier(ident, env),
            Expr::IntegerLit(val) => Object::Integer(*val),
            Expr::BoolLit(val) => Object::from_bool(*val),
            Expr::StringLit(val) => Object::String(val.clone()),
            Expr::NullLit => NULL,
            Expr::ArrayLit(elements) => match self.eval_exprs(elements, env) {
                Ok(elements) => Object::Array(Rc::new(elements)),
                Err(err) => err,
            },
            Expr::Prefix { op, rhs } => {
                let rhs = try_obj!(self.eval_expr(rhs, env));
                eval_prefix(*op, rhs)
            }
            Expr::Infix { lhs, op, rhs } => self.eval_infix_expr(lhs, *op, rhs, env),
            Expr::Call { function, args } => {
                let function = try_obj!(self.eval_expr(function, env));
                match self.eval_exprs(args, env) {
                    Ok(args) => self.apply_function(&function, &args),
                    Err(err) => err,
                }
            }
            Expr::Index { array, index } => {
                let array = try_obj!(self.eval_expr(array, env));
                let index = try_obj!(self.eval_expr(index, env));
                eval_index(&array, &index)
            }
        }
    }

    /// Evaluates `exprs` left to right, stopping at the first error.
    fn eval_exprs(&self, exprs: &[Expr], env: &Env) -> Result<Vec<Object>, Object> {
        exprs
            .iter()
            .map(|expr| match self.eval_expr(expr, env) {
                err @ Object::Error(_) => Err(err),
                obj => Ok(obj),
            })
            .collect()
    }

    /// User bindings are looked up first, then builtins.
    fn eval_identifier(&self, ident: &Identifier, env: &Env) -> Object {
        let val = env.borrow().get(&ident.name);
        val.or_else(|| self.builtins.get(&ident.name))
            .unwrap_or_else(|| new_error(format!("identifier not found: {}", ident.name)))
    }

    /// `&&` and `||` only evaluate their right operand when needed.
    fn eval_infix_expr(&self, lhs: &Expr, op: TokenKind, rhs: &Expr, env: &Env) -> Object {
        match op {
            TokenKind::And | TokenKind::Or => {
                let lhs = try_obj!(self.eval_expr(lhs, env));
                if lhs.is_truthy() == (op == TokenKind::Or) {
                    return Object::from_bool(lhs.is_truthy());
                }
                let rhs = try_obj!(self.eval_expr(rhs, env));
                Object::from_bool(rhs.is_truthy())
            }
            _ => {
                let lhs = try_obj!(self.eval_expr(lhs, env));
                let rhs = try_obj!(self.eval_expr(rhs, env));
                eval_infix(op, &lhs, &rhs)
            }
        }
    }

    /// Calls a function or builtin with already evaluated arguments.
    pub fn apply_function(&self, function: &Object, args: &[Object]) -> Object {
        match function {
            Object::Function(closure) => {
                if args.len() != closure.arity() {
                    return new_error(format!(
                        "wrong number of arguments. got={}, want={}",
                        args.len(),
                        closure.arity()
                    ));
                }
                trace!(
                    "calling `{}` with {} argument(s)",
                    closure.decl.ident,
                    args.len()
                );

                let env = Environment::new_enclosed(closure.env.clone());
                for (param, arg) in closure.decl.params.iter().zip(args) {
                    env.borrow_mut().set(param.name.as_str(), arg.clone());
                }
                match self.eval_block(&closure.decl.body, &env) {
                    Object::ReturnValue(val) => *val,
                    obj => obj,
                }
            }
            Object::Builtin(builtin) => {
                trace!(
                    "calling builtin `{}` with {} argument(s)",
                    builtin.ident,
                    args.len()
                );
                builtin.call(args)
            }
            _ => new_error(format!("not a function: {}", function.type_name())),
        }
    }
}

fn eval_prefix(op: TokenKind, rhs: Object) -> Object {
    match op {
        TokenKind::Bang => Object::from_bool(!rhs.is_truthy()),
        TokenKind::Minus => match rhs {
            Object::Integer(val) => Object::Integer(val.wrapping_neg()),
            _ => new_error(format!("unknown operator: -{}", rhs.type_name())),
        },
        _ => new_error(format!("unknown operator: {}{}", op, rhs.type_name())),
    }
}

fn eval_infix(op: TokenKind, lhs: &Object, rhs: &Object) -> Object {
    match (lhs, rhs) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(op, *l, *r),
        (Object::String(l), Object::String(r)) if op == TokenKind::Plus => {
            Object::String([l.as_str(), r.as_str()].concat())
        }
        (Object::String(_), Object::String(_)) => unknown_infix(op, lhs, rhs),
        _ if op == TokenKind::Eq => Object::from_bool(lhs.is_same(rhs)),
        _ if op == TokenKind::NotEq => Object::from_bool(!lhs.is_same(rhs)),
        _ if lhs.type_name() != rhs.type_name() => new_error(format!(
            "type mismatch: {} {} {}",
            lhs.type_name(),
            op,
            rhs.type_name()
        )),
        _ => unknown_infix(op, lhs, rhs),
    }
}

/// Integer arithmetic wraps on overflow.
fn eval_integer_infix(op: TokenKind, l: i64, r: i64) -> Object {
    match op {
        TokenKind::Plus => Object::Integer(l.wrapping_add(r)),
        TokenKind::Minus => Object::Integer(l.wrapping_sub(r)),
        TokenKind::Asterisk => Object::Integer(l.wrapping_mul(r)),
        TokenKind::Slash | TokenKind::Percent if r == 0 => new_error("division by zero"),
        TokenKind::Slash => Object::Integer(l.wrapping_div(r)),
        TokenKind::Percent => Object::Integer(l.wrapping_rem(r)),
        TokenKind::Lt => Object::from_bool(l < r),
        TokenKind::Gt => Object::from_bool(l > r),
        TokenKind::LtEq => Object::from_bool(l <= r),
        TokenKind::GtEq => Object::from_bool(l >= r),
        TokenKind::Eq => Object::from_bool(l == r),
        TokenKind::NotEq => Object::from_bool(l != r),
        _ => new_error(format!("unknown operator: INTEGER {} INTEGER", op)),
    }
}

fn unknown_infix(op: TokenKind, lhs: &Object, rhs: &Object) -> Object {
    new_error(format!(
        "unknown operator: {} {} {}",
        lhs.type_name(),
        op,
        rhs.type_name()
    ))
}

fn eval_index(array: &Object, index: &Object) -> Object {
    match (array, index) {
        (Object::Array(elements), Object::Integer(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .unwrap_or_else(|| {
                new_error(format!(
                    "index out of bounds: index {}, length {}",
                    i,
                    elements.len()
                ))
            }),
        (Object::Array(_), _) => new_error(format!(
            "array index must be INTEGER, got {}",
            index.type_name()
        )),
        _ => new_error(format!(
            "index operator not supported: {}",
            array.type_name()
        )),
    }
}
