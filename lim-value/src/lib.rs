pub mod environment;
pub mod object;

pub use environment::{Env, Environment};
pub use object::{Builtin, BuiltinFn, Closure};

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);
pub const NULL: Object = Object::Null;

/// A runtime value.
#[derive(Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(String),
    /// Arrays are reference values: copies share the same elements.
    Array(Rc<Vec<Object>>),
    Function(Rc<Closure>),
    Builtin(Builtin),
    Null,
    /// Signals a `return` travelling up to the enclosing call. Unwrapped when the call completes.
    ReturnValue(Box<Object>),
    Error(String),
}

impl Object {
    pub fn from_bool(val: bool) -> Self {
        if val {
            TRUE
        } else {
            FALSE
        }
    }

    /// Name of the variant, as used in runtime error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::String(_) => "STRING",
            Object::Array(_) => "ARRAY",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::Null => "NULL",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Error(_) => "ERROR",
        }
    }

    /// `null`, `false` and `0` are falsy. Everything else, including `""` and `[]`, is truthy.
    /// `!` negates this, so `!0` and `!null` are `true` while `!5` and `!"a"` are `false`.
    pub fn is_truthy(&self) -> bool {
        !matches!(
            self,
            Object::Null | Object::Boolean(false) | Object::Integer(0)
        )
    }

    /// Identity comparison used by `==` / `!=` for operands that are not both integers.
    /// Booleans and null are shared constants, arrays and functions compare by reference.
    pub fn is_same(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Boolean(l), Object::Boolean(r)) => l == r,
            (Object::Null, Object::Null) => true,
            (Object::Array(l), Object::Array(r)) => Rc::ptr_eq(l, r),
            (Object::Function(l), Object::Function(r)) => Rc::ptr_eq(l, r),
            (Object::Builtin(l), Object::Builtin(r)) => l.ident == r.ident,
            _ => false,
        }
    }
}

/// Structural equality, for hosts and tests. Arrays compare element-wise here, unlike the
/// language's `==`.
impl PartialEq for Object {
    fn eq(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Integer(l), Object::Integer(r)) => l == r,
            (Object::String(l), Object::String(r)) => l == r,
            (Object::Array(l), Object::Array(r)) => l == r,
            (Object::ReturnValue(l), Object::ReturnValue(r)) => l == r,
            (Object::Error(l), Object::Error(r)) => l == r,
            _ => self.is_same(other),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(val) => write!(f, "{}", val),
            Object::Boolean(val) => write!(f, "{}", val),
            Object::String(val) => f.write_str(val),
            Object::Array(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
            Object::Function(closure) => write!(f, "<fn {}>", closure.decl.ident),
            Object::Builtin(builtin) => write!(f, "<native fn {}>", builtin.ident),
            Object::Null => f.write_str("null"),
            Object::ReturnValue(val) => write!(f, "{}", val),
            Object::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::String(val) => write!(f, "{:?}", val),
            _ => fmt::Display::fmt(self, f),
        }
    }
}

/// Native functions available to every program.
/// Looked up after the environment chain, so user bindings shadow them.
#[derive(Clone, Default)]
pub struct Builtins {
    functions: HashMap<&'static str, Builtin>,
}

impl Builtins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_builtin_fn(&mut self, ident: &'static str, func: BuiltinFn) {
        self.functions.insert(ident, Builtin { ident, func });
    }

    pub fn get(&self, ident: &str) -> Option<Object> {
        self.functions.get(ident).cloned().map(Object::Builtin)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(args: &[Object]) -> Object {
        args.first().cloned().unwrap_or(NULL)
    }

    #[test]
    fn test_truthiness() {
        assert!(!NULL.is_truthy());
        assert!(!FALSE.is_truthy());
        assert!(TRUE.is_truthy());
        assert!(!Object::Integer(0).is_truthy());
        assert!(Object::Integer(-1).is_truthy());
        assert!(Object::String(String::new()).is_truthy());
        assert!(Object::Array(Rc::new(Vec::new())).is_truthy());
    }

    #[test]
    fn test_identity() {
        let elements = Rc::new(vec![Object::Integer(1)]);
        let arr = Object::Array(elements.clone());
        assert!(arr.is_same(&Object::Array(elements)));
        assert!(!arr.is_same(&Object::Array(Rc::new(vec![Object::Integer(1)]))));
        // ...but structurally equal
        assert_eq!(arr, Object::Array(Rc::new(vec![Object::Integer(1)])));

        assert!(Object::from_bool(true).is_same(&TRUE));
        assert!(NULL.is_same(&Object::Null));
        assert!(!NULL.is_same(&FALSE));
        assert!(!Object::Integer(1).is_same(&Object::Integer(1)));
    }

    #[test]
    fn test_display() {
        let arr = Object::Array(Rc::new(vec![
            Object::Integer(1),
            Object::String("two".to_string()),
            NULL,
        ]));
        assert_eq!(arr.to_string(), "[1, two, null]");
        assert_eq!(
            Object::Error("identifier not found: x".to_string()).to_string(),
            "ERROR: identifier not found: x"
        );
        assert_eq!(
            Object::ReturnValue(Box::new(Object::Integer(10))).to_string(),
            "10"
        );
        assert_eq!(format!("{:?}", Object::String("a".to_string())), "\"a\"");
    }

    #[test]
    fn test_builtins() {
        let mut builtins = Builtins::new();
        assert!(builtins.is_empty());
        builtins.add_builtin_fn("first", first);

        let builtin = builtins.get("first");
        assert!(matches!(builtin, Some(Object::Builtin(Builtin { ident: "first", .. }))));
        assert_eq!(builtin.map(|b| b.type_name()), Some("BUILTIN"));
        assert!(builtins.get("second").is_none());
        assert_eq!(
            builtins.get("first").map(|b| b.to_string()),
            Some("<native fn first>".to_string())
        );
    }
}
