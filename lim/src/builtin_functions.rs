use lim_eval::new_error;
use lim_value::{Builtins, Object, NULL};
use std::io::{self, Write};

/// Returns the default [`Builtins`] that should be used.
pub fn default_builtins() -> Builtins {
    let mut builtins = Builtins::new();
    builtins.add_builtin_fn("len", len);
    builtins.add_builtin_fn("print", print);
    builtins
}

/// Length of a string (in bytes) or of an array.
pub fn len(args: &[Object]) -> Object {
    match args {
        [Object::String(string)] => Object::Integer(string.len() as i64),
        [Object::Array(elements)] => Object::Integer(elements.len() as i64),
        [arg] => new_error(format!(
            "argument to `len` not supported, got {}",
            arg.type_name()
        )),
        _ => new_error(format!(
            "wrong number of arguments. got={}, want=1",
            args.len()
        )),
    }
}

/// Writes its arguments separated by spaces, then a newline.
pub fn print(args: &[Object]) -> Object {
    let line = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut stdout = io::stdout().lock();
    match writeln!(stdout, "{}", line) {
        Ok(()) => NULL,
        Err(err) => new_error(format!("print failed: {}", err)),
    }
}
