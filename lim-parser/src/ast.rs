use crate::lexer::TokenKind;
use std::fmt;
use std::rc::Rc;

/// Declared type of a variable, parameter or function result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Int,
    Bool,
    String,
}

impl VarType {
    /// Maps a type keyword to a `VarType`.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::KwInt => Some(VarType::Int),
            TokenKind::KwBool => Some(VarType::Bool),
            TokenKind::KwString => Some(VarType::String),
            _ => None,
        }
    }

    /// The value a declaration without initializer starts with.
    pub fn zero_value(&self) -> Expr {
        match self {
            VarType::Int => Expr::IntegerLit(0),
            VarType::Bool => Expr::BoolLit(false),
            VarType::String => Expr::StringLit(String::new()),
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VarType::Int => "int",
            VarType::Bool => "bool",
            VarType::String => "string",
        })
    }
}

/// An identifier (e.g. `foo`), optionally carrying a declared type (function parameters).
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub ty: Option<VarType>,
}

impl Identifier {
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            ty: None,
        }
    }

    pub fn typed(name: impl ToString, ty: VarType) -> Self {
        Self {
            name: name.to_string(),
            ty: Some(ty),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Some(ty) => write!(f, "{} {}", ty, self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier(Identifier),
    IntegerLit(i64),
    BoolLit(bool),
    StringLit(String),
    NullLit,
    /// An array literal (e.g. `[1, 2 * 2]`).
    ArrayLit(Vec<Expr>),
    /// A prefix expression (e.g. `-a`, `!a`).
    Prefix { op: TokenKind, rhs: Box<Expr> },
    /// A binary expression (e.g. `1+1`).
    Infix {
        lhs: Box<Expr>,
        op: TokenKind,
        rhs: Box<Expr>,
    },
    /// A call expression (e.g. `add(1, 2)`).
    Call { function: Box<Expr>, args: Vec<Expr> },
    /// An index expression (e.g. `arr[2]`).
    Index { array: Box<Expr>, index: Box<Expr> },
}

impl Expr {
    /// The text of the token the expression starts with (or is named after, for operators).
    pub fn token_literal(&self) -> String {
        match self {
            Expr::Identifier(ident) => ident.name.clone(),
            Expr::IntegerLit(val) => val.to_string(),
            Expr::BoolLit(val) => val.to_string(),
            Expr::StringLit(val) => val.clone(),
            Expr::NullLit => "null".to_string(),
            Expr::ArrayLit(_) | Expr::Index { .. } => "[".to_string(),
            Expr::Prefix { op, .. } | Expr::Infix { op, .. } => op.to_string(),
            Expr::Call { .. } => "(".to_string(),
        }
    }
}

/// Writes `items` separated by `, `.
fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(ident) => f.write_str(&ident.name),
            Expr::IntegerLit(val) => write!(f, "{}", val),
            Expr::BoolLit(val) => write!(f, "{}", val),
            Expr::StringLit(val) => write!(f, "\"{}\"", val),
            Expr::NullLit => f.write_str("null"),
            Expr::ArrayLit(elements) => {
                f.write_str("[")?;
                write_list(f, elements)?;
                f.write_str("]")
            }
            Expr::Prefix { op, rhs } => write!(f, "({}{})", op, rhs),
            Expr::Infix { lhs, op, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::Call { function, args } => {
                write!(f, "{}(", function)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Index { array, index } => write!(f, "({}[{}])", array, index),
        }
    }
}

/// A brace-delimited sequence of statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{\n")?;
        for stmt in &self.statements {
            writeln!(f, "{}", stmt)?;
        }
        f.write_str("}")
    }
}

/// One link of an `if` / `else if` / `else` chain.
/// A link without `condition` is a terminal `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Option<Expr>,
    pub consequence: Block,
    pub next_case: Option<Box<IfStmt>>,
}

impl IfStmt {
    /// Iterates over the links of the chain, starting with `self`.
    pub fn cases(&self) -> impl Iterator<Item = &IfStmt> {
        std::iter::successors(Some(self), |&case| case.next_case.as_deref())
    }
}

impl fmt::Display for IfStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, case) in self.cases().enumerate() {
            if i > 0 {
                f.write_str(" else ")?;
            }
            if let Some(condition) = &case.condition {
                write!(f, "if {} ", condition)?;
            }
            write!(f, "{}", case.consequence)?;
        }
        Ok(())
    }
}

/// A function declaration (e.g. `fn add(int a, int b) int { a + b }`).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub ident: String,
    /// Parameters, each carrying its declared type.
    pub params: Vec<Identifier>,
    pub return_type: Option<VarType>,
    pub body: Block,
}

impl fmt::Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.ident)?;
        write_list(f, &self.params)?;
        f.write_str(") ")?;
        if let Some(return_type) = self.return_type {
            write!(f, "{} ", return_type)?;
        }
        write!(f, "{}", self.body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A typed declaration (e.g. `int a = 5`, `bool b`, `name := "lim"`).
    Declaration {
        ty: VarType,
        ident: String,
        initializer: Expr,
    },
    /// An array declaration (e.g. `int []arr = [1, 2, 3]`).
    ArrayDeclaration {
        ty: VarType,
        ident: String,
        initializer: Expr,
    },
    Return(Option<Expr>),
    ExprStmt(Expr),
    If(IfStmt),
    Function(Rc<FunctionDecl>),
}

impl Stmt {
    /// The text of the token the statement starts with.
    pub fn token_literal(&self) -> String {
        match self {
            Stmt::Declaration { ty, .. } | Stmt::ArrayDeclaration { ty, .. } => ty.to_string(),
            Stmt::Return(_) => "return".to_string(),
            Stmt::ExprStmt(expr) => expr.token_literal(),
            Stmt::If(_) => "if".to_string(),
            Stmt::Function(_) => "fn".to_string(),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Declaration {
                ty,
                ident,
                initializer,
            } => write!(f, "{} {} = {}", ty, ident, initializer),
            Stmt::ArrayDeclaration {
                ty,
                ident,
                initializer,
            } => write!(f, "{} []{} = {}", ty, ident, initializer),
            Stmt::Return(Some(expr)) => write!(f, "return {}", expr),
            Stmt::Return(None) => f.write_str("return"),
            Stmt::ExprStmt(expr) => write!(f, "{}", expr),
            Stmt::If(if_stmt) => write!(f, "{}", if_stmt),
            Stmt::Function(decl) => write!(f, "{}", decl),
        }
    }
}

/// The root of the syntax tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn token_literal(&self) -> String {
        self.statements
            .first()
            .map(Stmt::token_literal)
            .unwrap_or_default()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let program = Program {
            statements: vec![Stmt::Declaration {
                ty: VarType::Int,
                ident: "myVar".to_string(),
                initializer: Expr::Identifier(Identifier::new("anotherVar")),
            }],
        };
        assert_eq!(program.to_string(), "int myVar = anotherVar");
        assert_eq!(program.token_literal(), "int");
    }

    #[test]
    fn test_if_chain_display() {
        let if_stmt = IfStmt {
            condition: Some(Expr::BoolLit(false)),
            consequence: Block {
                statements: vec![Stmt::ExprStmt(Expr::IntegerLit(10))],
            },
            next_case: Some(Box::new(IfStmt {
                condition: Some(Expr::BoolLit(true)),
                consequence: Block {
                    statements: vec![Stmt::ExprStmt(Expr::IntegerLit(30))],
                },
                next_case: Some(Box::new(IfStmt {
                    condition: None,
                    consequence: Block::default(),
                    next_case: None,
                })),
            })),
        };
        assert_eq!(if_stmt.cases().count(), 3);
        assert_eq!(
            if_stmt.to_string(),
            "if false {\n10\n} else if true {\n30\n} else {\n}"
        );
    }

    #[test]
    fn test_function_display() {
        let decl = FunctionDecl {
            ident: "add".to_string(),
            params: vec![
                Identifier::typed("a", VarType::Int),
                Identifier::typed("b", VarType::Int),
            ],
            return_type: Some(VarType::Int),
            body: Block {
                statements: vec![Stmt::Return(Some(Expr::Infix {
                    lhs: Box::new(Expr::Identifier(Identifier::new("a"))),
                    op: TokenKind::Plus,
                    rhs: Box::new(Expr::Identifier(Identifier::new("b"))),
                }))],
            },
        };
        assert_eq!(
            decl.to_string(),
            "fn add(int a, int b) int {\nreturn (a + b)\n}"
        );
        assert_eq!(Stmt::Function(Rc::new(decl)).token_literal(), "fn");
    }
}
