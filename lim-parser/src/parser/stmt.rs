use super::*;
use crate::ast::{Block, FunctionDecl, Identifier, IfStmt, VarType};
use std::rc::Rc;

impl<'a> Parser<'a> {
    /// Parses a statement starting at the current token.
    /// On success, the current token is the last token of the statement.
    pub fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.current().kind {
            TokenKind::KwInt | TokenKind::KwBool | TokenKind::KwString => {
                let ty = VarType::from_token(self.current().kind)?;
                if self.peek_is(TokenKind::LBracket) {
                    self.parse_array_declaration(ty)
                } else {
                    self.parse_declaration(ty)
                }
            }
            TokenKind::Fn => self.parse_function_stmt(),
            TokenKind::If => self.parse_if_stmt().map(Stmt::If),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Ident if self.peek_is(TokenKind::Define) => self.parse_define_stmt(),
            _ => self.parse_expr().map(Stmt::ExprStmt),
        }
    }

    fn parse_declaration(&mut self, ty: VarType) -> Option<Stmt> {
        let ident = self.expect_ident()?;
        let initializer = self.parse_initializer(ty.zero_value())?;
        Some(Stmt::Declaration {
            ty,
            ident,
            initializer,
        })
    }

    /// `int []arr = [1, 2]`. Without initializer, the array starts empty.
    fn parse_array_declaration(&mut self, ty: VarType) -> Option<Stmt> {
        self.expect_peek(TokenKind::LBracket)?;
        self.expect_peek(TokenKind::RBracket)?;
        let ident = self.expect_ident()?;
        let initializer = self.parse_initializer(Expr::ArrayLit(Vec::new()))?;
        Some(Stmt::ArrayDeclaration {
            ty,
            ident,
            initializer,
        })
    }

    /// Parses `= expr`, or returns `default` if the declaration ends right after its name.
    fn parse_initializer(&mut self, default: Expr) -> Option<Expr> {
        if self.peek_is(TokenKind::Assign) {
            self.next();
            self.next();
            self.parse_expr()
        } else if self.peek_ends_statement() {
            Some(default)
        } else {
            self.unexpected_peek("`=`");
            None
        }
    }

    /// `name := expr`. The type is inferred from the first token of `expr`.
    fn parse_define_stmt(&mut self) -> Option<Stmt> {
        let ident = self.current().literal.clone();
        self.next(); // `:=`
        self.next();

        let ty = match self.current().kind {
            TokenKind::Int | TokenKind::Minus => VarType::Int,
            TokenKind::Str => VarType::String,
            TokenKind::True | TokenKind::False | TokenKind::Bang => VarType::Bool,
            _ => {
                let token = self.current().clone();
                self.error_at(
                    &token,
                    format!(
                        "cannot infer the type of `{}` from {}",
                        ident,
                        describe_token(&token)
                    ),
                );
                return None;
            }
        };

        let initializer = self.parse_expr()?;
        Some(Stmt::Declaration {
            ty,
            ident,
            initializer,
        })
    }

    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        if self.peek_ends_statement() {
            return Some(Stmt::Return(None));
        }
        self.next();
        let value = self.parse_expr()?;
        Some(Stmt::Return(Some(value)))
    }

    fn parse_function_stmt(&mut self) -> Option<Stmt> {
        let ident = self.expect_ident()?;
        self.expect_peek(TokenKind::LParen)?;
        let params = self.parse_function_params()?;

        let return_type = VarType::from_token(self.peek().kind);
        if return_type.is_some() {
            self.next();
        }

        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block()?;

        Some(Stmt::Function(Rc::new(FunctionDecl {
            ident,
            params,
            return_type,
            body,
        })))
    }

    /// Parses `type name` pairs up to the closing `)`. The current token is `(`.
    fn parse_function_params(&mut self) -> Option<Vec<Identifier>> {
        let mut params = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            self.next();
            return Some(params);
        }

        loop {
            let ty = match VarType::from_token(self.peek().kind) {
                Some(ty) => ty,
                None => {
                    self.unexpected_peek("parameter type");
                    return None;
                }
            };
            self.next();
            let name = self.expect_ident()?;
            params.push(Identifier::typed(name, ty));

            if !self.peek_is(TokenKind::Comma) {
                break;
            }
            self.next();
        }
        self.expect_peek(TokenKind::RParen)?;

        Some(params)
    }

    /// Parses an `if` / `else if` / `else` chain. The current token is `if`.
    fn parse_if_stmt(&mut self) -> Option<IfStmt> {
        let mut cases = vec![self.parse_if_case()?];
        let mut otherwise = None;

        while self.peek_is(TokenKind::Else) {
            self.next();
            if self.peek_is(TokenKind::If) {
                self.next();
                cases.push(self.parse_if_case()?);
            } else if self.peek_is(TokenKind::LBrace) {
                self.next();
                otherwise = Some(self.parse_block()?);
                break;
            } else {
                self.unexpected_peek("`if` or `{` after `else`");
                return None;
            }
        }

        // link the chain back to front
        let mut next_case = otherwise.map(|consequence| {
            Box::new(IfStmt {
                condition: None,
                consequence,
                next_case: None,
            })
        });
        for (condition, consequence) in cases.into_iter().rev() {
            next_case = Some(Box::new(IfStmt {
                condition: Some(condition),
                consequence,
                next_case,
            }));
        }
        next_case.map(|case| *case)
    }

    fn parse_if_case(&mut self) -> Option<(Expr, Block)> {
        self.next();
        let condition = self.parse_expr()?;
        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_block()?;
        Some((condition, consequence))
    }

    /// Parses statements up to the matching `}`. The current token is `{`.
    pub fn parse_block(&mut self) -> Option<Block> {
        self.next();
        let mut statements = Vec::new();

        while !self.current_is(TokenKind::RBrace) {
            if self.at_end() {
                self.unexpected_current("`}` to close the block");
                return None;
            }
            if self.current_is(TokenKind::Semicolon) {
                self.next();
                continue;
            }
            match self.parse_terminated_stmt() {
                Some(stmt) => statements.push(stmt),
                None => {
                    if self.synchronize() {
                        break;
                    }
                }
            }
            self.next();
        }

        self.last_block_end = Some(self.current().span.start);
        Some(Block { statements })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(source: &str) -> Program {
        let source = source.into();
        let program = Parser::new(&source).parse_program();
        assert!(source.has_no_errors(), "{}", source.diagnostics());
        program
    }

    fn errors(source: &str) -> Vec<String> {
        let source = source.into();
        Parser::new(&source).parse_program();
        source
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.message.clone())
            .collect()
    }

    fn ident(name: &str) -> Expr {
        Expr::Identifier(Identifier::new(name))
    }

    #[test]
    fn test_declarations() {
        let program = program("int a = 5\nbool b = true; string c = \"lim\"");
        assert_eq!(
            program.statements,
            vec![
                Stmt::Declaration {
                    ty: VarType::Int,
                    ident: "a".to_string(),
                    initializer: Expr::IntegerLit(5),
                },
                Stmt::Declaration {
                    ty: VarType::Bool,
                    ident: "b".to_string(),
                    initializer: Expr::BoolLit(true),
                },
                Stmt::Declaration {
                    ty: VarType::String,
                    ident: "c".to_string(),
                    initializer: Expr::StringLit("lim".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_declarations_default_to_zero_value() {
        let program = program("int a\nbool b;string c\nint []d");
        assert_eq!(
            program.to_string(),
            "int a = 0\nbool b = false\nstring c = \"\"\nint []d = []"
        );
    }

    #[test]
    fn test_define_infers_type() {
        let program = program("a := 5\nb := \"s\"\nc := !true\nd := -1 + 2\ne := false");
        let types: Vec<VarType> = program
            .statements
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Declaration { ty, .. } => Some(*ty),
                _ => None,
            })
            .collect();
        assert_eq!(
            types,
            vec![
                VarType::Int,
                VarType::String,
                VarType::Bool,
                VarType::Int,
                VarType::Bool
            ]
        );
    }

    #[test]
    fn test_define_uninferable() {
        assert_eq!(
            errors("a := b"),
            vec!["cannot infer the type of `a` from identifier `b`"]
        );
        assert_eq!(
            errors("a := (1)"),
            vec!["cannot infer the type of `a` from `(`"]
        );
    }

    #[test]
    fn test_array_declaration_and_index() {
        let program = program("int []arr = [21, 22, 23]; arr[2]");
        assert_eq!(program.statements.len(), 2);
        assert_eq!(
            program.statements[1],
            Stmt::ExprStmt(Expr::Index {
                array: Box::new(ident("arr")),
                index: Box::new(Expr::IntegerLit(2)),
            })
        );
        assert_eq!(program.to_string(), "int []arr = [21, 22, 23]\n(arr[2])");
    }

    #[test]
    fn test_return() {
        let program = program("return; return 5\nreturn\n");
        assert_eq!(
            program.statements,
            vec![
                Stmt::Return(None),
                Stmt::Return(Some(Expr::IntegerLit(5))),
                Stmt::Return(None),
            ]
        );
    }

    #[test]
    fn test_if_chain() {
        let program = program("if false { 10 } else if true { 30 } else { 20 }");
        let if_stmt = match &program.statements[0] {
            Stmt::If(if_stmt) => if_stmt,
            stmt => panic!("expected if statement, got {:?}", stmt),
        };
        let conditions: Vec<Option<&Expr>> =
            if_stmt.cases().map(|case| case.condition.as_ref()).collect();
        assert_eq!(
            conditions,
            vec![Some(&Expr::BoolLit(false)), Some(&Expr::BoolLit(true)), None]
        );
        assert_eq!(
            program.to_string(),
            "if false {\n10\n} else if true {\n30\n} else {\n20\n}"
        );
    }

    #[test]
    fn test_if_over_multiple_lines() {
        let program = program("if x > 1 {\n  x\n}\nelse {\n  0\n}\nx");
        assert_eq!(program.statements.len(), 2);
        assert_eq!(
            program.to_string(),
            "if (x > 1) {\nx\n} else {\n0\n}\nx"
        );
    }

    #[test]
    fn test_function() {
        let program = program("fn add(int a, int b) int {\n  return a + b\n}\nadd(1, 2)");
        let decl = match &program.statements[0] {
            Stmt::Function(decl) => decl,
            stmt => panic!("expected function, got {:?}", stmt),
        };
        assert_eq!(decl.ident, "add");
        assert_eq!(
            decl.params,
            vec![
                Identifier::typed("a", VarType::Int),
                Identifier::typed("b", VarType::Int)
            ]
        );
        assert_eq!(decl.return_type, Some(VarType::Int));
        assert_eq!(decl.body.statements.len(), 1);
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_function_followed_on_same_line() {
        let program = program("fn id(string s) { s } id(\"x\");");
        assert_eq!(program.statements.len(), 2);
        assert_eq!(program.to_string(), "fn id(string s) {\ns\n}\nid(\"x\")");
    }

    #[test]
    fn test_newline_separates_statements() {
        let program = program("a\n-1");
        assert_eq!(
            program.statements,
            vec![
                Stmt::ExprStmt(ident("a")),
                Stmt::ExprStmt(Expr::Prefix {
                    op: TokenKind::Minus,
                    rhs: Box::new(Expr::IntegerLit(1)),
                }),
            ]
        );
    }

    #[test]
    fn test_comments() {
        let program = program("int a = 1 // one\n/* two\n */ int b = 2");
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_statement_errors() {
        assert_eq!(
            errors("int a = 1 int b = 2"),
            vec!["expected end of statement, found `int`"]
        );
        assert_eq!(
            errors("int a 5"),
            vec!["expected `=`, found integer literal `5`"]
        );
        assert_eq!(
            errors("int = 5"),
            vec!["expected identifier, found `=`"]
        );
        assert_eq!(
            errors("if x { 1 } else 2"),
            vec!["expected `if` or `{` after `else`, found integer literal `2`"]
        );
        assert_eq!(
            errors("fn f(a) {}"),
            vec!["expected parameter type, found identifier `a`"]
        );
        assert_eq!(
            errors("fn f() {\n  1"),
            vec!["expected `}` to close the block, found end of input"]
        );
    }

    #[test]
    fn test_recovers_after_error() {
        let source = "int a 5\nint b = 6\nbool c = )\nfn f() { 1 + }\nc".into();
        let program = Parser::new(&source).parse_program();
        let lines: Vec<usize> = source.diagnostics().iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 3, 4]);
        // `int b = 6`, `fn f() {}` and `c` survive
        assert_eq!(program.statements.len(), 3);
    }

    #[test]
    fn test_illegal_token_halts() {
        let source = "int a = 1\nint 9b = 2\nint c = )".into();
        Parser::new(&source).parse_program();
        let diagnostics = source.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.to_string(),
            "ERROR: an identifier cannot start with a number, found `9b` at line 2\nint 9b = 2\n----^"
        );
    }

    #[test]
    fn test_display_round_trip() {
        let sources = [
            "int a = 5 * (2 + 3)\nstring s\nok := !false",
            "int []arr = [1, 2, 3]; arr[0] + arr[1]",
            "fn fib(int n) int {\n  if n < 2 { return n }\n  return fib(n - 1) + fib(n - 2)\n}\nfib(10)",
            "if a { 1 } else if b || c { 2 } else { return }",
            "fn outer() { fn inner(bool x) bool { !x }\n inner }",
            "len(\"hello\") % 2 >= -1 && null == null",
        ];
        for text in sources.iter() {
            let parsed = program(text);
            let rendered = parsed.to_string();
            assert_eq!(program(&rendered), parsed, "{}", rendered);
        }
    }
}
