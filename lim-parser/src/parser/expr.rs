use super::*;
use crate::ast::Identifier;

impl<'a> Parser<'a> {
    fn prefix_rule(kind: TokenKind) -> Option<PrefixParseFn<'a>> {
        let rule: PrefixParseFn<'a> = match kind {
            TokenKind::Ident => Self::parse_identifier,
            TokenKind::Int => Self::parse_integer_lit,
            TokenKind::True | TokenKind::False => Self::parse_bool_lit,
            TokenKind::Str => Self::parse_string_lit,
            TokenKind::Null => Self::parse_null_lit,
            TokenKind::Bang | TokenKind::Minus => Self::parse_prefix_expr,
            TokenKind::LParen => Self::parse_grouped_expr,
            TokenKind::LBracket => Self::parse_array_lit,
            _ => return None,
        };
        Some(rule)
    }

    fn infix_rule(kind: TokenKind) -> Option<InfixParseFn<'a>> {
        let rule: InfixParseFn<'a> = match kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::And
            | TokenKind::Or => Self::parse_infix_expr,
            TokenKind::LParen => Self::parse_call_expr,
            TokenKind::LBracket => Self::parse_index_expr,
            _ => return None,
        };
        Some(rule)
    }

    /// Parses an expression starting at the current token.
    /// On success, the current token is the last token of the expression.
    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_expr_precedence(Precedence::Lowest)
    }

    /// Pratt loop: keeps folding infix operators while they bind tighter than `precedence`.
    fn parse_expr_precedence(&mut self, precedence: Precedence) -> Option<Expr> {
        let prefix = match Self::prefix_rule(self.current().kind) {
            Some(rule) => rule,
            None => {
                self.unexpected_current("an expression");
                return None;
            }
        };
        let mut lhs = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon)
            && !self.peek_breaks_expr()
            && precedence < self.peek_precedence()
        {
            let infix = match Self::infix_rule(self.peek().kind) {
                Some(rule) => rule,
                None => return Some(lhs),
            };
            self.next();
            lhs = infix(self, lhs)?;
        }

        Some(lhs)
    }

    fn parse_identifier(&mut self) -> Option<Expr> {
        Some(Expr::Identifier(Identifier::new(&self.current().literal)))
    }

    fn parse_integer_lit(&mut self) -> Option<Expr> {
        let literal = self.current().literal.clone();
        match literal.parse::<i64>() {
            Ok(val) => Some(Expr::IntegerLit(val)),
            Err(_) => {
                let token = self.current().clone();
                self.error_at(&token, format!("could not parse `{}` as integer", literal));
                None
            }
        }
    }

    fn parse_bool_lit(&mut self) -> Option<Expr> {
        Some(Expr::BoolLit(self.current_is(TokenKind::True)))
    }

    fn parse_string_lit(&mut self) -> Option<Expr> {
        Some(Expr::StringLit(self.current().literal.clone()))
    }

    fn parse_null_lit(&mut self) -> Option<Expr> {
        Some(Expr::NullLit)
    }

    fn parse_prefix_expr(&mut self) -> Option<Expr> {
        let op = self.current().kind;
        self.next();
        let rhs = self.parse_expr_precedence(Precedence::Prefix)?;
        Some(Expr::Prefix {
            op,
            rhs: Box::new(rhs),
        })
    }

    fn parse_grouped_expr(&mut self) -> Option<Expr> {
        self.in_group(|parser| {
            parser.next();
            let expr = parser.parse_expr()?;
            parser.expect_peek(TokenKind::RParen)?;
            Some(expr)
        })
    }

    fn parse_array_lit(&mut self) -> Option<Expr> {
        let elements = self.in_group(|parser| parser.parse_expr_list(TokenKind::RBracket))?;
        Some(Expr::ArrayLit(elements))
    }

    /// Binary operators are left associative: the right operand binds at the operator's own
    /// precedence.
    fn parse_infix_expr(&mut self, lhs: Expr) -> Option<Expr> {
        let op = self.current().kind;
        let precedence = op.precedence();
        self.next();
        let rhs = self.parse_expr_precedence(precedence)?;
        Some(Expr::Infix {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        })
    }

    fn parse_call_expr(&mut self, function: Expr) -> Option<Expr> {
        let args = self.in_group(|parser| parser.parse_expr_list(TokenKind::RParen))?;
        Some(Expr::Call {
            function: Box::new(function),
            args,
        })
    }

    fn parse_index_expr(&mut self, array: Expr) -> Option<Expr> {
        let index = self.in_group(|parser| {
            parser.next();
            let index = parser.parse_expr()?;
            parser.expect_peek(TokenKind::RBracket)?;
            Some(index)
        })?;
        Some(Expr::Index {
            array: Box::new(array),
            index: Box::new(index),
        })
    }

    /// Parses comma separated expressions up to `end`. The current token is the opening delimiter.
    fn parse_expr_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next();
            return Some(list);
        }

        self.next();
        list.push(self.parse_expr()?);
        while self.peek_is(TokenKind::Comma) {
            self.next();
            self.next();
            list.push(self.parse_expr()?);
        }
        self.expect_peek(end)?;

        Some(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn expr(source: &str) -> String {
        let source = source.into();
        let ast = Parser::new(&source).parse_expr();
        assert!(source.has_no_errors(), "{}", source.diagnostics());
        ast.map(|expr| expr.to_string()).unwrap_or_default()
    }

    fn expr_errors(source: &str) -> Vec<String> {
        let source = source.into();
        let ast = Parser::new(&source).parse_expr();
        assert!(ast.is_none());
        source
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.message.clone())
            .collect()
    }

    #[test]
    fn test_literals() {
        assert_snapshot!(expr("5"), @"5");
        assert_snapshot!(expr("true"), @"true");
        assert_snapshot!(expr("null"), @"null");
        assert_snapshot!(expr("foobar"), @"foobar");
        assert_snapshot!(expr("\"hello world\""), @r#""hello world""#);
        assert_snapshot!(expr("[1, 2 * 2, \"3\"]"), @r#"[1, (2 * 2), "3"]"#);
        assert_snapshot!(expr("[]"), @"[]");
    }

    #[test]
    fn test_prefix() {
        assert_snapshot!(expr("-a * b"), @"((-a) * b)");
        assert_snapshot!(expr("!-a"), @"(!(-a))");
        assert_snapshot!(expr("-(5 + 5)"), @"(-(5 + 5))");
        assert_snapshot!(expr("!(true == true)"), @"(!(true == true))");
    }

    #[test]
    fn test_precedence() {
        assert_snapshot!(expr("1 + 2 * 3"), @"(1 + (2 * 3))");
        assert_snapshot!(expr("a + b - c"), @"((a + b) - c)");
        assert_snapshot!(expr("a * b / c % d"), @"(((a * b) / c) % d)");
        assert_snapshot!(expr("a + b * c + d / e - f"), @"(((a + (b * c)) + (d / e)) - f)");
        assert_snapshot!(expr("5 > 4 == 3 < 4"), @"((5 > 4) == (3 < 4))");
        assert_snapshot!(expr("5 >= 4 != 3 <= 4"), @"((5 >= 4) != (3 <= 4))");
        assert_snapshot!(expr("3 + 4 * 5 == 3 * 1 + 4 * 5"), @"((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))");
        assert_snapshot!(expr("1 + (2 + 3) + 4"), @"((1 + (2 + 3)) + 4)");
        assert_snapshot!(expr("a || b && c == d"), @"(a || (b && (c == d)))");
        assert_snapshot!(expr("a && b || c"), @"((a && b) || c)");
    }

    #[test]
    fn test_call_and_index() {
        assert_snapshot!(expr("add(1, 2 * 3, 4 + 5)"), @"add(1, (2 * 3), (4 + 5))");
        assert_snapshot!(expr("a + add(b * c) + d"), @"((a + add((b * c))) + d)");
        assert_snapshot!(expr("add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))"), @"add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))");
        assert_snapshot!(expr("noArgs()"), @"noArgs()");
        assert_snapshot!(expr("make(2)(3)"), @"make(2)(3)");
        assert_snapshot!(expr("a * [1, 2, 3, 4][b * c] * d"), @"((a * ([1, 2, 3, 4][(b * c)])) * d)");
        assert_snapshot!(expr("add(a * b[2], b[1], 2 * [1, 2][1])"), @"add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))");
    }

    #[test]
    fn test_newlines_inside_groups() {
        assert_snapshot!(expr("(1 +\n 2)"), @"(1 + 2)");
        assert_snapshot!(expr("add(1,\n 2\n)"), @"add(1, 2)");
        assert_snapshot!(expr("[\n1,\n2\n]"), @"[1, 2]");
    }

    #[test]
    fn test_newline_ends_expr() {
        assert_snapshot!(expr("1 + 2\n* 3"), @"(1 + 2)");
        assert_snapshot!(expr("a\n[0]"), @"a");
    }

    #[test]
    fn test_errors() {
        assert_eq!(expr_errors(")"), vec!["expected an expression, found `)`"]);
        assert_eq!(
            expr_errors("99999999999999999999"),
            vec!["could not parse `99999999999999999999` as integer"]
        );
        assert_eq!(
            expr_errors("(1 + 2"),
            vec!["expected `)`, found end of input"]
        );
        assert_eq!(
            expr_errors("add(1 2)"),
            vec!["expected `)`, found integer literal `2`"]
        );
        assert_eq!(
            expr_errors("arr[1"),
            vec!["expected `]`, found end of input"]
        );
    }
}
