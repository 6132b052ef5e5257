use crate::{
    ast::{
        Binding, Block, Decl, Expr, ExprKind, Function, Ident, Param, Stmt, StmtKind, TypeName,
        UnaryOperator,
    },
    lexer::extract,
    token::{Span, Spanned, Token, TokenKind},
};

type Result<T, E = ()> = std::result::Result<T, E>;

pub type ParseResult<T> = Result<T, (T, Vec<Spanned<Error>>)>;

/// Parses the declarations of a single source file.
///
/// The tokens must have been produced by lexing `src`. Each file is an
/// independent top-level unit; the driver assembles the per-file results
/// into the whole program.
pub fn parse_decls(src: &str, tokens: &[Token]) -> ParseResult<Vec<Decl>> {
    parse(src, tokens, Parser::parse_decls, Vec::new)
}

pub fn parse_expr(src: &str, tokens: &[Token]) -> ParseResult<Expr> {
    let default = || Expr::dummy(Span::new_of_length(src.len(), 0));
    parse(src, tokens, Parser::parse_expr, default)
}

fn parse<'src, 'tok, T>(
    src: &'src str,
    tokens: &'tok [Token],
    f: impl for<'a> FnOnce(&'a mut Parser<'src, 'tok>) -> Result<T>,
    default: impl FnOnce() -> T,
) -> ParseResult<T> {
    let mut p = Parser::new(src, tokens);
    let parse_result = f(&mut p);

    // Error handling
    let success = parse_result.is_ok();
    let el = parse_result.unwrap_or_else(|()| default());
    if p.errors.is_empty() {
        assert!(success);
        Ok(el)
    } else {
        Err((el, p.errors))
    }
}

struct Parser<'src, 'tok> {
    src: &'src str,
    tokens: &'tok [Token],
    cursor: usize,
    errors: Vec<Spanned<Error>>,
}

impl Parser<'_, '_> {
    fn parse_decls(&mut self) -> Result<Vec<Decl>> {
        let mut decls = Vec::with_capacity(4);
        while self.except([]) {
            if let Ok(parsed) =
                self.synchronize(&[], &[TokenKind::Fn, TokenKind::Let], Parser::parse_decl)
            {
                decls.push(parsed);
            }
        }
        self.consume(TokenKind::Eof)?;
        // An empty file is a legal (empty) module.
        Ok(decls)
    }

    fn parse_decl(&mut self) -> Result<Decl> {
        let c = self.peek();
        match c.kind {
            TokenKind::Fn => self.parse_function().map(Decl::Function),
            TokenKind::Let => self.parse_let_binding().map(Decl::Global),
            actual => {
                self.error(c.span().wrap(Error::ExpectedDecl { actual }));
                Err(())
            }
        }
    }

    fn parse_function(&mut self) -> Result<Function> {
        let start = self.consume(TokenKind::Fn)?;
        let name = self.parse_ident()?;

        self.consume(TokenKind::LParen)?;
        let params = self.parse_list(TokenKind::RParen, TokenKind::Comma, |p| p.parse_param())?;
        self.consume(TokenKind::RParen)?;

        let return_ty = if self.take(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block()?;
        let span = start.span().to(body.span);
        Ok(Function {
            name,
            params,
            return_ty,
            body,
            span,
        })
    }

    fn parse_param(&mut self) -> Result<Param> {
        let name = self.parse_ident()?;
        self.consume(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        Ok(Param { name, ty })
    }

    /// Parses `let ID [: TYPE] = expr ;`, which serves both as a module-level
    /// declaration and as a statement.
    fn parse_let_binding(&mut self) -> Result<Binding> {
        let start = self.consume(TokenKind::Let)?;
        let name = self.parse_ident()?;

        let ty = if self.take(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        self.consume(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        let end = self.consume(TokenKind::Semicolon)?;

        let span = start.span().to(end.span());
        Ok(Binding {
            name,
            ty,
            value,
            span,
        })
    }

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.consume(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while self.except([TokenKind::RBrace]) {
            // A statement that fails to parse must not take the rest of the
            // block with it: skip to the next statement terminator and
            // resume, so every malformed statement gets its own diagnostic.
            if let Ok(stmt) = self.synchronize(
                &[TokenKind::Semicolon],
                &[TokenKind::RBrace],
                Parser::parse_stmt,
            ) {
                stmts.push(stmt);
            }
        }
        let end = self.consume(TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: start.span().to(end.span()),
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let c = self.peek();
        match c.kind {
            TokenKind::Let => {
                let binding = self.parse_let_binding()?;
                let span = binding.span;
                Ok(Stmt {
                    kind: StmtKind::Let(binding),
                    span,
                })
            }
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => {
                let start = self.advance();
                let predicate = self.parse_expr()?;
                let body = self.parse_block()?;
                let span = start.span().to(body.span);
                Ok(Stmt {
                    kind: StmtKind::While { predicate, body },
                    span,
                })
            }
            TokenKind::Return => {
                let start = self.advance();
                let value = if self.is(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = self.consume(TokenKind::Semicolon)?;
                let span = start.span().to(end.span());
                Ok(Stmt {
                    kind: StmtKind::Return { value },
                    span,
                })
            }
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Stmt {
                    kind: StmtKind::Block(block),
                    span,
                })
            }
            _ => self.parse_expr_or_assignment_stmt(),
        }
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt> {
        let start = self.consume(TokenKind::If)?;
        let predicate = self.parse_expr()?;
        let then_arm = self.parse_block()?;

        let (else_arm, end_span) = if self.take(TokenKind::Else) {
            // `else if` chains nest as another `If` statement.
            let arm = if self.is(TokenKind::If) {
                self.parse_if_stmt()?
            } else {
                let block = self.parse_block()?;
                let span = block.span;
                Stmt {
                    kind: StmtKind::Block(block),
                    span,
                }
            };
            let span = arm.span;
            (Some(Box::new(arm)), span)
        } else {
            (None, then_arm.span)
        };

        let span = start.span().to(end_span);
        Ok(Stmt {
            kind: StmtKind::If {
                predicate,
                then_arm,
                else_arm,
            },
            span,
        })
    }

    /// Distinguishing an assignment from an expression statement requires
    /// one token of lookahead past the expression: a `=` turns it into an
    /// assignment, whose target must be a plain identifier.
    fn parse_expr_or_assignment_stmt(&mut self) -> Result<Stmt> {
        let expr = self.parse_expr()?;

        if self.take(TokenKind::Eq) {
            let ExprKind::Id(target) = expr.kind else {
                self.error(expr.span.wrap(Error::InvalidAssignmentTarget));
                return Err(());
            };
            let value = self.parse_expr()?;
            let end = self.consume(TokenKind::Semicolon)?;
            let span = target.span.to(end.span());
            return Ok(Stmt {
                kind: StmtKind::Assignment { target, value },
                span,
            });
        }

        let end = self.consume(TokenKind::Semicolon)?;
        let span = expr.span.to(end.span());
        Ok(Stmt {
            kind: StmtKind::Expr(expr),
            span,
        })
    }

    fn parse_type(&mut self) -> Result<TypeName> {
        self.parse_ident().map(TypeName)
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Ident {
            name: extract::ident(token, self.src),
            span: token.span(),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let lhs_token = self.advance();
        let mut lhs = self.parse_nud(lhs_token)?;

        loop {
            let op_token = self.peek();

            if let Some((lbp, rbp)) = Self::infix_binding_power(op_token.kind) {
                if lbp < min_bp {
                    // Operator binds less tightly than the minimum required
                    break;
                }

                self.advance(); // Operator
                lhs = self.parse_led(op_token, lhs, rbp)?;
            } else {
                // Not an infix operator or binds too loosely
                break;
            }
        }

        Ok(lhs)
    }

    /// nud: Parses tokens that start an expression
    /// (prefix operators, literals, grouping)
    fn parse_nud(&mut self, token: Token) -> Result<Expr> {
        let (kind, span) = match token.kind {
            TokenKind::Identifier => {
                let ident = Ident {
                    name: extract::ident(token, self.src),
                    span: token.span(),
                };
                (ExprKind::Id(ident), token.span())
            }
            TokenKind::Number => {
                let Ok(parsed) = extract::int(token, self.src) else {
                    self.error(token.span().wrap(Error::ParseInt));
                    return Err(());
                };
                (ExprKind::Int(parsed), token.span())
            }
            TokenKind::String => (
                ExprKind::String(extract::string(token, self.src)),
                token.span(),
            ),
            TokenKind::EscapedString => (
                ExprKind::String(extract::escaped_string(token, self.src)),
                token.span(),
            ),
            TokenKind::True => (ExprKind::Bool(true), token.span()),
            TokenKind::False => (ExprKind::Bool(false), token.span()),

            // Grouping: ( expr )
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                let end = self.consume(TokenKind::RParen)?;
                (ExprKind::Paren(Box::new(expr)), token.span().to(end.span()))
            }

            // Prefix operators: !, -
            kind @ (TokenKind::Bang | TokenKind::Minus) => {
                let op = match kind {
                    TokenKind::Bang => UnaryOperator::Not,
                    TokenKind::Minus => UnaryOperator::Neg,
                    _ => unreachable!(),
                };
                // SAFETY: Should have prefix due to above match
                let ((), rbp) = Self::prefix_binding_power(kind).unwrap();

                let expr = self.parse_expr_bp(rbp)?;

                let span = token.span().to(expr.span);
                let unary = ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                };
                (unary, span)
            }

            other => {
                let error = Error::UnexpectedTokenInExpr { token: other };
                self.error(token.span().wrap(error));
                return Err(());
            }
        };

        Ok(Expr { kind, span })
    }

    /// led: Parses tokens that follow a left-hand-side expression
    /// (infix operators and calls)
    fn parse_led(&mut self, op_token: Token, lhs: Expr, rbp: u8) -> Result<Expr> {
        use crate::ast::BinaryOperator as Op;

        let (kind, span) = match op_token.kind {
            kind @ (TokenKind::OrOr
            | TokenKind::AndAnd
            | TokenKind::EqEq
            | TokenKind::BangEq
            | TokenKind::Less
            | TokenKind::LessEq
            | TokenKind::Greater
            | TokenKind::GreaterEq
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent) => {
                let op = match kind {
                    TokenKind::OrOr => Op::Or,
                    TokenKind::AndAnd => Op::And,
                    TokenKind::EqEq => Op::Eq,
                    TokenKind::BangEq => Op::Neq,
                    TokenKind::Less => Op::Lt,
                    TokenKind::LessEq => Op::Leq,
                    TokenKind::Greater => Op::Gt,
                    TokenKind::GreaterEq => Op::Geq,
                    TokenKind::Plus => Op::Add,
                    TokenKind::Minus => Op::Sub,
                    TokenKind::Star => Op::Mul,
                    TokenKind::Slash => Op::Div,
                    TokenKind::Percent => Op::Rem,
                    _ => unreachable!(),
                };
                // Parse right operand with correct precedence
                let rhs = self.parse_expr_bp(rbp)?;

                let span = lhs.span.to(rhs.span);
                let binary = ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                (binary, span)
            }

            // Call: ID ( [expr [, expr]*] )
            TokenKind::LParen => {
                // Ensure the lhs was just a simple ID parsed by nud
                let ExprKind::Id(callee) = lhs.kind else {
                    self.error(lhs.span.wrap(Error::InvalidCallTarget));
                    return Err(());
                };

                // LParen was already consumed above.
                let args =
                    self.parse_list(TokenKind::RParen, TokenKind::Comma, |p| p.parse_expr())?;
                let end = self.consume(TokenKind::RParen)?;

                let call = ExprKind::Call { callee, args };
                (call, lhs.span.to(end.span()))
            }

            // `parse_led` is only entered for kinds with an infix binding
            // power, all of which are matched above.
            other => unreachable!("token kind {other:?} has no infix handling"),
        };

        Ok(Expr { kind, span })
    }

    /// Parses `item (delim item)*` until `end_delim` is found. Does **NOT**
    /// consume the end delimiter.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        separator: TokenKind,
        parse_item: impl Fn(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug_assert_ne!(end_delim, separator);

        let mut items = Vec::new();
        while self.except([end_delim]) {
            let item = self.synchronize(&[separator], &[end_delim], |p| parse_item(p))?;
            items.push(item);

            // After consuming an item, we must consume the separator.
            if !self.take(separator) {
                if self.is(end_delim) {
                    // If, however, it is not present, then we check if the end
                    // delimiter is current. If so, we can stop.
                    break;
                }
                // However, if the current token is not the separator nor
                // the end delimiter, we must return an error.
                let c = self.peek();
                self.error(c.span().wrap(Error::UnexpectedAny {
                    actual: c.kind,
                    expected: Box::from([separator, end_delim]),
                }));
            }
        }

        let next = self.peek();
        assert!(next.kind == end_delim || next.kind == TokenKind::Eof);
        Ok(items)
    }

    fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
        let bp = match kind {
            // Level 7: Logical or (left-associative)
            TokenKind::OrOr => (1, 2),

            // Level 6: Logical and (left-associative)
            TokenKind::AndAnd => (3, 4),

            // Level 5: Equality (left-associative)
            TokenKind::EqEq | TokenKind::BangEq => (5, 6),

            // Level 4: Comparisons (left-associative)
            TokenKind::Less | TokenKind::LessEq | TokenKind::Greater | TokenKind::GreaterEq => {
                (7, 8)
            }

            // Level 3: Addition/Subtraction (left-associative)
            TokenKind::Plus | TokenKind::Minus => (9, 10),

            // Level 2: Multiplication/Division/Remainder (left-associative)
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (11, 12),

            // Level 1: Function call
            TokenKind::LParen => (15, 16),

            _ => return None,
        };
        Some(bp)
    }

    // Prefix operators:
    fn prefix_binding_power(kind: TokenKind) -> Option<((), u8)> {
        let bp = match kind {
            // Unary negation binds tighter than any binary operator but
            // looser than a call, so `-f(1)` negates the call result.
            TokenKind::Bang | TokenKind::Minus => ((), 13),

            // Other tokens are not prefix operators handled by binding power
            // (Literals, IDs, ( are handled directly in nud)
            _ => return None,
        };
        Some(bp)
    }
}

impl Parser<'_, '_> {
    pub fn new<'src, 'tok>(src: &'src str, tokens: &'tok [Token]) -> Parser<'src, 'tok> {
        let mut p = Parser {
            src,
            tokens,
            cursor: 0,
            errors: Vec::with_capacity(8),
        };
        p.setup();
        p
    }

    /// Adds an error.
    fn error(&mut self, error: Spanned<Error>) {
        self.errors.push(error);
    }

    /// Setups the parser, skipping any trivia if necessary.
    fn setup(&mut self) {
        while self.peek().kind.is_trivia() {
            self.cursor += 1;
        }
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        match self.tokens.get(self.cursor) {
            Some(token) => *token,
            None => Token::eof_for(self.src),
        }
    }

    /// Returns the current token and advances. Skips any trivia.
    fn advance(&mut self) -> Token {
        let c = self.peek(); // Before any advancement
        while {
            self.cursor += 1;
            self.peek().kind.is_trivia()
        } {}
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, records an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        let c = self.peek();
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            self.error(c.span().wrap(Error::Unexpected {
                actual: c.kind,
                expected: expect,
            }));
            Err(())
        }
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&mut self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek();
        for e in except {
            if c.kind == e {
                return false;
            }
        }
        if c.kind == TokenKind::Eof {
            return false;
        }
        true
    }

    /// Panic-mode recovery: retries `f` after skipping to a token in
    /// `cont_cond`, or gives up upon reaching one in `stop_cond` (or the end
    /// of the file).
    fn synchronize<T>(
        &mut self,
        cont_cond: &[TokenKind],
        stop_cond: &[TokenKind],
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<T> {
        'outer: loop {
            if let Ok(val) = f(self) {
                break Ok(val);
            }
            // In the case of an error, try to advance until find a token
            // specified in `cont_cond` (in which case we retry) or in
            // `stop_cond` (in which case we stop).
            loop {
                let c = self.peek().kind;
                // Check whether must stop
                if c == TokenKind::Eof || stop_cond.contains(&c) {
                    break 'outer Err(());
                }
                // The token advancement must be AFTER stopping. If we break
                // out, the caller should advance (to follow the convention).
                self.advance();
                // Check whether can retry
                if cont_cond.contains(&c) {
                    continue 'outer;
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("invalid call target")]
    InvalidCallTarget,
    #[error("unexpected token {token:?} in expression")]
    UnexpectedTokenInExpr { token: TokenKind },
    #[error("expected token {expected:?}, but got {actual:?}")]
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    #[error("expected one of {expected:?}, but got {actual:?}")]
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    #[error("expected a declaration, but got {actual:?}")]
    ExpectedDecl { actual: TokenKind },
    #[error("parse int error, out of bounds")]
    ParseInt,
}
