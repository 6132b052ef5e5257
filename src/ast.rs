// module ::= decl*
// decl ::= fn_decl | let_decl
// fn_decl ::= fn ID '(' [param (',' param)*] ')' ['->' TYPE] block
// param ::= ID ':' TYPE
// let_decl ::= let ID [':' TYPE] '=' expr ';'
// block ::= '{' stmt* '}'
// stmt ::= let_decl
//        | if expr block [else (if_stmt | block)]
//        | while expr block
//        | return [expr] ';'
//        | block
//        | expr ['=' expr] ';'
// expr ::= expr '||' expr
//        | expr '&&' expr
//        | expr ('==' | '!=') expr
//        | expr ('<' | '<=' | '>' | '>=') expr
//        | expr ('+' | '-') expr
//        | expr ('*' | '/' | '%') expr
//        | ('!' | '-') expr
//        | ID '(' [expr (',' expr)*] ')'
//        | '(' expr ')'
//        | ID
//        | integer
//        | string
//        | true
//        | false

// Precedence (loosest to tightest)
//
// ||
// &&
// == !=
// < <= > >=
// + -
// * / %
// ! - (unary)
// call

use std::{fmt, path::PathBuf};

use crate::token::Span;

/// The whole compilation unit: one module per source file, in the
/// deterministic file order imposed by the driver.
#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub modules: Vec<Module>,
}

#[derive(Debug, PartialEq)]
pub struct Module {
    /// Path of the originating source file, relative to the project root.
    pub path: PathBuf,
    pub decls: Vec<Decl>,
}

#[derive(Debug, PartialEq)]
pub enum Decl {
    Function(Function),
    /// A module-level `let`.
    Global(Binding),
}

#[derive(Debug, PartialEq)]
pub struct Function {
    pub name: Ident,
    pub params: Vec<Param>,
    /// Absent for functions that return nothing.
    pub return_ty: Option<TypeName>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeName,
}

#[derive(Debug, PartialEq)]
pub struct Binding {
    pub name: Ident,
    pub ty: Option<TypeName>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    Let(Binding),
    Assignment {
        target: Ident,
        value: Expr,
    },
    If {
        predicate: Expr,
        then_arm: Block,
        /// Either another `If` statement (an `else if` chain) or a `Block`
        /// statement. The parser guarantees no other kind appears here.
        else_arm: Option<Box<Stmt>>,
    },
    While {
        predicate: Expr,
        body: Block,
    },
    Return {
        value: Option<Expr>,
    },
    Expr(Expr),
    Block(Block),
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn dummy(span: Span) -> Expr {
        Expr {
            kind: ExprKind::Dummy,
            span,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Call {
        callee: Ident,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Paren(Box<Expr>),
    Id(Ident),
    Int(i64),
    String(Box<str>),
    Bool(bool),
    Dummy,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Neg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, PartialEq)]
pub struct TypeName(pub Ident);

impl TypeName {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn span(&self) -> Span {
        self.0.span
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, PartialEq)]
pub struct Ident {
    pub name: Box<str>,
    pub span: Span,
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
