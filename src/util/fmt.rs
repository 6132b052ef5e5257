//! Plain-text tree printer for the syntax tree, used by the parser tests to
//! assert on the exact shape (and spans) of what was parsed.

use std::io::Write;

use crate::ast::*;

const INDENT_WIDTH: usize = 2;

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

pub fn print_decls_string(decls: &[Decl]) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_decls(&mut buf, decls).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_expr_string(expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_expr(&mut buf, 0, expr).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_decls(w: &mut impl Write, decls: &[Decl]) -> std::io::Result<()> {
    for decl in decls {
        print_decl(w, 0, decl)?;
    }
    Ok(())
}

fn print_decl(w: &mut impl Write, i: usize, decl: &Decl) -> std::io::Result<()> {
    match decl {
        Decl::Function(function) => print_function(w, i, function),
        Decl::Global(binding) => {
            sp(w, i)?;
            write!(w, "global {}", binding.name)?;
            if let Some(ref ty) = binding.ty {
                write!(w, ": {ty}")?;
            }
            writeln!(w, " ({})", binding.span)?;
            print_expr(w, i + 1, &binding.value)
        }
    }
}

fn print_function(w: &mut impl Write, i: usize, function: &Function) -> std::io::Result<()> {
    sp(w, i)?;
    write!(w, "fn {}(", function.name)?;
    for (idx, param) in function.params.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{}: {}", param.name, param.ty)?;
    }
    write!(w, ")")?;
    if let Some(ref return_ty) = function.return_ty {
        write!(w, " -> {return_ty}")?;
    }
    writeln!(w, " ({})", function.span)?;
    print_block(w, i + 1, &function.body)
}

fn print_block(w: &mut impl Write, i: usize, block: &Block) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "block ({})", block.span)?;
    for stmt in &block.stmts {
        print_stmt(w, i + 1, stmt)?;
    }
    Ok(())
}

fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt) -> std::io::Result<()> {
    let span = stmt.span;
    match &stmt.kind {
        StmtKind::Let(binding) => {
            sp(w, i)?;
            write!(w, "let {}", binding.name)?;
            if let Some(ref ty) = binding.ty {
                write!(w, ": {ty}")?;
            }
            writeln!(w, " ({span})")?;
            print_expr(w, i + 1, &binding.value)?;
        }
        StmtKind::Assignment { target, value } => {
            sp(w, i)?;
            writeln!(w, "assignment {target} ({span})")?;
            print_expr(w, i + 1, value)?;
        }
        StmtKind::If {
            predicate,
            then_arm,
            else_arm,
        } => {
            sp(w, i)?;
            writeln!(w, "if ({span})")?;
            print_expr(w, i + 1, predicate)?;
            print_block(w, i + 1, then_arm)?;
            if let Some(ref arm) = else_arm {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_stmt(w, i + 2, arm)?;
            }
        }
        StmtKind::While { predicate, body } => {
            sp(w, i)?;
            writeln!(w, "while ({span})")?;
            print_expr(w, i + 1, predicate)?;
            print_block(w, i + 1, body)?;
        }
        StmtKind::Return { value } => {
            sp(w, i)?;
            writeln!(w, "return ({span})")?;
            if let Some(ref value) = value {
                print_expr(w, i + 1, value)?;
            }
        }
        StmtKind::Expr(expr) => {
            print_expr(w, i, expr)?;
        }
        StmtKind::Block(block) => {
            print_block(w, i, block)?;
        }
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    let span = expr.span;
    match &expr.kind {
        ExprKind::Call { callee, args } => {
            writeln!(w, "call {callee} ({span})")?;
            // Just list arguments indented
            for arg in args {
                print_expr(w, i + 1, arg)?;
            }
        }
        ExprKind::Unary {
            op,
            expr: inner_expr,
        } => {
            writeln!(w, "unary {op:?} ({span})")?;
            print_expr(w, i + 1, inner_expr)?;
        }
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} ({span})")?;
            print_expr(w, i + 1, lhs)?;
            print_expr(w, i + 1, rhs)?;
        }
        ExprKind::Paren(inner_expr) => {
            writeln!(w, "paren ({span})")?;
            print_expr(w, i + 1, inner_expr)?;
        }
        ExprKind::Id(ident) => {
            writeln!(w, "ident {ident} ({span})")?;
        }
        ExprKind::Int(val) => {
            writeln!(w, "int {val} ({span})")?;
        }
        ExprKind::String(val) => {
            writeln!(w, "string {val:?} ({span})")?;
        }
        ExprKind::Bool(val) => {
            writeln!(w, "bool {val} ({span})")?;
        }
        ExprKind::Dummy => {
            writeln!(w, "dummy ({span})")?;
        }
    }
    Ok(())
}
