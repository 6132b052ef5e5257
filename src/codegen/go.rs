use std::{
    borrow::Cow,
    fmt::Write,
    format_args as f,
    path::{Path, PathBuf},
};

use crate::{
    ast::{
        BinaryOperator, Block, Decl, Expr, ExprKind, Function, Module, Program, Stmt, StmtKind,
        TypeName, UnaryOperator,
    },
    codegen::{GenerationError, Target},
};

/// Emitted at the top of every output, so even an empty program produces a
/// valid (and clearly machine-generated) Go file.
pub(super) const HEADER: &str = "// Code generated by lithiumc. DO NOT EDIT.\n\npackage main\n";

pub(super) struct Generator {
    buf: String,
    indent: usize,
}

impl Generator {
    pub(super) fn new() -> Generator {
        Generator {
            buf: String::with_capacity(4 * 1024),
            indent: 0,
        }
    }

    pub(super) fn generate(mut self, program: &Program) -> Result<String, GenerationError> {
        self.buf.push_str(HEADER);
        for module in &program.modules {
            self.g_module(module)?;
        }
        Ok(self.buf)
    }

    fn g_module(&mut self, module: &Module) -> Result<(), GenerationError> {
        self.blank();
        self.out(f!("// {}", module.path.display()));
        for decl in &module.decls {
            self.blank();
            self.g_decl(decl, &module.path)?;
        }
        Ok(())
    }

    fn g_decl(&mut self, decl: &Decl, path: &Path) -> Result<(), GenerationError> {
        match decl {
            Decl::Function(function) => self.g_function(function, path),
            // Top-level bindings cannot use Go's short declaration form.
            Decl::Global(binding) => {
                let name = mangle(&binding.name.name);
                let value = Self::expr(&binding.value);
                match binding.ty {
                    Some(ref ty) => {
                        self.out(f!("var {name} {} = {value}", go_type(ty, path)?));
                    }
                    None => self.out(f!("var {name} = {value}")),
                }
                Ok(())
            }
        }
    }

    fn g_function(&mut self, function: &Function, path: &Path) -> Result<(), GenerationError> {
        let mut signature = format!("func {}(", mangle(&function.name.name));
        for (idx, param) in function.params.iter().enumerate() {
            if idx > 0 {
                signature.push_str(", ");
            }
            let ty = go_type(&param.ty, path)?;
            write!(signature, "{} {ty}", mangle(&param.name.name)).unwrap();
        }
        signature.push(')');
        if let Some(ref return_ty) = function.return_ty {
            write!(signature, " {}", go_type(return_ty, path)?).unwrap();
        }

        self.out(f!("{signature} {{"));
        self.indented(|g| g.g_stmts(&function.body.stmts, path))?;
        self.out(f!("}}"));
        Ok(())
    }

    fn g_stmts(&mut self, stmts: &[Stmt], path: &Path) -> Result<(), GenerationError> {
        for stmt in stmts {
            self.g_stmt(stmt, path)?;
        }
        Ok(())
    }

    fn g_stmt(&mut self, stmt: &Stmt, path: &Path) -> Result<(), GenerationError> {
        match &stmt.kind {
            StmtKind::Let(binding) => {
                let name = mangle(&binding.name.name);
                let value = Self::expr(&binding.value);
                match binding.ty {
                    Some(ref ty) => {
                        self.out(f!("var {name} {} = {value}", go_type(ty, path)?));
                    }
                    None => self.out(f!("{name} := {value}")),
                }
            }
            StmtKind::Assignment { target, value } => {
                self.out(f!("{} = {}", mangle(&target.name), Self::expr(value)));
            }
            StmtKind::If {
                predicate,
                then_arm,
                else_arm,
            } => {
                self.g_if(predicate, then_arm, else_arm.as_deref(), path)?;
            }
            // Go spells the while loop `for`.
            StmtKind::While { predicate, body } => {
                self.out(f!("for {} {{", Self::expr(predicate)));
                self.indented(|g| g.g_stmts(&body.stmts, path))?;
                self.out(f!("}}"));
            }
            StmtKind::Return { value } => match value {
                Some(value) => self.out(f!("return {}", Self::expr(value))),
                None => self.out(f!("return")),
            },
            StmtKind::Expr(expr) => {
                let expr = Self::expr(expr);
                self.out(f!("{expr}"));
            }
            StmtKind::Block(block) => {
                self.out(f!("{{"));
                self.indented(|g| g.g_stmts(&block.stmts, path))?;
                self.out(f!("}}"));
            }
        }
        Ok(())
    }

    fn g_if(
        &mut self,
        predicate: &Expr,
        then_arm: &Block,
        else_arm: Option<&Stmt>,
        path: &Path,
    ) -> Result<(), GenerationError> {
        self.out(f!("if {} {{", Self::expr(predicate)));
        self.indented(|g| g.g_stmts(&then_arm.stmts, path))?;

        // Flatten the `else if` chain into Go's, instead of nesting blocks.
        let mut else_arm = else_arm;
        loop {
            match else_arm {
                None => {
                    self.out(f!("}}"));
                    break;
                }
                Some(arm) => match &arm.kind {
                    StmtKind::If {
                        predicate,
                        then_arm,
                        else_arm: next,
                    } => {
                        self.out(f!("}} else if {} {{", Self::expr(predicate)));
                        self.indented(|g| g.g_stmts(&then_arm.stmts, path))?;
                        else_arm = next.as_deref();
                    }
                    StmtKind::Block(block) => {
                        self.out(f!("}} else {{"));
                        self.indented(|g| g.g_stmts(&block.stmts, path))?;
                        self.out(f!("}}"));
                        break;
                    }
                    _ => unreachable!("else arm is always another `if` or a block"),
                },
            }
        }
        Ok(())
    }

    fn expr(e: &Expr) -> String {
        match &e.kind {
            ExprKind::Call { callee, args } => {
                let args = args.iter().map(Self::expr).collect::<Vec<_>>().join(", ");
                format!("{}({args})", mangle(&callee.name))
            }
            ExprKind::Unary { op, expr } => {
                let op = match op {
                    UnaryOperator::Not => "!",
                    UnaryOperator::Neg => "-",
                };
                format!("{op}{}", Self::unary_operand(expr))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                format!(
                    "{} {} {}",
                    Self::operand(lhs),
                    go_op(*op),
                    Self::operand(rhs)
                )
            }
            ExprKind::Paren(inner) => format!("({})", Self::expr(inner)),
            ExprKind::Id(ident) => mangle(&ident.name).into_owned(),
            ExprKind::Int(val) => val.to_string(),
            ExprKind::String(val) => go_string(val),
            ExprKind::Bool(val) => val.to_string(),
            ExprKind::Dummy => unreachable!("dummy expressions never survive an error-free parse"),
        }
    }

    /// Like [`Generator::expr`], but parenthesizes nested binary operators.
    ///
    /// The two languages do not rank operators identically (Go puts `==` and
    /// `<` on the same precedence level), so nested operands keep explicit
    /// parentheses rather than relying on Go to reconstruct the same tree.
    fn operand(e: &Expr) -> String {
        match &e.kind {
            ExprKind::Binary { .. } => format!("({})", Self::expr(e)),
            _ => Self::expr(e),
        }
    }

    /// Like [`Generator::operand`], for the operand of a unary operator.
    ///
    /// A nested negation must not render adjacent to the outer `-`: Go
    /// tokenizes `--` as its decrement operator.
    fn unary_operand(e: &Expr) -> String {
        match &e.kind {
            ExprKind::Unary { .. } | ExprKind::Binary { .. } => format!("({})", Self::expr(e)),
            _ => Self::expr(e),
        }
    }

    fn out(&mut self, args: std::fmt::Arguments) {
        for _ in 0..self.indent {
            self.buf.push('\t');
        }
        self.buf.write_fmt(args).unwrap();
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn indented<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent += 1;
        let result = f(self);
        self.indent -= 1;
        result
    }
}

fn go_type(ty: &TypeName, path: &Path) -> Result<&'static str, GenerationError> {
    match ty.name() {
        "int" => Ok("int64"),
        "string" => Ok("string"),
        "bool" => Ok("bool"),
        other => Err(GenerationError::UntranslatableType {
            name: other.to_string(),
            target: Target::Go,
            path: PathBuf::from(path),
            span: ty.span(),
        }),
    }
}

fn go_op(op: BinaryOperator) -> &'static str {
    use BinaryOperator as Op;
    match op {
        Op::Or => "||",
        Op::And => "&&",
        Op::Eq => "==",
        Op::Neq => "!=",
        Op::Lt => "<",
        Op::Leq => "<=",
        Op::Gt => ">",
        Op::Geq => ">=",
        Op::Add => "+",
        Op::Sub => "-",
        Op::Mul => "*",
        Op::Div => "/",
        Op::Rem => "%",
    }
}

/// Go's reserved words. Identifiers are shared between the languages
/// otherwise, so only these need renaming.
static GO_RESERVED: phf::Set<&'static str> = phf::phf_set! {
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface",
    "map", "package", "range", "return", "select", "struct", "switch",
    "type", "var",
};

fn mangle(name: &str) -> Cow<'_, str> {
    if GO_RESERVED.contains(name) {
        Cow::Owned(format!("{name}_"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Renders a (already unescaped) string value as a Go string literal.
fn go_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => write!(out, "\\x{:02x}", c as u32).unwrap(),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        ast::{Module, Program},
        codegen::{generate, GenerationError, Target},
        lexer, parser,
        token::Span,
    };

    fn gen_files(files: &[(&str, &str)]) -> Result<String, GenerationError> {
        let modules = files
            .iter()
            .map(|&(path, src)| {
                let tokens = lexer::lex_in_new(src);
                let decls = parser::parse_decls(src, &tokens).expect("test input must parse");
                Module {
                    path: path.into(),
                    decls,
                }
            })
            .collect();
        generate(Target::Go, &Program { modules })
    }

    fn gen(src: &str) -> Result<String, GenerationError> {
        gen_files(&[("main.li", src)])
    }

    #[track_caller]
    fn assert_gen_lines(src: &str, expected: &[&str]) {
        let actual = gen(src).unwrap();
        assert_eq!(actual.lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_empty_program_emits_header_only() {
        let out = generate(Target::Go, &Program::default()).unwrap();
        assert_eq!(out, HEADER);
        assert_eq!(out, "// Code generated by lithiumc. DO NOT EDIT.\n\npackage main\n");
    }

    #[test]
    fn test_full_program() {
        let src = "\
            let limit: int = 10;\n\
            fn add(a: int, b: int) -> int {\n\
                return a + b;\n\
            }\n\
            fn main() {\n\
                let x: int = 0;\n\
                while x < limit {\n\
                    if x % 2 == 0 {\n\
                        print(add(x, 1));\n\
                    } else {\n\
                        print(x);\n\
                    }\n\
                    x = x + 1;\n\
                }\n\
            }\n";
        assert_gen_lines(
            src,
            &[
                "// Code generated by lithiumc. DO NOT EDIT.",
                "",
                "package main",
                "",
                "// main.li",
                "",
                "var limit int64 = 10",
                "",
                "func add(a int64, b int64) int64 {",
                "\treturn a + b",
                "}",
                "",
                "func main() {",
                "\tvar x int64 = 0",
                "\tfor x < limit {",
                "\t\tif (x % 2) == 0 {",
                "\t\t\tprint(add(x, 1))",
                "\t\t} else {",
                "\t\t\tprint(x)",
                "\t\t}",
                "\t\tx = x + 1",
                "\t}",
                "}",
            ],
        );
    }

    #[test]
    fn test_else_if_chain_is_flattened() {
        let src = "fn f(a: int) { if a < 0 { s(1); } else if a == 0 { s(2); } else { s(3); } }";
        assert_gen_lines(
            src,
            &[
                "// Code generated by lithiumc. DO NOT EDIT.",
                "",
                "package main",
                "",
                "// main.li",
                "",
                "func f(a int64) {",
                "\tif a < 0 {",
                "\t\ts(1)",
                "\t} else if a == 0 {",
                "\t\ts(2)",
                "\t} else {",
                "\t\ts(3)",
                "\t}",
                "}",
            ],
        );
    }

    #[test]
    fn test_untyped_let_uses_short_declaration() {
        let src = "fn f() { let x = 1; x = x * 2; }";
        assert_gen_lines(
            src,
            &[
                "// Code generated by lithiumc. DO NOT EDIT.",
                "",
                "package main",
                "",
                "// main.li",
                "",
                "func f() {",
                "\tx := 1",
                "\tx = x * 2",
                "}",
            ],
        );
    }

    #[test]
    fn test_reserved_word_identifiers_are_mangled() {
        let src = "fn go(range: int) { package(range); }";
        assert_gen_lines(
            src,
            &[
                "// Code generated by lithiumc. DO NOT EDIT.",
                "",
                "package main",
                "",
                "// main.li",
                "",
                "func go_(range_ int64) {",
                "\tpackage_(range_)",
                "}",
            ],
        );
    }

    #[test]
    fn test_string_literals_are_re_escaped() {
        let src = "let s = \"quote \\\" and tab\\there\\n\";";
        assert_gen_lines(
            src,
            &[
                "// Code generated by lithiumc. DO NOT EDIT.",
                "",
                "package main",
                "",
                "// main.li",
                "",
                "var s = \"quote \\\" and tab\\there\\n\"",
            ],
        );
    }

    #[test]
    fn test_nested_binary_operands_keep_parens() {
        let src = "let v = a == b < c;";
        assert_gen_lines(
            src,
            &[
                "// Code generated by lithiumc. DO NOT EDIT.",
                "",
                "package main",
                "",
                "// main.li",
                "",
                "var v = a == (b < c)",
            ],
        );
    }

    #[test]
    fn test_nested_unary_operands_keep_parens() {
        let src = "let x = - -1; let y = !!b;";
        assert_gen_lines(
            src,
            &[
                "// Code generated by lithiumc. DO NOT EDIT.",
                "",
                "package main",
                "",
                "// main.li",
                "",
                "var x = -(-1)",
                "",
                "var y = !(!b)",
            ],
        );
    }

    #[test]
    fn test_modules_are_emitted_in_order_with_section_comments() {
        let out = gen_files(&[
            ("a.li", "let a = 1;"),
            ("b.li", "let b = 2;"),
        ])
        .unwrap();
        assert_eq!(
            out.lines().collect::<Vec<_>>(),
            &[
                "// Code generated by lithiumc. DO NOT EDIT.",
                "",
                "package main",
                "",
                "// a.li",
                "",
                "var a = 1",
                "",
                "// b.li",
                "",
                "var b = 2",
            ],
        );
    }

    #[test]
    fn test_untranslatable_type_is_an_error() {
        let err = gen("fn f(x: float) { }").unwrap_err();
        assert_eq!(
            err,
            GenerationError::UntranslatableType {
                name: "float".into(),
                target: Target::Go,
                path: "main.li".into(),
                span: Span::new_of_bounds(8..13),
            }
        );
        assert_eq!(err.to_string(), "cannot translate type `float` to go");
    }
}
