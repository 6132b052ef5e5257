//! The compilation pipeline: discover sources, lex, parse, generate.
//!
//! Each stage runs to completion over every file before the next begins, so
//! a run reports all errors of the earliest failing stage instead of only
//! the first one. Later stages never see the output of a failed earlier
//! stage.

use std::path::{Path, PathBuf};

use crate::{
    ast::{Module, Program},
    codegen::{self, Target},
    lexer, loader,
    parser,
    source::{Diagnostic, SourceFile},
};

pub enum CompilationResult {
    /// The generated target source.
    Success(String),
    /// One or more diagnostics, in file order, then position order within
    /// each file.
    Failure(Vec<Diagnostic>),
}

pub fn compile(root: &Path, target: Target) -> CompilationResult {
    let files = match loader::read_source_files(root) {
        Ok(files) => files,
        Err(error) => {
            return CompilationResult::Failure(vec![discovery_diagnostic(root, &error)]);
        }
    };
    tracing::info!(files = files.len(), %target, "starting compilation");

    // Lexing. Error tokens become diagnostics; a file that fails to lex is
    // not worth parsing, so all lexical errors are reported in one batch.
    let mut diagnostics = Vec::new();
    let mut lexed = Vec::with_capacity(files.len());
    for file in &files {
        let tokens = lexer::lex_in_new(&file.contents);
        for token in &tokens {
            if let Some(message) = token.kind.error_message() {
                diagnostics.push(Diagnostic::error(
                    &file.path,
                    Some(file.position(token.span())),
                    message,
                ));
            }
        }
        lexed.push(tokens);
    }
    if !diagnostics.is_empty() {
        tracing::debug!(count = diagnostics.len(), "aborting after lexing");
        return CompilationResult::Failure(diagnostics);
    }

    // Parsing. Files are already sorted by path, so accumulated diagnostics
    // come out in file order.
    let mut modules = Vec::with_capacity(files.len());
    for (file, tokens) in files.iter().zip(&lexed) {
        match parser::parse_decls(&file.contents, tokens) {
            Ok(decls) => modules.push(Module {
                path: file.path.clone(),
                decls,
            }),
            Err((_, errors)) => {
                diagnostics.extend(errors.iter().map(|error| {
                    Diagnostic::error(
                        &file.path,
                        Some(file.position(error.span)),
                        error.inner.to_string(),
                    )
                }));
            }
        }
    }
    if !diagnostics.is_empty() {
        tracing::debug!(count = diagnostics.len(), "aborting after parsing");
        return CompilationResult::Failure(diagnostics);
    }

    // Code generation.
    let program = Program { modules };
    match codegen::generate(target, &program) {
        Ok(output) => {
            tracing::info!(bytes = output.len(), "generated output");
            CompilationResult::Success(output)
        }
        Err(error) => {
            let diagnostic = generation_diagnostic(&files, &error);
            CompilationResult::Failure(vec![diagnostic])
        }
    }
}

fn discovery_diagnostic(root: &Path, error: &loader::DiscoveryError) -> Diagnostic {
    use loader::DiscoveryError as E;
    let file = match error {
        E::RootNotFound { path } | E::Io { path, .. } | E::InvalidUtf8 { path } => {
            PathBuf::from(path)
        }
        E::Walk(_) => root.to_path_buf(),
    };
    Diagnostic::error(file, None, error.to_string())
}

fn generation_diagnostic(files: &[SourceFile], error: &codegen::GenerationError) -> Diagnostic {
    match error {
        codegen::GenerationError::UntranslatableType { path, span, .. } => {
            let position = files
                .iter()
                .find(|file| &file.path == path)
                .map(|file| file.position(*span));
            Diagnostic::error(path, position, error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::source::Position;

    fn compile_files(files: &[(&str, &str)]) -> CompilationResult {
        let dir = tempfile::tempdir().unwrap();
        for (path, contents) in files {
            let path = dir.path().join(path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, contents).unwrap();
        }
        compile(dir.path(), Target::Go)
    }

    #[track_caller]
    fn expect_success(result: &CompilationResult) -> &str {
        match result {
            CompilationResult::Success(output) => output,
            CompilationResult::Failure(diagnostics) => {
                panic!("expected success, got diagnostics: {diagnostics:?}")
            }
        }
    }

    #[track_caller]
    fn expect_failure(result: &CompilationResult) -> &[Diagnostic] {
        match result {
            CompilationResult::Success(_) => panic!("expected failure, got success"),
            CompilationResult::Failure(diagnostics) => diagnostics,
        }
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.li"), "fn b() { }").unwrap();
        fs::write(dir.path().join("a.li"), "fn a() { }").unwrap();

        let first = compile(dir.path(), Target::Go);
        let second = compile(dir.path(), Target::Go);
        let first = expect_success(&first);
        assert_eq!(first, expect_success(&second));

        // Output sections follow path order, not file system order.
        let a = first.find("// a.li").unwrap();
        let b = first.find("// b.li").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_empty_source_dir_yields_header_only_output() {
        let result = compile_files(&[]);
        let output = expect_success(&result);
        assert_eq!(
            output,
            "// Code generated by lithiumc. DO NOT EDIT.\n\npackage main\n"
        );
    }

    #[test]
    fn test_lex_errors_are_reported_with_positions() {
        let result = compile_files(&[("main.li", "let x = 1;\nlet $ = 2;\n")]);
        let diagnostics = expect_failure(&result);
        assert_eq!(
            diagnostics,
            &[Diagnostic::error(
                "main.li",
                Some(Position { line: 2, column: 5 }),
                "unexpected character",
            )]
        );
        assert_eq!(
            diagnostics[0].to_string(),
            "main.li:2:5: error: unexpected character"
        );
    }

    #[test]
    fn test_stray_nul_byte_is_a_lex_error_not_a_truncation() {
        let result = compile_files(&[("main.li", "let a = 1;\0let b = 2;")]);
        let diagnostics = expect_failure(&result);
        assert_eq!(
            diagnostics,
            &[Diagnostic::error(
                "main.li",
                Some(Position {
                    line: 1,
                    column: 11,
                }),
                "unexpected character",
            )]
        );
    }

    #[test]
    fn test_each_malformed_statement_gets_its_own_diagnostic() {
        let src = "fn main() {\n    let = 1;\n    let ok = 2;\n    let = 3;\n}\n";
        let result = compile_files(&[("main.li", src)]);
        let diagnostics = expect_failure(&result);
        assert_eq!(
            diagnostics,
            &[
                Diagnostic::error(
                    "main.li",
                    Some(Position { line: 2, column: 9 }),
                    "expected token Identifier, but got Eq",
                ),
                Diagnostic::error(
                    "main.li",
                    Some(Position { line: 4, column: 9 }),
                    "expected token Identifier, but got Eq",
                ),
            ]
        );
    }

    #[test]
    fn test_parse_diagnostics_follow_file_order() {
        let result = compile_files(&[
            ("z.li", "fn broken( { }"),
            ("a.li", "let = 1;"),
        ]);
        let diagnostics = expect_failure(&result);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].file, PathBuf::from("a.li"));
        assert_eq!(diagnostics[1].file, PathBuf::from("z.li"));
    }

    #[test]
    fn test_untranslatable_type_points_at_the_annotation() {
        let result = compile_files(&[("main.li", "fn f(x: float) { }")]);
        let diagnostics = expect_failure(&result);
        assert_eq!(
            diagnostics,
            &[Diagnostic::error(
                "main.li",
                Some(Position { line: 1, column: 9 }),
                "cannot translate type `float` to go",
            )]
        );
    }

    #[test]
    fn test_missing_source_root_is_a_discovery_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = compile(&missing, Target::Go);
        let diagnostics = expect_failure(&result);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("does not exist"));
        assert_eq!(diagnostics[0].position, None);
    }

    #[test]
    fn test_nested_directories_are_compiled() {
        let result = compile_files(&[
            ("main.li", "fn main() { }"),
            ("lib/util.li", "let answer = 42;"),
        ]);
        let output = expect_success(&result);
        assert!(output.contains("// lib/util.li"));
        assert!(output.contains("var answer = 42"));
        assert!(output.contains("func main() {"));
    }
}
