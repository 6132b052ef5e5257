use std::{fs, path::Path, process::ExitCode};

use lithium::{
    codegen::Target,
    driver::{self, CompilationResult},
};

/// Directory scanned for source files, relative to the working directory.
const SOURCE_ROOT: &str = "./src";
/// Generated output lands in `OUTPUT_ROOT/<target>/source.<ext>`.
const OUTPUT_ROOT: &str = "./out";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

fn run(args: &[String]) -> Result<(), ()> {
    let Some(command) = args.get(1) else {
        eprintln!("error: please provide a command to execute");
        return Err(());
    };
    match command.as_str() {
        "build" => build(&args[2..]),
        other => {
            eprintln!("error: command not recognized: `{other}`");
            Err(())
        }
    }
}

fn build(args: &[String]) -> Result<(), ()> {
    build_at(Path::new(SOURCE_ROOT), Path::new(OUTPUT_ROOT), args)
}

/// A bad target is rejected before the driver runs, so it never creates or
/// overwrites anything under `output_root`.
fn build_at(source_root: &Path, output_root: &Path, args: &[String]) -> Result<(), ()> {
    let target = match parse_build_args(args) {
        Ok(target) => target,
        Err(message) => {
            eprintln!("error: {message}");
            return Err(());
        }
    };

    match driver::compile(source_root, target) {
        CompilationResult::Success(output) => write_output(output_root, target, &output),
        CompilationResult::Failure(diagnostics) => {
            for diagnostic in &diagnostics {
                eprintln!("{diagnostic}");
            }
            Err(())
        }
    }
}

/// The only supported form is `-t <target>`. The target name may carry
/// surrounding double quotes (a literal `-t "go"`, quotes and all), which
/// some invocations pass through unstripped.
fn parse_build_args(args: &[String]) -> Result<Target, String> {
    let (flag, name) = match args {
        [flag, name] => (flag.as_str(), name.as_str()),
        _ => return Err(usage(args)),
    };
    if flag != "-t" {
        return Err(usage(args));
    }
    let unquoted = name
        .strip_prefix('"')
        .and_then(|n| n.strip_suffix('"'))
        .unwrap_or(name);
    Target::from_name(unquoted).ok_or_else(|| usage(args))
}

fn usage(args: &[String]) -> String {
    let supported = Target::ALL
        .iter()
        .map(Target::name)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "the build command only supports `-t \"<target>\"` \
         (supported targets: {supported}); got: {args:?}"
    )
}

fn write_output(output_root: &Path, target: Target, output: &str) -> Result<(), ()> {
    let dir = output_root.join(target.name());
    let path = dir.join(format!("source.{}", target.file_extension()));
    let result = fs::create_dir_all(&dir).and_then(|()| fs::write(&path, output));
    match result {
        Ok(()) => {
            tracing::info!(path = %path.display(), "wrote output");
            Ok(())
        }
        Err(error) => {
            eprintln!("error: failed to write `{}`: {error}", path.display());
            Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_build_args_plain_target() {
        assert_eq!(parse_build_args(&args(&["-t", "go"])), Ok(Target::Go));
    }

    #[test]
    fn test_parse_build_args_quoted_target() {
        assert_eq!(parse_build_args(&args(&["-t", "\"go\""])), Ok(Target::Go));
    }

    #[test]
    fn test_parse_build_args_unknown_target() {
        let err = parse_build_args(&args(&["-t", "rust"])).unwrap_err();
        assert!(err.contains("supported targets: go"));
    }

    #[test]
    fn test_parse_build_args_unknown_flag() {
        assert!(parse_build_args(&args(&["-o", "go"])).is_err());
    }

    #[test]
    fn test_parse_build_args_wrong_arity() {
        assert!(parse_build_args(&args(&[])).is_err());
        assert!(parse_build_args(&args(&["-t"])).is_err());
        assert!(parse_build_args(&args(&["-t", "go", "extra"])).is_err());
    }

    #[test]
    fn test_parse_build_args_mismatched_quotes_are_not_stripped() {
        assert!(parse_build_args(&args(&["-t", "\"go"])).is_err());
        assert!(parse_build_args(&args(&["-t", "go\""])).is_err());
    }

    #[test]
    fn test_build_with_unknown_target_does_not_touch_the_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let source_root = dir.path().join("src");
        let output_root = dir.path().join("out");
        fs::create_dir(&source_root).unwrap();
        fs::write(source_root.join("main.li"), "fn main() { }").unwrap();

        assert!(build_at(&source_root, &output_root, &args(&["-t", "rust"])).is_err());
        assert!(!output_root.exists());
    }

    #[test]
    fn test_build_writes_generated_output() {
        let dir = tempfile::tempdir().unwrap();
        let source_root = dir.path().join("src");
        let output_root = dir.path().join("out");
        fs::create_dir(&source_root).unwrap();
        fs::write(source_root.join("main.li"), "fn main() { }").unwrap();

        assert!(build_at(&source_root, &output_root, &args(&["-t", "\"go\""])).is_ok());
        let generated = fs::read_to_string(output_root.join("go").join("source.go")).unwrap();
        assert!(generated.starts_with("// Code generated by lithiumc. DO NOT EDIT."));
        assert!(generated.contains("func main() {"));
    }
}
