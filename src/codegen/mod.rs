mod go;

use std::path::PathBuf;

use crate::{ast::Program, token::Span};

/// Renders the program as source code for the given target language.
///
/// Generation is syntax-directed: no name resolution or type checking is
/// performed, so an ill-typed program produces output that the target's own
/// compiler will reject. The only error detected here is a type annotation
/// with no equivalent in the target.
pub fn generate(target: Target, program: &Program) -> Result<String, GenerationError> {
    match target {
        Target::Go => go::Generator::new().generate(program),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Go,
}

impl Target {
    pub const ALL: &[Target] = &[Target::Go];

    /// The name used to select this target on the command line.
    pub fn from_name(name: &str) -> Option<Target> {
        match name {
            "go" => Some(Target::Go),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Target::Go => "go",
        }
    }

    /// Extension of the generated source file.
    pub const fn file_extension(&self) -> &'static str {
        match self {
            Target::Go => "go",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("cannot translate type `{name}` to {target}")]
    UntranslatableType {
        name: String,
        target: Target,
        /// File and location of the offending type annotation.
        path: PathBuf,
        span: Span,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_name() {
        assert_eq!(Target::from_name("go"), Some(Target::Go));
        assert_eq!(Target::from_name("rust"), None);
        assert_eq!(Target::from_name("Go"), None);
        assert_eq!(Target::from_name(""), None);
    }

    #[test]
    fn test_all_targets_round_trip_their_names() {
        for &target in Target::ALL {
            assert_eq!(Target::from_name(target.name()), Some(target));
        }
    }
}
