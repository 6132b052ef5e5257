/// Source file discovery: finds and reads the `.li` files of a project.
pub mod loader;

/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The code generators take an AST, mapping it into target language source.
pub mod codegen;

/// The driver runs the whole pipeline over a project directory.
pub mod driver;

pub mod ast;
pub mod source;
pub mod token;

pub mod util {
    pub mod fmt;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
