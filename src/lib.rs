//! Crate root: wires together the compilation pipeline.
//!
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns the expression AST.
//! - `codegen` lowers the AST into a stack-machine routine and prints it.
//! - `vm` executes a generated routine without an assembler.
//! - `error` centralises reporting utilities shared by the other modules.

pub mod codegen;
pub mod error;
pub mod parser;
pub mod tokenizer;
pub mod vm;

pub use codegen::{Routine, Syntax};
pub use error::{CompileError, CompileResult, Expected};

/// Knobs for how a routine is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
  pub syntax: Syntax,
  /// Symbol name of the generated routine.
  pub entry: String,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      syntax: Syntax::Intel,
      entry: "main".to_string(),
    }
  }
}

/// Run the front-end and code generator, returning the routine unrendered.
pub fn compile(expr: &str, entry: &str) -> CompileResult<Routine> {
  let tokens = tokenizer::tokenize(expr)?;
  let ast = parser::parse(&tokens, expr)?;
  Ok(Routine::new(entry, codegen::generate(&ast)))
}

/// Compile a source string into assembly text.
pub fn generate_assembly(expr: &str, options: &Options) -> CompileResult<String> {
  let routine = compile(expr, &options.entry)?;
  Ok(routine.render(options.syntax))
}
