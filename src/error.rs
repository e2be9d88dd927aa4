//! Shared error types used across the compilation pipeline.
//!
//! Diagnostics follow the chibicc style: the offending expression is echoed
//! in quotes and a caret points at the byte that tripped the front-end.

use std::fmt;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// A byte offset into the source, captured together with the rendered
/// caret marker so the error can be displayed without the input at hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
  pub offset: usize,
  expr_line: String,
  marker: String,
}

impl Location {
  /// Anchor a location at byte offset `loc` of `expr`.
  pub fn new(expr: &str, loc: usize) -> Self {
    let expr_line = format!("'{expr}'");
    let safe_loc = loc.min(expr.len());
    let char_offset = expr[..safe_loc].chars().count() + 1; // account for opening quote
    let marker = format!("{}^", " ".repeat(char_offset));
    Self {
      offset: loc,
      expr_line,
      marker,
    }
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}\n{}", self.expr_line, self.marker)
  }
}

/// The construct a grammar rule required at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
  Number,
  Punct(char),
  EndOfInput,
}

impl fmt::Display for Expected {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expected::Number => f.write_str("a number"),
      Expected::Punct(c) => write!(f, "\"{c}\""),
      Expected::EndOfInput => f.write_str("end of input"),
    }
  }
}

#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("{at} invalid token: '{ch}'"))]
  Lex { at: Location, ch: char },

  #[snafu(display("{at} integer literal {literal} does not fit in 64 bits"))]
  IntegerOverflow { at: Location, literal: String },

  #[snafu(display("{at} expected {expected}, but got \"{found}\""))]
  Parse {
    at: Location,
    expected: Expected,
    found: String,
  },

  #[snafu(display("{at} expression nests deeper than {limit} levels"))]
  TooDeep { at: Location, limit: usize },
}

impl CompileError {
  pub fn lex(expr: &str, loc: usize, ch: char) -> Self {
    Self::Lex {
      at: Location::new(expr, loc),
      ch,
    }
  }

  pub fn parse(expr: &str, loc: usize, expected: Expected, found: impl Into<String>) -> Self {
    Self::Parse {
      at: Location::new(expr, loc),
      expected,
      found: found.into(),
    }
  }

  pub fn too_deep(expr: &str, loc: usize, limit: usize) -> Self {
    Self::TooDeep {
      at: Location::new(expr, loc),
      limit,
    }
  }

  /// Byte offset in the source the error is anchored at.
  pub fn offset(&self) -> usize {
    match self {
      Self::Lex { at, .. }
      | Self::IntegerOverflow { at, .. }
      | Self::Parse { at, .. }
      | Self::TooDeep { at, .. } => at.offset,
    }
  }
}
