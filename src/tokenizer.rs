//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer knows nothing about precedence or grouping; it only
//! classifies single-character operators and decimal literals.

use crate::error::{CompileError, CompileResult, Location};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  /// One of `+ - * / ( )`.
  Punct(char),
  Num(i64),
  Eof,
}

/// A classified lexeme plus the byte span that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize, len: usize) -> Self {
    Self { kind, loc, len }
  }

  /// True when this token is the punctuator `op`.
  pub fn is_punct(&self, op: char) -> bool {
    self.kind == TokenKind::Punct(op)
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    // C `isspace` also counts vertical tab, which `is_ascii_whitespace` skips.
    if c.is_ascii_whitespace() || c == 0x0b {
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let text = &input[start..i];
      let value = text
        .parse::<i64>()
        .map_err(|_| CompileError::IntegerOverflow {
          at: Location::new(input, start),
          literal: text.to_string(),
        })?;
      tokens.push(Token::new(TokenKind::Num(value), start, i - start));
      continue;
    }

    if matches!(c, b'+' | b'-' | b'*' | b'/' | b'(' | b')') {
      tokens.push(Token::new(TokenKind::Punct(char::from(c)), i, 1));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::lex(input, i, invalid_char));
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0));
  log::debug!("tokenized {} bytes into {} tokens", input.len(), tokens.len());
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input)
      .unwrap()
      .into_iter()
      .map(|token| token.kind)
      .collect()
  }

  #[test]
  fn empty_input_is_just_eof() {
    let tokens = tokenize("").unwrap();
    assert_eq!(tokens, vec![Token::new(TokenKind::Eof, 0, 0)]);
  }

  #[test]
  fn whitespace_only_input_is_just_eof() {
    let tokens = tokenize(" \t \n").unwrap();
    assert_eq!(tokens, vec![Token::new(TokenKind::Eof, 4, 0)]);
  }

  #[test]
  fn vertical_tab_is_whitespace() {
    assert_eq!(kinds("1\x0b+\x0b2"), kinds("1+2"));
  }

  #[test]
  fn operators_and_parens() {
    assert_eq!(
      kinds("+-*/()"),
      vec![
        TokenKind::Punct('+'),
        TokenKind::Punct('-'),
        TokenKind::Punct('*'),
        TokenKind::Punct('/'),
        TokenKind::Punct('('),
        TokenKind::Punct(')'),
        TokenKind::Eof,
      ]
    );
  }

  #[test]
  fn numbers_take_the_longest_digit_run() {
    let tokens = tokenize(" 12+345 ").unwrap();
    assert_eq!(
      tokens,
      vec![
        Token::new(TokenKind::Num(12), 1, 2),
        Token::new(TokenKind::Punct('+'), 3, 1),
        Token::new(TokenKind::Num(345), 4, 3),
        Token::new(TokenKind::Eof, 8, 0),
      ]
    );
  }

  #[test]
  fn whitespace_does_not_change_the_stream() {
    assert_eq!(kinds("1 + 2"), kinds("1+2"));
  }

  #[test]
  fn leading_zeros_are_decimal() {
    assert_eq!(kinds("007"), vec![TokenKind::Num(7), TokenKind::Eof]);
  }

  #[test]
  fn unknown_character_reports_its_offset() {
    let err = tokenize("1&2").unwrap_err();
    assert!(matches!(err, CompileError::Lex { ch: '&', .. }));
    assert_eq!(err.offset(), 1);
  }

  #[test]
  fn non_ascii_character_is_rejected_whole() {
    let err = tokenize("1+é").unwrap_err();
    assert!(matches!(err, CompileError::Lex { ch: 'é', .. }));
    assert_eq!(err.offset(), 2);
  }

  #[test]
  fn literal_wider_than_i64_fails() {
    assert_eq!(
      kinds("9223372036854775807"),
      vec![TokenKind::Num(i64::MAX), TokenKind::Eof]
    );
    let err = tokenize("1+9223372036854775808").unwrap_err();
    assert!(matches!(
      &err,
      CompileError::IntegerOverflow { literal, .. } if literal == "9223372036854775808"
    ));
    assert_eq!(err.offset(), 2);
  }

  #[test]
  fn describe_uses_source_text() {
    let source = "42 )";
    let tokens = tokenize(source).unwrap();
    assert_eq!(describe_token(tokens.first(), source), "42");
    assert_eq!(describe_token(tokens.get(1), source), ")");
    assert_eq!(describe_token(tokens.last(), source), "EOF");
    assert_eq!(describe_token(None, source), "EOF");
  }
}
