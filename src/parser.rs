//! Recursive-descent parser producing the expression AST.
//!
//! Precedence is encoded by the call structure, loosest binding first:
//!
//! ```text
//! expr    = mul ("+" mul | "-" mul)*
//! mul     = primary ("*" primary | "/" primary)*
//! primary = "(" expr ")" | num
//! ```
//!
//! Each loop folds to the left, so operators of equal precedence associate
//! left-to-right.

use std::fmt;

use crate::error::{CompileError, CompileResult, Expected};
use crate::tokenizer::{Token, TokenKind, describe_token};

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
}

impl BinaryOp {
  fn from_punct(c: char) -> Option<Self> {
    match c {
      '+' => Some(Self::Add),
      '-' => Some(Self::Sub),
      '*' => Some(Self::Mul),
      '/' => Some(Self::Div),
      _ => None,
    }
  }

  pub fn symbol(self) -> char {
    match self {
      Self::Add => '+',
      Self::Sub => '-',
      Self::Mul => '*',
      Self::Div => '/',
    }
  }
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
  Num {
    value: i64,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  /// Number of nodes in the tree, leaves included.
  pub fn node_count(&self) -> usize {
    match self {
      Self::Num { .. } => 1,
      Self::Binary { lhs, rhs, .. } => 1 + lhs.node_count() + rhs.node_count(),
    }
  }
}

/// Fully parenthesised rendering, handy for checking grouping in logs and tests.
impl fmt::Display for AstNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Num { value } => write!(f, "{value}"),
      Self::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
    }
  }
}

/// Deepest parenthesis nesting accepted. Each level costs three parser frames.
pub const MAX_NESTING: usize = 256;

/// Tallest tree accepted. Code generation walks the tree recursively.
pub const MAX_HEIGHT: usize = 4096;

/// A parsed node together with the height of its tree.
struct Subtree {
  node: AstNode,
  height: usize,
}

impl Subtree {
  fn leaf(value: i64) -> Self {
    Self {
      node: AstNode::number(value),
      height: 1,
    }
  }
}

/// Parse a complete expression; every token up to `Eof` must be consumed.
pub fn parse(tokens: &[Token], source: &str) -> CompileResult<AstNode> {
  let mut stream = TokenStream::new(tokens, source);

  let tree = parse_expr(&mut stream)?;

  if !stream.is_eof() {
    return Err(stream.error(Expected::EndOfInput));
  }

  log::debug!(
    "parsed {} nodes, height {}: {}",
    tree.node.node_count(),
    tree.height,
    tree.node
  );
  Ok(tree.node)
}

fn parse_expr(stream: &mut TokenStream) -> CompileResult<Subtree> {
  let mut tree = parse_mul(stream)?;

  while let Some(op) = stream.consume_op(&[BinaryOp::Add, BinaryOp::Sub]) {
    let op_loc = stream.prev_loc();
    let rhs = parse_mul(stream)?;
    tree = stream.fold(op, op_loc, tree, rhs)?;
  }

  Ok(tree)
}

fn parse_mul(stream: &mut TokenStream) -> CompileResult<Subtree> {
  let mut tree = parse_primary(stream)?;

  while let Some(op) = stream.consume_op(&[BinaryOp::Mul, BinaryOp::Div]) {
    let op_loc = stream.prev_loc();
    let rhs = parse_primary(stream)?;
    tree = stream.fold(op, op_loc, tree, rhs)?;
  }

  Ok(tree)
}

fn parse_primary(stream: &mut TokenStream) -> CompileResult<Subtree> {
  if stream.equal('(') {
    stream.enter()?;
    let tree = parse_expr(stream)?;
    stream.skip(')')?;
    stream.depth -= 1;
    return Ok(tree);
  }

  let value = stream.get_number()?;
  Ok(Subtree::leaf(value))
}

/// Forward-only cursor over the token slice.
struct TokenStream<'a> {
  tokens: &'a [Token],
  source: &'a str,
  pos: usize,
  /// Open parentheses around the cursor.
  depth: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: &'a [Token], source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
      depth: 0,
    }
  }

  fn peek(&self) -> Option<&'a Token> {
    self.tokens.get(self.pos)
  }

  /// Consume the current token if it is the punctuator `op`.
  fn equal(&mut self, op: char) -> bool {
    if let Some(token) = self.peek()
      && token.is_punct(op)
    {
      self.pos += 1;
      return true;
    }
    false
  }

  /// Consume the current token if it spells one of `ops`.
  fn consume_op(&mut self, ops: &[BinaryOp]) -> Option<BinaryOp> {
    let Some(TokenKind::Punct(c)) = self.peek().map(|token| token.kind) else {
      return None;
    };
    let op = BinaryOp::from_punct(c).filter(|op| ops.contains(op))?;
    self.pos += 1;
    Some(op)
  }

  fn skip(&mut self, op: char) -> CompileResult<()> {
    if self.equal(op) {
      Ok(())
    } else {
      Err(self.error(Expected::Punct(op)))
    }
  }

  fn get_number(&mut self) -> CompileResult<i64> {
    if let Some(token) = self.peek()
      && let TokenKind::Num(value) = token.kind
    {
      self.pos += 1;
      return Ok(value);
    }
    Err(self.error(Expected::Number))
  }

  /// Offset of the token consumed last.
  fn prev_loc(&self) -> usize {
    self
      .pos
      .checked_sub(1)
      .and_then(|i| self.tokens.get(i))
      .map_or(0, |token| token.loc)
  }

  /// Account for the `(` just consumed.
  fn enter(&mut self) -> CompileResult<()> {
    self.depth += 1;
    if self.depth > MAX_NESTING {
      return Err(CompileError::too_deep(
        self.source,
        self.prev_loc(),
        MAX_NESTING,
      ));
    }
    Ok(())
  }

  /// Combine `lhs op rhs`, refusing trees taller than `MAX_HEIGHT`.
  fn fold(
    &self,
    op: BinaryOp,
    op_loc: usize,
    lhs: Subtree,
    rhs: Subtree,
  ) -> CompileResult<Subtree> {
    let height = 1 + lhs.height.max(rhs.height);
    if height > MAX_HEIGHT {
      return Err(CompileError::too_deep(self.source, op_loc, MAX_HEIGHT));
    }
    Ok(Subtree {
      node: AstNode::binary(op, lhs.node, rhs.node),
      height,
    })
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof))
  }

  /// Build a parse error anchored at the current token.
  fn error(&self, expected: Expected) -> CompileError {
    let token = self.peek();
    let loc = token.map_or(self.source.len(), |token| token.loc);
    CompileError::parse(
      self.source,
      loc,
      expected,
      describe_token(token, self.source),
    )
  }
}
