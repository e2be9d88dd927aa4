//! Code generation: lower the parsed AST into x86-64 assembly.
//!
//! The emitter is a simple stack machine: every expression leaves a single
//! value on the stack, binary operators pop their operands into `%rdi` (rhs)
//! and `%rax` (lhs) and push the result back. Instructions are kept typed
//! until the very end so the same routine can be printed in either dialect
//! or executed by [`crate::vm`].

use std::fmt::Write as _;

use clap::ValueEnum;

use crate::parser::{AstNode, BinaryOp};

/// Assembler dialect used when rendering a routine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Syntax {
  #[default]
  Intel,
  Att,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
  Rax,
  Rdi,
  Rdx,
}

impl Reg {
  fn name(self) -> &'static str {
    match self {
      Reg::Rax => "rax",
      Reg::Rdi => "rdi",
      Reg::Rdx => "rdx",
    }
  }
}

/// The subset of x86-64 the stack machine needs. Two-operand forms read
/// as Intel order: `Add(dst, src)` is `dst += src`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inst {
  /// Push a sign-extended 32-bit immediate.
  PushImm(i32),
  /// Load a full 64-bit immediate.
  MovImm(Reg, i64),
  Push(Reg),
  Pop(Reg),
  Add(Reg, Reg),
  Sub(Reg, Reg),
  Imul(Reg, Reg),
  /// Sign-extend `rax` into `rdx:rax`.
  Cqo,
  /// Signed divide `rdx:rax`; quotient to `rax`, remainder to `rdx`.
  Idiv(Reg),
  Ret,
}

impl Inst {
  /// Render a single instruction without indentation.
  pub fn render(&self, syntax: Syntax) -> String {
    match syntax {
      Syntax::Intel => match *self {
        Inst::PushImm(value) => format!("push {value}"),
        Inst::MovImm(reg, value) => format!("mov {}, {value}", reg.name()),
        Inst::Push(reg) => format!("push {}", reg.name()),
        Inst::Pop(reg) => format!("pop {}", reg.name()),
        Inst::Add(dst, src) => format!("add {}, {}", dst.name(), src.name()),
        Inst::Sub(dst, src) => format!("sub {}, {}", dst.name(), src.name()),
        Inst::Imul(dst, src) => format!("imul {}, {}", dst.name(), src.name()),
        Inst::Cqo => "cqo".to_string(),
        Inst::Idiv(reg) => format!("idiv {}", reg.name()),
        Inst::Ret => "ret".to_string(),
      },
      Syntax::Att => match *self {
        Inst::PushImm(value) => format!("push ${value}"),
        Inst::MovImm(reg, value) => format!("movabs ${value}, %{}", reg.name()),
        Inst::Push(reg) => format!("push %{}", reg.name()),
        Inst::Pop(reg) => format!("pop %{}", reg.name()),
        Inst::Add(dst, src) => format!("add %{}, %{}", src.name(), dst.name()),
        Inst::Sub(dst, src) => format!("sub %{}, %{}", src.name(), dst.name()),
        Inst::Imul(dst, src) => format!("imul %{}, %{}", src.name(), dst.name()),
        Inst::Cqo => "cqo".to_string(),
        Inst::Idiv(reg) => format!("idiv %{}", reg.name()),
        Inst::Ret => "ret".to_string(),
      },
    }
  }
}

/// Emit the stack-machine body for an expression. Running it leaves exactly
/// one value, the expression's result, on the stack.
pub fn generate(node: &AstNode) -> Vec<Inst> {
  let mut code = Vec::new();
  emit_expr(node, &mut code);
  log::debug!(
    "generated {} instructions for {} nodes",
    code.len(),
    node.node_count()
  );
  code
}

/// Post-order walk: lhs first, then rhs, then the operator itself.
fn emit_expr(node: &AstNode, code: &mut Vec<Inst>) {
  match node {
    AstNode::Num { value } => match i32::try_from(*value) {
      Ok(imm) => code.push(Inst::PushImm(imm)),
      // x86-64 has no push with a 64-bit immediate.
      Err(_) => {
        code.push(Inst::MovImm(Reg::Rax, *value));
        code.push(Inst::Push(Reg::Rax));
      }
    },
    AstNode::Binary { op, lhs, rhs } => {
      emit_expr(lhs, code);
      emit_expr(rhs, code);
      code.push(Inst::Pop(Reg::Rdi));
      code.push(Inst::Pop(Reg::Rax));
      match op {
        BinaryOp::Add => code.push(Inst::Add(Reg::Rax, Reg::Rdi)),
        BinaryOp::Sub => code.push(Inst::Sub(Reg::Rax, Reg::Rdi)),
        BinaryOp::Mul => code.push(Inst::Imul(Reg::Rax, Reg::Rdi)),
        BinaryOp::Div => {
          code.push(Inst::Cqo);
          code.push(Inst::Idiv(Reg::Rdi));
        }
      }
      code.push(Inst::Push(Reg::Rax));
    }
  }
}

/// A complete callable routine: entry label, expression body and the
/// epilogue returning the top of the stack in `rax`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
  entry: String,
  body: Vec<Inst>,
}

impl Routine {
  pub fn new(entry: impl Into<String>, body: Vec<Inst>) -> Self {
    Self {
      entry: entry.into(),
      body,
    }
  }

  /// Body followed by `pop rax; ret`.
  pub fn instructions(&self) -> Vec<Inst> {
    let mut insts = self.body.clone();
    insts.push(Inst::Pop(Reg::Rax));
    insts.push(Inst::Ret);
    insts
  }

  /// Print the routine as a standalone assembly file.
  pub fn render(&self, syntax: Syntax) -> String {
    let mut asm = String::new();
    match syntax {
      Syntax::Intel => asm.push_str(".intel_syntax noprefix\n"),
      Syntax::Att => asm.push_str(".att_syntax prefix\n"),
    }
    let _ = writeln!(asm, ".globl {}", self.entry);
    let _ = writeln!(asm, "{}:", self.entry);
    for inst in self.instructions() {
      let _ = writeln!(asm, "    {}", inst.render(syntax));
    }
    asm
  }
}
