//! Interpreter for generated routines.
//!
//! Models the handful of x86-64 semantics the emitter relies on: 64-bit
//! wrapping arithmetic, `cqo` sign extension and `idiv` over `rdx:rax`.
//! Conditions that would fault on hardware are reported as errors.

use snafu::Snafu;

use crate::codegen::{Inst, Reg};

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ExecError {
  #[snafu(display("division by zero at instruction {pc}"))]
  DivisionByZero { pc: usize },

  #[snafu(display("quotient does not fit in 64 bits at instruction {pc}"))]
  DivisionOverflow { pc: usize },

  #[snafu(display("pop from empty stack at instruction {pc}"))]
  StackUnderflow { pc: usize },

  #[snafu(display("routine ended without ret"))]
  MissingRet,

  #[snafu(display("{depth} values left on the stack at ret"))]
  UnbalancedStack { depth: usize },
}

#[derive(Debug, Default)]
struct Machine {
  rax: i64,
  rdi: i64,
  rdx: i64,
  stack: Vec<i64>,
}

impl Machine {
  fn reg(&self, reg: Reg) -> i64 {
    match reg {
      Reg::Rax => self.rax,
      Reg::Rdi => self.rdi,
      Reg::Rdx => self.rdx,
    }
  }

  fn reg_mut(&mut self, reg: Reg) -> &mut i64 {
    match reg {
      Reg::Rax => &mut self.rax,
      Reg::Rdi => &mut self.rdi,
      Reg::Rdx => &mut self.rdx,
    }
  }

  fn pop(&mut self, pc: usize) -> ExecResult<i64> {
    self.stack.pop().ok_or(ExecError::StackUnderflow { pc })
  }

  fn idiv(&mut self, divisor: i64, pc: usize) -> ExecResult<()> {
    if divisor == 0 {
      return Err(ExecError::DivisionByZero { pc });
    }
    let dividend = (i128::from(self.rdx) << 64) | i128::from(self.rax as u64);
    let divisor = i128::from(divisor);
    let quotient = i64::try_from(dividend / divisor)
      .map_err(|_| ExecError::DivisionOverflow { pc })?;
    // |remainder| < |divisor|, so it always fits.
    self.rdx = (dividend % divisor) as i64;
    self.rax = quotient;
    Ok(())
  }
}

/// Run `insts` from the first instruction until `ret` and return `rax`.
/// The stack must be empty again when `ret` is reached.
pub fn execute(insts: &[Inst]) -> ExecResult<i64> {
  let mut m = Machine::default();

  for (pc, inst) in insts.iter().enumerate() {
    log::trace!("{pc:>4}: {inst:?} stack={:?}", m.stack);
    match *inst {
      Inst::PushImm(value) => m.stack.push(i64::from(value)),
      Inst::MovImm(reg, value) => *m.reg_mut(reg) = value,
      Inst::Push(reg) => m.stack.push(m.reg(reg)),
      Inst::Pop(reg) => *m.reg_mut(reg) = m.pop(pc)?,
      Inst::Add(dst, src) => *m.reg_mut(dst) = m.reg(dst).wrapping_add(m.reg(src)),
      Inst::Sub(dst, src) => *m.reg_mut(dst) = m.reg(dst).wrapping_sub(m.reg(src)),
      Inst::Imul(dst, src) => *m.reg_mut(dst) = m.reg(dst).wrapping_mul(m.reg(src)),
      Inst::Cqo => m.rdx = if m.rax < 0 { -1 } else { 0 },
      Inst::Idiv(reg) => m.idiv(m.reg(reg), pc)?,
      Inst::Ret => {
        if !m.stack.is_empty() {
          return Err(ExecError::UnbalancedStack {
            depth: m.stack.len(),
          });
        }
        return Ok(m.rax);
      }
    }
  }

  Err(ExecError::MissingRet)
}
