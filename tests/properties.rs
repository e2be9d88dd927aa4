use std::sync::Once;

use exprcc::{compile, vm};
use proptest::prelude::*;

static INIT: Once = Once::new();

fn init_logger() {
  INIT.call_once(|| {
    let _ = env_logger::builder().is_test(true).try_init();
  });
}

/// Expression model the generator builds before printing it as source.
#[derive(Debug, Clone)]
enum Expr {
  Num(u32),
  Bin(char, Box<Expr>, Box<Expr>),
}

impl Expr {
  /// Reference semantics; `None` when a division would fault.
  fn eval(&self) -> Option<i64> {
    match self {
      Expr::Num(n) => Some(i64::from(*n)),
      Expr::Bin(op, lhs, rhs) => {
        let (a, b) = (lhs.eval()?, rhs.eval()?);
        match op {
          '+' => Some(a.wrapping_add(b)),
          '-' => Some(a.wrapping_sub(b)),
          '*' => Some(a.wrapping_mul(b)),
          _ => a.checked_div(b),
        }
      }
    }
  }

  fn precedence(&self) -> u8 {
    match self {
      Expr::Num(_) => 3,
      Expr::Bin('+' | '-', ..) => 1,
      Expr::Bin(..) => 2,
    }
  }

  /// Source with only the parentheses the tree shape needs: a looser lhs,
  /// or an rhs that is not strictly tighter, since operators fold left.
  fn minimal_source(&self) -> String {
    match self {
      Expr::Num(n) => n.to_string(),
      Expr::Bin(op, lhs, rhs) => {
        let prec = self.precedence();
        let lhs_src = if lhs.precedence() < prec {
          format!("({})", lhs.minimal_source())
        } else {
          lhs.minimal_source()
        };
        let rhs_src = if rhs.precedence() <= prec {
          format!("({})", rhs.minimal_source())
        } else {
          rhs.minimal_source()
        };
        format!("{lhs_src}{op}{rhs_src}")
      }
    }
  }

  /// Fully parenthesised source, with random spacing.
  fn source(&self, spaced: bool) -> String {
    let sp = if spaced { " " } else { "" };
    match self {
      Expr::Num(n) => n.to_string(),
      Expr::Bin(op, lhs, rhs) => format!(
        "({sp}{}{sp}{op}{sp}{}{sp})",
        lhs.source(spaced),
        rhs.source(!spaced)
      ),
    }
  }
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
  let leaf = (0u32..1000).prop_map(Expr::Num);
  leaf.prop_recursive(6, 48, 2, |inner| {
    (
      prop_oneof![Just('+'), Just('-'), Just('*'), Just('/')],
      inner.clone(),
      inner,
    )
      .prop_map(|(op, lhs, rhs)| Expr::Bin(op, Box::new(lhs), Box::new(rhs)))
  })
}

/// Compile `source`, which must be accepted, and run it.
fn run(source: &str) -> Option<i64> {
  let routine = compile(source, "main")
    .unwrap_or_else(|err| panic!("valid expression rejected:\n{err}"));
  vm::execute(&routine.instructions()).ok()
}

proptest! {
  #[test]
  fn compiled_code_matches_reference(expr in expr_strategy(), spaced in any::<bool>()) {
    init_logger();
    let source = expr.source(spaced);
    prop_assert_eq!(run(&source), expr.eval(), "source: {}", source);
  }

  #[test]
  fn precedence_without_parentheses(expr in expr_strategy()) {
    init_logger();
    let source = expr.minimal_source();
    prop_assert_eq!(run(&source), expr.eval(), "source: {}", source);
  }

  #[test]
  fn multiplicative_chains_fold_left(first in 0u32..1000, rest in prop::collection::vec((any::<bool>(), 0u32..20), 0..8)) {
    init_logger();
    let mut source = first.to_string();
    let mut expected = Some(i64::from(first));
    for &(mul, n) in &rest {
      source.push(if mul { '*' } else { '/' });
      source.push_str(&n.to_string());
      let n = i64::from(n);
      expected = expected.and_then(|acc| if mul { Some(acc.wrapping_mul(n)) } else { acc.checked_div(n) });
    }
    prop_assert_eq!(run(&source), expected, "source: {}", source);
  }

  #[test]
  fn flat_chains_fold_left(first in 0u32..100, rest in prop::collection::vec((0usize..3, 1u32..100), 0..8)) {
    init_logger();
    // Flat chains of one precedence level, which exercises associativity.
    let mut source = first.to_string();
    let mut additive = i64::from(first);
    for &(op, n) in &rest {
      let op = ['+', '-', '-'][op];
      source.push(op);
      source.push_str(&n.to_string());
      additive = if op == '+' { additive + i64::from(n) } else { additive - i64::from(n) };
    }
    prop_assert_eq!(run(&source), Some(additive), "source: {}", source);
  }
}

#[test]
fn spot_checks() {
  init_logger();
  assert_eq!(run("1-2-3"), Some(-4));
  assert_eq!(run("2+3*4"), Some(14));
  assert_eq!(run("(2+3)*4"), Some(20));
  assert_eq!(run("7/2"), Some(3));
  assert_eq!(run("(0-7)/2"), Some(-3));
  assert_eq!(run("1 + 2"), run("1+2"));
  assert_eq!(run("8/4/2"), Some(1));
  assert_eq!(run("2*6/4"), Some(3));
  assert_eq!(run("1/0"), None);
}
