use std::process;

use clap::Parser;
use exprcc::{Options, Syntax, compile, vm};

/// Compile an integer arithmetic expression into x86-64 assembly.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Expression over non-negative integers, `+ - * /` and parentheses.
  #[arg(allow_hyphen_values = true)]
  expr: String,

  /// Assembler dialect of the output.
  #[arg(short, long, value_enum, default_value_t = Syntax::Intel)]
  syntax: Syntax,

  /// Symbol name of the generated routine.
  #[arg(short, long, default_value = "main", value_parser = parse_symbol)]
  entry: String,

  /// Run the generated routine on the built-in stack machine and print its result.
  #[arg(long)]
  eval: bool,
}

/// Accept names the GNU assembler takes as a label without quoting.
fn parse_symbol(name: &str) -> Result<String, String> {
  let mut chars = name.chars();
  let valid = chars
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '.')
    && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$'));
  if valid {
    Ok(name.to_string())
  } else {
    Err(format!("'{name}' is not a valid symbol name"))
  }
}

impl From<&Args> for Options {
  fn from(args: &Args) -> Self {
    Self {
      syntax: args.syntax,
      entry: args.entry.clone(),
    }
  }
}

fn main() {
  env_logger::init();
  let args = Args::parse();
  let options = Options::from(&args);

  let routine = match compile(&args.expr, &options.entry) {
    Ok(routine) => routine,
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  };

  if args.eval {
    match vm::execute(&routine.instructions()) {
      Ok(value) => println!("{value}"),
      Err(err) => {
        eprintln!("{err}");
        process::exit(1);
      }
    }
    return;
  }

  print!("{}", routine.render(options.syntax));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn symbol_names() {
    for name in ["main", "_start", "calc2", ".Lexpr", "f$1"] {
      assert_eq!(parse_symbol(name), Ok(name.to_string()));
    }
    for name in ["", "1x", "1 x", "a b", "a-b", "$x"] {
      assert!(parse_symbol(name).is_err(), "{name:?} accepted");
    }
  }

  #[test]
  fn leading_hyphen_reaches_the_parser() {
    let args = Args::try_parse_from(["exprcc", "-3+4"]).unwrap();
    assert_eq!(args.expr, "-3+4");
    let args = Args::try_parse_from(["exprcc", "--eval", "-1"]).unwrap();
    assert!(args.eval);
    assert_eq!(args.expr, "-1");
  }
}
