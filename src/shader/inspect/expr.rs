//! `#if` / `#elif` expressions.
//!
//! Once macros are substituted, a conditional expression is made of integer and boolean literals,
//! parentheses and the `! && || & | ^` operators. This module exports [nom] parsers building a
//! small AST out of such an expression and a function to evaluate it.
//!
//! Operators follow the usual C precedence, from loosest to tightest: `||`, `&&`, `|`, `^`, `&`,
//! then the unary `!`.
//!
//! [nom]: https://crates.io/crates/nom

use log::debug;
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{all_consuming, map, map_res, not, value};
use nom::multi::fold_many0;
use nom::sequence::{delimited, preceded, terminated};
use nom::IResult;

/// Maximum number of `(` and `!` accepted in an expression; each one is a level of recursion.
pub const MAX_NESTING: usize = 32;

/// Conditional expression AST.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
  Int(i64),
  Not(Box<Expr>),
  And(Box<Expr>, Box<Expr>),
  Or(Box<Expr>, Box<Expr>),
  BitAnd(Box<Expr>, Box<Expr>),
  BitOr(Box<Expr>, Box<Expr>),
  BitXor(Box<Expr>, Box<Expr>)
}

impl Expr {
  /// Evaluate the expression.
  ///
  /// `&&` and `||` short-circuit and yield one of their operands; `!` yields `0` or `1`.
  pub fn eval(&self) -> i64 {
    match *self {
      Expr::Int(i) => i,
      Expr::Not(ref e) => (e.eval() == 0) as i64,
      Expr::And(ref a, ref b) => {
        let a = a.eval();
        if a != 0 { b.eval() } else { a }
      }
      Expr::Or(ref a, ref b) => {
        let a = a.eval();
        if a != 0 { a } else { b.eval() }
      }
      Expr::BitAnd(ref a, ref b) => a.eval() & b.eval(),
      Expr::BitOr(ref a, ref b) => a.eval() | b.eval(),
      Expr::BitXor(ref a, ref b) => a.eval() ^ b.eval()
    }
  }
}

/// Parse a whole expression.
///
/// Returns `None` if the input is not entirely made of a valid expression, or if it nests deeper
/// than [`MAX_NESTING`].
pub fn parse(input: &str) -> Option<Expr> {
  let nesting = input.chars().filter(|&c| c == '(' || c == '!').count();

  if nesting > MAX_NESTING {
    debug!("#if expression nests too deeply ({} levels)", nesting);
    return None;
  }

  all_consuming(ws(or_expr))(input).ok().map(|(_, e)| e)
}

/// Parse and evaluate an expression; anything that doesn’t parse is `false`.
pub fn truthy(input: &str) -> bool {
  match parse(input) {
    Some(e) => e.eval() != 0,
    None => {
      debug!("cannot evaluate #if expression: {}", input);
      false
    }
  }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where F: FnMut(&'a str) -> IResult<&'a str, O> {
  delimited(multispace0, inner, multispace0)
}

// Fold a left-associative chain of binary operators.
fn chain<'a, O, F, G>(
  mut operand: F,
  mut operator: O,
  build: G
) -> impl FnMut(&'a str) -> IResult<&'a str, Expr>
where F: FnMut(&'a str) -> IResult<&'a str, Expr> + Clone,
      O: FnMut(&'a str) -> IResult<&'a str, &'a str>,
      G: Fn(Box<Expr>, Box<Expr>) -> Expr + Copy {
  move |input: &'a str| {
    let (input, first) = operand(input)?;
    let mut rest = operand.clone();

    let folded = fold_many0(
      preceded(|i: &'a str| operator(i), |i: &'a str| rest(i)),
      move || first.clone(),
      move |acc, e| build(Box::new(acc), Box::new(e))
    )(input);

    folded
  }
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
  chain(and_expr, ws(tag("||")), Expr::Or)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
  chain(bitor_expr, ws(tag("&&")), Expr::And)(input)
}

fn bitor_expr(input: &str) -> IResult<&str, Expr> {
  chain(bitxor_expr, ws(terminated(tag("|"), not(char('|')))), Expr::BitOr)(input)
}

fn bitxor_expr(input: &str) -> IResult<&str, Expr> {
  chain(bitand_expr, ws(tag("^")), Expr::BitXor)(input)
}

fn bitand_expr(input: &str) -> IResult<&str, Expr> {
  chain(unary_expr, ws(terminated(tag("&"), not(char('&')))), Expr::BitAnd)(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expr> {
  alt((
    map(preceded(ws(char('!')), unary_expr), |e| Expr::Not(Box::new(e))),
    primary_expr
  ))(input)
}

fn primary_expr(input: &str) -> IResult<&str, Expr> {
  ws(alt((
    map_res(digit1, |digits: &str| digits.parse().map(Expr::Int)),
    value(Expr::Int(1), terminated(tag("true"), not(identifier_char))),
    value(Expr::Int(0), terminated(tag("false"), not(identifier_char))),
    delimited(char('('), or_expr, char(')'))
  )))(input)
}

fn identifier_char(input: &str) -> IResult<&str, char> {
  nom::character::complete::satisfy(|c| c.is_alphanumeric() || c == '_')(input)
}
