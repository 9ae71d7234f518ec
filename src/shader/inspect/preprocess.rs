//! Preprocessor stage.
//!
//! A single pass over the source lines tracking `#define`d macros and `#if…#endif` branches, the
//! way a (much restricted) C preprocessor does. Lines of dead branches are dropped; conditional
//! directives are consumed; everything else – including `#define`, `#undef`, `#version`,
//! `#extension`… – is kept so that the GPU compiler still sees it.

use log::debug;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

use crate::shader::inspect::expr;

/// Macros defined while preprocessing, with their raw (trimmed) value.
pub type Defines = BTreeMap<String, String>;

/// Output of the preprocessor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Preprocessed {
  pub defines: Defines,
  pub lines: Vec<String>
}

// One level of the #if stack.
#[derive(Clone, Copy, Debug)]
struct Branch {
  // every enclosing branch, and this one, is live
  hot: bool,
  // the current arm of this branch evaluated true
  ok: bool,
  // an arm of this branch has already been taken
  taken: bool
}

impl Branch {
  fn root() -> Self {
    Branch { hot: true, ok: true, taken: true }
  }

  fn open(parent: &Branch, ok: bool) -> Self {
    Branch { hot: parent.hot && ok, ok, taken: ok }
  }
}

/// The preprocessor.
#[derive(Clone, Debug)]
pub struct Preprocessor {
  directive: Regex,
  definition: Regex,
  defined: Regex,
  identifier: Regex,
  allowed: Regex
}

impl Default for Preprocessor {
  fn default() -> Self {
    Self::new()
  }
}

impl Preprocessor {
  pub fn new() -> Self {
    Preprocessor {
      directive: Regex::new(r"^\s*#\s*(\w+)\s*(.*?)\s*$").expect("directive regex"),
      definition: Regex::new(r"^(\w+)\s*(.*?)\s*$").expect("definition regex"),
      defined: Regex::new(r"defined\s*\(?\s*(\w+)\s*\)?").expect("defined regex"),
      identifier: Regex::new(r"\b[A-Za-z_]\w*\b").expect("identifier regex"),
      allowed: Regex::new(r"^[a-zA-Z0-9 ()|&!^]*$").expect("allowlist regex")
    }
  }

  /// Run the preprocessor over a whole source.
  pub fn preprocess(&self, source: &str) -> Preprocessed {
    let mut out = Preprocessed::default();
    let mut stack = vec![Branch::root()];

    for line in source.split('\n') {
      let line = line.trim_end_matches('\r');
      let hot = stack.last().map_or(true, |b| b.hot);

      let caps = match self.directive.captures(line) {
        Some(caps) => caps,
        None => {
          if hot {
            out.lines.push(line.to_owned());
          }
          continue;
        }
      };

      let value = caps.get(2).map_or("", |m| m.as_str());

      match &caps[1] {
        "define" => {
          if hot {
            out.lines.push(line.to_owned());

            if let Some(def) = self.definition.captures(value) {
              out.defines.insert(def[1].to_owned(), def[2].to_owned());
            }
          }
        }

        "undef" => {
          if hot {
            out.lines.push(line.to_owned());

            if let Some(def) = self.definition.captures(value) {
              out.defines.remove(&def[1]);
            }
          }
        }

        "ifdef" => {
          let ok = out.defines.contains_key(value);
          push_branch(&mut stack, ok);
        }

        "ifndef" => {
          let ok = !out.defines.contains_key(value);
          push_branch(&mut stack, ok);
        }

        "if" => {
          let ok = self.evaluate(value, &out.defines);
          push_branch(&mut stack, ok);
        }

        "elif" => {
          if stack.len() < 2 {
            debug!("ignoring #elif outside of a conditional block");
            continue;
          }

          let parent_hot = stack[stack.len() - 2].hot;
          let taken = stack[stack.len() - 1].taken;
          let ok = !taken && self.evaluate(value, &out.defines);

          if let Some(branch) = stack.last_mut() {
            branch.ok = ok;
            branch.taken = taken || ok;
            branch.hot = parent_hot && ok;
          }
        }

        "else" => {
          if stack.len() < 2 {
            debug!("ignoring #else outside of a conditional block");
            continue;
          }

          let parent_hot = stack[stack.len() - 2].hot;

          if let Some(branch) = stack.last_mut() {
            branch.ok = !branch.taken;
            branch.taken = true;
            branch.hot = parent_hot && branch.ok;
          }
        }

        "endif" => {
          if stack.len() < 2 {
            debug!("ignoring unbalanced #endif");
          } else {
            stack.pop();
          }
        }

        _ => {
          if hot {
            out.lines.push(line.to_owned());
          }
        }
      }
    }

    out
  }

  /// Evaluate an `#if` / `#elif` expression against a set of macros.
  ///
  /// `defined(NAME)` and `defined NAME` are replaced by `true` or `false`, then every remaining
  /// identifier is replaced by its macro value (`false` for unknown or empty macros). The result
  /// must only contain literals, parentheses and logical / bitwise operators; anything else is
  /// `false`.
  pub fn evaluate(&self, expression: &str, defines: &Defines) -> bool {
    if expression.trim().is_empty() {
      return false;
    }

    let expression = self.defined.replace_all(expression, |caps: &Captures| {
      match &caps[1] {
        "true" | "false" => caps[1].to_owned(),
        name => defines.contains_key(name).to_string()
      }
    });

    let expression = self.identifier.replace_all(&expression, |caps: &Captures| {
      match &caps[0] {
        "true" | "false" => caps[0].to_owned(),
        name => match defines.get(name) {
          Some(value) if !value.is_empty() => value.clone(),
          _ => "false".to_owned()
        }
      }
    });

    if !self.allowed.is_match(&expression) {
      debug!("#if expression contains forbidden characters: {}", expression);
      return false;
    }

    expr::truthy(&expression)
  }
}

fn push_branch(stack: &mut Vec<Branch>, ok: bool) {
  let branch = match stack.last() {
    Some(parent) => Branch::open(parent, ok),
    None => Branch::open(&Branch::root(), ok)
  };

  stack.push(branch);
}
