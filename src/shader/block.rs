//! Shader blocks.
//!
//! A shader is written as a *template* holding block markers:
//!
//! ```glsl
//! void main() {
//!   #pragma block:fs_surface
//! }
//! ```
//!
//! Each marker is replaced by the lines the *fragment maps* provide for its slot. A slot `S` is
//! filled in three passes over all the maps: every `S_before` contribution, then every `S` one,
//! then every `S_after` one, in map order. Contributions are expanded again, so they can hold
//! markers on their own; the indentation of a marker is applied to every line it yields.
//!
//! Composition is a pure function of its inputs.

use log::{trace, warn};
use regex::Regex;
use serde_derive::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::FromIterator;
use std::sync::OnceLock;

/// Name of the slot receiving rendered defines.
pub const DEFINES_SLOT: &str = "defines";

// Nesting deeper than that is a slot including itself.
const MAX_DEPTH: usize = 64;

/// Source text as found in block descriptions: either one multiline string or a list of lines.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Source {
  Text(String),
  Lines(Vec<String>)
}

impl From<Source> for Vec<String> {
  fn from(source: Source) -> Self {
    match source {
      Source::Text(text) => split_lines(&text),
      Source::Lines(lines) => lines.iter().flat_map(|line| split_lines(line)).collect()
    }
  }
}

fn split_lines(text: &str) -> Vec<String> {
  text.split('\n').map(|line| line.trim_end_matches('\r').to_owned()).collect()
}

/// Lines contributed to named slots.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(from = "BTreeMap<String, Source>")]
pub struct FragmentMap {
  slots: BTreeMap<String, Vec<String>>
}

impl FragmentMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add (or replace) the contribution to a slot. `text` is split into lines.
  pub fn with_slot<S>(mut self, slot: S, text: &str) -> Self where S: Into<String> {
    self.insert(slot, split_lines(text));
    self
  }

  pub fn insert<S>(&mut self, slot: S, lines: Vec<String>) -> Option<Vec<String>> where S: Into<String> {
    self.slots.insert(slot.into(), lines)
  }

  pub fn get(&self, slot: &str) -> Option<&[String]> {
    self.slots.get(slot).map(Vec::as_slice)
  }

  pub fn slots(&self) -> impl Iterator<Item = &str> {
    self.slots.keys().map(String::as_str)
  }
}

impl From<BTreeMap<String, Source>> for FragmentMap {
  fn from(sources: BTreeMap<String, Source>) -> Self {
    FragmentMap {
      slots: sources.into_iter().map(|(slot, source)| (slot, source.into())).collect()
    }
  }
}

impl<S> FromIterator<(S, Vec<String>)> for FragmentMap where S: Into<String> {
  fn from_iter<I>(iter: I) -> Self where I: IntoIterator<Item = (S, Vec<String>)> {
    FragmentMap {
      slots: iter.into_iter().map(|(slot, lines)| (slot.into(), lines)).collect()
    }
  }
}

/// A template: lines, some of them block markers.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(from = "Source")]
pub struct Template {
  lines: Vec<String>
}

impl Template {
  pub fn new(text: &str) -> Self {
    Template { lines: split_lines(text) }
  }

  pub fn lines(&self) -> &[String] {
    &self.lines
  }

  pub fn is_empty(&self) -> bool {
    self.lines.iter().all(|line| line.trim().is_empty())
  }
}

impl From<Source> for Template {
  fn from(source: Source) -> Self {
    Template { lines: source.into() }
  }
}

impl<'a> From<&'a str> for Template {
  fn from(text: &'a str) -> Self {
    Template::new(text)
  }
}

impl From<Vec<String>> for Template {
  fn from(lines: Vec<String>) -> Self {
    Template { lines }
  }
}

/// Value of a define.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Define {
  Flag(bool),
  Int(i64),
  Float(f64),
  Text(String),
  Unset
}

impl Define {
  /// Whether the define gets rendered at all.
  pub fn is_truthy(&self) -> bool {
    match *self {
      Define::Flag(flag) => flag,
      Define::Int(i) => i != 0,
      Define::Float(f) => f != 0. && !f.is_nan(),
      Define::Text(ref text) => !text.is_empty(),
      Define::Unset => false
    }
  }
}

impl fmt::Display for Define {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      Define::Flag(flag) => write!(f, "{}", flag),
      Define::Int(i) => write!(f, "{}", i),
      Define::Float(x) => write!(f, "{}", x),
      Define::Text(ref text) => f.write_str(text),
      Define::Unset => Ok(())
    }
  }
}

impl From<bool> for Define {
  fn from(flag: bool) -> Self {
    Define::Flag(flag)
  }
}

impl From<i64> for Define {
  fn from(i: i64) -> Self {
    Define::Int(i)
  }
}

impl From<f64> for Define {
  fn from(x: f64) -> Self {
    Define::Float(x)
  }
}

impl<'a> From<&'a str> for Define {
  fn from(text: &'a str) -> Self {
    Define::Text(text.to_owned())
  }
}

/// Defines to compose a shader with.
pub type Defines = BTreeMap<String, Define>;

/// Render defines as `#define` lines, sorted by name.
///
/// `true` renders as a flag; any other truthy value renders as `#define NAME VALUE`; falsy
/// values render nothing.
pub fn render_defines(defines: &Defines) -> Vec<String> {
  defines
    .iter()
    .filter(|(_, value)| value.is_truthy())
    .map(|(name, value)| match *value {
      Define::Flag(true) => format!("#define {}", name),
      ref value => format!("#define {} {}", name, value)
    })
    .collect()
}

/// The block composer.
#[derive(Clone, Debug)]
pub struct Composer {
  block: Regex,
  blank: Regex,
  leading: Regex
}

impl Default for Composer {
  fn default() -> Self {
    Self::new()
  }
}

impl Composer {
  pub fn new() -> Self {
    Composer {
      block: Regex::new(r"^(\s*)#pragma block:(\w+)\s*$").expect("block marker regex"),
      blank: Regex::new(r"\n\s*\n").expect("blank lines regex"),
      leading: Regex::new(r"^(?:[ \t]*\n)+").expect("leading blank lines regex")
    }
  }

  /// A lazily built, process-wide composer.
  pub fn shared() -> &'static Composer {
    static COMPOSER: OnceLock<Composer> = OnceLock::new();
    COMPOSER.get_or_init(Composer::new)
  }

  /// Compose a template.
  ///
  /// The rendered defines fill the `defines` slot, before any contribution of `maps` to it.
  pub fn compose(&self, template: &Template, maps: &[FragmentMap], defines: &Defines) -> String {
    let rendered = FragmentMap::from_iter(vec![(DEFINES_SLOT, render_defines(defines))]);
    let maps = std::iter::once(&rendered).chain(maps).collect::<Vec<_>>();

    let mut out = Vec::new();
    self.expand_into(&mut out, template.lines(), &maps, "", 0);
    self.finish(&out)
  }

  /// Expand block markers found in `lines`, prefixing every emitted line with `prefix`.
  pub fn expand<L>(&self, lines: &[L], maps: &[FragmentMap], prefix: &str) -> String where L: AsRef<str> {
    let maps = maps.iter().collect::<Vec<_>>();

    let mut out = Vec::new();
    self.expand_into(&mut out, lines, &maps, prefix, 0);
    self.finish(&out)
  }

  fn expand_into<L>(
    &self,
    out: &mut Vec<String>,
    lines: &[L],
    maps: &[&FragmentMap],
    prefix: &str,
    depth: usize
  ) where L: AsRef<str> {
    for line in lines {
      let line = line.as_ref();

      let caps = match self.block.captures(line) {
        Some(caps) => caps,
        None => {
          out.push(format!("{}{}", prefix, line));
          continue;
        }
      };

      let slot = &caps[2];

      if depth >= MAX_DEPTH {
        warn!("block {} nested too deep; skipping it", slot);
        continue;
      }

      let indent = format!("{}{}", prefix, &caps[1]);
      let names = [format!("{}_before", slot), slot.to_owned(), format!("{}_after", slot)];

      for name in &names {
        for contribution in maps.iter().filter_map(|map| map.get(name)) {
          trace!("expanding block {} ({} lines)", name, contribution.len());
          self.expand_into(out, contribution, maps, &indent, depth + 1);
        }
      }
    }
  }

  // Join lines, collapse blank lines and end with a single newline.
  fn finish(&self, lines: &[String]) -> String {
    let mut source = lines.join("\n");
    source.push('\n');

    let source = self.blank.replace_all(&source, "\n");
    self.leading.replace(&source, "").into_owned()
  }
}

/// Compose a template with the shared composer.
pub fn compose(template: &Template, maps: &[FragmentMap], defines: &Defines) -> String {
  Composer::shared().compose(template, maps, defines)
}

/// Expand lines with the shared composer.
pub fn expand<L>(lines: &[L], maps: &[FragmentMap], prefix: &str) -> String where L: AsRef<str> {
  Composer::shared().expand(lines, maps, prefix)
}
