//! Struct scan.
//!
//! Finds `struct NAME { … };` blocks in a source and lists their members. Blocks are matched
//! left to right by pairing each `struct NAME {` header with the first `};` that follows it;
//! nested structs are not supported. `struct` only counts as a whole word, so identifiers and
//! comments containing it are skipped.

use regex::Regex;

use crate::shader::inspect::syntax::{Bucket, StructField, Structs};

/// The struct scanner.
#[derive(Clone, Debug)]
pub struct StructScanner {
  header: Regex,
  comment: Regex,
  member: Regex
}

impl Default for StructScanner {
  fn default() -> Self {
    Self::new()
  }
}

impl StructScanner {
  pub fn new() -> Self {
    StructScanner {
      header: Regex::new(r"\bstruct\s+(\w+)\s*\{").expect("struct header regex"),
      comment: Regex::new(r"//[^\n]*").expect("member comment regex"),
      member: Regex::new(r"(\w+)\s+(\w+)\s*$").expect("member regex")
    }
  }

  /// Scan a whole source for struct declarations.
  pub fn scan(&self, source: &str) -> Structs {
    let mut structs = Structs::new();
    let mut index = 0;

    while let Some(caps) = self.header.captures_at(source, index) {
      let body = caps.get(0).map_or(index, |header| header.end());

      let end = match source[body..].find("};") {
        Some(end) => body + end,
        None => break
      };

      structs.insert(caps[1].to_owned(), self.members(&source[body..end]));
      index = end + 2;
    }

    structs
  }

  /// Parse the members of a struct body.
  ///
  /// Only plain `TYPE NAME;` members are recognized.
  pub fn members(&self, block: &str) -> Bucket<StructField> {
    let block = self.comment.replace_all(block, "");

    block
      .split(';')
      .filter_map(|member| self.member.captures(member.trim()))
      .map(|caps| (caps[2].to_owned(), StructField::new(&caps[2], &caps[1])))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_struct() {
    let structs = StructScanner::new().scan("struct Light {\n  vec3 color;\n  float intensity;\n};");
    let light = structs.get("Light").unwrap();

    assert_eq!(light.keys().collect::<Vec<_>>(), vec!["color", "intensity"]);
    assert_eq!(light.get("color"), Some(&StructField::new("color", "vec3")));
    assert_eq!(light.get("intensity"), Some(&StructField::new("intensity", "float")));
  }

  #[test]
  fn several_structs_with_comments() {
    let src = "\
struct A {
  float a; // first
  // vec3 ignored;
  vec3 b;
};
uniform A uA;
struct B
{
  highp float c;
  int d[2];
};";
    let structs = StructScanner::new().scan(src);

    let a = structs.get("A").unwrap();
    assert_eq!(a.keys().collect::<Vec<_>>(), vec!["a", "b"]);

    let b = structs.get("B").unwrap();
    assert_eq!(b.keys().collect::<Vec<_>>(), vec!["c"]);
    assert_eq!(b.get("c").unwrap().ty, "float");
  }

  #[test]
  fn unterminated_struct_is_skipped() {
    let structs = StructScanner::new().scan("struct Broken {\n  float a;\n");
    assert!(structs.is_empty());
  }

  #[test]
  fn struct_without_name_is_skipped() {
    let structs = StructScanner::new().scan("mystruct{ float a; };\nstruct Ok { float b; };");
    assert_eq!(structs.keys().collect::<Vec<_>>(), vec!["Ok"]);
  }

  #[test]
  fn struct_word_in_comment_is_not_a_struct() {
    let src = "// reconstruct the normal\nstruct Light {\n  vec3 color;\n};\nuniform Light uL;";
    let structs = StructScanner::new().scan(src);

    assert_eq!(structs.keys().collect::<Vec<_>>(), vec!["Light"]);
    assert_eq!(structs.get("Light").unwrap().keys().collect::<Vec<_>>(), vec!["color"]);
  }

  #[test]
  fn struct_word_in_identifier_is_not_a_struct() {
    let src = "uniform float uDestructFactor;\nstruct Light {\n  vec3 color;\n  float range;\n};";
    let structs = StructScanner::new().scan(src);

    assert_eq!(structs.keys().collect::<Vec<_>>(), vec!["Light"]);
    assert_eq!(structs.get("Light").unwrap().keys().collect::<Vec<_>>(), vec!["color", "range"]);
  }
}
