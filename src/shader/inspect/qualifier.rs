//! Qualifier scan.
//!
//! Walks preprocessed lines and records every top-level declaration of the shape
//!
//! ```glsl
//! [layout(…)] (const|in|out|attribute|uniform|varying|buffer|shared) TYPE NAME;
//! ```
//!
//! along with the annotations of the comment lines right above it:
//!
//! ```glsl
//! // @binding ParallaxMap
//! // @filter LinearWrap
//! uniform sampler2D uParallaxMap;
//! ```
//!
//! A blank line drops pending annotations.

use regex::Regex;
use std::collections::BTreeMap;

use crate::shader::inspect::syntax::{Bucket, Declaration, StorageClass};

/// Declarations found by the qualifier scan, one bucket per storage class.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Qualified {
  pub constants: Bucket<Declaration>,
  pub attributes: Bucket<Declaration>,
  pub uniforms: Bucket<Declaration>,
  pub varying: Bucket<Declaration>,
  pub inputs: Bucket<Declaration>,
  pub outputs: Bucket<Declaration>
}

impl Qualified {
  /// Bucket receiving declarations of a given storage class.
  ///
  /// `buffer` and `shared` blocks are not tracked.
  pub fn bucket_mut(&mut self, class: StorageClass) -> Option<&mut Bucket<Declaration>> {
    match class {
      StorageClass::Const => Some(&mut self.constants),
      StorageClass::In => Some(&mut self.inputs),
      StorageClass::Out => Some(&mut self.outputs),
      StorageClass::Attribute => Some(&mut self.attributes),
      StorageClass::Varying => Some(&mut self.varying),
      StorageClass::Uniform => Some(&mut self.uniforms),
      StorageClass::Buffer | StorageClass::Shared => None
    }
  }
}

/// The qualifier scanner.
#[derive(Clone, Debug)]
pub struct QualifierScanner {
  comment: Regex,
  annotation: Regex,
  constant: Regex,
  declaration: Regex
}

impl Default for QualifierScanner {
  fn default() -> Self {
    Self::new()
  }
}

impl QualifierScanner {
  pub fn new() -> Self {
    QualifierScanner {
      comment: Regex::new(r"^//(.*)$").expect("comment regex"),
      annotation: Regex::new(r"^\s*@(\w+)\s*(.*?)\s*$").expect("annotation regex"),
      constant: Regex::new(r"^const\s+(.+)\s+([A-Za-z_]\w*)\s*=\s*(.+?)\s*;").expect("constant regex"),
      declaration: Regex::new(
        r"^(?:(layout\s*\([^)]*\))\s*)?(?:(?:flat|smooth|noperspective|centroid|invariant)\s+)*(const|in|out|attribute|uniform|varying|buffer|shared)\s+(.+)\s+([A-Za-z_]\w*(?:\s*\[[^\]]*\])?)\s*;"
      ).expect("declaration regex")
    }
  }

  /// Scan lines for declarations.
  pub fn scan<L>(&self, lines: &[L]) -> Qualified where L: AsRef<str> {
    let mut out = Qualified::default();
    let mut comments: Vec<&str> = Vec::new();

    for line in lines {
      let line = line.as_ref().trim();

      if line.is_empty() {
        comments.clear();
        continue;
      }

      if let Some(caps) = self.comment.captures(line) {
        comments.push(caps.get(1).map_or("", |m| m.as_str()));
        continue;
      }

      let code = match line.find("//") {
        Some(index) => line[..index].trim_end(),
        None => line
      };

      if let Some(caps) = self.constant.captures(code) {
        let mut decl = Declaration::new(&caps[2], caps[1].trim());
        decl.value = Some(caps[3].to_owned());
        out.constants.insert(decl.name.clone(), decl);
        comments.clear();
        continue;
      }

      if let Some(caps) = self.declaration.captures(code) {
        let class = match caps[2].parse::<StorageClass>() {
          Ok(class) => class,
          Err(_) => continue
        };

        let mut decl = Declaration::new(&caps[4], caps[3].trim())
          .annotate(self.parse_annotations(&comments));
        decl.layout = caps.get(1).map(|m| m.as_str().to_owned());
        comments.clear();

        if let Some(bucket) = out.bucket_mut(class) {
          bucket.insert(decl.key().to_owned(), decl);
        }
      }
    }

    out
  }

  /// Parse `@key value` annotations out of comment texts.
  ///
  /// Comments that are not annotations are ignored. A repeated key keeps its last value.
  pub fn parse_annotations<L>(&self, comments: &[L]) -> BTreeMap<String, String> where L: AsRef<str> {
    comments
      .iter()
      .filter_map(|comment| self.annotation.captures(comment.as_ref()))
      .map(|caps| (caps[1].to_owned(), caps[2].to_owned()))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scan(src: &str) -> Qualified {
    QualifierScanner::new().scan(&src.lines().collect::<Vec<_>>())
  }

  #[test]
  fn uniforms_with_bindings() {
    let out = scan("// @binding vec4Uniform\nuniform vec4 uVec4Uniform;\n\nuniform sampler2D tex1;");

    let vec4 = out.uniforms.get("vec4Uniform").unwrap();
    assert_eq!(vec4.name, "uVec4Uniform");
    assert_eq!(vec4.ty, "vec4");
    assert_eq!(vec4.binding.as_deref(), Some("vec4Uniform"));
    assert_eq!(vec4.layout, None);

    let tex = out.uniforms.get("tex1").unwrap();
    assert_eq!(tex.ty, "sampler2D");
    assert_eq!(tex.binding, None);
  }

  #[test]
  fn annotations_reset_on_blank_line() {
    let out = scan("// @binding Lost\n\nuniform float uValue;");
    assert!(out.uniforms.contains_key("uValue"));
    assert!(!out.uniforms.contains_key("Lost"));
  }

  #[test]
  fn annotations_apply_to_next_declaration_only() {
    let out = scan("// @default 1.0\n// @widget slider\nuniform float uA;\nuniform float uB;");

    let a = out.uniforms.get("uA").unwrap();
    assert_eq!(a.annotations.get("default").map(String::as_str), Some("1.0"));
    assert_eq!(a.annotations.get("widget").map(String::as_str), Some("slider"));
    assert!(out.uniforms.get("uB").unwrap().annotations.is_empty());
  }

  #[test]
  fn annotation_without_space() {
    let out = scan("//@binding Time\nuniform float uTime;");
    assert!(out.uniforms.contains_key("Time"));
  }

  #[test]
  fn storage_classes_dispatch() {
    let src = "attribute vec3 aPos;\nvarying vec2 vUv;\nin vec4 iColor;\nout vec4 oColor;\nbuffer Data data;\nconst float K;";
    let out = scan(src);

    assert!(out.attributes.contains_key("aPos"));
    assert!(out.varying.contains_key("vUv"));
    assert!(out.inputs.contains_key("iColor"));
    assert!(out.outputs.contains_key("oColor"));
    assert!(out.constants.contains_key("K"));
    assert!(out.uniforms.is_empty());
  }

  #[test]
  fn layout_is_preserved() {
    let out = scan("layout(location = 0) in vec3 aPosition;\nlayout (std140) uniform Block block;");

    let pos = out.inputs.get("aPosition").unwrap();
    assert_eq!(pos.layout.as_deref(), Some("layout(location = 0)"));
    assert_eq!(pos.ty, "vec3");
    assert_eq!(out.uniforms.get("block").unwrap().layout.as_deref(), Some("layout (std140)"));
  }

  #[test]
  fn interpolation_qualifiers_are_skipped() {
    let out = scan("flat out int vIndex;\nsmooth centroid in vec2 vUv;");
    assert_eq!(out.outputs.get("vIndex").unwrap().ty, "int");
    assert_eq!(out.inputs.get("vUv").unwrap().ty, "vec2");
  }

  #[test]
  fn precision_stays_in_type() {
    let out = scan("uniform highp vec3 uEye;");
    assert_eq!(out.uniforms.get("uEye").unwrap().ty, "highp vec3");
  }

  #[test]
  fn trailing_comment_is_stripped() {
    let out = scan("uniform vec3 uColor; // the color");
    let color = out.uniforms.get("uColor").unwrap();
    assert_eq!(color.ty, "vec3");
  }

  #[test]
  fn arrays_keep_their_index() {
    let out = scan("// @binding Lights\nuniform vec3 uLights[LIGHT_COUNT];");
    assert_eq!(out.uniforms.get("Lights").unwrap().name, "uLights[LIGHT_COUNT]");
  }

  #[test]
  fn constants_with_initializer() {
    let out = scan("// @binding Ignored\nconst float PI = 3.14159;\nconst vec2 HALF = vec2(0.5, 0.5);");

    let pi = out.constants.get("PI").unwrap();
    assert_eq!(pi.ty, "float");
    assert_eq!(pi.value.as_deref(), Some("3.14159"));
    assert_eq!(pi.binding, None);
    assert_eq!(out.constants.get("HALF").unwrap().value.as_deref(), Some("vec2(0.5, 0.5)"));
  }

  #[test]
  fn code_is_not_a_declaration() {
    let out = scan("void main() {\n  gl_FragColor = vec4(1.0);\n}\nuniformity = 1;");
    assert_eq!(out, Qualified::default());
  }
}
