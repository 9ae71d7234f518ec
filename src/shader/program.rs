//! Shader programs described by blocks.
//!
//! A [`ProgramBlocks`] gathers everything needed to build a vertex + fragment program: both
//! templates, the fragment maps (“chunks”) filling them and the defines. It’s typically read from
//! a JSON document:
//!
//! ```json
//! {
//!   "vertex": "#pragma block:defines\n…",
//!   "fragment": ["#pragma block:defines", "…"],
//!   "chunks": [{ "fs_surface": "color = vec4(1.);" }],
//!   "defines": { "PARALLAX_MAP": true, "LIGHT_COUNT": 4 }
//! }
//! ```

use serde_derive::Deserialize;

use crate::shader::block::{Composer, Define, Defines, FragmentMap, Template};
use crate::shader::inspect::{Inspector, ProgramInspection};

/// Block description of a shader program.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[non_exhaustive]
pub struct ProgramBlocks {
  #[serde(default)]
  pub vertex: Template,
  #[serde(default)]
  pub fragment: Template,
  #[serde(default)]
  pub chunks: Vec<FragmentMap>,
  #[serde(default)]
  pub defines: Defines
}

impl ProgramBlocks {
  pub fn new(vertex: Template, fragment: Template) -> Self {
    ProgramBlocks {
      vertex,
      fragment,
      chunks: Vec::new(),
      defines: Defines::new()
    }
  }

  pub fn with_chunk(mut self, chunk: FragmentMap) -> Self {
    self.chunks.push(chunk);
    self
  }

  pub fn with_define<K, V>(mut self, name: K, value: V) -> Self
  where K: Into<String>,
        V: Into<Define> {
    self.defines.insert(name.into(), value.into());
    self
  }

  /// Compose both stages.
  ///
  /// An empty template composes to an empty source.
  pub fn compose(&self) -> ComposedProgram {
    let composer = Composer::shared();
    let stage = |template: &Template| {
      if template.is_empty() {
        String::new()
      } else {
        composer.compose(template, &self.chunks, &self.defines)
      }
    };

    ComposedProgram {
      vertex: stage(&self.vertex),
      fragment: stage(&self.fragment)
    }
  }

  /// Compose then inspect the program.
  pub fn inspect(&self) -> ProgramInspection {
    self.compose().inspect()
  }
}

/// Composed GLSL sources of a program.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ComposedProgram {
  pub vertex: String,
  pub fragment: String
}

impl ComposedProgram {
  pub fn inspect(&self) -> ProgramInspection {
    Inspector::shared().inspect_program(&self.vertex, &self.fragment)
  }
}
