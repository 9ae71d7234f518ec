//! Shader source inspection.
//!
//! Given the flat GLSL source of a shader stage, the inspector recovers what a host needs to bind
//! data to the compiled program: attributes, uniforms, varyings, structs and texture registers.
//!
//! Inspection runs as a pipeline of four stages:
//!
//! 1. [`preprocess`] evaluates `#define` / `#if` directives and drops dead branches;
//! 2. [`qualifier`] records top-level declarations and their comment annotations;
//! 3. [`structs`] lists struct declarations;
//! 4. [`uniform`] flattens struct and array uniforms and assigns texture registers.
//!
//! Inspection never fails: anything that doesn’t look like what the inspector expects is simply
//! left to the GPU compiler.

pub mod expr;
pub mod preprocess;
pub mod qualifier;
pub mod structs;
pub mod syntax;
pub mod uniform;

use log::warn;
use serde_derive::Serialize;
use std::sync::OnceLock;

use self::preprocess::{Defines, Preprocessor};
use self::qualifier::QualifierScanner;
use self::structs::StructScanner;
use self::syntax::{Bucket, Declaration, Structs};
use self::uniform::UniformFixup;

/// Inspection of a single shader stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ShaderInspection {
  /// Macros defined by the source.
  pub defines: Defines,
  pub constants: Bucket<Declaration>,
  pub attributes: Bucket<Declaration>,
  /// Uniforms, flattened.
  pub uniforms: Bucket<Declaration>,
  pub varying: Bucket<Declaration>,
  pub inputs: Bucket<Declaration>,
  pub outputs: Bucket<Declaration>,
  pub structs: Structs,
  /// Source lines, with dead branches removed.
  pub lines: Vec<String>
}

impl ShaderInspection {
  /// Reassembled source.
  pub fn source(&self) -> String {
    self.lines.join("\n")
  }
}

/// Inspection of a vertex + fragment program.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProgramInspection {
  /// Vertex attributes and inputs.
  pub inputs: Bucket<Declaration>,
  /// Uniforms of both stages.
  pub uniforms: Bucket<Declaration>,
  pub varying: Bucket<Declaration>,
  pub structs: Structs,
  pub vertex_shader: String,
  pub fragment_shader: String
}

/// The shader inspector.
///
/// An inspector holds no state besides its compiled patterns: it can be shared between threads
/// and used for any number of inspections.
#[derive(Clone, Debug, Default)]
pub struct Inspector {
  preprocessor: Preprocessor,
  qualifiers: QualifierScanner,
  structs: StructScanner,
  uniforms: UniformFixup
}

impl Inspector {
  pub fn new() -> Self {
    Self::default()
  }

  /// A lazily built, process-wide inspector.
  pub fn shared() -> &'static Inspector {
    static INSPECTOR: OnceLock<Inspector> = OnceLock::new();
    INSPECTOR.get_or_init(Inspector::new)
  }

  /// Inspect a single shader stage.
  pub fn inspect_shader(&self, source: &str) -> ShaderInspection {
    let preprocessed = self.preprocessor.preprocess(source);
    let qualified = self.qualifiers.scan(&preprocessed.lines);
    let structs = self.structs.scan(&preprocessed.lines.join("\n"));

    let mut uniforms = self.uniforms.fixup_uniforms(&qualified.uniforms, &structs, &preprocessed.defines);
    self.uniforms.assign_texture_registers(&mut uniforms);

    ShaderInspection {
      defines: preprocessed.defines,
      constants: qualified.constants,
      attributes: qualified.attributes,
      uniforms,
      varying: qualified.varying,
      inputs: qualified.inputs,
      outputs: qualified.outputs,
      structs,
      lines: preprocessed.lines
    }
  }

  /// Inspect a program.
  ///
  /// Vertex attributes and inputs are merged as the program inputs. Uniforms of both stages are
  /// merged, a fragment uniform replacing a vertex uniform bound under the same name. Empty
  /// sources are skipped.
  pub fn inspect_program(&self, vertex: &str, fragment: &str) -> ProgramInspection {
    let mut result = ProgramInspection::default();

    if !vertex.is_empty() {
      let inspection = self.inspect_shader(vertex);
      result.vertex_shader = inspection.source();
      result.inputs.merge(inspection.attributes);
      result.inputs.merge(inspection.inputs);
      result.uniforms.merge(inspection.uniforms);
      result.varying.merge(inspection.varying);
      result.structs.extend(inspection.structs);
    }

    if !fragment.is_empty() {
      let inspection = self.inspect_shader(fragment);
      result.fragment_shader = inspection.source();

      for (key, uniform) in inspection.uniforms.iter() {
        if let Some(previous) = result.uniforms.get(key) {
          if previous.ty != uniform.ty {
            warn!(
              "fragment uniform {} ({}) replaces vertex uniform {} ({})",
              key, uniform.ty, previous.name, previous.ty
            );
          }
        }
      }

      result.uniforms.merge(inspection.uniforms);
      result.varying.merge(inspection.varying);
      result.structs.extend(inspection.structs);
    }

    result
  }
}

/// Inspect a single shader stage with the shared inspector.
pub fn inspect_shader(source: &str) -> ShaderInspection {
  Inspector::shared().inspect_shader(source)
}

/// Inspect a vertex + fragment program with the shared inspector.
pub fn inspect_program(vertex: &str, fragment: &str) -> ProgramInspection {
  Inspector::shared().inspect_program(vertex, fragment)
}
