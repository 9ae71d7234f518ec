//! GLSL shader blocks.
//!
//! This crate assembles GLSL sources out of reusable blocks and statically inspects the result to
//! recover the declarations a renderer binds data to:
//!
//! - [`shader::block`] expands `#pragma block:NAME` markers against fragment maps and defines;
//! - [`shader::inspect`] preprocesses a source, scans its top-level declarations and their
//!   `// @key value` annotations, flattens struct and array uniforms and assigns texture
//!   registers to samplers.
//!
//! Neither step ever fails on malformed GLSL: the GPU compiler has the final word.

pub mod logger;
pub mod resource;
pub mod shader;

pub use crate::shader::{
  compose, format_info_log, inspect_program, inspect_shader, ComposedProgram, Define, Defines,
  FragmentMap, ProgramBlocks, ProgramInspection, ShaderInspection, Template
};
