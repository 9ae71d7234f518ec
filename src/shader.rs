//! Shader blocks, composition and inspection.
//!
//! Shaders are built out of *blocks* ([`block`]) and the composed sources are then *inspected*
//! ([`inspect`]) to recover what a renderer needs to feed them: inputs, uniforms, texture units…

pub mod block;
pub mod info_log;
pub mod inspect;
pub mod program;

pub use self::block::{compose, expand, render_defines, Composer, Define, Defines, FragmentMap, Template};
pub use self::info_log::format_info_log;
pub use self::inspect::{inspect_program, inspect_shader, Inspector, ProgramInspection, ShaderInspection};
pub use self::program::{ComposedProgram, ProgramBlocks};
