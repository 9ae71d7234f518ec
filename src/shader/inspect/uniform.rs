//! Uniform fix-up.
//!
//! The host binds uniforms one leaf value at a time, so struct and array uniforms are flattened:
//!
//! - `uniform vec3 uLights[4];` (binding `Lights`) becomes `Lights0` … `Lights3`;
//! - `uniform Material uMat;` becomes one entry per field, `uMata`, `uMatb`…;
//! - `uniform Light uL[2];` becomes `uL0a`, `uL0b`, `uL1a`, `uL1b`.
//!
//! Array counts may be macro names; they are resolved through the preprocessor’s defines.
//!
//! Samplers are then given a texture register each.

use log::{debug, warn};
use regex::Regex;
use std::collections::BTreeSet;

use crate::shader::inspect::preprocess::Defines;
use crate::shader::inspect::syntax::{Bucket, Declaration, Structs};

/// Largest array count that gets flattened.
pub const MAX_ARRAY_COUNT: u32 = 1024;

/// The uniform fixer.
#[derive(Clone, Debug)]
pub struct UniformFixup {
  array: Regex,
  sampler: Regex
}

impl Default for UniformFixup {
  fn default() -> Self {
    Self::new()
  }
}

impl UniformFixup {
  pub fn new() -> Self {
    UniformFixup {
      array: Regex::new(r"^\s*(\w+)\s*\[\s*([^\]]+?)\s*\]").expect("array regex"),
      sampler: Regex::new(r"sampler(2D|2DArray|2DArrayShadow|3D|Cube|CubeShadow)|[iu]?sampler(2D|3D|Cube|2DArray)")
        .expect("sampler regex")
    }
  }

  /// Is the type a sampler type?
  pub fn is_sampler(&self, ty: &str) -> bool {
    self.sampler.is_match(ty)
  }

  /// Flatten struct and array uniforms.
  ///
  /// Flattened entries take the place of the uniform they come from.
  pub fn fixup_uniforms(
    &self,
    uniforms: &Bucket<Declaration>,
    structs: &Structs,
    defines: &Defines
  ) -> Bucket<Declaration> {
    let mut fixed = Bucket::new();

    for (key, uniform) in uniforms.iter() {
      let fields = structs.get(&uniform.ty);

      match (self.array.captures(&uniform.name), fields) {
        (Some(caps), None) => {
          let base = &caps[1];
          let binding = uniform.binding.as_deref().unwrap_or(base);

          for i in 0..self.count(&caps[2], defines) {
            let element = flattened(uniform, format!("{}[{}]", base, i), &uniform.ty);
            insert_flattened(&mut fixed, format!("{}{}", binding, i), element);
          }
        }

        (Some(caps), Some(fields)) => {
          let base = &caps[1];
          let binding = uniform.binding.as_deref().unwrap_or(base);

          for i in 0..self.count(&caps[2], defines) {
            for field in fields.values() {
              let element = flattened(uniform, format!("{}[{}].{}", base, i, field.name), &field.ty);
              insert_flattened(&mut fixed, format!("{}{}{}", binding, i, field.name), element);
            }
          }
        }

        (None, Some(fields)) => {
          let binding = uniform.key();

          for field in fields.values() {
            let element = flattened(uniform, format!("{}.{}", uniform.name, field.name), &field.ty);
            insert_flattened(&mut fixed, format!("{}{}", binding, field.name), element);
          }
        }

        (None, None) => {
          fixed.insert(key, uniform.clone());
        }
      }
    }

    fixed
  }

  /// Resolve an array count, possibly through a macro.
  ///
  /// Counts that don’t resolve to a number, or exceed [`MAX_ARRAY_COUNT`], yield no element at all.
  fn count(&self, count: &str, defines: &Defines) -> u32 {
    let resolved = match defines.get(count) {
      Some(value) if !value.is_empty() => value.as_str(),
      _ => count
    };

    match resolved.trim().parse() {
      Ok(n) if n > MAX_ARRAY_COUNT => {
        warn!("uniform array count {} ({}) exceeds {}", count, n, MAX_ARRAY_COUNT);
        0
      }
      Ok(n) => n,
      Err(_) => {
        warn!("cannot resolve uniform array count {} ({})", count, resolved);
        0
      }
    }
  }

  /// Give every sampler uniform a texture register.
  ///
  /// Samplers with a register annotation keep it; the others get the lowest free register, in
  /// order.
  pub fn assign_texture_registers(&self, uniforms: &mut Bucket<Declaration>) {
    let mut used: BTreeSet<u32> = uniforms
      .values()
      .filter(|u| self.is_sampler(&u.ty))
      .filter_map(|u| u.register)
      .collect();

    for (key, uniform) in uniforms
      .values_mut()
      .filter(|u| self.is_sampler(&u.ty) && u.register.is_none())
      .map(|u| (u.key().to_owned(), u))
    {
      let register = (0..).find(|r| !used.contains(r)).unwrap_or(0);
      used.insert(register);
      uniform.register = Some(register);
      debug!("assigned texture register {} to {}", register, key);
    }
  }
}

// A flattened entry of a struct or array uniform.
fn flattened(from: &Declaration, name: String, ty: &str) -> Declaration {
  Declaration {
    name,
    ty: ty.to_owned(),
    binding: None,
    layout: from.layout.clone(),
    register: None,
    value: None,
    annotations: from.annotations.clone()
  }
}

fn insert_flattened(bucket: &mut Bucket<Declaration>, binding: String, mut element: Declaration) {
  debug!("flattened uniform {} as {}", element.name, binding);
  element.binding = Some(binding.clone());
  bucket.insert(binding, element);
}
