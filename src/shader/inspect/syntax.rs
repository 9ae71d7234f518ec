//! Syntax recovered by the inspector.
//!
//! The inspector doesn’t build a GLSL AST. All it recovers is a flat description of the top-level
//! declarations found in a shader, enriched with the annotations written in the comments right
//! above them.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_derive::Serialize;
use std::collections::BTreeMap;
use std::iter::FromIterator;
use std::str::FromStr;

/// An insertion-ordered map from binding names to values.
///
/// Inserting an already present key replaces its value in place; the entry keeps its position.
/// Buckets are small – a handful of declarations per shader – so lookups are linear.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket<T> {
  entries: Vec<(String, T)>
}

impl<T> Default for Bucket<T> {
  fn default() -> Self {
    Bucket { entries: Vec::new() }
  }
}

impl<T> Bucket<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn get(&self, key: &str) -> Option<&T> {
    self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
  }

  pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
    self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  /// Insert a value, returning the one it replaced, if any.
  pub fn insert<K>(&mut self, key: K, value: T) -> Option<T> where K: Into<String> {
    let key = key.into();

    match self.get_mut(&key) {
      Some(slot) => Some(std::mem::replace(slot, value)),
      None => {
        self.entries.push((key, value));
        None
      }
    }
  }

  pub fn remove(&mut self, key: &str) -> Option<T> {
    let index = self.entries.iter().position(|(k, _)| k == key)?;
    Some(self.entries.remove(index).1)
  }

  /// Merge another bucket into this one; keys of `other` win.
  pub fn merge(&mut self, other: Bucket<T>) {
    for (key, value) in other {
      self.insert(key, value);
    }
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(k, _)| k.as_str())
  }

  pub fn values(&self) -> impl Iterator<Item = &T> {
    self.entries.iter().map(|(_, v)| v)
  }

  pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
    self.entries.iter_mut().map(|(_, v)| v)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }
}

impl<T> IntoIterator for Bucket<T> {
  type Item = (String, T);
  type IntoIter = std::vec::IntoIter<(String, T)>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.into_iter()
  }
}

impl<K, T> FromIterator<(K, T)> for Bucket<T> where K: Into<String> {
  fn from_iter<I>(iter: I) -> Self where I: IntoIterator<Item = (K, T)> {
    let mut bucket = Bucket::new();

    for (key, value) in iter {
      bucket.insert(key, value);
    }

    bucket
  }
}

impl<T> Serialize for Bucket<T> where T: Serialize {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;

    for (key, value) in &self.entries {
      map.serialize_entry(key, value)?;
    }

    map.end()
  }
}

/// Storage qualifier of a top-level declaration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StorageClass {
  Const,
  In,
  Out,
  Attribute,
  Varying,
  Uniform,
  Buffer,
  Shared
}

impl FromStr for StorageClass {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "const" => Ok(StorageClass::Const),
      "in" => Ok(StorageClass::In),
      "out" => Ok(StorageClass::Out),
      "attribute" => Ok(StorageClass::Attribute),
      "varying" => Ok(StorageClass::Varying),
      "uniform" => Ok(StorageClass::Uniform),
      "buffer" => Ok(StorageClass::Buffer),
      "shared" => Ok(StorageClass::Shared),
      _ => Err(())
    }
  }
}

/// A parsed top-level declaration.
///
/// `binding` and `register` are lifted out of the annotations; every other `@key value` pair
/// found above the declaration lands in `annotations`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Declaration {
  /// Identifier as written in the source – for flattened uniforms, the GLSL accessor.
  pub name: String,
  #[serde(rename = "type")]
  pub ty: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub binding: Option<String>,
  /// Full `layout(…)` qualifier text, if any.
  pub layout: Option<String>,
  /// Texture unit of a sampler.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub register: Option<u32>,
  /// Initializer of a `const` declaration.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value: Option<String>,
  #[serde(flatten)]
  pub annotations: BTreeMap<String, String>
}

impl Declaration {
  pub fn new<N, T>(name: N, ty: T) -> Self where N: Into<String>, T: Into<String> {
    Declaration {
      name: name.into(),
      ty: ty.into(),
      ..Declaration::default()
    }
  }

  /// Name the host binds this declaration with: the `@binding` annotation, or the identifier.
  pub fn key(&self) -> &str {
    self.binding.as_ref().unwrap_or(&self.name)
  }

  /// Apply a set of parsed annotations.
  pub fn annotate(mut self, mut annotations: BTreeMap<String, String>) -> Self {
    if let Some(binding) = annotations.remove("binding") {
      self.binding = Some(binding);
    }

    if let Some(register) = annotations.remove("register") {
      self.register = register.trim().parse().ok();
    }

    self.annotations = annotations;
    self
  }
}

/// A member of a `struct` declaration.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct StructField {
  pub name: String,
  #[serde(rename = "type")]
  pub ty: String
}

impl StructField {
  pub fn new<N, T>(name: N, ty: T) -> Self where N: Into<String>, T: Into<String> {
    StructField {
      name: name.into(),
      ty: ty.into()
    }
  }
}

/// Struct declarations, by type name.
pub type Structs = BTreeMap<String, Bucket<StructField>>;
