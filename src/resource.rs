//! Resource loading.
//!
//! Block descriptions and GLSL files live on the file system. Loading them goes through
//! [`load_with`], which logs what gets loaded and how long it took.

pub mod error;

use log::info;
use std::fs;
use std::path::Path;
use std::time::Instant;

pub use self::error::{Error, Reason};
use crate::shader::ProgramBlocks;

/// Result of resource operations.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Class of types that can be loaded from the file system.
pub trait Load: Sized {
  /// Human readable description of the type, used in logs.
  const TYPE_DESC: &'static str;

  /// Decode the resource from the content of the file at `path`.
  fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self>;

  /// Load the resource at `path`.
  fn load<P>(path: P) -> Result<Self> where P: AsRef<Path> {
    let path = path.as_ref();

    load_with::<Self, _, _>(path, || {
      let bytes = fs::read(path).map_err(|e| Error::CannotLoadFromFS(path.to_owned(), e.to_string()))?;
      Self::from_bytes(path, &bytes)
    })
  }
}

impl Load for ProgramBlocks {
  const TYPE_DESC: &'static str = "program blocks";

  fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self> {
    serde_json::from_slice(bytes).map_err(|e| Error::CannotParse(path.to_owned(), e.to_string()))
  }
}

/// Plain GLSL source.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct GlslSource(pub String);

impl Load for GlslSource {
  const TYPE_DESC: &'static str = "GLSL source";

  fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self> {
    String::from_utf8(bytes.to_owned())
      .map(GlslSource)
      .map_err(|e| Error::CannotParse(path.to_owned(), e.to_string()))
  }
}

impl AsRef<str> for GlslSource {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// Run a loader, logging the load and its duration.
#[inline]
pub fn load_with<T, A, F>(
  path: &Path,
  loader: F
) -> A
where F: FnOnce() -> A,
      T: Load {
  info!("loading \x1b[0;35m{}\x1b[0m \x1b[1;32m{}\x1b[0m", T::TYPE_DESC, path.display());

  let start_time = Instant::now();
  let a = loader();
  let t = start_time.elapsed();
  let ns = t.as_secs() as f64 * 1e9 + t.subsec_nanos() as f64;
  let (pretty_time, suffix) = load_time(ns);

  info!("loaded \x1b[0;35m{}\x1b[0m \x1b[1;32m{}\x1b[0m: \x1b[1;31m{:.3}{}\x1b[0m", T::TYPE_DESC, path.display(), pretty_time, suffix);

  a
}

fn load_time<'a>(ns: f64) -> (f64, &'a str) {
  if ns >= 1e9 {
    (ns * 1e-9, "s")
  } else if ns >= 1e6 {
    (ns * 1e-6, "ms")
  } else if ns >= 1e3 {
    (ns * 1e-3, "μs")
  } else {
    (ns, "ns")
  }
}

/// Write `bytes` at `path`, creating missing parent directories.
pub fn write<P>(path: P, bytes: &[u8]) -> Result<()> where P: AsRef<Path> {
  let path = path.as_ref();
  let fail = |e: std::io::Error| Error::CannotWrite(path.to_owned(), e.to_string());

  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(fail)?;
  }

  fs::write(path, bytes).map_err(fail)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::env::temp_dir;
  use std::path::PathBuf;

  fn scratch(name: &str) -> PathBuf {
    temp_dir().join(format!("glsl-blocks-{}-{}", std::process::id(), name))
  }

  #[test]
  fn pretty_load_time() {
    assert_eq!(load_time(12.), (12., "ns"));
    assert_eq!(load_time(4_000.).1, "μs");
    assert_eq!(load_time(2_500_000.).1, "ms");
    assert_eq!(load_time(3e9).1, "s");
  }

  #[test]
  fn load_program_blocks() {
    let path = scratch("blocks.json");
    write(&path, br#"{"fragment": "void main() {}", "defines": {"A": 1}}"#).unwrap();

    let blocks = ProgramBlocks::load(&path).unwrap();
    assert_eq!(blocks.compose().fragment, "void main() {}\n");

    fs::remove_file(&path).unwrap();
  }

  #[test]
  fn missing_file() {
    let path = scratch("missing.json");

    match ProgramBlocks::load(&path) {
      Err(Error::CannotLoadFromFS(p, _)) => assert_eq!(p, path),
      r => panic!("unexpected result: {:?}", r)
    }
  }

  #[test]
  fn bad_json() {
    let path = scratch("bad.json");
    write(&path, b"{ nope").unwrap();

    match ProgramBlocks::load(&path) {
      Err(Error::CannotParse(p, _)) => assert_eq!(p, path),
      r => panic!("unexpected result: {:?}", r)
    }

    fs::remove_file(&path).unwrap();
  }

  #[test]
  fn load_glsl() {
    let path = scratch("nested/shader.frag");
    write(&path, b"uniform float uTime;\n").unwrap();

    let source = GlslSource::load(&path).unwrap();
    assert_eq!(source.as_ref(), "uniform float uTime;\n");

    fs::remove_dir_all(path.parent().unwrap()).unwrap();
  }
}
