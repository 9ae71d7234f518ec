use std::env::var;
use std::fs::{read_dir, DirEntry, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn main() -> io::Result<()> {
  let out_dir = var("OUT_DIR").expect("OUT_DIR");
  let manifest_dir = PathBuf::from(var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
  let data_dir = manifest_dir.join("data");

  println!("cargo:rerun-if-changed={}", data_dir.display());

  let mut resources: Vec<(PathBuf, PathBuf)> = Vec::new();

  visit_dirs(&data_dir, &mut |entry| {
    let path = entry.path();

    if let Ok(relative) = path.strip_prefix(&manifest_dir) {
      resources.push((relative.to_owned(), path.clone()));
    }
  })?;

  resources.sort();

  let mut manifest = File::create(Path::new(&out_dir).join("resources.rs"))?;

  writeln!(&mut manifest, "use std::path::PathBuf;")?;
  writeln!(&mut manifest, "pub fn get_resources() -> Vec<(PathBuf, &'static [u8])> {{")?;
  writeln!(&mut manifest, "  let mut resources = Vec::new();")?;

  for (name, path) in &resources {
    println!("cargo:rerun-if-changed={}", path.display());
    writeln!(
      &mut manifest,
      "  resources.push((PathBuf::from({:?}), include_bytes!({:?}).as_ref()));",
      name,
      path
    )?;
  }

  writeln!(&mut manifest, "  resources")?;
  writeln!(&mut manifest, "}}") // get_resources
}

fn visit_dirs<P, F>(dir: P, visitor: &mut F) -> io::Result<()> where P: AsRef<Path>, F: FnMut(&DirEntry) {
  let dir = dir.as_ref();

  if dir.is_dir() {
    for entry in read_dir(dir)? {
      let entry = entry?;
      let path = entry.path();

      if path.is_dir() {
        visit_dirs(path, visitor)?;
      } else {
        visitor(&entry);
      }
    }
  }

  Ok(())
}
