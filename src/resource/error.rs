//! Error that might occur while loading or writing resources.

use std::error;
use std::fmt;
use std::path::PathBuf;

/// Error that might occur while loading or writing resources.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
  /// The resource couldn’t be loaded from the file system.
  CannotLoadFromFS(PathBuf, Reason),
  /// The resource was read but couldn’t be decoded.
  CannotParse(PathBuf, Reason),
  /// The resource couldn’t be written to the file system.
  CannotWrite(PathBuf, Reason)
}

/// Reason of a failure.
pub type Reason = String;

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      Error::CannotLoadFromFS(ref path, ref reason) =>
        write!(f, "cannot load {} from file system: {}", path.display(), reason),

      Error::CannotParse(ref path, ref reason) =>
        write!(f, "cannot parse {}: {}", path.display(), reason),

      Error::CannotWrite(ref path, ref reason) =>
        write!(f, "cannot write {}: {}", path.display(), reason)
    }
  }
}

impl error::Error for Error {}
