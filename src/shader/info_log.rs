//! Driver info logs.
//!
//! GPU drivers report compilation errors against line numbers of the source they were handed,
//! which after composition has little to do with the files the blocks were written in. The
//! formatter below interleaves each error line of a log with the source lines around it:
//!
//! ```text
//! ERROR: 0:12: 'x' : undeclared identifier
//!     2:  uniform float uTime;
//! …
//! >  12:    gl_FragColor = vec4(x);
//! …
//! ```

use regex::Regex;
use std::sync::OnceLock;

// Lines shown before and after the offending one.
const CONTEXT_BEFORE: usize = 10;
const CONTEXT_AFTER: usize = 10;

fn error_line() -> &'static Regex {
  static ERROR_LINE: OnceLock<Regex> = OnceLock::new();
  ERROR_LINE.get_or_init(|| Regex::new(r"^\s*(\w+)\s*:\s*(\d+)\s*:\s*(\d+)\s*:").expect("info log regex"))
}

/// Annotate an info log with the source it was produced for.
pub fn format_info_log(log: &str, source: &str) -> String {
  if log.is_empty() {
    return String::new();
  }

  let source_lines = source.split('\n').collect::<Vec<_>>();
  let mut result = Vec::new();

  for line in log.split('\n') {
    result.push(line.to_owned());

    let offending = match error_line().captures(line).and_then(|caps| caps[3].parse::<usize>().ok()) {
      Some(n) if n > 0 => n - 1,
      _ => continue
    };

    let start = offending.saturating_sub(CONTEXT_BEFORE);
    let end = (offending + CONTEXT_AFTER).min(source_lines.len());

    for i in start..end {
      let mut number = format!("{:>5}", i + 1);

      if i == offending {
        number.replace_range(..1, ">");
      }

      result.push(format!("{}:  {}", number, source_lines[i]));
    }
  }

  result.join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn source(lines: usize) -> String {
    (1..=lines).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n")
  }

  #[test]
  fn empty_log() {
    assert_eq!(format_info_log("", "void main() {}"), "");
  }

  #[test]
  fn log_without_locations_is_kept() {
    assert_eq!(format_info_log("link failed\nsomething else", "x"), "link failed\nsomething else");
  }

  #[test]
  fn context_around_offending_line() {
    let formatted = format_info_log("ERROR: 0:15: 'x' : undeclared identifier", &source(40));
    let lines = formatted.lines().collect::<Vec<_>>();

    assert_eq!(lines[0], "ERROR: 0:15: 'x' : undeclared identifier");
    assert_eq!(lines.len(), 1 + 20);
    assert_eq!(lines[1], "    5:  line5");
    assert_eq!(lines[11], ">  15:  line15");
    assert_eq!(lines[20], "   24:  line24");
  }

  #[test]
  fn context_is_clamped() {
    let formatted = format_info_log("ERROR: 0:2: '}' : syntax error", &source(3));
    let lines = formatted.lines().collect::<Vec<_>>();

    assert_eq!(lines, vec!["ERROR: 0:2: '}' : syntax error", "    1:  line1", ">   2:  line2", "    3:  line3"]);
  }

  #[test]
  fn line_zero_has_no_context() {
    assert_eq!(format_info_log("WARNING: 0:0: something", "a\nb"), "WARNING: 0:0: something");
  }
}
