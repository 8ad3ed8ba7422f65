//! File plumbing shared by the generators: tolerant source reads, the
//! generated-file banner, and change-detecting writes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use crate::console;

/// Read a source file as text. Undecodable bytes are replaced rather than
/// fatal; a missing or unreadable file is an error, since nothing downstream
/// can work without it.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read source file: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Banner prepended to every emitted file.
pub fn make_header(tool_name: Option<&str>, comment: &str) -> String {
    let tool_line = match tool_name {
        Some(name) => format!("//   by {name}\n"),
        None => String::new(),
    };
    let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        "//------------------------------------------------------------------------\n\
         // {comment} - DO NOT EDIT\n\
         //   This file was automatically generated.\n\
         {tool_line}\
         //   Generated: {stamp}\n\
         //------------------------------------------------------------------------\n\
         \n"
    )
}

/// Write `content` to `path` unless the file already holds exactly those
/// bytes. Returns true when the file was (re)written. `force` skips the
/// comparison. The write is wholesale, not atomic.
pub fn write_if_changed(path: &Path, content: &str, force: bool) -> Result<bool> {
    if !force {
        if let Ok(old) = fs::read(path) {
            if old == content.as_bytes() {
                console::info(format!("Already up-to-date: {}", path.display()));
                return Ok(false);
            }
        }
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, content).with_context(|| format!("failed to write: {}", path.display()))?;
    console::success(format!("Written: {}", path.display()));
    Ok(true)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_tool_name_and_comment() {
        let header = make_header(Some("metagen config"), "GENERATED CONFIG FUNCTIONS");
        assert!(header.contains("// GENERATED CONFIG FUNCTIONS - DO NOT EDIT"));
        assert!(header.contains("//   by metagen config"));
        assert!(header.contains("//   Generated: "));
        assert!(header.ends_with("\n\n"));
    }

    #[test]
    fn header_without_tool_name_has_no_by_line() {
        let header = make_header(None, "GENERATED");
        assert!(!header.contains("//   by"));
    }

    #[test]
    fn write_is_skipped_when_content_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/generated.h");

        assert!(write_if_changed(&path, "content\n", false).unwrap());
        // second run with identical content must be a read-compare no-op
        assert!(!write_if_changed(&path, "content\n", false).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "content\n");

        assert!(write_if_changed(&path, "changed\n", false).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "changed\n");
    }

    #[test]
    fn force_rewrites_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.h");
        assert!(write_if_changed(&path, "content\n", false).unwrap());
        assert!(write_if_changed(&path, "content\n", true).unwrap());
    }

    #[test]
    fn read_source_replaces_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.h");
        fs::write(&path, b"int a;\xff\xfeint b;").unwrap();
        let text = read_source(&path).unwrap();
        assert!(text.contains("int a;"));
        assert!(text.contains("int b;"));
    }

    #[test]
    fn read_source_fails_loudly_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_source(&dir.path().join("missing.h")).is_err());
    }
}
