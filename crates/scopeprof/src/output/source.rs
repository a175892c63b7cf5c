//! Source snippets for line reports.

use crate::utils::config::SOURCE_UNAVAILABLE;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Lines of the files referenced by one report, read once per render
#[derive(Debug, Default)]
pub struct SourceCache {
    files: HashMap<String, Option<Vec<String>>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of `line` (1-based) in `file`, without its line ending
    pub fn line(&mut self, file: &str, line: u32) -> Option<&str> {
        let lines = self
            .files
            .entry(file.to_string())
            .or_insert_with(|| read_lines(file))
            .as_ref()?;
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        lines.get(index).map(String::as_str)
    }

    /// Snippets for a sequence of lines, dedented together
    ///
    /// Unreadable lines are rendered as a placeholder and do not take part
    /// in the dedent.
    pub fn snippets<'a>(&mut self, lines: impl IntoIterator<Item = (&'a str, u32)>) -> Vec<String> {
        let raw: Vec<Option<String>> = lines
            .into_iter()
            .map(|(file, line)| self.line(file, line).map(|text| text.trim_end().to_string()))
            .collect();

        let found: Vec<&str> = raw.iter().flatten().map(String::as_str).collect();
        let mut dedented = dedent(&found).into_iter();

        raw.iter()
            .map(|line| match line {
                Some(_) => dedented.next().unwrap_or_default(),
                None => SOURCE_UNAVAILABLE.to_string(),
            })
            .collect()
    }
}

/// Resolve a `file!()` path: as given, then against ancestors of the
/// working directory (`file!()` is relative to the workspace root, tests run
/// from the package root)
fn resolve(file: &str) -> Option<PathBuf> {
    let path = Path::new(file);
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if path.is_absolute() {
        return None;
    }
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.is_file())
}

fn read_lines(file: &str) -> Option<Vec<String>> {
    let Some(path) = resolve(file) else {
        debug!("Source file not found: {}", file);
        return None;
    };
    match fs::read_to_string(&path) {
        Ok(contents) => Some(contents.lines().map(str::to_string).collect()),
        Err(e) => {
            debug!("Cannot read source {}: {}", path.display(), e);
            None
        }
    }
}

/// Smallest leading whitespace across non-blank lines, in bytes
pub fn common_indent(lines: &[&str]) -> usize {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0)
}

/// Remove the common indentation from each line
pub fn dedent(lines: &[&str]) -> Vec<String> {
    let indent = common_indent(lines);
    lines
        .iter()
        .map(|line| strip_indent(line, indent).to_string())
        .collect()
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let leading = line.len() - line.trim_start().len();
    &line[leading.min(indent)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_dedent_uses_minimum_indent() {
        let lines = ["        let x = 1;", "    for i in 0..3 {", "            x += i;", ""];
        assert_eq!(
            dedent(&lines),
            vec!["    let x = 1;", "for i in 0..3 {", "        x += i;", ""]
        );
    }

    #[test]
    fn test_dedent_mixed_tabs_and_spaces() {
        let lines = ["\tfoo();", "    bar();"];
        assert_eq!(common_indent(&lines), 1);
        assert_eq!(dedent(&lines), vec!["foo();", "   bar();"]);
    }

    #[test]
    fn test_snippets_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "fn work() {{\n    let a = 1;\n        let b = a + 1;\n}}").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let mut cache = SourceCache::new();
        let snippets = cache.snippets([(path.as_str(), 2), (path.as_str(), 3), (path.as_str(), 99)]);
        assert_eq!(
            snippets,
            vec!["let a = 1;", "    let b = a + 1;", SOURCE_UNAVAILABLE]
        );
    }

    #[test]
    fn test_snippets_skip_unreadable_lines_when_dedenting() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "        first();\n            second();").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let mut cache = SourceCache::new();
        let snippets = cache.snippets([
            (path.as_str(), 2),
            ("does/not/exist.rs", 1),
            (path.as_str(), 1),
        ]);
        assert_eq!(snippets, vec!["    second();", SOURCE_UNAVAILABLE, "first();"]);
    }

    #[test]
    fn test_missing_file() {
        let mut cache = SourceCache::new();
        assert!(cache.line("does/not/exist.rs", 1).is_none());
        assert!(cache.line("does/not/exist.rs", 0).is_none());
        assert_eq!(
            cache.snippets([("does/not/exist.rs", 4)]),
            vec![SOURCE_UNAVAILABLE]
        );
    }
}
