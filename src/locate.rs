use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

/// Resolve `pattern` (relative to `root`) to the matching files, sorted by path.
/// No match is an empty vector, not an error.
#[tracing::instrument(level = "debug", skip(root), fields(root = %root.display()))]
pub fn locate_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = format!(
        "{}/{}",
        Pattern::escape(&root.to_string_lossy()),
        pattern.trim_start_matches("./")
    );
    let mut paths = Vec::new();
    for entry in glob(&full)? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => warn!("skipping unreadable glob entry: {}", e),
        }
    }
    paths.sort();
    debug!(count = paths.len(), "located files");
    Ok(paths)
}

/// First match of `pattern` under `dir`, by path order.
pub fn locate_first(dir: &Path, pattern: &str) -> Result<Option<PathBuf>> {
    Ok(locate_files(dir, pattern)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sorted_and_recursive() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("source/2024/05"))?;
        fs::write(dir.path().join("source/b_report.csv"), "a\n1\n")?;
        fs::write(dir.path().join("source/a_report.csv"), "a\n1\n")?;
        fs::write(dir.path().join("source/2024/05/c_report.csv"), "a\n1\n")?;
        fs::write(dir.path().join("source/notes.txt"), "x")?;

        let found = locate_files(dir.path(), "source/**/*_report.csv")?;
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("source/2024/05/c_report.csv"),
                PathBuf::from("source/a_report.csv"),
                PathBuf::from("source/b_report.csv"),
            ]
        );
        Ok(())
    }

    #[test]
    fn no_match_is_empty() -> Result<()> {
        let dir = tempdir()?;
        assert!(locate_files(dir.path(), "source/*.csv")?.is_empty());
        assert!(locate_first(dir.path(), "*.xlsx")?.is_none());
        Ok(())
    }

    #[test]
    fn directories_are_not_files() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("report.csv"))?;
        assert!(locate_files(dir.path(), "*.csv")?.is_empty());
        Ok(())
    }

    #[test]
    fn bad_pattern_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(locate_files(dir.path(), "source/[a.csv").is_err());
    }
}
