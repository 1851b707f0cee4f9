use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFormat {
    PlainText,
    Pdf,
}

impl SupportedFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "md" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(path.extension()?.to_str()?)
    }
}

/// Recursively collect supported documents under `dir`, sorted by path.
/// Hidden directories are skipped.
pub fn walk_directory(dir: &Path) -> Vec<(PathBuf, SupportedFormat)> {
    let mut files: Vec<(PathBuf, SupportedFormat)> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry.file_name().to_string_lossy().starts_with('.')
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let path = entry.into_path();
            let format = SupportedFormat::from_path(&path)?;
            Some((path, format))
        })
        .collect();

    files.sort_by(|a, b| a.0.cmp(&b.0));
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_from_extension_is_case_insensitive() {
        assert_eq!(SupportedFormat::from_extension("PDF"), Some(SupportedFormat::Pdf));
        assert_eq!(SupportedFormat::from_extension("md"), Some(SupportedFormat::PlainText));
        assert_eq!(SupportedFormat::from_extension("docx"), None);
    }

    #[test]
    fn test_walk_finds_supported_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::write(dir.path().join("image.png"), b"png").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.md"), "# c").unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join(".cache").join("skip.txt"), "skip").unwrap();

        let files = walk_directory(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|(p, _)| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(names, vec!["a.txt", "b.pdf", "nested/c.md"]);
        assert_eq!(files[1].1, SupportedFormat::Pdf);
    }

    #[test]
    fn test_hidden_files_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".notes.txt"), "hidden").unwrap();
        fs::write(dir.path().join("a.txt"), "visible").unwrap();

        let names: Vec<String> = walk_directory(dir.path())
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec![".notes.txt", "a.txt"]);
    }
}
