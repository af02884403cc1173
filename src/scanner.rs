use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Regular file with a supported image extension.
    Image(PathBuf),
    /// Directory, special file, or a file with any other extension.
    Unsupported(PathBuf),
}

impl Entry {
    pub fn path(&self) -> &Path {
        match self {
            Entry::Image(path) | Entry::Unsupported(path) => path,
        }
    }
}

/// Case-insensitive extension check; does not touch the filesystem.
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// List the direct children of `dir` sorted by file name, leaving out
/// `exclude` (the output folder of a previous or current run).
pub fn list_entries(dir: &Path, exclude: Option<&Path>) -> Result<Vec<Entry>, walkdir::Error> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        let path = entry.path();

        if exclude.is_some_and(|excluded| path == excluded) {
            continue;
        }

        // is_file follows symlinks, so a link to an image still counts
        if path.is_file() && has_supported_extension(path) {
            entries.push(Entry::Image(path.to_path_buf()));
        } else {
            entries.push(Entry::Unsupported(path.to_path_buf()));
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extension_check_ignores_case() {
        assert!(has_supported_extension(Path::new("a.png")));
        assert!(has_supported_extension(Path::new("b.JPG")));
        assert!(has_supported_extension(Path::new("dir/c.JpEg")));
        assert!(!has_supported_extension(Path::new("d.gif")));
        assert!(!has_supported_extension(Path::new("notes.txt")));
        assert!(!has_supported_extension(Path::new("png")));
    }

    #[test]
    fn test_list_entries_classifies_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("b.PNG"), b"x").unwrap();
        fs::write(root.join("a.jpg"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();
        fs::create_dir(root.join("folder.png")).unwrap();
        fs::write(root.join("folder.png").join("nested.png"), b"x").unwrap();

        let entries = list_entries(root, None).unwrap();
        assert_eq!(
            entries,
            vec![
                Entry::Image(root.join("a.jpg")),
                Entry::Image(root.join("b.PNG")),
                Entry::Unsupported(root.join("folder.png")),
                Entry::Unsupported(root.join("notes.txt")),
            ]
        );
    }

    #[test]
    fn test_list_entries_skips_excluded_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let output = root.join("unique_images");
        fs::create_dir(&output).unwrap();
        fs::write(root.join("a.png"), b"x").unwrap();

        let entries = list_entries(root, Some(&output)).unwrap();
        assert_eq!(entries, vec![Entry::Image(root.join("a.png"))]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list_entries(&temp_dir.path().join("missing"), None).is_err());
    }
}
