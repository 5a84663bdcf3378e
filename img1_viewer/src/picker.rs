use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::controller::OpenDialog;

/// Open dialog that steps through the `*.img` files of one directory.
///
/// Each pick rescans the directory and returns the file after the previous
/// pick, wrapping around. An empty directory behaves like a cancelled dialog.
pub struct DirectoryPicker {
    root: PathBuf,
    last: Option<PathBuf>,
}

impl DirectoryPicker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            last: None,
        }
    }

    /// Continue after `path` on the next pick.
    pub fn start_after(mut self, path: &Path) -> Self {
        self.last = Some(path.to_path_buf());
        self
    }

    fn scan(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("skipping unreadable entry in {}: {err}", self.root.display());
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("img"))
            })
            .collect();
        files.sort();
        files
    }
}

impl OpenDialog for DirectoryPicker {
    fn pick_image(&mut self) -> Option<PathBuf> {
        let files = self.scan();
        if files.is_empty() {
            debug!("no .img files in {}", self.root.display());
            return None;
        }
        let next = match self
            .last
            .as_ref()
            .and_then(|last| files.iter().position(|file| file == last))
        {
            Some(index) => (index + 1) % files.len(),
            None => 0,
        };
        let picked = files[next].clone();
        self.last = Some(picked.clone());
        Some(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn cycles_img_files_in_name_order() {
        let dir = tempdir().unwrap();
        for name in ["b.img", "a.IMG", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.img")).unwrap();

        let mut picker = DirectoryPicker::new(dir.path());
        assert_eq!(picker.pick_image(), Some(dir.path().join("a.IMG")));
        assert_eq!(picker.pick_image(), Some(dir.path().join("b.img")));
        assert_eq!(picker.pick_image(), Some(dir.path().join("a.IMG")));
    }

    #[test]
    fn resumes_after_current_file() {
        let dir = tempdir().unwrap();
        for name in ["a.img", "b.img", "c.img"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let mut picker = DirectoryPicker::new(dir.path()).start_after(&dir.path().join("b.img"));
        assert_eq!(picker.pick_image(), Some(dir.path().join("c.img")));
    }

    #[test]
    fn empty_directory_cancels() {
        let dir = tempdir().unwrap();
        let mut picker = DirectoryPicker::new(dir.path());
        assert_eq!(picker.pick_image(), None);
    }
}
