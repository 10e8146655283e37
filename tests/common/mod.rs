use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Build a throwaway project directory from (relative path, contents) pairs.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp project");
    for (relative, contents) in files {
        write_file(dir.path(), relative, contents);
    }
    dir
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write fixture file");
}

pub fn read_file(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).expect("read fixture file")
}
