use std::fs;
use std::io;
use std::path::Path;

/// Write `content` to `path`, creating missing parent directories first.
pub fn write_file(path: impl AsRef<Path>, content: &str) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

pub fn read_file(path: impl AsRef<Path>) -> io::Result<String> {
    fs::read_to_string(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/nested/lead_report.md");

        write_file(&path, "# Leads\n").unwrap();

        assert_eq!(read_file(&path).unwrap(), "# Leads\n");
    }

    #[test]
    fn write_file_without_parent_component() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        write_file(&path, "flat").unwrap();

        assert_eq!(read_file(&path).unwrap(), "flat");
    }

    #[test]
    fn read_file_missing_path_errors() {
        assert!(read_file("/nonexistent_leadgen_path/report.md").is_err());
    }
}
