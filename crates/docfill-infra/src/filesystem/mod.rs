//! Filesystem adapters for docfill.
//!
//! Template bodies and intake answers live as plain files under the data
//! directory:
//!
//! ```text
//! {data_dir}/
//!   config.toml
//!   docfill.db
//!   templates/{template_id}
//!   intakes/{intake_id}.json
//! ```

pub mod answer;
pub mod template;

use std::path::{Path, PathBuf};

use docfill_types::error::RepositoryError;

pub use answer::{LocalAnswerStore, load_answers_file};
pub use template::LocalTemplateStore;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `DOCFILL_DATA_DIR` environment variable
/// 2. `~/.docfill`
/// 3. `./.docfill`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DOCFILL_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".docfill");
    }

    PathBuf::from(".docfill")
}

pub fn templates_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("templates")
}

pub fn intakes_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("intakes")
}

/// Join a caller-supplied id onto `root`, refusing anything that could
/// escape it.
pub(crate) fn contained_path(root: &Path, id: &str) -> Result<PathBuf, RepositoryError> {
    let escapes = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.contains('\0');
    if escapes {
        return Err(RepositoryError::Query(format!("invalid id: '{id}'")));
    }
    Ok(root.join(id))
}

/// Map an I/O error on a keyed read to a repository error.
pub(crate) fn read_error(err: std::io::Error) -> RepositoryError {
    if err.kind() == std::io::ErrorKind::NotFound {
        RepositoryError::NotFound
    } else {
        RepositoryError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let root = Path::new("/data");
        assert_eq!(templates_dir(root), PathBuf::from("/data/templates"));
        assert_eq!(intakes_dir(root), PathBuf::from("/data/intakes"));
    }

    #[test]
    fn test_contained_path_rejects_traversal() {
        let root = Path::new("/data/templates");
        assert!(contained_path(root, "../secret").is_err());
        assert!(contained_path(root, "..").is_err());
        assert!(contained_path(root, "a\\b").is_err());
        assert!(contained_path(root, "").is_err());
        assert_eq!(
            contained_path(root, "trust.html").unwrap(),
            PathBuf::from("/data/templates/trust.html")
        );
    }

    #[test]
    fn test_read_error_mapping() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(read_error(missing), RepositoryError::NotFound));
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        assert!(matches!(read_error(denied), RepositoryError::Io(_)));
    }
}
