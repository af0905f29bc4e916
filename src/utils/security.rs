use std::fmt;
use std::path::{Component, Path};

//===============
// Path Handling
//===============
#[derive(Debug, PartialEq, Eq)]
pub enum PathValidationError {
    ContainsParentDir,
    ContainsSeparator,
    AbsolutePath,
    InvalidComponent,
    NullByte,
    Empty,
}

impl fmt::Display for PathValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValidationError::ContainsParentDir => {
                write!(f, "Path contains parent directory (..)")
            }
            PathValidationError::ContainsSeparator => {
                write!(f, "Name contains a path separator")
            }
            PathValidationError::AbsolutePath => write!(f, "Path is absolute"),
            PathValidationError::InvalidComponent => write!(f, "Path contains invalid component"),
            PathValidationError::NullByte => write!(f, "Path contains null byte"),
            PathValidationError::Empty => write!(f, "Path is empty"),
        }
    }
}

impl std::error::Error for PathValidationError {}

// Served names are a single path segment directly under the served directory.
// no: separators, parent/current dir, absolute paths, null bytes
pub fn validate_filename(filename: &str) -> Result<(), PathValidationError> {
    if filename.is_empty() {
        return Err(PathValidationError::Empty);
    }

    // rust uses C-style APIs so \0 can end str early
    if filename.contains('\0') {
        return Err(PathValidationError::NullByte);
    }

    if filename.contains('/') || filename.contains('\\') {
        return Err(PathValidationError::ContainsSeparator);
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::ParentDir), _) => Err(PathValidationError::ContainsParentDir),
        (Some(Component::RootDir), _) => Err(PathValidationError::AbsolutePath),
        // "." or a Windows prefix never names a served file
        _ => Err(PathValidationError::InvalidComponent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename_parent_directory() {
        assert_eq!(
            validate_filename(".."),
            Err(PathValidationError::ContainsParentDir)
        );
    }

    #[test]
    fn test_validate_filename_rejects_nested_paths() {
        // Traversal hidden in a nested path
        assert_eq!(
            validate_filename("../etc/passwd"),
            Err(PathValidationError::ContainsSeparator)
        );

        assert_eq!(
            validate_filename("dir/file.txt"),
            Err(PathValidationError::ContainsSeparator)
        );

        assert_eq!(
            validate_filename("/etc/passwd"),
            Err(PathValidationError::ContainsSeparator)
        );

        assert_eq!(
            validate_filename("..\\secrets.txt"),
            Err(PathValidationError::ContainsSeparator)
        );
    }

    #[test]
    fn test_validate_filename_current_dir() {
        assert_eq!(
            validate_filename("."),
            Err(PathValidationError::InvalidComponent)
        );
    }

    #[test]
    fn test_validate_filename_null_byte() {
        assert_eq!(
            validate_filename("file\0.txt"),
            Err(PathValidationError::NullByte)
        );

        assert_eq!(
            validate_filename("file.txt\0"),
            Err(PathValidationError::NullByte)
        );
    }

    #[test]
    fn test_validate_filename_empty() {
        assert_eq!(validate_filename(""), Err(PathValidationError::Empty));
    }

    #[test]
    fn test_validate_filename_valid_names() {
        assert!(validate_filename("file.txt").is_ok());
        assert!(validate_filename("file-with-dashes_and_underscores.tar.gz").is_ok());
        assert!(validate_filename("my file.txt").is_ok());

        // Hidden file (starts with dot)
        assert!(validate_filename(".gitignore").is_ok());

        // Dots inside a name are not traversal
        assert!(validate_filename("..hidden").is_ok());
        assert!(validate_filename("archive.tar.gz.gpg").is_ok());
    }
}
