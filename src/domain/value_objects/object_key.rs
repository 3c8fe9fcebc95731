use object_store::path::Path as ObjectPath;

use crate::domain::errors::ValidationError;

const MAX_KEY_LEN: usize = 1024;

/// A validated object key (path) within a bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    raw: String,
    path: ObjectPath,
}

impl ObjectKey {
    /// Create a new ObjectKey with validation
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::EmptyObjectKey);
        }

        if value.len() > MAX_KEY_LEN {
            return Err(ValidationError::ObjectKeyTooLong {
                actual: value.len(),
                max: MAX_KEY_LEN,
            });
        }

        if value.contains('\0') {
            return Err(ValidationError::InvalidObjectKeyCharacter('\0'));
        }

        if value.starts_with('/') {
            return Err(ValidationError::ObjectKeyStartsWithSlash);
        }

        if value.ends_with('/') {
            return Err(ValidationError::ObjectKeyEndsWithSlash);
        }

        if value.contains("//") {
            return Err(ValidationError::ObjectKeyContainsDoubleSlash);
        }

        // Parsed rather than encoded so listings report exactly the key written.
        let path = match ObjectPath::parse(&value) {
            Ok(path) => path,
            Err(e) => {
                return Err(ValidationError::UnsupportedObjectKey {
                    key: value,
                    reason: e.to_string(),
                });
            }
        };

        Ok(Self { raw: value, path })
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The object store location for this key
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Get the file name part of the key (everything after the last '/')
    pub fn file_name(&self) -> &str {
        self.raw.rfind('/').map_or(&self.raw, |idx| &self.raw[idx + 1..])
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_object_key() {
        assert!(ObjectKey::new("file.txt").is_ok());
        assert!(ObjectKey::new("folder/file.txt").is_ok());
        assert!(ObjectKey::new("deep/folder/structure/file.txt").is_ok());
        assert!(ObjectKey::new("report 2024.pdf").is_ok());
    }

    #[test]
    fn test_invalid_object_key() {
        assert!(ObjectKey::new("").is_err());
        assert!(ObjectKey::new("/leading-slash").is_err());
        assert!(ObjectKey::new("trailing-slash/").is_err());
        assert!(ObjectKey::new("double//slash").is_err());
        assert!(ObjectKey::new("null\0byte").is_err());
        assert!(ObjectKey::new("x".repeat(1025)).is_err());
        assert!(ObjectKey::new("a/../b").is_err());
    }

    #[test]
    fn test_path_round_trip() {
        let key = ObjectKey::new("folder/sub/file.txt").unwrap();
        assert_eq!(key.path().as_ref(), "folder/sub/file.txt");

        let odd = ObjectKey::new("notes/#1 {draft}.md").unwrap();
        assert_eq!(odd.path().as_ref(), "notes/#1 {draft}.md");
        assert_eq!(key.file_name(), "file.txt");

        let root = ObjectKey::new("file.txt").unwrap();
        assert_eq!(root.file_name(), "file.txt");
    }
}
