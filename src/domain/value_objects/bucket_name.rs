use crate::domain::errors::ValidationError;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 63;

/// A bucket name that satisfies S3 naming rules
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName(String);

impl BucketName {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if let Err(reason) = Self::check(&value) {
            return Err(ValidationError::InvalidBucketName {
                name: value,
                reason: reason.to_string(),
            });
        }

        Ok(Self(value))
    }

    fn check(value: &str) -> Result<(), &'static str> {
        if value.len() < MIN_LEN || value.len() > MAX_LEN {
            return Err("must be between 3 and 63 characters long");
        }

        let is_edge = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
        if !value.chars().next().is_some_and(is_edge) {
            return Err("must start with a lowercase letter or number");
        }
        if !value.chars().last().is_some_and(is_edge) {
            return Err("must end with a lowercase letter or number");
        }

        if value
            .chars()
            .any(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '.')
        {
            return Err("may only contain lowercase letters, numbers, hyphens and dots");
        }

        if value.contains("..") || value.contains(".-") || value.contains("-.") {
            return Err("dots may not be adjacent to other dots or hyphens");
        }

        if Self::looks_like_ip_address(value) {
            return Err("must not be formatted as an IP address");
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    fn looks_like_ip_address(s: &str) -> bool {
        let parts: Vec<&str> = s.split('.').collect();
        parts.len() == 4 && parts.iter().all(|part| part.parse::<u8>().is_ok())
    }
}

impl std::fmt::Display for BucketName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bucket_names() {
        assert!(BucketName::new("my-bucket").is_ok());
        assert!(BucketName::new("bucket123").is_ok());
        assert!(BucketName::new("123bucket").is_ok());
        assert!(BucketName::new("logs.example.com").is_ok());
        assert!(BucketName::new("a".repeat(63)).is_ok());
    }

    #[test]
    fn test_invalid_bucket_names() {
        // Too short / too long
        assert!(BucketName::new("ab").is_err());
        assert!(BucketName::new("a".repeat(64)).is_err());

        // Invalid start/end
        assert!(BucketName::new("-bucket").is_err());
        assert!(BucketName::new("bucket-").is_err());
        assert!(BucketName::new(".bucket").is_err());
        assert!(BucketName::new("Bucket").is_err());

        // Invalid characters
        assert!(BucketName::new("my_bucket").is_err());
        assert!(BucketName::new("my bucket").is_err());

        // Dot adjacency
        assert!(BucketName::new("my..bucket").is_err());
        assert!(BucketName::new("my.-bucket").is_err());

        // IP address format
        assert!(BucketName::new("192.168.1.1").is_err());
    }

    #[test]
    fn test_error_carries_name_and_reason() {
        match BucketName::new("ab") {
            Err(ValidationError::InvalidBucketName { name, reason }) => {
                assert_eq!(name, "ab");
                assert!(reason.contains("between 3 and 63"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
