//! Content storage contract
//!
//! Uploaded book files and cover images are kept outside the database. The
//! database only stores the relative path returned by [`ContentStore::save`].

use async_trait::async_trait;

use super::DomainError;

/// Kind of file attached to a book. Each kind has its own accepted extension
/// and its own sub-directory in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    BookFile,
    CoverImage,
}

impl ContentKind {
    pub fn extension(self) -> &'static str {
        match self {
            ContentKind::BookFile => "pdf",
            ContentKind::CoverImage => "jpg",
        }
    }

    pub fn directory(self) -> &'static str {
        match self {
            ContentKind::BookFile => "books",
            ContentKind::CoverImage => "images",
        }
    }

    /// Check that an uploaded filename carries the extension this kind accepts.
    pub fn validate_filename(self, filename: &str) -> Result<(), DomainError> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext {
            Some(ext) if ext == self.extension() => Ok(()),
            _ => Err(DomainError::Validation(format!(
                "'{}' must be a .{} file",
                filename,
                self.extension()
            ))),
        }
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Persist `bytes` and return the relative path to record on the book.
    async fn save(&self, kind: ContentKind, bytes: &[u8]) -> Result<String, DomainError>;

    /// Read back a file previously returned by `save`.
    async fn load(&self, path: &str) -> Result<Vec<u8>, DomainError>;

    /// Remove a stored file. Missing files are not an error.
    async fn remove(&self, path: &str) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(ContentKind::BookFile.validate_filename("Dune.PDF").is_ok());
        assert!(ContentKind::CoverImage.validate_filename("cover.jpg").is_ok());
    }

    #[test]
    fn other_extensions_are_rejected() {
        assert!(ContentKind::BookFile.validate_filename("dune.epub").is_err());
        assert!(ContentKind::CoverImage.validate_filename("cover.png").is_err());
        assert!(ContentKind::CoverImage.validate_filename("cover").is_err());
    }
}
