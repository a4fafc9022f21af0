use std::path::Path;

use tracing::debug;

use crate::api_client::ResumeUpload;
use crate::errors::AppError;

/// 5 MB, the largest résumé the service accepts.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Checks the local upload constraints. Runs before any network call.
pub fn validate_upload(file_name: &str, size: u64) -> Result<(), AppError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "Unsupported file type for '{file_name}'. Supports PDF, DOC, DOCX (Max 5MB)"
        )));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "'{file_name}' is {size} bytes, larger than the 5MB limit"
        )));
    }
    Ok(())
}

/// Reads a résumé from disk, refusing oversized or unsupported files before reading them.
pub async fn read_upload(path: &Path) -> Result<ResumeUpload, AppError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::Validation(format!("'{}' is not a file", path.display())))?
        .to_string();

    let metadata = tokio::fs::metadata(path).await?;
    validate_upload(&file_name, metadata.len())?;

    let bytes = tokio::fs::read(path).await?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(ResumeUpload {
        file_name,
        bytes: bytes.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions_case_insensitive() {
        assert!(validate_upload("resume.pdf", 10).is_ok());
        assert!(validate_upload("Resume.DOCX", 10).is_ok());
        assert!(validate_upload("cv.final.doc", 10).is_ok());
    }

    #[test]
    fn test_rejects_other_extensions() {
        for name in ["resume.txt", "resume", "resume.pdf.exe", ".pdf"] {
            assert!(
                matches!(validate_upload(name, 10), Err(AppError::Validation(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(validate_upload("resume.pdf", MAX_UPLOAD_BYTES).is_ok());
        assert!(matches!(
            validate_upload("resume.pdf", MAX_UPLOAD_BYTES + 1),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_read_upload_reads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let upload = read_upload(&path).await.unwrap();
        assert_eq!(upload.file_name, "resume.pdf");
        assert_eq!(&upload.bytes[..], b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_read_upload_rejects_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        assert!(matches!(
            read_upload(&path).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_read_upload_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_upload(&dir.path().join("gone.pdf")).await,
            Err(AppError::Io(_))
        ));
    }
}
