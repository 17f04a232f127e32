use std::path::Path;

const MAX_FILENAME_LEN: usize = 120;

/// Validation errors for upload candidates
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<&'static str>,
    },

    #[error("Invalid content type: {content_type}")]
    InvalidContentType { content_type: String },

    #[error("File content does not match declared type: {0}")]
    ContentMismatch(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

/// An upload as received from the client, before any checks.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub data: Vec<u8>,
    pub filename: String,
    pub declared_mime: String,
}

/// The result of a successful validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub sanitized_name: String,
    pub mime_type: String,
    pub size: usize,
}

/// Extension to expected MIME type, for every format the vault accepts.
const ALLOWED: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("csv", "text/csv"),
    ("txt", "text/plain"),
];

fn allowed_extensions() -> Vec<&'static str> {
    ALLOWED.iter().map(|(ext, _)| *ext).collect()
}

fn expected_mime_for(extension: &str) -> Option<&'static str> {
    ALLOWED
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// Formats with no magic-byte signature; checked for binary content instead.
fn is_text_format(extension: &str) -> bool {
    matches!(extension, "csv" | "txt")
}

/// Sanitize a client-supplied filename.
///
/// Keeps the basename only, strips `..`, replaces anything outside
/// alphanumerics/dot/dash/underscore with `_`, and caps the length while
/// preserving the extension.
pub fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .replace("..", "");

    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.len() <= MAX_FILENAME_LEN {
        return cleaned;
    }

    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => {
            let keep = MAX_FILENAME_LEN.saturating_sub(ext.len() + 1);
            let stem: String = stem.chars().take(keep).collect();
            format!("{}.{}", stem, ext)
        }
        _ => cleaned.chars().take(MAX_FILENAME_LEN).collect(),
    }
}

/// Upload validator
///
/// Checks an upload candidate against the fixed allow-list, the declared
/// MIME type, the size cap and the actual file content (magic bytes).
/// Pure: no I/O, no logging side effects beyond tracing.
#[derive(Clone)]
pub struct UploadValidator {
    max_file_size: usize,
}

impl UploadValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    pub fn validate(&self, candidate: &UploadCandidate) -> Result<ValidatedUpload, ValidationError> {
        self.validate_file_size(candidate.data.len())?;

        let extension = extension_of(&candidate.filename)?;
        let expected_mime = expected_mime_for(&extension).ok_or_else(|| {
            ValidationError::InvalidExtension {
                extension: extension.clone(),
                allowed: allowed_extensions(),
            }
        })?;

        let declared = candidate.declared_mime.to_lowercase();
        if declared != expected_mime {
            return Err(ValidationError::InvalidContentType {
                content_type: format!(
                    "{} (extension '{}' expects {})",
                    candidate.declared_mime, extension, expected_mime
                ),
            });
        }

        self.validate_content(&candidate.data, &extension, expected_mime)?;

        let sanitized_name = sanitize_filename(&candidate.filename);
        if sanitized_name.is_empty() {
            return Err(ValidationError::InvalidFilename(candidate.filename.clone()));
        }

        Ok(ValidatedUpload {
            sanitized_name,
            mime_type: expected_mime.to_string(),
            size: candidate.data.len(),
        })
    }

    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Verify the actual bytes agree with what the extension promises.
    fn validate_content(
        &self,
        data: &[u8],
        extension: &str,
        expected_mime: &str,
    ) -> Result<(), ValidationError> {
        // csv/txt carry no magic signature; reject binary content instead
        if is_text_format(extension) {
            if std::str::from_utf8(data).is_ok() && !data.contains(&0) {
                return Ok(());
            }
            return Err(ValidationError::ContentMismatch(format!(
                "binary data in a .{} file",
                extension
            )));
        }

        let detected = match infer::get(data) {
            Some(kind) => kind.mime_type(),
            None => {
                tracing::warn!(
                    extension = %extension,
                    size = data.len(),
                    "File content does not match any known magic byte signature"
                );
                return Err(ValidationError::ContentMismatch(
                    "unrecognizable file content".to_string(),
                ));
            }
        };

        if detected == expected_mime || mime_compatible(expected_mime, detected) {
            return Ok(());
        }

        tracing::warn!(
            extension = %extension,
            detected_mime = %detected,
            "File content type mismatch"
        );
        Err(ValidationError::ContentMismatch(format!(
            "declared {} but content looks like {}",
            expected_mime, detected
        )))
    }
}

/// Known equivalent detections: OOXML documents are zip containers and
/// legacy Office files are OLE compound files.
fn mime_compatible(expected: &str, detected: &str) -> bool {
    matches!(
        (expected, detected),
        (
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/zip",
        ) | (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/zip",
        ) | ("application/msword", "application/x-ole-storage")
            | ("application/vnd.ms-excel", "application/x-ole-storage")
            | ("application/msword", "application/x-cfb")
            | ("application/vnd.ms-excel", "application/x-cfb")
    )
}

fn extension_of(filename: &str) -> Result<String, ValidationError> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    const ONE_MIB: usize = 1024 * 1024;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 128, 255, 255]));
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        buffer
    }

    fn candidate(filename: &str, mime: &str, data: Vec<u8>) -> UploadCandidate {
        UploadCandidate {
            data,
            filename: filename.to_string(),
            declared_mime: mime.to_string(),
        }
    }

    fn validator() -> UploadValidator {
        UploadValidator::new(ONE_MIB)
    }

    #[test]
    fn test_valid_png_accepted() {
        let result = validator().validate(&candidate("photo.png", "image/png", png_bytes()));
        let validated = result.unwrap();
        assert_eq!(validated.sanitized_name, "photo.png");
        assert_eq!(validated.mime_type, "image/png");
    }

    #[test]
    fn test_empty_file_rejected() {
        assert!(matches!(
            validator().validate(&candidate("photo.png", "image/png", vec![])),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_oversize_rejected() {
        let result = UploadValidator::new(16)
            .validate(&candidate("photo.png", "image/png", png_bytes()));
        assert!(matches!(result, Err(ValidationError::FileTooLarge { .. })));
    }

    #[test]
    fn test_disallowed_extension_rejected() {
        let result = validator().validate(&candidate("script.exe", "image/png", png_bytes()));
        assert!(matches!(
            result,
            Err(ValidationError::InvalidExtension { .. })
        ));
    }

    #[test]
    fn test_declared_mime_must_match_extension() {
        let result = validator().validate(&candidate("photo.png", "image/jpeg", png_bytes()));
        assert!(matches!(
            result,
            Err(ValidationError::InvalidContentType { .. })
        ));
    }

    #[test]
    fn test_magic_byte_mismatch_rejected() {
        // PNG bytes inside a file claiming to be a PDF
        let result =
            validator().validate(&candidate("contract.pdf", "application/pdf", png_bytes()));
        assert!(matches!(result, Err(ValidationError::ContentMismatch(_))));
    }

    #[test]
    fn test_text_upload_accepted() {
        let data = b"name,department\nAda,Engineering\n".to_vec();
        let result = validator().validate(&candidate("report.csv", "text/csv", data));
        assert!(result.is_ok());
    }

    #[test]
    fn test_binary_content_in_text_file_rejected() {
        let mut data = b"looks like text".to_vec();
        data.push(0);
        let result = validator().validate(&candidate("notes.txt", "text/plain", data));
        assert!(matches!(result, Err(ValidationError::ContentMismatch(_))));
    }

    #[test]
    fn test_sanitize_filename_basics() {
        assert_eq!(sanitize_filename("test.png"), "test.png");
        assert_eq!(sanitize_filename("../../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my report.pdf"), "my_report.pdf");
        assert_eq!(sanitize_filename("a<script>.png"), "a_script_.png");
    }

    #[test]
    fn test_sanitize_filename_caps_length_preserving_extension() {
        let long = format!("{}.pdf", "x".repeat(300));
        let sanitized = sanitize_filename(&long);
        assert!(sanitized.len() <= MAX_FILENAME_LEN);
        assert!(sanitized.ends_with(".pdf"));
    }

    #[test]
    fn test_sanitized_name_replaces_traversal() {
        let result = validator().validate(&candidate(
            "../../secrets/photo.png",
            "image/png",
            png_bytes(),
        ));
        assert_eq!(result.unwrap().sanitized_name, "photo.png");
    }

    #[test]
    fn test_no_extension_rejected() {
        let result = validator().validate(&candidate("noextension", "image/png", png_bytes()));
        assert!(matches!(result, Err(ValidationError::InvalidFilename(_))));
    }
}
