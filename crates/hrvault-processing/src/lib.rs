//! hrvault upload processing
//!
//! Pure, side-effect-free validation and transformation of upload
//! candidates: allow-list and magic-byte validation, filename
//! sanitization, image re-encoding, checksums.

pub mod checksum;
pub mod image;
pub mod validator;

pub use checksum::{sha256_hex, sha256_hex_spawned};
pub use image::{ImageCodec, SanitizedImage};
pub use validator::{sanitize_filename, UploadCandidate, UploadValidator, ValidatedUpload, ValidationError};
