//! Error types for PGP key and message operations.

use thiserror::Error;

/// Errors that can occur during key lifecycle and message operations.
#[derive(Error, Debug)]
pub enum PgpError {
    /// Key material could not be created.
    #[error("Key generation failed: {0}")]
    Generation(String),

    /// Self-certification of the identity binding failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Armoring or serializing key material failed.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Passphrase-locking the private key failed.
    #[error("Locking private key failed: {0}")]
    Lock(String),

    /// Input framing is malformed (bad base64, bad armor, wrong block type).
    #[error("Decoding failed: {0}")]
    Decoding(String),

    /// Wrong key, wrong or missing passphrase, or a corrupted packet stream.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// The declared ciphertext encoding does not match the input.
    #[error("Wrong encoding: declared {declared}, but input looks {actual}")]
    WrongEncoding {
        /// Encoding the caller declared.
        declared: String,
        /// Encoding the input appears to use.
        actual: String,
    },

    /// Encrypting to the recipient key failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// A caller-supplied parameter is out of range.
    #[error("Invalid parameter: {0}")]
    Validation(String),
}

/// Discriminant of [`PgpError`], for callers that branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PgpErrorKind {
    Generation,
    Signing,
    Encoding,
    Lock,
    Decoding,
    Decryption,
    WrongEncoding,
    Encryption,
    Validation,
}

impl PgpError {
    /// Failure class of this error.
    pub fn kind(&self) -> PgpErrorKind {
        match self {
            PgpError::Generation(_) => PgpErrorKind::Generation,
            PgpError::Signing(_) => PgpErrorKind::Signing,
            PgpError::Encoding(_) => PgpErrorKind::Encoding,
            PgpError::Lock(_) => PgpErrorKind::Lock,
            PgpError::Decoding(_) => PgpErrorKind::Decoding,
            PgpError::Decryption(_) => PgpErrorKind::Decryption,
            PgpError::WrongEncoding { .. } => PgpErrorKind::WrongEncoding,
            PgpError::Encryption(_) => PgpErrorKind::Encryption,
            PgpError::Validation(_) => PgpErrorKind::Validation,
        }
    }

    /// Whether the caller should look at the `encoding` parameter or the
    /// input framing rather than at credentials.
    pub fn is_input_framing(&self) -> bool {
        matches!(
            self.kind(),
            PgpErrorKind::Decoding | PgpErrorKind::WrongEncoding
        )
    }
}

/// Result type for PGP operations.
pub type Result<T> = std::result::Result<T, PgpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            PgpError::Decryption("bad".into()).kind(),
            PgpErrorKind::Decryption
        );
        assert_eq!(
            PgpError::WrongEncoding {
                declared: "armored".into(),
                actual: "base64".into(),
            }
            .kind(),
            PgpErrorKind::WrongEncoding
        );
    }

    #[test]
    fn test_framing_errors_are_distinguished_from_credentials() {
        assert!(PgpError::Decoding("bad armor".into()).is_input_framing());
        assert!(!PgpError::Decryption("wrong passphrase".into()).is_input_framing());
        assert!(!PgpError::Lock("already locked".into()).is_input_framing());
    }

    #[test]
    fn test_wrong_encoding_message() {
        let err = PgpError::WrongEncoding {
            declared: "base64".into(),
            actual: "armored".into(),
        };
        assert_eq!(
            err.to_string(),
            "Wrong encoding: declared base64, but input looks armored"
        );
    }
}
