//! SHA-256 verification for downloaded artifacts.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::{PackError, Result};

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The registry published no digest, nothing was checked
    Skipped,
    /// The artifact matched the published digest
    Verified { digest: String },
}

/// Compute the lowercase hex SHA-256 of a file without loading it whole
pub fn compute_sha256(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Check an artifact against the registry's digest.
///
/// An absent digest skips verification and succeeds: packs published
/// before the registry carried digests must stay installable. The hex
/// comparison ignores case.
pub fn verify_digest(path: &Path, expected: Option<&str>) -> Result<Verification> {
    let Some(expected) = expected.map(str::trim).filter(|e| !e.is_empty()) else {
        log::debug!("No digest published for {}, skipping verification", path.display());
        return Ok(Verification::Skipped);
    };

    let actual = compute_sha256(path)?;

    if actual.eq_ignore_ascii_case(expected) {
        Ok(Verification::Verified { digest: actual })
    } else {
        Err(PackError::DigestMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use std::io::Write;

    // SHA-256 of "hello world"
    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn hello_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_compute_sha256() {
        let file = hello_file();
        assert_eq!(compute_sha256(file.path()).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn test_verify_matching_digest() {
        let file = hello_file();
        let result = verify_digest(file.path(), Some(HELLO_SHA256)).unwrap();
        assert_eq!(
            result,
            Verification::Verified {
                digest: HELLO_SHA256.to_string()
            }
        );
    }

    #[test]
    fn test_verify_is_case_insensitive() {
        let file = hello_file();
        let upper = HELLO_SHA256.to_uppercase();
        assert!(verify_digest(file.path(), Some(&upper)).is_ok());
    }

    #[test]
    fn test_verify_mismatch_reports_both_digests() {
        let file = hello_file();
        let wrong = "0".repeat(64);

        match verify_digest(file.path(), Some(&wrong)) {
            Err(PackError::DigestMismatch { expected, actual }) => {
                assert_eq!(expected, wrong);
                assert_eq!(actual, HELLO_SHA256);
            }
            other => panic!("Expected DigestMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_digest_skips() {
        let file = hello_file();
        assert_eq!(verify_digest(file.path(), None).unwrap(), Verification::Skipped);
        assert_eq!(verify_digest(file.path(), Some("  ")).unwrap(), Verification::Skipped);
    }

    #[test]
    fn test_absent_digest_does_not_read_file() {
        let missing = std::path::PathBuf::from("/nonexistent/artifact.zip");
        assert_eq!(verify_digest(&missing, None).unwrap(), Verification::Skipped);
        assert!(verify_digest(&missing, Some(HELLO_SHA256)).is_err());
    }
}
