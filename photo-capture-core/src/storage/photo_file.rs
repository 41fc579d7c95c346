use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;

/// Size and SHA-256 checksum of a file the engine finished writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub size_bytes: u64,
    pub checksum: String,
}

/// Hash a completed photo. A missing or empty file means nothing was produced.
pub fn digest_photo(path: &Path) -> Result<FileDigest, CaptureError> {
    let mut file = File::open(path).map_err(|e| {
        CaptureError::StorageError(format!("photo not written to {}: {}", path.display(), e))
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    let mut size_bytes = 0u64;
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(CaptureError::StorageError(format!("failed to read photo: {}", e)));
            }
        };
        hasher.update(&buffer[..read]);
        size_bytes += read as u64;
    }

    if size_bytes == 0 {
        return Err(CaptureError::StorageError(format!(
            "photo at {} is empty",
            path.display()
        )));
    }

    let checksum = hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    Ok(FileDigest {
        size_bytes,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("photo_capture_test_{}_{}", uuid::Uuid::new_v4(), name))
    }

    #[test]
    fn digest_matches_known_sha256() {
        let path = temp_file_path("abc.bin");
        fs::write(&path, b"abc").unwrap();

        let digest = digest_photo(&path).unwrap();
        assert_eq!(digest.size_bytes, 3);
        assert_eq!(
            digest.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_a_storage_error() {
        let err = digest_photo(&temp_file_path("missing.jpg")).unwrap_err();
        assert!(matches!(err, CaptureError::StorageError(_)));
    }

    #[test]
    fn empty_file_is_a_storage_error() {
        let path = temp_file_path("empty.jpg");
        fs::write(&path, b"").unwrap();

        assert!(matches!(
            digest_photo(&path).unwrap_err(),
            CaptureError::StorageError(_)
        ));

        fs::remove_file(&path).ok();
    }
}
