use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::DeckError;

/// Size of the read buffer used while streaming file contents into the digest.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Streams a reader into SHA-256 and returns the lower-case hex digest.
///
/// The reader is consumed through a fixed-size buffer, so memory use does not
/// grow with the input. Interrupted reads are retried; any other read error is
/// returned and no digest is produced.
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Computes the SHA-256 digest of a regular file.
///
/// Symbolic links and directories are rejected without being opened. The file
/// handle is scoped to this call and released on every return path.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened or read to completion
/// - The path points to a symbolic link or a directory
pub fn hash_file(path: &Path) -> Result<String, DeckError> {
    let metadata = std::fs::symlink_metadata(path).map_err(|e| DeckError::io(path, e))?;

    if metadata.is_symlink() {
        return Err(DeckError::InvalidFileType {
            path: path.to_path_buf(),
            message: "Symbolic links are never hashed".to_string(),
        });
    }

    if metadata.is_dir() {
        return Err(DeckError::InvalidFileType {
            path: path.to_path_buf(),
            message: "Directories are not supported".to_string(),
        });
    }

    let file = File::open(path).map_err(|e| DeckError::io(path, e))?;
    hash_reader(file).map_err(|e| DeckError::io(path, e))
}

/// Returns `true` when `hash` looks like a digest produced by [`hash_reader`].
pub fn is_valid_digest(hash: &str) -> bool {
    hash.len() == DIGEST_HEX_LEN
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
