// Utility functions

use sha2::{Digest, Sha256};

/// Hex SHA-256 of a transfer password. Receivers and staged files are keyed
/// by this so the plain password is never held in a map.
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Identifier for a prepared transfer session
pub fn generate_session_id() -> uuid::Uuid {
    uuid::Uuid::new_v4()
}

// ============================================
// AES-256-GCM sealing for staged uploads
// ============================================

pub mod encryption {
    use aes_gcm::{
        Aes256Gcm, Nonce,
        aead::{Aead, KeyInit, OsRng},
    };
    use rand::RngCore;
    use sha2::{Digest, Sha256};
    use thiserror::Error;

    const NONCE_LEN: usize = 12;

    #[derive(Debug, Error)]
    pub enum EncryptionError {
        #[error("failed to create cipher")]
        Cipher,
        #[error("encryption failed")]
        Encrypt,
        /// Wrong password or tampered data
        #[error("decryption failed")]
        Decrypt,
        #[error("sealed data too short")]
        TooShort,
    }

    /// Derive a 256-bit key from the transfer password using SHA-256.
    fn derive_key(secret: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"cyberlink-staging:");
        hasher.update(secret.as_bytes());
        let result = hasher.finalize();
        let mut key = [0u8; 32];
        key.copy_from_slice(&result);
        key
    }

    fn cipher(secret: &str) -> Result<Aes256Gcm, EncryptionError> {
        Aes256Gcm::new_from_slice(&derive_key(secret)).map_err(|_| EncryptionError::Cipher)
    }

    /// Encrypt bytes with AES-256-GCM.
    /// Returns nonce(12 bytes) || ciphertext || tag(16 bytes)
    pub fn seal(secret: &str, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let cipher = cipher(secret)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| EncryptionError::Encrypt)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(combined)
    }

    /// Inverse of [`seal`].
    pub fn open(secret: &str, sealed: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        if sealed.len() < NONCE_LEN {
            return Err(EncryptionError::TooShort);
        }
        let cipher = cipher(secret)?;
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| EncryptionError::Decrypt)
    }

}
