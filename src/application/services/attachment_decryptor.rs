//! Encrypted attachment verification and decryption.
//!
//! Attachments are encrypted with AES-256 in CTR mode using a 128-bit
//! big-endian counter. The declared SHA-256 digest covers the ciphertext and
//! is checked before any plaintext is produced.

use aes::Aes256;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use ctr::cipher::{KeyIvInit, StreamCipher};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::entities::EncryptedFile;
use crate::domain::errors::MediaError;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet, padding optional.
const STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// URL-safe alphabet, padding optional.
const URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Verifies and decrypts an attachment downloaded from `file.url`.
///
/// # Errors
/// Returns [`MediaError::DecryptionFailure`] if the descriptor is malformed
/// or the ciphertext digest does not match the declared hash.
pub fn decrypt_attachment(ciphertext: &[u8], file: &EncryptedFile) -> Result<Vec<u8>, MediaError> {
    verify_digest(ciphertext, file)?;

    let key = decode_key(file)?;
    let iv = decode_fixed::<IV_LEN>(&STANDARD, &file.iv, "iv")?;

    let mut plaintext = ciphertext.to_vec();
    let mut cipher = Aes256Ctr::new(&key.into(), &iv.into());
    cipher.apply_keystream(&mut plaintext);

    debug!(size = plaintext.len(), "Attachment decrypted");
    Ok(plaintext)
}

fn verify_digest(ciphertext: &[u8], file: &EncryptedFile) -> Result<(), MediaError> {
    let declared = file
        .sha256()
        .ok_or_else(|| MediaError::decryption("descriptor declares no sha256 hash"))?;
    let declared = STANDARD
        .decode(declared)
        .map_err(|e| MediaError::decryption(format!("invalid sha256 hash encoding: {e}")))?;

    let actual = Sha256::digest(ciphertext);
    if actual.as_slice() != declared.as_slice() {
        return Err(MediaError::decryption("sha256 hash mismatch"));
    }
    Ok(())
}

fn decode_key(file: &EncryptedFile) -> Result<[u8; KEY_LEN], MediaError> {
    let jwk = &file.key;

    if jwk.kty != "oct" {
        return Err(MediaError::decryption(format!(
            "unsupported key type `{}`",
            jwk.kty
        )));
    }
    if jwk.alg != "A256CTR" {
        return Err(MediaError::decryption(format!(
            "unsupported algorithm `{}`",
            jwk.alg
        )));
    }
    if !jwk.key_ops.is_empty() && !jwk.key_ops.iter().any(|op| op == "decrypt") {
        return Err(MediaError::decryption("key does not permit decryption"));
    }

    decode_fixed::<KEY_LEN>(&URL_SAFE, &jwk.k, "key")
}

fn decode_fixed<const N: usize>(
    engine: &GeneralPurpose,
    encoded: &str,
    what: &str,
) -> Result<[u8; N], MediaError> {
    let bytes = engine
        .decode(encoded)
        .map_err(|e| MediaError::decryption(format!("invalid {what} encoding: {e}")))?;

    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
        MediaError::decryption(format!(
            "{what} must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}
