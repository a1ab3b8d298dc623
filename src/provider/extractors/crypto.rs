// Passphrase-based AES decryption, OpenSSL / CryptoJS compatible
//
// Layout: base64("Salted__" || salt[8] || ciphertext)
// Key and IV come from EVP_BytesToKey with MD5 and a single round.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use md5::{Digest, Md5};

use crate::provider::errors::{Result, ScrapeError};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const SALT_MAGIC: &[u8] = b"Salted__";
const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Decrypt a CryptoJS `AES.encrypt(text, passphrase)` string back to text
pub fn decrypt_passphrase(encoded: &str, passphrase: &str) -> Result<String> {
    let raw = BASE64
        .decode(encoded.trim())
        .map_err(|e| ScrapeError::Decrypt(format!("payload is not base64: {}", e)))?;

    if raw.len() <= SALT_MAGIC.len() + SALT_LEN || !raw.starts_with(SALT_MAGIC) {
        return Err(ScrapeError::Decrypt("payload is not salted".to_string()));
    }
    let (salt, ciphertext) = raw[SALT_MAGIC.len()..].split_at(SALT_LEN);

    let derived = evp_bytes_to_key(passphrase.as_bytes(), salt);
    let (key, iv) = derived.split_at(KEY_LEN);

    let plaintext = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| ScrapeError::Decrypt(e.to_string()))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| ScrapeError::Decrypt("bad padding, wrong key?".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|_| ScrapeError::Decrypt("plaintext is not UTF-8".to_string()))
}

/// OpenSSL's legacy key derivation: D_i = MD5(D_{i-1} || pass || salt)
fn evp_bytes_to_key(passphrase: &[u8], salt: &[u8]) -> Vec<u8> {
    let mut derived = Vec::with_capacity(KEY_LEN + IV_LEN);
    let mut block: Vec<u8> = Vec::new();

    while derived.len() < KEY_LEN + IV_LEN {
        let mut hasher = Md5::new();
        hasher.update(&block);
        hasher.update(passphrase);
        hasher.update(salt);
        block = hasher.finalize().to_vec();
        derived.extend_from_slice(&block);
    }

    derived.truncate(KEY_LEN + IV_LEN);
    derived
}

/// `openssl enc -aes-256-cbc -md md5 -salt -pass pass:test-decryption-key -base64 -A`
/// of a one-entry HLS source list
#[cfg(test)]
pub(crate) const FIXTURE: &str = "U2FsdGVkX1/OabAaB+oEYEvl3vMFLCYMn1zQ3MNF6xjjnZGSBzdttGs55GTGglt66mikPGUkZkeJs+q9mxh2xdduJrHJa0o8SnkjfMUCcRpAqx9l5bGEScc8SvU6Z4Z8";
#[cfg(test)]
pub(crate) const FIXTURE_KEY: &str = "test-decryption-key";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrypts_openssl_payload() {
        let plaintext = decrypt_passphrase(FIXTURE, FIXTURE_KEY).unwrap();
        assert_eq!(
            plaintext,
            r#"[{"file":"https://cdn.example.net/hls/abc/master.m3u8","type":"hls"}]"#
        );
    }

    #[test]
    fn test_wrong_key_is_decrypt_error() {
        let result = decrypt_passphrase(FIXTURE, "not-the-key");
        assert!(matches!(result, Err(ScrapeError::Decrypt(_))));
    }

    #[test]
    fn test_unsalted_payload_rejected() {
        let encoded = BASE64.encode(b"plain bytes that are long enough");
        assert!(matches!(
            decrypt_passphrase(&encoded, FIXTURE_KEY),
            Err(ScrapeError::Decrypt(_))
        ));
        assert!(matches!(
            decrypt_passphrase("%%%", FIXTURE_KEY),
            Err(ScrapeError::Decrypt(_))
        ));
    }

    #[test]
    fn test_key_derivation_length() {
        assert_eq!(evp_bytes_to_key(b"pass", b"saltsalt").len(), KEY_LEN + IV_LEN);
    }
}
