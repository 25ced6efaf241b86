//! Password-based authenticated encryption for the save blob and event payloads.
//!
//! Wire layout (URL-safe base64 of):
//! ```text
//! [salt: 16][tag: 32][ciphertext: n]
//! ```
//! The key is PBKDF2-HMAC-SHA256 over the password and salt. The ciphertext is
//! the plaintext XORed with a SHA-256 counter keystream, and the tag is
//! HMAC-SHA256 over `salt ∥ ciphertext` keyed with the derived key.
//!
//! This guards against casual tampering and accidental corruption. It is not
//! meant to resist someone who holds the embedded key.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_ROUNDS: u32 = 150_000;
/// Lowest iteration count accepted by [`crate::RuntimeConfig`].
pub const MIN_ROUNDS: u32 = 100_000;
pub const SALT_LEN: usize = 16;
pub const TAG_LEN: usize = 32;
pub const KEY_LEN: usize = 32;

const HEADER_LEN: usize = SALT_LEN + TAG_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("corrupt data: {0}")]
    CorruptData(&'static str),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid key length")]
    InvalidKey,
}

pub type Result<T> = std::result::Result<T, CipherError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cipher {
    rounds: u32,
}

impl Default for Cipher {
    fn default() -> Self {
        Self::new()
    }
}

impl Cipher {
    pub fn new() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
        }
    }

    /// Uses exactly `rounds` PBKDF2 iterations. Tooling and tests may go below
    /// [`MIN_ROUNDS`]; the runtime configuration clamps before calling this.
    pub fn with_rounds(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn derive_key(&self, password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.rounds, &mut key);
        key
    }

    pub fn encrypt(&self, plaintext: &[u8], password: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        let key = self.derive_key(password, &salt);

        let mut ciphertext = plaintext.to_vec();
        apply_keystream(&key, &mut ciphertext);

        let mut mac = keyed_mac(&key)?;
        mac.update(&salt);
        mac.update(&ciphertext);
        let tag = mac.finalize().into_bytes();

        let mut blob = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&tag);
        blob.extend_from_slice(&ciphertext);
        Ok(URL_SAFE.encode(blob))
    }

    pub fn decrypt(&self, blob: &str, password: &str) -> Result<Vec<u8>> {
        let raw = URL_SAFE
            .decode(blob.trim())
            .map_err(|_| CipherError::CorruptData("invalid base64"))?;
        if raw.len() < HEADER_LEN {
            return Err(CipherError::CorruptData("blob shorter than header"));
        }

        let (salt, rest) = raw.split_at(SALT_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);
        let key = self.derive_key(password, salt);

        let mut mac = keyed_mac(&key)?;
        mac.update(salt);
        mac.update(ciphertext);
        // verify_slice compares in constant time
        mac.verify_slice(tag)
            .map_err(|_| CipherError::AuthenticationFailed)?;

        let mut plaintext = ciphertext.to_vec();
        apply_keystream(&key, &mut plaintext);
        Ok(plaintext)
    }
}

/// `SHA-256(key ∥ counter_be_u64)` blocks for counter = 0, 1, 2, … truncated to `n`.
pub fn keystream(key: &[u8; KEY_LEN], n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    apply_keystream(key, &mut out);
    out
}

fn apply_keystream(key: &[u8; KEY_LEN], data: &mut [u8]) {
    for (counter, chunk) in data.chunks_mut(32).enumerate() {
        let mut hasher = Sha256::new();
        hasher.update(key);
        hasher.update((counter as u64).to_be_bytes());
        let block = hasher.finalize();
        for (byte, k) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= k;
        }
    }
}

fn keyed_mac(key: &[u8; KEY_LEN]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(key).map_err(|_| CipherError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fast() -> Cipher {
        Cipher::with_rounds(64)
    }

    fn flip_bit(blob: &str, index: usize, bit: u8) -> String {
        let mut raw = URL_SAFE.decode(blob).unwrap();
        let i = index % raw.len();
        raw[i] ^= 1 << (bit % 8);
        URL_SAFE.encode(raw)
    }

    #[test]
    fn wrong_password_fails_authentication() {
        let cipher = fast();
        let blob = cipher.encrypt(b"hello", "pw1").unwrap();
        assert_eq!(
            cipher.decrypt(&blob, "pw2"),
            Err(CipherError::AuthenticationFailed)
        );
        assert_eq!(cipher.decrypt(&blob, "pw1").unwrap(), b"hello");
    }

    #[test]
    fn short_or_garbled_blobs_are_corrupt() {
        let cipher = fast();
        assert!(matches!(
            cipher.decrypt("not base64 !!", "pw"),
            Err(CipherError::CorruptData(_))
        ));
        let short = URL_SAFE.encode([0u8; HEADER_LEN - 1]);
        assert!(matches!(
            cipher.decrypt(&short, "pw"),
            Err(CipherError::CorruptData(_))
        ));
    }

    #[test]
    fn empty_plaintext_is_header_only() {
        let cipher = fast();
        let blob = cipher.encrypt(b"", "pw").unwrap();
        assert_eq!(URL_SAFE.decode(&blob).unwrap().len(), HEADER_LEN);
        assert!(cipher.decrypt(&blob, "pw").unwrap().is_empty());
    }

    #[test]
    fn salts_differ_between_encryptions() {
        let cipher = fast();
        let a = cipher.encrypt(b"same", "pw").unwrap();
        let b = cipher.encrypt(b"same", "pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn keystream_is_counter_mode_sha256() {
        let key = [7u8; KEY_LEN];
        let stream = keystream(&key, 40);
        let mut first = Sha256::new();
        first.update(key);
        first.update(0u64.to_be_bytes());
        let mut second = Sha256::new();
        second.update(key);
        second.update(1u64.to_be_bytes());
        assert_eq!(&stream[..32], first.finalize().as_slice());
        assert_eq!(&stream[32..], &second.finalize()[..8]);
    }

    #[test]
    fn derive_key_is_deterministic() {
        let cipher = fast();
        assert_eq!(
            cipher.derive_key("pw", b"salt"),
            cipher.derive_key("pw", b"salt")
        );
        assert_ne!(
            cipher.derive_key("pw", b"salt"),
            Cipher::with_rounds(65).derive_key("pw", b"salt")
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 0..256), password in ".{0,24}") {
            let cipher = fast();
            let blob = cipher.encrypt(&plaintext, &password).unwrap();
            prop_assert_eq!(cipher.decrypt(&blob, &password).unwrap(), plaintext);
        }

        #[test]
        fn any_flipped_bit_is_detected(
            plaintext in proptest::collection::vec(any::<u8>(), 1..64),
            index in any::<usize>(),
            bit in any::<u8>(),
        ) {
            let cipher = fast();
            let blob = cipher.encrypt(&plaintext, "pw").unwrap();
            let tampered = flip_bit(&blob, index, bit);
            prop_assert_eq!(
                cipher.decrypt(&tampered, "pw"),
                Err(CipherError::AuthenticationFailed)
            );
        }
    }
}
