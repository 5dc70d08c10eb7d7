//! Data block: one named, encrypted payload item.
//!
//! The wire payload is an AES-256-CBC ciphertext. Plaintext layout:
//!
//! ```text
//! [magic:4][nameLen:1][name][typeLen:1][contentType][content...]
//! ```
//!
//! The key is derived from the item's passphrase with PBKDF2-HMAC-SHA256.
//! Salt and IV are fixed all-zero values, a documented weakness of the
//! format (see `config::ZERO_SALT`), preserved for compatibility with
//! existing containers.
//!
//! Decryption failures are expected, not exceptional: the caller probes a
//! block with candidate passphrases, and every outcome other than a clean
//! magic-checked plaintext simply leaves the block undecoded.

use aes::Aes256;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use anyhow::{Result, ensure};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::config::{DATA_BLOCK_MAGIC, KEY_SIZE, MAX_BLOCK_LENGTH, MAX_NAME_LENGTH, PBKDF2_ITERATIONS, ZERO_IV, ZERO_SALT};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Derives the AES-256 key for one item passphrase.
fn derive_key(passphrase: &str) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), &ZERO_SALT, PBKDF2_ITERATIONS, &mut key);
    key
}

/// One hidden item: a name, a content type, and its bytes.
#[derive(Debug, Clone, Default)]
pub struct DataBlock {
    name: String,
    content_type: String,
    decoded: Option<Vec<u8>>,
    /// Ciphertext as embedded in the carrier.
    raw: Vec<u8>,
    /// Whether `raw` currently reflects the decoded fields.
    synced: bool,
}

impl DataBlock {
    /// Creates an empty, undecoded block.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_decoded(&self) -> bool {
        self.decoded.is_some()
    }

    pub fn decoded_data(&self) -> Option<&[u8]> {
        self.decoded.as_deref()
    }

    /// Replaces the item content, marking the ciphertext stale.
    pub fn set_decoded_data(&mut self, data: Vec<u8>) {
        self.decoded = Some(data);
        self.synced = false;
    }

    #[inline]
    pub fn encoded_data(&self) -> &[u8] {
        &self.raw
    }

    /// Installs ciphertext recovered from a carrier.
    pub fn set_encoded_data(&mut self, raw: Vec<u8>) {
        self.raw = raw;
        self.synced = false;
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the item name, truncated to the format's 255-byte limit.
    pub fn set_name(&mut self, name: &str) {
        let mut end = name.len().min(MAX_NAME_LENGTH);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        self.name = name[..end].to_owned();
        self.synced = false;
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn set_content_type(&mut self, content_type: &str) {
        self.content_type = content_type.to_owned();
        self.synced = false;
    }

    /// Attempts to decrypt the raw payload with `passphrase`.
    ///
    /// Returns `true` when the block is decoded afterwards. A decrypt
    /// failure, a magic mismatch, or malformed internal framing all mean
    /// "wrong passphrase" and leave the block undecoded; none of them is an
    /// error.
    pub fn try_decode(&mut self, passphrase: &str) -> bool {
        if self.is_decoded() {
            return true;
        }

        let key = derive_key(passphrase);
        let Ok(plain) = Aes256CbcDec::new(&key.into(), &ZERO_IV.into()).decrypt_padded_vec_mut::<Pkcs7>(&self.raw) else {
            tracing::debug!("data block: padding check failed, wrong passphrase");
            return false;
        };

        let Some(parsed) = Self::parse_plaintext(&plain) else {
            tracing::debug!("data block: plaintext framing invalid, wrong passphrase");
            return false;
        };

        let (name, content_type, content) = parsed;
        self.name = name;
        self.content_type = content_type;
        self.decoded = Some(content);
        self.synced = true;
        true
    }

    /// Rebuilds the ciphertext from the decoded fields when out of sync.
    ///
    /// # Errors
    ///
    /// Fails when the block was never decoded, or when the framed plaintext
    /// would exceed the 24-bit block length limit.
    pub fn encode(&mut self, passphrase: &str) -> Result<()> {
        if self.synced {
            return Ok(());
        }

        let Some(content) = self.decoded.as_deref() else {
            // Carried-over ciphertext is embedded as-is.
            ensure!(!self.raw.is_empty(), "data block has neither content nor ciphertext");
            return Ok(());
        };

        let plain = self.build_plaintext(content)?;
        let key = derive_key(passphrase);
        self.raw = Aes256CbcEnc::new(&key.into(), &ZERO_IV.into()).encrypt_padded_vec_mut::<Pkcs7>(&plain);
        self.synced = true;
        Ok(())
    }

    fn build_plaintext(&self, content: &[u8]) -> Result<Vec<u8>> {
        let name = self.name.as_bytes();
        let content_type = self.content_type.as_bytes();

        ensure!(name.len() <= MAX_NAME_LENGTH, "item name exceeds {MAX_NAME_LENGTH} bytes");
        ensure!(content_type.len() <= MAX_NAME_LENGTH, "content type exceeds {MAX_NAME_LENGTH} bytes");

        let size = DATA_BLOCK_MAGIC.len() + 1 + name.len() + 1 + content_type.len() + content.len();
        // One padding block is added by CBC; stay framable either way.
        ensure!(size + 16 <= MAX_BLOCK_LENGTH, "item too large for a single block");

        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(&DATA_BLOCK_MAGIC);
        out.push(name.len() as u8);
        out.extend_from_slice(name);
        out.push(content_type.len() as u8);
        out.extend_from_slice(content_type);
        out.extend_from_slice(content);
        Ok(out)
    }

    /// Splits a decrypted plaintext into (name, content type, content).
    fn parse_plaintext(plain: &[u8]) -> Option<(String, String, Vec<u8>)> {
        if plain.len() < DATA_BLOCK_MAGIC.len() + 2 || plain[..DATA_BLOCK_MAGIC.len()] != DATA_BLOCK_MAGIC {
            return None;
        }

        let mut idx = DATA_BLOCK_MAGIC.len();
        let (name, next) = Self::read_string(plain, idx)?;
        idx = next;
        let (content_type, next) = Self::read_string(plain, idx)?;
        idx = next;

        Some((name, content_type, plain[idx..].to_vec()))
    }

    /// Reads a `[len:1][bytes]` string starting at `offset`.
    fn read_string(buf: &[u8], offset: usize) -> Option<(String, usize)> {
        let len = *buf.get(offset)? as usize;
        let start = offset + 1;
        let end = start + len;
        let bytes = buf.get(start..end)?;
        Some((String::from_utf8_lossy(bytes).into_owned(), end))
    }
}
