//! Master credentials seeding the position walk.
//!
//! The credential hash is **not** an encryption key: it only drives the
//! pseudo-random traversal of carrier positions. Per-item encryption keys
//! are derived separately inside the Data block (see `container::data`).

use secrecy::{ExposeSecret, SecretString};
use strum::{Display, EnumIter, EnumString};

use crate::binary;

/// Digest algorithm used to turn the master passphrase into the walk seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
pub enum HashAlgorithm {
    /// SHA-512, the historical default of the container format.
    #[default]
    #[strum(serialize = "sha512", to_string = "SHA-512")]
    Sha512,

    #[strum(serialize = "sha256", to_string = "SHA-256")]
    Sha256,
}

impl HashAlgorithm {
    /// Digests a passphrase into the walk seed bytes.
    fn digest(self, passphrase: &str) -> Vec<u8> {
        match self {
            Self::Sha512 => binary::sha512(passphrase.as_bytes()).to_vec(),
            Self::Sha256 => binary::sha256(passphrase.as_bytes()).to_vec(),
        }
    }
}

/// Hash-algorithm selector plus master passphrase.
///
/// The derived hash is computed lazily and cached; changing either field
/// invalidates the cache. The walk consumes the hash cyclically, so it must
/// be at least 3 bytes long; both supported digests are far above that.
pub struct Credentials {
    algorithm: HashAlgorithm,
    passphrase: SecretString,
    hash: Option<Vec<u8>>,
}

impl Credentials {
    pub fn new(algorithm: HashAlgorithm, passphrase: &str) -> Self {
        Self { algorithm, passphrase: SecretString::from(passphrase.to_owned()), hash: None }
    }

    #[inline]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn set_algorithm(&mut self, algorithm: HashAlgorithm) {
        self.algorithm = algorithm;
        self.hash = None;
    }

    pub fn set_passphrase(&mut self, passphrase: &str) {
        self.passphrase = SecretString::from(passphrase.to_owned());
        self.hash = None;
    }

    /// Returns the cached walk seed, computing it on first use.
    pub fn hash(&mut self) -> &[u8] {
        if self.hash.is_none() {
            let digest = self.algorithm.digest(self.passphrase.expose_secret());
            tracing::debug!(algorithm = %self.algorithm, hash = %binary::to_hex(&digest), "credential hash computed");
            self.hash = Some(digest);
        }

        self.hash.as_deref().expect("hash computed above")
    }
}

impl PartialEq for Credentials {
    /// Two credentials are equal iff algorithm and passphrase match.
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.passphrase.expose_secret() == other.passphrase.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("algorithm", &self.algorithm).field("passphrase", &"[redacted]").finish()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(HashAlgorithm::default(), "")
    }
}
