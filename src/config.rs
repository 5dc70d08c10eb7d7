//! Global Configuration Constants
//!
//! This module contains all configuration parameters used throughout the
//! pixveil application: the container wire format, cryptographic parameters,
//! scheduler timing, and user interface limits.
//!
//! ## Design Philosophy
//!
//! - **Wire Stability**: magic values and framing sizes define the on-wire
//!   container format and must never change between releases
//! - **Determinism**: every value that feeds the position walk is fixed so
//!   that encode and decode reproduce the same traversal bit for bit
//! - **Responsiveness**: scheduler parameters keep long bit loops from
//!   monopolizing the executor thread

/// Application name used in user interfaces.
pub const APP_NAME: &str = "pixveil";

// === Container Wire Format ===
// These constants define the binary format of the hidden container.

/// Magic bytes opening every serialized container.
///
/// Checked byte-by-byte while extracting; the first mismatching byte aborts
/// the parse, which is how a carrier with no hidden payload is recognized
/// cheaply.
pub const CONTAINER_MAGIC: [u8; 6] = [0xFF, 0x73, 0x78, 0x03, 0x06, 0x11];

/// Magic bytes opening every Data block plaintext.
///
/// Verified after decryption. A mismatch after a structurally successful
/// decrypt means the passphrase was wrong, not that the carrier is corrupt.
pub const DATA_BLOCK_MAGIC: [u8; 4] = [0xFF, 0xAF, 0xF1, 0xF7];

/// Number of big-endian bytes framing each block's payload length.
pub const BLOCK_LENGTH_BYTES: usize = 3;

/// Largest payload a single block can carry (24-bit length field).
pub const MAX_BLOCK_LENGTH: usize = 0xFF_FFFF;

/// Size of the Hash block payload: a SHA-256 digest.
pub const HASH_SIZE: usize = 32;

/// Maximum byte length of an item name stored in a Data block.
///
/// The name is framed by a single length byte, so 255 is a hard limit of the
/// format, not a policy choice.
pub const MAX_NAME_LENGTH: usize = 255;

// === Data Block Encryption Parameters ===

/// PBKDF2-HMAC-SHA256 iteration count for per-item key derivation.
pub const PBKDF2_ITERATIONS: u32 = 65_536;

/// Size of the derived AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the AES-CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// Size of the PBKDF2 salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Fixed all-zero PBKDF2 salt.
///
/// KNOWN WEAKNESS, kept for on-wire compatibility: two items protected by
/// the same passphrase derive the same key, and identical plaintexts produce
/// identical ciphertexts. Do not rely on this format for semantic security.
pub const ZERO_SALT: [u8; SALT_SIZE] = [0u8; SALT_SIZE];

/// Fixed all-zero AES-CBC IV. Same caveat as [`ZERO_SALT`].
pub const ZERO_IV: [u8; IV_SIZE] = [0u8; IV_SIZE];

// === Carrier Geometry ===

/// Number of bit planes considered on every carrier.
pub const LAYER_COUNT: usize = 8;

/// Channel bytes per PNG pixel (RGBA).
pub const PNG_CHANNELS: usize = 4;

/// Coefficients per JPEG DCT block.
pub const DCT_BLOCK_SIZE: usize = 64;

// === Cooperative Scheduler Parameters ===
// The scheduler keeps multi-million-bit embed/extract loops responsive by
// slicing them into timed ticks.

/// Length of one scheduling frame in milliseconds.
pub const TASK_TIME_FRAME_MS: u64 = 100;

/// Fraction of the frame a task may spend stepping before it yields.
pub const TASK_TIME_RATE: f64 = 0.8;

/// Minimum delay between two ticks in milliseconds.
pub const TASK_MIN_DELAY_MS: u64 = 5;

/// Bits processed per step inside the embed/extract loops.
///
/// Small enough that the elapsed-time check between steps keeps a tick close
/// to its slice, large enough that the check itself is amortized.
pub const BITS_PER_STEP: usize = 1024;

// === User Interface Limits ===

/// Minimum passphrase length accepted by the interactive prompts.
pub const PASSPHRASE_MIN_LENGTH: usize = 1;

/// File patterns offered as carriers by the interactive wizard.
pub const CARRIER_PATTERNS: &[&str] = &["*.png", "*.jpg", "*.jpeg"];

/// Directories skipped while discovering carrier images.
pub const EXCLUDED_PATTERNS: &[&str] = &[
    "target",       // Rust build artifacts
    "node_modules", // Node.js dependencies
    ".git",         // Git repository metadata
    ".cache",       // Application cache files
];
