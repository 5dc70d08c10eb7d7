//! pixveil - Steganographic storage inside ordinary images.
//!
//! Conceals a set of named, individually encrypted items inside a PNG or
//! JPEG carrier by scattering the bits of a self-describing container
//! across the image's bit planes, at positions chosen by a
//! passphrase-seeded pseudo-random walk:
//! - Self-framing binary container with per-item AES-256-CBC encryption
//! - SHA-256 integrity digest over the embedded stream
//! - Magnitude-aware capacity analysis of JPEG DCT coefficients
//! - Cooperative, time-sliced embed/extract loops that never block the host

pub mod allocator;
pub mod app;
pub mod binary;
pub mod carrier;
pub mod config;
pub mod container;
pub mod credentials;
pub mod error;
pub mod file;
pub mod item;
pub mod processor;
pub mod task;
pub mod ui;
