//! Memory Allocator Configuration
//!
//! Routes all allocations through mimalloc. The embed/extract loops churn
//! through many short-lived buffers (block payloads, capacity snapshots,
//! serialized containers), a pattern mimalloc handles better than the
//! system allocator.

use mimalloc::MiMalloc;

/// Global memory allocator instance using mimalloc.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
