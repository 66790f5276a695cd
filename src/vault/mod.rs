//! Vault build pipeline
//!
//! A vault is a named, hashed bundle of files treated as a single unit of
//! storage and provenance. This module owns the client-side build flow:
//!
//! 1. Collect: normalize a folder or file list into ordered logical files
//! 2. Hash: compute the deterministic archive digest over the canonical order
//! 3. Upload: push each file to its granted destination (see `transfer`)
//! 4. Commit: assemble and export the immutable manifest (see `manifest`)

pub mod collect;
pub mod hash;
pub mod pipeline;

pub use collect::{collect_dir, collect_files, CollectError, LogicalFile};
pub use hash::{archive_digest, hash_file, HashError, HASH_CHUNK_SIZE};
pub use pipeline::{BuildStage, BuildSession, StageError, VaultBuilder};
