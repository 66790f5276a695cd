//! Arkvault
//!
//! Vault build pipeline: bundle a folder of files into a single
//! content-addressed vault, upload its contents to S3-compatible storage
//! through short-lived per-object grants, and commit an immutable manifest
//! locking pricing and provenance at build time.
//!
//! # Modules
//!
//! - `vault`: client-side build flow (collect, hash, pipeline)
//! - `session`: server-side upload session manager and grant minting
//! - `transfer`: upload executor with bounded concurrency
//! - `manifest`: manifest assembly, export, and optional token minting
//! - `pricing` / `endowment`: economic terms frozen into manifests
//! - `storage`: S3-compatible client and presigned-URL issuance

pub mod config;
pub mod endowment;
pub mod error;
pub mod manifest;
pub mod pricing;
pub mod routes;
pub mod session;
pub mod state;
pub mod storage;
pub mod transfer;
pub mod vault;
