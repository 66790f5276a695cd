//! Manifest Assembler
//!
//! The manifest is the terminal record of a vault build: contents, digest,
//! storage location, heritage terms, frozen pricing, optional endowment lock,
//! and optional token reference. Assembly validates required fields, export
//! writes the document out (local file or object storage), and minting is an
//! optional collaborator whose failure never invalidates the written
//! manifest.

pub mod assemble;
pub mod export;
pub mod mint;
pub mod types;

pub use assemble::{assemble, AssembleInput, ValidationError};
pub use export::{ExportError, ExportReceipt, LocalExporter, ManifestExporter, ObjectStorageExporter};
pub use mint::{token_metadata, MintReceipt, MintingError, TokenAttribute, TokenMetadata, TokenMinter};
pub use types::{
    ArchiveDescriptor, FileEntry, Heir, HeritagePolicy, Manifest, StoragePolicy, TokenRef,
    Visibility, DIGEST_ALGORITHM, MANIFEST_VERSION,
};
