//! Shared types, error model, and configuration for Blankforge.
//!
//! This crate is the foundation depended on by all other Blankforge crates.
//! It provides:
//! - [`BlankforgeError`] — the unified error type
//! - Domain types ([`ProductRecord`], [`ContentUnit`], [`QaPair`], [`DatasetManifest`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ExtractConfig, TrainerConfig, ValidationConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{BlankforgeError, Result};
pub use types::{
    BatterySpec, BrandInfo, CURRENT_SCHEMA_VERSION, CameraSpec, Category, ContentUnit,
    DatasetManifest, DisplaySpec, ForumThread, MemorySpec, ProcessorSpec, ProductCatalog,
    ProductRecord, QaPair, RunId,
};
