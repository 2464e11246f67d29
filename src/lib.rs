//! # listkeeper
//!
//! Backend library for editing router-side domain list and configuration
//! files, with duplicate detection and live domain availability checking.
//!
//! ## Design Philosophy
//!
//! listkeeper is designed to be:
//! - **Highly configurable** - Timeouts, batch sizes, and naming rules are all settings
//! - **Sensible defaults** - Works out of the box pointed at a storage endpoint
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use listkeeper::{ApiClient, Config, ListManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let storage = Arc::new(ApiClient::new(&config.storage, config.retry.clone())?);
//!     let manager = ListManager::new(config, storage)?;
//!
//!     // Subscribe to events
//!     let mut events = manager.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Check every domain in a list file
//!     let summary = manager.check_file_domains("user.list").await?;
//!     println!("{} accessible, {} blocked", summary.accessible, summary.blocked);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Live in-file duplicate annotation
pub mod annotator;
/// Remote storage API client
pub mod api;
/// Domain availability checking
pub mod availability;
/// Configuration types
pub mod config;
/// Cross-file duplicate detection
pub mod duplicates;
/// Error types
pub mod error;
/// Domain extraction from list content
pub mod extract;
/// List file parsing and classification
pub mod listfile;
/// High-level list editing facade
pub mod manager;
/// Retry logic with exponential backoff
pub mod retry;
/// File storage abstraction
pub mod storage;
/// Core types and events
pub mod types;
/// Version parsing and update checking
pub mod version;

// Re-export commonly used types
pub use annotator::LiveDuplicateAnnotator;
pub use api::ApiClient;
pub use availability::{AvailabilityChecker, CheckSession, SingleDomainChecker};
pub use config::{
    AvailabilityConfig, Config, DuplicateConfig, RetryConfig, StorageConfig, UpdateConfig,
};
pub use duplicates::DuplicateScanner;
pub use error::{Error, IsRetryable, ProbeError, Result, StorageError};
pub use extract::extract_domains;
pub use manager::ListManager;
pub use storage::{FileStorage, MemoryStorage};
pub use types::{
    CheckResult, CheckSummary, Domain, DuplicateMatch, DuplicateReport, DuplicateResult, Event,
    ListEntry, RunState, ServiceAction,
};
pub use version::{UpdateChecker, Version};
