//! datadict-core: data-dictionary value validation
//!
//! Validates arbitrary JSON values against a data dictionary: a graph of
//! term records describing descriptors, data types, enumerations and
//! structural rules. Given a value and optionally a descriptor key, the
//! validator reports whether the value conforms to the descriptor's declared
//! shape; almost-correct values (a date string where a timestamp is
//! expected, an enumeration code where the canonical key is expected) can be
//! resolved in place with every substitution logged.
//!
//! ## Architecture
//!
//! Store Adapter → Term Cache → Validator, leaves first: the cache is the
//! only component touching the store, the validator the only one touching
//! the cache.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use datadict_core::{
//!     DictionaryConfig, MemoryDictionary, TermCache, ValidatorOptions,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(DictionaryConfig::default());
//! let store = Arc::new(MemoryDictionary::new(config.clone()));
//! let cache = TermCache::new(store, config);
//!
//! let mut validator = ValidatorOptions::new(serde_json::json!(true))
//!     .descriptor("flag_active")
//!     .build(cache)?;
//! let valid = validator.validate(None).await?;
//! println!("{valid}: {}", validator.report().to_value());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod report;
pub mod status;
pub mod store;
pub mod term;
pub mod validator;

pub use cache::{BatchOverlay, Lookup, TermCache};
pub use config::DictionaryConfig;
pub use error::{SetupError, StoreError, ValidateError};
pub use report::{change_digest, Report, ReportSlot, StatusExtras, ValueResolution};
pub use status::{Status, StatusCode};
pub use store::{MemoryDictionary, StoreAdapter, TermFetch, TermFields};
#[cfg(feature = "database")]
pub use store::PgDictionaryStore;
pub use term::{ScalarType, Term};
pub use validator::{CancelFlag, Validator, ValidatorOptions};
