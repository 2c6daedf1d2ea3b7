//! Observer implementations for exporting counter totals.
//!
//! Observers render a `snapshot::MetricsSnapshot`,
//! so reading the store happens once, up front, and every exporter sees the
//! same totals:
//!
//! - `table` - Pretty-print counters as tables using the `tabled` crate
//! - `json` - Serialize counters to JSON format
//!
//! # Unified Error Handling
//!
//! All observers use a unified [`ObserverError`] type, allowing you to switch
//! between observers without changing error handling code.
//!
//! # Feature Flags
//!
//! - `table` - Enables the `table` module
//! - `json` - Enables the `json` module
//! - `full` - Enables all observer modules
//!
//! # Example
//!
//! ```rust,ignore
//! use contatori_store::observers::json::JsonObserver;
//! use contatori_store::observers::table::TableObserver;
//! use contatori_store::snapshot::MetricsSnapshot;
//!
//! let snapshot = MetricsSnapshot::collect(&counter, ["requests", "errors"])?;
//!
//! println!("{}", TableObserver::new().render(&snapshot));
//! println!("{}", JsonObserver::new().pretty(true).to_json(&snapshot)?);
//! ```

mod error;

pub use error::{ObserverError, Result};

#[cfg(feature = "table")]
pub mod table;

#[cfg(feature = "json")]
pub mod json;
