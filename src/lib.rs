//! Persists schema-less configuration documents as block-style YAML.
//!
//! A document (any JSON-like structure with a mapping at the top) is rendered
//! in memory and then swapped into place at a fixed path, so the file on disk
//! is always either the previous document or the new one in full.
//!
//! # Example
//! ```
//! let doc: configgen::Value =
//!     serde_json::from_str(r#"{"server": {"host": "0.0.0.0", "port": 80}, "debug": true}"#)
//!         .unwrap();
//! let text = configgen::to_string(&doc).unwrap();
//! assert_eq!(text, "server:\n  host: 0.0.0.0\n  port: 80\ndebug: true\n");
//!
//! let back: configgen::Value = configgen::from_str(&text).unwrap();
//! assert_eq!(back, doc);
//! ```

pub mod config;
mod de;
mod emit;
mod error;
mod ser;
pub mod server;
mod store;
mod value;

pub use de::{from_fs, from_str, parse};
pub use error::{Error, ErrorKind, Result};
pub use ser::{to_string, to_value, Serializer};
pub use store::{ConfigFile, FileStore, StoreState, DEFAULT_FILENAME, DEFAULT_MAX_DEPTH};
pub use value::{Mapping, Value};
