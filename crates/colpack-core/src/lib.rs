//! Core types for the colpack packed-column container.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! metadata every other colpack crate agrees on: column alignment, the
//! per-column descriptor, container configuration, and the error type.
//! Nothing here touches raw memory.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod align;
pub mod column;
pub mod config;
pub mod error;

pub use align::{Alignment, DEFAULT_ALIGNMENT};
pub use column::{ColumnMeta, Relocation};
pub use config::{ArraysConfig, GrowthPolicy};
pub use error::ArraysError;
