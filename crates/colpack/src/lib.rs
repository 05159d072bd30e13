//! colpack: packed struct-of-arrays columns in one contiguous allocation.
//!
//! This is the top-level facade crate that re-exports the public API from the
//! colpack sub-crates. For most users, adding `colpack` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use colpack::prelude::*;
//!
//! // Two columns: an i32 column and a String column aligned to 16 bytes.
//! let config = ArraysConfig::new().with_alignment(1, 16);
//! let mut arrays: Arrays<(i32, String)> = Arrays::with_config(&config).unwrap();
//!
//! arrays.append((1, "one".into()));
//! arrays.append((2, "two".into()));
//! arrays.append((3, "three".into()));
//! arrays.remove_at(1);
//! arrays.insert_at(1, (5, "five".into()));
//!
//! assert_eq!(arrays.data::<0>(), &[1, 5, 3]);
//! assert_eq!(arrays.data::<1>(), &["one", "five", "three"]);
//! assert_eq!(arrays.as_ptr::<1>() as usize % 16, 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `colpack-core` | Alignment, column metadata, configuration, errors |
//! | [`arrays`] | `colpack-arrays` | The container, layout planner, dispatcher, allocators |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Column metadata, configuration, and errors (`colpack-core`).
pub use colpack_core as types;

/// The packed-column container and its machinery (`colpack-arrays`).
///
/// [`arrays::Arrays`] is the container; [`arrays::LayoutPlanner`] and
/// [`arrays::ColumnDispatch`] are exposed for callers that want to inspect
/// how columns are placed and relocated.
pub use colpack_arrays as arrays;

/// Common imports for typical colpack usage.
///
/// ```rust
/// use colpack::prelude::*;
/// ```
pub mod prelude {
    // Container
    pub use colpack_arrays::{Arrays, ColumnView};

    // Allocation
    pub use colpack_arrays::{Allocator, HeapAllocator};

    // Configuration and errors
    pub use colpack_core::{Alignment, ArraysConfig, ArraysError, GrowthPolicy};
}
