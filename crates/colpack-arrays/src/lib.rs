//! Packed-column (struct-of-arrays) storage.
//!
//! An [`Arrays<(T0, T1, ...)>`](Arrays) stores one column per tuple element,
//! all columns carved out of a single allocation. Rows are appended,
//! inserted, removed, and swapped across every column at once, while each
//! column can be read as a plain slice. This is the crate that touches raw
//! memory; every `unsafe` block carries a `SAFETY:` note.
//!
//! # Architecture
//!
//! ```text
//! Arrays<C, A> (container: len, capacity, growth)
//! ├── ColumnSet (tuple C → typed row write/read/borrow)
//! ├── ColumnTable → ColumnDispatch × COLUMNS (type-erased drop/move/swap)
//! ├── LayoutPlanner (byte budget + aligned column offsets)
//! └── Buffer ← Allocator (HeapAllocator by default)
//! ```
//!
//! # Growth
//!
//! Growing allocates a new buffer, relocates the live rows column by column
//! (bitwise for types without drop glue, element by element otherwise),
//! then releases the old buffer. The container never holds more than one
//! buffer between operations.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod alloc;
pub mod arrays;
pub mod layout;
pub mod lifecycle;
pub mod set;
pub mod view;

pub use alloc::{Allocator, HeapAllocator};
pub use arrays::Arrays;
pub use layout::{BufferLayout, ColumnSpan, LayoutPlanner};
pub use lifecycle::ColumnDispatch;
pub use set::{ColumnAt, ColumnSet, ColumnTable};
pub use view::ColumnView;

pub use colpack_core::{
    Alignment, ArraysConfig, ArraysError, ColumnMeta, GrowthPolicy, Relocation, DEFAULT_ALIGNMENT,
};
