//! # Columnar types
//!
//! Type descriptors for a column oriented analytical store. A [`DataType`] knows how to turn
//! the values held in a [`Column`] into bytes and back again:
//!
//! * in bulk, for ranges of rows, either into a single stream
//!   ([`DataType::serialize_binary_bulk`]) or spread across several physical streams for
//!   composite types ([`DataType::serialize_binary_bulk_with_multiple_streams`], with the
//!   stream layout given by [`DataType::describe_multiple_streams`]);
//! * one value at a time, in binary or in one of the text dialects listed in [`TextFormat`].
//!
//! Descriptors are immutable and shared as [`DataTypePtr`]; [`DataTypeFactory`] rebuilds one
//! from its name.
//!
//! ```
//! use columnar_types::{DataType, DataTypeFactory, Field, ReadBuffer, WriteBuffer};
//!
//! let ty = DataTypeFactory::get("Array(UInt8)").unwrap();
//! let mut column = ty.create_column();
//! column.push_field(&Field::Array(vec![1u64.into(), 2u64.into()])).unwrap();
//! column.push_field(&Field::Array(vec![3u64.into()])).unwrap();
//!
//! let mut streams = vec![WriteBuffer::new(); 2];
//! ty.serialize_binary_bulk_with_multiple_streams(column.as_ref(), &mut streams, true, 0, 0)
//!     .unwrap();
//!
//! let mut readers: Vec<ReadBuffer<'_>> = streams.iter().map(|s| s.reader()).collect();
//! let mut decoded = ty.create_column();
//! ty.deserialize_binary_bulk_with_multiple_streams(decoded.as_mut(), &mut readers, true, 0, 0.0)
//!     .unwrap();
//! assert_eq!(decoded.fields(), column.fields());
//! ```
//!
//! ## Failure
//!
//! Everything fallible returns a [`TypeError`]. A failed `deserialize_*` call leaves the target
//! column as it was.

#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true
)]

mod buffer;
pub mod column;
pub mod data_type;
pub mod error;
mod factory;
mod field;
mod format;
mod leb128;
#[cfg(test)]
mod properties;
mod text;

pub use buffer::{ReadBuffer, WriteBuffer};
pub use column::{Column, ColumnPtr};
pub use data_type::{DataType, DataTypePtr, DataTypes, MAX_ALLOCATION};
pub use error::{ErrorCode, TypeError};
pub use factory::DataTypeFactory;
pub use field::Field;
pub use format::{FormatSettings, TextFormat};
