//! The type descriptor contract.
//!
//! A [`DataType`] describes one logical column type: how it is classified, how ranges of a
//! column are written to and read from one or more byte streams, how single values are written
//! in each text dialect, and how empty or constant columns of the type are made. Descriptors are
//! immutable and shared as [`DataTypePtr`].
//!
//! # Failure and the target column
//!
//! Every `deserialize_*` method either appends what it decoded or returns an error leaving the
//! column exactly as it was. Bulk binary reads stop quietly at a clean end of stream (between two
//! values) but fail if the stream ends inside a value.

use std::fmt::Debug;
use std::ops::Range;
use std::sync::Arc;

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::column::{Column, ColumnConst, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;

mod array;
mod date;
mod date_time;
mod fixed_string;
mod null;
mod nullable;
mod number;
mod string;

pub use array::DataTypeArray;
pub use date::DataTypeDate;
pub use date_time::DataTypeDateTime;
pub use fixed_string::DataTypeFixedString;
pub use null::DataTypeNull;
pub use nullable::DataTypeNullable;
pub use number::{
    DataTypeFloat32, DataTypeFloat64, DataTypeInt16, DataTypeInt32, DataTypeInt64,
    DataTypeInt8, DataTypeNumber, DataTypeUInt16, DataTypeUInt32, DataTypeUInt64,
    DataTypeUInt8,
};
pub use string::DataTypeString;

pub type DataTypePtr = Arc<dyn DataType>;
pub type DataTypes = Vec<DataTypePtr>;

/// Upper bound on a binary length prefix (string length or array size) before anything is
/// allocated for it.
pub const MAX_ALLOCATION: u64 = 1 << 30;

pub trait DataType: Debug + Send + Sync {
    /// The type's name, e.g. `UInt64` or `Array(Nullable(String))`. Parsing it with
    /// [`crate::DataTypeFactory`] yields an equivalent type.
    fn name(&self) -> String;

    fn is_null(&self) -> bool {
        false
    }

    fn is_nullable(&self) -> bool {
        false
    }

    /// Numbers, and `Date`/`DateTime`.
    fn is_numeric(&self) -> bool {
        false
    }

    fn is_numeric_not_nullable(&self) -> bool {
        self.is_numeric()
    }

    /// Whether arithmetic and numeric casts make sense. False for `Date`/`DateTime`.
    fn behaves_as_number(&self) -> bool {
        false
    }

    fn clone_type(&self) -> DataTypePtr;

    /// Write rows `offset..offset + limit` of `column` to `out`. A `limit` of zero, or one
    /// running past the end of the column, writes up to the end.
    ///
    /// # Errors
    /// If `offset > column.len()` or `column` is not of this type's representation
    fn serialize_binary_bulk(
        &self,
        column: &dyn Column,
        out: &mut WriteBuffer,
        offset: usize,
        limit: usize,
    ) -> Result<(), TypeError>;

    /// Read at most `limit` values (all remaining if `limit` is zero) and append them to
    /// `column`. `avg_value_size_hint`, if non zero, is the expected size in bytes of one value
    /// and only affects how much memory is reserved up front.
    fn deserialize_binary_bulk(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        limit: usize,
        avg_value_size_hint: f64,
    ) -> Result<(), TypeError>;

    /// Push one suffix per physical stream this type is written to, e.g. `.size0`, `.size1`,
    /// `""` for `Array(Array(UInt8))` at level 0. A single stream has the empty suffix.
    fn describe_multiple_streams(&self, out_descriptions: &mut Vec<String>, _level: usize) {
        out_descriptions.push(String::new());
    }

    /// Write rows `offset..offset + limit` across `streams`, which are ordered as
    /// [`DataType::describe_multiple_streams`] describes them.
    fn serialize_binary_bulk_with_multiple_streams(
        &self,
        column: &dyn Column,
        streams: &mut [WriteBuffer],
        _position_independent_encoding: bool,
        offset: usize,
        limit: usize,
    ) -> Result<(), TypeError> {
        let got = streams.len();
        let out = streams.first_mut().ok_or_else(|| TypeError::NotEnoughStreams {
            type_name: self.name(),
            expected: 1,
            got,
        })?;
        self.serialize_binary_bulk(column, out, offset, limit)
    }

    fn deserialize_binary_bulk_with_multiple_streams(
        &self,
        column: &mut dyn Column,
        streams: &mut [ReadBuffer<'_>],
        _position_independent_encoding: bool,
        limit: usize,
        avg_value_size_hint: f64,
    ) -> Result<(), TypeError> {
        let got = streams.len();
        let input = streams.first_mut().ok_or_else(|| TypeError::NotEnoughStreams {
            type_name: self.name(),
            expected: 1,
            got,
        })?;
        self.deserialize_binary_bulk(column, input, limit, avg_value_size_hint)
    }

    /// Binary form of a single value. For composite types this is a self contained encoding
    /// (an array is its size followed by its elements) and differs from the bulk layout.
    fn serialize_binary_field(&self, field: &Field, out: &mut WriteBuffer)
        -> Result<(), TypeError>;

    fn deserialize_binary_field(&self, input: &mut ReadBuffer<'_>) -> Result<Field, TypeError>;

    fn serialize_binary(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError>;

    fn deserialize_binary(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError>;

    /// Text with escape sequences and no quotes, as used by tab separated formats.
    fn serialize_text_escaped(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError>;

    fn deserialize_text_escaped(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError>;

    /// A literal which may be embedded in a query.
    fn serialize_text_quoted(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError>;

    fn deserialize_text_quoted(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError>;

    fn serialize_text_csv(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError>;

    /// `delimiter` ends a value which is not double quoted. It is left unread.
    fn deserialize_text_csv(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        delimiter: u8,
    ) -> Result<(), TypeError>;

    /// Plain text for display, without escaping or quoting.
    fn serialize_text(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError>;

    /// `force_quoting_64bit_integers` writes `UInt64`/`Int64` values as JSON strings.
    fn serialize_text_json(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        force_quoting_64bit_integers: bool,
    ) -> Result<(), TypeError>;

    fn deserialize_text_json(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError>;

    fn serialize_text_xml(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_text(column, row_num, out)
    }

    /// A new, empty, mutable column of this type's representation.
    fn create_column(&self) -> ColumnPtr;

    /// A column behaving as `size` copies of `field`.
    ///
    /// # Errors
    /// If `field` is not a value of this type
    fn create_const_column(&self, size: usize, field: &Field) -> Result<ColumnPtr, TypeError> {
        let mut data = self.create_column();
        data.push_field(field)?;
        Ok(Box::new(ColumnConst::new(data, size)?))
    }

    /// The value used where none is given: zero, the empty string, the empty array or NULL.
    fn default_value(&self) -> Field;

    /// Approximate size in bytes of one value.
    ///
    /// # Errors
    /// `NotImplemented` for types without a meaningful constant size
    fn size_of_field(&self) -> Result<usize, TypeError> {
        Err(TypeError::not_implemented("size_of_field", self.name()))
    }
}

/// Downcast `column` to the representation `T` works with.
pub(crate) fn typed<'a, C: Column, T: DataType + ?Sized>(
    data_type: &T,
    column: &'a dyn Column,
) -> Result<&'a C, TypeError> {
    column
        .as_any()
        .downcast_ref::<C>()
        .ok_or_else(|| TypeError::illegal_column(column.family_name(), data_type.name()))
}

pub(crate) fn typed_mut<'a, C: Column, T: DataType + ?Sized>(
    data_type: &T,
    column: &'a mut dyn Column,
) -> Result<&'a mut C, TypeError> {
    let family = column.family_name();
    column
        .as_any_mut()
        .downcast_mut::<C>()
        .ok_or_else(|| TypeError::illegal_column(family, data_type.name()))
}

/// The rows a bulk write covers.
pub(crate) fn bulk_range(len: usize, offset: usize, limit: usize) -> Result<Range<usize>, TypeError> {
    if offset > len {
        return Err(TypeError::OffsetOutOfBounds { offset, len });
    }
    let end = if limit == 0 {
        len
    } else {
        offset.saturating_add(limit).min(len)
    };
    Ok(offset..end)
}

/// Deserialization treats a zero limit as "read everything".
pub(crate) fn read_limit(limit: usize) -> usize {
    if limit == 0 {
        usize::MAX
    } else {
        limit
    }
}

pub(crate) fn check_row(column: &dyn Column, row_num: usize) -> Result<(), TypeError> {
    if row_num >= column.len() {
        Err(TypeError::OffsetOutOfBounds {
            offset: row_num,
            len: column.len(),
        })
    } else {
        Ok(())
    }
}

pub(crate) fn stream_count<T: DataType + ?Sized>(data_type: &T) -> usize {
    let mut descriptions = Vec::new();
    data_type.describe_multiple_streams(&mut descriptions, 0);
    descriptions.len()
}

pub(crate) fn check_streams<T: DataType + ?Sized>(
    data_type: &T,
    got: usize,
) -> Result<(), TypeError> {
    let expected = stream_count(data_type);
    if got < expected {
        Err(TypeError::NotEnoughStreams {
            type_name: data_type.name(),
            expected,
            got,
        })
    } else {
        Ok(())
    }
}

/// Run `f`, which appends to `column`, and drop whatever it appended if it fails.
pub(crate) fn with_rollback<F>(column: &mut dyn Column, f: F) -> Result<(), TypeError>
where
    F: FnOnce(&mut dyn Column) -> Result<(), TypeError>,
{
    let before = column.len();
    let result = f(column);
    if let Err(e) = &result {
        let appended = column.len().saturating_sub(before);
        if appended > 0 {
            tracing::debug!(appended, err=%e, "rolling back partially deserialized rows");
            column.pop(appended);
        }
    }
    result
}

/// Decode one value into a scratch column and append it to `column` only once it is complete.
pub(crate) fn deserialize_one<T, F>(
    data_type: &T,
    column: &mut dyn Column,
    f: F,
) -> Result<(), TypeError>
where
    T: DataType + ?Sized,
    F: FnOnce(&mut dyn Column) -> Result<(), TypeError>,
{
    let mut scratch = data_type.create_column();
    f(scratch.as_mut())?;
    column.extend_from(scratch.as_ref(), 0, scratch.len())
}

pub(crate) fn field_mismatch<T: DataType + ?Sized>(data_type: &T, field: &Field) -> TypeError {
    TypeError::type_mismatch(data_type.name(), field.type_name())
}
