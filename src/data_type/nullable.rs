use std::sync::Arc;

use super::{
    bulk_range, check_row, check_streams, read_limit, typed, typed_mut, DataType, DataTypePtr,
};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::column::{Column, ColumnNullable, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;

/// Wraps another type so that any row may also be NULL.
///
/// In a single stream each row is a null flag byte followed, for non NULL rows only, by the
/// nested value. Across multiple streams the null map goes to its own `.null` stream and the
/// nested type's streams follow at the same level, with a default value standing in for each
/// NULL row.
#[derive(Debug, Clone)]
pub struct DataTypeNullable {
    nested: DataTypePtr,
}

impl DataTypeNullable {
    pub fn new(nested: DataTypePtr) -> Self {
        Self { nested }
    }

    pub fn nested(&self) -> &DataTypePtr {
        &self.nested
    }

    fn serialize_or_null<F>(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        null: &str,
        f: F,
    ) -> Result<(), TypeError>
    where
        F: FnOnce(&dyn Column, &mut WriteBuffer) -> Result<(), TypeError>,
    {
        let column = typed::<ColumnNullable, _>(self, column)?;
        check_row(column, row_num)?;
        if column.is_null_at(row_num) {
            out.write_str(null);
            Ok(())
        } else {
            f(column.nested(), out)
        }
    }

    fn deserialize_or_null<F>(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        is_null: bool,
        f: F,
    ) -> Result<(), TypeError>
    where
        F: FnOnce(&mut dyn Column, &mut ReadBuffer<'_>) -> Result<(), TypeError>,
    {
        let column = typed_mut::<ColumnNullable, _>(self, column)?;
        if is_null {
            column.push_default();
        } else {
            f(column.nested_mut(), input)?;
            column.push_null_map(&[0]);
        }
        Ok(())
    }

    fn read_flag(&self, input: &mut ReadBuffer<'_>) -> Result<bool, TypeError> {
        match input.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(TypeError::cannot_parse(
                self.name(),
                format!("invalid null flag {}", other),
            )),
        }
    }
}

/// `\N` or a bare `NULL` filling the whole CSV field.
fn csv_null(input: &mut ReadBuffer<'_>, delimiter: u8) -> bool {
    if input.check_prefix(b"\\N") {
        return true;
    }
    let rest = input.peek_slice();
    let bare = rest.starts_with(b"NULL")
        && rest
            .get(4)
            .map_or(true, |b| *b == delimiter || matches!(b, b'\n' | b'\r'));
    if bare {
        input.advance(4);
    }
    bare
}

impl DataType for DataTypeNullable {
    fn name(&self) -> String {
        format!("Nullable({})", self.nested.name())
    }

    fn is_nullable(&self) -> bool {
        true
    }

    fn is_numeric(&self) -> bool {
        self.nested.is_numeric()
    }

    fn is_numeric_not_nullable(&self) -> bool {
        false
    }

    fn behaves_as_number(&self) -> bool {
        self.nested.behaves_as_number()
    }

    fn clone_type(&self) -> DataTypePtr {
        Arc::new(Self::new(self.nested.clone_type()))
    }

    fn serialize_binary_bulk(
        &self,
        column: &dyn Column,
        out: &mut WriteBuffer,
        offset: usize,
        limit: usize,
    ) -> Result<(), TypeError> {
        let typed_column = typed::<ColumnNullable, _>(self, column)?;
        for row in bulk_range(typed_column.len(), offset, limit)? {
            self.serialize_binary(column, row, out)?;
        }
        Ok(())
    }

    fn deserialize_binary_bulk(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        limit: usize,
        _avg_value_size_hint: f64,
    ) -> Result<(), TypeError> {
        let limit = read_limit(limit);
        super::with_rollback(column, |column| {
            let mut read = 0;
            while read < limit && !input.eof() {
                self.deserialize_binary(column, input)?;
                read += 1;
            }
            tracing::trace!(rows = read, type_name = %self.name(), "deserialized nullable values");
            Ok(())
        })
    }

    fn describe_multiple_streams(&self, out_descriptions: &mut Vec<String>, level: usize) {
        out_descriptions.push(".null".to_string());
        self.nested.describe_multiple_streams(out_descriptions, level);
    }

    fn serialize_binary_bulk_with_multiple_streams(
        &self,
        column: &dyn Column,
        streams: &mut [WriteBuffer],
        position_independent_encoding: bool,
        offset: usize,
        limit: usize,
    ) -> Result<(), TypeError> {
        check_streams(self, streams.len())?;
        let column = typed::<ColumnNullable, _>(self, column)?;
        let range = bulk_range(column.len(), offset, limit)?;
        let (null_stream, nested_streams) = streams
            .split_first_mut()
            .ok_or_else(|| TypeError::NotEnoughStreams {
                type_name: self.name(),
                expected: 1,
                got: 0,
            })?;
        null_stream.write(&column.null_map()[range.clone()]);
        if !range.is_empty() {
            self.nested.serialize_binary_bulk_with_multiple_streams(
                column.nested(),
                nested_streams,
                position_independent_encoding,
                range.start,
                range.len(),
            )?;
        }
        Ok(())
    }

    fn deserialize_binary_bulk_with_multiple_streams(
        &self,
        column: &mut dyn Column,
        streams: &mut [ReadBuffer<'_>],
        position_independent_encoding: bool,
        limit: usize,
        avg_value_size_hint: f64,
    ) -> Result<(), TypeError> {
        check_streams(self, streams.len())?;
        let column = typed_mut::<ColumnNullable, _>(self, column)?;
        let (null_stream, nested_streams) = streams
            .split_first_mut()
            .ok_or_else(|| TypeError::NotEnoughStreams {
                type_name: self.name(),
                expected: 1,
                got: 0,
            })?;

        let rows = read_limit(limit).min(null_stream.remaining());
        let null_map = null_stream.read_bytes(rows)?.to_vec();
        if let Some(bad) = null_map.iter().find(|flag| **flag > 1) {
            return Err(TypeError::cannot_parse(
                self.name(),
                format!("invalid null flag {}", bad),
            ));
        }
        if rows == 0 {
            return Ok(());
        }

        let before = column.nested().len();
        self.nested.deserialize_binary_bulk_with_multiple_streams(
            column.nested_mut(),
            nested_streams,
            position_independent_encoding,
            rows,
            avg_value_size_hint,
        )?;
        let got = column.nested().len() - before;
        if got != rows {
            tracing::debug!(expected = rows, got, "nested stream ended before the null map");
            column.nested_mut().pop(got);
            return Err(TypeError::ShortRead {
                type_name: self.nested.name(),
                expected: rows,
                got,
            });
        }
        column.push_null_map(&null_map);
        Ok(())
    }

    fn serialize_binary_field(&self, field: &Field, out: &mut WriteBuffer) -> Result<(), TypeError> {
        if field.is_null() {
            out.write_byte(1);
            Ok(())
        } else {
            out.write_byte(0);
            self.nested.serialize_binary_field(field, out)
        }
    }

    fn deserialize_binary_field(&self, input: &mut ReadBuffer<'_>) -> Result<Field, TypeError> {
        if self.read_flag(input)? {
            Ok(Field::Null)
        } else {
            self.nested.deserialize_binary_field(input)
        }
    }

    fn serialize_binary(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        let column = typed::<ColumnNullable, _>(self, column)?;
        check_row(column, row_num)?;
        if column.is_null_at(row_num) {
            out.write_byte(1);
            Ok(())
        } else {
            out.write_byte(0);
            self.nested.serialize_binary(column.nested(), row_num, out)
        }
    }

    fn deserialize_binary(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let is_null = self.read_flag(input)?;
        self.deserialize_or_null(column, input, is_null, |nested, input| {
            self.nested.deserialize_binary(nested, input)
        })
    }

    fn serialize_text_escaped(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_or_null(column, row_num, out, "\\N", |nested, out| {
            self.nested.serialize_text_escaped(nested, row_num, out)
        })
    }

    fn deserialize_text_escaped(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let is_null = input.check_prefix(b"\\N");
        self.deserialize_or_null(column, input, is_null, |nested, input| {
            self.nested.deserialize_text_escaped(nested, input)
        })
    }

    fn serialize_text_quoted(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_or_null(column, row_num, out, "NULL", |nested, out| {
            self.nested.serialize_text_quoted(nested, row_num, out)
        })
    }

    fn deserialize_text_quoted(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let is_null = input.check_prefix(b"NULL");
        self.deserialize_or_null(column, input, is_null, |nested, input| {
            self.nested.deserialize_text_quoted(nested, input)
        })
    }

    fn serialize_text_csv(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_or_null(column, row_num, out, "\\N", |nested, out| {
            self.nested.serialize_text_csv(nested, row_num, out)
        })
    }

    fn deserialize_text_csv(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        delimiter: u8,
    ) -> Result<(), TypeError> {
        let is_null = csv_null(input, delimiter);
        self.deserialize_or_null(column, input, is_null, |nested, input| {
            self.nested.deserialize_text_csv(nested, input, delimiter)
        })
    }

    fn serialize_text(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_or_null(column, row_num, out, "NULL", |nested, out| {
            self.nested.serialize_text(nested, row_num, out)
        })
    }

    fn serialize_text_json(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        force_quoting_64bit_integers: bool,
    ) -> Result<(), TypeError> {
        self.serialize_or_null(column, row_num, out, "null", |nested, out| {
            self.nested
                .serialize_text_json(nested, row_num, out, force_quoting_64bit_integers)
        })
    }

    fn deserialize_text_json(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let is_null = input.check_prefix(b"null");
        self.deserialize_or_null(column, input, is_null, |nested, input| {
            self.nested.deserialize_text_json(nested, input)
        })
    }

    fn serialize_text_xml(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_or_null(column, row_num, out, "\\N", |nested, out| {
            self.nested.serialize_text_xml(nested, row_num, out)
        })
    }

    fn create_column(&self) -> ColumnPtr {
        Box::new(ColumnNullable::new(self.nested.create_column()))
    }

    fn default_value(&self) -> Field {
        Field::Null
    }
}
