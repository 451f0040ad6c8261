use std::sync::Arc;

use super::{
    bulk_range, check_row, field_mismatch, read_limit, typed, typed_mut, with_rollback, DataType,
    DataTypePtr, MAX_ALLOCATION,
};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::column::{Column, ColumnPtr, ColumnString};
use crate::error::TypeError;
use crate::field::Field;
use crate::leb128::{read_length, ulebsize, write_varuint};
use crate::text;

/// Arbitrary bytes, written as a uLEB128 length followed by the bytes themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeString;

const NAME: &str = "String";

impl DataTypeString {
    pub fn new() -> Self {
        Self
    }

    fn bytes<'a>(&self, column: &'a dyn Column, row_num: usize) -> Result<&'a [u8], TypeError> {
        let column = typed::<ColumnString, _>(self, column)?;
        check_row(column, row_num)?;
        Ok(column.get_bytes(row_num))
    }

    fn push(&self, column: &mut dyn Column, bytes: &[u8]) -> Result<(), TypeError> {
        typed_mut::<ColumnString, _>(self, column)?.push_bytes(bytes);
        Ok(())
    }
}

fn read_value(input: &mut ReadBuffer<'_>) -> Result<Vec<u8>, TypeError> {
    let len = read_length(input, MAX_ALLOCATION)?;
    Ok(input.read_bytes(len)?.to_vec())
}

impl DataType for DataTypeString {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn clone_type(&self) -> DataTypePtr {
        Arc::new(Self)
    }

    fn serialize_binary_bulk(
        &self,
        column: &dyn Column,
        out: &mut WriteBuffer,
        offset: usize,
        limit: usize,
    ) -> Result<(), TypeError> {
        let column = typed::<ColumnString, _>(self, column)?;
        let range = bulk_range(column.len(), offset, limit)?;
        let size: u64 = range
            .clone()
            .map(|row| {
                let len = column.get_bytes(row).len() as u64;
                ulebsize(len) + len
            })
            .sum();
        out.reserve(size as usize);
        for row in range {
            let bytes = column.get_bytes(row);
            write_varuint(out, bytes.len() as u64);
            out.write(bytes);
        }
        Ok(())
    }

    fn deserialize_binary_bulk(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        limit: usize,
        avg_value_size_hint: f64,
    ) -> Result<(), TypeError> {
        let limit = read_limit(limit);
        with_rollback(column, |column| {
            let column = typed_mut::<ColumnString, _>(self, column)?;
            // every value takes at least one byte of input
            let rows = limit.min(input.remaining());
            let bytes = if avg_value_size_hint > 0.0 {
                ((avg_value_size_hint * rows as f64) as usize).min(input.remaining())
            } else {
                0
            };
            column.reserve(rows, bytes);

            let mut read = 0;
            while read < limit && !input.eof() {
                let len = read_length(input, MAX_ALLOCATION)?;
                column.push_bytes(input.read_bytes(len)?);
                read += 1;
            }
            tracing::trace!(rows = read, avg_value_size_hint, "deserialized strings");
            Ok(())
        })
    }

    fn serialize_binary_field(&self, field: &Field, out: &mut WriteBuffer) -> Result<(), TypeError> {
        let bytes = field.as_bytes().ok_or_else(|| field_mismatch(self, field))?;
        write_varuint(out, bytes.len() as u64);
        out.write(bytes);
        Ok(())
    }

    fn deserialize_binary_field(&self, input: &mut ReadBuffer<'_>) -> Result<Field, TypeError> {
        Ok(Field::String(read_value(input)?))
    }

    fn serialize_binary(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        let bytes = self.bytes(column, row_num)?;
        write_varuint(out, bytes.len() as u64);
        out.write(bytes);
        Ok(())
    }

    fn deserialize_binary(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let value = read_value(input)?;
        self.push(column, &value)
    }

    fn serialize_text_escaped(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        text::write_escaped_bytes(self.bytes(column, row_num)?, out);
        Ok(())
    }

    fn deserialize_text_escaped(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let value = text::read_escaped_bytes(input, NAME)?;
        self.push(column, &value)
    }

    fn serialize_text_quoted(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        text::write_quoted_bytes(self.bytes(column, row_num)?, out);
        Ok(())
    }

    fn deserialize_text_quoted(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let value = text::read_quoted_bytes(input, NAME)?;
        self.push(column, &value)
    }

    fn serialize_text_csv(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        text::write_csv_bytes(self.bytes(column, row_num)?, out);
        Ok(())
    }

    fn deserialize_text_csv(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        delimiter: u8,
    ) -> Result<(), TypeError> {
        let value = text::read_csv_bytes(input, delimiter, NAME)?;
        self.push(column, &value)
    }

    fn serialize_text(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        out.write(self.bytes(column, row_num)?);
        Ok(())
    }

    fn serialize_text_json(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        _force_quoting_64bit_integers: bool,
    ) -> Result<(), TypeError> {
        text::write_json_bytes(self.bytes(column, row_num)?, out)
    }

    fn deserialize_text_json(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let value = text::read_json_bytes(input, NAME)?;
        self.push(column, &value)
    }

    fn serialize_text_xml(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        text::write_xml_bytes(self.bytes(column, row_num)?, out);
        Ok(())
    }

    fn create_column(&self) -> ColumnPtr {
        Box::new(ColumnString::new())
    }

    fn default_value(&self) -> Field {
        Field::String(Vec::new())
    }
}
