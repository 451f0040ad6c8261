use std::sync::Arc;

use super::{
    bulk_range, check_row, field_mismatch, read_limit, typed, typed_mut, DataType, DataTypePtr,
};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::column::{Column, ColumnFixedString, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;
use crate::text;

/// Strings of exactly `n` bytes. Shorter values are padded with zero bytes; longer ones are
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataTypeFixedString {
    n: usize,
}

impl DataTypeFixedString {
    /// # Errors
    /// If `n` is zero
    pub fn new(n: usize) -> Result<Self, TypeError> {
        if n == 0 {
            return Err(TypeError::EmptyFixedString);
        }
        Ok(Self { n })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    fn bytes<'a>(&self, column: &'a dyn Column, row_num: usize) -> Result<&'a [u8], TypeError> {
        let column = typed::<ColumnFixedString, _>(self, column)?;
        check_row(column, row_num)?;
        Ok(column.get_bytes(row_num))
    }

    fn push(&self, column: &mut dyn Column, bytes: &[u8]) -> Result<(), TypeError> {
        let column = typed_mut::<ColumnFixedString, _>(self, column)?;
        if column.n() != self.n {
            return Err(TypeError::illegal_column(column.family_name(), self.name()));
        }
        column
            .push_bytes(bytes)
            .map_err(|_| TypeError::cannot_parse(self.name(), "value is too long"))
    }
}

impl DataType for DataTypeFixedString {
    fn name(&self) -> String {
        format!("FixedString({})", self.n)
    }

    fn clone_type(&self) -> DataTypePtr {
        Arc::new(*self)
    }

    fn serialize_binary_bulk(
        &self,
        column: &dyn Column,
        out: &mut WriteBuffer,
        offset: usize,
        limit: usize,
    ) -> Result<(), TypeError> {
        let column = typed::<ColumnFixedString, _>(self, column)?;
        let range = bulk_range(column.len(), offset, limit)?;
        out.write(&column.chars()[range.start * self.n..range.end * self.n]);
        Ok(())
    }

    fn deserialize_binary_bulk(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        limit: usize,
        _avg_value_size_hint: f64,
    ) -> Result<(), TypeError> {
        let column = typed_mut::<ColumnFixedString, _>(self, column)?;
        if column.n() != self.n {
            return Err(TypeError::illegal_column(column.family_name(), self.name()));
        }
        let limit = read_limit(limit);
        let mut chars = Vec::with_capacity(limit.min(input.remaining() / self.n) * self.n);
        let mut read = 0;
        while read < limit && !input.eof() {
            chars.extend_from_slice(input.read_bytes(self.n)?);
            read += 1;
        }
        tracing::trace!(rows = read, n = self.n, "deserialized fixed strings");
        column.extend_from_chars(&chars);
        Ok(())
    }

    fn serialize_binary_field(&self, field: &Field, out: &mut WriteBuffer) -> Result<(), TypeError> {
        let bytes = field.as_bytes().ok_or_else(|| field_mismatch(self, field))?;
        if bytes.len() > self.n {
            return Err(TypeError::cannot_parse(self.name(), "value is too long"));
        }
        out.write(bytes);
        out.write(&vec![0; self.n - bytes.len()]);
        Ok(())
    }

    fn deserialize_binary_field(&self, input: &mut ReadBuffer<'_>) -> Result<Field, TypeError> {
        Ok(Field::String(input.read_bytes(self.n)?.to_vec()))
    }

    fn serialize_binary(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        out.write(self.bytes(column, row_num)?);
        Ok(())
    }

    fn deserialize_binary(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let value = input.read_bytes(self.n)?.to_vec();
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
        let value = text::read_escaped_bytes(input, &self.name())?;
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
        let value = text::read_quoted_bytes(input, &self.name())?;
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
        let value = text::read_csv_bytes(input, delimiter, &self.name())?;
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
        let value = text::read_json_bytes(input, &self.name())?;
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
        Box::new(ColumnFixedString::new(self.n))
    }

    fn default_value(&self) -> Field {
        Field::String(vec![0; self.n])
    }

    fn size_of_field(&self) -> Result<usize, TypeError> {
        Ok(self.n)
    }
}
