use std::sync::Arc;

use super::{bulk_range, read_limit, typed, typed_mut, DataType, DataTypePtr};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::column::{Column, ColumnNull, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;

const NAME: &str = "Null";

/// The type of a bare `NULL` literal. Every row is NULL; the binary form is one zero byte per
/// row.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeNull;

impl DataTypeNull {
    pub fn new() -> Self {
        Self
    }

    fn push(&self, column: &mut dyn Column) -> Result<(), TypeError> {
        typed_mut::<ColumnNull, _>(self, column)?.extend(1);
        Ok(())
    }

    fn check_row_byte(&self, byte: u8) -> Result<(), TypeError> {
        if byte == 0 {
            Ok(())
        } else {
            Err(TypeError::cannot_parse(NAME, format!("invalid row byte {}", byte)))
        }
    }

    fn expect_null(&self, input: &mut ReadBuffer<'_>, forms: &[&[u8]]) -> Result<(), TypeError> {
        if forms.iter().any(|form| input.check_prefix(form)) {
            Ok(())
        } else {
            Err(TypeError::cannot_parse(NAME, "expected NULL"))
        }
    }

    fn write(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        text: &str,
    ) -> Result<(), TypeError> {
        let column = typed::<ColumnNull, _>(self, column)?;
        super::check_row(column, row_num)?;
        out.write_str(text);
        Ok(())
    }
}

impl DataType for DataTypeNull {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn is_null(&self) -> bool {
        true
    }

    fn is_nullable(&self) -> bool {
        true
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
        let column = typed::<ColumnNull, _>(self, column)?;
        let range = bulk_range(column.len(), offset, limit)?;
        out.write(&vec![0; range.len()]);
        Ok(())
    }

    fn deserialize_binary_bulk(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        limit: usize,
        _avg_value_size_hint: f64,
    ) -> Result<(), TypeError> {
        let column = typed_mut::<ColumnNull, _>(self, column)?;
        let rows = read_limit(limit).min(input.remaining());
        for byte in &input.peek_slice()[..rows] {
            self.check_row_byte(*byte)?;
        }
        input.advance(rows);
        column.extend(rows);
        Ok(())
    }

    fn serialize_binary_field(&self, field: &Field, out: &mut WriteBuffer) -> Result<(), TypeError> {
        if !field.is_null() {
            return Err(super::field_mismatch(self, field));
        }
        out.write_byte(0);
        Ok(())
    }

    fn deserialize_binary_field(&self, input: &mut ReadBuffer<'_>) -> Result<Field, TypeError> {
        self.check_row_byte(input.read_byte()?)?;
        Ok(Field::Null)
    }

    fn serialize_binary(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.write(column, row_num, out, "\0")
    }

    fn deserialize_binary(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        self.check_row_byte(input.read_byte()?)?;
        self.push(column)
    }

    fn serialize_text_escaped(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.write(column, row_num, out, "\\N")
    }

    fn deserialize_text_escaped(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        self.expect_null(input, &[b"\\N"])?;
        self.push(column)
    }

    fn serialize_text_quoted(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.write(column, row_num, out, "NULL")
    }

    fn deserialize_text_quoted(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        self.expect_null(input, &[b"NULL"])?;
        self.push(column)
    }

    fn serialize_text_csv(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.write(column, row_num, out, "\\N")
    }

    fn deserialize_text_csv(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        _delimiter: u8,
    ) -> Result<(), TypeError> {
        self.expect_null(input, &[b"\\N", b"NULL"])?;
        self.push(column)
    }

    fn serialize_text(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.write(column, row_num, out, "NULL")
    }

    fn serialize_text_json(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        _force_quoting_64bit_integers: bool,
    ) -> Result<(), TypeError> {
        self.write(column, row_num, out, "null")
    }

    fn deserialize_text_json(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        self.expect_null(input, &[b"null"])?;
        self.push(column)
    }

    fn serialize_text_xml(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.write(column, row_num, out, "\\N")
    }

    fn create_column(&self) -> ColumnPtr {
        Box::new(ColumnNull::default())
    }

    fn default_value(&self) -> Field {
        Field::Null
    }
}
