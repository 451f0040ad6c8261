use std::sync::Arc;

use super::{
    bulk_range, check_row, check_streams, deserialize_one, field_mismatch, read_limit, typed,
    typed_mut, with_rollback, DataType, DataTypePtr, MAX_ALLOCATION,
};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::column::{Column, ColumnArray, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;
use crate::leb128::{read_length, write_varuint};
use crate::text::{expect_byte, read_csv_bytes, write_csv_bytes};

/// Arrays of any other type.
///
/// A single value is written as its uLEB128 size followed by its elements. Bulk writes across
/// multiple streams put the sizes of a level into a `.size{level}` stream and the flattened
/// elements into the nested type's streams one level down. With position independent encoding
/// each row's size is a uLEB128; otherwise each row's end offset within the source column is a
/// little endian `u64`, and the reader measures those offsets from the end of the column it is
/// appending to.
#[derive(Debug, Clone)]
pub struct DataTypeArray {
    nested: DataTypePtr,
}

impl DataTypeArray {
    pub fn new(nested: DataTypePtr) -> Self {
        Self { nested }
    }

    pub fn nested(&self) -> &DataTypePtr {
        &self.nested
    }

    /// Append one row whose elements `f` pushes into the data column, returning how many it
    /// pushed. Elements pushed by a failing `f` are removed again.
    fn append_row<F>(&self, column: &mut ColumnArray, f: F) -> Result<(), TypeError>
    where
        F: FnOnce(&mut dyn Column) -> Result<usize, TypeError>,
    {
        let before = column.data().len();
        match f(column.data_mut()) {
            Ok(size) => {
                column.push_sizes(&[size]);
                Ok(())
            }
            Err(e) => {
                let appended = column.data().len() - before;
                column.data_mut().pop(appended);
                Err(e)
            }
        }
    }

    fn serialize_list<F>(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        mut f: F,
    ) -> Result<(), TypeError>
    where
        F: FnMut(&dyn Column, usize, &mut WriteBuffer) -> Result<(), TypeError>,
    {
        let column = typed::<ColumnArray, _>(self, column)?;
        check_row(column, row_num)?;
        out.write_byte(b'[');
        let start = column.offset_at(row_num);
        for index in start..column.offsets()[row_num] {
            if index > start {
                out.write_byte(b',');
            }
            f(column.data(), index, out)?;
        }
        out.write_byte(b']');
        Ok(())
    }

    fn deserialize_list<F>(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        mut f: F,
    ) -> Result<(), TypeError>
    where
        F: FnMut(&mut dyn Column, &mut ReadBuffer<'_>) -> Result<(), TypeError>,
    {
        let name = self.name();
        let column = typed_mut::<ColumnArray, _>(self, column)?;
        self.append_row(column, |data| {
            expect_byte(input, b'[', &name)?;
            input.skip_whitespace();
            if input.check_byte(b']') {
                return Ok(0);
            }
            let mut size = 0;
            loop {
                input.skip_whitespace();
                f(data, input)?;
                size += 1;
                input.skip_whitespace();
                if !input.check_byte(b',') {
                    expect_byte(input, b']', &name)?;
                    return Ok(size);
                }
            }
        })
    }

    fn read_sizes(
        &self,
        column: &ColumnArray,
        input: &mut ReadBuffer<'_>,
        position_independent_encoding: bool,
        limit: usize,
    ) -> Result<Vec<usize>, TypeError> {
        let mut sizes = Vec::new();
        let mut prev = column.offset_at(column.len()) as u64;
        while sizes.len() < limit && !input.eof() {
            let size = if position_independent_encoding {
                read_length(input, MAX_ALLOCATION)?
            } else {
                let end = u64::from_le_bytes(input.read_array()?);
                if end < prev {
                    return Err(TypeError::cannot_parse(
                        self.name(),
                        format!("array offset {} is before the previous offset {}", end, prev),
                    ));
                }
                let size = end - prev;
                if size > MAX_ALLOCATION {
                    return Err(TypeError::OverlargeAllocation {
                        attempted: size,
                        maximum: MAX_ALLOCATION,
                    });
                }
                prev = end;
                size as usize
            };
            sizes.push(size);
        }
        Ok(sizes)
    }
}

impl DataType for DataTypeArray {
    fn name(&self) -> String {
        format!("Array({})", self.nested.name())
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
        let typed_column = typed::<ColumnArray, _>(self, column)?;
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
        with_rollback(column, |column| {
            let mut read = 0;
            while read < limit && !input.eof() {
                self.deserialize_binary(column, input)?;
                read += 1;
            }
            tracing::trace!(rows = read, type_name = %self.name(), "deserialized arrays");
            Ok(())
        })
    }

    fn describe_multiple_streams(&self, out_descriptions: &mut Vec<String>, level: usize) {
        out_descriptions.push(format!(".size{}", level));
        self.nested
            .describe_multiple_streams(out_descriptions, level + 1);
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
        let column = typed::<ColumnArray, _>(self, column)?;
        let range = bulk_range(column.len(), offset, limit)?;
        let (sizes, nested_streams) = streams
            .split_first_mut()
            .ok_or_else(|| TypeError::NotEnoughStreams {
                type_name: self.name(),
                expected: 1,
                got: 0,
            })?;

        for row in range.clone() {
            if position_independent_encoding {
                write_varuint(sizes, column.size_at(row) as u64);
            } else {
                sizes.write(&(column.offsets()[row] as u64).to_le_bytes());
            }
        }

        let start = column.offset_at(range.start);
        let end = column.offset_at(range.end);
        if end > start {
            self.nested.serialize_binary_bulk_with_multiple_streams(
                column.data(),
                nested_streams,
                position_independent_encoding,
                start,
                end - start,
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
        let column = typed_mut::<ColumnArray, _>(self, column)?;
        let (sizes_stream, nested_streams) = streams
            .split_first_mut()
            .ok_or_else(|| TypeError::NotEnoughStreams {
                type_name: self.name(),
                expected: 1,
                got: 0,
            })?;

        let sizes = self.read_sizes(
            column,
            sizes_stream,
            position_independent_encoding,
            read_limit(limit),
        )?;
        let total = sizes.iter().sum::<usize>();
        if total as u64 > MAX_ALLOCATION {
            return Err(TypeError::OverlargeAllocation {
                attempted: total as u64,
                maximum: MAX_ALLOCATION,
            });
        }

        if total > 0 {
            let before = column.data().len();
            self.nested.deserialize_binary_bulk_with_multiple_streams(
                column.data_mut(),
                nested_streams,
                position_independent_encoding,
                total,
                avg_value_size_hint,
            )?;
            let got = column.data().len() - before;
            if got != total {
                tracing::debug!(expected = total, got, "element streams ended before the sizes");
                column.data_mut().pop(got);
                return Err(TypeError::ShortRead {
                    type_name: self.nested.name(),
                    expected: total,
                    got,
                });
            }
        }
        column.push_sizes(&sizes);
        tracing::trace!(rows = sizes.len(), elements = total, "deserialized arrays");
        Ok(())
    }

    fn serialize_binary_field(&self, field: &Field, out: &mut WriteBuffer) -> Result<(), TypeError> {
        let items = field.as_array().ok_or_else(|| field_mismatch(self, field))?;
        write_varuint(out, items.len() as u64);
        for item in items {
            self.nested.serialize_binary_field(item, out)?;
        }
        Ok(())
    }

    fn deserialize_binary_field(&self, input: &mut ReadBuffer<'_>) -> Result<Field, TypeError> {
        let size = read_length(input, MAX_ALLOCATION)?;
        let mut items = Vec::with_capacity(size.min(input.remaining()));
        for _ in 0..size {
            items.push(self.nested.deserialize_binary_field(input)?);
        }
        Ok(Field::Array(items))
    }

    fn serialize_binary(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        let column = typed::<ColumnArray, _>(self, column)?;
        check_row(column, row_num)?;
        write_varuint(out, column.size_at(row_num) as u64);
        for index in column.offset_at(row_num)..column.offsets()[row_num] {
            self.nested.serialize_binary(column.data(), index, out)?;
        }
        Ok(())
    }

    fn deserialize_binary(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let column = typed_mut::<ColumnArray, _>(self, column)?;
        let size = read_length(input, MAX_ALLOCATION)?;
        self.append_row(column, |data| {
            for _ in 0..size {
                self.nested.deserialize_binary(data, input)?;
            }
            Ok(size)
        })
    }

    fn serialize_text_escaped(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_list(column, row_num, out, |data, index, out| {
            self.nested.serialize_text_quoted(data, index, out)
        })
    }

    fn deserialize_text_escaped(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        self.deserialize_list(column, input, |data, input| {
            self.nested.deserialize_text_quoted(data, input)
        })
    }

    fn serialize_text_quoted(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_text_escaped(column, row_num, out)
    }

    fn deserialize_text_quoted(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        self.deserialize_text_escaped(column, input)
    }

    fn serialize_text_csv(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        let mut inner = WriteBuffer::new();
        self.serialize_text_escaped(column, row_num, &mut inner)?;
        write_csv_bytes(inner.as_slice(), out);
        Ok(())
    }

    fn deserialize_text_csv(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        delimiter: u8,
    ) -> Result<(), TypeError> {
        let name = self.name();
        let raw = read_csv_bytes(input, delimiter, &name)?;
        deserialize_one(self, column, |scratch| {
            let mut inner = ReadBuffer::from(raw.as_slice());
            self.deserialize_text_escaped(scratch, &mut inner)?;
            inner.skip_whitespace();
            if inner.eof() {
                Ok(())
            } else {
                Err(TypeError::cannot_parse(&name, "unexpected data after the array"))
            }
        })
    }

    fn serialize_text(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_text_escaped(column, row_num, out)
    }

    fn serialize_text_json(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        force_quoting_64bit_integers: bool,
    ) -> Result<(), TypeError> {
        self.serialize_list(column, row_num, out, |data, index, out| {
            self.nested
                .serialize_text_json(data, index, out, force_quoting_64bit_integers)
        })
    }

    fn deserialize_text_json(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        self.deserialize_list(column, input, |data, input| {
            self.nested.deserialize_text_json(data, input)
        })
    }

    fn serialize_text_xml(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        let column = typed::<ColumnArray, _>(self, column)?;
        check_row(column, row_num)?;
        out.write_str("<array>");
        for index in column.offset_at(row_num)..column.offsets()[row_num] {
            out.write_str("<elem>");
            self.nested.serialize_text_xml(column.data(), index, out)?;
            out.write_str("</elem>");
        }
        out.write_str("</array>");
        Ok(())
    }

    fn create_column(&self) -> ColumnPtr {
        Box::new(ColumnArray::new(self.nested.create_column()))
    }

    fn default_value(&self) -> Field {
        Field::Array(Vec::new())
    }
}
