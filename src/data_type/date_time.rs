use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};

use super::date::{parse_wrapped, write_wrapped};
use super::number::{deserialize_vector_bulk, serialize_vector_bulk};
use super::{check_row, field_mismatch, typed, typed_mut, DataType, DataTypePtr};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::column::{Column, ColumnPtr, ColumnVector, Number};
use crate::error::TypeError;
use crate::field::Field;
use crate::text::read_number_token;

const NAME: &str = "DateTime";
const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TEXT_LEN: usize = "YYYY-MM-DD hh:mm:ss".len();

/// A point in time with second precision, stored as seconds since the unix epoch.
///
/// Text forms are `YYYY-MM-DD hh:mm:ss` in UTC. On input a plain number of seconds is accepted
/// as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeDateTime;

impl DataTypeDateTime {
    pub fn new() -> Self {
        Self
    }

    fn value(&self, column: &dyn Column, row_num: usize) -> Result<u32, TypeError> {
        let column = typed::<ColumnVector<u32>, _>(self, column)?;
        check_row(column, row_num)?;
        Ok(column.data()[row_num])
    }

    fn push(&self, column: &mut dyn Column, seconds: u32) -> Result<(), TypeError> {
        typed_mut::<ColumnVector<u32>, _>(self, column)?.push(seconds);
        Ok(())
    }

    fn format(&self, column: &dyn Column, row_num: usize) -> Result<String, TypeError> {
        let seconds = self.value(column, row_num)?;
        let time = DateTime::from_timestamp(seconds as i64, 0).ok_or_else(|| {
            TypeError::cannot_parse(NAME, format!("{} seconds is out of range", seconds))
        })?;
        Ok(time.naive_utc().format(FORMAT).to_string())
    }
}

fn parse(input: &mut ReadBuffer<'_>) -> Result<u32, TypeError> {
    if input.peek_slice().get(4) != Some(&b'-') {
        let token = read_number_token(input);
        return token.parse::<u32>().map_err(|_| {
            TypeError::cannot_parse(NAME, format!("cannot parse '{}' as a date and time", token))
        });
    }
    let raw = input
        .read_bytes(TEXT_LEN)
        .map_err(|_| TypeError::cannot_parse(NAME, "truncated date and time"))?;
    let text = std::str::from_utf8(raw).map_err(|_| TypeError::cannot_parse(NAME, "invalid UTF-8"))?;
    let time = NaiveDateTime::parse_from_str(text, FORMAT)
        .map_err(|e| TypeError::cannot_parse(NAME, format!("'{}': {}", text, e)))?;
    u32::try_from(time.and_utc().timestamp())
        .map_err(|_| TypeError::cannot_parse(NAME, format!("'{}' is out of range", text)))
}

impl DataType for DataTypeDateTime {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn is_numeric(&self) -> bool {
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
        serialize_vector_bulk::<u32, _>(self, column, out, offset, limit)
    }

    fn deserialize_binary_bulk(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        limit: usize,
        _avg_value_size_hint: f64,
    ) -> Result<(), TypeError> {
        deserialize_vector_bulk::<u32, _>(self, column, input, limit)
    }

    fn serialize_binary_field(&self, field: &Field, out: &mut WriteBuffer) -> Result<(), TypeError> {
        u32::from_field(field)
            .ok_or_else(|| field_mismatch(self, field))?
            .write_le(out);
        Ok(())
    }

    fn deserialize_binary_field(&self, input: &mut ReadBuffer<'_>) -> Result<Field, TypeError> {
        Ok(u32::read_le(input)?.into_field())
    }

    fn serialize_binary(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.value(column, row_num)?.write_le(out);
        Ok(())
    }

    fn deserialize_binary(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let seconds = u32::read_le(input)?;
        self.push(column, seconds)
    }

    fn serialize_text_escaped(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_text(column, row_num, out)
    }

    fn deserialize_text_escaped(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let seconds = parse(input)?;
        self.push(column, seconds)
    }

    fn serialize_text_quoted(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        write_wrapped(out, &self.format(column, row_num)?, b'\'');
        Ok(())
    }

    fn deserialize_text_quoted(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let seconds = parse_wrapped(input, b'\'', NAME, parse)?;
        self.push(column, seconds)
    }

    fn serialize_text_csv(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        write_wrapped(out, &self.format(column, row_num)?, b'"');
        Ok(())
    }

    fn deserialize_text_csv(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        _delimiter: u8,
    ) -> Result<(), TypeError> {
        let seconds = parse_wrapped(input, b'"', NAME, parse)?;
        self.push(column, seconds)
    }

    fn serialize_text(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        out.write_str(&self.format(column, row_num)?);
        Ok(())
    }

    fn serialize_text_json(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        _force_quoting_64bit_integers: bool,
    ) -> Result<(), TypeError> {
        write_wrapped(out, &self.format(column, row_num)?, b'"');
        Ok(())
    }

    fn deserialize_text_json(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let seconds = parse_wrapped(input, b'"', NAME, parse)?;
        self.push(column, seconds)
    }

    fn create_column(&self) -> ColumnPtr {
        Box::new(ColumnVector::<u32>::new())
    }

    fn default_value(&self) -> Field {
        Field::UInt64(0)
    }

    fn size_of_field(&self) -> Result<usize, TypeError> {
        Ok(u32::WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_is_utc() {
        let ty = DataTypeDateTime::new();
        let col: ColumnPtr = Box::new(ColumnVector::<u32>::from(vec![0, 1_609_459_261]));
        let mut out = WriteBuffer::new();
        ty.serialize_text(col.as_ref(), 1, &mut out).unwrap();
        out.write_byte(b'\t');
        ty.serialize_text_quoted(col.as_ref(), 0, &mut out).unwrap();
        assert_eq!(out.as_slice(), b"2021-01-01 00:01:01\t'1970-01-01 00:00:00'");
    }

    #[test]
    fn round_trips_through_every_dialect() {
        let ty = DataTypeDateTime::new();
        let src: ColumnPtr = Box::new(ColumnVector::<u32>::from(vec![1_234_567_890]));
        let mut dst = ty.create_column();

        let mut out = WriteBuffer::new();
        ty.serialize_text_escaped(src.as_ref(), 0, &mut out).unwrap();
        ty.deserialize_text_escaped(dst.as_mut(), &mut out.reader())
            .unwrap();

        let mut out = WriteBuffer::new();
        ty.serialize_text_csv(src.as_ref(), 0, &mut out).unwrap();
        ty.deserialize_text_csv(dst.as_mut(), &mut out.reader(), b',')
            .unwrap();

        let mut out = WriteBuffer::new();
        ty.serialize_text_json(src.as_ref(), 0, &mut out, false).unwrap();
        ty.deserialize_text_json(dst.as_mut(), &mut out.reader())
            .unwrap();

        assert_eq!(dst.fields(), vec![Field::UInt64(1_234_567_890); 3]);
    }

    #[test]
    fn unix_seconds_are_accepted() {
        let ty = DataTypeDateTime::new();
        let mut dst = ty.create_column();
        ty.deserialize_text_quoted(dst.as_mut(), &mut "'86400'".into())
            .unwrap();
        assert_eq!(dst.get(0), Field::UInt64(86_400));
    }

    #[test]
    fn malformed_times_are_rejected() {
        let ty = DataTypeDateTime::new();
        let mut dst = ty.create_column();
        for bad in ["2021-01-01 25:00:00", "2021-01-01 00:00", "1969-12-31 23:59:59"] {
            let err = ty
                .deserialize_text_escaped(dst.as_mut(), &mut bad.into())
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::CannotParseText, "{}", bad);
        }
        assert!(dst.is_empty());
    }
}
