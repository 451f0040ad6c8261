use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use super::number::{deserialize_vector_bulk, serialize_vector_bulk};
use super::{check_row, field_mismatch, typed, typed_mut, DataType, DataTypePtr};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::column::{Column, ColumnPtr, ColumnVector, Number};
use crate::error::TypeError;
use crate::field::Field;
use crate::text::{expect_byte, read_number_token};

/// `1970-01-01` counted in days from `0001-01-01`.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const NAME: &str = "Date";

/// A calendar day, stored as the number of days since `1970-01-01`.
///
/// Text forms use `YYYY-MM-DD`; on input a plain day number is accepted as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeDate;

impl DataTypeDate {
    pub fn new() -> Self {
        Self
    }

    fn value(&self, column: &dyn Column, row_num: usize) -> Result<u16, TypeError> {
        let column = typed::<ColumnVector<u16>, _>(self, column)?;
        check_row(column, row_num)?;
        Ok(column.data()[row_num])
    }

    fn push(&self, column: &mut dyn Column, days: u16) -> Result<(), TypeError> {
        typed_mut::<ColumnVector<u16>, _>(self, column)?.push(days);
        Ok(())
    }

    fn format(&self, column: &dyn Column, row_num: usize) -> Result<String, TypeError> {
        let days = self.value(column, row_num)?;
        let date = NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_DAYS_FROM_CE + days as i32)
            .ok_or_else(|| TypeError::cannot_parse(NAME, format!("day {} is out of range", days)))?;
        Ok(date.format("%Y-%m-%d").to_string())
    }
}

/// Parse `YYYY-MM-DD` or a day number.
fn parse(input: &mut ReadBuffer<'_>) -> Result<u16, TypeError> {
    if input.peek_slice().get(4) != Some(&b'-') {
        let token = read_number_token(input);
        return token.parse::<u16>().map_err(|_| {
            TypeError::cannot_parse(NAME, format!("cannot parse '{}' as a date", token))
        });
    }
    let raw = input
        .read_bytes(10)
        .map_err(|_| TypeError::cannot_parse(NAME, "truncated date"))?;
    let text = std::str::from_utf8(raw).map_err(|_| TypeError::cannot_parse(NAME, "invalid UTF-8"))?;
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| TypeError::cannot_parse(NAME, format!("'{}': {}", text, e)))?;
    let days = date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE;
    u16::try_from(days)
        .map_err(|_| TypeError::cannot_parse(NAME, format!("'{}' is out of range", text)))
}

/// Parse a value which may be wrapped in `quote`.
pub(super) fn parse_wrapped<T, F>(
    input: &mut ReadBuffer<'_>,
    quote: u8,
    type_name: &str,
    parse: F,
) -> Result<T, TypeError>
where
    F: FnOnce(&mut ReadBuffer<'_>) -> Result<T, TypeError>,
{
    if input.check_byte(quote) {
        let value = parse(input)?;
        expect_byte(input, quote, type_name)?;
        Ok(value)
    } else {
        parse(input)
    }
}

pub(super) fn write_wrapped(out: &mut WriteBuffer, text: &str, quote: u8) {
    out.write_byte(quote);
    out.write_str(text);
    out.write_byte(quote);
}

impl DataType for DataTypeDate {
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
        serialize_vector_bulk::<u16, _>(self, column, out, offset, limit)
    }

    fn deserialize_binary_bulk(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        limit: usize,
        _avg_value_size_hint: f64,
    ) -> Result<(), TypeError> {
        deserialize_vector_bulk::<u16, _>(self, column, input, limit)
    }

    fn serialize_binary_field(&self, field: &Field, out: &mut WriteBuffer) -> Result<(), TypeError> {
        u16::from_field(field)
            .ok_or_else(|| field_mismatch(self, field))?
            .write_le(out);
        Ok(())
    }

    fn deserialize_binary_field(&self, input: &mut ReadBuffer<'_>) -> Result<Field, TypeError> {
        Ok(u16::read_le(input)?.into_field())
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
        let days = u16::read_le(input)?;
        self.push(column, days)
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
        let days = parse(input)?;
        self.push(column, days)
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
        let days = parse_wrapped(input, b'\'', NAME, parse)?;
        self.push(column, days)
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
        let days = parse_wrapped(input, b'"', NAME, parse)?;
        self.push(column, days)
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
        let days = parse_wrapped(input, b'"', NAME, parse)?;
        self.push(column, days)
    }

    fn create_column(&self) -> ColumnPtr {
        Box::new(ColumnVector::<u16>::new())
    }

    fn default_value(&self) -> Field {
        Field::UInt64(0)
    }

    fn size_of_field(&self) -> Result<usize, TypeError> {
        Ok(u16::WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut WriteBuffer) -> Result<(), TypeError>,
    {
        let mut out = WriteBuffer::new();
        f(&mut out).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn days_since_epoch() {
        let ty = DataTypeDate::new();
        let col: ColumnPtr = Box::new(ColumnVector::<u16>::from(vec![0, 18_628]));
        assert_eq!(render(|o| ty.serialize_text(col.as_ref(), 0, o)), "1970-01-01");
        assert_eq!(render(|o| ty.serialize_text_escaped(col.as_ref(), 1, o)), "2021-01-01");
        assert_eq!(render(|o| ty.serialize_text_quoted(col.as_ref(), 1, o)), "'2021-01-01'");
        assert_eq!(render(|o| ty.serialize_text_json(col.as_ref(), 1, o, true)), "\"2021-01-01\"");
    }

    #[test]
    fn parses_dates_and_day_numbers() {
        let ty = DataTypeDate::new();
        let mut col = ty.create_column();
        ty.deserialize_text_escaped(col.as_mut(), &mut "2021-01-01\t".into())
            .unwrap();
        ty.deserialize_text_quoted(col.as_mut(), &mut "'1970-01-02'".into())
            .unwrap();
        ty.deserialize_text_csv(col.as_mut(), &mut "17,".into(), b',')
            .unwrap();
        ty.deserialize_text_json(col.as_mut(), &mut "\"1970-01-01\"".into())
            .unwrap();
        assert_eq!(
            col.fields(),
            vec![
                Field::UInt64(18_628),
                Field::UInt64(1),
                Field::UInt64(17),
                Field::UInt64(0)
            ]
        );
    }

    #[test]
    fn rejects_dates_outside_the_range() {
        let ty = DataTypeDate::new();
        let mut col = ty.create_column();
        for bad in ["1969-12-31", "2021-13-01", "2021-01", "70000"] {
            let err = ty
                .deserialize_text_escaped(col.as_mut(), &mut bad.into())
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::CannotParseText, "{}", bad);
        }
        assert!(col.is_empty());
    }

    #[test]
    fn classification() {
        let ty = DataTypeDate::new();
        assert!(ty.is_numeric());
        assert!(!ty.behaves_as_number());
        assert_eq!(ty.size_of_field().unwrap(), 2);
    }
}
