use std::sync::Arc;

use crate::data_type::{
    DataTypeArray, DataTypeDate, DataTypeDateTime, DataTypeFixedString, DataTypeFloat32,
    DataTypeFloat64, DataTypeInt16, DataTypeInt32, DataTypeInt64, DataTypeInt8, DataTypeNull,
    DataTypeNullable, DataTypePtr, DataTypeString, DataTypeUInt16, DataTypeUInt32,
    DataTypeUInt64, DataTypeUInt8,
};
use crate::error::TypeError;

/// Builds data types from the names [`crate::DataType::name`] produces.
///
/// ```
/// use columnar_types::{DataType, DataTypeFactory};
///
/// let ty = DataTypeFactory::get("Array( Nullable(String) )").unwrap();
/// assert_eq!(ty.name(), "Array(Nullable(String))");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeFactory;

impl DataTypeFactory {
    pub fn get(name: &str) -> Result<DataTypePtr, TypeError> {
        let mut parser = Parser { input: name, pos: 0 };
        let data_type = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.pos != name.len() {
            return Err(TypeError::UnknownType(name.to_string()));
        }
        Ok(data_type)
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), TypeError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.unknown())
        }
    }

    fn word(&mut self) -> &'a str {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn unknown(&self) -> TypeError {
        TypeError::UnknownType(self.input.to_string())
    }

    fn parse_type(&mut self) -> Result<DataTypePtr, TypeError> {
        let family = self.word();
        let data_type: DataTypePtr = match family {
            "UInt8" => Arc::new(DataTypeUInt8::new()),
            "UInt16" => Arc::new(DataTypeUInt16::new()),
            "UInt32" => Arc::new(DataTypeUInt32::new()),
            "UInt64" => Arc::new(DataTypeUInt64::new()),
            "Int8" => Arc::new(DataTypeInt8::new()),
            "Int16" => Arc::new(DataTypeInt16::new()),
            "Int32" => Arc::new(DataTypeInt32::new()),
            "Int64" => Arc::new(DataTypeInt64::new()),
            "Float32" => Arc::new(DataTypeFloat32::new()),
            "Float64" => Arc::new(DataTypeFloat64::new()),
            "Date" => Arc::new(DataTypeDate::new()),
            "DateTime" => Arc::new(DataTypeDateTime::new()),
            "String" => Arc::new(DataTypeString::new()),
            "Null" => Arc::new(DataTypeNull::new()),
            "FixedString" => {
                self.expect('(')?;
                let n = self
                    .word()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| self.unknown())?;
                self.expect(')')?;
                return Ok(Arc::new(DataTypeFixedString::new(n)?));
            }
            "Nullable" => {
                self.expect('(')?;
                let nested = self.parse_type()?;
                self.expect(')')?;
                return Ok(Arc::new(DataTypeNullable::new(nested)));
            }
            "Array" => {
                self.expect('(')?;
                let nested = self.parse_type()?;
                self.expect(')')?;
                return Ok(Arc::new(DataTypeArray::new(nested)));
            }
            _ => return Err(self.unknown()),
        };
        Ok(data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::DataType;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_round_trip() {
        for name in [
            "UInt8",
            "UInt16",
            "UInt32",
            "UInt64",
            "Int8",
            "Int16",
            "Int32",
            "Int64",
            "Float32",
            "Float64",
            "Date",
            "DateTime",
            "String",
            "Null",
            "FixedString(8)",
            "Nullable(Float64)",
            "Array(Array(Nullable(String)))",
        ] {
            assert_eq!(DataTypeFactory::get(name).unwrap().name(), name);
        }
    }

    #[test]
    fn tolerates_whitespace() {
        let ty = DataTypeFactory::get("  Array ( Nullable( FixedString( 3 ) ) ) ").unwrap();
        assert_eq!(ty.name(), "Array(Nullable(FixedString(3)))");
    }

    #[test]
    fn rejects_unknown_and_malformed_names() {
        for name in [
            "",
            "Decimal",
            "uint8",
            "UInt8(1)",
            "Array",
            "Array(",
            "Array(UInt8",
            "Array(UInt8))",
            "Nullable()",
            "FixedString(x)",
            "FixedString(0)",
            "String String",
        ] {
            let err = DataTypeFactory::get(name).unwrap_err();
            assert_eq!(err.code(), ErrorCode::UnknownType, "{:?}", name);
        }
    }
}
