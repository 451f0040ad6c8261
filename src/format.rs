//! Selecting a text dialect at runtime.

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::column::Column;
use crate::data_type::DataType;
use crate::error::TypeError;

/// Options which affect how single values are written or read as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSettings {
    /// Separates unquoted CSV values
    pub csv_delimiter: u8,
    /// Write `UInt64`/`Int64` as JSON strings so that readers limited to doubles don't lose
    /// precision
    pub json_quote_64bit_integers: bool,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            csv_delimiter: b',',
            json_quote_64bit_integers: true,
        }
    }
}

impl FormatSettings {
    pub fn with_csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    pub fn set_csv_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.csv_delimiter = delimiter;
        self
    }

    pub fn with_json_quote_64bit_integers(mut self, quote: bool) -> Self {
        self.json_quote_64bit_integers = quote;
        self
    }

    pub fn set_json_quote_64bit_integers(&mut self, quote: bool) -> &mut Self {
        self.json_quote_64bit_integers = quote;
        self
    }
}

/// The text dialects every [`DataType`] can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextFormat {
    /// Backslash escapes, no quotes
    Escaped,
    /// SQL literals
    Quoted,
    Csv,
    /// Unescaped, for display. Output only.
    Text,
    Json,
    /// Output only.
    Xml,
}

impl TextFormat {
    pub fn serialize(
        self,
        data_type: &dyn DataType,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        settings: &FormatSettings,
    ) -> Result<(), TypeError> {
        match self {
            Self::Escaped => data_type.serialize_text_escaped(column, row_num, out),
            Self::Quoted => data_type.serialize_text_quoted(column, row_num, out),
            Self::Csv => data_type.serialize_text_csv(column, row_num, out),
            Self::Text => data_type.serialize_text(column, row_num, out),
            Self::Json => data_type.serialize_text_json(
                column,
                row_num,
                out,
                settings.json_quote_64bit_integers,
            ),
            Self::Xml => data_type.serialize_text_xml(column, row_num, out),
        }
    }

    /// # Errors
    /// `NotImplemented` for the output only dialects
    pub fn deserialize(
        self,
        data_type: &dyn DataType,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        settings: &FormatSettings,
    ) -> Result<(), TypeError> {
        match self {
            Self::Escaped => data_type.deserialize_text_escaped(column, input),
            Self::Quoted => data_type.deserialize_text_quoted(column, input),
            Self::Csv => data_type.deserialize_text_csv(column, input, settings.csv_delimiter),
            Self::Json => data_type.deserialize_text_json(column, input),
            Self::Text => Err(TypeError::not_implemented(
                "deserialize_text",
                data_type.name(),
            )),
            Self::Xml => Err(TypeError::not_implemented(
                "deserialize_text_xml",
                data_type.name(),
            )),
        }
    }
}
