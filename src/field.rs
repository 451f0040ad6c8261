use std::fmt;

/// A single value detached from any column.
///
/// Every data type reads and writes exactly one variant of `Field`: unsigned integers (and
/// `Date`/`DateTime`) use [`Field::UInt64`], signed integers [`Field::Int64`], floats
/// [`Field::Float64`], strings [`Field::String`] and arrays [`Field::Array`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field {
    #[default]
    Null,
    UInt64(u64),
    Int64(i64),
    Float64(f64),
    String(Vec<u8>),
    Array(Vec<Field>),
}

impl Field {
    pub fn type_name(&self) -> &'static str {
        match self {
            Field::Null => "Null",
            Field::UInt64(_) => "UInt64",
            Field::Int64(_) => "Int64",
            Field::Float64(_) => "Float64",
            Field::String(_) => "String",
            Field::Array(_) => "Array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Field::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Field::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Field::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Field::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Field]> {
        match self {
            Field::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Null => write!(f, "NULL"),
            Field::UInt64(v) => write!(f, "{}", v),
            Field::Int64(v) => write!(f, "{}", v),
            Field::Float64(v) => write!(f, "{}", v),
            Field::String(v) => write!(f, "'{}'", String::from_utf8_lossy(v)),
            Field::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index != 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<u64> for Field {
    fn from(v: u64) -> Self {
        Field::UInt64(v)
    }
}

impl From<i64> for Field {
    fn from(v: i64) -> Self {
        Field::Int64(v)
    }
}

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Field::Float64(v)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::String(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Field {
    fn from(v: Vec<u8>) -> Self {
        Field::String(v)
    }
}

impl From<Vec<Field>> for Field {
    fn from(v: Vec<Field>) -> Self {
        Field::Array(v)
    }
}

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Field::Null)
    }
}
