use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::{Leb128Error, TypeError};

/// The number of bytes required to encode `val` as a uLEB128 integer
pub(crate) fn ulebsize(val: u64) -> u64 {
    if val <= 1 {
        return 1;
    }
    let numbits = (u64::BITS - val.leading_zeros()) as u64;
    let mut numblocks = numbits / 7;
    if numbits % 7 != 0 {
        numblocks += 1;
    }
    numblocks
}

pub(crate) fn write_varuint(out: &mut WriteBuffer, val: u64) {
    // This unwrap should be okay as WriteBuffer writes to an in memory buffer
    leb128::write::unsigned(out, val).unwrap();
}

pub(crate) fn read_varuint(input: &mut ReadBuffer<'_>) -> Result<u64, TypeError> {
    let mut res = 0;
    let mut shift = 0;

    loop {
        let byte = input.read_byte()?;
        res |= ((byte & 0x7F) as u64) << shift;
        shift += 7;

        if (byte & 0x80) == 0 {
            if shift > 64 && byte > 1 {
                return Err(Leb128Error::Leb128TooLarge.into());
            } else if shift > 7 && byte == 0 {
                return Err(Leb128Error::Leb128Overlong.into());
            }
            return Ok(res);
        } else if shift > 64 {
            return Err(Leb128Error::Leb128TooLarge.into());
        }
    }
}

/// Read a length prefix and check it against `maximum` before anything is allocated for it.
pub(crate) fn read_length(input: &mut ReadBuffer<'_>, maximum: u64) -> Result<usize, TypeError> {
    let len = read_varuint(input)?;
    if len > maximum {
        return Err(TypeError::OverlargeAllocation {
            attempted: len,
            maximum,
        });
    }
    usize::try_from(len).map_err(|_| TypeError::OverlargeAllocation {
        attempted: len,
        maximum: usize::MAX as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_ulebsize(val in 0..u64::MAX) {
            let mut out = Vec::new();
            leb128::write::unsigned(&mut out, val).unwrap();
            let expected = out.len() as u64;
            assert_eq!(expected, ulebsize(val))
        }

        #[test]
        fn varuint_reads_what_leb128_writes(val in 0..u64::MAX) {
            let mut out = WriteBuffer::new();
            write_varuint(&mut out, val);
            let mut input = out.reader();
            assert_eq!(read_varuint(&mut input).unwrap(), val);
            assert!(input.eof());
        }
    }

    #[test]
    fn read_varuint_errors() {
        let error_cases: Vec<(&'static str, &'static [u8], TypeError)> = vec![
            (
                "too many bytes",
                &[129, 129, 129, 129, 129, 129, 129, 129, 129, 129, 129, 129],
                Leb128Error::Leb128TooLarge.into(),
            ),
            (
                "too many bits",
                &[129, 129, 129, 129, 129, 129, 129, 129, 129, 2],
                Leb128Error::Leb128TooLarge.into(),
            ),
            (
                "overlong encoding",
                &[129, 0],
                Leb128Error::Leb128Overlong.into(),
            ),
            (
                "missing data",
                &[255],
                TypeError::UnexpectedEof {
                    needed: 1,
                    available: 0,
                },
            ),
        ];
        for (desc, bytes, expected) in error_cases {
            match read_varuint(&mut ReadBuffer::from(bytes)) {
                Ok(x) => panic!("read_varuint should fail with {}, got {}", desc, x),
                Err(error) => assert_eq!(error, expected, "{}", desc),
            }
        }
    }

    #[test]
    fn read_varuint_success() {
        let success_cases: Vec<(&'static [u8], u64)> = vec![
            (&[0], 0),
            (&[0x7f], 127),
            (&[0x80, 0x01], 128),
            (&[0xff, 0x7f], 16383),
            (
                &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x1],
                u64::MAX,
            ),
        ];
        for (bytes, expected) in success_cases {
            assert_eq!(read_varuint(&mut ReadBuffer::from(bytes)), Ok(expected));
        }
    }

    #[test]
    fn read_length_rejects_overlarge_prefix() {
        let mut out = WriteBuffer::new();
        write_varuint(&mut out, 1 << 40);
        assert_eq!(
            read_length(&mut out.reader(), 1 << 30),
            Err(TypeError::OverlargeAllocation {
                attempted: 1 << 40,
                maximum: 1 << 30
            })
        );
    }
}
