//! Forward-only byte cursors handed to the codecs.
//!
//! Neither buffer can seek. A [`ReadBuffer`] can peek at the next byte, which is how text
//! deserializers detect a terminating delimiter without consuming it.

use std::borrow::Cow;

use crate::error::TypeError;

#[derive(Clone, Debug)]
pub struct ReadBuffer<'a> {
    offset: usize,
    data: Cow<'a, [u8]>,
}

impl<'a> ReadBuffer<'a> {
    pub fn new(data: Cow<'a, [u8]>) -> Self {
        ReadBuffer { offset: 0, data }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn eof(&self) -> bool {
        self.offset >= self.data.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    /// The unread bytes, without consuming them.
    pub fn peek_slice(&self) -> &[u8] {
        &self.data[self.offset..]
    }

    pub fn read_byte(&mut self) -> Result<u8, TypeError> {
        match self.peek() {
            Some(b) => {
                self.offset += 1;
                Ok(b)
            }
            None => Err(TypeError::UnexpectedEof {
                needed: 1,
                available: 0,
            }),
        }
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8], TypeError> {
        if self.remaining() < len {
            Err(TypeError::UnexpectedEof {
                needed: len,
                available: self.remaining(),
            })
        } else {
            let head = &self.data[self.offset..self.offset + len];
            self.offset += len;
            Ok(head)
        }
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TypeError> {
        let mut out = [0; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn advance(&mut self, len: usize) {
        self.offset = (self.offset + len).min(self.data.len());
    }

    /// Consume `byte` if it is next, returning whether it was.
    pub fn check_byte(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.offset += 1;
            true
        } else {
            false
        }
    }

    /// Consume `prefix` if the unread bytes start with it.
    pub fn check_prefix(&mut self, prefix: &[u8]) -> bool {
        if self.peek_slice().starts_with(prefix) {
            self.offset += prefix.len();
            true
        } else {
            false
        }
    }

    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.offset += 1;
        }
    }
}

impl<'a> From<&'a [u8]> for ReadBuffer<'a> {
    fn from(d: &'a [u8]) -> Self {
        Cow::Borrowed(d).into()
    }
}

impl<'a> From<&'a str> for ReadBuffer<'a> {
    fn from(s: &'a str) -> Self {
        s.as_bytes().into()
    }
}

impl From<Vec<u8>> for ReadBuffer<'static> {
    fn from(d: Vec<u8>) -> Self {
        Cow::<'static, [u8]>::Owned(d).into()
    }
}

impl<'a> From<Cow<'a, [u8]>> for ReadBuffer<'a> {
    fn from(d: Cow<'a, [u8]>) -> Self {
        ReadBuffer::new(d)
    }
}

/// An append-only sink. Writes never fail; the buffer grows as needed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBuffer {
    written: usize,
    output: Vec<u8>,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        WriteBuffer {
            written: 0,
            output: Vec::with_capacity(capacity),
        }
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
        self.written += bytes.len();
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.output.push(byte);
        self.written += 1;
    }

    pub fn write_str(&mut self, s: &str) {
        self.write(s.as_bytes())
    }

    pub fn reserve(&mut self, additional: usize) {
        self.output.reserve(additional)
    }

    /// Total number of bytes written.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.output
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.output
    }

    /// A reader over everything written so far.
    pub fn reader(&self) -> ReadBuffer<'_> {
        self.as_slice().into()
    }
}

impl std::io::Write for WriteBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        WriteBuffer::write(self, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
