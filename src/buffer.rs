//! Output buffer used by every serializer in tlsnego.
//!
//! [`Buf`] wraps `Vec<u8>` with the handful of operations protocol encoders
//! need, most notably reserving a length prefix and filling it in once the
//! body has been written.

use std::fmt;
use std::ops::{Deref, DerefMut};

use zeroize::Zeroize;

use crate::Error;

/// Growable byte buffer.
///
/// This is a newtype around `Vec<u8>` that provides convenient access to byte
/// buffers. Dropping a `Buf` does not wipe it, call [`Buf::zeroize`] when it
/// held secret material.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Buf(Vec<u8>);

impl Buf {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the buffer, removing all data.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Extend the buffer with a slice of bytes.
    pub fn extend_from_slice(&mut self, other: &[u8]) {
        self.0.extend_from_slice(other);
    }

    /// Push a single byte onto the buffer.
    pub fn push(&mut self, byte: u8) {
        self.0.push(byte);
    }

    /// Append a big endian u16.
    pub fn push_u16(&mut self, value: u16) {
        self.0.extend_from_slice(&value.to_be_bytes());
    }

    /// Append a big endian u32.
    pub fn push_u32(&mut self, value: u32) {
        self.0.extend_from_slice(&value.to_be_bytes());
    }

    /// Truncate the buffer to the specified length.
    /// If `len` is greater than the buffer's current length, this has no effect.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Reserve a u16 length field and return its position.
    ///
    /// Pair with [`Buf::finish_u16_len`] once the body is written.
    pub fn start_u16_len(&mut self) -> usize {
        let pos = self.0.len();
        self.0.extend_from_slice(&[0, 0]);
        pos
    }

    /// Fill in a u16 length field reserved by [`Buf::start_u16_len`].
    ///
    /// Returns the body length.
    pub fn finish_u16_len(&mut self, pos: usize) -> Result<usize, Error> {
        let len = self.0.len() - pos - 2;
        let len16 = u16::try_from(len).map_err(|_| Error::InvalidState("body exceeds u16 length"))?;
        self.0[pos..pos + 2].copy_from_slice(&len16.to_be_bytes());
        Ok(len)
    }

    /// Append `data` with a u8 length prefix.
    pub fn push_u8_prefixed(&mut self, data: &[u8]) -> Result<(), Error> {
        let len = u8::try_from(data.len()).map_err(|_| Error::InvalidState("value exceeds u8 length"))?;
        self.0.push(len);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Append `data` with a u16 length prefix.
    pub fn push_u16_prefixed(&mut self, data: &[u8]) -> Result<(), Error> {
        let len =
            u16::try_from(data.len()).map_err(|_| Error::InvalidState("value exceeds u16 length"))?;
        self.push_u16(len);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Convert the buffer into the underlying `Vec<u8>`.
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }
}

impl Zeroize for Buf {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Deref for Buf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Buf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl AsRef<[u8]> for Buf {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Buf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buf").field("len", &self.0.len()).finish()
    }
}
