//! Scratch buffer for receiving datagrams.
//!
//! The receive loop reads every datagram into the same pre-allocated buffer, so there is no
//!  allocation per receive. The flip side is that the buffer's content is only valid until the
//!  next receive: everything that outlives a single loop iteration must go through
//!  [DatagramBuffer::copy_out], which produces an independently owned copy.

use std::fmt::{Debug, Formatter};
use bytes::Bytes;

/// A fixed-capacity buffer, allocated once
pub struct DatagramBuffer {
    buf: Vec<u8>,
    len: usize,
}
impl DatagramBuffer {
    pub fn new(capacity: usize) -> DatagramBuffer {
        DatagramBuffer {
            buf: vec![0; capacity],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The full capacity as a receive target. Call [DatagramBuffer::set_len] with the number of
    ///  bytes actually received afterwards.
    pub fn receive_target(&mut self) -> &mut [u8] {
        self.len = 0;
        &mut self.buf
    }

    pub fn set_len(&mut self, len: usize) {
        assert!(len <= self.capacity(), "received length {} exceeds buffer capacity {}", len, self.capacity());
        self.len = len;
    }

    /// Copies exactly the received bytes into a new buffer that the caller owns exclusively
    pub fn copy_out(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_ref())
    }
}

impl AsRef<[u8]> for DatagramBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Debug for DatagramBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DatagramBuffer{{len:{}, capacity:{}}}", self.len, self.capacity())
    }
}
