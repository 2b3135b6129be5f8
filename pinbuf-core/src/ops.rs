#![forbid(unsafe_code)]

//! Bounds-checked byte buffer operations.
//!
//! Every window `[offset, offset + len)` is validated against its buffer with
//! overflow-checked arithmetic before any byte is read. The unchecked
//! counterparts live in [`crate::raw`].
//!
//! ```
//! use pinbuf_core::ops::{compare, find_byte};
//!
//! assert_eq!(compare(b"hello", 0, b"hello", 0, 5).unwrap(), 0);
//! assert!(compare(b"abc", 0, b"abd", 0, 3).unwrap() < 0);
//! assert_eq!(find_byte(b"xxayy", 0, b'a', 5).unwrap(), Some(2));
//! assert_eq!(find_byte(b"xxxxx", 0, b'z', 5).unwrap(), None);
//! ```

use crate::error::{Error, Operand, Result};
use crate::memory::{BufferHandle, MemoryManager};
use crate::raw::ordering_to_int;
use tracing::debug;

/// Borrow `buf[offset..offset + len]`, or fail with [`Error::OutOfBounds`].
pub fn window(buf: &[u8], offset: usize, len: usize, operand: Operand) -> Result<&[u8]> {
	match offset.checked_add(len) {
		Some(end) if end <= buf.len() => Ok(&buf[offset..end]),
		_ => {
			debug!(%operand, offset, len, buffer_len = buf.len(), "rejected out-of-bounds window");
			Err(Error::OutOfBounds { operand, offset, len, buffer_len: buf.len() })
		}
	}
}

/// Lexicographically compare two `len`-byte windows.
///
/// Returns `-1`, `0` or `1`. Bytes compare as unsigned values.
pub fn compare(a: &[u8], a_offset: usize, b: &[u8], b_offset: usize, len: usize) -> Result<i32> {
	let lhs = window(a, a_offset, len, Operand::A)?;
	let rhs = window(b, b_offset, len, Operand::B)?;
	Ok(ordering_to_int(lhs.cmp(rhs)))
}

/// Index of the first `target` in `a[a_offset..a_offset + len]`, relative to
/// `a_offset`.
pub fn find_byte(a: &[u8], a_offset: usize, target: u8, len: usize) -> Result<Option<usize>> {
	let hay = window(a, a_offset, len, Operand::A)?;
	Ok(memchr::memchr(target, hay))
}

/// The three buffer operations bound to one memory manager.
#[derive(Debug, Clone, Default)]
pub struct ByteBufferOps<M> {
	manager: M,
}

impl<M: MemoryManager> ByteBufferOps<M> {
	pub fn new(manager: M) -> Self { Self { manager } }

	pub fn manager(&self) -> &M { &self.manager }

	pub fn compare(&self, a: &[u8], a_offset: usize, b: &[u8], b_offset: usize, len: usize) -> Result<i32> {
		compare(a, a_offset, b, b_offset, len)
	}

	pub fn find_byte(&self, a: &[u8], a_offset: usize, target: u8, len: usize) -> Result<Option<usize>> {
		find_byte(a, a_offset, target, len)
	}

	/// Whether the buffer behind `handle` is pinned or large.
	pub fn is_pinned(&self, handle: impl Into<BufferHandle>) -> Result<bool> {
		self.manager.is_pinned(handle.into())
	}
}
