#![forbid(unsafe_code)]

//! Memory-manager capability used by the pin query.
//!
//! The host runtime owns buffer placement. Whether a buffer may move is a
//! property of the block it lives in, so a manager answers questions about
//! *blocks*: any address inside a registered block resolves to that block's
//! flags. A block is non-moving when it is explicitly pinned or when it is a
//! large object living outside the copying region.
//!
//! Two backends are provided:
//!
//! - [`DescriptorTable`]: an in-process table of block descriptors that the
//!   host populates as it allocates.
//! - [`CallbackManager`]: forwards the query to a host-supplied function.

use crate::config::CoreConfig;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

bitflags::bitflags! {
	/// Per-block metadata bits maintained by the host memory manager.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct BlockFlags: u32 {
		/// Explicitly pinned by the host.
		const PINNED = 1 << 0;
		/// Large object, allocated outside the copying region.
		const LARGE = 1 << 1;
		/// Reached during the last mark phase.
		const MARKED = 1 << 2;
		/// Block is in to-space of an ongoing evacuation.
		const EVACUATED = 1 << 3;
		/// Part of a compact region.
		const COMPACT = 1 << 4;
	}
}

impl BlockFlags {
	/// Flags that make a block immovable.
	pub const NON_MOVING: Self = Self::PINNED.union(Self::LARGE);

	#[inline]
	pub fn is_non_moving(self) -> bool { self.intersects(Self::NON_MOVING) }
}

/// Opaque address of a managed byte buffer.
///
/// A handle identifies memory, it does not borrow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(usize);

impl BufferHandle {
	pub const fn from_addr(addr: usize) -> Self { Self(addr) }
	pub fn from_ptr(ptr: *const u8) -> Self { Self(ptr as usize) }
	pub fn addr(self) -> usize { self.0 }
	pub fn as_ptr(self) -> *const u8 { self.0 as *const u8 }
	pub fn is_null(self) -> bool { self.0 == 0 }
}

impl From<*const u8> for BufferHandle {
	fn from(p: *const u8) -> Self { Self::from_ptr(p) }
}

impl From<&[u8]> for BufferHandle {
	fn from(s: &[u8]) -> Self { Self::from_ptr(s.as_ptr()) }
}

impl std::fmt::Display for BufferHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{:#x}", self.0) }
}

/// Metadata for one contiguous block of host memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
	pub start: usize,
	pub len: usize,
	pub flags: BlockFlags,
}

impl BlockDescriptor {
	/// One past the last address of the block, saturating at the top of the address space.
	pub fn end(&self) -> usize { self.start.saturating_add(self.len) }
	pub fn contains(&self, addr: usize) -> bool { addr >= self.start && addr - self.start < self.len }
	pub fn is_pinned(&self) -> bool { self.flags.is_non_moving() }
}

/// Capability a backend supplies so buffers can be asked whether they move.
pub trait MemoryManager: Send + Sync {
	/// Flags of the block containing `handle`, or `None` if the handle is not
	/// a buffer this manager knows.
	fn block_flags(&self, handle: BufferHandle) -> Option<BlockFlags>;

	/// True when the buffer's block is pinned or large.
	fn is_pinned(&self, handle: BufferHandle) -> Result<bool> {
		self.block_flags(handle)
			.map(BlockFlags::is_non_moving)
			.ok_or(Error::UnknownHandle(handle.addr()))
	}
}

impl<T: MemoryManager + ?Sized> MemoryManager for Arc<T> {
	fn block_flags(&self, handle: BufferHandle) -> Option<BlockFlags> { (**self).block_flags(handle) }
}

impl<T: MemoryManager + ?Sized> MemoryManager for &T {
	fn block_flags(&self, handle: BufferHandle) -> Option<BlockFlags> { (**self).block_flags(handle) }
}

/// Ordered table of block descriptors keyed by start address.
#[derive(Debug)]
pub struct DescriptorTable {
	blocks: RwLock<BTreeMap<usize, BlockDescriptor>>,
	large_object_threshold: usize,
}

impl Default for DescriptorTable {
	fn default() -> Self { Self::from_config(&CoreConfig::default()) }
}

impl DescriptorTable {
	pub fn new(large_object_threshold: usize) -> Self {
		Self { blocks: RwLock::new(BTreeMap::new()), large_object_threshold }
	}

	pub fn from_config(cfg: &CoreConfig) -> Self { Self::new(cfg.large_object_threshold) }

	pub fn large_object_threshold(&self) -> usize { self.large_object_threshold }

	/// Record a block of `len` bytes at `start`.
	///
	/// Blocks at or above the large-object threshold are flagged `LARGE`.
	pub fn register(&self, start: BufferHandle, len: usize, flags: BlockFlags) -> Result<BlockDescriptor> {
		if start.is_null() {
			return Err(Error::invalid_block("null start address"));
		}
		if len == 0 {
			return Err(Error::invalid_block(format!("zero-length block at {start}")));
		}
		let start = start.addr();
		let end = start
			.checked_add(len)
			.ok_or_else(|| Error::invalid_block(format!("block {start:#x}+{len} overflows the address space")))?;

		let mut flags = flags;
		if len >= self.large_object_threshold {
			flags |= BlockFlags::LARGE;
		}
		let desc = BlockDescriptor { start, len, flags };

		let mut blocks = self.blocks.write();
		let prev = blocks.range(..=start).next_back().map(|(_, d)| *d);
		let next = blocks.range(start..).next().map(|(_, d)| *d);
		for other in prev.into_iter().chain(next) {
			if other.start < end && start < other.end() {
				return Err(Error::invalid_block(format!(
					"block {start:#x}+{len} overlaps {:#x}+{}",
					other.start, other.len
				)));
			}
		}
		blocks.insert(start, desc);
		debug!(start = %BufferHandle::from_addr(start), len, flags = ?desc.flags, "registered block");
		Ok(desc)
	}

	/// Record the memory backing `buf` as one block.
	pub fn register_slice(&self, buf: &[u8], flags: BlockFlags) -> Result<BlockDescriptor> {
		self.register(BufferHandle::from(buf), buf.len(), flags)
	}

	/// Forget the block starting exactly at `start`.
	pub fn unregister(&self, start: BufferHandle) -> Option<BlockDescriptor> {
		let removed = self.blocks.write().remove(&start.addr());
		if removed.is_some() {
			debug!(start = %start, "unregistered block");
		}
		removed
	}

	/// Descriptor of the block containing `handle`.
	pub fn descriptor(&self, handle: BufferHandle) -> Option<BlockDescriptor> {
		let addr = handle.addr();
		self.blocks
			.read()
			.range(..=addr)
			.next_back()
			.map(|(_, d)| *d)
			.filter(|d| d.contains(addr))
	}

	/// Add `flags` to the block containing `handle`; returns the new flags.
	pub fn set_flags(&self, handle: BufferHandle, flags: BlockFlags) -> Result<BlockFlags> {
		self.update(handle, |d| d.flags |= flags)
	}

	/// Remove `flags` from the block containing `handle`; returns the new flags.
	///
	/// `LARGE` follows from the block length and survives this call.
	pub fn clear_flags(&self, handle: BufferHandle, flags: BlockFlags) -> Result<BlockFlags> {
		let threshold = self.large_object_threshold;
		self.update(handle, |d| {
			d.flags.remove(flags);
			if d.len >= threshold {
				d.flags |= BlockFlags::LARGE;
			}
		})
	}

	fn update(&self, handle: BufferHandle, f: impl FnOnce(&mut BlockDescriptor)) -> Result<BlockFlags> {
		let addr = handle.addr();
		let mut blocks = self.blocks.write();
		let desc = blocks
			.range_mut(..=addr)
			.next_back()
			.map(|(_, d)| d)
			.filter(|d| d.contains(addr))
			.ok_or(Error::UnknownHandle(addr))?;
		f(desc);
		debug!(start = %BufferHandle::from_addr(desc.start), flags = ?desc.flags, "updated block flags");
		Ok(desc.flags)
	}

	pub fn len(&self) -> usize { self.blocks.read().len() }
	pub fn is_empty(&self) -> bool { self.blocks.read().is_empty() }
}

impl MemoryManager for DescriptorTable {
	fn block_flags(&self, handle: BufferHandle) -> Option<BlockFlags> {
		self.descriptor(handle).map(|d| d.flags)
	}
}

/// Manager that asks the host directly.
///
/// The query returns `Some(true)` for non-moving buffers, `Some(false)` for
/// movable ones and `None` for handles the host does not recognise.
pub struct CallbackManager<F> {
	query: F,
}

impl<F> CallbackManager<F>
where
	F: Fn(BufferHandle) -> Option<bool> + Send + Sync,
{
	pub fn new(query: F) -> Self { Self { query } }
}

impl<F> MemoryManager for CallbackManager<F>
where
	F: Fn(BufferHandle) -> Option<bool> + Send + Sync,
{
	fn block_flags(&self, handle: BufferHandle) -> Option<BlockFlags> {
		(self.query)(handle).map(|pinned| if pinned { BlockFlags::PINNED } else { BlockFlags::empty() })
	}
}

impl<F> std::fmt::Debug for CallbackManager<F> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str("CallbackManager") }
}
