//! Unchecked raw-pointer fast paths.
//!
//! These mirror the zero-overhead contract of the host runtime's primitives:
//! no bounds checks, no null checks beyond the `len == 0` short circuit.
//! Out-of-range windows are undefined behavior. Prefer [`crate::ops`] unless
//! the caller has already validated the windows.

use std::cmp::Ordering;
use std::slice;

/// Sentinel returned by the integer surfaces when the target byte is absent.
pub const NOT_FOUND: isize = -1;

/// Collapse an ordering to the `-1 / 0 / 1` integer convention.
#[inline]
pub fn ordering_to_int(ord: Ordering) -> i32 {
	match ord {
		Ordering::Less => -1,
		Ordering::Equal => 0,
		Ordering::Greater => 1,
	}
}

/// Map an optional index onto the [`NOT_FOUND`] sentinel convention.
#[inline]
pub fn to_sentinel(idx: Option<usize>) -> isize {
	// Indices come from slices, so they always fit in isize.
	idx.map_or(NOT_FOUND, |i| i as isize)
}

/// Compare `len` bytes at `a + a_offset` with `len` bytes at `b + b_offset`.
///
/// Returns `-1`, `0` or `1` following unsigned lexicographic order.
///
/// # Safety
///
/// Unless `len == 0`, both `a.add(a_offset)` and `b.add(b_offset)` must be
/// valid for reads of `len` bytes, and that memory must not be mutated for the
/// duration of the call.
#[inline]
pub unsafe fn compare_unchecked(a: *const u8, a_offset: usize, b: *const u8, b_offset: usize, len: usize) -> i32 {
	if len == 0 {
		return 0;
	}
	// SAFETY: the caller guarantees both windows are readable for `len` bytes.
	let (lhs, rhs) = unsafe {
		(slice::from_raw_parts(a.add(a_offset), len), slice::from_raw_parts(b.add(b_offset), len))
	};
	ordering_to_int(lhs.cmp(rhs))
}

/// Find the first `target` within `len` bytes at `a + a_offset`.
///
/// Returns the index relative to `a_offset`, or [`NOT_FOUND`].
///
/// # Safety
///
/// Unless `len == 0`, `a.add(a_offset)` must be valid for reads of `len`
/// bytes, and that memory must not be mutated for the duration of the call.
#[inline]
pub unsafe fn find_byte_unchecked(a: *const u8, a_offset: usize, target: u8, len: usize) -> isize {
	if len == 0 {
		return NOT_FOUND;
	}
	// SAFETY: the caller guarantees the window is readable for `len` bytes.
	let hay = unsafe { slice::from_raw_parts(a.add(a_offset), len) };
	to_sentinel(memchr::memchr(target, hay))
}
