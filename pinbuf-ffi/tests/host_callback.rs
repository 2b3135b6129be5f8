//! Pin queries routed to a host callback. Kept in its own test binary since
//! the callback is process-global.

use pinbuf_ffi::{pinbuf_init, pinbuf_is_pinned, pinbuf_register_block, pinbuf_set_pin_query};
use std::os::raw::c_int;
use std::sync::atomic::{AtomicUsize, Ordering};

static HOST_PINNED: AtomicUsize = AtomicUsize::new(0);

extern "C" fn host_query(p: *const u8) -> c_int {
    let addr = p as usize;
    if addr == 0 {
        -1
    } else if addr == HOST_PINNED.load(Ordering::SeqCst) {
        1
    } else {
        0
    }
}

/// Answers like a collector inspecting its block descriptor: the raw
/// `PINNED | LARGE` bits, non-zero for non-moving buffers.
extern "C" fn host_flag_mask(p: *const u8) -> c_int {
    let addr = p as usize;
    if addr == 0 {
        -1
    } else if addr == HOST_PINNED.load(Ordering::SeqCst) {
        0b10
    } else {
        0
    }
}

#[test]
fn callback_overrides_block_table_until_cleared() {
    assert!(pinbuf_init() >= 0);

    let pinned = vec![0u8; 16];
    let other = vec![0u8; 16];
    HOST_PINNED.store(pinned.as_ptr() as usize, Ordering::SeqCst);

    // Table knows `other` as pinned; the host says otherwise.
    assert_eq!(pinbuf_register_block(other.as_ptr(), other.len(), 1), 0);
    assert_eq!(pinbuf_is_pinned(other.as_ptr()), 1);

    assert_eq!(pinbuf_set_pin_query(Some(host_query)), 0);
    assert_eq!(pinbuf_is_pinned(pinned.as_ptr()), 1);
    assert_eq!(pinbuf_is_pinned(other.as_ptr()), 0);
    assert_eq!(pinbuf_is_pinned(std::ptr::null()), -1);

    assert_eq!(pinbuf_set_pin_query(None), 0);
    assert_eq!(pinbuf_is_pinned(other.as_ptr()), 1);
    assert_eq!(pinbuf_is_pinned(pinned.as_ptr()), -1);

    // Any positive answer counts as pinned, as with a raw flag mask.
    assert_eq!(pinbuf_set_pin_query(Some(host_flag_mask)), 0);
    assert_eq!(pinbuf_is_pinned(pinned.as_ptr()), 1);
    assert_eq!(pinbuf_is_pinned(other.as_ptr()), 0);
    assert_eq!(pinbuf_is_pinned(std::ptr::null()), -1);
    assert_eq!(pinbuf_set_pin_query(None), 0);
}
