//! Calls made before `pinbuf_init`. Own test binary: nothing here may
//! initialise the process-global block table.

use pinbuf_ffi::{
    pinbuf_clear_block_flags, pinbuf_is_pinned, pinbuf_register_block, pinbuf_set_block_flags,
    pinbuf_unregister_block, PinbufStatus,
};
use std::os::raw::c_int;

#[test]
fn block_table_calls_fail_before_init() {
    let buf = vec![0u8; 32];
    let err = PinbufStatus::Error as c_int;
    assert_eq!(pinbuf_register_block(buf.as_ptr(), buf.len(), 1), err);
    assert_eq!(pinbuf_is_pinned(buf.as_ptr()), err);
    assert_eq!(pinbuf_set_block_flags(buf.as_ptr(), 1), err);
    assert_eq!(pinbuf_clear_block_flags(buf.as_ptr(), 1), err);
    assert_eq!(pinbuf_unregister_block(buf.as_ptr()), err);
}
