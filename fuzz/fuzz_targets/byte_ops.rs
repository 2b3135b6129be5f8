#![no_main]

use libfuzzer_sys::fuzz_target;
use pinbuf_core::{compare, compare_unchecked, find_byte, find_byte_unchecked, NOT_FOUND};

fuzz_target!(|data: &[u8]| {
    // Header: offset a, offset b, length, target byte
    if data.len() < 4 {
        return;
    }
    let (head, body) = data.split_at(4);
    let mid = body.len() / 2;
    let (a, b) = body.split_at(mid);
    let (oa, ob, n, target) = (head[0] as usize, head[1] as usize, head[2] as usize, head[3]);

    // Checked paths must never panic, whatever the window
    let cmp = compare(a, oa, b, ob, n);
    let found = find_byte(a, oa, target, n);

    // In-bounds windows must agree with the unchecked fast paths
    if let Ok(c) = cmp {
        let raw = unsafe { compare_unchecked(a.as_ptr(), oa, b.as_ptr(), ob, n) };
        assert_eq!(c, raw);
        assert_eq!(c, a[oa..oa + n].cmp(&b[ob..ob + n]) as i32);
    }
    if let Ok(f) = found {
        let raw = unsafe { find_byte_unchecked(a.as_ptr(), oa, target, n) };
        assert_eq!(f.map_or(NOT_FOUND, |i| i as isize), raw);
        if let Some(i) = f {
            assert_eq!(a[oa + i], target);
        }
    }
});
