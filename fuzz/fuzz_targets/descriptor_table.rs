#![no_main]

use libfuzzer_sys::fuzz_target;
use pinbuf_core::{BlockFlags, BufferHandle, DescriptorTable, MemoryManager};

fuzz_target!(|data: &[u8]| {
    // Each 6-byte record: op, start (u16), len (u16), flags
    let table = DescriptorTable::new(512);
    for rec in data.chunks_exact(6) {
        let start = BufferHandle::from_addr(u16::from_le_bytes([rec[1], rec[2]]) as usize);
        let len = u16::from_le_bytes([rec[3], rec[4]]) as usize;
        let flags = BlockFlags::from_bits_truncate(rec[5] as u32);
        match rec[0] % 4 {
            0 => {
                if let Ok(desc) = table.register(start, len, flags) {
                    assert_eq!(desc.flags.contains(BlockFlags::LARGE), len >= 512 || flags.contains(BlockFlags::LARGE));
                }
            }
            1 => {
                let _ = table.unregister(start);
            }
            2 => {
                let _ = table.set_flags(start, flags);
            }
            _ => {
                let _ = table.clear_flags(start, flags);
            }
        }
        // Any resolved block must contain the queried address
        if let Some(desc) = table.descriptor(start) {
            assert!(desc.contains(start.addr()));
            assert_eq!(table.is_pinned(start).ok(), Some(desc.is_pinned()));
        }
    }
});
