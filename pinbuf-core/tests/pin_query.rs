use pinbuf_core::{
    BlockFlags, BufferHandle, ByteBufferOps, CallbackManager, CoreConfig, DescriptorTable, Error, MemoryManager,
};
use std::sync::Arc;
use std::thread;

#[test]
fn pinned_and_large_report_true_small_movable_false() {
    let cfg = CoreConfig::builder().large_object_threshold(256).build().unwrap();
    let table = DescriptorTable::from_config(&cfg);

    let pinned = vec![0u8; 32];
    let large = vec![0u8; 512];
    let movable = vec![0u8; 32];
    table.register_slice(&pinned, BlockFlags::PINNED).unwrap();
    let large_desc = table.register_slice(&large, BlockFlags::empty()).unwrap();
    table.register_slice(&movable, BlockFlags::MARKED).unwrap();
    assert!(large_desc.flags.contains(BlockFlags::LARGE));

    let ops = ByteBufferOps::new(table);
    assert!(ops.is_pinned(pinned.as_slice()).unwrap());
    assert!(ops.is_pinned(large.as_slice()).unwrap());
    assert!(!ops.is_pinned(movable.as_slice()).unwrap());
}

#[test]
fn unknown_handle_is_an_error() {
    let table = DescriptorTable::default();
    let stray = vec![0u8; 8];
    let err = table.is_pinned(BufferHandle::from(stray.as_slice())).unwrap_err();
    assert!(matches!(err, Error::UnknownHandle(addr) if addr == stray.as_ptr() as usize));
}

#[test]
fn pin_state_follows_host_updates() {
    let table = DescriptorTable::new(4096);
    let buf = vec![0u8; 64];
    let h = BufferHandle::from(buf.as_slice());
    table.register_slice(&buf, BlockFlags::empty()).unwrap();
    assert!(!table.is_pinned(h).unwrap());

    table.set_flags(h, BlockFlags::PINNED).unwrap();
    assert!(table.is_pinned(h).unwrap());

    table.clear_flags(h, BlockFlags::PINNED).unwrap();
    assert!(!table.is_pinned(h).unwrap());

    assert!(table.unregister(h).is_some());
    assert!(table.unregister(h).is_none());
    assert!(matches!(table.is_pinned(h), Err(Error::UnknownHandle(_))));
    assert!(matches!(table.set_flags(h, BlockFlags::PINNED), Err(Error::UnknownHandle(_))));
}

#[test]
fn concurrent_readers_see_registered_blocks() {
    let table = Arc::new(DescriptorTable::new(4096));
    let buffers: Vec<Vec<u8>> = (0..8).map(|i| vec![i as u8; 128]).collect();
    for (i, b) in buffers.iter().enumerate() {
        let flags = if i % 2 == 0 { BlockFlags::PINNED } else { BlockFlags::empty() };
        table.register_slice(b, flags).unwrap();
    }
    let handles: Vec<(BufferHandle, bool)> = buffers
        .iter()
        .enumerate()
        .map(|(i, b)| (BufferHandle::from(&b[64..]), i % 2 == 0))
        .collect();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let ops = ByteBufferOps::new(Arc::clone(&table));
            let handles = handles.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    for (h, expected) in &handles {
                        assert_eq!(ops.is_pinned(*h).unwrap(), *expected);
                    }
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
}

#[test]
fn callback_backend_defers_to_host() {
    let host_pinned = vec![0u8; 16];
    let pinned_addr = host_pinned.as_ptr() as usize;
    let mgr = CallbackManager::new(move |h: BufferHandle| (h.addr() == pinned_addr).then_some(true));
    let ops = ByteBufferOps::new(mgr);
    assert!(ops.is_pinned(host_pinned.as_slice()).unwrap());
    assert!(ops.is_pinned(BufferHandle::from_addr(0x40)).is_err());
}
