use pinbuf_core::{BlockFlags, ByteBufferOps, CoreConfig, DescriptorTable};

fn main() -> pinbuf_core::Result<()> {
    let cfg = CoreConfig::default();
    println!("log_level={} large_object_threshold={}", cfg.log_level, cfg.large_object_threshold);

    let table = DescriptorTable::from_config(&cfg);
    let key = b"user:42".to_vec();
    let record = b"....user:42....".to_vec();
    table.register_slice(&key, BlockFlags::PINNED)?;
    table.register_slice(&record, BlockFlags::empty())?;

    let ops = ByteBufferOps::new(table);
    println!("compare={}", ops.compare(&key, 0, &record, 4, key.len())?);
    println!("first ':' at {:?}", ops.find_byte(&record, 4, b':', 7)?);
    println!("key pinned={} record pinned={}", ops.is_pinned(key.as_slice())?, ops.is_pinned(record.as_slice())?);
    Ok(())
}
