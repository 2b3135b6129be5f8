//! C ABI for pinbuf
//!
//! Host runtimes link this crate (as `cdylib` or `staticlib`) and call the
//! `pinbuf_*` symbols directly:
//!
//! - `pinbuf_memcmp` / `pinbuf_memchr`: offset-aware comparison and byte
//!   search over caller-owned memory. These are the unchecked fast paths; the
//!   caller guarantees the windows are readable.
//! - `pinbuf_is_pinned`: asks whether a buffer is non-moving. Answered by a
//!   host-registered callback when one is set, otherwise by the block table
//!   the host fills through `pinbuf_register_block`.
//!
//! ## Safety
//! Only the two memory primitives dereference caller pointers. Every
//! block-table entry point treats pointers as plain addresses, so a stale or
//! foreign pointer yields an error code instead of undefined behavior.

#![allow(unsafe_code)]

use libc::{c_int, size_t, ssize_t};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pinbuf_core::{
    compare_unchecked, find_byte_unchecked, BlockFlags, BufferHandle, CallbackManager, CoreConfig,
    DescriptorTable, MemoryManager,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Status codes returned by the management entry points.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinbufStatus {
    Ok = 0,
    AlreadyInitialized = 1,
    Error = -1,
}

/// Host pin query: positive = pinned (any non-zero flag mask), 0 = movable,
/// negative = unknown buffer.
pub type PinQuery = extern "C" fn(p: *const u8) -> c_int;

static BLOCKS: OnceCell<DescriptorTable> = OnceCell::new();
static PIN_QUERY: RwLock<Option<PinQuery>> = RwLock::new(None);

fn init_logging(level: &str) {
    // RUST_LOG wins over the configured level; an embedding host's subscriber wins over both
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

fn blocks() -> Option<&'static DescriptorTable> {
    let table = BLOCKS.get();
    if table.is_none() {
        warn!("pinbuf used before pinbuf_init");
    }
    table
}

fn decode_host_answer(code: c_int) -> Option<bool> {
    match code {
        c if c > 0 => Some(true),
        0 => Some(false),
        _ => None,
    }
}

/// Initialise logging and the block table from `PINBUF_*` environment variables.
///
/// Returns 0 on success, 1 if already initialised, -1 on invalid configuration.
#[no_mangle]
pub extern "C" fn pinbuf_init() -> c_int {
    let cfg = match CoreConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_logging("info");
            error!("Invalid pinbuf configuration: {}", e);
            return PinbufStatus::Error as c_int;
        }
    };
    init_logging(&cfg.log_level);

    if BLOCKS.set(DescriptorTable::from_config(&cfg)).is_err() {
        warn!("pinbuf already initialized");
        return PinbufStatus::AlreadyInitialized as c_int;
    }
    info!(large_object_threshold = cfg.large_object_threshold, "pinbuf initialized");
    PinbufStatus::Ok as c_int
}

/// Compare `n` bytes at `a + aoff` with `n` bytes at `b + boff`.
///
/// Returns -1, 0 or 1.
///
/// # Safety
/// Unless `n == 0`, both windows must be readable for `n` bytes and not
/// mutated during the call.
#[no_mangle]
pub unsafe extern "C" fn pinbuf_memcmp(
    a: *const u8,
    aoff: size_t,
    b: *const u8,
    boff: size_t,
    n: size_t,
) -> c_int {
    debug_assert!(n == 0 || (!a.is_null() && !b.is_null()));
    unsafe { compare_unchecked(a, aoff, b, boff, n) }
}

/// Index of the first `target` in the `n` bytes at `a + aoff`, relative to
/// `aoff`, or -1 if absent.
///
/// # Safety
/// Unless `n == 0`, the window must be readable for `n` bytes and not mutated
/// during the call.
#[no_mangle]
pub unsafe extern "C" fn pinbuf_memchr(a: *const u8, aoff: size_t, target: u8, n: size_t) -> ssize_t {
    debug_assert!(n == 0 || !a.is_null());
    unsafe { find_byte_unchecked(a, aoff, target, n) }
}

/// Whether the buffer at `p` is pinned or large (1), movable (0), or unknown (-1).
#[no_mangle]
pub extern "C" fn pinbuf_is_pinned(p: *const u8) -> c_int {
    let handle = BufferHandle::from_ptr(p);
    let query = *PIN_QUERY.read();
    let answer = match query {
        Some(cb) => CallbackManager::new(move |h: BufferHandle| decode_host_answer(cb(h.as_ptr()))).is_pinned(handle),
        None => match blocks() {
            Some(table) => table.is_pinned(handle),
            None => return PinbufStatus::Error as c_int,
        },
    };
    match answer {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            debug!("pin query failed: {}", e);
            PinbufStatus::Error as c_int
        }
    }
}

/// Record a host block of `len` bytes at `p` with `flags` (bits of `BlockFlags`).
///
/// Returns 0 on success, -1 if the table is uninitialised or the block is
/// rejected (null, empty, overlapping, unknown flag bits).
#[no_mangle]
pub extern "C" fn pinbuf_register_block(p: *const u8, len: size_t, flags: u32) -> c_int {
    let Some(table) = blocks() else { return PinbufStatus::Error as c_int };
    let Some(flags) = BlockFlags::from_bits(flags) else {
        warn!("Rejected block {:p}: unknown flag bits {:#x}", p, flags);
        return PinbufStatus::Error as c_int;
    };
    match table.register(BufferHandle::from_ptr(p), len, flags) {
        Ok(_) => PinbufStatus::Ok as c_int,
        Err(e) => {
            warn!("Rejected block {:p}: {}", p, e);
            PinbufStatus::Error as c_int
        }
    }
}

/// Forget the block starting at `p`. Returns 0 if removed, -1 otherwise.
#[no_mangle]
pub extern "C" fn pinbuf_unregister_block(p: *const u8) -> c_int {
    match blocks().and_then(|t| t.unregister(BufferHandle::from_ptr(p))) {
        Some(_) => PinbufStatus::Ok as c_int,
        None => PinbufStatus::Error as c_int,
    }
}

/// Add `flags` to the block containing `p`. Returns 0, or -1 if unknown.
#[no_mangle]
pub extern "C" fn pinbuf_set_block_flags(p: *const u8, flags: u32) -> c_int {
    update_block_flags(p, flags, DescriptorTable::set_flags)
}

/// Remove `flags` from the block containing `p`. `LARGE` blocks stay large.
#[no_mangle]
pub extern "C" fn pinbuf_clear_block_flags(p: *const u8, flags: u32) -> c_int {
    update_block_flags(p, flags, DescriptorTable::clear_flags)
}

fn update_block_flags(
    p: *const u8,
    flags: u32,
    op: fn(&DescriptorTable, BufferHandle, BlockFlags) -> pinbuf_core::Result<BlockFlags>,
) -> c_int {
    let Some(table) = blocks() else { return PinbufStatus::Error as c_int };
    let Some(flags) = BlockFlags::from_bits(flags) else { return PinbufStatus::Error as c_int };
    match op(table, BufferHandle::from_ptr(p), flags) {
        Ok(_) => PinbufStatus::Ok as c_int,
        Err(e) => {
            debug!("flag update failed: {}", e);
            PinbufStatus::Error as c_int
        }
    }
}

/// Route `pinbuf_is_pinned` to a host callback. Passing NULL restores the
/// block table.
#[no_mangle]
pub extern "C" fn pinbuf_set_pin_query(cb: Option<PinQuery>) -> c_int {
    *PIN_QUERY.write() = cb;
    debug!(host_callback = cb.is_some(), "pin query backend changed");
    PinbufStatus::Ok as c_int
}
