//! Byte buffer helpers for a managed host runtime: offset-aware comparison,
//! offset-aware byte search, and a pin query against the host's memory
//! manager.

pub mod config;
pub mod error;
pub mod memory;
pub mod ops;
#[allow(unsafe_code)]
pub mod raw;

pub use config::CoreConfig;
pub use error::{Error, Operand, Result};
pub use memory::{BlockDescriptor, BlockFlags, BufferHandle, CallbackManager, DescriptorTable, MemoryManager};
pub use ops::{compare, find_byte, ByteBufferOps};
pub use raw::{compare_unchecked, find_byte_unchecked, NOT_FOUND};
