use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Which side of a two-buffer operation a bounds failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
	/// First (or only) buffer.
	A,
	/// Second buffer of `compare`.
	B,
}

impl std::fmt::Display for Operand {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Operand::A => f.write_str("a"),
			Operand::B => f.write_str("b"),
		}
	}
}

#[derive(Debug, Error)]
pub enum Error {
	#[error("out of bounds: window {offset}+{len} exceeds buffer {operand} of length {buffer_len}")]
	OutOfBounds { operand: Operand, offset: usize, len: usize, buffer_len: usize },
	#[error("unknown buffer handle: {0:#x}")]
	UnknownHandle(usize),
	#[error("invalid block: {0}")]
	InvalidBlock(String),
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	#[error("config: {0}")]
	Config(String),
}

impl Error {
	pub fn config(msg: impl Into<String>) -> Self { Self::Config(msg.into()) }
	pub fn invalid_block(msg: impl Into<String>) -> Self { Self::InvalidBlock(msg.into()) }
}
