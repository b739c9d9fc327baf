//! Reader for the ABC (AVM2) bytecode container.
//!
//! - **`reader`**: byte cursor with the format's primitive encodings
//!   (u30 variable-length integers, signed 24-bit, length-prefixed strings)
//! - **`pool`**: constant pool tables and multiname resolution
//! - **`abc`**: method/class/script/body tables and trait records
//! - **`opcode`**: the opcode set the decompiler understands
//!
//! Counts read from the stream are bounded before they drive any allocation;
//! a corrupt or hostile file fails with [`Error::OversizedCount`] instead of
//! exhausting memory.

pub mod abc;
pub mod error;
pub mod opcode;
pub mod pool;
pub mod reader;

pub use abc::{strip_do_abc_header, Abc};
pub use error::{Error, Result};
pub use opcode::Opcode;
pub use pool::ConstantPool;
pub use reader::AbcReader;
