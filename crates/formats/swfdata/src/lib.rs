//! Reader for the SWF container format.
//!
//! Three layers, mirroring how the extraction pipeline consumes a file:
//! - **`header`**: signature, version, body decompression
//! - **`tags`**: tag framing over the decompressed body
//! - **`shape`** / **`types`**: bit-packed record decoding inside tag payloads
//!
//! The crate only decodes; it performs no I/O beyond what the caller hands it
//! and never writes output files.

pub mod bits;
pub mod error;
pub mod header;
pub mod shape;
pub mod tags;
pub mod types;

pub use error::{Error, Result};
pub use header::{Header, Movie, Signature};
pub use shape::ShapeVersion;
pub use tags::{Tag, TagCode, TagReader};
