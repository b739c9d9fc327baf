//! SWF asset extraction pipeline.
//!
//! [`walker`] drives the tag stream and owns all per-file state; [`assets`]
//! persists individual payloads; [`svg`] turns decoded shapes into SVG
//! documents; [`decompile`] lifts ABC bytecode back to ActionScript-like
//! source.

pub mod assets;
pub mod decompile;
pub mod svg;
pub mod walker;

pub use walker::Extractor;
