use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::bits::BitReader;
use crate::error::{Error, Result};
use crate::types::Rect;

/// Compression scheme named by the first byte of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// `FWS` — body stored as-is.
    Uncompressed,
    /// `CWS` — body deflated with zlib.
    ZlibCompressed,
    /// `ZWS` — body compressed with LZMA. Recognised but not supported.
    LzmaCompressed,
}

impl Signature {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            b'F' => Ok(Self::Uncompressed),
            b'C' => Ok(Self::ZlibCompressed),
            b'Z' => Ok(Self::LzmaCompressed),
            other => Err(Error::UnknownSignature { found: other }),
        }
    }
}

/// The fixed 8-byte file header.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub signature: Signature,
    pub version: u8,
    /// Declared total file length; advisory for uncompressed files.
    pub file_length: u32,
}

/// Header plus the fully decompressed tag body and its parsed prelude.
#[derive(Debug)]
pub struct Movie {
    pub header: Header,
    /// Stage bounds in twips.
    pub stage: Rect,
    /// Frame rate, converted from 8.8 fixed point.
    pub frame_rate: f64,
    pub frame_count: u16,
    /// Decompressed body: prelude followed by the tag stream.
    pub body: Vec<u8>,
    /// Offset of the first tag within `body`.
    pub first_tag: usize,
}

/// Parse the header, decompress the body if needed, and read the prelude
/// (stage rectangle, frame rate, frame count).
pub fn decode(raw: &[u8]) -> Result<Movie> {
    if raw.len() < 8 {
        return Err(Error::TruncatedHeader { len: raw.len() });
    }
    let signature = Signature::from_byte(raw[0])?;
    let version = raw[3];
    let file_length = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);

    let body = match signature {
        Signature::Uncompressed => raw[8..].to_vec(),
        Signature::ZlibCompressed => {
            let mut out = Vec::new();
            ZlibDecoder::new(&raw[8..])
                .read_to_end(&mut out)
                .map_err(|source| Error::Decompress { source })?;
            out
        }
        Signature::LzmaCompressed => return Err(Error::UnsupportedLzma),
    };

    let mut br = BitReader::new(&body);
    let stage = Rect::read(&mut br);
    let frame_rate = f64::from(br.read_u16()) / 256.0;
    let frame_count = br.read_u16();
    let first_tag = br.byte_pos();

    Ok(Movie {
        header: Header {
            signature,
            version,
            file_length,
        },
        stage,
        frame_rate,
        frame_count,
        body,
        first_tag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Minimal movie body: empty stage rect, 24.0 fps, no frames.
    fn minimal_body() -> Vec<u8> {
        let mut body = vec![0u8]; // rect with nbits = 0
        body.extend_from_slice(&(24u16 * 256).to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes()); // End tag
        body
    }

    fn with_header(magic: u8, body: &[u8]) -> Vec<u8> {
        let mut raw = vec![magic, b'W', b'S', 10];
        raw.extend_from_slice(&((body.len() + 8) as u32).to_le_bytes());
        raw.extend_from_slice(body);
        raw
    }

    #[test]
    fn uncompressed_movie() {
        let raw = with_header(b'F', &minimal_body());
        let movie = decode(&raw).unwrap();
        assert_eq!(movie.header.version, 10);
        assert_eq!(movie.frame_rate, 24.0);
        assert_eq!(movie.frame_count, 0);
        assert_eq!(movie.stage, Rect::default());
        assert_eq!(movie.first_tag, 5);
    }

    #[test]
    fn zlib_compressed_movie() {
        let body = minimal_body();
        let mut enc =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(&body).unwrap();
        let compressed = enc.finish().unwrap();

        let mut raw = vec![b'C', b'W', b'S', 10];
        raw.extend_from_slice(&((body.len() + 8) as u32).to_le_bytes());
        raw.extend_from_slice(&compressed);

        let movie = decode(&raw).unwrap();
        assert_eq!(movie.frame_rate, 24.0);
        assert_eq!(movie.body, body);
    }

    #[test]
    fn garbage_compressed_body_is_fatal() {
        let raw = with_header(b'C', &[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(decode(&raw), Err(Error::Decompress { .. })));
    }

    #[test]
    fn lzma_is_rejected() {
        let raw = with_header(b'Z', &minimal_body());
        assert!(matches!(decode(&raw), Err(Error::UnsupportedLzma)));
    }

    #[test]
    fn unknown_magic_is_rejected() {
        let raw = with_header(b'X', &minimal_body());
        assert!(matches!(
            decode(&raw),
            Err(Error::UnknownSignature { found: b'X' })
        ));
    }

    #[test]
    fn short_file_is_rejected() {
        assert!(matches!(
            decode(&[b'F', b'W', b'S']),
            Err(Error::TruncatedHeader { len: 3 })
        ));
    }
}
