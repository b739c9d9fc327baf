//! Per-asset file writers.
//!
//! Every function here writes one asset (plus any sidecar) under the output
//! directory and returns the path of the primary file, so the walker can
//! register it in the character table.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::ZlibDecoder;
use swfdata::ShapeVersion;

/// JPEG start-of-image marker.
const SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG end-of-image marker.
const EOI: [u8; 2] = [0xFF, 0xD9];

fn write(path: PathBuf, bytes: &[u8]) -> Result<PathBuf> {
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Raw shape payload plus an info sidecar.
pub fn write_shape(out_dir: &Path, id: u16, version: ShapeVersion, payload: &[u8]) -> Result<PathBuf> {
    let path = write(out_dir.join(format!("shape_{id}.dat")), payload)?;
    let info = format!(
        "Shape ID: {id}\nVersion: {}\nData size: {} bytes\n",
        version.0,
        payload.len()
    );
    write(out_dir.join(format!("shape_{id}_info.txt")), info.as_bytes())?;
    Ok(path)
}

pub fn write_morph_shape(out_dir: &Path, id: u16, payload: &[u8]) -> Result<PathBuf> {
    write(out_dir.join(format!("morph_shape_{id}.dat")), payload)
}

/// Reassemble and write a JPEG.
///
/// When the tag wants the shared tables and tables exist, the output is the
/// tables minus a trailing end-of-image marker, then the tag's image data
/// minus a leading start-of-image marker, so exactly one SOI survives.
pub fn write_jpeg(out_dir: &Path, id: u16, image: &[u8], tables: Option<&[u8]>) -> Result<PathBuf> {
    let path = out_dir.join(format!("image_{id}.jpg"));
    match tables {
        Some(tables) if !tables.is_empty() => {
            let head = match tables {
                [.., a, b] if [*a, *b] == EOI => &tables[..tables.len() - 2],
                _ => tables,
            };
            let tail = match image {
                [a, b, rest @ ..] if [*a, *b] == SOI => rest,
                _ => image,
            };
            let mut out = Vec::with_capacity(head.len() + tail.len());
            out.extend_from_slice(head);
            out.extend_from_slice(tail);
            write(path, &out)
        }
        _ => write(path, image),
    }
}

/// Inflate a lossless-bitmap payload and dump it as raw RGB(A), with a
/// dimensions sidecar. Inflate failure is fatal for the tag.
pub fn write_lossless(
    out_dir: &Path,
    id: u16,
    width: u16,
    height: u16,
    has_alpha: bool,
    compressed: &[u8],
) -> Result<PathBuf> {
    let mut pixels = Vec::new();
    ZlibDecoder::new(compressed)
        .read_to_end(&mut pixels)
        .with_context(|| format!("failed to inflate bitmap {id}"))?;

    let bpp: usize = if has_alpha { 4 } else { 3 };
    let expected = usize::from(width) * usize::from(height) * bpp;
    pixels.truncate(expected);

    let path = write(out_dir.join(format!("image_{id}.raw")), &pixels)?;
    let info = format!(
        "Width: {width}\nHeight: {height}\nBPP: {bpp}\nFormat: {}\n",
        if has_alpha { "RGBA" } else { "RGB" }
    );
    write(out_dir.join(format!("image_{id}_info.txt")), info.as_bytes())?;
    Ok(path)
}

/// Sound payload, verbatim. The extension comes from the codec nibble.
pub fn write_sound(out_dir: &Path, id: u16, format: u8, data: &[u8]) -> Result<PathBuf> {
    let ext = if format == 2 { "mp3" } else { "raw" };
    write(out_dir.join(format!("sound_{id}.{ext}")), data)
}

pub fn write_binary(out_dir: &Path, id: u16, data: &[u8]) -> Result<PathBuf> {
    write(out_dir.join(format!("binary_{id}.bin")), data)
}

pub fn write_abc(out_dir: &Path, index: u32, data: &[u8]) -> Result<PathBuf> {
    write(out_dir.join(format!("abc_{index}.abc")), data)
}

/// Legacy action bytecode: an opaque `.as` dump plus a `.hex` sidecar.
/// `stem` is e.g. `frame_0003_action_0` or `sprite_9_frame_1_action_0`.
pub fn write_action(out_dir: &Path, stem: &str, data: &[u8]) -> Result<PathBuf> {
    let path = write(out_dir.join(format!("{stem}.as")), data)?;
    write(
        out_dir.join(format!("{stem}.as.hex")),
        hex_dump(data).as_bytes(),
    )?;
    Ok(path)
}

/// Lowercase two-digit hex bytes, space separated, 16 per line.
fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3 + data.len() / 16 + 1);
    for (i, byte) in data.iter().enumerate() {
        out.push_str(&format!("{byte:02x} "));
        if (i + 1) % 16 == 0 {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("swfrip-assets-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn jpeg_without_tables_is_verbatim() {
        let dir = temp_dir("jpeg-plain");
        let path = write_jpeg(&dir, 1, &[0xFF, 0xD8, 0x01, 0x02], None).unwrap();
        assert_eq!(fs::read(path).unwrap(), vec![0xFF, 0xD8, 0x01, 0x02]);
    }

    #[test]
    fn jpeg_splice_keeps_exactly_one_soi() {
        let dir = temp_dir("jpeg-tables");
        // tables end in EOI, image starts with SOI
        let tables = [0xFF, 0xD8, 0xFF, 0xD9];
        let image = [0xFF, 0xD8, 0xFF, 0xD9, 0xAB, 0xCD];
        let path = write_jpeg(&dir, 7, &image, Some(&tables)).unwrap();
        assert_eq!(
            fs::read(path).unwrap(),
            vec![0xFF, 0xD8, 0xFF, 0xD9, 0xAB, 0xCD]
        );
    }

    #[test]
    fn jpeg_splice_without_markers_concatenates() {
        let dir = temp_dir("jpeg-nomark");
        let path = write_jpeg(&dir, 8, &[0x10, 0x20], Some(&[0x01, 0x02])).unwrap();
        assert_eq!(fs::read(path).unwrap(), vec![0x01, 0x02, 0x10, 0x20]);
    }

    #[test]
    fn lossless_inflates_and_truncates_to_dimensions() {
        use std::io::Write;
        let dir = temp_dir("lossless");
        // 2×1 RGB plus two bytes of padding
        let pixels = [1u8, 2, 3, 4, 5, 6, 0, 0];
        let mut enc =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(&pixels).unwrap();
        let compressed = enc.finish().unwrap();

        let path = write_lossless(&dir, 3, 2, 1, false, &compressed).unwrap();
        assert_eq!(fs::read(path).unwrap(), vec![1, 2, 3, 4, 5, 6]);
        let info = fs::read_to_string(dir.join("image_3_info.txt")).unwrap();
        assert!(info.contains("Width: 2"));
        assert!(info.contains("Format: RGB"));
    }

    #[test]
    fn lossless_inflate_failure_is_an_error() {
        let dir = temp_dir("lossless-bad");
        assert!(write_lossless(&dir, 4, 2, 2, true, &[0xde, 0xad]).is_err());
    }

    #[test]
    fn hex_dump_wraps_every_16_bytes() {
        let data: Vec<u8> = (0u8..18).collect();
        let dump = hex_dump(&data);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00 01 02"));
        assert!(lines[0].trim_end().ends_with("0f"));
        assert_eq!(lines[1].trim_end(), "10 11");
    }

    #[test]
    fn sound_extension_follows_codec() {
        let dir = temp_dir("sound");
        let mp3 = write_sound(&dir, 5, 2, &[1, 2]).unwrap();
        assert!(mp3.ends_with("sound_5.mp3"));
        let raw = write_sound(&dir, 6, 3, &[1, 2]).unwrap();
        assert!(raw.ends_with("sound_6.raw"));
    }
}
