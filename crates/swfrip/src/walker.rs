//! Tag-stream walker: drives one container file end to end.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use swfdata::bits::BitReader;
use swfdata::tags::{Tag, TagCode, TagReader};
use swfdata::types::{ColorTransform, Matrix};
use swfdata::ShapeVersion;

use crate::assets;

/// What a character id resolves to once its definition tag has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CharacterKind {
    Shape,
    MorphShape,
    Image,
    Sound,
    Sprite,
    Binary,
}

impl CharacterKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Shape => "shape",
            Self::MorphShape => "morph_shape",
            Self::Image => "image",
            Self::Sound => "sound",
            Self::Sprite => "sprite",
            Self::Binary => "binary",
        }
    }
}

/// Character-table entry: kind plus the primary file persisted for it.
#[derive(Debug, Clone)]
pub struct Character {
    pub kind: CharacterKind,
    pub path: PathBuf,
}

/// One entry in the depth-keyed display list.
#[derive(Debug, Clone, Default)]
pub struct DisplayObject {
    pub character_id: u16,
    pub depth: u16,
    pub matrix: Matrix,
    pub color_transform: ColorTransform,
    pub name: String,
}

/// Walks a container's tag stream and extracts every asset it defines.
///
/// All per-file state lives here: the character table, the depth-keyed
/// display list, the shared JPEG tables, and the output counters. One
/// instance processes one file.
pub struct Extractor {
    out_dir: PathBuf,
    current_frame: u32,
    characters: BTreeMap<u16, Character>,
    display_list: BTreeMap<u16, DisplayObject>,
    jpeg_tables: Vec<u8>,
    action_count: u32,
    abc_count: u32,
}

impl Extractor {
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
        Ok(Self {
            out_dir,
            current_frame: 0,
            characters: BTreeMap::new(),
            display_list: BTreeMap::new(),
            jpeg_tables: Vec::new(),
            action_count: 0,
            abc_count: 0,
        })
    }

    /// Number of frames seen on the main timeline so far.
    pub fn frames(&self) -> u32 {
        self.current_frame
    }

    /// The character table built during the walk.
    pub fn characters(&self) -> &BTreeMap<u16, Character> {
        &self.characters
    }

    /// Extract every asset from a raw container file.
    ///
    /// Individual tag failures are reported and skipped; only an unreadable
    /// header or body aborts the run.
    pub fn run(&mut self, raw: &[u8]) -> Result<()> {
        let movie = swfdata::header::decode(raw)?;
        eprintln!(
            "[extract] version {}, {:.2} fps, {} frame(s) declared",
            movie.header.version, movie.frame_rate, movie.frame_count
        );

        let mut tags = TagReader::new(&movie.body[movie.first_tag..]);
        while let Some(tag) = tags.next_tag() {
            if let Err(err) = self.process_tag(&tag) {
                eprintln!("[extract] tag {} skipped: {err:#}", tag.code);
            }
        }

        self.print_summary();
        Ok(())
    }

    fn process_tag(&mut self, tag: &Tag) -> Result<()> {
        let Some(kind) = tag.kind() else {
            // Unknown tag codes are skipped by their declared length, which
            // the tag reader has already consumed.
            return Ok(());
        };
        match kind {
            TagCode::End => {}

            TagCode::ShowFrame => {
                self.current_frame += 1;
                self.save_frame_state()?;
            }

            TagCode::JpegTables => {
                self.jpeg_tables = tag.payload.to_vec();
                eprintln!("[extract] loaded JPEG tables ({} bytes)", tag.payload.len());
            }

            TagCode::DefineShape => self.define_shape(tag.payload, ShapeVersion::V1)?,
            TagCode::DefineShape2 => self.define_shape(tag.payload, ShapeVersion::V2)?,
            TagCode::DefineShape3 => self.define_shape(tag.payload, ShapeVersion::V3)?,
            TagCode::DefineShape4 => self.define_shape(tag.payload, ShapeVersion::V4)?,

            TagCode::DefineMorphShape | TagCode::DefineMorphShape2 => {
                let id = payload_id(tag.payload)?;
                let path = assets::write_morph_shape(&self.out_dir, id, tag.payload)?;
                self.register(id, CharacterKind::MorphShape, path);
            }

            TagCode::DefineBits => {
                let id = payload_id(tag.payload)?;
                let tables = (!self.jpeg_tables.is_empty()).then_some(self.jpeg_tables.as_slice());
                let path = assets::write_jpeg(&self.out_dir, id, &tag.payload[2..], tables)?;
                self.register(id, CharacterKind::Image, path);
            }

            TagCode::DefineBitsJpeg2 => {
                let id = payload_id(tag.payload)?;
                let path = assets::write_jpeg(&self.out_dir, id, &tag.payload[2..], None)?;
                self.register(id, CharacterKind::Image, path);
            }

            TagCode::DefineBitsJpeg3 | TagCode::DefineBitsJpeg4 => {
                let mut br = BitReader::new(tag.payload);
                let id = br.read_u16();
                let image_len = br.read_u32() as usize;
                let rest = br.rest();
                let image = &rest[..image_len.min(rest.len())];
                let path = assets::write_jpeg(&self.out_dir, id, image, None)?;
                self.register(id, CharacterKind::Image, path);
            }

            TagCode::DefineBitsLossless | TagCode::DefineBitsLossless2 => {
                let mut br = BitReader::new(tag.payload);
                let id = br.read_u16();
                let format = br.read_u8();
                let width = br.read_u16();
                let height = br.read_u16();
                if format == 3 {
                    br.read_u8(); // palette size, unused in the raw dump
                }
                let has_alpha = kind == TagCode::DefineBitsLossless2;
                let path =
                    assets::write_lossless(&self.out_dir, id, width, height, has_alpha, br.rest())?;
                self.register(id, CharacterKind::Image, path);
            }

            TagCode::DefineSound => {
                let mut br = BitReader::new(tag.payload);
                let id = br.read_u16();
                let flags = br.read_u8();
                let format = flags >> 4;
                br.read_u32(); // sample count
                let path = assets::write_sound(&self.out_dir, id, format, br.rest())?;
                self.register(id, CharacterKind::Sound, path);
            }

            TagCode::DefineBinaryData => {
                let mut br = BitReader::new(tag.payload);
                let id = br.read_u16();
                br.read_u32(); // reserved
                let path = assets::write_binary(&self.out_dir, id, br.rest())?;
                self.register(id, CharacterKind::Binary, path);
            }

            TagCode::DoAction => {
                let stem = format!(
                    "frame_{:04}_action_{}",
                    self.current_frame, self.action_count
                );
                self.action_count += 1;
                assets::write_action(&self.out_dir, &stem, tag.payload)?;
            }

            TagCode::DoAbc => {
                let path = assets::write_abc(&self.out_dir, self.abc_count, tag.payload)?;
                self.abc_count += 1;
                eprintln!("[extract] ABC bytecode → {}", path.display());
            }

            TagCode::SymbolClass => self.symbol_class(tag.payload)?,

            TagCode::PlaceObject => self.place_object(tag.payload),
            TagCode::PlaceObject2 => self.place_object2(tag.payload, false),
            TagCode::PlaceObject3 => self.place_object2(tag.payload, true),

            TagCode::RemoveObject => {
                let mut br = BitReader::new(tag.payload);
                br.read_u16(); // character id, redundant with the depth key
                let depth = br.read_u16();
                self.display_list.remove(&depth);
            }
            TagCode::RemoveObject2 => {
                let depth = BitReader::new(tag.payload).read_u16();
                self.display_list.remove(&depth);
            }

            TagCode::DefineSprite => self.define_sprite(tag.payload)?,
        }
        Ok(())
    }

    fn register(&mut self, id: u16, kind: CharacterKind, path: PathBuf) {
        eprintln!("[extract] {} {id} → {}", kind.label(), path.display());
        self.characters.insert(id, Character { kind, path });
    }

    fn define_shape(&mut self, payload: &[u8], version: ShapeVersion) -> Result<()> {
        let id = payload_id(payload)?;
        let path = assets::write_shape(&self.out_dir, id, version, payload)?;
        self.register(id, CharacterKind::Shape, path);
        Ok(())
    }

    /// PlaceObject: always creates at its depth.
    fn place_object(&mut self, payload: &[u8]) {
        let mut br = BitReader::new(payload);
        let character_id = br.read_u16();
        let depth = br.read_u16();
        let matrix = Matrix::read(&mut br);
        self.display_list.insert(
            depth,
            DisplayObject {
                character_id,
                depth,
                matrix,
                ..DisplayObject::default()
            },
        );
    }

    /// PlaceObject2/3: creates or modifies in place depending on flag bits.
    fn place_object2(&mut self, payload: &[u8], has_alpha_transform: bool) {
        let mut br = BitReader::new(payload);
        let flags = br.read_u8();
        let depth = br.read_u16();

        let mut obj = self.display_list.get(&depth).cloned().unwrap_or_default();
        obj.depth = depth;

        if flags & 0x02 != 0 {
            obj.character_id = br.read_u16();
        }
        if flags & 0x04 != 0 {
            obj.matrix = Matrix::read(&mut br);
            br.align();
        }
        if flags & 0x08 != 0 {
            obj.color_transform = ColorTransform::read(&mut br, has_alpha_transform);
            br.align();
        }
        if flags & 0x20 != 0 {
            obj.name = br.read_cstring();
        }
        self.display_list.insert(depth, obj);
    }

    fn symbol_class(&mut self, payload: &[u8]) -> Result<()> {
        let mut br = BitReader::new(payload);
        let count = br.read_u16();
        let mut out = String::new();
        for _ in 0..count {
            let id = br.read_u16();
            let name = br.read_cstring();
            let _ = writeln!(out, "{id}\t{name}");
        }
        let path = self.out_dir.join("symbol_class.txt");
        fs::write(&path, out).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Snapshot the display list, ascending by depth.
    fn save_frame_state(&self) -> Result<()> {
        let mut out = String::new();
        let _ = writeln!(out, "=== FRAME {} DISPLAY LIST ===\n", self.current_frame);
        for obj in self.display_list.values() {
            let _ = writeln!(out, "Depth: {}", obj.depth);
            let _ = writeln!(out, "  Character ID: {}", obj.character_id);
            if let Some(character) = self.characters.get(&obj.character_id) {
                let _ = writeln!(out, "  Type: {}", character.kind.label());
                let _ = writeln!(out, "  File: {}", character.path.display());
            }
            let m = &obj.matrix;
            let _ = writeln!(
                out,
                "  Matrix: [{}, {}, {}, {}, {}, {}]",
                m.a, m.b, m.c, m.d, m.tx, m.ty
            );
            if !obj.name.is_empty() {
                let _ = writeln!(out, "  Name: {}", obj.name);
            }
            let _ = writeln!(out);
        }
        let path = self
            .out_dir
            .join(format!("frame_{:04}_display.txt", self.current_frame));
        fs::write(&path, out).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Recursively walk a sprite's bounded sub-stream. The sprite keeps its
    /// own frame counter but shares the character table and display list.
    fn define_sprite(&mut self, payload: &[u8]) -> Result<()> {
        let mut br = BitReader::new(payload);
        let sprite_id = br.read_u16();
        let declared_frames = br.read_u16();
        eprintln!("[extract] sprite {sprite_id} ({declared_frames} frame(s) declared)");

        let mut meta = format!("Sprite ID: {sprite_id}\nContains:\n");
        let mut sprite_frame = 0u32;
        let mut action_count = 0u32;

        let mut tags = TagReader::new(br.rest());
        while let Some(tag) = tags.next_tag() {
            match tag.kind() {
                Some(TagCode::ShowFrame) => {
                    sprite_frame += 1;
                    let _ = writeln!(meta, "  Frame {sprite_frame}");
                }
                Some(TagCode::DoAction) => {
                    let stem =
                        format!("sprite_{sprite_id}_frame_{sprite_frame}_action_{action_count}");
                    action_count += 1;
                    assets::write_action(&self.out_dir, &stem, tag.payload)?;
                    let _ = writeln!(meta, "    Action script");
                }
                _ => {
                    if let Err(err) = self.process_tag(&tag) {
                        eprintln!(
                            "[extract] sprite {sprite_id}: tag {} skipped: {err:#}",
                            tag.code
                        );
                    }
                }
            }
        }

        let path = self.out_dir.join(format!("sprite_{sprite_id}_info.txt"));
        fs::write(&path, meta).with_context(|| format!("failed to write {}", path.display()))?;
        self.register(sprite_id, CharacterKind::Sprite, path);
        Ok(())
    }

    fn print_summary(&self) {
        println!(
            "Extracted {} asset(s) over {} frame(s) to {}",
            self.characters.len(),
            self.current_frame,
            self.out_dir.display()
        );
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for character in self.characters.values() {
            *counts.entry(character.kind.label()).or_default() += 1;
        }
        for (label, count) in counts {
            println!("  {label}: {count}");
        }
    }
}

/// Leading character id of a definition tag payload.
fn payload_id(payload: &[u8]) -> Result<u16> {
    if payload.len() < 2 {
        bail!("payload too short for a character id");
    }
    Ok(u16::from_le_bytes([payload[0], payload[1]]))
}
