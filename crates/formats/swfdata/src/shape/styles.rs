use crate::bits::BitReader;
use crate::error::{Error, Result};
use crate::types::{Matrix, Rgba};

/// Shape tag version (DefineShape = 1 … DefineShape4 = 4).
///
/// Carried explicitly through the decoder; it changes colour width, style
/// count encoding, and the line-style record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ShapeVersion(pub u8);

impl ShapeVersion {
    pub const V1: Self = Self(1);
    pub const V2: Self = Self(2);
    pub const V3: Self = Self(3);
    pub const V4: Self = Self(4);

    /// A style count byte of 0xFF introduces a 16-bit count (v2+).
    /// v1 treats 0xFF as a literal count of 255.
    pub fn has_extended_count(self) -> bool {
        self.0 >= 2
    }

    /// Colours carry an alpha channel (v3+).
    pub fn has_alpha(self) -> bool {
        self.0 >= 3
    }

    /// Line styles carry caps/joins/fills; focal gradients appear (v4).
    pub fn has_line_caps(self) -> bool {
        self.0 >= 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientStop {
    /// Position along the gradient axis, 0..=255.
    pub ratio: u8,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub matrix: Matrix,
    pub spread: u8,
    pub interpolation: u8,
    pub stops: Vec<GradientStop>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FillStyle {
    Solid(Rgba),
    Linear(Gradient),
    /// Focal-radial gradients (v4) also land here; the focal ratio field is
    /// consumed and discarded.
    Radial(Gradient),
    Bitmap { id: u16, matrix: Matrix },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Round,
    Butt,
    Square,
}

impl LineCap {
    fn from_bits(v: u32) -> Self {
        match v {
            1 => Self::Butt,
            2 => Self::Square,
            _ => Self::Round,
        }
    }
}

/// Line join; miter carries its limit in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Round,
    Bevel,
    Miter { limit_twips: u16 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    /// Stroke width in twips.
    pub width: u16,
    pub color: Rgba,
    pub start_cap: LineCap,
    pub end_cap: LineCap,
    pub join: LineJoin,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 20,
            color: Rgba::BLACK,
            start_cap: LineCap::Round,
            end_cap: LineCap::Round,
            join: LineJoin::Round,
        }
    }
}

/// Count byte, extended to 16 bits on 0xFF for v2+.
fn read_style_count(br: &mut BitReader, version: ShapeVersion) -> u16 {
    let count = br.read_u8();
    if count == 0xFF && version.has_extended_count() {
        br.read_u16()
    } else {
        u16::from(count)
    }
}

fn read_gradient(br: &mut BitReader, version: ShapeVersion, focal: bool) -> Gradient {
    let matrix = Matrix::read(br);
    br.align();
    let spread = br.read_bits(2) as u8;
    let interpolation = br.read_bits(2) as u8;
    let stop_count = br.read_bits(4);
    let mut stops = Vec::with_capacity(stop_count as usize);
    for _ in 0..stop_count {
        stops.push(GradientStop {
            ratio: br.read_u8(),
            color: Rgba::read(br, version.has_alpha()),
        });
    }
    if focal && version.has_line_caps() {
        // 8.8 focal ratio; not used by the emitter.
        br.read_u16();
    }
    Gradient {
        matrix,
        spread,
        interpolation,
        stops,
    }
}

fn read_fill_style(br: &mut BitReader, version: ShapeVersion) -> FillStyle {
    let kind = br.read_u8();
    match kind {
        0x00 => FillStyle::Solid(Rgba::read(br, version.has_alpha())),
        0x10 => FillStyle::Linear(read_gradient(br, version, false)),
        0x12 | 0x13 => FillStyle::Radial(read_gradient(br, version, kind == 0x13)),
        k if k >= 0x40 => {
            let id = br.read_u16();
            let matrix = Matrix::read(br);
            br.align();
            FillStyle::Bitmap { id, matrix }
        }
        // Unknown kinds degrade to an opaque black fill; the shape decoder
        // never aborts mid-shape.
        _ => FillStyle::Solid(Rgba::BLACK),
    }
}

pub fn read_fill_styles(br: &mut BitReader, version: ShapeVersion) -> Result<Vec<FillStyle>> {
    let count = read_style_count(br, version);
    if usize::from(count) > br.remaining() {
        return Err(Error::OversizedCount {
            context: "fill styles",
            count: usize::from(count),
        });
    }
    let mut styles = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        styles.push(read_fill_style(br, version));
    }
    Ok(styles)
}

pub fn read_line_styles(br: &mut BitReader, version: ShapeVersion) -> Result<Vec<LineStyle>> {
    let count = read_style_count(br, version);
    if usize::from(count) > br.remaining() {
        return Err(Error::OversizedCount {
            context: "line styles",
            count: usize::from(count),
        });
    }
    let mut styles = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        styles.push(read_line_style(br, version)?);
    }
    Ok(styles)
}

fn read_line_style(br: &mut BitReader, version: ShapeVersion) -> Result<LineStyle> {
    let width = br.read_u16();
    let mut style = LineStyle {
        width,
        ..LineStyle::default()
    };

    if version.has_line_caps() {
        style.start_cap = LineCap::from_bits(br.read_bits(2));
        let join_bits = br.read_bits(2);
        let has_fill = br.read_flag();
        br.read_bits(1); // no h-scale
        br.read_bits(1); // no v-scale
        br.read_bits(1); // pixel hinting
        br.read_bits(5); // reserved
        br.read_bits(1); // no close
        style.end_cap = LineCap::from_bits(br.read_bits(2));
        br.align();

        style.join = if join_bits == 2 {
            LineJoin::Miter {
                limit_twips: br.read_u16(),
            }
        } else if join_bits == 1 {
            LineJoin::Bevel
        } else {
            LineJoin::Round
        };

        if has_fill {
            // Fill-strokes carry a nested fill-style table. It is parsed to
            // keep the stream in sync and discarded; the active tables of the
            // enclosing shape must not be touched.
            read_fill_styles(br, version)?;
            style.color = Rgba::BLACK;
        } else {
            style.color = Rgba::read_rgba(br);
        }
    } else {
        style.color = Rgba::read(br, version.has_alpha());
    }
    Ok(style)
}
