use crate::bits::BitReader;

/// Native coordinate unit of the container: one twentieth of a pixel.
pub const TWIPS_PER_PIXEL: f64 = 20.0;

/// An RGBA colour. Alpha is opaque for RGB reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    pub fn read_rgb(br: &mut BitReader) -> Self {
        Self {
            r: br.read_u8(),
            g: br.read_u8(),
            b: br.read_u8(),
            a: 255,
        }
    }

    pub fn read_rgba(br: &mut BitReader) -> Self {
        Self {
            r: br.read_u8(),
            g: br.read_u8(),
            b: br.read_u8(),
            a: br.read_u8(),
        }
    }

    pub fn read(br: &mut BitReader, has_alpha: bool) -> Self {
        if has_alpha {
            Self::read_rgba(br)
        } else {
            Self::read_rgb(br)
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

/// 2×3 affine matrix. Scale/rotate are 16.16 fixed point on the wire,
/// translate is in twips; both are converted on read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }
}

impl Matrix {
    /// Bit-level read. Does not re-align; callers align when the record ends.
    pub fn read(br: &mut BitReader) -> Self {
        let mut m = Self::default();
        if br.read_flag() {
            let n = br.read_bits(5);
            m.a = f64::from(br.read_sbits(n)) / 65536.0;
            m.d = f64::from(br.read_sbits(n)) / 65536.0;
        }
        if br.read_flag() {
            let n = br.read_bits(5);
            m.c = f64::from(br.read_sbits(n)) / 65536.0;
            m.b = f64::from(br.read_sbits(n)) / 65536.0;
        }
        let n = br.read_bits(5);
        m.tx = f64::from(br.read_sbits(n)) / TWIPS_PER_PIXEL;
        m.ty = f64::from(br.read_sbits(n)) / TWIPS_PER_PIXEL;
        m
    }
}

/// Axis-aligned bounding rectangle in twips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl Rect {
    /// Reads the 5-bit field width plus four signed fields, then re-aligns.
    pub fn read(br: &mut BitReader) -> Self {
        let n = br.read_bits(5);
        let r = Self {
            x_min: br.read_sbits(n),
            x_max: br.read_sbits(n),
            y_min: br.read_sbits(n),
            y_max: br.read_sbits(n),
        };
        br.align();
        r
    }

    pub fn width_px(&self) -> f64 {
        f64::from(self.x_max - self.x_min) / TWIPS_PER_PIXEL
    }

    pub fn height_px(&self) -> f64 {
        f64::from(self.y_max - self.y_min) / TWIPS_PER_PIXEL
    }
}

/// Per-channel multiply/add colour transform. Multipliers default to 256
/// (identity), adders to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTransform {
    pub r_mult: i32,
    pub g_mult: i32,
    pub b_mult: i32,
    pub a_mult: i32,
    pub r_add: i32,
    pub g_add: i32,
    pub b_add: i32,
    pub a_add: i32,
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self {
            r_mult: 256,
            g_mult: 256,
            b_mult: 256,
            a_mult: 256,
            r_add: 0,
            g_add: 0,
            b_add: 0,
            a_add: 0,
        }
    }
}

impl ColorTransform {
    /// Bit-level read; alpha terms are only present in the newer Place tags.
    pub fn read(br: &mut BitReader, has_alpha: bool) -> Self {
        let mut ct = Self::default();
        let has_add = br.read_flag();
        let has_mult = br.read_flag();
        let n = br.read_bits(4);

        if has_mult {
            ct.r_mult = br.read_sbits(n);
            ct.g_mult = br.read_sbits(n);
            ct.b_mult = br.read_sbits(n);
            if has_alpha {
                ct.a_mult = br.read_sbits(n);
            }
        }
        if has_add {
            ct.r_add = br.read_sbits(n);
            ct.g_add = br.read_sbits(n);
            ct.b_add = br.read_sbits(n);
            if has_alpha {
                ct.a_add = br.read_sbits(n);
            }
        }
        ct
    }
}

/// A point in pixel units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Coordinate-wise equality within the path-chaining tolerance.
    pub fn approx_eq(self, other: Self) -> bool {
        (self.x - other.x).abs() < 1e-4 && (self.y - other.y).abs() < 1e-4
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// MSB-first bit writer for building fixtures.
    pub(crate) struct BitWriter {
        bytes: Vec<u8>,
        bit: u8,
    }

    impl BitWriter {
        pub fn new() -> Self {
            Self {
                bytes: Vec::new(),
                bit: 0,
            }
        }

        pub fn bits(&mut self, value: u32, n: u32) -> &mut Self {
            for i in (0..n).rev() {
                if self.bit == 0 {
                    self.bytes.push(0);
                }
                let b = ((value >> i) & 1) as u8;
                let last = self.bytes.len() - 1;
                self.bytes[last] |= b << (7 - self.bit);
                self.bit = (self.bit + 1) % 8;
            }
            self
        }

        pub fn sbits(&mut self, value: i32, n: u32) -> &mut Self {
            self.bits(value as u32 & ((1u32 << n) - 1), n)
        }

        pub fn align(&mut self) -> &mut Self {
            self.bit = 0;
            self
        }

        pub fn byte(&mut self, v: u8) -> &mut Self {
            self.align();
            self.bytes.push(v);
            self
        }

        pub fn u16(&mut self, v: u16) -> &mut Self {
            self.align();
            self.bytes.extend_from_slice(&v.to_le_bytes());
            self
        }

        pub fn finish(&mut self) -> Vec<u8> {
            self.bytes.clone()
        }
    }

    #[test]
    fn rect_reads_and_aligns() {
        let data = BitWriter::new()
            .bits(10, 5)
            .sbits(0, 10)
            .sbits(2000, 10)
            .sbits(-100, 10)
            .sbits(300, 10)
            .finish();
        let mut br = BitReader::new(&data);
        let r = Rect::read(&mut br);
        assert_eq!(
            r,
            Rect {
                x_min: 0,
                x_max: 2000,
                y_min: -100,
                y_max: 300
            }
        );
        assert_eq!(r.width_px(), 100.0);
        // 5 + 4×10 bits = 45 bits, re-aligned to 6 bytes.
        assert_eq!(br.byte_pos(), 6);
    }

    #[test]
    fn matrix_identity_when_no_scale_or_rotate() {
        let data = BitWriter::new()
            .bits(0, 1) // no scale
            .bits(0, 1) // no rotate
            .bits(5, 5) // translate bits
            .sbits(20, 5)
            .sbits(-20, 5)
            .finish();
        let mut br = BitReader::new(&data);
        let m = Matrix::read(&mut br);
        assert_eq!(m.a, 1.0);
        assert_eq!(m.d, 1.0);
        assert_eq!(m.tx, 1.0);
        assert_eq!(m.ty, -1.0);
    }

    #[test]
    fn matrix_scale_is_16_16_fixed_point() {
        let data = BitWriter::new()
            .bits(1, 1) // has scale
            .bits(18, 5)
            .sbits(0x18000, 18) // 1.5
            .sbits(0x8000, 18) // 0.5
            .bits(0, 1) // no rotate
            .bits(1, 5)
            .sbits(0, 1)
            .sbits(0, 1)
            .finish();
        let mut br = BitReader::new(&data);
        let m = Matrix::read(&mut br);
        assert_eq!(m.a, 1.5);
        assert_eq!(m.d, 0.5);
    }

    #[test]
    fn color_transform_defaults_without_terms() {
        let data = BitWriter::new().bits(0, 2).bits(4, 4).finish();
        let mut br = BitReader::new(&data);
        let ct = ColorTransform::read(&mut br, true);
        assert_eq!(ct, ColorTransform::default());
    }

    #[test]
    fn point_tolerance() {
        let p = Point { x: 1.0, y: 2.0 };
        assert!(p.approx_eq(Point {
            x: 1.00005,
            y: 1.99995
        }));
        assert!(!p.approx_eq(Point { x: 1.001, y: 2.0 }));
    }
}
