//! Bit-packed shape record decoding.
//!
//! A shape payload is a pair of style tables followed by a stream of
//! style-change and edge records driven by a pen position. Every edge can
//! belong to up to three layers at once: the fill on its left (`fill0`), the
//! fill on its right (`fill1`), and a stroke. Edges entering a `fill0` layer
//! are reversed first, so that chaining any fill layer tip-to-tail walks its
//! loops in one consistent winding — this duality is what makes the closed
//! sub-paths come out right and is easy to miss.

mod styles;

pub use styles::{
    read_fill_styles, read_line_styles, FillStyle, Gradient, GradientStop, LineCap, LineJoin,
    LineStyle, ShapeVersion,
};

use std::collections::BTreeMap;

use crate::bits::BitReader;
use crate::error::Result;
use crate::types::{Point, Rect, TWIPS_PER_PIXEL};

/// A decoded edge in pixel units. Quadratic edges carry a control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: Point,
    pub to: Point,
    pub control: Option<Point>,
}

impl Edge {
    /// The same geometry walked in the opposite direction.
    pub fn reversed(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            control: self.control,
        }
    }
}

/// Edges grouped under one generation of style tables.
///
/// A shape that resets its style tables mid-stream produces one batch per
/// generation; indices in `fills`/`strokes` are 1-based into the tables of
/// the same batch.
#[derive(Debug, Default)]
pub struct ShapeBatch {
    pub fill_styles: Vec<FillStyle>,
    pub line_styles: Vec<LineStyle>,
    pub fills: BTreeMap<u16, Vec<Edge>>,
    pub strokes: BTreeMap<u16, Vec<Edge>>,
}

#[derive(Debug)]
pub struct DecodedShape {
    pub id: u16,
    /// Bounding rectangle in twips.
    pub bounds: Rect,
    pub batches: Vec<ShapeBatch>,
}

/// Decode a shape payload as persisted by the extractor: character id,
/// bounds, style tables, then the record stream.
pub fn decode_shape(data: &[u8], version: ShapeVersion) -> Result<DecodedShape> {
    let mut br = BitReader::new(data);
    let id = br.read_u16();
    let bounds = Rect::read(&mut br);

    if version.has_line_caps() {
        // DefineShape4 carries edge bounds and stroke-hint flags up front.
        let _edge_bounds = Rect::read(&mut br);
        br.read_bits(5); // reserved
        br.read_bits(1); // uses fill winding
        br.read_bits(1); // uses non-scaling strokes
        br.read_bits(1); // uses scaling strokes
        br.align();
    }

    let mut batch = ShapeBatch {
        fill_styles: read_fill_styles(&mut br, version)?,
        line_styles: read_line_styles(&mut br, version)?,
        ..ShapeBatch::default()
    };
    let mut num_fill_bits = br.read_bits(4);
    let mut num_line_bits = br.read_bits(4);

    let mut batches = Vec::new();
    let mut pen = Point::default();
    let mut fill0 = 0u16;
    let mut fill1 = 0u16;
    let mut line = 0u16;

    loop {
        let is_edge = br.read_flag();
        if !is_edge {
            let flags = br.read_bits(5);
            if flags == 0 {
                // End-of-shape record. A truncated stream lands here too,
                // since reads past the buffer yield zero bits.
                break;
            }
            if flags & 0x01 != 0 {
                let n = br.read_bits(5);
                pen.x = f64::from(br.read_sbits(n)) / TWIPS_PER_PIXEL;
                pen.y = f64::from(br.read_sbits(n)) / TWIPS_PER_PIXEL;
            }
            if flags & 0x02 != 0 {
                fill0 = br.read_bits(num_fill_bits) as u16;
            }
            if flags & 0x04 != 0 {
                fill1 = br.read_bits(num_fill_bits) as u16;
            }
            if flags & 0x08 != 0 {
                line = br.read_bits(num_line_bits) as u16;
            }
            if flags & 0x10 != 0 {
                // Mid-shape style reset: edges accumulated so far belong to
                // the outgoing tables, so they are flushed as a batch before
                // the new tables replace them.
                batches.push(std::mem::take(&mut batch));
                batch.fill_styles = read_fill_styles(&mut br, version)?;
                batch.line_styles = read_line_styles(&mut br, version)?;
                num_fill_bits = br.read_bits(4);
                num_line_bits = br.read_bits(4);
            }
        } else {
            let straight = br.read_flag();
            let num_bits = br.read_bits(4) + 2;
            let edge = if straight {
                let mut dx = 0i32;
                let mut dy = 0i32;
                if br.read_flag() {
                    // general line
                    dx = br.read_sbits(num_bits);
                    dy = br.read_sbits(num_bits);
                } else if br.read_flag() {
                    dy = br.read_sbits(num_bits);
                } else {
                    dx = br.read_sbits(num_bits);
                }
                let to = Point {
                    x: pen.x + f64::from(dx) / TWIPS_PER_PIXEL,
                    y: pen.y + f64::from(dy) / TWIPS_PER_PIXEL,
                };
                Edge {
                    from: pen,
                    to,
                    control: None,
                }
            } else {
                let cdx = br.read_sbits(num_bits);
                let cdy = br.read_sbits(num_bits);
                let adx = br.read_sbits(num_bits);
                let ady = br.read_sbits(num_bits);
                let control = Point {
                    x: pen.x + f64::from(cdx) / TWIPS_PER_PIXEL,
                    y: pen.y + f64::from(cdy) / TWIPS_PER_PIXEL,
                };
                let to = Point {
                    x: control.x + f64::from(adx) / TWIPS_PER_PIXEL,
                    y: control.y + f64::from(ady) / TWIPS_PER_PIXEL,
                };
                Edge {
                    from: pen,
                    to,
                    control: Some(control),
                }
            };

            if fill0 != 0 {
                batch.fills.entry(fill0).or_default().push(edge.reversed());
            }
            if fill1 != 0 {
                batch.fills.entry(fill1).or_default().push(edge);
            }
            if line != 0 {
                batch.strokes.entry(line).or_default().push(edge);
            }
            pen = edge.to;
        }
    }

    batches.push(batch);
    Ok(DecodedShape {
        id,
        bounds,
        batches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::BitWriter;

    /// DefineShape2 payload: a 100×100-twip square filled with style 1.
    pub(crate) fn red_square_payload() -> Vec<u8> {
        let mut w = BitWriter::new();
        w.u16(1); // character id
        w.bits(8, 5) // bounds, 8-bit fields
            .sbits(0, 8)
            .sbits(100, 8)
            .sbits(0, 8)
            .sbits(100, 8)
            .align();
        // one solid red fill, no line styles
        w.byte(1).byte(0x00).byte(255).byte(0).byte(0);
        w.byte(0);
        // field widths: 1 fill bit, 0 line bits
        w.bits(1, 4).bits(0, 4);
        // style change: move to (0,0), fill1 = 1
        w.bits(0, 1).bits(0b00101, 5);
        w.bits(1, 5).sbits(0, 1).sbits(0, 1);
        w.bits(1, 1);
        // four straight edges around the square
        for (dx, dy) in [(100, 0), (0, 100), (-100, 0), (0, -100)] {
            w.bits(1, 1).bits(1, 1); // edge, straight
            w.bits(7, 4); // 9-bit deltas
            w.bits(1, 1); // general line
            w.sbits(dx, 9).sbits(dy, 9);
        }
        // end of shape
        w.bits(0, 1).bits(0, 5);
        w.finish()
    }

    #[test]
    fn square_decodes_to_one_closed_fill_ring() {
        let shape = decode_shape(&red_square_payload(), ShapeVersion::V2).unwrap();
        assert_eq!(shape.id, 1);
        assert_eq!(shape.bounds.width_px(), 5.0);
        assert_eq!(shape.batches.len(), 1);

        let batch = &shape.batches[0];
        assert_eq!(batch.fill_styles.len(), 1);
        assert!(batch.strokes.is_empty());

        let edges = &batch.fills[&1];
        assert_eq!(edges.len(), 4);
        // forward orientation (fill1): each edge starts where the last ended
        for pair in edges.windows(2) {
            assert!(pair[0].to.approx_eq(pair[1].from));
        }
        assert!(edges[3].to.approx_eq(edges[0].from));
    }

    #[test]
    fn fill0_edges_are_reversed() {
        // Same square but assigned to fill0 instead of fill1.
        let mut w = BitWriter::new();
        w.u16(7);
        w.bits(8, 5)
            .sbits(0, 8)
            .sbits(100, 8)
            .sbits(0, 8)
            .sbits(100, 8)
            .align();
        w.byte(1).byte(0x00).byte(0).byte(255).byte(0);
        w.byte(0);
        w.bits(1, 4).bits(0, 4);
        // style change: move to (0,0), fill0 = 1
        w.bits(0, 1).bits(0b00011, 5);
        w.bits(1, 5).sbits(0, 1).sbits(0, 1);
        w.bits(1, 1);
        w.bits(1, 1).bits(1, 1).bits(7, 4).bits(1, 1);
        w.sbits(100, 9).sbits(0, 9);
        w.bits(0, 1).bits(0, 5);

        let shape = decode_shape(&w.finish(), ShapeVersion::V2).unwrap();
        let edges = &shape.batches[0].fills[&1];
        assert_eq!(edges.len(), 1);
        // drawn 0,0 → 5,0 but stored reversed
        assert!(edges[0].from.approx_eq(Point { x: 5.0, y: 0.0 }));
        assert!(edges[0].to.approx_eq(Point { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn quadratic_edge_accumulates_control_then_anchor() {
        let mut w = BitWriter::new();
        w.u16(2);
        w.bits(0, 5).align(); // empty bounds
        w.byte(1).byte(0x00).byte(1).byte(1).byte(1);
        w.byte(0);
        w.bits(1, 4).bits(0, 4);
        w.bits(0, 1).bits(0b00100, 5).bits(1, 1); // fill1 = 1
        // curve: control delta (20,20), anchor delta (20,-20)
        w.bits(1, 1).bits(0, 1).bits(4, 4);
        w.sbits(20, 6).sbits(20, 6).sbits(20, 6).sbits(-20, 6);
        w.bits(0, 1).bits(0, 5);

        let shape = decode_shape(&w.finish(), ShapeVersion::V2).unwrap();
        let edges = &shape.batches[0].fills[&1];
        let edge = edges[0];
        assert!(edge.control.unwrap().approx_eq(Point { x: 1.0, y: 1.0 }));
        assert!(edge.to.approx_eq(Point { x: 2.0, y: 0.0 }));
    }

    #[test]
    fn new_styles_record_flushes_a_batch() {
        let mut w = BitWriter::new();
        w.u16(3);
        w.bits(0, 5).align();
        // first tables: one red fill
        w.byte(1).byte(0x00).byte(255).byte(0).byte(0);
        w.byte(0);
        w.bits(1, 4).bits(0, 4);
        w.bits(0, 1).bits(0b00100, 5).bits(1, 1); // fill1 = 1
        w.bits(1, 1).bits(1, 1).bits(7, 4).bits(1, 1);
        w.sbits(100, 9).sbits(0, 9);
        // style change with new-styles flag: second tables, one blue fill
        w.bits(0, 1).bits(0b10000, 5);
        w.byte(1).byte(0x00).byte(0).byte(0).byte(255);
        w.byte(0);
        w.bits(1, 4).bits(0, 4);
        // one more edge against the new tables (fill1 carried over as 1)
        w.bits(1, 1).bits(1, 1).bits(7, 4).bits(1, 1);
        w.sbits(0, 9).sbits(100, 9);
        w.bits(0, 1).bits(0, 5);

        let shape = decode_shape(&w.finish(), ShapeVersion::V2).unwrap();
        assert_eq!(shape.batches.len(), 2);
        assert_eq!(shape.batches[0].fills[&1].len(), 1);
        assert_eq!(shape.batches[1].fills[&1].len(), 1);
        assert_eq!(
            shape.batches[1].fill_styles[0],
            FillStyle::Solid(crate::types::Rgba {
                r: 0,
                g: 0,
                b: 255,
                a: 255
            })
        );
    }

    #[test]
    fn truncated_stream_terminates_cleanly() {
        let mut payload = red_square_payload();
        payload.truncate(payload.len() - 3);
        let shape = decode_shape(&payload, ShapeVersion::V2).unwrap();
        assert_eq!(shape.batches.len(), 1);
    }
}
