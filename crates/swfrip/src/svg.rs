//! SVG emission for decoded shapes.
//!
//! Fill layers are chained tip-to-tail into closed sub-paths; strokes stay in
//! draw order. Each fill path also carries a hairline stroke of its own
//! colour to hide the seams the fill0/fill1 edge splitting leaves between
//! adjacent regions — cosmetic only.

use std::fmt::Write as _;

use swfdata::shape::{DecodedShape, Edge, FillStyle, Gradient, LineCap, LineJoin, ShapeBatch};
use swfdata::types::{Rgba, TWIPS_PER_PIXEL};

/// Accumulates paths and gradient definitions for one document.
pub struct SvgRenderer {
    paths: String,
    defs: String,
    gradient_count: usize,
}

impl SvgRenderer {
    /// Render a decoded shape as a standalone SVG document.
    pub fn render(shape: &DecodedShape) -> String {
        let mut renderer = Self {
            paths: String::new(),
            defs: String::new(),
            gradient_count: 0,
        };
        for batch in &shape.batches {
            renderer.emit_batch(batch);
        }
        renderer.document(shape)
    }

    fn emit_batch(&mut self, batch: &ShapeBatch) {
        for (&index, edges) in &batch.fills {
            if index == 0 || edges.is_empty() {
                continue;
            }
            let Some(style) = batch.fill_styles.get(usize::from(index) - 1) else {
                continue;
            };
            let (paint, opacity) = self.fill_paint(style);
            let d = path_data(edges.clone(), true);
            let _ = writeln!(
                self.paths,
                "<path d=\"{d}\" fill=\"{paint}\" fill-opacity=\"{opacity}\" \
                 stroke=\"{paint}\" stroke-opacity=\"{opacity}\" stroke-width=\"0.05\" \
                 stroke-linecap=\"round\" stroke-linejoin=\"round\" fill-rule=\"nonzero\" />"
            );
        }

        for (&index, edges) in &batch.strokes {
            if index == 0 || edges.is_empty() {
                continue;
            }
            let Some(style) = batch.line_styles.get(usize::from(index) - 1) else {
                continue;
            };
            let d = path_data(edges.clone(), false);
            let width = (f64::from(style.width) / TWIPS_PER_PIXEL).max(1.0);
            let cap = match style.start_cap {
                LineCap::Butt => "butt",
                LineCap::Square => "square",
                LineCap::Round => "round",
            };
            let mut attrs = format!(
                "fill=\"none\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{width}\" \
                 stroke-linecap=\"{cap}\"",
                rgb(style.color),
                opacity(style.color),
            );
            match style.join {
                LineJoin::Bevel => attrs.push_str(" stroke-linejoin=\"bevel\""),
                LineJoin::Miter { limit_twips } => {
                    let _ = write!(
                        attrs,
                        " stroke-linejoin=\"miter\" stroke-miterlimit=\"{}\"",
                        f64::from(limit_twips) / TWIPS_PER_PIXEL
                    );
                }
                LineJoin::Round => attrs.push_str(" stroke-linejoin=\"round\""),
            }
            let _ = writeln!(self.paths, "<path d=\"{d}\" {attrs} />");
        }
    }

    fn fill_paint(&mut self, style: &FillStyle) -> (String, String) {
        match style {
            FillStyle::Solid(color) => (rgb(*color), opacity(*color)),
            FillStyle::Linear(gradient) => (self.define_gradient(gradient, false), "1".into()),
            FillStyle::Radial(gradient) => (self.define_gradient(gradient, true), "1".into()),
            // Bitmap fills collapse to a neutral solid; the bitmap matrix is
            // decoded but unused.
            FillStyle::Bitmap { .. } => ("#CCCCCC".into(), "1".into()),
        }
    }

    /// Register a gradient definition and return its paint reference.
    ///
    /// The gradient square spans ±16384 twips in gradient space and is
    /// placed by the style's matrix in user space.
    fn define_gradient(&mut self, gradient: &Gradient, radial: bool) -> String {
        let id = self.gradient_count;
        self.gradient_count += 1;

        let element = if radial {
            "radialGradient"
        } else {
            "linearGradient"
        };
        let geometry = if radial {
            "cx=\"0\" cy=\"0\" r=\"16384\" fx=\"0\" fy=\"0\""
        } else {
            "x1=\"-16384\" y1=\"0\" x2=\"16384\" y2=\"0\""
        };
        let m = &gradient.matrix;
        let _ = writeln!(
            self.defs,
            "<{element} id=\"grad{id}\" gradientUnits=\"userSpaceOnUse\" {geometry} \
             gradientTransform=\"matrix({},{},{},{},{},{})\">",
            m.a, m.b, m.c, m.d, m.tx, m.ty
        );
        for stop in &gradient.stops {
            let _ = writeln!(
                self.defs,
                "  <stop offset=\"{}\" stop-color=\"{}\" stop-opacity=\"{}\"/>",
                f64::from(stop.ratio) / 255.0,
                rgb(stop.color),
                opacity(stop.color),
            );
        }
        let _ = writeln!(self.defs, "</{element}>");
        format!("url(#grad{id})")
    }

    fn document(self, shape: &DecodedShape) -> String {
        let bounds = &shape.bounds;
        let width = bounds.width_px();
        let height = bounds.height_px();
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" standalone=\"no\"?>\n");
        let _ = writeln!(
            out,
            "<svg width=\"{width}\" height=\"{height}\" viewBox=\"{} {} {width} {height}\" \
             xmlns=\"http://www.w3.org/2000/svg\">",
            f64::from(bounds.x_min) / TWIPS_PER_PIXEL,
            f64::from(bounds.y_min) / TWIPS_PER_PIXEL,
        );
        if !self.defs.is_empty() {
            let _ = write!(out, "<defs>\n{}</defs>\n", self.defs);
        }
        out.push_str(&self.paths);
        out.push_str("</svg>\n");
        out
    }
}

fn rgb(c: Rgba) -> String {
    format!("rgb({},{},{})", c.r, c.g, c.b)
}

fn opacity(c: Rgba) -> String {
    format!("{}", f64::from(c.a) / 255.0)
}

/// Chain edges tip-to-tail into path data.
///
/// Pops an edge, extends while some remaining edge starts at the current tip
/// (1e-4 tolerance), then closes (fills) or breaks (strokes) and starts the
/// next sub-path from any remaining edge.
fn path_data(mut edges: Vec<Edge>, close: bool) -> String {
    let mut d = String::new();
    while !edges.is_empty() {
        let first = edges.remove(0);
        let _ = write!(d, "M {:.4} {:.4} ", first.from.x, first.from.y);
        append_segment(&mut d, &first);
        let mut tip = first.to;
        while let Some(i) = edges.iter().position(|e| e.from.approx_eq(tip)) {
            let edge = edges.remove(i);
            append_segment(&mut d, &edge);
            tip = edge.to;
        }
        if close {
            d.push_str("Z ");
        }
    }
    d
}

fn append_segment(d: &mut String, edge: &Edge) {
    match edge.control {
        Some(control) => {
            let _ = write!(
                d,
                "Q {:.4} {:.4} {:.4} {:.4} ",
                control.x, control.y, edge.to.x, edge.to.y
            );
        }
        None => {
            let _ = write!(d, "L {:.4} {:.4} ", edge.to.x, edge.to.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swfdata::types::Point;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Edge {
        Edge {
            from: Point { x: x1, y: y1 },
            to: Point { x: x2, y: y2 },
            control: None,
        }
    }

    #[test]
    fn chains_out_of_order_edges_into_one_loop() {
        // A triangle supplied out of order.
        let edges = vec![
            line(0.0, 0.0, 4.0, 0.0),
            line(2.0, 3.0, 0.0, 0.0),
            line(4.0, 0.0, 2.0, 3.0),
        ];
        let d = path_data(edges, true);
        assert_eq!(d.matches('M').count(), 1);
        assert_eq!(d.matches('Z').count(), 1);
        assert_eq!(d.matches('L').count(), 3);
    }

    #[test]
    fn disconnected_edges_start_new_subpaths() {
        let edges = vec![line(0.0, 0.0, 1.0, 0.0), line(5.0, 5.0, 6.0, 5.0)];
        let d = path_data(edges, true);
        assert_eq!(d.matches('M').count(), 2);
        assert_eq!(d.matches('Z').count(), 2);
    }

    #[test]
    fn tolerance_bridges_tiny_gaps() {
        let edges = vec![line(0.0, 0.0, 1.0, 0.0), line(1.00005, 0.0, 2.0, 0.0)];
        let d = path_data(edges, false);
        assert_eq!(d.matches('M').count(), 1);
    }

    #[test]
    fn quadratic_edges_emit_q_segments() {
        let edges = vec![Edge {
            from: Point { x: 0.0, y: 0.0 },
            to: Point { x: 2.0, y: 0.0 },
            control: Some(Point { x: 1.0, y: 1.0 }),
        }];
        let d = path_data(edges, false);
        assert!(d.contains("Q 1.0000 1.0000 2.0000 0.0000"));
    }

    #[test]
    fn solid_red_square_document() {
        use swfdata::shape::{decode_shape, ShapeVersion};

        // Fixture shared with the shape decoder tests: DefineShape2, one
        // solid red fill, 100×100-twip square.
        let shape = decode_shape(&red_square_payload(), ShapeVersion::V2).unwrap();
        let svg = SvgRenderer::render(&shape);

        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains("fill=\"rgb(255,0,0)\""));
        assert_eq!(svg.matches("L ").count(), 4);
        assert!(svg.contains("Z "));
        assert!(svg.contains("viewBox=\"0 0 5 5\""));
        assert!(!svg.contains("<defs>"));
    }

    #[test]
    fn gradient_fill_registers_a_def() {
        use swfdata::shape::{FillStyle, Gradient, GradientStop, ShapeBatch};
        use swfdata::types::{Matrix, Rect, Rgba};

        let gradient = Gradient {
            matrix: Matrix::default(),
            spread: 0,
            interpolation: 0,
            stops: vec![
                GradientStop {
                    ratio: 0,
                    color: Rgba {
                        r: 255,
                        g: 0,
                        b: 0,
                        a: 255,
                    },
                },
                GradientStop {
                    ratio: 255,
                    color: Rgba {
                        r: 0,
                        g: 0,
                        b: 255,
                        a: 127,
                    },
                },
            ],
        };
        let mut batch = ShapeBatch {
            fill_styles: vec![FillStyle::Linear(gradient)],
            ..ShapeBatch::default()
        };
        batch
            .fills
            .insert(1, vec![line(0.0, 0.0, 1.0, 0.0), line(1.0, 0.0, 0.0, 0.0)]);

        let shape = swfdata::shape::DecodedShape {
            id: 1,
            bounds: Rect {
                x_min: 0,
                x_max: 20,
                y_min: 0,
                y_max: 20,
            },
            batches: vec![batch],
        };
        let svg = SvgRenderer::render(&shape);
        assert!(svg.contains("<defs>"));
        assert!(svg.contains("<linearGradient id=\"grad0\""));
        assert!(svg.contains("fill=\"url(#grad0)\""));
        assert!(svg.contains("offset=\"1\""));
        assert!(svg.contains("stop-opacity=\"0.49"));
    }

    /// Same fixture as `swfdata::shape::tests::red_square_payload`.
    fn red_square_payload() -> Vec<u8> {
        struct W {
            bytes: Vec<u8>,
            bit: u8,
        }
        impl W {
            fn bits(&mut self, value: u32, n: u32) -> &mut Self {
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
            fn sbits(&mut self, value: i32, n: u32) -> &mut Self {
                self.bits(value as u32 & ((1u32 << n) - 1), n)
            }
            fn byte(&mut self, v: u8) -> &mut Self {
                self.bit = 0;
                self.bytes.push(v);
                self
            }
        }

        let mut w = W {
            bytes: vec![1, 0], // character id
            bit: 0,
        };
        w.bits(8, 5)
            .sbits(0, 8)
            .sbits(100, 8)
            .sbits(0, 8)
            .sbits(100, 8);
        w.byte(1).byte(0x00).byte(255).byte(0).byte(0);
        w.byte(0);
        w.bits(1, 4).bits(0, 4);
        w.bits(0, 1).bits(0b00101, 5);
        w.bits(1, 5).sbits(0, 1).sbits(0, 1);
        w.bits(1, 1);
        for (dx, dy) in [(100, 0), (0, 100), (-100, 0), (0, -100)] {
            w.bits(1, 1).bits(1, 1).bits(7, 4).bits(1, 1);
            w.sbits(dx, 9).sbits(dy, 9);
        }
        w.bits(0, 1).bits(0, 5);
        w.bytes.clone()
    }
}
