//! Vector (SVG) backend.
//!
//! Mirrors the raster backend in a fixed internal coordinate space of
//! [`MODULE_UNITS`] per module. The document's `viewBox` covers the whole
//! matrix while `width`/`height` equal the target size, so proportions match
//! the raster output at any size.
//!
//! Star modules have no vector rendition here and are emitted as squares.
//! [`backend_mismatches`] reports this for a given style.

use std::fmt;
use std::fmt::Write as _;

use crate::error::RenderError;
use crate::finder::FINDER_CORNERS;
use crate::matrix::ModuleMatrix;
use crate::shape::{eye_geometry, logo_layout, module_shape, Shape};
use crate::style::{Color, ColorSource, ModuleShape, StyleConfig};

/// Logical edge of one module in document units.
pub const MODULE_UNITS: f32 = 10.0;

const GRADIENT_ID: &str = "qr-gradient";

/// A style feature the vector backend approximates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BackendMismatch {
    /// Star modules are drawn as plain squares.
    StarModulesAsSquares { spikes: usize },
}

impl fmt::Display for BackendMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMismatch::StarModulesAsSquares { spikes } => {
                write!(f, "{}-spike star modules are exported as squares", spikes)
            }
        }
    }
}

/// Lists where the vector output of `style` differs from the raster output.
pub fn backend_mismatches(style: &StyleConfig) -> Vec<BackendMismatch> {
    match style.module_shape {
        ModuleShape::Star(spikes) => vec![BackendMismatch::StarModulesAsSquares {
            spikes: spikes.count(),
        }],
        _ => Vec::new(),
    }
}

/// The module shape actually drawn by this backend.
pub fn vector_module_shape(shape: ModuleShape) -> ModuleShape {
    match shape {
        ModuleShape::Star(_) => ModuleShape::Square,
        other => other,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct VectorRenderer;

impl VectorRenderer {
    /// Returns a self-contained SVG document.
    /// The string always uses Unix newlines (\n), regardless of the platform.
    pub fn render_to_document(&self, matrix: &ModuleMatrix, style: &StyleConfig) -> Result<String, RenderError> {
        style.validate()?;
        for mismatch in backend_mismatches(style) {
            log::warn!("vector export approximation: {}", mismatch);
        }

        let view = fmt_num(matrix.size() as f32 * MODULE_UNITS);
        let mut svg = String::new();
        svg += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
        let _ = writeln!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{0}\" height=\"{0}\" viewBox=\"0 0 {1} {1}\" stroke=\"none\">",
            style.target_size, view
        );

        if let ColorSource::Gradient { start, end, .. } = style.colors {
            let _ = writeln!(
                svg,
                "\t<defs><linearGradient id=\"{0}\" gradientUnits=\"userSpaceOnUse\" x1=\"0\" y1=\"0\" x2=\"{2}\" y2=\"{2}\"><stop offset=\"0\" {1}/><stop offset=\"1\" {3}/></linearGradient></defs>",
                GRADIENT_ID,
                paint_attrs("stop-color", "stop-opacity", start),
                view,
                paint_attrs("stop-color", "stop-opacity", end),
            );
        }
        let background = paint_attrs("fill", "fill-opacity", style.colors.background());
        let _ = writeln!(svg, "\t<rect width=\"100%\" height=\"100%\" {}/>", background);

        let fill = match style.colors {
            ColorSource::Solid { foreground, .. } => paint_attrs("fill", "fill-opacity", foreground),
            ColorSource::Gradient { .. } => format!("fill=\"url(#{})\"", GRADIENT_ID),
        };

        let shape = vector_module_shape(style.module_shape);
        let mut batched = String::new();
        for (row, col) in matrix.data_modules() {
            match module_shape(shape, col as f32 * MODULE_UNITS, row as f32 * MODULE_UNITS, MODULE_UNITS) {
                batchable @ (Shape::Rect(_) | Shape::Polygon(_)) => push_path(&mut batched, &batchable, false),
                single => {
                    svg.push('\t');
                    svg += &element(&single, &fill);
                    svg.push('\n');
                }
            }
        }
        if !batched.is_empty() {
            let _ = writeln!(svg, "\t<path d=\"{}\" {}/>", batched, fill);
        }

        for corner in FINDER_CORNERS {
            let (row, col) = matrix.finder_origin(corner);
            let eye = eye_geometry(style.eye_shape, col as f32 * MODULE_UNITS, row as f32 * MODULE_UNITS, MODULE_UNITS);
            let mut ring = String::new();
            push_path(&mut ring, &eye.ring.outer, false);
            push_path(&mut ring, &eye.ring.hole, true);
            let _ = writeln!(svg, "\t<path d=\"{}\" fill-rule=\"evenodd\" {}/>", ring, fill);
            let mut pupil = String::new();
            push_path(&mut pupil, &eye.pupil, false);
            let _ = writeln!(svg, "\t<path d=\"{}\" {}/>", pupil, fill);
        }

        if let Some(logo) = &style.logo {
            let layout = logo_layout(matrix.size() as f32 * MODULE_UNITS, style.eye_shape, logo.frame);
            if let Some(zone) = &layout.clear_zone {
                let _ = writeln!(svg, "\t{}", element(zone, &background));
            }
            let _ = writeln!(
                svg,
                "\t<image href=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\"/>",
                escape_attr(&logo.source.to_data_uri()),
                fmt_num(layout.logo.x),
                fmt_num(layout.logo.y),
                fmt_num(layout.logo.width),
                fmt_num(layout.logo.height)
            );
        }

        svg += "</svg>\n";
        log::debug!(
            "assembled {}-byte vector document for a {}-module matrix",
            svg.len(),
            matrix.size()
        );
        Ok(svg)
    }
}

/// `fill="#rrggbb"`, plus an opacity attribute for translucent colors.
fn paint_attrs(color_attr: &str, opacity_attr: &str, color: Color) -> String {
    let rgb = Color { a: 255, ..color }.to_hex();
    if color.a == 255 {
        format!("{}=\"{}\"", color_attr, rgb)
    } else {
        format!("{}=\"{}\" {}=\"{}\"", color_attr, rgb, opacity_attr, fmt_num(color.a as f32 / 255.0))
    }
}

/// A standalone element for a shape.
fn element(shape: &Shape, fill: &str) -> String {
    match shape {
        Shape::Rect(r) => format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {}/>",
            fmt_num(r.x),
            fmt_num(r.y),
            fmt_num(r.width),
            fmt_num(r.height),
            fill
        ),
        Shape::RoundRect { rect: r, radius } => format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" {}/>",
            fmt_num(r.x),
            fmt_num(r.y),
            fmt_num(r.width),
            fmt_num(r.height),
            fmt_num(*radius),
            fill
        ),
        Shape::Circle { center, radius } => format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" {}/>",
            fmt_num(center.x),
            fmt_num(center.y),
            fmt_num(*radius),
            fill
        ),
        Shape::Polygon(_) => {
            let mut d = String::new();
            push_path(&mut d, shape, false);
            format!("<path d=\"{}\" {}/>", d, fill)
        }
    }
}

/// Appends one closed subpath. `reverse` flips the winding, used for holes.
fn push_path(d: &mut String, shape: &Shape, reverse: bool) {
    match shape {
        Shape::Rect(r) => {
            let (x, y, w, h) = (fmt_num(r.x), fmt_num(r.y), fmt_num(r.width), fmt_num(r.height));
            let (nw, nh) = (fmt_num(-r.width), fmt_num(-r.height));
            if reverse {
                let _ = write!(d, "M{},{}v{}h{}v{}z", x, y, h, w, nh);
            } else {
                let _ = write!(d, "M{},{}h{}v{}h{}z", x, y, w, h, nw);
            }
        }
        Shape::RoundRect { rect, radius } => {
            let r = radius.clamp(0.0, rect.width.min(rect.height) / 2.0);
            let (run_x, run_y) = (rect.width - 2.0 * r, rect.height - 2.0 * r);
            let arc = |sweep: u8, dx: f32, dy: f32| {
                format!("a{0},{0} 0 0 {1} {2},{3}", fmt_num(r), sweep, fmt_num(dx), fmt_num(dy))
            };
            let _ = write!(d, "M{},{}", fmt_num(rect.x + r), fmt_num(rect.y));
            if reverse {
                let _ = write!(
                    d,
                    "{}v{}{}h{}{}v{}{}z",
                    arc(0, -r, r),
                    fmt_num(run_y),
                    arc(0, r, r),
                    fmt_num(run_x),
                    arc(0, r, -r),
                    fmt_num(-run_y),
                    arc(0, -r, -r)
                );
            } else {
                let _ = write!(
                    d,
                    "h{}{}v{}{}h{}{}v{}{}z",
                    fmt_num(run_x),
                    arc(1, r, r),
                    fmt_num(run_y),
                    arc(1, -r, r),
                    fmt_num(-run_x),
                    arc(1, -r, -r),
                    fmt_num(-run_y),
                    arc(1, r, -r)
                );
            }
        }
        Shape::Circle { center, radius } => {
            let sweep = if reverse { 0 } else { 1 };
            let r = fmt_num(*radius);
            let _ = write!(
                d,
                "M{},{}a{2},{2} 0 1 {3} {4},0a{2},{2} 0 1 {3} {5},0z",
                fmt_num(center.x - radius),
                fmt_num(center.y),
                r,
                sweep,
                fmt_num(2.0 * radius),
                fmt_num(-2.0 * radius)
            );
        }
        Shape::Polygon(points) => {
            let ordered: Vec<_> = if reverse {
                points.iter().rev().collect()
            } else {
                points.iter().collect()
            };
            for (i, p) in ordered.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                let _ = write!(d, "{}{},{}", cmd, fmt_num(p.x), fmt_num(p.y));
            }
            if !ordered.is_empty() {
                d.push('z');
            }
        }
    }
}

/// Formats a coordinate with at most three decimals and no trailing zeros.
fn fmt_num(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let text = format!("{:.3}", rounded);
        text.trim_end_matches('0').to_string()
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logo::tests::png_bytes;
    use crate::logo::LogoSource;
    use crate::matrix::{EcLevel, MatrixEncoder, QrEncoder};
    use crate::style::{EyeShape, Logo, StarSpikes};

    fn url_matrix() -> ModuleMatrix {
        QrEncoder.encode("https://example.com", EcLevel::Medium, 4).unwrap()
    }

    fn black_on_white() -> StyleConfig {
        StyleConfig::default().with_colors(ColorSource::Solid {
            foreground: Color::BLACK,
            background: Color::WHITE,
        })
    }

    #[test]
    fn formats_numbers_compactly() {
        assert_eq!(fmt_num(10.0), "10");
        assert_eq!(fmt_num(4.25), "4.25");
        assert_eq!(fmt_num(-0.0), "0");
        assert_eq!(fmt_num(1.0 / 3.0), "0.333");
        assert_eq!(fmt_num(-70.0), "-70");
    }

    #[test]
    fn declares_size_and_view_box() {
        let matrix = url_matrix();
        let svg = VectorRenderer.render_to_document(&matrix, &black_on_white()).unwrap();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("width=\"256\" height=\"256\""));
        assert!(svg.contains("viewBox=\"0 0 330 330\""));
        assert!(svg.contains("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn squares_are_batched_into_one_path() {
        let matrix = url_matrix();
        let svg = VectorRenderer.render_to_document(&matrix, &black_on_white()).unwrap();
        // One module path, then a ring and a pupil per eye.
        assert_eq!(svg.matches("<path ").count(), 1 + 2 * 3);
        assert_eq!(svg.matches("fill-rule=\"evenodd\"").count(), 3);
        assert!(svg.contains("<path d=\"M40,40h70v70h-70zM50,50v50h50v-50z\" fill-rule=\"evenodd\" fill=\"#000000\"/>"));
        assert!(svg.contains("<path d=\"M60,60h30v30h-30z\" fill=\"#000000\"/>"));
    }

    #[test]
    fn circles_are_emitted_individually() {
        let matrix = url_matrix();
        let style = black_on_white().with_module_shape(ModuleShape::Circle);
        let svg = VectorRenderer.render_to_document(&matrix, &style).unwrap();
        assert_eq!(svg.matches("<circle ").count(), matrix.data_modules().count());
        assert!(svg.contains(" r=\"4.25\""));
    }

    #[test]
    fn rounded_modules_use_rect_radius() {
        let matrix = url_matrix();
        let style = black_on_white().with_module_shape(ModuleShape::Rounded);
        let svg = VectorRenderer.render_to_document(&matrix, &style).unwrap();
        assert_eq!(svg.matches(" rx=\"3\"").count(), matrix.data_modules().count());
    }

    #[test]
    fn stars_fall_back_to_squares_and_say_so() {
        let matrix = url_matrix();
        let star = black_on_white().with_module_shape(ModuleShape::Star(StarSpikes::Five));
        assert_eq!(
            backend_mismatches(&star),
            vec![BackendMismatch::StarModulesAsSquares { spikes: 5 }]
        );
        assert!(backend_mismatches(&black_on_white()).is_empty());
        assert_eq!(
            VectorRenderer.render_to_document(&matrix, &star).unwrap(),
            VectorRenderer.render_to_document(&matrix, &black_on_white()).unwrap()
        );
    }

    #[test]
    fn gradient_is_declared_once_and_used_everywhere() {
        let matrix = url_matrix();
        let style = black_on_white().with_colors(ColorSource::Gradient {
            start: Color::rgb(0x00, 0x78, 0xd4),
            end: Color::rgb(0x00, 0xa1, 0xf1),
            background: Color::WHITE,
        });
        let svg = VectorRenderer.render_to_document(&matrix, &style).unwrap();
        assert_eq!(svg.matches("<linearGradient").count(), 1);
        assert!(svg.contains("gradientUnits=\"userSpaceOnUse\" x1=\"0\" y1=\"0\" x2=\"330\" y2=\"330\""));
        assert!(svg.contains("stop-color=\"#0078d4\""));
        assert!(svg.contains("stop-color=\"#00a1f1\""));
        // Module path plus both layers of all three eyes.
        assert_eq!(svg.matches("fill=\"url(#qr-gradient)\"").count(), 1 + 2 * 3);
    }

    #[test]
    fn round_eyes_use_arcs() {
        let matrix = url_matrix();
        for eye in [EyeShape::Rounded, EyeShape::Circle] {
            let svg = VectorRenderer
                .render_to_document(&matrix, &black_on_white().with_eye_shape(eye))
                .unwrap();
            assert_eq!(svg.matches("fill-rule=\"evenodd\"").count(), 3, "{:?}", eye);
            assert!(svg.contains(" 0 0 1 ") || svg.contains(" 0 1 1 "), "{:?}", eye);
        }
        let svg = VectorRenderer
            .render_to_document(&matrix, &black_on_white().with_eye_shape(EyeShape::Circle))
            .unwrap();
        // Outer ring of the top-left eye, centered at (75, 75).
        assert!(svg.contains("M40,75a35,35 0 1 1 70,0a35,35 0 1 1 -70,0z"));
        assert!(svg.contains("M50,75a25,25 0 1 0 50,0a25,25 0 1 0 -50,0z"));
    }

    #[test]
    fn logo_is_embedded_with_clear_zone() {
        let matrix = url_matrix();
        let style = black_on_white().with_logo(Some(Logo {
            source: LogoSource::Bytes(png_bytes([0, 0, 0, 255], 2)),
            frame: true,
        }));
        let svg = VectorRenderer.render_to_document(&matrix, &style).unwrap();
        assert!(svg.contains("<image href=\"data:image/png;base64,"));
        assert!(svg.contains("x=\"123.75\" y=\"123.75\" width=\"82.5\" height=\"82.5\""));
        assert!(svg.contains("<rect x=\"113.438\" y=\"113.438\" width=\"103.125\" height=\"103.125\" fill=\"#ffffff\"/>"));

        let unframed = style.clone().with_logo(Some(Logo {
            source: LogoSource::DataUri("data:image/png;base64,AAAA".to_string()),
            frame: false,
        }));
        let svg = VectorRenderer.render_to_document(&matrix, &unframed).unwrap();
        assert!(svg.contains("href=\"data:image/png;base64,AAAA\""));
        assert!(!svg.contains("<rect x="));
    }

    #[test]
    fn translucent_colors_use_opacity_attributes() {
        let style = StyleConfig::default().with_colors(ColorSource::Solid {
            foreground: Color { r: 0, g: 0, b: 0, a: 51 },
            background: Color::WHITE,
        });
        let svg = VectorRenderer.render_to_document(&url_matrix(), &style).unwrap();
        assert!(svg.contains("fill=\"#000000\" fill-opacity=\"0.2\""));
    }

    #[test]
    fn documents_are_deterministic() {
        let matrix = url_matrix();
        let style = black_on_white().with_module_shape(ModuleShape::Diamond);
        assert_eq!(
            VectorRenderer.render_to_document(&matrix, &style).unwrap(),
            VectorRenderer.render_to_document(&matrix, &style).unwrap()
        );
    }
}
