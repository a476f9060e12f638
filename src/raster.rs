//! Raster backend.
//!
//! Paints a [`ModuleMatrix`] into a tiny-skia pixmap. Module and eye painting
//! is synchronous; the only asynchronous step is decoding the logo, which the
//! caller (usually the orchestrator) awaits before calling
//! [`RasterRenderer::composite_logo`].

use std::fmt;

use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use tiny_skia::{
    ColorU8, FillRule, GradientStop, LinearGradient, Paint, PathBuilder, Pixmap, PixmapPaint, SpreadMode,
    Transform,
};

use crate::error::RenderError;
use crate::finder::FINDER_CORNERS;
use crate::logo::LogoDecoder;
use crate::matrix::ModuleMatrix;
use crate::shape::{eye_geometry, logo_layout, module_shape, Ring, Shape};
use crate::style::{Color, ColorSource, StyleConfig};

/// Extra width given to square modules so neighbouring cells overlap instead
/// of leaving anti-aliased hairlines between them. Device pixels.
const SEAM_BLEED: f32 = 0.5;

/// Cubic Bézier handle length for a quarter circle of radius 1.
const KAPPA: f32 = 0.552_284_7;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RasterOptions {
    /// Device pixels per device-independent unit.
    pub density: f32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self { density: 1.0 }
    }
}

/// A painted pixel surface.
#[derive(Clone)]
pub struct Surface {
    pixmap: Pixmap,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Surface {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Straight-alpha RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width(), self.height());
        for (dst, src) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        image
    }

    /// Encodes the surface as a PNG byte stream.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        let image = self.to_rgba_image();
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
            .map_err(|err| RenderError::Export(err.to_string()))?;
        Ok(bytes)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RasterRenderer {
    options: RasterOptions,
}

impl RasterRenderer {
    pub fn new(options: RasterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> RasterOptions {
        self.options
    }

    /// Edge length in device pixels for this style.
    pub fn surface_side(&self, style: &StyleConfig) -> Result<u32, RenderError> {
        let density = self.options.density;
        if !density.is_finite() || density <= 0.0 {
            return Err(RenderError::InvalidStyle(format!("pixel density {} must be positive", density)));
        }
        let side = (style.target_size as f32 * density).round();
        if side < 1.0 || side > u32::MAX as f32 {
            return Err(RenderError::InvalidStyle(format!("surface side {} is out of range", side)));
        }
        Ok(side as u32)
    }

    /// Paints background, data modules and the three eyes. No logo.
    pub fn render_to_surface(&self, matrix: &ModuleMatrix, style: &StyleConfig) -> Result<Surface, RenderError> {
        style.validate()?;
        let side = self.surface_side(style)?;
        let mut pixmap = Pixmap::new(side, side).ok_or(RenderError::SurfaceAllocation {
            width: side,
            height: side,
        })?;
        pixmap.fill(skia_color(style.colors.background()));

        let paint = foreground_paint(&style.colors, side as f32);
        let module = side as f32 / matrix.size() as f32;

        let mut modules = PathBuilder::new();
        for (row, col) in matrix.data_modules() {
            let shape = match module_shape(style.module_shape, col as f32 * module, row as f32 * module, module) {
                Shape::Rect(rect) => Shape::Rect(rect.grown(SEAM_BLEED)),
                other => other,
            };
            append_shape(&mut modules, &shape);
        }
        if let Some(path) = modules.finish() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }

        for corner in FINDER_CORNERS {
            let (row, col) = matrix.finder_origin(corner);
            let eye = eye_geometry(style.eye_shape, col as f32 * module, row as f32 * module, module);
            fill_ring(&mut pixmap, &eye.ring, &paint);
            fill_shape(&mut pixmap, &eye.pupil, &paint);
        }

        log::debug!(
            "painted {}x{} surface for a {}-module matrix ({:?} modules, {:?} eyes)",
            side,
            side,
            matrix.size(),
            style.module_shape,
            style.eye_shape
        );
        Ok(Surface { pixmap })
    }

    /// Draws a decoded logo centered on the surface, preceded by a
    /// background-colored clear-zone when the logo is framed.
    pub fn composite_logo(&self, surface: &mut Surface, logo: &RgbaImage, style: &StyleConfig) -> Result<(), RenderError> {
        let frame = style.logo.as_ref().map_or(false, |l| l.frame);
        let layout = logo_layout(surface.width() as f32, style.eye_shape, frame);

        if let Some(zone) = &layout.clear_zone {
            let mut background = Paint::default();
            background.set_color(skia_color(style.colors.background()));
            background.anti_alias = true;
            fill_shape(&mut surface.pixmap, zone, &background);
        }

        let side = layout.logo.width.round().max(1.0) as u32;
        let scaled = imageops::resize(logo, side, side, FilterType::Triangle);
        let mut logo_pixmap = Pixmap::new(side, side).ok_or(RenderError::SurfaceAllocation {
            width: side,
            height: side,
        })?;
        for (dst, src) in logo_pixmap.pixels_mut().iter_mut().zip(scaled.pixels()) {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        surface.pixmap.draw_pixmap(
            layout.logo.x.round() as i32,
            layout.logo.y.round() as i32,
            logo_pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    /// Paints the matrix and, if configured, awaits the logo decode and
    /// composites it. A failed decode yields the surface without a logo.
    pub async fn render_with_logo(
        &self,
        matrix: &ModuleMatrix,
        style: &StyleConfig,
        decoder: &dyn LogoDecoder,
    ) -> Result<Surface, RenderError> {
        let mut surface = self.render_to_surface(matrix, style)?;
        let Some(logo) = &style.logo else {
            return Ok(surface);
        };
        match decoder.decode(&logo.source).await {
            Ok(image) => self.composite_logo(&mut surface, &image, style)?,
            Err(err) => log::warn!("logo decode failed, rendering without logo: {}", err),
        }
        Ok(surface)
    }
}

fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Foreground paint; gradients span the whole surface diagonally.
fn foreground_paint(colors: &ColorSource, side: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.anti_alias = true;
    match *colors {
        ColorSource::Solid { foreground, .. } => paint.set_color(skia_color(foreground)),
        ColorSource::Gradient { start, end, .. } => {
            let shader = LinearGradient::new(
                tiny_skia::Point::from_xy(0.0, 0.0),
                tiny_skia::Point::from_xy(side, side),
                vec![
                    GradientStop::new(0.0, skia_color(start)),
                    GradientStop::new(1.0, skia_color(end)),
                ],
                SpreadMode::Pad,
                Transform::identity(),
            );
            match shader {
                Some(shader) => paint.shader = shader,
                None => paint.set_color(skia_color(start)),
            }
        }
    }
    paint
}

fn fill_shape(pixmap: &mut Pixmap, shape: &Shape, paint: &Paint) {
    let mut builder = PathBuilder::new();
    append_shape(&mut builder, shape);
    if let Some(path) = builder.finish() {
        pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// Outer and hole in one path; even-odd leaves the hole unpainted whatever
/// the winding of either contour.
fn fill_ring(pixmap: &mut Pixmap, ring: &Ring, paint: &Paint) {
    let mut builder = PathBuilder::new();
    append_shape(&mut builder, &ring.outer);
    append_shape(&mut builder, &ring.hole);
    if let Some(path) = builder.finish() {
        pixmap.fill_path(&path, paint, FillRule::EvenOdd, Transform::identity(), None);
    }
}

fn append_shape(builder: &mut PathBuilder, shape: &Shape) {
    match shape {
        Shape::Rect(rect) => {
            if let Some(rect) = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) {
                builder.push_rect(rect);
            }
        }
        Shape::RoundRect { rect, radius } => {
            let r = radius.clamp(0.0, rect.width.min(rect.height) / 2.0);
            let k = r * KAPPA;
            let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
            builder.move_to(x + r, y);
            builder.line_to(x + w - r, y);
            builder.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
            builder.line_to(x + w, y + h - r);
            builder.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
            builder.line_to(x + r, y + h);
            builder.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
            builder.line_to(x, y + r);
            builder.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
            builder.close();
        }
        Shape::Circle { center, radius } => builder.push_circle(center.x, center.y, *radius),
        Shape::Polygon(points) => {
            let mut points = points.iter();
            if let Some(first) = points.next() {
                builder.move_to(first.x, first.y);
                for p in points {
                    builder.line_to(p.x, p.y);
                }
                builder.close();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logo::tests::png_bytes;
    use crate::logo::{ImageDecoder, LogoSource};
    use crate::matrix::{EcLevel, MatrixEncoder, QrEncoder};
    use crate::style::{EyeShape, Logo, ModuleShape, StarSpikes};
    use futures::executor::block_on;

    fn url_matrix() -> ModuleMatrix {
        QrEncoder.encode("https://example.com", EcLevel::Medium, 4).unwrap()
    }

    fn is_dark(px: [u8; 4]) -> bool {
        (px[0] as u32 + px[1] as u32 + px[2] as u32) < 3 * 128
    }

    /// Pixel at the center of grid module `(row, col)`.
    fn module_pixel(surface: &Surface, matrix: &ModuleMatrix, row: f32, col: f32) -> [u8; 4] {
        let module = surface.width() as f32 / matrix.size() as f32;
        surface.pixel((col * module) as u32, (row * module) as u32).unwrap()
    }

    fn black_on_white() -> StyleConfig {
        StyleConfig::default().with_colors(ColorSource::Solid {
            foreground: Color::BLACK,
            background: Color::WHITE,
        })
    }

    #[test]
    fn surface_size_follows_density() {
        let matrix = url_matrix();
        let style = black_on_white();
        let surface = RasterRenderer::default().render_to_surface(&matrix, &style).unwrap();
        assert_eq!((surface.width(), surface.height()), (256, 256));

        let dense = RasterRenderer::new(RasterOptions { density: 2.0 });
        let surface = dense.render_to_surface(&matrix, &style).unwrap();
        assert_eq!((surface.width(), surface.height()), (512, 512));
    }

    #[test]
    fn rejects_bad_density() {
        let renderer = RasterRenderer::new(RasterOptions { density: 0.0 });
        assert!(matches!(
            renderer.render_to_surface(&url_matrix(), &black_on_white()),
            Err(RenderError::InvalidStyle(_))
        ));
    }

    #[test]
    fn quiet_zone_is_background() {
        let surface = RasterRenderer::default().render_to_surface(&url_matrix(), &black_on_white()).unwrap();
        assert_eq!(surface.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(255, 255), Some([255, 255, 255, 255]));
    }

    #[test]
    fn rendering_is_deterministic() {
        let matrix = url_matrix();
        let style = black_on_white().with_module_shape(ModuleShape::Star(StarSpikes::Five));
        let a = RasterRenderer::default().render_to_surface(&matrix, &style).unwrap();
        let b = RasterRenderer::default().render_to_surface(&matrix, &style).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn eyes_have_ring_gap_and_pupil_for_every_shape() {
        let matrix = url_matrix();
        for eye in [EyeShape::Square, EyeShape::Rounded, EyeShape::Circle] {
            let style = black_on_white().with_eye_shape(eye);
            let surface = RasterRenderer::default().render_to_surface(&matrix, &style).unwrap();
            for corner in FINDER_CORNERS {
                let (row, col) = matrix.finder_origin(corner);
                let (row, col) = (row as f32, col as f32);
                assert!(is_dark(module_pixel(&surface, &matrix, row + 0.5, col + 3.5)), "{:?} ring", eye);
                assert!(!is_dark(module_pixel(&surface, &matrix, row + 1.5, col + 3.5)), "{:?} gap", eye);
                assert!(is_dark(module_pixel(&surface, &matrix, row + 3.5, col + 3.5)), "{:?} pupil", eye);
            }
        }
    }

    #[test]
    fn finder_modules_are_replaced_by_eyes() {
        // Every module dark: only eye geometry can leave the gap light.
        let matrix = ModuleMatrix::from_rows(&vec![vec![true; 21]; 21], 0).unwrap();
        let style = black_on_white().with_module_shape(ModuleShape::Circle);
        let surface = RasterRenderer::default().render_to_surface(&matrix, &style).unwrap();
        assert!(!is_dark(module_pixel(&surface, &matrix, 1.5, 3.5)));
        assert!(!is_dark(module_pixel(&surface, &matrix, 1.5, 17.5)));
        assert!(!is_dark(module_pixel(&surface, &matrix, 17.5, 1.5)));
        // No fourth eye: bottom-right is plain data modules.
        assert!(is_dark(module_pixel(&surface, &matrix, 19.5, 17.5)));
    }

    #[test]
    fn every_module_shape_paints_the_cell_center() {
        let matrix = ModuleMatrix::from_rows(&vec![vec![true; 21]; 21], 0).unwrap();
        for shape in [
            ModuleShape::Square,
            ModuleShape::Circle,
            ModuleShape::Rounded,
            ModuleShape::Diamond,
            ModuleShape::Star(StarSpikes::Four),
            ModuleShape::Star(StarSpikes::Five),
        ] {
            let style = black_on_white().with_module_shape(shape);
            let surface = RasterRenderer::default().render_to_surface(&matrix, &style).unwrap();
            assert!(is_dark(module_pixel(&surface, &matrix, 10.5, 10.5)), "{:?}", shape);
        }
    }

    #[test]
    fn gradient_spans_the_whole_artifact_including_eyes() {
        let matrix = url_matrix();
        let style = StyleConfig::default().with_colors(ColorSource::Gradient {
            start: Color::rgb(0x00, 0x78, 0xd4),
            end: Color::rgb(0x00, 0xa1, 0xf1),
            background: Color::WHITE,
        });
        let surface = RasterRenderer::default().render_to_surface(&matrix, &style).unwrap();
        let pupil = |corner| {
            let (row, col) = matrix.finder_origin(corner);
            module_pixel(&surface, &matrix, row as f32 + 3.5, col as f32 + 3.5)
        };
        let top_left = pupil(crate::finder::FinderCorner::TopLeft);
        let bottom_left = pupil(crate::finder::FinderCorner::BottomLeft);
        let top_right = pupil(crate::finder::FinderCorner::TopRight);
        // Green climbs 0x78 -> 0xa1 along the diagonal.
        assert!(top_left[1] > 0x78 && top_left[1] < 0xa1);
        assert!(bottom_left[1] > top_left[1]);
        assert!((bottom_left[1] as i32 - top_right[1] as i32).abs() <= 1);
        // The outer ring of one eye is not flat either.
        let (row, col) = matrix.finder_origin(crate::finder::FinderCorner::TopLeft);
        let near = module_pixel(&surface, &matrix, row as f32 + 0.5, col as f32 + 0.5);
        let far = module_pixel(&surface, &matrix, row as f32 + 6.5, col as f32 + 6.5);
        assert!(far[1] > near[1]);
    }

    #[test]
    fn framed_logo_gets_a_clear_zone() {
        let matrix = url_matrix();
        let style = black_on_white().with_logo(Some(Logo {
            source: LogoSource::Bytes(png_bytes([255, 0, 0, 255], 8)),
            frame: true,
        }));
        let surface = block_on(RasterRenderer::default().render_with_logo(&matrix, &style, &ImageDecoder)).unwrap();
        let center = surface.pixel(128, 128).unwrap();
        assert!(center[0] > 250 && center[1] < 5 && center[2] < 5, "{:?}", center);
        // Between the clear-zone edge (88) and the logo edge (96).
        for x in 89..95 {
            let px = surface.pixel(x, 128).unwrap();
            assert!(px[..3].iter().all(|&c| c > 250), "{} {:?}", x, px);
        }
    }

    #[test]
    fn failed_logo_decode_renders_without_logo() {
        let matrix = url_matrix();
        let plain = black_on_white();
        let style = plain.clone().with_logo(Some(Logo {
            source: LogoSource::Bytes(b"garbage".to_vec()),
            frame: true,
        }));
        let renderer = RasterRenderer::default();
        let with_failed_logo = block_on(renderer.render_with_logo(&matrix, &style, &ImageDecoder)).unwrap();
        let without = renderer.render_to_surface(&matrix, &plain).unwrap();
        assert_eq!(with_failed_logo.data(), without.data());
    }

    #[test]
    fn exports_png() {
        let surface = RasterRenderer::default().render_to_surface(&url_matrix(), &black_on_white()).unwrap();
        let png = surface.encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (256, 256));
        assert_eq!(decoded.as_raw(), surface.to_rgba_image().as_raw());
    }
}
