use crate::error::Result;
use crate::logo::ImageDecoder;
use crate::matrix::{EcLevel, MatrixEncoder, ModuleMatrix, QrEncoder};
use crate::orchestrator::DEFAULT_MARGIN;
use crate::raster::{RasterRenderer, Surface};
use crate::style::StyleConfig;
use crate::vector::VectorRenderer;

use futures::executor::block_on;
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/*---- Utilities ----*/

fn encode(content: &str, level: Option<EcLevel>) -> Result<ModuleMatrix> {
    Ok(QrEncoder.encode(content, level.unwrap_or_default(), DEFAULT_MARGIN)?)
}

fn render_surface(content: &str, style: Option<&StyleConfig>, level: Option<EcLevel>) -> Result<Surface> {
    let matrix = encode(content, level)?;
    let default_style = StyleConfig::default();
    let style = style.unwrap_or(&default_style);
    Ok(block_on(RasterRenderer::default().render_with_logo(&matrix, style, &ImageDecoder))?)
}

// Resolves `<directory>/<filename>.<extension>`, creating the directory if needed.
// The directory defaults to "generated" and the filename to a timestamp.
fn output_path(directory: Option<&str>, filename: Option<&str>, extension: &str) -> Result<PathBuf> {
    let directory = directory.unwrap_or("generated");
    let filename = match filename {
        Some(name) => name.to_string(),
        None => {
            let since_the_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
            format!("qr_{}", since_the_epoch.as_millis())
        }
    };

    if !Path::new(directory).exists() {
        fs::create_dir_all(directory)?;
    }
    Ok(Path::new(directory).join(format!("{}.{}", filename, extension)))
}

/// Renders a matrix as text, two characters per module.
pub fn to_ascii(matrix: &ModuleMatrix) -> String {
    let size = matrix.size();
    let mut result = String::with_capacity(size * (size * 2 + 1));
    for row in 0..size {
        for col in 0..size {
            let c = if matrix.is_dark(row, col) { '█' } else { ' ' };
            result.push(c);
            result.push(c);
        }
        result.push('\n');
    }
    result
}

/// Prints the given matrix to the console.
pub fn print_qr(matrix: &ModuleMatrix) {
    println!("{}", to_ascii(matrix));
}

/// Generates a styled QR Code SVG document from the provided content.
///
/// # Arguments
///
/// * `content` - The content to encode into the QR Code.
/// * `style` - Optional. Shapes, colors, size and logo. Defaults to [`StyleConfig::default`].
/// * `level` - Optional. Error correction level. Defaults to Medium.
///
/// # Errors
///
/// Returns an [`Error::Encode`](crate::error::Error::Encode) if the content does not fit at the requested level.
///
/// # Example
///
/// ```
/// use qirust_style::helper::generate_svg_string;
///
/// let svg_string = generate_svg_string("Hello, World!", None, None).unwrap();
/// assert!(svg_string.contains("<svg"));
/// ```
pub fn generate_svg_string(content: &str, style: Option<&StyleConfig>, level: Option<EcLevel>) -> Result<String> {
    let matrix = encode(content, level)?;
    let default_style = StyleConfig::default();
    Ok(VectorRenderer.render_to_document(&matrix, style.unwrap_or(&default_style))?)
}

/// Generates a styled QR Code image buffer from the provided content.
///
/// A logo that cannot be decoded is left out; the code itself is still returned.
///
/// # Example
///
/// ```
/// use qirust_style::helper::generate_image_buffer;
/// use qirust_style::style::StyleConfig;
///
/// let style = StyleConfig::default().with_target_size(128);
/// let img_buffer = generate_image_buffer("Hello, World!", Some(&style), None).unwrap();
/// assert_eq!(img_buffer.dimensions(), (128, 128));
/// ```
pub fn generate_image_buffer(content: &str, style: Option<&StyleConfig>, level: Option<EcLevel>) -> Result<RgbaImage> {
    Ok(render_surface(content, style, level)?.to_rgba_image())
}

/// Generates a styled QR Code and returns it PNG-encoded.
pub fn generate_png_bytes(content: &str, style: Option<&StyleConfig>, level: Option<EcLevel>) -> Result<Vec<u8>> {
    Ok(render_surface(content, style, level)?.encode_png()?)
}

/// Generates a styled QR Code image and saves it as a PNG file.
///
/// # Arguments
///
/// * `content` - The content to encode into the QR Code.
/// * `style` - Optional. Defaults to [`StyleConfig::default`].
/// * `level` - Optional. Error correction level. Defaults to Medium.
/// * `directory` - Optional. The directory path where the image will be saved. If not provided, the default directory is "generated".
/// * `filename` - Optional. The file name without extension. If not provided, a timestamp-based filename will be used.
///
/// # Returns
///
/// The path of the written file.
///
/// # Example
///
/// ```no_run
/// use qirust_style::helper::save_png;
///
/// let path = save_png("Hello, World!", None, None, Some("images"), Some("qr_code")).unwrap();
/// println!("saved to {}", path.display());
/// ```
pub fn save_png(
    content: &str,
    style: Option<&StyleConfig>,
    level: Option<EcLevel>,
    directory: Option<&str>,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let bytes = generate_png_bytes(content, style, level)?;
    let path = output_path(directory, filename, "png")?;
    fs::write(&path, bytes)?;
    log::info!("saved QR code to {}", path.display());
    Ok(path)
}

/// Generates a styled QR Code document and saves it as an SVG file.
///
/// Arguments and defaults match [`save_png`].
pub fn save_svg(
    content: &str,
    style: Option<&StyleConfig>,
    level: Option<EcLevel>,
    directory: Option<&str>,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let document = generate_svg_string(content, style, level)?;
    let path = output_path(directory, filename, "svg")?;
    fs::write(&path, document)?;
    log::info!("saved QR code to {}", path.display());
    Ok(path)
}
