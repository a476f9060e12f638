//! # qirust-style
//!
//! A Rust library for rendering styled QR codes to raster images and SVG documents.
//!
//! `qirust-style` takes an encoded QR module matrix and paints it with custom
//! module shapes, finder "eye" shapes, solid or gradient colors and an optional
//! center logo. The same style produces matching output from two backends: a
//! pixel surface (PNG, `image::RgbaImage`) and a self-contained SVG string.
//!
//! ## Features
//!
//! - Module shapes: square, circle, rounded, diamond and 4/5-spike stars.
//! - Eye shapes: square, rounded and circle, drawn as one ring plus a pupil.
//! - Solid colors or a diagonal gradient spanning the whole code.
//! - Center logo with an optional clear-zone frame, decoded asynchronously.
//! - A render orchestrator that tracks readiness per backend and drops stale
//!   logo decodes.
//! - Payload builders for WiFi, vCard contacts and `mailto:` links.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qirust-style = "0.2" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Render a gradient QR code with circular eyes to SVG:
//!
//! ```rust
//! use qirust_style::helper::generate_svg_string;
//! use qirust_style::style::{Color, ColorSource, EyeShape, ModuleShape, StyleConfig};
//!
//! let style = StyleConfig::default()
//!     .with_module_shape(ModuleShape::Circle)
//!     .with_eye_shape(EyeShape::Circle)
//!     .with_colors(ColorSource::Gradient {
//!         start: Color::from_hex("#0078D4").unwrap(),
//!         end: Color::from_hex("#00A1F1").unwrap(),
//!         background: Color::WHITE,
//!     });
//! let svg = generate_svg_string("https://example.com", Some(&style), None).unwrap();
//! assert!(svg.contains("fill-rule=\"evenodd\""));
//! ```
//!
//! Drive both backends through the orchestrator:
//!
//! ```rust
//! use futures::executor::block_on;
//! use qirust_style::orchestrator::{Backend, RenderOrchestrator, RenderRequest};
//! use qirust_style::style::StyleConfig;
//!
//! let orchestrator = RenderOrchestrator::default();
//! let request = RenderRequest::new("https://example.com");
//! let style = StyleConfig::default();
//!
//! orchestrator.render_vector(&request, &style);
//! block_on(orchestrator.render_raster(&request, &style));
//! assert!(orchestrator.is_ready(Backend::Vector));
//! assert_eq!(orchestrator.surface().unwrap().width(), 256);
//! ```
//!
//! ## Modules
//!
//! - [`matrix`]: Module matrices and the encoder seam.
//! - [`finder`]: Finder zone classification.
//! - [`style`]: Style configuration, colors and palettes.
//! - [`shape`]: Backend-agnostic shape geometry.
//! - [`logo`]: Logo sources and the asynchronous decoder seam.
//! - [`raster`]: The pixel backend.
//! - [`vector`]: The SVG backend.
//! - [`orchestrator`]: Generation-guarded render orchestration.
//! - [`payload`]: Payload text builders.
//! - [`helper`]: One-shot rendering and file output.

pub mod error;
pub mod finder;
pub mod helper;
pub mod logo;
pub mod matrix;
pub mod orchestrator;
pub mod payload;
pub mod raster;
pub mod shape;
pub mod style;
pub mod vector;

pub use error::{DecodeError, EncodeError, Error, RenderError, Result};
pub use matrix::{EcLevel, MatrixEncoder, ModuleMatrix, QrEncoder};
pub use orchestrator::{Backend, RenderOrchestrator, RenderPhase, RenderRequest};
pub use raster::{RasterRenderer, Surface};
pub use style::{Color, ColorSource, EyeShape, ModuleShape, StyleConfig};
pub use vector::VectorRenderer;
