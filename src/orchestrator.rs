//! Render orchestration.
//!
//! [`RenderOrchestrator`] turns a [`RenderRequest`] plus a [`StyleConfig`] into
//! a finished raster surface or vector document and tracks, per backend, where
//! the latest request is:
//!
//! ```text
//! Idle -> Encoding -> EncodeFailed
//!                  -> Painting -> PaintFailed
//!                              -> Ready
//! ```
//!
//! Every request takes a fresh, monotonically increasing [`Generation`]. The
//! raster path may suspend on a logo decode; when the decode resolves, the
//! completion applies its result only if its generation is still the current
//! one for that backend. Late results from superseded requests are dropped.
//!
//! Everything runs on one thread. Shared state sits behind `Rc<RefCell<_>>`
//! and the generation check replaces any locking.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};
use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, RenderError};
use crate::logo::{ImageDecoder, LogoDecoder};
use crate::matrix::{EcLevel, MatrixEncoder, ModuleMatrix, QrEncoder};
use crate::raster::{RasterOptions, RasterRenderer, Surface};
use crate::style::StyleConfig;
use crate::vector::VectorRenderer;

/// Quiet zone used when none is specified, in modules.
pub const DEFAULT_MARGIN: usize = 4;

/// What to encode.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct RenderRequest {
    pub payload: String,
    #[serde(default)]
    pub level: EcLevel,
    #[serde(default = "default_margin")]
    pub margin: usize,
}

fn default_margin() -> usize {
    DEFAULT_MARGIN
}

impl RenderRequest {
    /// Medium error correction, four-module margin.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            level: EcLevel::Medium,
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn with_level(mut self, level: EcLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_margin(mut self, margin: usize) -> Self {
        self.margin = margin;
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Backend {
    Raster,
    Vector,
}

/// Where a backend's latest request stands.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RenderPhase {
    /// Nothing requested yet, the payload is empty, or the request was cancelled.
    Idle,
    Encoding,
    Painting,
    Ready,
    /// The payload could not be encoded; the output was cleared.
    EncodeFailed(EncodeError),
    /// Painting failed; the last good output is kept.
    PaintFailed(RenderError),
}

/// Identifies one render request. Later requests compare greater.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// How a render request ended.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Completion {
    /// The request was still current and moved its backend to this phase.
    Applied(RenderPhase),
    /// A newer request (or a cancel) took over; nothing was changed.
    Superseded,
}

/// Resolves once a raster request has finished, including any logo decode.
///
/// Dropping the ticket abandons the decode; the backend then stays in
/// [`RenderPhase::Painting`] until the next request.
#[must_use = "a render ticket does nothing unless polled"]
pub struct RenderTicket {
    generation: Generation,
    completion: LocalBoxFuture<'static, Completion>,
}

impl RenderTicket {
    fn settled(generation: Generation, completion: Completion) -> Self {
        Self {
            generation,
            completion: future::ready(completion).boxed_local(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl Future for RenderTicket {
    type Output = Completion;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Completion> {
        self.completion.poll_unpin(cx)
    }
}

struct Status {
    current: Generation,
    phase: RenderPhase,
}

impl Status {
    fn new() -> Self {
        Self {
            current: Generation(0),
            phase: RenderPhase::Idle,
        }
    }
}

struct State {
    raster: Status,
    vector: Status,
    surface: Option<Surface>,
    document: Option<String>,
    /// Last encoded request; the matrix only changes with payload, level or margin.
    matrix: Option<(RenderRequest, Rc<ModuleMatrix>)>,
}

impl State {
    fn status(&mut self, backend: Backend) -> &mut Status {
        match backend {
            Backend::Raster => &mut self.raster,
            Backend::Vector => &mut self.vector,
        }
    }

    fn clear_output(&mut self, backend: Backend) {
        match backend {
            Backend::Raster => self.surface = None,
            Backend::Vector => self.document = None,
        }
    }
}

/// Drives both backends and exposes their readiness.
///
/// Cloning is cheap; clones share state, which is how pending raster
/// completions reach back into the orchestrator.
#[derive(Clone)]
pub struct RenderOrchestrator {
    encoder: Rc<dyn MatrixEncoder>,
    decoder: Rc<dyn LogoDecoder>,
    raster: RasterRenderer,
    vector: VectorRenderer,
    next_generation: Rc<Cell<u64>>,
    state: Rc<RefCell<State>>,
}

impl Default for RenderOrchestrator {
    fn default() -> Self {
        Self::new(Rc::new(QrEncoder), Rc::new(ImageDecoder))
    }
}

impl RenderOrchestrator {
    pub fn new(encoder: Rc<dyn MatrixEncoder>, decoder: Rc<dyn LogoDecoder>) -> Self {
        Self {
            encoder,
            decoder,
            raster: RasterRenderer::default(),
            vector: VectorRenderer,
            next_generation: Rc::new(Cell::new(0)),
            state: Rc::new(RefCell::new(State {
                raster: Status::new(),
                vector: Status::new(),
                surface: None,
                document: None,
                matrix: None,
            })),
        }
    }

    pub fn with_raster_options(mut self, options: RasterOptions) -> Self {
        self.raster = RasterRenderer::new(options);
        self
    }

    pub fn phase(&self, backend: Backend) -> RenderPhase {
        self.state.borrow_mut().status(backend).phase.clone()
    }

    pub fn is_ready(&self, backend: Backend) -> bool {
        self.phase(backend) == RenderPhase::Ready
    }

    /// The generation of the latest request for `backend`.
    pub fn generation(&self, backend: Backend) -> Generation {
        self.state.borrow_mut().status(backend).current
    }

    /// Last finished raster surface.
    pub fn surface(&self) -> Option<Surface> {
        self.state.borrow().surface.clone()
    }

    /// Last finished vector document.
    pub fn document(&self) -> Option<String> {
        self.state.borrow().document.clone()
    }

    /// Supersedes any in-flight request for `backend` without starting a new one.
    pub fn cancel(&self, backend: Backend) {
        let generation = self.begin(backend);
        let mut state = self.state.borrow_mut();
        let status = state.status(backend);
        if matches!(status.phase, RenderPhase::Encoding | RenderPhase::Painting) {
            status.phase = RenderPhase::Idle;
        }
        log::debug!("cancelled {:?} render, now at generation {}", backend, generation.0);
    }

    /// Encodes and paints a vector document. Completes synchronously.
    pub fn render_vector(&self, request: &RenderRequest, style: &StyleConfig) -> Generation {
        let generation = self.begin(Backend::Vector);
        let Some(matrix) = self.prepare(Backend::Vector, generation, request) else {
            return generation;
        };
        match self.vector.render_to_document(&matrix, style) {
            Ok(document) => self.publish(Backend::Vector, generation, |state| state.document = Some(document)),
            Err(err) => self.fail_paint(Backend::Vector, generation, err),
        };
        generation
    }

    /// Encodes and paints a raster surface.
    ///
    /// Module and eye painting happen before this returns. If the style has a
    /// logo, the returned ticket resolves after the decode and compositing;
    /// otherwise it is already resolved.
    ///
    /// With a logo, the caller must drive the ticket to completion. A ticket
    /// dropped unpolled leaves the backend in [`RenderPhase::Painting`] with no
    /// surface. Use [`render_raster_spawned`](Self::render_raster_spawned) to
    /// hand the completion to an executor instead.
    pub fn render_raster(&self, request: &RenderRequest, style: &StyleConfig) -> RenderTicket {
        let generation = self.begin(Backend::Raster);
        let Some(matrix) = self.prepare(Backend::Raster, generation, request) else {
            return RenderTicket::settled(generation, Completion::Applied(self.phase(Backend::Raster)));
        };
        let surface = match self.raster.render_to_surface(&matrix, style) {
            Ok(surface) => surface,
            Err(err) => {
                let completion = self.fail_paint(Backend::Raster, generation, err);
                return RenderTicket::settled(generation, completion);
            }
        };
        let Some(logo) = &style.logo else {
            let completion = self.publish(Backend::Raster, generation, |state| state.surface = Some(surface));
            return RenderTicket::settled(generation, completion);
        };

        log::debug!("generation {} waiting on logo decode", generation.0);
        let decode = self.decoder.decode(&logo.source);
        let this = self.clone();
        let style = style.clone();
        let completion = async move {
            let decoded = decode.await;
            if !this.is_current(Backend::Raster, generation) {
                log::debug!("discarding logo decode of superseded generation {}", generation.0);
                return Completion::Superseded;
            }
            let mut surface = surface;
            match decoded {
                Ok(image) => {
                    if let Err(err) = this.raster.composite_logo(&mut surface, &image, &style) {
                        log::warn!("logo compositing failed, showing code without logo: {}", err);
                    }
                }
                Err(err) => log::warn!("logo decode failed, showing code without logo: {}", err),
            }
            this.publish(Backend::Raster, generation, |state| state.surface = Some(surface))
        };
        RenderTicket {
            generation,
            completion: completion.boxed_local(),
        }
    }

    /// Like [`render_raster`](Self::render_raster), but spawns the completion
    /// on `spawner` so readiness resolves without the caller holding a ticket.
    pub fn render_raster_spawned(
        &self,
        spawner: &impl LocalSpawn,
        request: &RenderRequest,
        style: &StyleConfig,
    ) -> Result<Generation, SpawnError> {
        let ticket = self.render_raster(request, style);
        let generation = ticket.generation();
        spawner.spawn_local(ticket.map(|_| ()))?;
        Ok(generation)
    }

    fn begin(&self, backend: Backend) -> Generation {
        let generation = Generation(self.next_generation.get() + 1);
        self.next_generation.set(generation.0);
        self.state.borrow_mut().status(backend).current = generation;
        generation
    }

    fn is_current(&self, backend: Backend, generation: Generation) -> bool {
        self.state.borrow_mut().status(backend).current == generation
    }

    /// Moves `backend` to `phase` if `generation` is still current.
    fn transition(&self, backend: Backend, generation: Generation, phase: RenderPhase) -> Completion {
        let mut state = self.state.borrow_mut();
        let status = state.status(backend);
        if status.current != generation {
            return Completion::Superseded;
        }
        log::trace!("{:?} generation {}: {:?} -> {:?}", backend, generation.0, status.phase, phase);
        status.phase = phase.clone();
        Completion::Applied(phase)
    }

    /// Encodes the request, or reuses the previous matrix if nothing changed.
    /// Returns `None` when there is nothing to paint.
    fn prepare(&self, backend: Backend, generation: Generation, request: &RenderRequest) -> Option<Rc<ModuleMatrix>> {
        if request.payload.is_empty() {
            self.state.borrow_mut().clear_output(backend);
            self.transition(backend, generation, RenderPhase::Idle);
            return None;
        }
        self.transition(backend, generation, RenderPhase::Encoding);

        let cached = self
            .state
            .borrow()
            .matrix
            .as_ref()
            .filter(|(key, _)| key == request)
            .map(|(_, matrix)| Rc::clone(matrix));
        let matrix = match cached {
            Some(matrix) => matrix,
            None => match self.encoder.encode(&request.payload, request.level, request.margin) {
                Ok(matrix) => {
                    let matrix = Rc::new(matrix);
                    self.state.borrow_mut().matrix = Some((request.clone(), Rc::clone(&matrix)));
                    matrix
                }
                Err(err) => {
                    log::warn!("{:?} generation {}: {}", backend, generation.0, err);
                    self.state.borrow_mut().clear_output(backend);
                    self.transition(backend, generation, RenderPhase::EncodeFailed(err));
                    return None;
                }
            },
        };
        log::debug!(
            "{:?} generation {}: painting {}x{} matrix",
            backend,
            generation.0,
            matrix.size(),
            matrix.size()
        );
        self.transition(backend, generation, RenderPhase::Painting);
        Some(matrix)
    }

    fn publish(&self, backend: Backend, generation: Generation, store: impl FnOnce(&mut State)) -> Completion {
        if !self.is_current(backend, generation) {
            return Completion::Superseded;
        }
        store(&mut self.state.borrow_mut());
        log::info!("{:?} output ready (generation {})", backend, generation.0);
        self.transition(backend, generation, RenderPhase::Ready)
    }

    fn fail_paint(&self, backend: Backend, generation: Generation, err: RenderError) -> Completion {
        log::warn!("{:?} generation {}: {}", backend, generation.0, err);
        self.transition(backend, generation, RenderPhase::PaintFailed(err))
    }
}
