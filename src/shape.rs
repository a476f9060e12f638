//! Backend-agnostic geometry.
//!
//! Every module, eye and logo clear-zone is described here as a plain [`Shape`]
//! in the caller's coordinate space. The raster and vector backends each
//! translate shapes into their own drawing calls, so proportions live in one
//! place only. All measurements are relative to the module size.

use std::f32::consts::PI;

use crate::style::{EyeShape, ModuleShape};

/// Circle radius as a fraction of half the module size.
pub const CIRCLE_RATIO: f32 = 0.85;
/// Corner radius of rounded modules, as a fraction of the module size.
pub const ROUNDED_RATIO: f32 = 0.3;
/// Star outer radius, as a fraction of the module size.
pub const STAR_OUTER_RATIO: f32 = 0.55;
/// Star inner radius, as a fraction of the module size.
pub const STAR_INNER_RATIO: f32 = 0.25;
/// Corner radius of rounded eyes, as a fraction of the outer edge.
pub const EYE_ROUNDNESS: f32 = 0.3;
/// Logo edge as a fraction of the artifact edge.
pub const LOGO_RATIO: f32 = 0.25;
/// Clear-zone edge as a multiple of the logo edge.
pub const CLEAR_ZONE_RATIO: f32 = 1.25;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn square(x: f32, y: f32, side: f32) -> Self {
        Self::new(x, y, side, side)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Grows the right and bottom edges by `amount`.
    pub fn grown(&self, amount: f32) -> Self {
        Self::new(self.x, self.y, self.width + amount, self.height + amount)
    }

    /// Shrinks by `amount` on every side.
    pub fn inset(&self, amount: f32) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            self.width - 2.0 * amount,
            self.height - 2.0 * amount,
        )
    }
}

/// A filled primitive.
#[derive(Clone, PartialEq, Debug)]
pub enum Shape {
    Rect(Rect),
    RoundRect { rect: Rect, radius: f32 },
    Circle { center: Point, radius: f32 },
    /// Closed polygon, vertices in clockwise order (y pointing down).
    Polygon(Vec<Point>),
}

/// An outer shape with a same-shape hole, filled once with the even-odd rule.
#[derive(Clone, PartialEq, Debug)]
pub struct Ring {
    pub outer: Shape,
    pub hole: Shape,
}

/// One finder marker: a one-module ring around a 3×3 pupil.
#[derive(Clone, PartialEq, Debug)]
pub struct EyeGeometry {
    pub ring: Ring,
    pub pupil: Shape,
}

/// Where the logo goes and what is cleared behind it.
#[derive(Clone, PartialEq, Debug)]
pub struct LogoLayout {
    pub logo: Rect,
    pub clear_zone: Option<Shape>,
}

/// Geometry of one data module whose bounding box starts at `(x, y)`.
pub fn module_shape(shape: ModuleShape, x: f32, y: f32, size: f32) -> Shape {
    let cell = Rect::square(x, y, size);
    match shape {
        ModuleShape::Square => Shape::Rect(cell),
        ModuleShape::Circle => Shape::Circle {
            center: cell.center(),
            radius: size / 2.0 * CIRCLE_RATIO,
        },
        ModuleShape::Rounded => Shape::RoundRect {
            rect: cell,
            radius: size * ROUNDED_RATIO,
        },
        ModuleShape::Diamond => {
            let half = size / 2.0;
            Shape::Polygon(vec![
                Point::new(x + half, y),
                Point::new(x + size, y + half),
                Point::new(x + half, y + size),
                Point::new(x, y + half),
            ])
        }
        ModuleShape::Star(spikes) => Shape::Polygon(star_points(
            cell.center(),
            spikes.count(),
            size * STAR_OUTER_RATIO,
            size * STAR_INNER_RATIO,
        )),
    }
}

/// Alternating outer/inner vertices at equal angular steps, first spike up.
pub fn star_points(center: Point, spikes: usize, outer: f32, inner: f32) -> Vec<Point> {
    let step = PI / spikes as f32;
    (0..spikes * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = -PI / 2.0 + step * i as f32;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

/// Geometry of a finder marker whose 7×7 block starts at `(x, y)`.
pub fn eye_geometry(shape: EyeShape, x: f32, y: f32, module: f32) -> EyeGeometry {
    let block = Rect::square(x, y, 7.0 * module);
    let hole = block.inset(module);
    let pupil = block.inset(2.0 * module);
    match shape {
        EyeShape::Square => EyeGeometry {
            ring: Ring {
                outer: Shape::Rect(block),
                hole: Shape::Rect(hole),
            },
            pupil: Shape::Rect(pupil),
        },
        EyeShape::Rounded => {
            let radius = block.width * EYE_ROUNDNESS;
            EyeGeometry {
                ring: Ring {
                    outer: Shape::RoundRect { rect: block, radius },
                    hole: Shape::RoundRect {
                        rect: hole,
                        radius: radius - module,
                    },
                },
                pupil: Shape::RoundRect {
                    rect: pupil,
                    radius: pupil.width * EYE_ROUNDNESS,
                },
            }
        }
        EyeShape::Circle => {
            let center = block.center();
            EyeGeometry {
                ring: Ring {
                    outer: Shape::Circle {
                        center,
                        radius: block.width / 2.0,
                    },
                    hole: Shape::Circle {
                        center,
                        radius: hole.width / 2.0,
                    },
                },
                pupil: Shape::Circle {
                    center,
                    radius: pupil.width / 2.0,
                },
            }
        }
    }
}

/// Centered logo box for an artifact `canvas` units wide. A framed logo gets a
/// clear-zone whose roundness follows the eye shape.
pub fn logo_layout(canvas: f32, eye: EyeShape, frame: bool) -> LogoLayout {
    let side = canvas * LOGO_RATIO;
    let offset = (canvas - side) / 2.0;
    let logo = Rect::square(offset, offset, side);
    let clear_zone = frame.then(|| {
        let zone_side = side * CLEAR_ZONE_RATIO;
        let zone = logo.inset((side - zone_side) / 2.0);
        match eye {
            EyeShape::Square => Shape::Rect(zone),
            EyeShape::Rounded => Shape::RoundRect {
                rect: zone,
                radius: zone_side * EYE_ROUNDNESS,
            },
            EyeShape::Circle => Shape::RoundRect {
                rect: zone,
                radius: zone_side / 2.0,
            },
        }
    });
    LogoLayout { logo, clear_zone }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StarSpikes;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn circle_is_smaller_than_the_cell() {
        match module_shape(ModuleShape::Circle, 10.0, 20.0, 10.0) {
            Shape::Circle { center, radius } => {
                assert_eq!(center, Point::new(15.0, 25.0));
                assert!(close(radius, 4.25));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn diamond_uses_edge_midpoints() {
        let shape = module_shape(ModuleShape::Diamond, 0.0, 0.0, 10.0);
        assert_eq!(
            shape,
            Shape::Polygon(vec![
                Point::new(5.0, 0.0),
                Point::new(10.0, 5.0),
                Point::new(5.0, 10.0),
                Point::new(0.0, 5.0),
            ])
        );
    }

    #[test]
    fn star_alternates_radii() {
        let points = match module_shape(ModuleShape::Star(StarSpikes::Five), 0.0, 0.0, 10.0) {
            Shape::Polygon(points) => points,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(points.len(), 10);
        let dist = |p: &Point| ((p.x - 5.0).powi(2) + (p.y - 5.0).powi(2)).sqrt();
        for (i, p) in points.iter().enumerate() {
            let expected = if i % 2 == 0 { 5.5 } else { 2.5 };
            assert!(close(dist(p), expected), "vertex {} at {:?}", i, p);
        }
        // First spike points straight up.
        assert!(close(points[0].x, 5.0));
        assert!(close(points[0].y, -0.5));
    }

    #[test]
    fn four_spike_star_has_eight_vertices() {
        let shape = module_shape(ModuleShape::Star(StarSpikes::Four), 0.0, 0.0, 10.0);
        assert!(matches!(shape, Shape::Polygon(ref p) if p.len() == 8));
    }

    #[test]
    fn square_eye_rings_are_one_module_wide() {
        let eye = eye_geometry(EyeShape::Square, 40.0, 40.0, 10.0);
        assert_eq!(eye.ring.outer, Shape::Rect(Rect::new(40.0, 40.0, 70.0, 70.0)));
        assert_eq!(eye.ring.hole, Shape::Rect(Rect::new(50.0, 50.0, 50.0, 50.0)));
        assert_eq!(eye.pupil, Shape::Rect(Rect::new(60.0, 60.0, 30.0, 30.0)));
    }

    #[test]
    fn rounded_eye_hole_is_concentric() {
        let eye = eye_geometry(EyeShape::Rounded, 0.0, 0.0, 10.0);
        match (eye.ring.outer, eye.ring.hole) {
            (Shape::RoundRect { radius: outer, .. }, Shape::RoundRect { radius: hole, .. }) => {
                assert!(close(outer, 21.0));
                assert!(close(hole, 11.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn circle_eye_shares_a_center() {
        let eye = eye_geometry(EyeShape::Circle, 0.0, 0.0, 2.0);
        assert_eq!(
            eye.pupil,
            Shape::Circle {
                center: Point::new(7.0, 7.0),
                radius: 3.0,
            }
        );
    }

    #[test]
    fn logo_is_centered_and_framed_on_request() {
        let bare = logo_layout(256.0, EyeShape::Square, false);
        assert_eq!(bare.logo, Rect::new(96.0, 96.0, 64.0, 64.0));
        assert!(bare.clear_zone.is_none());

        let framed = logo_layout(256.0, EyeShape::Square, true);
        assert_eq!(framed.clear_zone, Some(Shape::Rect(Rect::new(88.0, 88.0, 80.0, 80.0))));
    }

    #[test]
    fn rounded_eyes_get_an_equally_rounded_clear_zone() {
        let eye = eye_geometry(EyeShape::Rounded, 0.0, 0.0, 10.0);
        let eye_ratio = match eye.ring.outer {
            Shape::RoundRect { rect, radius } => radius / rect.width,
            other => panic!("unexpected {:?}", other),
        };
        match logo_layout(256.0, EyeShape::Rounded, true).clear_zone {
            Some(Shape::RoundRect { rect, radius }) => {
                assert!(close(radius / rect.width, eye_ratio));
                assert!(close(radius, 24.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn circle_eyes_get_a_round_clear_zone() {
        let layout = logo_layout(256.0, EyeShape::Circle, true);
        match layout.clear_zone {
            Some(Shape::RoundRect { rect, radius }) => assert!(close(radius, rect.width / 2.0)),
            other => panic!("unexpected {:?}", other),
        }
    }
}
