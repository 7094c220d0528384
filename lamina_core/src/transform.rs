// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transform used for layer and view matrices.
//!
//! Layer transforms arrive from the producer as full 4×4 matrices; painting
//! multiplies them by the embedder's view matrix. Only the operations the
//! compositor needs are provided: composition, point mapping, and bounding
//! boxes of mapped rectangles for damage computation.

use core::ops::Mul;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect};

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, matching the memory layout
/// GL uniform uploads expect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        #[cfg(feature = "std")]
        let (s, c) = radians.sin_cos();
        #[cfg(not(feature = "std"))]
        let (s, c) = (radians.sin(), radians.cos());
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Returns a transform that mirrors the Y axis inside a viewport of the
    /// given height.
    ///
    /// Used when the target framebuffer has a bottom-left origin.
    #[inline]
    #[must_use]
    pub const fn flip_y(height: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, -1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, height, 0.0, 1.0],
            ],
        }
    }

    /// Returns `true` if every element is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Maps a 2-D point (z = 0) through this transform, including the
    /// perspective divide.
    ///
    /// Returns `None` when the point maps to infinity (w = 0).
    #[must_use]
    pub fn map_point(&self, p: Point) -> Option<Point> {
        let c = &self.cols;
        let x = c[0][0] * p.x + c[1][0] * p.y + c[3][0];
        let y = c[0][1] * p.x + c[1][1] * p.y + c[3][1];
        let w = c[0][3] * p.x + c[1][3] * p.y + c[3][3];
        if w == 0.0 {
            return None;
        }
        Some(Point::new(x / w, y / w))
    }

    /// Returns the axis-aligned bounding box of `rect` after mapping its
    /// corners through this transform.
    ///
    /// A degenerate mapping (any corner at infinity, or a non-finite matrix)
    /// yields [`Rect::ZERO`].
    #[must_use]
    pub fn map_rect_bounds(&self, rect: Rect) -> Rect {
        if !self.is_finite() {
            return Rect::ZERO;
        }
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x0, rect.y1),
            Point::new(rect.x1, rect.y1),
        ];
        let mut out: Option<Rect> = None;
        for corner in corners {
            let Some(mapped) = self.map_point(corner) else {
                return Rect::ZERO;
            };
            out = Some(match out {
                Some(r) => r.union_pt(mapped),
                None => Rect::from_points(mapped, mapped),
            });
        }
        out.unwrap_or(Rect::ZERO)
    }

    /// Converts to a column-major `f32` array for GPU upload.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "GPU uniforms are single precision"
    )]
    pub fn to_cols_array_f32(&self) -> [f32; 16] {
        let mut out = [0.0_f32; 16];
        for (i, v) in self.cols.iter().flatten().enumerate() {
            out[i] = *v as f32;
        }
        out
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        for (j, col) in out.iter_mut().enumerate() {
            for (i, v) in col.iter_mut().enumerate() {
                *v = a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
    }

    #[test]
    fn scale_then_translate() {
        let s = Transform3d::from_scale(2.0, 2.0, 2.0);
        let t = Transform3d::from_translation(3.0, 4.0, 0.0);
        let combined = t * s;
        assert_eq!(combined.col(0), [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(combined.col(3), [3.0, 4.0, 0.0, 1.0]);
    }

    #[test]
    fn map_point_applies_translation() {
        let t = Transform3d::from_translation(10.0, -5.0, 0.0);
        assert_eq!(t.map_point(Point::new(1.0, 1.0)), Some(Point::new(11.0, -4.0)));
    }

    #[test]
    fn map_rect_bounds_covers_rotation() {
        let r = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2);
        let bounds = r.map_rect_bounds(Rect::new(0.0, 0.0, 10.0, 20.0));
        let eps = 1e-9;
        assert!((bounds.x0 + 20.0).abs() < eps, "x0 was {}", bounds.x0);
        assert!((bounds.x1 - 0.0).abs() < eps, "x1 was {}", bounds.x1);
        assert!((bounds.y0 - 0.0).abs() < eps, "y0 was {}", bounds.y0);
        assert!((bounds.y1 - 10.0).abs() < eps, "y1 was {}", bounds.y1);
    }

    #[test]
    fn flip_y_mirrors_inside_viewport() {
        let f = Transform3d::flip_y(100.0);
        assert_eq!(f.map_point(Point::new(3.0, 0.0)), Some(Point::new(3.0, 100.0)));
        assert_eq!(f.map_point(Point::new(3.0, 100.0)), Some(Point::new(3.0, 0.0)));
    }

    #[test]
    fn non_finite_maps_to_zero_rect() {
        let mut t = Transform3d::IDENTITY;
        t.cols[0][3] = f64::INFINITY;
        assert!(!t.is_finite());
        assert_eq!(t.map_rect_bounds(Rect::new(0.0, 0.0, 1.0, 1.0)), Rect::ZERO);
    }

    #[test]
    fn f32_export_is_column_major() {
        let t = Transform3d::from_translation(5.0, 6.0, 7.0);
        let arr = t.to_cols_array_f32();
        assert_eq!(&arr[12..], &[5.0, 6.0, 7.0, 1.0]);
    }
}
