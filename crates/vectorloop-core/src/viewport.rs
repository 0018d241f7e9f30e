use serde::{Deserialize, Serialize};

use crate::geometry::{Affine, BBox, Point};

/// Side of the square clip region installed before shapes paint, in
/// rotated device units.
pub const LOGICAL_CANVAS_SIZE: f64 = 142.5;

/// Scale from logical shape units to device units.
pub const LOGICAL_SCALE: f64 = 1.25;

/// Baseline miter limit for shape strokes.
pub const MITER_LIMIT: f64 = 4.0;

/// Maps the fixed logical coordinate space that shape data is authored in
/// onto a device surface, rotated about the surface centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalCanvas {
    /// Surface width in device pixels.
    pub device_width: f64,
    /// Surface height in device pixels.
    pub device_height: f64,
    /// Clip side length.
    pub clip_size: f64,
    /// Logical-to-device scale.
    pub scale: f64,
}

impl LogicalCanvas {
    pub fn new(device_width: f64, device_height: f64) -> Self {
        Self {
            device_width,
            device_height,
            clip_size: LOGICAL_CANVAS_SIZE,
            scale: LOGICAL_SCALE,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.device_width / 2.0, self.device_height / 2.0)
    }

    /// The rotation part of a frame: about the surface centre, in degrees.
    pub fn rotation_transform(&self, rotation_degrees: f64) -> Affine {
        Affine::IDENTITY.rotate_about(self.center(), rotation_degrees.to_radians())
    }

    /// Full logical-to-device transform for a frame rendered at `rotation_degrees`.
    pub fn frame_transform(&self, rotation_degrees: f64) -> Affine {
        self.rotation_transform(rotation_degrees)
            .scale(self.scale, self.scale)
    }

    /// Convert a logical point to device coordinates.
    pub fn logical_to_device(&self, p: &Point, rotation_degrees: f64) -> Point {
        self.frame_transform(rotation_degrees).apply(p)
    }

    /// Convert a device point to logical coordinates.
    pub fn device_to_logical(&self, p: &Point, rotation_degrees: f64) -> Option<Point> {
        self.frame_transform(rotation_degrees)
            .inverse()
            .map(|inv| inv.apply(p))
    }

    /// Clip square before rotation, in device units.
    pub fn clip_bounds(&self) -> BBox {
        BBox::new(
            Point::new(0.0, 0.0),
            Point::new(self.clip_size, self.clip_size),
        )
    }

    /// Extent of the logical space that survives the clip.
    pub fn visible_logical_bounds(&self) -> BBox {
        let side = self.clip_size / self.scale;
        BBox::new(Point::new(0.0, 0.0), Point::new(side, side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrotated_frame_is_plain_scale() {
        let canvas = LogicalCanvas::new(200.0, 200.0);
        let p = canvas.logical_to_device(&Point::new(10.0, 20.0), 0.0);
        assert!((p.x - 12.5).abs() < 1e-9);
        assert!((p.y - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_device_logical_roundtrip() {
        let canvas = LogicalCanvas::new(180.0, 120.0);
        let logical = Point::new(33.0, 71.5);
        let device = canvas.logical_to_device(&logical, 37.0);
        let back = canvas.device_to_logical(&device, 37.0).unwrap();
        assert!(back.distance_to(&logical) < 1e-9);
    }

    #[test]
    fn test_rotation_keeps_center_fixed() {
        let canvas = LogicalCanvas::new(300.0, 100.0);
        let rotation = canvas.rotation_transform(123.0);
        let c = rotation.apply(&canvas.center());
        assert!(c.distance_to(&canvas.center()) < 1e-9);
    }

    #[test]
    fn test_visible_logical_bounds() {
        let canvas = LogicalCanvas::new(200.0, 200.0);
        let bb = canvas.visible_logical_bounds();
        assert!((bb.width() - 114.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_bounds_match_visible_logical_area() {
        let canvas = LogicalCanvas::new(180.0, 180.0);
        let clip = canvas.clip_bounds();
        assert_eq!(clip.min, Point::new(0.0, 0.0));
        assert_eq!(clip.width(), LOGICAL_CANVAS_SIZE);
        assert_eq!(clip.height(), LOGICAL_CANVAS_SIZE);

        let visible = canvas.visible_logical_bounds();
        let far = canvas.logical_to_device(&visible.max, 0.0);
        assert!(far.distance_to(&clip.max) < 1e-9);
    }
}
