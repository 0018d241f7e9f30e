//! Built-in logo shapes, authored in the 142.5 × 142.5 logical canvas
//! (before the 1.25 scale).

use crate::color::Color;
use crate::geometry::Point;
use crate::shape::{procedure, PathShape, ShapeProcedure};

pub const WHITE_CIRCLE: &str = "white_circle";
pub const GRAY_CIRCLE: &str = "gray_circle";
pub const Z_LETTER: &str = "z_letter";
pub const BLUE_STRIPE: &str = "blue_stripe";

/// Shapes enabled on a fresh logo surface, in paint order.
pub const DEFAULT_ENABLED: [&str; 3] = [GRAY_CIRCLE, Z_LETTER, BLUE_STRIPE];

const GRAY: Color = Color::rgb(0x80, 0x80, 0x84);
const BLUE: Color = Color::rgb(0x00, 0xad, 0xde);

pub const WHITE_DISC: PathShape = PathShape {
    fill: Color::WHITE,
    start: Point::new(55.28, 10.35),
    curves: &[
        [68.06, 9.89, 81.01, 14.87, 89.96, 24.05],
        [98.77, 32.56, 103.79, 44.75, 103.78, 56.98],
        [103.8, 69.24, 98.76, 81.46, 89.93, 89.98],
        [79.76, 100.38, 64.42, 105.44, 50.06, 103.11],
        [37.21, 101.24, 25.37, 93.61, 18.2, 82.79],
        [10.39, 71.25, 8.17, 56.09, 12.58, 42.84],
        [18.22, 24.51, 36.1, 10.89, 55.28, 10.35],
    ],
};

pub const GRAY_DISC: PathShape = PathShape {
    fill: GRAY,
    start: Point::new(50.21, 2.27),
    curves: &[
        [63.29, 0.76, 76.92, 3.69, 87.82, 11.2],
        [101.21, 20.02, 110.29, 35.01, 111.94, 50.96],
        [113.54, 65.0, 109.46, 79.58, 100.77, 90.72],
        [90.12, 104.64, 72.54, 113.01, 54.99, 112.02],
        [31.37, 111.74, 9.53, 94.09, 3.72, 71.29],
        [0.34, 58.26, 1.63, 43.92, 7.88, 31.93],
        [15.98, 15.89, 32.33, 4.31, 50.21, 2.27],
    ],
};

pub const Z_GLYPH: PathShape = PathShape {
    fill: GRAY,
    start: Point::new(44.17, 34.64),
    curves: &[
        [39.98, 34.06, 40.23, 27.58, 44.09, 26.65],
        [51.06, 26.24, 58.05, 26.65, 65.03, 26.47],
        [67.37, 26.61, 70.24, 25.97, 72.04, 27.89],
        [74.24, 30.01, 73.17, 33.44, 71.54, 35.56],
        [65.21, 44.39, 58.83, 53.18, 52.49, 62.0],
        [57.65, 62.0, 62.8, 62.01, 67.96, 61.97],
        [69.89, 62.0, 72.12, 61.89, 73.6, 63.38],
        [75.2, 65.29, 74.73, 68.43, 72.55, 69.7],
        [70.2, 70.82, 67.49, 70.44, 64.96, 70.53],
        [58.31, 70.35, 51.65, 70.77, 45.01, 70.33],
        [42.28, 70.41, 39.98, 67.72, 40.54, 65.04],
        [41.06, 62.72, 42.72, 60.91, 44.03, 59.0],
        [49.82, 50.94, 55.6, 42.87, 61.35, 34.78],
        [55.62, 34.63, 49.89, 34.97, 44.17, 34.64],
    ],
};

pub const STRIPE: PathShape = PathShape {
    fill: BLUE,
    start: Point::new(43.26, 79.38),
    curves: &[
        [52.49, 79.09, 61.76, 79.27, 71.0, 79.29],
        [75.7, 79.32, 75.7, 87.73, 70.99, 87.73],
        [61.99, 87.78, 52.99, 87.77, 43.99, 87.73],
        [39.67, 87.62, 39.21, 80.39, 43.26, 79.38],
    ],
};

/// All logo shapes with their registry names.
///
/// The gray circle paints its white inner disc itself, so it renders as a
/// ring even when `white_circle` is not registered.
pub fn shapes() -> Vec<(&'static str, ShapeProcedure)> {
    vec![
        (WHITE_CIRCLE, WHITE_DISC.into_procedure()),
        (
            GRAY_CIRCLE,
            procedure(|ctx| {
                GRAY_DISC.paint(ctx);
                WHITE_DISC.paint(ctx);
                Ok(())
            }),
        ),
        (Z_LETTER, Z_GLYPH.into_procedure()),
        (BLUE_STRIPE, STRIPE.into_procedure()),
    ]
}
