use std::fmt;

use serde::Serialize;

/// Axis-aligned box in raster pixel space.
///
/// The origin is the top-left pixel and `y` grows downward. `max` bounds are
/// exclusive, so a valid box satisfies `xmin < xmax` and `ymin < ymax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PixelBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl PixelBox {
    pub const fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> i32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> i32 {
        self.ymax - self.ymin
    }

    /// Whether the box encloses at least one pixel.
    pub fn has_area(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }
}

/// Formats as a tuple, e.g. `(0, 96, 512, 128)`.
impl fmt::Display for PixelBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

/// Rectangle in normalized UV space (origin bottom-left, `v` ascending).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl UvRect {
    pub fn span(&self) -> [f64; 2] {
        [self.max[0] - self.min[0], self.max[1] - self.min[1]]
    }

    /// Express `uv` relative to this rectangle, so the rectangle maps to [0,1]².
    ///
    /// Returns `None` when either span is zero.
    pub fn normalize(&self, uv: [f32; 2]) -> Option<[f32; 2]> {
        let [du, dv] = self.span();
        if du == 0.0 || dv == 0.0 {
            return None;
        }
        Some([
            ((uv[0] as f64 - self.min[0]) / du) as f32,
            ((uv[1] as f64 - self.min[1]) / dv) as f32,
        ])
    }

    /// Smallest rectangle enclosing every point, or `None` for no points.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a [f32; 2]>) -> Option<UvRect> {
        let mut rect: Option<UvRect> = None;
        for p in points {
            let (u, v) = (p[0] as f64, p[1] as f64);
            let r = rect.get_or_insert(UvRect {
                min: [u, v],
                max: [u, v],
            });
            r.min[0] = r.min[0].min(u);
            r.min[1] = r.min[1].min(v);
            r.max[0] = r.max[0].max(u);
            r.max[1] = r.max[1].max(v);
        }
        rect
    }
}
