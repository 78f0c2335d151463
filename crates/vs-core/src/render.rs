//! Headless grid painter.
//!
//! Every `paint` is a full repaint into a display list: a background square
//! per cell, then a labelled disc per labelled entity. Nothing is carried
//! between frames except the label → colour cache, so painting the same grid
//! twice gives identical frames.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::level::Grid;

const MIN_CELL_PX: u32 = 8;
/// Keeps pixel extents of a `MAX_CELLS`-wide grid inside `u32`.
const MAX_CELL_PX: u32 = 256;
const LABEL_CHARS: usize = 4;
const GRID_FILL: Rgb = Rgb::new(0x17, 0x17, 0x1f);
const GRID_OUTLINE: Rgb = Rgb::new(0x2a, 0x2a, 0x33);

/// Anything drawn on the grid under a short name.
pub trait Labeled {
    fn label(&self) -> &str;
}

impl Labeled for String {
    fn label(&self) -> &str {
        self
    }
}

impl Labeled for &str {
    fn label(&self) -> &str {
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// HSL with all components in `[0, 1]`.
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                return p + (q - p) * 6.0 * t;
            }
            if t < 0.5 {
                return q;
            }
            if t < 2.0 / 3.0 {
                return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
            }
            p
        }

        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                hue_to_rgb(p, q, h + 1.0 / 3.0),
                hue_to_rgb(p, q, h),
                hue_to_rgb(p, q, h - 1.0 / 3.0),
            )
        };
        let to_u8 = |c: f64| (c * 255.0) as u8;
        Self::new(to_u8(r), to_u8(g), to_u8(b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Shape {
    Rect {
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        fill: Rgb,
        outline: Rgb,
    },
    Disc {
        cx: f32,
        cy: f32,
        radius: f32,
        fill: Rgb,
        label: String,
    },
}

/// One painted frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Frame {
    pub rows: usize,
    pub cols: usize,
    pub width_px: u32,
    pub height_px: u32,
    pub shapes: Vec<Shape>,
    #[serde(skip)]
    text_cells: Vec<Option<String>>,
}

impl Frame {
    /// Plain character rendering: one 4-wide column per cell, `.` for empty.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for row in self.text_cells.chunks(self.cols.max(1)) {
            let line: Vec<String> = row
                .iter()
                .map(|cell| format!("{:<width$}", cell.as_deref().unwrap_or("."), width = LABEL_CHARS))
                .collect();
            out.push_str(line.join(" ").trim_end());
            out.push('\n');
        }
        out
    }

    pub fn discs(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Disc { label, fill, .. } => Some((label.as_str(), *fill)),
            Shape::Rect { .. } => None,
        })
    }
}

#[derive(Debug)]
pub struct GridPainter {
    cell_px: u32,
    colors: HashMap<String, Rgb>,
}

impl Default for GridPainter {
    fn default() -> Self {
        Self::new(40)
    }
}

impl GridPainter {
    pub fn new(cell_px: u32) -> Self {
        Self {
            cell_px: cell_px.clamp(MIN_CELL_PX, MAX_CELL_PX),
            colors: HashMap::new(),
        }
    }

    pub fn cell_px(&self) -> u32 {
        self.cell_px
    }

    pub fn paint<T: Labeled>(&mut self, grid: &Grid<T>) -> Frame {
        let (rows, cols) = (grid.height(), grid.width());
        let px = self.cell_px;
        let mut shapes = Vec::with_capacity(rows * cols);
        let mut text_cells = vec![None; rows * cols];

        for r in 0..rows {
            for c in 0..cols {
                let (x1, y1) = (c as u32 * px, r as u32 * px);
                shapes.push(Shape::Rect {
                    x1,
                    y1,
                    x2: x1 + px,
                    y2: y1 + px,
                    fill: GRID_FILL,
                    outline: GRID_OUTLINE,
                });
            }
        }

        for (r, c, entity) in grid.occupied() {
            let label = entity.label();
            if label.is_empty() {
                continue;
            }
            let short: String = label.chars().take(LABEL_CHARS).collect();
            let center = |i: usize| i as f32 * px as f32 + px as f32 / 2.0;
            shapes.push(Shape::Disc {
                cx: center(c),
                cy: center(r),
                radius: px as f32 * 0.35,
                fill: self.color_for(label),
                label: short.clone(),
            });
            text_cells[r * cols + c].get_or_insert(short);
        }

        Frame {
            rows,
            cols,
            width_px: (cols as u32 * px).max(1),
            height_px: (rows as u32 * px).max(1),
            shapes,
            text_cells,
        }
    }

    /// Pastel colour for a label, stable for the painter's lifetime.
    pub fn color_for(&mut self, label: &str) -> Rgb {
        if let Some(hit) = self.colors.get(label) {
            return *hit;
        }
        let hue = (fnv1a(label) % 360) as f64 / 360.0;
        let color = Rgb::from_hsl(hue, 0.45, 0.72);
        self.colors.insert(label.to_string(), color);
        color
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ b as u64).wrapping_mul(0x0100_0000_01b3)
    })
}
