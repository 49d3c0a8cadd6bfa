//! Dot cloud standing in for the population count.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::evaluator::Color;

/// Upper bound on drawn markers.
pub const MAX_MARKERS: usize = 5000;

pub const MARKER_COLOR: &str = Color::Blue.hex();
pub const MARKER_ALPHA: f32 = 0.5;

/// 2D drawing target. Only clearing and filled circles are needed.
pub trait Surface {
    fn clear(&mut self);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: &str, alpha: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

pub struct ParticleField {
    markers: Vec<Marker>,
    width: f64,
    height: f64,
    max_markers: usize,
    rng: ChaCha8Rng,
    redraw_pending: bool,
}

impl ParticleField {
    pub fn new(width: f64, height: f64, seed: u64) -> Self {
        Self::with_limit(width, height, seed, MAX_MARKERS)
    }

    /// Field with a lower marker ceiling. Limits above [`MAX_MARKERS`] are
    /// cut down to it.
    pub fn with_limit(width: f64, height: f64, seed: u64, max_markers: usize) -> Self {
        Self {
            markers: Vec::new(),
            width,
            height,
            max_markers: max_markers.min(MAX_MARKERS),
            rng: ChaCha8Rng::seed_from_u64(seed),
            redraw_pending: false,
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn redraw_pending(&self) -> bool {
        self.redraw_pending
    }

    /// Resizes to `size` markers, clamped to `[0, max_markers]`. Returns
    /// whether the collection changed; only a change schedules a redraw.
    pub fn set_size(&mut self, size: i64) -> bool {
        let target = size.clamp(0, self.max_markers as i64) as usize;
        let current = self.markers.len();
        if target == current {
            return false;
        }
        if target < current {
            self.markers.truncate(target);
        } else {
            let radius = self.width / 40.0;
            while self.markers.len() < target {
                let marker = Marker {
                    x: self.rng.gen::<f64>() * self.width,
                    y: self.rng.gen::<f64>() * self.height,
                    radius,
                };
                self.markers.push(marker);
            }
        }
        self.redraw_pending = true;
        true
    }

    /// Draws the field if a redraw was scheduled since the last frame.
    /// Several resizes inside one frame produce a single draw.
    pub fn render_frame(&mut self, surface: &mut dyn Surface) -> bool {
        if !self.redraw_pending {
            return false;
        }
        self.redraw_pending = false;
        self.draw(surface);
        true
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        surface.clear();
        for marker in &self.markers {
            surface.fill_circle(marker.x, marker.y, marker.radius, MARKER_COLOR, MARKER_ALPHA);
        }
    }
}

/// Character-grid surface for terminals: each filled circle marks the cell
/// under its centre.
pub struct AsciiCanvas {
    width: f64,
    height: f64,
    columns: usize,
    rows: usize,
    cells: Vec<u16>,
}

impl AsciiCanvas {
    pub fn new(width: f64, height: f64, columns: usize, rows: usize) -> Self {
        Self {
            width,
            height,
            columns,
            rows,
            cells: vec![0; columns * rows],
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.columns + 1) * self.rows);
        for row in 0..self.rows {
            for column in 0..self.columns {
                let glyph = match self.cells[row * self.columns + column] {
                    0 => ' ',
                    1 => '.',
                    2..=3 => 'o',
                    _ => '@',
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

impl Surface for AsciiCanvas {
    fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = 0);
    }

    fn fill_circle(&mut self, x: f64, y: f64, _radius: f64, _color: &str, _alpha: f32) {
        if self.columns == 0 || self.rows == 0 || self.width <= 0.0 || self.height <= 0.0 {
            return;
        }
        let column = ((x / self.width) * self.columns as f64) as usize;
        let row = ((y / self.height) * self.rows as f64) as usize;
        let index = row.min(self.rows - 1) * self.columns + column.min(self.columns - 1);
        self.cells[index] = self.cells[index].saturating_add(1);
    }
}
