//! Scalar values with a clamping range and a derived slider step.

use serde::{Deserialize, Serialize};

/// Width of a slider track in pixels; one pixel of travel is one step.
pub const DEFAULT_TRACK_LENGTH_PX: f64 = 150.0;

/// Step size for a range rendered on a track of `track_length_px` pixels.
pub fn step_for(min: f64, max: f64, track_length_px: f64) -> f64 {
    if track_length_px <= 0.0 {
        return 0.0;
    }
    ((max - min) / track_length_px).max(0.0)
}

/// Lenient parse for interactive numeric fields: anything that is not a
/// finite number reads as 0.
pub fn sanitize_input(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Same policy as [`sanitize_input`] for values that are already numbers.
pub fn sanitize_value(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// A value that always lies inside `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundedValue {
    value: f64,
    min: f64,
    max: f64,
    step: f64,
    track_length_px: f64,
}

impl BoundedValue {
    pub fn new(value: f64, min: f64, max: f64, track_length_px: f64) -> Self {
        let min = sanitize_value(min);
        let max = sanitize_value(max).max(min);
        let mut bounded = Self {
            value: min,
            min,
            max,
            step: 0.0,
            track_length_px,
        };
        bounded.recompute_step();
        bounded.set(value);
        bounded
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn track_length_px(&self) -> f64 {
        self.track_length_px
    }

    /// Writes `value`, clamped into range. Returns the stored value.
    pub fn set(&mut self, value: f64) -> f64 {
        self.value = sanitize_value(value).clamp(self.min, self.max);
        self.value
    }

    /// Moves the lower bound. A lower bound above `max` drags `max` with it.
    pub fn set_min(&mut self, min: f64) {
        let min = sanitize_value(min);
        self.min = min;
        if self.max < min {
            self.max = min;
        }
        self.after_bounds_change();
    }

    /// Moves the upper bound. An upper bound below `min` drags `min` with it.
    pub fn set_max(&mut self, max: f64) {
        let max = sanitize_value(max);
        self.max = max;
        if self.min > max {
            self.min = max;
        }
        self.after_bounds_change();
    }

    pub fn set_bounds(&mut self, min: f64, max: f64) {
        let min = sanitize_value(min);
        self.min = min;
        self.max = sanitize_value(max).max(min);
        self.after_bounds_change();
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn recompute_step(&mut self) {
        self.step = step_for(self.min, self.max, self.track_length_px);
    }

    /// Position of the value along the range, 0.0 at `min` and 1.0 at `max`.
    pub fn fraction(&self) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            0.0
        } else {
            (self.value - self.min) / span
        }
    }

    fn after_bounds_change(&mut self) {
        self.value = self.value.clamp(self.min, self.max);
        self.recompute_step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_writes_clamp() {
        let mut value = BoundedValue::new(100.0, 0.0, 1500.0, DEFAULT_TRACK_LENGTH_PX);
        assert_eq!(value.set(2000.0), 1500.0);
        assert_eq!(value.set(-5.0), 0.0);
        assert_eq!(value.set(f64::NAN), 0.0);
    }

    #[test]
    fn test_step_follows_bounds() {
        let mut value = BoundedValue::new(1.0, 0.0, 2.0, DEFAULT_TRACK_LENGTH_PX);
        assert!((value.step() - 2.0 / 150.0).abs() < 1e-12);
        value.set_max(3.0);
        assert!((value.step() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_bound_moves_clamp_value() {
        let mut value = BoundedValue::new(100.0, 0.0, 1500.0, DEFAULT_TRACK_LENGTH_PX);
        value.set_min(200.0);
        assert_eq!(value.value(), 200.0);
        value.set_max(150.0);
        assert_eq!(value.min(), 150.0);
        assert_eq!(value.max(), 150.0);
        assert_eq!(value.value(), 150.0);
        assert_eq!(value.step(), 0.0);
    }

    #[test]
    fn test_invariant_holds_across_mutations() {
        let mut value = BoundedValue::new(5.0, 0.0, 10.0, DEFAULT_TRACK_LENGTH_PX);
        let writes = [-3.0, 4.0, 12.0, 7.5, f64::INFINITY];
        for (index, write) in writes.iter().enumerate() {
            value.set(*write);
            if index % 2 == 0 {
                value.set_min(value.min() + 1.0);
            } else {
                value.set_max(value.max() - 1.0);
            }
            assert!(value.contains(value.value()));
        }
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input("42.5"), 42.5);
        assert_eq!(sanitize_input(" 7 "), 7.0);
        assert_eq!(sanitize_input("abc"), 0.0);
        assert_eq!(sanitize_input(""), 0.0);
        assert_eq!(sanitize_input("NaN"), 0.0);
        assert_eq!(sanitize_input("inf"), 0.0);
    }
}
