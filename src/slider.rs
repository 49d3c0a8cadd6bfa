//! Draggable slider bound to one model parameter.
//!
//! A slider has two ways to receive a value. [`SliderWidget::set_value`] is
//! the programmatic path and never notifies. [`SliderWidget::drag_to`] is
//! the user path and always returns a [`SliderEvent::ValueChanged`]. The
//! model pushes derived values through the silent path, so a value echoed
//! back from the evaluator can never start another round of updates.

use serde::Serialize;

use crate::model::{BoundedValue, ParameterId, DEFAULT_TRACK_LENGTH_PX};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SliderEvent {
    ValueChanged { parameter: ParameterId, value: f64 },
    ScrubStart { parameter: ParameterId },
}

#[derive(Debug, Clone, Serialize)]
pub struct SliderWidget {
    /// Parameter whose bounds this slider mirrors. The model stays the owner.
    parameter: ParameterId,
    track: BoundedValue,
    step: f64,
    handle_px: f64,
    scrubbing: bool,
}

impl SliderWidget {
    pub fn new(parameter: ParameterId, min: f64, max: f64, value: f64) -> Self {
        Self::with_track(
            parameter,
            BoundedValue::new(value, min, max, DEFAULT_TRACK_LENGTH_PX),
        )
    }

    /// Builds a slider over a copy of `track`, keeping its step.
    pub fn with_track(parameter: ParameterId, track: BoundedValue) -> Self {
        let mut slider = Self {
            parameter,
            step: track.step(),
            track,
            handle_px: 0.0,
            scrubbing: false,
        };
        slider.relayout();
        slider
    }

    pub fn parameter(&self) -> ParameterId {
        self.parameter
    }

    pub fn min(&self) -> f64 {
        self.track.min()
    }

    pub fn max(&self) -> f64 {
        self.track.max()
    }

    pub fn value(&self) -> f64 {
        self.track.value()
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn set_min(&mut self, min: f64) -> &mut Self {
        self.track.set_min(min);
        self.relayout();
        self
    }

    pub fn set_max(&mut self, max: f64) -> &mut Self {
        self.track.set_max(max);
        self.relayout();
        self
    }

    /// Programmatic write. Never produces an event.
    pub fn set_value(&mut self, value: f64) -> &mut Self {
        self.track.set(value);
        self.relayout();
        self
    }

    pub fn set_step(&mut self, step: f64) -> &mut Self {
        self.step = step.max(0.0);
        self.relayout();
        self
    }

    /// Pixel offset of the handle from the left end of the track.
    pub fn handle_px(&self) -> f64 {
        self.handle_px
    }

    pub fn track_length_px(&self) -> f64 {
        self.track.track_length_px()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    /// Start of a drag gesture. Fires once until [`Self::end_scrub`].
    pub fn begin_scrub(&mut self) -> Option<SliderEvent> {
        if self.scrubbing {
            return None;
        }
        self.scrubbing = true;
        Some(SliderEvent::ScrubStart {
            parameter: self.parameter,
        })
    }

    pub fn end_scrub(&mut self) {
        self.scrubbing = false;
    }

    /// User drag to `value`, snapped to the step grid and clamped.
    pub fn drag_to(&mut self, value: f64) -> SliderEvent {
        let snapped = self.snap(value);
        self.track.set(snapped);
        self.relayout();
        SliderEvent::ValueChanged {
            parameter: self.parameter,
            value: self.track.value(),
        }
    }

    /// User drag to a pixel offset along the track.
    pub fn drag_to_px(&mut self, px: f64) -> SliderEvent {
        let length = self.track_length_px();
        let fraction = if length > 0.0 {
            (px / length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let value = self.min() + fraction * (self.max() - self.min());
        self.drag_to(value)
    }

    fn snap(&self, value: f64) -> f64 {
        if self.step <= 0.0 || !value.is_finite() {
            return value;
        }
        let steps = ((value - self.min()) / self.step).round();
        self.min() + steps * self.step
    }

    fn relayout(&mut self) {
        self.handle_px = self.track.fraction() * self.track_length_px();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slider() -> SliderWidget {
        let mut slider = SliderWidget::new(ParameterId::Population, 0.0, 1500.0, 100.0);
        slider.set_step(10.0);
        slider
    }

    #[test]
    fn test_programmatic_write_is_silent_and_drag_notifies() {
        let mut slider = slider();
        slider.set_value(300.0);
        assert_eq!(slider.value(), 300.0);

        let event = slider.drag_to(300.0);
        assert_eq!(
            event,
            SliderEvent::ValueChanged {
                parameter: ParameterId::Population,
                value: 300.0
            }
        );
    }

    #[test]
    fn test_bounds_reclamp_value() {
        let mut slider = slider();
        slider.set_min(200.0);
        assert_eq!(slider.value(), 200.0);
        slider.set_max(150.0);
        assert_eq!(slider.value(), 150.0);
        assert_eq!(slider.min(), slider.max());
    }

    #[test]
    fn test_zero_width_range_is_fixed() {
        let mut slider = SliderWidget::new(ParameterId::Rate, 1.0, 1.0, 1.0);
        assert_eq!(slider.step(), 0.0);
        slider.drag_to_px(120.0);
        assert_eq!(slider.value(), 1.0);
        assert_eq!(slider.handle_px(), 0.0);
    }

    #[test]
    fn test_drag_snaps_to_step() {
        let mut slider = slider();
        slider.drag_to(104.0);
        assert_eq!(slider.value(), 100.0);
        slider.drag_to_px(75.0);
        assert_eq!(slider.value(), 750.0);
        assert!((slider.handle_px() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_scrub_start_fires_once_per_gesture() {
        let mut slider = slider();
        assert!(slider.begin_scrub().is_some());
        assert!(slider.is_scrubbing());
        assert!(slider.begin_scrub().is_none());
        slider.end_scrub();
        assert!(!slider.is_scrubbing());
        assert!(slider.begin_scrub().is_some());
    }
}
