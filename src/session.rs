//! One interactive session: the model plus every view that mirrors it.
//!
//! UI events enter through [`Session::apply`]. Model writes reach the
//! evaluator synchronously; the evaluator's observed outputs are queued and
//! applied by [`Session::pump`], so they may land after newer writes and
//! simply overwrite the display fields (last write wins).

use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    animation::{AnimationController, CancellationToken, PlaybackState},
    config::LabConfig,
    evaluator::{
        Evaluator, SYMBOL_CAPACITY, SYMBOL_INITIAL_POPULATION, SYMBOL_POPULATION, SYMBOL_RATE,
        SYMBOL_SLOPE, SYMBOL_TIME,
    },
    model::{
        sanitize_input, Bound, GrowthModel, ModelError, ParameterId, ParameterRecord, Parameters,
        ReferenceLine,
    },
    particles::{ParticleField, Surface},
    rate::{RateCalculator, RateField},
    slider::{SliderEvent, SliderWidget},
};

/// A numeric output reported by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    Population(f64),
    Slope(f64),
    Time(f64),
    Parameter(ParameterId, f64),
}

/// Everything a user can do to the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UiAction {
    Drag { parameter: ParameterId, value: f64 },
    ScrubStart { parameter: ParameterId },
    ScrubEnd { parameter: ParameterId },
    EditInput { parameter: ParameterId, raw: String },
    EditBound {
        parameter: ParameterId,
        bound: Bound,
        raw: String,
    },
    TogglePlay,
    ToggleLine { line: ReferenceLine },
    EditRateInput { field: RateField, raw: String },
    ClearRateInputs,
}

/// One `T` per parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerParameter<T> {
    pub population: T,
    pub rate: T,
    pub capacity: T,
    pub time: T,
}

impl<T> PerParameter<T> {
    pub fn from_fn(mut f: impl FnMut(ParameterId) -> T) -> Self {
        Self {
            population: f(ParameterId::Population),
            rate: f(ParameterId::Rate),
            capacity: f(ParameterId::Capacity),
            time: f(ParameterId::Time),
        }
    }

    pub fn get(&self, parameter: ParameterId) -> &T {
        match parameter {
            ParameterId::Population => &self.population,
            ParameterId::Rate => &self.rate,
            ParameterId::Capacity => &self.capacity,
            ParameterId::Time => &self.time,
        }
    }

    pub fn get_mut(&mut self, parameter: ParameterId) -> &mut T {
        match parameter {
            ParameterId::Population => &mut self.population,
            ParameterId::Rate => &mut self.rate,
            ParameterId::Capacity => &mut self.capacity,
            ParameterId::Time => &mut self.time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundInputs {
    pub min: String,
    pub max: String,
}

/// Text shown on the page outside the plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub inputs: PerParameter<String>,
    pub bounds: PerParameter<BoundInputs>,
    pub population_label: String,
    pub slope_label: String,
    pub show_capacity: bool,
    pub show_slope: bool,
    pub capacity_toggle: String,
    pub slope_toggle: String,
    pub play_button: String,
    pub playback: PlaybackState,
    pub rate_inputs: RateCalculator,
}

fn display_number(value: f64) -> String {
    format!("{value}")
}

fn toggle_caption(visible: bool) -> String {
    let caption = if visible { "Hide" } else { "Show" };
    caption.to_string()
}

fn play_caption(state: PlaybackState) -> String {
    let caption = match state {
        PlaybackState::Playing => "Pause",
        PlaybackState::Stopped => "Play",
    };
    caption.to_string()
}

pub struct Session<E: Evaluator> {
    model: GrowthModel<E>,
    sliders: PerParameter<SliderWidget>,
    particles: ParticleField,
    rate_calculator: RateCalculator,
    animation: AnimationController,
    observations: Receiver<Observation>,
    panel: Panel,
}

impl<E: Evaluator> Session<E> {
    pub fn new(config: &LabConfig, evaluator: E) -> Self {
        let mut model = GrowthModel::with_layout(
            config.parameters,
            config.slider.track_length_px,
            config.viewport_buffer,
            evaluator,
        );
        let (tx, rx) = mpsc::channel();
        register_observers(model.evaluator_mut(), &tx);

        let sliders = PerParameter::from_fn(|parameter| {
            let mut slider = SliderWidget::with_track(parameter, *model.bounded(parameter));
            slider.set_step(model.step(parameter));
            slider
        });
        let panel = Panel {
            inputs: PerParameter::from_fn(|parameter| display_number(model.value(parameter))),
            bounds: PerParameter::from_fn(|parameter| {
                let bounded = model.bounded(parameter);
                BoundInputs {
                    min: display_number(bounded.min()),
                    max: display_number(bounded.max()),
                }
            }),
            population_label: String::new(),
            slope_label: String::new(),
            show_capacity: false,
            show_slope: false,
            capacity_toggle: toggle_caption(false),
            slope_toggle: toggle_caption(false),
            play_button: play_caption(PlaybackState::Stopped),
            playback: PlaybackState::Stopped,
            rate_inputs: RateCalculator::default(),
        };
        info!(session = %config.name, "session ready");

        Self {
            model,
            sliders,
            particles: ParticleField::with_limit(
                config.canvas.width,
                config.canvas.height,
                config.seed,
                config.particles.max_markers,
            ),
            rate_calculator: RateCalculator::new(),
            animation: AnimationController::new(),
            observations: rx,
            panel,
        }
    }

    pub fn model(&self) -> &GrowthModel<E> {
        &self.model
    }

    pub fn evaluator(&self) -> &E {
        self.model.evaluator()
    }

    pub fn slider(&self, parameter: ParameterId) -> &SliderWidget {
        self.sliders.get(parameter)
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn playback(&self) -> PlaybackState {
        self.animation.state()
    }

    pub fn get_parameters(&self) -> Parameters {
        self.model.get_parameters()
    }

    pub fn set_parameters(&mut self, record: ParameterRecord) -> Result<(), ModelError> {
        self.model.set_parameters(record)?;
        for parameter in ParameterId::ALL {
            self.sync_views(parameter);
        }
        info!("parameters replaced");
        Ok(())
    }

    /// Applies one UI event. Returns the cancellation token of a newly
    /// started Playing period so the caller can drive the animation loop.
    pub fn apply(&mut self, action: UiAction) -> Option<CancellationToken> {
        debug!(?action, "ui action");
        match action {
            UiAction::Drag { parameter, value } => {
                let event = self.sliders.get_mut(parameter).drag_to(value);
                self.handle_slider_event(event);
            }
            UiAction::ScrubStart { parameter } => {
                if let Some(event) = self.sliders.get_mut(parameter).begin_scrub() {
                    self.handle_slider_event(event);
                }
            }
            UiAction::ScrubEnd { parameter } => self.sliders.get_mut(parameter).end_scrub(),
            UiAction::EditInput { parameter, raw } => {
                let value = sanitize_input(&raw);
                let slider = self.sliders.get_mut(parameter);
                slider.set_value(value);
                let clamped = slider.value();
                self.model.set_value(parameter, clamped);
                self.sync_views(parameter);
            }
            UiAction::EditBound {
                parameter,
                bound,
                raw,
            } => {
                self.model.set_bound(parameter, bound, sanitize_input(&raw));
                self.sync_views(parameter);
            }
            UiAction::TogglePlay => {
                let state = self.animation.toggle();
                self.sync_playback();
                if state == PlaybackState::Playing {
                    return self.animation.token();
                }
            }
            UiAction::ToggleLine { line } => {
                let visible = match line {
                    ReferenceLine::Capacity => {
                        self.panel.show_capacity = !self.panel.show_capacity;
                        self.panel.capacity_toggle = toggle_caption(self.panel.show_capacity);
                        self.panel.show_capacity
                    }
                    ReferenceLine::Slope => {
                        self.panel.show_slope = !self.panel.show_slope;
                        self.panel.slope_toggle = toggle_caption(self.panel.show_slope);
                        self.panel.show_slope
                    }
                };
                self.model.set_line_visible(line, visible);
            }
            UiAction::EditRateInput { field, raw } => {
                let rate = self.rate_calculator.set_input(field, &raw);
                self.apply_calculated_rate(rate);
            }
            UiAction::ClearRateInputs => {
                let rate = self.rate_calculator.clear();
                self.apply_calculated_rate(rate);
            }
        }
        None
    }

    /// One animation frame. `None` once playback has stopped.
    pub fn animation_tick(&mut self) -> Option<f64> {
        let next = self.animation.tick(
            self.model.time(),
            self.model.time_step(),
            self.model.max_time(),
        )?;
        self.model.set_time(next);
        Some(next)
    }

    /// Applies every queued evaluator output. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(observation) = self.observations.try_recv() {
            self.apply_observation(observation);
            applied += 1;
        }
        applied
    }

    /// Draws the dot cloud if it changed since the last frame.
    pub fn render_frame(&mut self, surface: &mut dyn Surface) -> bool {
        self.particles.render_frame(surface)
    }

    fn apply_observation(&mut self, observation: Observation) {
        match observation {
            Observation::Population(value) => {
                let rounded = value.round();
                self.particles.set_size(rounded as i64);
                self.panel.population_label = display_number(rounded);
            }
            Observation::Slope(value) => {
                self.panel.slope_label = format!("{value:.2}");
            }
            Observation::Time(value) => {
                self.model.mirror_time(value);
                self.sliders.time.set_value(value);
                self.panel.inputs.time = display_number(self.model.time());
            }
            Observation::Parameter(parameter, value) => {
                self.sliders.get_mut(parameter).set_value(value);
            }
        }
    }

    fn handle_slider_event(&mut self, event: SliderEvent) {
        match event {
            SliderEvent::ValueChanged { parameter, value } => {
                *self.panel.inputs.get_mut(parameter) = display_number(value);
                self.model.set_value(parameter, value);
            }
            SliderEvent::ScrubStart { parameter } => {
                if parameter == ParameterId::Time && self.animation.is_playing() {
                    self.animation.interrupt();
                    self.sync_playback();
                }
            }
        }
    }

    fn apply_calculated_rate(&mut self, rate: f64) {
        self.panel.rate_inputs = self.rate_calculator;
        self.model.set_rate(rate);
        self.sync_views(ParameterId::Rate);
    }

    fn sync_playback(&mut self) {
        let state = self.animation.state();
        self.panel.playback = state;
        self.panel.play_button = play_caption(state);
    }

    /// Pushes the model's view of `parameter` into its slider and text
    /// fields through the silent paths.
    fn sync_views(&mut self, parameter: ParameterId) {
        let bounded = *self.model.bounded(parameter);
        let slider = self.sliders.get_mut(parameter);
        slider
            .set_min(bounded.min())
            .set_max(bounded.max())
            .set_step(bounded.step())
            .set_value(bounded.value());
        *self.panel.inputs.get_mut(parameter) = display_number(bounded.value());
        *self.panel.bounds.get_mut(parameter) = BoundInputs {
            min: display_number(bounded.min()),
            max: display_number(bounded.max()),
        };
    }
}

fn register_observers<E: Evaluator>(evaluator: &mut E, tx: &Sender<Observation>) {
    let forward = |wrap: fn(f64) -> Observation| {
        let tx = tx.clone();
        Box::new(move |value: f64| {
            let _ = tx.send(wrap(value));
        })
    };
    evaluator.observe(SYMBOL_POPULATION, forward(Observation::Population));
    evaluator.observe(SYMBOL_SLOPE, forward(Observation::Slope));
    evaluator.observe(SYMBOL_TIME, forward(Observation::Time));
    evaluator.observe(
        SYMBOL_INITIAL_POPULATION,
        forward(|value| Observation::Parameter(ParameterId::Population, value)),
    );
    evaluator.observe(
        SYMBOL_RATE,
        forward(|value| Observation::Parameter(ParameterId::Rate, value)),
    );
    evaluator.observe(
        SYMBOL_CAPACITY,
        forward(|value| Observation::Parameter(ParameterId::Capacity, value)),
    );
}
