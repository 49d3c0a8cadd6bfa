//! The growth model: single owner of the curve parameters and their bounds.

mod bounded;

pub use bounded::{
    sanitize_input, sanitize_value, step_for, BoundedValue, DEFAULT_TRACK_LENGTH_PX,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::evaluator::{
    initial_expressions, Evaluator, Expression, Viewport, EXPR_CAPACITY_LINE, EXPR_SLOPE_LINE,
    SYMBOL_CAPACITY, SYMBOL_INITIAL_POPULATION, SYMBOL_RATE, SYMBOL_TIME,
};

/// Fractional margin applied around the data range when sizing the plot.
pub const DEFAULT_VIEWPORT_BUFFER: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterId {
    Population,
    Rate,
    Capacity,
    Time,
}

impl ParameterId {
    pub const ALL: [ParameterId; 4] = [
        ParameterId::Population,
        ParameterId::Rate,
        ParameterId::Capacity,
        ParameterId::Time,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            ParameterId::Population => SYMBOL_INITIAL_POPULATION,
            ParameterId::Rate => SYMBOL_RATE,
            ParameterId::Capacity => SYMBOL_CAPACITY,
            ParameterId::Time => SYMBOL_TIME,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Min,
    Max,
}

/// Optional overlays on the plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceLine {
    Capacity,
    Slope,
}

impl ReferenceLine {
    pub fn expression_id(self) -> &'static str {
        match self {
            ReferenceLine::Capacity => EXPR_CAPACITY_LINE,
            ReferenceLine::Slope => EXPR_SLOPE_LINE,
        }
    }
}

/// The full exported parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    pub initial_population: f64,
    pub rate: f64,
    pub capacity: f64,
    pub min_population: f64,
    pub max_population: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    pub min_capacity: f64,
    pub max_capacity: f64,
    pub max_time: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            initial_population: 100.0,
            rate: 0.6,
            capacity: 1000.0,
            min_population: 0.0,
            max_population: 1500.0,
            min_rate: 0.0,
            max_rate: 2.0,
            min_capacity: 0.0,
            max_capacity: 1500.0,
            max_time: 10.0,
        }
    }
}

/// A parameter record as received from a caller, where any field may be
/// absent. Converts into [`Parameters`] only when every field is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRecord {
    pub initial_population: Option<f64>,
    pub rate: Option<f64>,
    pub capacity: Option<f64>,
    pub min_population: Option<f64>,
    pub max_population: Option<f64>,
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
    pub min_capacity: Option<f64>,
    pub max_capacity: Option<f64>,
    pub max_time: Option<f64>,
}

impl From<Parameters> for ParameterRecord {
    fn from(value: Parameters) -> Self {
        Self {
            initial_population: Some(value.initial_population),
            rate: Some(value.rate),
            capacity: Some(value.capacity),
            min_population: Some(value.min_population),
            max_population: Some(value.max_population),
            min_rate: Some(value.min_rate),
            max_rate: Some(value.max_rate),
            min_capacity: Some(value.min_capacity),
            max_capacity: Some(value.max_capacity),
            max_time: Some(value.max_time),
        }
    }
}

impl TryFrom<ParameterRecord> for Parameters {
    type Error = ModelError;

    fn try_from(record: ParameterRecord) -> Result<Self, Self::Error> {
        let fields = [
            ("initialPopulation", record.initial_population),
            ("rate", record.rate),
            ("capacity", record.capacity),
            ("minPopulation", record.min_population),
            ("maxPopulation", record.max_population),
            ("minRate", record.min_rate),
            ("maxRate", record.max_rate),
            ("minCapacity", record.min_capacity),
            ("maxCapacity", record.max_capacity),
            ("maxTime", record.max_time),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::InvalidArgument { missing });
        }
        let value = |field: Option<f64>| field.unwrap_or_default();
        Ok(Parameters {
            initial_population: value(record.initial_population),
            rate: value(record.rate),
            capacity: value(record.capacity),
            min_population: value(record.min_population),
            max_population: value(record.max_population),
            min_rate: value(record.min_rate),
            max_rate: value(record.max_rate),
            min_capacity: value(record.min_capacity),
            max_capacity: value(record.max_capacity),
            max_time: value(record.max_time),
        })
    }
}

/// The time axis starts at 0, so its upper bound never goes below it.
fn time_upper_bound(max_time: f64) -> f64 {
    sanitize_value(max_time).max(0.0)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error(
        "parameter record is missing required fields: {}; expected initialPopulation, rate, \
         capacity, minPopulation, maxPopulation, minRate, maxRate, minCapacity, maxCapacity, maxTime",
        .missing.join(", ")
    )]
    InvalidArgument { missing: Vec<&'static str> },
}

/// Owns the logistic parameters and writes every change through to the
/// evaluator's symbol table.
///
/// Population and capacity bounds are independent: moving one never moves
/// the other.
pub struct GrowthModel<E: Evaluator> {
    population: BoundedValue,
    rate: BoundedValue,
    capacity: BoundedValue,
    time: BoundedValue,
    viewport_buffer: f64,
    evaluator: E,
}

impl<E: Evaluator> GrowthModel<E> {
    pub fn new(parameters: Parameters, evaluator: E) -> Self {
        Self::with_layout(
            parameters,
            DEFAULT_TRACK_LENGTH_PX,
            DEFAULT_VIEWPORT_BUFFER,
            evaluator,
        )
    }

    pub fn with_layout(
        parameters: Parameters,
        track_length_px: f64,
        viewport_buffer: f64,
        evaluator: E,
    ) -> Self {
        let mut model = Self {
            population: BoundedValue::new(
                parameters.initial_population,
                parameters.min_population,
                parameters.max_population,
                track_length_px,
            ),
            rate: BoundedValue::new(
                parameters.rate,
                parameters.min_rate.min(parameters.rate),
                parameters.max_rate.max(parameters.rate),
                track_length_px,
            ),
            capacity: BoundedValue::new(
                parameters.capacity,
                parameters.min_capacity,
                parameters.max_capacity,
                track_length_px,
            ),
            time: BoundedValue::new(
                0.0,
                0.0,
                time_upper_bound(parameters.max_time),
                track_length_px,
            ),
            viewport_buffer,
            evaluator,
        };
        model.evaluator.set_expressions(initial_expressions(
            model.population.value(),
            model.rate.value(),
            model.capacity.value(),
        ));
        model.update_viewport();
        model
    }

    pub fn initial_population(&self) -> f64 {
        self.population.value()
    }

    pub fn rate(&self) -> f64 {
        self.rate.value()
    }

    pub fn capacity(&self) -> f64 {
        self.capacity.value()
    }

    /// Local mirror of the evaluator's `T`.
    pub fn time(&self) -> f64 {
        self.time.value()
    }

    pub fn max_time(&self) -> f64 {
        self.time.max()
    }

    /// Time advanced by one animation frame.
    pub fn time_step(&self) -> f64 {
        self.time.step()
    }

    pub fn bounded(&self, parameter: ParameterId) -> &BoundedValue {
        match parameter {
            ParameterId::Population => &self.population,
            ParameterId::Rate => &self.rate,
            ParameterId::Capacity => &self.capacity,
            ParameterId::Time => &self.time,
        }
    }

    pub fn value(&self, parameter: ParameterId) -> f64 {
        self.bounded(parameter).value()
    }

    pub fn step(&self, parameter: ParameterId) -> f64 {
        self.bounded(parameter).step()
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut E {
        &mut self.evaluator
    }

    pub fn set_initial_population(&mut self, population: f64) {
        let stored = self.population.set(population);
        debug!(initial_population = stored, "model write");
        self.write_symbol(ParameterId::Population);
    }

    /// Sets the growth rate, widening whichever rate bound `rate` violates.
    pub fn set_rate(&mut self, rate: f64) {
        let rate = sanitize_value(rate);
        if rate < self.rate.min() {
            self.rate.set_min(rate);
            self.compute_steps();
        }
        if rate > self.rate.max() {
            self.rate.set_max(rate);
            self.compute_steps();
        }
        let stored = self.rate.set(rate);
        debug!(rate = stored, "model write");
        self.write_symbol(ParameterId::Rate);
    }

    pub fn set_capacity(&mut self, capacity: f64) {
        let stored = self.capacity.set(capacity);
        debug!(capacity = stored, "model write");
        self.write_symbol(ParameterId::Capacity);
    }

    /// Writes `T`. Used by manual scrubbing and the animation loop.
    pub fn set_time(&mut self, time: f64) {
        self.time.set(time);
        self.write_symbol(ParameterId::Time);
    }

    /// Records a `T` reported by the evaluator without writing it back.
    pub fn mirror_time(&mut self, time: f64) {
        self.time.set(time);
    }

    pub fn set_value(&mut self, parameter: ParameterId, value: f64) {
        match parameter {
            ParameterId::Population => self.set_initial_population(value),
            ParameterId::Rate => self.set_rate(value),
            ParameterId::Capacity => self.set_capacity(value),
            ParameterId::Time => self.set_time(value),
        }
    }

    /// Moves one bound of a parameter. A value pushed out of range is
    /// clamped and the clamped value is written to the evaluator. The lower
    /// time bound is fixed at 0.
    pub fn set_bound(&mut self, parameter: ParameterId, bound: Bound, value: f64) {
        if parameter == ParameterId::Time && bound == Bound::Min {
            debug!("ignoring write to the fixed lower time bound");
            return;
        }
        let value = if parameter == ParameterId::Time {
            time_upper_bound(value)
        } else {
            value
        };
        let before = self.value(parameter);
        let target = match parameter {
            ParameterId::Population => &mut self.population,
            ParameterId::Rate => &mut self.rate,
            ParameterId::Capacity => &mut self.capacity,
            ParameterId::Time => &mut self.time,
        };
        match bound {
            Bound::Min => target.set_min(value),
            Bound::Max => target.set_max(value),
        }
        debug!(?parameter, ?bound, value, "model bound write");
        self.compute_steps();
        if matches!(parameter, ParameterId::Capacity | ParameterId::Time) {
            self.update_viewport();
        }
        if self.value(parameter) != before {
            self.write_symbol(parameter);
        }
    }

    pub fn set_max_time(&mut self, max_time: f64) {
        self.set_bound(ParameterId::Time, Bound::Max, max_time);
    }

    pub fn set_line_visible(&mut self, line: ReferenceLine, visible: bool) {
        self.evaluator
            .set_expression(Expression::visibility(line.expression_id(), !visible));
    }

    pub fn compute_steps(&mut self) {
        self.population.recompute_step();
        self.rate.recompute_step();
        self.capacity.recompute_step();
        self.time.recompute_step();
    }

    pub fn viewport(&self) -> Viewport {
        let max_time = self.time.max();
        let max_capacity = self.capacity.max();
        Viewport {
            left: max_time * (1.0 - self.viewport_buffer),
            right: max_time * self.viewport_buffer,
            bottom: max_capacity * (1.0 - self.viewport_buffer),
            top: max_capacity * self.viewport_buffer,
        }
    }

    pub fn update_viewport(&mut self) {
        let viewport = self.viewport();
        self.evaluator.set_math_bounds(viewport);
    }

    pub fn get_parameters(&self) -> Parameters {
        Parameters {
            initial_population: self.population.value(),
            rate: self.rate.value(),
            capacity: self.capacity.value(),
            min_population: self.population.min(),
            max_population: self.population.max(),
            min_rate: self.rate.min(),
            max_rate: self.rate.max(),
            min_capacity: self.capacity.min(),
            max_capacity: self.capacity.max(),
            max_time: self.time.max(),
        }
    }

    /// Replaces the whole parameter set. Validation happens before any
    /// field is touched, so a rejected record leaves the model unchanged.
    pub fn set_parameters(&mut self, record: ParameterRecord) -> Result<(), ModelError> {
        let parameters = Parameters::try_from(record)?;
        self.population
            .set_bounds(parameters.min_population, parameters.max_population);
        self.rate.set_bounds(parameters.min_rate, parameters.max_rate);
        self.capacity
            .set_bounds(parameters.min_capacity, parameters.max_capacity);
        self.time
            .set_bounds(0.0, time_upper_bound(parameters.max_time));

        self.set_initial_population(parameters.initial_population);
        self.set_rate(parameters.rate);
        self.set_capacity(parameters.capacity);
        self.write_symbol(ParameterId::Time);

        self.compute_steps();
        self.update_viewport();
        Ok(())
    }

    fn write_symbol(&mut self, parameter: ParameterId) {
        let value = self.value(parameter);
        self.evaluator
            .set_expression(Expression::assignment(parameter.symbol(), value));
    }
}
