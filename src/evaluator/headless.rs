use std::collections::HashMap;

use super::{
    Evaluator, Expression, Observer, Viewport, SYMBOL_CAPACITY, SYMBOL_INITIAL_POPULATION,
    SYMBOL_POPULATION, SYMBOL_RATE, SYMBOL_SLOPE, SYMBOL_TIME,
};

/// Closed-form logistic solution N(t).
pub fn logistic(initial_population: f64, rate: f64, capacity: f64, time: f64) -> f64 {
    let growth = (rate * time).exp();
    let denominator = capacity + initial_population * (growth - 1.0);
    if denominator == 0.0 {
        return f64::NAN;
    }
    capacity * initial_population * growth / denominator
}

/// N'(t) expressed through N(t): r·N·(1 − N/k).
pub fn logistic_slope(population: f64, rate: f64, capacity: f64) -> f64 {
    if capacity == 0.0 {
        return f64::NAN;
    }
    rate * population * (1.0 - population / capacity)
}

/// In-process evaluator for running without a graphing widget.
///
/// Numeric assignments (`N_0=100`) are parsed out of the formulas; `P` and
/// `m` are derived from them. Observers fire when a finite observed value
/// changes, and once on registration.
#[derive(Default)]
pub struct HeadlessEvaluator {
    expressions: HashMap<String, Expression>,
    observers: HashMap<String, Vec<Observer>>,
    reported: HashMap<String, f64>,
    viewport: Option<Viewport>,
    writes: usize,
}

impl HeadlessEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expression(&self, id: &str) -> Option<&Expression> {
        self.expressions.get(id)
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.expressions
            .get(id)
            .and_then(|expression| expression.style.hidden)
            .unwrap_or(false)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Number of `set_expression` calls received so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn numeric_value(&self, symbol: &str) -> Option<f64> {
        let value = match symbol {
            SYMBOL_POPULATION => self.population(),
            SYMBOL_SLOPE => self.slope(),
            _ => self.assigned(symbol),
        };
        value.filter(|value| value.is_finite())
    }

    fn assigned(&self, symbol: &str) -> Option<f64> {
        let latex = self.expressions.get(symbol)?.latex.as_deref()?;
        let (lhs, rhs) = latex.split_once('=')?;
        if lhs.trim() != symbol {
            return None;
        }
        rhs.trim().parse::<f64>().ok()
    }

    fn population(&self) -> Option<f64> {
        Some(logistic(
            self.assigned(SYMBOL_INITIAL_POPULATION)?,
            self.assigned(SYMBOL_RATE)?,
            self.assigned(SYMBOL_CAPACITY)?,
            self.assigned(SYMBOL_TIME)?,
        ))
    }

    fn slope(&self) -> Option<f64> {
        Some(logistic_slope(
            self.population()?,
            self.assigned(SYMBOL_RATE)?,
            self.assigned(SYMBOL_CAPACITY)?,
        ))
    }

    fn notify_changed(&mut self) {
        let symbols: Vec<String> = self.observers.keys().cloned().collect();
        for symbol in symbols {
            let Some(value) = self.numeric_value(&symbol) else {
                continue;
            };
            if self.reported.get(&symbol) == Some(&value) {
                continue;
            }
            self.reported.insert(symbol.clone(), value);
            if let Some(observers) = self.observers.get_mut(&symbol) {
                for observer in observers.iter_mut() {
                    observer(value);
                }
            }
        }
    }
}

impl Evaluator for HeadlessEvaluator {
    fn set_expression(&mut self, expression: Expression) {
        self.writes += 1;
        match self.expressions.get_mut(&expression.id) {
            Some(existing) => {
                if expression.latex.is_some() {
                    existing.latex = expression.latex;
                }
                if expression.style.color.is_some() {
                    existing.style.color = expression.style.color;
                }
                if expression.style.hidden.is_some() {
                    existing.style.hidden = expression.style.hidden;
                }
            }
            None => {
                self.expressions.insert(expression.id.clone(), expression);
            }
        }
        self.notify_changed();
    }

    fn set_math_bounds(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    fn observe(&mut self, symbol: &str, mut observer: Observer) {
        if let Some(value) = self.numeric_value(symbol) {
            observer(value);
            self.reported.insert(symbol.to_string(), value);
        }
        self.observers
            .entry(symbol.to_string())
            .or_default()
            .push(observer);
    }
}
