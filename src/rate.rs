//! Growth rate from births, deaths and migration counts.

use serde::{Deserialize, Serialize};

use crate::model::sanitize_input;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateField {
    Births,
    Deaths,
    Immigration,
    Emigration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RateCalculator {
    pub births: f64,
    pub deaths: f64,
    pub immigration: f64,
    pub emigration: f64,
}

impl RateCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the sanitized input and returns the recomputed rate.
    pub fn set_input(&mut self, field: RateField, raw: &str) -> f64 {
        let value = sanitize_input(raw);
        match field {
            RateField::Births => self.births = value,
            RateField::Deaths => self.deaths = value,
            RateField::Immigration => self.immigration = value,
            RateField::Emigration => self.emigration = value,
        }
        self.rate()
    }

    pub fn input(&self, field: RateField) -> f64 {
        match field {
            RateField::Births => self.births,
            RateField::Deaths => self.deaths,
            RateField::Immigration => self.immigration,
            RateField::Emigration => self.emigration,
        }
    }

    pub fn rate(&self) -> f64 {
        (self.births - self.deaths) + (self.immigration - self.emigration)
    }

    pub fn clear(&mut self) -> f64 {
        *self = Self::default();
        self.rate()
    }
}
