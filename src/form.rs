//! Prediction form: six bounded numeric inputs and the outcome message.

use serde::{Deserialize, Serialize};

use crate::dataset::{NUM_FEATURES, SAFE_LABEL};
use crate::error::{DashboardError, Result};
use crate::model::Model;

pub const SAFE_MESSAGE: &str = "✅ Boiler is operating safely!";
pub const UNSAFE_MESSAGE: &str = "⚠ Warning: Boiler may be unsafe!";

/// A bounded numeric input widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputField {
    /// Request key.
    pub key: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

/// Form fields in model feature order.
pub const FIELDS: [InputField; NUM_FEATURES] = [
    InputField {
        key: "flue_gas_temp",
        label: "Flue Gas Temp",
        min: 150.0,
        max: 400.0,
        default: 250.0,
    },
    InputField {
        key: "steam_pressure",
        label: "Steam Pressure",
        min: 20.0,
        max: 100.0,
        default: 55.0,
    },
    InputField {
        key: "feedwater_conductivity",
        label: "Feedwater Conductivity",
        min: 0.0,
        max: 10.0,
        default: 2.5,
    },
    InputField {
        key: "drum_level",
        label: "Drum Level",
        min: 0.0,
        max: 120.0,
        default: 60.0,
    },
    InputField {
        key: "fuel_flow",
        label: "Fuel Flow",
        min: 0.0,
        max: 15.0,
        default: 5.0,
    },
    InputField {
        key: "oxygen_content",
        label: "Oxygen Content",
        min: 0.0,
        max: 10.0,
        default: 3.8,
    },
];

impl InputField {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// A form submission. Omitted fields take the widget default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    #[serde(default)]
    pub flue_gas_temp: Option<f64>,
    #[serde(default)]
    pub steam_pressure: Option<f64>,
    #[serde(default)]
    pub feedwater_conductivity: Option<f64>,
    #[serde(default)]
    pub drum_level: Option<f64>,
    #[serde(default)]
    pub fuel_flow: Option<f64>,
    #[serde(default)]
    pub oxygen_content: Option<f64>,
}

impl PredictionInput {
    pub fn from_vector(values: [f64; NUM_FEATURES]) -> Self {
        let [a, b, c, d, e, f] = values;
        Self {
            flue_gas_temp: Some(a),
            steam_pressure: Some(b),
            feedwater_conductivity: Some(c),
            drum_level: Some(d),
            fuel_flow: Some(e),
            oxygen_content: Some(f),
        }
    }

    fn raw(&self) -> [Option<f64>; NUM_FEATURES] {
        [
            self.flue_gas_temp,
            self.steam_pressure,
            self.feedwater_conductivity,
            self.drum_level,
            self.fuel_flow,
            self.oxygen_content,
        ]
    }

    /// Ordered feature vector after defaulting and clamping.
    pub fn to_vector(&self) -> Result<[f64; NUM_FEATURES]> {
        let mut out = [0.0; NUM_FEATURES];
        for (i, (field, value)) in FIELDS.iter().zip(self.raw()).enumerate() {
            let v = value.unwrap_or(field.default);
            if !v.is_finite() {
                return Err(DashboardError::NonFiniteInput {
                    field: field.key.to_string(),
                });
            }
            out[i] = field.clamp(v);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The vector actually sent to the model.
    pub input: [f64; NUM_FEATURES],
    pub label: String,
    pub safe: bool,
    pub message: &'static str,
}

/// Submit the form: assemble the vector, run the model, pick the message.
pub fn submit(model: &Model, input: &PredictionInput) -> Result<Prediction> {
    let vector = input.to_vector()?;
    let label = model.predict(&vector)?;
    let safe = label == SAFE_LABEL;
    Ok(Prediction {
        input: vector,
        label,
        safe,
        message: if safe { SAFE_MESSAGE } else { UNSAFE_MESSAGE },
    })
}
