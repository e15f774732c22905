use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{PKError, PKResult};

pub const MAX_PERIPHERIES: i64 = 2;
pub const MAX_TIME_STEP_LENGTH: f64 = 60.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelParameters,
    pub simulation: SimulationConfig,
}

/// Caller-supplied model parameters. Every field is optional in JSON and
/// falls back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    pub clearance_rate: f64,  // CL
    pub dose: f64,            // X, per unit time or per pulse
    pub dose_on: f64,         // Time steps dosing is active per cycle, 0 = single bolus
    pub dose_off: f64,        // Time steps dosing is inactive per cycle
    pub v_c: f64,             // Central volume
    pub num_peripheries: i64, // 0, 1, or 2
    pub v_p_list: Option<Vec<f64>>,
    pub q_p_list: Option<Vec<f64>>,
    pub run_time: f64,          // Hours
    pub time_step_length: f64,  // Seconds, in (0, 60]
    pub route: RouteConfig,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            clearance_rate: 1.0,
            dose: 1.0,
            dose_on: 0.0,
            dose_off: 0.0,
            v_c: 1.0,
            num_peripheries: 1,
            v_p_list: None,
            q_p_list: None,
            run_time: 1.0,
            time_step_length: 1.0,
            route: RouteConfig::Intravenous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteConfig {
    Intravenous,
    Subcutaneous {
        #[serde(default = "default_unit")]
        v_0: f64,
        #[serde(default = "default_unit")]
        absorption_rate: f64,
    },
}

impl Default for RouteConfig {
    fn default() -> Self {
        RouteConfig::Intravenous
    }
}

impl RouteConfig {
    /// Route by its model-type name, with default dose compartment values.
    pub fn from_name(name: &str) -> PKResult<Self> {
        match name {
            "Intravenous" | "intravenous" => Ok(RouteConfig::Intravenous),
            "Subcutaneous" | "subcutaneous" => Ok(RouteConfig::Subcutaneous {
                v_0: 1.0,
                absorption_rate: 1.0,
            }),
            _ => Err(PKError::InvalidModel(format!(
                "Unrecognised model type '{}'. Available options: 'Intravenous', 'Subcutaneous'",
                name
            ))),
        }
    }
}

fn default_unit() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub integration_method: IntegrationMethod,
    pub rtol: f64,
    pub atol: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            integration_method: IntegrationMethod::Dopri5,
            rtol: 1.0e-8,
            atol: 1.0e-10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMethod {
    Dopri5,
    Dop853,
    Rk4,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> PKResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PKResult<()> {
        self.model.validate()?;

        if !(self.simulation.rtol > 0.0) || !(self.simulation.atol > 0.0) {
            return Err(PKError::Validation(
                "Solver tolerances must be positive".to_string()
            ));
        }

        Ok(())
    }
}

impl ModelParameters {
    /// Checks every range constraint. Either all of them hold or nothing
    /// downstream gets built.
    pub fn validate(&self) -> PKResult<()> {
        check_non_negative("clearance_rate", self.clearance_rate)?;
        check_non_negative("dose", self.dose)?;
        check_non_negative("dose_on", self.dose_on)?;
        check_non_negative("dose_off", self.dose_off)?;
        check_positive("v_c", self.v_c)?;

        if !(0..=MAX_PERIPHERIES).contains(&self.num_peripheries) {
            return Err(PKError::Validation(format!(
                "num_peripheries must lie between 0 and {} inclusive, got {}",
                MAX_PERIPHERIES, self.num_peripheries
            )));
        }

        self.validate_peripheral_list("v_p_list", self.v_p_list.as_deref(), check_positive)?;
        self.validate_peripheral_list("q_p_list", self.q_p_list.as_deref(), check_non_negative)?;

        check_positive("run_time", self.run_time)?;
        check_positive("time_step_length", self.time_step_length)?;
        if self.time_step_length > MAX_TIME_STEP_LENGTH {
            return Err(PKError::Validation(format!(
                "time_step_length must lie in (0, {}], got {}",
                MAX_TIME_STEP_LENGTH, self.time_step_length
            )));
        }

        if let RouteConfig::Subcutaneous { v_0, absorption_rate } = &self.route {
            check_positive("v_0", *v_0)?;
            check_non_negative("absorption_rate", *absorption_rate)?;
        }

        Ok(())
    }

    fn validate_peripheral_list(
        &self,
        name: &str,
        list: Option<&[f64]>,
        check: fn(&str, f64) -> PKResult<()>,
    ) -> PKResult<()> {
        let Some(values) = list else {
            return Ok(());
        };

        if values.len() as i64 != self.num_peripheries {
            return Err(PKError::Validation(format!(
                "There must be exactly {} entries in {}, got {}",
                self.num_peripheries, name, values.len()
            )));
        }

        for (i, &value) in values.iter().enumerate() {
            check(&format!("{}[{}]", name, i), value)?;
        }

        Ok(())
    }

    /// Peripheral volumes and transition rates, defaulting to all ones.
    pub fn peripheral_lists(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.num_peripheries.max(0) as usize;
        let v_p = self.v_p_list.clone().unwrap_or_else(|| vec![1.0; n]);
        let q_p = self.q_p_list.clone().unwrap_or_else(|| vec![1.0; n]);
        (v_p, q_p)
    }
}

fn check_non_negative(name: &str, value: f64) -> PKResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PKError::Validation(format!(
            "{} must be a finite non-negative number, got {}", name, value
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> PKResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PKError::Validation(format!(
            "{} must be a finite positive number, got {}", name, value
        )));
    }
    Ok(())
}
