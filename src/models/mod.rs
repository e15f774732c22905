pub mod intravenous;
pub mod subcutaneous;

use crate::compartment::{build_base_compartments, extend, Compartment, Compartments};
use crate::config::{ModelParameters, RouteConfig};
use crate::dosing::{num_time_steps, DosingSchedule};
use crate::error::PKResult;
use log::debug;
use std::ops::Range;

/// Dosing route, carrying only the parameters that route needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Intravenous,
    Subcutaneous { v_0: f64, k_a: f64 },
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Intravenous => "Intravenous",
            Route::Subcutaneous { .. } => "Subcutaneous",
        }
    }
}

impl From<&RouteConfig> for Route {
    fn from(config: &RouteConfig) -> Self {
        match config {
            RouteConfig::Intravenous => Route::Intravenous,
            RouteConfig::Subcutaneous { v_0, absorption_rate } => Route::Subcutaneous {
                v_0: *v_0,
                k_a: *absorption_rate,
            },
        }
    }
}

/// Where each compartment's quantity sits in the combined state vector.
#[derive(Debug, Clone, PartialEq)]
pub struct StateLayout {
    pub dose: Option<usize>,
    pub central: usize,
    pub peripheries: Range<usize>,
}

impl StateLayout {
    pub fn len(&self) -> usize {
        self.peripheries.end
    }
}

/// Validated, immutable model configuration together with the compartments
/// built from it.
#[derive(Debug, Clone)]
pub struct Model {
    pub cl: f64,
    pub x: f64,
    pub run_time: f64,
    pub time_step_length: f64,
    pub schedule: DosingSchedule,
    pub route: Route,
    pub compartments: Compartments,
}

impl Model {
    pub fn new(params: &ModelParameters) -> PKResult<Self> {
        params.validate()?;

        let (v_p_list, q_p_list) = params.peripheral_lists();
        let route = Route::from(&params.route);

        let base = build_base_compartments(params.v_c, &v_p_list, &q_p_list);
        let compartments = extend(base, &route);

        debug!(
            "Built {} model with {} compartments",
            route.name(),
            compartments.len()
        );
        for (label, compartment) in compartments.labelled() {
            debug!("  {}: volume {}", label, compartment.volume());
        }

        Ok(Self {
            cl: params.clearance_rate,
            x: params.dose,
            run_time: params.run_time,
            time_step_length: params.time_step_length,
            schedule: DosingSchedule::from_parameters(params),
            route,
            compartments,
        })
    }

    pub fn num_peripheries(&self) -> usize {
        self.compartments.peripheries.len()
    }

    /// `k_a` of the dose compartment, zero when there is none.
    pub fn absorption_rate(&self) -> f64 {
        self.compartments.dose.as_ref().map_or(0.0, |dose| dose.absorption_rate)
    }

    pub fn num_time_steps(&self) -> usize {
        num_time_steps(self.run_time, self.time_step_length)
    }

    pub fn dose_rate(&self, t: f64) -> f64 {
        self.schedule.dose_rate(t, self.x)
    }

    pub fn state_layout(&self) -> StateLayout {
        match self.route {
            Route::Intravenous => intravenous::state_layout(self.num_peripheries()),
            Route::Subcutaneous { .. } => subcutaneous::state_layout(self.num_peripheries()),
        }
    }

    /// Derivatives of every compartment quantity at time `t`.
    pub fn rhs(&self, t: f64, y: &[f64], dy: &mut [f64]) {
        match self.route {
            Route::Intravenous => intravenous::rhs(self, t, y, dy),
            Route::Subcutaneous { .. } => subcutaneous::rhs(self, t, y, dy),
        }
    }

    /// Elimination from the central compartment, proportional to concentration.
    fn clearance(&self, q_c: f64) -> f64 {
        q_c / self.compartments.central.volume * self.cl
    }

    /// Writes each peripheral exchange flux into `dq_p` and returns their sum.
    fn peripheral_exchange(&self, q_c: f64, q_p: &[f64], dq_p: &mut [f64]) -> f64 {
        let c_c = q_c / self.compartments.central.volume;
        let mut total = 0.0;
        for ((periphery, &q), dq) in self.compartments.peripheries.iter().zip(q_p).zip(dq_p) {
            let transition = periphery.transition_rate * (c_c - q / periphery.volume);
            *dq = transition;
            total += transition;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_inputs_stored_as_floats() {
        let config: crate::config::Config = serde_json::from_str(
            r#"{"model": {"clearance_rate": 1, "dose": 1, "dose_on": 1, "dose_off": 1,
                "v_c": 1, "num_peripheries": 1, "v_p_list": [1], "q_p_list": [2],
                "run_time": 1, "time_step_length": 1}}"#,
        ).unwrap();
        let model = Model::new(&config.model).unwrap();

        assert_eq!(model.cl, 1.0);
        assert_eq!(model.x, 1.0);
        assert_eq!(model.compartments.central.volume, 1.0);
        assert_eq!(model.compartments.peripheries[0].volume, 1.0);
        assert_eq!(model.compartments.peripheries[0].transition_rate, 2.0);
        assert_eq!(model.schedule.dose_on, 1.0);
        assert_eq!(model.run_time, 1.0);
    }

    #[test]
    fn test_construction_fails_wholesale() {
        let params = ModelParameters {
            num_peripheries: 3,
            v_p_list: Some(vec![1.0, 1.0, 1.0]),
            q_p_list: Some(vec![1.0, 1.0, 1.0]),
            ..Default::default()
        };
        let err = Model::new(&params).unwrap_err();
        assert!(err.is_range_violation());
    }

    #[test]
    fn test_compartments_match_route() {
        let iv = Model::new(&ModelParameters { num_peripheries: 2, ..Default::default() }).unwrap();
        assert_eq!(iv.compartments.peripheries.len(), 2);
        assert!(iv.compartments.dose.is_none());
        assert_eq!(iv.route.name(), "Intravenous");

        let sc = Model::new(&ModelParameters {
            num_peripheries: 0,
            route: RouteConfig::Subcutaneous { v_0: 3.0, absorption_rate: 0.5 },
            ..Default::default()
        }).unwrap();
        assert_eq!(sc.route, Route::Subcutaneous { v_0: 3.0, k_a: 0.5 });
        assert_eq!(sc.compartments.dose.as_ref().map(|d| d.volume), Some(3.0));
        assert_eq!(sc.compartments.len(), 2);
        assert_eq!(sc.absorption_rate(), 0.5);
        assert_eq!(iv.absorption_rate(), 0.0);
    }

    #[test]
    fn test_state_layouts() {
        let iv = Model::new(&ModelParameters { num_peripheries: 2, ..Default::default() }).unwrap();
        let layout = iv.state_layout();
        assert_eq!(layout, StateLayout { dose: None, central: 0, peripheries: 1..3 });
        assert_eq!(layout.len(), 3);

        let sc = Model::new(&ModelParameters {
            num_peripheries: 2,
            route: RouteConfig::Subcutaneous { v_0: 1.0, absorption_rate: 1.0 },
            ..Default::default()
        }).unwrap();
        let layout = sc.state_layout();
        assert_eq!(layout, StateLayout { dose: Some(0), central: 1, peripheries: 2..4 });
        assert_eq!(layout.len(), 4);
    }
}
