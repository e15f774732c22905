use crate::config::ModelParameters;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Number of evaluation points derived from run time (hours) and step
/// length (seconds).
pub fn num_time_steps(run_time: f64, time_step_length: f64) -> usize {
    (run_time * SECONDS_PER_HOUR / time_step_length).floor() as usize
}

/// On/off pulse timing of the drug input. Holds no run state, so one
/// schedule can be evaluated from any number of solves.
#[derive(Debug, Clone, PartialEq)]
pub struct DosingSchedule {
    pub dose_on: f64,
    pub dose_off: f64,
    pub time_step_length: f64,
    pub run_time: f64,
}

impl DosingSchedule {
    pub fn from_parameters(params: &ModelParameters) -> Self {
        Self {
            dose_on: params.dose_on,
            dose_off: params.dose_off,
            time_step_length: params.time_step_length,
            run_time: params.run_time,
        }
    }

    pub fn is_bolus(&self) -> bool {
        self.dose_on == 0.0
    }

    /// Instantaneous input rate at time `t` (hours) for dose magnitude `x`.
    pub fn dose_rate(&self, t: f64, x: f64) -> f64 {
        if self.is_bolus() {
            // Impulse surrogate: the whole of X delivered over one time step
            if t == 0.0 {
                x * SECONDS_PER_HOUR / self.time_step_length
            } else {
                0.0
            }
        } else {
            let steps = num_time_steps(self.run_time, self.time_step_length) as f64;
            let cycle = self.dose_on + self.dose_off;
            let position = ((steps - 1.0) * t).rem_euclid(cycle);
            if position < self.dose_on {
                x
            } else {
                0.0
            }
        }
    }
}
