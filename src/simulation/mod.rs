use crate::config::{IntegrationMethod, SimulationConfig};
use crate::error::{PKError, PKResult};
use crate::models::Model;
use crate::output::SimulationResult;
use log::{debug, info};
use ode_solvers::{DVector, Dop853, Dopri5, OutputType, Rk4, System};

type State = DVector<f64>;

// Fixed-step RK4 sub-steps per grid interval
const RK4_SUBSTEPS: f64 = 10.0;
// Relative slack when checking the last solver output reached the interval end
const END_OFFSET: f64 = 1.0e-10;

/// Adapts a plain right-hand side closure to the solver's system trait.
/// The solver runs in interval-local time `s`, the closure sees `t0 + s`.
struct RhsSystem<'a, F> {
    rhs: &'a F,
    t0: f64,
}

impl<F> System<f64, State> for RhsSystem<'_, F>
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    fn system(&self, s: f64, y: &State, dy: &mut State) {
        (self.rhs)(self.t0 + s, y.as_slice(), dy.as_mut_slice());
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SolverStats {
    evaluations: usize,
    accepted: usize,
    rejected: usize,
}

impl SolverStats {
    fn add(&mut self, run: ode_solvers::dop_shared::Stats) {
        self.evaluations += run.num_eval as usize;
        self.accepted += run.accepted_steps as usize;
        self.rejected += run.rejected_steps as usize;
    }
}

/// Drives a model through the ODE solver and packages the output.
pub struct Simulator {
    settings: SimulationConfig,
}

impl Simulator {
    pub fn new(settings: SimulationConfig) -> Self {
        Self { settings }
    }

    pub fn solve(&self, model: &Model) -> PKResult<SimulationResult> {
        let t_eval = time_grid(model);
        let layout = model.state_layout();
        let y0 = vec![0.0; layout.len()];

        info!(
            "Solving {} model over {} h ({} time points, {:?})",
            model.route.name(),
            model.run_time,
            t_eval.len(),
            self.settings.integration_method
        );
        debug!("State layout: {:?}", layout);

        let rows = self.integrate(
            |t, y, dy| model.rhs(t, y, dy),
            &t_eval,
            &y0,
            model.schedule.is_bolus(),
        )?;

        info!("Solve completed");
        Ok(SimulationResult::from_rows(t_eval, &rows, &layout))
    }

    /// Returns the state at every grid time, starting with `y0` at `grid[0]`.
    /// Each interval is integrated on its own so the rows land exactly on the
    /// requested times.
    ///
    /// With `impulse_at_start` the right-hand side carries an impulse at
    /// `grid[0]` only. The first interval is then taken as one fixed RK4 step,
    /// which samples the impulse once with weight `h / 6`. The configured
    /// method takes over from the second interval.
    pub fn integrate<F>(
        &self,
        rhs: F,
        grid: &[f64],
        y0: &[f64],
        impulse_at_start: bool,
    ) -> PKResult<Vec<Vec<f64>>>
    where
        F: Fn(f64, &[f64], &mut [f64]),
    {
        let mut rows = Vec::with_capacity(grid.len());
        let mut y = State::from_column_slice(y0);
        let mut stats = SolverStats::default();

        if grid.is_empty() {
            return Ok(rows);
        }
        rows.push(y0.to_vec());

        for (i, window) in grid.windows(2).enumerate() {
            let (t0, t1) = (window[0], window[1]);
            y = if i == 0 && impulse_at_start {
                self.impulse_interval(&rhs, t0, t1, y, &mut stats)?
            } else {
                self.integrate_interval(&rhs, t0, t1, y, &mut stats)?
            };
            rows.push(y.as_slice().to_vec());
        }

        debug!(
            "Solver used {} evaluations ({} accepted, {} rejected steps)",
            stats.evaluations, stats.accepted, stats.rejected
        );
        Ok(rows)
    }

    fn impulse_interval<F>(
        &self,
        rhs: &F,
        t0: f64,
        t1: f64,
        y: State,
        stats: &mut SolverStats,
    ) -> PKResult<State>
    where
        F: Fn(f64, &[f64], &mut [f64]),
    {
        let h = t1 - t0;
        let mut stepper = Rk4::new(RhsSystem { rhs, t0 }, 0.0, y, h, h);
        let run = stepper.integrate().map_err(|e| interval_error(t0, t1, e))?;
        stats.add(run);

        end_state(stepper.x_out(), stepper.y_out(), t0, t1)
    }

    fn integrate_interval<F>(
        &self,
        rhs: &F,
        t0: f64,
        t1: f64,
        y: State,
        stats: &mut SolverStats,
    ) -> PKResult<State>
    where
        F: Fn(f64, &[f64], &mut [f64]),
    {
        let system = RhsSystem { rhs, t0 };
        let h = t1 - t0;
        let rtol = self.settings.rtol;
        let atol = self.settings.atol;

        // Sparse output records the state of every accepted step, the last of
        // which ends on t1. Dense output would interpolate instead.
        match self.settings.integration_method {
            IntegrationMethod::Dopri5 => {
                let mut stepper = Dopri5::new(system, 0.0, h, h, y, rtol, atol);
                stepper.set_output(OutputType::Sparse);
                let run = stepper.integrate().map_err(|e| interval_error(t0, t1, e))?;
                stats.add(run);
                end_state(stepper.x_out(), stepper.y_out(), t0, t1)
            },
            IntegrationMethod::Dop853 => {
                let mut stepper = Dop853::new(system, 0.0, h, h, y, rtol, atol);
                stepper.set_output(OutputType::Sparse);
                let run = stepper.integrate().map_err(|e| interval_error(t0, t1, e))?;
                stats.add(run);
                end_state(stepper.x_out(), stepper.y_out(), t0, t1)
            },
            IntegrationMethod::Rk4 => {
                let step = h / (RK4_SUBSTEPS - END_OFFSET);
                let mut stepper = Rk4::new(system, 0.0, y, h, step);
                let run = stepper.integrate().map_err(|e| interval_error(t0, t1, e))?;
                stats.add(run);
                end_state(stepper.x_out(), stepper.y_out(), t0, t1)
            },
        }
    }
}

fn interval_error(t0: f64, t1: f64, e: ode_solvers::dop_shared::IntegrationError) -> PKError {
    PKError::Integration(format!("interval [{}, {}]: {}", t0, t1, e))
}

/// Last recorded state, provided the solver got to the end of the interval.
fn end_state(x_out: &[f64], y_out: &[State], t0: f64, t1: f64) -> PKResult<State> {
    let h = t1 - t0;
    match (x_out.last(), y_out.last()) {
        (Some(&s), Some(y)) if s >= h * (1.0 - END_OFFSET) => Ok(y.clone()),
        _ => Err(PKError::Integration(format!(
            "no solver output at the end of interval [{}, {}]", t0, t1
        ))),
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

/// Solves with default solver settings.
pub fn solve(model: &Model) -> PKResult<SimulationResult> {
    Simulator::default().solve(model)
}

/// Evenly spaced evaluation times over `[0, run_time]`.
pub fn time_grid(model: &Model) -> Vec<f64> {
    // At least two points so a run shorter than one time step still spans [0, run_time]
    let n = model.num_time_steps().max(2);
    let last = (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { model.run_time } else { model.run_time * i as f64 / last })
        .collect()
}
