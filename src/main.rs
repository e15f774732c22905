use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;

mod compartment;
mod config;
mod dosing;
mod error;
mod models;
mod output;
mod simulation;

use crate::config::{Config, IntegrationMethod, ModelParameters, RouteConfig};
use crate::models::Model;
use crate::simulation::Simulator;

#[derive(Parser)]
#[command(name = "pkmodel")]
#[command(about = "Compartmental pharmacokinetic model for intravenous and subcutaneous dosing")]
struct Cli {
    /// JSON configuration file; command-line values are ignored when given
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model type: Intravenous or Subcutaneous
    #[arg(short = 'm', long, required_unless_present = "config")]
    model_type: Option<String>,

    /// Clearance rate from the central compartment
    #[arg(short = 'c', long, default_value_t = 1.0)]
    clearance: f64,

    /// Dose per time step while dosing is on
    #[arg(short = 'd', long, default_value_t = 1.0)]
    dose_rate: f64,

    /// Time steps dosing is on per cycle (0 = single dose at t = 0)
    #[arg(short = 's', long, default_value_t = 0)]
    dose_on: u32,

    /// Time steps dosing is off per cycle
    #[arg(short = 'e', long, default_value_t = 0)]
    dose_off: u32,

    /// Volume of the central compartment
    #[arg(short = 'v', long, default_value_t = 1.0)]
    v_central: f64,

    /// Number of peripheral compartments (0-2)
    #[arg(short = 'n', long, default_value_t = 1)]
    n_peripheries: i64,

    /// Peripheral volumes, comma separated
    #[arg(short = 'V', long, value_delimiter = ',')]
    v_peripheries: Option<Vec<f64>>,

    /// Peripheral transition rates, comma separated
    #[arg(short = 'Q', long, value_delimiter = ',')]
    q_peripheries: Option<Vec<f64>>,

    /// Volume of the dose compartment (Subcutaneous)
    #[arg(short = 'D', long, default_value_t = 1.0)]
    drug_volume: f64,

    /// Absorption rate from the dose compartment (Subcutaneous)
    #[arg(short = 'a', long, default_value_t = 1.0)]
    drug_absorption: f64,

    /// Simulated time in hours
    #[arg(short = 'r', long, default_value_t = 1.0)]
    run_time: f64,

    /// Time step length in seconds, at most 60
    #[arg(short = 't', long, default_value_t = 1.0)]
    time_step: f64,

    /// ODE integration method
    #[arg(long, value_enum)]
    method: Option<IntegrationMethod>,

    /// Print the full result as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn to_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("failed to load configuration from {:?}", path))?,
            None => Config {
                model: self.model_parameters()?,
                ..Default::default()
            },
        };

        if let Some(method) = self.method {
            config.simulation.integration_method = method;
        }
        Ok(config)
    }

    fn model_parameters(&self) -> anyhow::Result<ModelParameters> {
        let model_type = self.model_type.as_deref().unwrap_or("Intravenous");
        let route = match RouteConfig::from_name(model_type)? {
            RouteConfig::Subcutaneous { .. } => RouteConfig::Subcutaneous {
                v_0: self.drug_volume,
                absorption_rate: self.drug_absorption,
            },
            route => route,
        };

        Ok(ModelParameters {
            clearance_rate: self.clearance,
            dose: self.dose_rate,
            dose_on: f64::from(self.dose_on),
            dose_off: f64::from(self.dose_off),
            v_c: self.v_central,
            num_peripheries: self.n_peripheries,
            v_p_list: self.v_peripheries.clone(),
            q_p_list: self.q_peripheries.clone(),
            run_time: self.run_time,
            time_step_length: self.time_step,
            route,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = cli.to_config()?;
    let model = Model::new(&config.model).context("invalid model parameters")?;
    info!(
        "Built {} model with {} peripheral compartment(s)",
        model.route.name(),
        model.num_peripheries()
    );

    let simulator = Simulator::new(config.simulation.clone());
    let result = simulator.solve(&model)?;

    if cli.json {
        println!("{}", result.to_keyed_json()?);
        return Ok(());
    }

    println!("Drug mass against time for the {} model", result.route_name());
    println!("{:<14} {:>14} {:>10} {:>14} {:>14}", "COMPARTMENT", "MAX", "TMAX", "FINAL", "AUC");
    for summary in result.summaries() {
        println!(
            "{:<14} {:>14.6} {:>10.4} {:>14.6} {:>14.6}",
            summary.label,
            summary.max_quantity,
            summary.time_to_max.unwrap_or(0.0),
            summary.final_quantity,
            summary.auc
        );
    }

    Ok(())
}
