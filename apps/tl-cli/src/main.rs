use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Timelike;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tl_controls::{
    ParameterNudge, PidConfig, PidController, SetpointSchedule, StagedCooler, TracingSink,
};
use tl_core::ms;
use tl_sim::{
    CooledTank, LagProcess, LiveConfig, LiveSystem, SimRecord, SimulationConfig, ThermalTank,
    ThermalTankConfig, run_cooled_tank, run_live_for, run_sim,
};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(about = "ThermoLoop CLI - PID control loop simulations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a lag transmitter with two PID tunings
    Basic {
        /// Print both records as JSON instead of CSV
        #[arg(long)]
        json: bool,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the cooled tank against a diurnal target
    Cooled {
        /// Simulated duration in hours
        #[arg(long, default_value_t = 24.0)]
        hours: f64,
        /// Enable the periodic heat disturbance
        #[arg(long)]
        disturbance: bool,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run plant and controller on separate threads in wall-clock time
    Live {
        /// Wall-clock run time in seconds
        #[arg(long)]
        seconds: f64,
        /// Plant step and control poll interval in milliseconds
        #[arg(long, default_value_t = 100.0)]
        dt_ms: f64,
        /// Reading interval in milliseconds
        #[arg(long, default_value_t = 500.0)]
        report_ms: f64,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    // Logs go to stderr so series output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Basic { json, output } => cmd_basic(json, output.as_deref()),
        Commands::Cooled {
            hours,
            disturbance,
            output,
        } => cmd_cooled(hours, disturbance, output.as_deref()),
        Commands::Live {
            seconds,
            dt_ms,
            report_ms,
            output,
        } => cmd_live(seconds, dt_ms, report_ms, output.as_deref()),
    }
}

#[derive(Serialize)]
struct BasicRuns {
    well_tuned: SimRecord,
    high_integral: SimRecord,
}

fn run_lag(k_p: f64, k_i: f64, k_d: f64) -> CliResult<SimRecord> {
    let mut controller = PidController::new(PidConfig::new(k_p, k_i, k_d, 35.0)?);
    let mut plant = LagProcess::new(0.0, 5.0)?;
    let config = SimulationConfig::new(400.0, 0.01)?;
    Ok(run_sim(&mut plant, &mut controller, &config)?)
}

fn cmd_basic(json: bool, output: Option<&Path>) -> CliResult<()> {
    let start = Instant::now();
    let runs = BasicRuns {
        well_tuned: run_lag(0.3, 0.005, 0.05)?,
        high_integral: run_lag(0.25, 0.1, 0.1)?,
    };
    tracing::info!(
        steps = runs.well_tuned.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "basic runs complete"
    );

    let text = if json {
        serde_json::to_string_pretty(&runs)?
    } else {
        let mut csv = String::from("time_s,well_tuned,high_integral\n");
        for ((t, a), (_, b)) in runs.well_tuned.points().zip(runs.high_integral.points()) {
            csv.push_str(&format!("{},{},{}\n", t, a, b));
        }
        csv
    };
    emit(&text, output)
}

fn cmd_cooled(hours: f64, disturbance: bool, output: Option<&Path>) -> CliResult<()> {
    let tank = ThermalTank::new(ThermalTankConfig {
        initial_temperature: 48.0,
        internal_heater_rate: 4.0 / 60.0,
        disturbance_enabled: disturbance,
        ..ThermalTankConfig::default()
    })?;
    let mut system = CooledTank {
        tank,
        cooler: StagedCooler::new(3.0 / 60.0, 7.0 / 60.0)?,
        nudge: ParameterNudge::default(),
        schedule: SetpointSchedule::default(),
    };
    let mut controller = PidController::new(
        PidConfig::new(10.0, 15.0, 15.0, 21.0)?.with_conditional_integration(true),
    );
    let config = SimulationConfig::new(hours * 3600.0, 1.0)?;

    let record = run_cooled_tank(&mut system, &mut controller, &config)?;

    let mut csv = String::from("time_s,temperature,target,parameter\n");
    for i in 0..record.len() {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            record.t[i], record.temperature[i], record.target[i], record.parameter[i]
        ));
    }
    emit(&csv, output)
}

fn cmd_live(seconds: f64, dt_ms: f64, report_ms: f64, output: Option<&Path>) -> CliResult<()> {
    let run_for = Duration::try_from_secs_f64(seconds)?;

    // Align the diurnal target with the local time of day
    let offset = chrono::Local::now().time().num_seconds_from_midnight() as f64;
    let config = LiveConfig {
        dt: ms(dt_ms),
        report_interval: ms(report_ms),
        schedule_offset_s: offset,
        ..LiveConfig::default()
    };
    let sink = Arc::new(TracingSink);
    let system = LiveSystem::warm_tank(sink.clone())?;

    let outcome = run_live_for(system, config, sink, run_for)?;

    let mut csv = String::from("time_s,measured,target,critical_temperature,parameter\n");
    for s in &outcome.samples {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            s.time, s.measured, s.target, s.critical_temperature, s.parameter
        ));
    }
    emit(&csv, output)
}

fn emit(text: &str, output: Option<&Path>) -> CliResult<()> {
    if let Some(path) = output {
        std::fs::write(path, text)?;
        println!("✓ Wrote {}", path.display());
    } else {
        print!("{}", text);
    }
    Ok(())
}
