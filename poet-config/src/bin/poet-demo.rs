//! Runnable demo: loads a control-state config file, drives POET with a
//! synthetic workload, and logs every chosen configuration change.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use poet::PoetState;
use poet_config::parse_control_states;

/// Drive a POET controller against a synthetic workload for inspection.
#[derive(Parser, Debug)]
#[command(name = "poet-demo", version, about)]
struct Args {
    /// Control-state config file (`id speedup cost` per line).
    #[arg(short, long)]
    control_states: PathBuf,

    /// Target performance rate.
    #[arg(short = 'g', long, default_value_t = 2.0)]
    perf_goal: f64,

    /// Iterations between recomputations.
    #[arg(short, long, default_value_t = 8)]
    period: u32,

    /// Ring buffer depth for the log file; 0 disables logging.
    #[arg(short, long, default_value_t = 4)]
    buffer_depth: u32,

    /// Where to write the log file.
    #[arg(short, long, default_value = "poet-demo.log")]
    log_path: PathBuf,

    /// Total iterations to simulate.
    #[arg(short = 'n', long, default_value_t = 200)]
    iterations: u64,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let states = match parse_control_states(&args.control_states) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("failed to load control states: {err}");
            std::process::exit(1);
        }
    };

    let log_path = (args.buffer_depth > 0).then_some(args.log_path.as_path());

    let apply: poet::ApplyFn = Box::new(|new_id, last_id| {
        info!(new_id, last_id, "would apply configuration change");
    });

    let mut controller = match PoetState::init(
        args.perf_goal,
        states,
        Some(apply),
        None,
        args.period,
        args.buffer_depth,
        log_path,
    ) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("failed to initialize controller: {err}");
            std::process::exit(1);
        }
    };

    // A synthetic workload: the achieved rate lags the current speedup,
    // approaching it asymptotically, so the loop has something to converge on.
    let mut simulated_rate = 1.0_f64;
    for tag in 0..args.iterations {
        let target = controller.current_speedup();
        simulated_rate += (target - simulated_rate) * 0.3;
        controller.apply_control(tag, simulated_rate, 0.0);
        std::thread::sleep(Duration::from_millis(1));
    }

    info!(
        final_speedup = controller.current_speedup(),
        last_applied_id = controller.last_applied_id(),
        "demo run complete"
    );
    controller.destroy();
}
