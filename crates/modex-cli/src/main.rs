//! Command-line front end for the modex model checker.

use clap::{Args, Parser, Subcommand};
use modex_engine::{CheckConfig, Explorer, Model, RunReport};
use modex_models::{AlternatingBit, Banking, RiverCrossing};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("unknown model '{name}' (try `modex list`)")]
    UnknownModel { name: String },
}

#[derive(Parser)]
#[command(name = "modex", version)]
#[command(about = "Explicit-state model checker for finite-state concurrent systems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available models
    List,

    /// Model check one of the built-in models
    Check {
        /// Model name (see `modex list`)
        model: String,

        #[command(flatten)]
        model_opts: ModelOpts,

        #[command(flatten)]
        check_opts: CheckOpts,
    },

    /// Print one typical execution without checking anything
    Typical {
        /// Model name (see `modex list`)
        model: String,

        #[command(flatten)]
        model_opts: ModelOpts,
    },
}

#[derive(Args)]
struct ModelOpts {
    /// Channel capacity (alternating bit only)
    #[arg(long, default_value = "4", value_parser = clap::value_parser!(u64).range(1..), help_heading = "Model")]
    capacity: u64,

    /// Disable the sender's stop transition (alternating bit only)
    #[arg(long, help_heading = "Model")]
    no_terminate: bool,

    /// Channels work atomically instead of cell by cell (alternating bit only)
    #[arg(long, help_heading = "Model")]
    compress: bool,

    /// Track messages in transit and check deliveries (alternating bit only)
    #[arg(long, help_heading = "Model")]
    check_out: bool,
}

#[derive(Args)]
struct CheckOpts {
    /// Disable the model's safety predicate
    #[arg(long, help_heading = "Checks")]
    no_safety: bool,

    /// Disable the model's deadlock predicate
    #[arg(long, help_heading = "Checks")]
    no_deadlock: bool,

    /// Check that a may-progress state stays reachable
    #[arg(long, help_heading = "Checks")]
    may_progress: bool,

    /// Check that every cycle and terminal state contains a must-progress state
    #[arg(long, help_heading = "Checks")]
    must_progress: bool,

    /// Terminal states do not count as may-progress states
    #[arg(long, help_heading = "Checks")]
    dl_not_may: bool,

    /// Terminal states do not count as must-progress states
    #[arg(long, help_heading = "Checks")]
    dl_not_must: bool,

    /// Force stubborn-set reduction on
    #[arg(long, help_heading = "Reduction")]
    stubborn: bool,

    /// Force stubborn-set reduction off
    #[arg(long, conflicts_with = "stubborn", help_heading = "Reduction")]
    no_stubborn: bool,

    /// Use the model's symmetry representative
    #[arg(long, help_heading = "Reduction")]
    symmetry: bool,

    /// Try transitions in ascending order
    #[arg(long, help_heading = "Exploration")]
    forward: bool,

    /// Skip all progress work (saves the incoming-edge array)
    #[arg(long, help_heading = "Exploration")]
    no_progress_check: bool,

    /// Skip range and obligation-list checks in the hot paths
    #[arg(long, help_heading = "Exploration")]
    no_sanity_check: bool,

    /// Suppress the running state count and print a settings summary instead
    #[arg(short, long, help_heading = "Exploration")]
    quiet: bool,

    /// Log the running state count every N states
    #[arg(long, value_name = "N", default_value = "1000", help_heading = "Exploration")]
    count_interval: usize,

    /// Abort after this many states
    #[arg(long, value_name = "N", default_value = "30000000", help_heading = "Exploration")]
    stop_count: usize,

    /// Hash table size is 2^BITS
    #[arg(long, value_name = "BITS", default_value = "23", help_heading = "Exploration")]
    hash_bits: u32,
}

impl CheckOpts {
    /// Seed the configuration from the model's declared features, then
    /// apply the command-line overrides.
    fn resolve(&self, features: modex_engine::Features) -> CheckConfig {
        let mut config = CheckConfig::from_features(features);
        if self.no_safety {
            config.check_state = false;
        }
        if self.no_deadlock {
            config.check_deadlock = false;
        }
        if self.may_progress {
            config.check_may_progress = true;
        }
        if self.must_progress {
            config.check_must_progress = true;
        }
        if self.stubborn {
            config.stubborn = true;
        }
        if self.no_stubborn {
            config.stubborn = false;
        }
        if self.symmetry {
            config.symmetry = true;
        }
        config.try_forward = self.forward;
        config.dl_not_may = self.dl_not_may;
        config.dl_not_must = self.dl_not_must;
        config.no_progress_check = self.no_progress_check;
        config.sanity_checks = !self.no_sanity_check;
        config.show_count = if self.quiet { 0 } else { self.count_interval };
        config.stop_count = self.stop_count;
        config.hash_bits = self.hash_bits;
        config
    }

    /// The one-line settings summary printed in batch mode.
    fn summary(&self, config: &CheckConfig) -> String {
        let mut parts = vec!["Settings:".to_string()];
        if config.check_state {
            parts.push("state".into());
        }
        if config.check_deadlock {
            parts.push("dl".into());
        }
        if config.check_may_progress {
            parts.push(if config.dl_not_may { "may!dl" } else { "may" }.into());
        }
        if config.check_must_progress {
            parts.push(if config.dl_not_must { "must!dl" } else { "must" }.into());
        }
        if config.stubborn {
            parts.push("stubb".into());
        }
        if config.symmetry {
            parts.push("symm".into());
        }
        if config.try_forward {
            parts.push("forw".into());
        }
        if !config.sanity_checks {
            parts.push("no_sanity".into());
        }
        parts.push(format!("hash_bits={}", config.hash_bits));
        parts.join(" ")
    }
}

fn run_model<M: Model>(model: M, config: CheckConfig) -> RunReport {
    let mut explorer = Explorer::new(model, config);
    explorer.run()
}

fn build_abp(opts: &ModelOpts) -> AlternatingBit {
    AlternatingBit::new(opts.capacity as usize)
        .terminate(!opts.no_terminate)
        .compress(opts.compress)
        .check_out(opts.check_out)
}

/// How a named model should be run: a full check with resolved options, or
/// one typical execution.
enum Mode<'a> {
    Check(&'a CheckOpts),
    Typical,
}

fn run_named(
    name: &str,
    model_opts: &ModelOpts,
    mode: &Mode<'_>,
) -> Result<(RunReport, Option<CheckConfig>), CliError> {
    debug!(model = name, "starting run");
    fn go<M: Model>(model: M, mode: &Mode<'_>) -> (RunReport, Option<CheckConfig>) {
        let config = match mode {
            Mode::Check(opts) => opts.resolve(model.features()),
            Mode::Typical => CheckConfig {
                only_typical: true,
                ..CheckConfig::default()
            },
        };
        let report = run_model(model, config.clone());
        (report, Some(config))
    }
    match name {
        "wgc" => Ok(go(RiverCrossing::new(), mode)),
        "bank" => Ok(go(Banking::new(), mode)),
        "abp" => Ok(go(build_abp(model_opts), mode)),
        _ => Err(CliError::UnknownModel { name: name.into() }),
    }
}

fn dispatch(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::List => {
            println!("wgc   wolf, sheep, and cabbage river crossing");
            println!("bank  banking system over lossy channels");
            println!("abp   alternating-bit protocol with failure and recovery");
            Ok(())
        }
        Commands::Check {
            model,
            model_opts,
            check_opts,
        } => {
            let (report, config) = run_named(model, model_opts, &Mode::Check(check_opts))?;
            print!("{}", report.render());
            if let Some(config) = config {
                if config.show_count == 0 {
                    println!("{}", check_opts.summary(&config));
                }
            }
            Ok(())
        }
        Commands::Typical { model, model_opts } => {
            let (report, _) = run_named(model, model_opts, &Mode::Typical)?;
            print!("{}", report.render());
            Ok(())
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = dispatch(&cli) {
        eprintln!("error: {e}");
        std::process::exit(2);
    }
}
