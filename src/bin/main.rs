//! Digitizer sampling calculator
//!
//! Prints the aline acquisition time and maximum aline rate of the legacy laser
//! and the power of two aline size fitting in one sweep of the swept-source laser.
//! Parameters are taken from the command line, then from the TOML configuration
//! file, then from the setup defaults.

use std::path::PathBuf;

use oct_daq::{AlineParameters, DaqConfig};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "calc-sampling", about = "OCT digitizer sampling calculator")]
struct Opt {
    /// Digitizer sample rate [Hz]
    #[structopt(short, long)]
    sample_rate: Option<f64>,
    /// Legacy laser aline size [samples]
    #[structopt(short, long)]
    aline_size: Option<u64>,
    /// Swept-source laser sweep period [s]
    #[structopt(short = "p", long)]
    sweep_period: Option<f64>,
    /// TOML configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
}

fn parameters(opt: Opt) -> Result<AlineParameters, oct_daq::Error> {
    let cfg = DaqConfig::load_or_default(opt.config)?;
    let mut calculator = cfg.calculator();
    if let Some(arg) = opt.sample_rate {
        calculator = calculator.sample_rate(arg);
    }
    if let Some(arg) = opt.aline_size {
        calculator = calculator.legacy_aline_size(arg);
    }
    if let Some(arg) = opt.sweep_period {
        calculator = calculator.sweep_period(arg);
    }
    Ok(calculator.compute()?)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();
    log::debug!("{:?}", opt);

    let params = parameters(opt)?;
    params.summary();
    log::info!(
        "acquire {} samples per aline",
        params.swept_source.aline_size
    );

    Ok(())
}
