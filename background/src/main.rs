//! Background calibration
//!
//! Averages the first traces of a raw background acquisition and writes the
//! average trace to a text file (and optionally to a numpy file).

use std::path::PathBuf;

use oct_background::Background;
use oct_daq::DaqConfig;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "oct-background", about = "Averaging OCT background acquisitions")]
struct Opt {
    /// Raw background acquisition (u16 samples)
    #[structopt(parse(from_os_str))]
    path: PathBuf,
    /// Samples per trace
    #[structopt(short, long)]
    width: Option<usize>,
    /// Number of traces to average
    #[structopt(short, long)]
    frames: Option<usize>,
    /// Background text file
    #[structopt(short, long, parse(from_os_str), default_value = "SSOCTBackground.txt")]
    output: PathBuf,
    /// Calibration directory to write the background to instead of `output`
    #[structopt(long, parse(from_os_str))]
    calib_dir: Option<PathBuf>,
    /// Also save the background to a numpy file
    #[structopt(long, parse(from_os_str))]
    npy: Option<PathBuf>,
    /// TOML configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let cfg = DaqConfig::load_or_default(opt.config.as_ref())?;
    let trace_width = opt.width.unwrap_or(cfg.background.trace_width);
    let frames = opt.frames.unwrap_or(cfg.background.frames);

    let background = Background::from_raw(&opt.path, trace_width, frames)?;
    let path = match opt.calib_dir {
        Some(calib_dir) => background.save_to_calib_dir(calib_dir)?,
        None => {
            background.to_text_file(&opt.output)?;
            opt.output
        }
    };
    if let Some(npy) = opt.npy {
        background.to_npy(npy)?;
    }
    println!(
        "{} samples background averaged from {} traces: {:?}",
        background.len(),
        background.n_trace().unwrap_or_default(),
        path
    );

    Ok(())
}
