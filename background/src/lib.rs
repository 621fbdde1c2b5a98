//! OCT background calibration
//!
//! The background is the column-wise average of the first traces of a raw
//! acquisition: a file of little-endian `u16` samples, `trace_width` samples per trace.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Read, Write},
    ops::Deref,
    path::{Path, PathBuf},
    time::Instant,
};

use npyz::WriterBuilder;
use rayon::prelude::*;

pub use oct_daq::config::{BACKGROUND_FRAMES, TRACE_WIDTH};

/// Background file name in a calibration directory
pub const BACKGROUND_FILE: &str = "SSOCTBackground.txt";
const SAMPLE_BYTES: usize = std::mem::size_of::<u16>();

#[derive(thiserror::Error, Debug)]
pub enum BackgroundError {
    #[error("Failed to access the background file")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse a background value")]
    Parse(#[from] std::num::ParseFloatError),
    #[error("Failed to write the npy file")]
    Npy(#[source] std::io::Error),
    #[error("trace width must be at least one sample")]
    TraceWidth,
    #[error("at least one frame must be averaged")]
    Frames,
    #[error("{n_byte} bytes do not reshape into traces of {trace_width} samples")]
    Ragged { n_byte: u64, trace_width: usize },
    #[error("not a single trace of {0} samples to average")]
    Empty(usize),
}
type Result<T> = std::result::Result<T, BackgroundError>;

/// Average background trace
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    values: Vec<f64>,
    // number of traces averaged, unknown when loaded from text
    n_trace: Option<usize>,
}
impl Deref for Background {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}
impl Background {
    /// Averages the complete traces of `fringe`
    pub fn from_fringe(fringe: &[u16], trace_width: usize) -> Result<Self> {
        if trace_width == 0 {
            return Err(BackgroundError::TraceWidth);
        }
        let n_trace = fringe.len() / trace_width;
        if n_trace == 0 {
            return Err(BackgroundError::Empty(trace_width));
        }
        let sum = fringe
            .par_chunks_exact(trace_width)
            .fold(
                || vec![0f64; trace_width],
                |mut acc, trace| {
                    acc.iter_mut()
                        .zip(trace)
                        .for_each(|(a, &s)| *a += s as f64);
                    acc
                },
            )
            .reduce(
                || vec![0f64; trace_width],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(a, b)| *a += b);
                    a
                },
            );
        let fct = (n_trace as f64).recip();
        Ok(Self {
            values: sum.into_iter().map(|x| x * fct).collect(),
            n_trace: Some(n_trace),
        })
    }
    /// Averages the first `frames` traces of a raw acquisition file
    ///
    /// `frames` is clamped to the number of traces in the file and only the
    /// averaged traces are read.
    pub fn from_raw<P: AsRef<Path>>(path: P, trace_width: usize, frames: usize) -> Result<Self> {
        if trace_width == 0 {
            return Err(BackgroundError::TraceWidth);
        }
        if frames == 0 {
            return Err(BackgroundError::Frames);
        }
        let trace_bytes = trace_width
            .checked_mul(SAMPLE_BYTES)
            .ok_or(BackgroundError::TraceWidth)? as u64;
        let path = path.as_ref();
        let file = File::open(path)?;
        log::info!("Loading {:?}...", path);
        let now = Instant::now();
        let n_byte = file.metadata()?.len();
        if n_byte % trace_bytes != 0 {
            return Err(BackgroundError::Ragged {
                n_byte,
                trace_width,
            });
        }
        let n_trace = (n_byte / trace_bytes) as usize;
        if n_trace == 0 {
            return Err(BackgroundError::Empty(trace_width));
        }
        let frames = if frames > n_trace {
            log::warn!("only {n_trace} traces available, {frames} requested");
            n_trace
        } else {
            frames
        };
        let mut buffer = vec![0u8; frames * trace_width * SAMPLE_BYTES];
        BufReader::new(file).read_exact(&mut buffer)?;
        let fringe: Vec<u16> = buffer
            .chunks_exact(SAMPLE_BYTES)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();
        let this = Self::from_fringe(&fringe, trace_width)?;
        log::info!(
            "... averaged {} traces in {}ms",
            frames,
            now.elapsed().as_millis()
        );
        Ok(this)
    }
    /// Loads a background text file, whitespace separated values
    pub fn from_text_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut values = vec![];
        for line in reader.lines() {
            for token in line?.split_whitespace() {
                values.push(token.parse::<f64>()?);
            }
        }
        Ok(Self {
            values,
            n_trace: None,
        })
    }
    /// Number of traces the background is averaged from
    pub fn n_trace(&self) -> Option<usize> {
        self.n_trace
    }
    /// Writes the background to a text file, one value per line
    pub fn to_text_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        for &value in &self.values {
            writeln!(writer, "{}", savetxt(value))?;
        }
        writer.flush()?;
        log::info!("background written to {:?}", path);
        Ok(())
    }
    /// Writes the background into a calibration directory, creating it if needed
    pub fn save_to_calib_dir<P: AsRef<Path>>(&self, calib_dir: P) -> Result<PathBuf> {
        let calib_dir = calib_dir.as_ref();
        if !calib_dir.exists() {
            fs::create_dir_all(calib_dir)?;
        }
        let path = calib_dir.join(BACKGROUND_FILE);
        self.to_text_file(&path)?;
        Ok(path)
    }
    /// Writes the background to a numpy `.npy` file
    pub fn to_npy<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        let mut writer = npyz::WriteOptions::<f64>::new()
            .default_dtype()
            .shape(&[self.values.len() as u64])
            .writer(&mut file)
            .begin_nd()
            .map_err(BackgroundError::Npy)?;
        writer
            .extend(self.values.iter().copied())
            .map_err(BackgroundError::Npy)?;
        writer.finish().map_err(BackgroundError::Npy)?;
        file.flush()?;
        Ok(())
    }
}

/// Formats a value like numpy `savetxt` default `%.18e`
fn savetxt(value: f64) -> String {
    let s = format!("{value:.18e}");
    match s.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or_default();
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => s,
    }
}
