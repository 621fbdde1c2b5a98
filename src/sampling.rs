//! Digitizer sampling and aline size
//!
//! Derives the acquisition parameters of the legacy fixed-size aline laser
//! and of the swept-source laser whose aline size follows its sweep period.

use std::fmt;

/// Default digitizer sampling frequency [Hz]
pub const SAMPLE_RATE_HZ: f64 = 180e6;
/// Default number of samples per aline of the legacy laser
pub const LEGACY_ALINE_SIZE: u64 = 8192;
/// Default sweep period of the swept-source laser [s]
pub const SWEEP_PERIOD_S: f64 = 8e-6;
/// Relative distance to an integer below which a sample count snaps to that integer
pub const SNAP_TOLERANCE: f64 = 1e-8;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum InvalidParameterError {
    #[error("sample rate must be positive and finite, found {0} Hz")]
    SampleRate(f64),
    #[error("sweep period must be positive and finite, found {0} s")]
    SweepPeriod(f64),
    #[error("legacy aline size must be at least one sample")]
    AlineSize,
    #[error("a sweep must span at least one sample, found {0} samples")]
    TooFewSamples(f64),
    #[error("{0} samples per sweep do not fit a 64 bit aline size")]
    TooManySamples(f64),
}
type Result<T> = std::result::Result<T, InvalidParameterError>;

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0f64
}

/// Legacy laser: fixed number of samples per aline
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyAline {
    pub aline_size: u64,
    /// time to acquire one aline [s]
    pub time_to_acquire_s: f64,
    /// maximum aline rate [Hz]
    pub max_aline_rate_hz: f64,
}
impl fmt::Display for LegacyAline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Old laser:")?;
        write!(
            f,
            " aline size: {}, time to acquire: {:.3e} s, max aline rate: {:.2} Hz",
            self.aline_size, self.time_to_acquire_s, self.max_aline_rate_hz
        )
    }
}

/// Swept-source laser: the aline is the largest power of two fitting in one sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweptSourceAline {
    pub sweep_period_s: f64,
    /// digitizer samples within one sweep, not necessarily integral
    pub samples_per_period: f64,
    pub aline_size: u64,
    /// fraction of the sweep covered by the aline
    pub utilization: f64,
}
impl SweptSourceAline {
    /// Sweep frequency [Hz]
    pub fn sweep_rate_hz(&self) -> f64 {
        self.sweep_period_s.recip()
    }
}
impl fmt::Display for SweptSourceAline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "New laser:")?;
        writeln!(
            f,
            " sweep period: {:e} s, sweep rate: {:.1} Hz",
            self.sweep_period_s,
            self.sweep_rate_hz()
        )?;
        writeln!(f, " samples per period: {}", self.samples_per_period)?;
        write!(
            f,
            " aline size: {}, which is {:.1}% of period",
            self.aline_size,
            self.utilization * 1e2
        )
    }
}

/// Returns the time to acquire one legacy aline and the resulting maximum aline rate
pub fn legacy_aline(sample_rate_hz: f64, aline_size: u64) -> Result<LegacyAline> {
    if !positive(sample_rate_hz) {
        return Err(InvalidParameterError::SampleRate(sample_rate_hz));
    }
    if aline_size == 0 {
        return Err(InvalidParameterError::AlineSize);
    }
    let time_to_acquire_s = aline_size as f64 / sample_rate_hz;
    Ok(LegacyAline {
        aline_size,
        time_to_acquire_s,
        max_aline_rate_hz: time_to_acquire_s.recip(),
    })
}

/// Largest power of two not exceeding `samples`
///
/// The exponent is the bit length of the integer sample count, so exact powers
/// of two are stable. A count within [SNAP_TOLERANCE] of an integer is first
/// snapped to it: `1023.999999` gives `1024`.
pub fn floor_power_of_two(samples: f64) -> Result<u64> {
    if !samples.is_finite() {
        return Err(InvalidParameterError::TooFewSamples(samples));
    }
    if samples >= 2f64.powi(64) {
        return Err(InvalidParameterError::TooManySamples(samples));
    }
    let nearest = samples.round();
    let count = if (samples - nearest).abs() <= SNAP_TOLERANCE * samples {
        nearest
    } else {
        samples.floor()
    };
    if count < 1f64 {
        return Err(InvalidParameterError::TooFewSamples(samples));
    }
    let count = count as u64;
    Ok(1u64 << (u64::BITS - 1 - count.leading_zeros()))
}

/// Returns the swept-source aline size and how much of the sweep it covers
pub fn swept_source_aline(sample_rate_hz: f64, sweep_period_s: f64) -> Result<SweptSourceAline> {
    if !positive(sample_rate_hz) {
        return Err(InvalidParameterError::SampleRate(sample_rate_hz));
    }
    if !positive(sweep_period_s) {
        return Err(InvalidParameterError::SweepPeriod(sweep_period_s));
    }
    let samples_per_period = sweep_period_s * sample_rate_hz;
    let aline_size = floor_power_of_two(samples_per_period)?;
    Ok(SweptSourceAline {
        sweep_period_s,
        samples_per_period,
        aline_size,
        utilization: aline_size as f64 / samples_per_period,
    })
}

/// Acquisition parameters of both laser configurations
#[derive(Debug, Clone, PartialEq)]
pub struct AlineParameters {
    pub sample_rate_hz: f64,
    pub legacy: LegacyAline,
    pub swept_source: SweptSourceAline,
}
impl AlineParameters {
    /// Prints the parameters of both lasers
    pub fn summary(&self) {
        println!("{self}");
    }
}
impl fmt::Display for AlineParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OCT system DAQ sample rate: {:.3e} Hz", self.sample_rate_hz)?;
        writeln!(f, "{}", self.legacy)?;
        write!(f, "{}", self.swept_source)
    }
}

/// Builder for [AlineParameters]
///
/// Defaults to the 180MHz digitizer, the 8192 samples legacy aline and the 8us sweep.
///
/// ```
/// use oct_daq::AlineParameterCalculator;
///
/// let params = AlineParameterCalculator::default().compute().unwrap();
/// assert_eq!(params.swept_source.aline_size, 1024);
/// ```
#[derive(Debug, Clone)]
pub struct AlineParameterCalculator {
    sample_rate_hz: f64,
    legacy_aline_size: u64,
    sweep_period_s: f64,
}
impl Default for AlineParameterCalculator {
    fn default() -> Self {
        Self {
            sample_rate_hz: SAMPLE_RATE_HZ,
            legacy_aline_size: LEGACY_ALINE_SIZE,
            sweep_period_s: SWEEP_PERIOD_S,
        }
    }
}
impl AlineParameterCalculator {
    pub fn sample_rate(self, sample_rate_hz: f64) -> Self {
        Self {
            sample_rate_hz,
            ..self
        }
    }
    pub fn legacy_aline_size(self, legacy_aline_size: u64) -> Self {
        Self {
            legacy_aline_size,
            ..self
        }
    }
    pub fn sweep_period(self, sweep_period_s: f64) -> Self {
        Self {
            sweep_period_s,
            ..self
        }
    }
    pub fn compute(self) -> Result<AlineParameters> {
        log::debug!("{:?}", self);
        Ok(AlineParameters {
            sample_rate_hz: self.sample_rate_hz,
            legacy: legacy_aline(self.sample_rate_hz, self.legacy_aline_size)?,
            swept_source: swept_source_aline(self.sample_rate_hz, self.sweep_period_s)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn legacy_laser() {
        let legacy = legacy_aline(180e6, 8192).unwrap();
        assert!((legacy.time_to_acquire_s - 4.551e-5).abs() < 1e-8);
        assert!((legacy.max_aline_rate_hz - 21972.656).abs() < 1e-2);
    }

    #[test]
    fn new_laser() {
        let swept = swept_source_aline(180e6, 8e-6).unwrap();
        assert!((swept.samples_per_period - 1440.).abs() < 1e-9);
        assert_eq!(swept.aline_size, 1024);
        assert!((swept.utilization - 0.7111).abs() < 1e-4);
        assert!((swept.sweep_rate_hz() - 125e3).abs() < 1e-6);
    }

    #[test]
    fn exact_power_of_two() {
        assert_eq!(floor_power_of_two(1024.).unwrap(), 1024);
        assert_eq!(floor_power_of_two(1.).unwrap(), 1);
        let swept = swept_source_aline(128e6, 8e-6).unwrap();
        assert_eq!(swept.aline_size, 1024);
        assert!((swept.utilization - 1.).abs() < 1e-12);
    }

    #[test]
    fn near_power_of_two() {
        assert_eq!(floor_power_of_two(1023.999999).unwrap(), 1024);
        assert_eq!(floor_power_of_two(1023.9).unwrap(), 512);
        assert_eq!(floor_power_of_two(2047.5).unwrap(), 1024);
        assert_eq!(floor_power_of_two(1.0 - 1e-12).unwrap(), 1);
        assert_eq!(
            floor_power_of_two(0.999),
            Err(InvalidParameterError::TooFewSamples(0.999))
        );
        assert!(floor_power_of_two(-1.).is_err());
    }

    #[test]
    fn invalid_parameters() {
        assert_eq!(
            legacy_aline(0., 8192),
            Err(InvalidParameterError::SampleRate(0.))
        );
        assert_eq!(legacy_aline(180e6, 0), Err(InvalidParameterError::AlineSize));
        assert_eq!(
            swept_source_aline(180e6, -8e-6),
            Err(InvalidParameterError::SweepPeriod(-8e-6))
        );
        assert!(matches!(
            swept_source_aline(f64::NAN, 8e-6),
            Err(InvalidParameterError::SampleRate(_))
        ));
        assert_eq!(
            floor_power_of_two(0.5),
            Err(InvalidParameterError::TooFewSamples(0.5))
        );
        assert!(matches!(
            floor_power_of_two(1e30),
            Err(InvalidParameterError::TooManySamples(_))
        ));
        assert!(AlineParameterCalculator::default()
            .sample_rate(-1.)
            .compute()
            .is_err());
    }

    #[test]
    fn rate_times_duration() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let sample_rate_hz = rng.gen_range(1e3..1e10);
            let aline_size = rng.gen_range(1..1_000_000u64);
            let legacy = legacy_aline(sample_rate_hz, aline_size).unwrap();
            assert!((legacy.max_aline_rate_hz * legacy.time_to_acquire_s - 1.).abs() < 1e-12);
        }
    }

    #[test]
    fn aline_size_brackets_samples() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let samples: f64 = rng.gen_range(1f64..1e12);
            let size = floor_power_of_two(samples).unwrap();
            assert!(size.is_power_of_two());
            assert!(size as f64 <= samples * (1. + SNAP_TOLERANCE));
            assert!(samples < 2. * size as f64);
        }
    }

    #[test]
    fn utilization_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let sample_rate_hz = rng.gen_range(1e7..1e9);
            let sweep_period_s = rng.gen_range(1e-6..1e-4);
            let swept = swept_source_aline(sample_rate_hz, sweep_period_s).unwrap();
            assert!(swept.utilization > 0.5 - 1e-12);
            assert!(swept.utilization <= 1. + SNAP_TOLERANCE);
        }
    }

    #[test]
    fn calculator() {
        let params = AlineParameterCalculator::default()
            .sample_rate(250e6)
            .legacy_aline_size(4096)
            .sweep_period(10e-6)
            .compute()
            .unwrap();
        assert_eq!(params.legacy.aline_size, 4096);
        assert_eq!(params.swept_source.aline_size, 2048);
        let report = params.to_string();
        assert!(report.contains("Old laser:"));
        assert!(report.contains("aline size: 2048"));
    }
}
