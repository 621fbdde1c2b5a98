//! Sampling parameters of a swept-source OCT digitizer
//!
//! Computes the time to acquire a legacy fixed-size aline and the power of two
//! aline size matching the sweep period of the swept-source laser.

pub mod config;
mod error;
pub mod sampling;

pub use config::DaqConfig;
pub use error::Error;
pub use sampling::{
    floor_power_of_two, legacy_aline, swept_source_aline, AlineParameterCalculator,
    AlineParameters, InvalidParameterError, LegacyAline, SweptSourceAline,
};
