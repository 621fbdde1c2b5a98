use crate::{config::ConfigError, sampling::InvalidParameterError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `sampling` module")]
    Sampling(#[from] InvalidParameterError),
    #[error("Error in the `config` module")]
    Config(#[from] ConfigError),
}
