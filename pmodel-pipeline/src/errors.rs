use pmodel_core::PModelError;
use thiserror::Error;

/// Error type for batch runs over a climate archive.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Timestep {year}-{month:02} failed: {source}")]
    Timestep {
        year: i32,
        /// One-based month for reporting
        month: usize,
        #[source]
        source: PModelError,
    },
    #[error("Month {year}-{month:02} is outside the archive (time index {index}, {available} months available)")]
    MonthOutOfRange {
        year: i32,
        month: usize,
        index: i64,
        available: usize,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid archive: {0}")]
    Archive(String),
    #[error("Could not parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Could not serialise configuration: {0}")]
    ConfigSerialise(#[from] toml::ser::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Output sink failed: {0}")]
    Sink(String),
}

/// Convenience type for `Result<T, PipelineError>`.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Attach the timestep to a model error
    pub fn timestep(year: i32, month: usize, source: PModelError) -> Self {
        PipelineError::Timestep {
            year,
            month: month + 1,
            source,
        }
    }
}
