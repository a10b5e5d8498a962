//! Small-signal frequency response of drift-diffusion devices, extracted from
//! time-domain transients.
//!
//! An external time-domain simulator is driven with a small step in voltage
//! (impedance, capacitance-voltage) or generation rate (IMPS). Its transient
//! current output is turned into admittance, impedance or capacitance by
//! Fourier decomposition of the step response.
//!
//! To get started, refer to the `demos` directory in the main repository.

mod analysis;
mod selector;

pub mod experiment;
pub mod fourier;
pub mod prelude;
pub mod table;
pub mod transient;
pub mod tvg;

pub use analysis::{Analysis, AnalysisDescriptor, RunDescriptor, SaveFormat, SaveSettings};
pub use selector::select_frequency_indices;

use std::path::PathBuf;

/// Represents an error in the analysis.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Could not find a time that corresponds to the highest frequency.")]
    IndexNotFound,
    #[error("Invalid plot ratio ( ratio: {0} ), it must be at least 1")]
    InvalidPlotRatio(f64),
    #[error("No transient segment starting at t = 0 was found")]
    EmptyExperiment,
    #[error("Number of voltages does not match number of transient segments \
        ( voltages: {voltages}, segments: {segments} )")]
    SegmentMismatch {
        voltages: usize,
        segments: usize,
    },
    #[error("Init {array_name} array does not have expected length \
        ( {array_name} array length: {input_length}, \
        expected length: {expected_length} )")]
    BadInit {
        array_name: String,
        input_length: usize,
        expected_length: usize,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Transient table has no {0} column")]
    MissingColumn(String),
    #[error("Could not parse {value:?} as a number on line {line}")]
    Parse {
        line: usize,
        value: String,
    },
    #[error("Line {line} has {found} fields ( expected {expected} )")]
    MalformedRow {
        line: usize,
        found: usize,
        expected: usize,
    },
    #[error("File {0} already exists and overwrite is disabled")]
    FileExists(PathBuf),
    #[error("Cannot append: stored {name} is {stored:?}, this result has {given:?}")]
    AttributeMismatch {
        name: String,
        stored: Option<f64>,
        given: Option<f64>,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    H5Error(#[from] hdf5::Error),
}

/// Turns a transient into a small-signal result table.
pub trait Experiment {
    type Output: table::Tabulate;

    /// Runs the Fourier decomposition over the transient.
    fn analyze(&self, desc: AnalyzeDescriptor) -> Result<Self::Output, Error>;

    fn name(&self) -> &'static str;
}

/// Describes what an `Experiment` should analyze.
pub struct AnalyzeDescriptor<'a> {
    pub table: &'a transient::TransientTable,
    pub bar: &'a Option<indicatif::ProgressBar>,
}
