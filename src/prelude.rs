//! Includes commonly used library components.

pub use crate::{
    Analysis,
    AnalysisDescriptor,
    AnalyzeDescriptor,
    Error,
    Experiment,
    RunDescriptor,
    SaveFormat,
    SaveSettings,
};
pub use crate::fourier::ContactResistance;
pub use crate::table::Tabulate;
pub use crate::transient::TransientTable;
