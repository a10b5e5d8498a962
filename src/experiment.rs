//! Small-signal experiments.

mod cv;
mod impedance;
mod imps;

pub use cv::CapacitanceVoltageSweep;
pub use impedance::Impedance;
pub use imps::Imps;

use crate::Error;

/// Checks that a perturbation step can be divided by.
fn validate_step(name: &str, step: f64) -> Result<(), Error> {
    if step == 0.0 || !step.is_finite() {
        return Err(Error::InvalidConfig(format!(
            "{name} must be finite and non-zero ( {name}: {step} )"
        )));
    }
    Ok(())
}
