use ndarray::Array1;

use crate::fourier::{decompose, KernelConfig, SmallSignal};
use crate::table::ImpsSpectrum;
use crate::{select_frequency_indices, AnalyzeDescriptor, Error, Experiment};

/// Intensity-modulated photocurrent spectroscopy from a generation-rate step.
///
/// The admittance is not normalized by the step size.
#[derive(Copy, Clone, Debug)]
pub struct Imps {
    /// Lowest frequency [Hz], the first row of the spectrum.
    pub f_min: f64,
    /// Highest frequency [Hz].
    pub f_max: f64,
    /// Frequency points per decade.
    pub f_steps: usize,
}

impl Experiment for Imps {
    type Output = ImpsSpectrum;

    fn analyze(&self, desc: AnalyzeDescriptor) -> Result<ImpsSpectrum, Error> {
        let segment = desc.table.whole()?;
        let indices =
            select_frequency_indices(segment.time, self.f_min, self.f_max, self.f_steps)?;
        if let Some(ref bar) = desc.bar {
            bar.set_length(indices.len() as u64);
        }

        let config = KernelConfig::admittance();
        let mut frequency = Vec::with_capacity(indices.len());
        let mut admittance = Vec::with_capacity(indices.len());
        let mut error = Vec::with_capacity(indices.len());

        // latest window end first, so frequency ascends
        for imax in indices.into_iter().rev() {
            let sample = decompose(&segment, imax, &config);
            match sample.signal {
                SmallSignal::Admittance { value, error: y_err } => {
                    frequency.push(sample.frequency);
                    admittance.push(value);
                    error.push(y_err);
                }
                _ => unreachable!("admittance kernel returned {:?}", sample.signal),
            }

            if let Some(ref bar) = desc.bar {
                bar.inc(1)
            }
        }

        Ok(ImpsSpectrum {
            frequency: Array1::from(frequency),
            admittance: Array1::from(admittance),
            error: Array1::from(error),
        })
    }

    fn name(&self) -> &'static str {
        "imps"
    }
}
