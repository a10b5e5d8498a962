use ndarray::Array1;
use num_complex::Complex64;

use crate::fourier::{decompose, ContactResistance, KernelConfig, SmallSignal};
use crate::table::ImpedanceSpectrum;
use crate::{select_frequency_indices, AnalyzeDescriptor, Error, Experiment};

use super::validate_step;

/// Impedance spectroscopy from a single voltage-step transient.
#[derive(Copy, Clone, Debug)]
pub struct Impedance {
    /// Lowest frequency [Hz], the first row of the spectrum.
    pub f_min: f64,
    /// Highest frequency [Hz].
    pub f_max: f64,
    /// Frequency points per decade.
    pub f_steps: usize,
    /// Size of the applied voltage step [V].
    pub v_step: f64,
    /// Contact resistances to add back, if the simulation removed them.
    pub contacts: Option<ContactResistance>,
}

impl Experiment for Impedance {
    type Output = ImpedanceSpectrum;

    fn analyze(&self, desc: AnalyzeDescriptor) -> Result<ImpedanceSpectrum, Error> {
        validate_step("v_step", self.v_step)?;
        let segment = desc.table.whole()?;
        let indices =
            select_frequency_indices(segment.time, self.f_min, self.f_max, self.f_steps)?;
        if let Some(ref bar) = desc.bar {
            bar.set_length(indices.len() as u64);
        }

        let config = KernelConfig::impedance(self.v_step, self.contacts);
        let n = indices.len();
        let mut frequency = Array1::<f64>::zeros(n);
        let mut impedance = Array1::<Complex64>::zeros(n);
        let mut error = Array1::<Complex64>::zeros(n);
        let mut capacitance = Array1::<f64>::zeros(n);
        let mut conductance = Array1::<f64>::zeros(n);

        // latest window end first, so frequency ascends
        for (k, &imax) in indices.iter().rev().enumerate() {
            let sample = decompose(&segment, imax, &config);
            let (z, z_err) = match sample.signal {
                SmallSignal::Impedance { value, error } => (value, error),
                _ => unreachable!("impedance kernel returned {:?}", sample.signal),
            };
            let y = z.inv();

            frequency[k] = sample.frequency;
            impedance[k] = z;
            error[k] = z_err;
            conductance[k] = y.re;
            capacitance[k] = y.im / sample.angular_frequency();

            if let Some(ref bar) = desc.bar {
                bar.inc(1)
            }
        }

        Ok(ImpedanceSpectrum {
            frequency,
            impedance,
            error,
            capacitance,
            conductance,
            v_step: self.v_step,
            contacts: self.contacts,
        })
    }

    fn name(&self) -> &'static str {
        "impedance"
    }
}
