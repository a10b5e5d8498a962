use ndarray::Array1;

use crate::fourier::{decompose, KernelConfig, SmallSignal};
use crate::table::CapacitanceVoltage;
use crate::{AnalyzeDescriptor, Error, Experiment};

use super::validate_step;

/// Capacitance-voltage sweep.
///
/// The transient holds one small-step response per DC bias, each restarting
/// at `t = 0`. Every response is decomposed once at the modulation frequency.
#[derive(Copy, Clone, Debug)]
pub struct CapacitanceVoltageSweep {
    /// First DC bias [V].
    pub v_min: f64,
    /// Last DC bias [V].
    pub v_max: f64,
    /// Spacing between DC biases [V].
    pub v_step: f64,
    /// Size of the small-signal voltage step [V].
    pub del_v: f64,
    /// Modulation frequency [Hz].
    pub freq: f64,
}

impl CapacitanceVoltageSweep {
    /// DC biases from `v_min` to `v_max` inclusive.
    pub fn voltages(&self) -> Result<Array1<f64>, Error> {
        if !(self.v_step > 0.0) || !(self.v_max >= self.v_min) {
            return Err(Error::InvalidConfig(format!(
                "voltage sweep must satisfy v_min <= v_max and v_step > 0 \
                ( v_min: {}, v_max: {}, v_step: {} )",
                self.v_min, self.v_max, self.v_step,
            )));
        }
        let npoints = ((self.v_max - self.v_min) / self.v_step).ceil() as usize + 1;
        Ok(Array1::linspace(self.v_min, self.v_max, npoints))
    }
}

impl Experiment for CapacitanceVoltageSweep {
    type Output = CapacitanceVoltage;

    fn analyze(&self, desc: AnalyzeDescriptor) -> Result<CapacitanceVoltage, Error> {
        validate_step("del_v", self.del_v)?;
        if !(self.freq > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "freq must be positive ( freq: {} )",
                self.freq
            )));
        }

        let voltage = self.voltages()?;
        let segments = desc.table.segments()?;
        if segments.len() != voltage.len() {
            return Err(Error::SegmentMismatch {
                voltages: voltage.len(),
                segments: segments.len(),
            });
        }
        if let Some(ref bar) = desc.bar {
            bar.set_length(segments.len() as u64);
        }

        let config = KernelConfig::capacitance(self.freq, self.del_v);
        let mut capacitance = Array1::<f64>::zeros(segments.len());
        let mut error = Array1::<f64>::zeros(segments.len());

        for (k, segment) in segments.iter().enumerate() {
            let sample = decompose(segment, segment.len() - 1, &config);
            match sample.signal {
                SmallSignal::Capacitance { value, error: c_err } => {
                    capacitance[k] = value;
                    error[k] = c_err;
                }
                _ => unreachable!("capacitance kernel returned {:?}", sample.signal),
            }

            if let Some(ref bar) = desc.bar {
                bar.inc(1)
            }
        }

        Ok(CapacitanceVoltage {
            voltage,
            capacitance,
            error,
            frequency: self.freq,
            del_v: self.del_v,
        })
    }

    fn name(&self) -> &'static str {
        "cv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn voltages_include_both_ends() {
        let sweep = CapacitanceVoltageSweep {
            v_min: -0.5,
            v_max: 0.5,
            v_step: 0.25,
            del_v: 0.01,
            freq: 1e4,
        };
        let v = sweep.voltages().unwrap();
        assert_eq!(v.len(), 5);
        assert_relative_eq!(v[0], -0.5);
        assert_relative_eq!(v[2], 0.0);
        assert_relative_eq!(v[4], 0.5);
    }

    #[test]
    fn uneven_step_rounds_point_count_up() {
        let sweep = CapacitanceVoltageSweep {
            v_min: 0.0,
            v_max: 1.0,
            v_step: 0.3,
            del_v: 0.01,
            freq: 1e4,
        };
        // ceil(3.33) + 1 points, evenly spread over the range
        let v = sweep.voltages().unwrap();
        assert_eq!(v.len(), 5);
        assert_relative_eq!(v[1], 0.25);
    }

    #[test]
    fn rejects_non_positive_step() {
        let sweep = CapacitanceVoltageSweep {
            v_min: 0.0,
            v_max: 1.0,
            v_step: 0.0,
            del_v: 0.01,
            freq: 1e4,
        };
        assert!(matches!(sweep.voltages(), Err(Error::InvalidConfig(_))));
    }
}
