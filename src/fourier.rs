//! Fourier decomposition of step responses.
//!
//! After a small step at `t = 0` the response settles towards `I(∞)`. The
//! small-signal admittance at frequency `f` follows from the residual
//! `I(t) - I(∞)` integrated against `sin(2πft)` and `cos(2πft)` (Laux, 1985):
//!
//! `Y = I(∞) - I(0) + 2πf ∫ sin(2πft) ΔI dt + j 2πf ∫ cos(2πft) ΔI dt`
//!
//! The same integrals are repeated with the numerical error of the simulator
//! added to the current, giving an error estimate for every value.

use std::f64::consts::PI;

use ndarray::{s, ArrayView1, Zip};
use num_complex::Complex64;

use crate::transient::Segment;

/// Where the evaluated frequency comes from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Frequency {
    /// `1/time[imax]`, one frequency per integration window.
    Implied,
    /// A fixed modulation frequency [Hz].
    Fixed(f64),
}

/// Contact resistances removed from the device during the transient.
///
/// The simulator runs without the series resistance and with a negated shunt
/// to help convergence, so the physical impedance is rebuilt afterwards.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContactResistance {
    /// Series resistance [Ω m²].
    pub series: f64,
    /// Shunt resistance [Ω m²].
    pub shunt: f64,
}

impl ContactResistance {
    /// No series resistance and an infinite shunt.
    #[inline]
    pub fn is_ideal(&self) -> bool {
        self.series == 0.0 && self.shunt.is_infinite()
    }

    /// `Z = Rseries + 1/(1/Z_raw + 1/Rshunt)`
    pub fn apply(&self, z_raw: Complex64) -> Complex64 {
        if self.is_ideal() {
            return z_raw;
        }
        Complex64::from(self.series) + (z_raw.inv() + self.shunt.recip()).inv()
    }
}

/// Which quantity the kernel reports.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Output {
    /// Complex admittance.
    Admittance,
    /// Complex impedance, optionally corrected for contact resistances.
    Impedance(Option<ContactResistance>),
    /// Real capacitance from the cosine channel only.
    Capacitance,
}

/// Parameters of one Fourier decomposition.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KernelConfig {
    pub frequency: Frequency,
    /// Size of the perturbation step the result is divided by.
    pub normalize_by: Option<f64>,
    pub output: Output,
    /// Whether the sample at `imax` itself takes part in the integration.
    pub include_endpoint: bool,
}

impl KernelConfig {
    /// Admittance response to an unnormalized step, as used for IMPS.
    pub fn admittance() -> Self {
        Self {
            frequency: Frequency::Implied,
            normalize_by: None,
            output: Output::Admittance,
            include_endpoint: false,
        }
    }

    /// Impedance response to a voltage step of `v_step`.
    pub fn impedance(v_step: f64, contacts: Option<ContactResistance>) -> Self {
        Self {
            frequency: Frequency::Implied,
            normalize_by: Some(v_step),
            output: Output::Impedance(contacts),
            include_endpoint: false,
        }
    }

    /// Capacitance at a fixed `frequency` from a voltage step of `v_step`.
    pub fn capacitance(frequency: f64, v_step: f64) -> Self {
        Self {
            frequency: Frequency::Fixed(frequency),
            normalize_by: Some(v_step),
            output: Output::Capacitance,
            include_endpoint: true,
        }
    }
}

/// A small-signal value together with its numerical error.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SmallSignal {
    Admittance { value: Complex64, error: Complex64 },
    Impedance { value: Complex64, error: Complex64 },
    Capacitance { value: f64, error: f64 },
}

impl SmallSignal {
    pub fn is_finite(&self) -> bool {
        match *self {
            SmallSignal::Admittance { value, error } | SmallSignal::Impedance { value, error } => {
                value.is_finite() && error.is_finite()
            }
            SmallSignal::Capacitance { value, error } => value.is_finite() && error.is_finite(),
        }
    }
}

/// One evaluated frequency point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrequencySample {
    /// [Hz]
    pub frequency: f64,
    pub signal: SmallSignal,
}

impl FrequencySample {
    #[inline]
    pub fn angular_frequency(&self) -> f64 {
        2.0 * PI * self.frequency
    }
}

/// Decomposes `segment` up to sample `imax`, which is taken as the settled state.
///
/// `imax` must be at least 1 and inside the segment. Degenerate inputs are not
/// rejected: they show up as `inf` or `nan` in the result.
///
/// # Panics
///
/// If `imax` is past the end of the segment.
pub fn decompose(segment: &Segment, imax: usize, config: &KernelConfig) -> FrequencySample {
    assert!(
        imax < segment.len(),
        "window end {} outside a segment of {} samples",
        imax,
        segment.len()
    );
    let frequency = match config.frequency {
        Frequency::Implied => segment.time[imax].recip(),
        Frequency::Fixed(f) => f,
    };
    let omega = 2.0 * PI * frequency;

    let settled = segment.current[imax];
    let settled_err = settled + segment.error[imax];
    let end = if config.include_endpoint { imax + 1 } else { imax };
    let time = segment.time.slice(s![..end]);
    let current = segment.current.slice(s![..end]);
    let error = segment.error.slice(s![..end]);

    let residual = current.mapv(|i| i - settled);
    let perturbed = Zip::from(&current)
        .and(&error)
        .map_collect(|&i, &e| i + e - settled_err);

    let with_sin = !matches!(config.output, Output::Capacitance);
    let (sin_res, cos_res) = weighted_integrals(time, residual.view(), omega, with_sin);
    let (sin_err, cos_err) = weighted_integrals(time, perturbed.view(), omega, with_sin);

    let step = config.normalize_by.unwrap_or(1.0);
    let signal = match config.output {
        Output::Capacitance => {
            let value = cos_res / step;
            let value_err = cos_err / step;
            SmallSignal::Capacitance {
                value,
                error: (value - value_err).abs(),
            }
        }
        Output::Admittance | Output::Impedance(_) => {
            let delta = settled - segment.current[0];
            let y = Complex64::new(delta + omega * sin_res, omega * cos_res) / step;
            let y_err = Complex64::new(delta + omega * sin_err, omega * cos_err) / step;
            match config.output {
                Output::Impedance(contacts) => {
                    let to_impedance = |y: Complex64| match contacts {
                        Some(contacts) => contacts.apply(y.inv()),
                        None => y.inv(),
                    };
                    let value = to_impedance(y);
                    SmallSignal::Impedance {
                        value,
                        error: value - to_impedance(y_err),
                    }
                }
                _ => SmallSignal::Admittance {
                    value: y,
                    error: y - y_err,
                },
            }
        }
    };

    if !signal.is_finite() {
        log::warn!(
            "non-finite small-signal value at {:.3e} Hz ( samples {}..={} )",
            frequency,
            segment.start_index,
            segment.start_index + imax,
        );
    }

    FrequencySample { frequency, signal }
}

/// Trapezoidal integral of `y` over `x`.
pub fn trapz(y: ArrayView1<f64>, x: ArrayView1<f64>) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    Zip::from(y.windows(2))
        .and(x.windows(2))
        .fold(0.0, |acc, y, x| acc + 0.5 * (x[1] - x[0]) * (y[0] + y[1]))
}

/// Integrals of `residual` weighted by `sin(ωt)` and `cos(ωt)`.
fn weighted_integrals(
    time: ArrayView1<f64>,
    residual: ArrayView1<f64>,
    omega: f64,
    with_sin: bool,
) -> (f64, f64) {
    let cos = Zip::from(&time)
        .and(&residual)
        .map_collect(|&t, &r| (omega * t).cos() * r);
    let cos_int = trapz(cos.view(), time);

    let sin_int = if with_sin {
        let sin = Zip::from(&time)
            .and(&residual)
            .map_collect(|&t, &r| (omega * t).sin() * r);
        trapz(sin.view(), time)
    } else {
        0.0
    };

    (sin_int, cos_int)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transient::TransientTable;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};

    fn table(time: Array1<f64>, current: Array1<f64>, error: Array1<f64>) -> TransientTable {
        TransientTable::new(time, None, current, error).unwrap()
    }

    #[test]
    fn trapz_of_linear_function() {
        let x = Array1::linspace(0.0, 2.0, 5);
        let y = x.mapv(|x| 3.0 * x);
        assert_relative_eq!(trapz(y.view(), x.view()), 6.0, epsilon = 1e-12);
        assert_eq!(trapz(array![1.0].view(), array![0.0].view()), 0.0);
    }

    #[test]
    fn settled_current_gives_zero() {
        let t = table(
            array![0.0, 1e-6, 3e-6, 7e-6, 1.5e-5],
            Array1::from_elem(5, 2.5),
            Array1::from_elem(5, 1e-3),
        );
        let seg = t.whole().unwrap();
        for config in [KernelConfig::admittance(), KernelConfig::capacitance(1e4, 0.01)] {
            for imax in 1..5 {
                match decompose(&seg, imax, &config).signal {
                    SmallSignal::Admittance { value, error } => {
                        assert_eq!(value, Complex64::new(0.0, 0.0));
                        assert_eq!(error, Complex64::new(0.0, 0.0));
                    }
                    SmallSignal::Capacitance { value, error } => {
                        assert_eq!(value, 0.0);
                        assert_eq!(error, 0.0);
                    }
                    other => panic!("unexpected signal {other:?}"),
                }
            }
        }
    }

    #[test]
    fn frequency_is_reciprocal_of_window_end() {
        let t = table(
            array![0.0, 2e-6, 5e-6, 4e-5],
            array![1.0, 0.5, 0.2, 0.0],
            Array1::zeros(4),
        );
        let seg = t.whole().unwrap();
        for imax in 1..4 {
            let sample = decompose(&seg, imax, &KernelConfig::admittance());
            assert_eq!(sample.frequency, 1.0 / t.time[imax]);
        }
    }

    #[test]
    fn impedance_without_contacts_is_inverse_admittance() {
        let t = table(
            array![0.0, 1e-6, 2e-6, 4e-6, 8e-6],
            array![0.0, 0.8, 0.9, 0.97, 1.0],
            array![0.0, 1e-4, 1e-4, 1e-4, 1e-4],
        );
        let seg = t.whole().unwrap();
        let y = match decompose(&seg, 4, &KernelConfig::admittance()).signal {
            SmallSignal::Admittance { value, .. } => value / 0.01,
            other => panic!("unexpected signal {other:?}"),
        };
        let ideal = ContactResistance { series: 0.0, shunt: f64::INFINITY };
        for contacts in [None, Some(ideal)] {
            match decompose(&seg, 4, &KernelConfig::impedance(0.01, contacts)).signal {
                SmallSignal::Impedance { value, .. } => assert_eq!(value, y.inv()),
                other => panic!("unexpected signal {other:?}"),
            }
        }
    }

    #[test]
    fn contact_correction() {
        let contacts = ContactResistance { series: 2.0, shunt: 10.0 };
        let z = contacts.apply(Complex64::new(10.0, 0.0));
        assert_relative_eq!(z.re, 7.0, epsilon = 1e-12);
        assert_relative_eq!(z.im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn capacitance_integrates_through_endpoint() {
        // one sample of residual, integrated over the whole segment
        let t = table(array![0.0, 1.0, 2.0], array![2.0, 1.0, 1.0], Array1::zeros(3));
        let seg = t.whole().unwrap();
        let sample = decompose(&seg, 2, &KernelConfig::capacitance(1e-9, 0.5));
        match sample.signal {
            SmallSignal::Capacitance { value, error } => {
                // trapz([1, 0, 0]) = 0.5, divided by the step
                assert_relative_eq!(value, 1.0, epsilon = 1e-9);
                assert_eq!(error, 0.0);
            }
            other => panic!("unexpected signal {other:?}"),
        }
        assert_eq!(sample.frequency, 1e-9);
    }

    #[test]
    fn error_follows_numerical_noise() {
        let t = table(
            array![0.0, 1.0, 2.0],
            array![2.0, 1.0, 1.0],
            array![0.2, 0.0, 0.0],
        );
        let seg = t.whole().unwrap();
        match decompose(&seg, 2, &KernelConfig::capacitance(1e-9, 1.0)).signal {
            SmallSignal::Capacitance { error, .. } => assert_relative_eq!(error, 0.1, epsilon = 1e-9),
            other => panic!("unexpected signal {other:?}"),
        }
    }

    fn noisy_step() -> TransientTable {
        // f = 0.5 Hz at imax = 2, so the cosine weights are [1, -1]
        table(
            array![0.0, 1.0, 2.0],
            array![2.0, 1.0, 1.0],
            array![0.2, 0.1, 0.0],
        )
    }

    #[test]
    fn admittance_error_from_varying_noise() {
        let t = noisy_step();
        let seg = t.whole().unwrap();
        match decompose(&seg, 2, &KernelConfig::admittance()).signal {
            SmallSignal::Admittance { value, error } => {
                // Y = -1 + jπ/2, Y' = -1 + j0.55π
                assert_relative_eq!(value.re, -1.0, epsilon = 1e-12);
                assert_relative_eq!(value.im, 0.5 * PI, epsilon = 1e-12);
                assert_relative_eq!(error.re, 0.0, epsilon = 1e-12);
                assert_relative_eq!(error.im, -0.05 * PI, epsilon = 1e-12);
            }
            other => panic!("unexpected signal {other:?}"),
        }
    }

    #[test]
    fn impedance_error_through_contacts() {
        let t = noisy_step();
        let seg = t.whole().unwrap();
        let contacts = ContactResistance { series: 1.0, shunt: 2.0 };
        match decompose(&seg, 2, &KernelConfig::impedance(0.5, Some(contacts))).signal {
            SmallSignal::Impedance { value, error } => {
                // Y = -2 + jπ and Y' = -2 + j1.1π after dividing by the step,
                // the shunt adds 0.5 and the series part cancels in the error
                let expected = Complex64::new(-1.5, PI).inv() - Complex64::new(-1.5, 1.1 * PI).inv();
                let z = 1.0 + Complex64::new(-1.5, PI).inv();
                assert_relative_eq!(value.re, z.re, epsilon = 1e-12);
                assert_relative_eq!(value.im, z.im, epsilon = 1e-12);
                assert_relative_eq!(error.re, expected.re, epsilon = 1e-12);
                assert_relative_eq!(error.im, expected.im, epsilon = 1e-12);
                assert!(error.norm() > 1e-3);
            }
            other => panic!("unexpected signal {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "outside a segment")]
    fn window_end_past_segment_panics() {
        let t = noisy_step();
        let seg = t.whole().unwrap();
        decompose(&seg, 3, &KernelConfig::admittance());
    }
}
