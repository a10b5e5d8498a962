//! Time-voltage-generation profiles that drive the time-domain simulator.
//!
//! Every profile starts at `t = 0` at the operating point, before the step.
//! From the first time step on, the perturbed voltage or generation rate is
//! held while the time step grows geometrically, so that the sample density
//! is roughly even per decade of frequency.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::table::format_sci;
use crate::Error;

/// Upper bound on the number of time steps in one transient.
const MAX_STEPS: usize = 1_000_000;

/// How time steps grow after the perturbation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeStepping {
    /// First time step as a fraction of the shortest period of interest.
    pub ini_time_factor: f64,
    /// Ratio between consecutive time steps.
    pub time_factor: f64,
}

impl Default for TimeStepping {
    fn default() -> Self {
        Self {
            ini_time_factor: 1e-3,
            time_factor: 1.02,
        }
    }
}

impl TimeStepping {
    /// Times after the step, from `ini_time_factor * t_short` up to exactly `t_end`.
    pub fn times(&self, t_short: f64, t_end: f64) -> Result<Vec<f64>, Error> {
        if !(self.ini_time_factor > 0.0) || !(self.time_factor >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "time stepping needs ini_time_factor > 0 and time_factor >= 1 \
                ( ini_time_factor: {}, time_factor: {} )",
                self.ini_time_factor, self.time_factor,
            )));
        }
        if !(t_short > 0.0 && t_short <= t_end && t_end.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "time window must satisfy 0 < t_short <= t_end ( t_short: {t_short}, t_end: {t_end} )"
            )));
        }

        let mut times = Vec::new();
        let mut delta = self.ini_time_factor * t_short;
        let mut t = delta;
        while t < t_end {
            times.push(t);
            if times.len() > MAX_STEPS {
                return Err(Error::InvalidConfig(format!(
                    "time stepping needs more than {MAX_STEPS} steps to reach {t_end:.3e} s"
                )));
            }
            delta *= self.time_factor;
            t += delta;
        }
        times.push(t_end);

        Ok(times)
    }
}

/// One row of a driving profile.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TvgRow {
    /// [s]
    pub time: f64,
    /// [V]
    pub voltage: f64,
    /// Generation rate as a fraction of the device's nominal generation.
    pub generation: f64,
}

/// A complete driving profile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    pub rows: Vec<TvgRow>,
}

impl Profile {
    /// Appends one transient: the operating point at `t = 0`, then the
    /// perturbed state at every time in `times`.
    fn push_transient(&mut self, before: (f64, f64), after: (f64, f64), times: &[f64]) {
        self.rows.push(TvgRow {
            time: 0.0,
            voltage: before.0,
            generation: before.1,
        });
        self.rows.extend(times.iter().map(|&time| TvgRow {
            time,
            voltage: after.0,
            generation: after.1,
        }));
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writeln!(writer, "t Vext G_frac")?;
        for row in &self.rows {
            writeln!(
                writer,
                "{} {} {}",
                format_sci(row.time, 3),
                format_sci(row.voltage, 3),
                format_sci(row.generation, 3),
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, filename: P) -> Result<(), Error> {
        let file = File::create(filename.as_ref())?;
        self.write(BufWriter::new(file))
    }
}

/// Voltage step of `del_v` on top of `v_0`, held until `1/f_min`.
pub fn impedance(
    v_0: f64,
    del_v: f64,
    g_frac: f64,
    f_min: f64,
    f_max: f64,
    stepping: &TimeStepping,
) -> Result<Profile, Error> {
    let times = stepping.times(f_max.recip(), f_min.recip())?;
    let mut profile = Profile::default();
    profile.push_transient((v_0, g_frac), (v_0 + del_v, g_frac), &times);
    Ok(profile)
}

/// Generation step of `del_g` on top of `g_frac`, held until `1/f_min`.
pub fn imps(
    v_0: f64,
    g_frac: f64,
    del_g: f64,
    f_min: f64,
    f_max: f64,
    stepping: &TimeStepping,
) -> Result<Profile, Error> {
    let times = stepping.times(f_max.recip(), f_min.recip())?;
    let mut profile = Profile::default();
    profile.push_transient((v_0, g_frac), (v_0, g_frac + del_g), &times);
    Ok(profile)
}

/// One voltage-step transient per DC bias in `voltages`, each lasting one
/// period of `freq`.
pub fn capacitance_voltage(
    voltages: &[f64],
    del_v: f64,
    g_frac: f64,
    freq: f64,
    stepping: &TimeStepping,
) -> Result<Profile, Error> {
    let period = freq.recip();
    let times = stepping.times(period, period)?;
    let mut profile = Profile::default();
    for &v in voltages {
        profile.push_transient((v, g_frac), (v + del_v, g_frac), &times);
    }
    Ok(profile)
}
