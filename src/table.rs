//! Result tables and their text representation.

use std::io::Write;

use ndarray::{Array1, Array2, Axis};
use num_complex::Complex64;

use crate::fourier::ContactResistance;
use crate::Error;

/// A result that can be laid out as named numeric columns.
pub trait Tabulate {
    /// Column names, in output order.
    fn columns(&self) -> &'static [&'static str];
    /// One row per sample, one column per name in `columns`.
    fn rows(&self) -> Array2<f64>;
    /// Name of the group the table is stored under.
    fn group(&self) -> &'static str;
    /// Scalar parameters stored alongside the table.
    fn attributes(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }

    fn len(&self) -> usize {
        self.rows().nrows()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes a header row followed by `%.6e` formatted rows.
    fn write_text<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writeln!(writer, "{}", self.columns().join(" "))?;
        for row in self.rows().axis_iter(Axis(0)) {
            let fields = row.iter().map(|&x| format_sci(x, 6)).collect::<Vec<_>>();
            writeln!(writer, "{}", fields.join(" "))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Impedance spectrum, ascending in frequency.
#[derive(Clone, Debug)]
pub struct ImpedanceSpectrum {
    /// [Hz]
    pub frequency: Array1<f64>,
    /// [Ω m²]
    pub impedance: Array1<Complex64>,
    pub error: Array1<Complex64>,
    /// Parallel capacitance from `Im(1/Z)/ω` [F/m²].
    pub capacitance: Array1<f64>,
    /// Parallel conductance from `Re(1/Z)` [S/m²].
    pub conductance: Array1<f64>,
    pub v_step: f64,
    pub contacts: Option<ContactResistance>,
}

impl Tabulate for ImpedanceSpectrum {
    fn columns(&self) -> &'static [&'static str] {
        &["freq", "ReZ", "ImZ", "ReErrZ", "ImErrZ", "C", "G"]
    }

    fn rows(&self) -> Array2<f64> {
        stack_columns(&[
            self.frequency.clone(),
            self.impedance.mapv(|z| z.re),
            self.impedance.mapv(|z| z.im),
            self.error.mapv(|z| z.re),
            self.error.mapv(|z| z.im),
            self.capacitance.clone(),
            self.conductance.clone(),
        ])
    }

    fn group(&self) -> &'static str {
        "impedance"
    }

    fn attributes(&self) -> Vec<(&'static str, f64)> {
        let mut attrs = vec![("v_step", self.v_step)];
        if let Some(contacts) = self.contacts {
            attrs.push(("r_series", contacts.series));
            attrs.push(("r_shunt", contacts.shunt));
        }
        attrs
    }
}

/// IMPS admittance spectrum, ascending in frequency.
#[derive(Clone, Debug)]
pub struct ImpsSpectrum {
    /// [Hz]
    pub frequency: Array1<f64>,
    pub admittance: Array1<Complex64>,
    pub error: Array1<Complex64>,
}

impl Tabulate for ImpsSpectrum {
    fn columns(&self) -> &'static [&'static str] {
        &["freq", "ReY", "ImY", "ReErrY", "ImErrY"]
    }

    fn rows(&self) -> Array2<f64> {
        stack_columns(&[
            self.frequency.clone(),
            self.admittance.mapv(|y| y.re),
            self.admittance.mapv(|y| y.im),
            self.error.mapv(|y| y.re),
            self.error.mapv(|y| y.im),
        ])
    }

    fn group(&self) -> &'static str {
        "imps"
    }
}

/// Capacitance against DC bias.
#[derive(Clone, Debug)]
pub struct CapacitanceVoltage {
    /// [V]
    pub voltage: Array1<f64>,
    /// [F/m²]
    pub capacitance: Array1<f64>,
    pub error: Array1<f64>,
    /// Modulation frequency [Hz].
    pub frequency: f64,
    pub del_v: f64,
}

impl Tabulate for CapacitanceVoltage {
    fn columns(&self) -> &'static [&'static str] {
        &["V", "cap", "errC"]
    }

    fn rows(&self) -> Array2<f64> {
        stack_columns(&[
            self.voltage.clone(),
            self.capacitance.clone(),
            self.error.clone(),
        ])
    }

    fn group(&self) -> &'static str {
        "cv"
    }

    fn attributes(&self) -> Vec<(&'static str, f64)> {
        vec![("freq", self.frequency), ("del_v", self.del_v)]
    }
}

fn stack_columns(columns: &[Array1<f64>]) -> Array2<f64> {
    let nrows = columns.first().map_or(0, |c| c.len());
    Array2::from_shape_fn((nrows, columns.len()), |(i, j)| columns[j][i])
}

/// Formats like C's `%.*e`: a signed exponent of at least two digits.
pub fn format_sci(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{:.*e}", precision, value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}
