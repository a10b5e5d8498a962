use std::f64::consts::PI;

use approx::assert_relative_eq;
use ndarray::Array1;

use smallsignal::experiment::{Impedance, Imps};
use smallsignal::prelude::*;
use smallsignal::tvg::{self, TimeStepping};

const F_MIN: f64 = 10.0;
const F_MAX: f64 = 1e5;

/// Transient on the time grid the simulator would be driven with.
fn transient<F: Fn(usize, f64) -> f64>(current_at: F) -> TransientTable {
    let profile = tvg::impedance(0.0, 0.01, 1.0, F_MIN, F_MAX, &TimeStepping::default()).unwrap();
    let time = profile.rows.iter().map(|r| r.time).collect::<Array1<f64>>();
    let current = time
        .iter()
        .enumerate()
        .map(|(i, &t)| current_at(i, t))
        .collect::<Array1<f64>>();
    let n = time.len();
    TransientTable::new(time, None, current, Array1::zeros(n)).unwrap()
}

fn analyze<E: Experiment>(experiment: E, table: TransientTable) -> E::Output {
    Analysis::new(AnalysisDescriptor { experiment, table })
        .unwrap()
        .run::<&str>(RunDescriptor { verbose: false, save_settings: None })
        .unwrap()
}

#[test]
fn rc_decay_capacitance_at_low_frequency() {
    let tau = 1e-6;
    let v_step = 0.01;
    let table = transient(|_, t| (-t / tau).exp());

    let spectrum = analyze(
        Impedance {
            f_min: F_MIN,
            f_max: F_MAX,
            f_steps: 10,
            v_step,
            contacts: Some(ContactResistance { series: 0.0, shunt: 1e12 }),
        },
        table,
    );

    assert_relative_eq!(spectrum.frequency[0], F_MIN, max_relative = 1e-12);
    assert_relative_eq!(spectrum.capacitance[0], tau / v_step, max_relative = 0.05);
    assert!(spectrum.frequency.windows(2).into_iter().all(|w| w[0] < w[1]));
}

#[test]
fn resistor_with_contacts() {
    // current jumps to V/R right after the step
    let v_step = 0.01;
    let resistance = 100.0;
    let table = transient(|i, _| if i == 0 { 0.0 } else { v_step / resistance });
    let contacts = ContactResistance { series: 10.0, shunt: 1000.0 };

    let spectrum = analyze(
        Impedance { f_min: F_MIN, f_max: F_MAX, f_steps: 10, v_step, contacts: Some(contacts) },
        table,
    );

    let expected = 10.0 + 1.0 / (1.0 / resistance + 1.0 / 1000.0);
    for (z, err) in spectrum.impedance.iter().zip(spectrum.error.iter()) {
        assert_relative_eq!(z.re, expected, max_relative = 1e-3);
        assert!(z.im.abs() < 1e-2 * expected);
        assert_eq!(err.re, 0.0);
        assert_eq!(err.im, 0.0);
    }
    for (g, z) in spectrum.conductance.iter().zip(spectrum.impedance.iter()) {
        assert_relative_eq!(*g, z.inv().re, max_relative = 1e-12);
    }
}

#[test]
fn imps_admittance_of_decay() {
    let tau = 1e-6;
    let table = transient(|_, t| (-t / tau).exp());

    let spectrum = analyze(Imps { f_min: F_MIN, f_max: F_MAX, f_steps: 10 }, table);

    assert_relative_eq!(spectrum.frequency[0], F_MIN, max_relative = 1e-12);
    assert!(spectrum.frequency.windows(2).into_iter().all(|w| w[0] < w[1]));

    let y = spectrum.admittance[0];
    let omega = 2.0 * PI * spectrum.frequency[0];
    assert_relative_eq!(y.re, -1.0, max_relative = 1e-3);
    assert_relative_eq!(y.im / omega, tau, max_relative = 0.05);
    assert_eq!(spectrum.frequency.len(), spectrum.error.len());
}

#[test]
fn unreachable_highest_frequency() {
    let table = transient(|_, _| 1.0);
    let result = Analysis::new(AnalysisDescriptor {
        experiment: Imps { f_min: F_MIN, f_max: 1e9, f_steps: 10 },
        table,
    })
    .unwrap()
    .run::<&str>(RunDescriptor { verbose: false, save_settings: None });
    assert!(matches!(result, Err(Error::IndexNotFound)));
}
