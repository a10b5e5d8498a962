use smallsignal::prelude::*;
use smallsignal::experiment::Impedance;
use smallsignal::tvg::{self, TimeStepping};

fn main() {
    let f_min = 1e1; // [Hz]
    let f_max = 1e6; // [Hz]
    let v_step = 0.01; // [V]
    let resistance = 50.0; // [Ω m²]
    let tau = 1e-5; // [s]

    std::fs::create_dir_all("data").unwrap();

    // driving profile for the time-domain simulator
    let profile = tvg::impedance(0.0, v_step, 1.0, f_min, f_max, &TimeStepping::default())
        .unwrap();
    profile.save("data/tVG_impedance.txt").unwrap();

    // stand-in for the simulator: a parallel RC step response
    let mut text = String::from("t Vext Jext errJ\n");
    for (i, row) in profile.rows.iter().enumerate() {
        let current = if i == 0 {
            0.0
        } else {
            v_step / resistance * (1.0 + 10.0 * (-row.time / tau).exp())
        };
        text.push_str(&format!("{:e} {:e} {:e} {:e}\n", row.time, row.voltage, current, 1e-12));
    }
    std::fs::write("data/tj_impedance.dat", text).unwrap();

    let analysis = Analysis::new(AnalysisDescriptor {
        experiment: Impedance {
            f_min,
            f_max,
            f_steps: 20,
            v_step,
            contacts: Some(ContactResistance {
                series: 1e-4,
                shunt: 1e4,
            }),
        },
        table: TransientTable::read("data/tj_impedance.dat").unwrap(),
    })
    .unwrap();

    println!(
        "\n-- General Analysis Info --\n\
        # of samples: {}\n\
        f range:      {:<9.2e} - {:<9.2e} Hz\n",
        analysis.table().len(),
        f_min,
        f_max,
    );

    let spectrum = analysis.run(RunDescriptor {
        verbose: true,
        save_settings: Some(SaveSettings {
            filename: "data/freqZ.dat",
            save_format: SaveFormat::Text,
            overwrite: true,
        }),
    })
    .unwrap();

    let last = spectrum.frequency.len() - 1;
    println!(
        "C at {:.2e} Hz: {:.3e} F/m²",
        spectrum.frequency[last],
        spectrum.capacitance[last],
    );
}
