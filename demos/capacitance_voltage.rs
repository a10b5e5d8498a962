use smallsignal::prelude::*;
use smallsignal::experiment::CapacitanceVoltageSweep;
use smallsignal::tvg::{self, TimeStepping};

fn main() {
    let sweep = CapacitanceVoltageSweep {
        v_min: -0.5, // [V]
        v_max: 0.5, // [V]
        v_step: 0.1, // [V]
        del_v: 0.01, // [V]
        freq: 1e4, // [Hz]
    };
    let stepping = TimeStepping {
        ini_time_factor: 1e-5,
        time_factor: 1.02,
    };

    std::fs::create_dir_all("data").unwrap();
    let voltages = sweep.voltages().unwrap();
    let profile = tvg::capacitance_voltage(
        voltages.as_slice().unwrap(),
        sweep.del_v,
        0.0,
        sweep.freq,
        &stepping,
    )
    .unwrap();
    profile.save("data/tVG_CV.txt").unwrap();

    // stand-in for the simulator: a depletion capacitance shrinking with reverse bias
    let mut text = String::from("t Vext Jext errJ\n");
    let mut bias = 0;
    for (i, row) in profile.rows.iter().enumerate() {
        if row.time == 0.0 && i > 0 {
            bias += 1;
        }
        let tau = 1e-7 / f64::sqrt(1.0 - voltages[bias] / 1.2);
        let current = 1e-3 + (-row.time / tau).exp();
        text.push_str(&format!("{:e} {:e} {:e} {:e}\n", row.time, row.voltage, current, 1e-12));
    }
    std::fs::write("data/tj_CV.dat", text).unwrap();

    let analysis = Analysis::new(AnalysisDescriptor {
        experiment: sweep,
        table: TransientTable::read("data/tj_CV.dat").unwrap(),
    })
    .unwrap();

    println!("-- Run --");
    let cv = analysis.run(RunDescriptor {
        verbose: true,
        save_settings: Some(SaveSettings {
            filename: "data/CapVol.h5",
            save_format: SaveFormat::Hdf5,
            overwrite: true,
        }),
    })
    .unwrap();

    for (v, c) in cv.voltage.iter().zip(cv.capacitance.iter()) {
        println!("{:>6.2} V  {:.3e} F/m²", v, c);
    }
}
