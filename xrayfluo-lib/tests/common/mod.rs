#![allow(dead_code)]

use xrayfluo::{AttenuationTable, Element, Elements, Subshell, TabulatedCurve};

/// A copper-like element with K and L decay data, an attenuation table with
/// a K edge between 8.97 and 8.99 keV, and partial photoelectric curves.
pub fn toy_element() -> Element {
    let mut el = Element::new("Cu", 29, 63.546).unwrap();
    el.set_density(8.96).unwrap();
    el.set_binding_energies(
        &["K", "L1", "L2", "L3", "M1", "M2", "M3", "M4", "M5"],
        &[8.979, 1.096, 0.951, 0.931, 0.1225, 0.0773, 0.0751, 0.0016, 0.0015],
    )
    .unwrap();

    el.set_shell_constants(Subshell::K, &["omega"], &[0.44]).unwrap();
    el.set_shell_constants(Subshell::L1, &["omega", "f12", "f13"], &[0.001, 0.1, 0.6])
        .unwrap();
    el.set_shell_constants(Subshell::L2, &["omega", "f23"], &[0.006, 0.05])
        .unwrap();
    el.set_shell_constants(Subshell::L3, &["omega"], &[0.006]).unwrap();

    el.set_radiative_transitions(Subshell::K, &["KL2", "KL3", "KM3"], &[0.5, 1.0, 0.2])
        .unwrap();
    el.set_radiative_transitions(Subshell::L1, &["L1M2", "L1M3"], &[0.5, 0.5])
        .unwrap();
    el.set_radiative_transitions(Subshell::L2, &["L2M1", "L2M4"], &[0.1, 1.0])
        .unwrap();
    el.set_radiative_transitions(Subshell::L3, &["L3M1", "L3M5"], &[0.1, 1.0])
        .unwrap();

    el.set_nonradiative_transitions(Subshell::K, &["KL1L1", "KL2L3", "KL3L3"], &[0.1, 0.5, 0.4])
        .unwrap();
    el.set_nonradiative_transitions(Subshell::L1, &["L1L2M1", "L1L3M4", "L1M4M5"], &[0.1, 0.6, 0.3])
        .unwrap();
    el.set_nonradiative_transitions(Subshell::L2, &["L2L3M4", "L2M4M5"], &[0.05, 0.95])
        .unwrap();
    el.set_nonradiative_transitions(Subshell::L3, &["L3M4M5"], &[1.0])
        .unwrap();

    el.set_mass_attenuation(toy_attenuation());
    el.set_partial_photoelectric(
        Subshell::K,
        TabulatedCurve::new(vec![8.979, 12.0, 20.0, 50.0], vec![260.0, 135.0, 31.0, 2.7]).unwrap(),
    );
    let l_grid = vec![1.096, 2.0, 5.0, 10.0, 20.0, 50.0];
    el.set_partial_photoelectric(
        Subshell::L1,
        TabulatedCurve::new(l_grid.clone(), vec![600.0, 120.0, 12.0, 2.0, 0.3, 0.02]).unwrap(),
    );
    el.set_partial_photoelectric(
        Subshell::L2,
        TabulatedCurve::new(
            vec![0.951, 2.0, 5.0, 10.0, 20.0, 50.0],
            vec![2000.0, 400.0, 30.0, 4.0, 0.5, 0.03],
        )
        .unwrap(),
    );
    el.set_partial_photoelectric(
        Subshell::L3,
        TabulatedCurve::new(
            vec![0.931, 2.0, 5.0, 10.0, 20.0, 50.0],
            vec![4000.0, 800.0, 60.0, 8.0, 1.0, 0.06],
        )
        .unwrap(),
    );
    el
}

pub const GRID: [f64; 8] = [1.0, 2.0, 5.0, 8.97, 8.99, 12.0, 20.0, 50.0];
pub const PHOTOELECTRIC: [f64; 8] = [1.0e4, 2000.0, 150.0, 40.0, 300.0, 150.0, 35.0, 3.0];
pub const COHERENT: [f64; 8] = [5.0, 3.0, 1.0, 0.5, 0.5, 0.4, 0.2, 0.05];
pub const INCOHERENT: [f64; 8] = [0.05, 0.08, 0.1, 0.12, 0.12, 0.12, 0.13, 0.13];

pub fn toy_attenuation() -> AttenuationTable {
    AttenuationTable::new(
        GRID.to_vec(),
        PHOTOELECTRIC.to_vec(),
        COHERENT.to_vec(),
        INCOHERENT.to_vec(),
        Vec::new(),
    )
    .unwrap()
}

/// A light element with a flat attenuation table and no decay data.
pub fn filler_element() -> Element {
    let mut el = Element::new("Si", 14, 28.086).unwrap();
    el.set_binding_energies(&["K"], &[1.839]).unwrap();
    el.set_mass_attenuation(
        AttenuationTable::new(
            vec![1.0, 50.0],
            vec![100.0, 100.0],
            vec![1.0, 1.0],
            vec![0.1, 0.1],
            Vec::new(),
        )
        .unwrap(),
    );
    el
}

pub fn registry() -> Elements {
    [toy_element(), filler_element()].into_iter().collect()
}

/// Composite Simpson rule with `n` (even) intervals.
pub fn simpson(a: f64, b: f64, n: usize, f: impl Fn(f64) -> f64) -> f64 {
    let h = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for i in 1..n {
        let w = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += w * f(a + i as f64 * h);
    }
    sum * h / 3.0
}
