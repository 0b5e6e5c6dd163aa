mod common;

use approx::assert_relative_eq;
use common::toy_element;
use tracing_subscriber::EnvFilter;
use xrayfluo::{
    AttenuationTable, Element, FULL_CASCADE, LineFlag, Subshell, TabulatedCurve,
    VacancyDistribution, XrayFluoError,
};

fn unit(subshell: &str) -> VacancyDistribution {
    VacancyDistribution::from_labels(&[subshell], &[1.0]).unwrap()
}

#[test]
fn test_single_line_zero_generations() {
    let mut el = Element::new("Xx", 40, 91.2).unwrap();
    el.set_binding_energies(&["K", "L3"], &[10.0, 1.5]).unwrap();
    el.set_shell_constants(Subshell::K, &["omega"], &[0.3]).unwrap();
    el.set_radiative_transitions(Subshell::K, &["KL3"], &[1.0]).unwrap();

    let lines = el.x_ray_lines_from_vacancy_distribution(&unit("K"), 0, true);
    assert_eq!(lines.len(), 1);
    let kl3 = lines.get("KL3").unwrap();
    assert_relative_eq!(kl3.energy, 8.5);
    assert_relative_eq!(kl3.rate, 0.3);
}

#[test]
fn test_below_edge_has_no_k_vacancy() {
    let mut el = Element::new("Xx", 40, 91.2).unwrap();
    el.set_binding_energies(&["K", "L3"], &[10.0, 1.5]).unwrap();
    el.set_mass_attenuation(
        AttenuationTable::new(
            vec![1.0, 9.99, 10.0, 50.0],
            vec![500.0, 20.0, 150.0, 5.0],
            vec![1.0; 4],
            vec![0.1; 4],
            Vec::new(),
        )
        .unwrap(),
    );
    el.set_partial_photoelectric(
        Subshell::K,
        TabulatedCurve::new(vec![10.0, 50.0], vec![130.0, 4.3]).unwrap(),
    );
    let d = el.initial_photoelectric_vacancy_distribution(9.9).unwrap();
    assert!(d.contains(Subshell::K));
    assert_eq!(d.get(Subshell::K), 0.0);
    assert_relative_eq!(d.rest(), 1.0);

    let above = el.initial_photoelectric_vacancy_distribution(10.0).unwrap();
    assert_relative_eq!(above.get(Subshell::K), 130.0 / 150.0, max_relative = 1e-12);
}

#[test]
fn test_coster_kronig_step_conserves_total() {
    let el = toy_element();
    let d = VacancyDistribution::from_labels(&["L1", "L2", "L3", "REST"], &[0.5, 0.3, 0.15, 0.05])
        .unwrap();
    let m = el.cascade_modified_vacancy_distribution(&d);
    assert_relative_eq!(m.total(), d.total(), epsilon = 1e-15);
    assert_relative_eq!(m.get(Subshell::L1), 0.5 * 0.3, epsilon = 1e-15);
    assert_relative_eq!(m.get(Subshell::L2), 0.3 * 0.95 + 0.5 * 0.1, epsilon = 1e-15);
    assert_relative_eq!(m.get(Subshell::L3), 0.15 + 0.3 * 0.05 + 0.5 * 0.6, epsilon = 1e-15);
    assert_eq!(m.rest(), 0.05);
}

#[test]
fn test_ratios_sum_to_one() {
    let el = toy_element();
    for subshell in [Subshell::K, Subshell::L1, Subshell::L2, Subshell::L3] {
        let shell = el.shell(subshell).unwrap();
        let radiative: f64 = shell.fluorescence_ratios().values().sum();
        let nonradiative: f64 = shell.nonradiative_ratios().values().sum();
        assert_relative_eq!(radiative, 1.0, epsilon = 1e-14);
        assert_relative_eq!(nonradiative, 1.0, epsilon = 1e-14);
        let auger = shell.auger_ratios();
        if !auger.is_empty() {
            assert_relative_eq!(auger.values().sum::<f64>(), 1.0, epsilon = 1e-14);
        }
    }
    // L1 Auger part is L1M4M5 alone once the Coster-Kronig channels are removed
    let l1 = el.auger_ratios(Subshell::L1).unwrap();
    assert_eq!(l1.len(), 1);
    assert_relative_eq!(l1["L1M4M5"], 1.0);
    let ck = el.coster_kronig_ratios(Subshell::L1).unwrap();
    assert!(ck.contains_key(&Subshell::L2));
    assert!(ck.contains_key(&Subshell::L3));
}

#[test]
fn test_full_cascade_from_k_vacancy() {
    let el = toy_element();
    let lines = el.x_ray_lines_from_vacancy_distribution(&unit("K"), FULL_CASCADE, true);

    let omega_k = 0.44;
    assert_relative_eq!(lines.get("KL3").unwrap().rate, omega_k / 1.7, max_relative = 1e-14);
    assert_relative_eq!(lines.get("KL2").unwrap().rate, omega_k * 0.5 / 1.7, max_relative = 1e-14);
    assert_relative_eq!(
        lines.get("KL3").unwrap().energy,
        8.979 - 0.931,
        max_relative = 1e-14
    );

    // L2 holes from KL2; L3 holes from KL3 and from L2 Coster-Kronig
    let p_l2 = omega_k * 0.5 / 1.7;
    let p_l3 = omega_k / 1.7 + p_l2 * 0.05;
    assert_relative_eq!(
        lines.get("L2M4").unwrap().rate,
        p_l2 * 0.006 / 1.1,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        lines.get("L3M5").unwrap().rate,
        p_l3 * 0.006 / 1.1,
        max_relative = 1e-12
    );
    // nothing reaches L1
    assert!(lines.get("L1M2").is_none());
    assert!(lines.flagged().is_empty());
}

#[test]
fn test_generation_count_limits_cascade() {
    let el = toy_element();
    let one = el.x_ray_lines_from_vacancy_distribution(&unit("K"), 1, true);
    let full = el.x_ray_lines_from_vacancy_distribution(&unit("K"), FULL_CASCADE, true);
    // the Coster-Kronig L2 -> L3 contribution needs a second generation
    assert!(one.get("L3M5").unwrap().rate < full.get("L3M5").unwrap().rate);
    assert_eq!(one.get("KL3"), full.get("KL3"));

    let huge = el.x_ray_lines_from_vacancy_distribution(&unit("K"), 1000, true);
    assert_eq!(huge, full);
}

#[test]
fn test_without_fluorescence_yield() {
    let el = toy_element();
    let raw = el.x_ray_lines_from_vacancy_distribution(&unit("L3"), 0, false);
    assert_relative_eq!(raw.total_rate(), 1.0, epsilon = 1e-14);
}

#[test]
fn test_excitation_factor_value() {
    let el = toy_element();
    let lines = el.photoelectric_excitation_factors(20.0, 1.0).unwrap();
    let p_k = 31.0 / 35.0;
    assert_relative_eq!(lines.get("KL3").unwrap().rate, p_k * 0.44 / 1.7, max_relative = 1e-12);

    let weighted = el.photoelectric_excitation_factors(20.0, 2.5).unwrap();
    assert_relative_eq!(
        weighted.get("KL3").unwrap().rate,
        2.5 * lines.get("KL3").unwrap().rate,
        max_relative = 1e-14
    );
    assert!(el.photoelectric_excitation_factors(20.0, -1.0).is_err());
}

#[test]
fn test_distribution_sums_to_one() {
    let el = toy_element();
    for energy in [2.0, 5.0, 12.0, 20.0, 50.0] {
        let d = el.initial_photoelectric_vacancy_distribution(energy).unwrap();
        assert_relative_eq!(d.total(), 1.0, epsilon = 1e-12);
        assert!(d.rest() >= 0.0);
    }
}

#[test]
fn test_cache_matches_direct_evaluation() {
    let mut el = toy_element();
    let energies = [5.0, 10.0, 20.0, 45.0];
    let direct = el.photoelectric_excitation_factors_many(&energies, &[]).unwrap();

    el.set_cascade_cache_enabled(true);
    assert!(!el.is_cascade_cache_filled());
    let cached = el.photoelectric_excitation_factors_many(&energies, &[]).unwrap();
    assert!(el.is_cascade_cache_filled());

    for (a, b) in direct.iter().zip(&cached) {
        assert_eq!(a.len(), b.len());
        for (label, line) in a.iter() {
            let other = b.get(label).unwrap();
            assert_relative_eq!(line.rate, other.rate, max_relative = 1e-12);
            assert_relative_eq!(line.energy, other.energy);
        }
    }
}

#[test]
fn test_cache_survives_setters_until_emptied() {
    let mut el = toy_element();
    el.fill_cascade_cache();
    let before = el.photoelectric_excitation_factors(20.0, 1.0).unwrap();

    el.set_shell_constants(Subshell::K, &["omega"], &[0.22]).unwrap();
    assert!(el.is_cascade_cache_filled());
    let stale = el.photoelectric_excitation_factors(20.0, 1.0).unwrap();
    assert_eq!(before, stale);

    el.empty_cascade_cache();
    assert!(!el.is_cascade_cache_filled());
    let fresh = el.photoelectric_excitation_factors(20.0, 1.0).unwrap();
    assert_relative_eq!(
        fresh.get("KL3").unwrap().rate,
        0.5 * before.get("KL3").unwrap().rate,
        max_relative = 1e-12
    );
}

#[test]
fn test_disabled_cache_is_not_used() {
    let mut el = toy_element();
    el.fill_cascade_cache();
    assert!(el.is_cascade_cache_enabled());
    let cached = el.photoelectric_excitation_factors(20.0, 1.0).unwrap();

    el.set_shell_constants(Subshell::K, &["omega"], &[0.22]).unwrap();
    el.set_cascade_cache_enabled(false);
    assert!(el.is_cascade_cache_filled());
    let direct = el.photoelectric_excitation_factors(20.0, 1.0).unwrap();
    assert_relative_eq!(
        direct.get("KL3").unwrap().rate,
        0.5 * cached.get("KL3").unwrap().rate,
        max_relative = 1e-12
    );

    // re-enabling picks the stale cache up again
    el.set_cascade_cache_enabled(true);
    assert_eq!(el.photoelectric_excitation_factors(20.0, 1.0).unwrap(), cached);
}

#[test]
fn test_weights_length_mismatch() {
    let el = toy_element();
    let err = el
        .photoelectric_excitation_factors_many(&[10.0, 20.0], &[1.0])
        .unwrap_err();
    assert!(matches!(
        err,
        XrayFluoError::LengthMismatch { expected: 2, actual: 1, .. }
    ));
    assert!(err.is_invalid_argument());
}

#[test]
fn test_flagged_lines_are_reported() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut el = Element::new("Xx", 40, 91.2).unwrap();
    el.set_binding_energies(&["K", "L2"], &[1.0, 2.0]).unwrap();
    el.set_shell_constants(Subshell::K, &["omega"], &[1.0]).unwrap();
    el.set_radiative_transitions(Subshell::K, &["KL2", "KL3"], &[1.0, 1.0])
        .unwrap();

    let lines = el.x_ray_lines_from_vacancy_distribution(&unit("K"), 0, true);
    assert!(lines.is_empty());
    let flags: Vec<_> = lines.flagged().iter().map(|f| (f.label.as_str(), f.flag)).collect();
    assert!(flags.contains(&("KL2", LineFlag::NonPositiveEnergy)));
    assert!(flags.contains(&("KL3", LineFlag::MissingBindingEnergy)));
}
