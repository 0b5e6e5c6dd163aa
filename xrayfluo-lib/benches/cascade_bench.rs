use criterion::{Criterion, black_box, criterion_group, criterion_main};
use xrayfluo::deboer::{de_boer_l0, de_boer_x};
use xrayfluo::expint::e1;
use xrayfluo::{EscapeOptions, FULL_CASCADE, VacancyDistribution};

#[path = "../tests/common/mod.rs"]
mod common;

fn bench_cascade(c: &mut Criterion) {
    let element = common::toy_element();
    let k = VacancyDistribution::from_labels(&["K"], &[1.0]).unwrap();

    c.bench_function("full_cascade_k_vacancy", |b| {
        b.iter(|| {
            black_box(element.x_ray_lines_from_vacancy_distribution(
                black_box(&k),
                FULL_CASCADE,
                true,
            ));
        });
    });
}

fn bench_excitation_factors(c: &mut Criterion) {
    let energies: Vec<f64> = (0..200).map(|i| 2.0 + i as f64 * 0.2).collect();
    let direct = common::toy_element();
    let mut cached = common::toy_element();
    cached.set_cascade_cache_enabled(true);

    c.bench_function("excitation_factors_direct", |b| {
        b.iter(|| {
            black_box(
                direct
                    .photoelectric_excitation_factors_many(black_box(&energies), &[])
                    .unwrap(),
            );
        });
    });

    c.bench_function("excitation_factors_cached", |b| {
        b.iter(|| {
            black_box(
                cached
                    .photoelectric_excitation_factors_many(black_box(&energies), &[])
                    .unwrap(),
            );
        });
    });
}

fn bench_special_functions(c: &mut Criterion) {
    let xs: Vec<f64> = (1..200).map(|i| i as f64 * 0.05).collect();

    c.bench_function("e1_vector", |b| {
        b.iter(|| {
            for &x in &xs {
                black_box(e1(black_box(x)).unwrap());
            }
        });
    });

    c.bench_function("de_boer_l0_finite", |b| {
        b.iter(|| black_box(de_boer_l0(black_box(2.0), 3.0, 1.0, 1.0, 0.4).unwrap()));
    });

    c.bench_function("de_boer_x", |b| {
        b.iter(|| {
            black_box(de_boer_x(black_box(3.0), 5.0, 0.01, 0.02, 40.0, 90.0, 0.3).unwrap())
        });
    });
}

fn bench_escape(c: &mut Criterion) {
    let elements = common::registry();
    let options = EscapeOptions::default();

    c.bench_function("escape_cu_20kev", |b| {
        b.iter(|| {
            black_box(
                elements
                    .escape(&[("Cu", 1.0)], black_box(20.0), &options)
                    .unwrap(),
            );
        });
    });
}

criterion_group!(
    benches,
    bench_cascade,
    bench_excitation_factors,
    bench_special_functions,
    bench_escape
);
criterion_main!(benches);
