use ast_noise::ndarray::Array2;
use ast_noise::{mag_to_flux, AstNoiseModel, AstTable, NoiseModelConfig, SedGrid, VegaFluxes};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use rand_distr::Normal;
use std::hint::black_box;

const FILTERS: [&str; 4] = ["F275W", "F336W", "F475W", "F814W"];
const GROUP_SIZE: usize = 40;

fn synthetic_asts(rng: &mut StdRng, n_groups: usize) -> (Vec<String>, AstTable) {
    let filters: Vec<String> = FILTERS.iter().map(|&filter| filter.into()).collect();
    let n_rows = n_groups * GROUP_SIZE;
    let mut table = AstTable::new();
    for (ck, filter) in filters.iter().enumerate() {
        let mut input = Vec::with_capacity(n_rows);
        let mut rate = Vec::with_capacity(n_rows);
        let mut recovered = Vec::with_capacity(n_rows);
        for group in 0..n_groups {
            let mag = 16.0 + 0.25 * group as f64 + 0.2 * ck as f64;
            let flux = mag_to_flux(mag);
            let noise = Normal::new(0.0, 0.05 * flux).unwrap();
            for _ in 0..GROUP_SIZE {
                input.push(mag);
                rate.push(flux + rng.sample(noise));
                recovered.push(if rng.random::<f64>() < 0.9 {
                    mag + 0.05
                } else {
                    99.9
                });
            }
        }
        table
            .insert_column(format!("{filter}_IN"), input)
            .unwrap()
            .insert_column(format!("{filter}_RATE"), rate)
            .unwrap()
            .insert_column(format!("{filter}_VEGA"), recovered)
            .unwrap();
    }
    (filters, table)
}

fn synthetic_grid(rng: &mut StdRng, filters: &[String], n_models: usize) -> SedGrid<'static> {
    let seds = Array2::from_shape_fn((n_models, filters.len()), |_| {
        mag_to_flux(rng.random_range(16.0..24.0))
    });
    SedGrid::new(filters.to_vec(), seds).unwrap()
}

fn unit_vega(filters: &[String]) -> VegaFluxes {
    filters.iter().map(|filter| (filter.clone(), 1.0)).collect()
}

pub fn bench_from_asts(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    for n_groups in [10, 30] {
        let (filters, table) = synthetic_asts(&mut rng, n_groups);
        let vega = unit_vega(&filters);
        c.bench_function(
            format!("from_asts: {n_groups} groups of {GROUP_SIZE}").as_str(),
            |b| {
                b.iter(|| {
                    AstNoiseModel::from_asts(
                        black_box(&table),
                        filters.clone(),
                        &vega,
                        NoiseModelConfig::default(),
                        (),
                    )
                    .unwrap()
                })
            },
        );
    }
}

pub fn bench_evaluate(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let (filters, table) = synthetic_asts(&mut rng, 30);
    let vega = unit_vega(&filters);
    let model =
        AstNoiseModel::from_asts(&table, filters.clone(), &vega, NoiseModelConfig::default(), ())
            .unwrap();
    for n_models in [100, 1000] {
        let grid = synthetic_grid(&mut rng, &filters, n_models);
        c.bench_function(format!("evaluate: {n_models} grid models").as_str(), |b| {
            b.iter(|| model.evaluate(black_box(&grid), ()).unwrap())
        });
    }
}

criterion_group!(benches, bench_from_asts, bench_evaluate);
criterion_main!(benches);
