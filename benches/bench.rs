use criterion::{criterion_group, criterion_main, Criterion};
use sat_circuit::circuit::bcp::BcpEngine;
use sat_circuit::circuit::dimacs::Instance;
use sat_circuit::circuit::generators::{implication_chain, pigeonhole, random_ksat};
use sat_circuit::circuit::simulation::{Simulation, DEFAULT_MAX_TICKS};
use sat_circuit::circuit::trail::VariableTrail;
use std::hint::black_box;
use std::time::Duration;

fn simulate(instance: &Instance) {
    let mut sim = match Simulation::from_instance(instance, None) {
        Ok(sim) => sim,
        Err(e) => panic!("instance does not fit: {e}"),
    };
    black_box(sim.run(DEFAULT_MAX_TICKS).ok());
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain - root propagation");
    group.sample_size(100);

    for length in [4, 8, 16] {
        let instance = implication_chain(length);
        group.bench_function(format!("length {length}"), |b| {
            b.iter(|| simulate(&instance));
        });
    }
    group.finish();
}

fn bench_3sat(c: &mut Criterion) {
    // Near the 4.26 clause/variable threshold, mixed sat and unsat.
    let instances: Vec<Instance> = (0..20).map(|seed| random_ksat(12, 51, 3, seed)).collect();

    let mut group = c.benchmark_group("3sat - random");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(20));

    group.bench_function("12 vars 51 clauses x20", |b| {
        b.iter(|| {
            for instance in &instances {
                simulate(instance);
            }
        });
    });
    group.finish();
}

fn bench_pigeonhole(c: &mut Criterion) {
    let mut group = c.benchmark_group("pigeonhole - exhaustive");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(20));

    for holes in [2, 3] {
        let instance = pigeonhole(holes);
        group.bench_function(format!("{} into {holes}", holes + 1), |b| {
            b.iter(|| simulate(&instance));
        });
    }
    group.finish();
}

fn bench_bcp_fixpoint(c: &mut Criterion) {
    let instance = implication_chain(16);
    let storage = match instance.fit().and_then(|config| instance.to_clause_storage(&config)) {
        Ok(storage) => storage,
        Err(e) => panic!("instance does not fit: {e}"),
    };
    let empty = VariableTrail::new(storage.config());

    c.bench_function("bcp - chain of 16 to fixpoint", |b| {
        b.iter(|| {
            let mut trail = empty.clone();
            let mut bcp = BcpEngine::new(&storage);
            let mut start = true;
            loop {
                let signals = bcp.evaluate(start, &storage, &trail, 0);
                if let Some(write) = signals.write {
                    trail.write(write);
                }
                bcp.commit(&signals);
                start = false;
                if !signals.next_active {
                    break;
                }
            }
            black_box(trail.model());
        });
    });
}

criterion_group!(benches, bench_chain, bench_3sat, bench_pigeonhole, bench_bcp_fixpoint);
criterion_main!(benches);
