use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hemoflow::algebra::{Integrator, State};
use hemoflow::model::{Element, Model};

/// Chain of `n` vessels between a prescribed inflow and an RCR outlet.
fn build_vessel_chain(n: usize) -> Model {
    let mut model = Model::new();
    let q = model.add_parameter(1.0);
    let inflow = model
        .add_block(Element::flow_reference(), &[q], "INFLOW", false)
        .unwrap();

    let mut upstream = inflow;
    for i in 0..n {
        let r = model.add_parameter(100.0);
        let c = model.add_parameter(1e-4);
        let l = model.add_parameter(1e-2);
        let s = model.add_parameter(1e-3);
        let vessel = model
            .add_block(Element::blood_vessel(), &[r, c, l, s], &format!("v{i}"), false)
            .unwrap();
        model
            .add_node(&[upstream], &[vessel], &format!("n{i}"))
            .unwrap();
        upstream = vessel;
    }

    let rp = model.add_parameter(10.0);
    let cap = model.add_parameter(1e-3);
    let rd = model.add_parameter(100.0);
    let pd = model.add_parameter(0.0);
    let outlet = model
        .add_block(Element::windkessel(), &[rp, cap, rd, pd], "RCR", false)
        .unwrap();
    model
        .add_node(&[upstream], &[outlet], "n_out")
        .unwrap();
    model.finalize().unwrap();
    model
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrator_step");
    for n in [4usize, 16, 64] {
        group.bench_function(BenchmarkId::new("vessel_chain", n), |b| {
            let mut model = build_vessel_chain(n);
            let mut integrator = Integrator::new(&mut model, 1e-3, 0.1, 1e-8, 30).unwrap();
            let mut state = State::zero(model.dofhandler.size());
            let mut step = 0usize;
            b.iter(|| {
                state = integrator
                    .step(&mut model, &state, 1e-3 * step as f64)
                    .unwrap();
                step += 1;
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
