use criterion::{Criterion, black_box, criterion_group, criterion_main};

use tabular_mlp::{Activation, Matrix, Mlp, MlpBuilder, Mode, Regularization};

fn bench_net() -> Mlp {
    MlpBuilder::from_sizes(
        &[32, 64, 64, 1],
        &[Activation::Tanh, Activation::ReLU, Activation::Sigmoid],
    )
    .unwrap()
    .build_with_seed(0)
    .unwrap()
}

fn mlp_forward_bench(c: &mut Criterion) {
    let mlp = bench_net();
    let x = Matrix::filled(128, 32, 0.1);

    c.bench_function("mlp_forward_128x32_64_64_1", |b| {
        b.iter(|| {
            let out = mlp.forward_prop(black_box(&x), Mode::Numeric).unwrap();
            black_box(out);
        })
    });
}

fn mlp_backward_bench(c: &mut Criterion) {
    let mlp = bench_net();
    let x = Matrix::filled(1, 32, 0.1);
    let tape = mlp.forward_tape(&x).unwrap();
    let reg = Regularization { l1: 0.0, l2: 1e-3 };

    c.bench_function("mlp_backward_1x32_64_64_1", |b| {
        b.iter(|| {
            let grads = mlp.backward(black_box(&tape), &[1.0], reg).unwrap();
            black_box(grads);
        })
    });
}

criterion_group!(benches, mlp_forward_bench, mlp_backward_bench);
criterion_main!(benches);
