#[cfg(not(feature = "serde"))]
fn main() {
    println!("enable the `serde` feature: cargo run --example save_load_json --features serde");
}

#[cfg(feature = "serde")]
fn main() -> tabular_mlp::Result<()> {
    use tabular_mlp::{Activation, Frame, Loss, Mlp, MlpBuilder, TrainConfig};

    let data = Frame::new()
        .with_column("x1", vec![0.0, 0.0, 1.0, 1.0])?
        .with_column("x2", vec![0.0, 1.0, 0.0, 1.0])?
        .with_column("Y", vec![0.0, 1.0, 1.0, 1.0])?;

    let mut mlp = MlpBuilder::new(2)?
        .add_layer(4, Activation::Tanh)?
        .add_layer(1, Activation::Sigmoid)?
        .loss(Loss::BinaryCrossEntropy)
        .build_with_seed(0)?;

    let cfg = TrainConfig {
        epochs: 200,
        learning_rate: 0.1,
        early_stop: false,
        ..TrainConfig::new(["x1", "x2"])
    };
    mlp.train(&data, Some(&data), &cfg)?;

    let path = "target/tmp_mlp.json";
    mlp.save_json(path)?;

    let loaded = Mlp::load_json(path)?;
    assert_eq!(loaded.predict(&data, false)?, mlp.predict(&data, false)?);
    println!("saved and loaded model: {path}");
    Ok(())
}
