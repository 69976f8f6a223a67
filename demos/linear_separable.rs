use tabular_mlp::{Activation, Frame, Layer, Mlp, TrainConfig, Verbosity};

fn main() -> tabular_mlp::Result<()> {
    // `Y` follows `x1`; `x2` is noise.
    let data = Frame::new()
        .with_column("x1", vec![0.0, 0.0, 1.0, 1.0])?
        .with_column("x2", vec![0.0, 1.0, 0.0, 1.0])?
        .with_column("Y", vec![0.0, 0.0, 1.0, 1.0])?;

    let mut mlp = Mlp::from_tags("mse", "sgd")?;
    mlp.add(Layer::new(2, 1, Activation::Sigmoid)?)?;

    let cfg = TrainConfig {
        epochs: 500,
        learning_rate: 0.5,
        early_stop: false,
        verbosity: Verbosity::Normal,
        ..TrainConfig::new(["x1", "x2"])
    };
    let report = mlp.train(&data, Some(&data), &cfg)?;
    println!(
        "epochs={} final_train_loss={}",
        report.epochs_run, report.final_train_loss
    );

    let probs = mlp.predict(&data, false)?;
    let labels = mlp.predict(&data, true)?;
    for (p, l) in probs.iter().zip(&labels) {
        println!("p={p:.4} label={l}");
    }
    Ok(())
}
