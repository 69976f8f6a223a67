use tabular_mlp::{Activation, CsvPlotter, Frame, MlpBuilder, TrainConfig, Verbosity};

fn main() -> tabular_mlp::Result<()> {
    // Repeat XOR so the random split has something to hold out.
    let base: [(f32, f32, f32); 4] = [
        (0.0, 0.0, 0.0),
        (0.0, 1.0, 1.0),
        (1.0, 0.0, 1.0),
        (1.0, 1.0, 0.0),
    ];
    let rows: Vec<_> = base.iter().cycle().take(40).collect();
    let data = Frame::new()
        .with_column("a", rows.iter().map(|r| r.0).collect())?
        .with_column("b", rows.iter().map(|r| r.1).collect())?
        .with_column("Y", rows.iter().map(|r| r.2).collect())?;

    // 2 -> 8 -> 1 network with a sigmoid output.
    let mut mlp = MlpBuilder::new(2)?
        .add_layer(8, Activation::Tanh)?
        .add_layer(1, Activation::Sigmoid)?
        .build_with_seed(0)?;

    let cfg = TrainConfig {
        epochs: 2_000,
        learning_rate: 0.1,
        patience: 50,
        restore_weights: true,
        seed: Some(7),
        plot: true,
        verbosity: Verbosity::Normal,
        ..TrainConfig::new(["a", "b"])
    };
    let path = "target/xor_losses.csv";
    let mut plotter = CsvPlotter::create(path)?;
    let report = mlp.train_with_plotter(&data, None, &cfg, &mut plotter)?;

    println!(
        "epochs_run={} stopped_early={} best_epoch={} best_loss={}",
        report.epochs_run, report.stopped_early, report.best_epoch, report.best_loss
    );
    println!("loss curves written to {path}");

    let labels = mlp.predict(&data, true)?;
    for (r, l) in base.iter().zip(&labels) {
        println!("a={} b={} predicted={l}", r.0, r.1);
    }
    Ok(())
}
