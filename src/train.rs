//! Training loop and early stopping.
//!
//! Every epoch runs one SGD step per training example, then evaluates the mean
//! regularized objective on the train and test sets. [`EarlyStopping`] decides from the
//! test loss whether to keep going.

use crate::data::{DEFAULT_TARGET, Split, explicit_split, train_test_split};
use crate::log::{Verbosity, log};
use crate::plot::{NoPlot, Plotter};
use crate::{Dataset, Error, Frame, Mlp, Optimizer, Regularization, Result, Sgd};

/// Training configuration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    /// Feature column names.
    pub x: Vec<String>,
    /// Target column name.
    pub y: String,
    /// Maximum number of epochs.
    pub epochs: usize,
    /// Validated but not consulted: every example gets its own SGD step.
    pub batch_size: usize,
    /// Train fraction when the test set is sampled from the input table.
    pub training_size: f32,
    pub learning_rate: f32,
    pub l1_reg: f32,
    pub l2_reg: f32,
    pub early_stop: bool,
    /// Epochs to keep waiting after the last improvement.
    pub patience: usize,
    /// A test loss counts as an improvement if it is below `best * improvement_threshold`.
    pub improvement_threshold: f32,
    /// Put back the parameters of the best epoch once training ends.
    pub restore_weights: bool,
    /// Seed for the train/test sampling.
    pub seed: Option<u64>,
    /// Hand the loss history to the plotter.
    pub plot: bool,
    pub verbosity: Verbosity,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            x: Vec::new(),
            y: DEFAULT_TARGET.to_owned(),
            epochs: 100,
            batch_size: 1,
            training_size: 0.8,
            learning_rate: 0.01,
            l1_reg: 0.0,
            l2_reg: 0.0,
            early_stop: true,
            patience: 100,
            improvement_threshold: 0.995,
            restore_weights: false,
            seed: None,
            plot: false,
            verbosity: Verbosity::Quiet,
        }
    }
}

impl TrainConfig {
    /// Default configuration for the given feature columns.
    pub fn new<I, S>(x: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            x: x.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.x.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one feature column is required".to_owned(),
            ));
        }
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        if !(self.training_size.is_finite()
            && self.training_size > 0.0
            && self.training_size <= 1.0)
        {
            return Err(Error::InvalidConfig(format!(
                "training_size must be in (0, 1], got {}",
                self.training_size
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        for (name, v) in [("l1_reg", self.l1_reg), ("l2_reg", self.l2_reg)] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }
        if !(self.improvement_threshold.is_finite() && self.improvement_threshold > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "improvement_threshold must be finite and > 0, got {}",
                self.improvement_threshold
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn regularization(&self) -> Regularization {
        Regularization {
            l1: self.l1_reg,
            l2: self.l2_reg,
        }
    }
}

/// Outcome of one epoch as seen by [`EarlyStopping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainState {
    /// No epoch observed yet.
    Running,
    /// The test loss beat the best loss by the improvement threshold.
    Improved,
    /// No significant improvement, still within the patience horizon.
    Stalled,
    /// Patience exhausted (or last configured epoch reached).
    Stopped,
}

/// Patience-based early stopping on the test loss.
///
/// Until the first improvement the horizon is the last configured epoch. Each
/// improvement at epoch `e` sets it to `e + patience` (saturating at `usize::MAX`); later
/// improvements only push it further out. An improving epoch never stops the run, so with
/// `patience == 0` the run ends one epoch after the best.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    enabled: bool,
    epochs: usize,
    patience: usize,
    improvement_threshold: f32,
    best_loss: f32,
    best_epoch: usize,
    improved_horizon: Option<usize>,
    state: TrainState,
}

impl EarlyStopping {
    pub fn new(epochs: usize, patience: usize, improvement_threshold: f32, enabled: bool) -> Self {
        Self {
            enabled,
            epochs,
            patience,
            improvement_threshold,
            best_loss: f32::INFINITY,
            best_epoch: 0,
            improved_horizon: None,
            state: TrainState::Running,
        }
    }

    pub fn from_config(cfg: &TrainConfig) -> Self {
        Self::new(
            cfg.epochs,
            cfg.patience,
            cfg.improvement_threshold,
            cfg.early_stop,
        )
    }

    /// Last epoch that may still run without a new improvement.
    #[inline]
    pub fn horizon(&self) -> usize {
        self.improved_horizon.unwrap_or(self.epochs)
    }

    #[inline]
    pub fn best_loss(&self) -> f32 {
        self.best_loss
    }

    #[inline]
    pub fn best_epoch(&self) -> usize {
        self.best_epoch
    }

    #[inline]
    pub fn state(&self) -> TrainState {
        self.state
    }

    /// Feed the test loss of (1-based) `epoch`.
    pub fn observe(&mut self, epoch: usize, test_loss: f32) -> TrainState {
        let horizon = self.horizon();
        self.state = if self.enabled
            && test_loss < self.best_loss * self.improvement_threshold
            && epoch <= horizon
        {
            self.best_loss = test_loss;
            self.best_epoch = epoch;
            self.improved_horizon = Some(epoch.saturating_add(self.patience));
            TrainState::Improved
        } else if epoch < horizon {
            TrainState::Stalled
        } else {
            TrainState::Stopped
        };
        self.state
    }
}

/// Summary of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    /// Number of epochs that ran.
    pub epochs_run: usize,
    /// Whether patience ran out before the configured number of epochs.
    pub stopped_early: bool,
    /// Best test loss (`+inf` when early stopping is disabled).
    pub best_loss: f32,
    /// Epoch of `best_loss`, 0 when none was recorded.
    pub best_epoch: usize,
    pub final_train_loss: f32,
    pub final_test_loss: f32,
}

impl Mlp {
    /// Train on `data`.
    ///
    /// Without `test_set`, rows of `data` are sampled into train and test sets using
    /// `cfg.training_size`; with it, all of `data` is used for training.
    pub fn train(
        &mut self,
        data: &Frame,
        test_set: Option<&Frame>,
        cfg: &TrainConfig,
    ) -> Result<TrainReport> {
        self.train_with_plotter(data, test_set, cfg, &mut NoPlot)
    }

    /// Same as [`Mlp::train`], sending the loss history to `plotter` when `cfg.plot` is set.
    pub fn train_with_plotter(
        &mut self,
        data: &Frame,
        test_set: Option<&Frame>,
        cfg: &TrainConfig,
        plotter: &mut dyn Plotter,
    ) -> Result<TrainReport> {
        cfg.validate()?;
        let split = match test_set {
            Some(test) => explicit_split(data, test, &cfg.x, &cfg.y)?,
            None => train_test_split(data, &cfg.x, &cfg.y, cfg.training_size, cfg.seed)?,
        };

        let report = self.fit_split(&split, cfg)?;
        self.x_cols = Some(cfg.x.clone());
        self.y_col = Some(cfg.y.clone());

        if cfg.plot {
            plotter.plot(&self.train_losses, &self.test_losses)?;
        }
        Ok(report)
    }

    /// Run the epoch loop on an already prepared split.
    ///
    /// Column names in `cfg` are not consulted here.
    pub fn fit_split(&mut self, split: &Split, cfg: &TrainConfig) -> Result<TrainReport> {
        cfg.validate()?;
        self.check_dataset("train", &split.train)?;
        self.check_dataset("test", &split.test)?;

        let opt = match self.optimizer() {
            Optimizer::Sgd => Sgd::new(cfg.learning_rate)?,
        };
        let reg = cfg.regularization();
        let verbosity = cfg.verbosity;

        self.train_losses.clear();
        self.test_losses.clear();
        self.best_loss = f32::INFINITY;
        self.best_epoch = 0;

        let mut stopper = EarlyStopping::from_config(cfg);
        let mut best_params = None;
        let mut epochs_run = 0;
        let mut stopped_early = false;

        for epoch in 1..=cfg.epochs {
            for idx in 0..split.train.len() {
                let (x, y) = split.train.example(idx);
                let tape = self.forward_tape(&x)?;
                let (_, grads) = self.backward(&tape, &[y], reg)?;
                opt.step(self, &grads);
            }

            let train_loss = self.objective(split.train.features(), split.train.targets(), reg)?;
            let test_loss = self.objective(split.test.features(), split.test.targets(), reg)?;
            self.train_losses.push(train_loss);
            self.test_losses.push(test_loss);
            epochs_run = epoch;

            log(
                verbosity,
                Verbosity::Verbose,
                format!("epoch {epoch}: train loss {train_loss:.6}, test loss {test_loss:.6}"),
            );

            match stopper.observe(epoch, test_loss) {
                TrainState::Improved => {
                    log(
                        verbosity,
                        Verbosity::Verbose,
                        format!("new best test loss {test_loss:.6} at epoch {epoch}"),
                    );
                    if cfg.restore_weights {
                        best_params = Some(self.snapshot_params());
                    }
                }
                TrainState::Running | TrainState::Stalled => {}
                TrainState::Stopped => {
                    stopped_early = epoch < cfg.epochs;
                    break;
                }
            }
        }

        self.best_loss = stopper.best_loss();
        self.best_epoch = stopper.best_epoch();

        if let Some(params) = best_params {
            self.restore_params(&params);
        }

        if stopped_early {
            log(
                verbosity,
                Verbosity::Normal,
                format!(
                    "stopped training after {epochs_run} epochs; best test loss {:.6} at epoch {}",
                    self.best_loss, self.best_epoch
                ),
            );
        } else {
            log(
                verbosity,
                Verbosity::Normal,
                format!("finished {epochs_run} epochs"),
            );
        }

        Ok(TrainReport {
            epochs_run,
            stopped_early,
            best_loss: self.best_loss,
            best_epoch: self.best_epoch,
            final_train_loss: self.train_losses.last().copied().unwrap_or(f32::NAN),
            final_test_loss: self.test_losses.last().copied().unwrap_or(f32::NAN),
        })
    }

    fn check_dataset(&self, name: &str, data: &Dataset) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidData(format!(
                "{name} set must not be empty"
            )));
        }
        let input_dim = self.input_dim().ok_or_else(|| {
            Error::InvalidConfig("mlp must have at least one layer".to_owned())
        })?;
        if data.input_dim() != input_dim {
            return Err(Error::shape(
                format!("{name} features"),
                (data.len(), input_dim),
                data.features().shape(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Activation, Layer, LayerOptions};

    /// Losses that improve by 10% per epoch up to `k`, then stay flat.
    fn plateau(k: usize, epoch: usize) -> f32 {
        let e = epoch.min(k) as i32;
        0.9_f32.powi(e)
    }

    fn run(stopper: &mut EarlyStopping, losses: impl Fn(usize) -> f32, epochs: usize) -> usize {
        for epoch in 1..=epochs {
            if stopper.observe(epoch, losses(epoch)) == TrainState::Stopped {
                return epoch;
            }
        }
        epochs
    }

    #[test]
    fn stops_patience_epochs_after_last_improvement() {
        for (k, patience) in [(1, 1), (5, 3), (10, 20), (7, 1)] {
            let mut stopper = EarlyStopping::new(1000, patience, 0.995, true);
            let stopped_at = run(&mut stopper, |e| plateau(k, e), 1000);
            assert_eq!(stopper.best_epoch(), k);
            assert!(stopped_at >= k);
            assert!(stopped_at <= k + patience);
            assert_eq!(stopped_at, k + patience);
            assert_eq!(stopper.state(), TrainState::Stopped);
        }
    }

    #[test]
    fn horizon_never_moves_backward_after_an_improvement() {
        let mut stopper = EarlyStopping::new(100, 4, 0.995, true);
        let mut last = 0;
        for epoch in 1..=10 {
            stopper.observe(epoch, plateau(6, epoch));
            if stopper.best_epoch() > 0 {
                assert!(stopper.horizon() >= last);
                last = stopper.horizon();
            }
        }
        assert_eq!(last, 10);
    }

    #[test]
    fn huge_patience_saturates_and_runs_to_the_last_epoch() {
        let epochs = 10;
        let mut stopper = EarlyStopping::new(epochs, usize::MAX, 0.995, true);
        assert_eq!(stopper.observe(1, 1.0), TrainState::Improved);
        assert_eq!(stopper.horizon(), usize::MAX);

        let mut last = stopper.horizon();
        for epoch in 2..=epochs {
            let state = stopper.observe(epoch, plateau(4, epoch));
            assert_ne!(state, TrainState::Stopped, "stopped at epoch {epoch}");
            assert!(stopper.horizon() >= last);
            last = stopper.horizon();
        }
        assert_eq!(stopper.best_epoch(), 4);

        let mut fresh = EarlyStopping::new(epochs, usize::MAX, 0.995, true);
        assert_eq!(run(&mut fresh, |e| plateau(4, e), epochs), epochs);
    }

    #[test]
    fn zero_patience_stops_right_after_the_best() {
        let mut stopper = EarlyStopping::new(100, 0, 0.995, true);
        let stopped_at = run(&mut stopper, |e| plateau(5, e), 100);
        assert_eq!(stopper.best_epoch(), 5);
        assert_eq!(stopped_at, 6);
    }

    #[test]
    fn small_improvements_below_threshold_do_not_count() {
        let mut stopper = EarlyStopping::new(100, 2, 0.5, true);
        assert_eq!(stopper.observe(1, 1.0), TrainState::Improved);
        // 0.6 is not below 1.0 * 0.5.
        assert_eq!(stopper.observe(2, 0.6), TrainState::Stalled);
        assert_eq!(stopper.observe(3, 0.4), TrainState::Stopped);
        assert_eq!(stopper.best_epoch(), 1);
        assert_eq!(stopper.best_loss(), 1.0);
    }

    #[test]
    fn disabled_runs_to_the_last_epoch() {
        let mut stopper = EarlyStopping::new(30, 2, 0.995, false);
        let stopped_at = run(&mut stopper, |e| plateau(3, e), 30);
        assert_eq!(stopped_at, 30);
        assert_eq!(stopper.best_epoch(), 0);
        assert!(stopper.best_loss().is_infinite());
    }

    #[test]
    fn config_validation() {
        let ok = TrainConfig::new(["a"]);
        assert!(ok.validate().is_ok());

        let cases = [
            TrainConfig::default(),
            TrainConfig {
                epochs: 0,
                ..ok.clone()
            },
            TrainConfig {
                batch_size: 0,
                ..ok.clone()
            },
            TrainConfig {
                learning_rate: 0.0,
                ..ok.clone()
            },
            TrainConfig {
                l2_reg: -1.0,
                ..ok.clone()
            },
            TrainConfig {
                training_size: 1.2,
                ..ok.clone()
            },
            TrainConfig {
                improvement_threshold: f32::NAN,
                ..ok.clone()
            },
        ];
        for cfg in cases {
            assert!(
                matches!(cfg.validate(), Err(Error::InvalidConfig(_))),
                "{cfg:?}"
            );
        }
    }

    #[test]
    fn caller_patience_and_threshold_are_kept() {
        let cfg = TrainConfig {
            patience: 7,
            improvement_threshold: 0.9,
            ..TrainConfig::new(["a"])
        };
        let mut stopper = EarlyStopping::from_config(&cfg);
        stopper.observe(1, 1.0);
        assert_eq!(stopper.horizon(), 8);
        assert_eq!(stopper.observe(2, 0.95), TrainState::Stalled);
    }

    #[test]
    fn fit_split_rejects_feature_width_mismatch_before_training() {
        let mut mlp = Mlp::default();
        let layer = Layer::with_options(
            3,
            1,
            Activation::Linear,
            LayerOptions {
                seed: Some(0),
                ..LayerOptions::default()
            },
        )
        .unwrap();
        mlp.add(layer.clone()).unwrap();

        let frame = Frame::new()
            .with_column("a", vec![0.0, 1.0, 2.0, 3.0])
            .unwrap()
            .with_column("Y", vec![0.0, 1.0, 0.0, 1.0])
            .unwrap();
        let cfg = TrainConfig::new(["a"]);
        let err = mlp.train(&frame, Some(&frame), &cfg).unwrap_err();
        assert!(matches!(err, Error::Shape { .. }));
        assert_eq!(mlp.layer(0).unwrap(), &layer);
    }
}
