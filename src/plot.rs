//! Loss-curve sinks.
//!
//! Training hands the per-epoch train/test losses to a [`Plotter`] when
//! `TrainConfig::plot` is set. [`CsvPlotter`] writes them as CSV so any charting tool can
//! draw the curves.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::Result;

/// Consumer of the train/test loss history.
pub trait Plotter {
    fn plot(&mut self, train_losses: &[f32], test_losses: &[f32]) -> Result<()>;
}

/// Discards the history.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlot;

impl Plotter for NoPlot {
    fn plot(&mut self, _train_losses: &[f32], _test_losses: &[f32]) -> Result<()> {
        Ok(())
    }
}

/// Writes `epoch,train_loss,test_loss` rows, one per epoch, epochs starting at 1.
#[derive(Debug)]
pub struct CsvPlotter<W: Write> {
    out: W,
}

impl<W: Write> CsvPlotter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl CsvPlotter<BufWriter<File>> {
    /// Create (or truncate) `path` and write the curves there.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> Plotter for CsvPlotter<W> {
    fn plot(&mut self, train_losses: &[f32], test_losses: &[f32]) -> Result<()> {
        writeln!(self.out, "epoch,train_loss,test_loss")?;
        for (i, (train, test)) in train_losses.iter().zip(test_losses).enumerate() {
            writeln!(self.out, "{},{train},{test}", i + 1)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_header_and_one_row_per_epoch() {
        let mut plotter = CsvPlotter::new(Vec::new());
        plotter.plot(&[1.0, 0.5], &[1.5, 0.75]).unwrap();
        let text = String::from_utf8(plotter.into_inner()).unwrap();
        assert_eq!(text, "epoch,train_loss,test_loss\n1,1,1.5\n2,0.5,0.75\n");
    }

    #[test]
    fn no_plot_accepts_anything() {
        assert!(NoPlot.plot(&[], &[1.0]).is_ok());
    }
}
