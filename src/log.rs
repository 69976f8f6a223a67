//! Console progress output for training.

/// How much the training loop reports on stderr.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all output
    #[default]
    Quiet,
    /// Stop reason and best epoch
    Normal,
    /// Every epoch's losses and every improvement
    Verbose,
}

impl Verbosity {
    /// Whether a message at `required` should be shown.
    #[inline]
    pub fn allows(self, required: Verbosity) -> bool {
        match self {
            Verbosity::Quiet => false,
            Verbosity::Normal => required == Verbosity::Normal,
            Verbosity::Verbose => true,
        }
    }
}

/// Log a message if the current level permits it
pub fn log(level: Verbosity, required: Verbosity, msg: impl AsRef<str>) {
    if level.allows(required) {
        eprintln!("{}", msg.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_gate_messages() {
        assert!(!Verbosity::Quiet.allows(Verbosity::Normal));
        assert!(!Verbosity::Quiet.allows(Verbosity::Verbose));
        assert!(Verbosity::Normal.allows(Verbosity::Normal));
        assert!(!Verbosity::Normal.allows(Verbosity::Verbose));
        assert!(Verbosity::Verbose.allows(Verbosity::Normal));
        assert!(Verbosity::Verbose.allows(Verbosity::Verbose));
    }
}
