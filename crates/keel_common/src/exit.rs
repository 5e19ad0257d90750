//! Exit classification for analysis runs.

/// The classification of one analysis result, fresh or replayed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The analysis reported nothing.
    #[default]
    Ok,
    /// The analysis reported problems, or the tool exited unsuccessfully.
    Failed,
}

impl Outcome {
    /// Classifies a process exit code. A missing code (killed by a signal)
    /// counts as a failure.
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => Outcome::Ok,
            _ => Outcome::Failed,
        }
    }

    /// Returns the process exit status surfaced to the invoking shell.
    pub fn code(self) -> i32 {
        match self {
            Outcome::Ok => 0,
            Outcome::Failed => 1,
        }
    }

    /// Returns `true` for [`Outcome::Failed`].
    pub fn is_failed(self) -> bool {
        self == Outcome::Failed
    }
}

/// Accumulates per-unit outcomes into an overall result.
///
/// The first non-ok outcome becomes the overall outcome; later outcomes never
/// override it. Every recorded outcome is kept for individual reporting.
#[derive(Debug, Default)]
pub struct ExitTally<K> {
    overall: Outcome,
    outcomes: Vec<(K, Outcome)>,
}

impl<K> ExitTally<K> {
    /// Creates an empty tally whose overall outcome is [`Outcome::Ok`].
    pub fn new() -> Self {
        Self {
            overall: Outcome::Ok,
            outcomes: Vec::new(),
        }
    }

    /// Records the outcome for one unit.
    pub fn record(&mut self, key: K, outcome: Outcome) {
        if self.overall == Outcome::Ok {
            self.overall = outcome;
        }
        self.outcomes.push((key, outcome));
    }

    /// Returns the aggregate outcome.
    pub fn overall(&self) -> Outcome {
        self.overall
    }

    /// Returns the per-unit outcomes in recording order.
    pub fn outcomes(&self) -> &[(K, Outcome)] {
        &self.outcomes
    }
}
