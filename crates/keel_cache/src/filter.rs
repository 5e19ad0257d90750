//! Line filtering applied to analysis output shown to the user.

/// Fragments of golint's "missing comment" warnings.
const MISSING_COMMENT: &[&str] = &["should have comment", "should have a package comment"];

/// Decides which analysis output lines reach the output sink.
///
/// The cache always receives the unfiltered stream; the filter applies only
/// to what is shown.
#[derive(Debug, Clone, Default)]
pub struct OutputFilter {
    ignore_suffixes: Vec<String>,
    hide_missing_comment: bool,
    raw: bool,
}

impl OutputFilter {
    /// Creates a filter that hides lines from files ending in one of
    /// `ignore_suffixes`.
    pub fn new(ignore_suffixes: Vec<String>) -> Self {
        Self {
            ignore_suffixes,
            hide_missing_comment: false,
            raw: false,
        }
    }

    /// Also hide missing-comment warnings.
    pub fn hide_missing_comment(mut self, hide: bool) -> Self {
        self.hide_missing_comment = hide;
        self
    }

    /// Forward everything verbatim.
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Returns `true` in raw mode.
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Returns `true` if `line` should be shown.
    pub fn passes(&self, line: &str) -> bool {
        if self.raw {
            return true;
        }
        if self.hide_missing_comment && MISSING_COMMENT.iter().any(|m| line.contains(m)) {
            return false;
        }
        match line.split_once(':') {
            Some((file, _)) => !self.ignore_suffixes.iter().any(|s| file.ends_with(s.as_str())),
            None => true,
        }
    }
}
