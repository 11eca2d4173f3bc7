//! Deep links from widget taps into the app.

use url::Url;

/// URL scheme the app registers.
pub const SCHEME: &str = "expensetracker";

/// Link attached to every widget layout.
pub const OPEN_URL: &str = "expensetracker://open";

/// Link that opens the app straight into slider entry.
pub const ADD_EXPENSE_URL: &str = "expensetracker://add-expense";

/// A recognized deep link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeepLink {
    /// Open the main surface in slider-entry mode.
    AddExpense,
    /// Plain open, no special action.
    Open,
}

impl DeepLink {
    /// Parses `input` as a deep link.
    ///
    /// Returns `None` for malformed URLs, a foreign scheme, or an unknown
    /// host; such links are ignored rather than reported.
    #[inline]
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let url = Url::parse(input).ok()?;
        if url.scheme() != SCHEME {
            tracing::debug!(scheme = url.scheme(), "ignoring link with foreign scheme");
            return None;
        }
        match url.host_str() {
            Some("add-expense") => Some(Self::AddExpense),
            Some("open") => Some(Self::Open),
            other => {
                tracing::debug!(host = ?other, "ignoring link with unknown host");
                None
            }
        }
    }

    /// The canonical URL for this link.
    #[inline]
    #[must_use]
    pub const fn as_url(self) -> &'static str {
        match self {
            Self::AddExpense => ADD_EXPENSE_URL,
            Self::Open => OPEN_URL,
        }
    }
}
