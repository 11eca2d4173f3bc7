//! Budget status tiers derived from the spent percentage.

use super::color::Rgb;

/// Status text shown while spending sits between 75% and 100%.
pub const APPROACHING_LIMIT: &str = "Approaching limit";
/// Status text shown once spending reaches the budget.
pub const OVER_BUDGET: &str = "Over budget";

/// Three-way (plus overflow) classification of a budget percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// At most half of the budget spent.
    Normal,
    /// More than 50% and at most 75% spent.
    Caution,
    /// More than 75% but still under the budget.
    Warning,
    /// The budget is used up or exceeded.
    Danger,
}

impl Tier {
    /// Classifies a budget percentage.
    ///
    /// NaN is classified as [`Tier::Normal`].
    #[inline]
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            Self::Danger
        } else if percentage > 75.0 {
            Self::Warning
        } else if percentage > 50.0 {
            Self::Caution
        } else {
            Self::Normal
        }
    }

    /// Warning text for this tier, if any.
    #[inline]
    #[must_use]
    pub const fn status_text(self) -> Option<&'static str> {
        match self {
            Self::Warning => Some(APPROACHING_LIMIT),
            Self::Danger => Some(OVER_BUDGET),
            Self::Normal | Self::Caution => None,
        }
    }

    /// Stepped color used by the widget layouts: green, orange, then red
    /// for everything past 75%.
    #[inline]
    #[must_use]
    pub const fn step_color(self) -> Rgb {
        match self {
            Self::Normal => Rgb::GREEN,
            Self::Caution => Rgb::ORANGE,
            Self::Warning | Self::Danger => Rgb::RED,
        }
    }
}
