//! Entry and budget input state behind the main surface's controls.
//!
//! These types hold what the user has dialed in or typed before an action
//! is taken, and decide whether the action button is enabled.

use crate::format::{parse_budget_input, sanitize_digits};

/// How the next expense amount is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputMode {
    /// Slider from zero to the monthly budget.
    #[default]
    Slider,
    /// Free numeric text.
    Manual,
}

/// Bounds of the amount slider for a given budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    /// Upper bound, equal to the monthly budget.
    pub max: f64,
    /// Increment, one hundredth of the budget.
    pub step: f64,
}

impl SliderRange {
    /// Slider bounds for `budget`; a non-positive budget collapses the
    /// range to zero.
    #[inline]
    #[must_use]
    pub fn for_budget(budget: f64) -> Self {
        if budget.is_finite() && budget > 0.0 {
            Self {
                max: budget,
                step: budget / 100.0,
            }
        } else {
            Self {
                max: 0.0,
                step: 0.0,
            }
        }
    }

    /// Clamps `value` into the range and snaps it to the nearest step.
    #[inline]
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        if self.step <= 0.0 || value.is_nan() {
            return 0.0;
        }
        let clamped = value.clamp(0.0, self.max);
        ((clamped / self.step).round() * self.step).min(self.max)
    }
}

/// Pending expense input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryInput {
    /// Active input mode.
    mode: InputMode,
    /// Current slider position.
    slider_amount: f64,
    /// Current manual text.
    manual_text: String,
}

impl EntryInput {
    /// Creates an empty input in slider mode.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active input mode.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> InputMode {
        self.mode
    }

    /// Switches between slider and manual entry. Both fields keep their
    /// contents.
    #[inline]
    pub const fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Current slider position.
    #[inline]
    #[must_use]
    pub const fn slider_amount(&self) -> f64 {
        self.slider_amount
    }

    /// Moves the slider, snapping to the budget's step.
    #[inline]
    pub fn set_slider_amount(&mut self, value: f64, budget: f64) {
        self.slider_amount = SliderRange::for_budget(budget).snap(value);
    }

    /// Current manual text.
    #[inline]
    #[must_use]
    pub fn manual_text(&self) -> &str {
        &self.manual_text
    }

    /// Replaces the manual text.
    #[inline]
    pub fn set_manual_text(&mut self, text: &str) {
        text.clone_into(&mut self.manual_text);
    }

    /// Whether the add action should be disabled for the current input.
    #[inline]
    #[must_use]
    pub fn is_add_disabled(&self) -> bool {
        match self.mode {
            InputMode::Slider => self.slider_amount <= 0.0,
            InputMode::Manual => self.manual_text.trim().is_empty(),
        }
    }

    /// Returns the amount to add and clears the active field.
    ///
    /// Manual text that does not parse yields `0`, which the ledger then
    /// rejects.
    #[inline]
    pub fn take_amount(&mut self) -> f64 {
        match self.mode {
            InputMode::Slider => core::mem::take(&mut self.slider_amount),
            InputMode::Manual => {
                let text = core::mem::take(&mut self.manual_text);
                text.trim().parse::<f64>().unwrap_or(0.0)
            }
        }
    }
}

/// Text field for editing the monthly budget.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BudgetForm {
    /// Sanitized, separator-grouped digits.
    text: String,
}

impl BudgetForm {
    /// Creates a form prefilled with `current_budget` in whole units.
    #[inline]
    #[must_use]
    pub fn prefilled(current_budget: f64) -> Self {
        let mut form = Self::default();
        form.set_text(&format!("{current_budget:.0}"));
        form
    }

    /// Replaces the text, keeping only digits and regrouping them.
    #[inline]
    pub fn set_text(&mut self, input: &str) {
        self.text = sanitize_digits(input);
    }

    /// Current (sanitized) text.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parsed budget, if the text is a positive amount.
    #[inline]
    #[must_use]
    pub fn parsed(&self) -> Option<f64> {
        parse_budget_input(&self.text)
    }

    /// Whether the update action should be disabled.
    #[inline]
    #[must_use]
    pub fn is_update_disabled(&self) -> bool {
        self.parsed().is_none()
    }
}
