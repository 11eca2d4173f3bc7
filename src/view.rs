//! A small visual tree and the main surface layout built from it.
//!
//! Rendering is a pure function of state: [`dashboard`] and
//! [`entry_panel`] (and the widget layouts in [`crate::widget`]) return an
//! [`Element`] tree that a front end draws. [`Element::plain_text`]
//! flattens a tree for terminal output.

use crate::deep_link::DeepLink;
use crate::format::{
    CURRENCY_SYMBOL, percentage_label, slider_max_label, with_currency,
};
use crate::input::{EntryInput, InputMode};
use crate::models::{LedgerState, Rgb};

/// Width in cells of a bar or ring drawn as text.
const TEXT_BAR_WIDTH: usize = 20;

/// Layout direction of a [`Element::Stack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Children side by side.
    Horizontal,
    /// Children top to bottom.
    Vertical,
    /// Children drawn on top of each other.
    Layered,
}

/// Typographic role of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextRole {
    /// Small tracked-out section label.
    Header,
    /// Large emphasized figure.
    Title,
    /// Regular text.
    Body,
    /// Secondary, de-emphasized text.
    Caption,
}

/// A node of the visual tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A group of children laid out along an axis.
    Stack {
        /// Layout direction.
        axis: Axis,
        /// Child nodes in order.
        children: Vec<Self>,
    },
    /// A run of text.
    Text {
        /// Text to display.
        content: String,
        /// Typographic role.
        role: TextRole,
        /// Foreground color; `None` uses the default.
        color: Option<Rgb>,
    },
    /// Circular progress ring, filled clockwise from the top.
    Ring {
        /// Filled fraction in `[0, 1]`.
        progress: f64,
        /// Stroke color.
        color: Rgb,
        /// Stroke width in points.
        line_width: u8,
    },
    /// Horizontal progress bar.
    Bar {
        /// Filled fraction in `[0, 1]`.
        progress: f64,
        /// Fill color.
        color: Rgb,
    },
    /// Flexible empty space.
    Spacer,
    /// Makes the whole child tappable, opening `link`.
    Link {
        /// Link opened on tap.
        link: DeepLink,
        /// Tappable content.
        child: Box<Self>,
    },
}

impl Element {
    /// Vertical stack.
    #[inline]
    #[must_use]
    pub const fn vstack(children: Vec<Self>) -> Self {
        Self::Stack {
            axis: Axis::Vertical,
            children,
        }
    }

    /// Horizontal stack.
    #[inline]
    #[must_use]
    pub const fn hstack(children: Vec<Self>) -> Self {
        Self::Stack {
            axis: Axis::Horizontal,
            children,
        }
    }

    /// Layered stack.
    #[inline]
    #[must_use]
    pub const fn zstack(children: Vec<Self>) -> Self {
        Self::Stack {
            axis: Axis::Layered,
            children,
        }
    }

    /// Uncolored text.
    #[inline]
    #[must_use]
    pub fn text<T: Into<String>>(content: T, role: TextRole) -> Self {
        Self::Text {
            content: content.into(),
            role,
            color: None,
        }
    }

    /// Colored text.
    #[inline]
    #[must_use]
    pub fn colored_text<T: Into<String>>(content: T, role: TextRole, color: Rgb) -> Self {
        Self::Text {
            content: content.into(),
            role,
            color: Some(color),
        }
    }

    /// Wraps `self` in a tap target.
    #[inline]
    #[must_use]
    pub fn linked(self, link: DeepLink) -> Self {
        Self::Link {
            link,
            child: Box::new(self),
        }
    }

    /// All text runs in depth-first order.
    #[inline]
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    /// The first ring in the tree, if any.
    #[inline]
    #[must_use]
    pub fn find_ring(&self) -> Option<(f64, Rgb)> {
        match *self {
            Self::Ring {
                progress, color, ..
            } => Some((progress, color)),
            Self::Stack { ref children, .. } => children.iter().find_map(Self::find_ring),
            Self::Link { ref child, .. } => child.find_ring(),
            Self::Text { .. } | Self::Bar { .. } | Self::Spacer => None,
        }
    }

    /// The link wrapping the tree, if any.
    #[inline]
    #[must_use]
    pub fn link(&self) -> Option<DeepLink> {
        match *self {
            Self::Link { link, .. } => Some(link),
            Self::Stack { ref children, .. } => children.iter().find_map(Self::link),
            Self::Text { .. } | Self::Ring { .. } | Self::Bar { .. } | Self::Spacer => None,
        }
    }

    /// Flattens the tree into lines of plain text.
    ///
    /// Vertical stacks put each child on its own line(s); horizontal and
    /// layered stacks join their children on one line. Rings and bars are
    /// drawn as fixed-width gauges.
    #[inline]
    #[must_use]
    pub fn plain_text(&self) -> Vec<String> {
        match *self {
            Self::Stack {
                axis: Axis::Vertical,
                ref children,
            } => children.iter().flat_map(Self::plain_text).collect(),
            Self::Stack { ref children, .. } => {
                let parts: Vec<String> = children
                    .iter()
                    .map(|child| child.plain_text().join(" "))
                    .filter(|part| !part.is_empty())
                    .collect();
                if parts.is_empty() {
                    Vec::new()
                } else {
                    vec![parts.join("  ")]
                }
            }
            Self::Text { ref content, .. } => vec![content.clone()],
            Self::Ring { progress, .. } => vec![format!("({})", gauge(progress))],
            Self::Bar { progress, .. } => vec![format!("[{}]", gauge(progress))],
            Self::Spacer => Vec::new(),
            Self::Link { ref child, .. } => child.plain_text(),
        }
    }

    /// Depth-first text collection.
    fn collect_texts<'tree>(&'tree self, out: &mut Vec<&'tree str>) {
        match *self {
            Self::Stack { ref children, .. } => {
                for child in children {
                    child.collect_texts(out);
                }
            }
            Self::Text { ref content, .. } => out.push(content),
            Self::Link { ref child, .. } => child.collect_texts(out),
            Self::Ring { .. } | Self::Bar { .. } | Self::Spacer => {}
        }
    }
}

/// Fixed-width filled/empty gauge for a fraction in `[0, 1]`.
#[inline]
#[must_use]
pub fn gauge(progress: f64) -> String {
    let fraction = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    let filled = (0..TEXT_BAR_WIDTH)
        .take_while(|&cell| {
            let threshold = (cell_fraction(cell) + cell_fraction(cell + 1)) / 2.0;
            fraction >= threshold
        })
        .count();
    let mut out = "\u{2588}".repeat(filled);
    out.push_str(&"\u{2591}".repeat(TEXT_BAR_WIDTH - filled));
    out
}

/// Fraction of the gauge covered by the first `cells` cells.
fn cell_fraction(cells: usize) -> f64 {
    let cells = u32::try_from(cells).unwrap_or(u32::MAX);
    let width = u32::try_from(TEXT_BAR_WIDTH).unwrap_or(u32::MAX);
    f64::from(cells) / f64::from(width)
}

/// Fraction of a full ring or bar for a percentage, capped at one.
#[inline]
#[must_use]
pub fn fill_fraction(percentage: f64) -> f64 {
    if percentage.is_nan() {
        0.0
    } else {
        (percentage / 100.0).clamp(0.0, 1.0)
    }
}

/// Main surface: header, budget bar, total and status.
#[must_use]
pub fn dashboard(ledger: &LedgerState) -> Element {
    let percentage = ledger.budget_percentage();
    let tier = ledger.tier();

    let header = Element::vstack(vec![
        Element::text("Expenses", TextRole::Title),
        Element::text("Track your spending", TextRole::Caption),
    ]);

    let budget = Element::vstack(vec![
        Element::hstack(vec![
            Element::text("Monthly Budget", TextRole::Caption),
            Element::text(
                with_currency(&format!("{:.0}", ledger.monthly_budget())),
                TextRole::Body,
            ),
            Element::Spacer,
            Element::text("Used", TextRole::Caption),
            Element::colored_text(
                percentage_label(percentage),
                TextRole::Body,
                ledger.progress_color(),
            ),
        ]),
        Element::Bar {
            progress: fill_fraction(percentage),
            color: ledger.progress_color(),
        },
    ]);

    let mut total = vec![
        Element::text("Total Expenses", TextRole::Caption),
        Element::text(
            with_currency(&format!("{:.2}", ledger.total_spent())),
            TextRole::Title,
        ),
    ];
    if let Some(status) = ledger.status_text() {
        total.push(Element::colored_text(
            status,
            TextRole::Caption,
            tier.step_color(),
        ));
    }
    total.push(Element::text(
        format!(
            "{} entr{} this month",
            ledger.history().len(),
            if ledger.history().len() == 1 { "y" } else { "ies" }
        ),
        TextRole::Caption,
    ));
    total.push(Element::text(
        if ledger.can_undo() {
            "Undo last entry"
        } else {
            "Nothing to undo"
        },
        TextRole::Caption,
    ));

    Element::vstack(vec![header, budget, Element::vstack(total)])
}

/// Entry controls for the active input mode.
#[must_use]
pub fn entry_panel(input: &EntryInput, budget: f64) -> Element {
    match input.mode() {
        InputMode::Slider => Element::vstack(vec![
            Element::text(
                format!("Amount: {CURRENCY_SYMBOL}{:.0}", input.slider_amount()),
                TextRole::Body,
            ),
            Element::hstack(vec![
                Element::text(with_currency("0"), TextRole::Caption),
                Element::Bar {
                    progress: if budget > 0.0 {
                        (input.slider_amount() / budget).clamp(0.0, 1.0)
                    } else {
                        0.0
                    },
                    color: Rgb::GREEN,
                },
                Element::text(with_currency(&slider_max_label(budget)), TextRole::Caption),
            ]),
        ]),
        InputMode::Manual => Element::vstack(vec![
            Element::text("Enter Amount", TextRole::Body),
            Element::text(
                with_currency(if input.manual_text().is_empty() {
                    "0"
                } else {
                    input.manual_text()
                }),
                TextRole::Title,
            ),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(total: f64) -> LedgerState {
        let mut ledger = LedgerState::default();
        let _added = ledger.add_entry(total);
        ledger
    }

    /// Color of the first text run equal to `content`.
    fn color_of(element: &Element, content: &str) -> Option<Option<Rgb>> {
        match *element {
            Element::Text {
                content: ref text,
                color,
                ..
            } if text == content => Some(color),
            Element::Stack { ref children, .. } => {
                children.iter().find_map(|child| color_of(child, content))
            }
            Element::Link { ref child, .. } => color_of(child, content),
            Element::Text { .. } | Element::Ring { .. } | Element::Bar { .. } | Element::Spacer => {
                None
            }
        }
    }

    #[test]
    fn dashboard_total_is_plain_at_every_tier() {
        for total in [1_000.0, 6_000.0, 8_000.0, 12_000.0] {
            let tree = dashboard(&ledger_with(total));
            let label = format!("\u{20b9}{total:.2}");
            assert_eq!(color_of(&tree, &label), Some(None), "total {total}");
        }
    }

    #[test]
    fn dashboard_percentage_uses_blended_color() {
        let ledger = ledger_with(7_000.0);
        let tree = dashboard(&ledger);
        assert_eq!(
            color_of(&tree, "70.0%"),
            Some(Some(ledger.progress_color()))
        );
    }

    #[test]
    fn dashboard_shows_budget_and_percentage() {
        let tree = dashboard(&ledger_with(3_000.0));
        let texts = tree.texts();
        assert!(texts.contains(&"Monthly Budget"));
        assert!(texts.contains(&"\u{20b9}10000"));
        assert!(texts.contains(&"30.0%"));
        assert!(texts.contains(&"\u{20b9}3000.00"));
        assert!(texts.contains(&"1 entry this month"));
    }

    #[test]
    fn dashboard_reports_undo_availability() {
        let empty = dashboard(&LedgerState::default());
        assert!(empty.texts().contains(&"Nothing to undo"));
        assert!(empty.texts().contains(&"0 entries this month"));
        let one = dashboard(&ledger_with(120.0));
        assert!(one.texts().contains(&"Undo last entry"));
    }

    #[test]
    fn dashboard_hides_status_below_three_quarters() {
        let texts = dashboard(&ledger_with(7_000.0)).plain_text();
        assert!(!texts.iter().any(|line| line.contains("Approaching limit")));
        assert!(!texts.iter().any(|line| line.contains("Over budget")));
    }

    #[test]
    fn dashboard_shows_status_text() {
        let near = dashboard(&ledger_with(8_000.0));
        assert!(near.texts().contains(&"Approaching limit"));
        let over = dashboard(&ledger_with(11_000.0));
        assert!(over.texts().contains(&"Over budget"));
    }

    #[test]
    fn dashboard_bar_is_capped() {
        let tree = dashboard(&ledger_with(25_000.0));
        let bar_line = tree
            .plain_text()
            .into_iter()
            .find(|line| line.starts_with('['))
            .unwrap();
        assert!(!bar_line.contains('\u{2591}'));
    }

    #[test]
    fn gauge_fills_proportionally() {
        assert_eq!(gauge(0.0).matches('\u{2588}').count(), 0);
        assert_eq!(gauge(0.5).matches('\u{2588}').count(), 10);
        assert_eq!(gauge(1.0).matches('\u{2588}').count(), 20);
        assert_eq!(gauge(f64::NAN).matches('\u{2588}').count(), 0);
    }

    #[test]
    fn fill_fraction_clamps() {
        assert!((fill_fraction(35.0) - 0.35).abs() < 1e-9);
        assert!((fill_fraction(180.0) - 1.0).abs() < f64::EPSILON);
        assert!(fill_fraction(-5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn entry_panel_slider_labels() {
        let mut input = EntryInput::new();
        input.set_slider_amount(2_500.0, 10_000.0);
        let texts = entry_panel(&input, 10_000.0).plain_text();
        assert_eq!(texts.first().map(String::as_str), Some("Amount: \u{20b9}2500"));
        assert!(texts.iter().any(|line| line.ends_with("\u{20b9}10K")));
    }

    #[test]
    fn entry_panel_manual_shows_text() {
        let mut input = EntryInput::new();
        input.set_mode(InputMode::Manual);
        assert!(entry_panel(&input, 10_000.0).texts().contains(&"\u{20b9}0"));
        input.set_manual_text("320");
        assert!(entry_panel(&input, 10_000.0).texts().contains(&"\u{20b9}320"));
    }

    #[test]
    fn link_and_ring_lookup() {
        let tree = Element::hstack(vec![Element::Ring {
            progress: 0.4,
            color: Rgb::GREEN,
            line_width: 4,
        }])
        .linked(DeepLink::Open);
        assert_eq!(tree.link(), Some(DeepLink::Open));
        assert_eq!(tree.find_ring(), Some((0.4, Rgb::GREEN)));
        assert_eq!(Element::Spacer.link(), None);
    }
}
