//! CLI binary: the main surface and the widget surface in a terminal.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use expense_tracker::config::Config;
use expense_tracker::deep_link::{DeepLink, OPEN_URL};
use expense_tracker::format::{compact_amount, with_currency};
use expense_tracker::input::{BudgetForm, EntryInput, InputMode};
use expense_tracker::models::{LedgerState, Rgb};
use expense_tracker::storage::{FileStore, KeyValueStore};
use expense_tracker::tracker::{ExpenseTracker, LoggingReloader, SubscriptionId};
use expense_tracker::view::{Axis, Element, TextRole, dashboard, entry_panel, gauge};
use expense_tracker::widget::{self, WidgetFamily};
use owo_colors::OwoColorize;

/// Tracker wired to file stores, as used by every subcommand.
type FileTracker = ExpenseTracker<FileStore, FileStore, LoggingReloader>;

/// Expense tracker: record spending against a monthly budget.
#[derive(Debug, Parser)]
#[command(name = "expense-tracker", version, about)]
struct Cli {
    /// Override the private data directory.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Override the directory shared with the widget.
    #[arg(long, global = true, value_name = "DIR")]
    shared_dir: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Show the total, budget usage and status.
    Status,
    /// Record an expense.
    Add {
        /// Amount to add; zero or negative amounts are ignored.
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Snap the amount to the slider's step (one hundredth of the budget).
        #[arg(long)]
        slider: bool,
    },
    /// Remove the most recent expense.
    Undo,
    /// Start a new month: clear the total and history, keep the budget.
    Reset,
    /// Set the monthly budget. Non-digits are stripped ("12,000" works).
    Budget {
        /// New budget amount.
        value: String,
    },
    /// List this month's entries.
    History,
    /// Render the widget from the shared store.
    Widget {
        /// Widget size to render.
        #[arg(long, value_enum, default_value_t = FamilyArg::Small)]
        family: FamilyArg,
    },
    /// Print the widget timeline as JSON.
    Timeline,
    /// Handle a deep link such as `expensetracker://add-expense`.
    Open {
        /// Link to open.
        #[arg(default_value = OPEN_URL)]
        url: String,
    },
}

/// Widget family names on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FamilyArg {
    /// Home-screen square.
    Small,
    /// Home-screen wide.
    Medium,
    /// Lock-screen circle.
    Circular,
    /// Lock-screen rectangle.
    Rectangular,
    /// Every family in turn.
    All,
}

impl FamilyArg {
    /// Families selected by this argument.
    fn families(self) -> Vec<WidgetFamily> {
        match self {
            Self::Small => vec![WidgetFamily::SystemSmall],
            Self::Medium => vec![WidgetFamily::SystemMedium],
            Self::Circular => vec![WidgetFamily::AccessoryCircular],
            Self::Rectangular => vec![WidgetFamily::AccessoryRectangular],
            Self::All => WidgetFamily::ALL.to_vec(),
        }
    }
}

/// Heading printed above a rendered widget.
const fn family_label(family: WidgetFamily) -> &'static str {
    match family {
        WidgetFamily::SystemSmall => "small",
        WidgetFamily::SystemMedium => "medium",
        WidgetFamily::AccessoryCircular => "circular",
        WidgetFamily::AccessoryRectangular => "rectangular",
    }
}

/// Prints an `error:` line to stderr.
fn print_error(message: &str) -> io::Result<()> {
    writeln!(io::stderr().lock(), "{} {message}", "error:".red().bold())
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::resolve(cli.data_dir, cli.shared_dir) {
        Ok(config) => config,
        Err(err) => {
            print_error(&format!("failed to resolve storage locations: {err}"))?;
            return Ok(ExitCode::FAILURE);
        }
    };

    dispatch(&config, cli.command)
}

/// Opens both stores and loads the tracker.
fn open_tracker(config: &Config) -> expense_tracker::error::Result<FileTracker> {
    let private = config.open_private()?;
    let shared = config.open_shared()?;
    let mut tracker = ExpenseTracker::load(private, shared, LoggingReloader);
    let _redraw = redraw_on_change(&mut tracker);
    Ok(tracker)
}

/// Subscribes the dashboard so it is printed after every committed change.
fn redraw_on_change<P: KeyValueStore, S: KeyValueStore>(
    tracker: &mut ExpenseTracker<P, S, LoggingReloader>,
) -> SubscriptionId {
    tracker.subscribe(|ledger| {
        if let Err(err) = print_element(&dashboard(ledger)) {
            tracing::warn!(error = %err, "failed to redraw dashboard");
        }
    })
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch(config: &Config, command: Command) -> io::Result<ExitCode> {
    match command {
        Command::Widget { family } => return cmd_widget(config, family),
        Command::Timeline => return cmd_timeline(config),
        Command::Status
        | Command::Add { .. }
        | Command::Undo
        | Command::Reset
        | Command::Budget { .. }
        | Command::History
        | Command::Open { .. } => {}
    }

    let mut tracker = match open_tracker(config) {
        Ok(tracker) => tracker,
        Err(err) => {
            print_error(&format!("failed to open storage: {err}"))?;
            return Ok(ExitCode::FAILURE);
        }
    };

    match command {
        Command::Status => cmd_status(&tracker),
        Command::Add { amount, slider } => cmd_add(&mut tracker, amount, slider),
        Command::Undo => cmd_undo(&mut tracker),
        Command::Reset => cmd_reset(&mut tracker),
        Command::Budget { value } => cmd_budget(&mut tracker, &value),
        Command::History => cmd_history(&tracker),
        Command::Open { url } => cmd_open(&tracker, &url),
        Command::Widget { .. } | Command::Timeline => Ok(ExitCode::SUCCESS),
    }
}

/// Executes the `status` subcommand.
fn cmd_status<P: KeyValueStore, S: KeyValueStore>(
    tracker: &ExpenseTracker<P, S, LoggingReloader>,
) -> io::Result<ExitCode> {
    print_element(&dashboard(tracker.ledger()))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `add` subcommand.
fn cmd_add<P: KeyValueStore, S: KeyValueStore>(
    tracker: &mut ExpenseTracker<P, S, LoggingReloader>,
    amount: f64,
    slider: bool,
) -> io::Result<ExitCode> {
    let mut input = EntryInput::new();
    if slider {
        input.set_slider_amount(amount, tracker.ledger().monthly_budget());
    } else {
        input.set_mode(InputMode::Manual);
        input.set_manual_text(&amount.to_string());
    }
    if input.is_add_disabled() {
        print_error("amount must be greater than zero; nothing recorded")?;
        return Ok(ExitCode::FAILURE);
    }

    let value = input.take_amount();
    match tracker.add_entry(value) {
        Ok(true) => {
            writeln!(
                io::stdout().lock(),
                "{} {}",
                "Added".green().bold(),
                with_currency(&format!("{value:.2}"))
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(false) => {
            print_error("amount was rejected; nothing recorded")?;
            Ok(ExitCode::FAILURE)
        }
        Err(err) => {
            print_error(&format!("failed to save expense: {err}"))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `undo` subcommand.
fn cmd_undo<P: KeyValueStore, S: KeyValueStore>(
    tracker: &mut ExpenseTracker<P, S, LoggingReloader>,
) -> io::Result<ExitCode> {
    match tracker.undo_last() {
        Ok(Some(amount)) => {
            writeln!(
                io::stdout().lock(),
                "{} {}",
                "Undid".yellow().bold(),
                with_currency(&format!("{amount:.2}"))
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => {
            writeln!(io::stdout().lock(), "{}", "Nothing to undo.".dimmed())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_error(&format!("failed to save after undo: {err}"))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `reset` subcommand.
fn cmd_reset<P: KeyValueStore, S: KeyValueStore>(
    tracker: &mut ExpenseTracker<P, S, LoggingReloader>,
) -> io::Result<ExitCode> {
    match tracker.reset_month() {
        Ok(()) => {
            writeln!(io::stdout().lock(), "{}", "Month reset.".green().bold())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_error(&format!("failed to reset: {err}"))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `budget` subcommand.
fn cmd_budget<P: KeyValueStore, S: KeyValueStore>(
    tracker: &mut ExpenseTracker<P, S, LoggingReloader>,
    value: &str,
) -> io::Result<ExitCode> {
    let mut form = BudgetForm::prefilled(tracker.ledger().monthly_budget());
    form.set_text(value);
    let Some(budget) = form.parsed() else {
        print_error(&format!(
            "\"{}\" is not a budget greater than zero; keeping {}",
            form.text(),
            with_currency(&compact_amount(tracker.ledger().monthly_budget()))
        ))?;
        return Ok(ExitCode::FAILURE);
    };

    match tracker.set_budget(budget) {
        Ok(()) => {
            writeln!(
                io::stdout().lock(),
                "{} {}",
                "Monthly budget set to".green().bold(),
                with_currency(form.text())
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_error(&format!("failed to update budget: {err}"))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `history` subcommand.
fn cmd_history<P: KeyValueStore, S: KeyValueStore>(
    tracker: &ExpenseTracker<P, S, LoggingReloader>,
) -> io::Result<ExitCode> {
    print_history_table(tracker.ledger())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `widget` subcommand. Reads only the shared store.
fn cmd_widget(config: &Config, family: FamilyArg) -> io::Result<ExitCode> {
    let shared = match config.open_shared() {
        Ok(shared) => shared,
        Err(err) => {
            print_error(&format!("failed to open shared storage: {err}"))?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let entry = widget::current_entry(&shared, Utc::now());
    let mut out = io::stdout().lock();
    for selected in family.families() {
        let view = widget::render(&entry, selected);
        writeln!(out, "{}", family_label(selected).dimmed())?;
        for line in styled_lines(&view) {
            writeln!(out, "  {line}")?;
        }
        if let Some(link) = view.link() {
            writeln!(out, "  {} {}", "tap:".dimmed(), link.as_url())?;
        }
        writeln!(out)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `timeline` subcommand.
fn cmd_timeline(config: &Config) -> io::Result<ExitCode> {
    let shared = match config.open_shared() {
        Ok(shared) => shared,
        Err(err) => {
            print_error(&format!("failed to open shared storage: {err}"))?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let timeline = widget::timeline(&shared, Utc::now());
    match serde_json::to_string_pretty(&timeline) {
        Ok(json) => {
            writeln!(io::stdout().lock(), "{json}")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_error(&format!("failed to encode timeline: {err}"))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `open` subcommand.
fn cmd_open<P: KeyValueStore, S: KeyValueStore>(
    tracker: &ExpenseTracker<P, S, LoggingReloader>,
    url: &str,
) -> io::Result<ExitCode> {
    match DeepLink::parse(url) {
        Some(DeepLink::AddExpense) => {
            print_element(&dashboard(tracker.ledger()))?;
            writeln!(io::stdout().lock())?;
            print_element(&entry_panel(
                &EntryInput::new(),
                tracker.ledger().monthly_budget(),
            ))?;
        }
        Some(DeepLink::Open) => print_element(&dashboard(tracker.ledger()))?,
        None => {
            writeln!(
                io::stdout().lock(),
                "{} {url}",
                "Ignoring unrecognized link".dimmed()
            )?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints the undo history in a table with a running total.
fn print_history_table(ledger: &LedgerState) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if ledger.history().is_empty() {
        writeln!(out, "{}", "No expenses recorded this month.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
        Cell::new("Running Total").fg(Color::Cyan),
    ]);

    let mut running = 0.0_f64;
    for (index, amount) in ledger.history().iter().enumerate() {
        running += amount;
        let running_cell = if running > ledger.monthly_budget() {
            Cell::new(format!("{running:.2}")).fg(Color::Red)
        } else {
            Cell::new(format!("{running:.2}"))
        };
        _ = table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(format!("{amount:.2}")),
            running_cell,
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Expenses".green().bold(),
        format_args!("({})", ledger.history().len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints an element tree with terminal colors.
fn print_element(element: &Element) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for line in styled_lines(element) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Applies an element color to `text`.
fn paint(text: &str, color: Rgb) -> String {
    let (red, green, blue) = color.to_rgb8();
    text.truecolor(red, green, blue).to_string()
}

/// Like [`Element::plain_text`], with roles and colors applied.
fn styled_lines(element: &Element) -> Vec<String> {
    match *element {
        Element::Stack {
            axis: Axis::Vertical,
            ref children,
        } => children.iter().flat_map(styled_lines).collect(),
        Element::Stack { ref children, .. } => {
            let parts: Vec<String> = children
                .iter()
                .map(|child| styled_lines(child).join(" "))
                .filter(|part| !part.is_empty())
                .collect();
            if parts.is_empty() {
                Vec::new()
            } else {
                vec![parts.join("  ")]
            }
        }
        Element::Text {
            ref content,
            role,
            color,
        } => {
            let colored = color.map_or_else(|| content.clone(), |rgb| paint(content, rgb));
            let styled = match role {
                TextRole::Title | TextRole::Header => colored.bold().to_string(),
                TextRole::Caption => colored.dimmed().to_string(),
                TextRole::Body => colored,
            };
            vec![styled]
        }
        Element::Ring {
            progress, color, ..
        } => vec![format!("({})", paint(&gauge(progress), color))],
        Element::Bar { progress, color } => vec![format!("[{}]", paint(&gauge(progress), color))],
        Element::Spacer => Vec::new(),
        Element::Link { ref child, .. } => styled_lines(child),
    }
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // Last-resort error output: if stderr itself failed, nothing
            // we can do.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}
