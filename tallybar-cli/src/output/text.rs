//! Text output formatting with progress bars and colors.

use chrono::{DateTime, Local, Utc};
use tallybar_core::{ModelBreakdown, Period, UsageSnapshot};
use tallybar_providers::ProviderRegistry;
use tallybar_store::{RefreshState, RefreshStatus};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Consumption ratio from which the allowance is shown as nearly spent.
const WARN_RATIO: f64 = 0.8;

/// Formats a dollar amount: cents below $100, whole dollars from there on.
pub fn format_amount(amount: f64) -> String {
    if amount < 100.0 {
        format!("${amount:.2}")
    } else {
        format!("${amount:.0}")
    }
}

/// Formats a ratio (1.0 = 100%) as a percentage with one decimal.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 20,
        }
    }

    /// Formats a snapshot.
    ///
    /// `now` drives the reset countdown; the countdown always targets the
    /// month containing `now`, even for a snapshot left over from an earlier
    /// month.
    pub fn format_snapshot(&self, snapshot: &UsageSnapshot, now: DateTime<Utc>) -> String {
        let mut lines = Vec::new();

        let name = ProviderRegistry::get(&snapshot.provider_id)
            .map_or(snapshot.provider_id.as_str(), |d| d.display_name);
        lines.push(format!("{} · {}", self.bold(name), snapshot.period));

        let ratio = snapshot.included_percent();
        lines.push(format!(
            "{:<10}{} {} / {} ({})",
            "Included:",
            self.progress_bar(ratio),
            snapshot.included_consumed,
            snapshot.included_allowance,
            self.color_for_ratio(ratio, &format_percent(ratio))
        ));

        let billed = format!(
            "{} ({} request{})",
            format_amount(snapshot.billed_amount),
            snapshot.billed_quantity,
            if snapshot.billed_quantity == 1 { "" } else { "s" }
        );
        let billed = if snapshot.is_overage() {
            self.red(&billed)
        } else {
            billed
        };
        lines.push(format!("{:<10}{}", "Billed:", billed));

        if !snapshot.breakdowns.is_empty() {
            lines.push(String::new());
            lines.push(self.dim(&format!(
                "  {:<28} {:>9} {:>8} {:>9}",
                "Model", "Requests", "Billed", "Cost"
            )));
            for row in &snapshot.breakdowns {
                lines.push(format_breakdown(row));
            }
        }

        lines.push(String::new());
        lines.push(Period::containing(now).reset_countdown(now));
        lines.push(self.dim(&format!(
            "Updated {}",
            snapshot
                .fetched_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        )));

        lines.join("\n")
    }

    /// Formats the controller status: state line, then the held snapshot.
    pub fn format_status(&self, status: &RefreshStatus, now: DateTime<Utc>) -> String {
        let mut lines = Vec::new();

        match &status.state {
            RefreshState::Fetching => lines.push(self.dim("Refreshing…")),
            RefreshState::Failed { message, .. } => lines.push(self.format_error(message)),
            RefreshState::Idle | RefreshState::Succeeded => {}
        }

        match &status.snapshot {
            Some(snapshot) => lines.push(self.format_snapshot(snapshot, now)),
            None if !status.state.is_fetching() => lines.push(self.dim("No usage data yet")),
            None => {}
        }

        lines.join("\n")
    }

    /// Formats an error message.
    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.red("Error:"), message)
    }

    /// Formats a progress bar for a consumption ratio, clamped to full.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn progress_bar(&self, ratio: f64) -> String {
        let filled = (ratio.clamp(0.0, 1.0) * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_ratio(ratio, &bar)
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    pub(crate) fn color_for_ratio(&self, ratio: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if ratio >= 1.0 {
            self.red(text)
        } else if ratio >= WARN_RATIO {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}

fn format_breakdown(row: &ModelBreakdown) -> String {
    format!(
        "  {:<28} {:>9} {:>8} {:>9}",
        row.model,
        row.gross_quantity,
        row.net_quantity,
        format_amount(row.net_amount)
    )
}
