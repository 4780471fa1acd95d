//! Output formatting for the CLI.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use storefront_client::{Notice, NoticeLevel, Notifier};
use storefront_core::checkout::FulfillmentStatus;
use storefront_core::Money;

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(&self, item: &str) {
        if self.json {
            return;
        }
        println!("  {} {}", style("•").dim(), item);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  "));
    }

    /// Create a spinner for indeterminate progress.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(spinner_style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Prints storefront notices as they arrive.
pub struct ConsoleNotifier {
    output: Output,
}

impl ConsoleNotifier {
    pub fn new(output: Output) -> Self {
        Self { output }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => self.output.error(&notice.message),
            NoticeLevel::Warning => self.output.warn(&notice.message),
            NoticeLevel::Success => self.output.success(&notice.message),
            NoticeLevel::Info => self.output.info(&notice.message),
        }
    }
}

/// Status badge for fulfillment states.
pub fn status_badge(status: &FulfillmentStatus) -> String {
    let label = status.as_str();
    match status {
        FulfillmentStatus::Delivered => style(label).green().to_string(),
        FulfillmentStatus::OrderPlaced | FulfillmentStatus::Packing => {
            style(label).yellow().to_string()
        }
        FulfillmentStatus::Shipped | FulfillmentStatus::OutForDelivery => {
            style(label).cyan().to_string()
        }
        FulfillmentStatus::Cancelled => style(label).dim().to_string(),
        FulfillmentStatus::Other(_) => label.to_string(),
    }
}

/// Format money right-aligned for table columns.
pub fn money_cell(money: &Money) -> String {
    format!("{:>14}", money.display())
}

/// Format an epoch-milliseconds timestamp as a local date.
pub fn format_date(epoch_millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(epoch_millis)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::Currency;

    #[test]
    fn test_format_date_handles_zero_and_out_of_range() {
        assert_ne!(format_date(0), "-");
        assert_eq!(format_date(i64::MAX), "-");
    }

    #[test]
    fn test_money_cell_is_padded() {
        let cell = money_cell(&Money::new(30_000, Currency::VND));
        assert_eq!(cell.chars().count(), 14);
        assert_eq!(cell.trim_start(), "\u{0111}30000");
    }

    #[test]
    fn test_unknown_status_is_plain() {
        let status = FulfillmentStatus::Other("Returned".into());
        assert_eq!(status_badge(&status), "Returned");
    }
}
