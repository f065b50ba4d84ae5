//! Text rendering of the dashboard, the transaction list, drafts and insights.
//!
//! Everything here returns a `String` so that commands decide where it goes and tests can check
//! it. Colours come from the active `Theme`; a `Palette` built with colour disabled produces
//! plain text.

use crate::aggregate::Summary;
use crate::ai::{Extraction, Insights};
use crate::form::Draft;
use crate::model::{format_currency, Transaction, TransactionType};
use crate::view::{Filter, Theme};
use crossterm::style::{Color, Stylize};

/// Shown instead of the list when no transaction passes the filter.
pub const NO_TRANSACTIONS: &str = "No transactions found.";

/// Shown instead of the breakdown when there are no expenses.
pub const NO_EXPENSES: &str = "Add expenses to see breakdown";

/// The fixed share of the monthly goal shown in the budget status. Goals are not tracked.
pub const MONTHLY_GOAL_PROGRESS: f64 = 45.0;

const BAR_WIDTH: usize = 20;
const DESCRIPTION_WIDTH: usize = 24;

/// The semantic colours of one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    heading: Color,
    muted: Color,
    positive: Color,
    negative: Color,
    accent: Color,
    ai: Color,
    enabled: bool,
}

impl Palette {
    pub fn new(theme: Theme, enabled: bool) -> Self {
        match theme {
            Theme::Light => Self {
                heading: Color::Black,
                muted: Color::DarkGrey,
                positive: Color::DarkGreen,
                negative: Color::DarkRed,
                accent: Color::DarkBlue,
                ai: Color::DarkMagenta,
                enabled,
            },
            Theme::Dark => Self {
                heading: Color::White,
                muted: Color::Grey,
                positive: Color::Green,
                negative: Color::Red,
                accent: Color::Blue,
                ai: Color::Magenta,
                enabled,
            },
        }
    }

    /// A palette that adds no escape sequences.
    pub fn plain() -> Self {
        Self::new(Theme::Light, false)
    }

    fn paint(&self, color: Color, text: &str) -> String {
        if self.enabled {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    /// Section titles are bold as well as coloured.
    fn title(&self, color: Color, text: &str) -> String {
        if self.enabled {
            text.with(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Green for zero and above, red below zero.
    fn value(&self, value: f64) -> Color {
        if value >= 0.0 {
            self.positive
        } else {
            self.negative
        }
    }
}

/// Joins `lines` into a block that ends with a newline.
fn block(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// The balance, income and expense figures followed by the spending breakdown and the budget
/// status.
pub fn dashboard(summary: &Summary, palette: &Palette) -> String {
    let figures = [
        ("Total Balance", summary.balance, palette.value(summary.balance)),
        ("Total Income", summary.total_income, palette.positive),
        ("Total Expenses", summary.total_expense, palette.negative),
    ];
    let lines = figures
        .iter()
        .map(|(label, value, color)| {
            format!("{label:<16}{}", palette.paint(*color, &format_currency(*value)))
        })
        .collect();
    [
        block(lines),
        breakdown(summary, palette),
        budget_status(summary, palette),
    ]
    .join("\n")
}

/// The top expense categories as proportional bars.
pub fn breakdown(summary: &Summary, palette: &Palette) -> String {
    let mut lines = vec![palette.title(palette.heading, "Spending Breakdown")];
    if summary.breakdown.is_empty() {
        lines.push(format!("  {}", palette.paint(palette.muted, NO_EXPENSES)));
        return block(lines);
    }
    for share in &summary.breakdown {
        lines.push(format!(
            "  {:<15}{} {:>5.1}%  {}",
            share.category.to_string(),
            palette.paint(palette.accent, &bar(share.percentage)),
            share.percentage,
            format_currency(share.value)
        ));
    }
    lines.push(format!(
        "  {}",
        palette.paint(palette.muted, "Top expense categories this period")
    ));
    block(lines)
}

/// How much has been spent so far, with the fixed progress towards the monthly goal.
pub fn budget_status(summary: &Summary, palette: &Palette) -> String {
    block(vec![
        palette.title(palette.heading, "Budget Status"),
        format!(
            "  You've spent {} so far. Keep tracking to stay on top of your finances!",
            palette.paint(palette.negative, &format_currency(summary.total_expense))
        ),
        format!(
            "  {} {}",
            palette.paint(palette.accent, &bar(MONTHLY_GOAL_PROGRESS)),
            palette.paint(
                palette.muted,
                &format!("{MONTHLY_GOAL_PROGRESS:.0}% of monthly goal")
            )
        ),
    ])
}

/// A bar of `BAR_WIDTH` cells filled in proportion to `percentage`.
fn bar(percentage: f64) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH.saturating_sub(filled))
    )
}

/// One line per transaction with its id for deletion, or `NO_TRANSACTIONS`.
pub fn transaction_list(transactions: &[&Transaction], filter: Filter, palette: &Palette) -> String {
    let mut lines = vec![format!(
        "{} {}",
        palette.title(palette.heading, "Transactions"),
        palette.paint(palette.muted, &format!("({filter})"))
    )];
    if transactions.is_empty() {
        lines.push(format!("  {}", palette.paint(palette.muted, NO_TRANSACTIONS)));
    } else {
        lines.extend(
            transactions
                .iter()
                .map(|t| format!("  {}", transaction_line(t, palette))),
        );
    }
    block(lines)
}

fn transaction_line(t: &Transaction, palette: &Palette) -> String {
    let (sign, style) = match t.r#type() {
        TransactionType::Income => ('+', palette.positive),
        TransactionType::Expense => ('-', palette.negative),
    };
    let amount = format!("{sign}{}", format_currency(t.amount().value()));
    format!(
        "{}  {}  {:<desc$}  {:<14}{:>14}",
        palette.paint(palette.muted, &format!("{:>13}", t.id())),
        t.date(),
        truncate(t.description(), DESCRIPTION_WIDTH),
        t.category().to_string(),
        palette.paint(style, &amount),
        desc = DESCRIPTION_WIDTH,
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut s: String = text.chars().take(width.saturating_sub(1)).collect();
    s.push('…');
    s
}

/// The fields of a draft, as shown for review before it is submitted.
pub fn draft(draft: &Draft, palette: &Palette) -> String {
    let r#type = draft.r#type.to_string();
    let category = draft.category.to_string();
    let rows = [
        ("description", draft.description.as_str()),
        ("amount", draft.amount.as_str()),
        ("type", r#type.as_str()),
        ("category", category.as_str()),
        ("date", draft.date.as_str()),
    ];
    let mut lines = vec![palette.title(palette.heading, "New Transaction")];
    lines.extend(rows.iter().map(|(name, value)| format!("  {name:<13}{value}")));
    block(lines)
}

/// The insights panel: the latest summary, or a hint on how to get one.
pub fn insights(insights: &Insights, palette: &Palette) -> String {
    let mut lines = vec![palette.title(palette.ai, "AI Insights")];
    if insights.is_loading() {
        lines.push("  Gemini is crunching the numbers...".to_string());
    } else if let Some(text) = insights.text() {
        lines.extend(text.lines().map(|line| format!("  {line}")));
    } else {
        lines.push(format!(
            "  {}",
            palette.paint(palette.muted, "Get personalized tips based on your spending.")
        ));
    }
    block(lines)
}

/// The failure notice of the free-text entry, if there is one.
pub fn extraction_notice(extraction: &Extraction, palette: &Palette) -> Option<String> {
    extraction
        .notice()
        .map(|notice| palette.paint(palette.negative, notice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Category, TransactionId};
    use crate::store::seed;
    use chrono::NaiveDate;

    #[test]
    fn test_dashboard_seed_figures() {
        let summary = Summary::of(&seed());
        let text = dashboard(&summary, &Palette::plain());
        assert!(text.contains("-₹5,450.00"));
        assert!(text.contains("₹15,000.00"));
        assert!(text.contains("₹20,450.00"));
        assert!(text.contains("Housing"));
        assert!(text.contains("88.0%"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_breakdown_without_expenses() {
        let summary = Summary::of(&[]);
        assert!(breakdown(&summary, &Palette::plain()).contains(NO_EXPENSES));
    }

    #[test]
    fn test_empty_list_message() {
        let text = transaction_list(&[], Filter::Income, &Palette::plain());
        assert!(text.contains(NO_TRANSACTIONS));
        assert!(text.contains("(income)"));
    }

    #[test]
    fn test_list_signs_and_ids() {
        let seed = seed();
        let all: Vec<&Transaction> = seed.iter().collect();
        let text = transaction_list(&all, Filter::All, &Palette::plain());
        assert!(text.contains("+₹15,000.00"));
        assert!(text.contains("-₹18,000.00"));
        assert!(text.contains("2023-10-26"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_long_description_is_truncated() {
        let t = Transaction::new(
            TransactionId::new(9),
            "A very long description that will not fit",
            Amount::new(1.0).unwrap(),
            TransactionType::Expense,
            Category::General,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        );
        let line = transaction_line(&t, &Palette::plain());
        assert!(line.contains("A very long description…"));
    }

    #[test]
    fn test_colour_follows_theme() {
        let light = Palette::new(Theme::Light, true);
        let dark = Palette::new(Theme::Dark, true);
        assert_eq!(light.negative, Color::DarkRed);
        assert_eq!(dark.negative, Color::Red);
        assert_eq!(
            light.paint(light.negative, "-₹5.00"),
            "-₹5.00".with(Color::DarkRed).to_string()
        );
        assert_eq!(
            dark.title(dark.heading, "Transactions"),
            "Transactions".with(Color::White).bold().to_string()
        );
        assert_ne!(light, dark);
    }

    #[test]
    fn test_plain_palette_adds_nothing() {
        let palette = Palette::plain();
        assert_eq!(palette.paint(palette.negative, "-₹5.00"), "-₹5.00");
        assert_eq!(palette.title(palette.heading, "Transactions"), "Transactions");
    }

    #[test]
    fn test_budget_status_shows_spending() {
        let text = budget_status(&Summary::of(&seed()), &Palette::plain());
        assert!(text.contains("You've spent ₹20,450.00 so far."));
        assert!(text.contains("45% of monthly goal"));
        assert_eq!(text.chars().filter(|c| *c == '█').count(), 9);
        assert!(dashboard(&Summary::of(&seed()), &Palette::plain()).contains("Budget Status"));
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(0.0), "░".repeat(BAR_WIDTH));
        assert_eq!(bar(100.0), "█".repeat(BAR_WIDTH));
        assert_eq!(bar(50.0).chars().filter(|c| *c == '█').count(), 10);
    }
}
