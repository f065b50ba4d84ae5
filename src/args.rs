//! These structs provide the CLI interface for the budget CLI.

use crate::ai::ApiKey;
use crate::model::{Category, TransactionId, TransactionType};
use crate::view::{Filter, Theme};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// budget: A personal budget tracker for the command line.
///
/// Record income and expenses, see your balance and where your money goes, and optionally let
/// Gemini turn a sentence like "Spent 450 on pizza yesterday" into a transaction or summarize
/// your recent spending.
///
/// The AI features need a Gemini API key, passed with --api-key or the GEMINI_API_KEY
/// environment variable. Everything else works without one.
#[derive(Debug, Parser, Clone)]
#[command(name = "budget", version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and its configuration file.
    ///
    /// This is the first command you should run. The data directory defaults to
    /// ~/.budget-tracker; pass --home to put it somewhere else. A few sample transactions are
    /// shown until you add your own.
    Init,
    /// Show the dashboard followed by the transaction list.
    List(ListArgs),
    /// Show total income, total expenses, balance and the top spending categories.
    Summary,
    /// Add a transaction.
    Add(AddArgs),
    /// Delete a transaction by its id. The ids are shown by the list command.
    Delete(DeleteArgs),
    /// Describe a transaction in your own words and let Gemini fill in the details.
    ///
    /// The extracted transaction is shown for review and only added once you confirm it.
    SmartAdd(SmartAddArgs),
    /// Ask Gemini for a short summary of your recent spending with a few tips.
    Insights,
    /// Start an interactive session. Type 'help' inside it for the list of commands.
    Shell,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, global = true, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where transactions and configuration are held. Defaults to
    /// ~/.budget-tracker
    #[arg(long, global = true, default_value_t = default_budget_home())]
    home: DisplayPath,

    /// Light or dark output. Defaults to a guess based on the terminal's background colour.
    #[arg(long, global = true, value_enum)]
    theme: Option<Theme>,

    /// The Gemini API key used by smart-add and insights.
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<ApiKey>,

    /// Answer AI requests with canned replies instead of calling Gemini.
    #[arg(long, global = true, hide = true)]
    test_mode: bool,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }

    /// The theme from `--theme`, or the one detected from the terminal.
    pub fn theme(&self) -> Theme {
        self.theme.unwrap_or_else(Theme::detect)
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref()
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }
}

/// (Not shown): Args for the `budget list` command.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    /// Only show transactions of this type.
    #[arg(long, value_enum, default_value_t = Filter::All)]
    filter: Filter,
}

impl ListArgs {
    pub fn filter(&self) -> Filter {
        self.filter
    }
}

/// (Not shown): Args for the `budget add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// What the transaction was for, e.g. "Grocery Run".
    #[arg(long)]
    description: String,

    /// The amount, a non-negative number such as 2450 or 2,450.50.
    #[arg(long)]
    amount: String,

    /// Whether the money came in or went out.
    #[arg(long = "type", value_enum, default_value_t = TransactionType::Expense)]
    r#type: TransactionType,

    /// The spending category.
    #[arg(long, value_enum, default_value_t = Category::General)]
    category: Category,

    /// The date as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,
}

impl AddArgs {
    pub fn new(
        description: impl Into<String>,
        amount: impl Into<String>,
        r#type: TransactionType,
        category: Category,
        date: Option<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount: amount.into(),
            r#type,
            category,
            date,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn r#type(&self) -> TransactionType {
        self.r#type
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

/// (Not shown): Args for the `budget delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The id of the transaction to delete.
    id: TransactionId,
}

impl DeleteArgs {
    pub fn id(&self) -> TransactionId {
        self.id
    }
}

/// (Not shown): Args for the `budget smart-add` command.
#[derive(Debug, Parser, Clone)]
pub struct SmartAddArgs {
    /// The transaction in your own words, e.g. "Spent 450 rupees on Pizza yesterday".
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,

    /// Add the extracted transaction without asking for confirmation.
    #[arg(long, short)]
    yes: bool,
}

impl SmartAddArgs {
    pub fn new(text: impl Into<String>, yes: bool) -> Self {
        Self {
            text: vec![text.into()],
            yes,
        }
    }

    /// The words of the description joined with spaces.
    pub fn text(&self) -> String {
        self.text.join(" ")
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join(".budget-tracker"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home instead of relying on the default data directory. If \
                you continue using the program right now, you may have problems!",
            );
            PathBuf::from(".budget-tracker")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
