//! The interactive session: one line per command, with the form, the filter, the theme and the
//! insights kept between commands.

use crate::commands::add::added_message;
use crate::commands::Out;
use crate::form::{DraftField, SubmitOutcome};
use crate::model::{Category, TransactionId, TransactionType};
use crate::render::{self, Palette};
use crate::session::Session;
use crate::view::Filter;
use crate::Result;
use anyhow::Context;
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error};

const HELP: &str = "\
Commands:
  show                    show the dashboard and the transactions
  filter all|income|expense
                          only list transactions of one type
  theme                   switch between the light and dark theme
  add                     open the form with a blank transaction
  set FIELD VALUE         fill in a form field: description, amount, type, category or date
  submit                  add the transaction in the form
  cancel                  close the form without adding anything
  smart TEXT              describe a transaction in your own words and review what Gemini finds
  retry                   send the last smart text again
  delete ID               delete a transaction
  insights                ask Gemini for a short summary of your spending
  help                    show this list
  quit                    leave the shell";

/// One line typed into the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Show,
    Filter(Filter),
    Theme,
    Add,
    Set(DraftField),
    Submit,
    Cancel,
    Smart(String),
    Retry,
    Delete(TransactionId),
    Insights,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    /// The first word picks the command, case-insensitively; the rest of the line is its argument.
    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));
        let command = match word.to_ascii_lowercase().as_str() {
            "show" | "list" | "ls" => ShellCommand::Show,
            "filter" => ShellCommand::Filter(
                Filter::from_str(&rest.to_ascii_lowercase())
                    .map_err(|_| "Usage: filter all|income|expense".to_string())?,
            ),
            "theme" => ShellCommand::Theme,
            "add" | "new" => ShellCommand::Add,
            "set" => ShellCommand::Set(parse_field(rest)?),
            "submit" | "save" => ShellCommand::Submit,
            "cancel" => ShellCommand::Cancel,
            "smart" => {
                if rest.is_empty() {
                    return Err("Usage: smart TEXT".to_string());
                }
                ShellCommand::Smart(rest.to_string())
            }
            "retry" => ShellCommand::Retry,
            "delete" | "rm" => ShellCommand::Delete(
                TransactionId::from_str(rest).map_err(|_| "Usage: delete ID".to_string())?,
            ),
            "insights" => ShellCommand::Insights,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => return Err(format!("Unknown command '{other}', type 'help' for a list")),
        };
        Ok(command)
    }
}

fn parse_field(rest: &str) -> std::result::Result<DraftField, String> {
    let (name, value) = rest
        .split_once(char::is_whitespace)
        .map(|(n, v)| (n, v.trim()))
        .unwrap_or((rest, ""));
    let field = match name.to_ascii_lowercase().as_str() {
        "description" => DraftField::Description(value.to_string()),
        "amount" => DraftField::Amount(value.to_string()),
        "type" => DraftField::Type(
            TransactionType::parse_loose(value)
                .ok_or_else(|| "The type is either income or expense".to_string())?,
        ),
        "category" => DraftField::Category(
            Category::parse_loose(value)
                .ok_or_else(|| format!("The category is one of: {}", Category::list()))?,
        ),
        "date" => DraftField::Date(value.to_string()),
        _ => {
            return Err(
                "Usage: set description|amount|type|category|date VALUE".to_string(),
            )
        }
    };
    Ok(field)
}

/// Runs commands read from `input` against `session` until `quit` or the end of input. Output is
/// written to `out`; `colour` turns ANSI colours on.
///
/// A command that fails, for example because the snapshot cannot be written, is reported and the
/// session carries on.
///
/// # Errors
/// - Returns an error if reading `input` or writing `out` fails.
pub async fn shell<R, W>(mut session: Session, input: R, out: &mut W, colour: bool) -> Result<Out<()>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    show(&session, out, colour)?;
    writeln!(out, "Type 'help' for the list of commands.")?;
    loop {
        let prompt = if session.form().is_open() {
            "budget (new transaction)> "
        } else {
            "budget> "
        };
        write!(out, "{prompt}")?;
        out.flush()?;

        let Some(line) = lines
            .next_line()
            .await
            .context("Unable to read from the terminal")?
        else {
            writeln!(out)?;
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match ShellCommand::from_str(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };
        debug!("Shell command: {command:?}");
        if command == ShellCommand::Quit {
            break;
        }
        // A failed command ends the command, not the session.
        if let Err(e) = run(&mut session, command, out, colour).await {
            error!("{e:#}");
            writeln!(out, "Error: {e:#}")?;
        }
    }
    Ok("Goodbye!".into())
}

async fn run<W: Write>(
    session: &mut Session,
    command: ShellCommand,
    out: &mut W,
    colour: bool,
) -> Result<()> {
    let palette = Palette::new(session.view().theme(), colour);
    match command {
        ShellCommand::Show => show(session, out, colour)?,
        ShellCommand::Filter(filter) => {
            session.set_filter(filter);
            let visible = session.visible();
            write!(
                out,
                "{}",
                render::transaction_list(&visible, filter, &palette)
            )?;
        }
        ShellCommand::Theme => {
            session.toggle_theme();
            writeln!(out, "Switched to the {} theme", session.view().theme())?;
        }
        ShellCommand::Add => {
            session.open_form(None);
            show_draft(session, out, &palette)?;
        }
        ShellCommand::Set(field) => {
            if !session.form().is_open() {
                writeln!(out, "The form is closed, type 'add' to open it")?;
            } else {
                session.set_field(field);
                show_draft(session, out, &palette)?;
            }
        }
        ShellCommand::Submit => match session.submit_form().await? {
            SubmitOutcome::Committed(t) => writeln!(out, "{}", added_message(&t))?,
            SubmitOutcome::Rejected => writeln!(
                out,
                "A description and a non-negative amount are required, and the date must look \
                like YYYY-MM-DD"
            )?,
            SubmitOutcome::NotOpen => writeln!(out, "The form is closed, type 'add' to open it")?,
        },
        ShellCommand::Cancel => {
            session.cancel_form();
            writeln!(out, "Discarded the form")?;
        }
        ShellCommand::Smart(text) => {
            writeln!(out, "Gemini is reading your text...")?;
            session.smart_add(&text).await;
            show_extraction(session, out, &palette)?;
        }
        ShellCommand::Retry => {
            if session.extraction().text().trim().is_empty() {
                writeln!(out, "There is nothing to retry, use 'smart TEXT'")?;
            } else {
                session.retry_smart_add().await;
                show_extraction(session, out, &palette)?;
            }
        }
        ShellCommand::Delete(id) => {
            if session.delete(id).await? {
                writeln!(out, "Deleted transaction {id}")?;
            } else {
                writeln!(out, "No transaction with id {id}")?;
            }
        }
        ShellCommand::Insights => {
            writeln!(out, "Gemini is crunching the numbers...")?;
            if !session.refresh_insights().await? {
                writeln!(out, "No new insights right now.")?;
            }
            write!(out, "{}", render::insights(session.insights(), &palette))?;
        }
        ShellCommand::Help => writeln!(out, "{HELP}")?,
        ShellCommand::Quit => {}
    }
    Ok(())
}

fn show<W: Write>(session: &Session, out: &mut W, colour: bool) -> Result<()> {
    let palette = Palette::new(session.view().theme(), colour);
    let visible = session.visible();
    write!(out, "{}", render::dashboard(&session.summary(), &palette))?;
    writeln!(out)?;
    write!(
        out,
        "{}",
        render::transaction_list(&visible, session.view().filter(), &palette)
    )?;
    if session.insights().text().is_some() {
        writeln!(out)?;
        write!(out, "{}", render::insights(session.insights(), &palette))?;
    }
    if session.form().is_open() {
        writeln!(out)?;
        show_draft(session, out, &palette)?;
    }
    Ok(())
}

fn show_draft<W: Write>(session: &Session, out: &mut W, palette: &Palette) -> Result<()> {
    if let Some(draft) = session.form().draft() {
        write!(out, "{}", render::draft(draft, palette))?;
        writeln!(out, "Use 'set FIELD VALUE' to change a field, then 'submit' or 'cancel'.")?;
    }
    Ok(())
}

fn show_extraction<W: Write>(session: &Session, out: &mut W, palette: &Palette) -> Result<()> {
    match render::extraction_notice(session.extraction(), palette) {
        Some(notice) => {
            writeln!(out, "{notice}")?;
            writeln!(out, "Type 'retry' to send it again or 'add' to enter it manually.")?;
        }
        None => show_draft(session, out, palette)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{TestGenerator, EXTRACTION_FAILED};
    use crate::store::{MemorySlot, Store};
    use crate::view::Theme;

    const PIZZA: &str = r#"{"description":"Pizza","amount":450,"type":"expense","category":"Food","date":"2023-11-02"}"#;

    async fn run_script(generator: TestGenerator, script: &str) -> (String, MemorySlot) {
        let slot = MemorySlot::default();
        let store = Store::load(Box::new(slot.clone())).await;
        let session = Session::new(store, Box::new(generator), Theme::Light);
        let mut out = Vec::new();
        shell(session, script.as_bytes(), &mut out, false)
            .await
            .unwrap();
        (String::from_utf8(out).unwrap(), slot)
    }

    fn saved(slot: &MemorySlot) -> Vec<crate::model::Transaction> {
        serde_json::from_str(&slot.contents().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ShellCommand::from_str("FILTER Income").unwrap(),
            ShellCommand::Filter(Filter::Income)
        );
        assert_eq!(
            ShellCommand::from_str("set description Bus pass").unwrap(),
            ShellCommand::Set(DraftField::Description("Bus pass".into()))
        );
        assert_eq!(
            ShellCommand::from_str("set category health").unwrap(),
            ShellCommand::Set(DraftField::Category(Category::Health))
        );
        assert_eq!(
            ShellCommand::from_str("smart pizza 450 yesterday").unwrap(),
            ShellCommand::Smart("pizza 450 yesterday".into())
        );
        assert_eq!(
            ShellCommand::from_str("delete 3").unwrap(),
            ShellCommand::Delete(TransactionId::new(3))
        );
        assert!(ShellCommand::from_str("delete three").is_err());
        assert!(ShellCommand::from_str("set colour red").is_err());
        assert!(ShellCommand::from_str("set category pets").is_err());
        assert!(ShellCommand::from_str("smart").is_err());
        assert!(ShellCommand::from_str("dance").is_err());
    }

    #[tokio::test]
    async fn test_manual_entry() {
        let script = "add\n\
                      set description Bus pass\n\
                      set amount 1200\n\
                      set category transportation\n\
                      set date 2023-11-04\n\
                      submit\n\
                      quit\n";
        let (output, slot) = run_script(TestGenerator::default(), script).await;
        assert!(output.contains("Added expense 'Bus pass'"));
        let saved = saved(&slot);
        assert_eq!(saved.len(), 4);
        assert_eq!(saved[0].category(), Category::Transportation);
    }

    #[tokio::test]
    async fn test_rejected_submit_keeps_form_open() {
        let script = "add\nset description Tea\nsubmit\nset amount 40\nsubmit\n";
        let (output, slot) = run_script(TestGenerator::default(), script).await;
        assert!(output.contains("A description and a non-negative amount are required"));
        assert!(output.contains("Added expense 'Tea'"));
        assert_eq!(saved(&slot).len(), 4);
    }

    #[tokio::test]
    async fn test_smart_then_submit() {
        let (output, slot) =
            run_script(TestGenerator::replying(PIZZA), "smart pizza 450\nsubmit\n").await;
        assert!(output.contains("Pizza"));
        let saved = saved(&slot);
        assert_eq!(saved.len(), 4);
        assert_eq!(saved[0].description(), "Pizza");
    }

    #[tokio::test]
    async fn test_smart_failure_then_retry() {
        let generator = TestGenerator::new([Ok("garbage".to_string()), Ok(PIZZA.to_string())]);
        let (output, slot) = run_script(generator, "smart pizza 450\nretry\nsubmit\n").await;
        assert!(output.contains(EXTRACTION_FAILED));
        assert_eq!(saved(&slot)[0].description(), "Pizza");
    }

    #[tokio::test]
    async fn test_filter_delete_and_theme() {
        let script = "filter income\ndelete 3\ndelete 3\ntheme\nbogus\n";
        let (output, slot) = run_script(TestGenerator::default(), script).await;
        assert!(output.contains("(income)"));
        assert!(output.contains("Deleted transaction 3"));
        assert!(output.contains("No transaction with id 3"));
        assert!(output.contains("Switched to the dark theme"));
        assert!(output.contains("Unknown command 'bogus'"));
        assert_eq!(saved(&slot).len(), 2);
    }

    #[tokio::test]
    async fn test_insights() {
        let (output, _) = run_script(
            TestGenerator::replying("Rent is most of your spending."),
            "insights\n",
        )
        .await;
        assert!(output.contains("Rent is most of your spending."));
    }
}
