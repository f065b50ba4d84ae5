use crate::args::AddArgs;
use crate::commands::{open_store, Out};
use crate::form::{Draft, FormController, SubmitOutcome, DATE_FORMAT};
use crate::model::{format_currency, Transaction};
use crate::{utils, Config, Result};
use anyhow::bail;

/// Adds a transaction from the command line arguments.
///
/// The arguments go through the same form as every other transaction: a blank description, a
/// missing, negative or non-numeric amount, or a malformed date are rejected.
///
/// # Errors
/// - Returns an error if the arguments are rejected or the snapshot cannot be written.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<Transaction>> {
    let today = utils::today();
    let draft = Draft {
        description: args.description().to_string(),
        amount: args.amount().to_string(),
        r#type: args.r#type(),
        category: args.category(),
        date: args
            .date()
            .map(str::to_string)
            .unwrap_or_else(|| today.format(DATE_FORMAT).to_string()),
    };

    let mut store = open_store(&config).await;
    let mut form = FormController::new();
    form.open(Some(draft), today);
    match form.submit(&mut store).await? {
        SubmitOutcome::Committed(t) => Ok(Out::new(added_message(&t), t)),
        SubmitOutcome::Rejected | SubmitOutcome::NotOpen => bail!(
            "The transaction was not added. It needs a description and a non-negative amount, \
            and the date must look like YYYY-MM-DD"
        ),
    }
}

pub(super) fn added_message(t: &Transaction) -> String {
    format!(
        "Added {} '{}' of {} in {} on {} (id {})",
        t.r#type(),
        t.description(),
        format_currency(t.amount().value()),
        t.category(),
        t.date(),
        t.id()
    )
}
