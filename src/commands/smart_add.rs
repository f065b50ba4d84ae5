use crate::ai::Generator;
use crate::args::SmartAddArgs;
use crate::commands::add::added_message;
use crate::commands::{confirm, Out};
use crate::form::SubmitOutcome;
use crate::model::Transaction;
use crate::render::{self, Palette};
use crate::session::Session;
use crate::view::Theme;
use crate::{Config, Result};
use anyhow::bail;
use std::io::Write;
use tokio::io::AsyncBufRead;

/// Sends the free text in `args` to the model and adds the transaction it describes.
///
/// Unless `args.yes()` is set, the extracted transaction is written to `out` and added only after
/// the user answers yes on `input`.
///
/// # Errors
/// - Returns an error with the extraction notice if the model's reply cannot be used.
/// - Returns an error if the extracted transaction is incomplete (for example, no amount was
///   found) or the snapshot cannot be written.
pub async fn smart_add<R, W>(
    config: Config,
    generator: Box<dyn Generator>,
    args: &SmartAddArgs,
    theme: Theme,
    palette: Palette,
    input: &mut R,
    out: &mut W,
) -> Result<Out<Transaction>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = Session::load(&config, generator, theme).await;
    let Some(draft) = session.smart_add(&args.text()).await.cloned() else {
        let notice = session
            .extraction()
            .notice()
            .unwrap_or("Unable to extract a transaction");
        bail!("{notice}");
    };

    if !args.yes() {
        write!(out, "{}", render::draft(&draft, &palette))?;
        if !confirm("Add this transaction?", input, out).await? {
            session.cancel_form();
            return Ok("Discarded the extracted transaction".into());
        }
    }

    match session.submit_form().await? {
        SubmitOutcome::Committed(t) => Ok(Out::new(added_message(&t), t)),
        SubmitOutcome::Rejected | SubmitOutcome::NotOpen => bail!(
            "The extracted transaction is incomplete, add it with 'budget add' or fill in the \
            missing fields in 'budget shell'"
        ),
    }
}
