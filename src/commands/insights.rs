use crate::ai::Generator;
use crate::commands::Out;
use crate::render::{self, Palette};
use crate::session::Session;
use crate::view::Theme;
use crate::{Config, Result};

/// Asks the model for a summary of the most recent transactions.
///
/// A failed request is logged and reported as a message rather than an error, the same way a
/// failed refresh keeps the previous insights in the shell.
pub async fn insights(
    config: Config,
    generator: Box<dyn Generator>,
    theme: Theme,
    palette: Palette,
) -> Result<Out<String>> {
    let mut session = Session::load(&config, generator, theme).await;
    if !session.refresh_insights().await? {
        return Ok("No insights are available right now, please try again later".into());
    }
    let message = render::insights(session.insights(), &palette);
    match session.insights().text() {
        Some(text) => Ok(Out::new(message, text.to_string())),
        None => Ok(message.into()),
    }
}
