//! Read-only commands: the dashboard with the transaction list, and the summary on its own.

use crate::aggregate::Summary;
use crate::commands::{open_store, Out};
use crate::model::Transaction;
use crate::render::{self, Palette};
use crate::view::{Filter, ViewState};
use crate::{Config, Result};

/// Renders the dashboard followed by the transactions that pass `filter`. The structured output is
/// the filtered list.
pub async fn list(config: Config, filter: Filter, palette: Palette) -> Result<Out<Vec<Transaction>>> {
    let store = open_store(&config).await;
    let mut view = ViewState::default();
    view.set_filter(filter);
    let visible = view.project(store.transactions());

    let mut message = render::dashboard(&Summary::of(store.transactions()), &palette);
    message.push('\n');
    message.push_str(&render::transaction_list(&visible, filter, &palette));

    let structure = visible.into_iter().cloned().collect();
    Ok(Out::new(message, structure))
}

/// Renders total income, total expenses, the balance and the spending breakdown.
pub async fn summary(config: Config, palette: Palette) -> Result<Out<Summary>> {
    let store = open_store(&config).await;
    let summary = Summary::of(store.transactions());
    Ok(Out::new(render::dashboard(&summary, &palette), summary))
}
