//! Delete command handler.

use crate::commands::{open_store, Out};
use crate::model::TransactionId;
use crate::{Config, Result};
use tracing::warn;

/// Deletes the transaction with `id`. An id that matches nothing is reported but is not an error.
pub async fn delete(config: Config, id: TransactionId) -> Result<Out<Vec<TransactionId>>> {
    let mut store = open_store(&config).await;
    if store.remove(id).await? {
        Ok(Out::new(format!("Deleted transaction {id}"), vec![id]))
    } else {
        warn!("There is no transaction with id {id}");
        Ok(Out::new(format!("No transaction with id {id}"), Vec::new()))
    }
}
