//! The state of one interactive session: the store together with the form, the view, and the two
//! AI features that feed it.

use crate::aggregate::Summary;
use crate::ai::{Extraction, Generator, Insights, INSIGHT_SAMPLE};
use crate::form::{Draft, DraftField, FormController, SubmitOutcome};
use crate::model::{Transaction, TransactionId};
use crate::store::{FileSlot, Store};
use crate::view::{Filter, Theme, ViewState};
use crate::{utils, Config, Result};
use tracing::debug;

/// Owns everything a user can change. All mutation goes through `&mut self`, so there is a single
/// writer and no locking.
pub struct Session {
    store: Store,
    form: FormController,
    view: ViewState,
    extraction: Extraction,
    insights: Insights,
    generator: Box<dyn Generator>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("form", &self.form)
            .field("view", &self.view)
            .field("extraction", &self.extraction)
            .field("insights", &self.insights)
            .finish()
    }
}

impl Session {
    pub fn new(store: Store, generator: Box<dyn Generator>, theme: Theme) -> Self {
        Self {
            store,
            form: FormController::new(),
            view: ViewState::new(theme),
            extraction: Extraction::new(),
            insights: Insights::new(),
            generator,
        }
    }

    /// Restores the store from the snapshot file named by `config` and starts a session on it.
    pub async fn load(config: &Config, generator: Box<dyn Generator>, theme: Theme) -> Self {
        let slot = FileSlot::new(config.snapshot_path(), Some(config.backup()));
        let store = Store::load(Box::new(slot)).await;
        Self::new(store, generator, theme)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }

    pub fn insights(&self) -> &Insights {
        &self.insights
    }

    /// Totals and category breakdown over every transaction, regardless of the filter.
    pub fn summary(&self) -> Summary {
        Summary::of(self.store.transactions())
    }

    /// The transactions that pass the current filter.
    pub fn visible(&self) -> Vec<&Transaction> {
        self.view.project(self.store.transactions())
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.view.set_filter(filter);
    }

    pub fn toggle_theme(&mut self) {
        self.view.toggle_theme();
    }

    /// Opens the form with `prefill`, or a blank draft.
    pub fn open_form(&mut self, prefill: Option<Draft>) {
        self.form.open(prefill, utils::today());
    }

    pub fn set_field(&mut self, field: DraftField) {
        self.form.set_field(field);
    }

    pub async fn submit_form(&mut self) -> Result<SubmitOutcome> {
        self.form.submit(&mut self.store).await
    }

    pub fn cancel_form(&mut self) {
        self.form.cancel();
    }

    /// Opens the form with `draft` and submits it. A rejected draft stays open in the form.
    pub async fn add_manual(&mut self, draft: Draft) -> Result<SubmitOutcome> {
        self.open_form(Some(draft));
        self.submit_form().await
    }

    /// Removes the transaction with `id`. Returns `false` if there was none.
    pub async fn delete(&mut self, id: TransactionId) -> Result<bool> {
        self.store.remove(id).await
    }

    /// Sends `text` to the model and, on success, opens the form with the extracted draft for
    /// review. Nothing is added to the store until the form is submitted.
    ///
    /// On failure, `extraction().notice()` explains what happened and the text is kept for
    /// `retry_smart_add`.
    pub async fn smart_add(&mut self, text: &str) -> Option<&Draft> {
        self.extraction.open();
        self.extraction.set_text(text);
        self.retry_smart_add().await
    }

    /// Sends the text kept from the last attempt to the model again.
    pub async fn retry_smart_add(&mut self) -> Option<&Draft> {
        let today = utils::today();
        let draft = self
            .extraction
            .extract(self.generator.as_ref(), today)
            .await?;
        debug!("Opening the form with the extracted draft");
        self.form.open(Some(draft), today);
        self.form.draft()
    }

    /// Asks the model to summarize the most recent transactions. Returns whether new insights were
    /// stored; failures keep the previous insights.
    pub async fn refresh_insights(&mut self) -> Result<bool> {
        self.insights
            .refresh(
                self.generator.as_ref(),
                self.store.recent(INSIGHT_SAMPLE),
            )
            .await
    }
}
