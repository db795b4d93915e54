//! Wires user actions to the form, the store and the collaborators.
//!
//! Every mutation goes through the controller, which applies it to the
//! in-memory [`FormState`] and then saves the whole document. Destructive
//! actions take two steps: [`Controller::request`] hands out a token and
//! [`Controller::confirm`] carries the action out.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::analysis::{analyze, AnalysisProvider, RetryPolicy};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{export_report, DocumentRenderer};
use crate::form::{fields, FormState, MaydayLog, MedicRecord, RowId, SideKey};
use crate::image_normalizer::ImageNormalizer;
use crate::prompt::{build_incident_prompt, build_medic_prompt, PromptRequest};
use crate::storage::{FormStore, StoreStats};

/// The four form views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Tab {
    /// Incident, building, environment and staffing.
    #[default]
    Basic,
    /// Four-sided reconnaissance.
    Recon,
    /// MEDIC observation records.
    Medic,
    /// Mayday tracking.
    Mayday,
}

impl Tab {
    /// All tabs in display order.
    pub const ALL: [Self; 4] = [Self::Basic, Self::Recon, Self::Medic, Self::Mayday];
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Recon => "recon",
            Self::Medic => "medic",
            Self::Mayday => "mayday",
        };
        f.write_str(name)
    }
}

/// A destructive action awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Remove one MEDIC record.
    DeleteMedicRecord(RowId),
    /// Remove one mayday log row.
    DeleteMaydayLog(RowId),
    /// Discard the whole form.
    Reset,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteMedicRecord(id) => write!(f, "delete MEDIC record {id}"),
            Self::DeleteMaydayLog(id) => write!(f, "delete mayday log entry {id}"),
            Self::Reset => f.write_str("reset the whole form; all entered data will be lost"),
        }
    }
}

/// Handle returned by [`Controller::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConfirmation {
    /// Pass this to [`Controller::confirm`].
    pub token: u64,
    /// The action that will be carried out.
    pub intent: Intent,
}

/// What an analysis run writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisTarget {
    /// The incident-wide narrative.
    Incident,
    /// One MEDIC record's assessment.
    Medic(RowId),
}

impl fmt::Display for AnalysisTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incident => f.write_str("incident"),
            Self::Medic(id) => write!(f, "MEDIC record {id}"),
        }
    }
}

/// Owns the form for the lifetime of a session.
#[derive(Debug)]
pub struct Controller {
    state: FormState,
    store: FormStore,
    tab: Tab,
    pending: Option<PendingConfirmation>,
    next_token: u64,
    busy: HashSet<AnalysisTarget>,
    normalizer: ImageNormalizer,
    retry: RetryPolicy,
}

impl Controller {
    /// Load the saved form from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn new(mut store: FormStore, normalizer: ImageNormalizer, retry: RetryPolicy) -> Result<Self> {
        let state = store.load()?;
        Ok(Self {
            state,
            store,
            tab: Tab::default(),
            pending: None,
            next_token: 1,
            busy: HashSet::new(),
            normalizer,
            retry,
        })
    }

    /// Open the configured store and load the saved form.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = FormStore::open(config.database_path())?;
        Self::new(
            store,
            ImageNormalizer::from_config(&config.image),
            config.retry_policy(),
        )
    }

    /// The current form.
    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// The selected tab.
    #[must_use]
    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Switch tabs. The form is not touched.
    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    /// Statistics for the backing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn store_stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.state).map(|_| ())
    }

    /// Apply `change` to the form, then save.
    ///
    /// The in-memory edit stands even if the save fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn edit<R>(&mut self, change: impl FnOnce(&mut FormState) -> R) -> Result<R> {
        let out = change(&mut self.state);
        self.persist()?;
        Ok(out)
    }

    /// Set one field from text, see [`fields::apply`].
    ///
    /// # Errors
    ///
    /// Returns an error if the path or value is rejected or the save fails.
    pub fn set_field(&mut self, path: &str, value: &str) -> Result<()> {
        fields::apply(&mut self.state, path, value)?;
        debug!(path, "Field updated");
        self.persist()
    }

    /// Add an empty MEDIC record at the top of the list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowIdsExhausted`] if no fresh id is left, or an
    /// error if the save fails.
    pub fn add_medic_record(&mut self) -> Result<RowId> {
        let id = self.state.add_medic_record()?;
        self.persist()?;
        Ok(id)
    }

    /// Change one MEDIC record in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowNotFound`] if no record has `id`.
    pub fn update_medic_record(
        &mut self,
        id: RowId,
        change: impl FnOnce(&mut MedicRecord),
    ) -> Result<()> {
        let record = self.state.medic_mut(id).ok_or(Error::RowNotFound {
            kind: "medic",
            id: id.0,
        })?;
        change(record);
        self.persist()
    }

    /// Add an empty mayday log row at the top of the list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowIdsExhausted`] if no fresh id is left, or an
    /// error if the save fails.
    pub fn add_mayday_log(&mut self) -> Result<RowId> {
        let id = self.state.add_mayday_log()?;
        self.persist()?;
        Ok(id)
    }

    /// Change one mayday log row in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowNotFound`] if no row has `id`.
    pub fn update_mayday_log(&mut self, id: RowId, change: impl FnOnce(&mut MaydayLog)) -> Result<()> {
        let log = self.state.mayday_log_mut(id).ok_or(Error::RowNotFound {
            kind: "mayday",
            id: id.0,
        })?;
        change(log);
        self.persist()
    }

    /// Ask to carry out a destructive action.
    ///
    /// Replaces any earlier pending request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowNotFound`] if the intent names a missing row.
    pub fn request(&mut self, intent: Intent) -> Result<PendingConfirmation> {
        match intent {
            Intent::DeleteMedicRecord(id) if self.state.medic(id).is_none() => {
                return Err(Error::RowNotFound {
                    kind: "medic",
                    id: id.0,
                });
            }
            Intent::DeleteMaydayLog(id)
                if !self.state.mayday.event_log.iter().any(|l| l.id == id) =>
            {
                return Err(Error::RowNotFound {
                    kind: "mayday",
                    id: id.0,
                });
            }
            _ => {}
        }

        let pending = PendingConfirmation {
            token: self.next_token,
            intent,
        };
        self.next_token += 1;
        self.pending = Some(pending);
        debug!(token = pending.token, %intent, "Confirmation requested");
        Ok(pending)
    }

    /// The request awaiting confirmation, if any.
    #[must_use]
    pub fn pending(&self) -> Option<PendingConfirmation> {
        self.pending
    }

    /// Drop the pending request.
    pub fn cancel(&mut self) -> Option<PendingConfirmation> {
        self.pending.take()
    }

    /// Carry out the pending action if `token` matches it.
    ///
    /// A mismatched token leaves the pending request in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPendingConfirmation`] or
    /// [`Error::ConfirmationMismatch`] if nothing matches, and storage
    /// errors from the commit.
    pub fn confirm(&mut self, token: u64) -> Result<Intent> {
        let pending = self.pending.ok_or(Error::NoPendingConfirmation)?;
        if pending.token != token {
            return Err(Error::ConfirmationMismatch { token });
        }
        self.pending = None;

        match pending.intent {
            Intent::DeleteMedicRecord(id) => {
                if self.state.remove_medic_record(id) {
                    self.busy.remove(&AnalysisTarget::Medic(id));
                    self.persist()?;
                }
            }
            Intent::DeleteMaydayLog(id) => {
                if self.state.remove_mayday_log(id) {
                    self.persist()?;
                }
            }
            Intent::Reset => {
                self.state = self.store.reset()?;
                self.busy.clear();
            }
        }
        info!(intent = %pending.intent, "Confirmed");
        Ok(pending.intent)
    }

    /// Whether an analysis for `target` is in flight.
    #[must_use]
    pub fn is_busy(&self, target: AnalysisTarget) -> bool {
        self.busy.contains(&target)
    }

    /// Mark `target` busy and build its prompt.
    ///
    /// Returns `None` if `target` is already busy or names a missing row.
    pub fn begin_analysis(&mut self, target: AnalysisTarget) -> Option<PromptRequest> {
        if self.busy.contains(&target) {
            debug!(%target, "Analysis already running");
            return None;
        }
        let request = match target {
            AnalysisTarget::Incident => build_incident_prompt(&self.state),
            AnalysisTarget::Medic(id) => build_medic_prompt(self.state.medic(id)?),
        };
        self.busy.insert(target);
        Some(request)
    }

    /// Record the outcome of an analysis started with
    /// [`begin_analysis`](Self::begin_analysis).
    ///
    /// Busy is cleared either way. On failure the narrative is left as it
    /// was. Results for targets that are no longer busy (reset, row deleted)
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns the analysis error, or a storage error from saving the text.
    pub fn finish_analysis(&mut self, target: AnalysisTarget, result: Result<String>) -> Result<()> {
        if !self.busy.remove(&target) {
            debug!(%target, "Dropping stale analysis result");
            return Ok(());
        }

        let text = match result {
            Ok(text) => text,
            Err(err) => {
                warn!(%target, error = %err, "Analysis failed, narrative unchanged");
                return Err(err);
            }
        };

        match target {
            AnalysisTarget::Incident => self.state.analysis = text,
            AnalysisTarget::Medic(id) => match self.state.medic_mut(id) {
                Some(record) => record.analysis_action = text,
                None => return Ok(()),
            },
        }
        self.persist()
    }

    /// Run an analysis for `target` end to end.
    ///
    /// Returns `false` if the analysis could not start.
    ///
    /// # Errors
    ///
    /// Returns the provider error after retries, or a storage error.
    pub async fn run_analysis(
        &mut self,
        target: AnalysisTarget,
        provider: &dyn AnalysisProvider,
    ) -> Result<bool> {
        let Some(request) = self.begin_analysis(target) else {
            return Ok(false);
        };
        let result = analyze(provider, &request, &self.retry).await;
        self.finish_analysis(target, result)?;
        Ok(true)
    }

    /// Normalize `raw` and store it as the photo for `side`.
    ///
    /// # Errors
    ///
    /// Returns an image error if `raw` cannot be used; the existing photo
    /// is kept.
    pub fn attach_recon_photo(&mut self, side: SideKey, raw: &[u8]) -> Result<()> {
        let photo = self.normalizer.normalize(raw)?;
        self.edit(|state| state.recon.side_mut(side).photo = Some(photo))
    }

    /// Normalize `raw` and store it as the photo for MEDIC record `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowNotFound`] for a missing record, or an image
    /// error if `raw` cannot be used.
    pub fn attach_medic_photo(&mut self, id: RowId, raw: &[u8]) -> Result<()> {
        if self.state.medic(id).is_none() {
            return Err(Error::RowNotFound {
                kind: "medic",
                id: id.0,
            });
        }
        let photo = self.normalizer.normalize(raw)?;
        self.update_medic_record(id, |record| record.photo = Some(photo))
    }

    /// Export the report into `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn export(&self, renderer: &dyn DocumentRenderer, dir: &Path) -> Result<PathBuf> {
        export_report(&self.state, renderer, dir, Local::now().naive_local())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::analysis::testing::ScriptedProvider;
    use crate::export::PrintableHtml;
    use crate::form::{Choice, CommTarget};
    use crate::prompt::Segment;
    use image::{ImageFormat, Rgb, RgbImage};
    use tempfile::TempDir;

    fn controller() -> Controller {
        crate::logging::init_test_logging();
        Controller::new(
            FormStore::open_in_memory().unwrap(),
            ImageNormalizer::default(),
            RetryPolicy::none(),
        )
        .unwrap()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_select_tab_leaves_state_alone() {
        let mut c = controller();
        c.set_field("incident_name", "Dock fire").unwrap();
        let before = c.state().clone();

        for tab in Tab::ALL {
            c.select_tab(tab);
            assert_eq!(c.tab(), tab);
        }
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_edits_are_persisted() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("form.db");
        {
            let store = FormStore::open(&db).unwrap();
            let mut c = Controller::new(store, ImageNormalizer::default(), RetryPolicy::none())
                .unwrap();
            c.set_field("iso_name", "Capt. Lin").unwrap();
            c.edit(|s| s.trapped = true).unwrap();
        }

        let store = FormStore::open(&db).unwrap();
        let c = Controller::new(store, ImageNormalizer::default(), RetryPolicy::none()).unwrap();
        assert_eq!(c.state().iso_name, "Capt. Lin");
        assert!(c.state().trapped);
    }

    #[test]
    fn test_rejected_field_changes_nothing() {
        let mut c = controller();
        let before = c.state().clone();
        assert!(c.set_field("recon.5.fire", "2").is_err());
        assert!(c.set_field("recon.1.fire", "9").is_err());
        assert!(c.set_field("no_such_field", "x").is_err());
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_rows_insert_at_head_with_increasing_ids() {
        let mut c = controller();
        let a = c.add_medic_record().unwrap();
        let b = c.add_medic_record().unwrap();
        assert!(b > a);

        let ids: Vec<RowId> = c.state().medic_records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b, a]);

        c.update_medic_record(a, |r| r.communicate = Choice::Listed(CommTarget::Commander))
            .unwrap();
        assert_eq!(
            c.state().medic(a).unwrap().communicate,
            Choice::Listed(CommTarget::Commander)
        );
    }

    #[test]
    fn test_add_row_fails_cleanly_when_ids_run_out() {
        let mut c = controller();
        c.edit(|s| s.last_row_id = u64::MAX).unwrap();

        let err = c.add_medic_record().unwrap_err();
        assert!(matches!(err, Error::RowIdsExhausted));
        assert!(c.add_mayday_log().is_err());
        assert!(c.state().medic_records.is_empty());
        assert!(c.state().mayday.event_log.is_empty());
    }

    #[test]
    fn test_update_missing_row() {
        let mut c = controller();
        let err = c.update_mayday_log(RowId(42), |_| {}).unwrap_err();
        assert!(matches!(err, Error::RowNotFound { kind: "mayday", id: 42 }));
    }

    #[test]
    fn test_delete_requires_confirmation_and_keeps_order() {
        let mut c = controller();
        let a = c.add_mayday_log().unwrap();
        let b = c.add_mayday_log().unwrap();
        let d = c.add_mayday_log().unwrap();

        let pending = c.request(Intent::DeleteMaydayLog(b)).unwrap();
        assert_eq!(c.state().mayday.event_log.len(), 3);

        assert_eq!(c.confirm(pending.token).unwrap(), Intent::DeleteMaydayLog(b));
        let ids: Vec<RowId> = c.state().mayday.event_log.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![d, a]);
    }

    #[test]
    fn test_wrong_token_is_rejected() {
        let mut c = controller();
        let id = c.add_medic_record().unwrap();
        let pending = c.request(Intent::DeleteMedicRecord(id)).unwrap();

        let err = c.confirm(pending.token + 1).unwrap_err();
        assert!(err.is_confirmation_error());
        assert!(c.state().medic(id).is_some());
        assert_eq!(c.pending(), Some(pending));
    }

    #[test]
    fn test_cancel_and_stale_token() {
        let mut c = controller();
        let id = c.add_medic_record().unwrap();
        let first = c.request(Intent::DeleteMedicRecord(id)).unwrap();
        let second = c.request(Intent::Reset).unwrap();
        assert_ne!(first.token, second.token);

        assert!(matches!(
            c.confirm(first.token),
            Err(Error::ConfirmationMismatch { .. })
        ));
        assert_eq!(c.cancel(), Some(second));
        assert!(matches!(
            c.confirm(second.token),
            Err(Error::NoPendingConfirmation)
        ));
        assert!(c.state().medic(id).is_some());
    }

    #[test]
    fn test_request_for_missing_row() {
        let mut c = controller();
        assert!(matches!(
            c.request(Intent::DeleteMedicRecord(RowId(7))),
            Err(Error::RowNotFound { kind: "medic", id: 7 })
        ));
        assert_eq!(c.pending(), None);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut c = controller();
        c.set_field("incident_name", "Dock fire").unwrap();
        c.add_medic_record().unwrap();

        let pending = c.request(Intent::Reset).unwrap();
        c.confirm(pending.token).unwrap();

        assert_eq!(c.state(), &FormState::default());
        assert!(!c.store_stats().unwrap().has_snapshot);
    }

    #[tokio::test]
    async fn test_incident_analysis_writes_narrative() {
        let mut c = controller();
        let provider = ScriptedProvider::replying("### Overall\n1. defensive");

        assert!(c.run_analysis(AnalysisTarget::Incident, &provider).await.unwrap());
        assert_eq!(c.state().analysis, "### Overall\n1. defensive");
        assert!(!c.is_busy(AnalysisTarget::Incident));

        let sent = provider.requests();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0].segments[0], Segment::Text(t) if t.starts_with("[Basic info]")));
    }

    #[tokio::test]
    async fn test_failed_analysis_keeps_narrative() {
        let mut c = controller();
        c.edit(|s| s.analysis = "earlier assessment".to_string()).unwrap();
        let provider = ScriptedProvider::failing();

        let err = c
            .run_analysis(AnalysisTarget::Incident, &provider)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("provider unavailable"));
        assert_eq!(c.state().analysis, "earlier assessment");
        assert!(!c.is_busy(AnalysisTarget::Incident));
    }

    #[tokio::test]
    async fn test_medic_analysis_writes_record() {
        let mut c = controller();
        let id = c.add_medic_record().unwrap();
        c.set_field(&format!("medic.{id}.monitor"), "crew 2 heat stress").unwrap();
        let provider = ScriptedProvider::replying("");

        assert!(c
            .run_analysis(AnalysisTarget::Medic(id), &provider)
            .await
            .unwrap());
        assert_eq!(
            c.state().medic(id).unwrap().analysis_action,
            crate::prompt::EMPTY_RESPONSE_FALLBACK
        );
        assert_eq!(
            provider.requests()[0].segments,
            vec![Segment::Text("Current monitoring: crew 2 heat stress".to_string())]
        );
    }

    #[test]
    fn test_begin_analysis_is_exclusive_per_target() {
        let mut c = controller();
        let id = c.add_medic_record().unwrap();

        assert!(c.begin_analysis(AnalysisTarget::Incident).is_some());
        assert!(c.begin_analysis(AnalysisTarget::Incident).is_none());
        assert!(c.begin_analysis(AnalysisTarget::Medic(id)).is_some());
        assert!(c.begin_analysis(AnalysisTarget::Medic(RowId(999))).is_none());

        c.finish_analysis(AnalysisTarget::Incident, Ok("done".to_string()))
            .unwrap();
        assert!(!c.is_busy(AnalysisTarget::Incident));
        assert!(c.is_busy(AnalysisTarget::Medic(id)));
    }

    #[test]
    fn test_result_after_reset_is_dropped() {
        let mut c = controller();
        assert!(c.begin_analysis(AnalysisTarget::Incident).is_some());

        let pending = c.request(Intent::Reset).unwrap();
        c.confirm(pending.token).unwrap();
        c.finish_analysis(AnalysisTarget::Incident, Ok("late".to_string()))
            .unwrap();

        assert_eq!(c.state().analysis, "");
    }

    #[test]
    fn test_result_for_deleted_row_is_dropped() {
        let mut c = controller();
        let id = c.add_medic_record().unwrap();
        assert!(c.begin_analysis(AnalysisTarget::Medic(id)).is_some());

        let pending = c.request(Intent::DeleteMedicRecord(id)).unwrap();
        c.confirm(pending.token).unwrap();
        c.finish_analysis(AnalysisTarget::Medic(id), Ok("late".to_string()))
            .unwrap();
        assert!(c.state().medic_records.is_empty());
    }

    #[test]
    fn test_attach_recon_photo() {
        let mut c = controller();
        c.attach_recon_photo(SideKey::Three, &png(2000, 1000)).unwrap();

        let photo = c.state().recon.side(SideKey::Three).photo.clone().unwrap();
        assert!(photo.as_str().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_bad_photo_keeps_existing() {
        let mut c = controller();
        c.attach_recon_photo(SideKey::One, &png(20, 20)).unwrap();
        let before = c.state().recon.side(SideKey::One).photo.clone();

        assert!(c.attach_recon_photo(SideKey::One, b"not an image").is_err());
        assert_eq!(c.state().recon.side(SideKey::One).photo, before);
    }

    #[test]
    fn test_attach_medic_photo_missing_row() {
        let mut c = controller();
        let err = c.attach_medic_photo(RowId(3), &png(10, 10)).unwrap_err();
        assert!(matches!(err, Error::RowNotFound { kind: "medic", .. }));

        let id = c.add_medic_record().unwrap();
        c.attach_medic_photo(id, &png(10, 10)).unwrap();
        assert!(c.state().medic(id).unwrap().photo.is_some());
    }

    #[test]
    fn test_export() {
        let dir = TempDir::new().unwrap();
        let c = controller();
        let path = c.export(&PrintableHtml, dir.path()).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));
    }
}
