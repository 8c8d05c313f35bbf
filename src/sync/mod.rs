//! Inline autosave for generated decks and documents.
//!
//! Each controller owns the live collection, a shadow baseline of the last
//! server-acknowledged values, per-item save statuses, and a per-item
//! debounce timer. The edit path is: diff against the baseline, echo the
//! change into the live collection synchronously, then arm (or re-arm) the
//! item's timer; the network write happens only after the quiet period, with
//! the diff recomputed at fire time. Write failures never roll back the
//! echoed edit, only the status indicator.

mod debounce;

pub(crate) use debounce::{BrowserScheduler, Debouncer, Scheduler};

use crate::api::{ApiError, ApiErrorKind};
use crate::diff::{apply_to_deck, apply_to_sections, diff_section, diff_slide, SectionDiff, SlideDiff};
use crate::models::{Presentation, Section, Slide, WordProject};
use crate::state::AppContext;
use crate::util::ensure_image_fallbacks;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Quiet period between the last keystroke and the autosave write.
pub(crate) const AUTOSAVE_QUIET_MS: i32 = 800;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, strum::Display)]
pub(crate) enum SaveStatus {
    #[default]
    #[strum(serialize = "")]
    Idle,
    #[strum(serialize = "Saving...")]
    Saving,
    #[strum(serialize = "Saved")]
    Saved,
    #[strum(serialize = "Error saving")]
    Error,
    #[strum(serialize = "Edited elsewhere")]
    Conflict,
}

impl SaveStatus {
    fn from_error(e: &ApiError) -> Self {
        if e.kind == ApiErrorKind::Conflict {
            SaveStatus::Conflict
        } else {
            SaveStatus::Error
        }
    }
}

/// Monotonic per-item write counter. A completion only applies if no newer
/// write for the same item has started since; the status always reflects the
/// most recently initiated write, never an earlier one resolving late.
pub(crate) struct RequestSeq<K> {
    next: AtomicU64,
    latest: Mutex<HashMap<K, u64>>,
}

impl<K> Default for RequestSeq<K> {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(0),
            latest: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> RequestSeq<K> {
    pub fn begin(&self, key: K) -> u64 {
        let seq = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut latest) = self.latest.lock() {
            latest.insert(key, seq);
        }
        seq
    }

    pub fn is_current(&self, key: &K, seq: u64) -> bool {
        self.latest
            .lock()
            .map(|latest| latest.get(key) == Some(&seq))
            .unwrap_or(false)
    }
}

/// Autosave controller for one presentation's slide deck.
///
/// Lives for the studio page's lifetime; the page must call `teardown()` in
/// `on_cleanup` so no timer fires against unmounted state.
#[derive(Clone)]
pub(crate) struct SlideSyncController {
    app_state: AppContext,

    presentation_id: RwSignal<Option<String>>,
    topic: RwSignal<String>,
    revision: RwSignal<Option<String>>,

    /// Live deck the editors render from (local echo target).
    slides: RwSignal<Vec<Slide>>,

    /// Last server-acknowledged deck, the diff baseline. Updated only after
    /// a successful write (via read-back) or a full fetch.
    baseline: RwSignal<Vec<Slide>>,

    statuses: RwSignal<HashMap<usize, SaveStatus>>,

    autosave: Debouncer<usize>,
    seq: Arc<RequestSeq<usize>>,
}

impl SlideSyncController {
    pub fn new(app_state: AppContext) -> Self {
        Self::with_scheduler(app_state, Arc::new(BrowserScheduler))
    }

    fn with_scheduler(app_state: AppContext, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            app_state,
            presentation_id: RwSignal::new(None),
            topic: RwSignal::new(String::new()),
            revision: RwSignal::new(None),
            slides: RwSignal::new(vec![]),
            baseline: RwSignal::new(vec![]),
            statuses: RwSignal::new(HashMap::new()),
            autosave: Debouncer::new(scheduler, AUTOSAVE_QUIET_MS),
            seq: Arc::new(RequestSeq::default()),
        }
    }

    pub fn presentation_id(&self) -> Option<String> {
        self.presentation_id.get()
    }

    pub fn topic(&self) -> String {
        self.topic.get()
    }

    pub fn slides(&self) -> RwSignal<Vec<Slide>> {
        self.slides
    }

    /// Tracked read, usable directly in views.
    pub fn status(&self, index: usize) -> SaveStatus {
        self.statuses
            .with(|m| m.get(&index).copied().unwrap_or_default())
    }

    fn set_status(&self, index: usize, status: SaveStatus) {
        self.statuses.update(|m| {
            m.insert(index, status);
        });
    }

    /// Adopt a freshly generated or fetched presentation wholesale.
    pub fn set_presentation(&self, pres: Presentation) {
        self.autosave.cancel_all();

        let mut deck = pres.content;
        ensure_image_fallbacks(&mut deck);

        self.presentation_id.set(Some(pres.presentation_id));
        self.topic.set(pres.topic);
        self.revision.set(pres.revision);
        self.slides.set(deck.clone());
        self.baseline.set(deck);
        self.statuses.set(HashMap::new());
    }

    pub fn reset(&self) {
        self.autosave.cancel_all();
        self.presentation_id.set(None);
        self.topic.set(String::new());
        self.revision.set(None);
        self.slides.set(vec![]);
        self.baseline.set(vec![]);
        self.statuses.set(HashMap::new());
    }

    /// Called by the slide editor on each input event.
    ///
    /// The echo into the live deck is synchronous; only the persistence is
    /// deferred behind the debounce timer.
    pub fn on_slide_edited(&self, index: usize, updated: &Slide) {
        let diff = self
            .baseline
            .with_untracked(|b| b.get(index).map(|base| diff_slide(updated, base)));
        let Some(diff) = diff else {
            return;
        };
        if diff.is_empty() {
            return;
        }

        self.slides.update(|s| {
            apply_to_deck(s, index, &diff);
        });

        let s2 = self.clone();
        self.autosave.arm(index, move || s2.flush(index));
    }

    /// Manual "save now": skip the quiet period and drop any armed timer so
    /// it cannot fire later with stale data.
    pub fn save_now(&self, index: usize) {
        self.autosave.cancel(&index);
        self.flush(index);
    }

    /// Best-effort flush of everything pending (pagehide).
    pub fn flush_all(&self) {
        for index in self.autosave.armed_keys() {
            self.autosave.cancel(&index);
            self.flush(index);
        }
    }

    pub fn teardown(&self) {
        self.autosave.cancel_all();
    }

    fn flush(&self, index: usize) {
        let Some(pid) = self.presentation_id.get_untracked() else {
            return;
        };

        // Recompute against the latest snapshots; the diff captured at arm
        // time may already be superseded.
        let diff = self.slides.with_untracked(|slides| {
            self.baseline.with_untracked(|base| {
                match (slides.get(index), base.get(index)) {
                    (Some(cur), Some(b)) => Some(diff_slide(cur, b)),
                    _ => None,
                }
            })
        });
        let Some(diff) = diff else {
            return;
        };
        if diff.is_empty() {
            return;
        }

        self.set_status(index, SaveStatus::Saving);
        let seq = self.seq.begin(index);

        let api_client = self.app_state.0.api_client.get_untracked();
        let revision = self.revision.get_untracked();
        let s2 = self.clone();
        spawn_local(async move {
            let outcome = match api_client
                .update_slide(&pid, index, &diff, revision.as_deref())
                .await
            {
                // The write landed; the read-back is best-effort.
                Ok(_) => Ok(api_client.get_presentation(&pid).await.ok()),
                Err(e) => Err(e),
            };
            s2.complete_write(index, seq, &diff, outcome);
        });
    }

    /// Apply the outcome of one write. Discarded if a newer write for the
    /// same slide has started since `seq` was taken.
    fn complete_write(
        &self,
        index: usize,
        seq: u64,
        diff: &SlideDiff,
        outcome: Result<Option<Presentation>, ApiError>,
    ) {
        if !self.seq.is_current(&index, seq) {
            return;
        }

        match outcome {
            Ok(Some(pres)) => {
                self.adopt_canonical(pres);
                self.set_status(index, SaveStatus::Saved);
            }
            Ok(None) => {
                // Acknowledged but no read-back; merge the diff into the
                // baseline so it is not re-sent.
                self.baseline.update(|b| {
                    apply_to_deck(b, index, diff);
                });
                self.set_status(index, SaveStatus::Saved);
            }
            Err(e) => {
                // Keep the locally echoed value; only the indicator turns.
                self.set_status(index, SaveStatus::from_error(&e));
            }
        }
    }

    /// Refetch the presentation and fold it back in (used after server-side
    /// operations such as applying a theme, which may bump the revision).
    pub fn refresh(&self) {
        let Some(pid) = self.presentation_id.get_untracked() else {
            return;
        };

        let api_client = self.app_state.0.api_client.get_untracked();
        let s2 = self.clone();
        spawn_local(async move {
            if let Ok(pres) = api_client.get_presentation(&pid).await {
                s2.adopt_canonical(pres);
            }
        });
    }

    /// Fold the server's canonical deck back in. Items whose timer is armed
    /// keep their local value; the flush that follows will persist them.
    fn adopt_canonical(&self, pres: Presentation) {
        let mut canonical = pres.content;
        ensure_image_fallbacks(&mut canonical);

        self.revision.set(pres.revision);
        self.baseline.set(canonical.clone());

        let armed = self.autosave.armed_keys();
        self.slides.update(|local| {
            if local.len() != canonical.len() {
                *local = canonical;
            } else {
                for (i, srv) in canonical.into_iter().enumerate() {
                    if !armed.contains(&i) {
                        local[i] = srv;
                    }
                }
            }
        });
    }
}

/// Autosave controller for one word project's sections, keyed by the
/// server-assigned section id.
#[derive(Clone)]
pub(crate) struct SectionSyncController {
    app_state: AppContext,

    document_id: RwSignal<Option<String>>,
    title: RwSignal<String>,
    num_pages: RwSignal<u32>,
    revision: RwSignal<Option<String>>,

    sections: RwSignal<Vec<Section>>,
    baseline: RwSignal<Vec<Section>>,
    statuses: RwSignal<HashMap<i64, SaveStatus>>,

    autosave: Debouncer<i64>,
    seq: Arc<RequestSeq<i64>>,
}

impl SectionSyncController {
    pub fn new(app_state: AppContext) -> Self {
        Self::with_scheduler(app_state, Arc::new(BrowserScheduler))
    }

    fn with_scheduler(app_state: AppContext, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            app_state,
            document_id: RwSignal::new(None),
            title: RwSignal::new(String::new()),
            num_pages: RwSignal::new(0),
            revision: RwSignal::new(None),
            sections: RwSignal::new(vec![]),
            baseline: RwSignal::new(vec![]),
            statuses: RwSignal::new(HashMap::new()),
            autosave: Debouncer::new(scheduler, AUTOSAVE_QUIET_MS),
            seq: Arc::new(RequestSeq::default()),
        }
    }

    pub fn document_id(&self) -> Option<String> {
        self.document_id.get()
    }

    pub fn title(&self) -> String {
        self.title.get()
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages.get()
    }

    pub fn sections(&self) -> RwSignal<Vec<Section>> {
        self.sections
    }

    pub fn status(&self, section_id: i64) -> SaveStatus {
        self.statuses
            .with(|m| m.get(&section_id).copied().unwrap_or_default())
    }

    fn set_status(&self, section_id: i64, status: SaveStatus) {
        self.statuses.update(|m| {
            m.insert(section_id, status);
        });
    }

    pub fn set_document(&self, doc: WordProject) {
        self.autosave.cancel_all();

        self.document_id.set(Some(doc.id));
        self.title.set(doc.title);
        self.num_pages.set(doc.num_pages);
        self.revision.set(doc.revision);
        self.sections.set(doc.sections.clone());
        self.baseline.set(doc.sections);
        self.statuses.set(HashMap::new());
    }

    pub fn reset(&self) {
        self.autosave.cancel_all();
        self.document_id.set(None);
        self.title.set(String::new());
        self.num_pages.set(0);
        self.revision.set(None);
        self.sections.set(vec![]);
        self.baseline.set(vec![]);
        self.statuses.set(HashMap::new());
    }

    pub fn on_section_edited(&self, updated: &Section) {
        let id = updated.id;
        let diff = self.baseline.with_untracked(|b| {
            b.iter()
                .find(|s| s.id == id)
                .map(|base| diff_section(updated, base))
        });
        let Some(diff) = diff else {
            return;
        };
        if diff.is_empty() {
            return;
        }

        self.sections.update(|s| {
            apply_to_sections(s, id, &diff);
        });

        let s2 = self.clone();
        self.autosave.arm(id, move || s2.flush(id));
    }

    pub fn save_now(&self, section_id: i64) {
        self.autosave.cancel(&section_id);
        self.flush(section_id);
    }

    pub fn flush_all(&self) {
        for id in self.autosave.armed_keys() {
            self.autosave.cancel(&id);
            self.flush(id);
        }
    }

    pub fn teardown(&self) {
        self.autosave.cancel_all();
    }

    /// Refetch the project and fold it back in (used after a refine call,
    /// which rewrites section content server-side).
    pub fn refresh(&self) {
        let Some(doc_id) = self.document_id.get_untracked() else {
            return;
        };

        let api_client = self.app_state.0.api_client.get_untracked();
        let s2 = self.clone();
        spawn_local(async move {
            if let Ok(doc) = api_client.get_document(&doc_id).await {
                s2.adopt_canonical(doc);
            }
        });
    }

    fn flush(&self, section_id: i64) {
        let Some(doc_id) = self.document_id.get_untracked() else {
            return;
        };

        let diff = self.sections.with_untracked(|sections| {
            self.baseline.with_untracked(|base| {
                let cur = sections.iter().find(|s| s.id == section_id)?;
                let b = base.iter().find(|s| s.id == section_id)?;
                Some(diff_section(cur, b))
            })
        });
        let Some(diff) = diff else {
            return;
        };
        if diff.is_empty() {
            return;
        }

        self.set_status(section_id, SaveStatus::Saving);
        let seq = self.seq.begin(section_id);

        let api_client = self.app_state.0.api_client.get_untracked();
        let revision = self.revision.get_untracked();
        let s2 = self.clone();
        spawn_local(async move {
            let outcome = match api_client
                .update_section(&doc_id, section_id, &diff, revision.as_deref())
                .await
            {
                Ok(_) => Ok(api_client.get_document(&doc_id).await.ok()),
                Err(e) => Err(e),
            };
            s2.complete_write(section_id, seq, &diff, outcome);
        });
    }

    fn complete_write(
        &self,
        section_id: i64,
        seq: u64,
        diff: &SectionDiff,
        outcome: Result<Option<WordProject>, ApiError>,
    ) {
        if !self.seq.is_current(&section_id, seq) {
            return;
        }

        match outcome {
            Ok(Some(doc)) => {
                self.adopt_canonical(doc);
                self.set_status(section_id, SaveStatus::Saved);
            }
            Ok(None) => {
                self.baseline.update(|b| {
                    apply_to_sections(b, section_id, diff);
                });
                self.set_status(section_id, SaveStatus::Saved);
            }
            Err(e) => {
                self.set_status(section_id, SaveStatus::from_error(&e));
            }
        }
    }

    fn adopt_canonical(&self, doc: WordProject) {
        self.title.set(doc.title);
        self.num_pages.set(doc.num_pages);
        self.revision.set(doc.revision);
        self.baseline.set(doc.sections.clone());

        let armed = self.autosave.armed_keys();
        self.sections.update(|local| {
            let mut next = doc.sections;
            for srv in next.iter_mut() {
                if armed.contains(&srv.id) {
                    if let Some(pending) = local.iter().find(|s| s.id == srv.id) {
                        *srv = pending.clone();
                    }
                }
            }
            *local = next;
        });
    }
}
