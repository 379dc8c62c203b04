mod debounce;

use crate::api::{ApiError, NoteData, NoteStore};
use crate::model::{Breadcrumb, ContentModel, Slot};
use crate::path::{self, ResourceKind};
use debounce::Debouncer;
use leptos::task::spawn_local;
use std::cell::Cell;
use std::rc::Rc;

pub(crate) const SEARCH_MIN_CHARS: usize = 3;
pub(crate) const SEARCH_DEBOUNCE_MS: i32 = 1200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EngineState {
    Idle,
    ResolvingNote,
    ResolvingNotebook,
    /// A note landed first and its parent notebook is being pulled in (with
    /// first-note loading suppressed, so the two never trigger each other
    /// forever).
    ResolvingCrossReference,
    SearchPending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ViewMode {
    Reading,
    /// The resolved notebook has no notes; show the placeholder and do not
    /// auto-load anything.
    EmptyNotebook,
}

/// The navigation engine: resolves a path to a resource kind, fetches it,
/// reconciles it into the content model and derives breadcrumbs, view mode
/// and search results. The single writer of Note/Notebook state.
///
/// Re-entrancy: every resolution is tagged with the epoch current when it
/// was issued. A later `navigate`/search bumps the epoch, so completions of
/// superseded requests are discarded without touching the model — last
/// response for the current target wins, rapid sequential clicks included.
/// Nothing is cancelled on the wire; only the search debounce timer is
/// actively cleared.
pub(crate) struct NavigationEngine<S: NoteStore + Clone + 'static> {
    store: S,
    pub model: ContentModel,
    pub breadcrumbs: Slot<Vec<Breadcrumb>>,
    pub mode: Slot<ViewMode>,
    pub last_error: Slot<Option<ApiError>>,
    state: Rc<Cell<EngineState>>,
    epoch: Rc<Cell<u64>>,
    search_timer: Debouncer,
}

impl<S: NoteStore + Clone + 'static> Clone for NavigationEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            model: self.model.clone(),
            breadcrumbs: self.breadcrumbs.clone(),
            mode: self.mode.clone(),
            last_error: self.last_error.clone(),
            state: Rc::clone(&self.state),
            epoch: Rc::clone(&self.epoch),
            search_timer: self.search_timer.clone(),
        }
    }
}

impl<S: NoteStore + Clone + 'static> NavigationEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            model: ContentModel::new(),
            breadcrumbs: Slot::new(Vec::new()),
            mode: Slot::new(ViewMode::Reading),
            last_error: Slot::new(None),
            state: Rc::new(Cell::new(EngineState::Idle)),
            epoch: Rc::new(Cell::new(0)),
            search_timer: Debouncer::new(SEARCH_DEBOUNCE_MS),
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> EngineState {
        self.state.get()
    }

    #[allow(dead_code)]
    pub fn search_pending(&self) -> bool {
        self.search_timer.is_armed()
    }

    /// Resolve `raw` and display it. Safe to call while another navigation
    /// is in flight; the newer call supersedes the older one.
    pub fn navigate(&self, raw: &str) {
        let (path, epoch) = self.begin(raw);
        let engine = self.clone();
        spawn_local(async move {
            engine.resolve(path, epoch).await;
        });
    }

    /// Live search entry point, one call per keystroke. Below the minimum
    /// query length nothing is scheduled and any pending timer is dropped;
    /// otherwise the debounce window restarts.
    pub fn queue_search(&self, query: &str) {
        let q = query.trim().to_string();
        if q.chars().count() < SEARCH_MIN_CHARS {
            self.search_timer.cancel();
            return;
        }

        let engine = self.clone();
        self.search_timer.schedule(move || {
            let e = engine.clone();
            spawn_local(async move {
                e.run_search(q).await;
            });
        });
    }

    /// Entry point for the editor's save round trip: the server's updated
    /// record replaces the current note. Model writes stay behind the
    /// engine.
    pub fn commit_saved_note(&self, data: NoteData) {
        self.model.set_note(data.into());
    }

    /// Classify the path, publish breadcrumbs (synchronously — they never
    /// wait on the network) and supersede any in-flight resolution.
    pub(crate) fn begin(&self, raw: &str) -> (String, u64) {
        let path = path::normalize(raw);
        let epoch = self.bump_epoch();

        self.breadcrumbs.set(path::breadcrumbs(&path));
        self.state.set(match path::classify(&path) {
            ResourceKind::Notebook => EngineState::ResolvingNotebook,
            ResourceKind::Note => EngineState::ResolvingNote,
        });

        (path, epoch)
    }

    pub(crate) async fn resolve(&self, path: String, epoch: u64) {
        match path::classify(&path) {
            ResourceKind::Notebook => self.resolve_notebook(path, epoch, true).await,
            ResourceKind::Note => self.resolve_note(path, epoch).await,
        }

        if self.is_current(epoch) {
            self.state.set(EngineState::Idle);
        }
    }

    pub(crate) async fn run_search(&self, query: String) {
        let epoch = self.bump_epoch();
        self.state.set(EngineState::SearchPending);

        match self.store.search(&query).await {
            Ok(data) => {
                if self.is_current(epoch) {
                    // Search results are pathless; the trail would lie. Only
                    // a successful search may clear it, so a failure keeps
                    // the trail of whatever is still on screen.
                    self.breadcrumbs.set(Vec::new());
                    self.commit_notebook(data, epoch, true, false).await;
                }
            }
            Err(err) => self.fail(epoch, err),
        }

        if self.is_current(epoch) {
            self.state.set(EngineState::Idle);
        }
    }

    async fn resolve_note(&self, path: String, epoch: u64) {
        match self.store.fetch_note(&path).await {
            Ok(data) => {
                if !self.is_current(epoch) {
                    return;
                }

                let nburl = data.nburl.clone();
                self.model.set_note(data.into());
                self.mode.set(ViewMode::Reading);

                // Note-first load: pull the parent notebook so the listing
                // pane is consistent. First-note loading is suppressed — the
                // note on screen already is the content.
                if !self.model.is_notebook_resolved() {
                    self.state.set(EngineState::ResolvingCrossReference);
                    match self.store.fetch_notebook(&path::normalize(&nburl)).await {
                        Ok(nb) => {
                            if self.is_current(epoch) {
                                self.model.set_notebook(nb.into());
                            }
                        }
                        Err(err) => self.fail(epoch, err),
                    }
                }
            }
            Err(err) => self.fail(epoch, err),
        }
    }

    async fn resolve_notebook(&self, path: String, epoch: u64, load_first_note: bool) {
        match self.store.fetch_notebook(&path).await {
            Ok(data) => {
                if self.is_current(epoch) {
                    self.commit_notebook(data, epoch, load_first_note, true).await;
                }
            }
            Err(err) => self.fail(epoch, err),
        }
    }

    async fn commit_notebook(
        &self,
        data: crate::api::NotebookData,
        epoch: u64,
        load_first_note: bool,
        publish_trail: bool,
    ) {
        let first = data.notes.first().map(|n| n.url.clone());
        self.model.set_notebook(data.into());

        match first {
            None => self.mode.set(ViewMode::EmptyNotebook),
            Some(url) if load_first_note => {
                self.state.set(EngineState::ResolvingNote);
                let p = path::normalize(&url);
                // A search commit keeps the trail it was given (empty); only
                // navigation republishes the auto-loaded note's trail.
                if publish_trail {
                    self.breadcrumbs.set(path::breadcrumbs(&p));
                }
                self.resolve_note(p, epoch).await;
            }
            Some(_) => {}
        }
    }

    fn bump_epoch(&self) -> u64 {
        let epoch = self.epoch.get() + 1;
        self.epoch.set(epoch);
        epoch
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.get() == epoch
    }

    fn fail(&self, epoch: u64, err: ApiError) {
        // Stale failures are as silent as stale successes; current failures
        // surface without touching Note/Notebook.
        if self.is_current(epoch) {
            self.last_error.set(Some(err));
        }
    }
}
