use iam_model::AccessLevel;
use iam_search::{FilterSpec, Selector, TagPredicate, TriState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Edits the filter on behalf of the user.
///
/// Search text is debounced: every edit aborts the armed timer and arms a new
/// one, and only the timer that survives the quiet period commits. Selector
/// edits commit at once. Each commit publishes a complete [`FilterSpec`] on a
/// watch channel, so readers never observe a half-applied edit.
///
/// Must be used from within a tokio runtime.
pub struct FilterControl {
    debounce: Duration,
    echo: FilterSpec,
    tx: Arc<watch::Sender<FilterSpec>>,
    pending: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
    commits: Arc<AtomicU64>,
}

impl FilterControl {
    #[must_use]
    pub fn new(debounce: Duration) -> (Self, watch::Receiver<FilterSpec>) {
        let (tx, rx) = watch::channel(FilterSpec::default());
        let control = Self {
            debounce,
            echo: FilterSpec::default(),
            tx: Arc::new(tx),
            pending: None,
            generation: Arc::new(AtomicU64::new(0)),
            commits: Arc::new(AtomicU64::new(0)),
        };
        (control, rx)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FilterSpec> {
        self.tx.subscribe()
    }

    /// What the user has entered so far, committed or not
    #[must_use]
    pub const fn echo(&self) -> &FilterSpec {
        &self.echo
    }

    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.echo.search.clone_from(&text);
        let generation = self.cancel_pending();

        let tx = Arc::clone(&self.tx);
        let current = Arc::clone(&self.generation);
        let commits = Arc::clone(&self.commits);
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            // Checked under the channel lock so a superseded timer cannot
            // overwrite a newer flush.
            commit(&tx, &commits, |spec| {
                if current.load(Ordering::SeqCst) != generation || spec.search == text {
                    return false;
                }
                spec.search = text;
                true
            });
        }));
    }

    /// Commit any armed search edit now instead of waiting out the timer
    pub fn flush(&mut self) {
        if self.pending.is_none() {
            return;
        }
        self.cancel_pending();
        let text = self.echo.search.clone();
        commit(&self.tx, &self.commits, |spec| {
            if spec.search == text {
                return false;
            }
            spec.search = text;
            true
        });
    }

    pub fn set_service(&mut self, service: Selector<String>) {
        self.echo.service = service.clone();
        commit(&self.tx, &self.commits, |spec| {
            if spec.service == service {
                return false;
            }
            spec.service = service;
            true
        });
    }

    pub fn set_access_level(&mut self, level: Selector<AccessLevel>) {
        self.echo.access_level = level.clone();
        commit(&self.tx, &self.commits, |spec| {
            if spec.access_level == level {
                return false;
            }
            spec.access_level = level;
            true
        });
    }

    pub fn set_tri(&mut self, predicate: TagPredicate, state: TriState) {
        self.echo.set_tri(predicate, state);
        commit(&self.tx, &self.commits, |spec| {
            if spec.tri(predicate) == state {
                return false;
            }
            spec.set_tri(predicate, state);
            true
        });
    }

    /// Reset every field in a single commit, dropping any armed search edit
    pub fn clear_all(&mut self) {
        self.cancel_pending();
        self.echo = FilterSpec::default();
        self.tx.send_replace(FilterSpec::default());
        self.commits.fetch_add(1, Ordering::SeqCst);
        log::debug!("Filter cleared");
    }

    /// Abort the armed timer and invalidate its generation
    fn cancel_pending(&mut self) -> u64 {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Drop for FilterControl {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

fn commit(
    tx: &watch::Sender<FilterSpec>,
    commits: &AtomicU64,
    modify: impl FnOnce(&mut FilterSpec) -> bool,
) {
    if tx.send_if_modified(modify) {
        let total = commits.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("Filter commit #{total}");
    }
}
