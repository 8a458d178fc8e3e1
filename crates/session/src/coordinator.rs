use crate::config::BrowserConfig;
use crate::control::FilterControl;
use crate::error::Result;
use crate::loader::{DataSource, Loader};
use crate::scroll::{ScrollSubscription, ViewportSignal};
use iam_model::AccessLevel;
use iam_search::{Catalog, FilterSpec, RecordView, Selector, TagPredicate, TriState, Window};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Discrete input from a front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Search(String),
    Service(Selector<String>),
    AccessLevel(Selector<AccessLevel>),
    Tri(TagPredicate, TriState),
    ClearAll,
    /// Commit a pending search edit immediately
    Flush,
    NearEnd,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The materialized slice handed to a view
#[derive(Debug)]
pub struct Page<'a> {
    pub records: Vec<RecordView<'a>>,
    pub matched: usize,
    pub total: usize,
    pub has_more: bool,
}

impl Page<'_> {
    #[must_use]
    pub fn shown(&self) -> usize {
        self.records.len()
    }
}

/// Read-only consumer of coordinator state
pub trait View {
    /// Input echo; called synchronously for every edit, before any recompute
    fn echo(&mut self, input: &FilterSpec);

    fn render(&mut self, page: &Page<'_>, spec: &FilterSpec);

    /// Terminal state; nothing else is rendered afterwards
    fn render_error(&mut self, message: &str);
}

/// Filter results for one loaded catalog
#[derive(Debug)]
pub struct Browser {
    catalog: Arc<Catalog>,
    spec_rx: watch::Receiver<FilterSpec>,
    spec: FilterSpec,
    matches: Vec<usize>,
    window: Window,
    evaluations: u64,
}

impl Browser {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        mut spec_rx: watch::Receiver<FilterSpec>,
        page_size: usize,
    ) -> Self {
        let spec = spec_rx.borrow_and_update().clone();
        let matches = catalog.filter_indices(&spec);
        let mut window = Window::new(page_size);
        window.reset(matches.len());
        Self {
            catalog,
            spec_rx,
            spec,
            matches,
            window,
            evaluations: 1,
        }
    }

    /// Re-evaluate against the newest committed spec, if any arrived.
    ///
    /// Specs committed in between are never evaluated.
    pub fn refresh(&mut self) -> bool {
        if !self.spec_rx.has_changed().unwrap_or(false) {
            return false;
        }
        let spec = self.spec_rx.borrow_and_update().clone();
        self.matches = self.catalog.filter_indices(&spec);
        self.window.reset(self.matches.len());
        self.spec = spec;
        self.evaluations += 1;
        log::debug!(
            "Filter pass #{}: {} of {} records ({} active predicates)",
            self.evaluations,
            self.matches.len(),
            self.catalog.len(),
            self.spec.active_count()
        );
        true
    }

    pub fn grow(&mut self) -> bool {
        self.window.grow(self.matches.len())
    }

    #[must_use]
    pub fn page(&self) -> Page<'_> {
        let records = self
            .window
            .visible(&self.matches)
            .iter()
            .filter_map(|&idx| self.catalog.view_at(idx))
            .collect();
        Page {
            records,
            matched: self.matches.len(),
            total: self.catalog.len(),
            has_more: self.window.has_more(self.matches.len()),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The spec the current results were computed from
    #[must_use]
    pub const fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    #[must_use]
    pub const fn evaluations(&self) -> u64 {
        self.evaluations
    }
}

#[derive(Debug)]
pub enum LoadState {
    Loading,
    Failed(String),
    Ready(Browser),
}

/// Owns the session: load state, filter control, window, scroll listener
pub struct Coordinator {
    config: BrowserConfig,
    control: FilterControl,
    state: LoadState,
    scroll: Option<ScrollSubscription>,
}

impl Coordinator {
    #[must_use]
    pub fn new(config: BrowserConfig) -> Self {
        let (control, _rx) = FilterControl::new(config.debounce());
        Self {
            config,
            control,
            state: LoadState::Loading,
            scroll: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &LoadState {
        &self.state
    }

    #[must_use]
    pub const fn browser(&self) -> Option<&Browser> {
        match &self.state {
            LoadState::Ready(browser) => Some(browser),
            _ => None,
        }
    }

    #[must_use]
    pub const fn control(&self) -> &FilterControl {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut FilterControl {
        &mut self.control
    }

    /// Load once; a failure leaves no partial state behind
    pub async fn load(&mut self, loader: &Loader, source: &DataSource) -> &LoadState {
        self.state = LoadState::Loading;
        match loader.load(source).await {
            Ok(catalog) => self.install(catalog),
            Err(err) => {
                log::error!("{err}");
                self.scroll = None;
                self.state = LoadState::Failed(err.to_string());
            }
        }
        &self.state
    }

    /// Replace the core state with a freshly built catalog
    pub fn install(&mut self, catalog: Arc<Catalog>) {
        self.scroll = None;
        let browser = Browser::new(catalog, self.control.subscribe(), self.config.page_size);
        self.state = LoadState::Ready(browser);
    }

    /// Listen for viewport signals; replaces (and unsubscribes) any previous
    /// listener. Reloading drops the listener as well.
    pub fn subscribe_scroll(
        &mut self,
        signals: mpsc::Receiver<ViewportSignal>,
        events: mpsc::Sender<UiEvent>,
    ) {
        self.scroll = Some(ScrollSubscription::spawn(
            signals,
            events,
            self.config.near_end_threshold,
        ));
    }

    #[must_use]
    pub fn scroll_active(&self) -> bool {
        self.scroll.as_ref().is_some_and(ScrollSubscription::is_active)
    }

    /// Apply one input event. Filter edits only echo here; the recompute
    /// happens when the commit is observed.
    pub fn handle(&mut self, event: UiEvent, view: &mut impl View) -> Flow {
        match event {
            UiEvent::Search(text) => self.control.set_search(text),
            UiEvent::Service(service) => self.control.set_service(service),
            UiEvent::AccessLevel(level) => self.control.set_access_level(level),
            UiEvent::Tri(predicate, state) => self.control.set_tri(predicate, state),
            UiEvent::ClearAll => self.control.clear_all(),
            UiEvent::Flush => self.control.flush(),
            UiEvent::NearEnd => {
                if let LoadState::Ready(browser) = &mut self.state {
                    if browser.grow() {
                        view.render(&browser.page(), browser.spec());
                    }
                }
                return Flow::Continue;
            }
            UiEvent::Quit => return Flow::Quit,
        }
        view.echo(self.control.echo());
        Flow::Continue
    }

    /// Pick up a committed spec, if one arrived, and render the new results
    pub fn refresh(&mut self, view: &mut impl View) -> bool {
        let LoadState::Ready(browser) = &mut self.state else {
            return false;
        };
        if !browser.refresh() {
            return false;
        }
        view.render(&browser.page(), browser.spec());
        true
    }

    /// Event loop: input first, recompute only when no input is waiting.
    pub async fn run<V: View>(
        &mut self,
        mut events: mpsc::Receiver<UiEvent>,
        view: &mut V,
    ) -> Result<()> {
        match &self.state {
            LoadState::Failed(message) => {
                view.render_error(message);
                return Ok(());
            }
            LoadState::Loading => {
                view.render_error("dataset not loaded");
                return Ok(());
            }
            LoadState::Ready(browser) => view.render(&browser.page(), browser.spec()),
        }

        let mut commits = self.control.subscribe();
        loop {
            tokio::select! {
                biased;
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if self.handle(event, view) == Flow::Quit {
                        break;
                    }
                }
                changed = commits.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    tokio::task::yield_now().await;
                    self.refresh(view);
                }
            }
        }

        self.scroll = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_model::{Action, Dataset, Service};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::time::sleep;

    #[derive(Default)]
    struct RecordingView {
        echoes: Vec<String>,
        renders: Vec<Vec<String>>,
        errors: Vec<String>,
    }

    impl View for RecordingView {
        fn echo(&mut self, input: &FilterSpec) {
            self.echoes.push(input.search.clone());
        }

        fn render(&mut self, page: &Page<'_>, _spec: &FilterSpec) {
            self.renders.push(page.records.iter().map(RecordView::id).collect());
        }

        fn render_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    fn catalog(actions_per_service: usize) -> Arc<Catalog> {
        let mut s3 = Service::new("s3", "Amazon S3");
        for i in 0..actions_per_service {
            s3 = s3.action(Action::new(format!("Get{i}"), AccessLevel::Read));
        }
        let ec2 = Service::new("ec2", "Amazon EC2")
            .action(Action::new("RunInstances", AccessLevel::Write));
        Arc::new(Catalog::build(Arc::new(Dataset::from_services(vec![s3, ec2]))))
    }

    fn config(page_size: usize) -> BrowserConfig {
        BrowserConfig {
            page_size,
            ..BrowserConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_search_drives_one_recompute() {
        let mut coordinator = Coordinator::new(config(50));
        coordinator.install(catalog(2));
        let (tx, rx) = mpsc::channel(16);
        let mut view = RecordingView::default();

        let input = async {
            for text in ["i", "in", "inst"] {
                tx.send(UiEvent::Search(text.to_string())).await.unwrap();
            }
            sleep(Duration::from_millis(400)).await;
            tx.send(UiEvent::Quit).await.unwrap();
        };
        let (result, ()) = tokio::join!(coordinator.run(rx, &mut view), input);
        result.unwrap();

        assert_eq!(view.echoes, vec!["i", "in", "inst"]);
        assert_eq!(view.renders.len(), 2);
        assert_eq!(view.renders[1], vec!["ec2:RunInstances".to_string()]);
        let browser = coordinator.browser().expect("ready");
        assert_eq!(browser.evaluations(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_specs_are_never_evaluated() {
        let mut coordinator = Coordinator::new(config(50));
        coordinator.install(catalog(2));
        let (tx, rx) = mpsc::channel(16);
        tx.send(UiEvent::Service(Selector::Only("s3".into())))
            .await
            .unwrap();
        tx.send(UiEvent::Service(Selector::Only("ec2".into())))
            .await
            .unwrap();
        tx.send(UiEvent::Quit).await.unwrap();

        let mut view = RecordingView::default();
        coordinator.run(rx, &mut view).await.unwrap();
        // Queued input wins over recompute, so nothing beyond the first page rendered.
        assert_eq!(view.renders.len(), 1);

        let mut view = RecordingView::default();
        assert!(coordinator.refresh(&mut view));
        let browser = coordinator.browser().expect("ready");
        assert_eq!(browser.evaluations(), 2);
        assert_eq!(browser.spec().service, Selector::Only("ec2".to_string()));
        assert_eq!(view.renders, vec![vec!["ec2:RunInstances".to_string()]]);
    }

    #[tokio::test(start_paused = true)]
    async fn near_end_grows_window_and_filter_change_resets_it() {
        let mut coordinator = Coordinator::new(config(3));
        coordinator.install(catalog(7));
        let mut view = RecordingView::default();

        assert_eq!(coordinator.handle(UiEvent::NearEnd, &mut view), Flow::Continue);
        assert_eq!(view.renders.last().map(Vec::len), Some(6));
        coordinator.handle(UiEvent::NearEnd, &mut view);
        coordinator.handle(UiEvent::NearEnd, &mut view);
        assert_eq!(view.renders.last().map(Vec::len), Some(8));
        let renders = view.renders.len();
        coordinator.handle(UiEvent::NearEnd, &mut view);
        assert_eq!(view.renders.len(), renders);

        coordinator.handle(
            UiEvent::AccessLevel(Selector::Only(AccessLevel::Read)),
            &mut view,
        );
        assert!(coordinator.refresh(&mut view));
        assert_eq!(view.renders.last().map(Vec::len), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_all_restores_full_result_in_one_commit() {
        let mut coordinator = Coordinator::new(config(50));
        coordinator.install(catalog(2));
        let mut view = RecordingView::default();
        coordinator.handle(UiEvent::Service(Selector::Only("ec2".into())), &mut view);
        coordinator.handle(
            UiEvent::Tri(TagPredicate::RequestTag, TriState::No),
            &mut view,
        );
        coordinator.refresh(&mut view);
        let commits = coordinator.control().commit_count();

        coordinator.handle(UiEvent::ClearAll, &mut view);
        assert_eq!(coordinator.control().commit_count(), commits + 1);
        assert!(coordinator.refresh(&mut view));
        assert_eq!(
            view.renders.last().cloned().unwrap_or_default(),
            vec!["s3:Get0", "s3:Get1", "ec2:RunInstances"]
        );
    }

    #[tokio::test]
    async fn failed_load_renders_terminal_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DataSource::File(dir.path().join("missing.json"));
        let mut coordinator = Coordinator::new(BrowserConfig::default());
        let loader = Loader::from_config(coordinator.config());

        let state = coordinator.load(&loader, &source).await;
        assert!(matches!(state, LoadState::Failed(message) if message.contains("missing.json")));

        let (_tx, rx) = mpsc::channel(1);
        let mut view = RecordingView::default();
        coordinator.run(rx, &mut view).await.unwrap();
        assert_eq!(view.errors.len(), 1);
        assert!(view.renders.is_empty());
    }

    #[tokio::test]
    async fn reinstall_drops_scroll_subscription() {
        let mut coordinator = Coordinator::new(config(50));
        coordinator.install(catalog(1));
        let (_signal_tx, signal_rx) = mpsc::channel(4);
        let (event_tx, _event_rx) = mpsc::channel(4);
        coordinator.subscribe_scroll(signal_rx, event_tx);
        assert!(coordinator.scroll_active());

        coordinator.install(catalog(1));
        assert!(!coordinator.scroll_active());
    }
}
