use crate::{print_stdout, report};
use anyhow::Result;
use iam_model::AccessLevel;
use iam_search::{FilterSpec, Selector, TagPredicate, TriState};
use iam_session::{
    BrowserConfig, Coordinator, LoadState, Loader, Page, UiEvent, View, ViewportSignal,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const HELP: &str = "\
Commands:
  search <text>             filter by service:action substring (debounced)
  / <text>                  same as search
  service <id|All>          restrict to one service
  level <access level|All>  restrict to one access level
  tag <predicate> <any|yes|no>
                            request-tag, resource-tag, tag-keys,
                            resource-level, dependent-actions
  more                      show the next page
  flush                     apply a pending search now
  clear                     reset every filter
  quit                      leave";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Event(UiEvent),
    More,
    Help,
    Empty,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim_start();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest),
        None => (line.trim_end(), ""),
    };

    let input = match command.to_ascii_lowercase().as_str() {
        "" => Input::Empty,
        "help" | "?" => Input::Help,
        "more" => Input::More,
        "flush" => Input::Event(UiEvent::Flush),
        "clear" => Input::Event(UiEvent::ClearAll),
        "quit" | "exit" | "q" => Input::Event(UiEvent::Quit),
        "search" | "/" => Input::Event(UiEvent::Search(rest.to_string())),
        "service" => Input::Event(UiEvent::Service(crate::flags::parse_service(rest)?)),
        "level" => {
            let level = Selector::<AccessLevel>::parse(rest)?;
            Input::Event(UiEvent::AccessLevel(level))
        }
        "tag" => {
            let mut args = rest.split_whitespace();
            let predicate: TagPredicate = args
                .next()
                .ok_or("usage: tag <predicate> <any|yes|no>")?
                .parse()?;
            let state: TriState = args.next().unwrap_or("yes").parse()?;
            Input::Event(UiEvent::Tri(predicate, state))
        }
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(input)
}

fn emit(text: &str) {
    if let Err(err) = print_stdout(text) {
        log::warn!("Cannot write to stdout: {err}");
    }
}

/// Plain-text view; remembers how many rows the last page showed
struct TextView {
    shown: Arc<AtomicUsize>,
}

impl View for TextView {
    fn echo(&mut self, input: &FilterSpec) {
        emit(&format!("> {}", report::summarize_filter(input)));
    }

    fn render(&mut self, page: &Page<'_>, spec: &FilterSpec) {
        self.shown.store(page.shown(), Ordering::SeqCst);
        emit(&format!(
            "[{}]\n{}",
            report::summarize_filter(spec),
            report::render_page(page)
        ));
    }

    fn render_error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }
}

pub(crate) async fn run(config: BrowserConfig) -> Result<()> {
    let source = config.data_source();
    let loader = Loader::from_config(&config);
    let shown = Arc::new(AtomicUsize::new(0));
    let mut view = TextView {
        shown: Arc::clone(&shown),
    };

    let mut coordinator = Coordinator::new(config);
    if let LoadState::Failed(message) = coordinator.load(&loader, &source).await {
        view.render_error(message);
        anyhow::bail!("Browse session aborted: {source} could not be loaded");
    }
    if let Some(browser) = coordinator.browser() {
        emit(&report::render_header(browser.catalog().dataset()));
    }

    let (events_tx, events_rx) = mpsc::channel(64);
    let (signals_tx, signals_rx) = mpsc::channel(8);
    coordinator.subscribe_scroll(signals_rx, events_tx.clone());
    let reader = tokio::spawn(read_input(events_tx, signals_tx, shown));

    coordinator.run(events_rx, &mut view).await?;
    // Input may end before a commit it produced was rendered.
    coordinator.control_mut().flush();
    coordinator.refresh(&mut view);
    reader.abort();
    Ok(())
}

async fn read_input(
    events: mpsc::Sender<UiEvent>,
    signals: mpsc::Sender<ViewportSignal>,
    shown: Arc<AtomicUsize>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                log::warn!("Cannot read input: {err}");
                break;
            }
        };
        match parse_input(&line) {
            Ok(Input::Event(UiEvent::Quit)) => break,
            Ok(Input::Event(event)) => {
                if events.send(event).await.is_err() {
                    return;
                }
            }
            Ok(Input::More) => {
                let signal = ViewportSignal::at_end(shown.load(Ordering::SeqCst));
                if signals.send(signal).await.is_err() {
                    log::debug!("Scroll subscription closed");
                }
            }
            Ok(Input::Help) => emit(HELP),
            Ok(Input::Empty) => {}
            Err(message) => eprintln!("{message}"),
        }
    }
    let _ = events.send(UiEvent::Quit).await;
}
