use anyhow::{anyhow, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use flags::TriFlag;
use iam_model::AccessLevel;
use iam_search::{Catalog, FilterSpec, Selector, TagPredicate};
use iam_session::{Browser, BrowserConfig, Loader};
use output::{ActionDetailOutput, RecordOutput, SearchOutput, ServiceOutput, StatsOutput};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

mod browse;
mod flags;
mod output;
mod report;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    print_stdout(&serde_json::to_string_pretty(value)?)
}

#[derive(Parser)]
#[command(name = "iam-browser")]
#[command(about = "Search and filter AWS IAM actions, resources and condition keys", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Directory or http(s) URL the dataset is served under
    #[arg(long, global = true)]
    data: Option<String>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rows per page (initial window and growth step)
    #[arg(long, global = true)]
    page_size: Option<usize>,

    /// Fail the load when totalServices disagrees with the document
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter actions and print the first page(s) of matches
    Search(SearchArgs),

    /// Show one action with its resources, condition keys and dependents
    Show(ShowArgs),

    /// Dataset statistics
    Stats(JsonArgs),

    /// List services with their action counts
    Services(JsonArgs),

    /// Interactive filtering session on stdin
    Browse,
}

#[derive(Args)]
struct SearchArgs {
    /// Substring of `service:action`, case-insensitive
    query: Option<String>,

    /// Service id, or All
    #[arg(long, default_value = "All", value_parser = flags::parse_service)]
    service: Selector<String>,

    /// Access level, or All
    #[arg(long = "level", default_value = "All", value_parser = flags::parse_access_level)]
    access_level: Selector<AccessLevel>,

    #[arg(long, value_enum, default_value = "any")]
    request_tag: TriFlag,

    #[arg(long, value_enum, default_value = "any")]
    resource_tag: TriFlag,

    #[arg(long, value_enum, default_value = "any")]
    tag_keys: TriFlag,

    /// Supports resource-level permissions
    #[arg(long, value_enum, default_value = "any")]
    resource_level: TriFlag,

    #[arg(long, value_enum, default_value = "any")]
    dependent_actions: TriFlag,

    /// Number of pages to materialize
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

impl SearchArgs {
    fn filter_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec {
            search: self.query.clone().unwrap_or_default(),
            service: self.service.clone(),
            access_level: self.access_level.clone(),
            ..FilterSpec::default()
        };
        for (predicate, flag) in [
            (TagPredicate::RequestTag, self.request_tag),
            (TagPredicate::ResourceTag, self.resource_tag),
            (TagPredicate::TagKeys, self.tag_keys),
            (TagPredicate::ResourceLevelPermissions, self.resource_level),
            (TagPredicate::DependentActions, self.dependent_actions),
        ] {
            spec.set_tri(predicate, flag.as_domain());
        }
        spec
    }
}

#[derive(Args)]
struct ShowArgs {
    /// Action identifier, e.g. `s3:GetObject` (case-insensitive)
    id: String,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct JsonArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    let json_output = match &cli.command {
        Commands::Search(args) => args.json,
        Commands::Show(args) => args.json,
        Commands::Stats(args) | Commands::Services(args) => args.json,
        Commands::Browse => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Search(args) => run_search(args, &config).await?,
        Commands::Show(args) => run_show(args, &config).await?,
        Commands::Stats(args) => run_stats(args, &config).await?,
        Commands::Services(args) => run_services(args, &config).await?,
        Commands::Browse => browse::run(config).await?,
    }

    Ok(())
}

/// defaults < config file < environment < flags
fn resolve_config(cli: &Cli) -> Result<BrowserConfig> {
    let base = match &cli.config {
        Some(path) => BrowserConfig::load(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => BrowserConfig::default(),
    };
    let mut config = base.with_env().context("Invalid environment override")?;

    if let Some(data) = &cli.data {
        config.base_path.clone_from(data);
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }
    if cli.strict {
        config.strict_service_count = true;
    }
    config.validate()?;
    log::debug!("Effective config: {config:?}");
    Ok(config)
}

async fn load_catalog(config: &BrowserConfig) -> Result<Arc<Catalog>> {
    let source = config.data_source();
    Loader::from_config(config)
        .load(&source)
        .await
        .with_context(|| format!("Failed to load dataset from {source}"))
}

async fn run_search(args: SearchArgs, config: &BrowserConfig) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let (_tx, rx) = watch::channel(args.filter_spec());
    let mut browser = Browser::new(catalog, rx, config.page_size);
    for _ in 1..args.pages {
        if !browser.grow() {
            break;
        }
    }

    let page = browser.page();
    if args.json {
        let output = SearchOutput {
            filter: browser.spec(),
            matched: page.matched,
            total: page.total,
            shown: page.shown(),
            has_more: page.has_more,
            records: page.records.iter().map(RecordOutput::from).collect(),
        };
        print_json(&output)
    } else {
        print_stdout(&report::render_page(&page))
    }
}

async fn run_show(args: ShowArgs, config: &BrowserConfig) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let view = catalog
        .find(&args.id)
        .ok_or_else(|| anyhow!("No action named '{}'", args.id.trim()))?;

    if args.json {
        print_json(&ActionDetailOutput::build(&catalog, &view))
    } else {
        print_stdout(&report::render_action(&catalog, &view))
    }
}

async fn run_stats(args: JsonArgs, config: &BrowserConfig) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let dataset = catalog.dataset();
    let stats = dataset.stats();

    if args.json {
        print_json(&StatsOutput {
            stats,
            total_services: dataset.total_services,
            last_updated: dataset.last_updated.as_deref(),
            failed_service_ids: &dataset.failed_services,
            issues: catalog.issues(),
        })
    } else {
        print_stdout(&report::render_stats(dataset, &stats, catalog.issues()))
    }
}

async fn run_services(args: JsonArgs, config: &BrowserConfig) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let dataset = catalog.dataset();

    if args.json {
        let services: Vec<_> = dataset
            .services
            .iter()
            .map(|service| ServiceOutput {
                service: &service.service,
                name: service.display_name(),
                actions: service.actions.len(),
                resources: service.resources.len(),
                condition_keys: service.condition_keys.len(),
            })
            .collect();
        print_json(&services)
    } else {
        print_stdout(&report::render_services(dataset))
    }
}
