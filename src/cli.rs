use crate::{
    config::AppConfig,
    console::{SessionLog, TerminalDialog, TerminalProgress, TerminalView},
    filters::{FilterConfig, FilterSettings},
    l10n::Catalog,
    pipeline::{FilterOutcome, FilterPipeline},
    plugin::PluginSet,
    query::{ConflictQuery, FixtureQuery, HttpConflictQuery},
    resolver::ConflictResolver,
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::{path::PathBuf, rc::Rc, sync::Arc};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerbosity {
    Quiet,
    Normal,
    Verbose,
    Debug,
}

impl CliVerbosity {
    pub fn filter_directive(self) -> Option<&'static str> {
        match self {
            CliVerbosity::Quiet => Some("warn"),
            CliVerbosity::Normal => None,
            CliVerbosity::Verbose => Some("debug"),
            CliVerbosity::Debug => Some("trace"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    Fixture(PathBuf),
    Endpoint(String),
    Configured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideFlag {
    Notes,
    AllMessages,
    Inactive,
    Messageless,
    Versions,
    Crcs,
    Tags,
}

impl HideFlag {
    fn parse(arg: &str) -> Option<Self> {
        match arg {
            "--hide-notes" => Some(HideFlag::Notes),
            "--hide-all-messages" => Some(HideFlag::AllMessages),
            "--hide-inactive" => Some(HideFlag::Inactive),
            "--hide-messageless" => Some(HideFlag::Messageless),
            "--hide-versions" => Some(HideFlag::Versions),
            "--hide-crcs" => Some(HideFlag::Crcs),
            "--hide-tags" => Some(HideFlag::Tags),
            _ => None,
        }
    }

    fn apply(self, settings: &mut FilterSettings) {
        match self {
            HideFlag::Notes => settings.hide_notes = true,
            HideFlag::AllMessages => settings.hide_all_plugin_messages = true,
            HideFlag::Inactive => settings.hide_inactive_plugins = true,
            HideFlag::Messageless => settings.hide_messageless_plugins = true,
            HideFlag::Versions => settings.hide_version_numbers = true,
            HideFlag::Crcs => settings.hide_crcs = true,
            HideFlag::Tags => settings.hide_bash_tags = true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub plugins: PathBuf,
    pub source: QuerySource,
    pub target: Option<String>,
    pub hide: Vec<HideFlag>,
    pub content_filter: Option<String>,
    pub search: String,
    pub language: Option<String>,
    pub format: OutputFormat,
    pub verbosity: CliVerbosity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Help,
    Version,
    Filter(FilterOptions),
}

impl CliAction {
    pub fn verbosity(&self) -> CliVerbosity {
        match self {
            CliAction::Filter(options) => options.verbosity,
            CliAction::Help | CliAction::Version => CliVerbosity::Normal,
        }
    }
}

pub fn parse_args(args: &[String]) -> Result<CliAction> {
    let mut plugins = None;
    let mut source = QuerySource::Configured;
    let mut target = None;
    let mut hide = Vec::new();
    let mut content_filter = None;
    let mut search = String::new();
    let mut language = None;
    let mut format = OutputFormat::Text;
    let mut verbosity = CliVerbosity::Normal;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if let Some(flag) = HideFlag::parse(arg) {
            if !hide.contains(&flag) {
                hide.push(flag);
            }
            continue;
        }
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-V" | "--version" => return Ok(CliAction::Version),
            "--plugins" | "-p" => plugins = Some(PathBuf::from(required(&mut iter, arg)?)),
            "--conflicts" => source = QuerySource::Fixture(PathBuf::from(required(&mut iter, arg)?)),
            "--endpoint" => source = QuerySource::Endpoint(required(&mut iter, arg)?),
            "--target" | "-t" => target = Some(required(&mut iter, arg)?),
            "--filter" => content_filter = Some(required(&mut iter, arg)?),
            "--search" => search = required(&mut iter, arg)?,
            "--lang" => language = Some(required(&mut iter, arg)?),
            "--format" => {
                let value = required(&mut iter, arg)?;
                format = OutputFormat::parse(&value)
                    .with_context(|| format!("Unknown format: {value}"))?;
            }
            "-q" | "--quiet" => verbosity = CliVerbosity::Quiet,
            "--verbose" => verbosity = CliVerbosity::Verbose,
            "--verbosity" => {
                let level = required(&mut iter, arg)?;
                verbosity = match level.as_str() {
                    "quiet" | "minimal" => CliVerbosity::Quiet,
                    "normal" | "info" => CliVerbosity::Normal,
                    "verbose" => CliVerbosity::Verbose,
                    "debug" | "trace" => CliVerbosity::Debug,
                    _ => {
                        eprintln!("Unknown verbosity: {level}");
                        CliVerbosity::Normal
                    }
                };
            }
            _ if arg.starts_with("-v") && !arg.starts_with("--") => {
                let count = arg.chars().filter(|ch| *ch == 'v').count();
                verbosity = if count >= 2 {
                    CliVerbosity::Debug
                } else {
                    CliVerbosity::Verbose
                };
            }
            value if value.starts_with("--target=") => {
                target = Some(value.trim_start_matches("--target=").to_string());
            }
            value if value.starts_with("--filter=") => {
                content_filter = Some(value.trim_start_matches("--filter=").to_string());
            }
            other => bail!("Unknown argument: {other}"),
        }
    }

    let Some(plugins) = plugins else {
        bail!("--plugins <file> is required (see --help)");
    };
    Ok(CliAction::Filter(FilterOptions {
        plugins,
        source,
        target: target.filter(|name| !name.is_empty()),
        hide,
        content_filter,
        search,
        language,
        format,
        verbosity,
    }))
}

fn required<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String> {
    match iter.next() {
        Some(value) if !value.starts_with('-') || value == "-" => Ok(value.clone()),
        _ => bail!("{flag} requires a value"),
    }
}

pub fn run(action: CliAction) -> Result<()> {
    match action {
        CliAction::Help => {
            print_help();
            Ok(())
        }
        CliAction::Version => {
            println!("pluginlens {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliAction::Filter(options) => run_filter(options),
    }
}

fn print_help() {
    println!("pluginlens");
    println!("  --plugins <file>       Plugin list (JSON array) to filter");
    println!("  --conflicts <file>     Answer conflict queries from a JSON fixture");
    println!("  --endpoint <url>       Answer conflict queries from a loader backend");
    println!("  --target <plugin>      Only show plugins that conflict with <plugin>");
    println!("  --filter <text>        Only show plugins whose card mentions <text>");
    println!("  --search <text>        Highlight matches among the shown plugins");
    println!("  --hide-notes | --hide-all-messages | --hide-inactive | --hide-messageless");
    println!("  --hide-versions | --hide-crcs | --hide-tags");
    println!("  --lang <code>          Translation catalogue to use");
    println!("  --format text|json     Output format");
    println!("  -q | -v | -vv | --verbosity <level>");
}

fn run_filter(options: FilterOptions) -> Result<()> {
    let config = AppConfig::load_or_create()?;
    let mut settings = config.filters.clone();
    for flag in &options.hide {
        flag.apply(&mut settings);
    }
    if let Some(text) = &options.content_filter {
        settings.content_filter = text.clone();
    }
    let language = options
        .language
        .clone()
        .unwrap_or_else(|| config.language.clone());

    let query = build_query(&options, &config)?;
    let mut plugins = PluginSet::load(&options.plugins)?;
    info!(count = plugins.len(), path = %options.plugins.display(), "loaded plugins");

    let log = Rc::new(SessionLog::new(Some(config.log_path())));
    let catalog = Rc::new(Catalog::load(&config.data_dir, &language)?);
    let view = TerminalView::new(&options.search, config.page_size);
    let resolver = ConflictResolver::new(
        query,
        Rc::new(TerminalProgress::new(log.clone())),
        Rc::new(TerminalDialog::new(log)),
        catalog,
    );
    let pipeline = FilterPipeline::new(resolver, view.surfaces());
    let filters = FilterConfig::new(settings).with_target(options.target.clone());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let Some(outcome) = runtime.block_on(pipeline.run(&mut plugins, &filters)) else {
        bail!("conflict lookup failed; nothing was filtered");
    };

    match options.format {
        OutputFormat::Text => print!("{}", view.render()),
        OutputFormat::Json => {
            let report = FilterReport::new(&outcome, view.search.matches());
            let raw = serde_json::to_string_pretty(&report).context("serialize report")?;
            println!("{raw}");
        }
    }
    Ok(())
}

fn build_query(options: &FilterOptions, config: &AppConfig) -> Result<Arc<dyn ConflictQuery>> {
    let query: Arc<dyn ConflictQuery> = match &options.source {
        QuerySource::Fixture(path) => Arc::new(FixtureQuery::load(path)?),
        QuerySource::Endpoint(url) => Arc::new(HttpConflictQuery::new(url)),
        QuerySource::Configured => match config.query_endpoint.as_deref() {
            Some(url) => Arc::new(HttpConflictQuery::new(url)),
            None if options.target.is_some() => {
                bail!("--target needs a conflict source: pass --conflicts or --endpoint")
            }
            None => Arc::new(FixtureQuery::default()),
        },
    };
    Ok(query)
}

#[derive(Debug, Serialize)]
struct FilterReport<'a> {
    target: Option<&'a str>,
    conflicting: &'a [String],
    visible: &'a [String],
    hidden_plugins: usize,
    hidden_messages: usize,
    search_matches: Vec<String>,
}

impl<'a> FilterReport<'a> {
    fn new(outcome: &'a FilterOutcome, search_matches: Vec<String>) -> Self {
        Self {
            target: outcome.filters.target.as_deref(),
            conflicting: &outcome.filters.conflicting,
            visible: &outcome.visible,
            hidden_plugins: outcome.hidden_plugins,
            hidden_messages: outcome.hidden_messages,
            search_matches,
        }
    }
}
