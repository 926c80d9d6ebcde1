//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use coursehub_content::ContentStore;
use coursehub_core::classifier::DomainClassifier;
use coursehub_core::debounce::spawn_debounced_search;
use coursehub_core::pipeline::{BuildResult, BuildSiteConfig, ProgressReporter};
use coursehub_core::relations::{domain_co_occurrence, domain_stats, find_relationships};
use coursehub_core::search::{SearchHit, SearchIndex};
use coursehub_core::seo::page_url;
use coursehub_core::sitemap::STATIC_PAGES;
use coursehub_linkcheck::{LinkChecker, LinkStatus, check_uptime, collect_links};
use coursehub_shared::{AppConfig, config_dir, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// CourseHub: a static course and resource portal.
#[derive(Parser)]
#[command(
    name = "coursehub",
    version,
    about = "Validate, search and export a YAML-backed course portal.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to a coursehub.toml (defaults to ./coursehub.toml, then ~/.coursehub/).
    #[arg(long, global = true, env = "COURSEHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Content directory (overrides `[content] dir`).
    #[arg(long, global = true)]
    pub content: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check content for errors and quality problems.
    Validate {
        /// Treat warnings as failures.
        #[arg(long)]
        strict: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export JSON pages, search index and sitemap.
    Build {
        /// Output directory (overrides `[build] out_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Canonical base URL (overrides site.yaml and `[build] base_url`).
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Check an existing export against its manifest.
    Verify {
        /// Export directory (defaults to `[build] out_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Search courses, learning paths and resources.
    Search {
        /// Query to run once.
        #[arg(required_unless_present = "watch")]
        query: Option<String>,

        /// Read queries line by line from stdin, debounced.
        #[arg(long, conflicts_with = "query")]
        watch: bool,

        /// Maximum number of hits (overrides `[search] limit`).
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print hits as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show domain statistics and cross-domain course relationships.
    Domains {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check external links referenced by content. Failures are warnings.
    Links {
        /// Check loopback and private-network hosts too.
        #[arg(long)]
        allow_private: bool,

        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check that a deployed site's static pages respond.
    Monitor {
        /// Deployed site origin (defaults to `[build] base_url`).
        #[arg(long)]
        base_url: Option<String>,

        /// Check loopback and private-network hosts too.
        #[arg(long)]
        allow_private: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default coursehub.toml.
    Init {
        /// Write to ~/.coursehub/ instead of the current directory.
        #[arg(long)]
        global: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "coursehub=info",
        1 => "coursehub=debug",
        _ => "coursehub=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Resolved configuration plus the content directory to operate on.
struct Context {
    config: AppConfig,
    content_dir: PathBuf,
}

impl Context {
    fn resolve(config_path: Option<&Path>, content: Option<PathBuf>) -> Result<Self> {
        let config = load_config(config_path)?;
        let content_dir = content.unwrap_or_else(|| PathBuf::from(&config.content.dir));
        Ok(Self {
            config,
            content_dir,
        })
    }

    fn load_store(&self) -> Result<ContentStore> {
        ContentStore::load(&self.content_dir).map_err(|e| {
            eyre!(
                "failed to load content from '{}': {e}",
                self.content_dir.display()
            )
        })
    }
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init { global } => cmd_config_init(*global),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        };
    }

    let ctx = Context::resolve(cli.config.as_deref(), cli.content)?;

    match cli.command {
        Command::Validate { strict, json } => cmd_validate(&ctx, strict, json),
        Command::Build { out, base_url } => cmd_build(&ctx, out, base_url),
        Command::Verify { out } => cmd_verify(&ctx, out),
        Command::Search {
            query,
            watch,
            limit,
            json,
        } => {
            if watch {
                cmd_search_watch(&ctx, limit, json).await
            } else {
                let query = query.ok_or_else(|| eyre!("a query is required without --watch"))?;
                cmd_search(&ctx, &query, limit, json)
            }
        }
        Command::Domains { json } => cmd_domains(&ctx, json),
        Command::Links {
            allow_private,
            json,
        } => cmd_links(&ctx, allow_private, json).await,
        Command::Monitor {
            base_url,
            allow_private,
        } => cmd_monitor(&ctx, base_url, allow_private).await,
        Command::Config { .. } => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// validate / build / verify
// ---------------------------------------------------------------------------

fn cmd_validate(ctx: &Context, strict: bool, json: bool) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let report = coursehub_content::validate(&ctx.content_dir, &ctx.config.quality, today)?;

    let errors = report.errors().count();
    let warnings = report.warnings().count();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for issue in &report.issues {
            println!("{issue}");
        }
        println!();
        println!("  {errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        return Err(eyre!("validation failed with {errors} error(s)"));
    }
    if strict && warnings > 0 {
        return Err(eyre!("validation failed with {warnings} warning(s) in strict mode"));
    }
    Ok(())
}

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_written(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Writing [{current}/{total}] {path}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

fn cmd_build(ctx: &Context, out: Option<PathBuf>, base_url: Option<String>) -> Result<()> {
    let store = ctx.load_store()?;

    let config = BuildSiteConfig {
        out_dir: out.unwrap_or_else(|| PathBuf::from(&ctx.config.build.out_dir)),
        base_url: base_url.or_else(|| ctx.config.build.base_url.clone()),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(out_dir = %config.out_dir.display(), "building site");

    let reporter = CliProgress::new();
    let result = coursehub_core::pipeline::build_site(&store, &config, &reporter)?;

    println!();
    println!("  Site exported successfully!");
    println!("  Build:         {}", result.manifest.build_id);
    println!("  Courses:       {}", result.manifest.course_count);
    println!("  Resources:     {}", result.manifest.resource_count);
    println!("  Paths:         {}", result.manifest.path_count);
    println!("  Relationships: {}", result.relationship_count);
    println!("  Files:         {}", result.manifest.files.len());
    println!("  Output:        {}", result.out_dir.display());
    println!("  Time:          {:.2}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_verify(ctx: &Context, out: Option<PathBuf>) -> Result<()> {
    let out_dir = out.unwrap_or_else(|| PathBuf::from(&ctx.config.build.out_dir));
    let manifest = coursehub_core::export::verify_export(&out_dir)?;

    println!(
        "  {} file(s) verified in {} (build {}, generated {})",
        manifest.files.len(),
        out_dir.display(),
        manifest.build_id,
        manifest.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

fn build_index(ctx: &Context, limit: Option<usize>) -> Result<SearchIndex> {
    let store = ctx.load_store()?;
    Ok(SearchIndex::build(&store).with_limit(limit.unwrap_or(ctx.config.search.limit)))
}

fn print_hits(query: &str, hits: &[SearchHit], json: bool) -> Result<()> {
    if json {
        let line = serde_json::json!({ "query": query, "hits": hits });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    println!("{} hit(s) for \"{query}\"", hits.len());
    for hit in hits {
        println!("  [{}] {}  {}  ({})", hit.kind, hit.id, hit.title, hit.href);
    }
    Ok(())
}

fn cmd_search(ctx: &Context, query: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let index = build_index(ctx, limit)?;
    print_hits(query, &index.search(query), json)
}

async fn cmd_search_watch(ctx: &Context, limit: Option<usize>, json: bool) -> Result<()> {
    let index = Arc::new(build_index(ctx, limit)?);
    let delay = Duration::from_millis(ctx.config.search.debounce_ms);
    let (input, mut results, handle) = spawn_debounced_search(index, delay);

    info!(debounce_ms = ctx.config.search.debounce_ms, "reading queries from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input = Some(input);

    loop {
        tokio::select! {
            line = lines.next_line(), if input.is_some() => match line? {
                Some(line) => {
                    if let Some(input) = &input {
                        input.update(line);
                    }
                }
                // Closing the input flushes the last pending query.
                None => input = None,
            },
            settled = results.recv() => match settled {
                Some(settled) => print_hits(&settled.query, &settled.hits, json)?,
                None => break,
            },
        }
    }

    handle.await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// domains
// ---------------------------------------------------------------------------

fn cmd_domains(ctx: &Context, json: bool) -> Result<()> {
    let store = ctx.load_store()?;
    let classifier = DomainClassifier::new(&store.domains);
    let classification = classifier.classify_store(&store);
    let stats = domain_stats(&classifier, &classification);
    let co_occurrence = domain_co_occurrence(&classification);
    let relations = find_relationships(store.courses(), &classifier);

    if json {
        let report = serde_json::json!({
            "domains": stats,
            "co_occurrence": co_occurrence,
            "relationships": relations.pairs(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("  {:<20} {:>8} {:>10}", "DOMAIN", "COURSES", "RESOURCES");
    for s in &stats {
        println!(
            "  {:<20} {:>8} {:>10}",
            s.domain_id, s.course_count, s.resource_count
        );
    }

    if !co_occurrence.is_empty() {
        println!();
        println!("  Co-occurring domains:");
        for pair in &co_occurrence {
            println!(
                "    {} + {}: {} course(s)",
                pair.domain_a, pair.domain_b, pair.course_count
            );
        }
    }

    println!();
    println!("  {} cross-domain relationship(s)", relations.pairs().len());
    for rel in relations.pairs() {
        println!(
            "    {} <-> {}  [{}]",
            rel.course_id,
            rel.related_id,
            rel.shared_domains.join(", ")
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// links / monitor
// ---------------------------------------------------------------------------

async fn cmd_links(ctx: &Context, allow_private: bool, json: bool) -> Result<()> {
    let store = ctx.load_store()?;
    let targets = collect_links(&store);

    let mut links_config = ctx.config.links.clone();
    links_config.allow_private |= allow_private;
    let checker = LinkChecker::new(&links_config)?;

    info!(links = targets.len(), "checking external links");
    let summary = checker.check_all(&targets).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for report in summary.unhealthy_reports() {
        let detail = match &report.status {
            LinkStatus::Broken { code } => format!("HTTP {code}"),
            LinkStatus::Failed { reason } => reason.clone(),
            LinkStatus::Ok { .. } | LinkStatus::Skipped { .. } => continue,
        };
        println!(
            "warning: {} ({detail}) referenced by {}",
            report.url,
            report.sources.join(", ")
        );
    }

    println!();
    println!(
        "  {} checked, {} healthy, {} unhealthy, {} skipped",
        summary.checked, summary.healthy, summary.unhealthy, summary.skipped
    );
    if summary.unhealthy > 0 {
        warn!(unhealthy = summary.unhealthy, "some external links are unhealthy");
    }
    Ok(())
}

async fn cmd_monitor(ctx: &Context, base_url: Option<String>, allow_private: bool) -> Result<()> {
    let base_url = base_url
        .or_else(|| ctx.config.build.base_url.clone())
        .ok_or_else(|| eyre!("no base URL: pass --base-url or set [build] base_url"))?;

    let urls: Vec<String> = STATIC_PAGES
        .iter()
        .map(|(path, _)| page_url(&base_url, path))
        .collect();

    let mut links_config = ctx.config.links.clone();
    links_config.allow_private |= allow_private;
    let checker = LinkChecker::new(&links_config)?;

    let report = check_uptime(&checker, &urls).await;
    for down in &report.down {
        println!("down: {} ({:?})", down.url, down.status);
    }
    println!("  {}/{} page(s) up", report.up, urls.len());

    if !report.is_up() {
        return Err(eyre!("{} page(s) down on {base_url}", report.down.len()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init(global: bool) -> Result<()> {
    let dir = if global {
        config_dir()?
    } else {
        std::env::current_dir()?
    };
    let path = init_config(&dir)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config: AppConfig = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_requires_query_or_watch() {
        assert!(Cli::try_parse_from(["coursehub", "search"]).is_err());
        assert!(Cli::try_parse_from(["coursehub", "search", "gis"]).is_ok());
        assert!(Cli::try_parse_from(["coursehub", "search", "--watch"]).is_ok());
        assert!(Cli::try_parse_from(["coursehub", "search", "gis", "--watch"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "coursehub",
            "build",
            "--content",
            "fixtures/content",
            "-vv",
            "--out",
            "dist",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.content, Some(PathBuf::from("fixtures/content")));
        match cli.command {
            Command::Build { out, base_url } => {
                assert_eq!(out, Some(PathBuf::from("dist")));
                assert!(base_url.is_none());
            }
            _ => panic!("expected build"),
        }
    }
}
