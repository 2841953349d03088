use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use dish_harvester::catalog::list_queries;
use dish_harvester::config::{ConfigLoader, ResolvedConfig, validate_limit, validate_prefix};
use dish_harvester::domain::{ImageType, Query};
use dish_harvester::error::HarvestError;
use dish_harvester::image::ImageHttpClient;
use dish_harvester::output::{ConsoleOutput, JsonOutput, OutputMode};
use dish_harvester::pipeline::{HarvestReport, HarvestSettings, Harvester, QueryOutcome, plan};
use dish_harvester::pixabay::{PixabayHttpClient, SearchFilters};
use dish_harvester::relabel::{RelabelOptions, RelabelReport, SkipReason, relabel};

#[derive(Parser)]
#[command(name = "dish-harvester")]
#[command(about = "Download Pixabay images into per-dish folders, then relabel the folders")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    /// JSON config file (default: ./dish-harvester.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Search and download images for every query")]
    Fetch(FetchArgs),
    #[command(about = "Rename slug folders to their display labels")]
    Relabel(RelabelArgs),
    #[command(about = "Show queries with their folder slugs and labels")]
    Queries,
}

#[derive(Args)]
struct FetchArgs {
    #[arg(long)]
    api_key: Option<String>,

    /// Images to download per query
    #[arg(long)]
    limit: Option<usize>,

    #[arg(long)]
    output: Option<String>,

    /// Search term; repeat to replace the configured list
    #[arg(long = "query")]
    queries: Vec<String>,

    #[arg(long)]
    prefix: Option<String>,

    #[arg(long)]
    image_type: Option<ImageType>,

    #[arg(long)]
    lang: Option<String>,

    #[arg(long)]
    no_safe_search: bool,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct RelabelArgs {
    #[arg(long)]
    dir: Option<String>,

    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        let code = report
            .downcast_ref::<HarvestError>()
            .map(HarvestError::exit_code)
            .unwrap_or(1);
        return ExitCode::from(code);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch(args) => run_fetch(args, &config, output_mode),
        Commands::Relabel(args) => run_relabel(args, &config, output_mode),
        Commands::Queries => run_queries(&config, output_mode),
    }
}

fn run_fetch(
    args: FetchArgs,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let FetchArgs {
        api_key,
        limit,
        output,
        queries,
        prefix,
        image_type,
        lang,
        no_safe_search,
        dry_run,
    } = args;

    let queries = if queries.is_empty() {
        config.queries.clone()
    } else {
        queries
            .iter()
            .map(|value| value.parse())
            .collect::<Result<Vec<Query>, HarvestError>>()?
    };
    let limit = limit.unwrap_or(config.per_query_limit);
    validate_limit(limit)?;
    let output_root = output
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| config.output_dir.clone());
    let file_prefix = prefix.unwrap_or_else(|| config.file_prefix.clone());
    validate_prefix(&file_prefix)?;
    let filters = SearchFilters {
        image_type: image_type.unwrap_or(config.filters.image_type),
        lang: lang.unwrap_or_else(|| config.filters.lang.clone()),
        safe_search: config.filters.safe_search && !no_safe_search,
    };

    if dry_run {
        let planned = plan(&queries, limit, &output_root, &filters);
        match output_mode {
            OutputMode::NonInteractive => JsonOutput::print_plan(&planned).into_diagnostic()?,
            OutputMode::Interactive => {
                println!("Dry run: {} queries, {limit} images each", planned.len());
                for entry in &planned {
                    println!(
                        "  {} -> {} (per_page={})",
                        entry.query, entry.directory, entry.per_page
                    );
                }
            }
        }
        return Ok(());
    }

    // Credential check happens before any directory or request is made.
    let api_key = config.api_key(api_key.as_deref())?;
    let search =
        PixabayHttpClient::new(api_key, &config.api_base_url, config.user_agent.as_deref())?;
    let images = ImageHttpClient::new(config.user_agent.as_deref())?;
    let harvester = Harvester::new(
        search,
        images,
        HarvestSettings {
            file_prefix,
            filters,
            pacing: config.pacing,
        },
    );

    match output_mode {
        OutputMode::NonInteractive => {
            let report = harvester.run(&queries, limit, &output_root, &JsonOutput)?;
            JsonOutput::print_harvest(&report).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            eprintln!(
                "Fetching {limit} images for each of {} queries into {output_root}",
                queries.len()
            );
            let report = harvester.run(&queries, limit, &output_root, &ConsoleOutput)?;
            print_harvest_summary(&report);
        }
    }
    Ok(())
}

fn run_relabel(
    args: RelabelArgs,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let base = args
        .dir
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| config.relabel_dir.clone());
    let options = RelabelOptions {
        dry_run: args.dry_run,
    };

    match output_mode {
        OutputMode::NonInteractive => {
            let report = relabel(&base, &config.folder_mapping, options, &JsonOutput)?;
            JsonOutput::print_relabel(&report).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let report = relabel(&base, &config.folder_mapping, options, &ConsoleOutput)?;
            print_relabel_summary(&report);
        }
    }
    Ok(())
}

fn run_queries(config: &ResolvedConfig, output_mode: OutputMode) -> miette::Result<()> {
    let listing = list_queries(&config.queries, &config.folder_mapping);
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_queries(&listing).into_diagnostic()?,
        OutputMode::Interactive => {
            for entry in &listing {
                let label = entry.label.as_deref().unwrap_or("(no label)");
                println!("{:>3}. {} -> {} -> {}", entry.position, entry.query, entry.slug, label);
            }
        }
    }
    Ok(())
}

fn print_harvest_summary(report: &HarvestReport) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("{cyan}dish-harvester summary{reset}");
    for query in &report.queries {
        let (color, detail) = match &query.outcome {
            QueryOutcome::Complete => (green, "complete".to_string()),
            QueryOutcome::Truncated => (
                yellow,
                "more matches exist beyond the first page (single-page limit)".to_string(),
            ),
            QueryOutcome::Insufficient => (yellow, "fewer than requested found".to_string()),
            QueryOutcome::NoResults => (yellow, "no results".to_string()),
            QueryOutcome::SearchFailed { message } => (red, format!("search failed: {message}")),
        };
        println!(
            "{color}{:>3}/{:<3} {} [{detail}]{reset}",
            query.downloaded, query.requested, query.query
        );
        if query.fallback_directory {
            println!(
                "{yellow}        saved into {} (folder could not be created){reset}",
                query.directory
            );
        }
    }
    println!(
        "{green}Downloaded {} of {} requested images into {}{reset}",
        report.total_downloaded,
        report.total_requested(),
        report.output_root
    );
}

fn print_relabel_summary(report: &RelabelReport) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let reset = "\x1b[0m";

    let verb = if report.dry_run { "would rename" } else { "renamed" };
    for entry in &report.renamed {
        println!("{green}{verb}: {} -> {}{reset}", entry.from, entry.to);
    }
    let collisions = report
        .skipped
        .iter()
        .filter(|entry| matches!(entry.reason, SkipReason::TargetExists { .. }))
        .count();
    println!(
        "{green}{} {verb}{reset}, {yellow}{} skipped ({collisions} collisions){reset}",
        report.renamed_count(),
        report.skipped_count()
    );
}
