//! Wayfare CLI
//!
//! Drives the content pipeline against a live CMS.
//!
//! ```bash
//! wayfare render page /about
//! wayfare render package bali-getaway --format json
//! wayfare packages --tag beach --limit 6
//! wayfare invalidate package-list
//! ```

mod output;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use wayfare::cms::model::PackageFilters;
use wayfare::conf::{Settings, SettingsBuilder};
use wayfare::content::{ContentClass, UnknownContentClass};
use wayfare::{PageAssembler, PageStatus, logging};

/// Exit code for pages that could not be produced
const EXIT_NOT_FOUND: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "wayfare")]
#[command(about = "Render Wayfare CMS content", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbosity: u8,

	/// TOML settings file (defaults to ./wayfare.toml when present)
	#[arg(long, value_name = "PATH", global = true)]
	config: Option<PathBuf>,

	/// Output format: HTML or a table for `text`, a JSON document for `json`
	#[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
	format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
	Text,
	Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Render a content page or a package detail page
	Render {
		#[command(subcommand)]
		target: RenderTarget,
	},

	/// List packages matching the given filters
	Packages {
		/// Only packages carrying this tag
		#[arg(long)]
		tag: Option<String>,

		/// Only featured packages
		#[arg(long)]
		featured: bool,

		/// Maximum number of packages
		#[arg(long, value_parser = clap::value_parser!(u32).range(1..=24))]
		limit: Option<u32>,
	},

	/// Purge cached content of one class (page, package-list, package) or `all`
	Invalidate {
		#[arg(value_name = "CLASS", value_parser = parse_invalidate_target)]
		target: InvalidateTarget,
	},
}

#[derive(Subcommand, Debug)]
enum RenderTarget {
	/// CMS page targeting a URL path
	Page {
		#[arg(value_name = "PATH")]
		path: String,
	},

	/// Package detail page
	Package {
		#[arg(value_name = "SLUG")]
		slug: String,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InvalidateTarget {
	All,
	Class(ContentClass),
}

fn parse_invalidate_target(s: &str) -> Result<InvalidateTarget, UnknownContentClass> {
	if s == "all" {
		return Ok(InvalidateTarget::All);
	}
	s.parse().map(InvalidateTarget::Class)
}

fn load_settings(config: Option<PathBuf>, verbosity: u8) -> anyhow::Result<Settings> {
	let mut settings = SettingsBuilder::standard(config)
		.build()
		.context("failed to load settings")?;
	match verbosity {
		0 => {}
		1 => settings.logging.level = "debug".to_string(),
		_ => settings.logging.level = "trace".to_string(),
	}
	Ok(settings)
}

async fn log_cache_statistics(assembler: &PageAssembler) {
	let stats = assembler.fetcher().cache_statistics().await;
	tracing::debug!(
		hits = stats.hits,
		misses = stats.misses,
		entries = stats.entries,
		hit_rate = stats.hit_rate(),
		"cache statistics"
	);
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
	let settings = load_settings(cli.config, cli.verbosity)?;
	logging::init(&settings.logging).context("failed to initialize logging")?;
	tracing::debug!(command = ?cli.command, environment = ?settings.environment, "starting");

	let assembler = PageAssembler::from_settings(&settings).context("failed to create CMS client")?;

	match cli.command {
		Commands::Render { target } => {
			let page = match target {
				RenderTarget::Page { path } => assembler.content_page(&path).await,
				RenderTarget::Package { slug } => assembler.package_page(&slug).await,
			};
			match cli.format {
				OutputFormat::Text => println!("{}", page.render_to_string()),
				OutputFormat::Json => {
					println!("{}", serde_json::to_string_pretty(&output::page_json(&page))?)
				}
			}
			if page.status == PageStatus::Ok {
				Ok(ExitCode::SUCCESS)
			} else {
				Ok(ExitCode::from(EXIT_NOT_FOUND))
			}
		}
		Commands::Packages {
			tag,
			featured,
			limit,
		} => {
			let mut filters = PackageFilters::new();
			filters.tag = tag;
			filters.featured = featured.then_some(true);
			filters.limit = limit;

			let list = assembler
				.fetcher()
				.fetch_packages(&filters)
				.await
				.context("failed to fetch packages")?;
			match cli.format {
				OutputFormat::Text => print!("{}", output::package_list_text(&list)),
				OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
			}
			Ok(ExitCode::SUCCESS)
		}
		Commands::Invalidate { target } => {
			let fetcher = assembler.fetcher();
			let purged = match target {
				InvalidateTarget::All => fetcher.invalidate_all().await,
				InvalidateTarget::Class(class) => fetcher.invalidate(class).await,
			};
			purged.context("failed to invalidate cache")?;
			let tags: Vec<&str> = match target {
				InvalidateTarget::All => ContentClass::ALL.iter().map(|class| class.tag()).collect(),
				InvalidateTarget::Class(class) => vec![class.tag()],
			};
			println!("invalidated {}", tags.join(", "));
			Ok(ExitCode::SUCCESS)
		}
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();

	match run(cli).await {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:#}");
			ExitCode::FAILURE
		}
	}
}
