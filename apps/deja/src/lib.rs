use std::{
	fs,
	path::PathBuf,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

use clap::{
	Parser, Subcommand, ValueEnum,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use deja_config::IndexBackend;
use deja_domain::RawIssue;
use deja_index::{LocalIndex, QdrantIndex, TicketIndex, VectorField};
use deja_service::{DejaService, SearchRequest};

#[derive(Debug, Parser)]
#[command(
	version,
	rename_all = "kebab",
	styles = styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Index raw issues from a JSON file.
	Index {
		/// JSON array of raw issues.
		#[arg(long, short = 'i', value_name = "FILE")]
		input: PathBuf,
	},
	/// Find tickets similar to a query.
	Search {
		query: String,
		#[arg(long, short = 'k')]
		top_k: Option<u32>,
		#[arg(long, value_enum, default_value_t = SearchField::Intent)]
		field: SearchField,
	},
	/// Recommend a resolution for a new ticket.
	Recommend {
		query: String,
		/// Write the recommendation JSON here instead of stdout.
		#[arg(long, short = 'o', value_name = "FILE")]
		output: Option<PathBuf>,
	},
	/// Show index counts by state, category, and support level.
	Stats,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SearchField {
	Intent,
	Content,
}

impl From<SearchField> for VectorField {
	fn from(field: SearchField) -> Self {
		match field {
			SearchField::Intent => Self::Intent,
			SearchField::Content => Self::Content,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = deja_config::load(&args.config)?;

	deja_config::validate(&config)?;
	init_tracing(&config);

	let index = build_index(&config)?;
	let service = DejaService::new(config, index);

	match args.command {
		Command::Index { input } => index_command(&service, &input).await,
		Command::Search { query, top_k, field } => {
			let response =
				service.search(SearchRequest { query, top_k, field: field.into() }).await?;

			print_json(&response)
		},
		Command::Recommend { query, output } => {
			let recommendation = service.recommend(&query).await?;

			match output {
				Some(path) => {
					fs::write(&path, serde_json::to_vec_pretty(&recommendation)?)?;

					tracing::info!(path = %path.display(), "Wrote recommendation.");

					Ok(())
				},
				None => print_json(&recommendation),
			}
		},
		Command::Stats => {
			service.ensure_index_ready().await?;

			print_json(&service.stats().await?)
		},
	}
}

fn build_index(config: &deja_config::Config) -> color_eyre::Result<Arc<dyn TicketIndex>> {
	let dimensions = config.providers.embedding.dimensions;

	match config.index.backend {
		IndexBackend::Local => {
			let path = config.index.snapshot_path.as_ref().ok_or_else(|| {
				eyre::eyre!("index.snapshot_path is required for the local backend.")
			})?;

			Ok(Arc::new(LocalIndex::open(path, dimensions)?))
		},
		IndexBackend::Qdrant => {
			let storage = config.storage.as_ref().ok_or_else(|| {
				eyre::eyre!("storage.qdrant is required for the qdrant backend.")
			})?;

			Ok(Arc::new(QdrantIndex::new(
				&storage.qdrant,
				dimensions,
				config.indexing.upsert_batch_size.max(1) as usize,
			)?))
		},
	}
}

async fn index_command(service: &DejaService, input: &PathBuf) -> color_eyre::Result<()> {
	let raw = fs::read_to_string(input)?;
	let issues: Vec<RawIssue> = serde_json::from_str(&raw)?;
	let cancel = Arc::new(AtomicBool::new(false));
	let ctrl_c_flag = cancel.clone();

	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			tracing::warn!("Interrupt received, finishing in-flight tickets.");

			ctrl_c_flag.store(true, Ordering::Relaxed);
		}
	});
	tracing::info!(count = issues.len(), "Indexing issues.");

	let report = service.index_tickets(issues, &cancel).await?;

	print_json(&report)
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: serde::Serialize,
{
	println!("{}", serde_json::to_string_pretty(value)?);

	Ok(())
}

fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

fn init_tracing(config: &deja_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}
