use std::{
	fs,
	path::{Path, PathBuf},
	time::Instant,
};

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use scout_config::Config;
use scout_domain::{Actor, Dataset, ScopeOptions, compute_scoped_dataset};
use scout_search::{CollectionFilter, IndexStore, QueryOptions};

#[derive(Debug, Parser)]
#[command(
	version = scout_cli::VERSION,
	rename_all = "kebab",
	styles = scout_cli::styles(),
)]
pub struct Args {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Search the dataset as the given actor.
	Query {
		#[command(flatten)]
		inputs: Inputs,
		/// `all`, a collection key, or a category name.
		#[arg(long, value_name = "KEY")]
		collection: Option<String>,
		/// Only hierarchical hits below this record.
		#[arg(long, value_name = "ID")]
		within: Option<String>,
		#[arg(long, value_name = "N")]
		limit: Option<usize>,
		/// Use the suggestion limit instead of the default one.
		#[arg(long)]
		suggest: bool,
		text: String,
	},
	/// Print the dataset as seen from the given root records.
	Scope {
		#[command(flatten)]
		inputs: Inputs,
		#[arg(long = "root", value_name = "ID", required = true)]
		roots: Vec<String>,
		#[arg(long, value_name = "N")]
		depth: Option<usize>,
		#[arg(long = "edge-type", value_name = "TYPE")]
		edge_types: Vec<String>,
	},
	/// List primary records near a record, nearest first.
	Related {
		#[command(flatten)]
		inputs: Inputs,
		#[arg(long, value_name = "ID")]
		id: String,
		#[arg(long, value_name = "N", default_value_t = 1)]
		depth: usize,
		#[arg(long = "edge-type", value_name = "TYPE")]
		edge_types: Vec<String>,
	},
	/// Print index statistics.
	Stats {
		#[command(flatten)]
		inputs: Inputs,
	},
}
impl Command {
	pub fn inputs(&self) -> &Inputs {
		match self {
			Self::Query { inputs, .. }
			| Self::Scope { inputs, .. }
			| Self::Related { inputs, .. }
			| Self::Stats { inputs } => inputs,
		}
	}
}

#[derive(Debug, ClapArgs)]
pub struct Inputs {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON object of collection key to record array.
	#[arg(long, short = 'd', value_name = "FILE")]
	pub dataset: PathBuf,
	/// JSON actor. Defaults to an unrestricted actor without roles.
	#[arg(long, short = 'a', value_name = "FILE")]
	pub actor: Option<PathBuf>,
}

pub struct Loaded {
	pub config: Config,
	pub dataset: Dataset,
	pub actor: Actor,
}
impl Loaded {
	pub fn from_inputs(inputs: &Inputs) -> Result<Self> {
		let config = scout_config::load(&inputs.config)?;
		let dataset = read_json(&inputs.dataset)?;
		let actor = match &inputs.actor {
			Some(path) => read_json(path)?,
			None => Actor::new("cli").into_unrestricted(),
		};

		Ok(Self { config, dataset, actor })
	}
}

pub fn run(args: Args) -> Result<()> {
	let loaded = Loaded::from_inputs(args.command.inputs())?;

	init_tracing(&loaded.config.service.log_level);

	let output = execute(&args.command, loaded)?;

	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}

/// Runs `command` against already loaded inputs and renders the result as JSON.
pub fn execute(command: &Command, loaded: Loaded) -> Result<Value> {
	let Loaded { config, dataset, actor } = loaded;

	match command {
		Command::Query { collection, within, limit, suggest, text, .. } => {
			let slow_query_ms = config.service.slow_query_ms;
			let store: IndexStore = IndexStore::new();

			store.set_index_data(&dataset, config, &actor);

			let mut options =
				if *suggest { QueryOptions::suggestions() } else { QueryOptions::default() };

			options.collection =
				collection.as_deref().map(CollectionFilter::parse).unwrap_or_default();
			options.within = within.clone();
			options.limit = *limit;

			let started = Instant::now();
			let response = store.query(text, &options)?;
			let elapsed_ms = started.elapsed().as_millis() as u64;

			if elapsed_ms > slow_query_ms {
				tracing::warn!(
					query = %response.normalized_query,
					elapsed_ms,
					threshold_ms = slow_query_ms,
					"Slow query."
				);
			}

			Ok(serde_json::to_value(&response)?)
		},
		Command::Scope { roots, depth, edge_types, .. } => {
			let mut options = ScopeOptions::from_config(&config.scope);

			if let Some(depth) = depth {
				options.max_depth = *depth;
			}
			if !edge_types.is_empty() {
				options.allowed_edge_types = Some(edge_types.clone());
			}

			let scoped = compute_scoped_dataset(&dataset, &config, roots.as_slice(), &options);

			Ok(serde_json::to_value(&scoped)?)
		},
		Command::Related { id, depth, edge_types, .. } => {
			let store: IndexStore = IndexStore::new();

			store.set_index_data(&dataset, config, &actor);

			let edge_types = (!edge_types.is_empty()).then_some(edge_types.as_slice());
			let related = store.related(id, *depth, edge_types)?;

			Ok(serde_json::to_value(&related)?)
		},
		Command::Stats { .. } => {
			let store: IndexStore = IndexStore::new();

			store.set_index_data(&dataset, config, &actor);

			Ok(serde_json::to_value(store.stats()?)?)
		},
	}
}

fn read_json<T>(path: &Path) -> Result<T>
where
	T: serde::de::DeserializeOwned,
{
	let raw = fs::read_to_string(path)
		.wrap_err_with(|| format!("Failed to read {}.", path.display()))?;

	serde_json::from_str(&raw).wrap_err_with(|| format!("Failed to parse {}.", path.display()))
}

fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
