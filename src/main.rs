//! journal-federation - command-line entry point
//!
//! Uploads DOAJ/Scimago dataset files into their stores and runs single-store
//! and cross-store queries. Query results are printed as pretty JSON on stdout;
//! logs go to stderr.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use journal_federation::{
    BasicQueryEngine, CategoryUploadHandler, FederationConfig, FullQueryEngine,
    JournalUploadHandler, Quartile, SparqlJournalHandler, SqliteCategoryHandler,
};

#[derive(Parser, Debug)]
#[command(name = "journal-federation")]
#[command(about = "Query DOAJ journals and Scimago rankings across a graph and a relational store")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(long, default_value = "journal-federation.toml", env = "JOURNAL_FEDERATION_CONFIG")]
    config: PathBuf,

    /// SPARQL endpoint(s) holding journals; overrides the config file
    #[arg(long = "sparql", env = "JOURNAL_FEDERATION_SPARQL", value_delimiter = ',')]
    endpoints: Vec<String>,

    /// SQLite database(s) holding categories and areas; overrides the config file
    #[arg(long = "db", env = "JOURNAL_FEDERATION_DB", value_delimiter = ',')]
    databases: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a DOAJ CSV export into the graph store
    UploadJournals { csv: PathBuf },

    /// Load a Scimago JSON export into the relational store
    UploadCategories { json: PathBuf },

    /// All journals
    Journals,

    /// One journal by ISSN or EISSN
    Journal { id: String },

    /// Journal, category or area with this identifier
    Entity { id: String },

    JournalsWithTitle { text: String },

    JournalsPublishedBy { text: String },

    JournalsWithLicense {
        #[arg(long = "license", required = true)]
        licenses: Vec<String>,
    },

    JournalsWithApc,

    JournalsWithSeal,

    /// Categories, optionally restricted to quartiles
    Categories {
        #[arg(long = "quartile")]
        quartiles: Vec<Quartile>,
    },

    Areas,

    CategoriesInAreas {
        #[arg(long = "area", required = true)]
        areas: Vec<String>,
    },

    AreasOfCategories {
        #[arg(long = "category", required = true)]
        categories: Vec<String>,
    },

    /// Journals ranked in the given categories at the given quartiles
    InCategories {
        #[arg(long = "category", required = true)]
        categories: Vec<String>,

        #[arg(long = "quartile", required = true)]
        quartiles: Vec<Quartile>,
    },

    /// Journals in the given areas with one of the given licenses
    InAreas {
        #[arg(long = "area", required = true)]
        areas: Vec<String>,

        #[arg(long = "license", required = true)]
        licenses: Vec<String>,
    },

    /// APC-free journals in the given areas and ranked in the given categories
    Diamond {
        #[arg(long = "area", required = true)]
        areas: Vec<String>,

        #[arg(long = "category", required = true)]
        categories: Vec<String>,

        #[arg(long = "quartile", required = true)]
        quartiles: Vec<Quartile>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Installed before the config is read so config loading can log;
    // the configured level is swapped in afterwards unless RUST_LOG is set
    let from_env = EnvFilter::try_from_default_env().ok();
    let has_env_filter = from_env.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = FederationConfig::load_or_default(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?
        .with_endpoints(args.endpoints.clone())
        .with_databases(args.databases.clone());
    config.validate().context("Invalid configuration")?;

    if !has_env_filter {
        filter_handle
            .reload(EnvFilter::new(config.logging.level.as_str()))
            .context("Failed to apply configured log level")?;
    }

    info!(
        endpoints = ?config.graph.endpoints,
        databases = ?config.relational.databases,
        "journal-federation {}",
        journal_federation::VERSION
    );

    run(args.command, &config)
}

fn run(command: Command, config: &FederationConfig) -> Result<()> {
    match command {
        Command::UploadJournals { csv } => {
            let store = sparql_handler(config, first(&config.graph.endpoints, "graph.endpoints")?)?;
            let report = JournalUploadHandler::new(store)
                .push_data_to_db(&csv)
                .with_context(|| format!("Failed to upload {}", csv.display()))?;
            print_json(&report)
        }
        Command::UploadCategories { json } => {
            let db = first(&config.relational.databases, "relational.databases")?;
            let report = CategoryUploadHandler::new(db)
                .push_data_to_db(&json)
                .with_context(|| format!("Failed to upload {}", json.display()))?;
            print_json(&report)
        }

        Command::Journals => print_json(&basic_engine(config)?.get_all_journals()?),
        Command::Journal { id } => print_json(&basic_engine(config)?.get_journal_by_issn(&id)?),
        Command::Entity { id } => print_json(&basic_engine(config)?.get_entity_by_id(&id)?),
        Command::JournalsWithTitle { text } => {
            print_json(&basic_engine(config)?.get_journals_with_title(&text)?)
        }
        Command::JournalsPublishedBy { text } => {
            print_json(&basic_engine(config)?.get_journals_published_by(&text)?)
        }
        Command::JournalsWithLicense { licenses } => {
            print_json(&basic_engine(config)?.get_journals_with_license(&to_set(licenses))?)
        }
        Command::JournalsWithApc => print_json(&basic_engine(config)?.get_journals_with_apc()?),
        Command::JournalsWithSeal => {
            print_json(&basic_engine(config)?.get_journals_with_doaj_seal()?)
        }

        Command::Categories { quartiles } => {
            let engine = basic_engine(config)?;
            if quartiles.is_empty() {
                print_json(&engine.get_all_categories()?)
            } else {
                print_json(&engine.get_categories_with_quartile(&to_set(quartiles))?)
            }
        }
        Command::Areas => print_json(&basic_engine(config)?.get_all_areas()?),
        Command::CategoriesInAreas { areas } => {
            print_json(&basic_engine(config)?.get_categories_assigned_to_areas(&to_set(areas))?)
        }
        Command::AreasOfCategories { categories } => {
            print_json(&basic_engine(config)?.get_areas_assigned_to_categories(&to_set(categories))?)
        }

        Command::InCategories { categories, quartiles } => {
            let engine = full_engine(config)?;
            print_json(
                &engine.get_journals_in_categories_with_quartile(&to_set(categories), &to_set(quartiles))?,
            )
        }
        Command::InAreas { areas, licenses } => {
            let engine = full_engine(config)?;
            print_json(&engine.get_journals_in_areas_with_license(&to_set(areas), &to_set(licenses))?)
        }
        Command::Diamond { areas, categories, quartiles } => {
            let engine = full_engine(config)?;
            print_json(&engine.get_diamond_journals_in_areas_and_categories_with_quartile(
                &to_set(areas),
                &to_set(categories),
                &to_set(quartiles),
            )?)
        }
    }
}

// ============================================================================
// ENGINE WIRING
// ============================================================================

fn sparql_handler(config: &FederationConfig, endpoint: &str) -> Result<SparqlJournalHandler> {
    SparqlJournalHandler::with_options(endpoint, config.graph.batch_size, config.graph.timeout_secs)
        .with_context(|| format!("Failed to create SPARQL client for {}", endpoint))
}

fn basic_engine(config: &FederationConfig) -> Result<BasicQueryEngine> {
    let mut engine = BasicQueryEngine::new();

    for endpoint in &config.graph.endpoints {
        if !engine.add_journal_handler(Box::new(sparql_handler(config, endpoint)?)) {
            warn!("Duplicate SPARQL endpoint {} ignored", endpoint);
        }
    }
    for db in &config.relational.databases {
        if !engine.add_category_handler(Box::new(SqliteCategoryHandler::new(db.as_str()))) {
            warn!("Duplicate database {} ignored", db);
        }
    }

    Ok(engine)
}

fn full_engine(config: &FederationConfig) -> Result<FullQueryEngine> {
    Ok(FullQueryEngine::from(basic_engine(config)?))
}

// ============================================================================
// HELPERS
// ============================================================================

fn first<'a>(values: &'a [String], key: &str) -> Result<&'a str> {
    values
        .first()
        .map(String::as_str)
        .with_context(|| format!("No {} configured", key))
}

fn to_set<T: Ord>(values: Vec<T>) -> BTreeSet<T> {
    values.into_iter().collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}
