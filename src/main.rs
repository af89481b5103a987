use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use packageurl::PackageUrl;
use tracing_subscriber::EnvFilter;

use vulndb::client::nvd::NvdClient;
use vulndb::client::osv::OsvClient;
use vulndb::config::{self, Config};
use vulndb::db::{AdvisoryStore, Database};
use vulndb::matcher::PurlMatcher;
use vulndb::matcher::purl::identity;
use vulndb::view::{affected_purls, purl_vulnerabilities};
use vulndb::{ingest, view};

#[derive(Parser)]
#[command(name = "vulndb")]
#[command(version, about = "Local vulnerability advisory store and matcher")]
struct Cli {
    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the database
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Pull advisory feeds into the store
    Ingest {
        #[command(subcommand)]
        source: IngestSource,
    },
    /// Query stored advisories
    Query {
        #[command(subcommand)]
        query: QueryKind,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create the database and its schema
    Create,
    /// Delete the database file
    Drop,
    /// Print record counts per source
    Status,
}

#[derive(Subcommand)]
enum IngestSource {
    /// CVE and CPE records from the NVD feed
    Nvd {
        /// Ingest only one record kind
        #[arg(long)]
        scope: Option<NvdScope>,
        /// Acquire records newer than the stored checkpoint
        #[arg(long)]
        update: bool,
    },
    /// OSV advisories from a dump directory or by id
    Osv {
        /// Ecosystem the records belong to
        #[arg(long)]
        ecosystem: String,
        /// Directory of OSV JSON dump files
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Individual advisory ids to fetch
        #[arg(long = "id")]
        ids: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum NvdScope {
    Cve,
    Cpe,
}

#[derive(Subcommand)]
enum QueryKind {
    /// Affected packages and version ranges for an advisory id or alias
    Id { id: String },
    /// Advisories affecting a package
    Purl { purl: String },
    /// Whether this exact package version is affected by anything stored
    Affected { purl: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging()?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Admin { action } => admin(&config, action),
        Command::Ingest { source } => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(run_ingest(&config, source)),
        Command::Query { query } => run_query(&config, query),
    }
}

fn init_logging() -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let data_dir = config::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let appender = tracing_appender::rolling::never(data_dir, "vulndb.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

fn admin(config: &Config, action: AdminAction) -> anyhow::Result<()> {
    match action {
        AdminAction::Create => {
            Database::open(&config.db.path)?;
            println!("Created {}", config.db.path.display());
        }
        AdminAction::Drop => {
            Database::drop_database(&config.db.path)?;
            println!("Dropped {}", config.db.path.display());
        }
        AdminAction::Status => {
            let db = Database::open(&config.db.path)?;
            println!("cve: {}", db.cve_count()?);
            println!("cpe: {}", db.cpe_count()?);
            for ecosystem in db.advisory_ecosystems()? {
                println!("osv/{}: {}", ecosystem, db.advisory_count(&ecosystem)?);
            }
            if let Some(modified) = db.advisory_last_modified()? {
                println!("last advisory modification: {}", modified.to_rfc3339());
            }
        }
    }
    Ok(())
}

async fn run_ingest(config: &Config, source: IngestSource) -> anyhow::Result<()> {
    let db = Database::open(&config.db.path)?;

    match source {
        IngestSource::Nvd { scope, update } => {
            let client = NvdClient::from_config(&config.nvd);
            if !matches!(scope, Some(NvdScope::Cpe)) {
                let total = ingest::cves(&db, &client, update).await?;
                println!("Ingested {} CVE records", total);
            }
            if !matches!(scope, Some(NvdScope::Cve)) {
                let total = ingest::cpes(&db, &client, update).await?;
                println!("Ingested {} CPE records", total);
            }
        }
        IngestSource::Osv { ecosystem, dir, ids } => {
            if dir.is_none() && ids.is_empty() {
                anyhow::bail!("either --dir or --id is required");
            }
            if let Some(dir) = dir {
                let total = ingest::osv_dir(&db, &ecosystem, &dir)?;
                println!("Ingested {} {} advisories", total, ecosystem);
            }
            if !ids.is_empty() {
                let client = OsvClient::default();
                let total = ingest::osv_ids(&db, &client, &ecosystem, &ids).await?;
                println!("Fetched {} advisories", total);
            }
        }
    }
    Ok(())
}

fn run_query(config: &Config, query: QueryKind) -> anyhow::Result<()> {
    let db = Database::open(&config.db.path)?;

    match query {
        QueryKind::Id { id } => {
            for affected in affected_purls::by_id(&db, &id)? {
                println!("{}", affected.purl);
                println!("  ids: {}", join(affected.ids.iter()));
                println!("  versions: {}", join(affected.versions.iter()));
            }
        }
        QueryKind::Purl { purl } => {
            let summaries = purl_vulnerabilities::by_purl(&db, &purl)?;
            if summaries.is_empty() {
                println!("No stored advisories affect {}", purl);
            }
            for summary in summaries {
                println!("{}", summary.id);
                if !summary.aliases.is_empty() {
                    println!("  aliases: {}", join(summary.aliases.iter()));
                }
                if !summary.affected_versions.is_empty() {
                    println!("  versions: {}", join(summary.affected_versions.iter()));
                }
                for range in &summary.affected_version_ranges {
                    println!("  range: {}", range);
                }
            }
        }
        QueryKind::Affected { purl } => {
            let parsed =
                PackageUrl::from_str(&purl).map_err(view::ViewError::InvalidPurl)?;
            let Some(stripped) = identity(&parsed) else {
                anyhow::bail!("cannot derive identity for {}", purl);
            };

            let mut hits = 0;
            for advisory in db.find_by_purl(&stripped.to_string())? {
                if PurlMatcher::is_affected(&parsed, &advisory)? {
                    println!("affected by {}", advisory.id);
                    hits += 1;
                }
            }
            if hits == 0 {
                println!("not affected");
            }
        }
    }
    Ok(())
}

fn join<'a>(items: impl Iterator<Item = &'a String>) -> String {
    items.map(String::as_str).collect::<Vec<_>>().join(", ")
}
