//! `cursus`: synchronise and query the academic-records store.
//!
//! Reads `cursus.toml` (or the path given with `--config`) layered under
//! `CURSUS_*` environment variables, opens the SQLite store, and runs one
//! subcommand.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use cursus_api::{ApiConfig, AppState};
use cursus_core::{
  reference::Rhythm,
  stats::SyncStats,
  store::{AcademicStore, CohortQuery, StudentHistory},
};
use cursus_scodoc::ScoDocClient;
use cursus_store_sqlite::SqliteStore;
use cursus_sync::{FilesSource, ScoDocSource};
use settings::{Settings, expand_tilde};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cursus", version, about = "Academic-records synchronisation with ScoDoc")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "cursus.toml")]
  config: PathBuf,

  /// SQLite database path (overrides `database_path`).
  #[arg(long, value_name = "FILE")]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Serve the JSON API.
  Serve {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
  },
  /// Run one synchronisation.
  Sync {
    #[command(subcommand)]
    source: SyncSource,
  },
  /// Report whether the store is populated.
  Status,
  /// List the enrollments of a cohort.
  Cohort {
    /// Year the cohort started its first program year.
    #[arg(long)]
    year: i32,
    /// Department acronym.
    #[arg(long)]
    department: Option<String>,
    /// `FI` or `FA`.
    #[arg(long)]
    rhythm: Option<String>,
  },
  /// Show one student's enrollments and competency evaluations.
  Student {
    /// National student identifier.
    ine: String,
  },
}

#[derive(Subcommand, Debug)]
enum SyncSource {
  /// Import a directory of JSON exports.
  Files {
    /// Export directory (overrides `json_dir`).
    #[arg(long)]
    dir: Option<PathBuf>,
  },
  /// Import from the ScoDoc API.
  Scodoc {
    #[arg(long)]
    from_year: Option<i32>,
    #[arg(long)]
    to_year: Option<i32>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = settings::load(&cli.config)?;

  let database = expand_tilde(cli.database.as_deref().unwrap_or(&settings.database_path));
  let store = SqliteStore::open(&database)
    .await
    .with_context(|| format!("failed to open store at {database:?}"))?;

  match cli.command {
    Command::Serve { host, port } => serve(store, settings, host, port).await,
    Command::Sync { source: SyncSource::Files { dir } } => {
      let dir = expand_tilde(dir.as_deref().unwrap_or(&settings.json_dir));
      let sync = settings.sync.to_settings();
      let source = FilesSource::new(dir, sync.rules.clone());
      let stats = cursus_sync::run(&store, &source, &sync).await?;
      print_stats(&stats);
      Ok(())
    }
    Command::Sync { source: SyncSource::Scodoc { from_year, to_year } } => {
      let client = scodoc_client(&settings)?
        .context("no [scodoc] section configured")?;
      let sync = settings.sync.to_settings();
      let source = ScoDocSource::new(&client).with_years(
        from_year.or(settings.sync.first_year),
        to_year.or(settings.sync.last_year),
      );
      let stats = cursus_sync::run(&store, &source, &sync).await?;
      print_stats(&stats);
      Ok(())
    }
    Command::Status => status(&store).await,
    Command::Cohort { year, department, rhythm } => {
      let rhythm = match rhythm.as_deref() {
        None => None,
        Some(raw) => match Rhythm::from_acronym(raw) {
          Some(rhythm) => Some(rhythm),
          None => bail!("unknown rhythm {raw:?}; expected FI or FA"),
        },
      };
      let department = department.map(|d| d.trim().to_uppercase());
      let query = CohortQuery { start_year: year, department, rhythm };
      cohort(&store, &query).await
    }
    Command::Student { ine } => student(&store, &ine).await,
  }
}

fn scodoc_client(settings: &Settings) -> anyhow::Result<Option<ScoDocClient>> {
  let Some(config) = settings.scodoc.clone() else {
    return Ok(None);
  };
  if config.api_token.is_empty() {
    tracing::warn!("ScoDoc API token not configured");
  }
  let client = ScoDocClient::new(config).context("failed to build ScoDoc client")?;
  Ok(Some(client))
}

async fn serve(
  store: SqliteStore,
  settings: Settings,
  host: Option<String>,
  port: Option<u16>,
) -> anyhow::Result<()> {
  let state = AppState {
    store:  Arc::new(store),
    scodoc: scodoc_client(&settings)?.map(Arc::new),
    config: Arc::new(ApiConfig {
      json_dir:           expand_tilde(&settings.json_dir),
      first_year:         settings.sync.first_year,
      last_year:          settings.sync.last_year,
      sync:               settings.sync.to_settings(),
      hidden_departments: settings.server.hidden_departments.clone(),
    }),
  };

  let app = cursus_api::router(state);
  let address = format!(
    "{}:{}",
    host.unwrap_or_else(|| settings.server.host.clone()),
    port.unwrap_or(settings.server.port)
  );

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

fn print_stats(stats: &SyncStats) {
  for (category, count) in stats.counts() {
    println!("{category:<16} {count}");
  }
  if !stats.errors.is_empty() {
    println!("\n{} error(s):", stats.errors.len());
    for error in &stats.errors {
      println!("  - {error}");
    }
  }
}

async fn status(store: &SqliteStore) -> anyhow::Result<()> {
  let readiness = store.readiness().await.context("failed to read store status")?;
  println!(
    "{} ({} departments, {} enrollments)",
    if readiness.ready { "ready" } else { "not ready" },
    readiness.departments,
    readiness.enrollments,
  );
  if !readiness.ready {
    return Ok(());
  }

  let departments = store.list_departments().await?;
  let acronyms: Vec<_> = departments.iter().map(|d| d.acronym.as_str()).collect();
  println!("departments: {}", acronyms.join(", "));

  let years = store.list_academic_years().await?;
  let years: Vec<_> = years.iter().map(i32::to_string).collect();
  println!("academic years: {}", years.join(", "));
  Ok(())
}

async fn cohort(store: &SqliteStore, query: &CohortQuery) -> anyhow::Result<()> {
  let rows = store.search_cohort(query).await.context("cohort search failed")?;
  println!(
    "{:<16} {:>6} {:>4} {:<10} {:<10} {}",
    "INE", "YEAR", "BUT", "DEPT", "RHYTHM", "DECISION"
  );
  for row in &rows {
    println!(
      "{:<16} {:>6} {:>4} {:<10} {:<10} {}",
      row.ine,
      row.academic_year,
      row.program_year,
      row.department,
      row.rhythm,
      row.decision.as_deref().unwrap_or("-"),
    );
  }
  println!("{} row(s)", rows.len());
  Ok(())
}

async fn student(store: &SqliteStore, ine: &str) -> anyhow::Result<()> {
  let Some(history) = store.student_history(ine).await.context("student lookup failed")? else {
    bail!("no student with INE {ine:?}");
  };
  print_history(&history);
  Ok(())
}

fn print_history(history: &StudentHistory) {
  println!("{}", history.ine);
  for e in &history.enrollments {
    println!(
      "  {} BUT{} {} {} [{}] {}",
      e.academic_year,
      e.program_year,
      e.department,
      e.rhythm,
      e.state,
      e.decision.as_deref().unwrap_or("-"),
    );
    for ev in &e.evaluations {
      let average = ev.average.map_or_else(|| "-".to_owned(), |a| format!("{a:.2}"));
      println!(
        "    {}/{:<4} {:<6} {:>6}  {}",
        ev.parcours,
        ev.competency,
        ev.decision.as_deref().unwrap_or("-"),
        average,
        ev.label,
      );
    }
  }
}
