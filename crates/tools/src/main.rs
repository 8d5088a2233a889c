use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use foundation::GeoBounds;
use futures_util::future::join_all;
use runtime::context::{FilterContext, Seniority, SenioritySelection};
use runtime::session::{DEFAULT_LIMIT, MapSession, SessionOptions};
use spatial::index::ClusterOptions;
use streaming::cache::RefinementOptions;
use streaming::service::{CountsSource, HttpCountsSource, HttpDedupService};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod input;

#[derive(Parser, Debug)]
#[command(author, version, about = "Job-count density map: clusters and exact totals")]
struct Cli {
    /// Base URL of the counts and dedup API
    #[arg(long, env = "JOBMAP_API_BASE", default_value = "http://localhost:8000")]
    api_base: String,

    /// Max rows per counts request
    #[arg(long, env = "JOBMAP_LIMIT", default_value_t = DEFAULT_LIMIT)]
    limit: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the markers for a viewport
    Clusters(ViewArgs),

    /// Like `clusters`, but resolve exact totals for every cluster first
    Refine {
        #[command(flatten)]
        view: ViewArgs,

        /// Seconds a resolved total stays fresh
        #[arg(long, default_value_t = 300)]
        freshness_secs: u64,
    },
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Viewport: west,south,east,north (degrees)
    #[arg(long, allow_hyphen_values = true)]
    bbox: GeoBounds,

    /// Map zoom (may be fractional)
    #[arg(long)]
    zoom: f64,

    /// Role preset keys, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    roles: Vec<String>,

    /// Seniority levels: entry, mid, senior or all
    #[arg(long, value_delimiter = ',')]
    seniority: Vec<Seniority>,

    /// Drop locations with fewer postings
    #[arg(long, env = "JOBMAP_MIN_TOTAL", default_value_t = 0)]
    min_total: u64,

    /// Read counts from a JSON file of role results instead of the API
    #[arg(long)]
    input: Option<PathBuf>,

    /// Cluster radius in pixels
    #[arg(long, default_value_t = 80.0)]
    radius_px: f64,

    /// Zoom above which locations are never clustered
    #[arg(long, default_value_t = 12)]
    max_zoom: u8,
}

impl ViewArgs {
    fn context(&self) -> FilterContext {
        for key in &self.roles {
            if aggregate::roles::preset(key).is_none() {
                warn!(role = %key, "unknown role preset; skipping");
            }
        }
        FilterContext::new(
            self.roles.clone(),
            SenioritySelection::from_levels(self.seniority.iter().copied()),
            self.min_total,
        )
    }

    fn counts_source(&self, api_base: &str) -> anyhow::Result<Arc<dyn CountsSource>> {
        Ok(match &self.input {
            Some(path) => Arc::new(input::FileCounts::load(path)?),
            None => Arc::new(HttpCountsSource::new(api_base)),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (view, refine, freshness) = match &cli.command {
        Command::Clusters(view) => (view, false, RefinementOptions::default().freshness),
        Command::Refine {
            view,
            freshness_secs,
        } => (view, true, Duration::from_secs(*freshness_secs)),
    };

    let options = SessionOptions {
        limit: cli.limit,
        cluster: ClusterOptions {
            radius_px: view.radius_px,
            max_zoom: view.max_zoom,
            ..ClusterOptions::default()
        },
        refinement: RefinementOptions { freshness },
    };
    let session = MapSession::new(
        view.counts_source(&cli.api_base)?,
        Arc::new(HttpDedupService::new(&cli.api_base)),
        options,
    );

    let generation = session.refresh(view.context()).await.context("loading counts")?;
    info!(generation, "counts loaded");

    if refine {
        let clusters = session.clusters(&view.bbox, view.zoom);
        let statuses = join_all(clusters.iter().map(|c| session.inspect(c))).await;
        for (cluster, status) in clusters.iter().zip(&statuses) {
            if let Some(message) = status.error() {
                warn!(cluster = ?cluster.id, %message, "refinement failed");
            }
        }
    }

    let markers = session.markers(&view.bbox, view.zoom);
    println!("{}", serde_json::to_string_pretty(&markers)?);
    Ok(())
}
