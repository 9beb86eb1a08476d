use clap::{Parser, ValueEnum};
use series_heatmap::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_TOP_N, HeatmapRenderer, InteractiveSession,
    OmdbClient, Presenter, ScalePolicy, SeriesHeatmapError, SessionOptions,
};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Color scale selection on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScaleArg {
    /// Lowest to highest rating of the plotted series
    Observed,
    /// Always 5.0 to 9.5
    Fixed,
}

impl From<ScaleArg> for ScalePolicy {
    fn from(arg: ScaleArg) -> Self {
        match arg {
            ScaleArg::Observed => ScalePolicy::Observed,
            ScaleArg::Fixed => ScalePolicy::Fixed,
        }
    }
}

/// Search a TV series and plot its per-episode ratings as a season by episode heatmap.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Series to search for right away
    query: Option<String>,

    /// Plot the series with this IMDb id directly, skipping search
    #[arg(long = "id", value_name = "IMDB_ID", conflicts_with = "query")]
    series_id: Option<String>,

    /// OMDb API key
    #[arg(long, env = "OMDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Maximum number of raw search results to collect
    #[arg(long, default_value_t = 20)]
    max_results: usize,

    /// Number of ranked candidates to list
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top: usize,

    /// Delay between API requests in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// How the heatmap color scale is chosen
    #[arg(long, value_enum, default_value_t = ScaleArg::Observed)]
    scale: ScaleArg,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// API endpoint
    #[arg(long, default_value = DEFAULT_BASE_URL, hide = true)]
    base_url: String,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Validates the settings and wires up the interactive session.
fn build_session(cli: Cli) -> Result<InteractiveSession<OmdbClient>, SeriesHeatmapError> {
    let config = ClientConfig::validate(
        cli.api_key.as_deref(),
        &cli.base_url,
        Duration::from_millis(cli.delay_ms),
        Duration::from_secs(cli.timeout_secs),
    )?;
    let client = OmdbClient::from_config(config)?;

    let presenter = Presenter::new(Arc::new(client), cli.max_results, cli.top);
    let options = SessionOptions {
        initial_query: cli.query,
        series_id: cli.series_id,
        renderer: HeatmapRenderer::new(cli.scale.into(), !cli.no_color),
    };

    Ok(InteractiveSession::new(presenter, options))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // A missing key is the one fatal condition
    let mut session = match build_session(cli) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = session.run() {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
}
