use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use releasewatch::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Verify the configured client credentials
    Auth,

    /// Search, follow and explore artists
    Artists(ArtistsOptions),

    /// New releases of followed artists
    Releases(ReleasesOptions),

    /// Client status and local state
    Info(InfoOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ArtistsOptions {
    #[command(subcommand)]
    pub command: ArtistsSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ArtistsSubcommand {
    /// Search the catalog for artists
    Search {
        query: String,
        /// Maximum number of results
        #[clap(long, default_value_t = 10)]
        limit: u32,
    },

    /// Follow an artist by Spotify ID
    Follow { id: String },

    /// Stop following an artist
    Unfollow { id: String },

    /// List followed artists
    List,

    /// Artists related to the given one
    Related { id: String },

    /// Artists recommended from the ones you follow
    Recommend {
        /// Number of recommended tracks to draw artists from
        #[clap(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(args_conflicts_with_subcommands = true)]
pub struct ReleasesOptions {
    /// Days to look back (1-14), defaults to RELEASE_LOOKBACK_DAYS
    #[clap(long)]
    pub days: Option<u32>,

    #[command(subcommand)]
    pub command: Option<ReleasesSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReleasesSubcommand {
    /// Latest releases of a single artist with track counts
    Artist {
        id: String,
        /// Maximum number of releases
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct InfoOptions {
    /// List the genres usable as recommendation seeds
    #[clap(long)]
    genres: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("releasewatch=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Artists(opt) => match opt.command {
            ArtistsSubcommand::Search { query, limit } => cli::search_artists(query, limit).await,
            ArtistsSubcommand::Follow { id } => cli::follow_artist(id).await,
            ArtistsSubcommand::Unfollow { id } => cli::unfollow_artist(id).await,
            ArtistsSubcommand::List => cli::list_artists().await,
            ArtistsSubcommand::Related { id } => cli::related_artists(id).await,
            ArtistsSubcommand::Recommend { limit } => cli::recommend_artists(limit).await,
        },
        Command::Releases(opt) => match opt.command {
            Some(ReleasesSubcommand::Artist { id, limit }) => cli::artist_releases(id, limit).await,
            None => cli::new_releases(opt.days).await,
        },
        Command::Info(opt) => cli::info(opt.genres).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
