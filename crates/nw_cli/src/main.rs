use std::net::SocketAddr;

use clap::Parser;
use tracing::{info, Level};

use nw_client::client::GENERIC_ERROR;
use nw_client::{NewsQuery, QueryClient, QueryState};
use nw_core::Category;
use nw_proxy::ProxyConfig;
use nw_web::AppState;

mod render;

const DEFAULT_SERVER: &str = "http://localhost:5000";

#[derive(Parser, Debug)]
#[command(author, version, about = "News proxy server and terminal reader", long_about = None)]
pub struct Cli {
    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: Level,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the news proxy
    Serve {
        #[arg(long, env = "NW_BIND", default_value = "0.0.0.0:5000")]
        bind: SocketAddr,
        /// Override the upstream news API base URL
        #[arg(long)]
        upstream_url: Option<String>,
    },
    /// Show the top headlines
    Headlines {
        #[command(flatten)]
        reader: ReaderArgs,
    },
    /// Show one category feed (technology, business, sports, entertainment, health, science)
    Category {
        category: String,
        #[command(flatten)]
        reader: ReaderArgs,
    },
    /// Search all news
    Search {
        query: String,
        #[command(flatten)]
        reader: ReaderArgs,
    },
}

#[derive(clap::Args, Debug)]
struct ReaderArgs {
    /// Base URL of a running proxy
    #[arg(long, default_value = DEFAULT_SERVER)]
    server: String,
    /// How many times to retry a failed request
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

fn init_logging(level: Level) {
    if !tracing::dispatcher::has_been_set() {
        tracing_subscriber::fmt().with_max_level(level).init();
    }
}

async fn read(reader: ReaderArgs, query: NewsQuery, title: &str, empty_message: &str) -> anyhow::Result<()> {
    let client = QueryClient::new(&reader.server)?;
    let mut entry = client.fetch(&query).await;

    let mut attempts = 0;
    while entry.state == QueryState::Error && attempts < reader.retries {
        attempts += 1;
        info!("🔁 Retrying {} ({}/{})", query.key(), attempts, reader.retries);
        entry = client.retry(&query).await;
    }

    if entry.state == QueryState::Error {
        anyhow::bail!(
            "Something went wrong: {}",
            entry.error.as_deref().unwrap_or(GENERIC_ERROR)
        );
    }

    let title = match (&query, &entry.data) {
        (NewsQuery::Search(_), Some(data)) => format!("{} ({} results)", title, data.total_results),
        _ => title.to_string(),
    };
    print!("{}", render::entry(&title, &entry, empty_message));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Commands::Serve { bind, upstream_url } => {
            let mut config = ProxyConfig::from_env()?;
            if let Some(url) = upstream_url {
                config = config.with_base_url(&url)?;
            }
            info!("🌐 Upstream news API at {}", config.base_url);
            let proxy = nw_proxy::create_service(config)?;
            nw_web::serve(bind, AppState::new(proxy)).await?;
        }
        Commands::Headlines { reader } => {
            read(reader, NewsQuery::TopHeadlines, "Top Headlines", render::DEFAULT_EMPTY).await?;
        }
        Commands::Category { category, reader } => {
            let Some(query) = NewsQuery::category(&category) else {
                let names: Vec<_> = Category::ALL.iter().map(Category::as_str).collect();
                anyhow::bail!("Invalid category '{}'. Choose one of: {}", category, names.join(", "));
            };
            let title = format!("{} News", category);
            let empty = format!("No {} articles found. Check back later for updates.", category);
            read(reader, query, &title, &empty).await?;
        }
        Commands::Search { query, reader } => {
            let Some(search) = NewsQuery::search(&query) else {
                anyhow::bail!("Search query is required");
            };
            let title = format!("Search Results for \"{}\"", query.trim());
            let empty = format!(
                "No articles found for \"{}\". Try different keywords or browse by category.",
                query.trim()
            );
            read(reader, search, &title, &empty).await?;
        }
    }

    Ok(())
}
