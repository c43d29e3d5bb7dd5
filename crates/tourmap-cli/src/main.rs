mod feed;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tourmap_core::{AreaCode, ContentType, SortMode};
use tourmap_feed::{FeedController, FilterState, ListingSource};
use tourmap_tourapi::TourApiClient;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tourmap-cli")]
#[command(about = "Browse TourAPI listings from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List records for a region
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Search records by keyword
    Search {
        /// Keyword to search for
        keyword: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show the pet policy for one record
    Pet {
        /// Content id of the record
        content_id: String,
    },
    /// List the region and category codes accepted by the filters
    Codes,
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Area code or Korean region name (e.g., 1 or 서울)
    #[arg(long)]
    region: Option<AreaCode>,
    /// Content type code or name; repeat to select several
    #[arg(long = "category")]
    categories: Vec<ContentType>,
    /// Result order: default, name, or latest
    #[arg(long, default_value = "default")]
    sort: SortMode,
    /// Only show records that allow pets
    #[arg(long)]
    pets: bool,
    /// Pet size tag to require (e.g., 소형); implies --pets
    #[arg(long = "size")]
    sizes: Vec<String>,
    /// Number of pages to load
    #[arg(long, default_value = "1")]
    pages: u32,
    /// Print records as JSON lines instead of a table
    #[arg(long)]
    json: bool,
}

impl FilterArgs {
    fn filter_state(&self) -> FilterState {
        let mut filter = FilterState {
            region: self.region.clone(),
            categories: self.categories.iter().copied().collect(),
            sort: self.sort,
            ..FilterState::default()
        };
        if self.pets || !self.sizes.is_empty() {
            filter = filter.with_pets(self.sizes.iter().cloned());
        }
        filter
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if matches!(cli.command, Commands::Codes) {
        feed::print_codes();
        return Ok(());
    }

    let config = tourmap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = Arc::new(TourApiClient::from_config(&config)?);

    match cli.command {
        Commands::List { filter } => {
            let source: Arc<dyn ListingSource> = client;
            let controller = FeedController::from_config(source, &config);
            feed::run_feed(&controller, &filter.filter_state(), None, filter.pages, filter.json)
                .await?;
        }
        Commands::Search { keyword, filter } => {
            let source: Arc<dyn ListingSource> = client;
            let controller = FeedController::from_config(source, &config);
            feed::run_feed(
                &controller,
                &filter.filter_state(),
                Some(keyword),
                filter.pages,
                filter.json,
            )
            .await?;
        }
        Commands::Pet { content_id } => feed::run_pet(&client, &content_id).await?,
        Commands::Codes => feed::print_codes(),
    }

    Ok(())
}
