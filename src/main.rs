use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ddg_search::config::CONFIG;
use ddg_search::data_models::{SearchRequest, SearchResult};
use ddg_search::extractor::html_to_search_results;
use ddg_search::relay::{ChannelBus, RuntimeMessage, web_search};
use ddg_search::retrieval::RetrievalClient;

#[derive(Parser, Debug)]
#[command(name = "ddg_search", about = "Fetch and normalize web search results")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query the retrieval API
    Api {
        #[command(flatten)]
        search: SearchArgs,
        /// Overrides RETRIEVAL_BASE_URL
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Extract results from a saved results page
    Scrape {
        file: PathBuf,
        #[arg(short, long)]
        num_results: Option<usize>,
    },
    /// Send the search through a background listener backed by the retrieval API
    Relay {
        #[command(flatten)]
        search: SearchArgs,
        #[arg(short, long)]
        num_results: Option<usize>,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    query: String,
    #[arg(long, default_value = "")]
    timerange: String,
    #[arg(long, default_value = "")]
    region: String,
}

impl From<SearchArgs> for SearchRequest {
    fn from(args: SearchArgs) -> SearchRequest {
        SearchRequest {
            query: args.query,
            timerange: args.timerange,
            region: args.region,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The fmt subscriber also picks up `log` records from the library.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .init();

    let results = match cli.command {
        Command::Api { search, base_url } => {
            let client = match base_url {
                Some(url) => RetrievalClient::new(&url)?,
                None => RetrievalClient::from_config()?,
            };
            client.search(&SearchRequest::from(search)).await?
        }
        Command::Scrape { file, num_results } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            html_to_search_results(&html, num_results.unwrap_or(CONFIG.num_results))
        }
        Command::Relay {
            search,
            num_results,
        } => relay(search.into(), num_results.unwrap_or(CONFIG.num_results)).await?,
    };

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

async fn relay(search: SearchRequest, num_results: usize) -> anyhow::Result<Vec<SearchResult>> {
    let client = RetrievalClient::from_config()?;
    let (bus, listener) = ChannelBus::new(8);

    tokio::spawn(listener.serve(move |message| {
        let client = client.clone();
        async move {
            match message {
                RuntimeMessage::GetSearchResults {
                    search,
                    num_results,
                } => client.search(&search).await.map(|mut results| {
                    results.truncate(num_results);
                    results
                }),
            }
        }
    }));

    let results = web_search(&bus, search, num_results)
        .await
        .context("relayed search failed")?;
    Ok(results)
}
