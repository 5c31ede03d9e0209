use anyhow::{anyhow, Context, Result};
use betfair_rpc::config::{BetfairConfig, APP_KEY_ENV};
use betfair_rpc::dto::{
    Event, MarketBook, MarketCatalogue, MarketFilter, MarketProjection, MatchProjection,
    OrderProjection, PriceData, PriceProjection, TimeGranularity, TimeRange,
};
use betfair_rpc::{BettingApi, Config, JsonRpcClient};
use chrono::{Duration, SecondsFormat, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

const PREMIER_LEAGUE: &str = "10932509";
const SOCCER: &str = "1";

#[derive(Parser)]
#[command(name = "betfair")]
#[command(about = "Betfair Exchange JSON-RPC CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with a client certificate and run one betting operation
    Test {
        /// Root CA bundle the Betfair server certificate is verified against
        #[arg(long)]
        root_ca_path: Option<String>,
        /// Client certificate registered with the Betfair account
        #[arg(long)]
        cert_path: String,
        /// Private key for the client certificate
        #[arg(long)]
        key_path: String,
        /// Betfair account username
        #[arg(long, default_value = "")]
        user: String,
        /// Betfair account password
        #[arg(long, default_value = "")]
        password: String,
        /// Operation to query
        #[arg(long, value_enum)]
        operation: Operation,
    },
}

#[derive(Clone, Copy, ValueEnum)]
#[value(rename_all = "lower")]
enum Operation {
    ListEventTypes,
    ListCompetitions,
    ListTimeRanges,
    ListEvents,
    ListMarketTypes,
    ListCountries,
    ListVenues,
    ListMarketCatalogue,
    ListMarketBook,
    ListRunnerBook,
    ListCurrentOrders,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Test {
            root_ca_path,
            cert_path,
            key_path,
            user,
            password,
            operation,
        } => {
            let api_key = std::env::var(APP_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| anyhow!("{APP_KEY_ENV} must be set"))?;
            let config = Config {
                betfair: BetfairConfig {
                    username: user,
                    password,
                    api_key,
                    cert_path,
                    key_path,
                    root_ca_path,
                    login_url: None,
                    api_url: None,
                    timeout_secs: None,
                },
            };
            run(config, operation).await
        }
    }
}

async fn run(config: Config, operation: Operation) -> Result<()> {
    let api = BettingApi::new(JsonRpcClient::new(config)?);

    info!("Logging in to Betfair...");
    api.authenticate().await?;

    match operation {
        Operation::ListEventTypes => {
            let filter = MarketFilter {
                event_type_ids: Some(vec!["1".to_string(), "2".to_string()]),
                ..Default::default()
            };
            println!("Event Types returned...");
            for result in api.list_event_types(&filter).await? {
                println!(
                    "Event Type ID {}, Name {}, Number of Markets {}",
                    result.event_type.id, result.event_type.name, result.market_count
                );
            }
        }
        Operation::ListCompetitions => {
            let filter = MarketFilter {
                text_query: Some("Premier League".to_string()),
                ..Default::default()
            };
            println!("Competitions returned...");
            for result in api.list_competitions(&filter).await? {
                println!(
                    "Competition ID {}, Name {}, Number of Markets {}, Region {}",
                    result.competition.id,
                    result.competition.name,
                    result.market_count,
                    result.competition_region.as_deref().unwrap_or("-")
                );
            }
        }
        Operation::ListTimeRanges => {
            let from = Utc::now();
            let to = from + Duration::hours(72);
            let ranges = api
                .list_time_ranges(
                    Some(from),
                    Some(to),
                    &MarketFilter::default(),
                    TimeGranularity::Days,
                )
                .await?;
            println!("Number of Markets for each day returned...");
            for result in ranges {
                println!(
                    "From {}, To {}, Number of Markets {}",
                    result.time_range.from.as_deref().unwrap_or("-"),
                    result.time_range.to.as_deref().unwrap_or("-"),
                    result.market_count
                );
            }
        }
        Operation::ListEvents => {
            let filter = MarketFilter {
                event_type_ids: Some(vec![SOCCER.to_string()]),
                ..fixtures_next_week()
            };
            println!("Premier League Fixtures in next 7 days");
            for result in api.list_events(&filter).await? {
                println!(
                    "Event ID {}, Fixture {}, Start Time {}, Number of Markets {}",
                    result.event.id,
                    result.event.name,
                    result.event.open_date.as_deref().unwrap_or("-"),
                    result.market_count
                );
            }
        }
        Operation::ListMarketTypes => {
            let event = next_fixture(&api).await?;
            let filter = MarketFilter {
                event_ids: Some(vec![event.id.clone()]),
                ..Default::default()
            };
            println!("Markets for fixture {}", event.name);
            for result in api.list_market_types(&filter).await? {
                println!(
                    "Market {}, Number of Markets {}",
                    result.market_type, result.market_count
                );
            }
        }
        Operation::ListCountries => {
            println!("Countries and number of Markets");
            for result in api.list_countries(&MarketFilter::default()).await? {
                println!(
                    "Country Code {}, Number of Markets {}",
                    result.country_code, result.market_count
                );
            }
        }
        Operation::ListVenues => {
            let filter = MarketFilter {
                market_countries: Some(vec!["GB".to_string()]),
                ..Default::default()
            };
            println!("Racing Venues today");
            for result in api.list_venues(&filter).await? {
                println!(
                    "Venue {}, Number of Markets {}",
                    result.venue, result.market_count
                );
            }
        }
        Operation::ListMarketCatalogue => {
            let event = next_fixture(&api).await?;
            let catalogue = match_odds(&api, &event).await?;
            println!(
                "Selections for {} market in fixture {} ({})",
                catalogue.market_name, event.name, catalogue.market_id
            );
            for runner in &catalogue.runners {
                println!(
                    "Selection ID {}, Selection {}",
                    runner.selection_id, runner.runner_name
                );
            }
        }
        Operation::ListMarketBook => {
            let event = next_fixture(&api).await?;
            let catalogue = match_odds(&api, &event).await?;
            let books = api
                .list_market_book(
                    vec![catalogue.market_id.clone()],
                    Some(best_offers()),
                    Some(OrderProjection::Executable),
                    Some(MatchProjection::RolledUpByAvgPrice),
                )
                .await?;
            println!("Market Book for match odds for fixture {}", event.name);
            print_books(&catalogue, &books);
        }
        Operation::ListRunnerBook => {
            let event = next_fixture(&api).await?;
            let catalogue = match_odds(&api, &event).await?;
            let runner = catalogue
                .runners
                .first()
                .context("market has no selections")?;
            let books = api
                .list_runner_book(
                    &catalogue.market_id,
                    runner.selection_id,
                    Some(best_offers()),
                    Some(OrderProjection::Executable),
                    Some(MatchProjection::RolledUpByAvgPrice),
                )
                .await?;
            println!("Runner Book for match odds for fixture {}", event.name);
            print_books(&catalogue, &books);
        }
        Operation::ListCurrentOrders => {
            let report = api.list_current_orders(None).await?;
            println!("Current orders ({})", report.current_orders.len());
            for order in &report.current_orders {
                println!(
                    "Bet ID {}, Market {}, Selection {}, {:?} {} @ {}, Status {:?}",
                    order.bet_id,
                    order.market_id,
                    order.selection_id,
                    order.side,
                    order.price_size.size,
                    order.price_size.price,
                    order.status
                );
            }
            if report.more_available {
                println!("More orders available...");
            }
        }
    }

    Ok(())
}

/// Premier League matches starting within the next week.
fn fixtures_next_week() -> MarketFilter {
    let to = (Utc::now() + Duration::days(7)).to_rfc3339_opts(SecondsFormat::Secs, true);
    MarketFilter {
        competition_ids: Some(vec![PREMIER_LEAGUE.to_string()]),
        market_start_time: Some(TimeRange {
            from: None,
            to: Some(to),
        }),
        ..Default::default()
    }
}

async fn next_fixture(api: &BettingApi) -> Result<Event> {
    api.list_events(&fixtures_next_week())
        .await?
        .into_iter()
        .next()
        .map(|result| result.event)
        .context("no fixtures in the next 7 days")
}

async fn match_odds(api: &BettingApi, event: &Event) -> Result<MarketCatalogue> {
    let filter = MarketFilter {
        event_ids: Some(vec![event.id.clone()]),
        market_type_codes: Some(vec!["MATCH_ODDS".to_string()]),
        ..Default::default()
    };
    api.list_market_catalogue(&filter, 1, vec![MarketProjection::RunnerMetadata])
        .await?
        .into_iter()
        .next()
        .with_context(|| format!("no match odds market for {}", event.name))
}

fn best_offers() -> PriceProjection {
    PriceProjection::new(vec![PriceData::ExBestOffers])
}

fn print_books(catalogue: &MarketCatalogue, books: &[MarketBook]) {
    let Some(book) = books.first() else {
        println!("No book returned");
        return;
    };

    for runner in &book.runners {
        let name = catalogue
            .runner_name(runner.selection_id)
            .unwrap_or("Selection Not Found");
        println!("\n{}", "=".repeat(45));
        println!("Prices for selection {name}");
        println!("{}", "-".repeat(45));
        println!("{:^21} | {:^21}", "AVAILABLE TO BACK", "AVAILABLE TO LAY");
        println!("{:^10} {:^10} | {:^10} {:^10}", "Odds", "Amount", "Odds", "Amount");
        println!("{}", "-".repeat(45));

        let Some(ex) = runner.ex.as_ref() else {
            continue;
        };
        let depth = ex.available_to_back.len().max(ex.available_to_lay.len());
        for i in 0..depth {
            let back = ex
                .available_to_back
                .get(i)
                .map(|level| format!("{:>10.2} {:>10.2}", level.price, level.size))
                .unwrap_or_else(|| " ".repeat(21));
            let lay = ex
                .available_to_lay
                .get(i)
                .map(|level| format!("{:>10.2} {:>10.2}", level.price, level.size))
                .unwrap_or_else(|| " ".repeat(21));
            println!("{back} | {lay}");
        }
    }
}
