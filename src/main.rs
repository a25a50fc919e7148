use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use adinsights::config::ApiConfig;
use adinsights::external::marketing_api::{MarketingApiClient, DEFAULT_BREAKDOWNS};
use adinsights::logging::{init_logging, LoggingConfig};
use adinsights::models::MetricRecord;
use adinsights::services::report_writer;
use adinsights::services::reshaper::{self, HourlyInputs};

#[derive(Parser, Debug)]
#[command(name = "adinsights")]
#[command(about = "Fetch and align Graph API marketing insights", long_about = None)]
#[command(after_help = "Credentials come from ACCESS_TOKEN and ACCOUNT_ID (a .env file is honoured).")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Campaigns of the ad account whose name contains FILTER
    Campaigns { filter: String },

    /// Ad sets of a campaign
    Adsets { campaign_id: String },

    /// Daily rows over an explicit date range
    Daily {
        entity_id: String,
        #[arg(long)]
        since: NaiveDate,
        #[arg(long)]
        until: NaiveDate,
        #[arg(long, default_value = "impressions")]
        stat: String,
    },

    /// Lifetime aggregate for an entity
    Total {
        entity_id: String,
        #[arg(long, default_value = "reach")]
        stat: String,
    },

    /// Hourly metric of several entities aligned on one timeline
    Hourly {
        #[arg(long = "entity", required = true)]
        entities: Vec<String>,
        /// Column names; defaults to the entity ids
        #[arg(long = "legend")]
        legends: Vec<String>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, default_value = "impressions")]
        stat: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Hourly action totals of several entities aligned on one timeline
    Actions {
        #[arg(long = "entity", required = true)]
        entities: Vec<String>,
        #[arg(long = "legend")]
        legends: Vec<String>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Impressions, actions, spend, ctr and bid joined per entity
    Full {
        #[arg(long = "entity", required = true)]
        entities: Vec<String>,
        /// One bid per entity, in the same order
        #[arg(long = "bid", required = true)]
        bids: Vec<f64>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Directory receiving one `<entity>.csv` per entity
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Impressions per age bucket for several entities
    Age {
        #[arg(long = "entity", required = true)]
        entities: Vec<String>,
        #[arg(long = "name")]
        names: Vec<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Lifetime rows split by breakdown dimensions
    Breakdown {
        entity_id: String,
        #[arg(long, default_value = "reach")]
        stat: String,
        #[arg(long, default_value = DEFAULT_BREAKDOWNS)]
        breakdowns: String,
    },

    /// Cells of an ad study
    Study { ad_study_id: String },

    /// Approximate size of a custom audience
    Audience { audience_id: String },

    /// Lifetime ad-level summary
    AdLevel { ad_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let logging = LoggingConfig::from_env().with_verbose(cli.verbose);
    init_logging(logging).map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let client = MarketingApiClient::new(ApiConfig::from_env());

    match cli.command {
        Command::Campaigns { filter } => print_json(&client.get_campaigns_by_name(&filter).await),
        Command::Adsets { campaign_id } => print_json(&client.get_adsets_by_campaign_id(&campaign_id).await),
        Command::Daily { entity_id, since, until, stat } => {
            print_json(&client.get_stat_per_day(&entity_id, since, until, &stat).await)
        }
        Command::Total { entity_id, stat } => print_json(&client.get_adset_total_stat(&entity_id, &stat).await),
        Command::Hourly { entities, legends, start, end, stat, out } => {
            let raw = fetch_hourly(&client, &entities, start, end, &stat).await;
            let series = reshaper::extract_hourly_stat(&raw, &stat)?;
            let legends = legends_or_ids(legends, &entities)?;
            match out {
                Some(path) => report_writer::write_comparison_file(&path, &legends, &series)?,
                None => report_writer::write_comparison(std::io::stdout(), &legends, &series)?,
            }
            Ok(())
        }
        Command::Actions { entities, legends, start, end, out } => {
            let raw = fetch_hourly(&client, &entities, start, end, "actions").await;
            let series = reshaper::extract_hourly_actions(&raw)?;
            let legends = legends_or_ids(legends, &entities)?;
            match out {
                Some(path) => report_writer::write_comparison_file(&path, &legends, &series)?,
                None => report_writer::write_comparison(std::io::stdout(), &legends, &series)?,
            }
            Ok(())
        }
        Command::Full { entities, bids, start, end, out_dir } => {
            let inputs = HourlyInputs {
                impressions: fetch_hourly(&client, &entities, start, end, "impressions").await,
                actions: fetch_hourly(&client, &entities, start, end, "actions").await,
                spend: fetch_hourly(&client, &entities, start, end, "spend").await,
                ctr: fetch_hourly(&client, &entities, start, end, "ctr").await,
                bids,
            };
            let tables = reshaper::extract_full_hourly_data(&inputs)?;
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;
            for (entity, table) in entities.iter().zip(&tables) {
                let path = out_dir.join(format!("{}.csv", entity));
                report_writer::write_aligned_table_file(&path, table)
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!("Wrote {} rows for {} to {}", table.len(), entity, path.display());
            }
            Ok(())
        }
        Command::Age { entities, names, out } => {
            let mut raw = Vec::with_capacity(entities.len());
            for entity in &entities {
                raw.push(client.get_stat_by_breakdown(entity, "impressions", "age").await);
            }
            let names = legends_or_ids(names, &entities)?;
            let breakdown = reshaper::aggregate_age_breakdown(&raw, &names)?;
            match out {
                Some(path) => report_writer::write_age_breakdown_file(&path, &breakdown)?,
                None => report_writer::write_age_breakdown(std::io::stdout(), &breakdown)?,
            }
            Ok(())
        }
        Command::Breakdown { entity_id, stat, breakdowns } => {
            print_json(&client.get_stat_by_breakdown(&entity_id, &stat, &breakdowns).await)
        }
        Command::Study { ad_study_id } => print_json(&client.get_ad_study(&ad_study_id).await),
        Command::Audience { audience_id } => print_json(&client.get_custom_audience_size(&audience_id).await),
        Command::AdLevel { ad_id } => print_json(&client.get_ad_level_data(&ad_id).await),
    }
}

async fn fetch_hourly(
    client: &MarketingApiClient,
    entities: &[String],
    start: NaiveDate,
    end: NaiveDate,
    stat: &str,
) -> Vec<Vec<MetricRecord>> {
    let mut raw = Vec::with_capacity(entities.len());
    for entity in entities {
        raw.push(client.get_hourly_stat(start, end, entity, stat).await);
    }
    raw
}

fn legends_or_ids(legends: Vec<String>, entities: &[String]) -> anyhow::Result<Vec<String>> {
    if legends.is_empty() {
        return Ok(entities.to_vec());
    }
    if legends.len() != entities.len() {
        anyhow::bail!("{} labels given for {} entities", legends.len(), entities.len());
    }
    Ok(legends)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
