mod api;
mod server;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use pawrank::config::PipelineConfig;
use pawrank::ranking::{InfluencerQuery, SortKey, SortOrder};
use pawrank::sources::FileSourceLoader;
use pawrank::{
    format_currency, format_float, format_number, format_percent, format_signed_percent,
    CanonicalInfluencer, Dashboard, Pipeline,
};

#[derive(Parser)]
#[command(
    name = "pawrank",
    about = "Pet influencer analytics: reconcile sources, derive metrics, rank"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the ranked influencer list.
    Rank(RankArgs),
    /// Show one influencer with analytics and content profile.
    Show(ShowArgs),
    /// Serve the read-only JSON API.
    Serve(ServeArgs),
    /// Print (or write) the effective configuration.
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct RankArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    tier: Option<String>,
    #[arg(long)]
    partner_type: Option<String>,
    #[arg(long)]
    platform: Option<String>,
    #[arg(long, default_value = "rank")]
    sort_by: String,
    #[arg(long, default_value = "asc")]
    order: String,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct ShowArgs {
    id: String,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    web_root: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Write the effective config to the config path.
    #[arg(long)]
    write: bool,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let (config, config_path) = PipelineConfig::load(cli.config)?;
    init_tracing(&config.logging.level)?;

    let command = cli.command.unwrap_or(Command::Rank(RankArgs {
        sort_by: "rank".to_string(),
        order: "asc".to_string(),
        ..RankArgs::default()
    }));

    match command {
        Command::Rank(args) => run_rank(args, &config),
        Command::Show(args) => run_show(args, &config),
        Command::Serve(args) => server::serve(args, config).await,
        Command::Config(args) => run_config(args, &config, config_path),
    }
}

fn build_dashboard(config: &PipelineConfig) -> Dashboard {
    let loader = FileSourceLoader::new(config.sources.clone());
    Pipeline::from_config(&config.identity).build(&loader)
}

fn run_rank(args: RankArgs, config: &PipelineConfig) -> Result<(), String> {
    let query = InfluencerQuery {
        search: args.search,
        tier: args.tier,
        partner_type: args.partner_type,
        platform: args.platform,
        sort_by: SortKey::from_str(&args.sort_by)
            .ok_or_else(|| format!("invalid sort key: {}", args.sort_by))?,
        order: SortOrder::from_str(&args.order)
            .ok_or_else(|| format!("invalid sort order: {}", args.order))?,
        limit: args.limit,
    };

    let dashboard = build_dashboard(config);
    let selected = dashboard.query(&query);

    if args.json {
        let payload = serde_json::to_string_pretty(&selected)
            .map_err(|err| format!("failed to serialize ranking: {}", err))?;
        println!("{}", payload);
        return Ok(());
    }

    if selected.is_empty() {
        println!("No influencers match (snapshot holds {}).", dashboard.len());
        return Ok(());
    }

    let overview = dashboard.overview();
    println!(
        "{} influencers | known followers {} | revenue {} | avg ER {} | rising {} / declining {}",
        overview.total_influencers,
        format_number(overview.known_followers as f64),
        format_currency(overview.total_revenue),
        format_percent(overview.avg_engagement_rate),
        overview.rising,
        overview.declining
    );
    println!();
    for influencer in selected {
        print_row(influencer);
    }
    Ok(())
}

fn print_row(influencer: &CanonicalInfluencer) {
    let followers = influencer
        .follower_count
        .map(|count| format_number(count as f64))
        .unwrap_or_else(|| "unknown".to_string());
    println!(
        "{:>3}. {:<28} {:<10} followers {:>10} | ER {:>6} | trend {} {} | {}",
        influencer.rank,
        influencer.id,
        influencer.platform,
        followers,
        format_percent(influencer.engagement_rate),
        influencer.trend.label(),
        format_signed_percent(influencer.trend_delta),
        influencer.rank_category.label()
    );
}

fn run_show(args: ShowArgs, config: &PipelineConfig) -> Result<(), String> {
    let dashboard = build_dashboard(config);
    let influencer = dashboard
        .find(&args.id)
        .ok_or_else(|| format!("influencer not found: {}", args.id))?;
    let report = dashboard.analytics(&influencer.id).unwrap_or_default();
    let content = dashboard
        .content_profile(Some(&influencer.id))
        .unwrap_or_default();

    if args.json {
        let payload = serde_json::json!({
            "influencer": influencer,
            "analytics": report,
            "content": content,
        });
        let text = serde_json::to_string_pretty(&payload)
            .map_err(|err| format!("failed to serialize influencer: {}", err))?;
        println!("{}", text);
        return Ok(());
    }

    println!(
        "#{} {} ({})",
        influencer.rank, influencer.display_name, influencer.id
    );
    if let Some(pet) = influencer.pet_name.as_deref() {
        println!("Pet: {}", pet);
    }
    if let Some(location) = influencer.location() {
        println!("Location: {}", location);
    }
    println!(
        "Platform: {} | tier {} | partner {}",
        influencer.platform,
        influencer.tier.as_deref().unwrap_or("-"),
        influencer.partner_type.as_deref().unwrap_or("-")
    );
    println!(
        "Followers: {}",
        influencer
            .follower_count
            .map(|count| format_number(count as f64))
            .unwrap_or_else(|| "unknown".to_string())
    );
    println!(
        "Rate {} | ER {} | impressions {} | revenue {}",
        format_currency(influencer.rate),
        format_percent(influencer.engagement_rate),
        format_number(influencer.content_impressions),
        format_currency(influencer.total_revenue)
    );
    println!(
        "ROAS {} | AOV {} | CPE {} | CPV {}",
        format_float(influencer.roas, 2),
        format_float(influencer.aov, 2),
        format_float(influencer.cpe, 2),
        format_float(influencer.cpv, 2)
    );

    match influencer.prediction.as_ref() {
        Some(prediction) => {
            println!(
                "Forecast: ER {} -> {} ({}), views {} -> {}, confidence {}, {}",
                format_percent(prediction.current_engagement_rate),
                format_percent(prediction.predicted_engagement_rate),
                format_signed_percent(prediction.engagement_growth),
                format_number(prediction.current_views),
                format_number(prediction.predicted_views),
                prediction.confidence.label(),
                prediction.growth_category
            );
            if prediction.growth_baseline_missing {
                println!("  (no current engagement baseline; growth reported as 0)");
            }
        }
        None => println!("Forecast: none"),
    }

    if !influencer.posts.is_empty() {
        println!("\nCampaign posts:");
        for post in &influencer.posts {
            println!(
                "- {} {} {} | impressions {} | revenue {}",
                post.post_date,
                post.campaign,
                post.content_type,
                format_number(post.impressions),
                format_currency(post.revenue)
            );
        }
    }

    if report.summary.post_count > 0 {
        println!(
            "\nOrganic posts: {} | views {} | avg ER {}",
            report.summary.post_count,
            format_number(report.summary.total_views),
            format_percent(report.summary.avg_engagement_rate)
        );
        for point in &report.monthly {
            println!(
                "  {} posts {} views {} ER {}",
                point.month,
                point.posts,
                format_number(point.views),
                format_percent(point.avg_engagement_rate)
            );
        }
    }

    if content.post_count > 0 {
        println!(
            "\nContent: trust score {} | quality {} | music {}% | close-up hooks {}%",
            format_float(content.trust.trust_score, 0),
            format_float(content.quality.overall, 1),
            format_float(content.audio.music_share, 0),
            format_float(content.visual.close_up_hook_share, 0)
        );
        let emotions: Vec<&str> = content
            .emotions
            .iter()
            .map(|share| share.name.as_str())
            .collect();
        if !emotions.is_empty() {
            println!("Top emotions: {}", emotions.join(", "));
        }
    }

    Ok(())
}

fn run_config(
    args: ConfigArgs,
    config: &PipelineConfig,
    config_path: Option<PathBuf>,
) -> Result<(), String> {
    if args.write {
        let path = config_path.unwrap_or_else(|| PathBuf::from("config/pawrank.toml"));
        config.write(&path)?;
        println!("Wrote config to {}", path.display());
        return Ok(());
    }
    let payload = toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config: {}", err))?;
    print!("{}", payload);
    Ok(())
}

fn init_tracing(level: &str) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|err| format!("invalid log level {}: {}", level, err))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
