use anyhow::Result;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use ludex_core::{
    AppConfig, Database, LudexError, PairRepository, Repository, SqlitePairRepository,
    SqliteTitleRepository, Title, TitleRepository,
};
use ludex_dedup::{DedupConfig, DedupPipeline, GroupingMode};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "ludex",
    about = "Terminal game collection catalog with duplicate detection",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    #[arg(long, global = true)]
    json: bool,

    /// Owner of the catalog to operate on. Falls back to
    /// `default_owner` from config.
    #[arg(long, global = true)]
    owner: Option<Uuid>,
}

#[derive(Subcommand)]
enum Commands {
    /// Title management.
    Title {
        #[command(subcommand)]
        action: TitleAction,
    },

    /// Run one duplicate-detection pass over the owner's titles.
    Scan,

    /// Show duplicate groups as currently stored.
    Groups {
        /// Let dismissed pairs link titles together too.
        #[arg(long)]
        include_dismissed: bool,
    },

    /// Similarity pair management.
    Pair {
        #[command(subcommand)]
        action: PairAction,
    },

    /// Show catalog statistics.
    Stats,

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum TitleAction {
    /// Add a title to the catalog.
    Add {
        name: String,
        #[arg(long)]
        platform: Option<String>,
    },

    /// List the owner's titles.
    List,

    /// Remove a title. Its pairs disappear on the next scan.
    Remove { id: Uuid },
}

#[derive(Subcommand)]
enum PairAction {
    /// List the owner's stored similarity pairs.
    List {
        /// Only show dismissed pairs.
        #[arg(long)]
        dismissed: bool,
    },

    /// Mark a pair as not-a-duplicate. Rescans keep the flag.
    Dismiss { id: Uuid },

    /// Clear a pair's dismissal.
    Undismiss { id: Uuid },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config as TOML.
    Show,

    /// Print the config file path.
    Path,
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LUDEX_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Config { action } => run_config(action, &config),
        Commands::Version => {
            println!("ludex {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let db = Database::open(&config.database_path())?;
            run(command, &cli_owner(cli.owner, &config), &db, &config, cli.json)
        }
    }
}

/// Owner from the flag, else config. Resolution is deferred so commands
/// that don't need an owner still work without one configured.
fn cli_owner(flag: Option<Uuid>, config: &AppConfig) -> Option<Uuid> {
    flag.or(config.core.default_owner)
}

fn require_owner(owner: &Option<Uuid>) -> Result<Uuid> {
    owner.ok_or_else(|| LudexError::OwnerNotConfigured.into())
}

fn run(
    command: Commands,
    owner: &Option<Uuid>,
    db: &Database,
    config: &AppConfig,
    json: bool,
) -> Result<()> {
    match command {
        Commands::Title { action } => run_title(action, owner, db, json),
        Commands::Pair { action } => run_pair(action, owner, db, json),

        Commands::Scan => {
            let owner = require_owner(owner)?;
            let pipeline = DedupPipeline::new(DedupConfig::from_settings(&config.dedup));
            let report = pipeline.run_for_owner(db, owner)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Scanned {} titles ({} comparisons): {} pairs found, {} created, {} updated, {} removed.",
                    report.titles,
                    report.pairs_scored,
                    report.pairs_found,
                    report.created,
                    report.updated,
                    report.removed
                );
                for error in &report.persist_errors {
                    eprintln!("  persist error: {error}");
                }
            }
            Ok(())
        }

        Commands::Groups { include_dismissed } => {
            let owner = require_owner(owner)?;
            let mode = if include_dismissed {
                GroupingMode::IncludeDismissed
            } else {
                GroupingMode::ActiveOnly
            };
            let pipeline = DedupPipeline::new(DedupConfig::from_settings(&config.dedup));
            let groups = pipeline.groups_for_owner(db, owner, mode)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else if groups.is_empty() {
                println!("No duplicate groups. Run `ludex scan` after adding titles.");
            } else {
                for (i, group) in groups.iter().enumerate() {
                    println!("Group {} ({} titles):", i + 1, group.titles.len());
                    for title in &group.titles {
                        println!("  {} — {}", &title.id.to_string()[..8], title.name);
                    }
                    for pair in &group.pairs {
                        let flag = if pair.dismissed { " [dismissed]" } else { "" };
                        println!(
                            "    {} ↔ {}  {} ({}){}",
                            &pair.title_a_id.to_string()[..8],
                            &pair.title_b_id.to_string()[..8],
                            pair.score,
                            pair.match_type,
                            flag
                        );
                    }
                }
            }
            Ok(())
        }

        Commands::Stats => {
            let titles = SqliteTitleRepository::new(db.connection()).count()?;
            let pair_repo = SqlitePairRepository::new(db.connection());
            let pairs = pair_repo.count()?;
            let dismissed = pair_repo.count_dismissed()?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "titles": titles,
                        "pairs": pairs,
                        "dismissed": dismissed,
                    }))?
                );
            } else {
                println!("Titles: {titles}");
                println!("Similarity pairs: {pairs} ({dismissed} dismissed)");
            }
            Ok(())
        }

        // Handled before the database is opened.
        Commands::Config { .. } | Commands::Version => unreachable!(),
    }
}

// ─── Title commands ─────────────────────────────────────────────────────────

fn run_title(action: TitleAction, owner: &Option<Uuid>, db: &Database, json: bool) -> Result<()> {
    let repo = SqliteTitleRepository::new(db.connection());
    match action {
        TitleAction::Add { name, platform } => {
            let owner = require_owner(owner)?;
            let mut title = Title::new(owner, name);
            if let Some(platform) = platform {
                title = title.with_platform(platform);
            }
            repo.save(&title)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&title)?);
            } else {
                println!("Added: {} ({})", title.name, title.id);
            }
        }

        TitleAction::List => {
            let owner = require_owner(owner)?;
            let titles = repo.list_for_owner(&owner)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&titles)?);
            } else if titles.is_empty() {
                println!("No titles. Use `ludex title add` to add one.");
            } else {
                for title in &titles {
                    let platform = title.platform.as_deref().unwrap_or("-");
                    println!(
                        "  {} — {} [{}]",
                        &title.id.to_string()[..8],
                        title.name,
                        platform
                    );
                }
            }
        }

        TitleAction::Remove { id } => {
            if repo.delete(&id)? {
                println!("Removed title: {id}");
            } else {
                eprintln!("Title not found: {id}");
                std::process::exit(2);
            }
        }
    }
    Ok(())
}

// ─── Pair commands ──────────────────────────────────────────────────────────

fn run_pair(action: PairAction, owner: &Option<Uuid>, db: &Database, json: bool) -> Result<()> {
    let repo = SqlitePairRepository::new(db.connection());
    match action {
        PairAction::List { dismissed } => {
            let owner = require_owner(owner)?;
            let mut pairs = repo.list_for_owner(&owner)?;
            if dismissed {
                pairs.retain(|p| p.dismissed);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&pairs)?);
            } else if pairs.is_empty() {
                println!("No similarity pairs. Run `ludex scan` first.");
            } else {
                for pair in &pairs {
                    let flag = if pair.dismissed { " [dismissed]" } else { "" };
                    println!(
                        "  {} — {} ↔ {}  {} ({}){}",
                        &pair.id.to_string()[..8],
                        &pair.title_a_id.to_string()[..8],
                        &pair.title_b_id.to_string()[..8],
                        pair.score,
                        pair.match_type,
                        flag
                    );
                }
            }
        }

        PairAction::Dismiss { id } => {
            if repo.set_dismissed(&id, true)? {
                println!("Dismissed pair: {id}");
            } else {
                eprintln!("Pair not found: {id}");
                std::process::exit(2);
            }
        }

        PairAction::Undismiss { id } => {
            if repo.set_dismissed(&id, false)? {
                println!("Restored pair: {id}");
            } else {
                eprintln!("Pair not found: {id}");
                std::process::exit(2);
            }
        }
    }
    Ok(())
}

// ─── Config commands ────────────────────────────────────────────────────────

fn run_config(action: ConfigAction, config: &AppConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigAction::Path => {
            println!("{}", AppConfig::config_path().display());
        }
    }
    Ok(())
}
