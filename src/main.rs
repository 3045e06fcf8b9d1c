//! PipeQuest - Gamified Sales Pipeline Tracker
//!
//! Terminal entry point.

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pipequest::clock::FixedClock;
use pipequest::crm::types::{OutreachOutcome, OutreachType};
use pipequest::gamification::{Engine, MissionStatus, TokenLedger};
use pipequest::review::ReviewStore;
use pipequest::{Clock, Database, TtlCache};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PipeQuest v{}", env!("CARGO_PKG_VERSION"));

    let config = pipequest::config::load_config().context("loading configuration")?;
    std::fs::create_dir_all(&config.data_dir).context("creating data directory")?;

    let db = Database::open(&config.database_path()).context("opening database")?;
    let clock = FixedClock::new(config.utc_offset_hours);
    let cache: TtlCache<f64> =
        TtlCache::new(std::time::Duration::from_secs(config.cache.ttl_secs));
    let engine = Engine::new(db.connection(), &clock, &cache);
    engine.seed_defaults().context("seeding defaults")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("status") | None => status(&engine, &clock),
        Some("log-outreach") => log_outreach(&engine, &args[1..]),
        Some("complete-task") => complete_task(&engine, &args[1..]),
        Some("redeem") => redeem(&db, &clock, &args[1..]),
        Some("review") => review(&db, &clock, &args[1..]),
        Some(other) => bail!("unknown command: {other}"),
    }
}

fn status(engine: &Engine, clock: &FixedClock) -> Result<()> {
    let summary = engine.status()?;
    let stats = &summary.stats;
    println!(
        "Level {} | {} XP | streak {} days (best {})",
        stats.current_level,
        stats.current_xp,
        stats.current_outreach_streak_days,
        stats.longest_outreach_streak_days,
    );
    println!(
        "Tokens: {} | consistency: {}% | unclaimed rewards: {}",
        summary.token_balance, summary.consistency_score, summary.unclaimed_rewards,
    );
    match &summary.mission {
        Some(mission) => println!(
            "Mission: {} ({}/{}) [{}]",
            mission.description,
            mission.progress_count,
            mission.target_count,
            match mission.status(clock.today()) {
                MissionStatus::Completed => "done",
                MissionStatus::Expired => "expired",
                MissionStatus::InProgress => "active",
            },
        ),
        None => println!("Mission: none (weekend)"),
    }
    println!(
        "Boss: {} ({}/{})",
        summary.battle.description, summary.battle.progress_value, summary.battle.target_value,
    );
    Ok(())
}

fn log_outreach(engine: &Engine, args: &[String]) -> Result<()> {
    let outreach_type = args
        .first()
        .map(|s| OutreachType::parse(s))
        .unwrap_or(OutreachType::Email);
    let outcome = args
        .get(1)
        .map(|s| OutreachOutcome::parse(s))
        .unwrap_or(OutreachOutcome::Contacted);
    let lead_id = args.get(2).and_then(|s| s.parse().ok());

    let recorded = engine.record_outreach(outreach_type, outcome, lead_id, None)?;
    println!(
        "+{} XP, +{} tokens, streak {} days",
        recorded.xp.amount, recorded.tokens, recorded.streak.current,
    );
    for key in &recorded.new_achievements {
        println!("Achievement unlocked: {key}");
    }
    Ok(())
}

fn complete_task(engine: &Engine, args: &[String]) -> Result<()> {
    let task_id: i64 = args
        .first()
        .context("usage: complete-task <id>")?
        .parse()
        .context("task id must be a number")?;
    engine.record_task_done(task_id)?;
    println!("Task {task_id} completed");
    Ok(())
}

fn redeem(db: &Database, clock: &FixedClock, args: &[String]) -> Result<()> {
    let ledger = TokenLedger::new(db.connection());
    let Some(arg) = args.first() else {
        for item in ledger.list_items()? {
            println!("[{}] {} - {} tokens", item.id, item.name, item.cost);
        }
        return Ok(());
    };
    let item_id: i64 = arg.parse().context("item id must be a number")?;
    if ledger.redeem(item_id, clock.now())? {
        println!("Redeemed. Balance: {}", ledger.balance()?);
    } else {
        println!("Not enough tokens (balance: {})", ledger.balance()?);
    }
    Ok(())
}

fn review(db: &Database, clock: &FixedClock, args: &[String]) -> Result<()> {
    let store = ReviewStore::new(db.connection());
    if args.first().map(String::as_str) == Some("delete") {
        let month = args.get(1).context("usage: review delete <YYYY-MM>")?;
        store.delete(month)?;
        println!("Deleted review for {month}");
        return Ok(());
    }
    let review = store.generate(clock.today(), clock.now())?;
    let s = &review.snapshot;
    println!("Review {}", review.year_month);
    println!(
        "  outreach: {} | deals won: {} | revenue: ${:.2}",
        s.outreach_count, s.deals_won, s.revenue,
    );
    println!(
        "  xp gained: {} | missions completed: {}",
        s.xp_gained, s.missions_completed,
    );
    Ok(())
}
