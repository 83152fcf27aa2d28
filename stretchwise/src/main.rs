//! stretchwise - pick one stretch at a time and track the habit
//!
//! Uses XDG Base Directory specification for file locations:
//! - Data: $XDG_DATA_HOME/stretchwise/data.db (~/.local/share/stretchwise/data.db)
//! - Config: $XDG_CONFIG_HOME/stretchwise/config.toml (~/.config/stretchwise/config.toml)
//! - Logs: $XDG_STATE_HOME/stretchwise/stretchwise.log

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stretchwise_core::analytics::{
    detailed_stats_table, goal_progress, recent_days, StatsSummary,
};
use stretchwise_core::config::StorageBackend;
use stretchwise_core::engine::{local_today, record_action, select_next, SelectionResult};
use stretchwise_core::store::require_stretch;
use stretchwise_core::validation::validate;
use stretchwise_core::{
    catalog, open_store, ActionKind, Category, Config, Error, NewStretch, Priority, Store,
    StretchUpdate,
};

#[derive(Parser)]
#[command(name = "stretchwise")]
#[command(about = "Weighted daily stretch picker and habit tracker")]
#[command(version)]
struct Args {
    /// Storage backend (overrides config)
    #[arg(long, global = true)]
    backend: Option<StorageBackend>,

    /// Data file location (overrides config)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pick the next stretch to do
    Next,

    /// Mark a stretch as completed
    Done { id: i64 },

    /// Mark a stretch as skipped
    Skip { id: i64 },

    /// Show the stretch catalog
    List,

    /// Add a stretch to the catalog
    Add {
        #[arg(long)]
        name: String,
        /// high or low
        #[arg(long)]
        priority: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: String,
        /// Add the stretch without offering it
        #[arg(long)]
        disabled: bool,
    },

    /// Change fields of a stretch
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Offer a stretch again
    Enable { id: i64 },

    /// Stop offering a stretch
    Disable { id: i64 },

    /// Remove a stretch and its history
    Delete { id: i64 },

    /// Show progress summary
    Stats {
        /// Days of history to chart
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Show per-stretch success rates
    Table,

    /// Show or change selection preferences
    Prefs {
        /// Set a preference, e.g. --set daily_goal=8
        #[arg(long = "set", value_parser = parse_pref)]
        set: Vec<(String, f64)>,
        /// Restore every preference to its default (applied before --set)
        #[arg(long)]
        reset: bool,
    },

    /// Add the starter stretches to an empty catalog
    Init,

    /// Delete all recorded history
    Reset {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

fn parse_pref(s: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid number '{}': {}", value, e))?;
    Ok((key.trim().to_string(), value))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(backend) = args.backend {
        config.storage.backend = backend;
    }
    if let Some(path) = args.data {
        config.storage.path = Some(path);
    }

    // Logs go to file so stdout stays clean for command output
    let _log_guard = stretchwise_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "stretchwise starting");
    let store = open_store(&config).context("failed to open store")?;
    let store = store.as_ref();

    match args.command {
        Command::Next => cmd_next(store),
        Command::Done { id } => cmd_respond(store, id, ActionKind::Completed),
        Command::Skip { id } => cmd_respond(store, id, ActionKind::Skipped),
        Command::List => cmd_list(store),
        Command::Add {
            name,
            priority,
            category,
            description,
            disabled,
        } => cmd_add(store, &name, &priority, &category, &description, disabled),
        Command::Edit {
            id,
            name,
            priority,
            category,
            description,
        } => cmd_edit(store, id, name, priority, category, description),
        Command::Enable { id } => cmd_set_enabled(store, id, true),
        Command::Disable { id } => cmd_set_enabled(store, id, false),
        Command::Delete { id } => cmd_delete(store, id),
        Command::Stats { days } => cmd_stats(store, days),
        Command::Table => cmd_table(store),
        Command::Prefs { set, reset } => cmd_prefs(store, &set, reset),
        Command::Init => cmd_init(store),
        Command::Reset { yes } => cmd_reset(store, yes),
    }
}

/// Print every validation message, then fail with a short summary.
fn report(err: Error) -> anyhow::Error {
    if let Error::ValidationFailed(messages) = &err {
        eprintln!("Stretch is invalid:");
        for message in messages {
            eprintln!("  - {}", message);
        }
        return anyhow!("{} validation error(s)", messages.len());
    }
    err.into()
}

fn cmd_next(store: &dyn Store) -> Result<()> {
    let mut rng = rand::thread_rng();
    match select_next(store, local_today(), &mut rng).context("failed to select a stretch")? {
        SelectionResult::Stretch(stretch) => {
            println!("{} [{}] ({})", stretch.name, stretch.priority, stretch.category);
            println!();
            println!("{}", stretch.description);
            println!();
            println!(
                "Run 'stretchwise done {id}' or 'stretchwise skip {id}'",
                id = stretch.id
            );
        }
        SelectionResult::EmptyCatalog { message } => {
            println!("{}", message);
            println!("Run 'stretchwise init' to load the starter stretches.");
        }
        SelectionResult::LimitReached { message } => println!("{}", message),
    }
    Ok(())
}

fn cmd_respond(store: &dyn Store, id: i64, kind: ActionKind) -> Result<()> {
    let action = record_action(store, id, kind, &Local::now()).map_err(report)?;
    println!("Marked '{}' as {}", action.stretch_name, action.action);

    let daily = store.daily_aggregates()?;
    let progress = goal_progress(&daily, local_today(), &store.preferences()?);
    print!("Today: {}/{}", progress.completed, progress.goal);
    if progress.reached {
        print!(" - daily goal reached!");
    }
    println!();
    Ok(())
}

fn cmd_list(store: &dyn Store) -> Result<()> {
    let stretches = store.list()?;
    if stretches.is_empty() {
        println!("No stretches in the catalog.");
        return Ok(());
    }

    println!(
        "{:>4}  {:<3}  {:<5}  {:<16}  NAME",
        "ID", "ON", "PRIO", "CATEGORY"
    );
    for stretch in &stretches {
        println!(
            "{:>4}  {:<3}  {:<5}  {:<16}  {}",
            stretch.id,
            if stretch.is_enabled() { "yes" } else { "no" },
            stretch.priority,
            stretch.category,
            stretch.name
        );
    }
    Ok(())
}

fn cmd_add(
    store: &dyn Store,
    name: &str,
    priority: &str,
    category: &str,
    description: &str,
    disabled: bool,
) -> Result<()> {
    let mut stretch = NewStretch::parse(name, priority, category, description).map_err(report)?;
    if disabled {
        stretch.enabled = Some(false);
    }
    let id = store.add(&stretch).map_err(report)?;
    println!("Added '{}' with id {}", stretch.name, id);
    Ok(())
}

fn cmd_edit(
    store: &dyn Store,
    id: i64,
    name: Option<String>,
    priority: Option<String>,
    category: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let current = require_stretch(store, id).map_err(report)?;

    // Validate the merged form so every problem is reported at once
    let merged_name = name.as_deref().unwrap_or(&current.name);
    let merged_priority = priority.as_deref().unwrap_or(current.priority.as_str());
    let merged_category = category.as_deref().unwrap_or(current.category.as_str());
    let merged_description = description.as_deref().unwrap_or(&current.description);
    validate(merged_name, merged_priority, merged_category, merged_description)
        .into_result()
        .map_err(report)?;

    let update = StretchUpdate {
        name,
        priority: priority.as_deref().map(Priority::from_stored),
        category: category.as_deref().map(Category::from_stored),
        description,
        enabled: None,
    };
    let stretch = store.update(id, &update).map_err(report)?;
    println!("Updated '{}'", stretch.name);
    Ok(())
}

fn cmd_set_enabled(store: &dyn Store, id: i64, enabled: bool) -> Result<()> {
    let stretch = store
        .update(id, &StretchUpdate::enabled(enabled))
        .map_err(report)?;
    println!(
        "'{}' is now {}",
        stretch.name,
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn cmd_delete(store: &dyn Store, id: i64) -> Result<()> {
    let stretch = require_stretch(store, id).map_err(report)?;
    let removed = store.delete(id).map_err(report)?;
    println!(
        "Deleted '{}' and {} history record(s)",
        stretch.name, removed
    );
    Ok(())
}

fn cmd_stats(store: &dyn Store, days: u32) -> Result<()> {
    let today = local_today();
    let history = store.query_all()?;
    let summary = StatsSummary::compute(&history, today);
    let daily = store.daily_aggregates()?;
    let progress = goal_progress(&daily, today, &store.preferences()?);

    println!("Stretch Stats");
    println!("=============");
    println!();
    println!(
        "Today:           {}/{} ({:.0}%)",
        progress.completed,
        progress.goal,
        progress.percent()
    );
    println!("Current streak:  {} day(s)", summary.current_streak);
    println!("Longest streak:  {} day(s)", summary.longest_streak);
    println!("Total completed: {}", summary.total_completed);
    println!("Active days:     {}", summary.active_days);
    println!("Daily average:   {:.1}", summary.average_daily);
    println!(
        "Favorite:        {}",
        summary.favorite.as_deref().unwrap_or("-")
    );

    if days > 0 {
        println!();
        println!("Last {} day(s):", days);
        for day in recent_days(&daily, today, days) {
            println!(
                "  {}  {:>3} done  {:>3} skipped",
                day.date.format("%Y-%m-%d"),
                day.completed_count,
                day.skipped_count
            );
        }
    }
    Ok(())
}

fn cmd_table(store: &dyn Store) -> Result<()> {
    let rows = detailed_stats_table(&store.query_all()?, &store.list()?);
    if rows.is_empty() {
        println!("No stretches in the catalog.");
        return Ok(());
    }

    println!(
        "{:<28}  {:<16}  {:>4}  {:>4}  {:>7}  LAST DONE",
        "NAME", "CATEGORY", "DONE", "SKIP", "SUCCESS"
    );
    for row in &rows {
        println!(
            "{:<28}  {:<16}  {:>4}  {:>4}  {:>7}  {}",
            row.name,
            row.category,
            row.completed,
            row.skipped,
            row.success_rate_display(),
            row.last_completed_display()
        );
    }
    Ok(())
}

fn cmd_prefs(store: &dyn Store, updates: &[(String, f64)], reset: bool) -> Result<()> {
    let mut prefs = store.preferences()?;
    if reset || !updates.is_empty() {
        if reset {
            prefs.reset();
        }
        for (key, value) in updates {
            prefs.set(key, *value)?;
        }
        store
            .save_preferences(&prefs)
            .context("failed to save preferences")?;
        println!("Preferences saved.");
    }

    for (key, value) in prefs.entries() {
        println!("{:<22} {}", key, value);
    }
    Ok(())
}

fn cmd_init(store: &dyn Store) -> Result<()> {
    let added = catalog::seed_starter_catalog(store).context("failed to seed catalog")?;
    if added == 0 {
        println!("Catalog already has stretches; nothing added.");
    } else {
        println!("Added {} starter stretches.", added);
    }
    Ok(())
}

fn cmd_reset(store: &dyn Store, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to delete history without --yes");
    }
    let removed = store.delete_all().context("failed to delete history")?;
    println!("Deleted {} history record(s).", removed);
    Ok(())
}
