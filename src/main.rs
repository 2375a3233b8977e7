use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use select_list::config::Config;
use select_list::storage::DEFAULT_DATABASE_FILE;
use select_list::{SelectionStateManager, SelectionStore, TriState};

/// Get the config directory path (~/.config/select-list/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("select-list"))
}

#[derive(Parser, Debug)]
#[command(
    name = "select-list",
    about = "Tri-state category/item selection with a persisted selection"
)]
struct Args {
    /// Config file (default: ~/.config/select-list/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file holding the stored selection
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Forget the stored selection before running the command
    #[arg(long)]
    reset: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the catalog and current selection
    Show,
    /// Select every item
    SelectAll,
    /// Deselect every item
    ClearAll,
    /// Set the "select all" control explicitly
    SetAll {
        #[arg(action = clap::ArgAction::Set)]
        checked: bool,
    },
    /// Check or uncheck a whole category
    ToggleCategory { category: String },
    /// Check or uncheck one item
    ToggleItem { category: String, item: String },
    /// Expand a category (collapsing the others) or collapse it
    Expand { category: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let catalog = config.catalog().context("Invalid catalog in config file")?;

    let db_path = match args.database.clone().or_else(|| config.database_path.clone()) {
        Some(path) => path,
        None => {
            if !config_dir.exists() {
                std::fs::create_dir_all(&config_dir)
                    .context("Failed to create config directory")?;
            }
            config_dir.join(DEFAULT_DATABASE_FILE)
        }
    };

    let store = SelectionStore::new(&db_path);
    if args.reset {
        // Clear is a no-op on an uninitialized handle
        store
            .initialize()
            .await
            .with_context(|| format!("Failed to open {}", db_path.display()))?;
        store.clear().await.context("Failed to reset stored selection")?;
        println!("Stored selection cleared.");
    }

    let mut manager = SelectionStateManager::initialize(catalog, store.clone()).await;

    match args.command.unwrap_or(Command::Show) {
        Command::Show => {}
        Command::SelectAll => manager.select_all(),
        Command::ClearAll => manager.clear_all(),
        Command::SetAll { checked } => manager.set_select_all(checked),
        Command::ToggleCategory { category } => manager.toggle_category(&category)?,
        Command::ToggleItem { category, item } => manager.toggle_item(&category, &item)?,
        Command::Expand { category } => manager.toggle_expansion(&category)?,
    }
    manager.flush().await;

    render(&manager);

    match store.last_saved().await {
        Ok(Some(at)) => println!("Last saved: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        Ok(None) => println!("Nothing stored."),
        Err(e) => tracing::debug!(error = %e, "Could not read last-saved time"),
    }

    let health = manager.persistence_health();
    if let Some(err) = &health.last_error {
        eprintln!(
            "Warning: selection was not saved ({}). It applies to this run only.",
            err
        );
    }

    Ok(())
}

/// Print the catalog as a checkbox tree. Collapsed categories hide their items.
fn render(manager: &SelectionStateManager) {
    println!("{} All", manager.state().marker());
    for category in manager.categories() {
        let state = TriState::from_counts(category.selected_count(), category.items().len());
        let fold = if category.is_expanded() { "v" } else { ">" };
        println!("  {} {} {}", state.marker(), fold, category.name());

        if category.is_expanded() {
            for item in category.items() {
                let marker = if item.is_selected() { "[x]" } else { "[ ]" };
                println!("      {} {} {}", marker, item.name(), item.color());
            }
        }
    }
    println!("{}", manager.selected_summary());
}
