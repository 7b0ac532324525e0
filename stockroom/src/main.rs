//! Stockroom - per-user inventory ledger
//!
//! Command line front end over the ledger, plus an HTTP API (`serve`).

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use stockroom::{
    query, web, write_export, DecrementPolicy, ImportReport, LedgerError, MemoryStore,
    Repository, SortKey, SqliteStore,
};
use stockroom_common::{format_number, InventoryItem, ItemDraft, RecordStore, Scope};

/// Per-user inventory ledger backed by a local document store
#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    /// Keep records in memory only (nothing is persisted)
    #[arg(long, default_value_t = false)]
    memory: bool,

    /// User whose inventory to work on
    #[arg(short, long)]
    user: Option<String>,

    /// Delete a record instead of decrementing it below one
    #[arg(long, default_value_t = false)]
    remove_at_zero: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the inventory
    List {
        /// Only items with a field containing this text
        #[arg(short, long, default_value = "")]
        search: String,

        /// name, quantity, price or supplier
        #[arg(long, default_value = "name")]
        sort: String,
    },
    /// Add an item, replacing any item of the same name
    Add(ItemFields),
    /// Count one more of an item, creating it if needed
    Tally { name: String },
    /// Add one to an item's quantity
    Increment { name: String },
    /// Take one off an item's quantity
    Decrement { name: String },
    /// Change an item; fields not given keep their current value
    Edit {
        /// Current name of the item
        original: String,

        /// New name (renames the item)
        #[arg(long)]
        rename: Option<String>,

        #[command(flatten)]
        fields: EditFields,
    },
    /// Remove an item
    Delete { name: String },
    /// Write the inventory as CSV
    Export {
        /// Output file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the inventory with the contents of a CSV file
    Import { file: PathBuf },
    /// Quantity per supplier and value per item
    Summary,
    /// Run the HTTP API
    Serve {
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(ClapArgs, Debug)]
struct ItemFields {
    name: String,
    #[arg(short, long)]
    quantity: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(short, long)]
    price: Option<String>,
    #[arg(long)]
    supplier: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct EditFields {
    #[arg(short, long)]
    quantity: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(short, long)]
    price: Option<String>,
    #[arg(long)]
    supplier: Option<String>,
}

impl ItemFields {
    fn to_draft(&self) -> ItemDraft {
        ItemDraft {
            name: self.name.clone(),
            quantity: self.quantity.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
            supplier: self.supplier.clone(),
        }
    }
}

impl EditFields {
    /// The stored item with the given fields laid over it
    fn apply(&self, mut draft: ItemDraft) -> ItemDraft {
        if let Some(quantity) = &self.quantity {
            draft.quantity = Some(quantity.clone());
        }
        if let Some(description) = &self.description {
            draft.description = Some(description.clone());
        }
        if let Some(price) = &self.price {
            draft.price = Some(price.clone());
        }
        if let Some(supplier) = &self.supplier {
            draft.supplier = Some(supplier.clone());
        }
        draft
    }
}

/// Returns the default database path: ~/.local/share/stockroom/inventory.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockroom")
        .join("inventory.db")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let policy = if args.remove_at_zero {
        DecrementPolicy::RemoveAtZero
    } else {
        DecrementPolicy::Clamp
    };

    let store: Arc<dyn RecordStore> = if args.memory {
        log::info!("Using in-memory record store");
        Arc::new(MemoryStore::new())
    } else {
        let db_path = PathBuf::from(&args.database);
        match SqliteStore::open(&db_path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::error!("Failed to open database {}: {}", db_path.display(), e);
                std::process::exit(1);
            }
        }
    };

    if let Command::Serve { port } = args.command {
        let state = web::AppState::new(store, policy);
        if let Err(e) = web::serve(state, port).await {
            log::error!("Web server error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let Some(scope) = args.user.as_deref().and_then(Scope::new) else {
        log::error!("No user given, pass --user <id>");
        std::process::exit(1);
    };

    let mut repo = Repository::new(store).with_policy(policy);
    if let Err(e) = run(&mut repo, scope, args.command).await {
        log::error!("{}", e);
        if let LedgerError::PartialImportFailure(report) = &e {
            print_report(report);
        }
        std::process::exit(1);
    }
}

/// Run one item command against the user's inventory
async fn run(repo: &mut Repository, scope: Scope, command: Command) -> stockroom::Result<()> {
    repo.sign_in(scope).await?;

    match command {
        Command::List { search, sort } => {
            print_items(&query::view(repo.items(), &search, SortKey::parse(&sort)));
        }
        Command::Add(fields) => {
            repo.add(&fields.to_draft()).await?;
        }
        Command::Tally { name } => {
            repo.tally(&name).await?;
        }
        Command::Increment { name } => {
            let item = repo
                .get(&name)
                .cloned()
                .ok_or(LedgerError::NotFound(name))?;
            repo.increment(&item).await?;
        }
        Command::Decrement { name } => {
            repo.decrement(&name).await?;
        }
        Command::Edit {
            original,
            rename,
            fields,
        } => {
            let current = repo
                .get(&original)
                .cloned()
                .ok_or_else(|| LedgerError::NotFound(original.clone()))?;
            let mut draft = fields.apply(ItemDraft::from_item(&current));
            if let Some(name) = rename {
                draft.name = name;
            }
            repo.edit(&original, &draft).await?;
        }
        Command::Delete { name } => {
            repo.delete(&name).await?;
        }
        Command::Export { output } => match output {
            Some(path) => write_export(&path, repo.items()).await?,
            None => println!("{}", stockroom::export_csv(repo.items())?),
        },
        Command::Import { file } => {
            let report = repo.import_file(&file).await?;
            print_report(&report);
        }
        Command::Summary => print_summary(repo.items()),
        Command::Serve { .. } => {}
    }

    Ok(())
}

fn print_items(items: &[InventoryItem]) {
    if items.is_empty() {
        println!("No items");
        return;
    }
    println!(
        "{:<30} {:>8} {:>10} {:<20} DESCRIPTION",
        "NAME", "QTY", "PRICE", "SUPPLIER"
    );
    for item in items {
        println!(
            "{:<30} {:>8} {:>10} {:<20} {}",
            item.name,
            item.quantity,
            format_number(item.price),
            item.supplier,
            item.description
        );
    }
}

fn print_report(report: &ImportReport) {
    println!(
        "Import: {} created, {} updated, {} deleted, {} skipped",
        report.created, report.updated, report.deleted, report.skipped
    );
    for key in &report.failed {
        println!("  failed: {}", key);
    }
}

fn print_summary(items: &[InventoryItem]) {
    println!("Quantity by supplier:");
    for total in query::quantity_by_supplier(items) {
        println!("  {:<20} {:>8}", total.supplier, total.quantity);
    }
    println!("Value by item:");
    for value in query::value_by_item(items) {
        println!("  {:<30} {:>10.2}", value.name, value.value);
    }
    println!("Total value: {:.2}", query::total_value(items));
}
