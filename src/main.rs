use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use primer::{catalog, report, verify};

#[derive(Parser)]
#[command(name = "primer")]
#[command(about = "Verified feature documentation for a small scripting language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every catalog snippet and report the results
    Verify {
        /// Load features from a JSON definition file instead of the
        /// built-in set
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Wall-clock limit per snippet, in seconds
        #[arg(long, default_value = "5")]
        timeout_secs: u64,
    },
    /// List catalog entries
    List {
        /// Only entries of one category (e.g. `spread-rest`)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one entry in full: description, snippets, expectations
    Show {
        /// Feature id (e.g. `spread-merge-objects`)
        id: String,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "primer=info".into()),
    );

    // Reports go to stdout; keep logging on stderr so output stays pipeable.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Verify {
            catalog,
            timeout_secs,
        }) => {
            let catalog = load_catalog(catalog)?;
            run_verification(&catalog, Duration::from_secs(timeout_secs)).await;
        }
        Some(Commands::List { category }) => {
            let catalog = catalog::seed();
            let entries: Vec<_> = match category.as_deref() {
                Some(raw) => {
                    let category = primer::models::Category::from_str(raw)
                        .ok_or_else(|| anyhow::anyhow!("unknown category `{raw}`"))?;
                    catalog.list_by_category(category)
                }
                None => catalog.all().iter().collect(),
            };
            print!("{}", report::render_listing(&entries));
        }
        Some(Commands::Show { id }) => {
            let catalog = catalog::seed();
            let entry = catalog.get(&id)?;
            print!("{}", report::render_entry(entry));
        }
        None => {
            // Default: verify the built-in catalog.
            let catalog = catalog::seed();
            run_verification(&catalog, Duration::from_secs(5)).await;
        }
    }

    Ok(())
}

fn load_catalog(path: Option<PathBuf>) -> anyhow::Result<catalog::Catalog> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading catalog definitions");
            Ok(catalog::Catalog::from_file(&path)?)
        }
        None => Ok(catalog::seed()),
    }
}

async fn run_verification(catalog: &catalog::Catalog, timeout: Duration) {
    tracing::info!(
        features = catalog.len(),
        snippets = catalog.snippet_count(),
        "verifying catalog"
    );
    let config = verify::VerifyConfig { timeout };
    let outcomes = verify::verify_all(catalog, &config).await;
    print!("{}", report::render(&outcomes));
    if !report::all_passed(&outcomes) {
        std::process::exit(1);
    }
}
