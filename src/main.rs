use std::env;
use std::process;
use std::sync::Arc;

use tracing::{error, info};

use metadeck::config::SiteConfig;
use metadeck::import::DeckImporter;
use metadeck::models::ImportOptions;
use metadeck::progress::ProgressSnapshot;
use metadeck::store::SqliteDeckStore;

#[tokio::main]
async fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let command = args[1].clone();
    let mut db_path = "decks.sqlite".to_string();
    let mut base_url: Option<String> = None;
    let mut options = ImportOptions::default();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--archive" => {
                options.archive_previous = true;
                i += 1;
            }
            "--delete-previous" => {
                options.delete_previous = true;
                i += 1;
            }
            "--strip-class" => {
                options.strip_class_from_name = true;
                i += 1;
            }
            "--db" => {
                if i + 1 >= args.len() {
                    error!("--db requires a file path");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                db_path = args[i + 1].clone();
                i += 2;
            }
            "--base-url" => {
                if i + 1 >= args.len() {
                    error!("--base-url requires a URL");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                base_url = Some(args[i + 1].clone());
                i += 2;
            }
            _ => {
                error!("Unknown argument: {}", args[i]);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let mut config = SiteConfig::from_env();
    if let Some(url) = base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }

    let result = match command.as_str() {
        "import" => run_import(&db_path, config, options).await,
        "delete" => run_delete(&db_path, config).await,
        _ => {
            error!("Unknown command: {}", command);
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    match result {
        Ok(count) => println!("{}", count),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

async fn run_import(
    db_path: &str,
    config: SiteConfig,
    options: ImportOptions,
) -> Result<u64, Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteDeckStore::new(db_path).await?);
    let importer = DeckImporter::new(store, config)?;

    let summary = importer
        .run(options, |snapshot: ProgressSnapshot| {
            info!("Imported {} of {} decks", snapshot.imported, snapshot.found);
        })
        .await?;

    Ok(summary.deck_count as u64)
}

async fn run_delete(db_path: &str, config: SiteConfig) -> Result<u64, Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteDeckStore::new(db_path).await?);
    let importer = DeckImporter::new(store, config)?;
    Ok(importer.delete_decks().await?)
}

fn print_usage(program_name: &str) {
    eprintln!("Usage:");
    eprintln!(
        "  {} import [--archive] [--delete-previous] [--strip-class] [--db <path>] [--base-url <url>]",
        program_name
    );
    eprintln!("  {} delete [--db <path>]", program_name);
    eprintln!();
    eprintln!("Prints the number of decks imported (or deleted) on success.");
}
