mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatter_store::{Database, Fixtures, SyncOptions};

/// Chatter database utility
///
/// Recreates the schema, loads fixture records and reports table sizes.
#[derive(Parser, Debug)]
#[command(name = "chatter-seed")]
#[command(about = "Sync, seed and inspect Chatter databases", long_about = None)]
struct Args {
    /// Path to the SQLite database file (overrides settings)
    #[arg(short, long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create missing tables, or drop and recreate all of them with --force
    Sync {
        #[arg(short, long)]
        force: bool,
    },
    /// Load fixture records
    Seed {
        /// Directory containing users.json, profiles.json, posts.json,
        /// comments.json and likes.json
        #[arg(short = 'F', long, env = "FIXTURES_DIR")]
        fixtures: Option<PathBuf>,

        /// Drop and recreate every table first
        #[arg(short, long)]
        force: bool,

        /// Insert records without associating them
        #[arg(long)]
        no_link: bool,
    },
    /// Print row counts per table
    Inspect,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatter_seed=info,chatter_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let settings = config::Settings::new().context("Failed to load settings")?;
    let database_path = args
        .database
        .clone()
        .unwrap_or_else(|| settings.database.path.clone());

    let db = Database::open(&database_path)
        .with_context(|| format!("Failed to open database at {database_path}"))?;
    tracing::info!("Using database {}", database_path);

    match args.command {
        Command::Sync { force } => {
            db.sync(SyncOptions { force })
                .context("Failed to synchronize schema")?;
            println!("✓ Schema synchronized{}", if force { " (forced)" } else { "" });
        }
        Command::Seed {
            fixtures,
            force,
            no_link,
        } => {
            db.sync(SyncOptions { force })
                .context("Failed to synchronize schema")?;

            let fixtures_dir = fixtures.or_else(|| settings.fixtures_dir());
            let fixtures = match &fixtures_dir {
                Some(dir) => Fixtures::from_dir(dir)
                    .with_context(|| format!("Failed to load fixtures from {}", dir.display()))?,
                None => Fixtures::bundled().context("Failed to load bundled fixtures")?,
            };

            let link = settings.seed.link && !no_link;
            let seeded = fixtures
                .seed(&db, link)
                .context("Failed to seed fixture data")?;

            println!(
                "✓ Seeded {} records ({} users, {} profiles, {} posts, {} comments, {} likes)",
                seeded.total_records(),
                seeded.users.len(),
                seeded.profiles.len(),
                seeded.posts.len(),
                seeded.comments.len(),
                seeded.likes.len()
            );
            if link {
                println!("✓ Created {} associations", seeded.links);
            }
        }
        Command::Inspect => {
            let present = db.existing_tables().context("Failed to list tables")?;
            if present.is_empty() {
                println!("❌ No tables found. Run `chatter-seed sync` first.");
                return Ok(());
            }
            let counts = db.table_counts().context("Failed to count rows")?;
            println!("{:<12} {:>8}", "table", "rows");
            println!("{}", "-".repeat(21));
            for (table, count) in counts {
                println!("{:<12} {:>8}", table, count);
            }
        }
    }

    db.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_seed_flags() {
        let args = Args::try_parse_from([
            "chatter-seed",
            "--database",
            ":memory:",
            "seed",
            "--force",
            "--no-link",
        ])
        .unwrap();
        assert_eq!(args.database.as_deref(), Some(":memory:"));
        match args.command {
            Command::Seed {
                force, no_link, ..
            } => {
                assert!(force);
                assert!(no_link);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
