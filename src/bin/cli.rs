//! flatstore CLI
//!
//! Command-line driver over a directory holding `users.csv`, `posts.csv`
//! and `engagements.csv`. Any store error is fatal: it is logged and the
//! process exits with status 1.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use flatstore::storage::ensure_table_file;
use flatstore::{
    Config, Engagement, LoadMode, RecordId, StoreError, SyncMode, TableKind, TableStore,
};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

/// flatstore CLI
#[derive(Parser, Debug)]
#[command(name = "flatstore-cli")]
#[command(about = "Three-table flat-file record store")]
#[command(version)]
struct Args {
    /// Directory holding the three table files
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Load with the parallel loader
    #[arg(short, long)]
    parallel: bool,

    /// Skip fsync on rewrites and appends
    #[arg(short, long)]
    buffered: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create missing table files with their headers
    Init,

    /// Load the tables and print row counts
    Load,

    /// Add to a post's view count
    Views {
        post_id: RecordId,

        /// Amount to add (may be negative)
        #[arg(allow_negative_numbers = true)]
        delta: i32,
    },

    /// Append an engagement
    Engage {
        id: RecordId,
        post_id: RecordId,
        username: String,
        /// like, comment, ...
        kind: String,
        #[arg(default_value = "")]
        comment: String,
        #[arg(default_value = "0")]
        timestamp: i32,
    },

    /// Rename a user in every table
    Rename {
        user_id: RecordId,
        new_username: String,
    },

    /// List a user's comments
    Comments { user_id: RecordId },

    /// Count likes and comments by users in a location
    Location { location: String },

    /// Check referential integrity of the loaded tables
    Verify,

    /// Print one table as JSON lines
    Dump {
        #[arg(value_enum)]
        table: TableArg,
    },

    /// Time both loaders and check they commit the same tables
    CompareLoaders {
        /// Timed runs per loader (median is reported)
        #[arg(short, long, default_value = "5")]
        runs: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TableArg {
    Users,
    Posts,
    Engagements,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flatstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::debug!("flatstore v{}", flatstore::VERSION);
    tracing::debug!("Data directory: {}", args.data_dir.display());

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> flatstore::Result<()> {
    let sync_mode = if args.buffered {
        SyncMode::Buffered
    } else {
        SyncMode::Fsync
    };
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .sync_mode(sync_mode)
        .build();
    let mode = if args.parallel {
        LoadMode::Parallel
    } else {
        LoadMode::Sequential
    };

    match args.command {
        Commands::Init => {
            for table in TableKind::ALL {
                let path = config.path_for(table);
                if ensure_table_file(path, table)? {
                    println!("created {}", path.display());
                } else {
                    println!("exists  {}", path.display());
                }
            }
            Ok(())
        }
        Commands::CompareLoaders { runs } => compare_loaders(&config, runs.max(1)),
        command => {
            let store = TableStore::new(config);
            let stats = store.load_with(mode)?;
            if let Commands::Load = command {
                println!(
                    "users={} posts={} engagements={} malformed={} dangling={}",
                    stats.users, stats.posts, stats.engagements, stats.malformed, stats.dangling
                );
                return Ok(());
            }
            execute(&store, command)
        }
    }
}

fn execute(store: &TableStore, command: Commands) -> flatstore::Result<()> {
    match command {
        Commands::Views { post_id, delta } => {
            if store.update_post_views(post_id, delta)? {
                let views = store.posts().get(&post_id).map(|p| p.views).unwrap_or(0);
                println!("post {} views={}", post_id, views);
            } else {
                println!("post {} not found", post_id);
            }
        }
        Commands::Engage {
            id,
            post_id,
            username,
            kind,
            comment,
            timestamp,
        } => {
            let record = Engagement::new(id, post_id, username, kind.as_str(), comment, timestamp);
            if store.add_engagement(record)? {
                println!("engagement {} added", id);
            } else {
                println!("engagement {} rejected: unknown post or user", id);
            }
        }
        Commands::Rename {
            user_id,
            new_username,
        } => {
            if store.rename_user(user_id, &new_username)? {
                println!("user {} is now {}", user_id, new_username);
            } else {
                println!("user {} not renamed", user_id);
            }
        }
        Commands::Comments { user_id } => {
            for (post_id, comment) in store.get_all_user_comments(user_id) {
                println!("{}\t{}", post_id, comment);
            }
        }
        Commands::Location { location } => {
            let (likes, comments) = store.get_all_engagements_by_location(&location);
            println!("likes={} comments={}", likes, comments);
        }
        Commands::Verify => {
            let report = store.verify_integrity();
            println!("{}", to_json(&report)?);
            if !report.is_clean() {
                std::process::exit(2);
            }
        }
        Commands::Dump { table } => match table {
            TableArg::Users => print_rows(store.users().values())?,
            TableArg::Posts => print_rows(store.posts().values())?,
            TableArg::Engagements => print_rows(store.engagements().values())?,
        },
        Commands::Init | Commands::Load | Commands::CompareLoaders { .. } => {
            unreachable!("handled before the tables are loaded")
        }
    }
    Ok(())
}

fn compare_loaders(config: &Config, runs: usize) -> flatstore::Result<()> {
    // Warm-up to populate the page cache
    TableStore::new(config.clone()).load()?;

    let mut sequential = Vec::with_capacity(runs);
    let mut parallel = Vec::with_capacity(runs);
    for _ in 0..runs {
        sequential.push(time_load(config, LoadMode::Sequential)?);
    }
    for _ in 0..runs {
        parallel.push(time_load(config, LoadMode::Parallel)?);
    }

    println!("sequential median: {:?}", median(sequential));
    println!("parallel median:   {:?}", median(parallel));

    let a = TableStore::new(config.clone());
    a.load()?;
    let b = TableStore::new(config.clone());
    b.load_parallel()?;
    if a.snapshot() != b.snapshot() {
        return Err(StoreError::Loader(
            "sequential and parallel loaders committed different tables".to_string(),
        ));
    }
    println!("loaders agree");
    Ok(())
}

fn time_load(config: &Config, mode: LoadMode) -> flatstore::Result<Duration> {
    let store = TableStore::new(config.clone());
    let start = Instant::now();
    store.load_with(mode)?;
    Ok(start.elapsed())
}

fn median(mut samples: Vec<Duration>) -> Duration {
    samples.sort();
    samples[samples.len() / 2]
}

fn print_rows<'a, R: Serialize + 'a>(rows: impl Iterator<Item = &'a R>) -> flatstore::Result<()> {
    for row in rows {
        println!("{}", to_json(row)?);
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> flatstore::Result<String> {
    serde_json::to_string(value).map_err(|e| StoreError::Io(e.into()))
}
