mod logs;
mod server;

use clap::{Parser, Subcommand};
use promptlog_lib::{LogFilter, NewLogEntry};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use self::logs::DataCommand;
use self::server::config::ServeConfig;

#[derive(Parser, Debug)]
#[command(name = "promptlog")]
#[command(version)]
#[command(about = "Record and query prompt/response interaction logs", long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Args, Debug)]
struct StoreArgs {
    /// Path to the JSON store file
    #[arg(long = "db", env = "DB_PATH")]
    db: Option<String>,

    /// Path to config file
    #[arg(short = 'c', long = "config", default_value = "promptlog.toml")]
    config: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        /// Port to listen on
        #[arg(short = 'p', long = "port", env = "PORT")]
        port: Option<u16>,

        /// Address to bind to
        #[arg(long = "hostname", env = "PROMPTLOG_HOSTNAME")]
        hostname: Option<String>,
    },
    /// Record a new log entry
    Add {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long = "prompt")]
        prompt: String,

        #[arg(long = "response")]
        response: String,

        /// Model or system that produced the response
        #[arg(short = 'e', long = "engine")]
        engine: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
    },
    /// List log entries, oldest first
    List {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(short = 'e', long = "engine")]
        engine: Option<String>,

        #[arg(short = 't', long = "tag")]
        tag: Option<String>,

        /// Maximum entries to print (1-100, default 20)
        #[arg(short = 'l', long = "limit")]
        limit: Option<String>,
    },
    /// Print a single log entry
    Show {
        #[command(flatten)]
        store: StoreArgs,

        id: String,
    },
    /// Delete a log entry
    Delete {
        #[command(flatten)]
        store: StoreArgs,

        id: String,
    },
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn db_path(store: StoreArgs) -> std::path::PathBuf {
    ServeConfig::load(&store.config).resolve_db_path(store.db)
}

#[tokio::main]
async fn main() {
    let cli = Args::parse();

    // Data commands print JSON on stdout; keep their stderr quiet by default.
    let default_level = match cli.cmd {
        Command::Serve { .. } => "info",
        _ => "warn",
    };
    init_logging(default_level);

    match cli.cmd {
        Command::Serve {
            store,
            port,
            hostname,
        } => {
            let settings = ServeConfig::load(&store.config).resolve(store.db, port, hostname);
            server::run_serve(settings).await
        }
        Command::Add {
            store,
            prompt,
            response,
            engine,
            tags,
        } => {
            let new = NewLogEntry {
                prompt,
                response,
                engine,
                tags,
            };
            logs::run(&db_path(store), DataCommand::Add(new))
        }
        Command::List {
            store,
            engine,
            tag,
            limit,
        } => logs::run(
            &db_path(store),
            DataCommand::List {
                filter: LogFilter { engine, tag },
                limit,
            },
        ),
        Command::Show { store, id } => logs::run(&db_path(store), DataCommand::Show { id }),
        Command::Delete { store, id } => logs::run(&db_path(store), DataCommand::Delete { id }),
    }
}
