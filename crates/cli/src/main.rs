mod app;
mod repl;

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    threadsage_auto_reply::{DEFAULT_QUEUE_CAPACITY, DispatchWorker},
    threadsage_config::{ThreadsageConfig, load_config},
    tracing::info,
    tracing_subscriber::EnvFilter,
};

#[derive(Parser)]
#[command(
    name = "threadsage",
    version,
    about = "Answers questions in one chat from a corpus of past threads"
)]
struct Cli {
    /// Path to threadsage.toml.
    #[arg(long, global = true, env = "THREADSAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the Telegram bot.
    Serve,
    /// Ask questions from the terminal.
    Repl {
        /// Read threads from a JSON array instead of the SQLite database.
        #[arg(long)]
        threads_json: Option<PathBuf>,
    },
    /// Validate config, corpus and thread store without calling any API.
    Check,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,threadsage=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Serve => serve(config).await,
        Command::Repl { threads_json } => {
            if config.chat.channel_id.is_empty() {
                config.chat.channel_id = repl::REPL_CHANNEL.into();
            }
            let dispatcher = app::build_dispatcher(&mut config, threads_json.as_deref()).await?;
            repl::run(dispatcher).await
        },
        Command::Check => {
            let report = app::check(&config).await?;
            println!("corpus:        {} rows x {} dims", report.corpus_rows, report.corpus_dims);
            if report.off_unit_norm > 0 {
                println!("               {} rows are not unit length", report.off_unit_norm);
            }
            match report.stored_threads {
                Some(n) => println!("thread store:  {n} threads"),
                None => println!("thread store:  {} not found", config.threads.db_path.display()),
            }
            println!("embeddings key: {}", if report.embeddings_key { "set" } else { "missing" });
            println!("generation key: {}", if report.generation_key { "set" } else { "missing" });
            println!("telegram token: {}", if report.telegram_token { "set" } else { "missing" });
            Ok(())
        },
    }
}

async fn serve(mut config: ThreadsageConfig) -> anyhow::Result<()> {
    if config.chat.channel_id.is_empty() {
        anyhow::bail!("chat.channel_id must be set (or THREADSAGE_CHANNEL_ID)");
    }
    let token = config
        .telegram
        .token
        .take()
        .context("set TELEGRAM_BOT_TOKEN")?;
    let dispatcher = app::build_dispatcher(&mut config, None).await?;
    let (handle, worker) = DispatchWorker::spawn(dispatcher, DEFAULT_QUEUE_CAPACITY);

    threadsage_telegram::run(&token, handle).await?;
    worker.await?;
    info!("shutdown complete");
    Ok(())
}
