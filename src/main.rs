use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

mod action;
mod add_command;
mod console;
mod csv_store;
mod datetime;
mod delete_command;
mod entry_row;
mod entry_store;
mod export;
mod export_command;
mod list_command;
mod logger;
mod session_command;
mod settings;
mod sheets;
mod summary;
mod summary_command;
mod time_entry;
mod time_log;
mod time_slot;

use action::{run_action, Action};
use console::ConsoleMarkdown;
use csv_store::CsvFileStore;
use entry_store::{EntryStore, MemoryStore};
use session_command::SessionCommand;
use settings::{Backend, Settings};
use sheets::{SheetStore, SheetsClient};
use time_log::TimeLog;

/// 厩舎スタッフの勤務時間を記録し、給与計算期間ごとに集計するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- add --member Sky --start 09:00 --end 11:30
/// $ cargo run -- summary --month 2024-01 --period 1 --messages
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(long = "config", global = true, help = "Path to the config file")]
    config: Option<PathBuf>,

    #[clap(short = 'v', long = "verbose", global = true, help = "Show info logs")]
    verbose: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    #[clap(flatten)]
    Action(Action),
    /// Read commands line by line from stdin until `quit`
    Session,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logger::init(args.verbose)?;
    let settings = Settings::load(args.config.as_deref())?;

    match settings.store.backend {
        Backend::Memory => run(MemoryStore::new(), settings, args.subcommand).await,
        Backend::Csv => {
            let store = CsvFileStore::open(settings.store.csv_path()?)?;
            info!("Using CSV store: {}", store.path().display());
            run(store, settings, args.subcommand).await
        }
        Backend::Sheets => {
            let store = SheetStore::connect(SheetsClient::new(&settings.sheets)?).await?;
            run(store, settings, args.subcommand).await
        }
    }
}

/// 保存先を決めた上でサブコマンドを実行する。
async fn run<S: EntryStore>(store: S, settings: Settings, subcommand: SubCommands) -> Result<()> {
    let mut time_log = TimeLog::new(store, settings)?;
    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdown::new(&mut stdout);

    match subcommand {
        SubCommands::Action(action) => run_action(action, &mut time_log, &mut presenter).await,
        SubCommands::Session => {
            let stdin = io::stdin();
            SessionCommand::new(&mut time_log, &mut presenter)
                .run(stdin.lock())
                .await
                .map(|_| ())
        }
    }
}
