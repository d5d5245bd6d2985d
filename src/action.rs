use std::io;

use anyhow::Result;
use clap::Subcommand;

use crate::add_command::{AddArgs, AddCommand};
use crate::console::ConsolePresenter;
use crate::delete_command::{DeleteArgs, DeleteCommand};
use crate::entry_store::EntryStore;
use crate::export_command::{ExportArgs, ExportCommand};
use crate::list_command::{ListCommand, OptionsCommand};
use crate::summary_command::{SummaryArgs, SummaryCommand};
use crate::time_log::TimeLog;

/// 単発実行とセッションで共通の操作。
#[derive(Debug, Subcommand)]
pub enum Action {
    /// Log a shift for a barn team member
    Add(AddArgs),
    /// Show all logged entries
    List,
    /// Delete entries by their position in `list`
    Delete(DeleteArgs),
    /// Summarize hours and pay for a pay period
    Summary(SummaryArgs),
    /// Export entries or a summary as CSV
    Export(ExportArgs),
    /// Show the selectable members, rates and times
    Options,
}

/// 操作を実行する。
pub async fn run_action<S: EntryStore, P: ConsolePresenter>(
    action: Action,
    time_log: &mut TimeLog<S>,
    presenter: &mut P,
) -> Result<()> {
    match action {
        Action::Add(args) => {
            AddCommand::new(time_log, presenter).run(args).await?;
        }
        Action::List => ListCommand::new(time_log, presenter).run().await?,
        Action::Delete(args) => {
            DeleteCommand::new(time_log, presenter).run(args).await?;
        }
        Action::Summary(args) => {
            SummaryCommand::new(time_log, presenter).run(args).await?;
        }
        Action::Export(args) => {
            ExportCommand::new(time_log, presenter)
                .run(args, io::stdout())
                .await?
        }
        Action::Options => OptionsCommand::new(time_log, presenter).run()?,
    }

    Ok(())
}
