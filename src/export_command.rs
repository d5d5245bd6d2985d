use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use crate::console::ConsolePresenter;
use crate::entry_store::EntryStore;
use crate::export::{write_entries_csv, write_summary_csv};
use crate::summary_command::PeriodArgs;
use crate::time_log::TimeLog;

/// エントリーまたは集計結果をCSVで出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ExportArgs {
    #[clap(
        short = 'o',
        long = "output",
        help = "Writes the CSV to a file instead of stdout"
    )]
    output: Option<PathBuf>,

    #[clap(subcommand)]
    target: ExportTarget,
}

/// 出力する表。
#[derive(Debug, clap::Subcommand)]
pub enum ExportTarget {
    /// All logged entries
    Entries,
    /// Summary of a pay period
    Summary(PeriodArgs),
}

pub struct ExportCommand<'a, S: EntryStore, P: ConsolePresenter> {
    time_log: &'a TimeLog<S>,
    presenter: &'a mut P,
}

impl<'a, S: EntryStore, P: ConsolePresenter> ExportCommand<'a, S, P> {
    /// 新しい`ExportCommand`を返す。
    pub fn new(time_log: &'a TimeLog<S>, presenter: &'a mut P) -> Self {
        Self {
            time_log,
            presenter,
        }
    }

    /// `export`サブコマンドの処理を行う。
    ///
    /// 出力先のファイルが指定されていない場合は`stdout`に書き出す。
    ///
    /// # Arguments
    ///
    /// * `args` - `export`サブコマンドの引数
    /// * `stdout` - ファイルが指定されていない場合の出力先
    pub async fn run<W: Write>(&mut self, args: ExportArgs, stdout: W) -> Result<()> {
        match &args.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let rows = self.write(&args.target, file).await?;
                info!("Exported {} rows to {}", rows, path.display());
                self.presenter
                    .show_notice(&format!("Saved {} rows to {}", rows, path.display()))
            }
            None => self.write(&args.target, stdout).await.map(|_| ()),
        }
    }

    /// CSVを書き出し、書き出した行数を返す。
    async fn write<W: Write>(&self, target: &ExportTarget, writer: W) -> Result<usize> {
        match target {
            ExportTarget::Entries => {
                let entries = self.time_log.entries().await?;
                write_entries_csv(writer, &entries)?;
                Ok(entries.len())
            }
            ExportTarget::Summary(period) => {
                let (month, period) = period.resolve();
                let summaries = self.time_log.summary(month, period).await?;
                write_summary_csv(writer, &summaries)?;
                Ok(summaries.len())
            }
        }
    }
}
