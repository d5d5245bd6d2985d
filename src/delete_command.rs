use std::collections::BTreeSet;

use anyhow::Result;
use log::warn;

use crate::console::ConsolePresenter;
use crate::entry_row::format_date;
use crate::entry_store::EntryStore;
use crate::time_entry::TimeEntry;
use crate::time_log::TimeLog;

/// エントリーを削除するためのサブコマンド。
///
/// 位置は`list`サブコマンドで表示される`#`の値。
#[derive(Debug, clap::Args)]
pub struct DeleteArgs {
    #[clap(required = true, help = "Positions of the entries to delete, as shown by `list`")]
    indices: Vec<usize>,
}

pub struct DeleteCommand<'a, S: EntryStore, P: ConsolePresenter> {
    time_log: &'a mut TimeLog<S>,
    presenter: &'a mut P,
}

impl<'a, S: EntryStore, P: ConsolePresenter> DeleteCommand<'a, S, P> {
    /// 新しい`DeleteCommand`を返す。
    pub fn new(time_log: &'a mut TimeLog<S>, presenter: &'a mut P) -> Self {
        Self {
            time_log,
            presenter,
        }
    }

    /// `delete`サブコマンドの処理を行う。
    ///
    /// 存在しない位置が含まれる場合は警告を表示し、何も削除しない。
    pub async fn run(&mut self, args: DeleteArgs) -> Result<Vec<TimeEntry>> {
        let indices: BTreeSet<usize> = args.indices.into_iter().collect();

        let removed = match self.time_log.delete(&indices).await? {
            Ok(removed) => removed,
            Err(err) => {
                warn!("Rejected deletion of {:?}: {}", indices, err);
                self.presenter.show_warning(&err.to_string())?;
                return Ok(vec![]);
            }
        };
        for entry in &removed {
            self.presenter.show_notice(&format!(
                "Deleted {} on {}",
                entry.member(),
                format_date(entry.date())
            ))?;
        }
        self.presenter.show_notice("Selected entries deleted.")?;

        Ok(removed)
    }
}
