use anyhow::Result;
use log::info;

use crate::console::ConsolePresenter;
use crate::entry_store::EntryStore;
use crate::time_log::TimeLog;

/// `list`サブコマンド。記録されている全てのエントリーを追記順に表示する。
pub struct ListCommand<'a, S: EntryStore, P: ConsolePresenter> {
    time_log: &'a TimeLog<S>,
    presenter: &'a mut P,
}

impl<'a, S: EntryStore, P: ConsolePresenter> ListCommand<'a, S, P> {
    pub fn new(time_log: &'a TimeLog<S>, presenter: &'a mut P) -> Self {
        Self {
            time_log,
            presenter,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let entries = self.time_log.entries().await?;
        info!("Time entries retrieved successfully. ({} entries)", entries.len());

        self.presenter.show_entries(&entries)
    }
}

/// `options`サブコマンド。選択可能なメンバー、時給、時刻を表示する。
pub struct OptionsCommand<'a, S: EntryStore, P: ConsolePresenter> {
    time_log: &'a TimeLog<S>,
    presenter: &'a mut P,
}

impl<'a, S: EntryStore, P: ConsolePresenter> OptionsCommand<'a, S, P> {
    pub fn new(time_log: &'a TimeLog<S>, presenter: &'a mut P) -> Self {
        Self {
            time_log,
            presenter,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let settings = self.time_log.settings();

        self.presenter.show_options(
            &settings.roster,
            &settings.hourly_rates,
            self.time_log.slots(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{ListCommand, OptionsCommand};
    use crate::console::MockConsolePresenter;
    use crate::time_log::tests::{new_entry, time, time_log};

    #[tokio::test]
    async fn test_list_command() {
        let mut time_log = time_log();
        for member in ["Sky", "Izzy"] {
            let entry = time_log
                .validate(&new_entry(member, 5, time(9, 0), time(10, 0)))
                .unwrap();
            time_log.add(entry).await.unwrap();
        }
        let mut presenter = MockConsolePresenter::new();
        presenter
            .expect_show_entries()
            .withf(|entries| {
                entries.len() == 2 && entries[0].member() == "Sky" && entries[1].member() == "Izzy"
            })
            .times(1)
            .returning(|_| Ok(()));

        let result = ListCommand::new(&time_log, &mut presenter).run().await;

        assert!(result.is_ok());
    }

    #[test]
    fn test_options_command() {
        let time_log = time_log();
        let mut presenter = MockConsolePresenter::new();
        presenter
            .expect_show_options()
            .withf(|roster, rates, slots| {
                roster.len() == 6 && rates.to_vec() == vec![15, 17] && slots.len() == 28
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let result = OptionsCommand::new(&time_log, &mut presenter).run();

        assert!(result.is_ok());
    }
}
