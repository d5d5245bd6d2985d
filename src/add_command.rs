use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use log::{info, warn};

use crate::console::ConsolePresenter;
use crate::datetime;
use crate::entry_store::EntryStore;
use crate::time_entry::TimeEntry;
use crate::time_log::{NewEntry, TimeLog};
use crate::time_slot::parse_time;

/// エントリーを追加するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct AddArgs {
    #[clap(short = 'm', long = "member", help = "Barn team member")]
    member: String,

    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(
        short = 's',
        long = "start",
        help = "Start time, e.g. 09:00 or \"09:00 AM\"",
        parse(try_from_str = parse_time),
    )]
    start: NaiveTime,

    #[clap(
        short = 'e',
        long = "end",
        help = "End time, e.g. 11:30 or \"11:30 AM\"",
        parse(try_from_str = parse_time),
    )]
    end: NaiveTime,

    #[clap(
        short = 'r',
        long = "rate",
        help = "Hourly rate. Defaults to the first configured rate"
    )]
    rate: Option<u32>,
}

pub struct AddCommand<'a, S: EntryStore, P: ConsolePresenter> {
    time_log: &'a mut TimeLog<S>,
    presenter: &'a mut P,
}

impl<'a, S: EntryStore, P: ConsolePresenter> AddCommand<'a, S, P> {
    /// 新しい`AddCommand`を返す。
    ///
    /// # Arguments
    /// * `time_log` - エントリーの記録
    /// * `presenter` - 結果の表示先
    pub fn new(time_log: &'a mut TimeLog<S>, presenter: &'a mut P) -> Self {
        Self {
            time_log,
            presenter,
        }
    }

    /// `add`サブコマンドの処理を行う。
    ///
    /// 入力が不正な場合は警告を表示し、エントリーは追加しない。
    /// 日付が指定されていない場合は、Localタイムゾーンで今日の日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `args` - `add`サブコマンドの引数
    pub async fn run(&mut self, args: AddArgs) -> Result<Option<TimeEntry>> {
        let hourly_rate = match args.rate {
            Some(rate) => rate,
            None => *self
                .time_log
                .settings()
                .hourly_rates
                .first()
                .context("No hourly rate is configured")?,
        };
        let input = NewEntry {
            member: args.member,
            date: args.date.unwrap_or_else(datetime::today),
            start: args.start,
            end: args.end,
            hourly_rate,
        };

        let entry = match self.time_log.validate(&input) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Rejected entry {:?}: {}", input, err);
                self.presenter.show_warning(&err.to_string())?;
                return Ok(None);
            }
        };
        self.time_log.add(entry.clone()).await?;
        info!("Entry added successfully.");
        self.presenter.show_notice("Entry added!")?;

        Ok(Some(entry))
    }
}

/// 日付をパースする。
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Failed to parse date: {}", s))
}
