use anyhow::Result;
use log::info;

use crate::console::ConsolePresenter;
use crate::datetime;
use crate::entry_store::EntryStore;
use crate::summary::MemberSummary;
use crate::time_entry::{PayPeriod, YearMonth};
use crate::time_log::TimeLog;

/// 集計対象の月と給与計算期間を指定する引数。
#[derive(Debug, Default, clap::Args)]
pub struct PeriodArgs {
    #[clap(
        short = 'm',
        long = "month",
        help = "Sets a custom month in the format YYYY-MM or \"January 2024\""
    )]
    pub month: Option<YearMonth>,

    #[clap(
        short = 'p',
        long = "period",
        help = "Pay period: 1 (days 1-15) or 2 (days 16-end of month)"
    )]
    pub period: Option<PayPeriod>,
}

impl PeriodArgs {
    /// 集計対象の月と給与計算期間を返す。
    ///
    /// 指定されていない場合は、Localタイムゾーンで今日の日付が属する月と給与計算期間を利用する。
    pub fn resolve(&self) -> (YearMonth, PayPeriod) {
        let today = datetime::today();
        (
            self.month.unwrap_or_else(|| YearMonth::of(today)),
            self.period.unwrap_or_else(|| PayPeriod::of(today)),
        )
    }
}

/// 給与計算期間ごとの集計を表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct SummaryArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    #[clap(long = "messages", help = "Show a message for each barn team member")]
    messages: bool,
}

pub struct SummaryCommand<'a, S: EntryStore, P: ConsolePresenter> {
    time_log: &'a TimeLog<S>,
    presenter: &'a mut P,
}

impl<'a, S: EntryStore, P: ConsolePresenter> SummaryCommand<'a, S, P> {
    /// 新しい`SummaryCommand`を返す。
    pub fn new(time_log: &'a TimeLog<S>, presenter: &'a mut P) -> Self {
        Self {
            time_log,
            presenter,
        }
    }

    /// `summary`サブコマンドの処理を行う。
    ///
    /// 指定された月と給与計算期間のエントリーをメンバーごとに集計して表示する。
    /// 該当するエントリーがない場合もエラーにはしない。
    ///
    /// # Arguments
    ///
    /// * `args` - `summary`サブコマンドの引数
    pub async fn run(&mut self, args: SummaryArgs) -> Result<Vec<MemberSummary>> {
        let (month, period) = args.period.resolve();
        info!("Summarizing {} of {}", period, month);

        let summaries = self.time_log.summary(month, period).await?;
        self.presenter.show_summary(month, period, &summaries)?;

        if args.messages && !summaries.is_empty() {
            let messages = self.time_log.messages(month, period).await?;
            for message in &messages {
                info!("Message created for {}", message.member);
            }
            self.presenter.show_messages(&messages)?;
        }

        Ok(summaries)
    }
}
