use std::collections::BTreeMap;

use serde::Serialize;

use crate::entry_row::format_date;
use crate::time_entry::{round2, PayPeriod, TimeEntry, YearMonth};

/// メンバーごとの集計結果。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberSummary {
    #[serde(rename = "Barn Team Member")]
    pub member: String,
    #[serde(rename = "Total Hours")]
    pub total_hours: f64,
    #[serde(rename = "Total Pay")]
    pub total_pay: f64,
}

/// メンバーに送る集計メッセージ。
#[derive(Debug, Clone, PartialEq)]
pub struct MemberMessage {
    pub member: String,
    pub text: String,
}

/// 指定された月と給与計算期間に含まれるエントリーを返す。
pub fn filter_entries<'a>(
    entries: &'a [TimeEntry],
    month: YearMonth,
    period: PayPeriod,
) -> Vec<&'a TimeEntry> {
    entries
        .iter()
        .filter(|entry| entry.month() == month && entry.pay_period() == period)
        .collect()
}

/// メンバーごとにエントリーをまとめる。メンバー名の順に並べ、各メンバー内は追記順を保つ。
fn group_by_member<'a>(entries: &[&'a TimeEntry]) -> BTreeMap<&'a str, Vec<&'a TimeEntry>> {
    entries.iter().fold(BTreeMap::new(), |mut acc, &entry| {
        acc.entry(entry.member()).or_default().push(entry);
        acc
    })
}

/// 指定された月と給与計算期間のエントリーをメンバーごとに集計する。
///
/// 勤務時間と給与の合計は小数点以下2桁で丸める。該当するエントリーがない場合は空の結果を返す。
///
/// # Arguments
///
/// * `entries` - 全てのエントリー
/// * `month` - 集計する月
/// * `period` - 集計する給与計算期間
pub fn summarize(entries: &[TimeEntry], month: YearMonth, period: PayPeriod) -> Vec<MemberSummary> {
    let filtered = filter_entries(entries, month, period);

    group_by_member(&filtered)
        .into_iter()
        .map(|(member, entries)| MemberSummary {
            member: member.to_string(),
            total_hours: round2(entries.iter().map(|entry| entry.hours_worked()).sum()),
            total_pay: round2(entries.iter().map(|entry| entry.pay()).sum()),
        })
        .collect()
}

/// メンバーごとに集計メッセージを作成する。
///
/// 各エントリーの日付、勤務時間、給与と、最後に合計を1行ずつ記載する。
pub fn member_messages(
    entries: &[TimeEntry],
    month: YearMonth,
    period: PayPeriod,
) -> Vec<MemberMessage> {
    let filtered = filter_entries(entries, month, period);

    group_by_member(&filtered)
        .into_iter()
        .map(|(member, entries)| {
            let mut lines = vec![format!("{} - {}, {}", member, period, month)];
            lines.extend(entries.iter().map(|entry| {
                format!(
                    "{}: {:.2} hrs, ${:.2}",
                    format_date(entry.date()),
                    entry.hours_worked(),
                    entry.pay()
                )
            }));
            let total_hours = round2(entries.iter().map(|entry| entry.hours_worked()).sum());
            let total_pay = round2(entries.iter().map(|entry| entry.pay()).sum());
            lines.push(format!("Total: {:.2} hrs, ${:.2}", total_hours, total_pay));

            MemberMessage {
                member: member.to_string(),
                text: lines.join("\n"),
            }
        })
        .collect()
}
