use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use log::info;

use crate::entry_store::EntryStore;
use crate::settings::Settings;
use crate::summary::{member_messages, summarize, MemberMessage, MemberSummary};
use crate::time_entry::{EntryError, PayPeriod, TimeEntry, YearMonth};

/// ユーザーが入力したエントリー。
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub member: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub hourly_rate: u32,
}

/// タイムエントリーの記録を管理する。
///
/// 保存先と設定を保持し、入力の検証と集計を行う。
pub struct TimeLog<S: EntryStore> {
    store: S,
    settings: Settings,
    slots: Vec<NaiveTime>,
}

impl<S: EntryStore> TimeLog<S> {
    /// 新しい`TimeLog`を返す。
    ///
    /// # Arguments
    ///
    /// * `store` - エントリーの保存先
    /// * `settings` - メンバー、時給、選択可能な時刻の設定
    pub fn new(store: S, settings: Settings) -> Result<Self> {
        let slots = settings.slots().context("Failed to generate time slots")?;

        Ok(Self {
            store,
            settings,
            slots,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 選択可能な時刻の一覧を返す。
    pub fn slots(&self) -> &[NaiveTime] {
        &self.slots
    }

    /// 入力を検証し、タイムエントリーを作成する。
    ///
    /// メンバー名は大文字小文字を区別せずに照合し、設定されている表記に揃える。
    pub fn validate(&self, input: &NewEntry) -> Result<TimeEntry, EntryError> {
        let member = input.member.trim();
        if member.is_empty() {
            return Err(EntryError::EmptyMember);
        }
        let member = match self
            .settings
            .roster
            .iter()
            .find(|name| name.eq_ignore_ascii_case(member))
        {
            Some(name) => name.clone(),
            None if self.settings.allow_free_text => member.to_string(),
            None => return Err(EntryError::UnknownMember(member.to_string())),
        };

        if !self.settings.hourly_rates.contains(&input.hourly_rate) {
            return Err(EntryError::RateNotAllowed(input.hourly_rate));
        }
        for time in [input.start, input.end] {
            if !self.slots.contains(&time) {
                return Err(EntryError::TimeOffGrid(time));
            }
        }

        TimeEntry::new(member, input.date, input.start, input.end, input.hourly_rate)
    }

    /// 検証済みのエントリーを追加する。
    pub async fn add(&mut self, entry: TimeEntry) -> Result<()> {
        self.store
            .append(entry.clone())
            .await
            .context("Failed to store entry")?;
        info!(
            "Added entry: {} on {} ({} hrs, ${})",
            entry.member(),
            entry.date(),
            entry.hours_worked(),
            entry.pay()
        );

        Ok(())
    }

    /// 全てのエントリーを追記順で返す。
    pub async fn entries(&self) -> Result<Vec<TimeEntry>> {
        self.store.list().await.context("Failed to read entries")
    }

    /// 指定された位置のエントリーを削除し、削除したエントリーを返す。
    ///
    /// 範囲外の位置が含まれる場合は何も削除せずに検証エラーを返す。
    pub async fn delete(
        &mut self,
        indices: &BTreeSet<usize>,
    ) -> Result<Result<Vec<TimeEntry>, EntryError>> {
        let len = self.entries().await?.len();
        if let Some(&index) = indices.iter().find(|&&index| index >= len) {
            return Ok(Err(EntryError::IndexOutOfRange { index, len }));
        }
        if indices.is_empty() {
            return Ok(Ok(vec![]));
        }

        let removed = self
            .store
            .delete(indices)
            .await
            .context("Failed to delete entries")?;
        info!("Deleted {} entries", removed.len());

        Ok(Ok(removed))
    }

    /// 指定された月と給与計算期間をメンバーごとに集計する。
    pub async fn summary(
        &self,
        month: YearMonth,
        period: PayPeriod,
    ) -> Result<Vec<MemberSummary>> {
        Ok(summarize(&self.entries().await?, month, period))
    }

    /// 指定された月と給与計算期間のメンバーごとのメッセージを作成する。
    pub async fn messages(
        &self,
        month: YearMonth,
        period: PayPeriod,
    ) -> Result<Vec<MemberMessage>> {
        Ok(member_messages(&self.entries().await?, month, period))
    }
}
