//! アプリケーションの設定。
//!
//! 既定値、TOMLの設定ファイル、`BARN_HOURS`で始まる環境変数の順に上書きする。
//! 環境変数でネストしたキーを指定する場合は`__`で区切る。(例: `BARN_HOURS_STORE__BACKEND=sheets`)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveTime;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::time_slot::{generate_time_slots, parse_time};

/// エントリーの保存先。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// プロセス内のみで保持する。
    Memory,
    /// ローカルのCSVファイルに保存する。
    Csv,
    /// Google Sheetsに保存する。
    Sheets,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeSlotSettings {
    pub start: String,
    pub end: String,
    pub interval_minutes: u32,
}

impl Default for TimeSlotSettings {
    fn default() -> Self {
        Self {
            start: "08:30".to_string(),
            end: "22:00".to_string(),
            interval_minutes: 30,
        }
    }
}

impl TimeSlotSettings {
    /// 設定から選択可能な時刻の一覧を生成する。
    pub fn slots(&self) -> Result<Vec<NaiveTime>> {
        let start = parse_time(&self.start).context("Invalid time_slots.start")?;
        let end = parse_time(&self.end).context("Invalid time_slots.end")?;

        generate_time_slots(start, end, self.interval_minutes)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: Backend,
    /// CSVファイルのパス。指定がない場合はデータディレクトリ配下を利用する。
    pub csv_path: Option<PathBuf>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Csv,
            csv_path: None,
        }
    }
}

impl StoreSettings {
    /// CSVファイルのパスを返す。
    pub fn csv_path(&self) -> Result<PathBuf> {
        match &self.csv_path {
            Some(path) => Ok(path.clone()),
            None => {
                let data_dir = dirs::data_dir().context("Failed to locate data directory")?;
                Ok(data_dir.join("barn-hours").join("entries.csv"))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetsSettings {
    pub api_url: String,
    pub spreadsheet_id: Option<String>,
    pub sheet_name: String,
}

impl Default for SheetsSettings {
    fn default() -> Self {
        Self {
            api_url: "https://sheets.googleapis.com/v4".to_string(),
            spreadsheet_id: None,
            sheet_name: "Sheet1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 選択可能なメンバー。
    pub roster: Vec<String>,
    /// `roster`にないメンバー名を許可するか。
    pub allow_free_text: bool,
    /// 選択可能な時給。
    pub hourly_rates: Vec<u32>,
    pub time_slots: TimeSlotSettings,
    pub store: StoreSettings,
    pub sheets: SheetsSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roster: ["Sky", "Giselle", "Hannah", "Gabe", "Izzy", "Mia"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            allow_free_text: false,
            hourly_rates: vec![15, 17],
            time_slots: TimeSlotSettings::default(),
            store: StoreSettings::default(),
            sheets: SheetsSettings::default(),
        }
    }
}

impl Settings {
    /// 設定を読み込む。
    ///
    /// `path`が指定されていない場合は`<config_dir>/barn-hours/config.toml`を読み込む。
    /// 既定の設定ファイルは存在しなくても良いが、指定されたファイルは存在する必要がある。
    ///
    /// # Arguments
    ///
    /// * `path` - 設定ファイルのパス
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => {
                let default_path = dirs::config_dir()
                    .map(|dir| dir.join("barn-hours").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from("config.toml"));
                File::from(default_path).required(false)
            }
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("BARN_HOURS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        settings.slots().context("Invalid time slot settings")?;

        Ok(settings)
    }

    /// 選択可能な時刻の一覧を返す。
    pub fn slots(&self) -> Result<Vec<NaiveTime>> {
        self.time_slots.slots()
    }
}
