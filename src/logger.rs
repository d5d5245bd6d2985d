use std::io;

use anyhow::{Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// このクレートのログレベルを返す。
///
/// 通常は警告以上のみを出力し、`--verbose`が指定された場合は情報も出力する。
pub fn level_filter(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    }
}

/// ログの出力先を`stderr`に設定する。
///
/// `stdout`はCSVの出力にも利用するため、ログは混ぜない。
pub fn init(verbose: bool) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for(env!("CARGO_CRATE_NAME"), level_filter(verbose))
        .chain(io::stderr())
        .apply()
        .context("Failed to initialize logger")
}
