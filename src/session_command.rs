use std::io::BufRead;
use std::iter;

use anyhow::{bail, Context, Result};
use clap::{ErrorKind, Parser};
use log::{info, warn};

use crate::action::{run_action, Action};
use crate::console::ConsolePresenter;
use crate::entry_store::EntryStore;
use crate::time_log::TimeLog;

/// セッション中に入力される1行分のコマンド。
#[derive(Debug, Parser)]
#[clap(name = "session")]
struct SessionLine {
    #[clap(subcommand)]
    action: Action,
}

/// 1行ずつコマンドを読み込んで実行する`session`サブコマンド。
///
/// `quit`、`exit`の入力または入力の終端で終了する。
pub struct SessionCommand<'a, S: EntryStore, P: ConsolePresenter> {
    time_log: &'a mut TimeLog<S>,
    presenter: &'a mut P,
}

impl<'a, S: EntryStore, P: ConsolePresenter> SessionCommand<'a, S, P> {
    /// 新しい`SessionCommand`を返す。
    pub fn new(time_log: &'a mut TimeLog<S>, presenter: &'a mut P) -> Self {
        Self {
            time_log,
            presenter,
        }
    }

    /// セッションを実行し、実行したコマンドの数を返す。
    ///
    /// コマンドの解析や実行に失敗しても警告を表示してセッションは継続する。
    ///
    /// # Arguments
    ///
    /// * `reader` - コマンドの読み込み元
    pub async fn run<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        self.presenter
            .show_notice("Session started. Type `help` for commands, `quit` to exit.")?;

        let mut executed = 0;
        for line in reader.lines() {
            let line = line.context("Failed to read command")?;
            let words = match split_words(&line) {
                Ok(words) => words,
                Err(err) => {
                    self.presenter.show_warning(&err.to_string())?;
                    continue;
                }
            };
            match words.first().map(String::as_str) {
                None => continue,
                Some("quit") | Some("exit") => break,
                Some(_) => {}
            }

            let args = iter::once("session".to_string()).chain(words);
            let action = match SessionLine::try_parse_from(args) {
                Ok(parsed) => parsed.action,
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
                    ) =>
                {
                    self.presenter.show_notice(err.to_string().trim_end())?;
                    continue;
                }
                Err(err) => {
                    self.presenter.show_warning(err.to_string().trim_end())?;
                    continue;
                }
            };

            info!("Running session command: {:?}", action);
            if let Err(err) = run_action(action, self.time_log, self.presenter).await {
                warn!("Session command failed: {:?}", err);
                self.presenter.show_warning(&format!("{:#}", err))?;
                continue;
            }
            executed += 1;
        }
        info!("Session finished. ({} commands)", executed);

        Ok(executed)
    }
}

/// 1行を空白で単語に分割する。
///
/// シングルクォートまたはダブルクォートで囲まれた部分は1つの単語として扱う。
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current: Option<String> = None;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.get_or_insert_with(String::new).push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                current.get_or_insert_with(String::new);
            }
            (None, c) if c.is_whitespace() => {
                if let Some(word) = current.take() {
                    words.push(word);
                }
            }
            (None, c) => current.get_or_insert_with(String::new).push(c),
        }
    }
    if let Some(q) = quote {
        bail!("Unclosed quote: {}", q);
    }
    words.extend(current);

    Ok(words)
}
