// コマンドハンドラー共通部
//
// スキーマファイルの読み込みと、設定ファイルプリセットと
// CLIフラグのマージを提供します。

pub mod diff;
pub mod refs;

use crate::core::config::Options;
use crate::core::error::DiffError;
use crate::core::naming;
use anyhow::Result;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// スキーマダンプファイルを読み込む
///
/// 読み込み失敗はエンジン実行前に `ExternalLoadFailure` として
/// 呼び出し元へ伝播します。
pub fn read_schema_file(path: &Path) -> Result<String, DiffError> {
    fs::read_to_string(path).map_err(|cause| DiffError::ExternalLoadFailure {
        path: path.display().to_string(),
        cause: cause.to_string(),
    })
}

/// 設定ファイルのプリセットとCLIフラグをマージ
///
/// 明示的なCLIフラグが優先されます。設定ファイルは指定があれば必須、
/// なければカレントディレクトリの既定ファイルを任意に読みます。
pub fn resolve_options(config_path: Option<&Path>, cli_options: Options) -> Result<Options> {
    let preset = match config_path {
        Some(path) => {
            let text = read_schema_file(path)?;
            Options::from_str(&text)?
        }
        None => {
            let default_path = Path::new(naming::CONFIG_FILE);
            if default_path.exists() {
                match fs::read_to_string(default_path) {
                    Ok(text) => Options::from_str(&text)?,
                    Err(cause) => {
                        debug!(%cause, "could not read default config; ignoring");
                        Options::default()
                    }
                }
            } else {
                Options::default()
            }
        }
    };

    let merged = Options {
        table_re: cli_options.table_re.or(preset.table_re),
        refs: cli_options.refs || preset.refs,
        only_both: cli_options.only_both || preset.only_both,
        keep_old_tables: cli_options.keep_old_tables || preset.keep_old_tables,
        list_tables: cli_options.list_tables || preset.list_tables,
        no_old_defs: cli_options.no_old_defs || preset.no_old_defs,
        tolerant: cli_options.tolerant || preset.tolerant,
        save_quotes: cli_options.save_quotes || preset.save_quotes,
        run_time: cli_options.run_time,
    };
    merged.validate()?;
    Ok(merged)
}
