// diffコマンドハンドラー
//
// 2つのスキーマダンプを解析し、差分エンジンを実行して
// アップグレードスクリプトを出力します。

use crate::core::config::Options;
use crate::services::plan_assembler::PlanAssembler;
use crate::services::schema_differ::SchemaDiffer;
use crate::services::schema_parser::SchemaParser;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use super::read_schema_file;

/// diffコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct DiffCommand {
    /// 変更前スキーマのダンプファイル
    pub from: PathBuf,
    /// 変更後スキーマのダンプファイル
    pub to: PathBuf,
    /// 出力先ファイル（未指定なら標準出力）
    pub output: Option<PathBuf>,
    /// エンジンオプション
    pub options: Options,
}

/// diffコマンドハンドラー
pub struct DiffCommandHandler;

impl DiffCommandHandler {
    /// diffコマンドを実行
    pub fn execute(command: &DiffCommand) -> Result<String> {
        let source_text = read_schema_file(&command.from)?;
        let target_text = read_schema_file(&command.to)?;

        let parser = SchemaParser::with_save_quotes(command.options.save_quotes);
        let source = parser
            .parse(&source_text, &command.from.display().to_string())
            .with_context(|| format!("Failed to parse {}", command.from.display()))?;
        let target = parser
            .parse(&target_text, &command.to.display().to_string())
            .with_context(|| format!("Failed to parse {}", command.to.display()))?;

        debug!(
            source_tables = source.table_count(),
            target_tables = target.table_count(),
            "schemas loaded"
        );

        let differ = SchemaDiffer::new(&source, &target, &command.options);
        let outcome = differ.diff();
        let plan = PlanAssembler::new(&command.options).assemble(
            outcome.changes,
            &outcome.workaround,
            &source,
            &target,
        );

        match &command.output {
            Some(path) => {
                fs::write(path, &plan)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(format!("Wrote upgrade script to {}", path.display()))
            }
            None => Ok(plan),
        }
    }
}
