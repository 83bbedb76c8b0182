// refsコマンドハンドラー
//
// スキーマダンプを解析し、フィルタされたテーブルの
// FK依存閉包を列挙します。

use crate::core::config::Options;
use crate::services::index_workaround::IndexWorkaround;
use crate::services::plan_assembler::PlanAssembler;
use crate::services::schema_differ::SchemaDiffer;
use crate::services::schema_parser::SchemaParser;
use anyhow::{Context, Result};
use std::path::PathBuf;

use super::read_schema_file;

/// refsコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct RefsCommand {
    /// 解析対象のダンプファイル
    pub from: PathBuf,
    /// エンジンオプション
    pub options: Options,
}

/// refsコマンドハンドラー
pub struct RefsCommandHandler;

impl RefsCommandHandler {
    /// refsコマンドを実行
    pub fn execute(command: &RefsCommand) -> Result<String> {
        let source_text = read_schema_file(&command.from)?;

        let parser = SchemaParser::with_save_quotes(command.options.save_quotes);
        let source = parser
            .parse(&source_text, &command.from.display().to_string())
            .with_context(|| format!("Failed to parse {}", command.from.display()))?;

        let differ = SchemaDiffer::new(&source, &source, &command.options);
        let changes = differ.refs();

        let workaround = IndexWorkaround::new(&source, &source);
        let plan = PlanAssembler::new(&command.options).assemble(
            changes,
            &workaround,
            &source,
            &source,
        );
        Ok(plan)
    }
}
