// オプション・パーティションパス
//
// 全パスの後に一時インデックスを片付け、テーブルオプションの差分を
// 出力します。パーティション指定の変更はREMOVE PARTITIONINGで一度
// 外し、最終形の上でパーティションを再設定します。

use super::context::DifferContext;
use super::{collapse_ws, TableDiffer};
use crate::core::plan::ChangeRecord;
use crate::services::index_workaround::{IndexAction, IndexWorkaround};
use regex::Regex;
use std::sync::LazyLock;

static AUTO_INCREMENT_OPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*AUTO_INCREMENT=\d+").expect("valid pattern"));

static COLLATE_OPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*COLLATE=\w+").expect("valid pattern"));

pub(super) fn run(
    differ: &TableDiffer,
    ctx: &mut DifferContext,
    workaround: &mut IndexWorkaround,
    changes: &mut Vec<ChangeRecord>,
) {
    let source = differ.source;
    let target = differ.target;
    let table = target.name.as_str();

    // 一時インデックスの後始末（列自体が落ちたものは除く）
    let mut drops = Vec::new();
    for (name, col) in &ctx.temporary_indexes {
        if ctx.dropped_columns.contains(col) {
            continue;
        }
        let stmt = format!("ALTER TABLE {} DROP INDEX {};", table, name);
        drops.push(workaround.wrap(table, name, &stmt, IndexAction::Drop));
    }
    if !drops.is_empty() {
        changes.push(ChangeRecord::new(drops.join("\n"), 0));
    }

    if options_equal(&source.options, &target.options, differ.options.tolerant) {
        return;
    }

    let (mut nonpart, target_part) = split_partition(&target.options);
    if !nonpart.to_uppercase().contains("COMMENT=") {
        // 空コメントを添えて旧コメントを確実に消す
        if nonpart.is_empty() {
            nonpart = "COMMENT=''".to_string();
        } else {
            nonpart = format!("{} COMMENT=''", nonpart);
        }
    }

    let (_, source_part) = split_partition(&source.options);
    if source_part.is_some() && source_part != target_part {
        changes.push(ChangeRecord::new(
            format!("ALTER TABLE {} REMOVE PARTITIONING;", table),
            8,
        ));
    }

    changes.push(ChangeRecord::new(
        format!("ALTER TABLE {} {};", table, nonpart),
        8,
    ));

    if let Some(partition) = target_part {
        // パーティションは最終形の上で再設定する
        changes.push(ChangeRecord::new(
            format!("ALTER TABLE {} {} {};", table, nonpart, partition),
            0,
        ));
    }
}

/// テーブルオプションを非パーティション部とPARTITION BY句に分割
fn split_partition(options: &str) -> (String, Option<String>) {
    let upper = options.to_uppercase();
    match upper.find("PARTITION BY") {
        Some(pos) => (
            options[..pos].trim().to_string(),
            Some(options[pos..].trim().to_string()),
        ),
        None => (options.trim().to_string(), None),
    }
}

/// 2つのオプション文字列が等しいか
///
/// 緩い比較ではAUTO_INCREMENT=nとCOLLATE=xを無視します。
fn options_equal(o1: &str, o2: &str, tolerant: bool) -> bool {
    if o1.trim() == o2.trim() {
        return true;
    }
    if !tolerant {
        return false;
    }
    let normalize = |options: &str| {
        let stripped = AUTO_INCREMENT_OPT_RE.replace_all(options, "");
        let stripped = COLLATE_OPT_RE.replace_all(&stripped, "");
        collapse_ws(&stripped)
    };
    normalize(o1) == normalize(o2)
}
