// プライマリキーパス
//
// PKの追加・削除・変更を処理します。AUTO_INCREMENTカラムを含む
// DROP PRIMARY KEYは、AUTO_INCREMENTを外すCHANGE COLUMNと同一文に
// 融合され、中間状態が常に妥当に保たれます。

use super::context::DifferContext;
use super::{has_auto_increment, md5_hex, TableDiffer};
use crate::core::plan::ChangeRecord;
use crate::services::index_workaround::{IndexAction, IndexWorkaround};

pub(super) fn run(
    differ: &TableDiffer,
    ctx: &mut DifferContext,
    workaround: &mut IndexWorkaround,
    changes: &mut Vec<ChangeRecord>,
) {
    let source = differ.source;
    let target = differ.target;
    let table = target.name.as_str();

    let source_pk = match source.primary_key() {
        Some(pk) => pk,
        None => {
            // 元にPKがなく対象にある場合、フィールドパスで未確立なら単独で追加
            if let Some(target_pk) = target.primary_key() {
                if !ctx.added_pk {
                    changes.push(ChangeRecord::new(
                        format!("ALTER TABLE {} ADD PRIMARY KEY {};", table, target_pk),
                        3,
                    ));
                }
            }
            return;
        }
    };

    if target.primary_key() == Some(source_pk) {
        return;
    }

    let parts: Vec<String> = source.primary_parts().to_vec();
    let all_dropped = parts.iter().all(|p| ctx.dropped_columns.contains(p));
    let tail = ctx
        .changed_pk_auto_col
        .take()
        .map(|change| format!(", {}", change))
        .unwrap_or_default();

    match target.primary_key() {
        Some(target_pk) => {
            if ctx.added_pk {
                // 新PKはカラム追加側で確立済み: 旧PKを先に外す
                if !all_dropped {
                    emit_part_covers(differ, ctx, workaround, changes, &parts, 8);
                    changes.push(ChangeRecord::new(
                        format!("ALTER TABLE {} DROP PRIMARY KEY{};", table, tail),
                        8,
                    ));
                }
            } else if all_dropped {
                // 旧PK構成列はすべて落ちる: 最後にADDのみ
                changes.push(ChangeRecord::new(
                    format!("ALTER TABLE {} ADD PRIMARY KEY {};", table, target_pk),
                    0,
                ));
            } else {
                emit_part_covers(differ, ctx, workaround, changes, &parts, 4);
                changes.push(ChangeRecord::new(
                    format!(
                        "ALTER TABLE {} DROP PRIMARY KEY{}, ADD PRIMARY KEY {};",
                        table, tail, target_pk
                    ),
                    4,
                ));
            }
        }
        None => {
            if !all_dropped {
                emit_part_covers(differ, ctx, workaround, changes, &parts, 4);
                changes.push(ChangeRecord::new(
                    format!("ALTER TABLE {} DROP PRIMARY KEY{};", table, tail),
                    4,
                ));
            }
        }
    }
}

/// PK構成列の裏付けインデックスとFKカバーを張る
///
/// 対象側でAUTO_INCREMENTのままの列には裏付けインデックスを、
/// いずれかの側でFKに使われている列には一時カバーを用意します。
fn emit_part_covers(
    differ: &TableDiffer,
    ctx: &mut DifferContext,
    workaround: &mut IndexWorkaround,
    changes: &mut Vec<ChangeRecord>,
    parts: &[String],
    weight: u8,
) {
    let source = differ.source;
    let target = differ.target;
    let table = target.name.as_str();

    for part in parts {
        if ctx.dropped_columns.contains(part) {
            continue;
        }
        if target.field(part).map_or(false, has_auto_increment) {
            let name = format!("mysqldiff_{}", md5_hex(&format!("{}_{}", table, part)));
            if !ctx.temporary_indexes.contains_key(&name) {
                let stmt = format!("ALTER TABLE {} ADD INDEX {} ({});", table, name, part);
                changes.push(ChangeRecord::new(
                    workaround.wrap(table, &name, &stmt, IndexAction::Create),
                    weight,
                ));
                ctx.temporary_indexes.insert(name, part.clone());
            }
        }
        if !source.fk_by_col(part).is_empty() || !target.fk_by_col(part).is_empty() {
            let name = format!("temp_{}", md5_hex(part));
            if !ctx.temporary_indexes.contains_key(&name) {
                let stmt = format!("ALTER TABLE {} ADD INDEX {} ({});", table, name, part);
                changes.push(ChangeRecord::new(
                    workaround.wrap(table, &name, &stmt, IndexAction::Create),
                    weight,
                ));
                ctx.temporary_indexes.insert(name, part.clone());
            }
        }
    }
}
