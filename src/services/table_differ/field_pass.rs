// フィールドパス
//
// カラムの変更・削除・追加を処理します。AUTO_INCREMENTカラムを
// 末尾に寄せる安定ソートにより、複合PKの「最後の」カラムへの
// ADD PRIMARY KEY折り込みを単一のALTERにまとめます。

use super::context::{AddedIndex, DifferContext, EmptyCharChange};
use super::{
    auto_increment_key, fields_equal, has_auto_increment, strip_auto_increment,
    timestamp_default, was_comment, TableDiffer,
};
use crate::core::plan::ChangeRecord;

pub(super) fn run(differ: &TableDiffer, ctx: &mut DifferContext, changes: &mut Vec<ChangeRecord>) {
    let source = differ.source;
    let target = differ.target;
    let options = differ.options;
    let table = target.name.as_str();

    // 対象側にしか存在しない新PK構成カラム
    let new_pk_cols: Vec<&String> = target
        .primary_parts()
        .iter()
        .filter(|part| !source.has_field(part))
        .collect();

    // 対象側AUTO_INCREMENTカラムを末尾へ（安定ソートで宣言順は保存）
    let mut source_cols: Vec<&String> = source.fields_in_order().iter().collect();
    source_cols.sort_by_key(|col| auto_increment_key(target.field(col)));

    let mut added_cols: Vec<&String> = target
        .fields_in_order()
        .iter()
        .filter(|col| !source.has_field(col))
        .collect();
    added_cols.sort_by_key(|col| auto_increment_key(target.field(col)));

    let last_added_pk: Option<&String> = added_cols
        .iter()
        .filter(|col| target.isa_primary(col))
        .last()
        .copied();

    // 変更によってPKに参加する既存カラム（定義テキストが変わるもの）
    let becoming_pk: Vec<&String> = source_cols
        .iter()
        .filter(|col| {
            target.isa_primary(col)
                && !source.isa_primary(col)
                && match (source.field(col), target.field(col)) {
                    (Some(f1), Some(f2)) => !fields_equal(f1, f2, options.tolerant),
                    _ => false,
                }
        })
        .copied()
        .collect();
    let last_becoming_pk = becoming_pk.last().copied();

    for col in &source_cols {
        let f1 = match source.field(col) {
            Some(definition) => definition,
            None => continue,
        };
        let f2 = match target.field(col) {
            Some(definition) => definition,
            None => {
                // カラムは遅く落とす
                changes.push(ChangeRecord::new(
                    format!(
                        "ALTER TABLE {} DROP COLUMN {};{}",
                        table,
                        col,
                        was_comment(options, f1)
                    ),
                    2,
                ));
                ctx.dropped_columns.insert((*col).clone());
                continue;
            }
        };
        if fields_equal(f1, f2, options.tolerant) {
            continue;
        }

        // PK折り込み: 非複合PKが完全に存在するならCHANGEに直接付与、
        // 複合PKなら最後の該当カラムにADD PRIMARY KEYを添える
        let mut pk_suffix = String::new();
        if target.isa_primary(col) && !source.isa_primary(col) && new_pk_cols.is_empty() {
            if target.primary_parts().len() == 1 {
                pk_suffix = " PRIMARY KEY".to_string();
                ctx.added_pk = true;
            } else if Some(*col) == last_becoming_pk {
                pk_suffix = format!(
                    ", ADD PRIMARY KEY {}",
                    target.primary_key().unwrap_or_default()
                );
                ctx.added_pk = true;
            }
        }

        if !source.isa_primary(col) && has_auto_increment(f2) {
            // 裏付けインデックスをインデックスパスがこのCHANGEの前に置く
            ctx.added_index = Some(AddedIndex {
                field: (*col).clone(),
                is_new: false,
                desc: f2.to_string(),
            });
        }

        if source.isa_primary(col) && f2.contains("DEFAULT NULL") {
            // 旧PKカラムのNULL化はDROP PRIMARY KEYより後
            changes.push(ChangeRecord::new(
                format!(
                    "ALTER TABLE {} CHANGE COLUMN {} {} {};{}",
                    table,
                    col,
                    col,
                    f2,
                    was_comment(options, f1)
                ),
                3,
            ));
            continue;
        }

        if source.isa_primary(col) && has_auto_increment(f1) {
            // PK削除パスが同一文に融合する
            ctx.changed_pk_auto_col = Some(format!("CHANGE COLUMN {} {} {}", col, col, f2));
            continue;
        }

        if f2.to_uppercase().contains("CHAR(0)") {
            ctx.changed_to_empty_char_col = Some(EmptyCharChange {
                field: (*col).clone(),
                weight: 5,
            });
        }

        let weight = if timestamp_default(f2) {
            ctx.timestamps.insert((*col).clone());
            1
        } else {
            5
        };

        changes.push(ChangeRecord::new(
            format!(
                "ALTER TABLE {} CHANGE COLUMN {} {} {}{};{}",
                table,
                col,
                col,
                f2,
                pk_suffix,
                was_comment(options, f1)
            ),
            weight,
        ));
    }

    for col in &added_cols {
        let f2 = match target.field(col) {
            Some(definition) => definition,
            None => continue,
        };
        let mut definition = f2.to_string();
        let mut weight: u8 = 6;

        // PK折り込み（単一PK、または複合PKの最後の追加カラム）
        let mut inline_pk = "";
        let mut trailing_pk = String::new();
        let is_pk_col = target.isa_primary(col);
        if is_pk_col && (target.primary_parts().len() == 1 || Some(*col) == last_added_pk) {
            if target.primary_parts().len() == 1 {
                inline_pk = " PRIMARY KEY";
            } else {
                trailing_pk = format!(
                    ", ADD PRIMARY KEY {}",
                    target.primary_key().unwrap_or_default()
                );
            }
            ctx.added_pk = true;
            ctx.added_pk_col = Some((*col).clone());
            weight = 1;
        }

        // PKに参加しないAUTO_INCREMENTは一旦外し、
        // インデックスパスが裏付けインデックスの後で復元する
        if !is_pk_col && has_auto_increment(&definition) {
            definition = strip_auto_increment(&definition);
            ctx.added_index = Some(AddedIndex {
                field: (*col).clone(),
                is_new: true,
                desc: f2.to_string(),
            });
        }

        let is_timestamp = timestamp_default(f2);
        if is_timestamp {
            weight = 1;
            ctx.timestamps.insert((*col).clone());
        }

        // 位置ヒント
        let (prev, _) = target.fields_links(col);
        let mut needs_routine_alters = false;
        let position = match prev {
            None => " FIRST".to_string(),
            Some(prev_col) if source.has_field(prev_col) || ctx.added_cols.contains(prev_col) => {
                format!(" AFTER {}", prev_col)
            }
            Some(_) => {
                needs_routine_alters = true;
                String::new()
            }
        };

        changes.push(ChangeRecord::new(
            format!(
                "ALTER TABLE {} ADD COLUMN {} {}{}{}{};",
                table, col, definition, inline_pk, position, trailing_pk
            ),
            weight,
        ));
        ctx.added_cols.insert((*col).clone());

        // 新FKの対象カラム: FK再作成がこの追加の後に来るよう重みを引き継ぐ
        for (fk, _) in target.fk_by_col(col) {
            if source.fk_clause(&fk) != target.fk_clause(&fk) {
                ctx.added_for_fk.insert(fk, weight);
            }
        }

        if needs_routine_alters || is_timestamp {
            add_routine_alters(differ, changes, col, weight);
        }
    }
}

/// 後続の追加カラムにCHANGE COLUMN … AFTERを再発行
///
/// 位置ヒントを付けられなかった追加カラムの後ろに並ぶカラムの
/// 最終的な宣言順を対象側に一致させます。
fn add_routine_alters(
    differ: &TableDiffer,
    changes: &mut Vec<ChangeRecord>,
    col: &str,
    weight: u8,
) {
    let source = differ.source;
    let target = differ.target;
    let table = target.name.as_str();

    let mut current = col;
    loop {
        let (_, next) = target.fields_links(current);
        let next = match next {
            Some(name) => name,
            None => break,
        };
        if !source.has_field(next) {
            let definition = target.field(next).unwrap_or_default();
            let (prev, _) = target.fields_links(next);
            let after = prev
                .map(|p| format!(" AFTER {}", p))
                .unwrap_or_default();
            changes.push(ChangeRecord::new(
                format!(
                    "ALTER TABLE {} CHANGE COLUMN {} {} {}{};",
                    table, next, next, definition, after
                ),
                weight,
            ));
        }
        current = next;
    }
}
