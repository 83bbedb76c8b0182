// インデックスパス
//
// インデックスの変更・削除・追加を処理します。すべてのインデックス操作は
// ワークアラウンドプロシージャ経由の冪等な文として出力されます。
// FK名と衝突するインデックスやAUTO_INCREMENTカラムには、遷移中も
// カラムがインデックスされ続けるよう一時カバーを張ります。

use super::context::DifferContext;
use super::{has_auto_increment, md5_hex, timestamp_default, TableDiffer};
use crate::core::plan::ChangeRecord;
use crate::core::schema::{fk_referencing_cols, Table};
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
    let mut auto_col_covered = false;

    for (idx, cols_text) in source.indices() {
        let parts = source.indices_parts(idx);

        // FK名と衝突するインデックス
        if source.isa_fk(idx) || target.isa_fk(idx) {
            if source.fk_clause(idx) == target.fk_clause(idx) {
                // FKが両側で一致: 暗黙インデックスはMySQLが管理する
                continue;
            }
            // FKが変わる: 一時カバーで列を守り、FK再作成に先立って明示的に落とす
            let suffix = if target.has_index(idx) { "_change" } else { "_drop" };
            let cover = format!("rc_temp_{}{}", md5_hex(&parts.join(",")), suffix);
            let weight = if parts
                .iter()
                .any(|p| ctx.added_pk_col.as_deref() == Some(p.as_str()))
            {
                1
            } else if ctx.added_for_fk.contains_key(idx) {
                5
            } else {
                6
            };
            if !ctx.temporary_indexes.contains_key(&cover) {
                let stmt = format!(
                    "ALTER TABLE {} ADD INDEX {} ({});",
                    table,
                    cover,
                    parts.join(",")
                );
                changes.push(ChangeRecord::new(
                    workaround.wrap(table, &cover, &stmt, IndexAction::Create),
                    weight,
                ));
                ctx.temporary_indexes
                    .insert(cover, parts.first().cloned().unwrap_or_default());
            }
            let stmt = format!("ALTER TABLE {} DROP INDEX {};", table, idx);
            changes.push(ChangeRecord::new(
                workaround.wrap(table, idx, &stmt, IndexAction::Drop),
                weight,
            ));
            continue;
        }

        match target.index_cols(idx) {
            Some(new_cols) => {
                let changed = new_cols != cols_text
                    || source.is_unique(idx) != target.is_unique(idx)
                    || source.is_fulltext(idx) != target.is_fulltext(idx)
                    || source.index_opts(idx) != target.index_opts(idx);
                if !changed {
                    continue;
                }

                let mut weight = index_weight(differ, ctx, &parts);
                let touches_auto = touches_added_index(ctx, &parts)
                    || touches_added_index(ctx, &target.indices_parts(idx));
                if touches_auto && !ctx.added_index.as_ref().map_or(false, |ai| ai.is_new) {
                    // インデックスがカラム変更に先行するよう引き上げる
                    weight = 6;
                }

                emit_cover_temps(differ, ctx, workaround, changes, &parts, weight);
                emit_auto_col_indexes(differ, ctx, workaround, changes, &parts, weight);

                if !parts.iter().all(|p| ctx.dropped_columns.contains(p)) {
                    let stmt = format!("ALTER TABLE {} DROP INDEX {};", table, idx);
                    changes.push(ChangeRecord::new(
                        workaround.wrap(table, idx, &stmt, IndexAction::Drop),
                        weight,
                    ));
                }

                let stmt = format!(
                    "ALTER TABLE {} ADD {}INDEX {} {}{};",
                    table,
                    index_kind(target, idx),
                    idx,
                    new_cols,
                    opts_suffix(target.index_opts(idx))
                );
                let mut sql = workaround.wrap(table, idx, &stmt, IndexAction::Create);
                if touches_auto {
                    if let Some(ai) = &ctx.added_index {
                        if ai.is_new {
                            sql.push_str(&format!(
                                "\nALTER TABLE {} CHANGE COLUMN {} {} {};",
                                table, ai.field, ai.field, ai.desc
                            ));
                        }
                    }
                    auto_col_covered = true;
                }
                changes.push(ChangeRecord::new(sql, weight));
            }
            None => {
                let mut weight = index_weight(differ, ctx, &parts);
                if touches_added_index(ctx, &parts)
                    && !ctx.added_index.as_ref().map_or(false, |ai| ai.is_new)
                {
                    weight = 6;
                }

                emit_cover_temps(differ, ctx, workaround, changes, &parts, weight);
                emit_auto_col_indexes(differ, ctx, workaround, changes, &parts, weight);

                if !parts.iter().all(|p| ctx.dropped_columns.contains(p)) {
                    let stmt = format!("ALTER TABLE {} DROP INDEX {};", table, idx);
                    changes.push(ChangeRecord::new(
                        workaround.wrap(table, idx, &stmt, IndexAction::Drop),
                        weight,
                    ));
                }
            }
        }
    }

    // 対象側にのみ存在するインデックス
    for (idx, new_cols) in target.indices() {
        if source.has_index(idx) {
            continue;
        }
        let parts = target.indices_parts(idx);

        if source.isa_fk(idx) || target.isa_fk(idx) {
            if source.fk_clause(idx) == target.fk_clause(idx) {
                continue;
            }
            if let Some(clause) = target.fk_clause(idx) {
                if fk_referencing_cols(clause) == parts {
                    // FK追加の暗黙インデックス作成で足りる
                    continue;
                }
            }
            // カバレッジが異なる: カバー一時を張ってから明示的に作る
            let weight = index_weight(differ, ctx, &parts);
            emit_cover_temps(differ, ctx, workaround, changes, &parts, weight);
        }

        let mut weight = index_weight(differ, ctx, &parts);
        if parts.iter().any(|p| target.isa_primary(p)) {
            weight = 1;
        }
        let touches_auto = touches_added_index(ctx, &parts);
        if touches_auto && !ctx.added_index.as_ref().map_or(false, |ai| ai.is_new) {
            weight = 6;
        }

        let stmt = format!(
            "ALTER TABLE {} ADD {}INDEX {} {}{};",
            table,
            index_kind(target, idx),
            idx,
            new_cols,
            opts_suffix(target.index_opts(idx))
        );
        let mut sql = workaround.wrap(table, idx, &stmt, IndexAction::Create);
        if touches_auto {
            if let Some(ai) = &ctx.added_index {
                if ai.is_new {
                    sql.push_str(&format!(
                        "\nALTER TABLE {} CHANGE COLUMN {} {} {};",
                        table, ai.field, ai.field, ai.desc
                    ));
                }
            }
            auto_col_covered = true;
        }
        changes.push(ChangeRecord::new(sql, weight));
    }

    // どのインデックス操作にも触れられなかったAUTO_INCREMENTカラムの裏付け
    if let Some(ai) = ctx.added_index.clone() {
        if !auto_col_covered {
            let name = format!("mysqldiff_{}", md5_hex(&format!("{}_{}", table, ai.field)));
            let stmt = format!("ALTER TABLE {} ADD INDEX {} ({});", table, name, ai.field);
            let mut sql = workaround.wrap(table, &name, &stmt, IndexAction::Create);
            if ai.is_new {
                sql.push_str(&format!(
                    "\nALTER TABLE {} CHANGE COLUMN {} {} {};",
                    table, ai.field, ai.field, ai.desc
                ));
            }
            changes.push(ChangeRecord::new(sql, 6));
            ctx.temporary_indexes.insert(name, ai.field.clone());
        }
    }
}

/// インデックス操作の基本重み
///
/// タイムスタンプ列を含む操作は最後段へ、CHAR(0)変換の列を含む
/// 再構築はその変更の重みに揃えます。
fn index_weight(differ: &TableDiffer, ctx: &DifferContext, parts: &[String]) -> u8 {
    for part in parts {
        if ctx.timestamps.contains(part)
            || differ
                .target
                .field(part)
                .map_or(false, timestamp_default)
        {
            return 1;
        }
    }
    if let Some(change) = &ctx.changed_to_empty_char_col {
        if parts.contains(&change.field) {
            return change.weight;
        }
    }
    3
}

/// 裏付けインデックス待ちのAUTO_INCREMENTカラムを含むか
fn touches_added_index(ctx: &DifferContext, parts: &[String]) -> bool {
    ctx.added_index
        .as_ref()
        .map_or(false, |ai| parts.contains(&ai.field))
}

/// FKに使われているインデックス構成列に一時カバーを張る
fn emit_cover_temps(
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
        let has_fk = !source.fk_by_col(part).is_empty() || !target.fk_by_col(part).is_empty();
        if !has_fk || !target.has_field(part) {
            continue;
        }
        let name = format!("temp_{}", md5_hex(part));
        if ctx.temporary_indexes.contains_key(&name) {
            continue;
        }
        let stmt = format!("ALTER TABLE {} ADD INDEX {} ({});", table, name, part);
        changes.push(ChangeRecord::new(
            workaround.wrap(table, &name, &stmt, IndexAction::Create),
            weight,
        ));
        ctx.temporary_indexes.insert(name, part.clone());
    }
}

/// 対象側でAUTO_INCREMENTのままの構成列に裏付けインデックスを張る
fn emit_auto_col_indexes(
    differ: &TableDiffer,
    ctx: &mut DifferContext,
    workaround: &mut IndexWorkaround,
    changes: &mut Vec<ChangeRecord>,
    parts: &[String],
    weight: u8,
) {
    let target = differ.target;
    let table = target.name.as_str();

    for part in parts {
        if !target.field(part).map_or(false, has_auto_increment) {
            continue;
        }
        let name = format!("mysqldiff_{}", md5_hex(&format!("{}_{}", table, part)));
        if ctx.temporary_indexes.contains_key(&name) {
            continue;
        }
        let stmt = format!("ALTER TABLE {} ADD INDEX {} ({});", table, name, part);
        changes.push(ChangeRecord::new(
            workaround.wrap(table, &name, &stmt, IndexAction::Create),
            weight,
        ));
        ctx.temporary_indexes.insert(name, part.clone());
    }
}

/// インデックス種別の接頭辞（UNIQUE / FULLTEXT / 無印）
fn index_kind(table: &Table, idx: &str) -> &'static str {
    if table.is_unique(idx) {
        "UNIQUE "
    } else if table.is_fulltext(idx) {
        "FULLTEXT "
    } else {
        ""
    }
}

/// インデックスオプション接尾辞のフォーマット
fn opts_suffix(opts: &str) -> String {
    if opts.is_empty() {
        String::new()
    } else {
        format!(" {}", opts)
    }
}
