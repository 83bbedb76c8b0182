// 外部キーパス
//
// FK制約の変更・削除・追加を処理します。削除は早く（カラム削除の前）、
// 追加は最後に行います。新カラム由来のFK再作成はカラム追加の重みを
// 引き継ぎ、追加の後に並びます。

use super::context::DifferContext;
use super::TableDiffer;
use crate::core::plan::ChangeRecord;
use crate::core::schema::fk_referencing_cols;

pub(super) fn run(differ: &TableDiffer, ctx: &mut DifferContext, changes: &mut Vec<ChangeRecord>) {
    let source = differ.source;
    let target = differ.target;
    let table = target.name.as_str();

    for (fk, clause) in source.foreign_keys() {
        match target.fk_clause(fk) {
            Some(target_clause) if target_clause != clause => {
                let drop_stmt = format!("ALTER TABLE {} DROP FOREIGN KEY {};", table, fk);
                let add_stmt = format!(
                    "ALTER TABLE {} ADD CONSTRAINT {} {};",
                    table, fk, target_clause
                );
                let local_cols = fk_referencing_cols(clause);
                if local_cols
                    .iter()
                    .any(|col| ctx.dropped_columns.contains(col))
                {
                    // 構成列が落ちる: DROPを先行させ、ADDはカラム変更の後へ
                    changes.push(ChangeRecord::new(drop_stmt, 6));
                    changes.push(ChangeRecord::new(add_stmt, 5));
                } else {
                    let weight = ctx.added_for_fk.get(fk).copied().unwrap_or(5);
                    changes.push(ChangeRecord::new(
                        format!("{}\n{}", drop_stmt, add_stmt),
                        weight,
                    ));
                }
            }
            Some(_) => {}
            None => {
                // FKは先に落とす
                changes.push(ChangeRecord::new(
                    format!("ALTER TABLE {} DROP FOREIGN KEY {};", table, fk),
                    6,
                ));
            }
        }
    }

    for (fk, target_clause) in target.foreign_keys() {
        if source.isa_fk(fk) {
            continue;
        }
        // FKは最後に追加する
        changes.push(ChangeRecord::new(
            format!(
                "ALTER TABLE {} ADD CONSTRAINT {} {};",
                table, fk, target_clause
            ),
            1,
        ));
    }
}
