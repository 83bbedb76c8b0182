// スキーマ差分ドライバー
//
// 2つのスキーマモデルを歩き、共通テーブルはTableDifferに委譲し、
// 片側にしか存在しないオブジェクトにはCREATE/DROPを生成します。
// refsモードは差分ではなくFK依存閉包の列挙を行う別ドライバーです。

use crate::core::config::Options;
use crate::core::error::DiffError;
use crate::core::plan::{ChangeMeta, ChangeRecord};
use crate::core::schema::{Schema, View};
use crate::services::index_workaround::IndexWorkaround;
use crate::services::table_differ::TableDiffer;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

/// 差分実行の結果
///
/// PlanAssemblerが最終順序付けとワークアラウンドの包み込みを行います。
#[derive(Debug)]
pub struct DiffOutcome {
    /// 出力された変更レコード（出力順は未確定）
    pub changes: Vec<ChangeRecord>,
    /// インデックス操作ファシリティ
    pub workaround: IndexWorkaround,
}

/// スキーマ差分ドライバー
pub struct SchemaDiffer<'a> {
    source: &'a Schema,
    target: &'a Schema,
    options: &'a Options,
}

impl<'a> SchemaDiffer<'a> {
    /// 新しいSchemaDifferを作成
    pub fn new(source: &'a Schema, target: &'a Schema, options: &'a Options) -> Self {
        Self {
            source,
            target,
            options,
        }
    }

    /// 通常モード: 差分を検出して変更レコードを生成
    pub fn diff(&self) -> DiffOutcome {
        let mut workaround = IndexWorkaround::new(self.source, self.target);
        let mut changes = Vec::new();
        let filter = self.options.table_matcher();

        // 第1パス: 元スキーマを宣言順に走査
        for name in self.source.table_order() {
            if !name_matches(&filter, name) {
                continue;
            }
            let table = match self.source.get_table(name) {
                Some(table) => table,
                None => continue,
            };
            if let Some(target_table) = self.target.get_table(name) {
                let differ = TableDiffer::new(table, target_table, self.options);
                let mut records = differ.run(&mut workaround);
                let referenced: Vec<String> = target_table.fk_tables().into_iter().collect();
                for record in &mut records {
                    record.meta = Some(ChangeMeta {
                        name: name.clone(),
                        action_type: "change_table".to_string(),
                        referenced_tables: referenced.clone(),
                    });
                }
                changes.extend(records);
            } else if self.target.has_view(name) {
                // 同名ビューの作成が第2パスで処理するため、DROPは抑止する
                debug!(table = %name, "table becomes a view; drop suppressed");
            } else if !self.options.only_both && !self.options.keep_old_tables {
                changes.push(ChangeRecord::with_meta(
                    format!("DROP TABLE {};", name),
                    8,
                    ChangeMeta {
                        name: name.clone(),
                        action_type: "drop_table".to_string(),
                        referenced_tables: table.fk_tables().into_iter().collect(),
                    },
                ));
            }
        }

        for name in self.source.routine_order() {
            if self.target.has_routine(name)
                || self.options.only_both
                || self.options.keep_old_tables
            {
                continue;
            }
            let routine = match self.source.get_routine(name) {
                Some(routine) => routine,
                None => continue,
            };
            changes.push(ChangeRecord::with_meta(
                format!("DROP {} IF EXISTS {};", routine.rtype, name),
                8,
                ChangeMeta {
                    name: name.clone(),
                    action_type: "drop_routine".to_string(),
                    referenced_tables: Vec::new(),
                },
            ));
        }

        for name in self.source.view_order() {
            if self.target.has_view(name)
                || self.target.has_table(name)
                || self.options.only_both
                || self.options.keep_old_tables
            {
                continue;
            }
            changes.push(ChangeRecord::with_meta(
                format!("DROP VIEW IF EXISTS {};", name),
                8,
                ChangeMeta {
                    name: name.clone(),
                    action_type: "drop_view".to_string(),
                    referenced_tables: Vec::new(),
                },
            ));
        }

        // 第2パス: 対象スキーマを宣言順に走査して作成を生成
        for name in self.target.table_order() {
            if !name_matches(&filter, name) {
                continue;
            }
            if self.source.has_table(name) || self.options.only_both {
                continue;
            }
            let table = match self.target.get_table(name) {
                Some(table) => table,
                None => continue,
            };
            let referenced: Vec<String> = table.fk_tables().into_iter().collect();
            changes.push(ChangeRecord::with_meta(
                strip_fk_constraints(&table.def),
                6,
                ChangeMeta {
                    name: name.clone(),
                    action_type: "add_table".to_string(),
                    referenced_tables: referenced.clone(),
                },
            ));
            // FK制約はすべてのテーブルが揃った後に別ALTERで付ける
            for (fk, clause) in table.foreign_keys() {
                changes.push(ChangeRecord::with_meta(
                    format!("ALTER TABLE {} ADD CONSTRAINT {} {};", name, fk, clause),
                    1,
                    ChangeMeta {
                        name: name.clone(),
                        action_type: "add_table".to_string(),
                        referenced_tables: referenced.clone(),
                    },
                ));
            }
        }

        for name in self.target.view_order() {
            let view = match self.target.get_view(name) {
                Some(view) => view,
                None => continue,
            };
            match self.source.get_view(name) {
                None => {
                    if self.options.only_both {
                        continue;
                    }
                    // ビューが後続テーブルや他ビューを前方参照するサイクルを
                    // プレースホルダのCREATE TABLEで断つ
                    if !self.source.has_table(name) {
                        if let Some(placeholder) = self.target.view_temp(name) {
                            changes.push(ChangeRecord::with_meta(
                                placeholder,
                                9,
                                ChangeMeta {
                                    name: name.clone(),
                                    action_type: "add_view".to_string(),
                                    referenced_tables: Vec::new(),
                                },
                            ));
                        }
                    }
                    changes.push(ChangeRecord::with_meta(
                        format!("DROP TABLE IF EXISTS {};\n{}", name, view.def),
                        5,
                        ChangeMeta {
                            name: name.clone(),
                            action_type: "add_view".to_string(),
                            referenced_tables: Vec::new(),
                        },
                    ));
                }
                Some(old_view) => {
                    if views_differ(old_view, view) {
                        changes.push(ChangeRecord::with_meta(
                            alter_view_stmt(view),
                            5,
                            ChangeMeta {
                                name: name.clone(),
                                action_type: "change_view".to_string(),
                                referenced_tables: Vec::new(),
                            },
                        ));
                    }
                }
            }
        }

        for name in self.target.routine_order() {
            let routine = match self.target.get_routine(name) {
                Some(routine) => routine,
                None => continue,
            };
            match self.source.get_routine(name) {
                None => {
                    if self.options.only_both {
                        continue;
                    }
                    changes.push(ChangeRecord::with_meta(
                        format!("DELIMITER ;;\n{};;\nDELIMITER ;", routine.def),
                        5,
                        ChangeMeta {
                            name: name.clone(),
                            action_type: "add_routine".to_string(),
                            referenced_tables: Vec::new(),
                        },
                    ));
                }
                Some(old_routine) => {
                    // 比較は (options, body, params) のバイト単位
                    let changed = old_routine.options != routine.options
                        || old_routine.body != routine.body
                        || old_routine.params != routine.params;
                    if changed {
                        changes.push(ChangeRecord::with_meta(
                            format!(
                                "DROP {} IF EXISTS {};\nDELIMITER ;;\n{};;\nDELIMITER ;",
                                routine.rtype, name, routine.def
                            ),
                            5,
                            ChangeMeta {
                                name: name.clone(),
                                action_type: "change_routine".to_string(),
                                referenced_tables: Vec::new(),
                            },
                        ));
                    }
                }
            }
        }

        DiffOutcome {
            changes,
            workaround,
        }
    }

    /// refsモード: フィルタされたテーブルのFK依存閉包を列挙
    pub fn refs(&self) -> Vec<ChangeRecord> {
        let filter = self.options.table_matcher();
        let mut used_tables = BTreeSet::new();
        let mut changes = Vec::new();

        for name in self.source.table_order() {
            if !name_matches(&filter, name) {
                continue;
            }
            self.add_ref_tables(name, &mut used_tables, &mut changes);
        }
        changes
    }

    /// テーブルとそのFK参照先を再帰的に取り込む
    fn add_ref_tables(
        &self,
        name: &str,
        used_tables: &mut BTreeSet<String>,
        changes: &mut Vec<ChangeRecord>,
    ) {
        if used_tables.contains(name) {
            return;
        }
        used_tables.insert(name.to_string());

        let table = match self.source.get_table(name) {
            Some(table) => table,
            None => {
                let error = DiffError::InvalidSchemaReference {
                    object: name.to_string(),
                    context: "外部キーの依存閉包".to_string(),
                };
                debug!(%error, "skipping unresolved reference");
                return;
            }
        };
        let referenced: Vec<String> = table.fk_tables().into_iter().collect();
        changes.push(ChangeRecord::with_meta(
            table.def.clone(),
            6,
            ChangeMeta {
                name: name.to_string(),
                action_type: "add_table".to_string(),
                referenced_tables: referenced.clone(),
            },
        ));
        for dep in referenced {
            self.add_ref_tables(&dep, used_tables, changes);
        }
    }
}

/// テーブル名がフィルタに一致するか
fn name_matches(filter: &Option<Regex>, name: &str) -> bool {
    filter.as_ref().map_or(true, |re| re.is_match(name))
}

/// CREATE TABLEテキストからFK制約行を取り除く
fn strip_fk_constraints(def: &str) -> String {
    let kept: Vec<&str> = def
        .lines()
        .filter(|line| {
            let upper = line.trim().to_uppercase();
            !(upper.starts_with("CONSTRAINT") && upper.contains("FOREIGN KEY"))
        })
        .collect();

    // FK行を除いたことで宙に浮いた末尾カンマを整える
    let mut lines = Vec::with_capacity(kept.len());
    for (pos, line) in kept.iter().enumerate() {
        let next_closes = kept
            .get(pos + 1)
            .map_or(false, |next| next.trim_start().starts_with(')'));
        if next_closes {
            lines.push(line.trim_end().trim_end_matches(',').to_string());
        } else {
            lines.push((*line).to_string());
        }
    }
    lines.join("\n")
}

/// 2つのビュー定義が異なるか
fn views_differ(old_view: &View, new_view: &View) -> bool {
    old_view.fields != new_view.fields
        || old_view.select != new_view.select
        || old_view.options.algorithm != new_view.options.algorithm
        || old_view.options.security != new_view.options.security
        || old_view.options.trail != new_view.options.trail
}

/// ビュー変更のALTER文を組み立てる
fn alter_view_stmt(view: &View) -> String {
    let mut sql = format!(
        "ALTER ALGORITHM={} DEFINER=CURRENT_USER SQL SECURITY {} VIEW {}",
        view.options.algorithm, view.options.security, view.name
    );
    if !view.fields.is_empty() {
        sql.push(' ');
        sql.push_str(&view.fields);
    }
    sql.push_str(" AS ");
    sql.push_str(&view.select);
    if !view.options.trail.is_empty() {
        sql.push(' ');
        sql.push_str(&view.options.trail);
    }
    sql.push(';');
    sql
}
