// 変更レコードドメインモデル
//
// 差分エンジンが出力するDDL断片と、その最終順序を決める優先度を表現します。
//
// 優先度バケット（大きいものから先に出力される）:
//   9: ビュープレースホルダのCREATE TABLE
//   8: DROP TABLE / REMOVE PARTITIONING / オプション変更 / PK再作成（新PKカラム追加済み）
//   6: DROP FOREIGN KEY（先行削除）/ ADD COLUMN / refsモードのテーブル
//   5: ルーチン・ビューの作成と変更 / CHANGE COLUMN / FK変更
//   4: DROP PRIMARY KEY（単独）
//   3: ADD PRIMARY KEY（単独）/ ADD・DROP INDEX
//   2: DROP COLUMN（カラムは遅く落とす）
//   1: ADD FOREIGN KEY（最後に追加）/ カラムと同時のPK追加 / タイムスタンプ系変更
//   0: パーティション再設定を含むオプション再適用 / 一時インデックスの後始末

use serde::Serialize;

/// 変更に付与されるメタデータ
///
/// list-tables モードで `-- { … }` ヘッダコメントとして出力されます。
/// フィールドの宣言順がそのままJSONのキー順になります。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeMeta {
    /// 対象オブジェクト名
    pub name: String,
    /// 変更の種類（add_table, drop_table, change_table など）
    pub action_type: String,
    /// FK経由で参照しているテーブル
    pub referenced_tables: Vec<String>,
}

/// 出力されるDDL断片
///
/// `priority` は最終順序付けにのみ使用される粗い順序バケットです。
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    /// DDLテキスト（1つ以上の文、末尾改行なし）
    pub sql: String,
    /// 優先度バケット（0〜9、大きいほど先）
    pub priority: u8,
    /// list-tables 用メタデータ
    pub meta: Option<ChangeMeta>,
}

impl ChangeRecord {
    /// 新しい変更レコードを作成
    pub fn new(sql: String, priority: u8) -> Self {
        Self {
            sql,
            priority,
            meta: None,
        }
    }

    /// メタデータ付きの変更レコードを作成
    pub fn with_meta(sql: String, priority: u8, meta: ChangeMeta) -> Self {
        Self {
            sql,
            priority,
            meta: Some(meta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_record_new() {
        let record = ChangeRecord::new("DROP TABLE users;".to_string(), 8);
        assert_eq!(record.priority, 8);
        assert!(record.meta.is_none());
    }

    #[test]
    fn test_change_meta_serializes_in_declaration_order() {
        let meta = ChangeMeta {
            name: "orders".to_string(),
            action_type: "change_table".to_string(),
            referenced_tables: vec!["users".to_string()],
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(
            json,
            r#"{"name":"orders","action_type":"change_table","referenced_tables":["users"]}"#
        );
    }
}
