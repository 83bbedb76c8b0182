// テーブルペア差分のスクラッチ状態
//
// 1テーブルペアの差分中に横断的な決定を記録し、後続パス
// （インデックス、PK、FK、オプション）が協調できるようにします。
// 各ペアの開始時にリセットされます。

use std::collections::{BTreeMap, BTreeSet};

/// AUTO_INCREMENTカラムで裏付けインデックスが未作成のもの
#[derive(Debug, Clone, PartialEq)]
pub struct AddedIndex {
    /// 対象カラム名
    pub field: String,
    /// このパスで新規追加されたカラムかどうか
    pub is_new: bool,
    /// AUTO_INCREMENTを含む完全なカラム定義（復元CHANGE COLUMN用）
    pub desc: String,
}

/// CHAR(0)への変換の記録
///
/// インデックス再構築の重みをこの変更に揃えるために使います。
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyCharChange {
    /// 対象カラム名
    pub field: String,
    /// 変更が出力された重み
    pub weight: u8,
}

/// テーブルペア差分のコンテキスト
#[derive(Debug, Default)]
pub struct DifferContext {
    /// PK削除時に融合されるCHANGE COLUMN末尾
    pub changed_pk_auto_col: Option<String>,

    /// フィールドパスで新しいPKが確立済み
    pub added_pk: bool,

    /// フィールドパスで追加されたPKカラム
    pub added_pk_col: Option<String>,

    /// 削除されたカラム
    pub dropped_columns: BTreeSet<String>,

    /// CHAR(0)変換の記録
    pub changed_to_empty_char_col: Option<EmptyCharChange>,

    /// 裏付けインデックス待ちのAUTO_INCREMENTカラム
    pub added_index: Option<AddedIndex>,

    /// 新FKのために導入されたカラムの重み（FK名 → 重み）
    pub added_for_fk: BTreeMap<String, u8>,

    /// このパスで追加された足場インデックス（名前 → カラム）
    ///
    /// カラム自体が削除された場合を除き、最後に削除されます。
    pub temporary_indexes: BTreeMap<String, String>,

    /// 追加されたカラム
    pub added_cols: BTreeSet<String>,

    /// タイムスタンプ既定値を持つカラム
    pub timestamps: BTreeSet<String>,
}

impl DifferContext {
    /// 新しいコンテキストを作成
    pub fn new() -> Self {
        Self::default()
    }
}
