// スキーマドメインモデル
//
// データベーススキーマの定義をテキストベースで表現する型システム。
// Schema, Table, View, Routine を提供します。
// カラム定義やインデックス列リストはMySQLがエコーする正準形のまま保持し、
// 差分エンジンは読み取り専用アクセサのみを通して参照します。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 括弧付き列リストを個々のカラム名に分解
///
/// `(a, b(10), c)` → `["a", "b", "c"]`。プレフィックス長は除去します。
pub fn split_parts(list: &str) -> Vec<String> {
    list.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(|part| {
            let part = part.trim();
            let part = match part.find('(') {
                Some(pos) => &part[..pos],
                None => part,
            };
            part.trim().trim_matches('`').to_string()
        })
        .filter(|part| !part.is_empty())
        .collect()
}

/// スキーマ定義
///
/// テーブル・ビュー・ルーチンの3系列を名前で索引しつつ、
/// 元ソースの宣言順を保持します。比較は宣言順で走査され、
/// 出力プランの決定性を保ちます。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// スキーマの出所（ファイルパスなど、バナー用）
    pub summary: String,

    tables: BTreeMap<String, Table>,
    table_order: Vec<String>,

    views: BTreeMap<String, View>,
    view_order: Vec<String>,

    routines: BTreeMap<String, Routine>,
    routine_order: Vec<String>,
}

impl Schema {
    /// 新しいスキーマを作成
    pub fn new(summary: String) -> Self {
        Self {
            summary,
            ..Self::default()
        }
    }

    /// テーブルを追加（宣言順を記録）
    pub fn add_table(&mut self, table: Table) {
        if !self.tables.contains_key(&table.name) {
            self.table_order.push(table.name.clone());
        }
        self.tables.insert(table.name.clone(), table);
    }

    /// ビューを追加（宣言順を記録）
    pub fn add_view(&mut self, view: View) {
        if !self.views.contains_key(&view.name) {
            self.view_order.push(view.name.clone());
        }
        self.views.insert(view.name.clone(), view);
    }

    /// ルーチンを追加（宣言順を記録）
    pub fn add_routine(&mut self, routine: Routine) {
        if !self.routines.contains_key(&routine.name) {
            self.routine_order.push(routine.name.clone());
        }
        self.routines.insert(routine.name.clone(), routine);
    }

    /// 指定されたテーブルが存在するか確認
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// 指定されたテーブルを取得
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// 指定されたビューが存在するか確認
    pub fn has_view(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    /// 指定されたビューを取得
    pub fn get_view(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    /// 指定されたルーチンが存在するか確認
    pub fn has_routine(&self, name: &str) -> bool {
        self.routines.contains_key(name)
    }

    /// 指定されたルーチンを取得
    pub fn get_routine(&self, name: &str) -> Option<&Routine> {
        self.routines.get(name)
    }

    /// テーブル名を宣言順で取得
    pub fn table_order(&self) -> &[String] {
        &self.table_order
    }

    /// ビュー名を宣言順で取得
    pub fn view_order(&self) -> &[String] {
        &self.view_order
    }

    /// ルーチン名を宣言順で取得
    pub fn routine_order(&self) -> &[String] {
        &self.routine_order
    }

    /// テーブル数を取得
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// ビューのカラム形状に一致するプレースホルダCREATE TABLEを生成
    ///
    /// ビューが後続のテーブルや他のビューを前方参照するサイクルを断つために
    /// 使用します。カラムリストが不明なビューでは None を返します。
    pub fn view_temp(&self, name: &str) -> Option<String> {
        let view = self.views.get(name)?;
        let columns = split_parts(&view.fields);
        if columns.is_empty() {
            return None;
        }
        let body = columns
            .iter()
            .map(|column| format!("  {} tinyint NOT NULL", column))
            .collect::<Vec<_>>()
            .join(",\n");
        Some(format!("CREATE TABLE {} (\n{}\n);", name, body))
    }
}

/// テーブル定義
///
/// カラムは名前から型・句テキスト（例: `int(11) NOT NULL DEFAULT '0'`）への
/// 対応として保持し、宣言順を別途記録します。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// テーブル名
    pub name: String,

    /// テーブルレベルオプション（ENGINE, DEFAULT CHARSET, PARTITION BY …）
    pub options: String,

    /// 再作成用の完全なCREATE TABLEテキスト
    pub def: String,

    fields: BTreeMap<String, String>,
    field_order: Vec<String>,

    primary_key: Option<String>,
    primary_parts: Vec<String>,

    indices: BTreeMap<String, String>,
    indices_opts: BTreeMap<String, String>,
    unique: BTreeSet<String>,
    fulltext: BTreeSet<String>,

    foreign_keys: BTreeMap<String, String>,
}

impl Table {
    /// 新しいテーブルを作成
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// カラムを追加（宣言順を記録）
    pub fn add_field(&mut self, name: String, definition: String) {
        if !self.fields.contains_key(&name) {
            self.field_order.push(name.clone());
        }
        self.fields.insert(name, definition);
    }

    /// プライマリキーを設定
    ///
    /// `list` は括弧付きの列リストテキスト（例: `(a,b)`）。
    pub fn set_primary_key(&mut self, list: String) {
        self.primary_parts = split_parts(&list);
        self.primary_key = Some(list);
    }

    /// インデックスを追加
    pub fn add_index(&mut self, name: String, columns: String, unique: bool, fulltext: bool) {
        if unique {
            self.unique.insert(name.clone());
        }
        if fulltext {
            self.fulltext.insert(name.clone());
        }
        self.indices.insert(name, columns);
    }

    /// インデックスのオプション接尾辞（例: `USING BTREE`）を設定
    pub fn set_index_opts(&mut self, name: String, opts: String) {
        if !opts.is_empty() {
            self.indices_opts.insert(name, opts);
        }
    }

    /// 外部キー制約を追加
    ///
    /// `clause` は `FOREIGN KEY (…) REFERENCES …` の形のテキスト。
    pub fn add_foreign_key(&mut self, name: String, clause: String) {
        self.foreign_keys.insert(name, clause);
    }

    /// カラム定義テキストを取得
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// カラムが存在するか確認
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// カラム名を宣言順で取得
    pub fn fields_in_order(&self) -> &[String] {
        &self.field_order
    }

    /// カラムの宣言順序を取得
    pub fn field_ordinal(&self, name: &str) -> Option<usize> {
        self.field_order.iter().position(|n| n == name)
    }

    /// 宣言順での前後カラムを取得
    pub fn fields_links(&self, name: &str) -> (Option<&str>, Option<&str>) {
        match self.field_ordinal(name) {
            Some(pos) => {
                let prev = if pos > 0 {
                    self.field_order.get(pos - 1).map(String::as_str)
                } else {
                    None
                };
                let next = self.field_order.get(pos + 1).map(String::as_str);
                (prev, next)
            }
            None => (None, None),
        }
    }

    /// プライマリキーの括弧付き列リストを取得
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// プライマリキーを構成するカラムを取得
    pub fn primary_parts(&self) -> &[String] {
        &self.primary_parts
    }

    /// カラムがプライマリキーに参加しているか確認
    pub fn isa_primary(&self, name: &str) -> bool {
        self.primary_parts.iter().any(|part| part == name)
    }

    /// インデックスのマップ（名前 → 括弧付き列リスト）を取得
    pub fn indices(&self) -> &BTreeMap<String, String> {
        &self.indices
    }

    /// インデックスが存在するか確認
    pub fn has_index(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// インデックスの列リストテキストを取得
    pub fn index_cols(&self, name: &str) -> Option<&str> {
        self.indices.get(name).map(String::as_str)
    }

    /// インデックスのオプション接尾辞を取得
    pub fn index_opts(&self, name: &str) -> &str {
        self.indices_opts
            .get(name)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// インデックスを構成するカラムを取得
    pub fn indices_parts(&self, name: &str) -> Vec<String> {
        self.indices
            .get(name)
            .map(|list| split_parts(list))
            .unwrap_or_default()
    }

    /// ユニークインデックスかどうか
    pub fn is_unique(&self, name: &str) -> bool {
        self.unique.contains(name)
    }

    /// 全文インデックスかどうか
    pub fn is_fulltext(&self, name: &str) -> bool {
        self.fulltext.contains(name)
    }

    /// 外部キー制約のマップ（名前 → 句テキスト）を取得
    pub fn foreign_keys(&self) -> &BTreeMap<String, String> {
        &self.foreign_keys
    }

    /// 外部キー制約の句テキストを取得
    pub fn fk_clause(&self, name: &str) -> Option<&str> {
        self.foreign_keys.get(name).map(String::as_str)
    }

    /// 名前が外部キー制約名かどうか
    pub fn isa_fk(&self, name: &str) -> bool {
        self.foreign_keys.contains_key(name)
    }

    /// 指定カラムを参照列に含む外部キー制約を取得
    pub fn fk_by_col(&self, column: &str) -> BTreeMap<String, String> {
        self.foreign_keys
            .iter()
            .filter(|(_, clause)| {
                fk_referencing_cols(clause).iter().any(|c| c == column)
            })
            .map(|(name, clause)| (name.clone(), clause.clone()))
            .collect()
    }

    /// FK経由で依存しているテーブルの集合を取得
    pub fn fk_tables(&self) -> BTreeSet<String> {
        self.foreign_keys
            .values()
            .filter_map(|clause| fk_referenced_table(clause))
            .collect()
    }
}

/// FK句から参照元（ローカル）カラムを抽出
pub fn fk_referencing_cols(clause: &str) -> Vec<String> {
    let open = match clause.find('(') {
        Some(pos) => pos,
        None => return Vec::new(),
    };
    let close = match clause[open..].find(')') {
        Some(pos) => open + pos,
        None => return Vec::new(),
    };
    split_parts(&clause[open..=close])
}

/// FK句から参照先テーブル名を抽出
pub fn fk_referenced_table(clause: &str) -> Option<String> {
    let upper = clause.to_uppercase();
    let pos = upper.find("REFERENCES")?;
    let rest = clause[pos + "REFERENCES".len()..].trim_start();
    let end = rest
        .find(|c: char| c == '(' || c.is_whitespace())
        .unwrap_or(rest.len());
    let name = rest[..end].trim().trim_matches('`');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// ビューのオプション群
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewOptions {
    /// ALGORITHM句（UNDEFINED, MERGE, TEMPTABLE）
    pub algorithm: String,
    /// SQL SECURITY句（DEFINER, INVOKER）
    pub security: String,
    /// 末尾句（WITH … CHECK OPTION）
    pub trail: String,
}

/// ビュー定義
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// ビュー名
    pub name: String,
    /// 括弧付きカラムリストテキスト（不明なら空）
    pub fields: String,
    /// SELECT本体
    pub select: String,
    /// ビューオプション
    pub options: ViewOptions,
    /// 元のCREATE VIEWテキスト
    pub def: String,
}

impl View {
    /// 新しいビューを作成
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }
}

/// ルーチンの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutineType {
    /// ストアドプロシージャ
    Procedure,
    /// ストアドファンクション
    Function,
}

impl Default for RoutineType {
    fn default() -> Self {
        RoutineType::Procedure
    }
}

impl std::fmt::Display for RoutineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutineType::Procedure => write!(f, "PROCEDURE"),
            RoutineType::Function => write!(f, "FUNCTION"),
        }
    }
}

/// ストアドルーチン定義
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    /// ルーチン名
    pub name: String,
    /// ルーチンの種類
    pub rtype: RoutineType,
    /// パラメータリストテキスト
    pub params: String,
    /// 特性句（DETERMINISTIC, SQL SECURITY … など）
    pub options: String,
    /// 本体
    pub body: String,
    /// 元のCREATEテキスト
    pub def: String,
}

impl Routine {
    /// 新しいルーチンを作成
    pub fn new(name: String, rtype: RoutineType) -> Self {
        Self {
            name,
            rtype,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_parts() {
        assert_eq!(split_parts("(a,b)"), vec!["a", "b"]);
        assert_eq!(split_parts("(`a`, `b`(10))"), vec!["a", "b"]);
        assert_eq!(split_parts("(id)"), vec!["id"]);
    }

    #[test]
    fn test_schema_preserves_declaration_order() {
        let mut schema = Schema::new("test".to_string());
        schema.add_table(Table::new("zeta".to_string()));
        schema.add_table(Table::new("alpha".to_string()));

        assert_eq!(schema.table_order(), &["zeta", "alpha"]);
        assert!(schema.has_table("alpha"));
        assert_eq!(schema.table_count(), 2);
    }

    #[test]
    fn test_table_field_links() {
        let mut table = Table::new("users".to_string());
        table.add_field("id".to_string(), "int NOT NULL".to_string());
        table.add_field("name".to_string(), "varchar(64)".to_string());
        table.add_field("email".to_string(), "varchar(128)".to_string());

        assert_eq!(table.fields_links("id"), (None, Some("name")));
        assert_eq!(table.fields_links("name"), (Some("id"), Some("email")));
        assert_eq!(table.fields_links("email"), (Some("name"), None));
        assert_eq!(table.fields_links("missing"), (None, None));
    }

    #[test]
    fn test_table_primary_key() {
        let mut table = Table::new("t".to_string());
        table.set_primary_key("(a,b)".to_string());

        assert_eq!(table.primary_key(), Some("(a,b)"));
        assert!(table.isa_primary("a"));
        assert!(table.isa_primary("b"));
        assert!(!table.isa_primary("c"));
    }

    #[test]
    fn test_table_indices() {
        let mut table = Table::new("t".to_string());
        table.add_index("idx_name".to_string(), "(name)".to_string(), false, false);
        table.add_index("uq_email".to_string(), "(email)".to_string(), true, false);
        table.set_index_opts("idx_name".to_string(), "USING BTREE".to_string());

        assert!(table.has_index("idx_name"));
        assert!(table.is_unique("uq_email"));
        assert!(!table.is_unique("idx_name"));
        assert_eq!(table.index_opts("idx_name"), "USING BTREE");
        assert_eq!(table.indices_parts("uq_email"), vec!["email"]);
    }

    #[test]
    fn test_foreign_key_accessors() {
        let mut table = Table::new("orders".to_string());
        table.add_foreign_key(
            "fk_user".to_string(),
            "FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE".to_string(),
        );

        assert!(table.isa_fk("fk_user"));
        assert_eq!(table.fk_by_col("user_id").len(), 1);
        assert!(table.fk_by_col("other").is_empty());
        assert!(table.fk_tables().contains("users"));
    }

    #[test]
    fn test_fk_clause_helpers() {
        let clause = "FOREIGN KEY (a, b) REFERENCES `other` (x, y)";
        assert_eq!(fk_referencing_cols(clause), vec!["a", "b"]);
        assert_eq!(fk_referenced_table(clause), Some("other".to_string()));
    }

    #[test]
    fn test_view_temp_placeholder() {
        let mut schema = Schema::new("test".to_string());
        let mut view = View::new("v".to_string());
        view.fields = "(id, total)".to_string();
        view.select = "SELECT id, SUM(amount) AS total FROM orders GROUP BY id".to_string();
        schema.add_view(view);

        let placeholder = schema.view_temp("v").unwrap();
        assert!(placeholder.starts_with("CREATE TABLE v ("));
        assert!(placeholder.contains("id tinyint NOT NULL"));
        assert!(placeholder.contains("total tinyint NOT NULL"));
    }

    #[test]
    fn test_routine_type_display() {
        assert_eq!(RoutineType::Procedure.to_string(), "PROCEDURE");
        assert_eq!(RoutineType::Function.to_string(), "FUNCTION");
    }
}
