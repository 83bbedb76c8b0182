// テーブルペア差分サービス
//
// 1組のテーブルに対して5つのサブパス（フィールド → インデックス →
// プライマリキー → 外部キー → オプション）を順に実行します。
// 各パスはDifferContextを読み書きしてChangeRecordを追加します。

mod context;
mod field_pass;
mod foreign_key_pass;
mod index_pass;
mod options_pass;
mod primary_key_pass;

pub use context::{AddedIndex, DifferContext, EmptyCharChange};

use crate::core::config::Options;
use crate::core::plan::ChangeRecord;
use crate::core::schema::Table;
use crate::services::index_workaround::IndexWorkaround;
use regex::Regex;
use std::sync::LazyLock;

static AUTO_INCREMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bAUTO_INCREMENT\b").expect("valid pattern"));

static TIMESTAMP_DEFAULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(CURRENT_TIMESTAMP|NOW|LOCALTIMESTAMP|LOCALTIME)\b(\s*\(\d*\))?")
        .expect("valid pattern")
});

static COLLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*COLLATE[= ]\s*\w+").expect("valid pattern"));

static PRECISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)\(\d+(?:,\s*\d+)?\)").expect("valid pattern"));

/// テーブルペアの差分器
pub struct TableDiffer<'a> {
    pub(crate) source: &'a Table,
    pub(crate) target: &'a Table,
    pub(crate) options: &'a Options,
}

impl<'a> TableDiffer<'a> {
    /// 新しいTableDifferを作成
    pub fn new(source: &'a Table, target: &'a Table, options: &'a Options) -> Self {
        Self {
            source,
            target,
            options,
        }
    }

    /// 5つのパスを順に実行して変更レコードを生成
    pub fn run(&self, workaround: &mut IndexWorkaround) -> Vec<ChangeRecord> {
        let mut ctx = DifferContext::new();
        let mut changes = Vec::new();

        field_pass::run(self, &mut ctx, &mut changes);
        index_pass::run(self, &mut ctx, workaround, &mut changes);
        primary_key_pass::run(self, &mut ctx, workaround, &mut changes);
        foreign_key_pass::run(self, &mut ctx, &mut changes);
        options_pass::run(self, &mut ctx, workaround, &mut changes);

        for record in &mut changes {
            let trimmed = record.sql.trim_end().to_string();
            record.sql = trimmed;
        }
        changes
    }
}

/// カラム定義がAUTO_INCREMENTを含むか
pub(crate) fn has_auto_increment(definition: &str) -> bool {
    AUTO_INCREMENT_RE.is_match(definition)
}

/// カラム定義からAUTO_INCREMENT句を取り除く
pub(crate) fn strip_auto_increment(definition: &str) -> String {
    collapse_ws(&AUTO_INCREMENT_RE.replace_all(definition, ""))
}

/// カラム定義がタイムスタンプ既定値キーワードを含むか
pub(crate) fn timestamp_default(definition: &str) -> bool {
    TIMESTAMP_DEFAULT_RE.is_match(definition)
}

/// AUTO_INCREMENT一致の真偽を "" < "1" の文字列として順序付けるキー
pub(crate) fn auto_increment_key(definition: Option<&str>) -> &'static str {
    match definition {
        Some(text) if has_auto_increment(text) => "1",
        _ => "",
    }
}

/// 緩い比較用の正規化
///
/// COLLATE句を除去し、NOT NULL / DEFAULT '' の末尾と
/// 先頭型の数値精度指定を畳みます。これ以外の緩和は行いません。
fn tolerant_normalize(definition: &str) -> String {
    let stripped = COLLATE_RE.replace_all(definition, "");
    let mut text = collapse_ws(&stripped);
    loop {
        if let Some(rest) = strip_suffix_ci(&text, " NOT NULL") {
            text = rest.trim_end().to_string();
            continue;
        }
        if let Some(rest) = strip_suffix_ci(&text, " DEFAULT ''") {
            text = rest.trim_end().to_string();
            continue;
        }
        break;
    }
    PRECISION_RE.replace(&text, "$1").to_string()
}

/// 2つのカラム定義テキストが等しいか
pub(crate) fn fields_equal(f1: &str, f2: &str, tolerant: bool) -> bool {
    if f1 == f2 {
        return true;
    }
    tolerant && tolerant_normalize(f1) == tolerant_normalize(f2)
}

/// MD5ダイジェストの16進表現
pub(crate) fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// `# was …` の旧定義コメント
pub(crate) fn was_comment(options: &Options, old_definition: &str) -> String {
    if options.no_old_defs {
        String::new()
    } else {
        format!(" # was {}", old_definition)
    }
}

/// 連続する空白を1つに畳む
pub(crate) fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = text.len().checked_sub(suffix.len())?;
    if text.is_char_boundary(cut) && text[cut..].eq_ignore_ascii_case(suffix) {
        Some(&text[..cut])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_auto_increment() {
        assert!(has_auto_increment("int NOT NULL AUTO_INCREMENT"));
        assert!(has_auto_increment("int auto_increment"));
        assert!(!has_auto_increment("int NOT NULL"));
    }

    #[test]
    fn test_strip_auto_increment() {
        assert_eq!(
            strip_auto_increment("int NOT NULL AUTO_INCREMENT"),
            "int NOT NULL"
        );
    }

    #[test]
    fn test_timestamp_default() {
        assert!(timestamp_default("timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP"));
        assert!(timestamp_default("datetime DEFAULT NOW()"));
        assert!(timestamp_default("timestamp DEFAULT LOCALTIMESTAMP(3)"));
        assert!(!timestamp_default("timestamp NULL DEFAULT NULL"));
    }

    #[test]
    fn test_auto_increment_key_ordering() {
        // 偽 < 真 を "" < "1" の文字列比較として保存する
        assert!(auto_increment_key(Some("int")) < auto_increment_key(Some("int AUTO_INCREMENT")));
        assert_eq!(auto_increment_key(None), "");
    }

    #[test]
    fn test_fields_equal_strict() {
        assert!(fields_equal("int(11) NOT NULL", "int(11) NOT NULL", false));
        assert!(!fields_equal("int(11) NOT NULL", "int NOT NULL", false));
    }

    #[test]
    fn test_fields_equal_tolerant() {
        assert!(fields_equal("int(11) NOT NULL", "int NOT NULL", true));
        assert!(fields_equal("varchar(64)", "varchar(64) DEFAULT '' NOT NULL", true));
        assert!(fields_equal(
            "varchar(64) COLLATE utf8mb4_bin",
            "varchar(64)",
            true
        ));
        assert!(!fields_equal("int", "bigint", true));
    }

    #[test]
    fn test_tolerant_normalize_keeps_other_clauses() {
        assert_eq!(
            tolerant_normalize("decimal(10,2) NOT NULL DEFAULT '0.00'"),
            "decimal NOT NULL DEFAULT '0.00'"
        );
    }
}
