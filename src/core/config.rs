// オプション管理
//
// 差分エンジンの動作を制御するオプション集合と、
// プロジェクト設定ファイル（JSON形式）からのプリセット読み込みを提供します。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 差分エンジンのオプション
///
/// プランは `(source, target, options)` の純粋関数です。
/// バナーに載せる実行時刻も入力として受け取ります。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// テーブル名の正規表現フィルタ
    pub table_re: Option<String>,

    /// 差分ではなくFK依存閉包を出力する
    pub refs: bool,

    /// 両スキーマに存在するオブジェクトの変更のみ出力する
    pub only_both: bool,

    /// 片側にしか存在しないテーブル・ビュー・ルーチンのDROPを抑止する
    pub keep_old_tables: bool,

    /// 変更ごとにJSON形式のヘッダコメントを出力する
    pub list_tables: bool,

    /// `# was …` の旧定義コメントを抑止する
    pub no_old_defs: bool,

    /// 緩い比較（照合順序、数値精度、NOT NULL/DEFAULT '' 末尾を許容）
    pub tolerant: bool,

    /// バッククォートをスキーマローダーで保持する
    pub save_quotes: bool,

    /// バナーに記載する実行時刻（未指定ならバナーは時刻行を省略）
    #[serde(skip)]
    pub run_time: Option<DateTime<Utc>>,
}

impl Options {
    /// 新しいオプション（すべて既定値）を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// オプションの妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if let Some(pattern) = &self.table_re {
            Regex::new(pattern)
                .with_context(|| format!("Invalid table name filter: '{}'", pattern))?;
        }
        Ok(())
    }

    /// テーブル名フィルタをコンパイル
    ///
    /// フィルタ未指定またはコンパイル不能な場合は None を返します。
    /// コンパイル不能なパターンはエンジン側でフィルタ無しとして扱われます。
    pub fn table_matcher(&self) -> Option<Regex> {
        self.table_re
            .as_deref()
            .and_then(|pattern| Regex::new(pattern).ok())
    }

    /// 設定されているフラグの一覧を文字列で取得（バナーのオプションエコー用）
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(pattern) = &self.table_re {
            parts.push(format!("table-re={}", pattern));
        }
        if self.refs {
            parts.push("refs".to_string());
        }
        if self.only_both {
            parts.push("only-both".to_string());
        }
        if self.keep_old_tables {
            parts.push("keep-old-tables".to_string());
        }
        if self.list_tables {
            parts.push("list-tables".to_string());
        }
        if self.no_old_defs {
            parts.push("no-old-defs".to_string());
        }
        if self.tolerant {
            parts.push("tolerant".to_string());
        }
        if self.save_quotes {
            parts.push("save-quotes".to_string());
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// std::str::FromStrトレイトの実装
///
/// プロジェクト設定ファイル（.mysqldiff.json）のプリセットを読み込みます。
impl FromStr for Options {
    type Err = anyhow::Error;

    fn from_str(json: &str) -> Result<Self, Self::Err> {
        let options: Options =
            serde_json::from_str(json).with_context(|| "Failed to parse config file")?;
        options.validate()?;
        Ok(options)
    }
}
