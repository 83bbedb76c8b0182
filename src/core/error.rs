// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、DiffError, ParseError を定義します。

use thiserror::Error;

/// 差分エンジンの境界で発生するエラー
///
/// エンジン本体は整形済みモデルに対して失敗しません。
/// エラーはスキーマ読み込み境界とCLIでのみ発生します。
#[derive(Debug, Clone, Error)]
pub enum DiffError {
    /// モデルが解決を拒否したオブジェクト参照
    ///
    /// エンジンはこの条件を局所的に処理し、該当サブケースをスキップして
    /// ベストエフォートのプランを生成します。
    #[error("無効なスキーマ参照: {object} ({context})")]
    InvalidSchemaReference {
        /// 解決できなかったオブジェクト名
        object: String,
        /// 参照が発生した文脈
        context: String,
    },

    /// スキーマ読み込みの失敗
    ///
    /// コラボレーター（ファイル読み込み）で発生し、エンジン実行前に
    /// 呼び出し元へ伝播されます。
    #[error("スキーマの読み込みに失敗しました: {path} (原因: {cause})")]
    ExternalLoadFailure {
        /// 読み込み対象のパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl DiffError {
    /// 無効な参照エラーかどうか
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, DiffError::InvalidSchemaReference { .. })
    }

    /// 読み込みエラーかどうか
    pub fn is_load_failure(&self) -> bool {
        matches!(self, DiffError::ExternalLoadFailure { .. })
    }
}

/// スキーマダンプ解析エラー
///
/// ダンプテキストの解析時に発生するエラーを表現します。
/// 解析不能な文はスキップが既定の方針で、エラーを返すのは
/// 入力全体が読めない場合に限られます。
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// 構文エラー
    #[error("構文エラー: {message}{}", format_line_opt(.line))]
    Syntax {
        /// エラーメッセージ
        message: String,
        /// エラー発生行
        line: Option<usize>,
    },

    /// 未対応の文
    #[error("未対応の文: {statement}")]
    UnsupportedStatement {
        /// 文の先頭部分
        statement: String,
    },
}

impl ParseError {
    /// 構文エラーかどうか
    pub fn is_syntax(&self) -> bool {
        matches!(self, ParseError::Syntax { .. })
    }

    /// 未対応文エラーかどうか
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ParseError::UnsupportedStatement { .. })
    }
}

/// 行番号をフォーマットするヘルパー関数
fn format_line_opt(line: &Option<usize>) -> String {
    line.map_or(String::new(), |n| format!(" (行: {})", n))
}
