// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "mysqldiff";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".mysqldiff.json";

/// ログフィルタ環境変数名
pub const LOG_ENV_VAR: &str = "MYSQLDIFF_LOG";

/// バイナリ名
pub const BINARY_NAME: &str = "mysqldiff";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_constants() {
        assert_eq!(APP_NAME, "mysqldiff");
        assert_eq!(CONFIG_FILE, ".mysqldiff.json");
        assert_eq!(LOG_ENV_VAR, "MYSQLDIFF_LOG");
        assert_eq!(BINARY_NAME, "mysqldiff");
    }
}
