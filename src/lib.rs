// mysqldiffライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメインロジック（スキーマモデル、変更レコード、オプション、エラー）
// - services: エンジン層（ダンプ解析、差分検出、プラン組み立て）

pub mod cli;
pub mod core;
pub mod services;
