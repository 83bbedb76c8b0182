// Services Layer
// ダンプ解析、差分検出、プラン組み立てのエンジン層

pub mod index_workaround;
pub mod plan_assembler;
pub mod schema_differ;
pub mod schema_parser;
pub mod table_differ;
