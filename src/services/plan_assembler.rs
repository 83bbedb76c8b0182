// プラン組み立てサービス
//
// 変更レコードを優先度の降順で安定ソートし、バナーを前置し、
// ワークアラウンドプロシージャが使われた場合はそのCREATE/DROPで
// プラン全体を包みます。

use crate::core::config::Options;
use crate::core::plan::ChangeRecord;
use crate::core::schema::Schema;
use crate::services::index_workaround::IndexWorkaround;
use std::cmp::Reverse;

/// プラン組み立て器
pub struct PlanAssembler<'a> {
    options: &'a Options,
}

impl<'a> PlanAssembler<'a> {
    /// 新しいPlanAssemblerを作成
    pub fn new(options: &'a Options) -> Self {
        Self { options }
    }

    /// 変更レコード群から最終的なプランテキストを組み立てる
    ///
    /// ソートは安定で、同一バケット内では出力順が保存されます。
    pub fn assemble(
        &self,
        mut changes: Vec<ChangeRecord>,
        workaround: &IndexWorkaround,
        source: &Schema,
        target: &Schema,
    ) -> String {
        changes.sort_by_key(|record| Reverse(record.priority));

        let mut out = String::new();
        if !self.options.list_tables && !self.options.refs {
            out.push_str(&self.banner(source, target));
        }
        if workaround.used() {
            out.push_str(&workaround.create_stmt());
            out.push_str("\n\n");
        }
        for record in &changes {
            if self.options.list_tables {
                if let Some(meta) = &record.meta {
                    if let Ok(json) = serde_json::to_string(meta) {
                        out.push_str("-- ");
                        out.push_str(&json);
                        out.push('\n');
                    }
                }
            }
            out.push_str(&record.sql);
            out.push_str("\n\n");
        }
        if workaround.used() {
            out.push_str(&workaround.drop_stmt());
            out.push('\n');
        }
        out
    }

    /// プラン先頭のバナーを組み立てる
    fn banner(&self, source: &Schema, target: &Schema) -> String {
        let mut banner = format!("## mysqldiff {}\n##\n", env!("CARGO_PKG_VERSION"));
        if let Some(run_time) = self.options.run_time {
            banner.push_str(&format!(
                "## Run on {}\n",
                run_time.format("%a %b %e %H:%M:%S %Y")
            ));
        }
        banner.push_str(&format!("## Options: {}\n##\n", self.options.summary()));
        banner.push_str(&format!("## --- {}\n", source.summary));
        banner.push_str(&format!("## +++ {}\n\n", target.summary));
        banner
    }
}
