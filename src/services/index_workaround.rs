// インデックス操作の条件実行ファシリティ
//
// INFORMATION_SCHEMA.STATISTICS を参照して ADD/DROP INDEX を条件付きで
// 実行するストアドプロシージャを遅延的に具現化します。複数のパスが
// 同名インデックスの作成・削除を独立に決定しうるため、すべての
// インデックス操作をこのプロシージャ経由の冪等な文に包みます。

use crate::core::schema::Schema;

/// インデックス操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAction {
    /// インデックスが存在しない場合のみ作成
    Create,
    /// インデックスが存在する場合のみ削除
    Drop,
}

impl IndexAction {
    fn as_str(&self) -> &'static str {
        match self {
            IndexAction::Create => "create",
            IndexAction::Drop => "drop",
        }
    }
}

/// 条件付きインデックス操作ファシリティ
///
/// プロシージャ名はプラン単位で一意です。同一の入力ペアからは同じ名前が
/// 再現されるよう、両スキーマのオブジェクト名からサフィックスを導出します。
#[derive(Debug, Clone)]
pub struct IndexWorkaround {
    name: String,
    used: bool,
}

impl IndexWorkaround {
    /// 新しいファシリティを作成
    pub fn new(source: &Schema, target: &Schema) -> Self {
        let mut seed = String::new();
        for name in source.table_order() {
            seed.push_str(name);
            seed.push(',');
        }
        seed.push('\0');
        for name in target.table_order() {
            seed.push_str(name);
            seed.push(',');
        }
        let digest = format!("{:x}", md5::compute(seed.as_bytes()));
        Self {
            name: format!("workaround_{}", &digest[..12]),
            used: false,
        }
    }

    /// プロシージャ名を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ファシリティが一度でも使用されたかどうか
    pub fn used(&self) -> bool {
        self.used
    }

    /// インデックス操作文を条件付きCALLに包む
    ///
    /// 初回呼び出しで使用フラグが立ち、PlanAssemblerがプロシージャの
    /// CREATE/DROPでプラン全体を包むようになります。
    pub fn wrap(&mut self, table: &str, index: &str, stmt: &str, action: IndexAction) -> String {
        self.used = true;
        format!(
            "CALL {}('{}','{}','{}','{}');",
            self.name,
            table,
            index,
            stmt.replace('\'', "''"),
            action.as_str()
        )
    }

    /// プロシージャのCREATE文を取得
    pub fn create_stmt(&self) -> String {
        format!(
            "DELIMITER ;;
CREATE PROCEDURE {name}(given_table VARCHAR(64), given_index VARCHAR(64), index_stmt TEXT, index_action VARCHAR(10))
BEGIN
  DECLARE index_count INT;
  SELECT COUNT(*) INTO index_count
    FROM INFORMATION_SCHEMA.STATISTICS
    WHERE table_schema = DATABASE()
      AND table_name = given_table
      AND index_name = given_index;
  IF (index_action = 'create' AND index_count = 0)
     OR (index_action = 'drop' AND index_count > 0) THEN
    SET @workaround_stmt = index_stmt;
    PREPARE workaround_prepared FROM @workaround_stmt;
    EXECUTE workaround_prepared;
    DEALLOCATE PREPARE workaround_prepared;
  END IF;
END;;
DELIMITER ;",
            name = self.name
        )
    }

    /// プロシージャのDROP文を取得
    pub fn drop_stmt(&self) -> String {
        format!("DROP PROCEDURE IF EXISTS {};", self.name)
    }
}
