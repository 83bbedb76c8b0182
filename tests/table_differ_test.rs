/// テーブルペア差分のテスト
///
/// フィールド・インデックス・PK・FKの各パスが、中間状態を妥当に保つ
/// 順序でDDLを出力することを確認します。

#[cfg(test)]
mod table_differ_tests {
    use mysqldiff::core::config::Options;
    use mysqldiff::services::plan_assembler::PlanAssembler;
    use mysqldiff::services::schema_differ::SchemaDiffer;
    use mysqldiff::services::schema_parser::SchemaParser;

    fn plan_with(source_sql: &str, target_sql: &str, options: Options) -> String {
        let parser = SchemaParser::new();
        let source = parser.parse(source_sql, "schema1").unwrap();
        let target = parser.parse(target_sql, "schema2").unwrap();
        let differ = SchemaDiffer::new(&source, &target, &options);
        let outcome = differ.diff();
        PlanAssembler::new(&options).assemble(
            outcome.changes,
            &outcome.workaround,
            &source,
            &target,
        )
    }

    fn plan(source_sql: &str, target_sql: &str) -> String {
        plan_with(source_sql, target_sql, Options::default())
    }

    #[test]
    fn test_column_type_change() {
        let output = plan(
            "CREATE TABLE t (\n  a int\n);",
            "CREATE TABLE t (\n  a bigint\n);",
        );

        assert!(output.contains("ALTER TABLE t CHANGE COLUMN a a bigint; # was int"));
        assert_eq!(output.matches("ALTER TABLE").count(), 1);
    }

    #[test]
    fn test_column_type_change_without_old_defs() {
        let options = Options {
            no_old_defs: true,
            ..Options::default()
        };
        let output = plan_with(
            "CREATE TABLE t (\n  a int\n);",
            "CREATE TABLE t (\n  a bigint\n);",
            options,
        );

        assert!(output.contains("ALTER TABLE t CHANGE COLUMN a a bigint;"));
        assert!(!output.contains("# was"));
    }

    #[test]
    fn test_tolerant_comparison_suppresses_change() {
        let options = Options {
            tolerant: true,
            ..Options::default()
        };
        let output = plan_with(
            "CREATE TABLE t (\n  a int(11) NOT NULL\n);",
            "CREATE TABLE t (\n  a int NOT NULL\n);",
            options,
        );

        assert!(!output.contains("CHANGE COLUMN"));
    }

    #[test]
    fn test_dropped_column_drops_late() {
        let output = plan(
            "CREATE TABLE t (\n  a int,\n  b int,\n  KEY idx_a (a)\n);",
            "CREATE TABLE t (\n  b int,\n  KEY idx_a (b)\n);",
        );

        let index_add = output.find("ADD INDEX idx_a").unwrap();
        let column_drop = output.find("DROP COLUMN a").unwrap();
        assert!(index_add < column_drop);
        assert!(output.contains("ALTER TABLE t DROP COLUMN a; # was int"));
    }

    #[test]
    fn test_added_column_with_position_hint() {
        let output = plan(
            "CREATE TABLE t (\n  a int,\n  c int\n);",
            "CREATE TABLE t (\n  a int,\n  b int,\n  c int\n);",
        );

        assert!(output.contains("ALTER TABLE t ADD COLUMN b int AFTER a;"));
    }

    #[test]
    fn test_added_first_column() {
        let output = plan(
            "CREATE TABLE t (\n  b int\n);",
            "CREATE TABLE t (\n  a int,\n  b int\n);",
        );

        assert!(output.contains("ALTER TABLE t ADD COLUMN a int FIRST;"));
    }

    // 新しい複合PKとAUTO_INCREMENT: 裏付けインデックスがPK追加に先行し、
    // CHANGE COLUMNがADD PRIMARY KEYを同一文に融合する
    #[test]
    fn test_composite_pk_with_auto_increment() {
        let output = plan(
            "CREATE TABLE t (\n  a int,\n  b int\n);",
            "CREATE TABLE t (\n  a int,\n  b int AUTO_INCREMENT,\n  PRIMARY KEY (a,b)\n);",
        );

        let backing_index = output.find("ADD INDEX mysqldiff_").unwrap();
        let pk_change = output
            .find("ALTER TABLE t CHANGE COLUMN b b int AUTO_INCREMENT, ADD PRIMARY KEY (a,b);")
            .unwrap();
        assert!(backing_index < pk_change);
        // 裏付けインデックスは条件付きCALL経由
        assert!(output.contains("CREATE PROCEDURE workaround_"));
        assert!(output.contains("DROP PROCEDURE IF EXISTS workaround_"));
    }

    // AUTO_INCREMENTなPKカラムの削除: DROP PRIMARY KEYとAUTO_INCREMENTを
    // 外すCHANGE COLUMNが単一の文に融合される
    #[test]
    fn test_drop_pk_fuses_auto_increment_strip() {
        let output = plan(
            "CREATE TABLE t (\n  id int AUTO_INCREMENT,\n  PRIMARY KEY (id)\n);",
            "CREATE TABLE t (\n  id int\n);",
        );

        assert!(output.contains("ALTER TABLE t DROP PRIMARY KEY, CHANGE COLUMN id id int;"));
        assert_eq!(output.matches("ALTER TABLE").count(), 1);
        assert!(!output.contains("CALL workaround_"));
    }

    #[test]
    fn test_standalone_pk_add() {
        let output = plan(
            "CREATE TABLE t (\n  a int,\n  b int\n);",
            "CREATE TABLE t (\n  a int,\n  b int,\n  PRIMARY KEY (a,b)\n);",
        );

        assert!(output.contains("ALTER TABLE t ADD PRIMARY KEY (a,b);"));
    }

    #[test]
    fn test_standalone_pk_drop() {
        let output = plan(
            "CREATE TABLE t (\n  a int,\n  PRIMARY KEY (a)\n);",
            "CREATE TABLE t (\n  a int\n);",
        );

        assert!(output.contains("ALTER TABLE t DROP PRIMARY KEY;"));
    }

    #[test]
    fn test_single_column_pk_added_with_column() {
        let output = plan(
            "CREATE TABLE t (\n  a int\n);",
            "CREATE TABLE t (\n  a int,\n  id int,\n  PRIMARY KEY (id)\n);",
        );

        assert!(output.contains("ALTER TABLE t ADD COLUMN id int PRIMARY KEY AFTER a;"));
    }

    // FK名と衝突するインデックスでFKが変わる場合の保護手順:
    // カバー → 旧インデックスDROP → FK再作成 → カバー撤去
    #[test]
    fn test_fk_coupled_index_change() {
        let source = "CREATE TABLE p (\n  id int,\n  PRIMARY KEY (id)\n);\nCREATE TABLE q (\n  id int,\n  PRIMARY KEY (id)\n);\nCREATE TABLE t (\n  x int,\n  KEY fk_x (x),\n  CONSTRAINT fk_x FOREIGN KEY (x) REFERENCES p (id)\n);";
        let target = "CREATE TABLE p (\n  id int,\n  PRIMARY KEY (id)\n);\nCREATE TABLE q (\n  id int,\n  PRIMARY KEY (id)\n);\nCREATE TABLE t (\n  x int,\n  KEY fk_x (x),\n  CONSTRAINT fk_x FOREIGN KEY (x) REFERENCES q (id)\n);";
        let output = plan(source, target);

        let cover_add = output.find("rc_temp_").unwrap();
        let index_drop = output
            .find("'fk_x','ALTER TABLE t DROP INDEX fk_x;','drop'")
            .unwrap();
        let fk_drop = output.find("ALTER TABLE t DROP FOREIGN KEY fk_x;").unwrap();
        let fk_add = output
            .find("ALTER TABLE t ADD CONSTRAINT fk_x FOREIGN KEY (x) REFERENCES q (id);")
            .unwrap();
        assert!(cover_add < index_drop);
        assert!(index_drop < fk_drop);
        assert!(fk_drop < fk_add);

        // カバーは最後に撤去される
        let cover_cleanup = output.rfind("rc_temp_").unwrap();
        assert!(fk_add < cover_cleanup);
        assert!(output.contains("_change"));
    }

    #[test]
    fn test_matching_fk_backed_index_is_left_alone() {
        let sql = "CREATE TABLE p (\n  id int,\n  PRIMARY KEY (id)\n);\nCREATE TABLE t (\n  x int,\n  KEY fk_x (x),\n  CONSTRAINT fk_x FOREIGN KEY (x) REFERENCES p (id)\n);";
        let output = plan(sql, sql);

        assert!(!output.contains("CALL"));
        assert!(!output.contains("ALTER"));
    }

    #[test]
    fn test_index_change_is_wrapped_and_idempotent() {
        let output = plan(
            "CREATE TABLE t (\n  a int,\n  b int,\n  KEY idx (a)\n);",
            "CREATE TABLE t (\n  a int,\n  b int,\n  KEY idx (a,b)\n);",
        );

        let drop_call = output
            .find("'idx','ALTER TABLE t DROP INDEX idx;','drop'")
            .unwrap();
        let add_call = output
            .find("'idx','ALTER TABLE t ADD INDEX idx (a,b);','create'")
            .unwrap();
        assert!(drop_call < add_call);
        assert!(output.contains("CREATE PROCEDURE workaround_"));
        assert!(output.contains("DROP PROCEDURE IF EXISTS workaround_"));
    }

    #[test]
    fn test_index_becomes_unique() {
        let output = plan(
            "CREATE TABLE t (\n  a int,\n  KEY idx (a)\n);",
            "CREATE TABLE t (\n  a int,\n  UNIQUE KEY idx (a)\n);",
        );

        assert!(output.contains("ALTER TABLE t ADD UNIQUE INDEX idx (a);"));
    }

    #[test]
    fn test_fk_added_last() {
        let output = plan(
            "CREATE TABLE p (\n  id int,\n  PRIMARY KEY (id)\n);\nCREATE TABLE t (\n  a int,\n  x int\n);",
            "CREATE TABLE p (\n  id int,\n  PRIMARY KEY (id)\n);\nCREATE TABLE t (\n  a bigint,\n  x int,\n  CONSTRAINT fk_x FOREIGN KEY (x) REFERENCES p (id)\n);",
        );

        let change = output.find("CHANGE COLUMN a a bigint").unwrap();
        let fk_add = output
            .find("ALTER TABLE t ADD CONSTRAINT fk_x FOREIGN KEY (x) REFERENCES p (id);")
            .unwrap();
        assert!(change < fk_add);
    }

    #[test]
    fn test_fk_dropped_early() {
        let output = plan(
            "CREATE TABLE p (\n  id int,\n  PRIMARY KEY (id)\n);\nCREATE TABLE t (\n  a int,\n  x int,\n  CONSTRAINT fk_x FOREIGN KEY (x) REFERENCES p (id)\n);",
            "CREATE TABLE p (\n  id int,\n  PRIMARY KEY (id)\n);\nCREATE TABLE t (\n  a int\n);",
        );

        let fk_drop = output.find("ALTER TABLE t DROP FOREIGN KEY fk_x;").unwrap();
        let column_drop = output.find("DROP COLUMN x").unwrap();
        assert!(fk_drop < column_drop);
    }

    #[test]
    fn test_timestamp_default_change_lands_late() {
        let output = plan(
            "CREATE TABLE t (\n  a int,\n  created datetime\n);",
            "CREATE TABLE t (\n  a bigint,\n  created timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP\n);",
        );

        let plain_change = output.find("CHANGE COLUMN a a bigint").unwrap();
        let timestamp_change = output.find("CHANGE COLUMN created created").unwrap();
        assert!(plain_change < timestamp_change);
    }

    // 足場インデックスは、列自体が落ちた場合を除きすべて撤去される
    #[test]
    fn test_temporary_indexes_are_cleaned_up() {
        let output = plan(
            "CREATE TABLE t (\n  a int,\n  b int\n);",
            "CREATE TABLE t (\n  a int,\n  b int AUTO_INCREMENT,\n  PRIMARY KEY (a,b)\n);",
        );

        let created = output
            .matches("','create'")
            .count();
        let dropped = output.matches("','drop'").count();
        assert_eq!(created, dropped);
    }
}
