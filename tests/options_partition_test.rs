/// テーブルオプション・パーティション差分のテスト
///
/// オプション変更の出力と、パーティション再定義の
/// REMOVE PARTITIONING → オプション適用 → 再設定の順序を確認します。

#[cfg(test)]
mod options_partition_tests {
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

    // パーティション再定義: REMOVE PARTITIONING → 非パーティションオプション →
    // 最後にパーティションを含む完全なオプションで再設定
    #[test]
    fn test_partition_redefinition() {
        let output = plan(
            "CREATE TABLE t (\n  id int\n) ENGINE=InnoDB PARTITION BY HASH(id) PARTITIONS 4;",
            "CREATE TABLE t (\n  id int\n) ENGINE=InnoDB PARTITION BY HASH(id) PARTITIONS 8;",
        );

        let remove = output.find("ALTER TABLE t REMOVE PARTITIONING;").unwrap();
        let plain = output.find("ALTER TABLE t ENGINE=InnoDB COMMENT='';").unwrap();
        let reinstall = output
            .find("ALTER TABLE t ENGINE=InnoDB COMMENT='' PARTITION BY HASH(id) PARTITIONS 8;")
            .unwrap();
        assert!(remove < plain);
        assert!(plain < reinstall);
    }

    #[test]
    fn test_partition_removal() {
        let output = plan(
            "CREATE TABLE t (\n  id int\n) ENGINE=InnoDB PARTITION BY HASH(id) PARTITIONS 4;",
            "CREATE TABLE t (\n  id int\n) ENGINE=InnoDB;",
        );

        assert!(output.contains("ALTER TABLE t REMOVE PARTITIONING;"));
        assert!(output.contains("ALTER TABLE t ENGINE=InnoDB COMMENT='';"));
        assert!(!output.contains("PARTITIONS 4;"));
    }

    #[test]
    fn test_engine_change_keeps_existing_comment() {
        let output = plan(
            "CREATE TABLE t (\n  id int\n) ENGINE=MyISAM COMMENT='log';",
            "CREATE TABLE t (\n  id int\n) ENGINE=InnoDB COMMENT='log';",
        );

        assert!(output.contains("ALTER TABLE t ENGINE=InnoDB COMMENT='log';"));
        assert!(!output.contains("COMMENT=''"));
    }

    #[test]
    fn test_tolerant_ignores_auto_increment_counter() {
        let options = Options {
            tolerant: true,
            ..Options::default()
        };
        let output = plan_with(
            "CREATE TABLE t (\n  id int\n) ENGINE=InnoDB AUTO_INCREMENT=42;",
            "CREATE TABLE t (\n  id int\n) ENGINE=InnoDB;",
            options,
        );

        assert!(!output.contains("ALTER TABLE"));
    }

    #[test]
    fn test_options_change_without_tolerant_is_emitted() {
        let output = plan(
            "CREATE TABLE t (\n  id int\n) ENGINE=InnoDB AUTO_INCREMENT=42;",
            "CREATE TABLE t (\n  id int\n) ENGINE=InnoDB;",
        );

        assert!(output.contains("ALTER TABLE t ENGINE=InnoDB COMMENT='';"));
    }
}
