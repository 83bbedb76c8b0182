// スキーマダンプ解析サービス
//
// mysqldump形式のSQLテキストをスキーマモデルに変換します。
// CREATE TABLE / CREATE VIEW / CREATE PROCEDURE / CREATE FUNCTION を認識し、
// それ以外の文はデバッグログを残してスキップします。

use crate::core::error::ParseError;
use crate::core::schema::{Routine, RoutineType, Schema, Table, View};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^CREATE\s+(?:TEMPORARY\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(\S+?)\s*\(")
        .expect("valid pattern")
});

static VIEW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^CREATE\s+(?:OR\s+REPLACE\s+)?(?:ALGORITHM\s*=\s*(\S+)\s+)?(?:DEFINER\s*=\s*\S+\s+)?(?:SQL\s+SECURITY\s+(\S+)\s+)?VIEW\s+(\S+?)\s*(\([^)]*\))?\s*AS\s+(.*)$",
    )
    .expect("valid pattern")
});

static ROUTINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^CREATE\s+(?:DEFINER\s*=\s*\S+\s+)?(PROCEDURE|FUNCTION)\s+(\S+?)\s*\(")
        .expect("valid pattern")
});

static PRIMARY_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^PRIMARY\s+KEY\s*").expect("valid pattern"));

static INDEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(UNIQUE\s+|FULLTEXT\s+|SPATIAL\s+)?(?:KEY|INDEX)\s+(\S+)\s*")
        .expect("valid pattern")
});

static FOREIGN_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^CONSTRAINT\s+(\S+)\s+(FOREIGN\s+KEY\s*.*)$").expect("valid pattern")
});

static CHECK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:CONSTRAINT\s+\S+\s+)?CHECK\s*\(").expect("valid pattern")
});

static COLUMN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(\S+)\s+(.+)$").expect("valid pattern"));

static TRAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(WITH\s+(?:CASCADED\s+|LOCAL\s+)?CHECK\s+OPTION)\s*$")
        .expect("valid pattern")
});

static BODY_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(BEGIN|RETURN)\b").expect("valid pattern"));

/// 最初の括弧グループの開始・終了位置を返す
///
/// 深さと単一引用符の内外を追跡するため、プレフィックス長や
/// ENUM値に含まれる括弧で誤分割しません。
fn paren_group(text: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = None;
    let mut prev = '\0';
    for (pos, c) in text.char_indices() {
        if in_quote {
            if c == '\'' && prev != '\\' {
                in_quote = false;
            }
        } else {
            match c {
                '\'' => in_quote = true,
                '(' => {
                    if start.is_none() {
                        start = Some(pos);
                    }
                    depth += 1;
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if let Some(open) = start {
                            return Some((open, pos));
                        }
                    }
                }
                _ => {}
            }
        }
        prev = c;
    }
    None
}

/// スキーマダンプパーサー
#[derive(Debug, Clone)]
pub struct SchemaParser {
    save_quotes: bool,
}

impl SchemaParser {
    /// 新しいSchemaParserを作成
    pub fn new() -> Self {
        Self { save_quotes: false }
    }

    /// バッククォート保持の設定付きで作成
    pub fn with_save_quotes(save_quotes: bool) -> Self {
        Self { save_quotes }
    }

    /// ダンプテキストを解析してスキーマを構築
    ///
    /// # Arguments
    ///
    /// * `text` - mysqldump形式のSQLテキスト
    /// * `summary` - スキーマの出所（ファイルパスなど）
    pub fn parse(&self, text: &str, summary: &str) -> Result<Schema, ParseError> {
        let mut schema = Schema::new(summary.to_string());

        for statement in split_statements(text) {
            let statement = if self.save_quotes {
                statement
            } else {
                statement.replace('`', "")
            };

            if TABLE_RE.is_match(&statement) {
                self.parse_table(&statement, &mut schema)?;
            } else if ROUTINE_RE.is_match(&statement) {
                self.parse_routine(&statement, &mut schema);
            } else if VIEW_RE.is_match(&statement) {
                self.parse_view(&statement, &mut schema);
            } else {
                let head: String = statement.chars().take(40).collect();
                debug!(statement = %head, "skipping unrecognized statement");
            }
        }

        Ok(schema)
    }

    /// CREATE TABLE文を解析
    fn parse_table(&self, statement: &str, schema: &mut Schema) -> Result<(), ParseError> {
        let captures = match TABLE_RE.captures(statement) {
            Some(captures) => captures,
            None => return Ok(()),
        };
        let name = captures[1].trim_matches('`').to_string();

        let header_end = captures.get(0).map(|m| m.end() - 1).unwrap_or(0);
        let (open, close) = match paren_group(&statement[header_end..]) {
            Some((open, close)) => (header_end + open, header_end + close),
            None => {
                return Err(ParseError::Syntax {
                    message: format!("CREATE TABLE {} の本体が閉じていません", name),
                    line: None,
                })
            }
        };

        let mut table = Table::new(name);
        table.options = statement[close + 1..].trim().trim_end_matches(';').trim().to_string();
        table.def = format!("{};", statement.trim().trim_end_matches(';'));

        for line in statement[open + 1..close].lines() {
            let line = line.trim().trim_end_matches(',').trim();
            if line.is_empty() {
                continue;
            }
            self.parse_table_line(line, &mut table);
        }

        schema.add_table(table);
        Ok(())
    }

    /// CREATE TABLE本体の1行を解析
    fn parse_table_line(&self, line: &str, table: &mut Table) {
        if PRIMARY_KEY_RE.is_match(line) {
            if let Some((open, close)) = paren_group(line) {
                table.set_primary_key(line[open..=close].to_string());
            }
            return;
        }

        if let Some(captures) = FOREIGN_KEY_RE.captures(line) {
            let name = captures[1].trim_matches('`').to_string();
            table.add_foreign_key(name, collapse_ws(&captures[2]));
            return;
        }

        if CHECK_RE.is_match(line) {
            return;
        }

        if let Some(captures) = INDEX_RE.captures(line) {
            let rest = &line[captures.get(0).map(|m| m.end()).unwrap_or(0)..];
            // 列リストが続かない場合はKEYという名前のカラムとして読み直す
            if let Some((open, close)) = paren_group(rest) {
                let kind = captures
                    .get(1)
                    .map(|m| m.as_str().trim().to_uppercase())
                    .unwrap_or_default();
                let name = captures[2].trim_matches('`').to_string();
                let columns = rest[open..=close].to_string();
                let opts = rest[close + 1..].trim().to_string();
                table.add_index(
                    name.clone(),
                    columns,
                    kind == "UNIQUE",
                    kind == "FULLTEXT",
                );
                table.set_index_opts(name, opts);
                return;
            }
        }

        if let Some(captures) = COLUMN_RE.captures(line) {
            let name = captures[1].trim_matches('`').to_string();
            let mut definition = collapse_ws(&captures[2]);
            // カラム行内のインラインPRIMARY KEY指定
            if let Some(stripped) = strip_suffix_ci(&definition, "PRIMARY KEY") {
                definition = stripped.trim().to_string();
                table.set_primary_key(format!("({})", name));
            }
            table.add_field(name, definition);
        }
    }

    /// CREATE VIEW文を解析
    fn parse_view(&self, statement: &str, schema: &mut Schema) {
        let captures = match VIEW_RE.captures(statement) {
            Some(captures) => captures,
            None => return,
        };

        let mut view = View::new(captures[3].trim_matches('`').to_string());
        view.options.algorithm = captures
            .get(1)
            .map(|m| m.as_str().to_uppercase())
            .unwrap_or_else(|| "UNDEFINED".to_string());
        view.options.security = captures
            .get(2)
            .map(|m| m.as_str().to_uppercase())
            .unwrap_or_else(|| "DEFINER".to_string());
        view.fields = captures
            .get(4)
            .map(|m| collapse_ws(m.as_str()))
            .unwrap_or_default();
        view.def = format!("{};", statement.trim().trim_end_matches(';'));

        let mut select = collapse_ws(captures[5].trim().trim_end_matches(';'));
        if let Some(m) = TRAIL_RE.find(&select) {
            view.options.trail = select[m.start()..].trim().to_string();
            select = select[..m.start()].trim().to_string();
        }
        view.select = select;

        if view.fields.is_empty() {
            view.fields = derive_view_fields(&view.select);
        }

        schema.add_view(view);
    }

    /// CREATE PROCEDURE / CREATE FUNCTION文を解析
    fn parse_routine(&self, statement: &str, schema: &mut Schema) {
        let captures = match ROUTINE_RE.captures(statement) {
            Some(captures) => captures,
            None => return,
        };

        let rtype = if captures[1].eq_ignore_ascii_case("FUNCTION") {
            RoutineType::Function
        } else {
            RoutineType::Procedure
        };
        let name = captures[2].trim_matches('`').to_string();

        let header_end = captures.get(0).map(|m| m.end() - 1).unwrap_or(0);
        let (open, close) = match paren_group(&statement[header_end..]) {
            Some((open, close)) => (header_end + open, header_end + close),
            None => {
                debug!(routine = %name, "skipping routine with unparseable parameters");
                return;
            }
        };

        let mut routine = Routine::new(name, rtype);
        routine.params = collapse_ws(&statement[open + 1..close]);
        routine.def = statement.trim().to_string();

        let rest = statement[close + 1..].trim();
        match BODY_START_RE.find(rest) {
            Some(m) => {
                routine.options = collapse_ws(&rest[..m.start()]);
                routine.body = rest[m.start()..].trim().to_string();
            }
            None => {
                routine.body = rest.to_string();
            }
        }

        schema.add_routine(routine);
    }
}

impl Default for SchemaParser {
    fn default() -> Self {
        Self::new()
    }
}

/// テキストを文単位に分割
///
/// DELIMITER行で区切り文字を切り替え、単一引用符の内外を追跡します。
fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut buffer = String::new();
    let mut delimiter = ";".to_string();
    let mut in_quote = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if !in_quote {
            if trimmed.starts_with("--") || trimmed.starts_with('#') {
                continue;
            }
            if buffer.trim().is_empty() && trimmed.is_empty() {
                continue;
            }
            if trimmed.to_uppercase().starts_with("DELIMITER ") {
                delimiter = trimmed["DELIMITER ".len()..].trim().to_string();
                continue;
            }
        }

        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(line);

        let mut prev = '\0';
        for c in line.chars() {
            if in_quote {
                if c == '\'' && prev != '\\' {
                    in_quote = false;
                }
            } else if c == '\'' {
                in_quote = true;
            }
            prev = c;
        }

        if !in_quote {
            let complete = buffer.trim_end();
            if complete.ends_with(&delimiter) {
                let statement = complete[..complete.len() - delimiter.len()].trim();
                if !statement.is_empty() {
                    statements.push(statement.to_string());
                }
                buffer.clear();
            }
        }
    }

    let last = buffer.trim();
    if !last.is_empty() {
        statements.push(last.to_string());
    }
    statements
}

/// 連続する空白を1つに畳む
fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 大文字小文字を無視して接尾辞を取り除く
fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = text.len().checked_sub(suffix.len())?;
    if text.is_char_boundary(cut) && text[cut..].eq_ignore_ascii_case(suffix) {
        Some(&text[..cut])
    } else {
        None
    }
}

/// SELECT本体から出力カラムリストを導出（ベストエフォート）
fn derive_view_fields(select: &str) -> String {
    let upper = select.to_uppercase();
    let start = match upper.find("SELECT") {
        Some(pos) => pos + "SELECT".len(),
        None => return String::new(),
    };
    let end = match upper.find(" FROM ") {
        Some(pos) if pos > start => pos,
        _ => return String::new(),
    };

    let mut columns = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in select[start..end].chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                columns.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        columns.push(current.trim().to_string());
    }

    let mut names = Vec::new();
    for expr in &columns {
        let upper_expr = expr.to_uppercase();
        let name = if let Some(pos) = upper_expr.rfind(" AS ") {
            expr[pos + 4..].trim()
        } else if let Some(pos) = expr.rfind('.') {
            expr[pos + 1..].trim()
        } else {
            expr.trim()
        };
        let name = name.trim_matches('`');
        if name.is_empty() || name.contains('(') || name == "*" {
            return String::new();
        }
        names.push(name.to_string());
    }

    if names.is_empty() {
        String::new()
    } else {
        format!("({})", names.join(", "))
    }
}
