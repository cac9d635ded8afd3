//! Per-table model source generation.

use crate::loader::ColumnInfo;
use crate::type_mapper::map_field_type;
use heck::{ToShoutySnakeCase, ToSnakeCase};
use modelq::Dialect;
use std::collections::HashSet;
use std::path::PathBuf;

const HEADER: &str = "// @generated by modelq (modelq-cli)\n";

#[derive(Debug, Clone)]
pub struct CodeConfig {
    pub dialect: Dialect,
    /// Schema baked into each `TableModel`. Ignored by MySQL at render time.
    pub schema: String,
    /// Output directory; its name is the generated module.
    pub out: PathBuf,
    /// Also write timestamp columns the database stamps itself.
    pub touch_timestamp: bool,
}

impl CodeConfig {
    pub fn module(&self) -> String {
        self.out
            .file_name()
            .and_then(|n| n.to_str())
            .map(sanitize_field_ident)
            .unwrap_or_else(|| "models".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

/// One table's module plus what `mod.rs` needs to re-export it.
#[derive(Debug, Clone)]
pub struct GeneratedTable {
    pub table: String,
    pub module: String,
    pub struct_name: String,
    pub file: GeneratedFile,
}

/// `cp_user_124_jiu` -> `CpUser124Jiu`, `CP_test_USer` -> `CpTestUser`.
///
/// A letter is uppercased at the start of a segment and lowercased
/// elsewhere. Digits are kept and end the segment; every other character is
/// dropped and ends the segment.
pub fn to_capital_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment_start = true;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if segment_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            segment_start = false;
        } else {
            if ch.is_ascii_digit() {
                out.push(ch);
            }
            segment_start = true;
        }
    }
    out
}

struct Field<'a> {
    column: &'a ColumnInfo,
    ident: String,
    ty: &'static str,
}

impl Field<'_> {
    fn is_copy(&self) -> bool {
        !matches!(self.ty, "String" | "Vec<u8>")
    }

    fn is_time(&self) -> bool {
        self.ty == "chrono::NaiveDateTime"
    }
}

/// The single primary-key column. Composite keys yield `None`.
fn primary_key(columns: &[ColumnInfo]) -> Option<&ColumnInfo> {
    let mut pks = columns.iter().filter(|c| c.is_primary());
    match (pks.next(), pks.next()) {
        (Some(pk), None) => Some(pk),
        _ => None,
    }
}

/// Columns written by an object insert.
fn insertable<'a>(fields: &'a [Field<'a>], pk: Option<&str>, touch_timestamp: bool) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|f| !(pk == Some(f.column.name.as_str()) && f.column.is_auto_increment()))
        .filter(|f| touch_timestamp || !(f.is_time() && f.column.defaults_to_now()))
        .map(|f| f.column.name.as_str())
        .collect()
}

/// Columns written by an object update.
fn updatable<'a>(fields: &'a [Field<'a>], pk: Option<&str>, touch_timestamp: bool) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|f| pk != Some(f.column.name.as_str()))
        .filter(|f| touch_timestamp || !f.column.updates_to_now())
        .map(|f| f.column.name.as_str())
        .collect()
}

fn str_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|s| format!("{s:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn generate_table(
    table: &str,
    columns: &[ColumnInfo],
    cfg: &CodeConfig,
) -> anyhow::Result<GeneratedTable> {
    if columns.is_empty() {
        anyhow::bail!("table {table} has no columns");
    }

    let struct_name = sanitize_type_ident(&to_capital_case(table));
    let module = sanitize_field_ident(table);
    let static_name = module.trim_start_matches("r#").to_shouty_snake_case();

    let mut seen: HashSet<String> = HashSet::new();
    let mut fields: Vec<Field<'_>> = Vec::with_capacity(columns.len());
    for c in columns {
        let ident = sanitize_field_ident(&c.name);
        if !seen.insert(ident.clone()) {
            anyhow::bail!("duplicate field name after sanitization in {table}: {ident}");
        }
        fields.push(Field {
            column: c,
            ident,
            ty: map_field_type(cfg.dialect, &c.data_type),
        });
    }

    let pk = primary_key(columns);
    let pk_name = pk.map(|c| c.name.as_str());
    let column_names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();

    let mut out = String::new();
    out.push_str(HEADER);
    if cfg.schema.is_empty() {
        out.push_str(&format!("// Table: {table}\n\n"));
    } else {
        out.push_str(&format!("// Table: {}.{table}\n\n", cfg.schema));
    }
    out.push_str(&format!(
        "pub static {static_name}: ::modelq::TableModel = ::modelq::TableModel::new({:?}, {table:?})\n",
        cfg.schema
    ));
    out.push_str(&format!("    .with_alias({struct_name:?})\n"));
    out.push_str(&format!("    .with_columns(&[{}])", str_list(&column_names)));
    match pk_name {
        Some(pk) => out.push_str(&format!("\n    .with_primary_key({pk:?});\n\n")),
        None => out.push_str(";\n\n"),
    }

    out.push_str("#[derive(Debug, Clone, Default, PartialEq)]\n");
    out.push_str(&format!("pub struct {struct_name} {{\n"));
    for f in &fields {
        for line in f.column.comment.lines().filter(|l| !l.trim().is_empty()) {
            out.push_str(&format!("    /// {}\n", line.trim()));
        }
        out.push_str(&format!("    pub {}: {},\n", f.ident, f.ty));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("impl ::modelq::Model for {struct_name} {{\n"));
    out.push_str(&format!("    const TABLE: &'static ::modelq::TableModel = &{static_name};\n"));
    out.push_str(&format!(
        "    const INSERTABLE: &'static [&'static str] = &[{}];\n",
        str_list(&insertable(&fields, pk_name, cfg.touch_timestamp))
    ));
    out.push_str(&format!(
        "    const UPDATABLE: &'static [&'static str] = &[{}];\n\n",
        str_list(&updatable(&fields, pk_name, cfg.touch_timestamp))
    ));

    out.push_str("    fn set_column(&mut self, column: &str, cell: &[u8]) {\n");
    out.push_str("        match column {\n");
    for f in &fields {
        out.push_str(&format!(
            "            {:?} => self.{} = ::modelq::row::FromCell::from_cell(cell),\n",
            f.column.name, f.ident
        ));
    }
    out.push_str("            _ => {}\n");
    out.push_str("        }\n");
    out.push_str("    }\n\n");

    out.push_str("    fn column_value(&self, column: &str) -> Option<::modelq::Value> {\n");
    out.push_str("        match column {\n");
    for f in &fields {
        let read = if f.is_copy() {
            format!("self.{}", f.ident)
        } else {
            format!("self.{}.clone()", f.ident)
        };
        out.push_str(&format!(
            "            {:?} => Some({read}.into()),\n",
            f.column.name
        ));
    }
    out.push_str("            _ => None,\n");
    out.push_str("        }\n");
    out.push_str("    }\n");

    if let Some(pk) = pk.filter(|c| c.is_auto_increment()) {
        let field = fields
            .iter()
            .find(|f| f.column.name == pk.name)
            .ok_or_else(|| anyhow::anyhow!("primary key {} missing from {table}", pk.name))?;
        match field.ty {
            "i64" => {
                out.push_str("\n    fn set_insert_id(&mut self, id: i64) {\n");
                out.push_str(&format!("        self.{} = id;\n", field.ident));
                out.push_str("    }\n");
            }
            "i32" => {
                out.push_str("\n    fn set_insert_id(&mut self, id: i64) {\n");
                out.push_str(&format!(
                    "        self.{} = id.try_into().unwrap_or_default();\n",
                    field.ident
                ));
                out.push_str("    }\n");
            }
            _ => {}
        }
    }
    out.push_str("}\n\n");

    out.push_str(&format!("impl {struct_name} {{\n"));
    out.push_str("    pub fn select(columns: &[&str]) -> ::modelq::ModelQuery<Self> {\n");
    out.push_str("        ::modelq::ModelQuery::select(columns)\n");
    out.push_str("    }\n\n");
    out.push_str("    pub fn insert_query(&self) -> ::modelq::ModelQuery<Self> {\n");
    out.push_str("        ::modelq::ModelQuery::insert(self)\n");
    out.push_str("    }\n\n");
    out.push_str("    pub fn update_query(&self, columns: &[&str]) -> ::modelq::ModelQuery<Self> {\n");
    out.push_str("        ::modelq::ModelQuery::update(self, columns)\n");
    out.push_str("    }\n\n");
    out.push_str("    pub fn delete_query() -> ::modelq::ModelQuery<Self> {\n");
    out.push_str("        ::modelq::ModelQuery::delete()\n");
    out.push_str("    }\n");
    for f in &fields {
        out.push('\n');
        out.push_str(&format!(
            "    pub fn filter_{}<V: Into<::modelq::Value>>(op: &str, first: V, rest: impl IntoIterator<Item = V>) -> ::modelq::Filter {{\n",
            f.ident.trim_start_matches("r#")
        ));
        out.push_str(&format!(
            "        ::modelq::Filter::from_op({:?}, op, first, rest)\n",
            f.column.name
        ));
        out.push_str("    }\n");
    }
    out.push_str("}\n");

    let file_stem = module.trim_start_matches("r#");
    Ok(GeneratedTable {
        table: table.to_string(),
        module: module.clone(),
        struct_name,
        file: GeneratedFile {
            path: cfg.out.join(format!("{file_stem}.rs")),
            content: out,
        },
    })
}

/// `mod.rs` declaring and re-exporting every generated table.
pub fn generate_mod_rs(tables: &[GeneratedTable], cfg: &CodeConfig) -> anyhow::Result<GeneratedFile> {
    let mut sorted: Vec<&GeneratedTable> = tables.iter().collect();
    sorted.sort_by(|a, b| a.module.cmp(&b.module));

    let mut seen_modules: HashSet<&str> = HashSet::new();
    let mut seen_structs: HashSet<&str> = HashSet::new();
    for t in &sorted {
        if !seen_modules.insert(t.module.as_str()) {
            anyhow::bail!("duplicate module name after sanitization: {} (table: {})", t.module, t.table);
        }
        if !seen_structs.insert(t.struct_name.as_str()) {
            anyhow::bail!(
                "duplicate model struct name after sanitization: {} (table: {})",
                t.struct_name,
                t.table
            );
        }
    }

    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str(&format!("// Module: {}\n\n", cfg.module()));
    for t in &sorted {
        out.push_str(&format!("pub mod {};\n", t.module));
    }
    out.push('\n');
    for t in &sorted {
        out.push_str(&format!("pub use {}::{};\n", t.module, t.struct_name));
    }

    Ok(GeneratedFile {
        path: cfg.out.join("mod.rs"),
        content: out,
    })
}

fn sanitize_type_ident(name: &str) -> String {
    let mut s = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();

    if s.is_empty() {
        s.push('_');
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    if is_reserved_type_name(&s) {
        s.push_str("Row");
    }
    s
}

/// Names the generated module refers to unqualified.
fn is_reserved_type_name(s: &str) -> bool {
    matches!(
        s,
        "Self" | "String" | "Vec" | "Option" | "Into" | "IntoIterator"
    )
}

fn sanitize_field_ident(column: &str) -> String {
    let mut s = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    s = s.to_snake_case();
    if s.is_empty() {
        s.push('_');
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    // Not valid as raw identifiers.
    if matches!(s.as_str(), "self" | "super" | "crate") {
        s.push('_');
        return s;
    }
    if is_rust_keyword(&s) {
        format!("r#{s}")
    } else {
        s
    }
}

fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break"
            | "const"
            | "continue"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "static"
            | "struct"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
            | "gen"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::KeyKind;

    fn cfg(touch_timestamp: bool) -> CodeConfig {
        CodeConfig {
            dialect: Dialect::Postgres,
            schema: "public".to_string(),
            out: PathBuf::from("src/models"),
            touch_timestamp,
        }
    }

    fn column(name: &str, data_type: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            ..ColumnInfo::default()
        }
    }

    fn user_columns() -> Vec<ColumnInfo> {
        let mut id = column("id", "integer");
        id.key = KeyKind::Primary;
        id.extra = "auto_increment".to_string();
        id.default_value = Some("nextval('user_info_id_seq'::regclass)".to_string());

        let mut name = column("Name", "character varying");
        name.comment = "display name".to_string();

        let mut created = column("created_at", "timestamp without time zone");
        created.default_value = Some("now()".to_string());

        let mut updated = column("updated_at", "timestamp without time zone");
        updated.default_value = Some("CURRENT_TIMESTAMP".to_string());
        updated.extra = "on update CURRENT_TIMESTAMP".to_string();

        vec![id, name, created, updated, column("type", "text"), column("score", "double precision")]
    }

    fn value_columns() -> Vec<ColumnInfo> {
        let mut id = column("id", "bigint");
        id.key = KeyKind::Primary;
        id.extra = "auto_increment".to_string();
        id.default_value = Some("nextval('value_id_seq'::regclass)".to_string());

        let mut label = column("label", "text");
        label.comment = "shown in lists".to_string();

        let mut created = column("created", "timestamp without time zone");
        created.default_value = Some("now()".to_string());

        vec![id, label, column("type", "text"), created]
    }

    #[test]
    fn capital_case_names() {
        assert_eq!(to_capital_case("cp_user_124_jiu"), "CpUser124Jiu");
        assert_eq!(to_capital_case("Cp_u___test"), "CpUTest");
        assert_eq!(to_capital_case("hello23World"), "Hello23World");
        assert_eq!(to_capital_case("CP_test_USer"), "CpTestUser");
        assert_eq!(to_capital_case("USER"), "User");
        assert_eq!(to_capital_case("order-items"), "OrderItems");
    }

    #[test]
    fn field_idents_are_valid_rust() {
        assert_eq!(sanitize_field_ident("UserName"), "user_name");
        assert_eq!(sanitize_field_ident("type"), "r#type");
        assert_eq!(sanitize_field_ident("self"), "self_");
        assert_eq!(sanitize_field_ident("1st place"), "_1st_place");
        assert_eq!(sanitize_type_ident("123"), "_123");
        assert_eq!(sanitize_type_ident("Self"), "SelfRow");
    }

    #[test]
    fn output_matches_checked_in_module() {
        // tests/generated_compiles.rs builds the same file.
        let t = generate_table("value", &value_columns(), &cfg(false)).unwrap();
        assert_eq!(t.file.content, include_str!("../tests/fixtures/value.rs"));
    }

    #[test]
    fn tables_named_after_library_types_import_nothing() {
        for table in ["value", "filter", "model", "model_query", "table_model"] {
            let src = generate_table(table, &value_columns(), &cfg(false))
                .unwrap()
                .file
                .content;
            assert!(!src.lines().any(|l| l.trim_start().starts_with("use ")), "{table}");
            for line in src.lines().filter(|l| l.contains("Value>") || l.contains("Filter")) {
                assert!(
                    !line.contains(" Value>") && !line.contains("<Value>") && !line.contains("> Filter"),
                    "{table}: unqualified library type in {line:?}"
                );
            }
        }
    }

    #[test]
    fn prelude_names_get_a_row_suffix() {
        for (table, expected) in [
            ("string", "StringRow"),
            ("vec", "VecRow"),
            ("option", "OptionRow"),
            ("into", "IntoRow"),
            ("into_iterator", "IntoIteratorRow"),
            ("self", "SelfRow"),
            ("value", "Value"),
        ] {
            let t = generate_table(table, &value_columns(), &cfg(false)).unwrap();
            assert_eq!(t.struct_name, expected);
            assert!(t.file.content.contains(&format!("pub struct {expected} {{")));
            assert!(t.file.content.contains(&format!("impl ::modelq::Model for {expected} {{")));
        }
    }

    #[test]
    fn generates_model_module() {
        let t = generate_table("user_info", &user_columns(), &cfg(false)).unwrap();
        assert_eq!(t.struct_name, "UserInfo");
        assert_eq!(t.module, "user_info");
        assert_eq!(t.file.path, PathBuf::from("src/models/user_info.rs"));

        let src = &t.file.content;
        assert!(src.starts_with("// @generated by modelq (modelq-cli)\n// Table: public.user_info\n"));
        assert!(src.contains(
            r#"pub static USER_INFO: ::modelq::TableModel = ::modelq::TableModel::new("public", "user_info")"#
        ));
        assert!(src.contains(r#"    .with_alias("UserInfo")"#));
        assert!(src.contains(
            r#"    .with_columns(&["id", "Name", "created_at", "updated_at", "type", "score"])"#
        ));
        assert!(src.contains(r#"    .with_primary_key("id");"#));

        assert!(src.contains("    pub id: i32,\n"));
        assert!(src.contains("    /// display name\n    pub name: String,\n"));
        assert!(src.contains("    pub created_at: chrono::NaiveDateTime,\n"));
        assert!(src.contains("    pub r#type: String,\n"));
        assert!(src.contains("    pub score: f64,\n"));

        assert!(src.contains(
            r#"const INSERTABLE: &'static [&'static str] = &["Name", "type", "score"];"#
        ));
        assert!(src.contains(
            r#"const UPDATABLE: &'static [&'static str] = &["Name", "created_at", "type", "score"];"#
        ));

        assert!(src.contains(r#""Name" => self.name = ::modelq::row::FromCell::from_cell(cell),"#));
        assert!(src.contains(r#""id" => Some(self.id.into()),"#));
        assert!(src.contains(r#""Name" => Some(self.name.clone().into()),"#));
        assert!(src.contains("self.id = id.try_into().unwrap_or_default();"));
        assert!(src.contains("pub fn filter_type<V: Into<::modelq::Value>>("));
        assert!(src.contains(r#"Filter::from_op("type", op, first, rest)"#));
    }

    #[test]
    fn touch_timestamp_keeps_stamped_columns() {
        let t = generate_table("user_info", &user_columns(), &cfg(true)).unwrap();
        let src = &t.file.content;
        assert!(src.contains(
            r#"const INSERTABLE: &'static [&'static str] = &["Name", "created_at", "updated_at", "type", "score"];"#
        ));
        assert!(src.contains(
            r#"const UPDATABLE: &'static [&'static str] = &["Name", "created_at", "updated_at", "type", "score"];"#
        ));
    }

    #[test]
    fn tables_without_single_key() {
        let mut a = column("a", "integer");
        a.key = KeyKind::Primary;
        let mut b = column("b", "integer");
        b.key = KeyKind::Primary;

        let t = generate_table("pair", &[a, b], &cfg(false)).unwrap();
        let src = &t.file.content;
        assert!(!src.contains("with_primary_key"));
        assert!(!src.contains("set_insert_id"));
        assert!(src.contains(r#"const UPDATABLE: &'static [&'static str] = &["a", "b"];"#));

        assert!(generate_table("empty", &[], &cfg(false)).is_err());
        assert!(generate_table("dup", &[column("a_b", "text"), column("A_B", "text")], &cfg(false)).is_err());
    }

    #[test]
    fn mod_rs_lists_tables_sorted() {
        let c = cfg(false);
        let tables = vec![
            generate_table("user_info", &user_columns(), &c).unwrap(),
            generate_table("type", &[column("id", "bigint")], &c).unwrap(),
        ];
        let m = generate_mod_rs(&tables, &c).unwrap();
        assert_eq!(m.path, PathBuf::from("src/models/mod.rs"));
        assert_eq!(
            m.content,
            "// @generated by modelq (modelq-cli)\n// Module: models\n\n\
             pub mod r#type;\npub mod user_info;\n\n\
             pub use r#type::Type;\npub use user_info::UserInfo;\n"
        );
        assert_eq!(tables[1].file.path, PathBuf::from("src/models/type.rs"));
    }
}
