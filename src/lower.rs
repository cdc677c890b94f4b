//! Syntax tree → typed IR.
//!
//! Lifting is best effort: expression kinds with no IR counterpart are logged
//! and produce `None`, and the caller drops the enclosing field or declaration.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{self, CommentGroup, Expr};
use crate::ir::{ArrayType, Field, Import, MapType, PlainType, StructType, Type};

/// One `key:"value"` piece of a struct tag.
static TAG_PIECE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<key>[^:"]+):"(?P<value>[^"]*)"$"#).expect("tag piece regex is valid")
});

pub fn lift_expr(names: &[String], docs: &str, expr: &Expr) -> Option<Type> {
    let name = names.first().cloned().unwrap_or_default();
    let docs = docs.to_string();
    let ty = match expr {
        Expr::Ident { name: ident } => Type::Plain(PlainType { name, ty: ident.clone(), docs }),
        Expr::Selector { .. } => Type::Plain(PlainType { name, ty: render_expr(expr), docs }),
        Expr::Star { x } => {
            Type::Plain(PlainType { name, ty: format!("*{}", render_expr(x)), docs })
        }
        Expr::Array { elt, .. } => Type::Array(ArrayType { name, ty: render_expr(elt), docs }),
        Expr::Map { key, value } => Type::Map(MapType {
            name,
            key_type: render_expr(key),
            value_type: render_expr(value),
            docs,
        }),
        Expr::Struct { fields } => Type::Struct(StructType {
            name,
            fields: fields.iter().filter_map(lift_field).collect(),
            docs,
        }),
        Expr::Interface { .. } => Type::Plain(PlainType { name, ty: "interface{}".into(), docs }),
        other => {
            log::warn!("lift_expr: unhandled type {} for {:?}", other.kind_name(), names);
            return None;
        }
    };
    Some(ty)
}

/// Printable form of a type expression, used for component types.
pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Ident { name } => name.clone(),
        Expr::Selector { x, sel } => format!("{}.{}", render_expr(x), sel),
        Expr::Star { x } => format!("*{}", render_expr(x)),
        Expr::Array { elt, .. } => format!("[]{}", render_expr(elt)),
        Expr::Map { key, value } => format!("map[{}]{}", render_expr(key), render_expr(value)),
        Expr::Interface { .. } => "interface{}".into(),
        Expr::Struct { .. } => "struct{}".into(),
        Expr::Func { .. } => "func()".into(),
        other => {
            log::warn!("render_expr: unhandled type {} for {:?}", other.kind_name(), other);
            String::new()
        }
    }
}

/// Lifts one field spec into a single field named after its first declared
/// name (`A, B int` yields `A` only; an embedded field is unnamed). `None`
/// when the type cannot be lifted.
pub fn lift_field(spec: &ast::Field) -> Option<Field> {
    let docs = docs_from_comment_group(spec.doc.as_ref());
    let ty = lift_expr(&spec.names, &docs, &spec.ty)?;
    let tags = spec.tag.as_deref().map(parse_tag).unwrap_or_default();
    Some(Field { ty, tags })
}

/// Parses a raw tag literal such as `` `json:"f,omitempty" db:"f"` ``.
///
/// Pieces that are not `key:"value"` are skipped with a warning.
pub fn parse_tag(raw: &str) -> IndexMap<String, Vec<String>> {
    let mut tags = IndexMap::new();
    let stripped = raw.replace('`', "");
    for piece in stripped.split(' ').filter(|p| !p.is_empty()) {
        let Some(caps) = TAG_PIECE.captures(piece) else {
            log::warn!("parse_tag: skipping malformed tag piece {piece:?} in {raw:?}");
            continue;
        };
        let values = caps["value"].split(',').map(str::to_string).collect();
        tags.insert(caps["key"].to_string(), values);
    }
    tags
}

/// Comment lines trimmed and joined by newlines, newline terminated.
pub fn docs_from_comment_group(group: Option<&CommentGroup>) -> String {
    let Some(group) = group else { return String::new() };
    if group.list.is_empty() {
        return String::new();
    }
    let lines: Vec<&str> = group.list.iter().map(|c| c.trim()).collect();
    let mut docs = lines.join("\n");
    docs.push('\n');
    docs
}

pub fn import_from_spec(spec: &ast::ImportSpec) -> Import {
    Import {
        path: spec.path.replace('"', ""),
        name: spec.name.clone(),
        used: false,
    }
}

// ------------------------------- Tests ------------------------------------ //
