//! Declarative transform pipelines.
//!
//! A pipeline is plain data (JSON) and can be built into a fresh list of
//! [`Transform`]s as often as needed, one list per lifted file.
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::ir::{Field, Import, Named, Type, TypeNode};
use crate::transform::{Matcher, Transform};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Package name used when none is given on the command line.
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformSpec {
    ExcludeImport {
        matching: MatchSpec,
    },
    ExcludeType {
        matching: MatchSpec,
    },
    ExcludeField {
        matching: MatchSpec,
    },
    /// Rewrite `from` to `to` wherever it names a whole component type.
    Retype {
        from: String,
        to: String,
    },
    SetTag {
        #[serde(default)]
        matching: MatchSpec,
        key: String,
        values: Vec<String>,
    },
    /// Tag every field with its own name under `key`.
    TagWithName {
        key: String,
    },
    CopyIntoStruct {
        from: Vec<String>,
        into: String,
        replace: String,
    },
}

/// Every criterion given must hold; an empty spec matches everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchSpec {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source, &path.to_string_lossy())
    }

    /// Parses and validates a pipeline; `origin` labels errors.
    pub fn from_json(source: &str, origin: &str) -> Result<Self> {
        let config: Self =
            crate::path_de::from_str_with_path(source).map_err(|message| Error::Decode {
                what: "pipeline config",
                origin: origin.to_string(),
                message,
            })?;
        config.build()?;
        Ok(config)
    }

    /// Builds a fresh transform list.
    pub fn build(&self) -> Result<Vec<Transform>> {
        self.transforms.iter().map(TransformSpec::build).collect()
    }
}

impl TransformSpec {
    pub fn build(&self) -> Result<Transform> {
        let transform = match self {
            TransformSpec::ExcludeImport { matching } => {
                Transform::exclude_import(matching.import_matcher()?)
            }
            TransformSpec::ExcludeType { matching } => Transform::exclude_type(matching.matcher()?),
            TransformSpec::ExcludeField { matching } => {
                Transform::exclude_field(matching.matcher()?)
            }
            TransformSpec::Retype { from, to } => {
                let (from, to) = (from.clone(), to.clone());
                Transform::modify_type(move |ty| retype(ty, &from, &to))
            }
            TransformSpec::SetTag { matching, key, values } => {
                let matcher: Matcher<Field> = matching.matcher()?;
                let (key, values) = (key.clone(), values.clone());
                Transform::modify_field(move |field| {
                    if matcher.matches(&field) {
                        field.with_tag(key.clone(), values.iter().cloned())
                    } else {
                        field
                    }
                })
            }
            TransformSpec::TagWithName { key } => {
                let key = key.clone();
                Transform::add_field(move |_, field| {
                    let name = field.name().to_string();
                    let key = key.clone();
                    Some(Transform::modify_field(move |f| {
                        if f.name() == name {
                            f.with_tag(key.clone(), [name.clone()])
                        } else {
                            f
                        }
                    }))
                })
            }
            TransformSpec::CopyIntoStruct { from, into, replace } => {
                Transform::copy_into_struct(from.iter().cloned(), into, replace)
            }
        };
        Ok(transform)
    }
}

impl MatchSpec {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.pattern.is_none() && self.references.is_empty()
    }

    /// Matcher over types or fields; `references` checks `type_names()`.
    pub fn matcher<T: TypeNode + 'static>(&self) -> Result<Matcher<T>> {
        let mut matcher = self.by_name()?;
        if !self.references.is_empty() {
            matcher = matcher.and(Matcher::referencing(self.references.iter().cloned()));
        }
        Ok(matcher)
    }

    /// Matcher over imports; `references` checks the import path.
    pub fn import_matcher(&self) -> Result<Matcher<Import>> {
        let mut matcher = self.by_name()?;
        if !self.references.is_empty() {
            let paths = self.references.clone();
            matcher = matcher.and(Matcher::new(move |imp: &Import| paths.contains(&imp.path)));
        }
        Ok(matcher)
    }

    fn by_name<T: Named + 'static>(&self) -> Result<Matcher<T>> {
        let mut matcher = Matcher::any();
        if !self.names.is_empty() {
            matcher = matcher.and(Matcher::named(self.names.iter().cloned()));
        }
        if let Some(pattern) = &self.pattern {
            matcher = matcher.and(Matcher::name_pattern(compile(pattern)?));
        }
        Ok(matcher)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::Pattern { pattern: pattern.to_string(), source })
}

fn retype(ty: Type, from: &str, to: &str) -> Type {
    let swap = |s: &mut String| {
        if s.as_str() == from {
            *s = to.to_string();
        } else if s.strip_prefix('*') == Some(from) {
            *s = format!("*{to}");
        }
    };
    match ty {
        Type::Plain(mut t) => {
            swap(&mut t.ty);
            Type::Plain(t)
        }
        Type::Array(mut t) => {
            swap(&mut t.ty);
            Type::Array(t)
        }
        Type::Map(mut t) => {
            swap(&mut t.key_type);
            swap(&mut t.value_type);
            Type::Map(t)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Field as AstField, ImportSpec, SourceFile};
    use crate::ir::File;

    const PIPELINE: &str = r#"{
        "package": "model",
        "transforms": [
            { "kind": "exclude_import", "matching": { "references": ["fmt"] } },
            { "kind": "exclude_type", "matching": { "pattern": "^internal" } },
            { "kind": "exclude_field", "matching": { "references": ["interface{}"] } },
            { "kind": "retype", "from": "time.Time", "to": "string" },
            { "kind": "set_tag", "matching": { "names": ["ID"] }, "key": "db", "values": ["id", "pk"] }
        ]
    }"#;

    #[test]
    fn pipeline_builds_and_applies() {
        let config = PipelineConfig::from_json(PIPELINE, "inline").unwrap();
        assert_eq!(config.package.as_deref(), Some("model"));
        assert_eq!(config.transforms.len(), 5);

        let src = SourceFile::new("p")
            .with_import(ImportSpec::new("fmt"))
            .with_import(ImportSpec::new("time"))
            .with_type("internalCache", Expr::ident("int"))
            .with_type(
                "User",
                Expr::structure(vec![
                    AstField::new("ID", Expr::ident("int")),
                    AstField::new("Seen", Expr::star(Expr::selector("time", "Time"))),
                    AstField::new("Stamp", Expr::selector("time", "Time")),
                ]),
            );
        let file = File::from_ast(&src, "", config.build().unwrap());
        assert_eq!(file.code.len(), 1);
        let user = file.code[0].as_struct().unwrap();
        assert_eq!(user.fields[0].tags["db"], ["id", "pk"]);
        assert!(user.fields[1].tags.is_empty());
        assert_eq!(user.fields[1].type_names().into_iter().collect::<Vec<_>>(), ["*string"]);
        assert_eq!(user.fields[2].type_names().into_iter().collect::<Vec<_>>(), ["string"]);
        // retyping removed the only reference to `time`
        assert!(file.imports.is_empty());
    }

    #[test]
    fn tag_with_name_tags_each_field_with_its_own_name() {
        let config = PipelineConfig::from_json(
            r#"{ "transforms": [ { "kind": "tag_with_name", "key": "db" } ] }"#,
            "inline",
        )
        .unwrap();
        let src = SourceFile::new("p").with_type(
            "A",
            Expr::structure(vec![AstField::new("ID", Expr::ident("int")), AstField::new("Name", Expr::ident("string"))]),
        );
        let file = File::from_ast(&src, "", config.build().unwrap());
        let fields = &file.code[0].as_struct().unwrap().fields;
        assert_eq!(fields[0].tags["db"], ["ID"]);
        assert_eq!(fields[1].tags["db"], ["Name"]);
    }

    #[test]
    fn copy_into_struct_from_config() {
        let config = PipelineConfig::from_json(
            r#"{ "transforms": [ { "kind": "copy_into_struct", "from": ["Src"], "into": "Dst", "replace": "Slot" } ] }"#,
            "inline",
        )
        .unwrap();
        let src = SourceFile::new("p")
            .with_type("Src", Expr::structure(vec![AstField::new("X", Expr::ident("int"))]))
            .with_type(
                "Dst",
                Expr::structure(vec![AstField::new("Slot", Expr::ident("Src")), AstField::new("After", Expr::ident("bool"))]),
            );
        let file = File::from_ast(&src, "", config.build().unwrap());
        let names: Vec<&str> = file.code[0].as_struct().unwrap().fields.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["X", "After"]);
    }

    #[test]
    fn empty_match_spec_matches_everything() {
        let spec = MatchSpec::default();
        assert!(spec.is_empty());
        assert!(spec.matcher::<Type>().unwrap().matches(&Type::plain("Anything", "int")));
    }

    #[test]
    fn rejects_bad_patterns_and_unknown_fields() {
        let bad_pattern = r#"{ "transforms": [ { "kind": "exclude_type", "matching": { "pattern": "(" } } ] }"#;
        assert!(matches!(PipelineConfig::from_json(bad_pattern, "inline"), Err(Error::Pattern { .. })));

        let unknown = r#"{ "transforms": [], "extra": true }"#;
        assert!(matches!(PipelineConfig::from_json(unknown, "inline"), Err(Error::Decode { .. })));
    }
}
