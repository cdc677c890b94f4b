// Typed IR handed to code generators. No syntax tree nodes here.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::Serialize;

/// Anything a matcher can select by name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Capability shared by every TIR type node (and fields, which wrap one).
pub trait TypeNode: Named {
    /// Printable type identifiers textually referenced by this node.
    fn type_names(&self) -> BTreeSet<&str>;
    fn docs(&self) -> &str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlainType {
    pub name: String,
    /// `int`, `pkg.Name`, `*pkg.Name`, `interface{}`
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub docs: String,
}

/// Slice-like; the length of fixed arrays is not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArrayType {
    pub name: String,
    /// element type
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub docs: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapType {
    pub name: String,
    pub key_type: String,
    pub value_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub docs: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub docs: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Plain(PlainType),
    Array(ArrayType),
    Map(MapType),
    Struct(StructType),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Carries the field's name and docs.
    #[serde(rename = "type")]
    pub ty: Type,
    /// tag key → comma-separated tokens, in source order
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub tags: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip)]
    pub used: bool,
}

/// Lifted source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    pub package: String,
    /// keyed by local name; only imports referenced by `code` survive
    pub imports: BTreeMap<String, Import>,
    pub code: Vec<Type>,
}

// -------------------------------- Types ----------------------------------- //

impl PlainType {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { name: name.into(), ty: ty.into(), docs: String::new() }
    }
}

impl Default for Type {
    fn default() -> Self {
        Type::Plain(PlainType::default())
    }
}

impl Type {
    pub fn plain(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Type::Plain(PlainType::new(name, ty))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Type::Plain(_) => "plain",
            Type::Array(_) => "array",
            Type::Map(_) => "map",
            Type::Struct(_) => "struct",
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        match self {
            Type::Plain(t) => t.name = name,
            Type::Array(t) => t.name = name,
            Type::Map(t) => t.name = name,
            Type::Struct(t) => t.name = name,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Type::Struct(st) => Some(st),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructType> {
        match self {
            Type::Struct(st) => Some(st),
            _ => None,
        }
    }
}

impl Named for PlainType {
    fn name(&self) -> &str {
        &self.name
    }
}
impl TypeNode for PlainType {
    fn type_names(&self) -> BTreeSet<&str> {
        BTreeSet::from([self.ty.as_str()])
    }
    fn docs(&self) -> &str {
        &self.docs
    }
}

impl Named for ArrayType {
    fn name(&self) -> &str {
        &self.name
    }
}
impl TypeNode for ArrayType {
    fn type_names(&self) -> BTreeSet<&str> {
        BTreeSet::from([self.ty.as_str()])
    }
    fn docs(&self) -> &str {
        &self.docs
    }
}

impl Named for MapType {
    fn name(&self) -> &str {
        &self.name
    }
}
impl TypeNode for MapType {
    fn type_names(&self) -> BTreeSet<&str> {
        BTreeSet::from([self.key_type.as_str(), self.value_type.as_str()])
    }
    fn docs(&self) -> &str {
        &self.docs
    }
}

impl Named for StructType {
    fn name(&self) -> &str {
        &self.name
    }
}
impl TypeNode for StructType {
    fn type_names(&self) -> BTreeSet<&str> {
        self.fields.iter().flat_map(|f| f.type_names()).collect()
    }
    fn docs(&self) -> &str {
        &self.docs
    }
}

impl Named for Type {
    fn name(&self) -> &str {
        match self {
            Type::Plain(t) => t.name(),
            Type::Array(t) => t.name(),
            Type::Map(t) => t.name(),
            Type::Struct(t) => t.name(),
        }
    }
}

impl TypeNode for Type {
    fn type_names(&self) -> BTreeSet<&str> {
        match self {
            Type::Plain(t) => t.type_names(),
            Type::Array(t) => t.type_names(),
            Type::Map(t) => t.type_names(),
            Type::Struct(t) => t.type_names(),
        }
    }
    fn docs(&self) -> &str {
        match self {
            Type::Plain(t) => t.docs(),
            Type::Array(t) => t.docs(),
            Type::Map(t) => t.docs(),
            Type::Struct(t) => t.docs(),
        }
    }
}

// -------------------------------- Fields ---------------------------------- //

impl Field {
    pub fn new(ty: Type) -> Self {
        Self { ty, tags: IndexMap::new() }
    }

    pub fn with_tag<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }
}

impl Named for Field {
    fn name(&self) -> &str {
        self.ty.name()
    }
}
impl TypeNode for Field {
    fn type_names(&self) -> BTreeSet<&str> {
        self.ty.type_names()
    }
    fn docs(&self) -> &str {
        self.ty.docs()
    }
}

// ------------------------------- Imports ---------------------------------- //

impl Import {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), name: None, used: false }
    }

    /// Identifier the import is addressed by in source: the alias when one is
    /// given, else the last path segment.
    pub fn local_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => match self.path.rfind('/') {
                Some(slash) => &self.path[slash + 1..],
                None => &self.path,
            },
        }
    }
}

impl Named for Import {
    fn name(&self) -> &str {
        self.local_name()
    }
}

// ------------------------------- Tests ------------------------------------ //
