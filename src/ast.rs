//! Input syntax tree consumed by the lifter.
//!
//! The tree is produced by an external parser (usually dumped as JSON by the
//! host language's own tooling) and is only read here. It mirrors the shape of
//! a parsed source file closely enough for type declarations to be lifted:
//! package clause, general declarations (imports, types, values) and function
//! declarations, which are kept only so they can be skipped.
use serde::{Deserialize, Serialize};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A complete parsed source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Name from the package clause.
    pub package: String,
    /// Top-level declarations in source order.
    #[serde(default)]
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Decl {
    /// `import`, `type`, `const` or `var` declaration, possibly grouped.
    Gen(GenDecl),
    Func(FuncDecl),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenDecl {
    /// Leading doc comment group
    #[serde(default)]
    pub doc: Option<CommentGroup>,
    #[serde(default)]
    pub specs: Vec<Spec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "spec", rename_all = "snake_case")]
pub enum Spec {
    Import(ImportSpec),
    Type(TypeSpec),
    Value(ValueSpec),
}

/// `import [name] "path"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    #[serde(default)]
    pub name: Option<String>,
    /// Path literal exactly as written, quotes included.
    pub path: String,
}

/// `type Name Expr`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: String,
    /// Carried for completeness; lifted types take the enclosing
    /// declaration's doc.
    #[serde(default)]
    pub doc: Option<CommentGroup>,
    #[serde(rename = "type")]
    pub ty: Expr,
}

/// Constant or variable specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSpec {
    #[serde(default)]
    pub names: Vec<String>,
}

/// Struct field, interface method, or function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Declared names; empty for embedded fields.
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub doc: Option<CommentGroup>,
    #[serde(rename = "type")]
    pub ty: Expr,
    /// Raw tag literal including the surrounding back-ticks.
    #[serde(default)]
    pub tag: Option<String>,
}

/// Adjacent comment lines, markers included (`// ...`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentGroup {
    pub list: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanDir {
    Send,
    Recv,
    #[default]
    Both,
}

/// Type expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    /// `Name`
    Ident { name: String },
    /// `X.Sel`
    Selector { x: Box<Expr>, sel: String },
    /// `*X`
    Star { x: Box<Expr> },
    /// `[N]Elt` or `[]Elt`
    Array {
        #[serde(default)]
        len: Option<Box<Expr>>,
        elt: Box<Expr>,
    },
    /// `map[Key]Value`
    Map { key: Box<Expr>, value: Box<Expr> },
    Struct {
        #[serde(default)]
        fields: Vec<Field>,
    },
    Interface {
        #[serde(default)]
        methods: Vec<Field>,
    },
    Func {
        #[serde(default)]
        params: Vec<Field>,
        #[serde(default)]
        results: Vec<Field>,
    },
    Chan {
        #[serde(default)]
        dir: ChanDir,
        value: Box<Expr>,
    },
    /// `...Elt`
    Ellipsis {
        #[serde(default)]
        elt: Option<Box<Expr>>,
    },
    /// `(X)`
    Paren { x: Box<Expr> },
    /// `X[A, B]`
    Index { x: Box<Expr>, indices: Vec<Expr> },
    BasicLit { value: String },
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident { name: name.into() }
    }
    pub fn selector(x: impl Into<String>, sel: impl Into<String>) -> Self {
        Expr::Selector { x: Box::new(Expr::ident(x)), sel: sel.into() }
    }
    pub fn star(x: Expr) -> Self {
        Expr::Star { x: Box::new(x) }
    }
    pub fn slice(elt: Expr) -> Self {
        Expr::Array { len: None, elt: Box::new(elt) }
    }
    pub fn map(key: Expr, value: Expr) -> Self {
        Expr::Map { key: Box::new(key), value: Box::new(value) }
    }
    pub fn structure(fields: Vec<Field>) -> Self {
        Expr::Struct { fields }
    }
    pub fn interface() -> Self {
        Expr::Interface { methods: Vec::new() }
    }
    pub fn func() -> Self {
        Expr::Func { params: Vec::new(), results: Vec::new() }
    }

    /// Syntactic kind, as reported in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Ident { .. } => "Ident",
            Expr::Selector { .. } => "SelectorExpr",
            Expr::Star { .. } => "StarExpr",
            Expr::Array { .. } => "ArrayType",
            Expr::Map { .. } => "MapType",
            Expr::Struct { .. } => "StructType",
            Expr::Interface { .. } => "InterfaceType",
            Expr::Func { .. } => "FuncType",
            Expr::Chan { .. } => "ChanType",
            Expr::Ellipsis { .. } => "Ellipsis",
            Expr::Paren { .. } => "ParenExpr",
            Expr::Index { .. } => "IndexExpr",
            Expr::BasicLit { .. } => "BasicLit",
        }
    }
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Expr) -> Self {
        Self { names: vec![name.into()], doc: None, ty, tag: None }
    }
    /// Field declared without a name (`struct { pkg.T }`).
    pub fn embedded(ty: Expr) -> Self {
        Self { names: Vec::new(), doc: None, ty, tag: None }
    }
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }
    /// Tag contents without back-ticks; they are added here.
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(format!("`{tag}`"));
        self
    }
    pub fn with_doc(mut self, doc: CommentGroup) -> Self {
        self.doc = Some(doc);
        self
    }
}

impl CommentGroup {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { list: lines.into_iter().map(Into::into).collect() }
    }
}

impl ImportSpec {
    /// Import of `path`; the literal is quoted the way a parser reports it.
    pub fn new(path: &str) -> Self {
        Self { name: None, path: format!("\"{path}\"") }
    }
    pub fn aliased(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl TypeSpec {
    pub fn new(name: impl Into<String>, ty: Expr) -> Self {
        Self { name: name.into(), doc: None, ty }
    }
}

impl GenDecl {
    pub fn new(specs: Vec<Spec>) -> Self {
        Self { doc: None, specs }
    }
    pub fn with_doc(mut self, doc: CommentGroup) -> Self {
        self.doc = Some(doc);
        self
    }
}

impl SourceFile {
    pub fn new(package: impl Into<String>) -> Self {
        Self { package: package.into(), decls: Vec::new() }
    }

    pub fn with_decl(mut self, decl: Decl) -> Self {
        self.decls.push(decl);
        self
    }

    /// Appends a single-spec `import "path"` declaration.
    pub fn with_import(self, spec: ImportSpec) -> Self {
        self.with_decl(Decl::Gen(GenDecl::new(vec![Spec::Import(spec)])))
    }

    /// Appends a single-spec `type name expr` declaration.
    pub fn with_type(self, name: &str, ty: Expr) -> Self {
        self.with_decl(Decl::Gen(GenDecl::new(vec![Spec::Type(TypeSpec::new(name, ty))])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_json_shape() {
        let src = r#"{
            "package": "p",
            "decls": [
                { "decl": "gen", "specs": [ { "spec": "import", "path": "\"x/y/z\"" } ] },
                { "decl": "gen", "doc": ["// A is a thing."], "specs": [
                    { "spec": "type", "name": "A", "type": { "expr": "struct", "fields": [
                        { "names": ["F"], "type": { "expr": "selector", "x": { "expr": "ident", "name": "z" }, "sel": "T" },
                          "tag": "`json:\"f\"`" }
                    ] } }
                ] },
                { "decl": "func", "name": "main" }
            ]
        }"#;
        let file: SourceFile = serde_json::from_str(src).unwrap();
        let expected = SourceFile::new("p")
            .with_import(ImportSpec::new("x/y/z"))
            .with_decl(Decl::Gen(
                GenDecl::new(vec![Spec::Type(TypeSpec::new(
                    "A",
                    Expr::structure(vec![Field::new("F", Expr::selector("z", "T")).with_tag("json:\"f\"")]),
                ))])
                .with_doc(CommentGroup::new(["// A is a thing."])),
            ))
            .with_decl(Decl::Func(FuncDecl { name: "main".into() }));
        assert_eq!(file, expected);
    }

    #[test]
    fn kind_names_cover_unhandled_forms() {
        let chan = Expr::Chan { dir: ChanDir::Recv, value: Box::new(Expr::ident("int")) };
        assert_eq!(chan.kind_name(), "ChanType");
        assert_eq!(Expr::func().kind_name(), "FuncType");
    }
}
