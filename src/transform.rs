//! Transform descriptors and the matchers they select with.
use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;

use crate::ir::{Field, Import, Named, StructType, Type, TypeNode};

// ————————————————————————————————————————————————————————————————————————————
// MATCHERS
// ————————————————————————————————————————————————————————————————————————————

/// Predicate deciding which entities a transform targets.
pub struct Matcher<T: ?Sized> {
    pred: Box<dyn Fn(&T) -> bool>,
}

impl<T: ?Sized + 'static> Matcher<T> {
    pub fn new(pred: impl Fn(&T) -> bool + 'static) -> Self {
        Self { pred: Box::new(pred) }
    }

    pub fn any() -> Self {
        Self::new(|_| true)
    }

    pub fn matches(&self, subject: &T) -> bool {
        (self.pred)(subject)
    }

    pub fn and(self, other: Self) -> Self {
        Self::new(move |t| self.matches(t) && other.matches(t))
    }

    pub fn or(self, other: Self) -> Self {
        Self::new(move |t| self.matches(t) || other.matches(t))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::new(move |t| !self.matches(t))
    }
}

impl<T: Named + ?Sized + 'static> Matcher<T> {
    /// Exact match on any of `names`.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        Self::new(move |t| names.contains(t.name()))
    }

    pub fn name_pattern(pattern: Regex) -> Self {
        Self::new(move |t| pattern.is_match(t.name()))
    }
}

impl<T: TypeNode + ?Sized + 'static> Matcher<T> {
    /// Matches nodes whose `type_names()` include one of `type_names`.
    pub fn referencing<I, S>(type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let wanted: BTreeSet<String> = type_names.into_iter().map(Into::into).collect();
        Self::new(move |t| t.type_names().iter().any(|n| wanted.contains(*n)))
    }
}

impl Matcher<Import> {
    pub fn path_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::new(move |imp| imp.path.starts_with(&prefix))
    }
}

impl<T: ?Sized> fmt::Debug for Matcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Matcher(..)")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TRANSFORMS
// ————————————————————————————————————————————————————————————————————————————

/// Drops matching imports while they are ingested.
#[derive(Debug)]
pub struct ExcludeImport {
    pub matcher: Matcher<Import>,
}

/// Drops a matching top-level type; for a struct that survives, drops the
/// fields whose type matches.
#[derive(Debug)]
pub struct ExcludeType {
    pub matcher: Matcher<Type>,
}

#[derive(Debug)]
pub struct ExcludeField {
    pub matcher: Matcher<Field>,
}

/// Rewrites the type just lifted; structs have each field's type rewritten.
pub struct ModifyType {
    apply: Box<dyn Fn(Type) -> Type>,
}

/// Rewrites every field of the struct just lifted.
pub struct ModifyField {
    apply: Box<dyn Fn(Field) -> Field>,
}

/// Generator: called once per field of the struct just lifted; every
/// transform it returns is applied to that struct and then kept for the
/// declarations that follow.
pub struct AddField {
    generate: Box<dyn Fn(&StructType, &Field) -> Option<Transform>>,
}

/// Inlines the fields of the `from_structs` structs into `struct_name`, in
/// place of its `field_to_replace` field. Source structs are removed from the
/// output as they are met; splicing happens once every declaration is lifted.
#[derive(Debug, Clone, Default)]
pub struct CopyIntoStruct {
    pub from_structs: BTreeSet<String>,
    pub struct_name: String,
    pub field_to_replace: String,
    pub(crate) with: Vec<Field>,
}

#[derive(Debug)]
pub enum Transform {
    ExcludeImport(ExcludeImport),
    ExcludeType(ExcludeType),
    ExcludeField(ExcludeField),
    ModifyType(ModifyType),
    ModifyField(ModifyField),
    AddField(AddField),
    CopyIntoStruct(CopyIntoStruct),
}

impl ModifyType {
    pub fn new(apply: impl Fn(Type) -> Type + 'static) -> Self {
        Self { apply: Box::new(apply) }
    }
    pub fn apply(&self, ty: Type) -> Type {
        (self.apply)(ty)
    }
}

impl ModifyField {
    pub fn new(apply: impl Fn(Field) -> Field + 'static) -> Self {
        Self { apply: Box::new(apply) }
    }
    pub fn apply(&self, field: Field) -> Field {
        (self.apply)(field)
    }
}

impl AddField {
    pub fn new(generate: impl Fn(&StructType, &Field) -> Option<Transform> + 'static) -> Self {
        Self { generate: Box::new(generate) }
    }
    pub fn generate(&self, st: &StructType, field: &Field) -> Option<Transform> {
        (self.generate)(st, field)
    }
}

impl CopyIntoStruct {
    pub fn new<I, S>(
        from_structs: I,
        struct_name: impl Into<String>,
        field_to_replace: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            from_structs: from_structs.into_iter().map(Into::into).collect(),
            struct_name: struct_name.into(),
            field_to_replace: field_to_replace.into(),
            with: Vec::new(),
        }
    }

    /// Fields collected from source structs so far.
    pub fn collected(&self) -> &[Field] {
        &self.with
    }
}

impl fmt::Debug for ModifyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModifyType(..)")
    }
}

impl fmt::Debug for ModifyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModifyField(..)")
    }
}

impl fmt::Debug for AddField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AddField(..)")
    }
}

impl Transform {
    pub fn exclude_import(matcher: Matcher<Import>) -> Self {
        Transform::ExcludeImport(ExcludeImport { matcher })
    }
    pub fn exclude_type(matcher: Matcher<Type>) -> Self {
        Transform::ExcludeType(ExcludeType { matcher })
    }
    pub fn exclude_field(matcher: Matcher<Field>) -> Self {
        Transform::ExcludeField(ExcludeField { matcher })
    }
    pub fn modify_type(apply: impl Fn(Type) -> Type + 'static) -> Self {
        Transform::ModifyType(ModifyType::new(apply))
    }
    pub fn modify_field(apply: impl Fn(Field) -> Field + 'static) -> Self {
        Transform::ModifyField(ModifyField::new(apply))
    }
    pub fn add_field(
        generate: impl Fn(&StructType, &Field) -> Option<Transform> + 'static,
    ) -> Self {
        Transform::AddField(AddField::new(generate))
    }
    pub fn copy_into_struct<I, S>(
        from_structs: I,
        struct_name: &str,
        field_to_replace: &str,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Transform::CopyIntoStruct(CopyIntoStruct::new(from_structs, struct_name, field_to_replace))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Transform::ExcludeImport(_) => "exclude_import",
            Transform::ExcludeType(_) => "exclude_type",
            Transform::ExcludeField(_) => "exclude_field",
            Transform::ModifyType(_) => "modify_type",
            Transform::ModifyField(_) => "modify_field",
            Transform::AddField(_) => "add_field",
            Transform::CopyIntoStruct(_) => "copy_into_struct",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ArrayType;

    #[test]
    fn named_and_pattern_matchers() {
        let named = Matcher::<Type>::named(["A", "B"]);
        assert!(named.matches(&Type::plain("A", "int")));
        assert!(!named.matches(&Type::plain("C", "int")));

        let internal = Matcher::<Type>::name_pattern(Regex::new("^internal").unwrap());
        assert!(internal.matches(&Type::plain("internalState", "int")));
        assert!(!internal.matches(&Type::plain("State", "int")));
    }

    #[test]
    fn referencing_looks_at_type_names() {
        let m = Matcher::<Field>::referencing(["time.Time"]);
        let arr = Field::new(Type::Array(ArrayType { name: "At".into(), ty: "time.Time".into(), ..ArrayType::default() }));
        assert!(m.matches(&arr));
        assert!(!m.matches(&Field::new(Type::plain("N", "int"))));
    }

    #[test]
    fn combinators() {
        let a = Matcher::<Type>::named(["A"]);
        let plain_int = Matcher::<Type>::referencing(["int"]);
        let both = a.and(plain_int);
        assert!(both.matches(&Type::plain("A", "int")));
        assert!(!both.matches(&Type::plain("A", "string")));

        let either = Matcher::<Type>::named(["A"]).or(Matcher::named(["B"]));
        assert!(either.matches(&Type::plain("B", "int")));

        let not_a = Matcher::<Type>::named(["A"]).not();
        assert!(!not_a.matches(&Type::plain("A", "int")));
        assert!(Matcher::<Type>::any().matches(&Type::plain("", "")));
    }

    #[test]
    fn import_matchers_use_local_name_and_path() {
        let imp = Import::new("github.com/x/fmtx");
        assert!(Matcher::<Import>::named(["fmtx"]).matches(&imp));
        assert!(Matcher::<Import>::path_prefix("github.com/").matches(&imp));
    }

    #[test]
    fn transform_kinds() {
        assert_eq!(Transform::copy_into_struct(["Src"], "Dst", "Slot").kind(), "copy_into_struct");
        assert_eq!(Transform::modify_field(|f| f).kind(), "modify_field");
    }
}
