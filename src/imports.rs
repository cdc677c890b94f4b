//! Import liveness.
//!
//! Imports are recorded as they are met and pruned once transforms have
//! settled: an import survives only when some surviving type names it as a
//! qualifier (`pkg.Name`, `*pkg.Name`).
use std::collections::BTreeMap;

use crate::ir::{Import, Type, TypeNode};

#[derive(Debug, Default)]
pub struct ImportTracker {
    imports: BTreeMap<String, Import>,
}

impl ImportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `import` under its local name; a later import with the same
    /// local name replaces it.
    pub fn record(&mut self, import: Import) {
        let key = import.local_name().to_string();
        if let Some(previous) = self.imports.insert(key, import) {
            log::debug!("import {:?} replaced by a later import with the same name", previous.path);
        }
    }

    /// Marks every import referenced by a type in `code`.
    pub fn mark_used(&mut self, code: &[Type]) {
        for ty in code {
            match ty {
                Type::Struct(st) => {
                    for field in &st.fields {
                        self.mark_names(field.type_names());
                    }
                }
                other => self.mark_names(other.type_names()),
            }
        }
    }

    fn mark_names<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            let Some(key) = qualifier(name) else { continue };
            if let Some(import) = self.imports.get_mut(key) {
                import.used = true;
            }
        }
    }

    /// Drops unused imports and hands back the rest.
    pub fn into_live(mut self) -> BTreeMap<String, Import> {
        self.imports.retain(|key, import| {
            if !import.used {
                log::debug!("pruning unused import {key} ({})", import.path);
            }
            import.used
        });
        self.imports
    }
}

/// Package qualifier of a printable type name: the text before the first `.`
/// with one leading `*` removed.
pub fn qualifier(type_name: &str) -> Option<&str> {
    let (prefix, _) = type_name.split_once('.')?;
    Some(prefix.strip_prefix('*').unwrap_or(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, MapType, StructType};

    #[test]
    fn qualifier_strips_one_star() {
        assert_eq!(qualifier("z.T"), Some("z"));
        assert_eq!(qualifier("*z.T"), Some("z"));
        assert_eq!(qualifier("**z.T"), Some("*z"));
        assert_eq!(qualifier("int"), None);
        assert_eq!(qualifier("[]z.T"), Some("[]z"));
    }

    #[test]
    fn keeps_only_referenced_imports() {
        let mut tracker = ImportTracker::new();
        tracker.record(Import::new("x/y/z"));
        tracker.record(Import::new("u/v"));
        tracker.record(Import::new("time"));
        let code = vec![
            Type::Struct(StructType {
                name: "A".into(),
                fields: vec![Field::new(Type::plain("F", "*z.T"))],
                docs: String::new(),
            }),
            Type::Map(MapType {
                name: "M".into(),
                key_type: "string".into(),
                value_type: "time.Time".into(),
                docs: String::new(),
            }),
        ];
        tracker.mark_used(&code);
        let live = tracker.into_live();
        assert_eq!(live.keys().collect::<Vec<_>>(), ["time", "z"]);
        assert!(live.values().all(|imp| imp.used));
    }

    #[test]
    fn duplicate_local_names_last_write_wins() {
        let mut tracker = ImportTracker::new();
        tracker.record(Import::new("a/log"));
        tracker.record(Import::new("b/log"));
        tracker.mark_used(&[Type::plain("L", "log.Logger")]);
        let live = tracker.into_live();
        assert_eq!(live["log"].path, "b/log");
    }
}
