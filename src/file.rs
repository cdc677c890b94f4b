//! File assembly: walks a parsed source file and produces its typed IR.
use crate::ast::{self, Decl, Spec};
use crate::engine::Engine;
use crate::imports::ImportTracker;
use crate::ir::File;
use crate::lower::{docs_from_comment_group, import_from_spec, lift_expr};
use crate::transform::Transform;

impl File {
    /// Lifts `source` into a `File`, applying `transforms` along the way.
    ///
    /// `package` overrides the package clause unless it is empty. Transforms
    /// are moved in: copy accumulators belong to this call alone.
    pub fn from_ast(
        source: &ast::SourceFile,
        package: &str,
        transforms: impl IntoIterator<Item = Transform>,
    ) -> File {
        let package = if package.is_empty() { source.package.clone() } else { package.to_string() };

        let mut engine = Engine::new(transforms);
        let mut imports = ImportTracker::new();
        let mut code = Vec::new();

        for decl in &source.decls {
            let Decl::Gen(gen_decl) = decl else { continue };
            let decl_docs = docs_from_comment_group(gen_decl.doc.as_ref());
            for spec in &gen_decl.specs {
                match spec {
                    Spec::Import(import_spec) => {
                        let import = import_from_spec(import_spec);
                        if engine.admits_import(&import) {
                            imports.record(import);
                        } else {
                            log::debug!("exclude_import: skipping {}", import.path);
                        }
                    }
                    Spec::Type(type_spec) => {
                        let names = std::slice::from_ref(&type_spec.name);
                        if let Some(ty) = lift_expr(names, &decl_docs, &type_spec.ty) {
                            code.push(ty);
                            engine.run(&mut code);
                        }
                    }
                    Spec::Value(_) => {}
                }
            }
        }

        engine.inline_copies(&mut code);

        imports.mark_used(&code);
        File { package, imports: imports.into_live(), code }
    }
}
