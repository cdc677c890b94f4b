//! Transform application.
//!
//! The engine works on the tail of `code`: a type is pushed by the file
//! assembler and every transform is applied to it right away, before the next
//! spec is lifted. Structural inlining is split in two: source structs are
//! absorbed during the walk and spliced into their target afterwards.
use crate::ir::{Import, Named, Type};
use crate::transform::{CopyIntoStruct, ExcludeImport, Transform};

/// Whether later transforms still apply to the current type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    /// The type was removed from `code`.
    Stop,
}

/// Entry of the general list. Copies live in their own list so the same
/// accumulator is reachable from both passes.
#[derive(Debug)]
enum Step {
    Apply(Transform),
    Absorb(usize),
}

#[derive(Debug, Default)]
pub(crate) struct Engine {
    steps: Vec<Step>,
    copies: Vec<CopyIntoStruct>,
    excluded_imports: Vec<ExcludeImport>,
}

impl Engine {
    /// Partitions `transforms` into exclusions, copies and the general list.
    /// Copies also keep their position in the general list so that their
    /// source structs are absorbed during the walk.
    pub fn new(transforms: impl IntoIterator<Item = Transform>) -> Self {
        let mut engine = Self::default();
        for transform in transforms {
            match transform {
                Transform::CopyIntoStruct(copy) => {
                    engine.copies.push(copy);
                    engine.steps.push(Step::Absorb(engine.copies.len() - 1));
                }
                Transform::ExcludeImport(exclude) => engine.excluded_imports.push(exclude),
                other => engine.steps.push(Step::Apply(other)),
            }
        }
        engine
    }

    pub fn admits_import(&self, import: &Import) -> bool {
        !self.excluded_imports.iter().any(|ex| ex.matcher.matches(import))
    }

    /// Runs the general list over the type at the tail of `code`.
    ///
    /// Only the steps present when the call starts are run; steps appended
    /// by generators take effect from the next declaration.
    pub fn run(&mut self, code: &mut Vec<Type>) {
        let len = self.steps.len();
        for idx in 0..len {
            if self.eval_step(idx, code) == Flow::Stop {
                return;
            }
        }
    }

    fn eval_step(&mut self, idx: usize, code: &mut Vec<Type>) -> Flow {
        if matches!(self.steps[idx], Step::Apply(Transform::AddField(_))) {
            return self.generate(idx, code);
        }
        match &self.steps[idx] {
            Step::Absorb(copy) => absorb(&mut self.copies[*copy], code),
            Step::Apply(transform) => apply(transform, code),
        }
    }

    /// Calls the generator at `idx` once per field of the struct at the tail.
    ///
    /// Fields are those present before generation starts, but each call sees
    /// the struct as left by the transforms generated before it. Every
    /// generated transform is applied at once and then kept; once the struct
    /// is dropped the rest are only kept.
    fn generate(&mut self, idx: usize, code: &mut Vec<Type>) -> Flow {
        let Some(Type::Struct(st)) = code.last() else { return Flow::Continue };
        let fields = st.fields.clone();
        let mut current = st.clone();
        let mut flow = Flow::Continue;
        for field in &fields {
            let Step::Apply(Transform::AddField(add)) = &self.steps[idx] else { break };
            let Some(transform) = add.generate(&current, field) else { continue };
            if flow == Flow::Stop {
                self.keep(transform);
                continue;
            }
            flow = self.adopt(transform, code);
            if let (Flow::Continue, Some(Type::Struct(st))) = (flow, code.last()) {
                current = st.clone();
            }
        }
        flow
    }

    fn adopt(&mut self, transform: Transform, code: &mut Vec<Type>) -> Flow {
        match transform {
            Transform::CopyIntoStruct(copy) => {
                self.copies.push(copy);
                let idx = self.copies.len() - 1;
                let flow = absorb(&mut self.copies[idx], code);
                self.steps.push(Step::Absorb(idx));
                flow
            }
            Transform::AddField(add) => {
                self.steps.push(Step::Apply(Transform::AddField(add)));
                let idx = self.steps.len() - 1;
                self.generate(idx, code)
            }
            other => {
                let flow = apply(&other, code);
                self.steps.push(Step::Apply(other));
                flow
            }
        }
    }

    fn keep(&mut self, transform: Transform) {
        match transform {
            Transform::CopyIntoStruct(copy) => {
                self.copies.push(copy);
                self.steps.push(Step::Absorb(self.copies.len() - 1));
            }
            other => self.steps.push(Step::Apply(other)),
        }
    }

    /// Second pass: splice every accumulator into its target struct.
    pub fn inline_copies(self, code: &mut [Type]) {
        for copy in self.copies {
            // the last struct with the target name wins
            let Some(s_idx) = code.iter().rposition(|t| t.name() == copy.struct_name) else {
                log::debug!("copy_into_struct: no target struct {:?}", copy.struct_name);
                continue;
            };
            let Some(st) = code[s_idx].as_struct_mut() else {
                log::debug!("copy_into_struct: target {:?} is not a struct", copy.struct_name);
                continue;
            };
            let slot = st.fields.iter().position(|f| f.name() == copy.field_to_replace);
            let Some(f_idx) = slot else {
                log::debug!(
                    "copy_into_struct: no field {:?} in {:?}",
                    copy.field_to_replace, copy.struct_name
                );
                continue;
            };
            log::debug!(
                "copy_into_struct: splicing {} field(s) into {}.{}",
                copy.with.len(), copy.struct_name, copy.field_to_replace
            );
            st.fields.splice(f_idx..=f_idx, copy.with);
        }
    }
}

/// Evaluates a non-generating, non-copy transform against the tail of `code`.
fn apply(transform: &Transform, code: &mut Vec<Type>) -> Flow {
    let Some(tail) = code.last_mut() else { return Flow::Continue };
    match transform {
        Transform::ExcludeType(ex) => {
            if ex.matcher.matches(tail) {
                log::debug!("exclude_type: dropping {}", tail.name());
                code.pop();
                return Flow::Stop;
            }
            if let Some(st) = tail.as_struct_mut() {
                st.fields.retain(|field| !ex.matcher.matches(&field.ty));
            }
        }
        Transform::ExcludeField(ex) => {
            if let Some(st) = tail.as_struct_mut() {
                st.fields.retain(|field| !ex.matcher.matches(field));
            }
        }
        Transform::ModifyType(modify) => match tail {
            Type::Struct(st) => {
                for field in &mut st.fields {
                    let ty = std::mem::take(&mut field.ty);
                    field.ty = modify.apply(ty);
                }
            }
            other => {
                let ty = std::mem::take(other);
                *other = modify.apply(ty);
            }
        },
        Transform::ModifyField(modify) => {
            if let Some(st) = tail.as_struct_mut() {
                st.fields = std::mem::take(&mut st.fields)
                    .into_iter()
                    .map(|field| modify.apply(field))
                    .collect();
            }
        }
        // imports are filtered at ingestion; generators and copies never
        // reach this point
        Transform::ExcludeImport(_) | Transform::AddField(_) | Transform::CopyIntoStruct(_) => {}
    }
    Flow::Continue
}

/// First-pass side of a copy: a source struct at the tail is removed and its
/// fields collected.
fn absorb(copy: &mut CopyIntoStruct, code: &mut Vec<Type>) -> Flow {
    let Some(Type::Struct(st)) = code.last() else { return Flow::Continue };
    if !copy.from_structs.contains(&st.name) {
        return Flow::Continue;
    }
    if let Some(Type::Struct(st)) = code.pop() {
        log::debug!("copy_into_struct: absorbing {} into {}", st.name, copy.struct_name);
        copy.with.extend(st.fields);
    }
    Flow::Stop
}
