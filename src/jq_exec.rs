//! jq pre-processing of input documents (via jaq).
use anyhow::{anyhow, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

type Program<'a> = load::File<&'a str, ()>;

/// Runs `filter_src` over `input`; every output becomes one document.
pub fn select_documents(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(|errs| filter_error("parse error", parse_problems(errs)))?;
    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| filter_error("undefined", undefined_problems(errs)))?;

    let inputs = RcIter::new(core::iter::empty());
    filter
        .run((Ctx::new([], &inputs), Val::from(input.clone())))
        .map(|item| {
            let val = item.map_err(|e| anyhow!("jq runtime error: {e:?}"))?;
            // Val displays as JSON text
            Ok(serde_json::from_str::<Value>(&val.to_string())?)
        })
        .collect()
}

fn parse_problems(errs: Vec<(Program<'_>, load::Error<&str>)>) -> Vec<String> {
    errs.into_iter()
        .map(|(file, err)| format!("{err:?} in `{}`", file.code))
        .collect()
}

fn undefined_problems(errs: Vec<(Program<'_>, Vec<(&str, Undefined)>)>) -> Vec<String> {
    errs.into_iter()
        .flat_map(|(file, list)| {
            list.into_iter()
                .map(move |(name, undef)| format!("`{name}` ({undef:?}) in `{}`", file.code))
        })
        .collect()
}

fn filter_error(stage: &str, problems: Vec<String>) -> anyhow::Error {
    anyhow!("{stage}: {}", problems.join("; "))
}
