use anyhow::{anyhow, Context, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Run a jq filter over one document, returning every output as JSON.
pub fn apply_filter(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(|errs: Vec<(load::File<&str, ()>, load::Error<&str>)>| {
            rejected(filter_src, "parse", errs.into_iter().map(|(_, err)| format!("{err:?}")))
        })?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>| {
            let names = errs.into_iter()
                .flat_map(|(_, list)| list)
                .map(|(name, undef)| format!("`{name}` ({undef:?})"));
            rejected(filter_src, "undefined", names)
        })?;

    let inputs = RcIter::new(core::iter::empty());
    let mut it = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    while let Some(item) = it.next() {
        let val = item.map_err(|e| anyhow!("jq filter `{filter_src}` failed: {e:?}"))?;
        // Val's Display is JSON text
        let json = serde_json::from_str::<Value>(&val.to_string())
            .with_context(|| format!("jq filter `{filter_src}` produced non-JSON output"))?;
        out.push(json);
    }
    Ok(out)
}

/// One error for every problem found while loading or compiling a filter.
fn rejected(filter_src: &str, kind: &str, problems: impl Iterator<Item = String>) -> anyhow::Error {
    let problems = problems.collect::<Vec<_>>();
    anyhow!(
        "jq filter `{filter_src}` rejected ({} {kind} error(s)): {}",
        problems.len(),
        problems.join("; "),
    )
}
