use std::collections::BTreeMap;
use std::rc::Rc;

use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map, Scope, AST, FLOAT, INT};
use sp_core::{ComputeFn, EffectFn, PredicateFn, SceneplayError, SpValue, State, Variables};

pub(crate) const VARS_BINDING: &str = "vars";

pub(crate) fn spvalue_to_dynamic(value: &SpValue) -> Dynamic {
    match value {
        SpValue::Bool(value) => Dynamic::from_bool(*value),
        SpValue::Number(value) => Dynamic::from_float(*value),
        SpValue::String(value) => Dynamic::from(value.clone()),
        SpValue::Array(values) => {
            Dynamic::from_array(values.iter().map(spvalue_to_dynamic).collect::<Array>())
        }
        SpValue::Map(values) => Dynamic::from_map(variables_to_map(values)),
    }
}

fn variables_to_map(values: &BTreeMap<String, SpValue>) -> Map {
    let mut map = Map::new();
    for (key, value) in values {
        map.insert(key.as_str().into(), spvalue_to_dynamic(value));
    }
    map
}

pub(crate) fn dynamic_to_spvalue(value: Dynamic) -> Result<SpValue, SceneplayError> {
    if value.is::<bool>() {
        return Ok(SpValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(SpValue::Number(value.cast::<INT>() as f64));
    }
    if value.is::<FLOAT>() {
        return Ok(SpValue::Number(value.cast::<FLOAT>()));
    }
    if value.is::<ImmutableString>() {
        return Ok(SpValue::String(value.cast::<ImmutableString>().to_string()));
    }
    if value.is::<char>() {
        return Ok(SpValue::String(value.cast::<char>().to_string()));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_spvalue(item)?);
        }
        return Ok(SpValue::Array(out));
    }
    if value.is::<Map>() {
        return map_to_variables(value.cast::<Map>()).map(SpValue::Map);
    }

    Err(SceneplayError::new(
        "SCRIPT_VALUE_UNSUPPORTED",
        format!("Script produced unsupported value of type {}.", value.type_name()),
    ))
}

fn map_to_variables(map: Map) -> Result<Variables, SceneplayError> {
    let mut out = Variables::new();
    for (key, value) in map {
        out.insert(key.to_string(), dynamic_to_spvalue(value)?);
    }
    Ok(out)
}

/// Only `vars` is declared, so strict variables reject any other free name.
fn compile_scope() -> Scope<'static> {
    let mut scope = Scope::new();
    scope.push(VARS_BINDING, Map::new());
    scope
}

fn scope_for(state: &State) -> Scope<'static> {
    let mut scope = Scope::new();
    scope.push(VARS_BINDING, variables_to_map(&state.variables));
    scope
}

fn runtime_error(location: &str, error: Box<EvalAltResult>) -> SceneplayError {
    SceneplayError::with_location("SCRIPT_RUNTIME", error.to_string(), location)
}

/// Compiles story scripts against one shared Rhai engine.
pub(crate) struct ScriptHost {
    engine: Rc<Engine>,
}

impl ScriptHost {
    pub(crate) fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_strict_variables(true);
        Self {
            engine: Rc::new(engine),
        }
    }

    fn compile_expression(&self, source: &str, location: &str) -> Result<AST, SceneplayError> {
        let scope = compile_scope();
        self.engine.compile_expression_with_scope(&scope, source).map_err(|error| {
            SceneplayError::with_location(
                "LOADER_SCRIPT_SYNTAX",
                format!("Invalid expression \"{}\": {}", source, error),
                location,
            )
        })
    }

    pub(crate) fn compute(&self, source: &str, location: &str) -> Result<ComputeFn, SceneplayError> {
        let ast = self.compile_expression(source, location)?;
        let engine = Rc::clone(&self.engine);
        let location = location.to_string();
        Ok(ComputeFn::new(move |state| {
            let mut scope = scope_for(state);
            let value = engine
                .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
                .map_err(|error| runtime_error(&location, error))?;
            dynamic_to_spvalue(value)
        }))
    }

    pub(crate) fn predicate(
        &self,
        source: &str,
        location: &str,
    ) -> Result<PredicateFn, SceneplayError> {
        let ast = self.compile_expression(source, location)?;
        let engine = Rc::clone(&self.engine);
        let location = location.to_string();
        let source = source.to_string();
        Ok(PredicateFn::new(move |state| {
            let mut scope = scope_for(state);
            let value = engine
                .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
                .map_err(|error| runtime_error(&location, error))?;
            if value.is::<bool>() {
                return Ok(value.cast::<bool>());
            }
            Err(SceneplayError::with_location(
                "SCRIPT_BOOLEAN_EXPECTED",
                format!(
                    "Test \"{}\" must evaluate to boolean, got {}.",
                    source,
                    value.type_name()
                ),
                location.as_str(),
            ))
        }))
    }

    /// Effects run as statements; whatever `vars` holds afterwards becomes
    /// the new variable state.
    pub(crate) fn effect(&self, source: &str, location: &str) -> Result<EffectFn, SceneplayError> {
        let scope = compile_scope();
        let ast = self.engine.compile_with_scope(&scope, source).map_err(|error| {
            SceneplayError::with_location(
                "LOADER_SCRIPT_SYNTAX",
                format!("Invalid effect \"{}\": {}", source, error),
                location,
            )
        })?;
        let engine = Rc::clone(&self.engine);
        let location = location.to_string();
        Ok(EffectFn::new(move |state| {
            let mut scope = scope_for(state);
            engine
                .run_ast_with_scope(&mut scope, &ast)
                .map_err(|error| runtime_error(&location, error))?;
            let Some(vars) = scope.get_value::<Map>(VARS_BINDING) else {
                return Err(SceneplayError::with_location(
                    "SCRIPT_VARS_REPLACED",
                    "Effect replaced `vars` with a non-map value.",
                    location.as_str(),
                ));
            };
            state.variables = map_to_variables(vars)?;
            Ok(())
        }))
    }
}
