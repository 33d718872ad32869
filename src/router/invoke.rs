use super::context::RequestContext;
use super::core::RouteEnv;
use crate::exception::HandlerError;
use crate::model::{Invocable, ParamValue, Parameter, ResourceMethod, Source, SubResource};
use crate::runtime::{compile_dynamic, Lifecycle, RuntimeResource};
use crate::server::Response;
use crate::uri;
use std::sync::Arc;
use tracing::{debug, error};

/// Make the owner's instance current before the method body runs.
pub(crate) fn bind_instance(ctx: &mut RequestContext, method: &ResourceMethod, lifecycle: &Lifecycle) {
    ctx.current_instance = method
        .owner()
        .and_then(|owner| lifecycle.instance(owner, &mut ctx.instances));
}

fn raw_values(ctx: &RequestContext, parameter: &Parameter) -> Vec<String> {
    let name = parameter.name.as_ref();
    match parameter.source {
        Source::Path => {
            let value = if parameter.encoded {
                ctx.matched.encoded_path_param(name)
            } else {
                ctx.matched.path_param(name)
            };
            if parameter.multi {
                let values = if parameter.encoded {
                    ctx.matched
                        .encoded_path_params
                        .iter()
                        .filter(|(k, _)| k.as_ref() == name)
                        .map(|(_, v)| v.clone())
                        .collect()
                } else {
                    ctx.matched
                        .path_param_values(name)
                        .into_iter()
                        .map(str::to_string)
                        .collect()
                };
                return values;
            }
            value.map(str::to_string).into_iter().collect()
        }
        Source::Query => ctx
            .query_param_values(name, !parameter.encoded)
            .into_iter()
            .map(str::to_string)
            .collect(),
        Source::Header => ctx
            .request
            .header_values(name)
            .map(str::to_string)
            .collect(),
        Source::Matrix => ctx
            .path_segments(!parameter.encoded)
            .last()
            .map(|segment| segment.matrix_values(name).map(str::to_string).collect())
            .unwrap_or_default(),
        Source::Cookie => ctx.request.cookie(name).into_iter().collect(),
        Source::Form => {
            let body = String::from_utf8_lossy(ctx.request.entity()).into_owned();
            uri::parse_query(&body, !parameter.encoded)
                .into_iter()
                .filter(|(k, _)| k == name)
                .map(|(_, v)| v)
                .collect()
        }
        Source::Entity | Source::Context => Vec::new(),
    }
}

fn resolve_parameter(ctx: &RequestContext, parameter: &Parameter) -> Result<ParamValue, HandlerError> {
    let convert = |raw: &str| {
        parameter
            .ty
            .convert(raw)
            .map_err(|e| HandlerError::param(&parameter.name, e))
    };
    match parameter.source {
        Source::Context => return Ok(ParamValue::Absent),
        Source::Entity => {
            if ctx.request.entity().is_empty() {
                return match &parameter.default_value {
                    Some(default) => convert(default),
                    None => Ok(ParamValue::Absent),
                };
            }
            return parameter
                .ty
                .convert_entity(ctx.request.entity())
                .map_err(|e| HandlerError::param(&parameter.name, e));
        }
        _ => {}
    }

    let mut raw = raw_values(ctx, parameter);
    if raw.is_empty() {
        match &parameter.default_value {
            Some(default) => raw.push(default.clone()),
            None if parameter.multi => return Ok(ParamValue::List(Vec::new())),
            None => return Ok(ParamValue::Absent),
        }
    }
    if parameter.multi {
        let values = raw.iter().map(|r| convert(r)).collect::<Result<Vec<_>, _>>()?;
        return Ok(ParamValue::List(values));
    }
    match parameter.source {
        Source::Path => raw.last().map_or(Ok(ParamValue::Absent), |r| convert(r)),
        _ => raw.first().map_or(Ok(ParamValue::Absent), |r| convert(r)),
    }
}

/// Resolve the declared parameters of `method` into the context.
///
/// # Errors
///
/// A `ParamException` (400) when a value does not convert.
pub(crate) fn resolve_parameters(ctx: &mut RequestContext, method: &ResourceMethod) -> Result<(), HandlerError> {
    let mut resolved = Vec::with_capacity(method.parameters().len());
    for parameter in method.parameters() {
        let value = resolve_parameter(ctx, parameter)?;
        resolved.push((Arc::clone(&parameter.name), value));
    }
    ctx.params = resolved;
    Ok(())
}

/// Run a sub-resource locator.
pub(crate) fn invoke_locator(
    ctx: &mut RequestContext,
    method: &ResourceMethod,
    lifecycle: &Lifecycle,
) -> Result<Option<SubResource>, HandlerError> {
    bind_instance(ctx, method, lifecycle);
    resolve_parameters(ctx, method)?;
    match method.invocable() {
        Invocable::Locator(f) => f(ctx),
        Invocable::Handler(_) => Err(HandlerError::internal(format!(
            "{} is not a sub-resource locator",
            method.location()
        ))),
    }
}

/// Run a resource method.
pub(crate) fn invoke_handler(
    ctx: &mut RequestContext,
    method: &ResourceMethod,
    lifecycle: &Lifecycle,
) -> Result<Response, HandlerError> {
    bind_instance(ctx, method, lifecycle);
    resolve_parameters(ctx, method)?;
    match method.invocable() {
        Invocable::Handler(f) => f(ctx),
        Invocable::Locator(_) => Err(HandlerError::internal(format!(
            "{} is a sub-resource locator, not a resource method",
            method.location()
        ))),
    }
}

/// Turn a locator result into the node matching continues from.
pub(crate) fn resolve_sub_resource(
    ctx: &mut RequestContext,
    sub: SubResource,
    env: RouteEnv<'_>,
) -> Result<Arc<RuntimeResource>, HandlerError> {
    let compiled = match sub {
        SubResource::Class(class) => {
            if env.lifecycle.create(&class, &mut ctx.instances).is_none() {
                debug!(class = class.name(), "locator class has no factory");
            }
            env.cache.resolve(&class)
        }
        SubResource::Instance(class, instance) => {
            ctx.instances.insert(class.name_arc(), instance);
            env.cache.resolve(&class)
        }
        SubResource::Resource(resource) => compile_dynamic(&resource),
    };
    compiled.map_err(|e| {
        for issue in &e.issues {
            error!(issue = %issue, "invalid sub-resource returned by locator");
        }
        HandlerError::internal(e.to_string()).with_source(e)
    })
}
