use super::resource::{RuntimeResource, RuntimeResourceModel};
use crate::model::{
    check_ambiguity, has_fatal, validate_resource, ModelValidationError, Resource, ResourceMethod,
    ResourceModel, ResourceModelIssue,
};
use crate::uri::UriTemplate;
use std::sync::Arc;
use tracing::{debug, info};

impl RuntimeResourceModel {
    /// Compile a validated static model into the matching tree.
    ///
    /// # Errors
    ///
    /// [`ModelValidationError`] when a template fails to compile or a
    /// merged group ends up with more than one locator.
    pub fn compile(model: &ResourceModel) -> Result<Self, ModelValidationError> {
        let mut issues = Vec::new();
        let resources: Vec<&Resource> = model.resources().iter().collect();
        let roots = compile_siblings(&resources, &mut issues);
        if has_fatal(&issues) {
            return Err(ModelValidationError { issues });
        }
        info!(roots = roots.len(), "runtime resource model compiled");
        Ok(Self { roots })
    }
}

/// Compile a resource returned by a locator.
///
/// The resource's own path is ignored: the node matches wherever the locator
/// left the remaining path. The subtree is validated here since it could
/// not be checked at startup.
///
/// # Errors
///
/// [`ModelValidationError`] when the resource has fatal issues.
pub fn compile_dynamic(resource: &Resource) -> Result<Arc<RuntimeResource>, ModelValidationError> {
    let mut unpathed = resource.clone();
    unpathed.path = None;

    let mut issues = Vec::new();
    validate_resource(&unpathed, None, &mut issues);

    let children: Vec<&Resource> = unpathed.children.iter().collect();
    let compiled_children = compile_siblings(&children, &mut issues);
    if has_fatal(&issues) {
        return Err(ModelValidationError { issues });
    }

    let template = UriTemplate::compile("").map_err(|e| ModelValidationError {
        issues: vec![ResourceModelIssue::fatal(unpathed.name(), e.to_string())],
    })?;
    debug!(resource = unpathed.name(), "dynamic resource compiled");
    Ok(Arc::new(RuntimeResource {
        templates: vec![template.clone()],
        template,
        bindings: Vec::new(),
        names: unpathed.names.clone(),
        methods: unpathed.methods.clone(),
        locator: unpathed.locators.first().cloned(),
        children: compiled_children,
        dynamic: true,
    }))
}

struct Group<'a> {
    templates: Vec<UriTemplate>,
    members: Vec<&'a Resource>,
}

/// Group siblings by compiled regex, then order groups by template priority.
fn compile_siblings(
    resources: &[&Resource],
    issues: &mut Vec<ResourceModelIssue>,
) -> Vec<Arc<RuntimeResource>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for resource in resources {
        let template = match UriTemplate::compile(resource.path().unwrap_or("")) {
            Ok(t) => t,
            Err(e) => {
                issues.push(ResourceModelIssue::fatal(resource.name(), e.to_string()));
                continue;
            }
        };
        match groups
            .iter_mut()
            .find(|g| g.templates[0].pattern() == template.pattern())
        {
            Some(group) => {
                group.templates.push(template);
                group.members.push(resource);
            }
            None => groups.push(Group {
                templates: vec![template],
                members: vec![resource],
            }),
        }
    }

    let mut nodes: Vec<RuntimeResource> = groups
        .into_iter()
        .map(|group| compile_group(group, issues))
        .collect();
    nodes.sort_by(|a, b| a.template.priority_cmp(&b.template));
    nodes.into_iter().map(Arc::new).collect()
}

fn compile_group(group: Group<'_>, issues: &mut Vec<ResourceModelIssue>) -> RuntimeResource {
    let mut bindings: Vec<(Arc<str>, usize)> = Vec::new();
    for template in &group.templates {
        for binding in template.bindings() {
            if !bindings.contains(binding) {
                bindings.push(binding.clone());
            }
        }
    }

    let mut names: Vec<Arc<str>> = Vec::new();
    let mut methods = Vec::new();
    let mut locators = Vec::new();
    let mut children: Vec<&Resource> = Vec::new();
    for member in &group.members {
        for name in member.names() {
            if !names.contains(name) {
                names.push(Arc::clone(name));
            }
        }
        methods.extend(member.methods().iter().cloned());
        locators.extend(member.locators.iter().cloned());
        children.extend(member.children().iter());
    }

    let mut template = group.templates[0].clone();
    for t in &group.templates[1..] {
        if t.priority_cmp(&template).is_lt() {
            template = t.clone();
        }
    }

    if group.members.len() > 1 {
        let merged: Vec<&ResourceMethod> = methods.iter().collect();
        check_ambiguity(&merged, &template.to_string(), issues);
    }

    if locators.len() > 1 {
        issues.push(ResourceModelIssue::fatal(
            template.to_string(),
            format!(
                "{} sub-resource locators match the same path after merging",
                locators.len()
            ),
        ));
    }

    RuntimeResource {
        template,
        templates: group.templates,
        bindings,
        names,
        methods,
        locator: locators.into_iter().next(),
        children: compile_siblings(&children, issues),
        dynamic: false,
    }
}
