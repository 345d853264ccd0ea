use std::sync::Arc;

use refdoc_graph::ReferenceGraph;
use refdoc_model::{ModelError, Package, Type, TypeName};
use tera::{Context, Tera};
use tracing::{debug, info};

use crate::display::{DisplayOptions, Resolver};
use crate::error::RenderError;
use crate::functions;
use crate::templates::TemplateSet;
use crate::visibility::{visible_members, visible_types};

const ENTRY_TEMPLATE: &str = "package";

/// Renders a filtered package through a validated template set.
#[derive(Debug)]
pub struct Renderer {
    tera: Tera,
    options: DisplayOptions,
}

impl Renderer {
    pub fn new(templates: &TemplateSet, options: DisplayOptions) -> Result<Self, RenderError> {
        templates.validate()?;
        let tera = templates.compile()?;
        debug!(
            overrides = templates.overridden().len(),
            "template set ready"
        );
        Ok(Renderer { tera, options })
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    /// Render a section for every type in `graph`.
    ///
    /// The model is checked up front, so any type the templates would fail to
    /// display is reported as a [`ModelError`] before output is produced.
    pub fn render(&self, package: &Package, graph: &ReferenceGraph) -> Result<String, RenderError> {
        let resolver = Arc::new(Resolver::new(
            package.clone(),
            graph.clone(),
            self.options.clone(),
        ));

        let documented = documented_types(&resolver)?;
        preflight(&resolver, &documented)?;

        for ty in visible_types(documented.iter().copied()) {
            info!(name = %ty.name.name, "rendering reference for type");
        }

        let mut tera = self.tera.clone();
        functions::register_all(&mut tera, &resolver);

        let mut context = Context::new();
        context.insert("package", package.path());
        context.insert("types", &documented);

        tera.render(ENTRY_TEMPLATE, &context)
            .map_err(|err| RenderError::from_render(ENTRY_TEMPLATE, err))
    }
}

fn documented_types(resolver: &Resolver) -> Result<Vec<&Type>, ModelError> {
    resolver
        .graph()
        .names()
        .map(|name| resolver.resolve(name))
        .collect()
}

/// Touch every name the built-in templates would display for `types`.
fn preflight(resolver: &Resolver, types: &[&Type]) -> Result<(), ModelError> {
    for ty in types {
        resolver.display_name(&ty.name)?;
    }

    for ty in visible_types(types.iter().copied()) {
        resolver.alias_display_name(ty)?;
        resolver.alias_link(ty)?;

        for reference in resolver.references(&ty.name) {
            check_name(resolver, reference)?;
        }

        let mut stack = vec![ty.name.clone()];
        check_members(resolver, ty, &mut stack)?;
    }
    Ok(())
}

fn check_members(
    resolver: &Resolver,
    ty: &Type,
    stack: &mut Vec<TypeName>,
) -> Result<(), ModelError> {
    for member in visible_members(&ty.members) {
        if !member.embedded {
            check_name(resolver, &member.ty)?;
            continue;
        }

        let embedded = resolver.dereference(&member.ty)?;
        if stack.contains(&embedded.name) {
            return Err(ModelError::EmbeddingCycle {
                name: embedded.name.clone(),
            });
        }
        stack.push(embedded.name.clone());
        check_members(resolver, embedded, stack)?;
        stack.pop();
    }
    Ok(())
}

fn check_name(resolver: &Resolver, name: &TypeName) -> Result<(), ModelError> {
    resolver.display_name(name)?;
    resolver.link(name)?;
    Ok(())
}
