//! Filters bound into every template. They are the only way templates reach
//! the display and visibility rules.

use std::collections::HashMap;
use std::sync::Arc;

use refdoc_model::{Member, Type, TypeName};
use serde::Serialize;
use tera::{Tera, Value};

use crate::display::Resolver;
use crate::visibility;

pub const FILTER_NAMES: &[&str] = &[
    "sorted_types",
    "visible_types",
    "visible_members",
    "type_references",
    "type_display_name",
    "link_for_type",
    "alias_display_name",
    "alias_link",
    "dereference",
    "field_name",
    "is_hidden",
    "is_optional_member",
    "render_comments_lf",
    "render_comments_br",
    "backtick",
];

pub(crate) fn register_all(tera: &mut Tera, resolver: &Arc<Resolver>) {
    register(tera, resolver, "sorted_types", |_, value| {
        let mut items = array(value, "sorted_types")?.clone();
        items.sort_by(|left, right| local_name(left).cmp(&local_name(right)));
        Ok(Value::Array(items))
    });
    register(tera, resolver, "visible_types", |_, value| {
        let items = array(value, "visible_types")?
            .iter()
            .filter(|item| !local_name(item).is_some_and(visibility::is_hidden))
            .cloned()
            .collect();
        Ok(Value::Array(items))
    });
    register(tera, resolver, "visible_members", |_, value| {
        let members: Vec<Member> = decode(value, "visible_members")?;
        encode(&visibility::visible_members(&members))
    });
    register(tera, resolver, "type_references", |resolver, value| {
        let Some(name) = type_name(value)? else {
            return Ok(Value::Array(Vec::new()));
        };
        encode(&resolver.references(&name))
    });
    register(tera, resolver, "type_display_name", |resolver, value| {
        let Some(name) = type_name(value)? else {
            return Ok(Value::String(String::new()));
        };
        let display = resolver.display_name(&name).map_err(|err| model_error(&name, err))?;
        Ok(Value::String(display))
    });
    register(tera, resolver, "link_for_type", |resolver, value| {
        let Some(name) = type_name(value)? else {
            return Ok(Value::String(String::new()));
        };
        let link = resolver.link(&name).map_err(|err| model_error(&name, err))?;
        Ok(Value::String(link.unwrap_or_default()))
    });
    register(tera, resolver, "alias_display_name", |resolver, value| {
        let Some(ty) = full_type(resolver, value)? else {
            return Ok(Value::String(String::new()));
        };
        let alias = resolver
            .alias_display_name(ty)
            .map_err(|err| model_error(&ty.name, err))?;
        Ok(Value::String(alias.unwrap_or_default()))
    });
    register(tera, resolver, "alias_link", |resolver, value| {
        let Some(ty) = full_type(resolver, value)? else {
            return Ok(Value::String(String::new()));
        };
        let link = resolver.alias_link(ty).map_err(|err| model_error(&ty.name, err))?;
        Ok(Value::String(link.unwrap_or_default()))
    });
    register(tera, resolver, "dereference", |resolver, value| {
        let Some(name) = type_name(value)? else {
            return Ok(Value::Null);
        };
        let target = resolver.dereference(&name).map_err(|err| model_error(&name, err))?;
        encode(target)
    });
    register(tera, resolver, "field_name", |_, value| {
        let member: Member = decode(value, "field_name")?;
        Ok(Value::String(visibility::resolved_field_name(&member)))
    });
    register(tera, resolver, "is_hidden", |_, value| {
        let name = value.as_str().unwrap_or_default();
        Ok(Value::Bool(visibility::is_hidden(name)))
    });
    register(tera, resolver, "is_optional_member", |resolver, value| {
        let member: Member = decode(value, "is_optional_member")?;
        let namespace = &resolver.options().directive_namespace;
        Ok(Value::Bool(visibility::is_optional(&member, namespace)))
    });
    register(tera, resolver, "render_comments_lf", |_, value| {
        let lines = comment_lines(value, "render_comments_lf")?;
        Ok(Value::String(visibility::join_lf(&lines)))
    });
    register(tera, resolver, "render_comments_br", |_, value| {
        let lines = comment_lines(value, "render_comments_br")?;
        Ok(Value::String(visibility::join_br(&lines)))
    });
    register(tera, resolver, "backtick", |_, value| {
        let text = match value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(Value::String(format!("`{text}`")))
    });
}

fn register<F>(tera: &mut Tera, resolver: &Arc<Resolver>, name: &str, filter: F)
where
    F: Fn(&Resolver, &Value) -> tera::Result<Value> + Send + Sync + 'static,
{
    let resolver = Arc::clone(resolver);
    tera.register_filter(
        name,
        move |value: &Value, _args: &HashMap<String, Value>| filter(&resolver, value),
    );
}

fn array<'a>(value: &'a Value, filter: &str) -> tera::Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| tera::Error::msg(format!("{filter} filter expects an array")))
}

/// Local name of a type, a type name, or a member.
fn local_name(value: &Value) -> Option<&str> {
    match value.get("name")? {
        Value::String(name) => Some(name),
        Value::Object(name) => name.get("name")?.as_str(),
        _ => None,
    }
}

/// Accepts either a type name or a whole type object. Null means no type.
fn type_name(value: &Value) -> tera::Result<Option<TypeName>> {
    if value.is_null() {
        return Ok(None);
    }
    let name = match value.get("name") {
        Some(inner @ Value::Object(_)) => inner,
        _ => value,
    };
    decode(name, "type name").map(Some)
}

fn full_type<'a>(resolver: &'a Resolver, value: &Value) -> tera::Result<Option<&'a Type>> {
    let Some(name) = type_name(value)? else {
        return Ok(None);
    };
    resolver
        .resolve(&name)
        .map(Some)
        .map_err(|err| model_error(&name, err))
}

fn comment_lines(value: &Value, filter: &str) -> tera::Result<Vec<String>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    decode(value, filter)
}

fn decode<T: serde::de::DeserializeOwned>(value: &Value, what: &str) -> tera::Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|err| tera::Error::chain(format!("{what} received an unexpected value"), err))
}

fn encode<T: Serialize + ?Sized>(value: &T) -> tera::Result<Value> {
    serde_json::to_value(value).map_err(|err| tera::Error::chain("failed to encode value", err))
}

fn model_error(name: &TypeName, err: refdoc_model::ModelError) -> tera::Error {
    tera::Error::chain(format!("cannot display {name}"), err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn local_names_come_from_types_names_and_members() {
        let ty = json!({"name": {"package": "p", "name": "T"}, "kind": "Struct"});
        let name = json!({"package": "p", "name": "N"});
        let member = json!({"name": "Field", "type": {"name": "string"}});
        assert_eq!(local_name(&ty), Some("T"));
        assert_eq!(local_name(&name), Some("N"));
        assert_eq!(local_name(&member), Some("Field"));
    }

    #[test]
    fn type_names_accept_whole_types() {
        let ty = json!({"name": {"package": "p", "name": "T"}, "kind": "Struct"});
        assert_eq!(type_name(&ty).unwrap(), Some(TypeName::new("p", "T")));
        let name = json!({"name": "string"});
        assert_eq!(type_name(&name).unwrap(), Some(TypeName::local("string")));
        assert_eq!(type_name(&Value::Null).unwrap(), None);
    }
}
