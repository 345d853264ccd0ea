use std::fs;

use pretty_assertions::assert_eq;
use refdoc_graph::{ReferenceGraph, RequestedSet};
use refdoc_render::{DisplayOptions, RenderError, Renderer, TemplateSet};
use refdoc_test_support::{sample_package, TagStyle};
use tempfile::TempDir;

fn render_with(style: TagStyle, requested: &[&str], templates: &TemplateSet) -> String {
    let package = sample_package(style);
    let requested: RequestedSet = requested.iter().collect();
    let graph = ReferenceGraph::for_documentation(&package, &requested).expect("graph builds");
    let renderer = Renderer::new(templates, DisplayOptions::default()).expect("templates load");
    renderer.render(&package, &graph).expect("render succeeds")
}

fn render(requested: &[&str]) -> String {
    render_with(TagStyle::Json, requested, &TemplateSet::builtin())
}

const SOME_SUB_STRUCT_ONLY: &str = "
### PrivateMembers

(**Appears on:** [AliasSubStruct](#aliassubstruct), [MyTestStruct](#myteststruct), [SomeSubStruct](#somesubstruct))

PrivateMembers only has private members so when documented, should not have a members table printed.

### SomeSubStruct

(**Appears on:** [MyTestStruct](#myteststruct))

SomeSubStruct is a struct to go within another struct.

| Field | Type | Description |
| ----- | ---- | ----------- |
| `NonTaggedField` | _bool_ | NonTaggedField doesn't have a tag, so the name will be capitalised. |
";

const MY_TEST_STRUCT_SECTION: &str = "
### MyTestStruct

MyTestStruct contains a collection of fields all attempting to test various
aspects of the code generation.

| Field | Type | Description |
| ----- | ---- | ----------- |
| `name` | _string_ | Name is the name of the MyTestStruct. |
| `longMessageInt` | _int_ | LongMessageInt has a very long message, very very very very very very<br/>long message attached to the top of it.<br/>This should prove how the generator handles long doc strings. |
| `subStruct` | _[SomeSubStruct](#somesubstruct)_ | SubStruct is a struct referenced from within the parent struct.<br/>This should get its own section in the referenced docs. |
| `subStructMap` | _[map[string]SomeSubStruct](#somesubstruct)_ | SubStructMap is a map of a known struct type. |
| `embeddedDuration` | _duration_ | EmbeddedDuration is a duration within an embedded struct. |
| `aliasedDuration` | _[MyDuration](#myduration)_ | AliasedDuration is a type alias to a duration. |
| `aliasedDurationString` | _[MyDurationString](#mydurationstring)_ | AliasDurationString is a type alias to a duration that should be documented<br/>as a string type. |
| `pointerString` | _string_ | _(Optional)_ PointerString shows that the docs gen strips the pointer (*) from the beginning<br/>of the type when documented. |
| `private` | _[PrivateMembers](#privatemembers)_ | Private should be included as a new struct, but without any documented members. |
| `aliasedStruct` | _[AliasSubStruct](#aliassubstruct)_ | AliasedStruct is a type aliased struct |
| `externalMap` | _text/template.FuncMap_ | ExternalMap references and external map type outside of the package. |
| `aliasExternalMap` | _[AliasedExternalMap](#aliasedexternalmap)_ | AliasExternalMap references an external map type outside of the package via an alias. |
| `bytes` | _[]byte_ | Bytes is a slice of raw byte data. |
";

fn headings(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix("### "))
        .collect()
}

#[test]
fn sub_struct_alone_renders_only_what_it_needs() {
    assert_eq!(render(&["SomeSubStruct"]), SOME_SUB_STRUCT_ONLY);
}

#[test]
fn full_struct_renders_flattened_and_linked_members() {
    let output = render(&["MyTestStruct"]);
    assert!(
        output.contains(MY_TEST_STRUCT_SECTION),
        "unexpected output:\n{output}"
    );
    assert_eq!(
        headings(&output),
        vec![
            "AliasSubStruct",
            "AliasedExternalMap",
            "AnEmbeddedStruct",
            "MyDuration",
            "MyDurationString",
            "MyTestStruct",
            "PrivateMembers",
            "SomeSubStruct",
        ]
    );
}

#[test]
fn alias_subheadings_name_their_targets() {
    let output = render(&["MyTestStruct"]);
    assert!(output.contains("### MyDuration\n#### (`duration` alias)\n"));
    assert!(output.contains("### MyDurationString\n#### (`string` alias)\n"));
    assert!(output.contains("### AliasedExternalMap\n#### (`text/template.FuncMap` alias)\n"));
}

#[test]
fn private_members_and_directives_never_render() {
    let output = render(&[]);
    assert!(!output.contains("privateField"));
    assert!(!output.contains("privateStruct"));
    assert!(!output.contains("privateInt"));
    assert!(!output.contains("+reference-gen"));
    assert!(!output.contains("+optional"));
}

#[test]
fn unrelated_requests_render_side_by_side() {
    let output = render(&["SomeSubStruct", "AnEmbeddedStruct"]);
    assert_eq!(
        headings(&output),
        vec!["AnEmbeddedStruct", "PrivateMembers", "SomeSubStruct"]
    );
}

#[test]
fn yaml_tags_render_like_json_tags() {
    let json = render_with(TagStyle::Json, &["MyTestStruct"], &TemplateSet::builtin());
    let yaml = render_with(TagStyle::Yaml, &["MyTestStruct"], &TemplateSet::builtin());
    assert_eq!(json, yaml);
}

#[test]
fn overridden_member_template_changes_rows_only() {
    let temp = TempDir::new().expect("tempdir");
    fs::write(
        temp.path().join("member.tera"),
        "{%- macro member(field) -%}\n{%- set hidden = field.name | is_hidden -%}\n{%- if not hidden %}\n| {{ field | field_name }} | {{ field.type | type_display_name }} | - |\n{%- endif -%}\n{%- endmacro member -%}\n",
    )
    .expect("write override");

    let templates = TemplateSet::load(Some(temp.path())).expect("overrides load");
    let output = render_with(TagStyle::Json, &["SomeSubStruct"], &templates);
    assert!(output.contains("| NonTaggedField | bool | - |"));
    assert!(output.contains("### SomeSubStruct"));
}

#[test]
fn renderer_rejects_templates_calling_unknown_filters() {
    let temp = TempDir::new().expect("tempdir");
    fs::write(
        temp.path().join("package.tera"),
        "{% for item in types %}{{ item | mystery }}{% endfor %}",
    )
    .expect("write override");

    let err = TemplateSet::load(Some(temp.path())).expect_err("load fails");
    assert!(matches!(err, RenderError::UndefinedFunction { .. }));
}

#[test]
fn custom_alias_tables_are_injected() {
    let package = sample_package(TagStyle::Json);
    let graph = ReferenceGraph::for_documentation(&package, &RequestedSet::parse_list("MyDuration"))
        .expect("graph builds");
    let mut options = DisplayOptions::default();
    options
        .aliases
        .insert("time.Duration".to_owned(), "Duration".to_owned());
    let renderer = Renderer::new(&TemplateSet::builtin(), options).expect("templates load");
    let output = renderer.render(&package, &graph).expect("render succeeds");
    assert!(output.contains("#### (`Duration` alias)"));
}
