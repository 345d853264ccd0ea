//! Shared fixtures for refdoc crates.
//!
//! The sample package exercises the interesting corners of generation:
//! private members, embedded structs, aliases of external types, an alias
//! name override, wrapper types and external map types.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use refdoc_model::{Kind, Member, ModelDocument, Package, Type, TypeName};

pub const TEST_PACKAGE: &str = "github.com/example/refdoc/testdata";

pub const HEADER: &str = "---\ntitle: Reference\n---\n\n# Generated reference\n";

/// Serialization convention used for the sample package's struct tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagStyle {
    Json,
    Yaml,
}

impl TagStyle {
    fn tag(self, name: &str) -> String {
        match self {
            TagStyle::Json => format!("json:\"{name}\""),
            TagStyle::Yaml => format!("yaml:\"{name}\""),
        }
    }
}

pub fn local(name: &str) -> TypeName {
    TypeName::new(TEST_PACKAGE, name)
}

/// Every type visible from the sample package, declared and external.
pub fn sample_types(style: TagStyle) -> Vec<Type> {
    let string = Type::builtin("string");
    let int = Type::builtin("int");
    let int64 = Type::builtin("int64");
    let boolean = Type::builtin("bool");
    let byte = Type::builtin("byte");
    let any = Type::new(TypeName::local("interface{}"), Kind::Interface);

    let pointer_string = Type::pointer_to(&string.name);
    let bytes = Type::slice_of(&byte.name);
    let sub_map = Type::map_of(&string.name, &local("SomeSubStruct"));
    let any_map = Type::map_of(&string.name, &any.name);

    let duration = Type::new(TypeName::new("time", "Duration"), Kind::Alias)
        .with_underlying(int64.name.clone())
        .with_comments(["A Duration represents the elapsed time between two instants."]);
    let func_map = Type::new(TypeName::new("text/template", "FuncMap"), Kind::Alias)
        .with_underlying(any_map.name.clone())
        .with_comments(["FuncMap is the type of the map defining the mapping from names to functions."]);

    let my_test_struct = Type::new(local("MyTestStruct"), Kind::Struct)
        .with_comments([
            "MyTestStruct contains a collection of fields all attempting to test various",
            "aspects of the code generation.",
        ])
        .with_member(
            Member::new("Name", string.name.clone())
                .with_tags(style.tag("name"))
                .with_comments(["Name is the name of the MyTestStruct."]),
        )
        .with_member(Member::new("privateField", string.name.clone()).with_comments([
            "privateField is a private field and so should not be documented",
            "in the generated docs.",
        ]))
        .with_member(
            Member::new("LongMessageInt", int.name.clone())
                .with_tags(style.tag("longMessageInt"))
                .with_comments([
                    "LongMessageInt has a very long message, very very very very very very",
                    "long message attached to the top of it.",
                    "This should prove how the generator handles long doc strings.",
                ]),
        )
        .with_member(
            Member::new("SubStruct", local("SomeSubStruct"))
                .with_tags(style.tag("subStruct"))
                .with_comments([
                    "SubStruct is a struct referenced from within the parent struct.",
                    "This should get its own section in the referenced docs.",
                ]),
        )
        .with_member(
            Member::new("SubStructMap", sub_map.name.clone())
                .with_tags(style.tag("subStructMap"))
                .with_comments(["SubStructMap is a map of a known struct type."]),
        )
        .with_member(
            Member::new("AnEmbeddedStruct", local("AnEmbeddedStruct"))
                .embedded()
                .with_comments(["AnEmbeddedStruct is embedded here."]),
        )
        .with_member(
            Member::new("AliasedDuration", local("MyDuration"))
                .with_tags(style.tag("aliasedDuration"))
                .with_comments(["AliasedDuration is a type alias to a duration."]),
        )
        .with_member(
            Member::new("AliasedDurationString", local("MyDurationString"))
                .with_tags(style.tag("aliasedDurationString"))
                .with_comments([
                    "AliasDurationString is a type alias to a duration that should be documented",
                    "as a string type.",
                ]),
        )
        .with_member(
            Member::new("PointerString", pointer_string.name.clone())
                .with_tags(style.tag("pointerString"))
                .with_comments([
                    "PointerString shows that the docs gen strips the pointer (*) from the beginning",
                    "of the type when documented.",
                    "+optional",
                ]),
        )
        .with_member(
            Member::new("Private", local("PrivateMembers"))
                .with_tags(style.tag("private"))
                .with_comments([
                    "Private should be included as a new struct, but without any documented members.",
                ]),
        )
        .with_member(
            Member::new("AliasedStruct", local("AliasSubStruct"))
                .with_tags(style.tag("aliasedStruct"))
                .with_comments(["AliasedStruct is a type aliased struct"]),
        )
        .with_member(
            Member::new("ExternalMap", func_map.name.clone())
                .with_tags(style.tag("externalMap"))
                .with_comments(["ExternalMap references and external map type outside of the package."]),
        )
        .with_member(
            Member::new("AliasExternalMap", local("AliasedExternalMap"))
                .with_tags(style.tag("aliasExternalMap"))
                .with_comments([
                    "AliasExternalMap references an external map type outside of the package via an alias.",
                ]),
        )
        .with_member(
            Member::new("Bytes", bytes.name.clone())
                .with_tags(style.tag("bytes"))
                .with_comments(["Bytes is a slice of raw byte data."]),
        );

    let sub_members = [
        Member::new("NonTaggedField", boolean.name.clone())
            .with_comments(["NonTaggedField doesn't have a tag, so the name will be capitalised."]),
        Member::new("privateStruct", local("PrivateMembers"))
            .with_comments(["privateStruct should not be included in the docs."]),
    ];

    let mut some_sub_struct = Type::new(local("SomeSubStruct"), Kind::Struct)
        .with_comments(["SomeSubStruct is a struct to go within another struct."]);
    some_sub_struct.members = sub_members.to_vec();

    let mut alias_sub_struct = Type::new(local("AliasSubStruct"), Kind::Struct).with_comments([
        "AliasSubStruct is an aliased struct, it will be added to the documentation with an identical",
        "members table as the origin struct.",
    ]);
    alias_sub_struct.members = sub_members.to_vec();

    let embedded = Type::new(local("AnEmbeddedStruct"), Kind::Struct)
        .with_comments(["AnEmbeddedStruct gets embedded within other structures."])
        .with_member(
            Member::new("EmbeddedDuration", duration.name.clone())
                .with_tags(style.tag("embeddedDuration"))
                .with_comments(["EmbeddedDuration is a duration within an embedded struct."]),
        );

    let private_members = Type::new(local("PrivateMembers"), Kind::Struct)
        .with_comments([
            "PrivateMembers only has private members so when documented, should not have a members table printed.",
        ])
        .with_member(Member::new("privateInt", int64.name.clone()))
        .with_member(Member::new("privateBool", boolean.name.clone()))
        .with_member(Member::new("privateBytes", bytes.name.clone()));

    let my_duration = Type::new(local("MyDuration"), Kind::Alias)
        .with_underlying(duration.name.clone())
        .with_comments(["MyDuration is an alias to a duration."]);

    let my_duration_string = Type::new(local("MyDurationString"), Kind::Alias)
        .with_underlying(duration.name.clone())
        .with_comments([
            "MyDuration is an alias to a duration with the type overridden as a string",
            "+reference-gen:alias-name=string",
        ]);

    let aliased_external_map = Type::new(local("AliasedExternalMap"), Kind::Alias)
        .with_underlying(func_map.name.clone())
        .with_comments(["AliasedExternalMap is an alias type for a map type outside of the package."]);

    vec![
        string,
        int,
        int64,
        boolean,
        byte,
        any,
        pointer_string,
        bytes,
        sub_map,
        any_map,
        duration,
        func_map,
        my_test_struct,
        some_sub_struct,
        alias_sub_struct,
        embedded,
        private_members,
        my_duration,
        my_duration_string,
        aliased_external_map,
    ]
}

pub fn sample_document(style: TagStyle) -> ModelDocument {
    ModelDocument {
        package: TEST_PACKAGE.to_owned(),
        types: sample_types(style),
    }
}

pub fn sample_package(style: TagStyle) -> Package {
    match sample_document(style).into_package() {
        Ok(package) => package,
        Err(err) => panic!("sample package is inconsistent: {err}"),
    }
}

/// Write the sample model below `root` so that a provider rooted there finds
/// it under [`TEST_PACKAGE`]. Returns the written file's path.
pub fn write_model(root: &Path, style: TagStyle) -> io::Result<PathBuf> {
    let path = root.join(format!("{TEST_PACKAGE}.json"));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(&sample_document(style))?;
    fs::write(&path, contents)?;
    Ok(path)
}
