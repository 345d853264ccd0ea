use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a type: the declaring package plus the local name.
///
/// Builtins and anonymous wrapper types (`[]byte`, `*string`, ...) carry an
/// empty package and spell the whole type expression in `name`.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TypeName {
    #[serde(default)]
    pub package: String,
    pub name: String,
}

impl TypeName {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeName {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Name for builtins and anonymous types, which have no package.
    pub fn local(name: impl Into<String>) -> Self {
        TypeName::new(String::new(), name)
    }

    /// Fully qualified identifier, e.g. `time.Duration` or `string`.
    pub fn qualified(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

/// Kind of a type as reported by the model provider.
///
/// Anything outside the renderable set is kept verbatim in `Other` so the
/// renderer can name it when refusing to display it.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Kind {
    Struct,
    Alias,
    Pointer,
    Slice,
    Map,
    Interface,
    Builtin,
    Other(String),
}

impl Kind {
    pub fn as_str(&self) -> &str {
        match self {
            Kind::Struct => "Struct",
            Kind::Alias => "Alias",
            Kind::Pointer => "Pointer",
            Kind::Slice => "Slice",
            Kind::Map => "Map",
            Kind::Interface => "Interface",
            Kind::Builtin => "Builtin",
            Kind::Other(kind) => kind,
        }
    }

    /// Pointer, slice and map types wrap an element type.
    pub fn is_wrapper(&self) -> bool {
        matches!(self, Kind::Pointer | Kind::Slice | Kind::Map)
    }

    pub fn is_renderable(&self) -> bool {
        !matches!(self, Kind::Other(_))
    }
}

impl From<String> for Kind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Struct" => Kind::Struct,
            "Alias" => Kind::Alias,
            "Pointer" => Kind::Pointer,
            "Slice" => Kind::Slice,
            "Map" => Kind::Map,
            "Interface" => Kind::Interface,
            "Builtin" => Kind::Builtin,
            _ => Kind::Other(value),
        }
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field of a struct type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeName,
    /// Raw struct tag, e.g. `json:"name,omitempty"`.
    #[serde(default)]
    pub tags: String,
    /// The member's own fields are inlined into the containing type.
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub comment_lines: Vec<String>,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: TypeName) -> Self {
        Member {
            name: name.into(),
            ty,
            tags: String::new(),
            embedded: false,
            comment_lines: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn with_comments<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comment_lines = lines.into_iter().map(Into::into).collect();
        self
    }
}

/// A declared or referenced type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    pub name: TypeName,
    pub kind: Kind,
    /// Target of an alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying: Option<TypeName>,
    /// Pointee or element type of a wrapper; the value type for maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elem: Option<TypeName>,
    /// Key type of a map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<TypeName>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub comment_lines: Vec<String>,
}

impl Type {
    pub fn new(name: TypeName, kind: Kind) -> Self {
        Type {
            name,
            kind,
            underlying: None,
            elem: None,
            key: None,
            members: Vec::new(),
            comment_lines: Vec::new(),
        }
    }

    pub fn builtin(name: &str) -> Self {
        Type::new(TypeName::local(name), Kind::Builtin)
    }

    pub fn pointer_to(elem: &TypeName) -> Self {
        let mut ty = Type::new(TypeName::local(format!("*{elem}")), Kind::Pointer);
        ty.elem = Some(elem.clone());
        ty
    }

    pub fn slice_of(elem: &TypeName) -> Self {
        let mut ty = Type::new(TypeName::local(format!("[]{elem}")), Kind::Slice);
        ty.elem = Some(elem.clone());
        ty
    }

    pub fn map_of(key: &TypeName, value: &TypeName) -> Self {
        let mut ty = Type::new(TypeName::local(format!("map[{key}]{value}")), Kind::Map);
        ty.key = Some(key.clone());
        ty.elem = Some(value.clone());
        ty
    }

    pub fn with_underlying(mut self, underlying: TypeName) -> Self {
        self.underlying = Some(underlying);
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_comments<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comment_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Names of every type this one points at directly.
    pub(crate) fn referenced_names(&self) -> impl Iterator<Item = &TypeName> {
        self.members
            .iter()
            .map(|member| &member.ty)
            .chain(self.underlying.iter())
            .chain(self.elem.iter())
            .chain(self.key.iter())
    }
}
