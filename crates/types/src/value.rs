//! Type tags and typed configuration values

use crate::{
    error::ConversionError, memory::MemorySize, password::Password,
    utils::format_with_highest_unit,
};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    str::FromStr,
    sync::Arc,
    time::Duration,
};

/// Target shape of a configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
    Int32,
    Int64,
    Bool,
    Float32,
    Float64,
    Text,
    /// Text that is masked in every diagnostic output
    Secret,
    Enum(EnumType),
    Duration,
    MemorySize,
    /// Mapping from text keys to text values
    MapOfText,
    /// Homogeneous list of the inner type
    List(Box<TypeTag>),
}

impl TypeTag {
    /// List of the given element type
    pub fn list_of(element: TypeTag) -> Self {
        Self::List(Box::new(element))
    }

    /// Whether values of this type carry secrets, directly or in their elements
    pub fn is_sensitive(&self) -> bool {
        match self {
            Self::Secret => true,
            Self::List(element) => element.is_sensitive(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32 => f.write_str("int"),
            Self::Int64 => f.write_str("long"),
            Self::Bool => f.write_str("bool"),
            Self::Float32 => f.write_str("float"),
            Self::Float64 => f.write_str("double"),
            Self::Text => f.write_str("string"),
            Self::Secret => f.write_str("password"),
            Self::Enum(enum_type) => write!(f, "enum({})", enum_type.members().join("|")),
            Self::Duration => f.write_str("duration"),
            Self::MemorySize => f.write_str("memory"),
            Self::MapOfText => f.write_str("map"),
            Self::List(element) => write!(f, "list<{}>", element),
        }
    }
}

/// Parses the tag syntax used on the command line: `int`, `list<duration>`,
/// `enum(FULL|INCREMENTAL)` and so on.
impl FromStr for TypeTag {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unsupported = || ConversionError::UnsupportedType {
            tag: trimmed.to_string(),
        };

        if let Some(inner) = strip_wrapper(trimmed, "list<", '>') {
            return Ok(Self::list_of(inner.parse()?));
        }

        if let Some(inner) = strip_wrapper(trimmed, "enum(", ')') {
            let members: Vec<&str> = inner
                .split('|')
                .map(str::trim)
                .filter(|member| !member.is_empty())
                .collect();
            if members.is_empty() {
                return Err(unsupported());
            }
            return Ok(Self::Enum(EnumType::new("enum", &members)));
        }

        match trimmed.to_lowercase().as_str() {
            "int" | "integer" | "int32" => Ok(Self::Int32),
            "long" | "int64" => Ok(Self::Int64),
            "bool" | "boolean" => Ok(Self::Bool),
            "float" | "float32" => Ok(Self::Float32),
            "double" | "float64" => Ok(Self::Float64),
            "string" | "text" => Ok(Self::Text),
            "password" | "secret" => Ok(Self::Secret),
            "duration" => Ok(Self::Duration),
            "memory" | "memorysize" => Ok(Self::MemorySize),
            "map" => Ok(Self::MapOfText),
            _ => Err(unsupported()),
        }
    }
}

fn strip_wrapper<'a>(text: &'a str, open: &str, close: char) -> Option<&'a str> {
    let head = text.get(..open.len())?;
    if !head.eq_ignore_ascii_case(open) {
        return None;
    }
    text[open.len()..].strip_suffix(close)
}

#[derive(Debug)]
struct EnumTypeInner {
    name: String,
    members: Vec<String>,
    lookup: HashMap<String, usize>,
}

/// A named set of enum members with a case-insensitive lookup table.
///
/// The table is built once when the set is registered; cloning shares it.
#[derive(Debug, Clone)]
pub struct EnumType(Arc<EnumTypeInner>);

impl EnumType {
    /// Register an enum set. When two members differ only in case the first
    /// one wins the lookup.
    pub fn new<S: AsRef<str>>(name: impl Into<String>, members: &[S]) -> Self {
        let members: Vec<String> = members.iter().map(|m| m.as_ref().to_string()).collect();
        let mut lookup = HashMap::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            lookup.entry(member.to_uppercase()).or_insert(index);
        }

        Self(Arc::new(EnumTypeInner {
            name: name.into(),
            members,
            lookup,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn members(&self) -> &[String] {
        &self.0.members
    }

    /// Find a member by name, ignoring case
    pub fn lookup(&self, name: &str) -> Option<EnumValue> {
        self.0
            .lookup
            .get(&name.to_uppercase())
            .map(|&index| EnumValue {
                enum_type: self.clone(),
                index,
            })
    }

    /// Member at the given registration index
    pub fn value(&self, index: usize) -> Option<EnumValue> {
        (index < self.0.members.len()).then(|| EnumValue {
            enum_type: self.clone(),
            index,
        })
    }
}

impl PartialEq for EnumType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.name == other.0.name && self.0.members == other.0.members)
    }
}

/// A member of an [`EnumType`]
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    enum_type: EnumType,
    index: usize,
}

impl EnumValue {
    pub fn enum_type(&self) -> &EnumType {
        &self.enum_type
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.enum_type.members()[self.index]
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configuration value, either raw input or the result of a coercion
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    Bool(bool),
    Float32(f32),
    Float64(f64),
    Text(String),
    Secret(Password),
    Enum(EnumValue),
    Duration(Duration),
    MemorySize(MemorySize),
    Map(BTreeMap<String, String>),
    List(Vec<Value>),
}

impl Value {
    /// Short name of the variant, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int32(_) => "int",
            Self::Int64(_) => "long",
            Self::Bool(_) => "bool",
            Self::Float32(_) => "float",
            Self::Float64(_) => "double",
            Self::Text(_) => "string",
            Self::Secret(_) => "password",
            Self::Enum(_) => "enum",
            Self::Duration(_) => "duration",
            Self::MemorySize(_) => "memory",
            Self::Map(_) => "map",
            Self::List(_) => "list",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Diagnostic form. Secrets are masked, lists and maps use a bracketed
/// layout. Use the canonical renderer to produce persistable text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{}", v),
            Self::Float64(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
            Self::Secret(v) => write!(f, "{}", v),
            Self::Enum(v) => write!(f, "{}", v),
            Self::Duration(v) => f.write_str(&format_with_highest_unit(*v)),
            Self::MemorySize(v) => write!(f, "{}", v),
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                f.write_str("}")
            }
            Self::List(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! impl_from_for_value {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_value! {
    i32 => Int32,
    i64 => Int64,
    bool => Bool,
    f32 => Float32,
    f64 => Float64,
    String => Text,
    Password => Secret,
    EnumValue => Enum,
    Duration => Duration,
    MemorySize => MemorySize,
    BTreeMap<String, String> => Map,
    Vec<Value> => List,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delete_behavior() -> EnumType {
        EnumType::new("DeleteBehavior", &["ALLOW", "IGNORE", "DISABLE"])
    }

    #[test]
    fn test_enum_lookup_ignores_case() {
        let enum_type = delete_behavior();
        let value = enum_type.lookup("ignore").unwrap();
        assert_eq!(value.name(), "IGNORE");
        assert_eq!(value.index(), 1);
        assert!(enum_type.lookup("drop").is_none());
        assert!(enum_type.value(3).is_none());
    }

    #[test]
    fn test_enum_type_equality() {
        assert_eq!(delete_behavior(), delete_behavior());
        assert_ne!(
            delete_behavior(),
            EnumType::new("DeleteBehavior", &["ALLOW", "IGNORE"])
        );
    }

    #[test]
    fn test_type_tag_from_str() {
        assert_eq!("int".parse::<TypeTag>().unwrap(), TypeTag::Int32);
        assert_eq!("Long".parse::<TypeTag>().unwrap(), TypeTag::Int64);
        assert_eq!(
            "list<duration>".parse::<TypeTag>().unwrap(),
            TypeTag::list_of(TypeTag::Duration)
        );
        assert_eq!(
            "list<list<int>>".parse::<TypeTag>().unwrap(),
            TypeTag::list_of(TypeTag::list_of(TypeTag::Int32))
        );

        let tag: TypeTag = "enum(Full | Incremental)".parse().unwrap();
        match &tag {
            TypeTag::Enum(enum_type) => assert_eq!(enum_type.members(), ["Full", "Incremental"]),
            other => panic!("unexpected tag {:?}", other),
        }
        assert_eq!(tag.to_string(), "enum(Full|Incremental)");

        assert!("uuid".parse::<TypeTag>().unwrap_err().is_unsupported());
        assert!("enum()".parse::<TypeTag>().unwrap_err().is_unsupported());
    }

    #[test]
    fn test_type_tag_display_round_trips() {
        for tag in [
            TypeTag::Int32,
            TypeTag::Float64,
            TypeTag::Secret,
            TypeTag::MemorySize,
            TypeTag::MapOfText,
            TypeTag::list_of(TypeTag::Bool),
        ] {
            assert_eq!(tag.to_string().parse::<TypeTag>().unwrap(), tag);
        }
    }

    #[test]
    fn test_sensitive_tags() {
        assert!(TypeTag::Secret.is_sensitive());
        assert!(TypeTag::list_of(TypeTag::Secret).is_sensitive());
        assert!(!TypeTag::Text.is_sensitive());
    }

    #[test]
    fn test_value_display_masks_secrets() {
        let value = Value::List(vec![
            Value::from("user"),
            Value::Secret(Password::new("hunter2")),
        ]);
        assert_eq!(value.to_string(), "[user, ******]");
    }
}
