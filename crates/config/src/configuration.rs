//! Raw-text configuration store with typed accessors

use crate::{convert::coerce, properties::Properties, render::render};
use std::{collections::BTreeMap, fmt, time::Duration};
use types::{
    ConfigError, ConversionError, EnumType, MemorySize, Password, Result, TypeTag, Value,
};

/// Rust types that can be read from and written to a [`Configuration`]
pub trait ConfigType: Sized {
    /// Tag the stored text is coerced to
    fn type_tag() -> TypeTag;

    fn into_value(self) -> Value;

    /// Extract from a value produced by coercing to [`ConfigType::type_tag`]
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_config_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ConfigType for $ty {
                fn type_tag() -> TypeTag {
                    TypeTag::$variant
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_config_type! {
    i32 => Int32,
    i64 => Int64,
    bool => Bool,
    f32 => Float32,
    f64 => Float64,
    String => Text,
    Password => Secret,
    Duration => Duration,
    MemorySize => MemorySize,
}

impl ConfigType for BTreeMap<String, String> {
    fn type_tag() -> TypeTag {
        TypeTag::MapOfText
    }

    fn into_value(self) -> Value {
        Value::Map(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl<T: ConfigType> ConfigType for Vec<T> {
    fn type_tag() -> TypeTag {
        TypeTag::list_of(T::type_tag())
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

/// Plain Rust enums stored by member name.
///
/// Implementors register their [`EnumType`] once, usually in a `OnceLock`,
/// with members listed in the same order as [`ConfigEnum::variants`].
pub trait ConfigEnum: Sized + Copy + PartialEq + 'static {
    fn enum_type() -> &'static EnumType;

    fn variants() -> &'static [Self];
}

/// Flat key/value configuration holding raw text.
///
/// Typed reads coerce the stored text on every call; nothing is cached.
/// Mutation needs external synchronisation when shared between threads.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    data: BTreeMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Raw text stored under `key`
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.data.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read `key` as a value of type `tag`
    pub fn get_value(&self, key: &str, tag: &TypeTag) -> Result<Option<Value>> {
        let Some(raw) = self.data.get(key) else {
            return Ok(None);
        };

        coerce(Value::Text(raw.clone()), tag)
            .map(Some)
            .map_err(|source| ConfigError::Conversion {
                key: key.to_string(),
                source,
            })
    }

    /// Store `value` in its canonical text form
    pub fn set_value(&mut self, key: impl Into<String>, value: &Value) {
        self.data.insert(key.into(), render(value));
    }

    /// Read `key` as `T`
    pub fn get<T: ConfigType>(&self, key: &str) -> Result<Option<T>> {
        let tag = T::type_tag();
        match self.get_value(key, &tag)? {
            None => Ok(None),
            Some(value) => T::from_value(value)
                .map(Some)
                .ok_or_else(|| unsupported(key, &tag)),
        }
    }

    /// Read `key` as `T`, falling back to `default` when the key is absent
    pub fn get_or<T: ConfigType>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    pub fn set<T: ConfigType>(&mut self, key: impl Into<String>, value: T) {
        self.set_value(key, &value.into_value());
    }

    /// Read `key` as a member of the enum `E`.
    ///
    /// Fails when the stored member has no matching entry in
    /// [`ConfigEnum::variants`].
    pub fn get_enum<E: ConfigEnum>(&self, key: &str) -> Result<Option<E>> {
        let tag = TypeTag::Enum(E::enum_type().clone());
        let Some(value) = self.get_value(key, &tag)? else {
            return Ok(None);
        };

        match value {
            Value::Enum(member) => E::variants()
                .get(member.index())
                .copied()
                .map(Some)
                .ok_or_else(|| unsupported(key, &tag)),
            _ => Err(unsupported(key, &tag)),
        }
    }

    /// Store `variant` by its member name.
    ///
    /// Fails without touching the store when `variant` is not registered in
    /// both [`ConfigEnum::variants`] and [`ConfigEnum::enum_type`].
    pub fn set_enum<E: ConfigEnum>(&mut self, key: impl Into<String>, variant: E) -> Result<()> {
        let key = key.into();
        let member = E::variants()
            .iter()
            .position(|candidate| *candidate == variant)
            .and_then(|index| E::enum_type().value(index))
            .ok_or_else(|| unsupported(&key, &TypeTag::Enum(E::enum_type().clone())))?;
        self.set_value(key, &Value::Enum(member));
        Ok(())
    }

    /// Copy all entries of `other` into this store, overwriting existing keys
    pub fn add_all(&mut self, other: &Configuration) {
        self.data
            .extend(other.data.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn to_properties(&self) -> Properties {
        self.iter().collect()
    }
}

fn unsupported(key: &str, tag: &TypeTag) -> ConfigError {
    ConfigError::Conversion {
        key: key.to_string(),
        source: ConversionError::UnsupportedType {
            tag: tag.to_string(),
        },
    }
}

/// Only keys are printed; stored text may contain secrets.
impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum CleanupPolicy {
        Delete,
        Compact,
    }

    impl ConfigEnum for CleanupPolicy {
        fn enum_type() -> &'static EnumType {
            static TYPE: OnceLock<EnumType> = OnceLock::new();
            TYPE.get_or_init(|| EnumType::new("CleanupPolicy", &["DELETE", "COMPACT"]))
        }

        fn variants() -> &'static [Self] {
            &[CleanupPolicy::Delete, CleanupPolicy::Compact]
        }
    }

    /// Registers three members but only maps two of them to variants
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Level {
        Low,
        High,
        Unmapped,
    }

    impl ConfigEnum for Level {
        fn enum_type() -> &'static EnumType {
            static TYPE: OnceLock<EnumType> = OnceLock::new();
            TYPE.get_or_init(|| EnumType::new("Level", &["LOW", "HIGH", "EXTREME"]))
        }

        fn variants() -> &'static [Self] {
            &[Level::Low, Level::High]
        }
    }

    #[test]
    fn test_typed_get_and_set() {
        let mut config = Configuration::new();
        config.set("server.port", 8080i32);
        config.set("log.retention", Duration::from_secs(7 * 86_400));
        config.set("buffer.size", MemorySize::from_mebibytes(32));
        config.set("bootstrap.servers", vec!["a:9092".to_string(), "b:9092".to_string()]);

        assert_eq!(config.get_raw("server.port"), Some("8080"));
        assert_eq!(config.get_raw("log.retention"), Some("7 d"));
        assert_eq!(config.get_raw("bootstrap.servers"), Some("a:9092,b:9092"));

        assert_eq!(config.get::<i32>("server.port").unwrap(), Some(8080));
        assert_eq!(config.get::<i64>("server.port").unwrap(), Some(8080));
        assert_eq!(
            config.get::<Duration>("log.retention").unwrap(),
            Some(Duration::from_secs(604_800))
        );
        assert_eq!(
            config.get::<MemorySize>("buffer.size").unwrap(),
            Some(MemorySize::from_mebibytes(32))
        );
        assert_eq!(
            config.get::<Vec<String>>("bootstrap.servers").unwrap(),
            Some(vec!["a:9092".to_string(), "b:9092".to_string()])
        );
    }

    #[test]
    fn test_missing_key() {
        let config = Configuration::new();
        assert_eq!(config.get::<bool>("absent").unwrap(), None);
        assert!(config.get_or("absent", true).unwrap());
    }

    #[test]
    fn test_conversion_error_names_key() {
        let mut config = Configuration::new();
        config.set_string("client.retries", "many");
        let err = config.get::<i32>("client.retries").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Conversion { ref key, ref source } if key == "client.retries" && source.is_parse()
        ));
    }

    #[test]
    fn test_reads_are_not_cached() {
        let mut config = Configuration::new();
        config.set_string("threads", "4");
        assert_eq!(config.get::<i32>("threads").unwrap(), Some(4));
        config.set_string("threads", "8");
        assert_eq!(config.get::<i32>("threads").unwrap(), Some(8));
    }

    #[test]
    fn test_enum_access() {
        let mut config = Configuration::new();
        config.set_string("cleanup.policy", "compact");
        assert_eq!(
            config.get_enum::<CleanupPolicy>("cleanup.policy").unwrap(),
            Some(CleanupPolicy::Compact)
        );

        config.set_enum("cleanup.policy", CleanupPolicy::Delete).unwrap();
        assert_eq!(config.get_raw("cleanup.policy"), Some("DELETE"));

        config.set_string("cleanup.policy", "archive");
        assert!(config.get_enum::<CleanupPolicy>("cleanup.policy").is_err());
    }

    #[test]
    fn test_enum_without_variant_is_an_error() {
        let mut config = Configuration::new();
        config.set_string("level", "extreme");
        let err = config.get_enum::<Level>("level").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Conversion { ref key, ref source } if key == "level" && source.is_unsupported()
        ));

        config.set_string("level", "high");
        assert_eq!(config.get_enum::<Level>("level").unwrap(), Some(Level::High));
    }

    #[test]
    fn test_set_enum_rejects_unregistered_variant() {
        let mut config = Configuration::new();
        assert!(config.set_enum("level", Level::Unmapped).is_err());
        assert!(!config.contains_key("level"));

        config.set_enum("level", Level::Low).unwrap();
        assert_eq!(config.get_raw("level"), Some("LOW"));
    }

    #[test]
    fn test_secret_is_not_debug_printed() {
        let mut config = Configuration::new();
        config.set("db.password", Password::new("hunter2"));
        assert_eq!(config.get_raw("db.password"), Some("hunter2"));
        assert_eq!(
            config.get::<Password>("db.password").unwrap(),
            Some(Password::new("hunter2"))
        );
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_add_all_and_remove() {
        let mut base = Configuration::new();
        base.set_string("a", "1");
        base.set_string("b", "2");
        let mut overrides = Configuration::new();
        overrides.set_string("b", "3");

        base.add_all(&overrides);
        assert_eq!(base.get_raw("b"), Some("3"));
        assert_eq!(base.remove("a"), Some("1".to_string()));
        assert_eq!(base.keys().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(base.len(), 1);
    }
}
