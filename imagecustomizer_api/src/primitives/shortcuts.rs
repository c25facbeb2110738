//! Deserializers for fields that accept either a full object or a scalar
//! shorthand, e.g. `mountPoint: /home` in place of `mountPoint: {path: /home}`.

use std::{fmt::Display, marker::PhantomData, str::FromStr};

use serde::{
    de::{self, MapAccess, Visitor},
    Deserialize, Deserializer,
};

struct StringOrStruct<T>(PhantomData<fn() -> T>);

impl<'de, T> Visitor<'de> for StringOrStruct<T>
where
    T: Deserialize<'de> + FromStr,
    <T as FromStr>::Err: Display,
{
    type Value = T;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("string or map")
    }

    fn visit_str<E>(self, value: &str) -> Result<T, E>
    where
        E: de::Error,
    {
        T::from_str(value).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_map<M>(self, map: M) -> Result<T, M::Error>
    where
        M: MapAccess<'de>,
    {
        Deserialize::deserialize(de::value::MapAccessDeserializer::new(map))
    }
}

struct OptStringOrStruct<T>(PhantomData<fn() -> T>);

impl<'de, T> Visitor<'de> for OptStringOrStruct<T>
where
    T: Deserialize<'de> + FromStr,
    <T as FromStr>::Err: Display,
{
    type Value = Option<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("null, string, or map")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer
            .deserialize_any(StringOrStruct(PhantomData))
            .map(Some)
    }
}

/// Deserializes an optional field that is either a map or a string parsed
/// through `FromStr`.
pub(crate) fn opt_string_or_struct<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de> + FromStr,
    <T as FromStr>::Err: Display,
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(OptStringOrStruct(PhantomData))
}

#[cfg(feature = "schemars")]
pub(crate) fn opt_string_or_struct_schema<T>(
    generator: &mut schemars::gen::SchemaGenerator,
) -> schemars::schema::Schema
where
    T: schemars::JsonSchema,
{
    use schemars::schema::{SchemaObject, SubschemaValidation};

    let mut schema = SchemaObject {
        subschemas: Some(Box::new(SubschemaValidation {
            one_of: Some(vec![
                generator.subschema_for::<T>(),
                generator.subschema_for::<String>(),
                generator.subschema_for::<()>(),
            ]),
            ..Default::default()
        })),
        ..Default::default()
    };

    if generator.settings().option_nullable {
        schema
            .extensions
            .insert("nullable".to_string(), serde_json::Value::Bool(true));
    };

    schema.into()
}
