//! Key bookkeeping that typed fields cannot carry on their own.
//!
//! An `Option<T>` field reads an explicit `null` and a missing key the same
//! way, and a `#[serde(default)]` collection is written even when the source
//! never had it. [`Presence`] remembers both so a document saves back with
//! the keys it was loaded with.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    nulls: Vec<String>,
    absent: Vec<&'static str>,
}

impl Presence {
    /// Takes every `null`-valued key out of `map` and notes which of the
    /// `defaulted` keys are missing.
    pub fn split(map: &mut Map<String, Value>, defaulted: &[&'static str]) -> Self {
        let nulls: Vec<String> = map
            .iter()
            .filter(|(_, v)| v.is_null())
            .map(|(k, _)| k.clone())
            .collect();
        for key in &nulls {
            map.remove(key);
        }
        let absent = defaulted
            .iter()
            .copied()
            .filter(|key| !map.contains_key(*key))
            .collect();
        Self { nulls, absent }
    }

    pub fn is_empty(&self) -> bool {
        self.nulls.is_empty() && self.absent.is_empty()
    }

    /// Whether `key` was an explicit `null` in the source.
    pub fn was_null(&self, key: &str) -> bool {
        self.nulls.iter().any(|k| k == key)
    }

    /// Puts the recorded keys back into a serialized map. A null is only
    /// restored where nothing has been written since; a defaulted key is only
    /// dropped while it still holds an empty collection.
    pub fn restore(&self, map: &mut Map<String, Value>) {
        for key in &self.absent {
            let empty = match map.get(*key) {
                Some(Value::Array(items)) => items.is_empty(),
                Some(Value::Object(fields)) => fields.is_empty(),
                _ => false,
            };
            if empty {
                map.remove(*key);
            }
        }
        for key in &self.nulls {
            if !map.contains_key(key) {
                map.insert(key.clone(), Value::Null);
            }
        }
    }

    /// Takes over the explicit nulls of `other` that this ledger lacks.
    pub fn absorb(&mut self, other: Presence) {
        for key in other.nulls {
            if !self.was_null(&key) {
                self.nulls.push(key);
            }
        }
    }
}

/// Implements `Serialize`/`Deserialize` for a `#[serde(remote = "Self")]`
/// struct with a `presence: Presence` field, routing both through the
/// generated inherent functions.
macro_rules! keep_presence {
    ( $ty:ty $(, defaulted = [ $( $key:literal ),* $(,)? ] )? ) => {
        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                use serde::de::Error as _;
                let mut map = <serde_json::Map<String, serde_json::Value> as serde::Deserialize>::deserialize(deserializer)?;
                let presence = $crate::model::presence::Presence::split(&mut map, &[ $( $( $key ),* )? ]);
                let mut this = <$ty>::deserialize(serde_json::Value::Object(map)).map_err(D::Error::custom)?;
                this.presence = presence;
                Ok(this)
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                struct Plain<'a>(&'a $ty);

                impl serde::Serialize for Plain<'_> {
                    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                    where
                        S: serde::Serializer,
                    {
                        <$ty>::serialize(self.0, serializer)
                    }
                }

                if self.presence.is_empty() {
                    return <$ty>::serialize(self, serializer);
                }
                use serde::ser::Error as _;
                let mut value = serde_json::to_value(Plain(self)).map_err(S::Error::custom)?;
                if let serde_json::Value::Object(map) = &mut value {
                    self.presence.restore(map);
                }
                serde::Serialize::serialize(&value, serializer)
            }
        }
    };
}

pub(crate) use keep_presence;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn split_then_restore_is_lossless() {
        let raw = object(json!({"a": null, "b": 1, "c": null, "items": null}));
        let mut map = raw.clone();
        let presence = Presence::split(&mut map, &["list", "b", "items"]);
        assert_eq!(map, object(json!({"b": 1})));
        assert!(presence.was_null("a"));

        // What a typed struct writes for its defaulted collections.
        map.insert("list".into(), json!([]));
        map.insert("items".into(), json!([]));
        presence.restore(&mut map);
        assert_eq!(Value::Object(map), Value::Object(raw));
    }

    #[test]
    fn written_values_win_over_recorded_keys() {
        let mut map = object(json!({"a": null}));
        let presence = Presence::split(&mut map, &["list"]);
        map.insert("a".into(), json!(true));
        map.insert("list".into(), json!([1]));
        presence.restore(&mut map);
        assert_eq!(Value::Object(map), json!({"a": true, "list": [1]}));
    }
}
