//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Deserialization of resolved values into arbitrary serde types.
//!
//! Serde does not provide a Date type. Dates are presented as their absolute
//! time, a double-precision offset in seconds from the Core Data Epoch.
//! A back reference has no finite representation and fails with `CycleDetected`.

use serde::de::{
    self,
    DeserializeOwned,
    DeserializeSeed,
    IntoDeserializer,
    MapAccess,
    SeqAccess,
    Visitor,
};

use std::collections::btree_map;
use std::rc::Rc;
use std::vec;

use crate::error::{Error, Result};
use crate::object::{Dictionary, Key, Object, Value};

/// Deserializes an instance of `T` from a decoded value.
pub fn from_value<T>(value: &Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer { value: value.clone() })
}

struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    /// Returns the object, unless the value is a back reference.
    fn object(&self) -> Result<Rc<Object>> {
        let object = if self.value.is_back_reference() {
            None
        } else {
            self.value.object()
        };
        object.ok_or(Error::CycleDetected { index: self.value.index() })
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let object = self.object()?;
        match &*object {
            Object::Null =>
                visitor.visit_unit(),
            Object::Boolean(value) =>
                visitor.visit_bool(*value),
            Object::Integer(value) =>
                visitor.visit_i64(*value),
            Object::Real(value) =>
                visitor.visit_f64(value.into_inner()),
            Object::Date(value) =>
                visitor.visit_f64(value.absolute_time.into_inner()),
            Object::Data(value) =>
                visitor.visit_bytes(value),
            Object::String(value) =>
                visitor.visit_str(value),
            Object::Array(elements) | Object::Set(elements) =>
                visitor.visit_seq(SeqDeserializer::new(elements.clone())),
            Object::Dictionary(dictionary) =>
                visitor.visit_map(MapDeserializer::new(dictionary.clone())),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match *self.object()? {
            Object::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    /// Unit variants are encoded as their name.
    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let variant = self.object()?.as_str().map(str::to_owned);
        match variant {
            Some(variant) => visitor.visit_enum(variant.into_deserializer()),
            None => self.deserialize_any(visitor),
        }
    }

    serde::forward_to_deserialize_any! {
        bool
        u8 u16 u32 u64 u128
        i8 i16 i32 i64 i128
        f32 f64
        char str string
        seq map
        bytes byte_buf
        struct
        unit unit_struct
        tuple tuple_struct
        ignored_any
        identifier
    }
}

/// Access object to process the elements in an Array or Set.
struct SeqDeserializer {
    elements: vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(elements: Vec<Value>) -> Self {
        SeqDeserializer {
            elements: elements.into_iter(),
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.elements.next() {
            Some(value) => seed.deserialize(ValueDeserializer { value }).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.elements.len())
    }
}

/// Access object used to process the entries in a Dictionary.
struct MapDeserializer {
    entries: btree_map::IntoIter<Key, Value>,
    current_value: Option<Value>,
}

impl MapDeserializer {
    fn new(dictionary: Dictionary) -> Self {
        MapDeserializer {
            entries: dictionary.into_iter(),
            current_value: None,
        }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.entries.next() {
            Some((key, value)) => {
                self.current_value = Some(value);
                seed.deserialize(KeyDeserializer { key }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.current_value.take() {
            Some(value) => seed.deserialize(ValueDeserializer { value }),
            None => Err(de::Error::custom("value requested before key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

struct KeyDeserializer {
    key: Key,
}

impl<'de> de::Deserializer<'de> for KeyDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.key {
            Key::Null => visitor.visit_unit(),
            Key::Boolean(value) => visitor.visit_bool(value),
            Key::Integer(value) => visitor.visit_i64(value),
            Key::Real(value) => visitor.visit_f64(value.into_inner()),
            Key::Date(value) => visitor.visit_f64(value.absolute_time.into_inner()),
            Key::Data(value) => visitor.visit_bytes(&value),
            Key::String(value) => visitor.visit_str(&value),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.key {
            Key::String(variant) => visitor.visit_enum(String::from(&*variant).into_deserializer()),
            key => KeyDeserializer { key }.deserialize_any(visitor),
        }
    }

    serde::forward_to_deserialize_any! {
        bool
        u8 u16 u32 u64 u128
        i8 i16 i32 i64 i128
        f32 f64
        char str string
        seq map
        bytes byte_buf
        struct
        unit unit_struct
        newtype_struct
        tuple tuple_struct
        ignored_any
        identifier
        option
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ordered_float::OrderedFloat;

    use std::collections::BTreeMap;
    use std::rc::Rc;

    fn value(index: usize, object: Object) -> Value {
        Value::shared(index, Rc::new(object))
    }

    #[test]
    fn test_scalars() {
        assert_eq!(from_value::<i64>(&value(0, Object::Integer(-4))).unwrap(), -4);
        assert_eq!(from_value::<u8>(&value(0, Object::Integer(200))).unwrap(), 200);
        assert_eq!(from_value::<f64>(&value(0, Object::Real(OrderedFloat(2.5)))).unwrap(), 2.5);
        assert_eq!(from_value::<bool>(&value(0, Object::Boolean(true))).unwrap(), true);
        assert_eq!(from_value::<String>(&value(0, Object::String("s".into()))).unwrap(), "s");
        assert_eq!(from_value::<Option<i64>>(&value(0, Object::Null)).unwrap(), None);
        assert_eq!(from_value::<Option<i64>>(&value(0, Object::Integer(1))).unwrap(), Some(1));
    }

    #[test]
    fn test_out_of_range_integer() {
        assert!(from_value::<u8>(&value(0, Object::Integer(256))).is_err());
    }

    #[test]
    fn test_sequence_and_map() {
        let array = value(0, Object::Array(vec![
            value(1, Object::Integer(1)),
            value(2, Object::Integer(2)),
        ]));
        assert_eq!(from_value::<Vec<i64>>(&array).unwrap(), vec![1, 2]);

        let mut dictionary = Dictionary::new();
        dictionary.insert(Key::from("a"), value(1, Object::Integer(1)));
        dictionary.insert(Key::from("b"), value(2, Object::Integer(2)));
        let map = from_value::<BTreeMap<String, i64>>(&value(0, Object::Dictionary(dictionary))).unwrap();
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.get("b"), Some(&2));
    }

    #[test]
    fn test_back_reference_is_a_cycle() {
        let target = Rc::new(Object::Null);
        let back = Value::back(7, Rc::downgrade(&target));
        match from_value::<Option<i64>>(&back) {
            Err(Error::CycleDetected { index }) => assert_eq!(index, 7),
            other => panic!("expected cycle, found {:?}", other),
        }
    }
}
