//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The resolved bplist object model.
//!
//! The bplist format version 00 supports the following object kinds:
//!
//! 1. Null and Boolean.
//! 2. Integers, up to 64 bits long.
//! 3. Real, single- and double-precision.
//! 4. Data.
//! 5. Date.
//! 6. String, ASCII and UTF-16.
//! 7. Array and Set.
//! 8. Dictionary.
//!
//! Objects in a document refer to each other by index, so one object may be
//! referenced from many places and a container may even contain itself.
//! Decoding materializes each object exactly once as an `Rc<Object>` and hands
//! out `Value` handles to it. A handle to an object which is still being
//! resolved when it is referenced (one of its own ancestors) is a *back
//! reference* and holds a `Weak` pointer, so cyclic documents are not leaked.
//!
//! # References
//!
//! 1. https://github.com/opensource-apple/CF/blob/master/ForFoundationOnly.h
//! 2. https://opensource.apple.com/source/CF/CF-855.17/CFBinaryPList.c

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;

use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

mod de;

pub use self::de::from_value;

/// Seconds between the Unix epoch and the Core Data epoch.
const CORE_DATA_EPOCH_UNIX_TIME: f64 = 978_307_200.0;

/// A date structure roughly equivalent to an `NSDate`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Date {
    /// A double-precision 64-bit offset, in seconds, from the Core Data Epoch.
    /// This is defined as 1 January 2001, 00:00:00 UTC.
    pub absolute_time: OrderedFloat<f64>,
}

impl Date {

    /// Returns a date the given number of seconds after the Core Data Epoch.
    pub fn from_absolute_time(absolute_time: f64) -> Self {
        Date { absolute_time: OrderedFloat(absolute_time) }
    }

    /// The Core Data Epoch plus the absolute time offset, or `None` when the
    /// offset is not finite or falls outside of the range `chrono` supports.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let unix_time = self.absolute_time.into_inner() + CORE_DATA_EPOCH_UNIX_TIME;
        if !unix_time.is_finite() {
            return None;
        }
        let seconds = unix_time.floor();
        let nanoseconds = ((unix_time - seconds) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::<Utc>::from_timestamp(seconds as i64, nanoseconds)
    }

}

/// A map of keys to values roughly equivalent to an `NSDictionary`.
///
/// The dictionary is backed by a `BTreeMap` meaning that entries have a defined order
/// however that is not necessarily going to be the order in which they are
/// encountered during parsing.
pub type Dictionary = BTreeMap<Key, Value>;

/// A resolved bplist object.
#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    /// Represents the bplist null singleton.
    Null,

    /// Represents a bplist boolean, like `NSNumber`.
    Boolean(bool),

    /// Represents a bplist integral value of up to 64 bits, like `NSNumber`.
    Integer(i64),

    /// Represents a bplist floating-point value, like `NSNumber`.
    ///
    /// Single-precision values are widened to double precision.
    Real(OrderedFloat<f64>),

    /// Represents a bplist date, like `NSDate`.
    Date(Date),

    /// Represents a bplist data instance, like `NSData`.
    Data(Rc<[u8]>),

    /// Represents a bplist string, like `NSString`, from either string encoding.
    String(Rc<str>),

    /// Represents a bplist array of objects, like `NSArray<id>`.
    Array(Vec<Value>),

    /// Represents a bplist set of objects, like `NSSet<id>`.
    ///
    /// Elements keep the order in which they were encoded. Uniqueness is not checked.
    Set(Vec<Value>),

    /// Represents a bplist dictionary, like `NSDictionary<id,id>`.
    Dictionary(Dictionary),
}

impl Object {

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(value) => Some(value.into_inner()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::String(value) => Some(&**value),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            Object::Data(value) => Some(&**value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self {
            Object::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// The elements of an array or set.
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Object::Array(elements) | Object::Set(elements) => Some(elements.as_slice()),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(dictionary) => Some(dictionary),
            _ => None,
        }
    }

    /// Looks up a string key if the object is a dictionary.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dictionary()?.get(&Key::from(key))
    }

    /// Whether the object is an array, set or dictionary.
    pub fn is_container(&self) -> bool {
        matches!(self, Object::Array(_) | Object::Set(_) | Object::Dictionary(_))
    }

}

/// A dictionary key: any object other than a container.
///
/// Data and string keys share their payload with the key object, so one
/// object used as the key of many dictionaries is stored once.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Key {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(OrderedFloat<f64>),
    Date(Date),
    Data(Rc<[u8]>),
    String(Rc<str>),
}

impl Key {

    /// Converts a scalar object into a key. Containers cannot be keys.
    pub fn from_object(object: &Object) -> Option<Key> {
        let key = match object {
            Object::Null => Key::Null,
            Object::Boolean(value) => Key::Boolean(*value),
            Object::Integer(value) => Key::Integer(*value),
            Object::Real(value) => Key::Real(*value),
            Object::Date(value) => Key::Date(*value),
            Object::Data(value) => Key::Data(Rc::clone(value)),
            Object::String(value) => Key::String(Rc::clone(value)),
            Object::Array(_) | Object::Set(_) | Object::Dictionary(_) => return None,
        };
        Some(key)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(value) => Some(&**value),
            _ => None,
        }
    }

}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::String(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::String(Rc::from(value))
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Integer(value)
    }
}

#[derive(Clone, Debug)]
enum Link {
    /// The object was fully resolved when referenced.
    Shared(Rc<Object>),
    /// The object was an ancestor of the reference site.
    Back(Weak<Object>),
}

/// A handle to a resolved object within a decoded document.
///
/// Cloning a value is cheap and yields another handle to the same object.
/// Every reference to an object index within one document yields a handle to
/// the same allocation, see `same_object`.
#[derive(Clone, Debug)]
pub struct Value {
    index: usize,
    link: Link,
}

impl Value {

    pub(crate) fn shared(index: usize, object: Rc<Object>) -> Self {
        Value { index, link: Link::Shared(object) }
    }

    pub(crate) fn back(index: usize, object: Weak<Object>) -> Self {
        Value { index, link: Link::Back(object) }
    }

    /// The index of the object in the document's offset table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this handle refers to one of its own ancestors.
    pub fn is_back_reference(&self) -> bool {
        matches!(self.link, Link::Back(_))
    }

    /// Borrows the object, unless this is a back reference.
    pub fn as_object(&self) -> Option<&Object> {
        match &self.link {
            Link::Shared(object) => Some(&**object),
            Link::Back(_) => None,
        }
    }

    /// Returns the object. A back reference yields `None` once the
    /// containers holding it have all been dropped.
    pub fn object(&self) -> Option<Rc<Object>> {
        match &self.link {
            Link::Shared(object) => Some(Rc::clone(object)),
            Link::Back(object) => object.upgrade(),
        }
    }

    /// Whether both handles refer to the same decoded object.
    pub fn same_object(&self, other: &Value) -> bool {
        self.as_ptr() == other.as_ptr()
    }

    fn as_ptr(&self) -> *const Object {
        match &self.link {
            Link::Shared(object) => Rc::as_ptr(object),
            Link::Back(object) => object.as_ptr(),
        }
    }

}

/// Values compare structurally. Back references are compared by index
/// rather than followed, which keeps the comparison finite on cyclic documents.
///
/// Handles to the same allocation compare equal without descending. Values
/// from separate decodes never share allocations, so a shared object is
/// compared once per path leading to it. For a document that nests shared
/// containers, that is exponential in the nesting depth. Compare such
/// documents within one decode, or by `index` and `same_object`.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (&self.link, &other.link) {
            (Link::Shared(lhs), Link::Shared(rhs)) =>
                Rc::ptr_eq(lhs, rhs) || lhs == rhs,
            (Link::Back(_), Link::Back(_)) =>
                self.index == other.index,
            _ =>
                false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_epoch() {
        let date = Date::from_absolute_time(0.0).to_utc().unwrap();
        assert_eq!(date.to_rfc3339(), "2001-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_date_fractional_and_negative() {
        let date = Date::from_absolute_time(-1.5).to_utc().unwrap();
        assert_eq!(date.to_rfc3339(), "2000-12-31T23:59:58.500+00:00");
    }

    #[test]
    fn test_date_not_finite() {
        assert_eq!(Date::from_absolute_time(f64::NAN).to_utc(), None);
        assert_eq!(Date::from_absolute_time(f64::INFINITY).to_utc(), None);
    }

    #[test]
    fn test_key_from_object() {
        assert_eq!(Key::from_object(&Object::String("k".into())), Some(Key::from("k")));
        assert_eq!(Key::from_object(&Object::Integer(3)), Some(Key::Integer(3)));
        assert_eq!(Key::from_object(&Object::Array(vec![])), None);
        assert_eq!(Key::from_object(&Object::Dictionary(Dictionary::new())), None);
    }

    #[test]
    fn test_value_identity() {
        let object = Rc::new(Object::Integer(1));
        let first = Value::shared(3, Rc::clone(&object));
        let second = Value::shared(3, Rc::clone(&object));
        let copy = Value::shared(4, Rc::new(Object::Integer(1)));
        assert!(first.same_object(&second));
        assert!(!first.same_object(&copy));
        assert_eq!(first, copy);
    }

    #[test]
    fn test_back_reference() {
        let object = Rc::new(Object::Null);
        let back = Value::back(0, Rc::downgrade(&object));
        assert!(back.is_back_reference());
        assert_eq!(back.as_object(), None);
        assert_eq!(back.object(), Some(Rc::clone(&object)));
        assert!(back.same_object(&Value::shared(0, Rc::clone(&object))));
        drop(object);
        assert_eq!(back.object(), None);
    }
}
