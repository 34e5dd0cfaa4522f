//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Resolution of object references into a graph of values.
//!
//! Objects are resolved depth-first from the root. Each index is resolved at
//! most once. A container is registered as in progress before any of its
//! elements are resolved, so a reference back to it from within its own
//! subtree yields a back reference instead of recursing.

use tracing::warn;
use ordered_float::OrderedFloat;

use std::rc::{Rc, Weak};

use crate::de::Decoder;
use crate::document::RawObject;
use crate::error::{Error, Result};
use crate::object::{Date, Dictionary, Key, Object, Value};

/// Resolution state of a single object index.
#[derive(Clone, Debug)]
enum State {
    /// The container is an ancestor of the object currently being resolved.
    InProgress(Weak<Object>),
    /// The object and everything it refers to has been resolved.
    Resolved(Rc<Object>),
}

/// Resolves the objects of a single document. Discarded after use.
pub struct Resolver<'d, 'a> {
    decoder: &'d Decoder<'a>,
    states: Vec<Option<State>>,
}

impl<'d, 'a> Resolver<'d, 'a> {

    pub fn new(decoder: &'d Decoder<'a>) -> Self {
        Resolver {
            decoder,
            states: vec![None; decoder.object_count()],
        }
    }

    /// Resolves the root object and, transitively, everything it refers to.
    pub fn resolve_root(mut self) -> Result<Value> {
        let root = self.decoder.trailer().root_object;
        self.resolve(root, 0)
    }

    /// Resolves a reference found in the container `index` at the given depth.
    fn resolve_reference(&mut self, index: usize, reference: usize, depth: usize) -> Result<Value> {
        if reference >= self.states.len() {
            return Err(Error::DanglingReference { index, reference });
        }
        self.resolve(reference, depth + 1)
    }

    fn resolve(&mut self, index: usize, depth: usize) -> Result<Value> {
        match &self.states[index] {
            Some(State::Resolved(object)) =>
                return Ok(Value::shared(index, Rc::clone(object))),
            Some(State::InProgress(object)) =>
                return Ok(Value::back(index, Weak::clone(object))),
            None => {}
        }

        let limit = self.decoder.options().max_depth;
        if depth > limit {
            return Err(Error::TooDeep { index, limit });
        }

        let object = match self.decoder.raw_object(index)? {
            RawObject::Null => Rc::new(Object::Null),
            RawObject::Boolean(value) => Rc::new(Object::Boolean(value)),
            RawObject::Integer(value) => Rc::new(Object::Integer(value)),
            RawObject::Real(value) => Rc::new(Object::Real(OrderedFloat(value))),
            RawObject::Date(value) => Rc::new(Object::Date(Date::from_absolute_time(value))),
            RawObject::Data(value) => Rc::new(Object::Data(Rc::from(value))),
            RawObject::AsciiString(value) => Rc::new(Object::String(Rc::from(value))),
            RawObject::Utf16String(value) => Rc::new(Object::String(Rc::from(value))),
            RawObject::Array(references) => self.resolve_container(index, |resolver| {
                Ok(Object::Array(resolver.resolve_elements(index, &references, depth)?))
            })?,
            RawObject::Set(references) => self.resolve_container(index, |resolver| {
                Ok(Object::Set(resolver.resolve_elements(index, &references, depth)?))
            })?,
            RawObject::Dictionary(pairs) => self.resolve_container(index, |resolver| {
                Ok(Object::Dictionary(resolver.resolve_entries(index, &pairs, depth)?))
            })?,
        };

        self.states[index] = Some(State::Resolved(Rc::clone(&object)));
        Ok(Value::shared(index, object))
    }

    /// Allocates a container, marking it in progress while `build` resolves its contents.
    fn resolve_container<F>(&mut self, index: usize, build: F) -> Result<Rc<Object>>
    where
        F: FnOnce(&mut Self) -> Result<Object>,
    {
        let mut failure = None;
        let object = Rc::new_cyclic(|object| {
            self.states[index] = Some(State::InProgress(Weak::clone(object)));
            build(&mut *self).unwrap_or_else(|error| {
                failure = Some(error);
                Object::Null
            })
        });
        match failure {
            Some(error) => Err(error),
            None => Ok(object),
        }
    }

    fn resolve_elements(&mut self, index: usize, references: &[usize], depth: usize) -> Result<Vec<Value>> {
        references
            .iter()
            .map(|&reference| self.resolve_reference(index, reference, depth))
            .collect()
    }

    fn resolve_entries(&mut self, index: usize, pairs: &[(usize, usize)], depth: usize) -> Result<Dictionary> {
        let mut dictionary = Dictionary::new();
        for &(key_reference, value_reference) in pairs {
            let key = self.resolve_reference(index, key_reference, depth)?;
            let key = key
                .as_object()
                .and_then(Key::from_object)
                .ok_or(Error::UnhashableKey { index: key_reference })?;
            let value = self.resolve_reference(index, value_reference, depth)?;
            if let Some(previous) = dictionary.insert(key, value) {
                warn!(
                    "dictionary {} has a duplicate key, object {} replaced by object {}",
                    index,
                    previous.index(),
                    value_reference,
                );
            }
        }
        Ok(dictionary)
    }

}
