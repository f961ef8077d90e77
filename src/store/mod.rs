mod hash;
mod list;
mod set;

pub use list::Position;

use bytes::Bytes;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error as ThisError;

use crate::frame::Frame;

/// Identifier of a logical database, as given to `SELECT`.
pub type DbIndex = i64;

/// The Store owns every logical database of the server. It is shared and cloned cheaply between
/// connections using reference counting; all access goes through [`Store::lock`], so any
/// sequence of operations performed under one guard is atomic with respect to other connections.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<Databases>>,
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, Databases> {
        // A panicking command cannot leave a keyspace half-written (every mutation completes
        // before the guard is released), so a poisoned lock is still safe to use.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// All logical databases. A database only exists while it holds at least one key.
#[derive(Default)]
pub struct Databases {
    keyspaces: HashMap<DbIndex, Keyspace>,
    empty: Keyspace,
}

impl Databases {
    /// Read access to a database. Databases without keys read as empty.
    pub fn db(&self, index: DbIndex) -> &Keyspace {
        self.keyspaces.get(&index).unwrap_or(&self.empty)
    }

    /// Runs `f` with write access to a database, creating it if needed. A database `f` leaves
    /// without keys is dropped.
    pub fn write<R, F>(&mut self, index: DbIndex, f: F) -> R
    where
        F: FnOnce(&mut Keyspace) -> R,
    {
        let keyspace = self.keyspaces.entry(index).or_default();
        let res = f(keyspace);

        if keyspace.size() == 0 {
            self.keyspaces.remove(&index);
        }

        res
    }

    /// Swaps the content of two databases. Sessions keep their selected index, so they observe
    /// the other database's data from now on.
    pub fn swap(&mut self, a: DbIndex, b: DbIndex) {
        if a == b {
            return;
        }

        let first = self.keyspaces.remove(&a);
        let second = self.keyspaces.remove(&b);
        if let Some(keyspace) = second {
            self.keyspaces.insert(a, keyspace);
        }
        if let Some(keyspace) = first {
            self.keyspaces.insert(b, keyspace);
        }
    }

    /// Number of databases holding keys.
    pub fn len(&self) -> usize {
        self.keyspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyspaces.is_empty()
    }
}

/// A value stored under a key. The variant name doubles as the name reported by `TYPE`.
#[derive(Debug, Clone, PartialEq, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
    Hash(HashMap<Bytes, Bytes>),
    Set(HashSet<Bytes>),
}

#[derive(Debug, ThisError, PartialEq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR hash value is not an integer")]
    NotInteger,
    #[error("ERR hash value is not a float")]
    NotFloat,
    #[error("ERR increment or decrement would overflow")]
    Overflow,
    #[error("ERR increment would produce NaN or Infinity")]
    NonFinite,
    #[error("ERR index out of range")]
    OutOfRange,
    #[error("ERR no such key")]
    NoSuchKey,
}

impl From<StoreError> for Frame {
    fn from(err: StoreError) -> Frame {
        Frame::Error(err.to_string())
    }
}

/// One namespace of key to value bindings.
///
/// Invariant: a key never maps to an empty collection. Collections are created on the first
/// write and removed as soon as a write leaves them empty.
#[derive(Debug, Default)]
pub struct Keyspace {
    entries: HashMap<String, Value>,
}

impl Keyspace {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Reads a string value. Absent keys are `None`; other types are a type error.
    pub fn get_string(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::String(data)) => Ok(Some(data.clone())),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Binds `key` to a string, replacing whatever value it held before.
    pub fn set_string(&mut self, key: String, data: Bytes) {
        self.entries.insert(key, Value::String(data));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the name of the type stored at `key`, if any.
    pub fn type_of(&self, key: &str) -> Option<&'static str> {
        self.entries.get(key).map(<&'static str>::from)
    }

    /// Borrows the collection of type `T` stored at `key`.
    fn read<T: Collection>(&self, key: &str) -> Result<Option<&T>, StoreError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => T::from_value(value).map(Some).ok_or(StoreError::WrongType),
        }
    }

    /// Runs `f` against the collection of type `T` stored at `key`.
    ///
    /// When the key is absent, an empty collection is created first if `create` is set,
    /// otherwise `f` is not run and `None` is returned. Whatever `f` returns, a collection it
    /// leaves empty is removed from the keyspace.
    fn update<T, R, F>(&mut self, key: &str, create: bool, f: F) -> Result<Option<R>, StoreError>
    where
        T: Collection,
        F: FnOnce(&mut T) -> Result<R, StoreError>,
    {
        let value = match self.entries.entry(key.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) if create => entry.insert(T::default().into_value()),
            Entry::Vacant(_) => return Ok(None),
        };

        let collection = T::from_value_mut(value).ok_or(StoreError::WrongType)?;
        let result = f(collection);
        let empty = collection.is_empty();

        if empty {
            self.entries.remove(key);
        }

        result.map(Some)
    }
}

/// The collection types a [`Value`] can hold.
trait Collection: Default {
    fn from_value(value: &Value) -> Option<&Self>;
    fn from_value_mut(value: &mut Value) -> Option<&mut Self>;
    fn into_value(self) -> Value;
    fn is_empty(&self) -> bool;
}

impl Collection for VecDeque<Bytes> {
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::List(self)
    }

    fn is_empty(&self) -> bool {
        VecDeque::is_empty(self)
    }
}

impl Collection for HashMap<Bytes, Bytes> {
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Hash(self)
    }

    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }
}

impl Collection for HashSet<Bytes> {
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Set(self)
    }

    fn is_empty(&self) -> bool {
        HashSet::is_empty(self)
    }
}
