use bytes::Bytes;
use std::collections::HashMap;
use std::str::{self, FromStr};

use super::{Keyspace, StoreError};

type Hash = HashMap<Bytes, Bytes>;

impl Keyspace {
    pub fn hget(&self, key: &str, field: &Bytes) -> Result<Option<Bytes>, StoreError> {
        let hash = self.read::<Hash>(key)?;
        Ok(hash.and_then(|hash| hash.get(field).cloned()))
    }

    /// Looks up several fields at once; missing fields (or a missing key) yield `None` in their
    /// position.
    pub fn hmget(&self, key: &str, fields: &[Bytes]) -> Result<Vec<Option<Bytes>>, StoreError> {
        let hash = self.read::<Hash>(key)?;
        Ok(fields
            .iter()
            .map(|field| hash.and_then(|hash| hash.get(field).cloned()))
            .collect())
    }

    /// Sets the given field/value pairs. Returns the number of fields that did not exist before.
    pub fn hset(&mut self, key: &str, pairs: Vec<(Bytes, Bytes)>) -> Result<usize, StoreError> {
        let created = self.update(key, true, |hash: &mut Hash| {
            Ok(pairs
                .into_iter()
                .filter(|(field, value)| hash.insert(field.clone(), value.clone()).is_none())
                .count())
        })?;

        Ok(created.unwrap_or(0))
    }

    /// Sets `field` only if it does not exist yet. Returns whether it was set.
    pub fn hsetnx(&mut self, key: &str, field: Bytes, value: Bytes) -> Result<bool, StoreError> {
        let set = self.update(key, true, |hash: &mut Hash| {
            if hash.contains_key(&field) {
                return Ok(false);
            }
            hash.insert(field, value);
            Ok(true)
        })?;

        Ok(set.unwrap_or(false))
    }

    pub fn hdel(&mut self, key: &str, fields: &[Bytes]) -> Result<usize, StoreError> {
        let removed = self.update(key, false, |hash: &mut Hash| {
            Ok(fields.iter().filter(|f| hash.remove(*f).is_some()).count())
        })?;

        Ok(removed.unwrap_or(0))
    }

    pub fn hexists(&self, key: &str, field: &Bytes) -> Result<bool, StoreError> {
        let hash = self.read::<Hash>(key)?;
        Ok(hash.map_or(false, |hash| hash.contains_key(field)))
    }

    pub fn hlen(&self, key: &str) -> Result<usize, StoreError> {
        let hash = self.read::<Hash>(key)?;
        Ok(hash.map_or(0, HashMap::len))
    }

    /// Byte length of the value stored at `field`, 0 when absent.
    pub fn hstrlen(&self, key: &str, field: &Bytes) -> Result<usize, StoreError> {
        let value = self.hget(key, field)?;
        Ok(value.map_or(0, |value| value.len()))
    }

    pub fn hkeys(&self, key: &str) -> Result<Vec<Bytes>, StoreError> {
        let hash = self.read::<Hash>(key)?;
        Ok(hash.map_or_else(Vec::new, |hash| hash.keys().cloned().collect()))
    }

    pub fn hvals(&self, key: &str) -> Result<Vec<Bytes>, StoreError> {
        let hash = self.read::<Hash>(key)?;
        Ok(hash.map_or_else(Vec::new, |hash| hash.values().cloned().collect()))
    }

    /// All pairs flattened as field, value, field, value, ...
    pub fn hgetall(&self, key: &str) -> Result<Vec<Bytes>, StoreError> {
        let hash = self.read::<Hash>(key)?;
        Ok(hash.map_or_else(Vec::new, |hash| {
            hash.iter()
                .flat_map(|(field, value)| [field.clone(), value.clone()])
                .collect()
        }))
    }

    pub fn hincrby(&mut self, key: &str, field: Bytes, increment: i64) -> Result<i64, StoreError> {
        self.hincr(key, field, increment)
    }

    pub fn hincrbyfloat(
        &mut self,
        key: &str,
        field: Bytes,
        increment: f64,
    ) -> Result<f64, StoreError> {
        if !increment.is_finite() {
            return Err(StoreError::NonFinite);
        }
        self.hincr(key, field, increment)
    }

    /// Adds `increment` to the number stored at `field`, treating a missing field as zero. The
    /// stored value is left untouched when it does not parse or the addition fails.
    fn hincr<T: Increment>(
        &mut self,
        key: &str,
        field: Bytes,
        increment: T,
    ) -> Result<T, StoreError> {
        let result = self.update(key, true, |hash: &mut Hash| {
            let current = match hash.get(&field) {
                Some(value) => T::parse(value)?,
                None => T::default(),
            };

            let value = current.add_checked(increment)?;
            hash.insert(field, Bytes::from(value.to_string()));

            Ok(value)
        })?;

        Ok(result.unwrap_or_default())
    }
}

/// Numeric types a hash field can be incremented by.
trait Increment: FromStr + ToString + Default + Copy {
    const PARSE_ERROR: StoreError;

    fn add_checked(self, other: Self) -> Result<Self, StoreError>;

    fn parse(value: &Bytes) -> Result<Self, StoreError> {
        str::from_utf8(value)
            .ok()
            .and_then(|s| s.parse::<Self>().ok())
            .ok_or(Self::PARSE_ERROR)
    }
}

impl Increment for i64 {
    const PARSE_ERROR: StoreError = StoreError::NotInteger;

    fn add_checked(self, other: Self) -> Result<Self, StoreError> {
        self.checked_add(other).ok_or(StoreError::Overflow)
    }
}

impl Increment for f64 {
    const PARSE_ERROR: StoreError = StoreError::NotFloat;

    fn add_checked(self, other: Self) -> Result<Self, StoreError> {
        let sum = self + other;
        if sum.is_finite() {
            Ok(sum)
        } else {
            Err(StoreError::NonFinite)
        }
    }
}
