use bytes::Bytes;
use itertools::Itertools;
use rand::seq::IteratorRandom;
use std::collections::HashSet;

use super::{Keyspace, StoreError};

type Set = HashSet<Bytes>;

impl Keyspace {
    /// Adds members to the set at `key`, creating it if needed. Returns how many members were
    /// not already present.
    pub fn sadd(&mut self, key: &str, members: Vec<Bytes>) -> Result<usize, StoreError> {
        let added = self.update(key, true, |set: &mut Set| {
            Ok(members.into_iter().filter(|m| set.insert(m.clone())).count())
        })?;

        Ok(added.unwrap_or(0))
    }

    /// Removes members from the set at `key`. Returns how many were actually removed.
    pub fn srem(&mut self, key: &str, members: Vec<Bytes>) -> Result<usize, StoreError> {
        let removed = self.update(key, false, |set: &mut Set| {
            Ok(members.iter().filter(|m| set.remove(*m)).count())
        })?;

        Ok(removed.unwrap_or(0))
    }

    pub fn sismember(&self, key: &str, member: &Bytes) -> Result<bool, StoreError> {
        let set = self.read::<Set>(key)?;
        Ok(set.map_or(false, |set| set.contains(member)))
    }

    pub fn scard(&self, key: &str) -> Result<usize, StoreError> {
        let set = self.read::<Set>(key)?;
        Ok(set.map_or(0, HashSet::len))
    }

    pub fn smembers(&self, key: &str) -> Result<Vec<Bytes>, StoreError> {
        let set = self.read::<Set>(key)?;
        Ok(set.map_or_else(Vec::new, |set| set.iter().cloned().collect()))
    }

    /// Union of the sets stored at `keys`. Absent keys count as empty sets; a key of another
    /// type fails the whole command.
    pub fn sunion(&self, keys: &[String]) -> Result<Vec<Bytes>, StoreError> {
        let sets = keys
            .iter()
            .map(|key| self.read::<Set>(key))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sets
            .into_iter()
            .flatten()
            .flat_map(|set| set.iter())
            .unique()
            .cloned()
            .collect())
    }

    /// Removes and returns up to `count` random members. Returns `None` when the key does not
    /// exist.
    pub fn spop(&mut self, key: &str, count: usize) -> Result<Option<Vec<Bytes>>, StoreError> {
        self.update(key, false, |set: &mut Set| {
            let mut rng = rand::thread_rng();
            let popped = set.iter().cloned().choose_multiple(&mut rng, count);

            for member in &popped {
                set.remove(member);
            }

            Ok(popped)
        })
    }
}
