use bytes::Bytes;
use std::collections::VecDeque;

use super::{Keyspace, StoreError};

type List = VecDeque<Bytes>;

/// Where `LINSERT` places the new element relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, strum_macros::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Position {
    Before,
    After,
}

impl Keyspace {
    /// Pushes values to the head of the list, one at a time, so the last given value ends up
    /// first. Returns the new length.
    pub fn lpush(&mut self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        self.push(key, values, true)
    }

    /// Pushes values to the tail of the list. Returns the new length.
    pub fn rpush(&mut self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        self.push(key, values, false)
    }

    pub fn lpop(&mut self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let popped = self.update(key, false, |list: &mut List| Ok(list.pop_front()))?;
        Ok(popped.flatten())
    }

    pub fn rpop(&mut self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let popped = self.update(key, false, |list: &mut List| Ok(list.pop_back()))?;
        Ok(popped.flatten())
    }

    pub fn llen(&self, key: &str) -> Result<usize, StoreError> {
        let list = self.read::<List>(key)?;
        Ok(list.map_or(0, VecDeque::len))
    }

    /// Element at `index`, where negative indices count from the tail (`-1` is the last
    /// element). Out of range indices yield `None`.
    pub fn lindex(&self, key: &str, index: i64) -> Result<Option<Bytes>, StoreError> {
        let list = self.read::<List>(key)?;
        Ok(list.and_then(|list| {
            resolve_index(index, list.len()).and_then(|i| list.get(i).cloned())
        }))
    }

    /// Replaces the element at `index`. Unlike [`Keyspace::lindex`], an index outside the list
    /// is an error, and so is a missing key.
    pub fn lset(&mut self, key: &str, index: i64, value: Bytes) -> Result<(), StoreError> {
        let replaced = self.update(key, false, |list: &mut List| {
            let slot = resolve_index(index, list.len())
                .and_then(|i| list.get_mut(i))
                .ok_or(StoreError::OutOfRange)?;
            *slot = value;
            Ok(())
        })?;

        replaced.ok_or(StoreError::NoSuchKey)
    }

    /// Inserts `value` next to the first element equal to `pivot`. Returns the new length, or
    /// `-1` when the key does not exist or the pivot is not found.
    pub fn linsert(
        &mut self,
        key: &str,
        position: Position,
        pivot: &Bytes,
        value: Bytes,
    ) -> Result<i64, StoreError> {
        let inserted = self.update(key, false, |list: &mut List| {
            let Some(at) = list.iter().position(|element| element == pivot) else {
                return Ok(-1);
            };

            let at = match position {
                Position::Before => at,
                Position::After => at + 1,
            };
            list.insert(at, value);

            Ok(list.len() as i64)
        })?;

        Ok(inserted.unwrap_or(-1))
    }

    fn push(&mut self, key: &str, values: Vec<Bytes>, front: bool) -> Result<usize, StoreError> {
        let len = self.update(key, true, |list: &mut List| {
            for value in values {
                if front {
                    list.push_front(value);
                } else {
                    list.push_back(value);
                }
            }
            Ok(list.len())
        })?;

        Ok(len.unwrap_or(0))
    }
}

/// Maps a possibly negative index onto `0..len`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { len + index } else { index };

    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &'static str) -> Bytes {
        Bytes::from(s)
    }

    fn list(db: &Keyspace, key: &str) -> Vec<Bytes> {
        let len = db.llen(key).unwrap() as i64;
        (0..len).filter_map(|i| db.lindex(key, i).unwrap()).collect()
    }

    #[test]
    fn push_and_pop() {
        let mut db = Keyspace::default();

        assert_eq!(db.lpush("list1", vec![b("var2"), b("var1")]), Ok(2));
        assert_eq!(list(&db, "list1"), vec![b("var1"), b("var2")]);
        assert_eq!(db.rpop("list1"), Ok(Some(b("var2"))));
        assert_eq!(db.llen("list1"), Ok(1));
        assert_eq!(db.lpush("list1", vec![b("var0")]), Ok(2));
        assert_eq!(db.lpop("list1"), Ok(Some(b("var0"))));
        assert_eq!(db.llen("list1"), Ok(1));
        assert_eq!(db.rpush("list1", vec![b("x"), b("y")]), Ok(3));
        assert_eq!(list(&db, "list1"), vec![b("var1"), b("x"), b("y")]);
    }

    #[test]
    fn pop_on_missing_key_does_not_create_it() {
        let mut db = Keyspace::default();

        assert_eq!(db.lpop("nope"), Ok(None));
        assert_eq!(db.rpop("nope"), Ok(None));
        assert!(!db.exists("nope"));
    }

    #[test]
    fn popping_last_element_removes_key() {
        let mut db = Keyspace::default();
        db.rpush("list", vec![b("only")]).unwrap();

        assert_eq!(db.lpop("list"), Ok(Some(b("only"))));
        assert!(!db.exists("list"));
        assert_eq!(db.llen("list"), Ok(0));
    }

    #[test]
    fn lindex_with_negative_and_out_of_range_indices() {
        let mut db = Keyspace::default();
        db.rpush("list2", vec![b("var1"), b("var2")]).unwrap();

        assert_eq!(db.lindex("list2", 0), Ok(Some(b("var1"))));
        assert_eq!(db.lindex("list2", -1), Ok(Some(b("var2"))));
        assert_eq!(db.lindex("list2", -2), Ok(Some(b("var1"))));
        assert_eq!(db.lindex("list2", -3), Ok(None));
        assert_eq!(db.lindex("list2", 2), Ok(None));
        assert_eq!(db.lindex("list2", 3), Ok(None));
        assert_eq!(db.lindex("missing", 0), Ok(None));
    }

    #[test]
    fn lset() {
        let mut db = Keyspace::default();
        db.rpush("list2", vec![b("var1"), b("var2")]).unwrap();

        assert_eq!(db.lset("list2", 1, b("toto")), Ok(()));
        assert_eq!(db.lindex("list2", 1), Ok(Some(b("toto"))));
        assert_eq!(db.lset("list2", -1, b("tutu")), Ok(()));
        assert_eq!(db.lindex("list2", 1), Ok(Some(b("tutu"))));

        assert_eq!(db.lset("list2", 3, b("x")), Err(StoreError::OutOfRange));
        assert_eq!(db.lset("list2", -3, b("x")), Err(StoreError::OutOfRange));
        assert_eq!(list(&db, "list2"), vec![b("var1"), b("tutu")]);

        assert_eq!(db.lset("missing", 0, b("x")), Err(StoreError::NoSuchKey));
        assert!(!db.exists("missing"));
    }

    #[test]
    fn linsert() {
        let mut db = Keyspace::default();

        assert_eq!(db.linsert("list3", Position::After, &b("toto"), b("var00")), Ok(-1));
        assert!(!db.exists("list3"));

        db.rpush("list3", vec![b("var1"), b("var2"), b("var3"), b("var4")])
            .unwrap();

        assert_eq!(db.linsert("list3", Position::Before, &b("var2"), b("var1.1")), Ok(5));
        assert_eq!(db.lindex("list3", 1), Ok(Some(b("var1.1"))));
        assert_eq!(db.linsert("list3", Position::Before, &b("var1"), b("var0")), Ok(6));
        assert_eq!(db.lindex("list3", 0), Ok(Some(b("var0"))));
        assert_eq!(db.linsert("list3", Position::After, &b("var4"), b("var4.1")), Ok(7));
        assert_eq!(db.lindex("list3", 6), Ok(Some(b("var4.1"))));

        assert_eq!(db.linsert("list3", Position::After, &b("toto"), b("var00")), Ok(-1));
        assert_eq!(db.llen("list3"), Ok(7));
    }

    #[test]
    fn linsert_uses_first_matching_pivot() {
        let mut db = Keyspace::default();
        db.rpush("l", vec![b("a"), b("p"), b("b"), b("p")]).unwrap();

        db.linsert("l", Position::After, &b("p"), b("x")).unwrap();

        assert_eq!(list(&db, "l"), vec![b("a"), b("p"), b("x"), b("b"), b("p")]);
    }

    #[test]
    fn position_parses_case_insensitively() {
        assert_eq!("before".parse::<Position>(), Ok(Position::Before));
        assert_eq!("AFTER".parse::<Position>(), Ok(Position::After));
        assert!("around".parse::<Position>().is_err());
    }

    #[test]
    fn list_commands_on_wrong_type() {
        let mut db = Keyspace::default();
        db.sadd("set", vec![b("m")]).unwrap();

        assert_eq!(db.lpush("set", vec![b("x")]), Err(StoreError::WrongType));
        assert_eq!(db.lindex("set", 0), Err(StoreError::WrongType));
        assert_eq!(db.lset("set", 0, b("x")), Err(StoreError::WrongType));
    }
}
