//! Canonical serialization used to decide whether an exported snapshot changed.
//!
//! Two values have the same fingerprint when they serialize to the same JSON.
//! The comparison is order sensitive: sequences and struct fields are compared
//! in order, so maps should be ordered (`BTreeMap`) rather than `HashMap`.
//! Reference cycles are only possible through [`Shared`], which serializes a
//! value that is already being serialized further up as `{"$ref": n}`, `n`
//! being the position of that value on the current path.

use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

use serde::{
    ser::{Error, SerializeMap},
    Serialize, Serializer,
};

thread_local! {
    static PATH: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Shared mutable value that may point back at itself
pub struct Shared<T>(Rc<RefCell<T>>);

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> std::fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Shared({:#x})", self.addr())
    }
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

/// Pops the path entry pushed for a `Shared` once its value is written
struct PathGuard;

impl PathGuard {
    fn enter(addr: usize) -> Self {
        PATH.with(|p| p.borrow_mut().push(addr));
        PathGuard
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        PATH.with(|p| p.borrow_mut().pop());
    }
}

impl<T: Serialize> Serialize for Shared<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let addr = self.addr();
        let position = PATH.with(|p| p.borrow().iter().position(|a| *a == addr));
        if let Some(position) = position {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("$ref", &position)?;
            return map.end();
        }

        let value = self
            .0
            .try_borrow()
            .map_err(|_| S::Error::custom("shared value is mutably borrowed"))?;
        let _guard = PathGuard::enter(addr);
        value.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Snapshot {
        state: String,
        count: u32,
    }

    #[derive(Serialize)]
    struct Link {
        name: &'static str,
        next: Option<Shared<Link>>,
    }

    #[test]
    fn test_equal_structures_share_fingerprint() {
        let a = Snapshot {
            state: "x".into(),
            count: 1,
        };
        let b = Snapshot {
            state: "x".into(),
            count: 1,
        };
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());

        let c = Snapshot {
            state: "x!".into(),
            count: 1,
        };
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&c).unwrap());
    }

    #[test]
    fn test_order_matters() {
        assert_ne!(
            fingerprint(&vec![1, 2]).unwrap(),
            fingerprint(&vec![2, 1]).unwrap()
        );
    }

    #[test]
    fn test_cycle_serializes_as_back_reference() {
        let a = Shared::new(Link {
            name: "a",
            next: None,
        });
        let b = Shared::new(Link {
            name: "b",
            next: Some(a.clone()),
        });
        a.borrow_mut().next = Some(b.clone());

        assert_eq!(
            fingerprint(&a).unwrap(),
            r#"{"name":"a","next":{"name":"b","next":{"$ref":0}}}"#
        );
        assert_eq!(
            fingerprint(&b).unwrap(),
            r#"{"name":"b","next":{"name":"a","next":{"$ref":0}}}"#
        );
        PATH.with(|p| assert!(p.borrow().is_empty()));

        a.borrow_mut().next = None;
    }

    #[test]
    fn test_shared_without_cycle_is_written_in_full() {
        let leaf = Shared::new(Link {
            name: "leaf",
            next: None,
        });
        let both = vec![leaf.clone(), leaf];
        assert_eq!(
            fingerprint(&both).unwrap(),
            r#"[{"name":"leaf","next":null},{"name":"leaf","next":null}]"#
        );
    }

    #[test]
    fn test_mutably_borrowed_shared_is_an_error() {
        let value = Shared::new(1);
        let _guard = value.borrow_mut();
        assert!(fingerprint(&value).is_err());
    }

    #[test]
    fn test_non_string_keys_are_an_error() {
        let mut map = BTreeMap::new();
        map.insert(vec![1], "one");
        assert!(fingerprint(&map).is_err());
    }
}
