use std::{
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{ser::SerializeMap, Serialize, Serializer};

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// A callback that can travel inside an exported snapshot.
///
/// Handlers serialize to `{"$handler": id}`. Clones share the id, a handler
/// built from a new closure gets a new one. Two snapshots holding different
/// handlers therefore never compare equal even if the closures behave the
/// same; `use_handler` keeps one id for the life of an instance.
pub struct Handler<A = ()> {
    id: u64,
    f: Rc<dyn Fn(A)>,
}

impl<A> Clone for Handler<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            f: self.f.clone(),
        }
    }
}

impl<A> std::fmt::Debug for Handler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Handler").field(&self.id).finish()
    }
}

impl<A> PartialEq for Handler<A> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<A> Handler<A> {
    pub fn new(f: impl Fn(A) + 'static) -> Self {
        Self {
            id: NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed),
            f: Rc::new(f),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn call(&self, arg: A) {
        (self.f)(arg)
    }
}

impl<A> Serialize for Handler<A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$handler", &self.id)?;
        map.end()
    }
}
