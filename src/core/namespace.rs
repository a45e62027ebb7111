//! Namespace tree and the store that owns its root.
//!
//! A [`Namespace`] is a shared handle: cloning it yields another reference to
//! the same node, so resolving a path twice hands back the same identity.

use crate::domain::model::DomainType;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Anything that can live under a namespace key.
#[derive(Clone)]
pub enum Member {
    Namespace(Namespace),
    Domain(Rc<DomainType>),
    Value(Value),
    Opaque(Rc<dyn Any>),
}

impl Member {
    pub fn opaque<T: Any>(value: T) -> Self {
        Member::Opaque(Rc::new(value))
    }

    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Member::Namespace(ns) => Some(ns),
            _ => None,
        }
    }

    pub fn into_namespace(self) -> Option<Namespace> {
        match self {
            Member::Namespace(ns) => Some(ns),
            _ => None,
        }
    }

    pub fn as_domain(&self) -> Option<&Rc<DomainType>> {
        match self {
            Member::Domain(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Member::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        match self {
            Member::Opaque(any) => any.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Member::Namespace(_) => "namespace",
            Member::Domain(_) => "domain",
            Member::Value(_) => "value",
            Member::Opaque(_) => "opaque",
        }
    }

    /// Same object, not just equal contents. Plain values compare by content.
    pub fn ptr_eq(&self, other: &Member) -> bool {
        match (self, other) {
            (Member::Namespace(a), Member::Namespace(b)) => a.ptr_eq(b),
            (Member::Domain(a), Member::Domain(b)) => Rc::ptr_eq(a, b),
            (Member::Opaque(a), Member::Opaque(b)) => Rc::ptr_eq(a, b),
            (Member::Value(a), Member::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Namespace(ns) => f.debug_tuple("Namespace").field(ns).finish(),
            Member::Domain(ty) => f.debug_tuple("Domain").field(&ty.name()).finish(),
            Member::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Member::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl From<Namespace> for Member {
    fn from(ns: Namespace) -> Self {
        Member::Namespace(ns)
    }
}

impl From<Rc<DomainType>> for Member {
    fn from(ty: Rc<DomainType>) -> Self {
        Member::Domain(ty)
    }
}

impl From<Value> for Member {
    fn from(value: Value) -> Self {
        Member::Value(value)
    }
}

#[derive(Clone, Default)]
pub struct Namespace {
    members: Rc<RefCell<IndexMap<String, Member>>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Member> {
        self.members.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.borrow().contains_key(name)
    }

    /// Inserts or replaces a member, returning the previous one.
    pub fn insert(&self, name: impl Into<String>, member: impl Into<Member>) -> Option<Member> {
        self.members.borrow_mut().insert(name.into(), member.into())
    }

    /// Returns the child namespace `name`, creating an empty one when absent.
    ///
    /// `None` means `name` is taken by a terminal member.
    pub fn child(&self, name: &str) -> Option<Namespace> {
        let mut members = self.members.borrow_mut();
        match members.get(name) {
            Some(Member::Namespace(ns)) => Some(ns.clone()),
            Some(_) => None,
            None => {
                let ns = Namespace::new();
                members.insert(name.to_string(), Member::Namespace(ns.clone()));
                Some(ns)
            }
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.members.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }

    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Rc::ptr_eq(&self.members, &other.members)
    }

    pub fn domain_type(&self, name: &str) -> Option<Rc<DomainType>> {
        self.get(name).and_then(|member| member.as_domain().cloned())
    }

    pub fn value(&self, name: &str) -> Option<Value> {
        self.get(name).and_then(|member| member.as_value().cloned())
    }

    /// JSON snapshot of the subtree, used for inspection output.
    pub fn describe(&self) -> Value {
        let members = self.members.borrow();
        let mut out = serde_json::Map::new();
        for (name, member) in members.iter() {
            let described = match member {
                Member::Namespace(ns) => ns.describe(),
                Member::Domain(ty) => json!({
                    "$domain": ty.name(),
                    "parameters": ty.parameters(),
                }),
                Member::Value(value) => value.clone(),
                Member::Opaque(_) => json!("$opaque"),
            };
            out.insert(name.clone(), described);
        }
        Value::Object(out)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.members.borrow().keys()).finish()
    }
}

/// Owner of a namespace root. Handles are cheap clones sharing one root.
#[derive(Clone, Default)]
pub struct NamespaceStore {
    root: Rc<RefCell<Option<Namespace>>>,
}

impl NamespaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose root is `root`, e.g. a fixture prepared by a test.
    pub fn seeded(root: Namespace) -> Self {
        Self {
            root: Rc::new(RefCell::new(Some(root))),
        }
    }

    /// Replaces the root. `None` leaves the next access to create a fresh one.
    pub fn init(&self, seed: Option<Namespace>) {
        if seed.is_some() {
            tracing::debug!("Using existing root namespace");
        }
        *self.root.borrow_mut() = seed;
    }

    pub fn reset(&self) {
        self.init(None);
    }

    pub fn is_initialized(&self) -> bool {
        self.root.borrow().is_some()
    }

    pub fn root(&self) -> Namespace {
        self.root
            .borrow_mut()
            .get_or_insert_with(|| {
                tracing::debug!("Introducing new root namespace");
                Namespace::new()
            })
            .clone()
    }
}

thread_local! {
    static GLOBAL_STORE: NamespaceStore = NamespaceStore::new();
}

/// The default store of the current thread.
pub fn global() -> NamespaceStore {
    GLOBAL_STORE.with(NamespaceStore::clone)
}

/// Adopts `root` as the default store's root. Call before the first `module`.
pub fn seed_global(root: Namespace) {
    global().init(Some(root));
}
