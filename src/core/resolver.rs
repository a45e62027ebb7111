use crate::core::namespace::{self, Member, Namespace, NamespaceStore};
use crate::utils::error::{CarpeError, Result};
use serde::{Deserialize, Serialize};

/// What happens when a path segment does not exist yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Missing segments are created as empty namespaces.
    #[default]
    Lenient,
    /// Missing segments are an error.
    Strict,
}

#[derive(Debug, Clone)]
pub enum Dependency {
    /// Dotted namespace path, e.g. `model.account`.
    Path(String),
    /// Passed to the definition as is.
    Value(Member),
}

impl From<&str> for Dependency {
    fn from(path: &str) -> Self {
        Dependency::Path(path.to_string())
    }
}

impl From<String> for Dependency {
    fn from(path: String) -> Self {
        Dependency::Path(path)
    }
}

impl From<Member> for Dependency {
    fn from(member: Member) -> Self {
        Dependency::Value(member)
    }
}

impl From<Namespace> for Dependency {
    fn from(ns: Namespace) -> Self {
        Dependency::Value(Member::Namespace(ns))
    }
}

impl From<serde_json::Value> for Dependency {
    fn from(value: serde_json::Value) -> Self {
        Dependency::Value(Member::Value(value))
    }
}

#[derive(Clone, Default)]
pub struct Resolver {
    store: NamespaceStore,
    strictness: Strictness,
}

impl Resolver {
    pub fn new(store: NamespaceStore) -> Self {
        Self {
            store,
            strictness: Strictness::Lenient,
        }
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn store(&self) -> &NamespaceStore {
        &self.store
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Resolves every dependency in order and calls `definition` with the
    /// results, returning whatever it returns.
    pub fn resolve<I, D, F, R>(&self, dependencies: I, definition: F) -> Result<R>
    where
        I: IntoIterator<Item = D>,
        D: Into<Dependency>,
        F: FnOnce(Vec<Member>) -> R,
    {
        let resolved = dependencies
            .into_iter()
            .map(|dependency| self.fetch(dependency.into()))
            .collect::<Result<Vec<_>>>()?;

        Ok(definition(resolved))
    }

    fn fetch(&self, dependency: Dependency) -> Result<Member> {
        match dependency {
            Dependency::Path(path) => self.resolve_path(&path),
            Dependency::Value(member) => Ok(member),
        }
    }

    /// Walks `path` from the root. The last segment may name any member;
    /// every segment before it must be a namespace.
    pub fn resolve_path(&self, path: &str) -> Result<Member> {
        let mut current = Member::Namespace(self.store.root());
        let mut parent_segment = "";

        for segment in path.split('.') {
            let ns = current
                .into_namespace()
                .ok_or_else(|| CarpeError::PathConflict {
                    path: path.to_string(),
                    segment: parent_segment.to_string(),
                })?;
            parent_segment = segment;

            current = match ns.get(segment) {
                Some(member) => member,
                None if self.strictness == Strictness::Strict => {
                    return Err(CarpeError::MissingNamespace {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    });
                }
                None => {
                    tracing::trace!(path, segment, "introducing namespace");
                    // Freshly created, so `child` cannot hit a terminal member.
                    Member::Namespace(ns.child(segment).unwrap_or_default())
                }
            };
        }

        Ok(current)
    }

    /// Like [`Resolver::resolve_path`] but requires the target to be a namespace.
    pub fn namespace(&self, path: &str) -> Result<Namespace> {
        match self.resolve_path(path)? {
            Member::Namespace(ns) => Ok(ns),
            _ => Err(CarpeError::PathConflict {
                path: path.to_string(),
                segment: path.rsplit('.').next().unwrap_or(path).to_string(),
            }),
        }
    }
}

/// Resolves against the thread's default store with lenient strictness.
///
/// ```
/// use carpe::core::Member;
///
/// let total = carpe::module(["app.config"], |deps: Vec<Member>| {
///     let config = deps[0].as_namespace().expect("namespace");
///     config.insert("retries", serde_json::json!(3));
///     config.len()
/// })
/// .unwrap();
/// assert_eq!(total, 1);
/// ```
pub fn module<I, D, F, R>(dependencies: I, definition: F) -> Result<R>
where
    I: IntoIterator<Item = D>,
    D: Into<Dependency>,
    F: FnOnce(Vec<Member>) -> R,
{
    Resolver::new(namespace::global()).resolve(dependencies, definition)
}
