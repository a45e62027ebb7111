use crate::utils::error::Result;
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`Dom::on`], used to detach the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub type Listener<E> = Rc<dyn Fn(&E)>;

/// The document capability views are rendered into.
///
/// Lookups return possibly-empty collections; callers check the length.
pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug;
    type Event;

    /// Every node in the document matching `selector`.
    fn select(&self, selector: &str) -> Vec<Self::Node>;

    /// Descendants of `scope` matching `selector`.
    fn select_within(&self, selector: &str, scope: &Self::Node) -> Vec<Self::Node>;

    /// Fresh detached copies of the top-level nodes held by a template.
    fn instantiate(&self, template: &Self::Node) -> Vec<Self::Node>;

    /// Moves `node` to the start of `target`'s children. Fails with
    /// `HierarchyError` when `target` is `node` or lies inside it.
    fn prepend(&self, target: &Self::Node, node: &Self::Node) -> Result<()>;

    /// Moves `node` to the end of `target`'s children. Same failure as
    /// [`Dom::prepend`].
    fn append(&self, target: &Self::Node, node: &Self::Node) -> Result<()>;

    /// Detaches `node` from its parent.
    fn remove(&self, node: &Self::Node);

    /// Subscribes to `event` on `node`. With a selector the listener only
    /// fires for events originating from matching descendants, checked at
    /// dispatch time.
    fn on(
        &self,
        node: &Self::Node,
        event: &str,
        selector: Option<&str>,
        listener: Listener<Self::Event>,
    ) -> ListenerId;

    fn off(&self, id: ListenerId);
}
