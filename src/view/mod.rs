//! Template-based views.
//!
//! A [`ViewClass`] is built once from [`ViewOptions`] and a [`Behavior`]
//! type supplying the event handlers. Each [`View`] created from it owns one
//! root node, the `ui` handles found under it and the listeners it bound.

pub mod options;

pub use options::{EventBinding, ViewOptions};

use crate::domain::ports::{Dom, Listener, ListenerId};
use crate::utils::error::{CarpeError, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

pub type Handler<D, B> = fn(&mut ViewState<D, B>, &<D as Dom>::Event);

/// Per-view code: the handler table and the render hook.
pub trait Behavior<D: Dom>: Sized + 'static {
    /// Looks up a handler named in the `events` map.
    fn handler(name: &str) -> Option<Handler<D, Self>> {
        let _ = name;
        None
    }

    /// Runs after the root, `ui` handles and events are in place.
    fn on_render(view: &mut ViewState<D, Self>) {
        let _ = view;
    }
}

/// No handlers, no hook. For views that only render.
impl<D: Dom> Behavior<D> for () {}

/// What handlers see as `self`.
pub struct ViewState<D: Dom, B> {
    dom: Rc<D>,
    el: Option<D::Node>,
    ui: IndexMap<String, Vec<D::Node>>,
    model: Option<Rc<dyn Any>>,
    pub behavior: B,
}

impl<D: Dom, B> ViewState<D, B> {
    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Root node; `None` once the view was removed.
    pub fn el(&self) -> Option<&D::Node> {
        self.el.as_ref()
    }

    pub fn ui(&self, name: &str) -> &[D::Node] {
        self.ui.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn model<T: Any>(&self) -> Option<&T> {
        self.model.as_deref().and_then(|model| model.downcast_ref::<T>())
    }

    pub fn model_handle(&self) -> Option<Rc<dyn Any>> {
        self.model.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RootSource {
    Element(String),
    Template(String),
}

struct EventSpec<D: Dom, B> {
    binding: EventBinding,
    handler_name: String,
    handler: Handler<D, B>,
}

struct ClassInner<D: Dom, B> {
    dom: Rc<D>,
    name: String,
    root: RootSource,
    ui: IndexMap<String, String>,
    events: Vec<EventSpec<D, B>>,
}

pub struct ViewClass<D: Dom, B> {
    inner: Rc<ClassInner<D, B>>,
}

impl<D: Dom, B> Clone for ViewClass<D, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Dom, B> fmt::Debug for ViewClass<D, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewClass")
            .field("name", &self.inner.name)
            .field("root", &self.inner.root)
            .field("ui", &self.inner.ui)
            .field(
                "events",
                &self
                    .inner
                    .events
                    .iter()
                    .map(|spec| (&spec.binding.event, &spec.handler_name))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<D, B> ViewClass<D, B>
where
    D: Dom + 'static,
    B: Behavior<D>,
{
    /// Validates the descriptor and resolves handler names. Nothing is
    /// looked up in the document until an instance is created.
    pub fn extend(dom: Rc<D>, options: ViewOptions) -> Result<Self> {
        let root = match (options.el, options.template) {
            (Some(el), _) => RootSource::Element(el),
            (None, Some(template)) => RootSource::Template(template),
            (None, None) => {
                return Err(CarpeError::ConfigError {
                    message: "view needs either 'el' or 'template'".to_string(),
                })
            }
        };

        let events = options
            .events
            .into_iter()
            .map(|(key, handler_name)| {
                let binding = EventBinding::parse(&key)?;
                let handler = B::handler(&handler_name).ok_or_else(|| {
                    CarpeError::UnknownHandler {
                        binding: key.clone(),
                        handler: handler_name.clone(),
                    }
                })?;
                Ok(EventSpec {
                    binding,
                    handler_name,
                    handler,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let name = options.name.unwrap_or_else(|| {
            let type_name = std::any::type_name::<B>();
            type_name.rsplit("::").next().unwrap_or(type_name).to_string()
        });

        tracing::debug!(
            view = %name,
            events = events.len(),
            ui = options.ui.len(),
            "view class defined"
        );

        Ok(Self {
            inner: Rc::new(ClassInner {
                dom,
                name,
                root,
                ui: options.ui,
                events,
            }),
        })
    }

    /// [`ViewClass::extend`] for a descriptor held as JSON.
    pub fn extend_value(dom: Rc<D>, options: Value) -> Result<Self> {
        Self::extend(dom, ViewOptions::from_value(options)?)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Creates and renders an instance.
    pub fn create(&self, behavior: B) -> Result<View<D, B>> {
        self.create_with_model(behavior, None)
    }

    pub fn create_with_model(&self, behavior: B, model: Option<Rc<dyn Any>>) -> Result<View<D, B>> {
        let view = View {
            class: self.clone(),
            state: Rc::new(RefCell::new(ViewState {
                dom: Rc::clone(&self.inner.dom),
                el: None,
                ui: IndexMap::new(),
                model,
                behavior,
            })),
            listeners: RefCell::new(Vec::new()),
        };
        view.render()?;
        Ok(view)
    }

    fn materialize_root(&self) -> Result<D::Node> {
        let dom = &self.inner.dom;
        match &self.inner.root {
            RootSource::Element(selector) => {
                let mut matches = dom.select(selector);
                if matches.len() > 1 {
                    tracing::debug!(
                        view = %self.inner.name,
                        selector = %selector,
                        found = matches.len(),
                        "several elements match, using the first"
                    );
                }
                if matches.is_empty() {
                    return Err(CarpeError::NoElement {
                        selector: selector.clone(),
                    });
                }
                Ok(matches.swap_remove(0))
            }
            RootSource::Template(selector) => {
                let templates = dom.select(selector);
                let [template] = templates.as_slice() else {
                    return Err(CarpeError::TemplateCount {
                        selector: selector.clone(),
                        found: templates.len(),
                    });
                };

                let mut content = dom.instantiate(template);
                if content.len() != 1 {
                    return Err(CarpeError::TemplateContent {
                        selector: selector.clone(),
                        found: content.len(),
                    });
                }
                Ok(content.remove(0))
            }
        }
    }
}

pub struct View<D: Dom, B> {
    class: ViewClass<D, B>,
    state: Rc<RefCell<ViewState<D, B>>>,
    listeners: RefCell<Vec<ListenerId>>,
}

impl<D, B> View<D, B>
where
    D: Dom + 'static,
    B: Behavior<D>,
{
    /// Root, then `ui`, then events, then the render hook. A root that
    /// cannot be found leaves the current rendering untouched.
    fn render(&self) -> Result<()> {
        let class = &self.class.inner;
        let root = self.class.materialize_root()?;
        self.unbind();

        let ui = class
            .ui
            .iter()
            .map(|(name, selector)| (name.clone(), class.dom.select_within(selector, &root)))
            .collect();

        {
            let mut state = self.state.borrow_mut();
            state.el = Some(root.clone());
            state.ui = ui;
        }

        let mut listeners = self.listeners.borrow_mut();
        for spec in &class.events {
            let weak = Rc::downgrade(&self.state);
            let handler = spec.handler;
            let view_name = class.name.clone();
            let handler_name = spec.handler_name.clone();

            let listener: Listener<D::Event> = Rc::new(move |event: &D::Event| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                let Ok(mut state) = state.try_borrow_mut() else {
                    tracing::warn!(
                        view = %view_name,
                        handler = %handler_name,
                        "view is busy handling another event, skipping"
                    );
                    return;
                };
                handler(&mut state, event);
            });

            listeners.push(class.dom.on(
                &root,
                &spec.binding.event,
                spec.binding.selector.as_deref(),
                listener,
            ));
        }
        drop(listeners);

        tracing::debug!(view = %class.name, "view rendered");
        B::on_render(&mut self.state.borrow_mut());
        Ok(())
    }

    fn unbind(&self) {
        for id in self.listeners.borrow_mut().drain(..) {
            self.class.inner.dom.off(id);
        }
    }

    /// Re-renders and inserts the root as the first child of `target`.
    pub fn prepend_to(&self, target: &D::Node) -> Result<&Self> {
        self.render()?;
        if let Some(el) = self.el() {
            self.class.inner.dom.prepend(target, &el)?;
        }
        Ok(self)
    }

    /// Re-renders and inserts the root as the last child of `target`.
    pub fn append_to(&self, target: &D::Node) -> Result<&Self> {
        self.render()?;
        if let Some(el) = self.el() {
            self.class.inner.dom.append(target, &el)?;
        }
        Ok(self)
    }

    /// Detaches the root and drops the listeners. Later calls do nothing.
    pub fn remove(&self) {
        self.unbind();
        let el = self.state.borrow_mut().el.take();
        if let Some(el) = el {
            self.class.inner.dom.remove(&el);
            tracing::debug!(view = %self.class.inner.name, "view removed");
        }
    }
}

impl<D: Dom, B> View<D, B> {
    pub fn class(&self) -> &ViewClass<D, B> {
        &self.class
    }

    pub fn el(&self) -> Option<D::Node> {
        self.state.borrow().el.clone()
    }

    pub fn ui(&self, name: &str) -> Vec<D::Node> {
        self.state.borrow().ui(name).to_vec()
    }

    pub fn state(&self) -> Ref<'_, ViewState<D, B>> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, ViewState<D, B>> {
        self.state.borrow_mut()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}
