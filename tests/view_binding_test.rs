use anyhow::Result;
use carpe::adapters::{MemoryDom, MemoryEvent, NodeId};
use carpe::domain::ports::Dom;
use carpe::view::{Behavior, Handler, ViewClass, ViewOptions, ViewState};
use carpe::CarpeError;
use serde_json::json;
use std::rc::Rc;

#[derive(Default)]
struct TodoItem {
    clicks: Vec<NodeId>,
    keys: usize,
}

impl TodoItem {
    fn on_click(view: &mut ViewState<MemoryDom, Self>, event: &MemoryEvent) {
        view.behavior.clicks.push(event.current_target);
        if let Some(label) = view.ui("label").first() {
            view.dom().set_text(*label, "clicked");
        }
    }

    fn on_key(view: &mut ViewState<MemoryDom, Self>, _event: &MemoryEvent) {
        view.behavior.keys += 1;
    }
}

impl Behavior<MemoryDom> for TodoItem {
    fn handler(name: &str) -> Option<Handler<MemoryDom, Self>> {
        match name {
            "onClick" => Some(Self::on_click),
            "onKey" => Some(Self::on_key),
            _ => None,
        }
    }
}

fn todo_document() -> Rc<MemoryDom> {
    let dom = Rc::new(MemoryDom::new());
    let template = dom.template("todo-template");
    let item = dom.element(template, "li.todo");
    dom.element(item, "span.label");
    let button = dom.element(item, "button.btn");
    dom.element(button, "i.icon");
    dom
}

fn todo_options() -> ViewOptions {
    ViewOptions::new()
        .template("#todo-template")
        .ui("label", ".label")
        .event("click .btn", "onClick")
        .event("keyup", "onKey")
}

#[test]
fn test_click_on_delegated_descendant_invokes_handler() -> Result<()> {
    let dom = todo_document();
    let list = dom.element(dom.document(), "ul#todos");
    let class = ViewClass::<MemoryDom, TodoItem>::extend(dom.clone(), todo_options())?;

    let view = class.create(TodoItem::default())?;
    view.append_to(&list)?;

    let root = view.el().unwrap();
    let button = dom.select_within(".btn", &root)[0];
    let icon = dom.select_within(".icon", &root)[0];

    dom.dispatch(icon, "click");
    dom.dispatch(root, "click");

    assert_eq!(view.state().behavior.clicks, vec![button]);
    assert_eq!(dom.text(view.ui("label")[0]), "clicked");
    Ok(())
}

#[test]
fn test_event_without_selector_binds_root() -> Result<()> {
    let dom = todo_document();
    let class = ViewClass::<MemoryDom, TodoItem>::extend(dom.clone(), todo_options())?;
    let view = class.create(TodoItem::default())?;

    let label = view.ui("label")[0];
    dom.dispatch(label, "keyup");
    dom.dispatch(view.el().unwrap(), "keyup");
    assert_eq!(view.state().behavior.keys, 2);
    Ok(())
}

#[test]
fn test_zero_template_matches_fails_before_binding() -> Result<()> {
    let dom = Rc::new(MemoryDom::new());
    let class = ViewClass::<MemoryDom, TodoItem>::extend(dom.clone(), todo_options())?;

    let err = class.create(TodoItem::default()).err().unwrap();
    assert!(matches!(err, CarpeError::TemplateCount { found: 0, .. }));
    assert_eq!(dom.listener_count(), 0);
    Ok(())
}

#[test]
fn test_ambiguous_template_fails() -> Result<()> {
    let dom = todo_document();
    dom.element(dom.document(), "template.todo-copy");
    dom.element(dom.document(), "template.todo-copy");
    let class = ViewClass::<MemoryDom, ()>::extend(
        dom.clone(),
        ViewOptions::new().template(".todo-copy"),
    )?;

    assert!(matches!(
        class.create(()),
        Err(CarpeError::TemplateCount { found: 2, .. })
    ));
    Ok(())
}

#[test]
fn test_template_with_two_roots_fails() -> Result<()> {
    let dom = Rc::new(MemoryDom::new());
    let template = dom.template("pair");
    dom.element(template, "p");
    dom.element(template, "p");
    let class =
        ViewClass::<MemoryDom, ()>::extend(dom.clone(), ViewOptions::new().template("#pair"))?;

    assert!(matches!(
        class.create(()),
        Err(CarpeError::TemplateContent { found: 2, .. })
    ));
    Ok(())
}

#[test]
fn test_el_selector_uses_existing_element() -> Result<()> {
    let dom = Rc::new(MemoryDom::new());
    let sidebar = dom.element(dom.document(), "aside#sidebar");
    dom.element(sidebar, "span.label");

    let class = ViewClass::<MemoryDom, TodoItem>::extend(
        dom.clone(),
        ViewOptions::new().el("#sidebar").ui("label", ".label"),
    )?;
    let view = class.create(TodoItem::default())?;
    assert_eq!(view.el(), Some(sidebar));

    let missing = ViewClass::<MemoryDom, ()>::extend(dom.clone(), ViewOptions::new().el("#nav"))?;
    let err = missing.create(()).err().unwrap();
    assert_eq!(
        err.to_string(),
        "There is no element associated with selector #nav"
    );
    Ok(())
}

#[test]
fn test_extend_rejects_non_object_options() {
    let dom = Rc::new(MemoryDom::new());
    for options in [json!("#todo-template"), json!(42), json!(null)] {
        let result = ViewClass::<MemoryDom, TodoItem>::extend_value(dom.clone(), options);
        assert!(matches!(result, Err(CarpeError::InvalidArgument { .. })));
    }
    assert_eq!(dom.listener_count(), 0);
}

#[test]
fn test_prepend_and_remove() -> Result<()> {
    let dom = todo_document();
    let list = dom.element(dom.document(), "ul#todos");
    let existing = dom.element(list, "li.static");
    let class = ViewClass::<MemoryDom, TodoItem>::extend(dom.clone(), todo_options())?;

    let view = class.create(TodoItem::default())?;
    view.prepend_to(&list)?;
    let root = view.el().unwrap();
    assert_eq!(dom.children(list), vec![root, existing]);

    view.remove();
    assert_eq!(dom.children(list), vec![existing]);
    assert_eq!(dom.listener_count(), 0);
    assert_eq!(dom.dispatch(root, "keyup"), 0);
    Ok(())
}
