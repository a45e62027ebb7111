use anyhow::Result;
use carpe::core::{Member, NamespaceStore, Resolver};
use carpe::domain::{define, ConstructOptions, DomainMapping, DomainType};
use serde_json::{json, Value};
use std::rc::Rc;

fn post_type() -> Result<Rc<DomainType>> {
    let resolver = Resolver::new(NamespaceStore::new());
    let model = resolver.namespace("model")?;
    define(
        &model,
        "Post",
        &DomainMapping::new().field("title", "t").field("content", "c"),
    );

    let post = resolver
        .resolve_path("model.Post")?
        .as_domain()
        .cloned()
        .expect("Post is registered");
    Ok(post)
}

fn object(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_model_serializes_to_wire_format() -> Result<()> {
    let post = post_type()?;
    let instance = post.construct(
        ConstructOptions::default().with_model(object(json!({"title": "A", "content": "B"}))),
    );

    let wire: Value = serde_json::from_str(&serde_json::to_string(&instance)?)?;
    assert_eq!(wire, json!({"t": "A", "c": "B"}));
    Ok(())
}

#[test]
fn test_getters_on_payload_and_empty_instances() -> Result<()> {
    let post = post_type()?;
    let instance = post.from_payload(&json!({"t": "A", "c": "B"}))?;
    assert_eq!(instance.call("getTitle", None)?, Some(json!("A")));
    assert_eq!(instance.call("getContent", None)?, Some(json!("B")));

    let empty = post.construct(ConstructOptions::default());
    assert!(empty.is_empty());
    assert_eq!(empty.call("getTitle", None)?, None);
    assert_eq!(empty.call("getTitle", Some(json!(5)))?, Some(json!(5)));
    assert_eq!(empty.get_or("content", json!("none")), json!("none"));
    Ok(())
}

#[test]
fn test_payload_round_trip_is_exact() -> Result<()> {
    let post = post_type()?;
    let payload = json!({"c": "body", "t": "title"});

    let instance = post.from_payload(&payload)?;
    let again: Value = serde_json::from_str(&serde_json::to_string(&instance)?)?;
    assert_eq!(again, payload);
    Ok(())
}

#[test]
fn test_payload_and_model_construct_equal_instances() -> Result<()> {
    let post = post_type()?;
    let from_model = post.from_model(&json!({"content": "content", "title": "title"}))?;
    let from_payload = post.from_payload(&json!({"t": "title", "c": "content"}))?;
    assert_eq!(from_model, from_payload);
    Ok(())
}

#[test]
fn test_accessors_are_generated_per_field() -> Result<()> {
    let post = post_type()?;
    let names: Vec<_> = post.accessors().map(|a| a.name().to_string()).collect();
    assert_eq!(names, ["getTitle", "getContent"]);

    let title = post.accessor("getTitle").unwrap();
    let instance = post.from_model(&json!({"title": "A"}))?;
    assert_eq!(title.payload_key(), "t");
    assert_eq!(title.get(&instance), Some(&json!("A")));
    assert_eq!(title.get_or(&post.empty(), json!(0)), json!(0));
    Ok(())
}

#[test]
fn test_domain_type_is_a_namespace_member() -> Result<()> {
    let resolver = Resolver::new(NamespaceStore::new());
    let model = resolver.namespace("model.core")?;
    let money = define(&model, "Money", &DomainMapping::new().field("amount", "a"));

    let found = resolver.resolve(["model.core.Money"], |deps: Vec<Member>| deps[0].clone())?;
    assert!(Rc::ptr_eq(found.as_domain().unwrap(), &money));
    Ok(())
}
