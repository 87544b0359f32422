//! End-to-end behaviour of discovery, channels, instructions and
//! dependents, driven the way a host page would drive them.
//!
//! Run with: cargo test --test components

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{Value, json};

use spark_components::{
    BaseComponent, BroadcastFn, Component, ComponentBase, ComponentError, Document, Element,
    Endpoint, HostEvent, NodeId, Packet, Record, Result, Runtime, RuntimeConfig,
};
use spark_components::config::Attributes;
use spark_components::view::ScopedView;

// =============================================================================
// FIXTURES
// =============================================================================

type Log = Rc<RefCell<Vec<String>>>;

/// Records every message and broadcast it receives.
struct Recorder {
    base: ComponentBase,
    log: Log,
}

impl Component for Recorder {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn inited(&mut self, rt: &Runtime) -> Result<()> {
        let log = self.log.clone();
        let callback: BroadcastFn = Rc::new(
            move |component: &mut dyn Component, _rt: &Runtime, payload: &Value| {
                log.borrow_mut()
                    .push(format!("broadcast:{}:{payload}", component.base().id()));
                Ok(())
            },
        );
        self.listen(rt, "news", callback)
    }

    fn message(&mut self, _rt: &Runtime, channel: &str, payload: &Value) -> Result<()> {
        self.log
            .borrow_mut()
            .push(format!("{channel}:{}:{payload}", self.base.id()));
        Ok(())
    }

    fn call_custom(&mut self, _rt: &Runtime, method: &str, arg: &Value) -> Result<()> {
        match method {
            "note" => {
                self.log.borrow_mut().push(format!("note:{arg}"));
                Ok(())
            }
            "fail" => Err(ComponentError::custom("asked to fail")),
            _ => Err(ComponentError::UnknownMethod {
                component: self.base.name().to_string(),
                method: method.to_string(),
            }),
        }
    }
}

/// Relies entirely on the base behaviour.
struct Plain {
    base: ComponentBase,
}

impl Component for Plain {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }
}

/// Refuses to initialize when configured with `fail`.
struct Flaky {
    base: ComponentBase,
}

impl Component for Flaky {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn inited(&mut self, _rt: &Runtime) -> Result<()> {
        match self.base.config().get("fail") {
            Some(_) => Err(ComponentError::custom("refused to start")),
            None => Ok(()),
        }
    }
}

/// Re-broadcasts every message on `news`, which it also listens to.
struct Echo {
    base: ComponentBase,
    log: Log,
}

impl Component for Echo {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn inited(&mut self, rt: &Runtime) -> Result<()> {
        let log = self.log.clone();
        let callback: BroadcastFn = Rc::new(
            move |component: &mut dyn Component, _rt: &Runtime, payload: &Value| {
                log.borrow_mut()
                    .push(format!("{}:{payload}", component.base().id()));
                Ok(())
            },
        );
        self.listen(rt, "news", callback)
    }

    fn message(&mut self, rt: &Runtime, _channel: &str, payload: &Value) -> Result<()> {
        rt.broadcast("news", payload)
    }
}

fn item(id: &str, name: &str) -> Element {
    Element::new("li")
        .attr("data-scope", "item")
        .attr("data-id", id)
        .child(Element::new("span").attr("data-prop", "name").text(name))
}

fn list(channel: &str, items: Vec<Element>) -> Element {
    Element::new("ul")
        .attr("data-ui", "list")
        .attr("data-channel", channel)
        .children(items)
}

fn recorder(channel: &str) -> Element {
    Element::new("div")
        .attr("data-ui", "recorder")
        .attr("data-channel", channel)
}

/// Build a page from top-level elements. Returns the runtime and their nodes.
fn setup(elements: Vec<Element>) -> (Runtime, Vec<NodeId>) {
    setup_with(Runtime::builder(), elements)
}

fn setup_with(builder: spark_components::RuntimeBuilder, elements: Vec<Element>) -> (Runtime, Vec<NodeId>) {
    let mut doc = Document::new();
    let root = doc.root();
    let nodes = elements
        .iter()
        .map(|element| doc.append(root, element).unwrap())
        .collect();
    (builder.build(doc), nodes)
}

fn register_recorder(runtime: &Runtime) -> Log {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let shared = log.clone();
    runtime.register("recorder", move |base| Recorder {
        base,
        log: shared.clone(),
    });
    log
}

fn names(runtime: &Runtime, list: NodeId) -> Vec<String> {
    let doc = runtime.document();
    doc.by_attr(list, "data-prop")
        .into_iter()
        .map(|node| doc.value(node).unwrap_or_default().to_string())
        .collect()
}

// =============================================================================
// DISCOVERY
// =============================================================================

#[test]
fn test_ordinals_follow_document_order() {
    let (runtime, _) = setup(vec![
        list("a", vec![item("1", "x")]),
        list("b", vec![item("1", "x")]),
        list("c", vec![item("1", "x")]),
    ]);

    let constructed = runtime.find_and_init(runtime.root()).unwrap();
    assert_eq!(constructed, 3);

    let ids: Vec<usize> = runtime
        .instances("list")
        .iter()
        .map(|handle| handle.borrow().base().id())
        .collect();
    assert_eq!(ids, vec![0, 1, 2]);

    let channels: Vec<String> = runtime
        .instances("list")
        .iter()
        .map(|handle| handle.borrow().base().channel().unwrap_or_default().to_string())
        .collect();
    assert_eq!(channels, vec!["a", "b", "c"]);
}

#[test]
fn test_rediscovery_skips_bound_nodes() {
    let (runtime, _) = setup(vec![list("a", vec![item("1", "x")])]);
    let root = runtime.root();

    assert_eq!(runtime.find_and_init(root).unwrap(), 1);
    assert_eq!(runtime.find_and_init(root).unwrap(), 0);
    assert_eq!(runtime.instances("list").len(), 1);
    assert_eq!(runtime.push_subscribers("a"), 1);
}

#[test]
fn test_registered_factory_builds_custom_type() {
    let (runtime, nodes) = setup(vec![recorder("feed")]);
    let log = register_recorder(&runtime);
    assert!(runtime.is_registered("recorder"));

    runtime.find_and_init(runtime.root()).unwrap();

    let handle = runtime.component_at(nodes[0]).unwrap();
    assert_eq!(handle.borrow().base().name(), "recorder");

    // Custom methods and base methods share one instruction path
    let packet = Packet::instruct(
        "feed",
        vec![spark_components::Instruction::new("note", json!("hi"))],
    );
    runtime.push(&packet).unwrap();
    assert_eq!(*log.borrow(), vec![r#"note:"hi""#]);
}

#[test]
fn test_config_attribute_is_parsed() {
    let (runtime, _) = setup(vec![
        Element::new("form")
            .attr("data-ui", "search")
            .attr("data-config", "limit:10;sort:date"),
    ]);
    runtime.find_and_init(runtime.root()).unwrap();

    let handle = runtime.instance("search", 0).unwrap();
    let component = handle.borrow();
    assert_eq!(component.base().config().get("limit"), Some("10"));
    assert_eq!(component.base().config().get("sort"), Some("date"));
}

#[test]
fn test_failing_node_does_not_stop_discovery() {
    let flaky = |config: &str| {
        Element::new("div")
            .attr("data-ui", "flaky")
            .attr("data-channel", "jobs")
            .attr("data-config", config)
    };
    let (runtime, _) = setup(vec![flaky("retry:1"), flaky("fail:yes"), flaky("retry:2")]);
    runtime.register("flaky", |base| Flaky { base });

    assert_eq!(runtime.find_and_init(runtime.root()).unwrap(), 2);
    let failures = runtime.take_failures();
    assert_eq!(failures.len(), 1);
    assert!(matches!(&failures[0], ComponentError::Custom(message) if message == "refused to start"));

    // The failed node kept its ordinal and never subscribed
    let ids: Vec<usize> = runtime
        .instances("flaky")
        .iter()
        .map(|handle| handle.borrow().base().id())
        .collect();
    assert_eq!(ids, vec![0, 2]);
    assert!(runtime.instance("flaky", 1).is_none());
    assert!(runtime.instance("flaky", 2).is_some());
    assert_eq!(runtime.push_subscribers("jobs"), 2);
}

#[test]
fn test_failing_node_aborts_discovery_when_not_isolated() {
    let config = RuntimeConfig {
        isolate_failures: false,
        ..RuntimeConfig::default()
    };
    let (runtime, _) = setup_with(
        Runtime::builder().config(config),
        vec![
            Element::new("div").attr("data-ui", "flaky").attr("data-config", "fail:yes"),
            Element::new("div").attr("data-ui", "flaky"),
        ],
    );
    runtime.register("flaky", |base| Flaky { base });

    assert!(runtime.find_and_init(runtime.root()).is_err());
    assert!(runtime.instances("flaky").is_empty());
}

// =============================================================================
// CHANNELS
// =============================================================================

#[test]
fn test_push_reaches_subscribers_in_order() {
    let (runtime, _) = setup(vec![recorder("feed"), recorder("feed"), recorder("other")]);
    let log = register_recorder(&runtime);
    runtime.find_and_init(runtime.root()).unwrap();

    runtime.push(&Packet::new("feed", json!({"n": 1}))).unwrap();
    assert_eq!(*log.borrow(), vec![r#"feed:0:{"n":1}"#, r#"feed:1:{"n":1}"#]);

    // Unknown channel is a no-op
    log.borrow_mut().clear();
    runtime.push(&Packet::new("nobody", json!(1))).unwrap();
    assert!(log.borrow().is_empty());
}

#[test]
fn test_push_json_from_transport() {
    let (runtime, _) = setup(vec![recorder("feed")]);
    let log = register_recorder(&runtime);
    runtime.find_and_init(runtime.root()).unwrap();

    runtime.push_json(r#"{"channel": "feed", "payload": "ping"}"#).unwrap();
    assert_eq!(*log.borrow(), vec![r#"feed:0:"ping""#]);

    assert!(matches!(
        runtime.push_json("not json"),
        Err(ComponentError::Packet(_))
    ));
}

#[test]
fn test_broadcast_reaches_callbacks_in_order() {
    let (runtime, _) = setup(vec![recorder("feed"), recorder("feed")]);
    let log = register_recorder(&runtime);
    runtime.find_and_init(runtime.root()).unwrap();
    assert_eq!(runtime.broadcast_subscribers("news"), 2);

    runtime.broadcast("news", &json!("hello")).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![r#"broadcast:0:"hello""#, r#"broadcast:1:"hello""#]
    );

    log.borrow_mut().clear();
    runtime.broadcast("quiet", &json!(null)).unwrap();
    assert!(log.borrow().is_empty());
}

#[test]
fn test_reset_channels_keeps_broadcasts() {
    let (runtime, _) = setup(vec![recorder("feed")]);
    let log = register_recorder(&runtime);
    runtime.find_and_init(runtime.root()).unwrap();

    runtime.reset_channels();
    assert_eq!(runtime.push_subscribers("feed"), 0);
    assert_eq!(runtime.broadcast_subscribers("news"), 1);
    assert_eq!(runtime.instances("recorder").len(), 1);

    runtime.push(&Packet::new("feed", json!(1))).unwrap();
    runtime.broadcast("news", &json!(2)).unwrap();
    assert_eq!(*log.borrow(), vec!["broadcast:0:2"]);

    runtime.reset_broadcasts();
    assert_eq!(runtime.broadcast_subscribers("news"), 0);
}

#[test]
fn test_duplicate_broadcast_registration_delivers_twice() {
    let (runtime, _) = setup(vec![list("posts", vec![item("1", "a")])]);
    runtime.find_and_init(runtime.root()).unwrap();
    let owner = runtime.instance("list", 0).unwrap();

    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let shared = log.clone();
    let callback: BroadcastFn = Rc::new(
        move |component: &mut dyn Component, _rt: &Runtime, payload: &Value| {
            shared
                .borrow_mut()
                .push(format!("{}:{payload}", component.base().name()));
            Ok(())
        },
    );
    runtime.register_for_broadcast("news", callback.clone(), owner.clone());
    runtime.register_for_broadcast("news", callback, owner);
    assert_eq!(runtime.broadcast_subscribers("news"), 2);

    runtime.broadcast("news", &json!(1)).unwrap();
    assert_eq!(*log.borrow(), vec!["list:1", "list:1"]);
}

#[test]
fn test_broadcast_reaches_the_sending_component() {
    let (runtime, _) = setup(vec![
        Element::new("div").attr("data-ui", "echo").attr("data-channel", "feed"),
        Element::new("div").attr("data-ui", "echo"),
    ]);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let shared = log.clone();
    runtime.register("echo", move |base| Echo {
        base,
        log: shared.clone(),
    });
    runtime.find_and_init(runtime.root()).unwrap();

    runtime.push(&Packet::new("feed", json!("hi"))).unwrap();

    // The sender's own callback runs once its message handler returns
    assert_eq!(*log.borrow(), vec![r#"1:"hi""#, r#"0:"hi""#]);
    assert!(runtime.take_failures().is_empty());
}

// =============================================================================
// INSTRUCTIONS & RENDERING
// =============================================================================

#[test]
fn test_base_methods_on_registered_type() {
    let (runtime, nodes) = setup(vec![list("posts", vec![item("1", "a"), item("2", "b")])]);
    let built = Rc::new(Cell::new(0));
    let counter = built.clone();
    runtime.register("list", move |base| {
        counter.set(counter.get() + 1);
        Plain { base }
    });
    runtime.find_and_init(runtime.root()).unwrap();
    assert_eq!(built.get(), 1);

    let instruct = |raw: Value| runtime.push(&Packet::new("posts", json!({ "instruct": raw })));

    instruct(json!([["prepend", {"scope": "item", "id": "0", "values": {"name": "z"}}]])).unwrap();
    assert_eq!(names(&runtime, nodes[0]), vec!["z", "a", "b"]);

    instruct(json!([["delete", {"scope": "item", "id": "1"}]])).unwrap();
    assert_eq!(names(&runtime, nodes[0]), vec!["z", "b"]);

    instruct(json!([["revert"]])).unwrap();
    assert_eq!(names(&runtime, nodes[0]), vec!["a", "b"]);
    assert!(runtime.take_failures().is_empty());
}

#[test]
fn test_transform_leaves_other_scopes_alone() {
    let footer = Element::new("p")
        .attr("data-scope", "footer")
        .child(Element::new("span").attr("data-prop", "note").text("keep"));
    let (runtime, nodes) = setup(vec![list("posts", vec![item("1", "a"), item("2", "b"), footer])]);
    runtime.find_and_init(runtime.root()).unwrap();

    let handle = runtime.instance("list", 0).unwrap();
    let state = vec![Record::new("item").with_id("9").with_value("name", "x")];
    handle.borrow_mut().transform(&runtime, &state).unwrap();

    let doc = runtime.document();
    let scoped = doc.by_attr(nodes[0], "data-scope");
    let footer = scoped
        .iter()
        .copied()
        .find(|node| doc.attribute(*node, "data-scope") == Some("footer"))
        .unwrap();
    let items: Vec<_> = scoped
        .iter()
        .filter(|node| doc.attribute(**node, "data-scope") == Some("item"))
        .collect();

    assert_eq!(items.len(), 1);
    assert!(doc.is_attached(footer));
    assert_eq!(doc.text(doc.children(footer)[0]), Some("keep"));
}

#[test]
fn test_template_lookup_by_scope() {
    let template = item("", "").attr("data-template", "");
    let (runtime, _) = setup(vec![list("posts", vec![item("1", "a"), template])]);
    runtime.find_and_init(runtime.root()).unwrap();
    let handle = runtime.instance("list", 0).unwrap();

    let mut seen = None;
    handle
        .borrow()
        .base()
        .template("item", |template| seen = Some(template.views.len()));
    assert_eq!(seen, Some(1));

    let mut called = false;
    handle.borrow().base().template("missing", |_| called = true);
    assert!(!called);
}

#[test]
fn test_repeated_grow_and_shrink_recycles_nodes() {
    let (runtime, nodes) = setup(vec![list("posts", vec![item("1", "a")])]);
    runtime.find_and_init(runtime.root()).unwrap();
    let (slots, live) = {
        let doc = runtime.document();
        (doc.slots(), doc.len())
    };

    let packet = Packet::new(
        "posts",
        json!({"instruct": [
            ["append", {"scope": "item", "id": "2", "values": {"name": "b"}}],
            ["rollback"]
        ]}),
    );
    for _ in 0..200 {
        runtime.push(&packet).unwrap();
    }

    assert_eq!(names(&runtime, nodes[0]), vec!["a"]);
    let doc = runtime.document();
    // One appended item (li + span) is the most ever allocated at once
    assert_eq!(doc.slots(), slots + 2);
    assert_eq!(doc.len(), live);
}

#[test]
fn test_instruct_append_renders_new_item() {
    let (runtime, nodes) = setup(vec![list("posts", vec![item("1", "a")])]);
    runtime.find_and_init(runtime.root()).unwrap();

    runtime
        .push_json(
            r#"{"channel": "posts", "payload": {"instruct": [
                ["append", {"scope": "item", "id": "2", "values": {"name": "b"}}]
            ]}}"#,
        )
        .unwrap();
    assert_eq!(names(&runtime, nodes[0]), vec!["a", "b"]);

    runtime
        .push(&Packet::instruct(
            "posts",
            vec![spark_components::Instruction::bare("rollback")],
        ))
        .unwrap();
    assert_eq!(names(&runtime, nodes[0]), vec!["a"]);
}

#[test]
fn test_transform_empty_removes_scoped_nodes() {
    let (runtime, nodes) = setup(vec![list("posts", vec![item("1", "a"), item("2", "b")])]);
    runtime.find_and_init(runtime.root()).unwrap();

    let handle = runtime.instance("list", 0).unwrap();
    handle.borrow_mut().transform(&runtime, &[]).unwrap();

    assert!(runtime.document().by_attr(nodes[0], "data-scope").is_empty());
}

#[test]
fn test_transform_after_clear_uses_template() {
    let template = item("", "")
        .attr("data-template", "");
    let (runtime, nodes) = setup(vec![list("posts", vec![item("1", "a"), template])]);
    runtime.find_and_init(runtime.root()).unwrap();

    let handle = runtime.instance("list", 0).unwrap();
    assert!(handle.borrow().template("item").is_some());
    handle.borrow_mut().transform(&runtime, &[]).unwrap();

    let state = vec![Record::new("item").with_id("5").with_value("name", "back")];
    handle.borrow_mut().transform(&runtime, &state).unwrap();
    assert_eq!(names(&runtime, nodes[0]), vec!["back"]);
}

#[test]
fn test_empty_placeholder_is_replaced_before_instructions() {
    let placeholder = Element::new("li")
        .attr("data-scope", "post")
        .attr("data-version", "empty")
        .child(Element::new("span").attr("data-prop", "title").text("Nothing yet"));
    let template = Element::new("li")
        .attr("data-template", "")
        .attr("data-scope", "post")
        .attr("data-version", "full")
        .child(Element::new("span").attr("data-prop", "title"));
    let (runtime, nodes) = setup(vec![
        Element::new("ul")
            .attr("data-ui", "posts")
            .attr("data-channel", "posts")
            .children([placeholder, template]),
    ]);
    runtime.find_and_init(runtime.root()).unwrap();

    runtime
        .push_json(
            r#"{"channel": "posts", "payload": {"instruct": [
                ["transform", [{"scope": "post", "id": "1", "values": {"title": "Hello"}}]]
            ]}}"#,
        )
        .unwrap();

    // Rendering the template is deferred; nothing has run yet
    assert_eq!(runtime.pending_tasks(), 1);
    assert_eq!(names(&runtime, nodes[0]), vec!["Nothing yet"]);

    assert_eq!(runtime.run_pending(), 1);
    assert_eq!(names(&runtime, nodes[0]), vec!["Hello"]);

    let doc = runtime.document();
    let posts = doc.by_attr(nodes[0], "data-scope");
    assert_eq!(posts.len(), 1);
    assert_ne!(doc.attribute(posts[0], "data-version"), Some("empty"));
    assert_eq!(doc.attribute(posts[0], "data-id"), Some("1"));
}

#[test]
fn test_second_batch_before_placeholder_render_still_runs() {
    let placeholder = Element::new("li")
        .attr("data-scope", "post")
        .attr("data-version", "empty")
        .child(Element::new("span").attr("data-prop", "title").text("Nothing yet"));
    let template = Element::new("li")
        .attr("data-template", "")
        .attr("data-scope", "post")
        .child(Element::new("span").attr("data-prop", "title"));
    let (runtime, nodes) = setup(vec![
        Element::new("ul")
            .attr("data-ui", "posts")
            .attr("data-channel", "posts")
            .children([placeholder, template]),
    ]);
    runtime.find_and_init(runtime.root()).unwrap();

    runtime
        .push_json(
            r#"{"channel": "posts", "payload": {"instruct": [
                ["transform", [{"scope": "post", "id": "1", "values": {"title": "Hello"}}]]
            ]}}"#,
        )
        .unwrap();
    runtime
        .push_json(
            r#"{"channel": "posts", "payload": {"instruct": [
                ["transform", [
                    {"scope": "post", "id": "1", "values": {"title": "Hello"}},
                    {"scope": "post", "id": "2", "values": {"title": "World"}}
                ]]
            ]}}"#,
        )
        .unwrap();
    assert_eq!(runtime.pending_tasks(), 2);

    assert_eq!(runtime.run_pending(), 2);
    assert!(runtime.take_failures().is_empty());
    assert_eq!(names(&runtime, nodes[0]), vec!["Hello", "World"]);
}

#[test]
fn test_instruct_endpoint_override() {
    struct Uppercase;

    impl Endpoint for Uppercase {
        fn apply(
            &self,
            doc: &mut Document,
            attrs: &Attributes,
            view: &ScopedView,
            state: &[Record],
        ) -> Result<()> {
            let shouted: Vec<Record> = state
                .iter()
                .map(|record| {
                    let mut record = record.clone();
                    for value in record.values.values_mut() {
                        *value = value.to_uppercase();
                    }
                    record
                })
                .collect();
            spark_components::Binder.apply(doc, attrs, view, &shouted)
        }
    }

    let builder = Runtime::builder().instruct_endpoint(Uppercase);
    let (runtime, nodes) = setup_with(builder, vec![list("posts", vec![item("1", "a")])]);
    runtime.find_and_init(runtime.root()).unwrap();

    runtime
        .push(&Packet::instruct(
            "posts",
            vec![spark_components::Instruction::new(
                "append",
                json!({"scope": "item", "values": {"name": "b"}}),
            )],
        ))
        .unwrap();
    assert_eq!(names(&runtime, nodes[0]), vec!["A", "B"]);
}

// =============================================================================
// EVENTS & DEPENDENTS
// =============================================================================

fn profile_page() -> Element {
    Element::new("div")
        .attr("data-ui", "profile")
        .child(
            Element::new("section")
                .attr("data-scope", "person")
                .attr("data-id", "1")
                .child(
                    Element::new("input")
                        .attr("data-prop", "name")
                        .attr("value", "Ann"),
                ),
        )
        .child(
            Element::new("p").attr("data-ui", "greeting").child(
                Element::new("span")
                    .attr("data-scope", "line")
                    .child(Element::new("b").attr("data-prop", "text")),
            ),
        )
}

fn greet(state: &[Record]) -> Vec<Record> {
    state
        .iter()
        .filter(|record| record.scope == "person")
        .map(|record| {
            Record::new("line").with_value("text", format!("Hello {}", record.value("name").unwrap_or("?")))
        })
        .collect()
}

#[test]
fn test_dependent_follows_parent_mutations() {
    let (runtime, nodes) = setup(vec![profile_page()]);
    runtime.register("greeting", |mut base: ComponentBase| {
        base.set_dependent(Rc::new(greet));
        BaseComponent::new(base)
    });
    runtime.find_and_init(runtime.root()).unwrap();

    let greeting = runtime.instance("greeting", 0).unwrap();
    let greeting_node = greeting.borrow().base().node();
    assert!(greeting.borrow().base().is_dependent());
    assert_eq!(names(&runtime, greeting_node), vec!["Hello Ann"]);

    let input = runtime.document().by_attr(nodes[0], "value")[0];
    runtime.document_mut().set_value(input, "Bob");

    assert!(runtime.dispatch(HostEvent::change(input)));
    assert_eq!(names(&runtime, greeting_node), vec!["Hello Bob"]);
    assert!(runtime.take_failures().is_empty());

    // Parent state was committed
    let profile = runtime.instance("profile", 0).unwrap();
    let state = profile.borrow().base().state().current();
    assert_eq!(state[0].value("name"), Some("Bob"));
}

#[test]
fn test_parent_record_lookup() {
    let (runtime, _) = setup(vec![
        Element::new("section")
            .attr("data-scope", "thread")
            .attr("data-id", "42")
            .child(Element::new("div").attr("data-ui", "replies")),
    ]);
    runtime.find_and_init(runtime.root()).unwrap();

    let replies = runtime.instance("replies", 0).unwrap();
    let parent = replies.borrow().parent(&runtime).unwrap();
    assert_eq!(parent.scope, "thread");
    assert_eq!(parent.id.as_deref(), Some("42"));
}

#[test]
fn test_change_inside_form_is_left_to_submit() {
    let (runtime, nodes) = setup(vec![
        Element::new("form").attr("data-ui", "search").child(
            Element::new("label")
                .attr("data-scope", "query")
                .child(Element::new("input").attr("data-prop", "q").attr("value", "")),
        ),
    ]);
    runtime.find_and_init(runtime.root()).unwrap();
    let input = runtime.document().by_attr(nodes[0], "value")[0];

    assert!(!runtime.dispatch(HostEvent::change(input)));
    assert!(runtime.dispatch(HostEvent::submit(input)));
}

// =============================================================================
// FAILURES
// =============================================================================

#[test]
fn test_failing_subscriber_is_isolated() {
    let (runtime, _) = setup(vec![recorder("feed"), recorder("feed")]);
    let log = register_recorder(&runtime);
    runtime.find_and_init(runtime.root()).unwrap();

    let packet = Packet::new("feed", json!({"instruct": [["fail"]]}));
    runtime.push(&packet).unwrap();
    let failures = runtime.take_failures();
    assert_eq!(failures.len(), 2);
    assert!(matches!(failures[0], ComponentError::Custom(_)));

    // Later subscribers still ran
    runtime.push(&Packet::new("feed", json!(3))).unwrap();
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_failures_propagate_when_not_isolated() {
    let config = RuntimeConfig {
        isolate_failures: false,
        ..RuntimeConfig::default()
    };
    let (runtime, _) = setup_with(
        Runtime::builder().config(config),
        vec![recorder("feed"), recorder("feed")],
    );
    let log = register_recorder(&runtime);
    runtime.find_and_init(runtime.root()).unwrap();

    let packet = Packet::new("feed", json!({"instruct": [["note", 1], ["fail"]]}));
    assert!(runtime.push(&packet).is_err());
    // First subscriber ran up to the failure, second never ran
    assert_eq!(*log.borrow(), vec!["note:1"]);
}

#[test]
fn test_unknown_method_is_reported() {
    let (runtime, _) = setup(vec![list("posts", vec![item("1", "a")])]);
    runtime.find_and_init(runtime.root()).unwrap();

    runtime
        .push(&Packet::new("posts", json!({"instruct": [["explode"]]})))
        .unwrap();
    let failures = runtime.take_failures();
    assert!(matches!(
        &failures[..],
        [ComponentError::UnknownMethod { method, .. }] if method == "explode"
    ));
}
