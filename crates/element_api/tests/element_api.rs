use core_types::{BatchSeq, UniqueId};
use dom::snapshot::TreeSnapshot;
use dom::{CrossThreadEvent, EncodedBatch, ObjectLog, Operation};
use element_api::{
    ApiError, ElementApi, ElementApiConfig, EventInfo, EventKind, FlushOptions, InlineStyles,
    ListCallbacks,
};
use replay::{Replayer, ShadowTree};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn api() -> ElementApi<ObjectLog> {
    ElementApi::new(ObjectLog::new(), ElementApiConfig::default())
}

fn attr(api: &ElementApi<ObjectLog>, uid: UniqueId, key: &str) -> Option<String> {
    api.get_attribute_by_name(uid, key).unwrap()
}

#[test]
fn created_elements_carry_bookkeeping_attributes() {
    let mut api = api();
    let page = api.create_page("page-comp", 7).unwrap();
    let view = api.create_view(page).unwrap();
    assert_eq!(attr(&api, view, "x-tag").as_deref(), Some("view"));
    assert_eq!(attr(&api, view, "x-uid"), Some(view.to_string()));
    assert_eq!(attr(&api, view, "x-parent-comp-uid"), Some(page.to_string()));
    assert_eq!(attr(&api, view, "x-css-id").as_deref(), Some("7"));

    let raw = api.create_raw_text("hello").unwrap();
    assert_eq!(attr(&api, raw, "text").as_deref(), Some("hello"));
    assert_eq!(attr(&api, raw, "x-css-id"), None);
    assert_eq!(api.get_tag(raw).unwrap(), "raw-text");
}

#[test]
fn zero_css_id_is_not_inherited() {
    let mut api = api();
    let comp = api.create_component(UniqueId::INVALID, "c1", 0, "card").unwrap();
    let child = api.create_text(comp).unwrap();
    assert_eq!(attr(&api, child, "x-css-id"), None);
    assert_eq!(attr(&api, comp, "name").as_deref(), Some("card"));
    assert_eq!(api.get_component_id(comp).unwrap().as_deref(), Some("c1"));
}

#[test]
fn tag_map_changes_element_tag_but_not_logical_tag() {
    let mut config = ElementApiConfig::default();
    config.tag_map.insert("view".into(), "x-view".into());
    let mut api = ElementApi::new(ObjectLog::new(), config);
    let view = api.create_view(UniqueId::INVALID).unwrap();
    assert_eq!(api.document().tag(view).unwrap(), "x-view");
    assert_eq!(api.get_tag(view).unwrap(), "view");
}

#[test]
fn page_defaults_follow_config() {
    let config = ElementApiConfig {
        default_display_linear: false,
        default_overflow_visible: true,
        ..ElementApiConfig::default()
    };
    let mut api = ElementApi::new(ObjectLog::new(), config);
    let page = api.create_page("0", 0).unwrap();
    assert_eq!(attr(&api, page, "part").as_deref(), Some("page"));
    assert_eq!(attr(&api, page, "x-template").as_deref(), Some(""));
    assert_eq!(attr(&api, page, "x-default-display-linear").as_deref(), Some("false"));
    assert_eq!(attr(&api, page, "x-default-overflow-visible").as_deref(), Some("true"));
    assert_eq!(api.get_page_element(), Some(page));
}

#[test]
fn flush_attaches_the_page_once() {
    let mut api = api();
    let page = api.create_page("0", 0).unwrap();
    let first = api.flush(FlushOptions::default()).unwrap();
    assert!(first.batch.contains(&Operation::Append {
        uid: UniqueId::ROOT,
        children: vec![page],
    }));
    assert_eq!(api.get_parent(page).unwrap(), Some(UniqueId::ROOT));

    let second = api.flush(FlushOptions::default()).unwrap();
    assert!(second.batch.is_empty());
}

#[test]
fn disposed_page_stays_detached() {
    let mut api = api();
    let page = api.create_page("0", 0).unwrap();
    api.set_attribute(page, "x-disposed", Some("")).unwrap();
    api.flush(FlushOptions::default()).unwrap();
    assert_eq!(api.get_parent(page).unwrap(), None);
}

#[test]
fn set_attribute_none_removes_and_tracks_flags() {
    let mut api = api();
    let view = api.create_view(UniqueId::INVALID).unwrap();
    api.set_attribute(view, "exposure-id", Some("a")).unwrap();
    api.set_attribute(view, "exposure-area", Some("50%")).unwrap();
    api.set_attribute(view, "__timing_flag", Some("first-paint")).unwrap();
    api.set_attribute(view, "__timing_flag", Some("")).unwrap();
    api.set_attribute(view, "exposure-id", None).unwrap();
    assert_eq!(attr(&api, view, "exposure-id"), None);

    let flushed = api
        .flush(FlushOptions {
            pipeline_id: Some("p1".into()),
        })
        .unwrap();
    assert_eq!(flushed.timing_flags, vec!["first-paint".to_string()]);
    assert_eq!(flushed.exposure_changed, vec![view]);
    assert_eq!(flushed.options.pipeline_id.as_deref(), Some("p1"));

    let next = api.flush(FlushOptions::default()).unwrap();
    assert!(next.timing_flags.is_empty() && next.exposure_changed.is_empty());
}

#[test]
fn classes_ids_and_css_ids() {
    let mut api = api();
    let view = api.create_view(UniqueId::INVALID).unwrap();
    api.add_class(view, "a").unwrap();
    api.add_class(view, "b").unwrap();
    assert_eq!(api.get_classes(view).unwrap(), vec!["a", "b"]);
    api.set_classes(view, Some("c  d")).unwrap();
    assert_eq!(api.get_classes(view).unwrap(), vec!["c", "d"]);
    api.set_classes(view, None).unwrap();
    assert!(api.get_classes(view).unwrap().is_empty());

    api.set_id(view, Some("main")).unwrap();
    assert_eq!(api.get_id(view).unwrap().as_deref(), Some("main"));

    api.set_css_id(&[view], 3, Some("entry")).unwrap();
    assert_eq!(attr(&api, view, "x-css-id").as_deref(), Some("3"));
    assert_eq!(attr(&api, view, "x-e-name").as_deref(), Some("entry"));
}

#[test]
fn inline_styles_replace_and_remove() {
    let mut api = api();
    let view = api.create_view(UniqueId::INVALID).unwrap();
    api.add_inline_style(view, "backgroundColor", Some("red")).unwrap();
    api.add_inline_style(view, "width", Some("10px !important")).unwrap();
    assert_eq!(
        api.get_inline_styles(view).unwrap(),
        vec![
            ("background-color".to_string(), "red".to_string()),
            ("width".to_string(), "10px".to_string()),
        ]
    );
    api.add_inline_style(view, "width", None).unwrap();

    api.set_inline_styles(view, InlineStyles::Text("color: blue; margin: 0"))
        .unwrap();
    assert_eq!(
        api.get_inline_styles(view).unwrap(),
        vec![
            ("color".to_string(), "blue".to_string()),
            ("margin".to_string(), "0".to_string()),
        ]
    );
    api.set_inline_styles(view, InlineStyles::Pairs(&[("fontSize", "12px")]))
        .unwrap();
    assert_eq!(
        api.get_inline_styles(view).unwrap(),
        vec![("font-size".to_string(), "12px".to_string())]
    );
    api.set_inline_styles(view, InlineStyles::Text("")).unwrap();
    assert_eq!(api.get_inline_styles(view).unwrap().len(), 1);
}

#[test]
fn dataset_and_config_stay_on_the_main_thread() {
    let mut api = api();
    let view = api.create_view(UniqueId::INVALID).unwrap();
    api.add_dataset(view, "index", json!(3)).unwrap();
    api.add_config(view, "mode", json!("fast")).unwrap();
    assert_eq!(api.get_data_by_key(view, "index").unwrap(), Some(json!(3)));
    assert_eq!(api.get_dataset(view).unwrap().len(), 1);
    assert_eq!(api.get_config(view).unwrap()["mode"], json!("fast"));

    let batch = api.flush(FlushOptions::default()).unwrap().batch;
    assert!(batch.iter().all(|op| !matches!(
        op,
        Operation::SetAttribute { key, .. } if key == "index" || key == "mode"
    )));

    api.set_dataset(view, serde_json::Map::new()).unwrap();
    assert_eq!(api.get_data_by_key(view, "index").unwrap(), None);
    assert!(matches!(
        api.get_dataset(UniqueId(99)),
        Err(ApiError::Dom(dom::DomError::UnknownElement(UniqueId(99))))
    ));
}

#[test]
fn tree_helpers_mirror_the_document() {
    let mut api = api();
    let parent = api.create_view(UniqueId::INVALID).unwrap();
    let kids: Vec<_> = (0..4)
        .map(|_| api.create_view(UniqueId::INVALID).unwrap())
        .collect();
    for kid in &kids {
        api.append_element(parent, *kid).unwrap();
    }
    assert_eq!(api.first_element(parent).unwrap(), Some(kids[0]));
    assert_eq!(api.last_element(parent).unwrap(), Some(kids[3]));
    assert_eq!(api.next_element(kids[1]).unwrap(), Some(kids[2]));

    api.swap_element(kids[0], kids[2]).unwrap();
    assert_eq!(api.get_children(parent).unwrap(), vec![kids[2], kids[1], kids[0], kids[3]]);
    api.swap_element(kids[1], kids[0]).unwrap();
    assert_eq!(api.get_children(parent).unwrap(), vec![kids[2], kids[0], kids[1], kids[3]]);

    let fresh = api.create_view(UniqueId::INVALID).unwrap();
    api.replace_elements(parent, &[fresh], &[kids[0], kids[1]]).unwrap();
    assert_eq!(api.get_children(parent).unwrap(), vec![kids[2], fresh, kids[3]]);

    let removed = api.remove_element(parent, fresh).unwrap();
    assert_eq!(removed, fresh);
    assert!(api.element_is_equal(removed, fresh));

    let detached = api.create_view(UniqueId::INVALID).unwrap();
    assert!(matches!(
        api.swap_element(detached, kids[2]),
        Err(ApiError::Detached(uid)) if uid == detached
    ));
}

#[test]
fn swapping_an_element_with_its_ancestor_changes_nothing() {
    let mut api = api();
    let outer = api.create_view(UniqueId::INVALID).unwrap();
    let inner = api.create_view(UniqueId::INVALID).unwrap();
    let sibling = api.create_view(UniqueId::INVALID).unwrap();
    api.append_element(UniqueId::ROOT, outer).unwrap();
    api.append_element(UniqueId::ROOT, sibling).unwrap();
    api.append_element(outer, inner).unwrap();
    let _ = api.document_mut().commit();

    for (a, b) in [(inner, outer), (outer, inner)] {
        assert!(matches!(
            api.swap_element(a, b),
            Err(ApiError::Dom(dom::DomError::HierarchyRequest { child, .. })) if child == outer
        ));
    }
    assert!(!api.document().has_pending());
    assert_eq!(api.get_children(UniqueId::ROOT).unwrap(), vec![outer, sibling]);
    assert_eq!(api.get_parent(inner).unwrap(), Some(outer));
}

#[test]
fn template_parts_skip_nested_templates() {
    let mut api = api();
    let template = api.create_view(UniqueId::INVALID).unwrap();
    api.mark_template_element(template).unwrap();
    let title = api.create_text(UniqueId::INVALID).unwrap();
    let nested = api.create_view(UniqueId::INVALID).unwrap();
    let inner = api.create_text(UniqueId::INVALID).unwrap();
    api.mark_part_element(title, "title").unwrap();
    api.mark_template_element(nested).unwrap();
    api.mark_part_element(nested, "slot").unwrap();
    api.mark_part_element(inner, "inner").unwrap();
    api.append_element(nested, inner).unwrap();
    api.append_element(template, title).unwrap();
    api.append_element(template, nested).unwrap();

    let parts = api.get_template_parts(template).unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts["title"], title);
    assert_eq!(parts["slot"], nested);
}

#[test]
fn update_list_info_drives_callbacks_at_flush() {
    let mut api = api();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let inserts = Rc::clone(&calls);
    let removals = Rc::clone(&calls);
    let list = api
        .create_list(
            UniqueId::INVALID,
            ListCallbacks::new(
                move |api: &mut ElementApi<ObjectLog>, list, position| {
                    let item = api.create_view(UniqueId::INVALID).unwrap();
                    api.append_element(list, item).unwrap();
                    inserts.borrow_mut().push(format!("insert {position}"));
                },
                move |_api: &mut ElementApi<ObjectLog>, _list, position| {
                    removals.borrow_mut().push(format!("enqueue {position}"));
                },
            ),
        )
        .unwrap();
    api.set_attribute(
        list,
        "update-list-info",
        Some(r#"{"insertAction":[{"position":0},{"position":1}],"removeAction":[{"position":5}]}"#),
    )
    .unwrap();
    assert!(calls.borrow().is_empty());
    assert_eq!(attr(&api, list, "update-list-info"), None);

    api.flush(FlushOptions::default()).unwrap();
    assert_eq!(*calls.borrow(), vec!["insert 0", "insert 1", "enqueue 5"]);
    assert_eq!(api.get_children(list).unwrap().len(), 2);

    let err = api
        .set_attribute(list, "update-list-info", Some("not json"))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidListInfo { uid, .. } if uid == list));
}

#[test]
fn handlers_are_tracked_per_name_and_phase() {
    let mut api = api();
    let view = api.create_view(UniqueId::INVALID).unwrap();
    api.add_event(view, EventKind::Bind, "Tap", Some("onTap")).unwrap();
    api.add_event(view, EventKind::CaptureCatch, "tap", Some("onTapCapture"))
        .unwrap();
    assert_eq!(api.get_event(view, "tap", EventKind::Catch).unwrap().as_deref(), Some("onTap"));
    assert_eq!(
        api.get_events(view).unwrap(),
        vec![
            EventInfo {
                kind: EventKind::Bind,
                name: "tap".into(),
                handler: "onTap".into(),
            },
            EventInfo {
                kind: EventKind::CaptureCatch,
                name: "tap".into(),
                handler: "onTapCapture".into(),
            },
        ]
    );
    assert_eq!(api.document().listener_count(view), 2);

    api.add_event(view, EventKind::Bind, "tap", None).unwrap();
    assert_eq!(api.get_event(view, "tap", EventKind::Bind).unwrap(), None);
    assert_eq!(api.document().listener_count(view), 1);

    api.set_events(
        view,
        &[EventInfo {
            kind: EventKind::Bind,
            name: "scroll".into(),
            handler: "onScroll".into(),
        }],
    )
    .unwrap();
    assert_eq!(api.get_events(view).unwrap().len(), 2);
}

#[test]
fn exposure_events_add_a_placeholder_exposure_id() {
    let mut api = api();
    let view = api.create_view(UniqueId::INVALID).unwrap();
    api.add_event(view, EventKind::Bind, "uiappear", Some("seen")).unwrap();
    assert_eq!(attr(&api, view, "exposure-id").as_deref(), Some("-1"));
    api.add_event(view, EventKind::Bind, "uiappear", None).unwrap();
    assert_eq!(attr(&api, view, "exposure-id"), None);

    api.set_attribute(view, "exposure-id", Some("real")).unwrap();
    api.add_event(view, EventKind::Bind, "uidisappear", Some("gone")).unwrap();
    api.add_event(view, EventKind::Bind, "uidisappear", None).unwrap();
    assert_eq!(attr(&api, view, "exposure-id").as_deref(), Some("real"));
}

#[test]
fn dispatch_publishes_handlers_with_component_routing() {
    let mut api = api();
    let page = api.create_page("page", 0).unwrap();
    let comp = api.create_component(page, "card-1", 2, "card").unwrap();
    let button = api.create_view(comp).unwrap();
    let label = api.create_text(page).unwrap();
    api.append_element(page, comp).unwrap();
    api.append_element(comp, button).unwrap();
    api.append_element(button, label).unwrap();
    api.add_event(label, EventKind::Bind, "tap", Some("onLabel")).unwrap();
    api.add_event(button, EventKind::Catch, "tap", Some("onButton")).unwrap();
    api.add_event(page, EventKind::Bind, "tap", Some("onPage")).unwrap();

    let published = api.dispatch_event(&CrossThreadEvent::new("tap", label, true));
    let handlers: Vec<_> = published.iter().map(|p| p.handler.as_str()).collect();
    assert_eq!(handlers, vec!["onLabel", "onButton"]);
    assert_eq!(published[0].component_id, None);
    assert_eq!(published[1].component_id.as_deref(), Some("card-1"));
    assert_eq!(published[1].current_target, button);
    assert_eq!(published[1].event.target, label);
}

#[test]
fn flushed_batches_replay_into_the_same_tree() {
    let mut api = api();
    let page = api.create_page("page", 1).unwrap();
    let view = api.create_view(page).unwrap();
    api.append_element(page, view).unwrap();
    api.set_inline_styles(view, InlineStyles::Text("color: red")).unwrap();
    api.add_event(view, EventKind::Bind, "tap", Some("onTap")).unwrap();
    let batch: EncodedBatch = api.flush(FlushOptions::default()).unwrap().batch.into();

    let mut replayer = Replayer::new(ShadowTree::new());
    replayer.apply_batch(BatchSeq::INITIAL, &batch).unwrap();
    assert_eq!(
        TreeSnapshot::of(api.document()).as_lines(),
        TreeSnapshot::of(replayer.tree()).as_lines()
    );
}
