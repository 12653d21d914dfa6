//! Browser tests for the wasm facade. Run with `wasm-pack test --headless`.

#![cfg(target_arch = "wasm32")]

use kg_view_wasm::GraphViewWasm;
use kg_view_wasm::store::{ConversationStore, LocalStorage};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn ready_view() -> GraphViewWasm {
    let config = js_sys::JSON::parse(r#"{"debounceMs": 0}"#).unwrap();
    let mut view = GraphViewWasm::new(config);
    view.resize(800.0, 600.0);
    view.load_sample();
    view
}

#[wasm_bindgen_test]
fn test_sample_ticks() {
    let mut view = ready_view();
    assert!(view.frame());
    assert_eq!(view.total_nodes(), 7);
    assert_eq!(view.positions().length(), 14);
    assert_eq!(view.status(), "Laying out");
}

#[wasm_bindgen_test]
fn test_invalid_dataset_does_not_throw() {
    let mut view = ready_view();
    assert!(!view.load_dataset(JsValue::from_str("nope")));
    assert!(!view.load_dataset_json(r#"{"links": []}"#));
    assert!(view.status().starts_with("Error"));
    assert!(!view.frame());
    assert!(view.snapshot().is_null());
}

#[wasm_bindgen_test]
fn test_drag_holds_position() {
    let mut view = ready_view();
    view.frame();
    assert!(view.on_node_drag_start("numpy"));
    assert!(view.on_node_drag_move("numpy", 100.0, 200.0));
    view.frame();

    let positions = view.positions().to_vec();
    let snapshot = view.snapshot();
    let nodes = js_sys::Reflect::get(&snapshot, &JsValue::from_str("nodes")).unwrap();
    let nodes = js_sys::Array::from(&nodes);
    let slot = (0..nodes.length())
        .find(|&i| {
            js_sys::Reflect::get(&nodes.get(i), &JsValue::from_str("id"))
                .ok()
                .and_then(|id| id.as_string())
                .as_deref()
                == Some("numpy")
        })
        .unwrap() as usize;
    assert_eq!(positions[slot * 2], 100.0);
    assert_eq!(positions[slot * 2 + 1], 200.0);

    assert!(view.on_node_drag_end("numpy"));
    assert!(!view.on_node_drag_move("ghost", 1.0, 1.0));
}

#[wasm_bindgen_test]
fn test_limits_round_trip() {
    let mut view = ready_view();
    view.frame();
    let applied = view.set_limits(0, 0);
    let max_nodes = js_sys::Reflect::get(&applied, &JsValue::from_str("maxNodes")).unwrap();
    assert_eq!(max_nodes.as_f64(), Some(7.0));

    let strategy = js_sys::JSON::parse(r#"{"kind": "randomized", "seed": 7}"#).unwrap();
    assert!(view.set_strategy(strategy));
    assert!(!view.set_strategy(JsValue::from_str("sideways")));
}

#[wasm_bindgen_test]
fn test_local_storage_round_trip() {
    let graph = serde_json::json!({
        "nodes": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}],
        "links": [{"source": "a", "target": "b", "relation": "rel"}],
    });
    let mut store = ConversationStore::init(LocalStorage::open().unwrap()).unwrap();
    store.upsert_graph("web-round-trip", graph).unwrap();
    store.set_active("web-round-trip").unwrap();

    let reopened = ConversationStore::init(LocalStorage::open().unwrap()).unwrap();
    assert_eq!(reopened.active().unwrap().id, "web-round-trip");
    assert_eq!(reopened.active_dataset().unwrap().degree("a"), 1);
}

#[wasm_bindgen_test]
fn test_load_conversation_from_local_storage() {
    let mut view = ready_view();
    let graph = js_sys::JSON::parse(
        r#"{"nodes": [{"id": "x"}, {"id": "y"}, {"id": "z"}],
            "links": [{"source": "x", "target": "y", "relation": "r"},
                      {"source": "y", "target": "x", "relation": "r"}]}"#,
    )
    .unwrap();
    assert!(view.store_conversation_graph("web-load", graph));
    assert!(view.load_conversation("web-load"));
    assert_eq!(view.total_nodes(), 3);
    assert_eq!(view.total_links(), 1);

    assert!(view.store_conversation_graph("web-empty", js_sys::Object::new().into()));
    assert!(!view.load_conversation("web-empty"));
    assert!(!view.load_conversation("web-missing"));
}
