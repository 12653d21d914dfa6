//! KG View - WASM Module
//!
//! The layout core of a knowledge-graph view. It reduces a possibly large
//! `{nodes, links}` dataset to a bounded, connected subset and lays that
//! subset out with a force simulation, emitting one snapshot per tick for the
//! host to draw. It is compiled to WebAssembly and exposes a
//! JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: Immutable dataset with degree index and petgraph adjacency
//! - `selection`: Subset selection under node and link limits
//! - `layout`: Generation-scoped force layout and per-tick snapshots
//! - `spatial`: R-tree hit index for pointer events
//! - `interaction`: Drag-to-pin
//! - `view`: Binds dataset, limits and viewport to the layout engine
//! - `store`: Per-conversation graphs behind a storage port

use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod selection;
pub mod spatial;
pub mod store;
pub mod view;

use error::{DatasetError, ViewError};
use graph::{GraphDataset, RawDataset};
use selection::SelectionStrategy;
use view::{GraphView, ViewConfig};

/// Initialize the WASM module: browser console logging and panic messages.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::debug!("kg-view initialized");
}

/// Host clock in milliseconds.
fn now_ms() -> f64 {
    js_sys::Date::now()
}

fn to_js<T: serde::Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|error| {
        log::warn!("failed to convert value for JS: {error}");
        JsValue::NULL
    })
}

/// Main entry point for the graph view.
///
/// Nothing here throws: failures are logged, reflected in `status()`, and
/// reported through boolean return values.
#[wasm_bindgen]
pub struct GraphViewWasm {
    view: GraphView,
}

#[wasm_bindgen]
impl GraphViewWasm {
    /// Create a view. `config` is a partial `ViewConfig` object, or
    /// `undefined` for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Self {
        let config = if config.is_undefined() || config.is_null() {
            ViewConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).unwrap_or_else(|error| {
                log::warn!("invalid view config, using defaults: {error}");
                ViewConfig::default()
            })
        };
        Self {
            view: GraphView::new(config),
        }
    }

    // =========================================================================
    // Dataset
    // =========================================================================

    /// Replace the dataset with a `{nodes, links}` object.
    ///
    /// Returns false (and sets an error status) if the object is malformed.
    #[wasm_bindgen(js_name = loadDataset)]
    pub fn load_dataset(&mut self, dataset: JsValue) -> bool {
        let parsed = serde_wasm_bindgen::from_value::<RawDataset>(dataset)
            .map_err(|error| DatasetError::Malformed(error.to_string()))
            .and_then(GraphDataset::try_from);
        match parsed {
            Ok(dataset) => {
                self.view.load_dataset(dataset, now_ms());
                true
            }
            Err(error) => {
                self.view.reject_dataset(ViewError::from(error));
                false
            }
        }
    }

    /// Replace the dataset from JSON text.
    #[wasm_bindgen(js_name = loadDatasetJson)]
    pub fn load_dataset_json(&mut self, text: &str) -> bool {
        self.view.load_dataset_json(text, now_ms()).is_ok()
    }

    /// Load the bundled sample dataset.
    #[wasm_bindgen(js_name = loadSample)]
    pub fn load_sample(&mut self) {
        self.view.load_dataset(GraphDataset::bundled_sample(), now_ms());
    }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Report the rendering surface size.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.view.set_viewport(width, height, now_ms());
    }

    /// Set limits. Returns the `{maxNodes, maxLinks}` actually applied.
    #[wasm_bindgen(js_name = setLimits)]
    pub fn set_limits(&mut self, max_nodes: usize, max_links: usize) -> JsValue {
        to_js(&self.view.set_limits(max_nodes, max_links, now_ms()))
    }

    /// Restore the default limits.
    #[wasm_bindgen(js_name = resetToDefault)]
    pub fn reset_to_default(&mut self) -> JsValue {
        to_js(&self.view.reset_to_default(now_ms()))
    }

    /// Show every node and link.
    #[wasm_bindgen(js_name = showAll)]
    pub fn show_all(&mut self) -> JsValue {
        to_js(&self.view.show_all(now_ms()))
    }

    /// Set the selection strategy from `{kind: "connected"}` or
    /// `{kind: "randomized", seed}`.
    #[wasm_bindgen(js_name = setStrategy)]
    pub fn set_strategy(&mut self, strategy: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<SelectionStrategy>(strategy) {
            Ok(strategy) => {
                self.view.set_strategy(strategy, now_ms());
                true
            }
            Err(error) => {
                log::warn!("invalid selection strategy: {error}");
                false
            }
        }
    }

    /// Switch to randomized selection with a fresh seed.
    #[wasm_bindgen(js_name = useRandomizedSelection)]
    pub fn use_randomized_selection(&mut self) {
        let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
        self.view
            .set_strategy(SelectionStrategy::Randomized { seed }, now_ms());
    }

    /// Advance one animation frame. Returns true if a new snapshot exists.
    pub fn frame(&mut self) -> bool {
        self.view.frame(now_ms())
    }

    /// Reselect and restart immediately, skipping the debounce.
    pub fn recompute(&mut self) -> bool {
        self.view.recompute().is_ok()
    }

    /// Stop the layout and drop all callbacks.
    pub fn teardown(&mut self) {
        self.view.teardown();
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Call `callback(snapshot)` on every tick.
    ///
    /// Callbacks run inside `frame()`, which holds the view borrowed. Calling
    /// back into this object from a callback (e.g. `view.stats()`) makes
    /// wasm-bindgen throw a recursive-use error; that error is caught and
    /// logged, and the callback's work is lost. Read everything needed from
    /// the snapshot argument, or defer the call with `queueMicrotask`.
    #[wasm_bindgen(js_name = onTick)]
    pub fn on_tick(&mut self, callback: js_sys::Function) {
        self.view.on_tick(Box::new(move |snapshot: &layout::TickSnapshot| {
            if let Err(error) = callback.call1(&JsValue::NULL, &to_js(snapshot)) {
                log::warn!("tick callback threw: {error:?}");
            }
        }));
    }

    /// Call `callback(generation)` each time the layout settles.
    ///
    /// Runs inside `frame()` under the same no-reentry rule as `onTick`.
    #[wasm_bindgen(js_name = onSettle)]
    pub fn on_settle(&mut self, callback: js_sys::Function) {
        self.view.on_settle(Box::new(move |handle: layout::SimulationHandle| {
            let generation = JsValue::from_f64(handle.raw() as f64);
            if let Err(error) = callback.call1(&JsValue::NULL, &generation) {
                log::warn!("settle callback threw: {error:?}");
            }
        }));
    }

    // =========================================================================
    // Drag
    // =========================================================================

    #[wasm_bindgen(js_name = onNodeDragStart)]
    pub fn on_node_drag_start(&mut self, node_id: &str) -> bool {
        report(self.view.drag_start(node_id))
    }

    #[wasm_bindgen(js_name = onNodeDragMove)]
    pub fn on_node_drag_move(&mut self, node_id: &str, x: f32, y: f32) -> bool {
        report(self.view.drag_move(node_id, x, y))
    }

    #[wasm_bindgen(js_name = onNodeDragEnd)]
    pub fn on_node_drag_end(&mut self, node_id: &str) -> bool {
        report(self.view.drag_end(node_id))
    }

    /// Id of the node under `(x, y)`, if any.
    #[wasm_bindgen(js_name = nodeAt)]
    pub fn node_at(&self, x: f32, y: f32) -> Option<String> {
        self.view.node_at(x, y)
    }

    /// Start dragging the node under `(x, y)`. Returns its id.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Option<String> {
        self.view.pointer_down(x, y).unwrap_or_else(|error| {
            log::warn!("{error}");
            None
        })
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Latest `{generation, alpha, nodes, links}` snapshot, or `null`.
    pub fn snapshot(&self) -> JsValue {
        self.view
            .snapshot()
            .map(|snapshot| to_js(&snapshot))
            .unwrap_or(JsValue::NULL)
    }

    /// Latest positions as `[x0, y0, x1, y1, ...]` in snapshot node order.
    pub fn positions(&self) -> Float32Array {
        let positions: Vec<f32> = self
            .view
            .snapshot()
            .map(|snapshot| {
                snapshot
                    .nodes
                    .iter()
                    .flat_map(|node| [node.x, node.y])
                    .collect()
            })
            .unwrap_or_default();
        Float32Array::from(&positions[..])
    }

    /// Shown vs. total counts and percentages.
    pub fn stats(&self) -> JsValue {
        to_js(&self.view.stats())
    }

    /// Status label for display.
    pub fn status(&self) -> String {
        self.view.status().label()
    }

    /// Current `{maxNodes, maxLinks}`.
    pub fn limits(&self) -> JsValue {
        to_js(&self.view.limits())
    }

    /// Total nodes in the dataset.
    #[wasm_bindgen(js_name = totalNodes)]
    pub fn total_nodes(&self) -> usize {
        self.view.dataset().node_count()
    }

    /// Total links in the dataset.
    #[wasm_bindgen(js_name = totalLinks)]
    pub fn total_links(&self) -> usize {
        self.view.dataset().link_count()
    }
}

// =============================================================================
// Conversations (browser localStorage)
// =============================================================================

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl GraphViewWasm {
    /// Store the `graphData` of a chat answer for conversation `id`. An empty
    /// object or `null` clears the conversation's graph.
    #[wasm_bindgen(js_name = storeConversationGraph)]
    pub fn store_conversation_graph(&mut self, id: &str, graph: JsValue) -> bool {
        let result = serde_wasm_bindgen::from_value::<serde_json::Value>(graph)
            .map_err(|error| error::StoreError::Unavailable(error.to_string()))
            .and_then(|graph| {
                let mut store = open_conversations()?;
                store.upsert_graph(id, graph)?;
                Ok(())
            });
        match result {
            Ok(()) => true,
            Err(error) => {
                log::warn!("cannot store graph for conversation {id}: {error}");
                false
            }
        }
    }

    /// Make conversation `id` active and load its stored graph. Returns false
    /// if the conversation is unknown or has no graph.
    #[wasm_bindgen(js_name = loadConversation)]
    pub fn load_conversation(&mut self, id: &str) -> bool {
        let result = open_conversations().and_then(|mut store| {
            store.set_active(id)?;
            let dataset = store.active_dataset().cloned();
            Ok(dataset)
        });
        match result {
            Ok(Some(dataset)) => {
                self.view.load_dataset(dataset, now_ms());
                true
            }
            Ok(None) => {
                log::info!("conversation {id} has no graph");
                false
            }
            Err(error) => {
                log::warn!("cannot load conversation {id}: {error}");
                false
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn open_conversations() -> Result<store::ConversationStore<store::LocalStorage>, error::StoreError> {
    store::LocalStorage::open().and_then(store::ConversationStore::init)
}

fn report(result: Result<(), error::LayoutError>) -> bool {
    match result {
        Ok(()) => true,
        Err(error) => {
            log::warn!("{error}");
            false
        }
    }
}
