//! GraphView - binds a dataset, limits and a viewport to the layout engine.
//!
//! Three independent change sources drive the view:
//! - dataset replacement
//! - limit or strategy changes
//! - viewport resize
//!
//! Hosts report them with [`GraphView::notify`] (or the typed setters) and
//! call [`GraphView::frame`] from their animation-frame callback. Changes
//! arriving within `debounce_ms` of each other coalesce into one reselect.
//! A resize with nothing else pending keeps the running simulation and only
//! re-centers and reheats it.
//!
//! Every failure becomes a [`Status`] and a skipped draw; nothing here panics
//! or propagates past the host boundary except as a `Result` the host may
//! ignore.

mod stats;
mod status;

pub use stats::SubsetStats;
pub use status::Status;

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, ViewError};
use crate::graph::GraphDataset;
use crate::interaction::InteractionController;
use crate::layout::{LayoutConfig, LayoutEngine, SimulationHandle, TickSnapshot};
use crate::selection::{DEFAULT_MAX_LINKS, DEFAULT_MAX_NODES, Limits, SelectionStrategy, Subset, select};

/// Listener for every emitted snapshot, across generations.
pub type TickListener = Box<dyn FnMut(&TickSnapshot)>;

/// Listener for each settle, across generations.
pub type SettleListener = Box<dyn FnMut(SimulationHandle)>;

/// View configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    /// Quiet period before pending changes are applied (default: 150.0).
    pub debounce_ms: f64,
    /// Node limit applied on dataset load (default: 50).
    pub default_max_nodes: usize,
    /// Link limit applied on dataset load (default: 100).
    pub default_max_links: usize,
    /// Node-stage selection policy (default: connected).
    pub strategy: SelectionStrategy,
    /// Force layout parameters.
    pub layout: LayoutConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150.0,
            default_max_nodes: DEFAULT_MAX_NODES,
            default_max_links: DEFAULT_MAX_LINKS,
            strategy: SelectionStrategy::default(),
            layout: LayoutConfig::default(),
        }
    }
}

/// Size of the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether the surface can hold a layout at all.
    pub fn is_usable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// A discrete change the view reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    DatasetChanged,
    LimitsChanged,
    SizeChanged,
}

/// Changes waiting out the debounce window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PendingChanges {
    reselect: bool,
    resize: bool,
    last_change_ms: Option<f64>,
}

impl PendingChanges {
    fn record(&mut self, event: ChangeEvent, now_ms: f64) {
        match event {
            ChangeEvent::DatasetChanged | ChangeEvent::LimitsChanged => self.reselect = true,
            ChangeEvent::SizeChanged => self.resize = true,
        }
        self.last_change_ms = Some(now_ms);
    }

    fn is_due(&self, now_ms: f64, debounce_ms: f64) -> bool {
        self.last_change_ms
            .is_some_and(|since| now_ms - since >= debounce_ms)
    }
}

/// Viewport binding over one dataset.
pub struct GraphView {
    config: ViewConfig,
    dataset: GraphDataset,
    limits: Limits,
    strategy: SelectionStrategy,
    viewport: Option<Viewport>,
    subset: Subset,
    status: Status,

    engine: LayoutEngine,
    handle: Option<SimulationHandle>,
    interaction: InteractionController,
    pending: PendingChanges,

    /// Most recent snapshot, written by the active generation's tick callback
    latest: Rc<RefCell<Option<TickSnapshot>>>,
    tick_listeners: Rc<RefCell<Vec<TickListener>>>,
    settle_listeners: Rc<RefCell<Vec<SettleListener>>>,
}

impl GraphView {
    /// Create a view with no dataset and no viewport.
    pub fn new(config: ViewConfig) -> Self {
        let engine = LayoutEngine::new(config.layout.clone());
        let strategy = config.strategy;
        Self {
            config,
            dataset: GraphDataset::empty(),
            limits: Limits::new(0, 0),
            strategy,
            viewport: None,
            subset: Subset::default(),
            status: Status::Initializing,
            engine,
            handle: None,
            interaction: InteractionController::new(),
            pending: PendingChanges::default(),
            latest: Rc::new(RefCell::new(None)),
            tick_listeners: Rc::new(RefCell::new(Vec::new())),
            settle_listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    // =========================================================================
    // Change events
    // =========================================================================

    /// Record a change at host time `now_ms`. It is applied by the first
    /// `frame` at least `debounce_ms` after the last recorded change.
    pub fn notify(&mut self, event: ChangeEvent, now_ms: f64) {
        log::trace!("change: {event:?} at {now_ms}");
        self.pending.record(event, now_ms);
    }

    /// Replace the dataset wholesale. Limits reset to the defaults.
    pub fn load_dataset(&mut self, dataset: GraphDataset, now_ms: f64) {
        self.limits = Limits::with_defaults(
            &dataset,
            self.config.default_max_nodes,
            self.config.default_max_links,
        );
        log::info!(
            "dataset loaded: {} nodes, {} links",
            dataset.node_count(),
            dataset.link_count()
        );
        self.dataset = dataset;
        self.notify(ChangeEvent::DatasetChanged, now_ms);
    }

    /// Parse and load a dataset. On failure the current layout is torn down
    /// and the status shows the error until a valid dataset arrives.
    pub fn load_dataset_json(&mut self, text: &str, now_ms: f64) -> Result<(), ViewError> {
        match GraphDataset::from_json(text) {
            Ok(dataset) => {
                self.load_dataset(dataset, now_ms);
                Ok(())
            }
            Err(error) => Err(self.reject_dataset(error.into())),
        }
    }

    /// Tear down and show an invalid-dataset error.
    pub fn reject_dataset(&mut self, error: ViewError) -> ViewError {
        log::warn!("{error}");
        self.stop_generation();
        self.dataset = GraphDataset::empty();
        self.subset = Subset::default();
        self.pending = PendingChanges::default();
        self.status = Status::Error(error.clone());
        error
    }

    /// Attach or resize the rendering surface.
    pub fn set_viewport(&mut self, width: f32, height: f32, now_ms: f64) {
        self.viewport = Some(Viewport::new(width, height));
        self.notify(ChangeEvent::SizeChanged, now_ms);
    }

    /// Apply new limits, clamped to `[min(10, total), total]`. Returns the
    /// limits actually applied.
    pub fn set_limits(&mut self, max_nodes: usize, max_links: usize, now_ms: f64) -> Limits {
        self.limits = Limits::new(max_nodes, max_links).clamped(&self.dataset);
        self.notify(ChangeEvent::LimitsChanged, now_ms);
        self.limits
    }

    /// Restore the default limits for the current dataset.
    pub fn reset_to_default(&mut self, now_ms: f64) -> Limits {
        self.limits = Limits::with_defaults(
            &self.dataset,
            self.config.default_max_nodes,
            self.config.default_max_links,
        );
        self.notify(ChangeEvent::LimitsChanged, now_ms);
        self.limits
    }

    /// Show the whole dataset.
    pub fn show_all(&mut self, now_ms: f64) -> Limits {
        self.limits = Limits::show_all(&self.dataset);
        self.notify(ChangeEvent::LimitsChanged, now_ms);
        self.limits
    }

    /// Change the node-stage selection policy.
    pub fn set_strategy(&mut self, strategy: SelectionStrategy, now_ms: f64) {
        self.strategy = strategy;
        self.notify(ChangeEvent::LimitsChanged, now_ms);
    }

    // =========================================================================
    // Driving
    // =========================================================================

    /// Advance the view at host time `now_ms`: apply due changes, then tick
    /// the active simulation. Returns true if a new snapshot was emitted.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        if self.pending.is_due(now_ms, self.config.debounce_ms) {
            self.flush();
        }

        let Some(handle) = self.handle else {
            return false;
        };
        let ticked = self.engine.tick(now_ms);
        if ticked {
            if let Some(snapshot) = self.latest.borrow().as_ref() {
                self.interaction.observe(snapshot);
            }
        }
        self.status = if self.engine.is_settled(handle) {
            Status::Settled
        } else {
            Status::LayingOut
        };
        ticked
    }

    fn flush(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let resize_only = pending.resize && !pending.reselect;

        if let (true, Some(handle), Some(viewport)) = (resize_only, self.handle, self.viewport) {
            if viewport.is_usable() {
                match self.engine.resize(handle, viewport.width, viewport.height) {
                    Ok(()) => {
                        log::debug!("resized to {}x{}", viewport.width, viewport.height);
                        return;
                    }
                    Err(error) => log::warn!("resize fell back to reselect: {error}"),
                }
            }
        }

        // Errors are reflected in the status
        let _ = self.recompute();
    }

    /// Stop the running simulation, reselect, and start a new generation now.
    pub fn recompute(&mut self) -> Result<SimulationHandle, ViewError> {
        self.pending = PendingChanges::default();
        self.stop_generation();

        let viewport = match self.viewport {
            Some(viewport) if viewport.is_usable() => viewport,
            _ => {
                // Retried when the surface reports a size
                log::warn!("layout deferred: {}", ViewError::MissingContainer);
                self.pending.reselect = true;
                self.status = Status::Initializing;
                return Err(ViewError::MissingContainer);
            }
        };

        self.status = Status::Selecting;
        self.subset = select(&self.dataset, self.limits, self.strategy);
        log::info!(
            "selected {}/{} nodes, {}/{} links",
            self.subset.nodes.len(),
            self.dataset.node_count(),
            self.subset.links.len(),
            self.dataset.link_count()
        );

        let started = self
            .engine
            .start(&self.subset.nodes, &self.subset.links, viewport.width, viewport.height)
            .and_then(|handle| {
                self.wire_listeners(handle)?;
                Ok(handle)
            });

        match started {
            Ok(handle) => {
                self.handle = Some(handle);
                self.status = Status::LayingOut;
                Ok(handle)
            }
            Err(error) => {
                let error = ViewError::from(error);
                log::warn!("{error}");
                self.status = Status::Error(error.clone());
                Err(error)
            }
        }
    }

    fn wire_listeners(&mut self, handle: SimulationHandle) -> Result<(), LayoutError> {
        let latest = Rc::clone(&self.latest);
        let tick_listeners = Rc::clone(&self.tick_listeners);
        self.engine.on_tick(
            handle,
            Box::new(move |snapshot: &TickSnapshot| {
                for listener in tick_listeners.borrow_mut().iter_mut() {
                    listener(snapshot);
                }
                *latest.borrow_mut() = Some(snapshot.clone());
            }),
        )?;

        let settle_listeners = Rc::clone(&self.settle_listeners);
        self.engine.on_settle(
            handle,
            Box::new(move |handle: SimulationHandle| {
                for listener in settle_listeners.borrow_mut().iter_mut() {
                    listener(handle);
                }
            }),
        )
    }

    fn stop_generation(&mut self) {
        self.engine.stop_current();
        self.handle = None;
        self.interaction.reset();
        self.latest.borrow_mut().take();
    }

    /// Stop everything and drop all listeners.
    pub fn teardown(&mut self) {
        self.stop_generation();
        self.tick_listeners.borrow_mut().clear();
        self.settle_listeners.borrow_mut().clear();
        self.pending = PendingChanges::default();
        self.status = Status::Initializing;
        log::debug!("view torn down");
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Receive every snapshot from this and all later generations.
    pub fn on_tick(&mut self, listener: TickListener) {
        self.tick_listeners.borrow_mut().push(listener);
    }

    /// Be told each time a generation settles.
    pub fn on_settle(&mut self, listener: SettleListener) {
        self.settle_listeners.borrow_mut().push(listener);
    }

    // =========================================================================
    // Drag
    // =========================================================================

    /// Begin dragging `id`. A no-op with no active layout.
    pub fn drag_start(&mut self, id: &str) -> Result<(), LayoutError> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        self.interaction.drag_start(&mut self.engine, handle, id)
    }

    /// Move the dragged node to `(x, y)`.
    pub fn drag_move(&mut self, id: &str, x: f32, y: f32) -> Result<(), LayoutError> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        self.interaction.drag_move(&mut self.engine, handle, id, x, y)
    }

    /// Release the dragged node.
    pub fn drag_end(&mut self, id: &str) -> Result<(), LayoutError> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        self.interaction.drag_end(&mut self.engine, handle, id)
    }

    /// Start a drag on the node under `(x, y)`, if any.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Result<Option<String>, LayoutError> {
        let Some(handle) = self.handle else {
            return Ok(None);
        };
        self.interaction.pointer_down(&mut self.engine, handle, x, y)
    }

    /// Node drawn under `(x, y)`, if any.
    pub fn node_at(&self, x: f32, y: f32) -> Option<String> {
        self.interaction
            .node_at(x, y, self.engine.config().node_radius)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn dataset(&self) -> &GraphDataset {
        &self.dataset
    }

    pub fn subset(&self) -> &Subset {
        &self.subset
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Handle of the running generation.
    pub fn handle(&self) -> Option<SimulationHandle> {
        self.handle
    }

    /// Shown vs. total counts for the current subset.
    pub fn stats(&self) -> SubsetStats {
        SubsetStats::new(&self.subset, &self.dataset)
    }

    /// Most recent snapshot, or the seeded positions before the first tick.
    pub fn snapshot(&self) -> Option<TickSnapshot> {
        self.latest
            .borrow()
            .clone()
            .or_else(|| self.engine.snapshot())
    }

    /// Whether changes are waiting out the debounce window.
    pub fn has_pending_changes(&self) -> bool {
        self.pending.last_change_ms.is_some() || self.pending.reselect
    }
}

impl Default for GraphView {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Link, Node};
    use std::cell::Cell;

    fn immediate() -> ViewConfig {
        ViewConfig {
            debounce_ms: 0.0,
            ..ViewConfig::default()
        }
    }

    fn chain(count: usize) -> GraphDataset {
        let nodes = (0..count).map(|i| Node::new(format!("n{i}"), "")).collect();
        let links = (1..count)
            .map(|i| Link::new(format!("n{}", i - 1), format!("n{i}"), "next"))
            .collect();
        GraphDataset::new(nodes, links)
    }

    #[test]
    fn test_sample_lays_out_whole() {
        let mut view = GraphView::new(immediate());
        view.set_viewport(800.0, 600.0, 0.0);
        view.load_dataset(GraphDataset::bundled_sample(), 0.0);
        assert!(view.frame(0.0));

        assert_eq!(view.limits(), Limits::new(7, 10));
        let stats = view.stats();
        assert_eq!((stats.shown_nodes, stats.shown_links), (7, 10));
        assert_eq!(*view.status(), Status::LayingOut);
        assert_eq!(view.snapshot().unwrap().nodes.len(), 7);
    }

    #[test]
    fn test_missing_container_defers() {
        let mut view = GraphView::new(immediate());
        view.load_dataset(GraphDataset::bundled_sample(), 0.0);
        assert!(!view.frame(0.0));
        assert!(view.handle().is_none());
        assert_eq!(view.recompute(), Err(ViewError::MissingContainer));
        assert!(view.has_pending_changes());

        view.set_viewport(400.0, 300.0, 10.0);
        assert!(view.frame(10.0));
        assert!(view.handle().is_some());
    }

    #[test]
    fn test_invalid_dataset_status() {
        let mut view = GraphView::new(immediate());
        view.set_viewport(800.0, 600.0, 0.0);
        view.load_dataset(GraphDataset::bundled_sample(), 0.0);
        view.frame(0.0);
        assert!(view.handle().is_some());

        let error = view.load_dataset_json(r#"{"nodes": []}"#, 5.0).unwrap_err();
        assert_eq!(error, ViewError::InvalidDataset(crate::error::DatasetError::MissingLinks));
        assert!(view.status().is_error());
        assert!(view.handle().is_none());
        assert!(!view.frame(10.0));
    }

    #[test]
    fn test_empty_dataset_reports_empty_selection() {
        let mut view = GraphView::new(immediate());
        view.set_viewport(800.0, 600.0, 0.0);
        view.load_dataset(GraphDataset::empty(), 0.0);
        view.frame(0.0);
        assert_eq!(*view.status(), Status::Error(ViewError::EmptySelection));
        assert!(view.handle().is_none());
    }

    #[test]
    fn test_limit_changes_are_debounced() {
        let mut view = GraphView::default();
        view.set_viewport(800.0, 600.0, 0.0);
        view.load_dataset(chain(60), 0.0);
        view.frame(200.0);
        let first = view.handle().unwrap();

        // A slider drag: many changes, one reselect
        for step in 0..10 {
            view.set_limits(20 + step, 30, 300.0 + step as f64 * 20.0);
            view.frame(300.0 + step as f64 * 20.0);
            assert_eq!(view.handle(), Some(first));
        }
        // Last change at 480
        view.frame(700.0);
        let second = view.handle().unwrap();
        assert_eq!(second.raw(), first.raw() + 1);
        assert_eq!(view.subset().nodes.len(), 29);
    }

    #[test]
    fn test_limits_clamped_and_reset() {
        let mut view = GraphView::new(immediate());
        view.load_dataset(chain(60), 0.0);
        assert_eq!(view.limits(), Limits::new(50, 59));
        assert_eq!(view.set_limits(3, 500, 0.0), Limits::new(10, 59));
        assert_eq!(view.show_all(0.0), Limits::new(60, 59));
        assert_eq!(view.reset_to_default(0.0), Limits::new(50, 59));
    }

    #[test]
    fn test_resize_only_keeps_generation() {
        let mut view = GraphView::new(immediate());
        view.set_viewport(800.0, 600.0, 0.0);
        view.load_dataset(GraphDataset::bundled_sample(), 0.0);
        view.frame(0.0);
        let handle = view.handle().unwrap();

        view.set_viewport(300.0, 200.0, 16.0);
        view.frame(16.0);
        assert_eq!(view.handle(), Some(handle));
        for node in &view.snapshot().unwrap().nodes {
            assert!(node.x <= 280.0 && node.y <= 180.0);
        }

        view.set_limits(7, 3, 32.0);
        view.frame(32.0);
        assert_ne!(view.handle(), Some(handle));
    }

    #[test]
    fn test_listeners_survive_generations() {
        let mut view = GraphView::new(immediate());
        let ticks = Rc::new(Cell::new(0));
        let sink = Rc::clone(&ticks);
        view.on_tick(Box::new(move |_: &TickSnapshot| sink.set(sink.get() + 1)));

        view.set_viewport(800.0, 600.0, 0.0);
        view.load_dataset(GraphDataset::bundled_sample(), 0.0);
        view.frame(0.0);
        view.frame(16.0);
        view.show_all(20.0);
        view.frame(32.0);
        assert_eq!(ticks.get(), 3);

        view.teardown();
        view.frame(48.0);
        assert_eq!(ticks.get(), 3);
        assert_eq!(*view.status(), Status::Initializing);
    }

    #[test]
    fn test_settles() {
        let mut view = GraphView::new(immediate());
        let settled = Rc::new(Cell::new(false));
        let sink = Rc::clone(&settled);
        view.on_settle(Box::new(move |_: SimulationHandle| sink.set(true)));
        view.set_viewport(800.0, 600.0, 0.0);
        view.load_dataset(GraphDataset::bundled_sample(), 0.0);

        let mut now = 0.0;
        while !settled.get() {
            view.frame(now);
            now += 16.0;
            assert!(now < 60_000.0, "never settled");
        }
        assert_eq!(*view.status(), Status::Settled);
    }

    #[test]
    fn test_drag_without_layout_is_noop() {
        let mut view = GraphView::default();
        assert_eq!(view.drag_start("x"), Ok(()));
        assert_eq!(view.pointer_down(1.0, 1.0), Ok(None));
    }
}
