use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use bridgeview_common::{SurfaceError, TargetId};
use bridgeview_config::BridgeviewConfig;
use tracing::debug;

use crate::assets::ScriptAssets;
use crate::events::{EventQueue, SurfaceEvent};
use crate::guard::ExternalHandler;
use crate::intercept::{Fetcher, HttpFetcher};
use crate::render::RenderSurface;
use crate::surface::{HostLifecycle, Surface, SurfaceBuilder};

/// Maps target ids to surfaces and fans host lifecycle events out to
/// every registered surface. All surfaces push into one event queue.
pub struct SurfaceRegistry {
    engine: BridgeviewConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    assets: Option<Arc<ScriptAssets>>,
    external: Option<Arc<dyn ExternalHandler>>,
    events: EventQueue,
    surfaces: HashMap<TargetId, Surface>,
    /// Surfaces registered for host lifecycle notifications.
    listeners: BTreeSet<TargetId>,
}

impl SurfaceRegistry {
    pub fn new(engine: BridgeviewConfig) -> Self {
        Self {
            engine,
            fetcher: None,
            assets: None,
            external: None,
            events: EventQueue::new(),
            surfaces: HashMap::new(),
            listeners: BTreeSet::new(),
        }
    }

    /// Share one fetcher (and its connection pool) across surfaces.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_assets(mut self, assets: Arc<ScriptAssets>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn with_external_handler(mut self, handler: Arc<dyn ExternalHandler>) -> Self {
        self.external = Some(handler);
        self
    }

    /// Create a surface for `target` and register it. An existing surface
    /// with the same id is destroyed first.
    pub fn create(
        &mut self,
        target: TargetId,
        render: Box<dyn RenderSurface>,
    ) -> Result<&mut Surface, SurfaceError> {
        if self.surfaces.contains_key(&target) {
            self.destroy(target);
        }

        if self.fetcher.is_none() && self.engine.interception.enabled {
            let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&self.engine.interception)?);
            self.fetcher = Some(fetcher);
        }

        let mut builder = SurfaceBuilder::new(target)
            .engine_config(self.engine.clone())
            .events(self.events.clone());
        if let Some(fetcher) = &self.fetcher {
            builder = builder.fetcher(Arc::clone(fetcher));
        }
        if let Some(assets) = &self.assets {
            builder = builder.assets(Arc::clone(assets));
        }
        if let Some(handler) = &self.external {
            builder = builder.external_handler(Arc::clone(handler));
        }
        let surface = builder.build(render)?;

        self.listeners.insert(target);
        debug!(surface = %target, "surface registered");
        Ok(self.surfaces.entry(target).or_insert(surface))
    }

    pub fn get(&self, target: TargetId) -> Option<&Surface> {
        self.surfaces.get(&target)
    }

    pub fn get_mut(&mut self, target: TargetId) -> Option<&mut Surface> {
        self.surfaces.get_mut(&target)
    }

    /// Drop a surface: unregister its lifecycle listener and tear it down.
    pub fn destroy(&mut self, target: TargetId) -> bool {
        self.listeners.remove(&target);
        match self.surfaces.remove(&target) {
            Some(mut surface) => {
                surface.destroy();
                debug!(surface = %target, "surface destroyed");
                true
            }
            None => false,
        }
    }

    /// Whether a surface receives host lifecycle notifications.
    pub fn is_listening(&self, target: TargetId) -> bool {
        self.listeners.contains(&target)
    }

    pub fn on_host_resume(&mut self) {
        self.for_each_listener(|s| s.on_host_resume());
    }

    pub fn on_host_pause(&mut self) {
        self.for_each_listener(|s| s.on_host_pause());
    }

    /// Tear down every listening surface. They stay registered until
    /// destroyed by the host.
    pub fn on_host_destroy(&mut self) {
        self.for_each_listener(|s| s.on_host_destroy());
    }

    fn for_each_listener(&mut self, mut f: impl FnMut(&mut Surface)) {
        for target in &self.listeners {
            if let Some(surface) = self.surfaces.get_mut(target) {
                f(surface);
            }
        }
    }

    /// All active target ids, in ascending order.
    pub fn active_targets(&self) -> Vec<TargetId> {
        let mut targets: Vec<_> = self.surfaces.keys().copied().collect();
        targets.sort();
        targets
    }

    /// Run pending UI tasks on every surface.
    pub fn run_pending_tasks(&mut self) -> usize {
        self.surfaces.values_mut().map(Surface::run_pending_tasks).sum()
    }

    /// Drain all pending events from all surfaces.
    pub fn drain_events(&self) -> Vec<SurfaceEvent> {
        self.events.drain()
    }

    /// Destroy all surfaces. Used during shutdown.
    pub fn destroy_all(&mut self) {
        for target in self.active_targets() {
            self.destroy(target);
        }
    }

    pub fn count(&self) -> usize {
        self.surfaces.len()
    }
}
