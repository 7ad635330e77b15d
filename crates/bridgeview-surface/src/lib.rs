//! Control layer for an embedded web rendering surface.
//!
//! A [`Surface`] sits between a host UI and an opaque rendering engine
//! ([`RenderSurface`]) and provides:
//! - Response interception with script injection before page scripts run
//! - A native/page message bridge that survives navigations
//! - Navigation filtering (blacklist, redirects, external delegation)
//! - Page lifecycle events for the host
//! - Host commands and props
//!
//! The `wry` feature adds a desktop [`RenderSurface`] over `wry::WebView`.

pub mod assets;
pub mod bridge;
pub mod classify;
pub mod command;
pub mod events;
pub mod guard;
pub mod inject;
pub mod intercept;
pub mod lifecycle;
pub mod props;
pub mod queue;
pub mod registry;
pub mod render;
pub mod script;
pub mod settings;
pub mod surface;
#[cfg(feature = "wry")]
pub mod wry_backend;

#[cfg(test)]
mod testing;

pub use assets::ScriptAssets;
pub use bridge::BridgeChannel;
pub use classify::{OriginPattern, OriginWhitelist};
pub use command::SurfaceCommand;
pub use events::{EventQueue, LoadError, NavigationState, SurfaceEvent};
pub use guard::{ExternalHandler, NavigationDecision, NavigationGuard, NavigationRequest};
pub use inject::ResponseInjector;
pub use intercept::{Fetcher, HttpFetcher, InjectedResponse, InterceptionPipeline, ResourceRequest};
pub use lifecycle::{LifecycleStep, PageLifecycle};
pub use props::{Source, SourceLoad, SurfaceProp, SurfaceProps};
pub use queue::UiTaskSender;
pub use registry::SurfaceRegistry;
pub use render::{Headers, InterceptScope, Interceptor, RenderCallback, RenderSurface};
pub use script::EvaluationStrategy;
pub use settings::{MixedContentMode, SurfaceConfig, WebSettings};
pub use surface::{HostLifecycle, Surface, SurfaceBuilder};
#[cfg(feature = "wry")]
pub use wry_backend::{WryLink, WryOptions, WryRenderSurface};
