//! Script evaluation strategies.
//!
//! Engines that can evaluate script directly get [`EvaluationStrategy::Direct`].
//! Older engines only accept a `javascript:` pseudo-navigation, so the script
//! is percent-encoded into a URL and loaded instead. The strategy is picked
//! once when a surface is built and never re-checked.

use bridgeview_common::SurfaceError;

use crate::render::{Headers, RenderSurface};

const PSEUDO_NAVIGATION_SCHEME: &str = "javascript:";

/// How script reaches the page context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationStrategy {
    Direct,
    PseudoNavigation,
}

impl EvaluationStrategy {
    /// Pick the strategy for an engine from its capability flag.
    pub fn detect(render: &dyn RenderSurface) -> Self {
        if render.supports_script_evaluation() {
            Self::Direct
        } else {
            Self::PseudoNavigation
        }
    }

    /// Evaluate `script` in the page, fire-and-forget.
    pub fn evaluate(self, render: &mut dyn RenderSurface, script: &str) -> Result<(), SurfaceError> {
        match self {
            Self::Direct => render.evaluate_script(script),
            Self::PseudoNavigation => {
                render.load_url(&pseudo_navigation_url(script), &Headers::new())
            }
        }
    }
}

/// `javascript:` URL carrying the UTF-8 percent-encoded script.
pub fn pseudo_navigation_url(script: &str) -> String {
    format!(
        "{PSEUDO_NAVIGATION_SCHEME}{}",
        urlencoding::encode(script)
    )
}

/// Wrap a script as an immediately-invoked function so its top-level
/// declarations stay out of the page's global scope.
pub fn wrap_iife(script: &str) -> String {
    format!("(function() {{\n{script};\n}})();")
}
