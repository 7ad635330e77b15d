//! Per-navigation gating: blacklist, redirect handling, external delegation.

use bridgeview_common::SurfaceError;
use tracing::{debug, warn};

use crate::classify::OriginWhitelist;
use crate::settings::SurfaceConfig;

/// An outgoing navigation, consumed by one decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub url: String,
    pub is_main_frame: bool,
    pub is_redirect: bool,
    pub has_gesture: bool,
}

impl NavigationRequest {
    /// A main-frame, non-redirect navigation.
    pub fn main_frame(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_main_frame: true,
            is_redirect: false,
            has_gesture: false,
        }
    }
}

/// What the surface does with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Blacklisted: neither load nor delegate. Reported as handled.
    Swallow,
    /// Load the URL directly in the surface. Reported as handled.
    LoadDirect(String),
    /// Hand the URL to the external handler. Reported as handled.
    Delegate(String),
    /// Let the engine load it in place.
    Default,
}

impl NavigationDecision {
    /// Whether the engine's own navigation is overridden.
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Default)
    }
}

/// Opens URLs outside the surface (system browser, another app).
pub trait ExternalHandler: Send + Sync {
    fn open(&self, url: &str) -> Result<(), SurfaceError>;
}

/// Gate for outgoing navigations.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    blacklist: Vec<String>,
    distinguishes_redirects: bool,
    can_delegate: bool,
}

impl NavigationGuard {
    pub fn new(blacklist: Vec<String>, distinguishes_redirects: bool) -> Self {
        Self {
            blacklist,
            distinguishes_redirects,
            can_delegate: true,
        }
    }

    /// Whether an external handler exists. Without one, default-intent
    /// URLs load in place instead of being delegated.
    pub fn with_delegation(mut self, can_delegate: bool) -> Self {
        self.can_delegate = can_delegate;
        self
    }

    /// Decide one navigation. Rules apply in order:
    ///
    /// 1. blacklisted (substring match) URLs are swallowed;
    /// 2. main-frame redirects load directly, where redirects are detectable;
    /// 3. URLs under a default-intent prefix whose origin passes the
    ///    whitelist are delegated to the external handler, if there is one;
    /// 4. everything else takes the engine's default path.
    pub fn decide(&self, request: &NavigationRequest, config: &SurfaceConfig) -> NavigationDecision {
        let url = &request.url;

        if let Some(entry) = self.blacklist.iter().find(|b| url.contains(b.as_str())) {
            warn!(url = %url, entry = %entry, "blacklisted navigation swallowed");
            return NavigationDecision::Swallow;
        }

        if self.distinguishes_redirects && request.is_main_frame && request.is_redirect {
            debug!(url = %url, "main-frame redirect loaded directly");
            return NavigationDecision::LoadDirect(url.clone());
        }

        let prefixed = config
            .url_prefixes_for_default_intent
            .iter()
            .any(|prefix| !prefix.is_empty() && url.starts_with(prefix.as_str()));
        if prefixed && self.can_delegate {
            if should_handle(&config.origin_whitelist, url) {
                debug!(url = %url, "navigation delegated to external handler");
                return NavigationDecision::Delegate(url.clone());
            }
            warn!(url = %url, "default-intent URL rejected by origin whitelist");
        }

        NavigationDecision::Default
    }
}

/// Whether `url` may be handed to an external handler.
pub fn should_handle(whitelist: &OriginWhitelist, url: &str) -> bool {
    whitelist.matches(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER: &str = "intent:#Intent;action=com.ledger.android.u2f.bridge.AUTHENTICATE";

    fn guard() -> NavigationGuard {
        NavigationGuard::new(vec![LEDGER.to_string()], true)
    }

    fn config_with(prefixes: &[&str], whitelist: &[&str]) -> SurfaceConfig {
        SurfaceConfig {
            url_prefixes_for_default_intent: prefixes.iter().map(|s| s.to_string()).collect(),
            origin_whitelist: OriginWhitelist::compile(whitelist).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn blacklisted_url_is_swallowed() {
        let request = NavigationRequest::main_frame(format!("{LEDGER};S.x=1;end"));
        let decision = guard().decide(&request, &SurfaceConfig::default());
        assert_eq!(decision, NavigationDecision::Swallow);
        assert!(decision.is_handled());
    }

    #[test]
    fn blacklist_wins_over_redirect() {
        let request = NavigationRequest {
            is_redirect: true,
            ..NavigationRequest::main_frame(LEDGER)
        };
        assert_eq!(
            guard().decide(&request, &SurfaceConfig::default()),
            NavigationDecision::Swallow
        );
    }

    #[test]
    fn main_frame_redirect_loads_directly() {
        let request = NavigationRequest {
            is_redirect: true,
            ..NavigationRequest::main_frame("https://b.test/")
        };
        assert_eq!(
            guard().decide(&request, &SurfaceConfig::default()),
            NavigationDecision::LoadDirect("https://b.test/".into())
        );
    }

    #[test]
    fn subframe_redirect_takes_default() {
        let request = NavigationRequest {
            url: "https://b.test/".into(),
            is_main_frame: false,
            is_redirect: true,
            has_gesture: false,
        };
        assert_eq!(
            guard().decide(&request, &SurfaceConfig::default()),
            NavigationDecision::Default
        );
    }

    #[test]
    fn redirects_ignored_without_detection() {
        let guard = NavigationGuard::new(Vec::new(), false);
        let request = NavigationRequest {
            is_redirect: true,
            ..NavigationRequest::main_frame("https://b.test/")
        };
        assert_eq!(
            guard.decide(&request, &SurfaceConfig::default()),
            NavigationDecision::Default
        );
    }

    #[test]
    fn ordinary_navigation_takes_default() {
        let decision = guard().decide(
            &NavigationRequest::main_frame("https://a.test/"),
            &SurfaceConfig::default(),
        );
        assert_eq!(decision, NavigationDecision::Default);
        assert!(!decision.is_handled());
    }

    #[test]
    fn whitelisted_prefix_is_delegated() {
        let config = config_with(&["mailto:", "https://pay."], &[r"https://pay\.test"]);
        let decision = guard().decide(&NavigationRequest::main_frame("https://pay.test/checkout"), &config);
        assert_eq!(decision, NavigationDecision::Delegate("https://pay.test/checkout".into()));
    }

    #[test]
    fn no_handler_means_whitelisted_prefix_loads_in_place() {
        let config = config_with(&["https://pay."], &[r"https://pay\.example\.com"]);
        let guard = guard().with_delegation(false);
        let request = NavigationRequest::main_frame("https://pay.example.com/");
        // The in-place load re-enters the gate and must settle on Default.
        for _ in 0..3 {
            assert_eq!(guard.decide(&request, &config), NavigationDecision::Default);
        }
    }

    #[test]
    fn prefix_outside_whitelist_is_not_delegated() {
        let config = config_with(&["https://"], &[r"https://example\.com"]);
        let decision = guard().decide(&NavigationRequest::main_frame("https://evil.com/"), &config);
        assert_eq!(decision, NavigationDecision::Default);
    }

    #[test]
    fn should_handle_rejects_other_origin() {
        let whitelist = OriginWhitelist::compile([r"https://example\.com"]).unwrap();
        assert!(!should_handle(&whitelist, "https://evil.com"));
        assert!(should_handle(&whitelist, "https://example.com/a"));
    }

    #[test]
    fn empty_prefix_never_matches() {
        let config = config_with(&[""], &[".*"]);
        let decision = guard().decide(&NavigationRequest::main_frame("https://a.test/"), &config);
        assert_eq!(decision, NavigationDecision::Default);
    }
}
