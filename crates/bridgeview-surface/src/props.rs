//! Host configuration props.
//!
//! The host sends props as a camelCase JSON object. [`SurfaceProps`] accepts
//! any subset and turns it into ordered [`SurfaceProp`] updates, with
//! `source` last so a page load sees every other setting already applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::render::Headers;
use crate::settings::MixedContentMode;

pub const HTML_MIME_TYPE: &str = "text/html";
pub const HTML_ENCODING: &str = "UTF-8";
pub const HTTP_METHOD_POST: &str = "POST";

/// The `source` prop: inline HTML or a URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Source {
    pub html: Option<String>,
    pub base_url: Option<String>,
    pub uri: Option<String>,
    pub method: Option<String>,
    pub body: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
}

impl Source {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            ..Default::default()
        }
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Default::default()
        }
    }
}

/// How a `source` prop is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLoad {
    Html {
        html: String,
        base_url: Option<String>,
    },
    Post {
        url: String,
        body: Vec<u8>,
    },
    Url {
        url: String,
        headers: Headers,
        /// A `User-Agent` header, which replaces the surface user agent
        /// instead of being sent.
        user_agent: Option<String>,
    },
    Blank,
}

impl SourceLoad {
    /// `html` wins over `uri`; a missing source loads a blank page.
    pub fn plan(source: Option<&Source>) -> Self {
        let Some(source) = source else {
            return Self::Blank;
        };
        if let Some(html) = &source.html {
            return Self::Html {
                html: html.clone(),
                base_url: source.base_url.clone(),
            };
        }
        let Some(url) = &source.uri else {
            return Self::Blank;
        };
        if source.method.as_deref() == Some(HTTP_METHOD_POST) {
            return Self::Post {
                url: url.clone(),
                body: source.body.clone().unwrap_or_default().into_bytes(),
            };
        }
        let mut headers = Headers::new();
        let mut user_agent = None;
        for (key, value) in source.headers.iter().flatten() {
            if key.eq_ignore_ascii_case("user-agent") {
                user_agent = Some(value.clone());
            } else {
                headers.insert(key.clone(), value.clone());
            }
        }
        Self::Url {
            url: url.clone(),
            headers,
            user_agent,
        }
    }
}

/// Parse the host's `mixedContentMode` string. Absent means `never`;
/// unrecognised values leave the current mode alone.
pub fn parse_mixed_content_mode(value: Option<&str>) -> Option<MixedContentMode> {
    match value {
        None | Some("never") => Some(MixedContentMode::Never),
        Some("always") => Some(MixedContentMode::Always),
        Some("compatibility") => Some(MixedContentMode::Compatibility),
        Some(_) => None,
    }
}

/// One prop update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "prop", content = "value", rename_all = "camelCase")]
pub enum SurfaceProp {
    JavaScriptEnabled(bool),
    ThirdPartyCookiesEnabled(bool),
    ScalesPageToFit(bool),
    DomStorageEnabled(bool),
    UserAgent(Option<String>),
    MediaPlaybackRequiresUserAction(bool),
    #[serde(rename = "allowUniversalAccessFromFileURLs")]
    AllowUniversalAccessFromFileUrls(bool),
    SaveFormDataDisabled(bool),
    InjectedJavaScript(Option<String>),
    InjectedOnStartLoadingJavaScript(Option<String>),
    MessagingEnabled(bool),
    OnContentSizeChange(bool),
    MixedContentMode(Option<String>),
    UrlPrefixesForDefaultIntent(Option<Vec<String>>),
    GeolocationEnabled(Option<bool>),
    OriginWhitelist(Option<Vec<String>>),
    Source(Option<Source>),
}

impl SurfaceProp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::JavaScriptEnabled(_) => "javaScriptEnabled",
            Self::ThirdPartyCookiesEnabled(_) => "thirdPartyCookiesEnabled",
            Self::ScalesPageToFit(_) => "scalesPageToFit",
            Self::DomStorageEnabled(_) => "domStorageEnabled",
            Self::UserAgent(_) => "userAgent",
            Self::MediaPlaybackRequiresUserAction(_) => "mediaPlaybackRequiresUserAction",
            Self::AllowUniversalAccessFromFileUrls(_) => "allowUniversalAccessFromFileURLs",
            Self::SaveFormDataDisabled(_) => "saveFormDataDisabled",
            Self::InjectedJavaScript(_) => "injectedJavaScript",
            Self::InjectedOnStartLoadingJavaScript(_) => "injectedOnStartLoadingJavaScript",
            Self::MessagingEnabled(_) => "messagingEnabled",
            Self::OnContentSizeChange(_) => "onContentSizeChange",
            Self::MixedContentMode(_) => "mixedContentMode",
            Self::UrlPrefixesForDefaultIntent(_) => "urlPrefixesForDefaultIntent",
            Self::GeolocationEnabled(_) => "geolocationEnabled",
            Self::OriginWhitelist(_) => "originWhitelist",
            Self::Source(_) => "source",
        }
    }
}

/// A batch of props as sent by the host. Absent keys are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurfaceProps {
    pub java_script_enabled: Option<bool>,
    pub third_party_cookies_enabled: Option<bool>,
    pub scales_page_to_fit: Option<bool>,
    pub dom_storage_enabled: Option<bool>,
    pub user_agent: Option<String>,
    pub media_playback_requires_user_action: Option<bool>,
    #[serde(rename = "allowUniversalAccessFromFileURLs")]
    pub allow_universal_access_from_file_urls: Option<bool>,
    pub save_form_data_disabled: Option<bool>,
    pub injected_java_script: Option<String>,
    pub injected_on_start_loading_java_script: Option<String>,
    pub messaging_enabled: Option<bool>,
    pub on_content_size_change: Option<bool>,
    pub mixed_content_mode: Option<String>,
    pub url_prefixes_for_default_intent: Option<Vec<String>>,
    pub geolocation_enabled: Option<bool>,
    pub origin_whitelist: Option<Vec<String>>,
    pub source: Option<Source>,
}

impl SurfaceProps {
    /// The present props as updates, `source` last.
    pub fn into_updates(self) -> Vec<SurfaceProp> {
        let mut updates = Vec::new();
        let mut push = |prop: Option<SurfaceProp>| updates.extend(prop);

        push(self.java_script_enabled.map(SurfaceProp::JavaScriptEnabled));
        push(self.third_party_cookies_enabled.map(SurfaceProp::ThirdPartyCookiesEnabled));
        push(self.scales_page_to_fit.map(SurfaceProp::ScalesPageToFit));
        push(self.dom_storage_enabled.map(SurfaceProp::DomStorageEnabled));
        push(self.user_agent.map(|ua| SurfaceProp::UserAgent(Some(ua))));
        push(
            self.media_playback_requires_user_action
                .map(SurfaceProp::MediaPlaybackRequiresUserAction),
        );
        push(
            self.allow_universal_access_from_file_urls
                .map(SurfaceProp::AllowUniversalAccessFromFileUrls),
        );
        push(self.save_form_data_disabled.map(SurfaceProp::SaveFormDataDisabled));
        push(
            self.injected_java_script
                .map(|js| SurfaceProp::InjectedJavaScript(Some(js))),
        );
        push(
            self.injected_on_start_loading_java_script
                .map(|js| SurfaceProp::InjectedOnStartLoadingJavaScript(Some(js))),
        );
        push(self.messaging_enabled.map(SurfaceProp::MessagingEnabled));
        push(self.on_content_size_change.map(SurfaceProp::OnContentSizeChange));
        push(
            self.mixed_content_mode
                .map(|mode| SurfaceProp::MixedContentMode(Some(mode))),
        );
        push(
            self.url_prefixes_for_default_intent
                .map(|p| SurfaceProp::UrlPrefixesForDefaultIntent(Some(p))),
        );
        push(
            self.geolocation_enabled
                .map(|g| SurfaceProp::GeolocationEnabled(Some(g))),
        );
        push(
            self.origin_whitelist
                .map(|w| SurfaceProp::OriginWhitelist(Some(w))),
        );
        push(self.source.map(|s| SurfaceProp::Source(Some(s))));
        updates
    }
}
