//! Script assets for the on-start-loading injection.
//!
//! A host may configure the injected script either as literal code or as
//! the path of a bundled `.js` file. [`ScriptAssets`] resolves such paths
//! against a base directory so the injector always receives code.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Serves bundled script files from a base directory.
///
/// `resolve("inject/provider.js")` maps to `{base_dir}/inject/provider.js`.
pub struct ScriptAssets {
    /// Base directory for resolving script paths.
    base_dir: PathBuf,
    /// In-memory overrides (for dynamically generated scripts).
    overrides: HashMap<String, String>,
}

impl ScriptAssets {
    /// Create a new asset provider rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            overrides: HashMap::new(),
        }
    }

    /// Register an in-memory script override.
    pub fn add_override(&mut self, path: impl Into<String>, script: impl Into<String>) {
        self.overrides.insert(path.into(), script.into());
    }

    /// Resolve a script path to its contents.
    pub fn resolve(&self, path: &str) -> Option<Cow<'_, str>> {
        let clean = path.trim_start_matches('/');

        if let Some(script) = self.overrides.get(clean) {
            return Some(Cow::Borrowed(script.as_str()));
        }

        let file_path = self.base_dir.join(clean);

        // Canonicalize both sides so `..` and symlinks cannot escape the base.
        let canonical_base = std::fs::canonicalize(&self.base_dir).ok()?;
        let canonical_file = std::fs::canonicalize(&file_path).ok()?;
        if !canonical_file.starts_with(&canonical_base) {
            warn!(path = %path, "script asset outside base directory");
            return None;
        }

        std::fs::read_to_string(&canonical_file).ok().map(Cow::Owned)
    }

    /// The base directory for assets.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Whether a configured script is a file reference rather than code.
pub fn looks_like_path(script: &str) -> bool {
    let s = script.trim();
    s.ends_with(".js")
        && !s.chars().any(|c| c.is_whitespace() || matches!(c, '(' | ')' | ';' | '=' | '{' | '"' | '\''))
}

/// The code to inject for a configured script.
///
/// Paths resolve through `assets`; anything unresolvable is used literally.
pub fn resolve_script<'a>(script: &'a str, assets: Option<&'a ScriptAssets>) -> Cow<'a, str> {
    if !looks_like_path(script) {
        return Cow::Borrowed(script);
    }
    match assets.and_then(|a| a.resolve(script.trim())) {
        Some(code) => {
            debug!(path = %script.trim(), "resolved injected script from assets");
            code
        }
        None => Cow::Borrowed(script),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets_with_file(name: &str, contents: &str) -> (tempfile::TempDir, ScriptAssets) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        let assets = ScriptAssets::new(dir.path());
        (dir, assets)
    }

    #[test]
    fn resolves_file_from_base_dir() {
        let (_dir, assets) = assets_with_file("inject/provider.js", "window.provider = {};");
        let code = assets.resolve("inject/provider.js").unwrap();
        assert_eq!(code, "window.provider = {};");
    }

    #[test]
    fn leading_slash_is_ignored() {
        let (_dir, assets) = assets_with_file("boot.js", "boot()");
        assert_eq!(assets.resolve("/boot.js").unwrap(), "boot()");
    }

    #[test]
    fn overrides_take_precedence() {
        let (_dir, mut assets) = assets_with_file("boot.js", "from disk");
        assets.add_override("boot.js", "from memory");
        assert_eq!(assets.resolve("boot.js").unwrap(), "from memory");
    }

    #[test]
    fn traversal_with_dotdot_is_blocked() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.js"), "secret").unwrap();
        let base = outer.path().join("assets");
        std::fs::create_dir_all(&base).unwrap();
        let assets = ScriptAssets::new(&base);
        assert!(assets.resolve("../secret.js").is_none());
    }

    #[test]
    fn nonexistent_file_returns_none() {
        let (_dir, assets) = assets_with_file("a.js", "a");
        assert!(assets.resolve("missing.js").is_none());
    }

    #[test]
    fn path_detection() {
        assert!(looks_like_path("inject/provider.js"));
        assert!(looks_like_path("  boot.js  "));
        assert!(!looks_like_path("window.x = 'a.js'"));
        assert!(!looks_like_path("load('x.js')"));
        assert!(!looks_like_path("console.log(1)"));
        assert!(!looks_like_path(""));
    }

    #[test]
    fn resolve_script_falls_back_to_literal() {
        let (_dir, assets) = assets_with_file("boot.js", "boot()");
        assert_eq!(resolve_script("boot.js", Some(&assets)), "boot()");
        assert_eq!(resolve_script("other.js", Some(&assets)), "other.js");
        assert_eq!(resolve_script("boot.js", None), "boot.js");
        assert_eq!(resolve_script("alert(1)", Some(&assets)), "alert(1)");
    }
}
