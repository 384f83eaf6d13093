//! Artifact providers: minified source text and source map JSON by URL
//!
//! Providers are plain fallible synchronous calls. Slow transports and
//! timeouts are the implementor's concern.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplies the minified source text served at a URL
pub trait SourceCodeProvider: Send + Sync {
    fn get_source_code(&self, url: &str) -> Result<String>;
}

/// Supplies the raw source map JSON for the script served at a URL
pub trait SourceMapProvider: Send + Sync {
    fn get_source_map_contents_for_url(&self, url: &str) -> Result<String>;
}

/// Artifacts held in memory, keyed by exact URL
#[derive(Debug, Default)]
pub struct InMemoryArtifacts {
    sources: RwLock<HashMap<String, String>>,
    source_maps: RwLock<HashMap<String, String>>,
}

impl InMemoryArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&self, url: impl Into<String>, source: impl Into<String>) -> &Self {
        self.sources.write().insert(url.into(), source.into());
        self
    }

    pub fn add_source_map(&self, url: impl Into<String>, source_map: impl Into<String>) -> &Self {
        self.source_maps.write().insert(url.into(), source_map.into());
        self
    }
}

impl SourceCodeProvider for InMemoryArtifacts {
    fn get_source_code(&self, url: &str) -> Result<String> {
        self.sources
            .read()
            .get(url)
            .cloned()
            .with_context(|| format!("no source code registered for {}", url))
    }
}

impl SourceMapProvider for InMemoryArtifacts {
    fn get_source_map_contents_for_url(&self, url: &str) -> Result<String> {
        self.source_maps
            .read()
            .get(url)
            .cloned()
            .with_context(|| format!("no source map registered for {}", url))
    }
}

/// Artifacts stored side by side in a local directory
///
/// A URL resolves to the file named by its last path segment, so
/// `https://cdn.example.com/js/app.min.js?v=2` reads `<root>/app.min.js`.
/// The source map is the file named by the script's `//# sourceMappingURL=`
/// comment, or `<file>.map` when the script has none.
#[derive(Debug, Clone)]
pub struct DirectoryArtifacts {
    root: PathBuf,
}

impl DirectoryArtifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryArtifacts { root: root.into() }
    }

    fn path_for_url(&self, url: &str) -> Result<PathBuf> {
        let name = file_name_for_url(url)
            .with_context(|| format!("URL has no file name: {}", url))?;
        Ok(self.root.join(name))
    }

    fn source_map_path(&self, script_path: &Path, source: &str) -> PathBuf {
        let referenced = sourcemap::locate_sourcemap_reference_slice(source.as_bytes())
            .ok()
            .flatten()
            .filter(|reference| !reference.get_url().starts_with("data:"))
            .and_then(|reference| file_name_for_url(reference.get_url()).map(str::to_string));

        match referenced {
            Some(name) => self.root.join(name),
            None => {
                let mut name = script_path.as_os_str().to_owned();
                name.push(".map");
                PathBuf::from(name)
            }
        }
    }
}

impl SourceCodeProvider for DirectoryArtifacts {
    fn get_source_code(&self, url: &str) -> Result<String> {
        let path = self.path_for_url(url)?;
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read source file: {}", path.display()))
    }
}

impl SourceMapProvider for DirectoryArtifacts {
    fn get_source_map_contents_for_url(&self, url: &str) -> Result<String> {
        let script_path = self.path_for_url(url)?;
        // The script is optional here; without it only the `.map` convention applies
        let source = std::fs::read_to_string(&script_path).unwrap_or_default();
        let map_path = self.source_map_path(&script_path, &source);

        std::fs::read_to_string(&map_path)
            .with_context(|| format!("failed to read source map: {}", map_path.display()))
    }
}

/// Last path segment of a URL, query string and fragment removed
fn file_name_for_url(url: &str) -> Option<&str> {
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    url[..end]
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}
