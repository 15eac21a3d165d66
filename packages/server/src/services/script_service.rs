//! Script content: where it comes from and how it is cached.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::ScriptError;
use crate::models::character::Character;
use crate::models::script::{Script, ScriptFile, ScriptMetadata};

const TROUBLE_BREWING: &str = include_str!("../../scripts/trouble_brewing.json");

/// Read-only supplier of script content.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    async fn load_characters(&self, script_id: &str) -> Result<Vec<Character>, ScriptError>;

    async fn load_metadata(&self, script_id: &str) -> Result<ScriptMetadata, ScriptError>;

    async fn list_available_scripts(&self) -> Result<Vec<String>, ScriptError>;

    async fn load_script(&self, script_id: &str) -> Result<Script, ScriptError> {
        let meta = self.load_metadata(script_id).await?;
        let characters = self.load_characters(script_id).await?;
        Ok(Script::new(script_id, meta, characters))
    }
}

fn parse_script_file(script_id: &str, raw: &str) -> Result<ScriptFile, ScriptError> {
    serde_json::from_str(raw).map_err(|source| ScriptError::Parse {
        id: script_id.to_string(),
        source,
    })
}

/// Reads `<dir>/<script_id>.json`.
pub struct FileScriptSource {
    dir: PathBuf,
}

impl FileScriptSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read(&self, script_id: &str) -> Result<ScriptFile, ScriptError> {
        let path = self.dir.join(format!("{}.json", script_id));
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScriptError::NotFound(script_id.to_string()))
            }
            Err(source) => {
                return Err(ScriptError::Io {
                    id: script_id.to_string(),
                    source,
                })
            }
        };
        debug!(path = %path.display(), "script file read");
        parse_script_file(script_id, &raw)
    }
}

#[async_trait]
impl ScriptSource for FileScriptSource {
    async fn load_characters(&self, script_id: &str) -> Result<Vec<Character>, ScriptError> {
        Ok(self.read(script_id).await?.characters)
    }

    async fn load_metadata(&self, script_id: &str) -> Result<ScriptMetadata, ScriptError> {
        Ok(self.read(script_id).await?.meta)
    }

    async fn list_available_scripts(&self) -> Result<Vec<String>, ScriptError> {
        let io_error = |source| ScriptError::Io {
            id: self.dir.display().to_string(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_error)?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn load_script(&self, script_id: &str) -> Result<Script, ScriptError> {
        let file = self.read(script_id).await?;
        Ok(Script::new(script_id, file.meta, file.characters))
    }
}

/// Scripts held in memory, keyed by id.
#[derive(Default)]
pub struct InMemoryScriptSource {
    scripts: HashMap<String, ScriptFile>,
}

impl InMemoryScriptSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, script_id: &str, file: ScriptFile) -> Self {
        self.scripts.insert(script_id.to_string(), file);
        self
    }

    /// Ships with the bundled Trouble Brewing script.
    pub fn builtin() -> Result<Self, ScriptError> {
        let file = parse_script_file("trouble_brewing", TROUBLE_BREWING)?;
        Ok(Self::new().with_script("trouble_brewing", file))
    }

    fn get(&self, script_id: &str) -> Result<&ScriptFile, ScriptError> {
        self.scripts
            .get(script_id)
            .ok_or_else(|| ScriptError::NotFound(script_id.to_string()))
    }
}

#[async_trait]
impl ScriptSource for InMemoryScriptSource {
    async fn load_characters(&self, script_id: &str) -> Result<Vec<Character>, ScriptError> {
        Ok(self.get(script_id)?.characters.clone())
    }

    async fn load_metadata(&self, script_id: &str) -> Result<ScriptMetadata, ScriptError> {
        Ok(self.get(script_id)?.meta.clone())
    }

    async fn list_available_scripts(&self) -> Result<Vec<String>, ScriptError> {
        let mut ids: Vec<String> = self.scripts.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// Read-through cache in front of a source. Loaded scripts are shared across games.
#[derive(Clone)]
pub struct ScriptCache {
    source: Arc<dyn ScriptSource>,
    scripts: Arc<RwLock<HashMap<String, Arc<Script>>>>,
}

impl ScriptCache {
    pub fn new(source: Arc<dyn ScriptSource>) -> Self {
        Self {
            source,
            scripts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, script_id: &str) -> Result<Arc<Script>, ScriptError> {
        if let Some(script) = self.scripts.read().await.get(script_id) {
            return Ok(script.clone());
        }

        let script = Arc::new(self.source.load_script(script_id).await?);
        info!(
            script_id,
            characters = script.characters.len(),
            "script loaded"
        );
        let mut scripts = self.scripts.write().await;
        Ok(scripts
            .entry(script_id.to_string())
            .or_insert(script)
            .clone())
    }

    pub async fn list_available(&self) -> Result<Vec<String>, ScriptError> {
        self.source.list_available_scripts().await
    }

    pub async fn is_cached(&self, script_id: &str) -> bool {
        self.scripts.read().await.contains_key(script_id)
    }
}
