//! Gateway configuration
//!
//! Built in code with the `with_*` builders, or loaded from a JSON file:
//!
//! ```json
//! {
//!   "schema_path": "schema.graphql",
//!   "cache": 512,
//!   "context": { "tenant": "acme" },
//!   "root": { "version": 3 },
//!   "max_payload_bytes": 65536
//! }
//! ```
//!
//! `schema_path` is resolved relative to the config file. Every key is
//! optional; `cache` accepts `true`, `false`, `0` or a positive size.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{GatewayError, GatewayResult};
use crate::cache::CacheOption;
use crate::execution::Resolvers;
use crate::observability::{log_event_with_fields, Event};
use crate::realtime::{PubSubConfig, DEFAULT_MAX_PAYLOAD_BYTES};
use crate::schema::Schema;

/// Where the initial schema comes from
#[derive(Debug, Clone, Default)]
pub enum SchemaSource {
    /// A `Query` type with no fields, to be filled by extensions
    #[default]
    Empty,
    /// SDL text
    Sdl(String),
    /// A pre-built schema
    Schema(Schema),
}

impl SchemaSource {
    /// Build the schema this source describes
    pub fn build(&self) -> GatewayResult<Schema> {
        match self {
            SchemaSource::Empty => Ok(Schema::empty()),
            SchemaSource::Sdl(sdl) => Ok(Schema::from_sdl(sdl)?),
            SchemaSource::Schema(schema) => Ok(schema.clone()),
        }
    }
}

/// Gateway construction options
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub cache: CacheOption,
    pub schema: SchemaSource,
    /// Base context; request context keys override these
    pub context: Map<String, Value>,
    /// Initial root resolvers
    pub resolvers: Resolvers,
    pub pubsub: PubSubConfig,
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: impl Into<CacheOption>) -> Self {
        self.cache = cache.into();
        self
    }

    pub fn with_schema_sdl(mut self, sdl: impl Into<String>) -> Self {
        self.schema = SchemaSource::Sdl(sdl.into());
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = SchemaSource::Schema(schema);
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn with_resolvers(mut self, resolvers: impl Into<Resolvers>) -> Self {
        self.resolvers = resolvers.into();
        self
    }

    pub fn with_pubsub(mut self, pubsub: PubSubConfig) -> Self {
        self.pubsub = pubsub;
        self
    }

    /// Load a JSON config file
    pub fn load(path: &Path) -> GatewayResult<Self> {
        let config = ConfigFile::load(path)?.into_config(path.parent())?;
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", path.display().to_string().as_str())],
        );
        Ok(config)
    }
}

/// On-disk configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// SDL file; absent means an empty `Query` type
    #[serde(default)]
    pub schema_path: Option<PathBuf>,

    #[serde(default)]
    pub cache: CacheOption,

    #[serde(default)]
    pub context: Map<String, Value>,

    /// Static root values
    #[serde(default)]
    pub root: Map<String, Value>,

    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

impl ConfigFile {
    pub fn load(path: &Path) -> GatewayResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> GatewayResult<()> {
        if self.max_payload_bytes == 0 {
            return Err(GatewayError::Config("max_payload_bytes must be > 0".into()));
        }
        Ok(())
    }

    /// Resolve into a gateway config, reading the schema file relative to `base_dir`
    pub fn into_config(self, base_dir: Option<&Path>) -> GatewayResult<GatewayConfig> {
        let schema = match &self.schema_path {
            Some(schema_path) => {
                let path = match base_dir {
                    Some(dir) if schema_path.is_relative() => dir.join(schema_path),
                    _ => schema_path.clone(),
                };
                let sdl = fs::read_to_string(&path).map_err(|e| {
                    GatewayError::Config(format!("Failed to read schema {}: {}", path.display(), e))
                })?;
                SchemaSource::Sdl(sdl)
            }
            None => SchemaSource::Empty,
        };

        Ok(GatewayConfig {
            cache: self.cache,
            schema,
            context: self.context,
            resolvers: Resolvers::from(self.root),
            pubsub: PubSubConfig {
                max_payload_bytes: self.max_payload_bytes,
            },
        })
    }
}
