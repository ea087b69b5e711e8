//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! into a typed [`AppConfig`]. The value is built once per process and handed
//! to constructors; nothing reads configuration implicitly.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub raw_docs_dir: String,
    pub processed_dir: String,
    pub tantivy_index_dir: String,
    pub lancedb_dir: String,
    pub lancedb_table: String,
    pub golden_dataset: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_docs_dir: "data/parsed".to_string(),
            processed_dir: "data/processed".to_string(),
            tantivy_index_dir: "data/indexes/tantivy".to_string(),
            lancedb_dir: "data/indexes/lancedb".to_string(),
            lancedb_table: "chunks".to_string(),
            golden_dataset: "data/golden_dataset.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    /// Only zero vs. non-zero matters: non-zero carries one sentence over.
    pub overlap: usize,
    /// `tokenizer.json` used for budgets; word heuristic when unset.
    pub tokenizer_path: Option<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: 400, overlap: 50, tokenizer_path: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub semantic_weight: f32,
    /// Defaults to `1 - semantic_weight`. When given it must complete the split.
    pub keyword_weight: Option<f32>,
    pub default_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { semantic_weight: 0.7, keyword_weight: None, default_k: 10 }
    }
}

impl RetrievalConfig {
    /// `(semantic_weight, keyword_weight)` after validation.
    pub fn weights(&self) -> Result<(f32, f32)> {
        check_unit_interval("retrieval.semantic_weight", f64::from(self.semantic_weight))?;
        let keyword = match self.keyword_weight {
            Some(w) => {
                check_unit_interval("retrieval.keyword_weight", f64::from(w))?;
                if (self.semantic_weight + w - 1.0).abs() > 1e-4 {
                    return Err(Error::InvalidConfig(format!(
                        "retrieval weights must sum to 1 (semantic {} + keyword {})",
                        self.semantic_weight, w
                    )));
                }
                w
            }
            None => 1.0 - self.semantic_weight,
        };
        Ok((self.semantic_weight, keyword))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Hash,
    Bert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model_dir: Option<String>,
    pub dim: usize,
    pub max_len: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { provider: EmbeddingProvider::Hash, model_dir: None, dim: 384, max_len: 256 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub recall_weight: f64,
    pub mrr_weight: f64,
    pub precision_weight: f64,
    pub retrieval_vs_qa: f64,
    pub seed: u64,
    pub sample_size: Option<usize>,
    pub answer_top_n: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            recall_weight: 0.4,
            mrr_weight: 0.3,
            precision_weight: 0.3,
            retrieval_vs_qa: 0.5,
            seed: 42,
            sample_size: None,
            answer_top_n: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub evaluation: EvaluationConfig,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl AppConfig {
    /// Load from the current directory.
    pub fn load() -> Result<Self> {
        let base = env::current_dir().map_err(|e| Error::io(".", e))?;
        Self::load_in(&base)
    }

    /// Load `config.toml`, the `RUST_ENV` overlay and `APP_*` variables from `base`.
    pub fn load_in(base: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            other => tracing::warn!(env = other, "unknown RUST_ENV, using config.toml only"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        tracing::debug!(env = %env_name, base = %base.display(), "loading configuration");
        Self::from_figment(figment, base)
    }

    /// Parse an inline TOML document over the defaults.
    pub fn from_toml_str(toml: &str, base: &Path) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml));
        Self::from_figment(figment, base)
    }

    fn from_figment(figment: Figment, base: &Path) -> Result<Self> {
        let mut config: AppConfig = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.base_dir = base.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_tokens == 0 {
            return Err(Error::InvalidConfig("chunking.max_tokens must be at least 1".into()));
        }
        self.retrieval.weights()?;
        if self.retrieval.default_k == 0 {
            return Err(Error::InvalidConfig("retrieval.default_k must be at least 1".into()));
        }
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be at least 1".into()));
        }
        if self.embedding.provider == EmbeddingProvider::Bert && self.embedding.model_dir.is_none() {
            return Err(Error::InvalidConfig("embedding.model_dir is required for the bert provider".into()));
        }
        let eval = &self.evaluation;
        check_unit_interval("evaluation.recall_weight", eval.recall_weight)?;
        check_unit_interval("evaluation.mrr_weight", eval.mrr_weight)?;
        check_unit_interval("evaluation.precision_weight", eval.precision_weight)?;
        check_unit_interval("evaluation.retrieval_vs_qa", eval.retrieval_vs_qa)?;
        let retrieval_sum = eval.recall_weight + eval.mrr_weight + eval.precision_weight;
        if (retrieval_sum - 1.0).abs() > 1e-6 {
            tracing::warn!(sum = retrieval_sum, "evaluation retrieval weights do not sum to 1");
        }
        Ok(())
    }

    /// Resolve a configured path against `base_dir`.
    pub fn path<S: AsRef<str>>(&self, p: S) -> PathBuf {
        resolve_with_base(&self.base_dir, p)
    }
}

/// Fails unless `value` lies in `[0, 1]`.
pub fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must lie in [0, 1], got {value}")))
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
