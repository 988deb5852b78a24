use crate::chat::SIMILARITY_THRESHOLD;
use crate::doc_processor::words_to_tokens;
use crate::embedding::OpenAiEmbedder;
use crate::error::{Error, Result};
use crate::llm::claude::ClaudeConfig;
use crate::llm::openai::OpenAiConfig;
use crate::llm::{Provider, ProviderGenerator};
use crate::rag::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "helpdesk.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/chatbot.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            similarity_threshold: default_threshold(),
        }
    }
}

fn default_source_path() -> PathBuf {
    PathBuf::from("data/article.txt")
}
fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}
fn default_threshold() -> f64 {
    SIMILARITY_THRESHOLD
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_embedding_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Claude,
    Ollama,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    /// Provider default when unset.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            model: default_chat_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_password_env")]
    pub password_env: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password_env: default_admin_password_env(),
        }
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_admin_password_env() -> String {
    "ADMIN_PASSWORD".to_string()
}

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

impl Config {
    /// Load from `path`, or from `helpdesk.toml` if it exists, or use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.chunk_size == 0 {
            return Err(Error::Config("retrieval.chunk_size must be positive".into()));
        }
        // The seeded overlap plus one fresh word has to fit in a chunk.
        let min_chunk = words_to_tokens(r.overlap) + words_to_tokens(1);
        if r.chunk_size < min_chunk {
            return Err(Error::Config(format!(
                "retrieval.chunk_size ({}) must be at least {} tokens for an overlap of {} words",
                r.chunk_size, min_chunk, r.overlap
            )));
        }
        if !(-1.0..=1.0).contains(&r.similarity_threshold) {
            return Err(Error::Config(
                "retrieval.similarity_threshold must be within [-1, 1]".into(),
            ));
        }
        Ok(())
    }

    pub fn embedder(&self) -> OpenAiEmbedder {
        let config = OpenAiConfig {
            api_key: env_or_empty(&self.embedding.api_key_env),
            base_url: self.embedding.base_url.clone(),
        };
        OpenAiEmbedder::new(config, self.embedding.model.clone())
    }

    pub fn generator(&self) -> ProviderGenerator {
        let g = &self.generation;
        let api_key = env_or_empty(&g.api_key_env);
        let provider = match (g.provider, g.base_url.clone()) {
            (ProviderKind::OpenAi, None) => Provider::openai(api_key),
            (ProviderKind::OpenAi, Some(base_url)) => {
                Provider::OpenAi(OpenAiConfig { api_key, base_url })
            }
            (ProviderKind::Claude, None) => Provider::claude(api_key),
            (ProviderKind::Claude, Some(base_url)) => {
                Provider::Claude(ClaudeConfig { api_key, base_url })
            }
            (ProviderKind::Ollama, host) => {
                Provider::ollama(host.unwrap_or_else(|| "http://localhost:11434".to_string()))
            }
        };
        ProviderGenerator::new(provider, g.model.clone())
    }

    pub fn admin_password(&self) -> String {
        std::env::var(&self.admin.password_env)
            .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string())
    }
}

fn env_or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.database.path, PathBuf::from("data/chatbot.db"));
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.retrieval.overlap, 50);
        assert_eq!(config.retrieval.similarity_threshold, 0.7);
        assert_eq!(config.embedding.model, "text-embedding-ada-002");
        assert_eq!(config.generation.provider, ProviderKind::OpenAi);
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.admin.username, "admin");
        config.validate().unwrap();
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [retrieval]
            source_path = "docs/faq.md"
            chunk_size = 300

            [generation]
            provider = "claude"
            model = "claude-sonnet-4-20250514"
            api_key_env = "ANTHROPIC_API_KEY"
            "#,
        )
        .unwrap();
        assert_eq!(config.retrieval.source_path, PathBuf::from("docs/faq.md"));
        assert_eq!(config.retrieval.chunk_size, 300);
        assert_eq!(config.retrieval.overlap, 50);
        assert_eq!(config.generation.provider, ProviderKind::Claude);
        assert_eq!(config.embedding.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn rejects_bad_values() {
        let config = Config::parse("[retrieval]\nchunk_size = 40\noverlap = 40\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        // 50 overlap words already cost 65 tokens.
        let config = Config::parse("[retrieval]\nchunk_size = 60\noverlap = 50\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config::parse("[retrieval]\nchunk_size = 67\noverlap = 50\n").unwrap();
        config.validate().unwrap();

        let config = Config::parse("[retrieval]\nsimilarity_threshold = 1.5\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        assert!(matches!(
            Config::parse("[generation]\nprovider = \"bard\"\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helpdesk.toml");
        std::fs::write(&path, "[database]\npath = \"/tmp/helpdesk-test.db\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/helpdesk-test.db"));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(Some(&missing)), Err(Error::Config(_))));
    }

    #[test]
    fn ollama_uses_local_host_by_default() {
        let config =
            Config::parse("[generation]\nprovider = \"ollama\"\nmodel = \"llama3\"\n").unwrap();
        let debug = format!("{:?}", config.generator());
        assert!(debug.contains("http://localhost:11434/v1"));
        assert!(debug.contains("llama3"));
    }

    #[test]
    fn debug_output_hides_api_keys() {
        let generator = ProviderGenerator::new(Provider::claude("sk-ant-secret".into()), "claude");
        let debug = format!("{:?}", generator);
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("https://api.anthropic.com"));

        let openai = OpenAiConfig {
            api_key: "sk-secret".into(),
            base_url: "https://api.openai.com/v1".into(),
        };
        assert!(!format!("{:?}", openai).contains("sk-secret"));
    }
}
