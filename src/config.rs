//! Configuração do helpdesk carregada a partir de `helpdesk.toml`.
//!
//! A struct [`HelpdeskConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `ANTHROPIC_API_KEY` tem precedência sobre o arquivo.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::HelpdeskError;
use crate::workflow::{Role, WorkflowLimits};

/// Configuração de nível superior carregada de `helpdesk.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HelpdeskConfig {
    /// Chave da API Anthropic.
    pub api_key: String,

    /// Modelo usado pelos workers e pelo summarizer.
    pub model: String,

    /// Máximo de handoffs aceitos por execução.
    pub max_handoffs: u32,

    /// Máximo de invocações de um mesmo papel por execução.
    pub max_iterations: u32,

    /// Orçamento de tempo de um papel, em segundos.
    pub role_timeout_secs: u64,

    /// Orçamento de tempo da execução inteira, em segundos.
    pub run_timeout_secs: u64,

    /// Tamanho da janela inspecionada pelo detector de loops.
    pub loop_window: usize,

    /// Mínimo de papéis distintos esperados dentro da janela.
    pub loop_min_unique: usize,

    /// Retentativas após uma falha transitória de um worker.
    pub max_transient_retries: u32,

    /// Worker que recebe tickets de categoria incerta.
    pub fallback_worker: Role,

    /// Arquivo JSON Lines com as resoluções memorizadas.
    pub memory_path: PathBuf,

    /// Arquivo JSON com os tickets.
    pub tickets_path: PathBuf,
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        let limits = WorkflowLimits::default();
        Self {
            api_key: String::new(),
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_handoffs: limits.max_handoffs,
            max_iterations: limits.max_iterations,
            role_timeout_secs: limits.role_timeout.as_secs(),
            run_timeout_secs: limits.run_timeout.as_secs(),
            loop_window: limits.loop_window,
            loop_min_unique: limits.loop_min_unique,
            max_transient_retries: limits.max_transient_retries,
            fallback_worker: Role::NetworkWorker,
            memory_path: PathBuf::from("data/memory.jsonl"),
            tickets_path: PathBuf::from("data/tickets.json"),
        }
    }
}

impl HelpdeskConfig {
    /// Carrega a configuração de `helpdesk.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, HelpdeskError> {
        Self::load_from(Path::new("helpdesk.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, HelpdeskError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<HelpdeskConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração para a chave API.
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY")
            && !key.is_empty()
        {
            config.api_key = key;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), HelpdeskError> {
        if !self.fallback_worker.is_worker() {
            return Err(HelpdeskError::Config(format!(
                "fallback_worker must be a worker role, got {}",
                self.fallback_worker
            )));
        }
        if self.loop_min_unique > self.loop_window {
            return Err(HelpdeskError::Config(format!(
                "loop_min_unique ({}) cannot exceed loop_window ({})",
                self.loop_min_unique, self.loop_window
            )));
        }
        Ok(())
    }

    /// Limites de segurança do motor derivados desta configuração.
    pub fn limits(&self) -> WorkflowLimits {
        WorkflowLimits {
            max_handoffs: self.max_handoffs,
            max_iterations: self.max_iterations,
            role_timeout: Duration::from_secs(self.role_timeout_secs),
            run_timeout: Duration::from_secs(self.run_timeout_secs),
            loop_window: self.loop_window,
            loop_min_unique: self.loop_min_unique,
            max_transient_retries: self.max_transient_retries,
        }
    }
}
