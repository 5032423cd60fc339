//! # Erros do Etiquetador
//!
//! Toda operação que lê um corpus devolve [`Result`]. Não há tentativas de
//! recuperação: uma falha de leitura ou uma linha mal formada aborta a execução.

use thiserror::Error;

/// Alias usado em todo o crate.
pub type Result<T, E = TaggerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TaggerError {
    /// O fluxo de entrada não pôde ser lido.
    #[error("falha de leitura do corpus: {0}")]
    Io(#[from] std::io::Error),

    /// Uma linha não segue o formato `palavra tag` onde a tag é obrigatória.
    #[error("linha {line} mal formada ({reason}): {content:?}")]
    Format {
        line: usize,
        content: String,
        reason: &'static str,
    },

    /// O modelo não conhece nenhuma tag, então não há linhas no lattice.
    #[error("o modelo treinado não possui nenhuma tag")]
    EmptyModel,

    #[error("falha ao serializar o resultado: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TaggerError {
    pub(crate) fn format(line: usize, content: &str, reason: &'static str) -> Self {
        Self::Format {
            line,
            content: content.to_string(),
            reason,
        }
    }
}
