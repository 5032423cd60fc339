//! # Tags, Sentinelas e Tokens Etiquetados
//!
//! As tags POS não formam um conjunto fechado: o vocabulário de tags é aquele
//! observado no corpus de treino (ex: `DT`, `NN`, `VBZ` no Penn Treebank).
//! Por isso elas são representadas como `String`, e não como um `enum`.
//!
//! ## Sentinelas
//!
//! | Marcador   | Papel                                              |
//! |------------|----------------------------------------------------|
//! | `<START>`  | Estado anterior ao primeiro token de toda sentença |
//! | `<STOP>`   | Estado posterior ao último token de toda sentença  |
//! | `<UNK>`    | Classe das palavras nunca vistas no treino         |
//!
//! As sentinelas participam das transições, mas nunca são palavras do vocabulário.

use serde::{Deserialize, Serialize};

/// Tag sentinela de início de sentença.
pub const START_TAG: &str = "<START>";
/// Tag sentinela de fim de sentença.
pub const STOP_TAG: &str = "<STOP>";
/// Classe sintética das palavras desconhecidas.
pub const UNKNOWN_TAG: &str = "<UNK>";

/// Par ordenado de tags `(anterior, seguinte)`, chave da tabela de transições.
///
/// Igualdade e hash dependem apenas dos dois campos, então um par construído na
/// decodificação encontra a contagem registrada no treino.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagPair {
    first: String,
    second: String,
}

impl TagPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

impl std::fmt::Display for TagPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Formato das linhas de uma sentença de teste.
///
/// Detectado pela quantidade de campos da primeira linha. Não altera a
/// decodificação, apenas o que o relatório pode comparar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFormat {
    /// `palavra tag`: a tag de referência acompanha cada palavra.
    WordTag,
    /// Apenas a palavra; não há comparação com referência.
    WordOnly,
}

/// Um token de teste com a tag escolhida pelo decodificador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedToken {
    /// Linha original do corpus de teste.
    pub line: String,
    pub word: String,
    /// Tag de referência, presente só no formato [`LineFormat::WordTag`].
    pub gold_tag: Option<String>,
    /// Tag da célula vencedora no lattice.
    pub tag: String,
    /// Probabilidade acumulada da célula vencedora.
    pub probability: f64,
    /// Índice (base 0) da sentença de teste.
    pub sentence: usize,
}

impl TaggedToken {
    /// `Some(true)` quando a tag prevista coincide com a referência.
    pub fn is_correct(&self) -> Option<bool> {
        self.gold_tag.as_ref().map(|gold| *gold == self.tag)
    }
}
