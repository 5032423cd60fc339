//! # Pipeline de Etiquetagem: Orquestrador com Eventos Observáveis
//!
//! Coordena estimativa do modelo, decodificação Viterbi e avaliação, e emite
//! eventos a cada passo via um canal Rust (`mpsc`). A linha de comando usa
//! esses eventos para registrar o progresso enquanto o pipeline roda em outra
//! thread.
//!
//! ## Fluxo de Eventos
//!
//! 1. `ModelEstimated`: estatísticas do corpus de treino.
//! 2. `SentenceTagged` (loop): uma sentença de teste etiquetada.
//! 3. `Done`: totais e tempo de processamento.
//!
//! Se algum passo falhar, `Error` substitui `Done` como último evento.

use std::io::BufRead;
use std::sync::mpsc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::corpus::SentenceReader;
use crate::error::Result;
use crate::evaluation::Evaluation;
use crate::hmm::{CorpusModel, ModelStatistics};
use crate::viterbi::{DecodeResult, DecodeStrategy, ViterbiDecoder};

/// Parâmetros de uma execução.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Suavização de Laplace parcial (viés +1 nas chaves observadas).
    pub smoothing: bool,
    pub strategy: DecodeStrategy,
}

/// Eventos emitidos pelo pipeline durante o processamento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: modelo estimado a partir do corpus de treino.
    ModelEstimated { statistics: ModelStatistics },
    /// **Passo 2**: uma sentença de teste foi etiquetada.
    SentenceTagged {
        sentence: usize,
        tokens: usize,
        /// Tags escolhidas, na ordem dos tokens.
        tags: Vec<String>,
    },
    /// **Conclusão**: decodificação encerrada.
    Done {
        total_tokens: usize,
        unknown_words: usize,
        processing_ms: u64,
    },
    /// **Falha**: erro irrecuperável; a execução foi abortada.
    Error { message: String },
}

/// Tudo o que uma execução produz, pronto para os relatórios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedData {
    pub config: TaggerConfig,
    pub statistics: ModelStatistics,
    pub result: DecodeResult,
    /// Presente só quando todos os tokens de teste têm tag de referência.
    pub evaluation: Option<Evaluation>,
}

impl AnalyzedData {
    /// Renderização JSON indentada.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Destino do resultado final (console, arquivo, ...).
pub trait AnalysisSink {
    fn consume(&mut self, data: &AnalyzedData) -> Result<()>;
}

/// O pipeline de etiquetagem.
///
/// # Modos de Uso
/// - **Sync**: [`TaggingPipeline::run`] devolve o resultado diretamente.
/// - **Streaming**: [`TaggingPipeline::run_streaming`] também envia
///   [`PipelineEvent`]s pelo canal.
#[derive(Debug, Clone, Default)]
pub struct TaggingPipeline {
    config: TaggerConfig,
}

impl TaggingPipeline {
    pub fn new(config: TaggerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    /// Estima, decodifica e avalia de forma síncrona.
    pub fn run<T: BufRead, U: BufRead>(&self, training: T, test: U) -> Result<AnalyzedData> {
        self.execute(training, test, |_| {})
    }

    /// Igual a [`run`](Self::run), enviando eventos de progresso em tempo real.
    ///
    /// O canal é liberado ao final, então o receptor sabe que não há mais eventos
    /// quando `recv` falha. Um receptor descartado não interrompe a execução.
    pub fn run_streaming<T: BufRead, U: BufRead>(
        &self,
        training: T,
        test: U,
        tx: mpsc::Sender<PipelineEvent>,
    ) -> Result<AnalyzedData> {
        let outcome = self.execute(training, test, |event| {
            let _ = tx.send(event);
        });
        if let Err(e) = &outcome {
            let _ = tx.send(PipelineEvent::Error {
                message: e.to_string(),
            });
        }
        outcome
    }

    fn execute<T: BufRead, U: BufRead>(
        &self,
        training: T,
        test: U,
        mut emit: impl FnMut(PipelineEvent),
    ) -> Result<AnalyzedData> {
        let start = Instant::now();
        let smoothing = self.config.smoothing;

        // === Passo 1: Estimativa ===
        let model = CorpusModel::estimate(training, smoothing)?;
        let statistics = model.statistics().clone();
        emit(PipelineEvent::ModelEstimated {
            statistics: statistics.clone(),
        });

        // === Passo 2: Decodificação sentença a sentença ===
        let mut decoder =
            ViterbiDecoder::new(&model, smoothing)?.with_strategy(self.config.strategy);
        let mut tagged_tokens = Vec::new();
        for sentence in SentenceReader::new(test) {
            let tagged = decoder.tag_sentence(&sentence?)?;
            if let Some(first) = tagged.first() {
                emit(PipelineEvent::SentenceTagged {
                    sentence: first.sentence,
                    tokens: tagged.len(),
                    tags: tagged.iter().map(|token| token.tag.clone()).collect(),
                });
            }
            tagged_tokens.extend(tagged);
        }
        let result = decoder.finish(tagged_tokens);

        // === Passo 3: Avaliação (só com tags de referência) ===
        let evaluation = Evaluation::from_result(&result);
        if let Some(evaluation) = &evaluation {
            info!(
                accuracy = evaluation.overall.percent(),
                known = evaluation.known.percent(),
                unknown = evaluation.unknown.percent(),
                "avaliação concluída"
            );
        }

        emit(PipelineEvent::Done {
            total_tokens: result.tagged_tokens.len(),
            unknown_words: result.unknown_words.len(),
            processing_ms: start.elapsed().as_millis() as u64,
        });

        Ok(AnalyzedData {
            config: self.config,
            statistics,
            result,
            evaluation,
        })
    }
}
