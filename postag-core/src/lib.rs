//! # postag-core: Etiquetador Morfossintático (POS) com HMM de Bigramas
//!
//! Este crate treina um Modelo Oculto de Markov de bigramas a partir de um
//! corpus anotado (`palavra tag` por linha, sentenças separadas por linha em
//! branco) e etiqueta um corpus de teste com o algoritmo de Viterbi.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada** ([`corpus`]): qualquer [`std::io::BufRead`], lido sentença a sentença.
//! 2.  **Estimativa** ([`hmm`]): contagens de tags, emissões `(tag, palavra)` e
//!     transições `(tag, tag)`, incluindo as sentinelas `<START>` e `<STOP>`.
//! 3.  **Decodificação** ([`viterbi`]): lattice por sentença, uma tag por token.
//! 4.  **Avaliação** ([`evaluation`]): acurácia geral, de palavras conhecidas e
//!     desconhecidas, e medidas por tag, quando o teste traz tags de referência.
//! 5.  **Saída** ([`pipeline`]): [`AnalyzedData`] entregue a um [`AnalysisSink`].
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::io::Cursor;
//! use postag_core::{TaggerConfig, TaggingPipeline};
//!
//! let training = Cursor::new("the DT\ndog NN\n\nthe DT\ncat NN\n");
//! let test = Cursor::new("the\ndog\n");
//!
//! let data = TaggingPipeline::new(TaggerConfig::default())
//!     .run(training, test)
//!     .unwrap();
//!
//! let tags: Vec<&str> = data.result.tagged_tokens.iter().map(|t| t.tag.as_str()).collect();
//! assert_eq!(tags, vec!["DT", "NN"]);
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: orquestrador que conecta todos os estágios.
//! - [`hmm`]: estimativa do modelo.
//! - [`viterbi`]: decodificação.

pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod hmm;
pub mod pipeline;
pub mod probability;
pub mod tagger;
pub mod viterbi;

pub use corpus::{CorpusLine, Sentence, SentenceReader};
pub use error::{Result, TaggerError};
pub use evaluation::{Accuracy, Evaluation, TagMeasure};
pub use hmm::{CorpusModel, ModelEstimator, ModelStatistics};
pub use pipeline::{AnalysisSink, AnalyzedData, PipelineEvent, TaggerConfig, TaggingPipeline};
pub use probability::Probability;
pub use tagger::{LineFormat, TagPair, TaggedToken, START_TAG, STOP_TAG, UNKNOWN_TAG};
pub use viterbi::{decode, DecodeResult, DecodeStrategy, Lattice, LatticeCell, ViterbiDecoder};
