//! # Estimador do Modelo HMM de Bigramas
//!
//! Implementação clássica de HMM onde:
//! - **Estados Ocultos**: Tags POS (DT, NN, VBZ, ...)
//! - **Observações**: Palavras
//!
//! O estimador apenas **conta**; as probabilidades são calculadas sob demanda
//! pelo decodificador a partir destas contagens:
//! 1. Frequência de cada tag (inclusive `<START>` e `<STOP>`)
//! 2. Palavras observadas com cada tag (emissão)
//! 3. Pares de tags consecutivas (transição)
//!
//! ## Suavização (Laplace parcial)
//!
//! Com suavização ligada, **a primeira ocorrência** de cada tag ou par de tags
//! é semeada com `1 + 1` em vez de `1`. Chaves nunca observadas continuam
//! ausentes: não se trata de somar 1 a todo o produto cartesiano
//! tag × tag, e trocar uma coisa pela outra muda os números produzidos.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::io::BufRead;
use std::iter;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::corpus::{CorpusLine, Sentence, SentenceReader};
use crate::error::Result;
use crate::probability::Probability;
use crate::tagger::{TagPair, START_TAG, STOP_TAG};

/// Estatísticas escalares do corpus de treino.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatistics {
    /// Número de sentenças de treino.
    pub sentence_count: usize,
    /// Tamanho do vocabulário (palavras distintas).
    pub unique_word_count: usize,
    /// Número de tokens (palavras) de treino.
    pub token_count: usize,
    /// Número de bigramas de tags distintos, incluindo os com sentinelas.
    pub unique_bigram_count: usize,
    /// Soma das frequências de tags sem a contribuição de `<START>`.
    /// Inclui um `<STOP>` por sentença.
    pub tag_count: usize,
    /// Número de tags distintas que emitem palavras.
    pub tag_types: usize,
}

/// Modelo treinado: contagens de emissão e transição.
///
/// Imutável depois de construído. O decodificador apenas lê o modelo, então
/// uma mesma instância pode atender várias decodificações.
#[derive(Debug, Clone, Default)]
pub struct CorpusModel {
    /// Ocorrências de cada tag. Chave `<START>` = número de sentenças.
    tag_frequency: HashMap<String, u32>,
    /// Palavras observadas com cada tag, com repetições.
    tag_to_words: HashMap<String, Vec<String>>,
    /// `tag -> palavra -> ocorrências`, para emissão em O(1).
    emission_counts: HashMap<String, HashMap<String, u32>>,
    /// Contagem de cada bigrama de tags.
    transition_count: HashMap<TagPair, u32>,
    vocabulary: HashSet<String>,
    smoothing: bool,
    statistics: ModelStatistics,
}

impl CorpusModel {
    /// Treina o modelo lendo um corpus `palavra tag` segmentado por linhas em branco.
    ///
    /// # Erros
    /// - [`TaggerError::Io`](crate::TaggerError::Io) se o fluxo falhar.
    /// - [`TaggerError::Format`](crate::TaggerError::Format) se alguma linha não tiver tag.
    pub fn estimate<R: BufRead>(training: R, smoothing: bool) -> Result<Self> {
        let mut estimator = ModelEstimator::new(smoothing);
        for sentence in SentenceReader::new(training) {
            estimator.add_sentence(&sentence?)?;
        }
        Ok(estimator.finish())
    }

    pub fn statistics(&self) -> &ModelStatistics {
        &self.statistics
    }

    /// Indica se o modelo foi estimado com suavização.
    pub fn smoothing(&self) -> bool {
        self.smoothing
    }

    pub fn tag_frequency(&self, tag: &str) -> u32 {
        self.tag_frequency.get(tag).copied().unwrap_or(0)
    }

    pub fn tag_frequencies(&self) -> &HashMap<String, u32> {
        &self.tag_frequency
    }

    /// Tags que emitem palavras, em ordem lexicográfica.
    ///
    /// Este é o vocabulário de tags do decodificador (as linhas do lattice);
    /// as sentinelas nunca aparecem aqui.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tag_to_words.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Palavras observadas com `tag`, na ordem do corpus.
    pub fn words_for(&self, tag: &str) -> &[String] {
        self.tag_to_words.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Quantas vezes `word` foi observada com `tag`.
    pub fn word_count(&self, tag: &str, word: &str) -> u32 {
        self.emission_counts
            .get(tag)
            .and_then(|words| words.get(word))
            .copied()
            .unwrap_or(0)
    }

    pub fn transition_count(&self, prev: &str, follow: &str) -> u32 {
        self.transition_count
            .get(&TagPair::new(prev, follow))
            .copied()
            .unwrap_or(0)
    }

    pub fn transition_counts(&self) -> &HashMap<TagPair, u32> {
        &self.transition_count
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.vocabulary.contains(word)
    }

    pub fn vocabulary(&self) -> &HashSet<String> {
        &self.vocabulary
    }

    /// `V` do denominador da transição: número de tags menos um quando há
    /// suavização, zero caso contrário.
    pub fn smoothing_mass(&self, smoothing: bool) -> u32 {
        if smoothing {
            (self.tag_to_words.len() as u32).saturating_sub(1)
        } else {
            0
        }
    }

    /// P(follow | prev) = count(prev, follow) / (count(prev) + V).
    pub fn transition_probability(&self, prev: &str, follow: &str, smoothing: bool) -> Probability {
        Probability::from_counts(
            self.transition_count(prev, follow),
            self.tag_frequency(prev) + self.smoothing_mass(smoothing),
        )
    }
}

/// Acumulador das contagens, sentença a sentença.
///
/// Todo o estado vive aqui até [`ModelEstimator::finish`], que entrega o
/// [`CorpusModel`] pronto. Não há estado global.
#[derive(Debug, Default)]
pub struct ModelEstimator {
    smoothing: bool,
    tag_frequency: HashMap<String, u32>,
    tag_to_words: HashMap<String, Vec<String>>,
    emission_counts: HashMap<String, HashMap<String, u32>>,
    transition_count: HashMap<TagPair, u32>,
    vocabulary: HashSet<String>,
    sentence_count: u32,
    token_count: usize,
}

impl ModelEstimator {
    pub fn new(smoothing: bool) -> Self {
        Self {
            smoothing,
            ..Self::default()
        }
    }

    /// Viés aplicado à primeira ocorrência de cada chave.
    fn bias(&self) -> u32 {
        u32::from(self.smoothing)
    }

    /// Conta uma sentença de treino.
    ///
    /// Todas as linhas são validadas antes de qualquer contagem, então uma
    /// linha mal formada não deixa a sentença contada pela metade.
    pub fn add_sentence(&mut self, sentence: &Sentence) -> Result<()> {
        let tokens = sentence
            .lines
            .iter()
            .map(CorpusLine::word_and_tag)
            .collect::<Result<Vec<_>>>()?;
        if tokens.is_empty() {
            return Ok(());
        }

        self.sentence_count += 1;
        self.count_emissions(&tokens);
        self.count_transitions(&tokens);
        Ok(())
    }

    /// Passagem de emissão: as sentinelas não emitem palavras.
    fn count_emissions(&mut self, tokens: &[(&str, &str)]) {
        let bias = self.bias();
        for &(word, tag) in tokens {
            bump(&mut self.tag_frequency, tag.to_string(), bias);
            self.tag_to_words
                .entry(tag.to_string())
                .or_default()
                .push(word.to_string());
            *self
                .emission_counts
                .entry(tag.to_string())
                .or_default()
                .entry(word.to_string())
                .or_insert(0) += 1;
            self.vocabulary.insert(word.to_string());
            self.token_count += 1;
        }
    }

    /// Passagem de transição sobre `<START> t1 .. tn <STOP>`.
    ///
    /// O último par contado é o que termina em `<STOP>`; nada além dele.
    fn count_transitions(&mut self, tokens: &[(&str, &str)]) {
        let bias = self.bias();
        let tags: Vec<&str> = iter::once(START_TAG)
            .chain(tokens.iter().map(|&(_, tag)| tag))
            .chain(iter::once(STOP_TAG))
            .collect();

        for pair in tags.windows(2) {
            bump(&mut self.transition_count, TagPair::new(pair[0], pair[1]), bias);
        }
        bump(&mut self.tag_frequency, START_TAG.to_string(), bias);
        bump(&mut self.tag_frequency, STOP_TAG.to_string(), bias);
    }

    /// Fecha a estimação.
    ///
    /// `<START>` passa a valer exatamente o número de sentenças (um início por
    /// sentença), sobrescrevendo o que as passagens acumularam.
    pub fn finish(mut self) -> CorpusModel {
        let sentence_count = self.sentence_count;
        self.tag_frequency.insert(START_TAG.to_string(), sentence_count);

        let total: usize = self.tag_frequency.values().map(|&c| c as usize).sum();
        let statistics = ModelStatistics {
            sentence_count: sentence_count as usize,
            unique_word_count: self.vocabulary.len(),
            token_count: self.token_count,
            unique_bigram_count: self.transition_count.len(),
            tag_count: total - sentence_count as usize,
            tag_types: self.tag_to_words.len(),
        };

        info!(
            sentences = statistics.sentence_count,
            tokens = statistics.token_count,
            vocabulary = statistics.unique_word_count,
            tags = statistics.tag_types,
            bigrams = statistics.unique_bigram_count,
            smoothing = self.smoothing,
            "modelo estimado"
        );
        debug!(frequencies = ?self.tag_frequency, "frequências de tags");

        CorpusModel {
            tag_frequency: self.tag_frequency,
            tag_to_words: self.tag_to_words,
            emission_counts: self.emission_counts,
            transition_count: self.transition_count,
            vocabulary: self.vocabulary,
            smoothing: self.smoothing,
            statistics,
        }
    }
}

/// Incrementa `key`, semeando com `1 + bias` na primeira vez.
fn bump<K: Eq + Hash>(map: &mut HashMap<K, u32>, key: K, bias: u32) {
    map.entry(key).and_modify(|count| *count += 1).or_insert(1 + bias);
}
