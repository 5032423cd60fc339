//! # Algoritmo de Viterbi: Decodificação de Tags POS
//!
//! Para cada sentença de teste é montado um **lattice**: uma coluna por token
//! e uma linha por tag conhecida. Cada célula guarda a probabilidade do melhor
//! caminho que termina naquela tag, naquela posição.
//!
//! ## Algoritmo
//!
//! ```text
//! Inicialização: lattice[0][t] = P(t | <START>) * P(w_0 | t)
//!
//! Recursão:      lattice[i][t] = max_{t'} [lattice[i-1][t'] * P(t | t')] * P(w_i | t)
//! ```
//!
//! As probabilidades são razões simples (não log-space). Um zero em transição
//! ou emissão zera a célula; não há piso nem epsilon.
//!
//! ## Estratégias de extração
//!
//! - [`DecodeStrategy::Greedy`] (padrão): a melhor linha de cada coluna é
//!   escolhida assim que a coluna é calculada. É uma aproximação do Viterbi:
//!   em sequências ambíguas pode divergir do caminho globalmente ótimo.
//! - [`DecodeStrategy::Backtrace`]: Viterbi completo; parte da melhor célula
//!   da última coluna e segue os backpointers até o início.
//!
//! Empates são resolvidos por `>` estrito: vence a primeira linha (ordem
//! lexicográfica das tags). Se nenhuma célula da coluna for positiva, vence a
//! tag com maior probabilidade de emissão da palavra, e em último caso a
//! primeira linha. Assim todo token recebe uma tag do vocabulário.

use std::collections::BTreeSet;
use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::corpus::{Sentence, SentenceReader};
use crate::error::{Result, TaggerError};
use crate::hmm::CorpusModel;
use crate::probability::Probability;
use crate::tagger::{LineFormat, TaggedToken, START_TAG, UNKNOWN_TAG};

/// Como a sequência de tags é extraída do lattice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStrategy {
    /// Compromete a melhor linha de cada coluna imediatamente.
    #[default]
    Greedy,
    /// Guarda os backpointers e reconstrói o caminho após a última coluna.
    Backtrace,
}

/// Uma combinação (tag, posição) do lattice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeCell {
    /// Índice da tag nas linhas do lattice.
    pub row: usize,
    /// Probabilidade do melhor caminho que chega a esta célula.
    pub probability: f64,
    /// P(palavra | tag) usada no cálculo.
    pub emission: f64,
    /// Linha da coluna anterior que maximizou a entrada. `None` na coluna 0
    /// e quando todas as candidatas eram zero.
    pub backpointer: Option<usize>,
}

/// Grade de células de uma sentença. Descartada após a extração das tags.
#[derive(Debug, Clone)]
pub struct Lattice<'m> {
    tags: Vec<&'m str>,
    words: Vec<String>,
    columns: Vec<Vec<LatticeCell>>,
}

impl<'m> Lattice<'m> {
    /// Número de colunas (tokens).
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> &[LatticeCell] {
        &self.columns[index]
    }

    pub fn word(&self, column: usize) -> &str {
        &self.words[column]
    }

    pub fn tag(&self, row: usize) -> &'m str {
        self.tags[row]
    }

    /// Melhor linha da coluna: maior probabilidade positiva; senão maior
    /// emissão positiva; senão a primeira linha.
    pub fn best_row(&self, column: usize) -> usize {
        let cells = &self.columns[column];
        strict_argmax(cells.iter().map(|cell| cell.probability))
            .or_else(|| strict_argmax(cells.iter().map(|cell| cell.emission)))
            .unwrap_or(0)
    }

    /// Uma linha por coluna, escolhida coluna a coluna.
    pub fn greedy_path(&self) -> Vec<usize> {
        (0..self.len()).map(|column| self.best_row(column)).collect()
    }

    /// Caminho reconstruído pelos backpointers a partir da melhor célula final.
    ///
    /// Onde a cadeia se interrompe (backpointer ausente) a coluna usa a sua
    /// própria melhor linha e a reconstrução continua dali.
    pub fn backtrace_path(&self) -> Vec<usize> {
        let Some(last) = self.len().checked_sub(1) else {
            return Vec::new();
        };
        let mut path = vec![0usize; self.len()];
        path[last] = self.best_row(last);
        for column in (0..last).rev() {
            path[column] = self.columns[column + 1][path[column + 1]]
                .backpointer
                .unwrap_or_else(|| self.best_row(column));
        }
        path
    }
}

/// Índice do primeiro valor estritamente maior que todos os anteriores e que zero.
fn strict_argmax(values: impl Iterator<Item = f64>) -> Option<usize> {
    let mut best = None;
    let mut max = 0.0;
    for (index, value) in values.enumerate() {
        if value > max {
            max = value;
            best = Some(index);
        }
    }
    best
}

/// Palavras de teste ausentes do vocabulário de treino.
///
/// Fica no decodificador, e não no modelo, para que o modelo continue
/// imutável durante a decodificação.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownWordAccumulator {
    words: BTreeSet<String>,
}

impl UnknownWordAccumulator {
    /// Registra a palavra; devolve `true` na primeira vez.
    pub fn record(&mut self, word: &str) -> bool {
        if self.words.contains(word) {
            return false;
        }
        self.words.insert(word.to_string())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn into_words(self) -> BTreeSet<String> {
        self.words
    }
}

/// Saída da decodificação de um corpus de teste.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeResult {
    /// Um token por linha de teste, na ordem original.
    pub tagged_tokens: Vec<TaggedToken>,
    /// Palavras distintas nunca vistas no treino (classe `<UNK>`).
    pub unknown_words: BTreeSet<String>,
    pub test_sentence_count: usize,
}

impl DecodeResult {
    /// `true` quando todos os tokens trazem tag de referência.
    pub fn has_gold_tags(&self) -> bool {
        !self.tagged_tokens.is_empty()
            && self.tagged_tokens.iter().all(|token| token.gold_tag.is_some())
    }

    pub fn is_unknown(&self, word: &str) -> bool {
        self.unknown_words.contains(word)
    }
}

/// Decodificador Viterbi sobre um [`CorpusModel`] emprestado.
///
/// As linhas do lattice e a tabela de transições são calculadas uma vez na
/// construção e reutilizadas em todas as sentenças.
pub struct ViterbiDecoder<'m> {
    model: &'m CorpusModel,
    smoothing: bool,
    strategy: DecodeStrategy,
    tags: Vec<&'m str>,
    /// P(tag | <START>) por linha.
    start_transitions: Vec<Probability>,
    /// `transitions[anterior][seguinte]`.
    transitions: Vec<Vec<Probability>>,
    unknown: UnknownWordAccumulator,
    sentence_count: usize,
}

impl<'m> ViterbiDecoder<'m> {
    /// Prepara o decodificador.
    ///
    /// # Erros
    /// [`TaggerError::EmptyModel`] se o modelo não conhecer nenhuma tag.
    pub fn new(model: &'m CorpusModel, smoothing: bool) -> Result<Self> {
        let tags = model.tags();
        if tags.is_empty() {
            return Err(TaggerError::EmptyModel);
        }

        let start_transitions = tags
            .iter()
            .map(|follow| model.transition_probability(START_TAG, follow, smoothing))
            .collect();
        let transitions = tags
            .iter()
            .map(|prev| {
                tags.iter()
                    .map(|follow| model.transition_probability(prev, follow, smoothing))
                    .collect()
            })
            .collect();

        Ok(Self {
            model,
            smoothing,
            strategy: DecodeStrategy::default(),
            tags,
            start_transitions,
            transitions,
            unknown: UnknownWordAccumulator::default(),
            sentence_count: 0,
        })
    }

    pub fn with_strategy(mut self, strategy: DecodeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Linhas do lattice, em ordem.
    pub fn tags(&self) -> &[&'m str] {
        &self.tags
    }

    pub fn unknown_words(&self) -> &UnknownWordAccumulator {
        &self.unknown
    }

    fn bias(&self) -> u32 {
        u32::from(self.smoothing)
    }

    /// P(follow | prev), com a massa de suavização no denominador.
    pub fn transition_probability(&self, follow: &str, prev: &str) -> Probability {
        self.model.transition_probability(prev, follow, self.smoothing)
    }

    /// P(word | tag).
    ///
    /// Palavra desconhecida: registrada como `<UNK>` e pontuada com
    /// `(1 + viés) / freq(tag)`, igual para qualquer palavra fora do vocabulário.
    pub fn emission_probability(&mut self, tag: &str, word: &str) -> Probability {
        let frequency = self.model.tag_frequency(tag);
        if !self.model.contains_word(word) {
            if self.unknown.record(word) {
                debug!(word, class = UNKNOWN_TAG, "palavra desconhecida");
            }
            return Probability::from_counts(1 + self.bias(), frequency);
        }
        Probability::from_counts(self.model.word_count(tag, word), frequency)
    }

    /// Decodifica um corpus inteiro, sentença por sentença.
    ///
    /// O conjunto de palavras desconhecidas e a contagem de sentenças são
    /// transferidos para o resultado, deixando o decodificador pronto para
    /// outro corpus.
    pub fn decode<R: BufRead>(&mut self, test: R) -> Result<DecodeResult> {
        let mut tagged_tokens = Vec::new();
        for sentence in SentenceReader::new(test) {
            let tagged = self.tag_sentence(&sentence?)?;
            tagged_tokens.extend(tagged);
        }
        Ok(self.finish(tagged_tokens))
    }

    /// Fecha o corpus corrente: entrega os tokens com as palavras desconhecidas
    /// e a contagem de sentenças acumuladas desde o último fechamento.
    pub fn finish(&mut self, tagged_tokens: Vec<TaggedToken>) -> DecodeResult {
        let unknown = std::mem::take(&mut self.unknown);
        let test_sentence_count = std::mem::take(&mut self.sentence_count);
        info!(
            sentences = test_sentence_count,
            tokens = tagged_tokens.len(),
            unknown = unknown.len(),
            strategy = ?self.strategy,
            "corpus de teste decodificado"
        );

        DecodeResult {
            tagged_tokens,
            unknown_words: unknown.into_words(),
            test_sentence_count,
        }
    }

    /// Etiqueta uma sentença: `Inicializando(coluna 0) → Estendendo(1..n) → Pronto`.
    pub fn tag_sentence(&mut self, sentence: &Sentence) -> Result<Vec<TaggedToken>> {
        if sentence.is_empty() {
            return Ok(Vec::new());
        }

        let format = sentence.format();
        if format == LineFormat::WordTag {
            // Toda linha precisa da tag de referência, não só a primeira
            for line in &sentence.lines {
                line.word_and_tag()?;
            }
        }

        let index = self.sentence_count;
        self.sentence_count += 1;

        let words: Vec<&str> = sentence.words().collect();
        let lattice = self.build_lattice(&words);
        let path = match self.strategy {
            DecodeStrategy::Greedy => lattice.greedy_path(),
            DecodeStrategy::Backtrace => lattice.backtrace_path(),
        };

        let tagged: Vec<TaggedToken> = sentence
            .lines
            .iter()
            .zip(path)
            .enumerate()
            .map(|(column, (line, row))| TaggedToken {
                line: line.text.clone(),
                word: line.word().to_string(),
                gold_tag: match format {
                    LineFormat::WordTag => line.tag().map(str::to_string),
                    LineFormat::WordOnly => None,
                },
                tag: lattice.tag(row).to_string(),
                probability: lattice.column(column)[row].probability,
                sentence: index,
            })
            .collect();

        debug!(sentence = index, tokens = tagged.len(), ?format, "sentença etiquetada");
        Ok(tagged)
    }

    /// Calcula todas as colunas do lattice para a sequência de palavras.
    pub fn build_lattice(&mut self, words: &[&str]) -> Lattice<'m> {
        let mut columns: Vec<Vec<LatticeCell>> = Vec::with_capacity(words.len());

        for (position, &word) in words.iter().enumerate() {
            let mut column = Vec::with_capacity(self.tags.len());
            for row in 0..self.tags.len() {
                let tag = self.tags[row];
                let emission = self.emission_probability(tag, word).value;

                let (inbound, backpointer) = match columns.last() {
                    // === Inicialização (coluna 0) ===
                    None => (self.start_transitions[row].value, None),
                    // === Recursão ===
                    Some(previous) => self.best_inbound(previous, row),
                };

                column.push(LatticeCell {
                    row,
                    probability: inbound * emission,
                    emission,
                    backpointer,
                });
            }

            trace!(
                position,
                word,
                best = self.tags[strict_argmax(column.iter().map(|c| c.probability)).unwrap_or(0)],
                "coluna calculada"
            );
            columns.push(column);
        }

        Lattice {
            tags: self.tags.clone(),
            words: words.iter().map(|w| w.to_string()).collect(),
            columns,
        }
    }

    /// max_{r'} previous[r'] * P(row | r'), com `>` estrito a partir de zero.
    fn best_inbound(&self, previous: &[LatticeCell], row: usize) -> (f64, Option<usize>) {
        let mut best = 0.0;
        let mut backpointer = None;
        for cell in previous {
            let candidate = cell.probability * self.transitions[cell.row][row].value;
            if candidate > best {
                best = candidate;
                backpointer = Some(cell.row);
            }
        }
        (best, backpointer)
    }
}

/// Atalho: decodifica `test` com um decodificador guloso recém-criado.
pub fn decode<R: BufRead>(model: &CorpusModel, test: R, smoothing: bool) -> Result<DecodeResult> {
    ViterbiDecoder::new(model, smoothing)?.decode(test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_SENTENCES: &str = "the DT\ndog NN\n\nthe DT\ncat NN\n";

    /// `a` é ambígua entre X e Y; só Y leva a Z, a única tag que emite `b`.
    const AMBIGUOUS: &str = "a X\nc W\n\na X\nc W\n\na Y\nb Z\n";

    fn model(text: &str, smoothing: bool) -> CorpusModel {
        CorpusModel::estimate(Cursor::new(text.to_string()), smoothing).unwrap()
    }

    fn tags_of(result: &DecodeResult) -> Vec<&str> {
        result.tagged_tokens.iter().map(|t| t.tag.as_str()).collect()
    }

    #[test]
    fn test_decodes_training_like_sentence() {
        let model = model(TWO_SENTENCES, false);
        let result = decode(&model, Cursor::new("the DT\ndog NN\n"), false).unwrap();

        assert_eq!(tags_of(&result), vec!["DT", "NN"]);
        assert_eq!(result.test_sentence_count, 1);
        assert!(result.unknown_words.is_empty());
        assert!(result.has_gold_tags());
        assert_eq!(result.tagged_tokens[1].probability, 0.5);
    }

    #[test]
    fn test_word_only_line_is_tagged_by_emission() {
        for smoothing in [false, true] {
            let model = model(TWO_SENTENCES, smoothing);
            let result = decode(&model, Cursor::new("dog\n"), smoothing).unwrap();
            assert_eq!(tags_of(&result), vec!["NN"]);
            assert_eq!(result.tagged_tokens[0].gold_tag, None);
            assert!(!result.has_gold_tags());
        }
    }

    #[test]
    fn test_one_tag_per_token_from_vocabulary() {
        let model = model("a DT\nb NN\nc VB\n\nd DT\ne JJ\nf NN\n", true);
        let test = "a\nzzz\nc\nf\n\ne\n\nq\nr\n";
        let result = decode(&model, Cursor::new(test), true).unwrap();

        assert_eq!(result.tagged_tokens.len(), 7);
        assert_eq!(result.test_sentence_count, 3);
        let vocabulary = model.tags();
        for token in &result.tagged_tokens {
            assert!(vocabulary.contains(&token.tag.as_str()), "{}", token.tag);
        }
        let sentences: Vec<usize> = result.tagged_tokens.iter().map(|t| t.sentence).collect();
        assert_eq!(sentences, vec![0, 0, 0, 0, 1, 2, 2]);
    }

    #[test]
    fn test_unknown_word_recorded_once() {
        let model = model(TWO_SENTENCES, false);
        let test = "the DT\nfish NN\n\nfish NN\nbird NN\n\nfish NN\n";
        let result = decode(&model, Cursor::new(test), false).unwrap();

        assert_eq!(result.unknown_words.len(), 2);
        assert!(result.is_unknown("fish"));
        assert!(result.is_unknown("bird"));
        assert_eq!(tags_of(&result)[1], "NN");
    }

    #[test]
    fn test_decoder_resets_between_corpora() {
        let model = model(TWO_SENTENCES, false);
        let mut decoder = ViterbiDecoder::new(&model, false).unwrap();

        let first = decoder.decode(Cursor::new("fish\n")).unwrap();
        let second = decoder.decode(Cursor::new("the\n\nbird\n")).unwrap();

        assert_eq!(first.unknown_words.len(), 1);
        assert_eq!(second.unknown_words.len(), 1);
        assert!(second.is_unknown("bird"));
        assert_eq!(second.test_sentence_count, 2);
        // O modelo não aprende palavras durante a decodificação
        assert!(!model.contains_word("fish"));
    }

    #[test]
    fn test_shared_model_gives_identical_results() {
        let model = model(TWO_SENTENCES, true);
        let test = "the\ncat\n\nthe\nbird\n";
        let a = decode(&model, Cursor::new(test), true).unwrap();
        let b = decode(&model, Cursor::new(test), true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ties_go_to_first_row() {
        // X e Y são simétricas: mesma transição inicial e mesma emissão
        let model = model("x X\n\nx Y\n", false);
        let result = decode(&model, Cursor::new("x\n"), false).unwrap();
        assert_eq!(tags_of(&result), vec!["X"]);
        assert_eq!(result.tagged_tokens[0].probability, 0.5);
    }

    #[test]
    fn test_greedy_and_backtrace_differ_on_ambiguity() {
        let model = model(AMBIGUOUS, false);

        let mut greedy = ViterbiDecoder::new(&model, false).unwrap();
        let greedy = greedy.decode(Cursor::new("a\nb\n")).unwrap();
        assert_eq!(tags_of(&greedy), vec!["X", "Z"]);

        let mut full = ViterbiDecoder::new(&model, false)
            .unwrap()
            .with_strategy(DecodeStrategy::Backtrace);
        let full = full.decode(Cursor::new("a\nb\n")).unwrap();
        assert_eq!(tags_of(&full), vec!["Y", "Z"]);
    }

    #[test]
    fn test_lattice_cells_and_backpointers() {
        let model = model(AMBIGUOUS, false);
        let mut decoder = ViterbiDecoder::new(&model, false).unwrap();
        let lattice = decoder.build_lattice(&["a", "b"]);

        assert_eq!(lattice.len(), 2);
        assert_eq!(lattice.word(1), "b");
        let rows: Vec<&str> = (0..4).map(|row| lattice.tag(row)).collect();
        assert_eq!(rows, vec!["W", "X", "Y", "Z"]);

        let first = lattice.column(0);
        assert!((first[1].probability - 2.0 / 3.0).abs() < 1e-12);
        assert!((first[2].probability - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(first[1].backpointer, None);

        let z = lattice.column(1)[3];
        assert_eq!(z.backpointer, Some(2));
        assert!((z.probability - 1.0 / 3.0).abs() < 1e-12);
        // W não emite `b`, mas ainda tem uma entrada não nula
        assert_eq!(lattice.column(1)[0].probability, 0.0);
        assert_eq!(lattice.column(1)[0].backpointer, Some(1));
    }

    #[test]
    fn test_probabilities_within_unit_interval() {
        let model = model("a DT\nb NN\nc VB\n\nd DT\ne JJ\nf NN\n\nb NN\nb VB\n", true);
        let mut decoder = ViterbiDecoder::new(&model, true).unwrap();
        let tags: Vec<&str> = decoder.tags().to_vec();

        for &prev in tags.iter().chain([START_TAG].iter()) {
            for &follow in &tags {
                let p = decoder.transition_probability(follow, prev);
                assert!((0.0..=1.0).contains(&p.value));
                assert_eq!(p.log == 0.0, p.value == 0.0 || p.value == 1.0);
            }
        }
        for &tag in &tags {
            for word in ["a", "b", "f", "never-seen"] {
                let p = decoder.emission_probability(tag, word);
                assert!((0.0..=1.0).contains(&p.value));
                assert_eq!(p.log == 0.0, p.value == 0.0 || p.value == 1.0);
            }
        }
        assert_eq!(decoder.unknown_words().len(), 1);
    }

    #[test]
    fn test_unknown_emission_uses_bias() {
        let model = model(TWO_SENTENCES, true);
        let mut decoder = ViterbiDecoder::new(&model, true).unwrap();
        // (1 + 1) / freq(NN) = 2 / 3
        let p = decoder.emission_probability("NN", "zebra");
        assert!((p.value - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_gold_tag_is_format_error() {
        let model = model(TWO_SENTENCES, false);
        let result = decode(&model, Cursor::new("the DT\ndog\n"), false);
        match result {
            Err(TaggerError::Format { line, .. }) => assert_eq!(line, 2),
            other => panic!("esperado erro de formato, obtido {other:?}"),
        }
    }

    #[test]
    fn test_empty_model_is_rejected() {
        let model = model("", false);
        assert!(matches!(
            ViterbiDecoder::new(&model, false),
            Err(TaggerError::EmptyModel)
        ));
    }
}
