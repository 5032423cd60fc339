//! # Avaliação da Etiquetagem
//!
//! Compara as tags previstas com as tags de referência do corpus de teste.
//! Só faz sentido quando o teste está no formato `palavra tag`.
//!
//! ## Métricas
//!
//! - **Acurácia por token**: acertos / tokens.
//! - **Conhecidas vs. desconhecidas**: a mesma acurácia separada pelos tokens
//!   cuja palavra estava (ou não) no vocabulário de treino. Cada ocorrência
//!   conta, não apenas palavras distintas.
//! - **Por tag**: precisão, cobertura (recall) e F1, mais as médias macro.
//! - **Acurácia por sentença**: sentenças com todos os tokens corretos.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::viterbi::DecodeResult;

/// Acertos sobre total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
}

impl Accuracy {
    fn add(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Razão em `[0, 1]`; zero quando não há itens.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> f64 {
        self.ratio() * 100.0
    }
}

/// Medidas de uma tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagMeasure {
    /// Previsões corretas desta tag.
    pub correct: usize,
    /// Vezes em que o modelo previu esta tag.
    pub predicted: usize,
    /// Vezes em que a tag aparece na referência.
    pub observed: usize,
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

impl TagMeasure {
    fn finalize(&mut self) {
        self.precision = if self.predicted > 0 {
            self.correct as f64 / self.predicted as f64
        } else {
            0.0
        };
        self.recall = if self.observed > 0 {
            self.correct as f64 / self.observed as f64
        } else {
            0.0
        };
        self.fmeasure = if self.precision + self.recall > 0.0 {
            2.0 * self.precision * self.recall / (self.precision + self.recall)
        } else {
            0.0
        };
    }
}

/// Resultado completo da avaliação.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub overall: Accuracy,
    pub known: Accuracy,
    pub unknown: Accuracy,
    pub sentences: Accuracy,
    /// Medidas por tag, em ordem alfabética.
    pub tags: BTreeMap<String, TagMeasure>,
    /// Médias macro sobre as tags presentes na referência.
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_fmeasure: f64,
}

impl Evaluation {
    /// Avalia o resultado; `None` se algum token não tiver tag de referência.
    pub fn from_result(result: &DecodeResult) -> Option<Self> {
        if !result.has_gold_tags() {
            return None;
        }

        let mut evaluation = Evaluation::default();
        let mut current_sentence = None;
        let mut sentence_correct = true;

        for token in &result.tagged_tokens {
            let gold = token.gold_tag.as_deref()?;
            let correct = token.is_correct()?;

            if current_sentence != Some(token.sentence) {
                if current_sentence.is_some() {
                    evaluation.sentences.add(sentence_correct);
                }
                current_sentence = Some(token.sentence);
                sentence_correct = true;
            }
            sentence_correct &= correct;

            evaluation.overall.add(correct);
            if result.is_unknown(&token.word) {
                evaluation.unknown.add(correct);
            } else {
                evaluation.known.add(correct);
            }

            evaluation.tags.entry(gold.to_string()).or_default().observed += 1;
            let predicted = evaluation.tags.entry(token.tag.clone()).or_default();
            predicted.predicted += 1;
            if correct {
                predicted.correct += 1;
            }
        }
        if current_sentence.is_some() {
            evaluation.sentences.add(sentence_correct);
        }

        evaluation.finalize();
        Some(evaluation)
    }

    fn finalize(&mut self) {
        let mut observed_tags = 0usize;
        for measure in self.tags.values_mut() {
            measure.finalize();
            if measure.observed == 0 {
                continue;
            }
            observed_tags += 1;
            self.macro_precision += measure.precision;
            self.macro_recall += measure.recall;
            self.macro_fmeasure += measure.fmeasure;
        }
        if observed_tags > 0 {
            let n = observed_tags as f64;
            self.macro_precision /= n;
            self.macro_recall /= n;
            self.macro_fmeasure /= n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::TaggedToken;
    use std::collections::BTreeSet;

    fn token(word: &str, gold: Option<&str>, tag: &str, sentence: usize) -> TaggedToken {
        TaggedToken {
            line: match gold {
                Some(g) => format!("{word} {g}"),
                None => word.to_string(),
            },
            word: word.to_string(),
            gold_tag: gold.map(str::to_string),
            tag: tag.to_string(),
            probability: 0.1,
            sentence,
        }
    }

    fn result(tokens: Vec<TaggedToken>, unknown: &[&str]) -> DecodeResult {
        let test_sentence_count = tokens.iter().map(|t| t.sentence + 1).max().unwrap_or(0);
        DecodeResult {
            tagged_tokens: tokens,
            unknown_words: unknown.iter().map(|w| w.to_string()).collect::<BTreeSet<_>>(),
            test_sentence_count,
        }
    }

    #[test]
    fn test_accuracy_split_by_vocabulary() {
        let result = result(
            vec![
                token("the", Some("DT"), "DT", 0),
                token("fish", Some("NN"), "NN", 0),
                token("swims", Some("VBZ"), "NN", 0),
                token("the", Some("DT"), "DT", 1),
                token("fish", Some("NN"), "VB", 1),
            ],
            &["fish", "swims"],
        );
        let evaluation = Evaluation::from_result(&result).unwrap();

        assert_eq!(evaluation.overall, Accuracy { correct: 3, total: 5 });
        assert_eq!(evaluation.known, Accuracy { correct: 2, total: 2 });
        // Ocorrências, não palavras distintas: "fish" conta duas vezes
        assert_eq!(evaluation.unknown, Accuracy { correct: 1, total: 3 });
        assert_eq!(evaluation.sentences, Accuracy { correct: 0, total: 2 });
        assert!((evaluation.overall.percent() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_per_tag_measures() {
        let result = result(
            vec![
                token("a", Some("DT"), "DT", 0),
                token("b", Some("NN"), "DT", 0),
                token("c", Some("NN"), "NN", 0),
            ],
            &[],
        );
        let evaluation = Evaluation::from_result(&result).unwrap();

        let dt = &evaluation.tags["DT"];
        assert_eq!((dt.correct, dt.predicted, dt.observed), (1, 2, 1));
        assert_eq!(dt.precision, 0.5);
        assert_eq!(dt.recall, 1.0);

        let nn = &evaluation.tags["NN"];
        assert_eq!((nn.correct, nn.predicted, nn.observed), (1, 1, 2));
        assert_eq!(nn.recall, 0.5);
        assert!((evaluation.macro_precision - 0.75).abs() < 1e-12);
        assert_eq!(evaluation.sentences, Accuracy { correct: 0, total: 1 });
    }

    #[test]
    fn test_predicted_only_tag_excluded_from_macro() {
        let result = result(
            vec![token("a", Some("DT"), "DT", 0), token("b", Some("DT"), "VB", 0)],
            &[],
        );
        let evaluation = Evaluation::from_result(&result).unwrap();
        assert_eq!(evaluation.tags["VB"].observed, 0);
        // Só DT entra na média
        assert_eq!(evaluation.macro_precision, 1.0);
        assert_eq!(evaluation.macro_recall, 0.5);
    }

    #[test]
    fn test_no_evaluation_without_gold_tags() {
        let result = result(
            vec![token("a", Some("DT"), "DT", 0), token("b", None, "NN", 1)],
            &[],
        );
        assert_eq!(Evaluation::from_result(&result), None);
        assert_eq!(Evaluation::from_result(&DecodeResult::default()), None);
    }

    #[test]
    fn test_empty_accuracy_ratio() {
        assert_eq!(Accuracy::default().ratio(), 0.0);
    }
}
