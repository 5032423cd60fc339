//! # Leitura de Corpus Segmentado em Sentenças
//!
//! Corpora de treino e teste usam o mesmo formato de linhas:
//!
//! ```text
//! The DT
//! dog NN
//! barks VBZ
//!
//! A DT
//! ...
//! ```
//!
//! - Cada linha não vazia é um token (`palavra tag`, ou só `palavra` no teste).
//! - Uma linha em branco (ou o fim do fluxo) encerra a sentença.
//! - Linhas em branco consecutivas não geram sentenças vazias.
//!
//! O leitor aceita qualquer [`BufRead`], então o núcleo não depende de arquivos.

use std::io::{BufRead, Lines};

use crate::error::{Result, TaggerError};
use crate::tagger::LineFormat;

/// Uma linha do corpus com sua posição (base 1) no fluxo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusLine {
    pub number: usize,
    pub text: String,
}

impl CorpusLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// Primeiro campo da linha.
    pub fn word(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or_default()
    }

    /// Segundo campo da linha, se existir. Campos extras são ignorados.
    pub fn tag(&self) -> Option<&str> {
        self.text.split_whitespace().nth(1)
    }

    pub fn field_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Divide a linha em `(palavra, tag)`, falhando se a tag estiver ausente.
    pub fn word_and_tag(&self) -> Result<(&str, &str)> {
        let mut fields = self.text.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(word), Some(tag)) => Ok((word, tag)),
            _ => Err(TaggerError::format(
                self.number,
                &self.text,
                "esperado `palavra tag`",
            )),
        }
    }
}

/// Sequência de linhas consecutivas não vazias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub lines: Vec<CorpusLine>,
}

impl Sentence {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Formato decidido pela primeira linha: dois campos ou mais indicam
    /// tags de referência.
    pub fn format(&self) -> LineFormat {
        match self.lines.first() {
            Some(line) if line.field_count() >= 2 => LineFormat::WordTag,
            _ => LineFormat::WordOnly,
        }
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(CorpusLine::word)
    }
}

/// Iterador de sentenças sobre um fluxo de linhas.
///
/// Erros de leitura são devolvidos como `Some(Err(..))`; depois de um erro o
/// chamador deve parar de consumir o iterador.
pub struct SentenceReader<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: BufRead> SentenceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for SentenceReader<R> {
    type Item = Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut sentence = Sentence::default();
        for line in self.lines.by_ref() {
            self.line_number += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                if sentence.is_empty() {
                    continue;
                }
                return Some(Ok(sentence));
            }
            sentence.lines.push(CorpusLine::new(self.line_number, line));
        }

        // Fim do fluxo: a última sentença pode não ter linha em branco depois.
        if sentence.is_empty() {
            None
        } else {
            Some(Ok(sentence))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(text: &str) -> Vec<Sentence> {
        SentenceReader::new(Cursor::new(text.to_string()))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_segments_on_blank_lines() {
        let sentences = read_all("the DT\ndog NN\n\nthe DT\ncat NN\n");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].len(), 2);
        assert_eq!(sentences[1].words().collect::<Vec<_>>(), vec!["the", "cat"]);
    }

    #[test]
    fn test_last_sentence_without_trailing_blank() {
        let sentences = read_all("a DT\nb NN");
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].lines[1].number, 2);
    }

    #[test]
    fn test_consecutive_blank_lines_are_skipped() {
        let sentences = read_all("\n\na DT\n\n\n   \nb NN\n\n");
        assert_eq!(sentences.len(), 2);
        // Números de linha acompanham o fluxo original, incluindo linhas vazias
        assert_eq!(sentences[1].lines[0].number, 7);
    }

    #[test]
    fn test_format_detection() {
        let sentences = read_all("dog\nbarks\n\ndog NN\n");
        assert_eq!(sentences[0].format(), LineFormat::WordOnly);
        assert_eq!(sentences[1].format(), LineFormat::WordTag);
    }

    #[test]
    fn test_word_and_tag() {
        let line = CorpusLine::new(4, "dogs\tNNS");
        assert_eq!(line.word_and_tag().unwrap(), ("dogs", "NNS"));

        let broken = CorpusLine::new(5, "dogs");
        match broken.word_and_tag() {
            Err(TaggerError::Format { line, .. }) => assert_eq!(line, 5),
            other => panic!("esperado erro de formato, obtido {other:?}"),
        }
    }
}
