//! Relatórios de saída: texto legível ou JSON.
//!
//! O relatório de texto mantém o layout histórico da ferramenta (rótulos em
//! inglês), para que saídas antigas continuem comparáveis linha a linha.

use std::fmt;
use std::io::Write;

use clap::ValueEnum;
use postag_core::{AnalysisSink, AnalyzedData, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Grava o relatório renderizado em qualquer [`Write`] (stdout, arquivo, ...).
pub struct ReportSink<W: Write> {
    writer: W,
    format: ReportFormat,
}

impl<W: Write> ReportSink<W> {
    pub fn new(writer: W, format: ReportFormat) -> Self {
        Self { writer, format }
    }
}

impl<W: Write> AnalysisSink for ReportSink<W> {
    fn consume(&mut self, data: &AnalyzedData) -> Result<()> {
        let rendered = render(data, self.format)?;
        self.writer.write_all(rendered.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn render(data: &AnalyzedData, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(TextReport(data).to_string()),
        ReportFormat::Json => {
            let mut json = data.to_json()?;
            json.push('\n');
            Ok(json)
        }
    }
}

struct TextReport<'a>(&'a AnalyzedData);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0;
        let stats = &data.statistics;
        let result = &data.result;

        writeln!(f)?;
        writeln!(f, "* POS tags:")?;
        writeln!(f, "- # of all POS tags (excluding STOP): {}", stats.tag_types)?;
        writeln!(f)?;
        writeln!(f, "* Training data:")?;
        writeln!(f, "- # of sentences: {}", stats.sentence_count)?;
        writeln!(f, "- # of unique words: {}", stats.unique_word_count)?;
        writeln!(f, "- # of word tokens: {}", stats.token_count)?;
        writeln!(f, "- # of POS tags: {}", stats.tag_count)?;
        writeln!(f, "- # of Bigrams: {}", stats.unique_bigram_count)?;
        writeln!(f)?;
        writeln!(f, "* Test data:")?;
        writeln!(
            f,
            "- # of word tokens (including </s>'s): {}",
            result.tagged_tokens.len() + result.test_sentence_count
        )?;
        writeln!(f, "- # of unknown words: {}", result.unknown_words.len())?;
        writeln!(f)?;

        if let Some(evaluation) = &data.evaluation {
            let rows = [
                ("Accuracy:", evaluation.overall),
                (" - Known:", evaluation.known),
                (" - UnKnown:", evaluation.unknown),
            ];
            for (label, accuracy) in rows {
                writeln!(
                    f,
                    "{label}\t{}/{} = {:.2}",
                    accuracy.correct,
                    accuracy.total,
                    accuracy.percent()
                )?;
            }
            writeln!(f)?;

            writeln!(f, "Tag\tPrecision\tRecall\tF1\t(correct/predicted/observed)")?;
            for (tag, measure) in &evaluation.tags {
                writeln!(
                    f,
                    "{tag}\t{:.4}\t{:.4}\t{:.4}\t({}/{}/{})",
                    measure.precision,
                    measure.recall,
                    measure.fmeasure,
                    measure.correct,
                    measure.predicted,
                    measure.observed
                )?;
            }
            writeln!(
                f,
                "Macro\t{:.4}\t{:.4}\t{:.4}",
                evaluation.macro_precision, evaluation.macro_recall, evaluation.macro_fmeasure
            )?;
            writeln!(
                f,
                "Sentences:\t{}/{} = {:.2}",
                evaluation.sentences.correct,
                evaluation.sentences.total,
                evaluation.sentences.percent()
            )?;
            writeln!(f)?;
        }

        let mut previous_sentence = None;
        for token in &result.tagged_tokens {
            if previous_sentence.is_some_and(|s| s != token.sentence) {
                writeln!(f)?;
            }
            previous_sentence = Some(token.sentence);

            match &token.gold_tag {
                Some(gold) => writeln!(f, "{} {} {}", token.word, gold, token.tag)?,
                None => writeln!(f, "{}  {}", token.word, token.tag)?,
            }
        }
        Ok(())
    }
}
