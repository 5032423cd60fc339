//! Linha de comando do etiquetador POS: treina com um corpus anotado, etiqueta
//! o corpus de teste e imprime o relatório (opcionalmente também em arquivo).

use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use clap::{CommandFactory, Parser};
use postag_core::{
    AnalysisSink, AnalyzedData, DecodeStrategy, PipelineEvent, TaggerConfig, TaggingPipeline,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod report;

use report::{ReportFormat, ReportSink};

/// Etiquetador morfossintático com HMM de bigramas e decodificação Viterbi.
#[derive(Debug, Parser)]
#[command(name = "postag", version)]
struct Args {
    /// Corpus de treino, uma linha `palavra tag` por token
    #[arg(value_name = "TRAINING")]
    training: Option<PathBuf>,

    /// Corpus de teste, `palavra tag` ou apenas `palavra` por linha
    #[arg(value_name = "TEST")]
    test: Option<PathBuf>,

    /// Arquivo que recebe uma cópia do relatório
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Ativa a suavização de Laplace
    #[arg(short = 'S', long)]
    smoothing: bool,

    /// Reconstrói o caminho pelos backpointers em vez de decidir coluna a coluna
    #[arg(long)]
    backtrace: bool,

    /// Formato do relatório
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

impl Args {
    fn config(&self) -> TaggerConfig {
        TaggerConfig {
            smoothing: self.smoothing,
            strategy: if self.backtrace {
                DecodeStrategy::Backtrace
            } else {
                DecodeStrategy::Greedy
            },
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let (Some(training), Some(test)) = (args.training.as_deref(), args.test.as_deref()) else {
        // Sem os dois corpora não há o que fazer: mostra o uso e sai normalmente
        let _ = Args::command().print_help();
        println!();
        return ExitCode::SUCCESS;
    };

    match run(&args, training, test) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("execução abortada: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, training: &Path, test: &Path) -> Result<(), Box<dyn Error>> {
    let config = args.config();
    info!(?config, training = %training.display(), test = %test.display(), "iniciando");

    let training = BufReader::new(File::open(training)?);
    let test = BufReader::new(File::open(test)?);
    let pipeline = TaggingPipeline::new(config);

    // O pipeline roda numa thread; esta acompanha os eventos até o canal fechar
    let (tx, rx) = mpsc::channel();
    let outcome = thread::scope(|scope| {
        let worker = scope.spawn(move || pipeline.run_streaming(training, test, tx));
        for event in rx {
            log_event(&event);
        }
        worker.join()
    });
    let data = outcome.map_err(|_| "a thread do pipeline terminou em pânico")??;

    publish(&data, args)
}

fn log_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::ModelEstimated { statistics } => info!(
            sentences = statistics.sentence_count,
            tags = statistics.tag_types,
            "treino concluído"
        ),
        PipelineEvent::SentenceTagged { sentence, tokens, tags } => {
            debug!(sentence, tokens, tags = ?tags, "sentença de teste")
        }
        PipelineEvent::Done {
            total_tokens,
            unknown_words,
            processing_ms,
        } => info!(total_tokens, unknown_words, processing_ms, "etiquetagem concluída"),
        // O erro em si volta pelo resultado da thread
        PipelineEvent::Error { message } => debug!(reason = %message, "pipeline interrompido"),
    }
}

fn publish(data: &AnalyzedData, args: &Args) -> Result<(), Box<dyn Error>> {
    let mut sinks: Vec<Box<dyn AnalysisSink>> =
        vec![Box::new(ReportSink::new(io::stdout().lock(), args.format))];
    if let Some(path) = &args.output {
        sinks.push(Box::new(ReportSink::new(File::create(path)?, args.format)));
        info!(output = %path.display(), "relatório também gravado em arquivo");
    }
    for sink in &mut sinks {
        sink.consume(data)?;
    }
    Ok(())
}
