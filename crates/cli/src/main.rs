use aerosearch::corpus::{load_stop_words, Corpus, DEFAULT_CSV_TEXT_COLUMN};
use aerosearch::evaluate::{evaluate, load_judgments};
use aerosearch::expansion::{Expansion, Feedback};
use aerosearch::filter::MetaFilter;
use aerosearch::render::{write_hits, Renderer};
use aerosearch::search::{Mode, Searcher};
use aerosearch::session::Session;
use aerosearch_core::{
    config, demo, Bm25Params, DocId, InvertedIndex, QueryOptions, StopWords, Tokenizer,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "aerosearch=info,aerosearch_core=info";

#[derive(Parser)]
#[command(
    name = "aerosearch",
    version,
    about = "Boolean, proximity and BM25 search over aviation incident narratives"
)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the canonical demo queries over the built-in corpus
    Demo,
    /// Run one query and print the results
    Search {
        #[command(flatten)]
        index: IndexArgs,
        /// Query text (boolean syntax with --mode bool)
        query: String,
        #[arg(short, long, value_enum, default_value_t = Mode::Bm25)]
        mode: Mode,
        /// Number of results to show
        #[arg(short = 'k', long, default_value_t = config::DEFAULT_TOP_K)]
        top_k: usize,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Interactive query loop (the default command)
    Repl {
        #[command(flatten)]
        index: IndexArgs,
        /// Number of results to show
        #[arg(short = 'k', long, default_value_t = config::DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Convert a corpus file (.json dump, .csv export or .jsonl) to JSONL with integer ids
    ToJsonl {
        input: PathBuf,
        output: PathBuf,
        /// Stop after this many documents
        #[arg(long)]
        limit: Option<usize>,
        /// CSV column holding the document text
        #[arg(long, default_value = DEFAULT_CSV_TEXT_COLUMN)]
        text_column: String,
    },
    /// Evaluate queries against a JSONL relevance labels file
    Eval {
        #[command(flatten)]
        index: IndexArgs,
        /// Labels file: {"query", "mode", "relevance": {doc_id: grade}} per line
        labels: PathBuf,
        /// Print the full report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
struct IndexArgs {
    /// Corpus file (.jsonl, .json or .csv); the demo corpus when omitted
    #[arg(short, long)]
    corpus: Option<PathBuf>,

    /// Stop loading after this many documents
    #[arg(long)]
    limit: Option<usize>,

    /// CSV column holding the document text
    #[arg(long, default_value = DEFAULT_CSV_TEXT_COLUMN)]
    text_column: String,

    /// Stop word list replacing the default one
    #[arg(long)]
    stopwords: Option<PathBuf>,

    /// BM25 term frequency saturation
    #[arg(long, default_value_t = config::BM25_K1)]
    k1: f32,

    /// BM25 length normalization, 0.0 to 1.0
    #[arg(long, default_value_t = config::BM25_B)]
    b: f32,

    /// Token window used by the /p operator
    #[arg(long, default_value_t = config::PARAGRAPH_WINDOW)]
    paragraph_window: u32,

    /// Reject malformed boolean queries instead of evaluating them best-effort
    #[arg(long, default_value_t = false)]
    strict: bool,

    #[command(flatten)]
    expansion: ExpansionArgs,

    #[command(flatten)]
    filter: FilterArgs,
}

impl Default for IndexArgs {
    fn default() -> Self {
        Self {
            corpus: None,
            limit: None,
            text_column: DEFAULT_CSV_TEXT_COLUMN.to_string(),
            stopwords: None,
            k1: config::BM25_K1,
            b: config::BM25_B,
            paragraph_window: config::PARAGRAPH_WINDOW,
            strict: false,
            expansion: ExpansionArgs::default(),
            filter: FilterArgs::default(),
        }
    }
}

#[derive(Args)]
#[command(next_help_heading = "Query expansion")]
struct ExpansionArgs {
    /// OR aviation synonyms into queries that mention a known term
    #[arg(long, default_value_t = false)]
    synonyms: bool,

    /// Re-score with terms mined from the top results
    #[arg(long, default_value_t = false)]
    prf: bool,

    /// Top results mined by --prf
    #[arg(long, default_value_t = config::FEEDBACK_DOCS)]
    prf_docs: usize,

    /// Terms added by --prf
    #[arg(long, default_value_t = config::FEEDBACK_TERMS)]
    prf_terms: usize,
}

impl Default for ExpansionArgs {
    fn default() -> Self {
        Self {
            synonyms: false,
            prf: false,
            prf_docs: config::FEEDBACK_DOCS,
            prf_terms: config::FEEDBACK_TERMS,
        }
    }
}

impl ExpansionArgs {
    fn expansion(&self) -> Expansion {
        Expansion {
            synonyms: self.synonyms,
            feedback: self.prf.then_some(Feedback {
                docs: self.prf_docs,
                terms: self.prf_terms,
            }),
        }
    }
}

#[derive(Args, Default)]
#[command(next_help_heading = "Metadata filters")]
struct FilterArgs {
    /// Keep documents with this event type (repeatable)
    #[arg(long = "event-type")]
    event_types: Vec<String>,

    /// Keep documents with this highest injury level (repeatable)
    #[arg(long = "injury")]
    injuries: Vec<String>,

    /// Keep documents for this aircraft make (repeatable)
    #[arg(long = "make")]
    makes: Vec<String>,

    /// Keep documents for this aircraft model (repeatable)
    #[arg(long = "model")]
    models: Vec<String>,

    /// Earliest event date, YYYY-MM-DD
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest event date, YYYY-MM-DD
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn filter(&self) -> MetaFilter {
        MetaFilter {
            event_types: self.event_types.clone(),
            injuries: self.injuries.clone(),
            makes: self.makes.clone(),
            models: self.models.clone(),
            from: self.from,
            to: self.to,
        }
    }
}

/// Everything a search command needs, built once from [`IndexArgs`].
struct Loaded {
    corpus: Corpus,
    index: InvertedIndex,
    params: Bm25Params,
    options: QueryOptions,
    expansion: Expansion,
    allowed: Option<HashSet<DocId>>,
}

impl Loaded {
    fn searcher(&self) -> Searcher<'_> {
        let searcher =
            Searcher::new(&self.index, self.params, self.options).with_expansion(self.expansion);
        match &self.allowed {
            Some(allowed) => searcher.restricted_to(allowed),
            None => searcher,
        }
    }
}

impl IndexArgs {
    fn load(&self) -> Result<Loaded, Box<dyn std::error::Error>> {
        let params = Bm25Params::new(self.k1, self.b)?;
        let options = QueryOptions {
            paragraph_window: self.paragraph_window,
            strict: self.strict,
        };
        let stop_words = match &self.stopwords {
            Some(path) => load_stop_words(path)?,
            None => StopWords::default(),
        };
        let corpus = match &self.corpus {
            Some(path) => Corpus::load_with(path, &self.text_column, self.limit)?,
            None => {
                tracing::info!("no corpus given, using the built-in demo documents");
                Corpus::demo()
            }
        };

        let t0 = Instant::now();
        let index = corpus.build_index(Tokenizer::new(stop_words));
        tracing::info!(
            documents = index.document_count(),
            vocabulary = index.vocabulary_size(),
            avg_len = index.average_document_length(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "index built"
        );
        let allowed = self.filter.filter().allowed(&corpus);
        Ok(Loaded {
            corpus,
            index,
            params,
            options,
            expansion: self.expansion.expansion(),
            allowed,
        })
    }
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    mode: Mode,
    matched: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    hits: Vec<aerosearch::render::SearchHit>,
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command.unwrap_or(Command::Repl {
        index: IndexArgs::default(),
        top_k: config::DEFAULT_TOP_K,
    }) {
        Command::Demo => run_demo(&mut out)?,
        Command::Search {
            index,
            query,
            mode,
            top_k,
            json,
        } => {
            let loaded = index.load()?;
            run_search(&loaded, &query, mode, top_k, json, &mut out)?;
        }
        Command::Repl { index, top_k } => {
            let loaded = index.load()?;
            writeln!(out, "Built index over {} documents.", loaded.index.document_count())?;
            let mut session = Session::new(&loaded.corpus, loaded.searcher(), top_k);
            session.run(io::stdin().lock(), &mut out)?;
        }
        Command::ToJsonl {
            input,
            output,
            limit,
            text_column,
        } => {
            let corpus = Corpus::load_with(&input, &text_column, limit)?;
            corpus.write_jsonl(&output)?;
            writeln!(out, "Wrote {} lines to {}", corpus.len(), output.display())?;
        }
        Command::Eval {
            index,
            labels,
            json,
        } => {
            let loaded = index.load()?;
            let judgments = load_judgments(&labels)?;
            let report = evaluate(&loaded.searcher(), &judgments)?;
            if json {
                serde_json::to_writer_pretty(&mut out, &report)?;
                writeln!(out)?;
            } else {
                for q in &report.queries {
                    writeln!(
                        out,
                        "{:<48} nDCG@10={:.4} MAP={:.4} R@10={:.4} TotalRel={}",
                        q.query,
                        q.metrics.ndcg_at_10,
                        q.metrics.map,
                        q.metrics.recall_at_10,
                        q.metrics.total_relevant
                    )?;
                }
                writeln!(
                    out,
                    "mean over {} queries: nDCG@10={:.4} MAP={:.4} R@10={:.4}",
                    report.queries.len(),
                    report.mean_ndcg_at_10,
                    report.mean_map,
                    report.mean_recall_at_10
                )?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn run_search(
    loaded: &Loaded,
    query: &str,
    mode: Mode,
    top_k: usize,
    json: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let searcher = loaded.searcher();
    let (matched, ranked, warnings) = match mode {
        Mode::Bm25 => {
            let ranked = searcher.ranked(query);
            (ranked.len(), ranked, Vec::new())
        }
        Mode::Bool => {
            let results = searcher.boolean(query)?;
            (results.matched.len(), results.ranked, results.warnings)
        }
    };
    let renderer = Renderer::new(
        &loaded.corpus,
        &loaded.index,
        query,
        config::SNIPPET_MAX_CHARS,
    );
    let hits = renderer.hits(ranked.into_iter().map(|(d, s)| (d, Some(s))), top_k);

    if json {
        let output = SearchOutput {
            query,
            mode,
            matched,
            warnings: warnings.iter().map(ToString::to_string).collect(),
            hits,
        };
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)?;
    } else {
        for warning in &warnings {
            writeln!(out, "warning: {warning}")?;
        }
        writeln!(out, "{matched} documents matched, showing {}.\n", hits.len())?;
        write_hits(out, &hits)?;
    }
    Ok(())
}

fn run_demo(out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>> {
    let corpus = Corpus::demo();
    let index = corpus.build_index(Tokenizer::default());
    let searcher = Searcher::new(&index, Bm25Params::default(), QueryOptions::default());

    writeln!(out, "--- Boolean / proximity ---")?;
    for (query, expected) in demo::BOOLEAN_QUERIES {
        let results = searcher.boolean(query)?;
        writeln!(
            out,
            "  {query:<64} -> {:?} (expected [{expected}])",
            results.matched
        )?;
    }

    writeln!(out)?;
    writeln!(out, "--- BM25 (k1={}, b={}) ---", config::BM25_K1, config::BM25_B)?;
    writeln!(out, "  {}", demo::RANKED_QUERY)?;
    writeln!(out)?;
    let renderer = Renderer::new(&corpus, &index, demo::RANKED_QUERY, config::SNIPPET_MAX_CHARS);
    let ranked = searcher.bm25().top_k(demo::RANKED_QUERY, None, config::DEFAULT_TOP_K);
    let hits = renderer.hits(ranked.into_iter().map(|(d, s)| (d, Some(s))), config::DEFAULT_TOP_K);
    write_hits(out, &hits)?;
    Ok(())
}
