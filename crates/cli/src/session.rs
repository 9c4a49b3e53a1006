//! Interactive query loop.

use crate::corpus::Corpus;
use crate::render::{write_hits, Renderer};
use crate::search::Searcher;
use aerosearch_core::config;
use std::io::{self, BufRead, Write};

pub const HELP: &str = "\
Type queries and press Enter.

- BM25 ranked search: just type your query text.
- Boolean/proximity search: prefix with 'bool:' then use operators.
  Examples:
    bool: (\"runway excursion\" OR overrun) AND landing
    bool: (icing /5 pitot) AND (airspeed OR indications)
    bool: (approach AND mountainous) /s (cfit OR terrain)

Commands:
  :help             show this help
  :quit             exit
  :topk 20          set display cutoff
";

const PROMPT: &str = "query> ";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'l> {
    Blank,
    Help,
    Quit,
    TopK(usize),
    /// `:topk` with a missing or invalid count.
    BadTopK,
    Boolean(&'l str),
    Ranked(&'l str),
}

impl<'l> Command<'l> {
    pub fn parse(line: &'l str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Blank;
        }
        match line {
            ":quit" | ":q" => return Command::Quit,
            ":help" => return Command::Help,
            _ => {}
        }
        if let Some(arg) = line.strip_prefix(":topk") {
            return match arg.trim().parse() {
                Ok(n) => Command::TopK(n),
                Err(_) => Command::BadTopK,
            };
        }
        match line.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("bool:") => Command::Boolean(line[5..].trim()),
            _ => Command::Ranked(line),
        }
    }
}

/// Whether the loop keeps reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// REPL state over one loaded corpus.
pub struct Session<'a> {
    corpus: &'a Corpus,
    searcher: Searcher<'a>,
    top_k: usize,
}

impl<'a> Session<'a> {
    pub fn new(corpus: &'a Corpus, searcher: Searcher<'a>, top_k: usize) -> Self {
        Self {
            corpus,
            searcher,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Read lines from `input` until `:quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{HELP}")?;
        write!(out, "{PROMPT}")?;
        out.flush()?;
        for line in input.lines() {
            if self.handle_line(&line?, out)? == Flow::Quit {
                return Ok(());
            }
            write!(out, "{PROMPT}")?;
            out.flush()?;
        }
        writeln!(out, "\n[bye]")
    }

    /// Execute one input line.
    pub fn handle_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<Flow> {
        match Command::parse(line) {
            Command::Blank => {}
            Command::Quit => {
                writeln!(out, "[bye]")?;
                return Ok(Flow::Quit);
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::TopK(n) => {
                self.top_k = n;
                writeln!(out, "topk={n}")?;
            }
            Command::BadTopK => writeln!(out, "usage: :topk <int>")?,
            Command::Boolean(query) => self.boolean(query, out)?,
            Command::Ranked(query) => self.ranked(query, out)?,
        }
        Ok(Flow::Continue)
    }

    fn renderer(&self, query: &str) -> Renderer<'a> {
        Renderer::new(
            self.corpus,
            self.searcher.index(),
            query,
            config::SNIPPET_MAX_CHARS,
        )
    }

    fn ranked(&self, query: &str, out: &mut impl Write) -> io::Result<()> {
        let ranked = self.searcher.ranked(query);
        writeln!(
            out,
            "BM25 returned {} candidates. Showing top {}.\n",
            ranked.len(),
            self.top_k
        )?;
        let hits = self
            .renderer(query)
            .hits(ranked.into_iter().map(|(d, s)| (d, Some(s))), self.top_k);
        write_hits(out, &hits)
    }

    fn boolean(&self, query: &str, out: &mut impl Write) -> io::Result<()> {
        let results = match self.searcher.boolean(query) {
            Ok(results) => results,
            Err(e) => return writeln!(out, "error: {e}"),
        };
        for warning in &results.warnings {
            writeln!(out, "warning: {warning}")?;
        }
        writeln!(
            out,
            "Boolean matched {} docs. Showing first {}.\n",
            results.matched.len(),
            self.top_k
        )?;
        let renderer = self.renderer(query);
        let hits = renderer.hits(results.matched.iter().map(|&d| (d, None)), self.top_k);
        write_hits(out, &hits)?;
        if !results.ranked.is_empty() {
            writeln!(out, "BM25 re-rank of Boolean candidates:\n")?;
            let hits = renderer.hits(
                results.ranked.into_iter().map(|(d, s)| (d, Some(s))),
                self.top_k,
            );
            write_hits(out, &hits)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerosearch_core::{Bm25Params, InvertedIndex, QueryOptions};

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   "), Command::Blank);
        assert_eq!(Command::parse(":quit"), Command::Quit);
        assert_eq!(Command::parse(":help"), Command::Help);
        assert_eq!(Command::parse(":topk 20"), Command::TopK(20));
        assert_eq!(Command::parse(":topk x"), Command::BadTopK);
        assert_eq!(Command::parse(":topk"), Command::BadTopK);
        assert_eq!(Command::parse("BOOL: icing /5 pitot"), Command::Boolean("icing /5 pitot"));
        assert_eq!(Command::parse("icing pitot"), Command::Ranked("icing pitot"));
        assert_eq!(Command::parse("boo"), Command::Ranked("boo"));
    }

    fn with_session(f: impl FnOnce(&mut Session<'_>)) {
        let corpus = Corpus::demo();
        let index: InvertedIndex = corpus.build_index(Default::default());
        let searcher = Searcher::new(&index, Bm25Params::default(), QueryOptions::default());
        let mut session = Session::new(&corpus, searcher, 10);
        f(&mut session);
    }

    #[test]
    fn test_boolean_line() {
        with_session(|session| {
            let mut out = Vec::new();
            let flow = session
                .handle_line("bool: (icing /5 pitot) AND (airspeed OR indications)", &mut out)
                .unwrap();
            assert_eq!(flow, Flow::Continue);
            let text = String::from_utf8(out).unwrap();
            assert!(text.contains("Boolean matched 1 docs"));
            assert!(text.contains(" 1. doc 2\n"));
            assert!(text.contains("BM25 re-rank"));
        });
    }

    #[test]
    fn test_topk_then_ranked() {
        with_session(|session| {
            let mut out = Vec::new();
            session.handle_line(":topk 1", &mut out).unwrap();
            assert_eq!(session.top_k(), 1);
            session.handle_line("go-around", &mut out).unwrap();
            let text = String::from_utf8(out).unwrap();
            assert!(text.contains("BM25 returned 2 candidates. Showing top 1."));
            assert!(!text.contains(" 2. doc"));
        });
    }

    #[test]
    fn test_run_until_quit() {
        with_session(|session| {
            let input = b"landing\n:quit\nnever reached\n";
            let mut out = Vec::new();
            session.run(&input[..], &mut out).unwrap();
            let text = String::from_utf8(out).unwrap();
            assert!(text.ends_with("[bye]\n"));
            assert!(!text.contains("never reached"));
        });
    }
}
