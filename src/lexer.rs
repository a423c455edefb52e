//! Priority-ordered, longest-match tokenization
//!
//! A [`PatternLexer`] is built once from an ordered list of named patterns
//! (regex text, or pre-built automata for bootstrap tables) and then
//! tokenizes inputs lazily. At each position every pattern's DFA runs and the
//! longest match wins; on a length tie the pattern declared earlier wins,
//! which is the usual lexer-generator rule that lets keyword patterns shadow
//! identifier patterns. Patterns flagged `ignore` advance the position but
//! are omitted from the output.
//!
//! The token sequence is a lazy, finite, single-pass iterator. Consumers
//! that need lookahead or backtracking wrap it in a [`TokenStream`], which
//! adds `peek` and `push_back`.

use crate::automaton::Automaton;
use crate::dfa::Dfa;
use crate::error::{LexError, RegexError, SourcePosition, Span};
use crate::regex_parser::parse_regex;
use serde::{Deserialize, Serialize};

/// Declarative description of one token pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Token kind name (e.g. "identifier", "number")
    pub name: String,
    /// Regex pattern text
    pub pattern: String,
    /// Whether matches should be dropped from the output (e.g. whitespace)
    #[serde(default)]
    pub ignore: bool,
}

impl PatternSpec {
    /// Create a non-ignored pattern
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            ignore: false,
        }
    }

    /// Create an ignored pattern
    pub fn ignored(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            ignore: true,
        }
    }
}

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token kind (the matching pattern's name)
    pub kind: String,
    /// The matched text
    pub text: String,
    /// Where in the input the match occurred
    pub span: Span,
}

impl Token {
    /// Create a token
    pub fn new(kind: impl Into<String>, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            span,
        }
    }
}

/// One compiled pattern: name, determinized matcher, ignore flag
#[derive(Debug, Clone)]
struct CompiledPattern {
    name: String,
    dfa: Dfa,
    ignore: bool,
}

/// A lexer over an ordered set of named patterns
#[derive(Debug, Clone)]
pub struct PatternLexer {
    patterns: Vec<CompiledPattern>,
}

impl PatternLexer {
    /// Compile an ordered list of pattern specs
    ///
    /// Declaration order is the priority order used to break length ties.
    pub fn new(specs: Vec<PatternSpec>) -> Result<Self, RegexError> {
        let mut patterns = Vec::with_capacity(specs.len());
        for spec in specs {
            let nfa = parse_regex(&spec.pattern)?
                .compile()
                .with_description(spec.name.clone());
            patterns.push(CompiledPattern {
                name: spec.name,
                dfa: Dfa::from_nfa(&nfa),
                ignore: spec.ignore,
            });
        }
        Ok(Self { patterns })
    }

    /// Build a lexer from pre-built automata
    ///
    /// Used for fixed internal tables (the regex tokenizer bootstraps itself
    /// this way) where going through regex text would be circular.
    pub fn from_automata(entries: Vec<(String, Automaton, bool)>) -> Self {
        let patterns = entries
            .into_iter()
            .map(|(name, nfa, ignore)| CompiledPattern {
                name,
                dfa: Dfa::from_nfa(&nfa),
                ignore,
            })
            .collect();
        Self { patterns }
    }

    /// Number of patterns
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Tokenize `input` lazily
    ///
    /// The returned iterator yields `Ok(Token)` for each non-ignored match
    /// and a single `Err(LexError)` if some position matches no pattern,
    /// after which it is exhausted.
    pub fn tokenize<'a>(&'a self, input: &'a str) -> Tokens<'a> {
        Tokens {
            lexer: self,
            input,
            pos: 0,
            line: 1,
            column: 1,
            failed: false,
        }
    }

    /// Find the best match at the start of `rest`
    ///
    /// Longest wins; first-declared wins ties. Zero-length matches cannot
    /// advance the input and are skipped.
    fn best_match(&self, rest: &str) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, pattern) in self.patterns.iter().enumerate() {
            if let Some(m) = pattern.dfa.longest_match(rest) {
                if m.len == 0 {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((_, best_len)) => m.len > best_len,
                };
                if better {
                    best = Some((idx, m.len));
                }
            }
        }
        best
    }
}

/// Lazy token iterator (see [`PatternLexer::tokenize`])
pub struct Tokens<'a> {
    lexer: &'a PatternLexer,
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    failed: bool,
}

impl<'a> Tokens<'a> {
    /// Advance line/column accounting over `text`
    fn advance_position(&mut self, text: &str) {
        let newlines = memchr::memchr_iter(b'\n', text.as_bytes()).count();
        if newlines > 0 {
            self.line += newlines;
            let last = memchr::memrchr(b'\n', text.as_bytes()).unwrap_or(0);
            self.column = text.len() - last;
        } else {
            self.column += text.len();
        }
        self.pos += text.len();
    }

    fn excerpt(&self) -> String {
        let mut end = (self.pos + 16).min(self.input.len());
        // Unmatched input may be non-ASCII; keep the slice on a boundary.
        while !self.input.is_char_boundary(end) {
            end -= 1;
        }
        self.input[self.pos..end].to_string()
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            let Some((idx, len)) = self.lexer.best_match(rest) else {
                self.failed = true;
                let position = SourcePosition::new(self.pos, self.line, self.column);
                return Some(Err(LexError::UnmatchedInput {
                    offset: self.pos,
                    position,
                    excerpt: self.excerpt(),
                }));
            };

            let pattern = &self.lexer.patterns[idx];
            let text = &rest[..len];
            let start = SourcePosition::new(self.pos, self.line, self.column);
            self.advance_position(text);
            let end = SourcePosition::new(self.pos, self.line, self.column);

            if pattern.ignore {
                continue;
            }
            return Some(Ok(Token::new(
                pattern.name.clone(),
                text,
                Span::range(start, end),
            )));
        }
        None
    }
}

/// Pushback/peek adapter over a token iterator
///
/// The backtracking parser's correctness depends on the pushback contract:
/// any failed parse attempt must return every token it consumed, in reverse
/// order, leaving the stream exactly as it found it.
#[derive(Debug)]
pub struct TokenStream<I> {
    iter: I,
    pushback: Vec<Token>,
}

impl<I: Iterator<Item = Token>> TokenStream<I> {
    /// Wrap a token iterator
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            pushback: Vec::new(),
        }
    }

    /// Take the next token
    pub fn next(&mut self) -> Option<Token> {
        self.pushback.pop().or_else(|| self.iter.next())
    }

    /// Look at the next token without consuming it
    pub fn peek(&mut self) -> Option<&Token> {
        if self.pushback.is_empty() {
            let next = self.iter.next()?;
            self.pushback.push(next);
        }
        self.pushback.last()
    }

    /// Return a token to the front of the stream
    pub fn push_back(&mut self, token: Token) {
        self.pushback.push(token);
    }
}

impl TokenStream<std::vec::IntoIter<Token>> {
    /// Build a stream over an already-collected token vector
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self::new(tokens.into_iter())
    }
}
