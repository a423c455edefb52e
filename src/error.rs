//! Error types for lexparse
//!
//! Every fallible operation in this crate returns one of the error enums
//! defined here as an explicit `Result` value. Errors are never used for
//! ordinary control flow: backtracking inside the general parser is part of
//! the algorithm, not error recovery.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in source text (byte offset plus 1-based line/column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Byte offset from the start of the input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
}

impl SourcePosition {
    /// Create a position
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}

/// A span of source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive)
    pub start: SourcePosition,
    /// End position (exclusive)
    pub end: SourcePosition,
}

impl Span {
    /// Create a span at a single position
    pub fn at(offset: usize, line: usize, column: usize) -> Self {
        let pos = SourcePosition::new(offset, line, column);
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Create a span covering a range
    pub fn range(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// Merge two spans into one covering both
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: if self.start.offset <= other.start.offset {
                self.start
            } else {
                other.start
            },
            end: if self.end.offset >= other.end.offset {
                self.end
            } else {
                other.end
            },
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.start.line, self.start.column)
    }
}

/// Errors produced while parsing regular-expression syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexError {
    /// The pattern was empty
    EmptyPattern,
    /// An operator (`*`, `+`, `|`) had no preceding operand
    DanglingOperator {
        /// The operator character
        operator: char,
    },
    /// A `(` group was never closed
    UnterminatedGroup,
    /// A `[` character class was never closed
    UnterminatedClass,
    /// A token the regex tokenizer could not classify
    UnexpectedToken {
        /// The offending text
        text: String,
    },
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPattern => write!(f, "empty regex pattern"),
            Self::DanglingOperator { operator } => {
                write!(f, "operator '{}' has no preceding operand", operator)
            }
            Self::UnterminatedGroup => write!(f, "unterminated '(' group"),
            Self::UnterminatedClass => write!(f, "unterminated '[' character class"),
            Self::UnexpectedToken { text } => write!(f, "unexpected token {:?} in regex", text),
        }
    }
}

impl std::error::Error for RegexError {}

/// Errors produced while tokenizing input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// No pattern matched at the given offset
    UnmatchedInput {
        /// Byte offset where tokenization got stuck
        offset: usize,
        /// Position with line/column information
        position: SourcePosition,
        /// A short excerpt of the input around the offset
        excerpt: String,
    },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedInput {
                position, excerpt, ..
            } => write!(
                f,
                "no pattern matches input at line {}, column {} (near {:?})",
                position.line, position.column, excerpt
            ),
        }
    }
}

impl std::error::Error for LexError {}

/// Errors produced by either parsing engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input ended while more symbols were expected
    UnexpectedEof {
        /// The symbol the parser was trying to match
        expected: String,
    },
    /// The next token did not match the expected terminal
    UnmatchedTerminal {
        /// The terminal the parser expected
        expected: String,
        /// The token kind actually found
        found: String,
        /// Where the mismatch occurred
        span: Span,
    },
    /// The LL(1) table has no entry for (non-terminal, lookahead)
    NoTableEntry {
        /// The non-terminal being expanded
        non_terminal: String,
        /// The lookahead token kind (or "<eof>")
        lookahead: String,
    },
    /// Every alternative of a non-terminal failed to match
    NoRulesMatched {
        /// The non-terminal whose alternatives were exhausted
        non_terminal: String,
        /// The token kind at the failure point (or "<eof>")
        lookahead: String,
    },
    /// The root symbol parsed but tokens remain before EOF
    TokensRemain {
        /// The first unconsumed token kind
        next: String,
        /// Where the leftover input begins
        span: Span,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input while matching {}", expected)
            }
            Self::UnmatchedTerminal {
                expected,
                found,
                span,
            } => write!(
                f,
                "expected {} but found {} at line {}, column {}",
                expected, found, span.start.line, span.start.column
            ),
            Self::NoTableEntry {
                non_terminal,
                lookahead,
            } => write!(
                f,
                "no table entry to expand {} on lookahead {}",
                non_terminal, lookahead
            ),
            Self::NoRulesMatched {
                non_terminal,
                lookahead,
            } => write!(
                f,
                "no rules of {} matched at lookahead {}",
                non_terminal, lookahead
            ),
            Self::TokensRemain { next, span } => write!(
                f,
                "tokens remain after parse, starting with {} at line {}, column {}",
                next, span.start.line, span.start.column
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors produced while analyzing or transforming grammars
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// Two productions claim the same LL(1) table cell
    Ll1Conflict {
        /// The non-terminal whose alternatives conflict
        non_terminal: String,
        /// The terminal (or "<eof>") both productions predict
        lookahead: String,
    },
    /// The requested start symbol has no productions
    UnknownStartSymbol {
        /// The symbol name
        name: String,
    },
    /// A production references the reserved EOF symbol in its body
    ReservedSymbol {
        /// The non-terminal owning the offending production
        non_terminal: String,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ll1Conflict {
                non_terminal,
                lookahead,
            } => write!(
                f,
                "LL(1) conflict: two productions of {} predict {}",
                non_terminal, lookahead
            ),
            Self::UnknownStartSymbol { name } => {
                write!(f, "start symbol {} has no productions", name)
            }
            Self::ReservedSymbol { non_terminal } => {
                write!(f, "production of {} uses a reserved symbol", non_terminal)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

/// Convert a byte offset in `source` to a [`SourcePosition`]
pub fn position_at(source: &str, offset: usize) -> SourcePosition {
    let clamped = offset.min(source.len());
    let before = &source.as_bytes()[..clamped];
    let line = memchr::memchr_iter(b'\n', before).count() + 1;
    let line_start = memchr::memrchr(b'\n', before).map(|n| n + 1).unwrap_or(0);
    SourcePosition::new(offset, line, clamped - line_start + 1)
}
