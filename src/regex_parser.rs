//! Regex syntax compiler
//!
//! Turns regex text into a [`RegexNode`] tree. Tokenization is self-hosted:
//! the source is lexed by a [`PatternLexer`] over a fixed internal pattern
//! table whose automata are built by hand (going through regex text here
//! would be circular).
//!
//! Parsing is a single left-to-right scan maintaining a "last built node"
//! cursor. Postfix operators rewrite only the most recently built atom, so
//! `ab*` is `a(b*)`; `|` recursively parses everything remaining as its
//! right operand, making it the lowest-precedence operator; `(` and `[`
//! recurse into their bracketed sub-sequences.

use crate::automaton::Automaton;
use crate::char_class::full_alphabet;
use crate::error::RegexError;
use crate::lexer::{PatternLexer, Token};
use crate::regex_ast::{CharClass, ClassItem, RegexNode};
use std::sync::OnceLock;

/// Characters with operator or bracket meaning at the top level of a regex
const METACHARACTERS: &[u8] = b"()[]*+|.\\";

static REGEX_LEXER: OnceLock<PatternLexer> = OnceLock::new();

/// The fixed internal pattern table for regex source
fn regex_lexer() -> &'static PatternLexer {
    REGEX_LEXER.get_or_init(|| {
        let literal_codes = full_alphabet()
            .filter(|b| !METACHARACTERS.contains(b))
            .map(u32::from);
        let escape = Automaton::single(u32::from(b'\\'))
            .concat(Automaton::from_codes(full_alphabet().map(u32::from)));

        PatternLexer::from_automata(vec![
            ("ESCAPE".to_string(), escape, false),
            ("ANY_CHAR".to_string(), Automaton::single(u32::from(b'.')), false),
            ("STAR".to_string(), Automaton::single(u32::from(b'*')), false),
            ("PLUS".to_string(), Automaton::single(u32::from(b'+')), false),
            ("OR".to_string(), Automaton::single(u32::from(b'|')), false),
            (
                "OPEN_PAREN".to_string(),
                Automaton::single(u32::from(b'(')),
                false,
            ),
            (
                "CLOSE_PAREN".to_string(),
                Automaton::single(u32::from(b')')),
                false,
            ),
            (
                "OPEN_BRACKET".to_string(),
                Automaton::single(u32::from(b'[')),
                false,
            ),
            (
                "CLOSE_BRACKET".to_string(),
                Automaton::single(u32::from(b']')),
                false,
            ),
            ("CHAR".to_string(), Automaton::from_codes(literal_codes), false),
        ])
    })
}

/// Parse regex text into a syntax tree
pub fn parse_regex(text: &str) -> Result<RegexNode, RegexError> {
    if text.is_empty() {
        return Err(RegexError::EmptyPattern);
    }

    let tokens: Vec<Token> = regex_lexer()
        .tokenize(text)
        .collect::<Result<_, _>>()
        .map_err(|err| match err {
            crate::error::LexError::UnmatchedInput { excerpt, .. } => {
                RegexError::UnexpectedToken { text: excerpt }
            }
        })?;

    parse_tokens(&tokens)
}

/// Parse a full token sequence into one node
fn parse_tokens(tokens: &[Token]) -> Result<RegexNode, RegexError> {
    let mut cursor: Option<RegexNode> = None;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind.as_str() {
            "CHAR" => {
                append(&mut cursor, RegexNode::Char(token.text.as_bytes()[0]));
            }
            "ESCAPE" => {
                append(&mut cursor, escape_node(token.text.as_bytes()[1]));
            }
            "ANY_CHAR" => {
                append(&mut cursor, RegexNode::AnyChar);
            }
            "STAR" => {
                wrap_last(&mut cursor, '*', |atom| RegexNode::Star(Box::new(atom)))?;
            }
            "PLUS" => {
                wrap_last(&mut cursor, '+', |atom| RegexNode::OneOrMore(Box::new(atom)))?;
            }
            "OR" => {
                let left = cursor.take().ok_or(RegexError::DanglingOperator {
                    operator: '|',
                })?;
                let rest = &tokens[i + 1..];
                if rest.is_empty() {
                    return Err(RegexError::DanglingOperator { operator: '|' });
                }
                let right = parse_tokens(rest)?;
                return Ok(RegexNode::Or(Box::new(left), Box::new(right)));
            }
            "OPEN_PAREN" => {
                let close = matching_paren(tokens, i)?;
                let inner = parse_tokens(&tokens[i + 1..close])?;
                append(&mut cursor, RegexNode::Group(Box::new(inner)));
                i = close;
            }
            "OPEN_BRACKET" => {
                let close = closing_bracket(tokens, i)?;
                let class = parse_class(&tokens[i + 1..close]);
                append(&mut cursor, RegexNode::Class(class));
                i = close;
            }
            // A close bracket outside its opening context
            _ => {
                return Err(RegexError::UnexpectedToken {
                    text: token.text.clone(),
                })
            }
        }
        i += 1;
    }

    cursor.ok_or(RegexError::EmptyPattern)
}

/// Concatenate `node` onto the cursor
fn append(cursor: &mut Option<RegexNode>, node: RegexNode) {
    *cursor = Some(match cursor.take() {
        None => node,
        Some(prev) => RegexNode::Concat(Box::new(prev), Box::new(node)),
    });
}

/// Rewrite the most recently built atom with a postfix operator
///
/// When the cursor is a concatenation, only its right operand (the last
/// atom) is wrapped: the operator binds to the immediately preceding atom,
/// not the whole expression.
fn wrap_last(
    cursor: &mut Option<RegexNode>,
    operator: char,
    wrap: impl FnOnce(RegexNode) -> RegexNode,
) -> Result<(), RegexError> {
    match cursor.take() {
        None => Err(RegexError::DanglingOperator { operator }),
        Some(RegexNode::Concat(left, right)) => {
            *cursor = Some(RegexNode::Concat(left, Box::new(wrap(*right))));
            Ok(())
        }
        Some(atom) => {
            *cursor = Some(wrap(atom));
            Ok(())
        }
    }
}

/// Map an escaped character to its node
fn escape_node(escaped: u8) -> RegexNode {
    match escaped {
        b'd' => RegexNode::Class(CharClass::digit()),
        b'w' => RegexNode::Class(CharClass::word()),
        b'n' => RegexNode::Char(b'\n'),
        b'r' => RegexNode::Char(b'\r'),
        b't' => RegexNode::Char(b'\t'),
        other => RegexNode::Char(other),
    }
}

/// Find the `)` matching the `(` at `open`, counting nesting depth
///
/// Bracketed classes are skipped wholesale so that parens listed inside a
/// class do not disturb the depth count.
fn matching_paren(tokens: &[Token], open: usize) -> Result<usize, RegexError> {
    let mut depth = 0;
    let mut i = open;
    while i < tokens.len() {
        match tokens[i].kind.as_str() {
            "OPEN_PAREN" => depth += 1,
            "CLOSE_PAREN" => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            "OPEN_BRACKET" => {
                i = closing_bracket(tokens, i)?;
            }
            _ => {}
        }
        i += 1;
    }
    Err(RegexError::UnterminatedGroup)
}

/// Find the `]` closing the `[` at `open` (classes do not nest)
fn closing_bracket(tokens: &[Token], open: usize) -> Result<usize, RegexError> {
    tokens
        .iter()
        .enumerate()
        .skip(open + 1)
        .find(|(_, token)| token.kind == "CLOSE_BRACKET")
        .map(|(i, _)| i)
        .ok_or(RegexError::UnterminatedClass)
}

/// Interpret the tokens between `[` and `]` as a class description
///
/// A leading `^` negates; `start-end` is a range when `-` sits between two
/// class characters with `start <= end`, otherwise the characters are taken
/// literally. Inside a class every token contributes its literal character;
/// escapes map the usual control-character names.
fn parse_class(tokens: &[Token]) -> CharClass {
    let mut chars: Vec<(u8, bool)> = Vec::new();
    let mut negated = false;

    for (i, token) in tokens.iter().enumerate() {
        let bytes = token.text.as_bytes();
        if token.kind == "ESCAPE" {
            let c = match bytes[1] {
                b'n' => b'\n',
                b'r' => b'\r',
                b't' => b'\t',
                other => other,
            };
            chars.push((c, true));
        } else if i == 0 && bytes[0] == b'^' {
            negated = true;
        } else {
            chars.push((bytes[0], false));
        }
    }

    let mut items = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let is_range = i + 2 < chars.len() && chars[i + 1] == (b'-', false);
        if is_range {
            let (start, _) = chars[i];
            let (end, _) = chars[i + 2];
            if start <= end {
                items.push(ClassItem::Range(start, end));
            } else {
                items.push(ClassItem::Char(start));
                items.push(ClassItem::Char(b'-'));
                items.push(ClassItem::Char(end));
            }
            i += 3;
        } else {
            items.push(ClassItem::Char(chars[i].0));
            i += 1;
        }
    }

    if negated {
        CharClass::negated(items)
    } else {
        CharClass::new(items)
    }
}
