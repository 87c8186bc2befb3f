//! Naming Pattern Grammar
//!
//! Compiles pattern source text into a token sequence and evaluates names
//! against it in a single left-to-right pass without backtracking.
//!
//! | Syntax | Token |
//! |--------|-------|
//! | plain text | literal |
//! | `_`, `{SEP}`, `{SEP:-}` | separator |
//! | `{PREFIX:T_}` | prefix tag (first token only) |
//! | `{SUFFIX:_D}` | suffix tag (last token only) |
//! | `{ENUM:2D,3D}` | one of an ordered set |
//! | `{ALPHA}` `{ALPHANUM}` `{WORD}` `{DIGITS}` | free run of a character class |
//! | `{NUM:2}` | exactly `n` digits |
//!
//! A backslash escapes the next character (`\{`, `\}`, `\_`, `\\`, `\,`).
//! A free placeholder must be followed by a literal, a separator, a suffix
//! or the end of the pattern; anything else is rejected as ambiguous.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Largest width accepted by `{NUM:n}`
pub const MAX_NUMERIC_WIDTH: usize = 9;

const DEFAULT_SEPARATOR: &str = "_";

/// Compile-time options of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternOptions {
    pub case_sensitive: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

impl PatternOptions {
    pub fn case_insensitive() -> Self {
        Self {
            case_sensitive: false,
        }
    }
}

/// Character class of a free placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharClass {
    /// Letters
    Alpha,
    /// Letters and digits
    AlphaNumeric,
    /// Letters, digits and underscore
    Word,
    /// ASCII digits
    Digits,
}

impl CharClass {
    pub fn accepts(self, c: char) -> bool {
        match self {
            Self::Alpha => c.is_alphabetic(),
            Self::AlphaNumeric => c.is_alphanumeric(),
            Self::Word => c.is_alphanumeric() || c == '_',
            Self::Digits => c.is_ascii_digit(),
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Alpha => "letters",
            Self::AlphaNumeric => "letters or digits",
            Self::Word => "letters, digits or underscores",
            Self::Digits => "digits",
        }
    }

    fn may_start_with_digit(self) -> bool {
        !matches!(self, Self::Alpha)
    }
}

/// One element of a compiled pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Token {
    Literal(String),
    Prefix(String),
    Suffix(String),
    Separator(String),
    Enum(Vec<String>),
    Free(CharClass),
    Numeric { width: usize },
}

impl Token {
    /// Human-readable constraint, used as the `expected` text of violations
    pub fn describe(&self) -> String {
        match self {
            Self::Literal(text) => format!("'{text}'"),
            Self::Prefix(text) => format!("prefix '{text}'"),
            Self::Suffix(text) => format!("suffix '{text}'"),
            Self::Separator(text) => format!("separator '{text}'"),
            Self::Enum(members) => format!("one of [{}]", members.join(", ")),
            Self::Free(class) => format!("one or more {}", class.description()),
            Self::Numeric { width } => format!("{width} digits"),
        }
    }

    fn text(&self) -> Option<&str> {
        match self {
            Self::Literal(text) | Self::Prefix(text) | Self::Suffix(text) | Self::Separator(text) => {
                Some(text)
            }
            _ => None,
        }
    }

    fn is_placeholder(&self) -> bool {
        matches!(self, Self::Enum(_) | Self::Free(_) | Self::Numeric { .. })
    }

    fn may_start_with_digit(&self) -> bool {
        match self {
            Self::Enum(members) => members.iter().any(|m| starts_with_digit(m)),
            Self::Free(class) => class.may_start_with_digit(),
            Self::Numeric { .. } => true,
            other => other.text().is_some_and(starts_with_digit),
        }
    }
}

fn starts_with_digit(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Pattern compilation errors; offsets are byte offsets into the source
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum CompileError {
    #[error("pattern is empty")]
    Empty,

    #[error("unterminated placeholder starting at offset {offset}")]
    Unterminated { offset: usize },

    #[error("unknown placeholder '{kind}' at offset {offset}")]
    UnknownPlaceholder { kind: String, offset: usize },

    #[error("invalid argument for '{kind}' at offset {offset}: {reason}")]
    InvalidArgument {
        kind: String,
        offset: usize,
        reason: String,
    },

    #[error("'{kind}' at offset {offset} must be the {required} token")]
    MisplacedTag {
        kind: String,
        offset: usize,
        required: &'static str,
    },

    #[error("dangling escape at offset {offset}")]
    DanglingEscape { offset: usize },

    #[error("ambiguous pattern: placeholder at offset {offset} directly touches a free placeholder")]
    Ambiguous { offset: usize },

    #[error("unmatched '}}' at offset {offset}")]
    StrayBrace { offset: usize },
}

/// Why a name failed a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationKind {
    LiteralMismatch,
    PrefixMismatch,
    SuffixMismatch,
    SeparatorMismatch,
    EnumMismatch { allowed: Vec<String> },
    EmptyPlaceholder,
    WidthMismatch,
    TrailingInput,
}

/// First point at which a name stopped matching its pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternViolation {
    /// Index of the failing token; equals the token count for trailing input
    pub token_index: usize,
    /// Byte offset into the candidate name
    pub offset: usize,
    pub expected: String,
    pub actual: String,
    pub kind: ViolationKind,
}

impl fmt::Display for PatternViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "token {} at offset {}: expected {}, found '{}'",
            self.token_index, self.offset, self.expected, self.actual
        )
    }
}

/// Outcome of evaluating one name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Matched,
    Violation(PatternViolation),
}

impl Evaluation {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched)
    }

    pub fn violation(&self) -> Option<&PatternViolation> {
        match self {
            Self::Matched => None,
            Self::Violation(violation) => Some(violation),
        }
    }
}

/// Compiled pattern, identified by its source text and options
#[derive(Debug, Clone)]
pub struct PatternExpression {
    source: String,
    options: PatternOptions,
    tokens: Vec<Token>,
}

impl PatternExpression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> PatternOptions {
        self.options
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn evaluate(&self, name: &str) -> Evaluation {
        evaluate(self, name)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.evaluate(name).is_match()
    }

    /// True when the pattern has no placeholders
    pub fn is_literal(&self) -> bool {
        !self.tokens.iter().any(Token::is_placeholder)
    }

    /// The only name a placeholder-free pattern accepts (modulo case)
    pub fn literal_text(&self) -> Option<String> {
        if !self.is_literal() {
            return None;
        }
        Some(self.tokens.iter().filter_map(Token::text).collect())
    }
}

impl PartialEq for PatternExpression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.options == other.options
    }
}

impl Eq for PatternExpression {}

impl Hash for PatternExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.options.hash(state);
    }
}

impl Serialize for PatternExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PatternExpression", 2)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("case_sensitive", &self.options.case_sensitive)?;
        state.end()
    }
}

impl fmt::Display for PatternExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile pattern source text
pub fn compile(source: &str, options: PatternOptions) -> Result<PatternExpression, CompileError> {
    if source.is_empty() {
        return Err(CompileError::Empty);
    }

    let mut tokens: Vec<Token> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();
    let mut literal = String::new();
    let mut literal_start = 0;
    let mut chars = source.char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next().ok_or(CompileError::DanglingEscape { offset })?;
                if literal.is_empty() {
                    literal_start = offset;
                }
                literal.push(escaped);
            }
            '_' => {
                flush_literal(&mut literal, literal_start, &mut tokens, &mut offsets);
                tokens.push(Token::Separator(DEFAULT_SEPARATOR.to_string()));
                offsets.push(offset);
            }
            '}' => return Err(CompileError::StrayBrace { offset }),
            '{' => {
                flush_literal(&mut literal, literal_start, &mut tokens, &mut offsets);
                let body = read_placeholder(&mut chars, offset)?;
                let token = placeholder_token(&body, offset, options)?;
                tokens.push(token);
                offsets.push(offset);
            }
            other => {
                if literal.is_empty() {
                    literal_start = offset;
                }
                literal.push(other);
            }
        }
    }
    flush_literal(&mut literal, literal_start, &mut tokens, &mut offsets);

    check_structure(&tokens, &offsets)?;

    Ok(PatternExpression {
        source: source.to_string(),
        options,
        tokens,
    })
}

fn flush_literal(
    literal: &mut String,
    start: usize,
    tokens: &mut Vec<Token>,
    offsets: &mut Vec<usize>,
) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
        offsets.push(start);
    }
}

/// Raw placeholder content; `escaped` marks characters preceded by `\`
struct PlaceholderBody {
    kind: String,
    argument: Option<Vec<(char, bool)>>,
}

fn read_placeholder(
    chars: &mut std::str::CharIndices<'_>,
    open: usize,
) -> Result<PlaceholderBody, CompileError> {
    let mut kind = String::new();
    let mut argument: Option<Vec<(char, bool)>> = None;

    loop {
        let Some((offset, c)) = chars.next() else {
            return Err(CompileError::Unterminated { offset: open });
        };
        match c {
            '}' => return Ok(PlaceholderBody { kind, argument }),
            '{' => return Err(CompileError::Unterminated { offset: open }),
            '\\' => {
                let (_, escaped) = chars.next().ok_or(CompileError::DanglingEscape { offset })?;
                match argument.as_mut() {
                    Some(arg) => arg.push((escaped, true)),
                    None => kind.push(escaped),
                }
            }
            ':' if argument.is_none() => argument = Some(Vec::new()),
            other => match argument.as_mut() {
                Some(arg) => arg.push((other, false)),
                None => kind.push(other),
            },
        }
    }
}

fn placeholder_token(
    body: &PlaceholderBody,
    offset: usize,
    options: PatternOptions,
) -> Result<Token, CompileError> {
    let kind = body.kind.trim();
    let invalid = |reason: &str| CompileError::InvalidArgument {
        kind: kind.to_string(),
        offset,
        reason: reason.to_string(),
    };
    let text = |arg: &[(char, bool)]| arg.iter().map(|(c, _)| *c).collect::<String>();

    match kind {
        "PREFIX" | "SUFFIX" => {
            let value = body
                .argument
                .as_deref()
                .map(text)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| invalid("expected non-empty text"))?;
            Ok(if kind == "PREFIX" {
                Token::Prefix(value)
            } else {
                Token::Suffix(value)
            })
        }
        "SEP" => match body.argument.as_deref() {
            None => Ok(Token::Separator(DEFAULT_SEPARATOR.to_string())),
            Some(arg) if arg.is_empty() => Err(invalid("separator text is empty")),
            Some(arg) => Ok(Token::Separator(text(arg))),
        },
        "ENUM" => {
            let arg = body
                .argument
                .as_deref()
                .ok_or_else(|| invalid("expected a comma-separated set"))?;
            enum_members(arg, options)
                .map(Token::Enum)
                .map_err(|reason| invalid(&reason))
        }
        "ALPHA" | "ALPHANUM" | "WORD" | "DIGITS" => {
            if body.argument.is_some() {
                return Err(invalid("takes no argument"));
            }
            Ok(Token::Free(match kind {
                "ALPHA" => CharClass::Alpha,
                "ALPHANUM" => CharClass::AlphaNumeric,
                "WORD" => CharClass::Word,
                _ => CharClass::Digits,
            }))
        }
        "NUM" => {
            let arg = body
                .argument
                .as_deref()
                .map(text)
                .ok_or_else(|| invalid("expected a width"))?;
            match arg.trim().parse::<usize>() {
                Ok(width) if (1..=MAX_NUMERIC_WIDTH).contains(&width) => {
                    Ok(Token::Numeric { width })
                }
                _ => Err(invalid(&format!(
                    "width must be a number between 1 and {MAX_NUMERIC_WIDTH}"
                ))),
            }
        }
        _ => Err(CompileError::UnknownPlaceholder {
            kind: kind.to_string(),
            offset,
        }),
    }
}

fn enum_members(arg: &[(char, bool)], options: PatternOptions) -> Result<Vec<String>, String> {
    let mut raw = vec![String::new()];
    for &(c, escaped) in arg {
        if c == ',' && !escaped {
            raw.push(String::new());
        } else if let Some(current) = raw.last_mut() {
            current.push(c);
        }
    }

    let mut members: Vec<String> = Vec::with_capacity(raw.len());
    for member in raw {
        let member = member.trim().to_string();
        if member.is_empty() {
            return Err("enum set contains an empty member".to_string());
        }
        let duplicate = members.iter().any(|existing| {
            if options.case_sensitive {
                *existing == member
            } else {
                existing.to_lowercase() == member.to_lowercase()
            }
        });
        if duplicate {
            return Err(format!("duplicate enum member '{member}'"));
        }
        members.push(member);
    }
    Ok(members)
}

fn check_structure(tokens: &[Token], offsets: &[usize]) -> Result<(), CompileError> {
    let last = tokens.len().saturating_sub(1);
    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::Prefix(_) if index != 0 => {
                return Err(CompileError::MisplacedTag {
                    kind: "PREFIX".to_string(),
                    offset: offsets[index],
                    required: "first",
                });
            }
            Token::Suffix(_) if index != last => {
                return Err(CompileError::MisplacedTag {
                    kind: "SUFFIX".to_string(),
                    offset: offsets[index],
                    required: "last",
                });
            }
            // Free placeholders need a fixed token on both sides
            Token::Free(_) => {
                if index > 0 && tokens[index - 1].is_placeholder() {
                    return Err(CompileError::Ambiguous {
                        offset: offsets[index],
                    });
                }
                if let Some(next) = tokens.get(index + 1)
                    && next.is_placeholder()
                {
                    return Err(CompileError::Ambiguous {
                        offset: offsets[index + 1],
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Where a free placeholder has to stop
enum Bound<'a> {
    /// Before the first occurrence of this text
    Text(&'a str),
    /// Where the remaining input equals this suffix
    Tail(&'a str),
    End,
}

/// Evaluate `name` against a compiled pattern
pub fn evaluate(expr: &PatternExpression, name: &str) -> Evaluation {
    let cs = expr.options.case_sensitive;
    let mut cursor = 0;

    for (index, token) in expr.tokens.iter().enumerate() {
        let rest = &name[cursor..];
        let offset = cursor;
        let fail = |kind: ViolationKind, actual: &str| {
            Evaluation::Violation(PatternViolation {
                token_index: index,
                offset,
                expected: token.describe(),
                actual: actual.to_string(),
                kind,
            })
        };

        match token {
            Token::Literal(text) | Token::Prefix(text) | Token::Separator(text) => {
                match match_prefix(rest, text, cs) {
                    Some(len) => cursor += len,
                    None => {
                        let kind = match token {
                            Token::Prefix(_) => ViolationKind::PrefixMismatch,
                            Token::Separator(_) => ViolationKind::SeparatorMismatch,
                            _ => ViolationKind::LiteralMismatch,
                        };
                        return fail(kind, leading_chars(rest, text.chars().count()));
                    }
                }
            }
            Token::Suffix(text) => {
                if match_prefix(rest, text, cs) == Some(rest.len()) {
                    cursor = name.len();
                } else {
                    return fail(ViolationKind::SuffixMismatch, rest);
                }
            }
            Token::Enum(members) => {
                let longest = members
                    .iter()
                    .filter_map(|member| match_prefix(rest, member, cs))
                    .max();
                match longest {
                    Some(len) => cursor += len,
                    None => {
                        return fail(
                            ViolationKind::EnumMismatch {
                                allowed: members.clone(),
                            },
                            segment(rest),
                        );
                    }
                }
            }
            Token::Free(class) => {
                let bound = match expr.tokens.get(index + 1) {
                    Some(Token::Suffix(text)) => Bound::Tail(text),
                    Some(next) => next.text().map_or(Bound::End, Bound::Text),
                    None => Bound::End,
                };
                let len = scan_free(rest, *class, &bound, cs);
                if len == 0 {
                    return fail(ViolationKind::EmptyPlaceholder, segment(rest));
                }
                cursor += len;
            }
            Token::Numeric { width } => {
                let run = rest.bytes().take_while(u8::is_ascii_digit).count();
                let next_takes_digit = expr
                    .tokens
                    .get(index + 1)
                    .is_some_and(Token::may_start_with_digit);
                if run < *width || (run > *width && !next_takes_digit) {
                    let actual = if run == 0 { segment(rest) } else { &rest[..run] };
                    return fail(ViolationKind::WidthMismatch, actual);
                }
                cursor += width;
            }
        }
    }

    if cursor < name.len() {
        return Evaluation::Violation(PatternViolation {
            token_index: expr.tokens.len(),
            offset: cursor,
            expected: "end of name".to_string(),
            actual: name[cursor..].to_string(),
            kind: ViolationKind::TrailingInput,
        });
    }

    Evaluation::Matched
}

fn scan_free(rest: &str, class: CharClass, bound: &Bound<'_>, cs: bool) -> usize {
    for (pos, c) in rest.char_indices() {
        let tail = &rest[pos..];
        let stop = match bound {
            Bound::Text(text) => pos > 0 && match_prefix(tail, text, cs).is_some(),
            Bound::Tail(text) => pos > 0 && match_prefix(tail, text, cs) == Some(tail.len()),
            Bound::End => false,
        };
        if stop || !class.accepts(c) {
            return pos;
        }
    }
    rest.len()
}

/// Byte length of `needle` matched at the start of `hay`, if it matches
fn match_prefix(hay: &str, needle: &str, case_sensitive: bool) -> Option<usize> {
    if case_sensitive {
        return hay.starts_with(needle).then_some(needle.len());
    }
    let mut consumed = 0;
    let mut hay_chars = hay.chars();
    for expected in needle.chars() {
        let found = hay_chars.next()?;
        if !chars_eq_ignore_case(found, expected) {
            return None;
        }
        consumed += found.len_utf8();
    }
    Some(consumed)
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn leading_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Input up to the next underscore, for violation messages
fn segment(text: &str) -> &str {
    text.split('_').next().unwrap_or(text)
}
