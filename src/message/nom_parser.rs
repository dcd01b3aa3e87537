//! Nom-based IRC line parser.
//!
//! The parser is lenient by construction: every component is optional,
//! so any input yields a [`ParsedMessage`]. Missing pieces come back
//! empty instead of as errors.

use nom::{
    bytes::complete::take_till,
    character::complete::{char, space0},
    combinator::opt,
    error::{context, VerboseError},
    sequence::preceded,
    IResult,
};

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// Parse IRCv3 message tags (the part after `@` and before the first space).
fn parse_tags(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing IRCv3 message tags",
        preceded(char('@'), take_till(|c| c == ' ')),
    )(input)
}

/// Parse the message source (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message prefix",
        preceded(char(':'), take_till(|c| c == ' ')),
    )(input)
}

/// Skip any run of spaces.
fn parse_spaces(input: &str) -> ParseResult<&str, &str> {
    space0(input)
}

/// Parse one space-delimited token.
fn parse_token(input: &str) -> ParseResult<&str, &str> {
    take_till(|c| c == ' ')(input)
}

/// Parse a complete IRC line into its components.
///
/// ```text
/// [@tags] [:prefix] <command> [params...] [:trailing]
/// ```
fn parse_message(input: &str) -> ParseResult<&str, ParsedMessage<'_>> {
    let (input, _) = parse_spaces(input)?;
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, _) = parse_spaces(input)?;
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = parse_spaces(input)?;
    let (mut rest, command) = context("parsing command", parse_token)(input)?;

    let mut params = Vec::new();
    loop {
        let (after_space, _) = parse_spaces(rest)?;
        rest = after_space;

        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            rest = "";
            break;
        }

        let (after_param, param) = parse_token(rest)?;
        params.push(param);
        rest = after_param;
    }

    Ok((
        rest,
        ParsedMessage {
            tags,
            prefix,
            command,
            params,
        },
    ))
}

/// A parsed IRC line with borrowed string slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage<'a> {
    /// Raw tags string (without the leading `@`), if present.
    pub tags: Option<&'a str>,
    /// Raw source string (without the leading `:`), if present.
    pub prefix: Option<&'a str>,
    /// The command name or numeric; empty when the line has none.
    pub command: &'a str,
    /// Command parameters, including trailing.
    pub params: Vec<&'a str>,
}

impl<'a> ParsedMessage<'a> {
    /// Parse a line. Never fails; CR/LF at the end are ignored.
    pub fn parse(input: &'a str) -> Self {
        let trimmed = input.trim_end_matches(['\r', '\n']);

        match parse_message(trimmed) {
            Ok((_, msg)) => msg,
            Err(_) => ParsedMessage {
                tags: None,
                prefix: None,
                command: trimmed,
                params: Vec::new(),
            },
        }
    }
}
