//! Markup lexer using logos
//!
//! Two token sets share one input: content mode (text and tag boundaries) and
//! in-tag mode (attribute names and values). The driver morphs between them.

use logos::{Lexer, Logos, Skip};

use crate::error::{ParseError, ParseResult};

/// Tokens outside of tags
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
enum ContentToken<'src> {
    #[regex(r"<[a-zA-Z][a-zA-Z0-9\-]*", |lex| &lex.slice()[1..])]
    TagOpen(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9\-]*[ \t\r\n]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].trim_end()
    })]
    TagClose(&'src str),

    // Comments, doctypes and CDATA are dropped
    #[token("<!", skip_declaration)]
    Declaration,

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    // A `<` that starts nothing is literal text
    #[token("<")]
    LessThan,
}

fn skip_declaration<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> Skip {
    let remainder = lex.remainder();
    let terminator = if remainder.starts_with("--") { "-->" } else { ">" };
    match remainder.find(terminator) {
        Some(end) => lex.bump(end + terminator.len()),
        None => lex.bump(remainder.len()),
    }
    Skip
}

/// Tokens between `<name` and `>`
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum TagToken<'src> {
    #[regex(r#"[^ \t\r\n"'<>/=]+"#, |lex| lex.slice())]
    Name(&'src str),

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        &s[1..s.len() - 1]
    })]
    DoubleQuoted(&'src str),

    #[regex(r"'[^']*'", |lex| {
        let s = lex.slice();
        &s[1..s.len() - 1]
    })]
    SingleQuoted(&'src str),

    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,

    #[token("/")]
    Slash,
}

/// Flat token stream handed to the parser. Attribute values are still entity-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    Text(&'src str),
    TagOpen(&'src str),
    AttrName(&'src str),
    AttrValue(&'src str),
    TagEnd,
    TagSelfClose,
    TagClose(&'src str),
}

/// Span information for a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl From<std::ops::Range<usize>> for TokenSpan {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// A token with its span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken<'src> {
    pub token: Token<'src>,
    pub span: TokenSpan,
}

/// Lex markup into a flat token stream
pub fn lex(source: &str) -> ParseResult<Vec<SpannedToken<'_>>> {
    let mut tokens = Vec::new();
    let mut content = ContentToken::lexer(source);

    while let Some(result) = content.next() {
        let span = TokenSpan::from(content.span());
        let token = match result {
            Ok(ContentToken::Text(text)) => Token::Text(text),
            Ok(ContentToken::LessThan) => Token::Text("<"),
            Ok(ContentToken::TagClose(name)) => Token::TagClose(name),
            Ok(ContentToken::Declaration) => continue,
            Ok(ContentToken::TagOpen(name)) => {
                tokens.push(SpannedToken {
                    token: Token::TagOpen(name),
                    span,
                });
                let mut tag = content.morph::<TagToken>();
                lex_tag(&mut tag, &mut tokens, name, span.start)?;
                content = tag.morph();
                continue;
            }
            Err(()) => return Err(ParseError::lexer_error(span.start)),
        };
        tokens.push(SpannedToken { token, span });
    }

    Ok(tokens)
}

fn lex_tag<'src>(
    tag: &mut Lexer<'src, TagToken<'src>>,
    tokens: &mut Vec<SpannedToken<'src>>,
    name: &str,
    start: usize,
) -> ParseResult<()> {
    let mut awaiting_value = false;

    while let Some(result) = tag.next() {
        let span = TokenSpan::from(tag.span());
        let token = match result {
            Ok(TagToken::Name(value)) if awaiting_value => Token::AttrValue(value),
            Ok(TagToken::Name(attr)) => Token::AttrName(attr),
            Ok(TagToken::DoubleQuoted(value)) | Ok(TagToken::SingleQuoted(value)) => {
                if !awaiting_value {
                    continue;
                }
                Token::AttrValue(value)
            }
            Ok(TagToken::Equals) => {
                awaiting_value = true;
                continue;
            }
            Ok(TagToken::Slash) => continue,
            Ok(TagToken::End) => {
                tokens.push(SpannedToken {
                    token: Token::TagEnd,
                    span,
                });
                return Ok(());
            }
            Ok(TagToken::SelfClose) => {
                tokens.push(SpannedToken {
                    token: Token::TagSelfClose,
                    span,
                });
                return Ok(());
            }
            Err(()) => return Err(ParseError::unterminated_tag(start, name)),
        };
        awaiting_value = false;
        tokens.push(SpannedToken { token, span });
    }

    Err(ParseError::unterminated_tag(start, name))
}
