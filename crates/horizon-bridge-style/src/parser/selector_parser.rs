//! Selector text parser built on `cssparser`.

use cssparser::{Delimiter, Parser, ParserInput, Token};

use super::error::ParseError;
use crate::ast::{SelectorAst, SimpleSelectorAst};
use crate::logging::targets;

type Parsed = (Vec<Vec<SimpleSelectorAst>>, Vec<String>);

/// Parse a single selector such as `StackLayout > Button.primary:hover`.
///
/// Never fails: text that is not a valid selector comes back as
/// [`SelectorAst::Malformed`]. Combinator tokens are passed through
/// unvalidated, so `A ~ B` parses and is rejected when the selector is
/// built.
pub fn parse_selector(text: &str) -> SelectorAst {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    into_ast(text.trim(), parse_compounds(&mut parser))
}

/// Parse a comma-separated selector list.
///
/// Each entry is parsed independently, so one malformed entry does not
/// affect the others.
///
/// # Example
///
/// ```
/// use horizon_bridge_style::parser::parse_selector_list;
///
/// let selectors = parse_selector_list("Button, Label >, .title");
/// assert_eq!(selectors.len(), 3);
/// assert!(selectors[1].is_malformed());
/// assert!(!selectors[2].is_malformed());
/// ```
pub fn parse_selector_list(text: &str) -> Vec<SelectorAst> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut selectors = Vec::new();

    loop {
        let start = parser.position();
        let result: Result<Parsed, cssparser::ParseError<'_, ParseError>> =
            parser.parse_until_before(Delimiter::Comma, |p| {
                parse_compounds(p).map_err(|error| p.new_custom_error(error))
            });
        let source = parser.slice_from(start).trim();
        let result = result.map_err(|error| match error.kind {
            cssparser::ParseErrorKind::Custom(error) => error,
            cssparser::ParseErrorKind::Basic(kind) => ParseError::new(
                format!("{kind:?}"),
                error.location.line + 1,
                error.location.column,
            ),
        });
        selectors.push(into_ast(source, result));

        match parser.next() {
            Ok(Token::Comma) => continue,
            _ => break,
        }
    }
    selectors
}

fn into_ast(text: &str, result: Result<Parsed, ParseError>) -> SelectorAst {
    match result {
        Ok((sequences, combinators)) => SelectorAst::Parsed {
            sequences,
            combinators,
        },
        Err(error) => {
            tracing::warn!(target: targets::SELECTOR, selector = text, %error, "failed to parse selector");
            SelectorAst::Malformed {
                text: text.to_string(),
                error,
            }
        }
    }
}

fn error_at(parser: &Parser<'_, '_>, message: impl Into<String>) -> ParseError {
    let location = parser.current_source_location();
    ParseError::new(message, location.line + 1, location.column)
}

/// Parse compound selectors and the combinators between them until the
/// input (or the enclosing delimiter) is exhausted.
fn parse_compounds(parser: &mut Parser<'_, '_>) -> Result<Parsed, ParseError> {
    let mut sequences: Vec<Vec<SimpleSelectorAst>> = Vec::new();
    let mut combinators = Vec::new();
    let mut current: Vec<SimpleSelectorAst> = Vec::new();
    // Combinator seen since the last compound was closed.
    let mut pending: Option<&'static str> = None;

    parser.skip_whitespace();

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        let combinator = match &token {
            Token::WhiteSpace(_) => Some(" "),
            Token::Delim('>') => Some(">"),
            Token::Delim('+') => Some("+"),
            Token::Delim('~') => Some("~"),
            _ => None,
        };
        if let Some(combinator) = combinator {
            if !current.is_empty() {
                sequences.push(std::mem::take(&mut current));
            }
            if sequences.is_empty() {
                return Err(error_at(parser, format!("'{combinator}' without a selector before it")));
            }
            pending = match (pending, combinator) {
                (_, " ") => pending.or(Some(" ")),
                (None | Some(" "), explicit) => Some(explicit),
                (Some(previous), explicit) => {
                    return Err(error_at(
                        parser,
                        format!("'{explicit}' directly after '{previous}'"),
                    ));
                }
            };
            continue;
        }

        let simple = match token {
            Token::Ident(name) => {
                if !current.is_empty() {
                    return Err(error_at(parser, format!("type '{name}' must start a compound selector")));
                }
                SimpleSelectorAst::Type(name.to_string())
            }
            Token::Delim('*') => {
                if !current.is_empty() {
                    return Err(error_at(parser, "'*' must start a compound selector"));
                }
                SimpleSelectorAst::Universal
            }
            Token::IDHash(id) => SimpleSelectorAst::Id(id.to_string()),
            Token::Delim('.') => SimpleSelectorAst::Class(expect_name(parser, "class name after '.'")?),
            Token::Colon => SimpleSelectorAst::PseudoClass(expect_name(parser, "pseudo-class name after ':'")?),
            Token::SquareBracketBlock => parser
                .parse_nested_block(parse_attribute)
                .map_err(ParseError::from_css)?,
            Token::Comma => return Err(error_at(parser, "unexpected ','")),
            other => return Err(error_at(parser, format!("unexpected token {other:?}"))),
        };

        if current.is_empty() {
            if let Some(combinator) = pending.take() {
                combinators.push(combinator.to_string());
            }
        }
        current.push(simple);
    }

    if !current.is_empty() {
        sequences.push(current);
    }
    if let Some(combinator) = pending.filter(|c| *c != " ") {
        return Err(error_at(parser, format!("'{combinator}' without a selector after it")));
    }
    if sequences.is_empty() {
        return Err(error_at(parser, "empty selector"));
    }
    Ok((sequences, combinators))
}

/// Read an identifier immediately following the current token.
fn expect_name(parser: &mut Parser<'_, '_>, what: &str) -> Result<String, ParseError> {
    let name = match parser.next_including_whitespace() {
        Ok(Token::Ident(name)) => Some(name.to_string()),
        _ => None,
    };
    name.ok_or_else(|| error_at(parser, format!("expected {what}")))
}

/// Parse the inside of `[...]`.
fn parse_attribute<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<SimpleSelectorAst, cssparser::ParseError<'i, String>> {
    let name = parser.expect_ident()?.to_string();
    if parser.is_exhausted() {
        return Ok(SimpleSelectorAst::Attribute {
            name,
            test: None,
            value: None,
        });
    }

    let test = match parser.next()? {
        Token::Delim('=') => "=",
        Token::PrefixMatch => "^=",
        Token::SuffixMatch => "$=",
        Token::SubstringMatch => "*=",
        Token::IncludeMatch => "~=",
        Token::DashMatch => "|=",
        other => {
            let message = format!("unexpected {other:?} in attribute selector");
            return Err(parser.new_custom_error(message));
        }
    };
    let value = match parser.next()? {
        Token::Ident(value) | Token::QuotedString(value) => value.to_string(),
        other => {
            let message = format!("expected attribute value, found {other:?}");
            return Err(parser.new_custom_error(message));
        }
    };
    parser.expect_exhausted()?;

    Ok(SimpleSelectorAst::Attribute {
        name,
        test: Some(test.to_string()),
        value: Some(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> Parsed {
        match parse_selector(text) {
            SelectorAst::Parsed {
                sequences,
                combinators,
            } => (sequences, combinators),
            SelectorAst::Malformed { error, .. } => panic!("{text}: {error}"),
        }
    }

    #[test]
    fn parse_compound() {
        let (sequences, combinators) = parsed("Button#ok.primary:hover");
        assert!(combinators.is_empty());
        assert_eq!(
            sequences,
            vec![vec![
                SimpleSelectorAst::Type("Button".into()),
                SimpleSelectorAst::Id("ok".into()),
                SimpleSelectorAst::Class("primary".into()),
                SimpleSelectorAst::PseudoClass("hover".into()),
            ]]
        );
    }

    #[test]
    fn parse_combinators() {
        let (sequences, combinators) = parsed("Page StackLayout > Label + Button ~ Image");
        assert_eq!(sequences.len(), 5);
        assert_eq!(combinators, vec![" ", ">", "+", "~"]);

        let (_, tight) = parsed("Page>Label+Button");
        assert_eq!(tight, vec![">", "+"]);
    }

    #[test]
    fn parse_attributes() {
        let (sequences, _) = parsed("[enabled][lang^='en'][role=button]");
        assert_eq!(
            sequences[0],
            vec![
                SimpleSelectorAst::Attribute {
                    name: "enabled".into(),
                    test: None,
                    value: None,
                },
                SimpleSelectorAst::Attribute {
                    name: "lang".into(),
                    test: Some("^=".into()),
                    value: Some("en".into()),
                },
                SimpleSelectorAst::Attribute {
                    name: "role".into(),
                    test: Some("=".into()),
                    value: Some("button".into()),
                },
            ]
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let (sequences, combinators) = parsed("  Label  ");
        assert_eq!(sequences.len(), 1);
        assert!(combinators.is_empty());
    }

    #[test]
    fn malformed_selectors() {
        for text in ["", "> Label", "Label >", "Label > > Button", ".", "Label:", "[a=]", "A, B", "Label!"] {
            assert!(parse_selector(text).is_malformed(), "{text:?} should be malformed");
        }
    }

    #[test]
    fn malformed_error_has_location() {
        match parse_selector("Label >") {
            SelectorAst::Malformed { text, error } => {
                assert_eq!(text, "Label >");
                assert_eq!(error.line, 1);
                assert!(error.message.contains("'>'"));
            }
            SelectorAst::Parsed { .. } => panic!("expected malformed"),
        }
    }

    #[test]
    fn list_isolates_bad_entries() {
        let list = parse_selector_list("Button , Label >,.title");
        assert_eq!(list.len(), 3);
        assert!(!list[0].is_malformed());
        assert!(matches!(&list[1], SelectorAst::Malformed { text, .. } if text == "Label >"));
        assert!(!list[2].is_malformed());
    }
}
