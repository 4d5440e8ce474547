//! Two statement shapes: a component declaration and a link.

use archfuse_core::NodeKind;

use super::lexer::{Token, tokenize};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Statement {
    Declaration {
        label: String,
        alias: Option<String>,
        /// Type implied by the declaring keyword (`database`, `queue`).
        keyword_kind: Option<NodeKind>,
    },
    Link {
        from: String,
        to: String,
        annotation: Option<String>,
    },
}

/// Declaring keywords and the node type they imply, if any.
fn declaration_keyword(word: &str) -> Option<Option<NodeKind>> {
    match word.to_ascii_lowercase().as_str() {
        "component" | "rectangle" | "node" => Some(None),
        "database" => Some(Some(NodeKind::Db)),
        "queue" => Some(Some(NodeKind::Queue)),
        _ => None,
    }
}

pub(crate) fn parse_line(line: &str) -> Option<Statement> {
    // Stereotypes decorate declarations and endpoints; they never change
    // which statement a line is.
    let tokens: Vec<Token> = tokenize(line)
        .into_iter()
        .filter(|t| !matches!(t, Token::Stereotype(_)))
        .collect();

    parse_declaration(&tokens).or_else(|| parse_link(&tokens))
}

fn label_of(token: &Token) -> Option<&str> {
    match token {
        Token::Quoted(s) | Token::Bracketed(s) | Token::Word(s) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

fn is_as(token: Option<&Token>) -> bool {
    matches!(token, Some(Token::Word(w)) if w.eq_ignore_ascii_case("as"))
}

fn parse_declaration(tokens: &[Token]) -> Option<Statement> {
    if tokens.iter().any(|t| matches!(t, Token::Arrow(_))) {
        return None;
    }

    let (keyword_kind, rest) = match tokens.first()? {
        Token::Word(w) => (declaration_keyword(w)?, &tokens[1..]),
        // `[Label] as Alias` shorthand declares a component.
        Token::Bracketed(_) => (None, tokens),
        _ => return None,
    };

    let first = rest.first()?;
    let label = label_of(first)?;

    if !is_as(rest.get(1)) {
        return Some(Statement::Declaration {
            label: label.to_string(),
            alias: None,
            keyword_kind,
        });
    }

    let second = rest.get(2)?;
    let other = label_of(second)?;
    // `component Orders as "Order Service"`: the quoted side is the label.
    let (label, alias) = match (first, second) {
        (Token::Word(_), Token::Quoted(_)) => (other, label),
        _ => (label, other),
    };
    Some(Statement::Declaration {
        label: label.to_string(),
        alias: Some(alias.to_string()),
        keyword_kind,
    })
}

fn parse_link(tokens: &[Token]) -> Option<Statement> {
    let [from, Token::Arrow(arrow), to, rest @ ..] = tokens else {
        return None;
    };
    if !arrow.is_directed() {
        return None;
    }
    let from = label_of(from)?;
    let to = label_of(to)?;

    let annotation = match rest {
        [] => None,
        [Token::Annotation(text)] => Some(text.clone()).filter(|t| !t.is_empty()),
        _ => return None,
    };

    let (from, to) = if arrow.is_reversed() {
        (to, from)
    } else {
        (from, to)
    };
    Some(Statement::Link {
        from: from.to_string(),
        to: to.to_string(),
        annotation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(label: &str, alias: Option<&str>, keyword_kind: Option<NodeKind>) -> Statement {
        Statement::Declaration {
            label: label.into(),
            alias: alias.map(String::from),
            keyword_kind,
        }
    }

    fn link(from: &str, to: &str, annotation: Option<&str>) -> Statement {
        Statement::Link {
            from: from.into(),
            to: to.into(),
            annotation: annotation.map(String::from),
        }
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            parse_line(r#"component "Orders" as O"#),
            Some(decl("Orders", Some("O"), None))
        );
        assert_eq!(
            parse_line(r#"Component "Order Service""#),
            Some(decl("Order Service", None, None))
        );
        assert_eq!(parse_line("rectangle Billing"), Some(decl("Billing", None, None)));
        assert_eq!(
            parse_line(r#"database "Ledger" as L <<postgres>>"#),
            Some(decl("Ledger", Some("L"), Some(NodeKind::Db)))
        );
        assert_eq!(
            parse_line("queue Events"),
            Some(decl("Events", None, Some(NodeKind::Queue)))
        );
    }

    #[test]
    fn test_bracket_and_reverse_alias_forms() {
        assert_eq!(
            parse_line("[Billing Service] as BS"),
            Some(decl("Billing Service", Some("BS"), None))
        );
        assert_eq!(
            parse_line(r#"component OS as "Order Service""#),
            Some(decl("Order Service", Some("OS"), None))
        );
        assert_eq!(
            parse_line("component [Inventory]"),
            Some(decl("Inventory", None, None))
        );
    }

    #[test]
    fn test_links() {
        assert_eq!(parse_line("A --> B"), Some(link("A", "B", None)));
        assert_eq!(parse_line("A --> B : REST"), Some(link("A", "B", Some("REST"))));
        assert_eq!(
            parse_line(r#""Order Service" -right-> "Payment Service" : <<gRPC>>"#),
            Some(link("Order Service", "Payment Service", Some("<<gRPC>>")))
        );
        assert_eq!(
            parse_line("[Web] ..> [Api] : [rest]"),
            Some(link("Web", "Api", Some("[rest]")))
        );
    }

    #[test]
    fn test_reversed_link() {
        assert_eq!(parse_line("A <-- B : pub"), Some(link("B", "A", Some("pub"))));
        assert_eq!(parse_line("A <--> B"), Some(link("A", "B", None)));
    }

    #[test]
    fn test_link_with_endpoint_stereotypes() {
        assert_eq!(
            parse_line("A <<svc>> --> B <<db>>"),
            Some(link("A", "B", None))
        );
    }

    #[test]
    fn test_hyphenated_names() {
        assert_eq!(
            parse_line("order-svc --> payments : REST"),
            Some(link("order-svc", "payments", Some("REST")))
        );
        assert_eq!(
            parse_line("component order-svc"),
            Some(decl("order-svc", None, None))
        );
        assert_eq!(
            parse_line("database ledger-db as L"),
            Some(decl("ledger-db", Some("L"), Some(NodeKind::Db)))
        );
    }

    #[test]
    fn test_non_statements() {
        assert_eq!(parse_line("A -- B"), None);
        assert_eq!(parse_line("skinparam monochrome true"), None);
        assert_eq!(parse_line("title Architecture"), None);
        assert_eq!(parse_line("package Backend {"), None);
        assert_eq!(parse_line("}"), None);
        assert_eq!(parse_line("component"), None);
        assert_eq!(parse_line("A --> B C"), None);
        assert_eq!(parse_line("A --> B :"), Some(link("A", "B", None)));
    }
}
