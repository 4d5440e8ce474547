//! Line tokenizer for the PlantUML subset we read.

/// Words PlantUML accepts inside an arrow to steer layout (`-right->`).
const DIRECTIONS: [&str; 11] = [
    "left", "right", "up", "down", "le", "ri", "do", "l", "r", "u", "d",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// `"Order Service"`
    Quoted(String),
    /// `[Order Service]`
    Bracketed(String),
    /// `<<grpc>>`
    Stereotype(String),
    /// Bare identifier: letters, digits, `_`, and inner `.` or `-`.
    Word(String),
    Arrow(Arrow),
    /// Everything after the first `:` outside quotes, trimmed.
    Annotation(String),
    /// Any character nothing else claims.
    Symbol(char),
}

/// Which ends of an arrow carry a head. An arrow with neither is an
/// undirected association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Arrow {
    pub left_head: bool,
    pub right_head: bool,
}

impl Arrow {
    pub fn is_directed(&self) -> bool {
        self.left_head || self.right_head
    }

    /// Points right-to-left only (`A <-- B`).
    pub fn is_reversed(&self) -> bool {
        self.left_head && !self.right_head
    }
}

pub(crate) fn tokenize(line: &str) -> Vec<Token> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '"' => {
                let (text, next) = read_until(&chars, i + 1, &['"']);
                tokens.push(Token::Quoted(text.trim().to_string()));
                i = next + 1;
            }
            '<' if chars.get(i + 1) == Some(&'<') => {
                let (text, next) = read_until_pair(&chars, i + 2, '>');
                tokens.push(Token::Stereotype(text.trim().to_string()));
                i = next + 2;
            }
            '[' => {
                let (text, next) = read_until(&chars, i + 1, &[']']);
                tokens.push(Token::Bracketed(text.trim().to_string()));
                i = next + 1;
            }
            ':' => {
                let rest: String = chars[i + 1..].iter().collect();
                tokens.push(Token::Annotation(rest.trim().to_string()));
                break;
            }
            '-' | '.' | '~' | '=' | '<' => match lex_arrow(&chars, i) {
                Some((arrow, next)) => {
                    tokens.push(Token::Arrow(arrow));
                    i = next;
                }
                None => {
                    tokens.push(Token::Symbol(c));
                    i += 1;
                }
            },
            c if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && continues_word(&chars, i) {
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
            other => {
                tokens.push(Token::Symbol(other));
                i += 1;
            }
        }
    }

    tokens
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `.` joins identifier parts (`pkg.Orders`) but never starts an arrow
/// shaft (`A..>B`). A single `-` between identifier characters joins too
/// (`order-svc`), unless it opens a headed arrow (`A-right->B`).
fn continues_word(chars: &[char], i: usize) -> bool {
    let joins = || chars.get(i + 1).is_some_and(|&c| is_ident_char(c));
    match chars[i] {
        '.' => joins(),
        '-' => joins() && !lex_arrow(chars, i).is_some_and(|(arrow, _)| arrow.is_directed()),
        c => is_ident_char(c),
    }
}

/// Collect characters until one of `stops`; returns the text and the index
/// of the stop (or the end of the line).
fn read_until(chars: &[char], start: usize, stops: &[char]) -> (String, usize) {
    let mut i = start;
    while i < chars.len() && !stops.contains(&chars[i]) {
        i += 1;
    }
    (chars[start.min(chars.len())..i].iter().collect(), i)
}

/// Like [`read_until`] but stops at a doubled character (`>>`).
fn read_until_pair(chars: &[char], start: usize, stop: char) -> (String, usize) {
    let mut i = start;
    while i < chars.len() && !(chars[i] == stop && chars.get(i + 1) == Some(&stop)) {
        i += 1;
    }
    (chars[start.min(chars.len())..i].iter().collect(), i)
}

/// Read an arrow starting at `start`. Accepts optional heads (`<`, `<|`,
/// `>`, `>>`, `|>`), a shaft of `-`, `.`, `~` or `=`, direction words
/// between shaft characters, and `[...]` style blocks inside the shaft.
fn lex_arrow(chars: &[char], start: usize) -> Option<(Arrow, usize)> {
    let mut i = start;
    let mut arrow = Arrow {
        left_head: false,
        right_head: false,
    };
    let mut shaft = 0usize;

    if chars.get(i) == Some(&'<') {
        arrow.left_head = true;
        i += 1;
        if chars.get(i) == Some(&'|') {
            i += 1;
        }
    }

    while let Some(&c) = chars.get(i) {
        match c {
            '-' | '.' | '~' | '=' => {
                shaft += 1;
                i += 1;
            }
            '[' if shaft > 0 => {
                let (_, close) = read_until(chars, i + 1, &[']']);
                i = close + 1;
            }
            '|' if shaft > 0 && chars.get(i + 1) == Some(&'>') => {
                arrow.right_head = true;
                i += 2;
                break;
            }
            '>' if shaft > 0 => {
                arrow.right_head = true;
                i += 1;
                if chars.get(i) == Some(&'>') {
                    i += 1;
                }
                break;
            }
            c if c.is_ascii_alphabetic() && shaft > 0 => {
                let word_end = chars[i..]
                    .iter()
                    .position(|ch| !ch.is_ascii_alphabetic())
                    .map_or(chars.len(), |p| i + p);
                let word: String = chars[i..word_end].iter().collect::<String>().to_lowercase();
                let continues = matches!(chars.get(word_end), Some('-' | '.' | '~' | '='));
                if DIRECTIONS.contains(&word.as_str()) && continues {
                    i = word_end;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }

    (shaft > 0).then_some((arrow, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrow(left_head: bool, right_head: bool) -> Token {
        Token::Arrow(Arrow {
            left_head,
            right_head,
        })
    }

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[test]
    fn test_simple_link() {
        assert_eq!(
            tokenize("A --> B : REST"),
            vec![
                word("A"),
                arrow(false, true),
                word("B"),
                Token::Annotation("REST".into())
            ]
        );
    }

    #[test]
    fn test_no_spaces_around_arrow() {
        assert_eq!(
            tokenize("A->B"),
            vec![word("A"), arrow(false, true), word("B")]
        );
    }

    #[test]
    fn test_quoted_multi_word_labels() {
        assert_eq!(
            tokenize(r#""Order Service" ..> "Payment Service""#),
            vec![
                Token::Quoted("Order Service".into()),
                arrow(false, true),
                Token::Quoted("Payment Service".into()),
            ]
        );
    }

    #[test]
    fn test_direction_and_style_inside_arrow() {
        assert_eq!(tokenize("A -right-> B")[1], arrow(false, true));
        assert_eq!(tokenize("A -up-> B")[1], arrow(false, true));
        assert_eq!(tokenize("A -[#red]-> B")[1], arrow(false, true));
        assert_eq!(tokenize("A -[#blue,dashed]right-> B")[1], arrow(false, true));
    }

    #[test]
    fn test_heads() {
        assert_eq!(tokenize("A <-- B")[1], arrow(true, false));
        assert_eq!(tokenize("A <--> B")[1], arrow(true, true));
        assert_eq!(tokenize("A -- B")[1], arrow(false, false));
        assert_eq!(tokenize("A --|> B")[1], arrow(false, true));
        assert_eq!(tokenize("A ->> B")[1], arrow(false, true));
    }

    #[test]
    fn test_declaration_tokens() {
        assert_eq!(
            tokenize(r#"component "Orders" as O <<service>>"#),
            vec![
                word("component"),
                Token::Quoted("Orders".into()),
                word("as"),
                word("O"),
                Token::Stereotype("service".into()),
            ]
        );
        assert_eq!(
            tokenize("[Billing] as B"),
            vec![Token::Bracketed("Billing".into()), word("as"), word("B")]
        );
    }

    #[test]
    fn test_annotation_keeps_raw_text() {
        let tokens = tokenize(r#"A --> B : <<gRPC>> "quoted: colon""#);
        assert_eq!(
            tokens.last(),
            Some(&Token::Annotation(r#"<<gRPC>> "quoted: colon""#.into()))
        );
    }

    #[test]
    fn test_colon_inside_quotes_is_not_annotation() {
        assert_eq!(
            tokenize(r#""db:Orders" --> B"#)[0],
            Token::Quoted("db:Orders".into())
        );
    }

    #[test]
    fn test_dotted_identifiers_and_dotted_arrows() {
        assert_eq!(
            tokenize("pkg.Orders ..> B"),
            vec![word("pkg.Orders"), arrow(false, true), word("B")]
        );
        assert_eq!(tokenize("A..>B"), vec![word("A"), arrow(false, true), word("B")]);
    }

    #[test]
    fn test_hyphenated_identifiers() {
        assert_eq!(
            tokenize("order-svc --> payments : REST"),
            vec![
                word("order-svc"),
                arrow(false, true),
                word("payments"),
                Token::Annotation("REST".into())
            ]
        );
        assert_eq!(
            tokenize("order-svc-->payment-gw"),
            vec![word("order-svc"), arrow(false, true), word("payment-gw")]
        );
        assert_eq!(
            tokenize("A-right->B"),
            vec![word("A"), arrow(false, true), word("B")]
        );
    }

    #[test]
    fn test_lone_symbols() {
        assert_eq!(tokenize("A { }"), vec![word("A"), Token::Symbol('{'), Token::Symbol('}')]);
        assert_eq!(tokenize("<"), vec![Token::Symbol('<')]);
    }
}
