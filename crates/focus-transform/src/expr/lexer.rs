use super::SandboxError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    /// Decimal literal text, kept exact by the parser.
    Number(String),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Assign,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
}

/// Python-style keywords that have no place in a single expression.
const REJECTED_KEYWORDS: &[(&str, &str)] = &[
    ("lambda", "lambda"),
    ("for", "comprehension"),
    ("yield", "yield"),
    ("await", "await"),
    ("async", "async"),
    ("import", "import"),
    ("exec", "exec"),
    ("eval", "eval"),
];

pub fn tokenize(source: &str) -> Result<Vec<Token>, SandboxError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
                i += 1;
            }
            let mut is_decimal = false;
            if i < chars.len() && chars[i] == '.' && chars.get(i + 1).is_none_or(|n| !n.is_alphabetic() && *n != '_') {
                is_decimal = true;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    is_decimal = true;
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
            if is_decimal {
                tokens.push(Token::Number(text));
            } else {
                let value = text
                    .parse::<i64>()
                    .map_err(|_| SandboxError::Syntax(format!("integer literal out of range: {text}")))?;
                tokens.push(Token::Int(value));
            }
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
                let prefix = word.to_ascii_lowercase();
                if prefix.contains('f') {
                    return Err(SandboxError::Rejected("f-string".to_string()));
                }
                if matches!(prefix.as_str(), "r" | "b" | "u" | "br" | "rb") {
                    return Err(SandboxError::Rejected(format!("{word}-prefixed string")));
                }
            }
            if let Some((_, construct)) = REJECTED_KEYWORDS.iter().find(|(kw, _)| *kw == word) {
                return Err(SandboxError::Rejected((*construct).to_string()));
            }
            tokens.push(Token::Ident(word));
            continue;
        }

        if c == '"' || c == '\'' {
            let (text, next) = read_string(&chars, i)?;
            tokens.push(Token::Str(text));
            i = next;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (token, width) = match (c, next) {
            ('*', Some('*')) => return Err(SandboxError::Rejected("** operator".to_string())),
            (':', Some('=')) => return Err(SandboxError::Rejected("walrus assignment".to_string())),
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::LtEq, 2),
            ('>', Some('=')) => (Token::GtEq, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('=', _) => (Token::Assign, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            ('.', _) => (Token::Dot, 1),
            _ => return Err(SandboxError::Syntax(format!("unexpected character '{c}'"))),
        };
        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

fn read_string(chars: &[char], start: usize) -> Result<(String, usize), SandboxError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            return Ok((out, i + 1));
        }
        if c == '\\' {
            let escaped = chars
                .get(i + 1)
                .ok_or_else(|| SandboxError::Syntax("unterminated string literal".to_string()))?;
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                other => *other,
            });
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
    }
    Err(SandboxError::Syntax("unterminated string literal".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_column_access_and_methods() {
        let tokens = tokenize(r#"df["Cost"].round(2)"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("df".to_string()),
                Token::LBracket,
                Token::Str("Cost".to_string()),
                Token::RBracket,
                Token::Dot,
                Token::Ident("round".to_string()),
                Token::LParen,
                Token::Int(2),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn decimal_literals_keep_text() {
        let tokens = tokenize("1.10 + 2e3").unwrap();
        assert_eq!(tokens[0], Token::Number("1.10".to_string()));
        assert_eq!(tokens[2], Token::Number("2e3".to_string()));
    }

    #[test]
    fn rejects_named_constructs() {
        for (src, construct) in [
            ("lambda x: x", "lambda"),
            ("[x for x in df]", "comprehension"),
            ("f'{df}'", "f-string"),
            ("(x := 1)", "walrus assignment"),
            ("df.sum(**opts)", "** operator"),
            ("await df", "await"),
        ] {
            match tokenize(src) {
                Err(SandboxError::Rejected(found)) => assert_eq!(found, construct, "{src}"),
                other => panic!("expected rejection for {src}, got {other:?}"),
            }
        }
    }
}
