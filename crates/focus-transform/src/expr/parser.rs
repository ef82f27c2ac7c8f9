//! Recursive-descent parser producing [`Expr`].
//!
//! Names, attributes and keyword arguments are resolved against their
//! allow-lists while parsing, so a rejected expression never reaches the
//! evaluator.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::SandboxError;
use super::ast::{Attr, BinaryOp, BoolOp, CompareOp, Expr, Keyword, Literal, Name, UnaryOp};
use super::lexer::{Token, tokenize};

/// Deepest expression tree accepted; bounds parser and evaluator recursion.
const MAX_DEPTH: usize = 100;

pub fn parse_expression(source: &str) -> Result<Expr, SandboxError> {
    if source.trim().is_empty() {
        return Err(SandboxError::Syntax("empty expression".to_string()));
    }
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(SandboxError::Syntax(format!(
            "unexpected token {}",
            describe(token)
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Nesting of the tree under construction, counting chained operators.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(word)) if word == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), SandboxError> {
        if self.eat(expected) {
            return Ok(());
        }
        Err(SandboxError::Syntax(match self.peek() {
            Some(found) => format!("expected {}, found {}", describe(expected), describe(found)),
            None => format!("expected {}, found end of expression", describe(expected)),
        }))
    }

    /// Enters one more level of nesting. Errors abort the whole parse, so
    /// only successful paths call [`Parser::leave`].
    fn descend(&mut self) -> Result<(), SandboxError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SandboxError::Syntax("expression nested too deeply".to_string()));
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn parse_or(&mut self) -> Result<Expr, SandboxError> {
        self.descend()?;
        let mut links = 1;
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            self.descend()?;
            links += 1;
            let right = self.parse_and()?;
            left = Expr::Bool {
                op: BoolOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.leave(links);
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SandboxError> {
        let mut links = 0;
        let mut left = self.parse_not()?;
        while self.eat_keyword("and") {
            self.descend()?;
            links += 1;
            let right = self.parse_not()?;
            left = Expr::Bool {
                op: BoolOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.leave(links);
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, SandboxError> {
        if self.eat_keyword("not") {
            self.descend()?;
            let operand = self.parse_not()?;
            self.leave(1);
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, SandboxError> {
        let left = self.parse_additive()?;
        let op = match self.peek() {
            Some(Token::EqEq) => CompareOp::Eq,
            Some(Token::NotEq) => CompareOp::NotEq,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::LtEq) => CompareOp::LtEq,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::GtEq) => CompareOp::GtEq,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_additive()?;
        if matches!(
            self.peek(),
            Some(Token::EqEq | Token::NotEq | Token::Lt | Token::LtEq | Token::Gt | Token::GtEq)
        ) {
            return Err(SandboxError::Syntax(
                "chained comparisons are not supported".to_string(),
            ));
        }
        Ok(Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, SandboxError> {
        let mut links = 0;
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => {
                    self.leave(links);
                    return Ok(left);
                }
            };
            self.pos += 1;
            self.descend()?;
            links += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SandboxError> {
        let mut links = 0;
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => {
                    self.leave(links);
                    return Ok(left);
                }
            };
            self.pos += 1;
            self.descend()?;
            links += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, SandboxError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.parse_postfix(),
        };
        self.pos += 1;
        self.descend()?;
        let operand = self.parse_unary()?;
        self.leave(1);
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, SandboxError> {
        let mut links = 0;
        let mut expr = self.parse_primary()?;
        loop {
            if matches!(self.peek(), Some(Token::Dot | Token::LParen | Token::LBracket)) {
                self.descend()?;
                links += 1;
            }
            if self.eat(&Token::Dot) {
                let attr = match self.next() {
                    Some(Token::Ident(ident)) => resolve_attr(&ident)?,
                    _ => return Err(SandboxError::Syntax("expected attribute name".to_string())),
                };
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    attr,
                };
            } else if self.eat(&Token::LParen) {
                let (args, kwargs) = self.parse_arguments()?;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                    kwargs,
                };
            } else if self.eat(&Token::LBracket) {
                let index = self.parse_or()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                self.leave(links);
                return Ok(expr);
            }
        }
    }

    fn parse_arguments(&mut self) -> Result<(Vec<Expr>, Vec<(Keyword, Expr)>), SandboxError> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok((args, kwargs));
        }
        loop {
            if self.peek() == Some(&Token::Star) {
                return Err(SandboxError::Rejected("* argument splat".to_string()));
            }
            let is_keyword = matches!(
                (self.tokens.get(self.pos), self.tokens.get(self.pos + 1)),
                (Some(Token::Ident(_)), Some(Token::Assign))
            );
            if is_keyword {
                let Some(Token::Ident(ident)) = self.next() else {
                    return Err(SandboxError::Syntax("expected keyword name".to_string()));
                };
                self.pos += 1;
                let keyword = Keyword::from_ident(&ident)
                    .ok_or_else(|| SandboxError::Rejected(format!("keyword argument '{ident}'")))?;
                kwargs.push((keyword, self.parse_or()?));
            } else {
                if !kwargs.is_empty() {
                    return Err(SandboxError::Syntax(
                        "positional argument follows keyword argument".to_string(),
                    ));
                }
                args.push(self.parse_or()?);
            }
            if self.eat(&Token::Comma) {
                if self.eat(&Token::RParen) {
                    return Ok((args, kwargs));
                }
                continue;
            }
            self.expect(&Token::RParen)?;
            return Ok((args, kwargs));
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, SandboxError> {
        match self.next() {
            Some(Token::Int(value)) => Ok(Expr::Literal(Literal::Int(value))),
            Some(Token::Number(text)) => parse_decimal_literal(&text),
            Some(Token::Str(value)) => Ok(Expr::Literal(Literal::Str(value))),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                if self.peek() == Some(&Token::Comma) {
                    return Err(SandboxError::Syntax("tuples are not supported".to_string()));
                }
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(ident)) => match ident.as_str() {
                "True" | "true" => Ok(Expr::Literal(Literal::Bool(true))),
                "False" | "false" => Ok(Expr::Literal(Literal::Bool(false))),
                "None" | "null" => Ok(Expr::Literal(Literal::None)),
                _ => resolve_name(&ident).map(Expr::Name),
            },
            Some(token) => Err(SandboxError::Syntax(format!(
                "unexpected token {}",
                describe(&token)
            ))),
            None => Err(SandboxError::Syntax("unexpected end of expression".to_string())),
        }
    }
}

fn resolve_name(ident: &str) -> Result<Name, SandboxError> {
    if ident.starts_with('_') {
        return Err(SandboxError::Rejected(format!("private name '{ident}'")));
    }
    Name::from_ident(ident).ok_or_else(|| SandboxError::Rejected(format!("name '{ident}'")))
}

fn resolve_attr(ident: &str) -> Result<Attr, SandboxError> {
    if ident.starts_with('_') {
        return Err(SandboxError::Rejected(format!("private attribute '{ident}'")));
    }
    Attr::from_ident(ident).ok_or_else(|| SandboxError::Rejected(format!("attribute '{ident}'")))
}

fn parse_decimal_literal(text: &str) -> Result<Expr, SandboxError> {
    let padded = if text.ends_with('.') {
        format!("{text}0")
    } else {
        text.to_string()
    };
    Decimal::from_str(&padded)
        .or_else(|_| Decimal::from_scientific(&padded))
        .map(|d| Expr::Literal(Literal::Decimal(d)))
        .map_err(|_| SandboxError::Syntax(format!("invalid number literal {text}")))
}

fn describe(token: &Token) -> String {
    match token {
        Token::Int(v) => v.to_string(),
        Token::Number(t) => t.clone(),
        Token::Str(s) => format!("{s:?}"),
        Token::Ident(i) => format!("'{i}'"),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::Percent => "'%'".to_string(),
        Token::EqEq => "'=='".to_string(),
        Token::NotEq => "'!='".to_string(),
        Token::Lt => "'<'".to_string(),
        Token::LtEq => "'<='".to_string(),
        Token::Gt => "'>'".to_string(),
        Token::GtEq => "'>='".to_string(),
        Token::Assign => "'='".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::LBracket => "'['".to_string(),
        Token::RBracket => "']'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Dot => "'.'".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_chain_with_keyword() {
        let expr = parse_expression(r#"pd.to_numeric(df["Cost"], errors="coerce").round(ndigits=2)"#)
            .unwrap();
        let Expr::Call { func, kwargs, .. } = expr else {
            panic!("expected call");
        };
        assert_eq!(kwargs.len(), 1);
        assert!(matches!(*func, Expr::Attribute { attr: Attr::Round, .. }));
    }

    #[test]
    fn precedence_binds_multiplication_tighter() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        let Expr::Binary { op, right, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn rejects_unknown_names_attributes_and_keywords() {
        let cases = [
            ("os.system('x')", "name 'os'"),
            ("__import__('os')", "private name '__import__'"),
            ("df.__class__", "private attribute '__class__'"),
            ("df.to_csv('x')", "attribute 'to_csv'"),
            ("df['a'].round(foo=1)", "keyword argument 'foo'"),
            ("df['a'].sum(*args)", "* argument splat"),
        ];
        for (src, construct) in cases {
            match parse_expression(src) {
                Err(SandboxError::Rejected(found)) => assert_eq!(found, construct, "{src}"),
                other => panic!("expected rejection for {src}, got {other:?}"),
            }
        }
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(matches!(parse_expression(""), Err(SandboxError::Syntax(_))));
        assert!(matches!(parse_expression("df["), Err(SandboxError::Syntax(_))));
        assert!(matches!(
            parse_expression("current if current else 1"),
            Err(SandboxError::Syntax(_))
        ));
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let too_deep = |src: &str| {
            matches!(
                parse_expression(src),
                Err(SandboxError::Syntax(message)) if message == "expression nested too deeply"
            )
        };
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(too_deep(&parens));
        assert!(too_deep(&format!("{}1", "-".repeat(100_000))));
        assert!(too_deep(&format!("{}True", "not ".repeat(100_000))));
        assert!(too_deep(&format!("1{}", " + 1".repeat(100_000))));
        assert!(too_deep(&format!("current{}", ".abs()".repeat(100_000))));

        let moderate = format!("{}current{} * 2", "(".repeat(40), ")".repeat(40));
        assert!(parse_expression(&moderate).is_ok());
        assert!(parse_expression(&format!("1{}", " + 1".repeat(40))).is_ok());
    }
}
