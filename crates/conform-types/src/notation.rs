//! Compact signature notation
//!
//! ```text
//! log(string) -> void
//! write(bytes, int = 0) -> int nothrow
//! level() -> int readonly
//! draw(gfx::Canvas) const noexcept
//! ```
//!
//! An omitted return type means `void`. `const` and `noexcept` are accepted
//! as spellings of `readonly` and `nothrow`.

use std::ops::Range;
use std::str::FromStr;

use crate::error::{DescriptorError, ParseError};
use crate::lexer::{tokenize, Token};
use crate::signature::{MethodSignature, Qualifiers};
use crate::ty::TypeRef;
use crate::value::Value;

/// Parse one signature in compact notation
pub fn parse_signature(source: &str) -> Result<MethodSignature, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let sig = parser.signature()?;
    if let Some((_, span)) = parser.tokens.get(parser.pos) {
        return Err(parser.unexpected(span.clone(), "a qualifier or end of signature"));
    }
    Ok(sig)
}

impl FromStr for MethodSignature {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_signature(s)
    }
}

/// A signature given either built or in compact notation
pub trait IntoSignature {
    /// Produce the signature, attributing parse failures to `owner`
    fn into_signature(self, owner: &str) -> Result<MethodSignature, DescriptorError>;
}

impl IntoSignature for MethodSignature {
    fn into_signature(self, _owner: &str) -> Result<MethodSignature, DescriptorError> {
        Ok(self)
    }
}

impl IntoSignature for &str {
    fn into_signature(self, owner: &str) -> Result<MethodSignature, DescriptorError> {
        parse_signature(self).map_err(|error| DescriptorError::InvalidSignature {
            owner: owner.to_string(),
            text: self.to_string(),
            error,
        })
    }
}

impl IntoSignature for &String {
    fn into_signature(self, owner: &str) -> Result<MethodSignature, DescriptorError> {
        self.as_str().into_signature(owner)
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn signature(&mut self) -> Result<MethodSignature, ParseError> {
        let name = self.ident("a method name")?;
        let mut sig = MethodSignature::new(name);

        self.expect(Token::LParen, "'('")?;
        if !self.eat(&Token::RParen) {
            loop {
                let ty = self.type_ref()?;
                sig = if self.eat(&Token::Eq) {
                    let default = self.literal()?;
                    sig.param_with_default(ty, default)
                } else {
                    sig.param(ty)
                };
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(Token::Comma, "',' or ')'")?;
            }
        }

        if self.eat(&Token::Arrow) {
            sig = sig.returns(self.type_ref()?);
        }

        while let Some((Token::Ident(word), span)) = self.tokens.get(self.pos).cloned() {
            match Qualifiers::from_keyword(&word) {
                Some(q) => {
                    sig = sig.with_qualifiers(q);
                    self.pos += 1;
                }
                None => return Err(self.unexpected(span, "a qualifier")),
            }
        }

        Ok(sig)
    }

    fn type_ref(&mut self) -> Result<TypeRef, ParseError> {
        let mut path = self.ident("a type")?;
        while self.eat(&Token::PathSep) {
            path.push_str("::");
            path.push_str(&self.ident("a type name after '::'")?);
        }
        // single identifiers cannot fail to parse
        path.parse().map_err(|_| ParseError::UnexpectedEnd {
            expected: "a type".to_string(),
        })
    }

    fn literal(&mut self) -> Result<Value, ParseError> {
        let Some((token, span)) = self.tokens.get(self.pos).cloned() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "a default value".to_string(),
            });
        };
        let value = match token {
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::Int(i) => Value::Int(i),
            Token::Float(f) => Value::Float(f),
            Token::Str(s) => Value::from(s),
            _ => return Err(self.unexpected(span, "a literal")),
        };
        self.pos += 1;
        Ok(value)
    }

    fn ident(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.tokens.get(self.pos).cloned() {
            Some((Token::Ident(name), _)) => {
                self.pos += 1;
                Ok(name)
            }
            Some((_, span)) => Err(self.unexpected(span, expected)),
            None => Err(ParseError::UnexpectedEnd {
                expected: expected.to_string(),
            }),
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), ParseError> {
        if self.eat(&token) {
            return Ok(());
        }
        match self.tokens.get(self.pos) {
            Some((_, span)) => Err(self.unexpected(span.clone(), expected)),
            None => Err(ParseError::UnexpectedEnd {
                expected: expected.to_string(),
            }),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        match self.tokens.get(self.pos) {
            Some((t, _)) if t == token => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn unexpected(&self, span: Range<usize>, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            found: self.source[span.clone()].to_string(),
            offset: span.start,
            expected: expected.to_string(),
        }
    }
}
