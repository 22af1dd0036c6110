//! Parser for shell input
//!
//! A shell line is either a `:command` or a call such as
//! `mylib.fib(10)` / `mean([1, 2.5], strict=True)`. Arguments are literals:
//! `None`, `True`, `False`, integers, floats, quoted strings, `b'...'`
//! bytes, lists, tuples, dicts and sets.

use autosuite_core::callable::Arguments;
use autosuite_core::value::Value;

/// Errors from parsing a shell line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected {found:?} at column {column}")]
    Unexpected { found: char, column: usize },

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("invalid escape in string literal")]
    InvalidEscape,

    #[error("positional argument follows keyword argument")]
    PositionalAfterKeyword,

    #[error("unknown name {0:?}")]
    UnknownName(String),
}

/// A parsed call expression
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Arguments,
}

/// Parse a complete call expression
pub fn parse_call(input: &str) -> Result<CallExpr, ParseError> {
    let mut parser = Parser::new(input);
    let call = parser.call()?;
    parser.skip_ws();
    parser.end()?;
    Ok(call)
}

/// Parse a single literal value
pub fn parse_value(input: &str) -> Result<Value, ParseError> {
    let mut parser = Parser::new(input);
    let value = parser.value()?;
    parser.skip_ws();
    parser.end()?;
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::Unexpected {
                found,
                column: self.pos + 1,
            },
            None => ParseError::UnexpectedEnd,
        }
    }

    fn end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => self.pos += 1,
            _ => return Err(self.unexpected()),
        }
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn dotted_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.identifier()?;
        while self.peek() == Some('.') {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.identifier()?);
        }
        Ok(name)
    }

    fn call(&mut self) -> Result<CallExpr, ParseError> {
        let name = self.dotted_name()?;
        self.expect('(')?;

        let mut args = Arguments::new();
        loop {
            if self.eat(')') {
                break;
            }

            let save = self.pos;
            let keyword = match self.identifier() {
                Ok(ident) if self.eat('=') => Some(ident),
                _ => {
                    self.pos = save;
                    None
                }
            };
            let value = self.value()?;
            match keyword {
                Some(name) => args.named.push((name, value)),
                None if !args.named.is_empty() => return Err(ParseError::PositionalAfterKeyword),
                None => args.positional.push(value),
            }

            if !self.eat(',') {
                self.expect(')')?;
                break;
            }
        }
        Ok(CallExpr { name, args })
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        self.skip_ws();
        match self.peek() {
            None => Err(ParseError::UnexpectedEnd),
            Some('[') => {
                self.pos += 1;
                Ok(Value::List(self.sequence(']')?))
            }
            Some('(') => {
                self.pos += 1;
                self.tuple_or_group()
            }
            Some('{') => {
                self.pos += 1;
                self.dict_or_set()
            }
            Some('\'') | Some('"') => Ok(Value::Str(self.string()?)),
            Some('b') if matches!(self.chars.get(self.pos + 1), Some('\'') | Some('"')) => {
                self.pos += 1;
                let text = self.string()?;
                let bytes = text
                    .chars()
                    .map(|c| u8::try_from(u32::from(c)).map_err(|_| ParseError::InvalidEscape))
                    .collect::<Result<Vec<u8>, _>>()?;
                Ok(Value::Bytes(bytes))
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => {
                let ident = self.identifier()?;
                match ident.as_str() {
                    "None" => Ok(Value::None),
                    "True" => Ok(Value::Bool(true)),
                    "False" => Ok(Value::Bool(false)),
                    "set" if self.eat('(') => {
                        self.expect(')')?;
                        Ok(Value::set([]))
                    }
                    _ => Err(ParseError::UnknownName(ident)),
                }
            }
            Some(_) => Err(self.unexpected()),
        }
    }

    fn sequence(&mut self, close: char) -> Result<Vec<Value>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            if !self.eat(',') {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn tuple_or_group(&mut self) -> Result<Value, ParseError> {
        if self.eat(')') {
            return Ok(Value::Tuple(Vec::new()));
        }
        let first = self.value()?;
        if self.eat(')') {
            return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        items.extend(self.sequence(')')?);
        Ok(Value::Tuple(items))
    }

    fn dict_or_set(&mut self) -> Result<Value, ParseError> {
        if self.eat('}') {
            return Ok(Value::Dict(Vec::new()));
        }
        let first = self.value()?;
        if self.eat(':') {
            let mut pairs = vec![(first, self.value()?)];
            while self.eat(',') {
                if self.eat('}') {
                    return Ok(Value::Dict(pairs));
                }
                let key = self.value()?;
                self.expect(':')?;
                pairs.push((key, self.value()?));
            }
            self.expect('}')?;
            return Ok(Value::Dict(pairs));
        }

        let mut items = vec![first];
        if self.eat(',') {
            items.extend(self.sequence('}')?);
        } else {
            self.expect('}')?;
        }
        Ok(Value::set(items))
    }

    fn number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        let rest: String = self.chars[self.pos..].iter().take(3).collect();
        if rest == "inf" {
            self.pos += 3;
        } else {
            while self.peek().is_some_and(|c| {
                c.is_ascii_alphanumeric() || c == '.' || c == '_'
                    || ((c == '-' || c == '+') && matches!(self.chars.get(self.pos - 1), Some('e') | Some('E')))
            }) {
                self.pos += 1;
            }
        }

        let text: String = self.chars[start..self.pos].iter().filter(|&&c| c != '_').collect();
        let is_float = text.contains(['.', 'e', 'E']) || text.ends_with("inf");
        if !is_float {
            return text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ParseError::InvalidNumber(text));
        }
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ParseError::InvalidNumber(text))
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let quote = self.bump().ok_or(ParseError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            match self.bump().ok_or(ParseError::UnexpectedEnd)? {
                c if c == quote => return Ok(out),
                '\\' => match self.bump().ok_or(ParseError::UnexpectedEnd)? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    '\\' => out.push('\\'),
                    '\'' => out.push('\''),
                    '"' => out.push('"'),
                    'x' => out.push(self.hex_escape(2)?),
                    'u' => out.push(self.hex_escape(4)?),
                    'U' => out.push(self.hex_escape(8)?),
                    _ => return Err(ParseError::InvalidEscape),
                },
                c => out.push(c),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, ParseError> {
        let end = self.pos + digits;
        if end > self.chars.len() {
            return Err(ParseError::InvalidEscape);
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or(ParseError::InvalidEscape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autosuite_core::render::Literal;

    #[test]
    fn test_parse_simple_call() {
        let call = parse_call("fib(10)").unwrap();
        assert_eq!(call.name, "fib");
        assert_eq!(call.args, Arguments::new().arg(10));
    }

    #[test]
    fn test_parse_dotted_call_with_keywords() {
        let call = parse_call("  mylib.mean([1, 2.5, -3], strict = True ,)").unwrap();
        assert_eq!(call.name, "mylib.mean");
        assert_eq!(call.args.positional.len(), 1);
        assert_eq!(call.args.positional[0].repr(), "[1, 2.5, -3]");
        assert_eq!(call.args.named, vec![("strict".to_string(), Value::Bool(true))]);
    }

    #[test]
    fn test_parse_empty_call() {
        assert!(parse_call("f()").unwrap().args.is_empty());
    }

    #[test]
    fn test_values_round_trip_through_repr() {
        for text in [
            "None",
            "'it\\'s'",
            "\"it's\"",
            "b'\\x00ab'",
            "(1,)",
            "()",
            "{'a': [1, 2], 'b': (3, 4)}",
            "{1, 2}",
            "set()",
            "1e+20",
            "-0.5",
            "'tab\\there'",
        ] {
            let value = parse_value(text).unwrap();
            assert_eq!(parse_value(&value.repr()).unwrap(), value, "{}", text);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_call("f(1"), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse_call("f(a=1, 2)"), Err(ParseError::PositionalAfterKeyword));
        assert_eq!(parse_call("f(x)"), Err(ParseError::UnknownName("x".to_string())));
        assert!(matches!(parse_call("f(1) extra"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(parse_value("1.2.3"), Err(ParseError::InvalidNumber(_))));
        assert_eq!(
            parse_call("fib(99999999999999999999)"),
            Err(ParseError::InvalidNumber("99999999999999999999".to_string()))
        );
        assert!(matches!(parse_value("12abc"), Err(ParseError::InvalidNumber(_))));
        assert_eq!(parse_value("9223372036854775807").unwrap(), Value::Int(i64::MAX));
        assert_eq!(parse_value("1e3").unwrap(), Value::Float(1000.0));
    }
}
