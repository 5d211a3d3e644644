//! Best-effort recovery of a JSON object from model output.
//!
//! Model replies may be fenced in markdown, prefixed with prose or a
//! `<think>` block, or cut off mid-token. [`extract_object`] never fails: when
//! nothing usable is found it returns an empty map and the caller treats the
//! result as degraded.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

static REASONING_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*<think>.*?</think>").ok());

/// Recovers the object a model reply represents, or an empty map.
pub fn extract_object(text: &str) -> Map<String, Value> {
    let cleaned = clean_reply(text);

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(cleaned) {
        return map;
    }

    let start = [cleaned.find('{'), cleaned.find('[')]
        .into_iter()
        .flatten()
        .min();
    let Some(start) = start else {
        return Map::new();
    };

    match parse_partial(&cleaned[start..]) {
        Some(Value::Object(map)) => map,
        _ => Map::new()
    }
}

/// Drops a leading reasoning block, markdown fences and stray backticks.
pub fn clean_reply(text: &str) -> &str {
    let mut s = strip_reasoning(text).trim();

    if let Some(rest) = s.strip_prefix("```json") {
        s = rest.trim_start();
        s = strip_closing_fence(s);
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest.trim_start();
        s = strip_closing_fence(s);
    }

    s.trim_matches('`').trim()
}

/// Removes a `<think>...</think>` preamble emitted by reasoning models.
pub fn strip_reasoning(text: &str) -> &str {
    match REASONING_BLOCK.as_ref().and_then(|re| re.find(text)) {
        Some(found) => &text[found.end()..],
        None => text
    }
}

fn strip_closing_fence(s: &str) -> &str {
    let trimmed = s.trim_end();
    trimmed.strip_suffix("```").unwrap_or(trimmed)
}

/// Parses the longest structurally valid prefix of `input`.
///
/// Unterminated strings, arrays and objects are closed where the input ends,
/// a key without a value is dropped, and anything after the first complete
/// value is ignored.
pub fn parse_partial(input: &str) -> Option<Value> {
    PartialParser::new(input).parse_value()
}

const MAX_DEPTH: usize = 128;

struct PartialParser<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize
}

impl<'a> PartialParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
            depth: 0
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Option<Value> {
        self.skip_whitespace();
        match self.peek()? {
            b'{' | b'[' if self.depth >= MAX_DEPTH => None,
            b'{' => Some(self.parse_object()),
            b'[' => Some(self.parse_array()),
            b'"' => self.parse_string().map(|(s, _)| Value::String(s)),
            b't' => self.parse_literal("true", Value::Bool(true)),
            b'f' => self.parse_literal("false", Value::Bool(false)),
            b'n' => self.parse_literal("null", Value::Null),
            b'-' | b'0'..=b'9' => self.parse_number(),
            _ => None
        }
    }

    fn parse_object(&mut self) -> Value {
        let mut map = Map::new();
        self.pos += 1;
        self.depth += 1;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(b'"') => {}
                Some(_) => break
            }

            let Some((key, closed)) = self.parse_string() else {
                break;
            };
            if !closed {
                break;
            }

            self.skip_whitespace();
            if self.peek() != Some(b':') {
                break;
            }
            self.pos += 1;

            match self.parse_value() {
                Some(value) => {
                    map.insert(key, value);
                }
                None => break
            }
        }

        self.depth -= 1;
        Value::Object(map)
    }

    fn parse_array(&mut self) -> Value {
        let mut items = Vec::new();
        self.pos += 1;
        self.depth += 1;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            match self.parse_value() {
                Some(value) => items.push(value),
                None => break
            }
        }

        self.depth -= 1;
        Value::Array(items)
    }

    /// Returns the decoded string and whether its closing quote was seen.
    fn parse_string(&mut self) -> Option<(String, bool)> {
        if self.peek() != Some(b'"') {
            return None;
        }
        self.pos += 1;

        let mut buf: Vec<u8> = Vec::new();
        while let Some(byte) = self.peek() {
            self.pos += 1;
            match byte {
                b'"' => return Some((String::from_utf8_lossy(&buf).into_owned(), true)),
                b'\\' => {
                    let Some(escaped) = self.peek() else {
                        break;
                    };
                    self.pos += 1;
                    match escaped {
                        b'n' => buf.push(b'\n'),
                        b't' => buf.push(b'\t'),
                        b'r' => buf.push(b'\r'),
                        b'b' => buf.push(0x08),
                        b'f' => buf.push(0x0c),
                        b'u' => match self.parse_unicode_escape() {
                            Some(c) => {
                                let mut tmp = [0u8; 4];
                                buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
                            }
                            None => break
                        },
                        other => buf.push(other)
                    }
                }
                other => buf.push(other)
            }
        }

        Some((String::from_utf8_lossy(&buf).into_owned(), false))
    }

    fn read_hex4(&mut self) -> Option<u32> {
        let digits = self.bytes.get(self.pos..self.pos + 4)?;
        let text = std::str::from_utf8(digits).ok()?;
        let code = u32::from_str_radix(text, 16).ok()?;
        self.pos += 4;
        Some(code)
    }

    fn parse_unicode_escape(&mut self) -> Option<char> {
        let high = self.read_hex4()?;
        if (0xD800..0xDC00).contains(&high) {
            if self.bytes.get(self.pos..self.pos + 2) == Some(b"\\u".as_slice()) {
                self.pos += 2;
                let low = self.read_hex4()?;
                let combined = 0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF);
                return Some(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            return Some(char::REPLACEMENT_CHARACTER);
        }
        Some(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Accepts the full literal, or a prefix of it when the input ends early.
    fn parse_literal(&mut self, literal: &str, value: Value) -> Option<Value> {
        let rest = &self.bytes[self.pos..];
        let expected = literal.as_bytes();

        if rest.starts_with(expected) {
            self.pos += expected.len();
            return Some(value);
        }
        if !rest.is_empty() && expected.starts_with(rest) {
            self.pos = self.bytes.len();
            return Some(value);
        }
        None
    }

    fn parse_number(&mut self) -> Option<Value> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9')
        ) {
            self.pos += 1;
        }

        let raw = std::str::from_utf8(&self.bytes[start..self.pos]).ok()?;
        let raw = if self.at_end() {
            raw.trim_end_matches(['.', 'e', 'E', '+', '-'])
        } else {
            raw
        };

        if let Ok(int) = raw.parse::<i64>() {
            return Some(Value::Number(int.into()));
        }
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    }
}
