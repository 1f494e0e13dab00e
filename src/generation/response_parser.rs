//! Lenient JSON recovery from model responses
//!
//! Generation responses are free text: some reasoning, then (usually) a fenced
//! ```` ```json ```` block. The block is not guaranteed to be valid JSON; trailing
//! commas, single quotes, bare keys, Python literals and truncated tails all show
//! up. [`extract_json_from_markdown`] finds the payload and [`repair_json`] reads it
//! as forgivingly as it can. Unrecoverable input yields `None`, never an error.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Number, Value};

lazy_static! {
    static ref JSON_FENCE: Regex = Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap();
    static ref ANY_FENCE: Regex = Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*(.*?)\s*```").unwrap();
}

/// Nesting deeper than this is returned as `null`
const MAX_DEPTH: usize = 256;

/// Locate and parse the structured payload of a model response.
///
/// Search order: the first ```` ```json ```` block that parses, any other fenced
/// block that starts like JSON, an unterminated ```` ```json ```` block (truncated
/// response), then the whole text.
pub fn extract_json_from_markdown(text: &str) -> Option<Value> {
    for caps in JSON_FENCE.captures_iter(text) {
        if let Some(value) = lenient_parse(&caps[1]) {
            return Some(value);
        }
    }

    for caps in ANY_FENCE.captures_iter(text) {
        let body = caps[1].trim_start();
        if body.starts_with('[') || body.starts_with('{') {
            if let Some(value) = lenient_parse(body) {
                return Some(value);
            }
        }
    }

    if let Some(start) = text.rfind("```json") {
        let tail = &text[start + "```json".len()..];
        if !tail.contains("```") {
            if let Some(value) = lenient_parse(tail) {
                return Some(value);
            }
        }
    }

    lenient_parse(text)
}

/// Strict parse first, repair second.
pub fn lenient_parse(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find(['[', '{'])?;
    let repaired = repair_json(&trimmed[start..]);
    if repaired.is_some() {
        log::debug!("recovered malformed JSON payload ({} bytes)", trimmed.len());
    }
    repaired
}

/// Read `text` as JSON, repairing what can be repaired.
///
/// Handles trailing, missing and doubled commas, single-quoted strings, bare keys
/// and bare-word values, `True`/`False`/`None`/`undefined`, `//` and `/* */`
/// comments, raw newlines in strings, stray closers and truncation (open strings
/// and containers are closed, a dangling key gets `null`). Anything after the
/// first complete top-level value is ignored.
pub fn repair_json(text: &str) -> Option<Value> {
    let mut reader = RepairReader::new(text);
    reader.skip_insignificant();
    if reader.at_end() {
        return None;
    }
    let value = reader.value(0);
    match &value {
        Value::Array(_) | Value::Object(_) => Some(value),
        _ if value.is_null() => None,
        _ => Some(value),
    }
}

struct RepairReader {
    chars: Vec<char>,
    pos: usize,
}

impl RepairReader {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Whitespace and comments
    fn skip_insignificant(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '/' && self.peek_at(1) == Some('/') {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else if c == '/' && self.peek_at(1) == Some('*') {
                self.pos += 2;
                while !self.at_end() && !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                    self.pos += 1;
                }
                self.pos = (self.pos + 2).min(self.chars.len());
            } else {
                break;
            }
        }
    }

    fn skip_separators(&mut self) {
        loop {
            self.skip_insignificant();
            if self.peek() == Some(',') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn value(&mut self, depth: usize) -> Value {
        self.skip_insignificant();
        match self.peek() {
            None => Value::Null,
            Some('{') if depth < MAX_DEPTH => self.object(depth + 1),
            Some('[') if depth < MAX_DEPTH => self.array(depth + 1),
            Some('{') | Some('[') => {
                self.skip_container();
                Value::Null
            }
            Some(q @ ('"' | '\'')) => Value::String(self.string(q)),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(_) => self.bare_word(&[',', '}', ']', '\n']),
        }
    }

    fn object(&mut self, depth: usize) -> Value {
        self.pos += 1;
        let mut map = Map::new();
        loop {
            self.skip_separators();
            let key = match self.peek() {
                None => break,
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(']') => {
                    // stray closer
                    self.pos += 1;
                    continue;
                }
                Some(q @ ('"' | '\'')) => self.string(q),
                Some(_) => match self.bare_key() {
                    Some(key) => key,
                    None => {
                        self.pos += 1;
                        continue;
                    }
                },
            };

            self.skip_insignificant();
            let value = match self.peek() {
                Some(':') => {
                    self.pos += 1;
                    self.skip_insignificant();
                    match self.peek() {
                        None | Some(',') | Some('}') => Value::Null,
                        _ => self.value(depth),
                    }
                }
                None | Some(',') | Some('}') => Value::Null,
                _ => self.value(depth),
            };
            map.insert(key, value);
        }
        Value::Object(map)
    }

    fn array(&mut self, depth: usize) -> Value {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None => break,
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some('}') | Some(':') => {
                    self.pos += 1;
                }
                Some(_) => {
                    let before = self.pos;
                    items.push(self.value(depth));
                    if self.pos == before {
                        self.pos += 1;
                    }
                }
            }
        }
        Value::Array(items)
    }

    /// A quoted string. A quote only closes the string when what follows it looks
    /// like structure, so unescaped inner quotes survive.
    fn string(&mut self, quote: char) -> String {
        self.pos += 1;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => match self.peek() {
                    Some(escaped) => {
                        self.pos += 1;
                        match escaped {
                            'n' => out.push('\n'),
                            't' => out.push('\t'),
                            'r' => out.push('\r'),
                            'b' => out.push('\u{8}'),
                            'f' => out.push('\u{c}'),
                            'u' => out.push(self.unicode_escape()),
                            other => out.push(other),
                        }
                    }
                    None => break,
                },
                c if c == quote && self.closes_string() => return out,
                c => out.push(c),
            }
        }
        out
    }

    fn closes_string(&self) -> bool {
        let mut offset = 0;
        while let Some(c) = self.peek_at(offset) {
            if c == '\n' {
                return true;
            }
            if !c.is_whitespace() {
                return matches!(c, ',' | ':' | '}' | ']');
            }
            offset += 1;
        }
        true
    }

    fn unicode_escape(&mut self) -> char {
        let hex: String = self.chars[self.pos..]
            .iter()
            .take(4)
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        self.pos += hex.len();
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or('\u{fffd}')
    }

    fn number(&mut self) -> Value {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let literal = text.trim_start_matches('+');

        // `12abc` is a word, not a number
        if self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos = start;
            return self.bare_word(&[',', '}', ']', '\n']);
        }

        if let Ok(n) = literal.parse::<i64>() {
            return Value::Number(n.into());
        }
        if let Some(n) = literal.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
        Value::String(text)
    }

    fn bare_key(&mut self) -> Option<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ':' | ',' | '{' | '}' | '[' | ']' | '"' | '\'') || c.is_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            Some(self.chars[start..self.pos].iter().collect())
        }
    }

    fn bare_word(&mut self, terminators: &[char]) -> Value {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if terminators.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.trim() {
            "true" | "True" | "TRUE" => Value::Bool(true),
            "false" | "False" | "FALSE" => Value::Bool(false),
            "null" | "None" | "undefined" | "NULL" | "NaN" | "" => Value::Null,
            other => Value::String(other.to_string()),
        }
    }

    fn skip_container(&mut self) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '{' | '[' => depth += 1,
                '}' | ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }
}
