//! Append-only Jsonnet text sink.
//!
//! Converters write line by line; the emitter adds no structure of its own
//! beyond the string encodings below. Output is a pure function of the
//! calls made, so two identical call sequences produce identical bytes.

use std::borrow::Cow;
use std::io;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::format::Formatter;

/// Strings at least this long are emitted as wrapped text blocks, and the
/// wrapped lines never exceed this width.
pub const COMMENT_WRAP_WIDTH: usize = 80;

/// Indentation of text block lines.
pub const TEXT_BLOCK_INDENT: &str = "    ";

/// Delimiter of Jsonnet text blocks.
const TEXT_BLOCK_DELIMITER: &str = "|||";

const TAB_SIZE: usize = 8;

/// Words that cannot be used as bare field names.
const RESERVED_WORDS: &[&str] = &[
    "assert", "else", "error", "false", "for", "function", "if", "import", "importbin",
    "importstr", "in", "local", "null", "self", "super", "tailstrict", "then", "true",
];

/// Text sink for one unit.
#[derive(Debug, Clone, Default)]
pub struct Emitter {
    buf: String,
}

impl Emitter {
    /// Create an empty emitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw text.
    pub fn write(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    /// Append text followed by a newline.
    pub fn writeln(&mut self, s: &str) {
        self.buf.push_str(s);
        self.buf.push('\n');
    }

    /// Append an empty line.
    pub fn blank_line(&mut self) {
        self.buf.push('\n');
    }

    /// Append a string value: inline quoted when shorter than
    /// [`COMMENT_WRAP_WIDTH`] characters, otherwise as a wrapped text block.
    ///
    /// A text block takes its indentation from its first line, so leading
    /// whitespace of the value is not carried into the block.
    pub fn write_multiline_string(&mut self, s: &str) {
        if s.chars().count() < COMMENT_WRAP_WIDTH {
            self.write(&string_literal(s));
            return;
        }

        let lines = wrap_text(s.trim_start(), COMMENT_WRAP_WIDTH, TEXT_BLOCK_INDENT);
        if lines.is_empty() {
            // Nothing but whitespace; a text block needs at least one line.
            self.write(&string_literal(s));
            return;
        }

        self.writeln(TEXT_BLOCK_DELIMITER);
        for line in &lines {
            self.writeln(line);
        }
        self.write(TEXT_BLOCK_DELIMITER);
    }

    /// Append `key: <json>,` on its own line.
    pub fn write_field(&mut self, key: &str, value: &Value) {
        self.writeln(&format!("{}: {},", field_name(key), value_text(value)));
    }

    /// Append `key: { ... },` with one line per entry.
    pub fn write_object_field<'a, I>(&mut self, key: &str, entries: I)
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        self.writeln(&format!("{}: {{", field_name(key)));
        for (k, v) in entries {
            self.write_field(k, v);
        }
        self.writeln("},");
    }

    /// Text written so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consume the emitter without formatting.
    pub fn into_text(self) -> String {
        self.buf
    }

    /// Consume the emitter, running the formatting pass when it succeeds.
    pub fn finish(self, formatter: &dyn Formatter) -> String {
        match formatter.format(&self.buf) {
            Some(formatted) => formatted,
            None => self.buf,
        }
    }
}

/// Single-line JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Single-line JSON text of `value`: `[1, 2]`, `{"a": 1}`.
pub fn json_text<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(serde::ser::Error::custom)
}

/// [`json_text`] of a JSON value.
pub fn value_text(value: &Value) -> String {
    // A `Value` always serializes.
    json_text(value).unwrap_or_default()
}

/// JSON (and Jsonnet) string literal for `s`.
pub fn string_literal(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Whether `s` can be written as a bare Jsonnet identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let starts_ok = match chars.next() {
        Some(c) => c == '_' || c.is_ascii_alphabetic(),
        None => false,
    };
    starts_ok
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        && !RESERVED_WORDS.contains(&s)
}

/// Field name as it must appear in an object literal.
pub fn field_name(key: &str) -> Cow<'_, str> {
    if is_identifier(key) {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(string_literal(key))
    }
}

/// Member access expression `base.name`, or `base["name"]` when `name` is
/// not an identifier.
pub fn member_access(base: &str, name: &str) -> String {
    if is_identifier(name) {
        format!("{}.{}", base, name)
    } else {
        format!("{}[{}]", base, string_literal(name))
    }
}

fn whitespace_runs() -> &'static Regex {
    static RUNS: OnceLock<Regex> = OnceLock::new();
    RUNS.get_or_init(|| Regex::new(r" +|[^ ]+").expect("static pattern"))
}

/// Letter in the sense of the hyphenation rules: a word character that is
/// not a digit.
fn is_letter(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Characters an em-dash (`--`) may follow.
fn is_word_punct(c: char) -> bool {
    is_word_char(c) || matches!(c, '!' | '"' | '\'' | '&' | '.' | ',' | '?')
}

/// Whether the hyphen at `at` ends a chunk: `ab-cd`, or `a-b-cd` after an
/// earlier break, followed by a letter pair (optionally hyphen-joined).
fn is_break_hyphen(word: &[char], at: usize) -> bool {
    let get = |i: Option<usize>| i.and_then(|i| word.get(i)).copied();
    let letter = |i: Option<usize>| get(i).map_or(false, is_letter);

    let behind = (letter(at.checked_sub(2)) && letter(at.checked_sub(1)))
        || (letter(at.checked_sub(3)) && get(at.checked_sub(2)) == Some('-') && letter(at.checked_sub(1)));
    let ahead = letter(Some(at + 1))
        && (letter(Some(at + 2)) || (get(Some(at + 2)) == Some('-') && letter(Some(at + 3))));
    behind && ahead
}

/// End of a run of two or more hyphens starting at `at` that is followed by
/// a word character.
fn em_dash_end(word: &[char], at: usize) -> Option<usize> {
    let len = word[at..].iter().take_while(|&&c| c == '-').count();
    let end = at + len;
    (len >= 2 && word.get(end).map_or(false, |&c| is_word_char(c))).then_some(end)
}

/// Split one whitespace-free run into wrap chunks: after word-joining
/// hyphens, and around em-dashes.
fn split_word(run: &str, chunks: &mut Vec<String>) {
    let word: Vec<char> = run.chars().collect();
    let mut start = 0;

    while start < word.len() {
        let follows_punct = start > 0 && is_word_punct(word[start - 1]);
        if follows_punct {
            if let Some(end) = em_dash_end(&word, start) {
                chunks.push(word[start..end].iter().collect());
                start = end;
                continue;
            }
        }

        let mut end = word.len();
        for j in start + 1..word.len() {
            if word[j] == '-' && is_break_hyphen(&word, j) {
                end = j + 1;
                break;
            }
            if is_word_punct(word[j - 1]) && em_dash_end(&word, j).is_some() {
                end = j;
                break;
            }
        }
        chunks.push(word[start..end].iter().collect());
        start = end;
    }
}

/// Wrap chunks of `text`, in order.
fn wrap_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    for run in whitespace_runs().find_iter(text) {
        let run = run.as_str();
        if run.starts_with(' ') {
            chunks.push(run.to_string());
        } else {
            split_word(run, &mut chunks);
        }
    }
    chunks
}

/// Expand tabs to the next multiple of [`TAB_SIZE`], restarting the column
/// at line breaks.
fn expand_tabs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = TAB_SIZE - (column % TAB_SIZE);
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

/// Move the head of a word longer than a line onto `line`, breaking after
/// its last hyphen that fits when there is one.
fn break_long_word(next: &mut String, line: &mut Vec<String>, line_len: usize, room: usize) {
    let space_left = if room < 1 { 1 } else { room - line_len };
    let chars: Vec<char> = next.chars().collect();

    let mut end = space_left;
    if chars.len() > space_left {
        let hyphen = chars[..space_left].iter().rposition(|&c| c == '-');
        if let Some(h) = hyphen.filter(|&h| h > 0 && chars[..h].iter().any(|&c| c != '-')) {
            end = h + 1;
        }
    }
    let end = end.min(chars.len());

    line.push(chars[..end].iter().collect());
    *next = chars[end..].iter().collect();
}

/// Greedy word wrap. Every returned line starts with `indent` and is at most
/// `width` characters long.
///
/// Words break after joining hyphens (`cross-` / `origin`). Whitespace runs
/// inside a line are kept; a run at the start of a later line is dropped, as
/// is the last chunk of a line when it is blank. Leading whitespace of the
/// first line is kept. Words longer than a line are split, after their last
/// fitting hyphen when they have one.
pub fn wrap_text(text: &str, width: usize, indent: &str) -> Vec<String> {
    let normalized: String = expand_tabs(text)
        .chars()
        .map(|c| if matches!(c, '\n' | '\r' | '\x0b' | '\x0c') { ' ' } else { c })
        .collect();

    // Reversed so the next chunk is always at the end.
    let mut chunks = wrap_chunks(&normalized);
    chunks.reverse();

    let room = width.saturating_sub(indent.chars().count());
    let mut lines: Vec<String> = Vec::new();

    while !chunks.is_empty() {
        let mut line: Vec<String> = Vec::new();
        let mut line_len = 0;

        if !lines.is_empty() && chunks.last().map_or(false, |c| is_blank(c)) {
            chunks.pop();
        }

        while let Some(next) = chunks.last() {
            let len = next.chars().count();
            if line_len + len > room {
                break;
            }
            line_len += len;
            line.extend(chunks.pop());
        }

        if let Some(next) = chunks.last_mut() {
            if next.chars().count() > room {
                break_long_word(next, &mut line, line_len, room);
                if next.is_empty() {
                    chunks.pop();
                }
            }
        }

        if line.last().map_or(false, |c| is_blank(c)) {
            line.pop();
        }

        if !line.is_empty() {
            lines.push(format!("{}{}", indent, line.concat()));
        }
    }

    lines
}

fn is_blank(chunk: &str) -> bool {
    chunk.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NoopFormatter;
    use serde_json::json;

    #[test]
    fn test_short_string_is_inline() {
        let text = "a".repeat(79);
        let mut e = Emitter::new();
        e.write_multiline_string(&text);
        assert_eq!(e.as_str(), format!("\"{}\"", text));
    }

    #[test]
    fn test_long_string_is_text_block() {
        let text = "word ".repeat(20).trim_end().to_string();
        assert_eq!(text.len(), 99);
        let mut e = Emitter::new();
        e.write_multiline_string(&text);

        let out = e.into_text();
        assert!(out.starts_with("|||\n"));
        assert!(out.ends_with("\n|||"));
        for line in out.lines().filter(|l| *l != "|||") {
            assert!(line.starts_with("    "));
            assert!(line.chars().count() <= COMMENT_WRAP_WIDTH);
        }
    }

    #[test]
    fn test_exactly_eighty_chars_is_text_block() {
        let text = "x".repeat(80);
        let mut e = Emitter::new();
        e.write_multiline_string(&text);
        let expected = format!("|||\n    {}\n    {}\n|||", "x".repeat(76), "x".repeat(4));
        assert_eq!(e.as_str(), expected);
    }

    #[test]
    fn test_wrap_greedy_fill() {
        let lines = wrap_text("aaa bbb ccc", 12, "    ");
        assert_eq!(lines, vec!["    aaa bbb", "    ccc"]);
    }

    #[test]
    fn test_wrap_replaces_newlines_and_drops_boundary_space() {
        let lines = wrap_text("one\ntwo   three", 13, "  ");
        assert_eq!(lines, vec!["  one two", "  three"]);
    }

    #[test]
    fn test_wrap_keeps_leading_space_of_first_line() {
        let lines = wrap_text("  lead", 80, "");
        assert_eq!(lines, vec!["  lead"]);
    }

    #[test]
    fn test_text_block_drops_leading_whitespace() {
        let text = format!("   {}", "word ".repeat(19));
        let mut e = Emitter::new();
        e.write_multiline_string(&text);
        assert_eq!(
            e.as_str(),
            format!("|||\n    {}\n    {}\n|||", ["word"; 15].join(" "), ["word"; 4].join(" "))
        );
    }

    #[test]
    fn test_full_line_then_long_word_stays_within_width() {
        let text = format!("{} {}", "a".repeat(75), "y".repeat(100));
        let lines = wrap_text(&text, COMMENT_WRAP_WIDTH, TEXT_BLOCK_INDENT);

        let widths: Vec<usize> = lines.iter().map(|l| l.chars().count()).collect();
        assert_eq!(widths, vec![80, 80, 28]);
        assert_eq!(lines[0], format!("    {} ", "a".repeat(75)));
        assert_eq!(lines[1], format!("    {}", "y".repeat(76)));
    }

    #[test]
    fn test_wrap_breaks_after_joining_hyphens() {
        let text = "Serves the static assets xxxxxxxxx and it includes the cross-origin-resource-sharing headers";
        assert_eq!(
            wrap_text(text, COMMENT_WRAP_WIDTH, TEXT_BLOCK_INDENT),
            vec![
                "    Serves the static assets xxxxxxxxx and it includes the cross-origin-",
                "    resource-sharing headers",
            ]
        );
    }

    #[test]
    fn test_long_word_breaks_after_last_fitting_hyphen() {
        let text = format!("{} {}-{}", "x".repeat(10), "1".repeat(50), "2".repeat(50));
        assert_eq!(
            wrap_text(&text, COMMENT_WRAP_WIDTH, TEXT_BLOCK_INDENT),
            vec![
                format!("    {} {}-", "x".repeat(10), "1".repeat(50)),
                format!("    {}", "2".repeat(50)),
            ]
        );
    }

    #[test]
    fn test_wrap_chunks() {
        assert_eq!(wrap_chunks("state-of-the-art"), vec!["state-", "of-", "the-", "art"]);
        assert_eq!(wrap_chunks("a-b-cd"), vec!["a-b-", "cd"]);
        assert_eq!(wrap_chunks("x-b-c-d-long"), vec!["x-b-", "c-", "d-", "long"]);
        assert_eq!(wrap_chunks("well--known"), vec!["well", "--", "known"]);
        assert_eq!(wrap_chunks("e-mail 1-2-3 --flag"), vec!["e-mail", " ", "1-2-3", " ", "--flag"]);
    }

    #[test]
    fn test_json_text_spacing() {
        assert_eq!(value_text(&json!([1, 2])), "[1, 2]");
        assert_eq!(value_text(&json!({"a": 1, "b": [true, null]})), "{\"a\": 1, \"b\": [true, null]}");
        assert_eq!(value_text(&json!("x")), "\"x\"");
        assert_eq!(value_text(&json!({})), "{}");
        assert_eq!(json_text(&["behavior", "ttl"]).unwrap(), "[\"behavior\", \"ttl\"]");
    }

    #[test]
    fn test_wrap_whitespace_only_is_empty() {
        assert!(wrap_text("     ", 4, "").is_empty());
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("a\tb"), "a       b");
        assert_eq!(expand_tabs("x\n\ty"), "x\n        y");
    }

    #[test]
    fn test_field_name_quoting() {
        assert_eq!(field_name("ttl"), "ttl");
        assert_eq!(field_name("is_secure"), "is_secure");
        assert_eq!(field_name("foo-bar"), "\"foo-bar\"");
        assert_eq!(field_name("local"), "\"local\"");
        assert_eq!(field_name("9lives"), "\"9lives\"");
        assert_eq!(field_name(""), "\"\"");
    }

    #[test]
    fn test_member_access() {
        assert_eq!(member_access("papi.behaviors", "caching"), "papi.behaviors.caching");
        assert_eq!(member_access("papi.behaviors", "a-b"), "papi.behaviors[\"a-b\"]");
    }

    #[test]
    fn test_write_object_field() {
        let mut map = serde_json::Map::new();
        map.insert("is_secure".to_string(), json!(false));
        map.insert("x-y".to_string(), json!([1, 2]));
        let mut e = Emitter::new();
        e.write_object_field("options", &map);
        assert_eq!(e.as_str(), "options: {\nis_secure: false,\n\"x-y\": [1, 2],\n},\n");
    }

    #[test]
    fn test_finish_without_formatter_is_identity() {
        let mut e = Emitter::new();
        e.writeln("{");
        e.writeln("}");
        assert_eq!(e.finish(&NoopFormatter), "{\n}\n");
    }
}
