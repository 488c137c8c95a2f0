//! Text-run rewriting for WordprocessingML parts.
//!
//! Only `<w:p>` paragraphs and their `<w:t>` runs are touched; every other
//! byte of the part is copied through untouched. Paragraphs may nest (text
//! boxes live inside a run of their anchor paragraph).

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Paragraph tags (`<w:p ..>`, `<w:p ../>`, `</w:p>`, never `<w:pPr>`)
    // or a whole text run with its text captured.
    RE.get_or_init(|| {
        Regex::new(r#"</?w:p(?:\s[^>]*)?>|<w:t(?:\s[^>]*)?>([^<]*)</w:t>"#)
            .expect("valid token regex")
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TextRun {
    open_tag: Range<usize>,
    text: Range<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Paragraph {
    runs: Vec<TextRun>,
    text: String,
}

impl Paragraph {
    /// Concatenated, entity-decoded text of the paragraph's own runs. Runs
    /// of paragraphs nested inside it (text boxes) are not included.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// One XML part of the package with its paragraphs located, in the order
/// their opening tags appear.
#[derive(Clone, Debug)]
pub struct XmlPart {
    xml: String,
    paragraphs: Vec<Paragraph>,
}

impl XmlPart {
    pub fn parse(xml: String) -> Self {
        let mut found: Vec<(Paragraph, bool)> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        for caps in token_re().captures_iter(&xml) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if let Some(text) = caps.get(1) {
                // A run belongs to the innermost open paragraph.
                if let Some(&idx) = open.last() {
                    found[idx].0.runs.push(TextRun {
                        open_tag: whole.start()..text.start(),
                        text: text.range(),
                    });
                }
                continue;
            }

            let tag = whole.as_str();
            if tag.starts_with("</") {
                if let Some(idx) = open.pop() {
                    found[idx].1 = true;
                }
            } else if !tag.ends_with("/>") {
                open.push(found.len());
                found.push((Paragraph::default(), false));
            }
        }

        let paragraphs = found
            .into_iter()
            .filter(|(_, closed)| *closed)
            .map(|(mut paragraph, _)| {
                paragraph.text = paragraph
                    .runs
                    .iter()
                    .map(|r| unescape(&xml[r.text.clone()]))
                    .collect();
                paragraph
            })
            .collect();
        Self { xml, paragraphs }
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Rewrites the part, putting each `Some` translation into the first
    /// run of its paragraph and emptying the paragraph's remaining runs.
    /// `translations` is indexed like [`XmlPart::paragraphs`].
    pub fn apply(&self, translations: &[Option<String>]) -> String {
        let mut edits: Vec<(&TextRun, Option<&str>)> = Vec::new();
        for (paragraph, translation) in self.paragraphs.iter().zip(translations) {
            let Some(translation) = translation else {
                continue;
            };
            for (i, run) in paragraph.runs.iter().enumerate() {
                edits.push((run, (i == 0).then_some(translation.as_str())));
            }
        }
        // Nested paragraphs interleave with their parent's runs.
        edits.sort_by_key(|(run, _)| run.open_tag.start);

        let mut out = String::with_capacity(self.xml.len());
        let mut cursor = 0;
        for (run, replacement) in edits {
            out.push_str(&self.xml[cursor..run.open_tag.start]);
            match replacement {
                Some(translation) => {
                    out.push_str(r#"<w:t xml:space="preserve">"#);
                    out.push_str(&escape(translation));
                }
                None => out.push_str(&self.xml[run.open_tag.clone()]),
            }
            cursor = run.text.end;
        }
        out.push_str(&self.xml[cursor..]);
        out
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let c = match &tail[1..semi] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                e if e.starts_with("#x") || e.starts_with("#X") => {
                    u32::from_str_radix(&e[2..], 16).ok().and_then(char::from_u32)
                }
                e if e.starts_with('#') => e[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
