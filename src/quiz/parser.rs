//! Scanner for the model's free-text answer.
//!
//! Parsing runs in two stages. [`split_blocks`] cuts the text into raw blocks,
//! each starting at a `Q<n>)` marker and ending with the first `Answer: <X>`
//! after it. [`parse_block`] then pulls the stem, the four options and the
//! answer letter out of one block. Blocks that fail the second stage are
//! dropped, they never abort the whole parse.

use crate::quiz::{Label, Question};

const ANSWER_TOKEN: &str = "Answer:";
const OPTION_MARKERS: [&str; 4] = ["A)", "B)", "C)", "D)"];

/// Extracts every well-formed question from `text`, in order of appearance.
pub fn parse_questions(text: &str) -> Vec<Question> {
    let blocks = split_blocks(text);
    let total = blocks.len();

    let questions: Vec<Question> = blocks
        .into_iter()
        .filter_map(|block| {
            let question = parse_block(block);
            if question.is_none() {
                log::debug!("Dropping malformed question block: {:?}", block);
            }
            question
        })
        .collect();

    log::debug!(
        "Parsed {} of {} question blocks",
        questions.len(),
        total
    );
    questions
}

/// Splits `text` into raw question blocks, marker through terminator inclusive.
pub fn split_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some((start, body)) = find_marker(text, cursor) {
        let Some(end) = find_terminator(text, body) else {
            // Any later marker would need a terminator after this one too.
            break;
        };
        blocks.push(&text[start..end]);
        cursor = end;
    }

    blocks
}

/// Extracts one question from a raw block, or `None` on a grammar violation.
pub fn parse_block(block: &str) -> Option<Question> {
    let (_, mut cursor) = find_marker(block, 0)?;

    let mut fields: Vec<&str> = Vec::with_capacity(5);
    for marker in OPTION_MARKERS {
        let at = cursor + block[cursor..].find(marker)?;
        fields.push(block[cursor..at].trim());
        cursor = at + marker.len();
    }

    let (answer_at, label) = find_answer(block, cursor)?;
    fields.push(block[cursor..answer_at].trim());

    let text = fields[0].to_string();
    let options = [
        fields[1].to_string(),
        fields[2].to_string(),
        fields[3].to_string(),
        fields[4].to_string(),
    ];
    Some(Question::new(text, options, label))
}

/// Finds the next `Q<digits>)` at or after `from`.
/// Returns the marker start and the offset just past its `)`.
fn find_marker(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut pos = from;

    while let Some(rel) = text[pos..].find('Q') {
        let start = pos + rel;
        let digits_end = bytes[start + 1..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |n| start + 1 + n);

        if digits_end > start + 1 && bytes.get(digits_end) == Some(&b')') {
            return Some((start, digits_end + 1));
        }
        pos = start + 1;
    }

    None
}

/// End offset of the first `Answer: <A-D>` (single space) at or after `from`.
fn find_terminator(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = from;

    while let Some(rel) = text[pos..].find(ANSWER_TOKEN) {
        let at = pos + rel + ANSWER_TOKEN.len();
        if bytes.get(at) == Some(&b' ') {
            if let Some(letter) = bytes.get(at + 1) {
                if Label::from_char(*letter as char).is_some() {
                    return Some(at + 2);
                }
            }
        }
        pos = pos + rel + 1;
    }

    None
}

/// First `Answer:` at or after `from` followed by optional whitespace and a label.
fn find_answer(text: &str, from: usize) -> Option<(usize, Label)> {
    let mut pos = from;

    while let Some(rel) = text[pos..].find(ANSWER_TOKEN) {
        let at = pos + rel;
        let rest = text[at + ANSWER_TOKEN.len()..].trim_start();
        if let Some(label) = rest.chars().next().and_then(Label::from_char) {
            return Some((at, label));
        }
        pos = at + 1;
    }

    None
}
