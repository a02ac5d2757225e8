// Delimited text parser for the predictions feed
use crate::domain::record::Record;
use std::sync::Arc;

const SEPARATOR: char = ',';
const QUOTE: char = '"';

/// Parse a header-led table into records, one per data line.
///
/// Quotes toggle quoted mode and are stripped; inside a quoted field a doubled
/// quote stands for a literal one. Cells are trimmed. Short lines are padded
/// with empty strings and surplus cells are ignored.
pub fn parse(text: &str) -> Vec<Record> {
    let mut lines = text.trim_start_matches('\u{feff}').trim().lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };

    let headers: Arc<[String]> = split_line(header_line).into();
    lines
        .map(|line| Record::new(headers.clone(), split_line(line)))
        .collect()
}

fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            QUOTE if in_quotes && chars.peek() == Some(&QUOTE) => {
                current.push(QUOTE);
                chars.next();
            }
            QUOTE => in_quotes = !in_quotes,
            SEPARATOR if !in_quotes => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    cells.push(current.trim().to_string());

    cells
}
