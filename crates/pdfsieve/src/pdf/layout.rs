//! Character geometry from pdfium, grouped into words and lines.
//!
//! Shared by the layout-aware text provider and the table detector. All
//! coordinates are converted to a top-left origin so that sorting by `top`
//! follows reading order.

use super::error::{PdfError, Result};
use pdfium_render::prelude::*;

/// Characters further apart than this (in PDF points) start a new word.
const WORD_SPACING_THRESHOLD: f32 = 3.0;

/// Fraction of the smaller word height two words may differ by vertically
/// and still share a line.
const LINE_TOLERANCE_RATIO: f32 = 0.5;

#[derive(Debug, Clone)]
struct CharInfo {
    text: char,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// A run of adjacent characters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Word {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Word {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    fn center_y(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

/// Words sharing a baseline, sorted left to right.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Line {
    pub words: Vec<Word>,
    pub top: f32,
    pub height: f32,
}

impl Line {
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Extract the words of one pdfium page.
pub(crate) fn page_words(page: &PdfPage) -> Result<Vec<Word>> {
    let page_height = page.height().value;
    let page_text = page
        .text()
        .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get page text: {}", e)))?;

    let mut chars = Vec::new();
    for pdf_char in page_text.chars().iter() {
        let Some(ch) = pdf_char.unicode_char() else {
            continue;
        };
        let bounds = pdf_char
            .loose_bounds()
            .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get char bounds: {}", e)))?;

        chars.push(CharInfo {
            text: ch,
            x: bounds.left().value,
            y: bounds.bottom().value,
            width: bounds.width().value,
            height: bounds.height().value,
        });
    }

    Ok(group_chars_into_words(&chars, page_height))
}

fn group_chars_into_words(chars: &[CharInfo], page_height: f32) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Vec<&CharInfo> = Vec::new();

    for char_info in chars {
        if char_info.text.is_whitespace() || char_info.text.is_control() {
            if let Some(word) = finalize_word(&current, page_height) {
                words.push(word);
            }
            current.clear();
            continue;
        }

        if should_start_new_word(&current, char_info)
            && let Some(word) = finalize_word(&current, page_height)
        {
            words.push(word);
            current.clear();
        }

        current.push(char_info);
    }

    if let Some(word) = finalize_word(&current, page_height) {
        words.push(word);
    }

    words
}

fn should_start_new_word(current: &[&CharInfo], new_char: &CharInfo) -> bool {
    let Some(last_char) = current.last() else {
        return false;
    };

    let vertical_distance = (new_char.y - last_char.y).abs();
    if vertical_distance > last_char.height * 0.5 {
        return true;
    }

    let horizontal_gap = new_char.x - (last_char.x + last_char.width);
    horizontal_gap > WORD_SPACING_THRESHOLD
}

fn finalize_word(chars: &[&CharInfo], page_height: f32) -> Option<Word> {
    if chars.is_empty() {
        return None;
    }

    let text: String = chars.iter().map(|c| c.text).collect();
    let left = chars.iter().map(|c| c.x).fold(f32::INFINITY, f32::min);
    let right = chars.iter().map(|c| c.x + c.width).fold(f32::NEG_INFINITY, f32::max);
    let bottom = chars.iter().map(|c| c.y).fold(f32::INFINITY, f32::min);
    let top = chars.iter().map(|c| c.y + c.height).fold(f32::NEG_INFINITY, f32::max);

    Some(Word {
        text,
        left,
        top: page_height - top,
        width: (right - left).max(0.0),
        height: (top - bottom).max(0.0),
    })
}

/// Group words into lines, top to bottom.
pub(crate) fn group_words_into_lines(mut words: Vec<Word>) -> Vec<Line> {
    words.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left)));

    let mut lines: Vec<Line> = Vec::new();
    for word in words {
        let joins_last = lines.last().is_some_and(|line| {
            let reference = line.words.iter().map(|w| w.height).fold(f32::INFINITY, f32::min);
            let tolerance = reference.min(word.height).max(1.0) * LINE_TOLERANCE_RATIO;
            let line_center = line.top + line.height / 2.0;
            (word.center_y() - line_center).abs() <= tolerance
        });

        match lines.last_mut() {
            Some(line) if joins_last => {
                let bottom = line.bottom().max(word.top + word.height);
                line.top = line.top.min(word.top);
                line.height = bottom - line.top;
                line.words.push(word);
            }
            _ => lines.push(Line {
                top: word.top,
                height: word.height,
                words: vec![word],
            }),
        }
    }

    for line in &mut lines {
        line.words.sort_by(|a, b| a.left.total_cmp(&b.left));
    }

    lines
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Word;

    pub fn word(text: &str, left: f32, top: f32, width: f32) -> Word {
        Word {
            text: text.to_string(),
            left,
            top,
            width,
            height: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::word;
    use super::*;

    fn chars(text: &str, start_x: f32, y: f32) -> Vec<CharInfo> {
        text.chars()
            .enumerate()
            .map(|(i, c)| CharInfo {
                text: c,
                x: start_x + i as f32 * 6.0,
                y,
                width: 5.0,
                height: 10.0,
            })
            .collect()
    }

    #[test]
    fn test_whitespace_splits_words() {
        let words = group_chars_into_words(&chars("ab cd", 10.0, 700.0), 800.0);
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", "cd"]);
    }

    #[test]
    fn test_horizontal_gap_splits_words() {
        let mut input = chars("ab", 10.0, 700.0);
        input.extend(chars("cd", 60.0, 700.0));
        let words = group_chars_into_words(&input, 800.0);
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].text, "cd");
        assert_eq!(words[1].left, 60.0);
    }

    #[test]
    fn test_word_coordinates_flip_to_top_origin() {
        let words = group_chars_into_words(&chars("x", 10.0, 700.0), 800.0);
        assert_eq!(words[0].top, 90.0);
        assert_eq!(words[0].height, 10.0);
    }

    #[test]
    fn test_group_words_into_lines_orders_by_position() {
        let words = vec![
            word("second", 10.0, 40.0, 30.0),
            word("world", 60.0, 11.0, 25.0),
            word("hello", 10.0, 10.0, 25.0),
        ];

        let lines = group_words_into_lines(words);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "hello world");
        assert_eq!(lines[1].text(), "second");
    }
}
