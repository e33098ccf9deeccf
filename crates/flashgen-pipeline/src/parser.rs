//! Parse model output into flashcards.
//!
//! The model is asked for one `question|answer` per line but does not always
//! comply, so a numbered/`Q:`/`A:` layout is accepted as a fallback and,
//! failing that, the raw text becomes a single card.

use std::sync::LazyLock;

use regex::Regex;

use flashgen_models::Flashcard;

/// Question used for the catch-all card.
pub const CATCH_ALL_QUESTION: &str = "Generated Content";

static QUESTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:\d+\.|\*|-|q:|question:)\s*").unwrap());

static ANSWER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:a:|answer:)\s*").unwrap());

/// Parse a model reply. Never returns an empty list.
pub fn parse_flashcards(text: &str) -> Vec<Flashcard> {
    let cards = parse_pipe_lines(text);
    if !cards.is_empty() {
        return cards;
    }

    let cards = parse_labelled_lines(text);
    if !cards.is_empty() {
        return cards;
    }

    vec![Flashcard::new(CATCH_ALL_QUESTION, text)]
}

fn parse_pipe_lines(text: &str) -> Vec<Flashcard> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let idx = line.find('|')?;
            if idx == 0 || idx == line.len() - 1 {
                return None;
            }
            let question = line[..idx].trim();
            let answer = line[idx + 1..].trim();
            if question.is_empty() || answer.is_empty() {
                return None;
            }
            Some(Flashcard::new(question, answer))
        })
        .collect()
}

#[derive(Default)]
struct PendingCard {
    question: String,
    answer: String,
}

impl PendingCard {
    fn flush_into(&mut self, cards: &mut Vec<Flashcard>) {
        let pending = std::mem::take(self);
        let question = pending.question.trim();
        let answer = pending.answer.trim();
        if !question.is_empty() && !answer.is_empty() {
            cards.push(Flashcard::new(question, answer));
        }
    }
}

fn append(target: &mut String, line: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(line);
}

fn parse_labelled_lines(text: &str) -> Vec<Flashcard> {
    let mut cards = Vec::new();
    let mut current = PendingCard::default();

    // Prefixes only count at column 0; indented bullets continue the answer.
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        if let Some(m) = QUESTION_PREFIX.find(line) {
            current.flush_into(&mut cards);
            current.question = line[m.end()..].trim().to_string();
        } else if let Some(m) = ANSWER_PREFIX.find(line) {
            current.answer = line[m.end()..].trim().to_string();
        } else if !current.answer.is_empty() {
            append(&mut current.answer, line.trim());
        } else if !current.question.is_empty() {
            append(&mut current.question, line.trim());
        }
    }
    current.flush_into(&mut cards);

    cards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_format() {
        let text = "What is ATP?|The energy currency of the cell\n\n  Who wrote Hamlet? | Shakespeare  \n";
        let cards = parse_flashcards(text);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].question, "What is ATP?");
        assert_eq!(cards[0].answer, "The energy currency of the cell");
        assert_eq!(cards[1].question, "Who wrote Hamlet?");
        assert_eq!(cards[1].answer, "Shakespeare");
    }

    #[test]
    fn test_pipe_splits_at_first_pipe_only() {
        let cards = parse_flashcards("What is |x|?|absolute value");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "What is");
        assert_eq!(cards[0].answer, "x|?|absolute value");
    }

    #[test]
    fn test_pipe_lines_with_empty_sides_are_skipped() {
        let text = "|no question\nno answer|\n  |  \nReal question|Real answer";
        let cards = parse_flashcards(text);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "Real question");
    }

    #[test]
    fn test_math_survives_pipe_parse() {
        let cards = parse_flashcards(r"Pythagorean theorem? [00:42]|\( a^2+b^2=c^2 \)");
        assert_eq!(cards[0].question, "Pythagorean theorem? [00:42]");
        assert_eq!(cards[0].answer, r"\( a^2+b^2=c^2 \)");
    }

    #[test]
    fn test_numbered_fallback() {
        let text = "1. What is the capital of France?\nA: Paris\n2. What is 2+2?\nAnswer: 4";
        let cards = parse_flashcards(text);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].question, "What is the capital of France?");
        assert_eq!(cards[0].answer, "Paris");
        assert_eq!(cards[1].question, "What is 2+2?");
        assert_eq!(cards[1].answer, "4");
    }

    #[test]
    fn test_q_a_fallback_with_continuations() {
        let text = "Q: What does DNA\nstand for?\nA: Deoxyribonucleic\nacid\nq: Unanswered question\nquestion: Boiling point of water?\nanswer: 100 C";
        let cards = parse_flashcards(text);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].question, "What does DNA stand for?");
        assert_eq!(cards[0].answer, "Deoxyribonucleic acid");
        assert_eq!(cards[1].question, "Boiling point of water?");
        assert_eq!(cards[1].answer, "100 C");
    }

    #[test]
    fn test_bullet_fallback() {
        let text = "* Speed of light\nA: 299,792 km/s\n- Planck constant\nA: 6.626e-34 J s";
        let cards = parse_flashcards(text);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].question, "Planck constant");
    }

    #[test]
    fn test_indented_bullets_continue_answer() {
        let text = "Q: What are the phases of mitosis?\nA: There are four:\n  - Prophase\n  - Metaphase\nQ: What is ATP?\nA: Energy currency";
        let cards = parse_flashcards(text);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].question, "What are the phases of mitosis?");
        assert_eq!(cards[0].answer, "There are four: - Prophase - Metaphase");
        assert_eq!(cards[1].question, "What is ATP?");
        assert_eq!(cards[1].answer, "Energy currency");
    }

    #[test]
    fn test_catch_all() {
        let text = "The model wrote a paragraph instead of cards.";
        let cards = parse_flashcards(text);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, CATCH_ALL_QUESTION);
        assert_eq!(cards[0].answer, text);
    }
}
