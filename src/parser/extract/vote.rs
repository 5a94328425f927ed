use crate::model::VoteResult;
use crate::parser::text::normalize_whitespace;

/// Parse a free-text tally such as "Ja:5, Nein:2, Enthaltungen:1".
///
/// Unknown labels are ignored and unparsable counts read as 0; this never fails.
pub fn parse_vote(text: &str) -> VoteResult {
    let mut result = VoteResult::default();

    for segment in normalize_whitespace(text).split(", ") {
        let mut parts = segment.split(':');
        let label = normalize_whitespace(parts.next().unwrap_or_default());
        let count = parts
            .next()
            .and_then(|n| normalize_whitespace(n).parse::<u32>().ok())
            .unwrap_or(0);

        match label.as_str() {
            "Ja" => result.pro = count,
            "Nein" => result.contra = count,
            "Enthaltungen" => result.abstention = count,
            "Befangen" => result.prejudiced = count,
            _ => {}
        }
    }

    result
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_tally() {
        assert_eq!(
            parse_vote("Ja:5, Nein:2, Enthaltungen:1"),
            VoteResult { pro: 5, contra: 2, abstention: 1, prejudiced: 0 }
        );
        assert_eq!(
            parse_vote("\u{a0}Ja: 30, Nein: 0, Enthaltungen: 2, Befangen: 1 "),
            VoteResult { pro: 30, contra: 0, abstention: 2, prejudiced: 1 }
        );
    }

    #[test]
    fn bad_counts_default_to_zero() {
        assert_eq!(parse_vote("Ja:abc"), VoteResult::default());
        assert_eq!(parse_vote("Ja:-3, Nein:4").contra, 4);
        assert_eq!(parse_vote("Ja"), VoteResult::default());
    }

    #[test]
    fn unknown_labels_are_ignored() {
        assert_eq!(
            parse_vote("einstimmig:1, Ja:7"),
            VoteResult { pro: 7, ..Default::default() }
        );
        assert_eq!(parse_vote(""), VoteResult::default());
    }
}
