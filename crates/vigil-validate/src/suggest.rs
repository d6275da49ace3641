//! Nearest-match suggestions for unknown names.
//!
//! Every "did you mean" in an issue message comes through here so ranking is
//! uniform: bounded edit distance, ties broken lexicographically, fully
//! deterministic for a given candidate set.

/// Maximum edit distance a suggestion may be from the unknown name.
const MAX_DISTANCE: usize = 2;

/// The closest known name to `unknown`, if any is within the distance bound.
///
/// Comparison is case-insensitive; the returned string keeps the candidate's
/// original casing.
pub fn nearest<'a, I>(unknown: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let unknown_lower = unknown.to_ascii_lowercase();
    let mut best: Option<(usize, &str)> = None;
    for candidate in candidates {
        let distance = levenshtein(&unknown_lower, &candidate.to_ascii_lowercase());
        if distance > MAX_DISTANCE {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_distance, best_name)) => {
                distance < best_distance || (distance == best_distance && candidate < best_name)
            }
        };
        if better {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, name)| name.to_string())
}

/// Classic two-row Levenshtein distance.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{levenshtein, nearest};

    #[rstest]
    #[case("", "", 0)]
    #[case("on", "on", 0)]
    #[case("on", "off", 2)]
    #[case("open", "opne", 2)]
    #[case("brightness", "brightnes", 1)]
    fn distances(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
        assert_eq!(levenshtein(a, b), expected);
    }

    #[test]
    fn nearest_within_bound() {
        let candidates = ["open", "closed", "opening"];
        assert_eq!(
            nearest("opne", candidates.iter().copied()),
            Some("open".to_string())
        );
    }

    #[test]
    fn nearest_respects_the_bound() {
        let candidates = ["heat", "cool"];
        assert_eq!(nearest("completely_different", candidates.iter().copied()), None);
    }

    #[test]
    fn ties_break_lexicographically() {
        // Both at distance 1 from "od".
        let candidates = ["on", "of"];
        assert_eq!(nearest("od", candidates.iter().copied()), Some("of".to_string()));
    }

    #[test]
    fn case_insensitive_match_keeps_original_casing() {
        let candidates = ["Open"];
        assert_eq!(nearest("open", candidates.iter().copied()), Some("Open".to_string()));
    }
}
