//! Match resolution (spec §4.7): dedup candidate chart completions by span
//! containment, then (for `findall`) pick the maximum-coverage
//! non-overlapping subset via weighted interval scheduling.

use crate::chart::ChartNode;
use crate::span::Span;

/// Lexicographic tie-break key: a node's own production rank, then its
/// children's keys in order — the "parse rank tuple" spec §4.7 sorts
/// identical-span ambiguities by.
fn rank_path(node: &ChartNode) -> Vec<usize> {
    match node {
        ChartNode::Node { rank, children, .. } => {
            let mut path = vec![*rank];
            for child in children {
                path.extend(rank_path(child));
            }
            path
        }
        _ => Vec::new(),
    }
}

/// Remove every candidate fully contained within another candidate's span,
/// widest (by token count) first; identical spans are broken by parse rank
/// so the surviving candidate is deterministic.
pub fn dedup_by_containment(mut candidates: Vec<ChartNode>) -> Vec<ChartNode> {
    candidates.sort_by(|a, b| {
        let len_a = a.tokens().len();
        let len_b = b.tokens().len();
        len_b.cmp(&len_a).then_with(|| rank_path(a).cmp(&rank_path(b)))
    });

    let mut kept: Vec<ChartNode> = Vec::new();
    for candidate in candidates {
        let span = candidate.span();
        let contained = kept.iter().any(|k| k.span().contains(&span));
        if !contained {
            kept.push(candidate);
        }
    }
    kept
}

/// Select the maximum-coverage non-overlapping subset of `candidates`
/// (weight = span length) via the standard weighted interval scheduling DP,
/// tracing the chosen set back in reverse (spec §4.7).
pub fn max_coverage(candidates: Vec<ChartNode>) -> Vec<ChartNode> {
    let mut items = candidates;
    items.sort_by_key(|c| c.span().stop);
    let n = items.len();
    if n == 0 {
        return Vec::new();
    }

    let spans: Vec<Span> = items.iter().map(|c| c.span()).collect();
    let weight = |i: usize| spans[i].len();

    // p[i] = 1-based index of the last item whose span ends at or before
    // spans[i]'s start, or 0 if none (so `best[p[i]]` is always in range).
    let mut p = vec![0usize; n];
    for i in 0..n {
        for j in (0..i).rev() {
            if spans[j].stop <= spans[i].start {
                p[i] = j + 1;
                break;
            }
        }
    }

    let mut best = vec![0usize; n + 1];
    for i in 1..=n {
        let include = weight(i - 1) + best[p[i - 1]];
        best[i] = include.max(best[i - 1]);
    }

    let mut chosen = Vec::new();
    let mut i = n;
    while i > 0 {
        let include = weight(i - 1) + best[p[i - 1]];
        if include == best[i] {
            chosen.push(i - 1);
            i = p[i - 1];
        } else {
            i -= 1;
        }
    }
    chosen.reverse();
    chosen.into_iter().map(|idx| items[idx].clone()).collect()
}

/// Full resolution for `findall`: containment dedup, then maximum-coverage
/// selection over what survives.
pub fn resolve_findall(candidates: Vec<ChartNode>) -> Vec<ChartNode> {
    max_coverage(dedup_by_containment(candidates))
}

/// Resolution for `extract`/single-best callers: containment dedup only,
/// spec §4.7's base algorithm without the findall-only coverage pass.
pub fn resolve_extract(candidates: Vec<ChartNode>) -> Vec<ChartNode> {
    dedup_by_containment(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::eq;
    use crate::span::Span;
    use crate::token::{Token, TokenType};

    fn leaf(value: &str, start: usize, stop: usize) -> ChartNode {
        ChartNode::Leaf { predicate: eq(value), token: Token::new(value, Span::new(start, stop), TokenType::RussianWord) }
    }

    fn node(rank: usize, children: Vec<ChartNode>) -> ChartNode {
        ChartNode::Node { rule: crate::bnf::BnfRuleId(0), production: 0, rank, children }
    }

    #[test]
    fn containment_dedup_keeps_the_wider_match() {
        let wide = node(0, vec![leaf("владимир", 0, 8), leaf("путин", 9, 14)]);
        let narrow = node(0, vec![leaf("владимир", 0, 8)]);
        let kept = dedup_by_containment(vec![narrow, wide.clone()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].span(), wide.span());
    }

    #[test]
    fn max_coverage_prefers_the_higher_total_span_length() {
        // Two overlapping two-token spans and a disjoint one-token span:
        // keeping the disjoint pair beats keeping only the longer overlap.
        let a = node(0, vec![leaf("a", 0, 1), leaf("b", 1, 2)]);
        let b = node(0, vec![leaf("b", 1, 2), leaf("c", 2, 3)]);
        let c = node(0, vec![leaf("c", 2, 3)]);
        let chosen = max_coverage(vec![a.clone(), b, c]);
        let total: usize = chosen.iter().map(|n| n.span().len()).sum();
        assert!(total >= a.span().len());
    }

    #[test]
    fn disjoint_matches_are_all_kept() {
        let a = node(0, vec![leaf("владимир", 0, 8)]);
        let b = node(0, vec![leaf("путин", 9, 14)]);
        let chosen = resolve_findall(vec![a, b]);
        assert_eq!(chosen.len(), 2);
    }
}
