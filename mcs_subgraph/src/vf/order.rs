//! Query vertex ordering for the depth-first search.

use mcs_common::Graph;

/// Orders query vertices so each one (after the first of its component) is
/// adjacent to as many already-ordered vertices as possible.
///
/// Ties go to the higher degree, then to the vertex with the fewest
/// compatible target vertices (rarest first), then to the lower index.
pub(crate) fn rarest_first_order(
    query: &Graph,
    target: &Graph,
    compatible: impl Fn(usize, usize) -> bool,
) -> Vec<usize> {
    let n = query.vertex_count();
    let rarity: Vec<usize> = (0..n)
        .map(|q| {
            (0..target.vertex_count())
                .filter(|&t| compatible(q, t))
                .count()
        })
        .collect();

    let mut ordered = Vec::with_capacity(n);
    let mut placed = vec![false; n];
    let mut links = vec![0usize; n];

    while ordered.len() < n {
        let Some(next) = (0..n).filter(|&v| !placed[v]).min_by(|&a, &b| {
            links[b]
                .cmp(&links[a])
                .then_with(|| query.degree(b).cmp(&query.degree(a)))
                .then_with(|| rarity[a].cmp(&rarity[b]))
                .then_with(|| a.cmp(&b))
        }) else {
            break;
        };
        placed[next] = true;
        ordered.push(next);
        for neighbor in query.neighbors(next) {
            links[neighbor] += 1;
        }
    }

    ordered
}
