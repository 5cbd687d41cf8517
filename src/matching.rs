use crate::detected_points::{DescriptorLayout, Keypoint};

/// A cross-checked correspondence between keypoint `query_idx` of the first
/// frame and keypoint `train_idx` of the second one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

/// Returns the offending pair of layouts when the two sets cannot be compared.
pub fn check_layouts(
    query: &[Keypoint],
    train: &[Keypoint],
) -> Result<(), (DescriptorLayout, DescriptorLayout)> {
    let mut layouts = query.iter().chain(train).map(|k| k.descriptor.layout());
    if let Some(first) = layouts.next() {
        if let Some(other) = layouts.find(|l| *l != first) {
            return Err((first, other));
        }
    }
    Ok(())
}

/// Nearest neighbour of every `a` among `b`, first index wins on ties.
fn nearest(a: &[Keypoint], b: &[Keypoint]) -> Vec<Option<(usize, f32)>> {
    a.iter()
        .map(|ka| {
            b.iter()
                .enumerate()
                .filter_map(|(ib, kb)| ka.descriptor.distance(&kb.descriptor).map(|d| (ib, d)))
                .fold(None, |best: Option<(usize, f32)>, (ib, d)| match best {
                    Some((_, best_d)) if best_d <= d => best,
                    _ => Some((ib, d)),
                })
        })
        .collect()
}

/// Brute-force matching with cross check.
///
/// A pair is kept only when each keypoint is the other's nearest neighbour,
/// which rules out many-to-one matches. Matches are sorted by ascending
/// distance, equal distances keep query order.
pub fn cross_check_match(
    query: &[Keypoint],
    train: &[Keypoint],
) -> Result<Vec<Match>, (DescriptorLayout, DescriptorLayout)> {
    check_layouts(query, train)?;
    let forward = nearest(query, train);
    let backward = nearest(train, query);
    let mut matches: Vec<Match> = forward
        .into_iter()
        .enumerate()
        .filter_map(|(query_idx, best)| {
            let (train_idx, distance) = best?;
            let reverse = backward[train_idx].map(|(q, _)| q);
            (reverse == Some(query_idx)).then_some(Match {
                query_idx,
                train_idx,
                distance,
            })
        })
        .collect();
    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(matches)
}
