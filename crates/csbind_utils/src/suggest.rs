/// Pick the candidate closest to `target` by edit distance, if any is close
/// enough to be a plausible typo.
pub fn find_best_match<I, S>(target: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let threshold = if target.chars().count() < 4 { 1 } else { 3 };

    candidates
        .into_iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let distance = edit_distance(target, candidate);
            (distance <= threshold).then(|| (distance, candidate.to_string()))
        })
        .min_by(|(a, a_name), (b, b_name)| a.cmp(b).then_with(|| a_name.cmp(b_name)))
        .map(|(_, name)| name)
}

fn edit_distance(lhs: &str, rhs: &str) -> usize {
    let rhs: Vec<char> = rhs.chars().collect();
    let mut previous: Vec<usize> = (0..=rhs.len()).collect();
    let mut current = vec![0; rhs.len() + 1];

    for (i, left) in lhs.chars().enumerate() {
        current[0] = i + 1;
        for (j, right) in rhs.iter().enumerate() {
            let substitution = previous[j] + usize::from(left != *right);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[rhs.len()]
}
