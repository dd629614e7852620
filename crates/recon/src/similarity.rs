//! Ratcliff/Obershelp string similarity.
//!
//! Recursive longest-common-substring ratio. Downstream thresholds are
//! calibrated against this exact algorithm; do not substitute Levenshtein
//! or Jaccard.

/// Similarity ratio in `[0, 1]`. 1.0 only for identical strings, 0.0 when
/// the strings share no substring.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let matched = matching_total(&a_chars, &b_chars);
    2.0 * matched as f64 / (a_chars.len() + b_chars.len()) as f64
}

/// Total matched length over the recursive common-substring decomposition:
/// the longest common run, plus whatever matches in the left and right
/// remainders on both sides.
fn matching_total(a: &[char], b: &[char]) -> usize {
    let (len, a_start, b_start) = longest_common_run(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_total(&a[..a_start], &b[..b_start])
        + matching_total(&a[a_start + len..], &b[b_start + len..])
}

/// Longest common contiguous run via two-row DP.
/// Ties resolve to the earliest position in `a`, then in `b`.
fn longest_common_run(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let m = a.len();
    let n = b.len();
    if m == 0 || n == 0 {
        return (0, 0, 0);
    }

    let mut prev = vec![0usize; n + 1];
    let mut curr = vec![0usize; n + 1];
    let mut best = (0usize, 0usize, 0usize);

    for i in 1..=m {
        curr[0] = 0;
        for j in 1..=n {
            if a[i - 1] == b[j - 1] {
                curr[j] = prev[j - 1] + 1;
                if curr[j] > best.0 {
                    best = (curr[j], i - curr[j], j - curr[j]);
                }
            } else {
                curr[j] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}
