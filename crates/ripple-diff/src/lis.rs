//! Longest strictly increasing subsequence.
//!
//! Items whose old indices form the LIS (taken in new order) keep their
//! relative order, so everything else is the minimal set of moves.
//!
//! When several maximal subsequences exist, the one whose positions are
//! lexicographically smallest wins: items that appear earlier in the new
//! sequence prefer to stay put. For `[0, 2, 1]` that keeps `0, 2` and moves
//! `1`.

/// Marks the positions of `values` that belong to the chosen LIS.
///
/// `values` must be pairwise distinct. Runs in `O(n log n)`.
pub fn increasing_subsequence(values: &[usize]) -> Vec<bool> {
    let n = values.len();

    // run[i]: length of the longest increasing subsequence starting at i.
    let mut run = vec![0usize; n];
    // tails[k]: largest value to the right of the cursor that starts an
    // increasing subsequence of length k + 1. Strictly decreasing in k.
    let mut tails: Vec<usize> = Vec::new();

    for i in (0..n).rev() {
        let x = values[i];
        let k = tails.partition_point(|&t| t > x);
        run[i] = k + 1;
        if k == tails.len() {
            tails.push(x);
        } else {
            tails[k] = x;
        }
    }

    let mut keep = vec![false; n];
    let mut need = tails.len();
    let mut last: Option<usize> = None;
    for i in 0..n {
        if need == 0 {
            break;
        }
        if run[i] == need && last.map_or(true, |l| values[i] > l) {
            keep[i] = true;
            last = Some(values[i]);
            need -= 1;
        }
    }
    keep
}

/// Length of the longest strictly increasing subsequence.
pub fn increasing_subsequence_len(values: &[usize]) -> usize {
    let mut tails: Vec<usize> = Vec::new();
    for &x in values {
        let k = tails.partition_point(|&t| t < x);
        if k == tails.len() {
            tails.push(x);
        } else {
            tails[k] = x;
        }
    }
    tails.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept(values: &[usize]) -> Vec<usize> {
        increasing_subsequence(values)
            .iter()
            .zip(values)
            .filter_map(|(&k, &v)| k.then_some(v))
            .collect()
    }

    #[test]
    fn empty_input() {
        assert!(increasing_subsequence(&[]).is_empty());
        assert_eq!(increasing_subsequence_len(&[]), 0);
    }

    #[test]
    fn already_sorted_keeps_everything() {
        assert_eq!(kept(&[0, 1, 2, 3]), vec![0, 1, 2, 3]);
    }

    #[test]
    fn reversed_keeps_first() {
        assert_eq!(kept(&[3, 2, 1, 0]), vec![3]);
    }

    #[test]
    fn tie_prefers_earlier_positions() {
        assert_eq!(kept(&[0, 2, 1]), vec![0, 2]);
        assert_eq!(kept(&[1, 0]), vec![1]);
    }

    #[test]
    fn classic_example() {
        let values = [3, 1, 8, 2, 5, 9, 4, 0, 7, 6];
        let picked = kept(&values);
        assert_eq!(picked.len(), 4);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(picked.len(), increasing_subsequence_len(&values));
    }

    #[test]
    fn single_swap_in_the_middle() {
        // [a b d c e]: one of c/d must move.
        assert_eq!(kept(&[0, 1, 3, 2, 4]), vec![0, 1, 3, 4]);
    }
}
