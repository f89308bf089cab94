//! `(-want +got)` rendering for ordered string lists.

/// `None` when the sequences are equal element for element; otherwise a
/// line-oriented report where `-` lines are only in `want` and `+` lines only
/// in `got`. Alignment follows the longest common subsequence so a single
/// inserted address does not mark everything after it as changed.
pub fn render_diff(want: &[String], got: &[String]) -> Option<String> {
    if want == got {
        return None;
    }

    let n = want.len();
    let m = got.len();
    // lcs[i][j] = LCS length of want[i..] and got[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if want[i] == got[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut out = String::from("  []string{\n");
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        if i < n && j < m && want[i] == got[j] {
            out.push_str(&format!("    {:?},\n", want[i]));
            i += 1;
            j += 1;
        } else if i < n && (j == m || lcs[i + 1][j] >= lcs[i][j + 1]) {
            out.push_str(&format!("-   {:?},\n", want[i]));
            i += 1;
        } else {
            out.push_str(&format!("+   {:?},\n", got[j]));
            j += 1;
        }
    }
    out.push_str("  }\n");
    Some(out)
}
