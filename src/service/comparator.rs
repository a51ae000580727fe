use crate::models::Severity;

/// 数值比较结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberComparison {
    pub difference: f64,
    /// 保留两位小数
    pub difference_percent: f64,
    /// 基于未取整的百分比判断
    pub within_tolerance: bool,
}

impl NumberComparison {
    pub fn severity(&self) -> Severity {
        Severity::from_difference_percent(self.difference_percent)
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// 文本相似度 (0-1)，忽略大小写与首尾空白；任一侧缺失为 0
pub fn string_similarity(a: Option<&str>, b: Option<&str>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    gestalt_ratio(&a, &b)
}

/// 2*M / (|a|+|b|)，M 为递归最长公共子串的总长度
fn gestalt_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(a, b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// a[alo..ahi] 与 b[blo..bhi] 的最长公共子串，同长度取最靠前者
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run[j] = 以 a[i-1], b[j-1] 结尾的公共子串长度
    let mut prev = vec![0usize; bhi - blo + 1];
    let mut curr = vec![0usize; bhi - blo + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let k = j - blo + 1;
            curr[k] = if a[i] == b[j] { prev[k - 1] + 1 } else { 0 };
            if curr[k] > best_size {
                best_size = curr[k];
                best_i = i + 1 - best_size;
                best_j = j + 1 - best_size;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best_i, best_j, best_size)
}

/// 数值容差比较: |a-b| / max(|a|,|b|) * 100；任一侧缺失返回 None
pub fn number_tolerance(a: Option<f64>, b: Option<f64>, tolerance_percent: f64) -> Option<NumberComparison> {
    let (a, b) = (a?, b?);
    let difference = (a - b).abs();
    let base = a.abs().max(b.abs());

    let percent = if base == 0.0 {
        0.0
    } else {
        difference * 100.0 / base
    };

    Some(NumberComparison {
        difference,
        difference_percent: round_to(percent, 2),
        within_tolerance: percent <= tolerance_percent,
    })
}

/// 按差异百分比分档
pub fn severity_of(difference_percent: f64) -> Severity {
    Severity::from_difference_percent(difference_percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_are_perfect() {
        assert_eq!(string_similarity(Some("Summer Sale"), Some("Summer Sale")), 1.0);
        assert_eq!(string_similarity(Some("  SUMMER sale "), Some("summer SALE")), 1.0);
        assert_eq!(string_similarity(Some(""), Some("")), 1.0);
    }

    #[test]
    fn missing_side_never_matches() {
        assert_eq!(string_similarity(None, Some("x")), 0.0);
        assert_eq!(string_similarity(Some("x"), None), 0.0);
        assert_eq!(string_similarity(None, None), 0.0);
    }

    #[test]
    fn gestalt_ratio_matches_known_values() {
        // "abcd" vs "bcde": 公共子串 "bcd" -> 2*3/8
        assert!((string_similarity(Some("abcd"), Some("bcde")) - 0.75).abs() < 1e-12);
        // 无公共字符
        assert_eq!(string_similarity(Some("abc"), Some("xyz")), 0.0);
        // "Summer Sale" vs "Summer Sales": 2*11/23
        let s = string_similarity(Some("Summer Sale"), Some("Summer Sales"));
        assert!((s - 22.0 / 23.0).abs() < 1e-12);
    }

    #[test]
    fn gestalt_recurses_on_both_sides_of_the_longest_block() {
        // "xaby" vs "zabw": 块 "ab" 左右两侧都无匹配 -> 2*2/8
        assert!((string_similarity(Some("xaby"), Some("zabw")) - 0.5).abs() < 1e-12);
        // "abxcd" vs "abycd": "ab" + "cd" -> 2*4/10
        assert!((string_similarity(Some("abxcd"), Some("abycd")) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn tolerance_is_symmetric() {
        let pairs = [(1_000_000.0, 950_000.0), (0.0, 12.0), (-5.0, 5.0), (3.3, 3.3)];
        for (a, b) in pairs {
            assert_eq!(
                number_tolerance(Some(a), Some(b), 5.0),
                number_tolerance(Some(b), Some(a), 5.0)
            );
        }
    }

    #[test]
    fn zero_handling() {
        let both = number_tolerance(Some(0.0), Some(0.0), 0.0).unwrap();
        assert_eq!(both.difference_percent, 0.0);
        assert!(both.within_tolerance);

        let one = number_tolerance(Some(0.0), Some(250.0), 5.0).unwrap();
        assert_eq!(one.difference_percent, 100.0);
        assert!(!one.within_tolerance);
        assert_eq!(one.severity(), Severity::Critical);
    }

    #[test]
    fn missing_numbers_are_not_compared() {
        assert_eq!(number_tolerance(None, Some(1.0), 5.0), None);
        assert_eq!(number_tolerance(Some(1.0), None, 5.0), None);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let exact = number_tolerance(Some(1_000_000.0), Some(950_000.0), 5.0).unwrap();
        assert_eq!(exact.difference, 50_000.0);
        assert_eq!(exact.difference_percent, 5.0);
        assert!(exact.within_tolerance);

        let over = number_tolerance(Some(1_000_000.0), Some(947_000.0), 5.0).unwrap();
        assert_eq!(over.difference_percent, 5.3);
        assert!(!over.within_tolerance);
        assert_eq!(over.severity(), Severity::High);

        let under = number_tolerance(Some(1_000_000.0), Some(950_500.0), 5.0).unwrap();
        assert_eq!(under.difference_percent, 4.95);
        assert!(under.within_tolerance);
    }

    #[test]
    fn severity_of_delegates_to_bands() {
        assert_eq!(severity_of(1.0), Severity::Medium);
        assert_eq!(severity_of(5.0), Severity::High);
        assert_eq!(severity_of(10.0), Severity::Critical);
    }
}
