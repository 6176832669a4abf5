// ==========================================
// 学位市场饱和度分析 - 代码规范化
// ==========================================
// 阶段 3: 学位路径（CIP）与职业代码（SOC）规范化
// 规则:
// - 先做语法规范化: CIP 补零为 "NN.NNNN"，SOC 转大写并补连字符 "NN-NNNN"
// - 查找表为空: 规范化后的代码直接通过
// - 查找表非空: 命中则映射为目标值；未命中归入 UNCLASSIFIED（不丢弃）
// ==========================================

use std::collections::BTreeMap;

/// 未能映射的代码统一归入该桶
pub const UNCLASSIFIED: &str = "unclassified";

/// 规范化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCode {
    pub code: String,
    pub unclassified: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CodeNormalizer {
    degree_lookup: BTreeMap<String, String>,
    occupation_lookup: BTreeMap<String, String>,
}

impl CodeNormalizer {
    pub fn new(
        degree_lookup: BTreeMap<String, String>,
        occupation_lookup: BTreeMap<String, String>,
    ) -> Self {
        Self {
            degree_lookup,
            occupation_lookup,
        }
    }

    pub fn normalize_degree(&self, raw: &str) -> NormalizedCode {
        let syntactic = normalize_cip(raw);
        apply_lookup(&self.degree_lookup, raw, syntactic)
    }

    pub fn normalize_occupation(&self, raw: &str) -> NormalizedCode {
        let syntactic = normalize_soc(raw);
        apply_lookup(&self.occupation_lookup, raw, syntactic)
    }
}

fn apply_lookup(lookup: &BTreeMap<String, String>, raw: &str, syntactic: String) -> NormalizedCode {
    if lookup.is_empty() {
        return NormalizedCode {
            code: syntactic,
            unclassified: false,
        };
    }

    match lookup
        .get(&syntactic)
        .or_else(|| lookup.get(strip_quoting(raw)))
    {
        Some(target) => NormalizedCode {
            code: target.clone(),
            unclassified: false,
        },
        None => NormalizedCode {
            code: UNCLASSIFIED.to_string(),
            unclassified: true,
        },
    }
}

/// 去除 Excel 导出的 ="..." 包裹与引号
fn strip_quoting(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches('=')
        .trim_matches('"')
        .trim()
}

/// CIP 语法规范化
///
/// "1.0101" → "01.0101"，"11.07" → "11.0700"，"11" → "11"；
/// 非数字标签（如 "ComputerScience"）原样保留（仅去空白）。
pub fn normalize_cip(raw: &str) -> String {
    let code = strip_quoting(raw);

    let (family, detail) = match code.split_once('.') {
        Some((family, detail)) => (family, Some(detail)),
        None => (code, None),
    };

    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let valid_family = !family.is_empty() && family.len() <= 2 && is_digits(family);
    let valid_detail = detail.map_or(true, |d| d.len() <= 4 && is_digits(d));

    if !valid_family || !valid_detail {
        return code.to_string();
    }

    match detail {
        Some(detail) => format!("{:0>2}.{:0<4}", family, detail),
        None => format!("{:0>2}", family),
    }
}

/// SOC 语法规范化
///
/// "15-1252" / "151252" / " 15-1252 " → "15-1252"；其他标签转大写保留。
pub fn normalize_soc(raw: &str) -> String {
    let code = strip_quoting(raw).to_uppercase();

    if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
        return format!("{}-{}", &code[..2], &code[2..]);
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cip_zero_pads() {
        assert_eq!(normalize_cip("1.0101"), "01.0101");
        assert_eq!(normalize_cip("11.07"), "11.0700");
        assert_eq!(normalize_cip(" 11.0101 "), "11.0101");
        assert_eq!(normalize_cip("=\"52.0201\""), "52.0201");
        assert_eq!(normalize_cip("9"), "09");
    }

    #[test]
    fn test_normalize_cip_keeps_labels() {
        assert_eq!(normalize_cip("ComputerScience"), "ComputerScience");
        assert_eq!(normalize_cip("11.01011"), "11.01011");
    }

    #[test]
    fn test_normalize_soc() {
        assert_eq!(normalize_soc("151252"), "15-1252");
        assert_eq!(normalize_soc(" 15-1252 "), "15-1252");
        assert_eq!(normalize_soc("swdev"), "SWDEV");
    }

    #[test]
    fn test_empty_lookup_passes_through() {
        let normalizer = CodeNormalizer::default();
        let result = normalizer.normalize_degree("1.0101");
        assert_eq!(result.code, "01.0101");
        assert!(!result.unclassified);
    }

    #[test]
    fn test_lookup_maps_and_buckets_unmapped() {
        let mut degrees = BTreeMap::new();
        degrees.insert("11.0701".to_string(), "ComputerScience".to_string());
        degrees.insert("Comp Sci".to_string(), "ComputerScience".to_string());
        let normalizer = CodeNormalizer::new(degrees, BTreeMap::new());

        assert_eq!(normalizer.normalize_degree("11.0701").code, "ComputerScience");
        assert_eq!(normalizer.normalize_degree("Comp Sci").code, "ComputerScience");

        let unmapped = normalizer.normalize_degree("50.0101");
        assert_eq!(unmapped.code, UNCLASSIFIED);
        assert!(unmapped.unclassified);
    }
}
