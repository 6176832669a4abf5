// ==========================================
// 学位市场饱和度分析 - 职业权重向量相似度
// ==========================================
// 向量: 学位在对照表中的 occupation → weight（稀疏，按职业代码对齐）
// ==========================================

use std::collections::BTreeMap;

/// 稀疏向量余弦相似度
///
/// 任一向量为空或范数为 0 时返回 None（相似度无定义）。
pub fn cosine_similarity(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    // 只有共同职业贡献点积
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(code, x)| large.get(code).map(|y| x * y))
        .sum();

    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|y| y * y).sum::<f64>().sqrt();
    let denom = norm_a * norm_b;
    if denom <= f64::EPSILON {
        return None;
    }
    Some(dot / denom)
}
