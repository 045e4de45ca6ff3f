use std::collections::HashMap;

use crate::error::{Error, Result};

/// 正規化時にゼロ除算を避けるため標準偏差へ加える値
pub const EPSILON: f64 = 1e-8;

/// 入力座標 (t, x, y, z) の統計量のキー
pub const COORDS_KEY: &str = "coords";
/// 出力 (u, v, w, p) の統計量のキー
pub const TARGETS_KEY: &str = "targets";

/// 1種類のデータについての列ごとの平均と標準偏差。
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl FeatureStats {
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> Result<Self> {
        if mean.len() != std.len() {
            return Err(Error::DimensionMismatch {
                expected: mean.len(),
                actual: std.len(),
            });
        }
        Ok(Self { mean, std })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }
}

/// キーごとの正規化パラメータ表。
///
/// チェックポイントから一度だけ読み込まれ、推論中に変更されることはありません。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationStats {
    entries: HashMap<String, FeatureStats>,
}

impl NormalizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, stats: FeatureStats) {
        self.entries.insert(key.into(), stats);
    }

    pub fn get(&self, key: &str) -> Result<&FeatureStats> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::UnknownStatsKey(key.to_string()))
    }

    /// キーを辞書順に並べて返します。保存時の並びを安定させるためのものです。
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureStats)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 列ごとに `(data - mean) / (std + ε)` を計算します。
    pub fn normalize<const D: usize>(&self, data: &[[f64; D]], key: &str) -> Result<Vec<[f64; D]>> {
        let stats = self.lookup::<D>(key)?;
        Ok(data
            .iter()
            .map(|row| std::array::from_fn(|j| (row[j] - stats.mean[j]) / (stats.std[j] + EPSILON)))
            .collect())
    }

    /// 列ごとに `data * std + mean` を計算します。
    ///
    /// ε は加えないため、分散がほぼ 0 の列では `normalize` の厳密な逆変換にはなりません。
    pub fn denormalize<const D: usize>(&self, data: &[[f64; D]], key: &str) -> Result<Vec<[f64; D]>> {
        let stats = self.lookup::<D>(key)?;
        Ok(data
            .iter()
            .map(|row| std::array::from_fn(|j| row[j] * stats.std[j] + stats.mean[j]))
            .collect())
    }

    fn lookup<const D: usize>(&self, key: &str) -> Result<&FeatureStats> {
        let stats = self.get(key)?;
        if stats.dim() != D {
            return Err(Error::DimensionMismatch {
                expected: D,
                actual: stats.dim(),
            });
        }
        Ok(stats)
    }
}
