//! 学習済みモデルの重みと正規化パラメータを1つのファイルにまとめて保存・読み込みします。

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Record, Recorder};
use log::info;

use crate::error::{Error, Result};
use crate::model::{INPUT_DIM, Model, ModelRecord, OUTPUT_DIM, check_record};
use crate::normalize::{COORDS_KEY, FeatureStats, NormalizationStats, TARGETS_KEY};

/// チェックポイントファイルの拡張子
pub const CHECKPOINT_EXTENSION: &str = "mpk";

/// ファイルに書き出されるレコード。
///
/// 正規化パラメータの表はキー・平均・標準偏差の並列な配列として保持します。
#[derive(Record)]
pub struct CheckpointRecord<B: Backend> {
    pub model: ModelRecord<B>,
    pub norm_keys: Vec<String>,
    pub norm_means: Vec<Vec<f64>>,
    pub norm_stds: Vec<Vec<f64>>,
}

/// 読み込んだモデルと正規化パラメータ。
#[derive(Debug)]
pub struct Checkpoint<B: Backend> {
    pub model: Model<B>,
    pub stats: NormalizationStats,
}

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

/// レコーダが実際に読み書きするファイルのパス。
pub fn checkpoint_file(path: &Path) -> PathBuf {
    path.with_extension(CHECKPOINT_EXTENSION)
}

/// モデルと正規化パラメータを保存し、書き込んだファイルのパスを返します。
pub fn save<B: Backend>(model: Model<B>, stats: &NormalizationStats, path: &Path) -> Result<PathBuf> {
    let mut record = CheckpointRecord {
        model: model.into_record(),
        norm_keys: Vec::with_capacity(stats.len()),
        norm_means: Vec::with_capacity(stats.len()),
        norm_stds: Vec::with_capacity(stats.len()),
    };
    for (key, entry) in stats.iter() {
        record.norm_keys.push(key.to_string());
        record.norm_means.push(entry.mean.clone());
        record.norm_stds.push(entry.std.clone());
    }

    let file = checkpoint_file(path);
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Recorder::<B>::record(&recorder(), record, file.clone())?;
    info!("=> モデルを '{}' に保存しました。", file.display());
    Ok(file)
}

/// チェックポイントを読み込み、推論に必要な統計量がそろっているか確認します。
pub fn load<B: Backend>(path: &Path, device: &B::Device) -> Result<Checkpoint<B>> {
    let file = checkpoint_file(path);
    if !file.exists() {
        return Err(Error::MissingInput(file));
    }

    info!("保存済みモデルを '{}' からロード中...", file.display());
    let record: CheckpointRecord<B> = Recorder::<B>::load(&recorder(), file, device)?;
    let stats = stats_from_record(record.norm_keys, record.norm_means, record.norm_stds)?;
    require_dim(&stats, COORDS_KEY, INPUT_DIM)?;
    require_dim(&stats, TARGETS_KEY, OUTPUT_DIM)?;

    check_record(&record.model).map_err(Error::InvalidCheckpoint)?;
    let model = Model::<B>::new(device).load_record(record.model);
    Ok(Checkpoint { model, stats })
}

fn stats_from_record(
    keys: Vec<String>,
    means: Vec<Vec<f64>>,
    stds: Vec<Vec<f64>>,
) -> Result<NormalizationStats> {
    if keys.len() != means.len() || keys.len() != stds.len() {
        return Err(Error::InvalidCheckpoint(format!(
            "キー {} 個に対して平均 {} 個、標準偏差 {} 個",
            keys.len(),
            means.len(),
            stds.len()
        )));
    }
    let mut stats = NormalizationStats::new();
    for ((key, mean), std) in keys.into_iter().zip(means).zip(stds) {
        let entry = FeatureStats::new(mean, std)
            .map_err(|e| Error::InvalidCheckpoint(format!("'{key}': {e}")))?;
        stats.insert(key, entry);
    }
    Ok(stats)
}

fn require_dim(stats: &NormalizationStats, key: &str, dim: usize) -> Result<()> {
    let entry = stats
        .get(key)
        .map_err(|e| Error::InvalidCheckpoint(e.to_string()))?;
    if entry.dim() != dim {
        return Err(Error::InvalidCheckpoint(format!(
            "'{key}' の次元は {dim} である必要がありますが {} でした",
            entry.dim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{PinnPredictor, Predictor};
    use approx::assert_abs_diff_eq;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("pinn-surrogate-{}", std::process::id()))
            .join(name)
    }

    fn sample_stats() -> NormalizationStats {
        let mut stats = NormalizationStats::new();
        stats.insert(
            COORDS_KEY,
            FeatureStats::new(vec![0.5, 0.01, -0.02, 0.03], vec![0.1, 0.2, 0.3, 0.4]).unwrap(),
        );
        stats.insert(
            TARGETS_KEY,
            FeatureStats::new(vec![1.0, 2.0, 3.0, 4.0], vec![0.0, 1.5, 2.5, 100.0]).unwrap(),
        );
        stats
    }

    #[test]
    fn save_then_load_preserves_stats_and_predictions() {
        let device = Default::default();
        let model = Model::<TestBackend>::new(&device);
        let before = PinnPredictor::new(model.clone(), device.clone())
            .predict(&[[0.5, 0.1, 0.2, 0.3]])
            .unwrap();

        let path = temp_path("roundtrip");
        let file = save(model, &sample_stats(), &path).unwrap();
        assert_eq!(file.extension().and_then(|e| e.to_str()), Some(CHECKPOINT_EXTENSION));

        let loaded = load::<TestBackend>(&path, &device).unwrap();
        assert_eq!(loaded.stats, sample_stats());

        let after = PinnPredictor::new(loaded.model, device.clone())
            .predict(&[[0.5, 0.1, 0.2, 0.3]])
            .unwrap();
        for (a, b) in before[0].iter().zip(after[0].iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
        }
        std::fs::remove_file(file).unwrap();
    }

    #[test]
    fn missing_checkpoint_is_reported() {
        let device = Default::default();
        let err = load::<TestBackend>(&temp_path("does-not-exist"), &device).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn checkpoint_without_targets_is_rejected() {
        let device = Default::default();
        let mut stats = NormalizationStats::new();
        stats.insert(COORDS_KEY, FeatureStats::new(vec![0.0; 4], vec![1.0; 4]).unwrap());

        let path = temp_path("no-targets");
        let file = save(Model::<TestBackend>::new(&device), &stats, &path).unwrap();
        let err = load::<TestBackend>(&path, &device).unwrap_err();
        assert!(matches!(err, Error::InvalidCheckpoint(_)));
        std::fs::remove_file(file).unwrap();
    }

    #[test]
    fn checkpoint_with_other_network_shape_is_rejected() {
        let device = Default::default();
        let mut stats = NormalizationStats::new();
        stats.insert(COORDS_KEY, FeatureStats::new(vec![0.0; 4], vec![1.0; 4]).unwrap());
        stats.insert(TARGETS_KEY, FeatureStats::new(vec![0.0; 4], vec![1.0; 4]).unwrap());

        // 4→16, 16→16, 16→4 の3層
        let path = temp_path("shallow");
        let file = save(Model::<TestBackend>::with_layout(&device, 16, 1), &stats, &path).unwrap();
        let err = load::<TestBackend>(&path, &device).unwrap_err();
        assert!(matches!(err, Error::InvalidCheckpoint(_)));
        std::fs::remove_file(file).unwrap();
    }

    #[test]
    fn mismatched_table_is_rejected() {
        let err = stats_from_record(vec!["coords".into()], vec![], vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidCheckpoint(_)));
    }
}
