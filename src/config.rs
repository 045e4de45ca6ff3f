//! 各パイプラインの入口に渡す設定。

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// 既定のサンプル数
pub const DEFAULT_SAMPLE_COUNT: usize = 20_000;
/// 既定の座標の倍率 (mm から m への変換)
pub const DEFAULT_SCALE: f64 = 0.001;
/// 既定の予測時刻
pub const DEFAULT_PREDICT_TIME: f64 = 0.5;
/// CFD シミュレーションの時間刻み (秒)
pub const DEFAULT_TIME_STEP: f64 = 0.01;
/// 既定のチェックポイント
pub const DEFAULT_CHECKPOINT: &str = "pinn_model.mpk";
/// 点群ファイルの既定の出力先ディレクトリ
pub const DEFAULT_POINT_DIR: &str = "point";
/// 結果ファイルの既定の出力先ディレクトリ
pub const DEFAULT_RESULT_DIR: &str = "resultPoint";

/// メッシュから点群を作る処理の設定。
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sample_count: usize,
    pub scale: f64,
    pub seed: Option<u64>,
}

impl SamplerConfig {
    /// 出力先を `point/<メッシュ名>_point.txt` とした既定の設定。
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            output: Path::new(DEFAULT_POINT_DIR).join(format!("{stem}_point.txt")),
            input,
            sample_count: DEFAULT_SAMPLE_COUNT,
            scale: DEFAULT_SCALE,
            seed: None,
        }
    }
}

/// 推論に使う時刻の決め方。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSource {
    /// 指定した時刻をそのまま使う
    Fixed(f64),
    /// `step * time_step`
    Step { step: u64, time_step: f64 },
    /// 入力ファイル名の末尾 (`case-150.txt` の `150`) をステップ数とみなす
    StepFromFileName { time_step: f64 },
}

impl Default for TimeSource {
    fn default() -> Self {
        Self::Fixed(DEFAULT_PREDICT_TIME)
    }
}

impl TimeSource {
    /// 物理時刻を求めます。
    pub fn resolve(&self, input: &Path) -> Result<f64> {
        match *self {
            Self::Fixed(t) => Ok(t),
            Self::Step { step, time_step } => Ok(step as f64 * time_step),
            Self::StepFromFileName { time_step } => {
                let step = step_from_file_name(input)
                    .ok_or_else(|| Error::InvalidTimeStep(input.display().to_string()))?;
                Ok(step as f64 * time_step)
            }
        }
    }
}

/// ファイル名の拡張子を除いた部分を `-` で区切り、最後の要素をステップ数として読みます。
pub fn step_from_file_name(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let (_, last) = stem.rsplit_once('-')?;
    last.parse().ok()
}

/// 学習済みモデルで推論する処理の設定。
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub checkpoint: PathBuf,
    pub time: TimeSource,
}

impl InferenceConfig {
    /// 出力先を `resultPoint/result_<入力ファイル名>` とした既定の設定。
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let name = input
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            output: Path::new(DEFAULT_RESULT_DIR).join(format!("result_{name}")),
            input,
            checkpoint: PathBuf::from(DEFAULT_CHECKPOINT),
            time: TimeSource::default(),
        }
    }
}
