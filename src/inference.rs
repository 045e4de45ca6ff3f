use std::path::PathBuf;
use std::time::Instant;

use burn::backend::NdArray;
use log::info;

use crate::checkpoint;
use crate::config::InferenceConfig;
use crate::error::{Error, Result};
use crate::normalize::{COORDS_KEY, NormalizationStats, TARGETS_KEY};
use crate::points::{create_output, load_sample_rows, write_results};
use crate::predictor::{PinnPredictor, Predictor};
use crate::rows::{PredictionRow, ResultRow, SampleRow, build_query_points};

type MyBackend = NdArray<f32>;

/// 推論の結果。
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceSummary {
    pub output: PathBuf,
    pub row_count: usize,
    pub time: f64,
}

/// 入力点から速度と圧力を予測します。
///
/// 座標に時刻 `t` を付けて正規化し、予測値を物理単位に戻してから速度の大きさを求めます。
pub fn predict_fields<P: Predictor + ?Sized>(
    rows: &[SampleRow],
    t: f64,
    stats: &NormalizationStats,
    predictor: &P,
) -> Result<Vec<ResultRow>> {
    let coords: Vec<[f64; 4]> = build_query_points(rows, t)
        .into_iter()
        .map(|q| q.to_array())
        .collect();
    let coords_norm = stats.normalize(&coords, COORDS_KEY)?;

    let pred_norm = predictor.predict(&coords_norm)?;
    if pred_norm.len() != rows.len() {
        return Err(Error::Inference(format!(
            "{} 点に対して {} 個の予測値が返されました",
            rows.len(),
            pred_norm.len()
        )));
    }

    let pred_real = stats.denormalize(&pred_norm, TARGETS_KEY)?;
    Ok(rows
        .iter()
        .zip(pred_real)
        .map(|(row, pred)| ResultRow::new(row, PredictionRow::from(pred)))
        .collect())
}

/// `predict`サブコマンドを実行します。
///
/// ファイルから学習済みモデルを読み込み、入力点に対して推論を実行して結果を保存します。
pub fn run(config: &InferenceConfig) -> Result<InferenceSummary> {
    let device = Default::default();

    let rows = load_sample_rows(&config.input)?;
    let t = config.time.resolve(&config.input)?;
    info!(
        "'{}' から {} 点を読み込みました (t = {t})",
        config.input.display(),
        rows.len()
    );

    info!("推論を実行します - バックエンド: NdArray (CPU)");
    let inference_start = Instant::now();
    let checkpoint = checkpoint::load::<MyBackend>(&config.checkpoint, &device)?;
    let predictor = PinnPredictor::new(checkpoint.model, device);
    let results = predict_fields(&rows, t, &checkpoint.stats, &predictor)?;
    info!("=> 推論時間: {:.2?}", inference_start.elapsed());

    write_results(create_output(&config.output)?, &results)?;
    info!(
        "{}---予測が完了しました: '{}'",
        config.input.display(),
        config.output.display()
    );

    Ok(InferenceSummary {
        output: config.output.clone(),
        row_count: results.len(),
        time: t,
    })
}
