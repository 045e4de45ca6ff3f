use std::path::PathBuf;
use std::time::Instant;

use log::info;

use crate::config::SamplerConfig;
use crate::error::Result;
use crate::mesh::TriangleMesh;
use crate::points::{create_output, write_point_cloud};
use crate::sampler::{AreaWeightedSampler, sample_point_cloud};

/// 点群生成の結果。
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSummary {
    pub output: PathBuf,
    pub point_count: usize,
}

/// `sample`サブコマンドを実行します。
///
/// メッシュを読み込み、表面から点をサンプリングして点群ファイルに書き出します。
pub fn run(config: &SamplerConfig) -> Result<SamplingSummary> {
    let mesh = TriangleMesh::load(&config.input)?;
    info!("処理中のファイル: '{}'", config.input.display());
    info!(
        "メッシュを読み込みました: 三角形 {} 枚, 表面積 {:.6e}",
        mesh.len(),
        mesh.surface_area()
    );

    let start = Instant::now();
    let mut sampler = AreaWeightedSampler::from_seed(config.seed);
    let points = sample_point_cloud(&mesh, &mut sampler, config.sample_count, config.scale)?;
    info!(
        "{} 点を要求し、重複を除いて {} 点を得ました ({:.2?})",
        config.sample_count,
        points.len(),
        start.elapsed()
    );

    write_point_cloud(create_output(&config.output)?, &points)?;
    info!(
        "=> 点群ファイルを '{}' に保存しました（{} 点）",
        config.output.display(),
        points.len()
    );

    Ok(SamplingSummary {
        output: config.output.clone(),
        point_count: points.len(),
    })
}
