use log::debug;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::mesh::TriangleMesh;

/// メッシュ表面から点をサンプリングするもの。
pub trait SurfaceSampler {
    fn sample_surface(&mut self, mesh: &TriangleMesh, count: usize) -> Result<Vec<[f64; 3]>>;
}

/// 面積に比例して三角形を選び、その三角形内で一様に点を取るサンプラー。
pub struct AreaWeightedSampler<R: Rng> {
    rng: R,
}

impl<R: Rng> AreaWeightedSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl AreaWeightedSampler<StdRng> {
    /// シードを指定すると同じメッシュから常に同じ点群が得られます。
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(StdRng::seed_from_u64(seed)),
            None => Self::new(StdRng::from_os_rng()),
        }
    }
}

impl<R: Rng> SurfaceSampler for AreaWeightedSampler<R> {
    fn sample_surface(&mut self, mesh: &TriangleMesh, count: usize) -> Result<Vec<[f64; 3]>> {
        let mut cumulative = Vec::with_capacity(mesh.len());
        let mut total = 0.0_f64;
        for area in mesh.areas() {
            total += area;
            cumulative.push(total);
        }
        if total.is_nan() || total <= 0.0 {
            return Err(Error::DegenerateMesh);
        }

        let points = (0..count)
            .map(|_| {
                let target = self.rng.random::<f64>() * total;
                let idx = cumulative
                    .partition_point(|&c| c <= target)
                    .min(mesh.len() - 1);
                let [a, b, c] = &mesh.triangles[idx];
                let p = point_in_triangle(a, b, c, self.rng.random(), self.rng.random());
                [p.x, p.y, p.z]
            })
            .collect();
        Ok(points)
    }
}

/// 単位正方形上の (u, v) を三角形内の点に写します。`u + v > 1` なら対角線で折り返します。
fn point_in_triangle(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>, u: f64, v: f64) -> Vector3<f64> {
    let (u, v) = if u + v > 1.0 { (1.0 - u, 1.0 - v) } else { (u, v) };
    a + (b - a) * u + (c - a) * v
}

/// 表面から `count` 点をサンプリングし、`scale` 倍してから重複した点を取り除きます。
///
/// 倍率を掛けた後で重複を除くため、アンダーフローで同じ座標になった点も1つにまとめられます。
/// 返される点の数は `count` 以下になることがあり、点は座標の辞書順に並びます。
/// 倍率が 0 または有限でない場合はエラーです。
pub fn sample_point_cloud<S: SurfaceSampler + ?Sized>(
    mesh: &TriangleMesh,
    sampler: &mut S,
    count: usize,
    scale: f64,
) -> Result<Vec<[f64; 3]>> {
    if !scale.is_finite() || scale == 0.0 {
        return Err(Error::InvalidScale(scale));
    }

    let mut points = sampler.sample_surface(mesh, count)?;
    for p in &mut points {
        for c in p.iter_mut() {
            *c *= scale;
        }
    }

    points.sort_by(|p, q| {
        p.iter()
            .zip(q)
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    points.dedup();
    let duplicates = count.saturating_sub(points.len());
    if duplicates > 0 {
        debug!("重複した {duplicates} 点を除きました");
    }
    Ok(points)
}
