//! パイプラインの各段階で受け渡される行データ。

/// 入力点ファイルの1行 (節点番号と空間座標)。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRow {
    pub node_id: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// ネットワークへの入力となる時空間座標 (t, x, y, z)。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryPoint {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl QueryPoint {
    pub fn to_array(self) -> [f64; 4] {
        [self.t, self.x, self.y, self.z]
    }
}

/// 1点分の予測値 (u, v, w, p)。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRow {
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub p: f64,
}

impl From<[f64; 4]> for PredictionRow {
    fn from([u, v, w, p]: [f64; 4]) -> Self {
        Self { u, v, w, p }
    }
}

/// 結果ファイルに書き出す1行。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRow {
    pub node_id: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub velocity_magnitude: f64,
    pub p: f64,
}

impl ResultRow {
    /// 入力行と物理単位の予測値から結果行を組み立て、速度の大きさを計算します。
    pub fn new(sample: &SampleRow, prediction: PredictionRow) -> Self {
        let PredictionRow { u, v, w, p } = prediction;
        Self {
            node_id: sample.node_id,
            x: sample.x,
            y: sample.y,
            z: sample.z,
            u,
            v,
            w,
            velocity_magnitude: velocity_magnitude(u, v, w),
            p,
        }
    }
}

/// 各行の先頭に一定の時刻 `t` を付け加え、(t, x, y, z) を作ります。
///
/// 1回の推論が扱う時刻は1つだけです。
pub fn build_query_points(rows: &[SampleRow], t: f64) -> Vec<QueryPoint> {
    rows.iter()
        .map(|r| QueryPoint {
            t,
            x: r.x,
            y: r.y,
            z: r.z,
        })
        .collect()
}

/// 速度ベクトル (u, v, w) のユークリッドノルム。
pub fn velocity_magnitude(u: f64, v: f64, w: f64) -> f64 {
    (u * u + v * v + w * w).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn query_points_prepend_time() {
        let rows = [
            SampleRow { node_id: 1, x: 0.0, y: 0.0, z: 0.0 },
            SampleRow { node_id: 2, x: 1.0, y: -2.0, z: 3.5 },
        ];
        let points = build_query_points(&rows, 0.5);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].to_array(), [0.5, 0.0, 0.0, 0.0]);
        assert_eq!(points[1].to_array(), [0.5, 1.0, -2.0, 3.5]);
    }

    #[test]
    fn magnitude_of_known_vectors() {
        assert_eq!(velocity_magnitude(3.0, 4.0, 0.0), 5.0);
        assert_eq!(velocity_magnitude(0.0, 0.0, 5.0), 5.0);
        assert_eq!(velocity_magnitude(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn result_row_carries_magnitude() {
        let sample = SampleRow { node_id: 7, x: 1.0, y: 2.0, z: 3.0 };
        let row = ResultRow::new(&sample, PredictionRow::from([3.0, 4.0, 0.0, -1.0]));
        assert_eq!(row.node_id, 7);
        assert_eq!(row.velocity_magnitude, 5.0);
        assert_eq!(row.p, -1.0);
    }

    proptest! {
        #[test]
        fn magnitude_is_non_negative(u in -1e6..1e6f64, v in -1e6..1e6f64, w in -1e6..1e6f64) {
            let m = velocity_magnitude(u, v, w);
            prop_assert!(m >= 0.0);
            prop_assert_eq!(m == 0.0, u == 0.0 && v == 0.0 && w == 0.0);
        }
    }
}
