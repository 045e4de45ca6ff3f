use burn::prelude::Backend;
use burn::tensor::Tensor;
use log::debug;

use crate::error::{Error, Result};
use crate::model::{INPUT_DIM, Model, OUTPUT_DIM};

/// 正規化済みの座標 `[N, 4]` から正規化済みの予測値 `[N, 4]` を求めるもの。
///
/// パイプラインの残りの部分はこのトレイトにのみ依存し、
/// 数値計算のバックエンドには依存しません。
pub trait Predictor {
    fn predict(&self, coords: &[[f64; INPUT_DIM]]) -> Result<Vec<[f64; OUTPUT_DIM]>>;
}

impl<F> Predictor for F
where
    F: Fn(&[[f64; INPUT_DIM]]) -> Result<Vec<[f64; OUTPUT_DIM]>>,
{
    fn predict(&self, coords: &[[f64; INPUT_DIM]]) -> Result<Vec<[f64; OUTPUT_DIM]>> {
        self(coords)
    }
}

/// `burn` のモデルによる推論。
///
/// 自動微分を持たないバックエンドで使うため、勾配の計算は行われません。
/// 全ての点を1回の順伝播でまとめて処理します。
pub struct PinnPredictor<B: Backend> {
    model: Model<B>,
    device: B::Device,
}

impl<B: Backend> PinnPredictor<B> {
    pub fn new(model: Model<B>, device: B::Device) -> Self {
        Self { model, device }
    }
}

impl<B: Backend> Predictor for PinnPredictor<B> {
    fn predict(&self, coords: &[[f64; INPUT_DIM]]) -> Result<Vec<[f64; OUTPUT_DIM]>> {
        let n = coords.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let flat: Vec<f32> = coords.iter().flatten().map(|&v| v as f32).collect();
        let input = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device).reshape([n, INPUT_DIM]);
        let output = self.model.forward(input);
        debug!("出力テンソルの形状: {:?}", output.dims());

        let values = output
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| Error::Inference(format!("{e:?}")))?;
        if values.len() != n * OUTPUT_DIM {
            return Err(Error::DimensionMismatch {
                expected: n * OUTPUT_DIM,
                actual: values.len(),
            });
        }
        Ok(values
            .chunks_exact(OUTPUT_DIM)
            .map(|c| std::array::from_fn(|j| f64::from(c[j])))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn predicts_one_row_per_point() {
        let device = Default::default();
        let predictor = PinnPredictor::new(Model::<TestBackend>::new(&device), device);
        let out = predictor
            .predict(&[[0.5, 0.0, 0.0, 0.0], [0.5, 1.0, 2.0, 3.0]])
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn prediction_is_deterministic() {
        let device = Default::default();
        let predictor = PinnPredictor::new(Model::<TestBackend>::new(&device), device);
        let coords = [[0.1, 0.2, 0.3, 0.4]];
        assert_eq!(predictor.predict(&coords).unwrap(), predictor.predict(&coords).unwrap());
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let device = Default::default();
        let predictor = PinnPredictor::new(Model::<TestBackend>::new(&device), device);
        assert!(predictor.predict(&[]).unwrap().is_empty());
    }
}
