use burn::module::Module;
use burn::nn::{Linear, LinearConfig, Tanh};
use burn::prelude::Backend;
use burn::tensor::Tensor;

/// 入力の次元 (t, x, y, z)
pub const INPUT_DIM: usize = 4;
/// 出力の次元 (u, v, w, p)
pub const OUTPUT_DIM: usize = 4;

const N_HIDDEN: usize = 256;
const N_HIDDEN_STAGES: usize = 4;

/// PINNの本体となるニューラルネットワークモデル。
///
/// 時空間座標(t, x, y, z)を入力とし、その点における速度(u, v, w)と圧力pを予測する
/// 多層パーセプトロン（MLP）です。入力層と4つの隠れ層の後にtanhを適用します。
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    linears: Vec<Linear<B>>,
    activation: Tanh,
}

impl<B: Backend> Model<B> {
    /// 新しいモデルを初期化します。
    pub fn new(device: &B::Device) -> Self {
        Self::with_layout(device, N_HIDDEN, N_HIDDEN_STAGES)
    }

    /// 隠れ層の幅と段数を指定してモデルを初期化します。
    pub(crate) fn with_layout(device: &B::Device, n_hidden: usize, n_stages: usize) -> Self {
        let mut linears = Vec::with_capacity(n_stages + 2);
        linears.push(LinearConfig::new(INPUT_DIM, n_hidden).init(device));
        for _ in 0..n_stages {
            linears.push(LinearConfig::new(n_hidden, n_hidden).init(device));
        }
        linears.push(LinearConfig::new(n_hidden, OUTPUT_DIM).init(device));
        Self {
            linears,
            activation: Tanh::new(),
        }
    }

    /// モデルの順伝播を実行します。
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let (output, hidden) = self
            .linears
            .split_last()
            .expect("モデルには少なくとも1つの線形層があります");
        let mut x = input;
        for linear in hidden {
            x = linear.forward(x);
            x = self.activation.forward(x);
        }
        output.forward(x)
    }
}

/// `Model::new` と同じ層数・重みの形状を持つレコードか確認します。
///
/// 形状の異なるレコードを `load_record` に渡すとパニックするため、読み込む前に呼び出します。
pub fn check_record<B: Backend>(record: &ModelRecord<B>) -> Result<(), String> {
    let expected = expected_weight_dims();
    if record.linears.len() != expected.len() {
        return Err(format!(
            "線形層は {} 層である必要がありますが {} 層でした",
            expected.len(),
            record.linears.len()
        ));
    }
    for (i, (linear, want)) in record.linears.iter().zip(&expected).enumerate() {
        let got = linear.weight.dims();
        if got != *want {
            return Err(format!("{i} 層目の重みの形状は {want:?} である必要がありますが {got:?} でした"));
        }
    }
    Ok(())
}

/// 各線形層の重みの形状 `[入力, 出力]`。
fn expected_weight_dims() -> Vec<[usize; 2]> {
    let mut dims = Vec::with_capacity(N_HIDDEN_STAGES + 2);
    dims.push([INPUT_DIM, N_HIDDEN]);
    dims.extend(std::iter::repeat_n([N_HIDDEN, N_HIDDEN], N_HIDDEN_STAGES));
    dims.push([N_HIDDEN, OUTPUT_DIM]);
    dims
}
