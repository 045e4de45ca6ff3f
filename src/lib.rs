//! # PINN サロゲートモデル用ユーティリティ
//!
//! CFD のサロゲートモデルとして学習した物理情報ニューラルネットワーク（PINN）の
//! 前後処理を行う2つの独立したパイプラインを提供します。
//!
//! - [`sampling`]: 表面メッシュから点をサンプリングし、点群ファイルを作成します。
//! - [`inference`]: `burn` で保存した学習済みモデルを読み込み、点群の各点で
//!   速度(u, v, w)と圧力pを予測して結果ファイルに書き出します。

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod mesh;
pub mod model;
pub mod normalize;
pub mod points;
pub mod predictor;
pub mod rows;
pub mod sampler;
pub mod sampling;

pub use error::{Error, Result};
