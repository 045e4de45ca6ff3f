use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    DEFAULT_CHECKPOINT, DEFAULT_PREDICT_TIME, DEFAULT_SAMPLE_COUNT, DEFAULT_SCALE,
    DEFAULT_TIME_STEP, InferenceConfig, SamplerConfig, TimeSource,
};

/// clapでコマンドラインの構造を定義します。
#[derive(Parser, Debug)]
#[command(author, version, about = "Point cloud sampling and PINN surrogate inference with Burn", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 実行するサブコマンドを定義します（sample または predict）。
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 表面メッシュから点をサンプリングし、点群ファイルに保存します
    Sample(SampleArgs),
    /// 保存されたPINNモデルを使い、点群ファイルの各点で速度と圧力を予測します
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// 入力メッシュ (.stl / .obj)
    pub mesh: PathBuf,
    /// 出力する点群ファイル [既定: point/<メッシュ名>_point.txt]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// サンプリングする点の数
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE_COUNT)]
    pub samples: usize,
    /// 座標に掛ける倍率
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    pub scale: f64,
    /// 乱数のシード (指定すると結果が再現可能になります)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SampleArgs {
    pub fn into_config(self) -> SamplerConfig {
        let mut config = SamplerConfig::new(self.mesh);
        if let Some(output) = self.output {
            config.output = output;
        }
        config.sample_count = self.samples;
        config.scale = self.scale;
        config.seed = self.seed;
        config
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// 入力点群ファイル (ヘッダ行 + `節点番号 x y z`)
    pub points: PathBuf,
    /// 出力する結果ファイル [既定: resultPoint/result_<入力ファイル名>]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// 学習済みモデルのチェックポイント
    #[arg(short, long, default_value = DEFAULT_CHECKPOINT)]
    pub checkpoint: PathBuf,
    /// 予測する時刻
    #[arg(long, default_value_t = DEFAULT_PREDICT_TIME, conflicts_with_all = ["step", "step_from_name"])]
    pub time: f64,
    /// 時刻を `step * time_step` で与えます
    #[arg(long, conflicts_with = "step_from_name")]
    pub step: Option<u64>,
    /// 入力ファイル名の末尾 (`-150` など) をステップ数として使います
    #[arg(long)]
    pub step_from_name: bool,
    /// CFDシミュレーションの時間刻み (秒)
    #[arg(long, default_value_t = DEFAULT_TIME_STEP)]
    pub time_step: f64,
}

impl PredictArgs {
    pub fn into_config(self) -> InferenceConfig {
        let mut config = InferenceConfig::new(self.points);
        if let Some(output) = self.output {
            config.output = output;
        }
        config.checkpoint = self.checkpoint;
        config.time = match (self.step, self.step_from_name) {
            (Some(step), _) => TimeSource::Step {
                step,
                time_step: self.time_step,
            },
            (None, true) => TimeSource::StepFromFileName {
                time_step: self.time_step,
            },
            (None, false) => TimeSource::Fixed(self.time),
        };
        config
    }
}
