use std::path::PathBuf;

use burn::record::RecorderError;
use thiserror::Error;

/// ライブラリ全体で共通のエラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("入力ファイル '{}' が見つかりません", .0.display())]
    MissingInput(PathBuf),
    #[error("入出力エラー: {0}")]
    Io(#[from] std::io::Error),
    #[error("{line} 行目を解析できません: {reason}")]
    Parse { line: usize, reason: String },
    #[error("データ行が1行もありません")]
    EmptyInput,
    #[error("メッシュを読み込めません: {0}")]
    Mesh(String),
    #[error("メッシュの表面積が 0 のため点をサンプリングできません")]
    DegenerateMesh,
    #[error("座標の倍率 {0} は 0 でない有限の値である必要があります")]
    InvalidScale(f64),
    #[error("正規化パラメータ '{0}' が見つかりません")]
    UnknownStatsKey(String),
    #[error("次元が一致しません (期待値: {expected}, 実際: {actual})")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("チェックポイントの読み書きに失敗しました: {0}")]
    Checkpoint(#[from] RecorderError),
    #[error("チェックポイントの内容が不正です: {0}")]
    InvalidCheckpoint(String),
    #[error("ファイル名 '{0}' から時間ステップを取得できません")]
    InvalidTimeStep(String),
    #[error("推論に失敗しました: {0}")]
    Inference(String),
}

pub type Result<T> = std::result::Result<T, Error>;
