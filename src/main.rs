//! # PINN サロゲートモデル用ユーティリティ
//!
//! `clap` クレートを利用して、コマンドラインから`sample`（点群の作成）と
//! `predict`（推論）の機能を個別に実行できます。
//!
//! ## 使い方
//!
//! ### 点群の作成
//! ```bash
//! cargo run --release -- sample stl/MaChunLan30.stl --samples 20000 --scale 0.001
//! ```
//!
//! ### 推論
//! ```bash
//! cargo run --release -- predict point/MaChunLan30_point.txt --checkpoint pinn_model.mpk
//! ```
//!
//! ログの詳細度は `RUST_LOG` で変更できます（既定は `info`）。

use anyhow::Context;
use clap::Parser;
use pinn_surrogate::cli::{Cli, Commands};
use pinn_surrogate::{inference, sampling};

/// プログラムのエントリーポイント。
///
/// コマンドライン引数を解析し、`sample`または`predict`の処理に振り分けます。
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sample(args) => {
            let config = args.into_config();
            sampling::run(&config)
                .with_context(|| format!("'{}' から点群を作成できませんでした", config.input.display()))?;
        }
        Commands::Predict(args) => {
            let config = args.into_config();
            inference::run(&config)
                .with_context(|| format!("'{}' の推論に失敗しました", config.input.display()))?;
        }
    }
    Ok(())
}
