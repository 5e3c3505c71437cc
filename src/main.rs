use densex::PipelineError;
use densex::pipeline::{PipelineConfig, run_pipeline};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match PipelineConfig::from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{} ({})", PipelineError::Config(e), path);
                return ExitCode::FAILURE;
            }
        },
        None => PipelineConfig {
            verbose: true,
            ..PipelineConfig::default()
        },
    };

    match run_pipeline(&config) {
        Ok(report) => {
            if let Some(last) = report.history.last() {
                log::info!(
                    "final epoch {}: loss {:.4}, accuracy {}",
                    last.epoch,
                    last.loss,
                    last.accuracy
                        .map_or_else(|| "n/a".to_string(), |a| format!("{:.4}", a))
                );
            }
            log::info!(
                "saved model to {} and ONNX ({} ops, min opset {}) to {}",
                report.saved_model_dir.display(),
                report.export.onnx_op_count,
                report.export.min_opset,
                report.onnx_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
