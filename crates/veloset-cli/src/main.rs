use std::env;
use std::process;

use veloset_cli::config::RunConfig;
use veloset_cli::DatasetPreparer;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let config_path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("usage: veloset <run-config.yaml>");
            process::exit(2);
        }
    };

    let config = match RunConfig::from_yaml_file(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load run configuration: {err}");
            process::exit(2);
        }
    };

    match DatasetPreparer::new(config).run() {
        Ok(report) => {
            println!("dataset: {}", report.dataset_dir.display());
            println!(
                "windows: {} (length {})",
                report.window_count, report.window_len
            );
            println!("train: {}", report.train_windows);
            println!("validation: {}", report.validation_windows);
            println!("test: {}", report.test_windows);
            println!(
                "gyro range: [{:.6}, {:.6}]",
                report.gyro_range[0], report.gyro_range[1]
            );
            println!(
                "acc range: [{:.6}, {:.6}]",
                report.acc_range[0], report.acc_range[1]
            );
            println!("artifacts: {}", report.output_dir.display());
        }
        Err(err) => {
            eprintln!("dataset preparation failed: {err}");
            process::exit(1);
        }
    }
}
