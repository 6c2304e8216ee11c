use clap::Parser;
use std::path::Path;
use visit_wrangler::adapters::table_io;
use visit_wrangler::config::cli::{Command, ConcatArgs, ReadmissionArgs};
use visit_wrangler::domain::ports::Storage;
use visit_wrangler::utils::logger;
use visit_wrangler::utils::validation::{validate_required_field, Validate};
use visit_wrangler::{
    CliConfig, LocalStorage, PeriodicConcatenator, ReadmissionDetector, Result, WranglerConfig,
    WranglerError,
};

fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting visit-wrangler");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(cli) {
        tracing::error!(
            "❌ visit-wrangler failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        std::process::exit(e.severity().exit_code());
    }
}

fn run(cli: CliConfig) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            WranglerConfig::from_file(path)?
        }
        None => WranglerConfig::default(),
    };

    match cli.command {
        Command::Readmission(args) => run_readmission(config, args),
        Command::Concat(args) => run_concat(config, args),
    }
}

fn run_readmission(mut config: WranglerConfig, args: ReadmissionArgs) -> Result<()> {
    // 應用命令列覆蓋設定
    if let Some(days) = args.days {
        config.readmission.days_threshold = days;
    }
    if let Some(emergency) = args.emergency {
        config.readmission.emergency = emergency;
    }
    config.validate()?;

    let storage = LocalStorage::default();
    let data = storage.read_file(&args.input)?;
    let table = table_io::parse_table(&data, &args.input)?;
    tracing::info!("Loaded {} visits from {}", table.len(), args.input.display());

    let detector = ReadmissionDetector::new(config.columns.clone(), config.readmission_params()?);
    let report = detector.detect(&table)?;

    println!(
        "✅ {} readmission pairs across {} patients (threshold {} days, emergency={})",
        report.pairs.len(),
        report.patients_matched,
        detector.params().days_threshold,
        detector.params().emergency
    );

    if let Some(output) = &args.output {
        let json = serde_json::to_string_pretty(&report)?;
        write_output(output, json.as_bytes())?;
        println!("📁 Report saved to: {}", output.display());
    }

    Ok(())
}

fn run_concat(config: WranglerConfig, args: ConcatArgs) -> Result<()> {
    let mut concat = config.concat.clone().unwrap_or_default();
    if let Some(folder) = args.folder {
        concat.folder = Some(folder);
    }
    if let Some(file_name) = args.file_name {
        concat.file_name = Some(file_name);
    }
    if !args.periods.is_empty() {
        concat.periods = args.periods;
    }
    if !args.features.is_empty() {
        concat.features = Some(args.features);
    }

    let config = WranglerConfig {
        concat: Some(concat.clone()),
        ..config
    };
    config.validate()?;

    let folder = validate_required_field("concat.folder", &concat.folder)?;
    let file_name = validate_required_field("concat.file_name", &concat.file_name)?;

    let concatenator = PeriodicConcatenator::new(LocalStorage::default(), folder, file_name.as_str());
    let table = concatenator.concat(concat.periods.as_slice(), concat.features.as_deref())?;

    match &args.output {
        Some(output) => {
            let mut buffer = Vec::new();
            table_io::write_csv(&table, &mut buffer)?;
            write_output(output, &buffer)?;
            tracing::info!("📁 Output saved to: {}", output.display());
        }
        None => table_io::write_csv(&table, std::io::stdout().lock())?,
    }

    Ok(())
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data).map_err(WranglerError::IoError)
}
