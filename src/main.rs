use {
    anyhow::{Context, Result},
    chrono::FixedOffset,
    clap::Parser,
    haunts::{
        Cli, InputFormat, Pipeline, PipelineConfig,
        data::{read_csv_fixes, read_geolife_user, render_user_report, write_report_json},
        init_logging,
    },
    std::panic,
};

fn main() -> Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    init_logging();
    let args = Cli::parse();

    let base = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::DEFAULT,
    };
    let config = args.apply_overrides(base);
    config.validate()?;

    let user_id = args.user_id.clone().unwrap_or_else(|| {
        // GeoLife layout is <user>/Trajectory, so skip the Trajectory component.
        args.input
            .components()
            .rev()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .find(|name| name != "Trajectory" && !name.is_empty())
            .unwrap_or_else(|| "user".to_string())
    });

    let fixes = match args.format {
        InputFormat::Geolife => {
            let offset = FixedOffset::east_opt(args.utc_offset_hours * 3600)
                .with_context(|| format!("Invalid UTC offset: {}h", args.utc_offset_hours))?;
            read_geolife_user(&args.input, offset)?
        }
        InputFormat::Csv => read_csv_fixes(&args.input)?,
    };

    let pipeline = Pipeline::new(config)?;
    let report = pipeline
        .run(&user_id, &fixes)
        .with_context(|| format!("Pipeline failed for user {user_id}"))?;

    println!("{}", render_user_report(&report));

    if let Some(path) = &args.json_out {
        write_report_json(&report, path)?;
    }
    Ok(())
}
