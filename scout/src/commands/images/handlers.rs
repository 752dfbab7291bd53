use super::*;
use crate::context::{AppContext, VerbosityLevel};
use crate::format;
use libscout::ImageRecord;
use libscout::render::{self, render_image};

/// Handle the images command
pub fn handle_images(ctx: &AppContext, args: &ImagesArgs) {
    format::print(ctx, VerbosityLevel::Verbose, "Resolving search settings...");

    let resolved = match resolve(&ctx.config, args) {
        Ok(resolved) => resolved,
        Err(e) => {
            format::error(ctx, &e.to_string());
            std::process::exit(1);
        }
    };

    let credentials = match resolve_credentials(args.user.as_deref(), |user| {
        rpassword::prompt_password(format!("Password for {}: ", user))
    }) {
        Ok(credentials) => credentials,
        Err(e) => {
            format::error(ctx, &e);
            std::process::exit(1);
        }
    };

    tracing::debug!(
        url = %resolved.search.server_url,
        verify_tls = resolved.search.verify_tls,
        output = %resolved.search.output_format,
        workers = resolved.pool.workers,
        rate = resolved.pool.rate_per_second,
        burst = resolved.pool.burst,
        "resolved search settings"
    );
    format::print(
        ctx,
        VerbosityLevel::Verbose,
        &format!(
            "Searching {} with {} worker(s) at {} request(s)/s",
            resolved.search.server_url, resolved.pool.workers, resolved.pool.rate_per_second
        ),
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            format::error(ctx, &format!("Failed to start async runtime: {}", e));
            std::process::exit(1);
        }
    };

    let output_format = resolved.search.output_format;
    let streaming = streams(args, output_format);
    let formatter = format::create_formatter(ctx);
    let cancel = CancelSignal::new();

    let outcome = runtime.block_on(async {
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling search");
                interrupt.cancel();
            }
        });

        let spinner = formatter.spinner("Searching registry...");
        let result = run_search(
            &resolved,
            credentials,
            args.name.as_deref(),
            cancel.clone(),
            |result| {
                if let JobResult::Tag { image, tag } = result {
                    spinner.set_message(format!("Found {}:{}", image, tag.name));
                    if streaming {
                        let record = ImageRecord {
                            name: image.clone(),
                            tags: vec![tag.clone()],
                        };
                        if let Ok(rows) = render_image(&record, output_format) {
                            spinner.suspend(|| print!("{}", rows));
                        }
                    }
                }
            },
        )
        .await;
        spinner.finish_and_clear();
        result
    });

    let report = match outcome {
        Ok(report) => finish_report(report, args),
        Err(e) => {
            format::error(ctx, &e.to_string());
            std::process::exit(1);
        }
    };

    for failure in &report.failures {
        formatter.error(&describe_failure(
            failure.image.as_deref(),
            failure.tag.as_deref(),
            &failure.error,
        ));
    }

    if !streaming {
        match render::render(&report.images, output_format) {
            Ok(output) => print!("{}", output),
            Err(e) => {
                format::error(ctx, &format!("Error formatting output: {}", e));
                std::process::exit(1);
            }
        }
    }

    let cancelled = cancel.is_cancelled();
    tracing::info!(
        images = report.images.len(),
        tags = report.tag_count(),
        failures = report.failures.len(),
        cancelled = report.cancelled,
        "search finished"
    );
    if cancelled {
        formatter.warning(&format!("Interrupted. {}", summary(&report)));
    } else if report.is_empty() {
        formatter.warning("No images found.");
    } else {
        formatter.success(&summary(&report));
    }

    let code = exit_code(&report, cancelled);
    if code != 0 {
        std::process::exit(code);
    }
}
