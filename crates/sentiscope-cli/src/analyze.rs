//! `sentiscope analyze` command handler.

use sentiscope_analysis::{
    AnalysisRequest, AnalysisResult, AnalysisService, ErrorDescriptor, ProgressReporter,
};

use crate::client::AnalyzeClient;
use crate::progress::render_progress;
use crate::report::render_report;

const FAILURE_NOTICE: &str = "Failed to analyze sentiment. Please try again.";

/// Analyze `keyword` remotely (when `server` is set) or in-process, showing
/// staged progress on stderr and the result on stdout.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the HTTP client cannot
/// be built, or the analysis fails. Analysis failures print one generic notice;
/// their category and details go to the log.
pub(crate) async fn run_analyze(
    keyword: &str,
    server: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let reporter = ProgressReporter::default();
    let renderer = tokio::spawn(render_progress(reporter.subscribe()));

    let outcome = match server {
        Some(url) => {
            let client = AnalyzeClient::new(url)?;
            reporter.track(client.analyze(keyword)).await
        }
        None => {
            let config = sentiscope_core::load_app_config()?;
            let service = AnalysisService::from_config(&config);
            reporter
                .track(service.analyze(&AnalysisRequest::new(keyword)))
                .await
        }
    };

    drop(reporter);
    renderer.await?;

    match outcome {
        Ok(result) => print_result(keyword, &result, json),
        Err(descriptor) => Err(report_failure(&descriptor)),
    }
}

fn print_result(keyword: &str, result: &AnalysisResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print!("{}", render_report(keyword, result));
    }
    Ok(())
}

fn report_failure(descriptor: &ErrorDescriptor) -> anyhow::Error {
    tracing::error!(
        category = %descriptor.category,
        message = %descriptor.message,
        details = descriptor.details.as_deref().unwrap_or_default(),
        "analysis failed"
    );
    eprintln!("{FAILURE_NOTICE}");
    anyhow::anyhow!("analysis failed ({})", descriptor.category)
}
