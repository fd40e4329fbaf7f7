//! Plain-text rendering of an [`AnalysisResult`].

use std::fmt::Write;

use sentiscope_analysis::AnalysisResult;

const TOP_WORDS: usize = 10;
const TOP_SOURCES: usize = 5;

pub(crate) fn render_report(keyword: &str, result: &AnalysisResult) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, keyword, result);
    out
}

fn write_report(out: &mut String, keyword: &str, result: &AnalysisResult) -> std::fmt::Result {
    writeln!(out, "Sentiment analysis for \"{}\"", keyword.trim())?;
    writeln!(out)?;

    for metric in result.engagement() {
        writeln!(out, "{:<10}{:>10}", metric.metric, metric.value)?;
    }

    section(out, "Sentiment distribution")?;
    let buckets = result.sentiment_buckets();
    if buckets.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for bucket in &buckets {
        writeln!(out, "  {:<10}{:>6.1}%", bucket.name, bucket.value)?;
    }

    section(out, "Top words")?;
    let mut words = result.word_weights();
    words.sort_by(|a, b| b.value.cmp(&a.value));
    if words.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for word in words.iter().take(TOP_WORDS) {
        writeln!(out, "  {:<20}{:>6}", word.text, word.value)?;
    }

    section(out, "Top sources")?;
    let mut sources = result.top_sources();
    sources.sort_by(|a, b| b.mentions.cmp(&a.mentions));
    if sources.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for source in sources.iter().take(TOP_SOURCES) {
        writeln!(out, "  {:<20}{:>6} mentions", source.name, source.mentions)?;
    }

    section(out, "Timeline")?;
    let points = result.timeline_points();
    if points.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for point in &points {
        writeln!(
            out,
            "  {:<8}+{:<5}-{:<5}~{}",
            point.time, point.positive, point.negative, point.neutral
        )?;
    }

    Ok(())
}

fn section(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "{title}")
}
