use sentiscope_analysis::ProgressState;
use tokio::sync::watch;

/// Redraws a single status line on stderr until the reporter is dropped.
pub(crate) async fn render_progress(mut rx: watch::Receiver<ProgressState>) {
    while rx.changed().await.is_ok() {
        let line = progress_line(&rx.borrow_and_update());
        eprint!("\r\x1b[2K{line}");
    }
    eprint!("\r\x1b[2K");
}

pub(crate) fn progress_line(state: &ProgressState) -> String {
    if !state.active {
        return String::new();
    }
    let filled = usize::from(state.percent.min(100) / 5);
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        " ".repeat(20usize.saturating_sub(filled)),
        state.percent,
        state.phase_label
    )
}
