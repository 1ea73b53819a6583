use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracker_core::highlight::{escape_html, render_html, JsonToken};
use tracker_core::{
    AppViewModel, Icon, MessageTone, Playback, ResultsView, StatsBody, StepState, StepView,
};
use tracker_engine::AtomicFileWriter;
use tracker_logging::{tracker_error, tracker_info};

const READY_TO_PLAY: &str = "✔ ready to play";
const BAR_TEMPLATE: &str = "{spinner:.green} {prefix:.bold} [{bar:40.cyan/blue}] {pos:>3}% {wide_msg}";

/// Draws view models on the terminal; the only place that writes to stdout/stderr.
pub struct TerminalRenderer {
    bar: ProgressBar,
    last_steps: Vec<StepView>,
    last_notice: Option<String>,
    results_shown: bool,
    html_report: Option<PathBuf>,
}

impl TerminalRenderer {
    pub fn new(html_report: Option<PathBuf>) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            last_steps: Vec::new(),
            last_notice: None,
            results_shown: false,
            html_report,
        }
    }

    pub fn render(&mut self, view: &AppViewModel) {
        let position = if view.progress.visible {
            view.progress.percent.round().clamp(0.0, 100.0) as u64
        } else {
            0
        };
        self.bar.set_position(position);
        self.bar.set_prefix(view.stage_label.clone());
        self.bar.set_message(status_line(view));

        if view.steps != self.last_steps {
            self.bar.println(step_line(&view.steps));
            self.last_steps = view.steps.clone();
        }

        // Errors and completion are printed once so they stay in the scrollback.
        if view.tone != MessageTone::Normal
            && self.last_notice.as_deref() != Some(view.message.as_str())
        {
            self.bar.println(toned(&view.message, view.tone));
            self.last_notice = Some(view.message.clone());
        }

        if let Some(results) = &view.results {
            if !self.results_shown && !results.is_loading() {
                self.results_shown = true;
                self.show_results(view.task_id.as_deref(), results);
            }
        }
    }

    pub fn finish(&self, view: &AppViewModel) {
        self.bar.finish_and_clear();
        if view.tone == MessageTone::Normal {
            println!("{}", status_line(view));
        }
    }

    fn show_results(&self, task_id: Option<&str>, results: &ResultsView) {
        if results.video.is_none() && results.stats.is_none() {
            return;
        }
        self.bar.suspend(|| println!("{}", results_text(results)));

        if let Some(path) = &self.html_report {
            write_report(path, &html_report(task_id, results));
        }
    }
}

pub(crate) fn icon_glyph(icon: Icon) -> &'static str {
    match icon {
        Icon::Spinner => "…",
        Icon::Hourglass => "⌛",
        Icon::Cogs => "⚙",
        Icon::Film => "🎞",
        Icon::Branch => "⑂",
        Icon::CheckCircle => "✔",
        Icon::Warning => "⚠",
        Icon::Info => "ℹ",
    }
}

/// One-line status: icon, message and ETA when known.
pub(crate) fn status_line(view: &AppViewModel) -> String {
    let mut line = String::new();
    if let Some(icon) = view.icon {
        line.push_str(icon_glyph(icon));
        line.push(' ');
    }
    line.push_str(&view.message);
    if let Some(eta) = &view.eta {
        line.push_str(" · ETA ");
        line.push_str(eta);
    }
    line
}

pub(crate) fn step_line(steps: &[StepView]) -> String {
    steps
        .iter()
        .map(|view| {
            let marker = match view.state {
                StepState::Pending => "·",
                StepState::Active => "▶",
                StepState::Completed => "✔",
            };
            format!("{marker} {}", view.step.label())
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn toned(message: &str, tone: MessageTone) -> String {
    match tone {
        MessageTone::Normal => message.to_string(),
        MessageTone::Success => message.green().bold().to_string(),
        MessageTone::Error => message.red().bold().to_string(),
    }
}

fn colorize(tokens: &[JsonToken]) -> String {
    tokens
        .iter()
        .map(|token| match token {
            JsonToken::Key(text) => text.cyan().to_string(),
            JsonToken::Str(text) => text.green().to_string(),
            JsonToken::Number(text) => text.yellow().to_string(),
            JsonToken::Bool(_) => token.text().magenta().to_string(),
            JsonToken::Null => token.text().dimmed().to_string(),
            JsonToken::Punct(_) | JsonToken::Space(_) | JsonToken::Newline => {
                token.text().to_string()
            }
        })
        .collect()
}

fn results_text(results: &ResultsView) -> String {
    let mut out = String::new();
    if let Some(video) = &results.video {
        out.push_str(&format!(
            "{} {} (save as {})\n",
            "Video:".bold(),
            video.url,
            video.download_name
        ));
        match &video.playback {
            Playback::Ready => out.push_str(&format!("{}\n", READY_TO_PLAY.green())),
            Playback::Unplayable(warning) => out.push_str(&format!("{}\n", warning.yellow())),
            Playback::Pending => {}
        }
    }
    if let Some(stats) = &results.stats {
        out.push_str(&format!(
            "{} {} (save as {})\n",
            "Statistics:".bold(),
            stats.url,
            stats.download_name
        ));
        match &stats.body {
            StatsBody::Loaded(tokens) => {
                out.push_str(&colorize(tokens));
                out.push('\n');
            }
            StatsBody::Unavailable(message) => {
                out.push_str(&format!("{}\n", message.red()));
            }
            StatsBody::Loading => {}
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

/// Standalone HTML page for the results area.
pub(crate) fn html_report(task_id: Option<&str>, results: &ResultsView) -> String {
    let mut body = String::new();
    if let Some(video) = &results.video {
        body.push_str("<section id=\"video-section\">\n<h2>Processed video</h2>\n");
        body.push_str(&format!(
            "<video controls src=\"{url}\"></video>\n<a href=\"{url}\" download=\"{name}\">Download video</a>\n",
            url = escape_attr(&video.url),
            name = escape_attr(&video.download_name),
        ));
        if let Playback::Unplayable(warning) = &video.playback {
            body.push_str(&format!(
                "<p class=\"warning\">{}</p>\n",
                escape_html(warning)
            ));
        }
        body.push_str("</section>\n");
    }
    if let Some(stats) = &results.stats {
        body.push_str("<section id=\"stats-section\">\n<h2>Statistics</h2>\n");
        body.push_str(&format!(
            "<a href=\"{url}\" download=\"{name}\">Download statistics</a>\n",
            url = escape_attr(&stats.url),
            name = escape_attr(&stats.download_name),
        ));
        match &stats.body {
            StatsBody::Loaded(tokens) => {
                body.push_str("<pre class=\"json\">");
                body.push_str(&render_html(tokens));
                body.push_str("</pre>\n");
            }
            StatsBody::Unavailable(message) => {
                body.push_str(&format!("<p class=\"error\">{}</p>\n", escape_html(message)));
            }
            StatsBody::Loading => {}
        }
        body.push_str("</section>\n");
    }

    let title = match task_id {
        Some(id) => format!("Results for task {}", escape_html(id)),
        None => "Results".to_string(),
    };
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n\
.json-key {{ color: #0451a5; }}\n.json-string {{ color: #a31515; }}\n\
.json-number {{ color: #098658; }}\n.json-boolean {{ color: #0000ff; }}\n\
.json-null {{ color: #808080; }}\n.warning {{ color: #b35900; }}\n</style>\n</head>\n\
<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n"
    )
}

fn write_report(path: &Path, html: &str) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        tracker_error!("HTML report path {:?} has no file name", path);
        return;
    };
    match AtomicFileWriter::new(dir).write(file_name, html.as_bytes()) {
        Ok(written) => tracker_info!("HTML report written to {}", written.display()),
        Err(err) => tracker_error!("Failed to write HTML report {:?}: {}", path, err),
    }
}
