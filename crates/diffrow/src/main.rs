//! Diffrow CLI - renders structured diff documents to HTML

mod config;
mod html;
mod template;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::Config;
use diffrow_core::{DiffDocument, RenderMessage, RenderRequest, RenderSettings, RenderWorker};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use template::Template;

#[derive(Parser, Debug)]
#[command(name = "diffrow")]
#[command(author, version, about = "Render a structured diff to HTML with word-level highlighting")]
struct Args {
    /// Diff document (JSON), or "-" to read stdin
    #[arg(default_value = "-")]
    input: String,

    /// Write the HTML here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Display width of a tab stop
    #[arg(long)]
    tab_width: Option<u32>,

    /// Disable word-level change highlighting
    #[arg(long)]
    no_word_diff: bool,

    /// Per-side token ceiling above which word diffing falls back to
    /// whole-line rendering
    #[arg(long)]
    word_diff_limit: Option<usize>,

    /// Emit patch byte offsets so staged lines can be toggled
    #[arg(long)]
    staged: bool,

    /// Emit patch byte offsets so unstaged lines can be toggled
    #[arg(long)]
    unstaged: bool,

    /// Custom per-file HTML template
    #[arg(long)]
    template: Option<PathBuf>,

    /// Suppress the progress indicator on stderr
    #[arg(short, long)]
    quiet: bool,
}

/// Config file values first, CLI flags on top
fn build_settings(args: &Args, config: &Config) -> RenderSettings {
    let mut settings = config.render_settings();
    if let Some(width) = args.tab_width {
        settings.tab_width = width;
    }
    if args.no_word_diff {
        settings.word_diff = false;
    }
    if let Some(limit) = args.word_diff_limit {
        settings.word_diff_limit = limit;
    }
    settings.staged = args.staged;
    settings.unstaged = args.unstaged;
    settings
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read diff document from stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
    }
}

fn load_template(args: &Args, config: &Config) -> Result<Template> {
    let path = args.template.as_ref().or(config.output.template.as_ref());
    let source = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?,
        None => html::DEFAULT_FILE_TEMPLATE.to_string(),
    };
    Ok(Template::parse(&source))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = Config::load();
    let settings = build_settings(&args, &config);
    let template = load_template(&args, &config)?;

    let text = read_input(&args.input)?;
    let document = DiffDocument::from_json(&text).context("Failed to parse diff document")?;

    let worker = RenderWorker::spawn(RenderRequest {
        document,
        settings: settings.clone(),
    });

    let mut model = None;
    let mut progress_shown = false;
    for message in worker.messages().iter() {
        match message {
            RenderMessage::Progress(ratio) => {
                if !args.quiet {
                    eprint!("\rRendering... {:3.0}%", ratio * 100.0);
                    let _ = io::stderr().flush();
                    progress_shown = true;
                }
            }
            RenderMessage::Log(line) => log::info!("{line}"),
            RenderMessage::Done(done) => model = Some(done),
            RenderMessage::Failed { kind, message } => {
                if progress_shown {
                    eprintln!();
                }
                bail!("Render failed ({kind}): {message}");
            }
        }
    }
    if progress_shown {
        eprintln!();
    }
    let model = model.context("Render produced no output")?;
    worker.join();

    let output = html::render_html(&model, &settings, &template);
    match &args.output {
        Some(path) => fs::write(path, output)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(output.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
