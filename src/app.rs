use std::collections::HashMap;
use std::io::Write;

use clap::{error::ErrorKind, CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::classify::{FilterLevel, Taxonomy};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::dataset::{DatasetError, DatasetSource};
use crate::output::{self, OutputFormat};
use crate::runner::{EntrySource, Options, Runner, RunnerError, DEFAULT_TITLE};

const LOAD_FAILURE_HINT: [&str; 4] = [
    "無法載入 JSON 資料集（檔案不存在、無法讀取，或內容不是有效的 JSON）。",
    "請以 --input 指定資料集路徑，或以 http:// 提供資料檔，例如：",
    "  python3 -m http.server 8000",
    "  drugcat --input http://localhost:8000/常見濫用管制藥品資料集.json",
];

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = String::new();

    out.push_str(cmd.get_name());
    if let Some(version) = cmd.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    out.push('\n');

    if let Some(about) = cmd.get_about() {
        out.push_str(&about.to_string());
        out.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about() {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str("Usage: ");
    out.push_str(cmd.get_name());
    out.push_str(" [OPTIONS]\n\n");

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();

    for arg in cmd.get_arguments() {
        if arg.is_hide_set() {
            continue;
        }
        let heading = arg.get_help_heading().unwrap_or("Options").to_string();
        let idx = *section_idx.entry(heading.clone()).or_insert_with(|| {
            sections.push((heading, Vec::new()));
            sections.len() - 1
        });
        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");

        for arg in args {
            let mut parts: Vec<String> = Vec::new();
            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }
            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    parts.push(format!("--{alias}"));
                }
            }
            if let Some(long) = arg.get_long() {
                let rendered = format!("--{long}");
                if !parts.contains(&rendered) {
                    parts.push(rendered);
                }
            }

            let mut flags = parts.join(", ");
            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                flags.push_str(&format!(" <{value_name}>"));
            }

            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');

            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }
            out.push('\n');
        }
    }

    out
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Clone, Debug)]
struct RunConfig {
    source: DatasetSource,
    taxonomy: Taxonomy,
    level: Option<FilterLevel>,
    show: Option<String>,
    output: Option<String>,
    output_format: OutputFormat,
    title: String,
    no_color: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let source = match non_empty(args.input.or(cfg.input)) {
        Some(raw) => DatasetSource::parse(&raw)
            .ok_or_else(|| format!("invalid dataset source '{raw}'"))?,
        None => DatasetSource::default(),
    };

    let taxonomy = match non_empty(args.taxonomy.or(cfg.taxonomy)) {
        Some(raw) => Taxonomy::parse(&raw)
            .ok_or_else(|| format!("invalid taxonomy '{raw}', expected graded or merged"))?,
        None => Taxonomy::default(),
    };

    let level = match non_empty(args.level.or(cfg.level)) {
        Some(raw) => Some(
            FilterLevel::parse(&raw)
                .ok_or_else(|| format!("invalid level '{raw}', expected 1, 2, 3, 4 or U"))?,
        ),
        None => None,
    };
    if let Some(level) = level {
        validation::check_level_offered(taxonomy, level)?;
    }

    let output = non_empty(args.output.or(cfg.output)).map(|p| {
        config::expand_tilde(&p)
            .to_string_lossy()
            .to_string()
    });
    let output_format = match non_empty(args.output_format.or(cfg.output_format)) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let show = non_empty(args.show);
    if show.is_some() && output_format == OutputFormat::Html {
        return Err("--show supports text and json output only".to_string());
    }

    let title = non_empty(args.title.or(cfg.title)).unwrap_or_else(|| DEFAULT_TITLE.to_string());

    Ok(RunConfig {
        source,
        taxonomy,
        level,
        show,
        output,
        output_format,
        title,
        no_color,
    })
}

fn describe_load_failure(err: &RunnerError) -> String {
    match err {
        RunnerError::Dataset { source } => {
            let mut lines = vec![source.to_string()];
            if !matches!(source, DatasetError::EmptySource) {
                lines.extend(LOAD_FAILURE_HINT.iter().map(|l| l.to_string()));
            }
            lines.join("\n")
        }
        other => other.to_string(),
    }
}

fn emit(run: &RunConfig, bytes: &[u8]) -> Result<(), String> {
    match run.output.as_deref() {
        Some(path) => {
            std::fs::write(path, bytes)
                .map_err(|e| format!("failed to write output '{path}': {e}"))?;
            info!(path, bytes = bytes.len(), "output written");
            Ok(())
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(bytes)
                .and_then(|_| stdout.flush())
                .map_err(|e| format!("failed to write output: {e}"))
        }
    }
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color || run.output.is_some() {
        colored::control::set_override(false);
    }

    let runner = Runner::new(Options {
        source: EntrySource::Dataset(run.source.clone()),
        taxonomy: run.taxonomy,
        level: run.level,
        title: run.title.clone(),
    });
    let view = runner.run().await.map_err(|e| describe_load_failure(&e))?;

    let bytes = match run.show.as_deref() {
        Some(name) => {
            let detail = view.detail(name).map_err(|e| e.to_string())?;
            match run.output_format {
                OutputFormat::Json => output::render_detail_json(&detail),
                _ => output::render_detail_text(&detail),
            }
        }
        None => {
            let record = view.record();
            match run.output_format {
                OutputFormat::Text => output::render_text(&record),
                OutputFormat::Json => output::render_json(&record),
                OutputFormat::Html => output::render_html(&record),
            }
        }
    };

    emit(&run, &bytes)
}

fn init_config(path: Option<&str>) -> Result<(), String> {
    let path = match path {
        Some(p) => config::expand_tilde(p),
        None => config::default_config_path()
            .ok_or_else(|| "cannot determine home directory for config".to_string())?,
    };
    if config::ensure_default_config_file(&path)? {
        println!(":: Config    : wrote {}", path.display());
    } else {
        println!(":: Config    : {} already exists", path.display());
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_logging(args.verbose);

    if args.init_config {
        return init_config(args.config.as_deref());
    }

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["drugcat"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn defaults_without_args_or_config() {
        let run = build_run_config(parse(&[]), ConfigFile::default()).unwrap();
        assert_eq!(run.source, DatasetSource::default());
        assert_eq!(run.taxonomy, Taxonomy::Graded);
        assert_eq!(run.level, None);
        assert_eq!(run.output_format, OutputFormat::Text);
        assert_eq!(run.title, DEFAULT_TITLE);
    }

    #[test]
    fn cli_values_override_config() {
        let cfg = ConfigFile {
            taxonomy: Some("merged".to_string()),
            level: Some("3".to_string()),
            input: Some("./cfg.json".to_string()),
            ..ConfigFile::default()
        };
        let run = build_run_config(parse(&["-l", "1"]), cfg).unwrap();
        assert_eq!(run.taxonomy, Taxonomy::Merged);
        assert_eq!(run.level, Some(FilterLevel::One));
        assert_eq!(
            run.source,
            DatasetSource::Path(std::path::PathBuf::from("./cfg.json"))
        );
    }

    #[test]
    fn output_format_is_inferred_from_path() {
        let run = build_run_config(parse(&["-o", "catalog.html"]), ConfigFile::default()).unwrap();
        assert_eq!(run.output_format, OutputFormat::Html);
    }

    #[test]
    fn show_with_inferred_html_is_rejected() {
        let args = parse(&["-o", "catalog.html", "-s", "A"]);
        assert!(build_run_config(args, ConfigFile::default()).is_err());
    }

    #[test]
    fn invalid_config_level_is_rejected() {
        let cfg = ConfigFile {
            level: Some("9".to_string()),
            ..ConfigFile::default()
        };
        assert!(build_run_config(parse(&[]), cfg).is_err());
    }

    #[test]
    fn config_unclassified_level_is_rejected_for_merged() {
        let cfg = ConfigFile {
            taxonomy: Some("merged".to_string()),
            level: Some("U".to_string()),
            ..ConfigFile::default()
        };
        assert!(build_run_config(parse(&[]), cfg).is_err());
    }

    #[test]
    fn load_failure_message_carries_hint() {
        let err = RunnerError::Dataset {
            source: DatasetError::HttpStatus {
                url: "http://x/data.json".to_string(),
                status: 404,
            },
        };
        let msg = describe_load_failure(&err);
        assert!(msg.contains("HTTP 404"));
        assert!(msg.contains("--input"));
    }

    #[test]
    fn help_groups_arguments_by_heading() {
        let help = render_custom_help();
        assert!(help.contains("Catalog:"));
        assert!(help.contains("--taxonomy"));
    }
}
