use crate::cli::args::CliArgs;
use crate::classify::{FilterLevel, Taxonomy};
use crate::output::OutputFormat;

/// Rejects a level the taxonomy offers no filter for.
pub fn check_level_offered(taxonomy: Taxonomy, level: FilterLevel) -> Result<(), String> {
    if FilterLevel::offered(taxonomy).contains(&level) {
        Ok(())
    } else {
        Err(format!(
            "level '{}' is not available with the {} taxonomy",
            level.token(),
            taxonomy.name()
        ))
    }
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    let mut taxonomy = None;
    if let Some(raw) = args.taxonomy.as_deref() {
        taxonomy = Some(
            Taxonomy::parse(raw)
                .ok_or_else(|| format!("invalid --taxonomy '{raw}', expected graded or merged"))?,
        );
    }
    if let Some(raw) = args.level.as_deref() {
        if !raw.trim().is_empty() {
            let level = FilterLevel::parse(raw)
                .ok_or_else(|| format!("invalid --level '{raw}', expected 1, 2, 3, 4 or U"))?;
            if let Some(taxonomy) = taxonomy {
                check_level_offered(taxonomy, level)?;
            }
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        let format = OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected text, json or html"))?;
        if format == OutputFormat::Html && args.show.is_some() {
            return Err("--show supports text and json output only".to_string());
        }
    }
    if let Some(raw) = args.input.as_deref() {
        if raw.trim().is_empty() {
            return Err("invalid --input, expected a file path or URL".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["drugcat"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn accepts_known_values() {
        assert!(validate(&args(&["-x", "graded", "-l", "u", "-A", "html"])).is_ok());
        assert!(validate(&args(&["-x", "merged", "-l", "3"])).is_ok());
    }

    #[test]
    fn rejects_unclassified_level_for_merged_taxonomy() {
        assert!(validate(&args(&["-x", "merged", "-l", "U"])).is_err());
        assert!(validate(&args(&["-x", "b", "-l", " u "])).is_err());
    }

    #[test]
    fn rejects_unknown_taxonomy_and_level() {
        assert!(validate(&args(&["--taxonomy", "c"])).is_err());
        assert!(validate(&args(&["--level", "5"])).is_err());
    }

    #[test]
    fn rejects_html_detail() {
        assert!(validate(&args(&["-s", "A", "-A", "html"])).is_err());
    }
}
