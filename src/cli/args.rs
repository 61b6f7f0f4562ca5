use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "drugcat",
    version,
    about = "regulated-substance catalog viewer",
    long_about = "Drugcat loads a JSON catalog of regulated substances, groups the entries by classification level and renders them as a terminal listing, a JSON view model or a static HTML page.\n\nExamples:\n  drugcat -i ./常見濫用管制藥品資料集.json\n  drugcat -i ./data.json -l 2 -o catalog.html\n  drugcat -i https://host.tld/data.json -x merged -A json\n  drugcat -i ./data.json -s 安非他命\n\nTip: Use --config to persist the dataset location and output settings."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'i',
        long = "in",
        visible_alias = "input",
        value_name = "PATH|URL",
        help_heading = "Input",
        help = "Dataset JSON file or http(s) URL (defaults to ./常見濫用管制藥品資料集.json)."
    )]
    pub input: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.drugcat/config.yml with --init-config)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write a default config file if none exists, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'x',
        long = "tx",
        visible_alias = "taxonomy",
        value_name = "NAME",
        help_heading = "Catalog",
        help = "Classification scheme: graded (levels 1-4 + unclassified) or merged (levels 1, 2, 2-3, 4)."
    )]
    pub taxonomy: Option<String>,

    #[arg(
        short = 'l',
        long = "lv",
        visible_alias = "level",
        value_name = "LEVEL",
        help_heading = "Catalog",
        help = "Highlight entries of one level (1, 2, 3, 4 or U) and collapse the other sections."
    )]
    pub level: Option<String>,

    #[arg(
        short = 's',
        long = "sh",
        visible_alias = "show",
        value_name = "NAME",
        help_heading = "Catalog",
        help = "Show the detail view of one entry by name."
    )]
    pub show: Option<String>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write output to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json, html)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 't',
        long = "ttl",
        visible_alias = "title",
        value_name = "TEXT",
        help_heading = "Output",
        help = "Page title for HTML output."
    )]
    pub title: Option<String>,
}
