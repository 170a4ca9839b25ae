use clap::{Parser, ValueEnum};
use scraper_core::{AppConfig, CoreError, FilterCriteria, OutputFormat, Source};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tumblr-scraper", version)]
#[command(about = "Scrape Tumblr posts by tag or blog and keep the ones matching your keywords")]
#[command(long_about = "\
Scrape Tumblr posts by tag or blog and keep the ones matching your keywords.

Without --tag or --blog every [[blogs]] entry of the configuration file is
scraped in turn, each into its own file.

Exit codes: 0 success, 2 stopped early (retries exhausted or interrupted),
1 fatal error.")]
pub struct Cli {
    /// Search posts with this tag
    #[arg(short, long, conflicts_with = "blog")]
    pub tag: Option<String>,

    /// Scrape posts from this blog (name or hostname)
    #[arg(short, long)]
    pub blog: Option<String>,

    /// Keywords to look for; a post matches if any of them is found
    #[arg(short, long, num_args = 1..)]
    pub keywords: Vec<String>,

    /// Maximum number of posts to keep [default: 50]
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output file name inside the output directory
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Csv)]
    pub format: FormatArg,

    /// Match keywords case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Only match keywords as whole words
    #[arg(long)]
    pub exact_match: bool,

    /// Minimum note count a post needs
    #[arg(long, default_value_t = 0)]
    pub min_notes: u64,

    /// Skip reblogged posts
    #[arg(long)]
    pub exclude_reblogs: bool,

    /// Posts requested per API call (1-20)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub page_size: Option<u32>,

    /// Configuration file [default: $TUMBLR_SCRAPER_CONFIG or ./tumblr_scraper.toml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not write tumblr_scraper.log into the output directory
    #[arg(long)]
    pub no_log_file: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

impl Cli {
    /// The single source to scrape, or `None` for batch mode.
    pub fn source(&self) -> Result<Option<Source>, CoreError> {
        match (&self.tag, &self.blog) {
            (Some(tag), _) => Source::tag(tag).map(Some),
            (None, Some(blog)) => Source::blog(blog).map(Some),
            (None, None) => Ok(None),
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(&self.keywords)
            .case_sensitive(self.case_sensitive)
            .exact_match(self.exact_match)
            .min_notes(self.min_notes)
            .exclude_reblogs(self.exclude_reblogs)
    }

    pub fn format(&self) -> OutputFormat {
        self.format.into()
    }

    /// Command-line values win over the configuration file.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(limit) = self.limit {
            config.scrape.limit = limit;
        }
        if let Some(page_size) = self.page_size {
            config.scrape.page_size = page_size;
        }
    }
}
