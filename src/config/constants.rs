// * Configuration Constants
// * Central location for scores and thresholds shared by the pipeline and its modules

// * Score given to candidates mined from the specifications table
pub const ENRICHMENT_SCORE: i32 = 150;

// * Default language when detection and configuration both come up empty
pub const DEFAULT_LANGUAGE: &str = "en";

// * Minimum stopword hits before the text vote is trusted over the default
pub const MIN_STOPWORD_HITS: usize = 3;

// * Titles shorter than this are treated as noise (e.g. "Home")
pub const MIN_TITLE_LENGTH: usize = 5;

// * Breadcrumb trails outside this range are rejected as navigation noise
pub const MIN_BREADCRUMBS: usize = 2;
pub const MAX_BREADCRUMBS: usize = 10;
pub const MAX_BREADCRUMB_LENGTH: usize = 60;

// * Minimum length for a paragraph to count as a description candidate
pub const MIN_DESCRIPTION_LENGTH: usize = 40;

// * Default location of the YAML settings file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yml";
