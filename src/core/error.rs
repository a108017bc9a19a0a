use thiserror::Error;

// * Startup errors: settings, patterns, and module registration.
// * All of these are fatal to building an analyzer.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid noise selector '{0}'")]
    InvalidSelector(String),

    #[error("Invalid regex for pattern '{name}' ({lang}): {source}")]
    InvalidPattern {
        lang: String,
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Module '{0}' is registered more than once")]
    DuplicateModule(String),

    #[error("Module '{0}' declares a field that is not part of the result schema")]
    UnknownField(String),
}

// * Raised by the resolver when the active module set has no valid order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Circular dependency detected! Modules in cycle: {}", modules.join(", "))]
pub struct CycleError {
    // * Sorted names of every module that could not be scheduled
    pub modules: Vec<String>,
}

// * The only error that escapes `analyze()`. Everything else degrades to "field not found".
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Module dependency error: {0}")]
    Dependency(#[from] CycleError),
}

// * Returned by an individual module. The executor logs it and moves on.
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("Module panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Failed(String),
}
