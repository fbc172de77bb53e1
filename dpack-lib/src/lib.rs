use serde::{Deserialize, Serialize};

/// Shared configuration for the dpack CLI and any embedding code.
///
/// Every field is optional so that partial configs from the environment,
/// a config file and the command line can be merged by priority.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub output: Option<String>,
    pub config: Option<String>,
    pub dry: Option<bool>,
    pub max_size: Option<u64>,
    pub before: Option<String>,
    pub after: Option<String>,
    pub paths: Option<Vec<String>>,
    pub skip: Option<Vec<String>>,
    pub store: Option<bool>,
}
