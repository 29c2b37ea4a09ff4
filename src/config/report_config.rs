use crate::config::cli::Cli;
use crate::core::normalize::FieldChains;
use crate::core::ConfigProvider;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportConfig {
    pub api: ApiConfig,
    pub load: LoadConfig,
    pub chart: ChartConfig,
    /// Field-priority chains; override any of them here when the backend
    /// renames a field instead of patching call sites.
    pub fields: FieldChains,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChartConfig {
    pub window: Option<usize>,
}

impl ReportConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReportError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| ReportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// `${VAR}` placeholders resolve from the environment; unknown vars stay
    /// as-is so validation can point at them.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static regex");
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// CLI flags outrank file values.
    pub fn merged_with(mut self, cli: &Cli) -> Self {
        if let Some(base_url) = &cli.base_url {
            self.api.base_url = base_url.clone();
        }
        if let Some(output_path) = &cli.output_path {
            self.load.output_path = output_path.clone();
        }
        if let Some(window) = cli.chart_window {
            self.chart.window = Some(window);
        }
        self
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        if let Some(window) = self.chart.window {
            validation::validate_positive_number("chart.window", window, 1)?;
        }
        if self.fields.date.is_empty() {
            return Err(ReportError::ConfigValidationError {
                field: "fields.date".to_string(),
                message: "date field chain cannot be empty".to_string(),
            });
        }
        if self.fields.amount.is_empty() {
            return Err(ReportError::ConfigValidationError {
                field: "fields.amount".to_string(),
                message: "amount field chain cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl ConfigProvider for ReportConfig {
    fn base_url(&self) -> &str {
        &self.api.base_url
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn chart_window(&self) -> Option<usize> {
        self.chart.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url(), "http://localhost:3001/api");
        assert_eq!(config.output_path(), "./output");
        assert!(config.chart_window().is_none());
    }

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[api]
base_url = "https://api.example.com"

[load]
output_path = "./reports"

[chart]
window = 30
"#;
        let config = ReportConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.load.output_path, "./reports");
        assert_eq!(config.chart.window, Some(30));
        // Untouched sections keep the built-in chains.
        assert_eq!(config.fields.date[0], "date");
    }

    #[test]
    fn test_field_chain_override() {
        let toml_content = r#"
[fields]
amount = ["amountUSDT", "amount"]
"#;
        let config = ReportConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.fields.amount, vec!["amountUSDT", "amount"]);
        assert_eq!(config.fields.date[0], "date");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("EST_TEST_API", "https://test.api.com");
        let toml_content = r#"
[api]
base_url = "${EST_TEST_API}"
"#;
        let config = ReportConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.base_url, "https://test.api.com");
        std::env::remove_var("EST_TEST_API");
    }

    #[test]
    fn test_invalid_url_fails_validation() {
        let toml_content = r#"
[api]
base_url = "not-a-url"
"#;
        let config = ReportConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[api]
base_url = "https://api.example.com"
"#;
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let config = ReportConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com");
    }

    #[test]
    fn test_empty_field_chain_fails_validation() {
        let toml_content = r#"
[fields]
date = []
"#;
        let config = ReportConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }
}
