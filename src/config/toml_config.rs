use crate::adapters::table_io::SUPPORTED_EXTENSIONS;
use crate::core::readmission::{ReadmissionParams, DEFAULT_DAYS_THRESHOLD, DEFAULT_EMERGENCY_CODE};
use crate::domain::model::{EmergencyMode, VisitColumns};
use crate::utils::error::{Result, WranglerError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

const MAX_DAYS_THRESHOLD: i64 = 3650;

/// Explicit configuration document. Nothing in the library loads this on its
/// own; callers read it and pass the pieces down.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WranglerConfig {
    #[serde(default)]
    pub columns: VisitColumns,
    #[serde(default)]
    pub readmission: ReadmissionConfig,
    pub concat: Option<ConcatConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadmissionConfig {
    pub cancer_codes: Vec<String>,
    pub days_threshold: i64,
    pub emergency: String,
    pub emergency_code: String,
    pub filter_by_diagnosis: bool,
}

impl Default for ReadmissionConfig {
    fn default() -> Self {
        Self {
            cancer_codes: Vec::new(),
            days_threshold: DEFAULT_DAYS_THRESHOLD,
            emergency: EmergencyMode::All.as_str().to_string(),
            emergency_code: DEFAULT_EMERGENCY_CODE.to_string(),
            filter_by_diagnosis: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcatConfig {
    pub folder: Option<String>,
    pub file_name: Option<String>,
    #[serde(default)]
    pub periods: Vec<String>,
    pub features: Option<Vec<String>>,
}

impl WranglerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| WranglerError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| WranglerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_ROOT})
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn emergency_mode(&self) -> Result<EmergencyMode> {
        self.readmission.emergency.parse().map_err(|_| {
            WranglerError::InvalidConfigValueError {
                field: "readmission.emergency".to_string(),
                value: self.readmission.emergency.clone(),
                reason: "Expected one of: all, Y, N".to_string(),
            }
        })
    }

    pub fn readmission_params(&self) -> Result<ReadmissionParams> {
        Ok(ReadmissionParams {
            cancer_codes: self.readmission.cancer_codes.clone(),
            days_threshold: self.readmission.days_threshold,
            emergency: self.emergency_mode()?,
            emergency_code: self.readmission.emergency_code.clone(),
            filter_by_diagnosis: self.readmission.filter_by_diagnosis,
        })
    }

    pub fn validate_config(&self) -> Result<()> {
        for (key, name) in self.columns.all() {
            validation::validate_non_empty_string(&format!("columns.{}", key), name)?;
        }

        validation::validate_range(
            "readmission.days_threshold",
            self.readmission.days_threshold,
            0,
            MAX_DAYS_THRESHOLD,
        )?;
        self.emergency_mode()?;
        validation::validate_non_empty_string(
            "readmission.emergency_code",
            &self.readmission.emergency_code,
        )?;

        if self.readmission.filter_by_diagnosis && self.readmission.cancer_codes.is_empty() {
            return Err(WranglerError::ConfigValidationError {
                field: "readmission.cancer_codes".to_string(),
                message: "filter_by_diagnosis is enabled but no cancer codes are listed"
                    .to_string(),
            });
        }

        if let Some(concat) = &self.concat {
            if let Some(folder) = &concat.folder {
                validation::validate_path("concat.folder", folder)?;
            }
            if let Some(file_name) = &concat.file_name {
                validation::validate_file_extension(
                    "concat.file_name",
                    file_name,
                    SUPPORTED_EXTENSIONS,
                )?;
            }
            for period in &concat.periods {
                validation::validate_non_empty_string("concat.periods", period)?;
            }
        }

        Ok(())
    }
}

impl Validate for WranglerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
