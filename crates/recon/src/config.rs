use serde::Deserialize;

use crate::column::{parse_column_label, parse_column_list};
use crate::error::ReconError;
use crate::validate::ModuleFormat;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub format: ModuleFormat,
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "shipcheck".into()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Source layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_true")]
    pub has_header_row: bool,
    pub apartment_column: String,
    #[serde(default)]
    pub location: LocationConfig,
    pub module_columns: ColumnList,
    /// Sheet to read; the first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
}

/// Module columns as `"D,E,F"` or `["D", "E", "F"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColumnList {
    Joined(String),
    List(Vec<String>),
}

impl ColumnList {
    fn resolve(&self) -> Result<Vec<usize>, ReconError> {
        match self {
            Self::Joined(s) => parse_column_list(s),
            Self::List(labels) => {
                let mut columns = Vec::new();
                for label in labels.iter().filter(|l| !l.trim().is_empty()) {
                    let index = parse_column_label(label)?;
                    if !columns.contains(&index) {
                        columns.push(index);
                    }
                }
                Ok(columns)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub mode: LocationKind,
    #[serde(default)]
    pub column: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// Every module in a row shares the row's location cell.
    Column,
    /// Each module column takes its location from its own header cell.
    Header,
    #[default]
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Write the run result as JSON to this path.
    #[serde(default)]
    pub json: Option<String>,
    /// Directory for generated documents.
    #[serde(default)]
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationMode {
    FixedColumn(usize),
    PerHeaderColumn,
    None,
}

/// Immutable, index-resolved view of the source configuration.
/// Every pipeline stage receives this instead of reading shared settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub has_header_row: bool,
    pub apartment_column: usize,
    pub location: LocationMode,
    pub module_columns: Vec<usize>,
    pub format: ModuleFormat,
}

impl SourceLayout {
    pub fn tracks_location(&self) -> bool {
        !matches!(self.location, LocationMode::None)
    }

    /// Columns that decide whether a row is occupied.
    pub fn columns_of_interest(&self) -> Vec<usize> {
        let mut columns = vec![self.apartment_column];
        if let LocationMode::FixedColumn(col) = self.location {
            columns.push(col);
        }
        columns.extend(&self.module_columns);
        columns
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be blank".into()));
        }

        if let Some(ref sheet) = self.source.sheet {
            if sheet.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "source.sheet must not be blank when given".into(),
                ));
            }
        }

        for (key, value) in [("output.json", &self.output.json), ("output.dir", &self.output.dir)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "{key} must not be blank when given"
                )));
            }
        }

        self.layout().map(|_| ())
    }

    /// Resolve column labels into indices.
    pub fn layout(&self) -> Result<SourceLayout, ReconError> {
        let src = &self.source;
        let apartment_column = parse_column_label(&src.apartment_column)?;

        let location = match src.location.mode {
            LocationKind::None => LocationMode::None,
            LocationKind::Header => LocationMode::PerHeaderColumn,
            LocationKind::Column => match src.location.column.as_deref().map(str::trim) {
                Some(label) if !label.is_empty() => {
                    LocationMode::FixedColumn(parse_column_label(label)?)
                }
                _ => return Err(ReconError::MissingLocationColumn),
            },
        };

        let module_columns = src.module_columns.resolve()?;
        if module_columns.is_empty() {
            return Err(ReconError::NoModuleColumns);
        }

        Ok(SourceLayout {
            has_header_row: src.has_header_row,
            apartment_column,
            location,
            module_columns,
            format: self.format.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
name = "Block 7"
format = "prefixed_13"

[source]
apartment_column = "B"
module_columns = "D,E,F"

[source.location]
mode = "column"
column = "C"
"#;

    #[test]
    fn parse_basic() {
        let config = ReconConfig::from_toml(BASIC).unwrap();
        assert_eq!(config.name, "Block 7");
        assert_eq!(config.format, ModuleFormat::Prefixed13);
        assert!(config.source.has_header_row);
        assert!(config.output.json.is_none());

        let layout = config.layout().unwrap();
        assert_eq!(layout.apartment_column, 1);
        assert_eq!(layout.location, LocationMode::FixedColumn(2));
        assert_eq!(layout.module_columns, vec![3, 4, 5]);
        assert_eq!(layout.columns_of_interest(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn module_columns_as_list() {
        let input = r#"
format = "digit_zri_10"

[source]
has_header_row = false
apartment_column = "a"
module_columns = ["c", " D ", ""]

[source.location]
mode = "header"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.name, "shipcheck");
        let layout = config.layout().unwrap();
        assert!(!layout.has_header_row);
        assert_eq!(layout.apartment_column, 0);
        assert_eq!(layout.location, LocationMode::PerHeaderColumn);
        assert_eq!(layout.module_columns, vec![2, 3]);
        assert_eq!(layout.format, ModuleFormat::DigitZri10);
    }

    #[test]
    fn location_defaults_to_none() {
        let input = r#"
[source]
apartment_column = "A"
module_columns = "B"
"#;
        let layout = ReconConfig::from_toml(input).unwrap().layout().unwrap();
        assert_eq!(layout.location, LocationMode::None);
        assert!(!layout.tracks_location());
        assert_eq!(layout.format, ModuleFormat::Prefixed13);
    }

    #[test]
    fn unknown_format_passes_through() {
        let input = r#"
format = "next_gen"

[source]
apartment_column = "A"
module_columns = "B"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.format, ModuleFormat::PassThrough("next_gen".into()));
    }

    #[test]
    fn reject_missing_location_column() {
        let input = r#"
[source]
apartment_column = "A"
module_columns = "B"

[source.location]
mode = "column"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert_eq!(err, ReconError::MissingLocationColumn);
        assert!(err.is_configuration());
    }

    #[test]
    fn reject_empty_module_columns() {
        let input = r#"
[source]
apartment_column = "A"
module_columns = " , "
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert_eq!(err, ReconError::NoModuleColumns);
    }

    #[test]
    fn reject_bad_column_label() {
        let input = r#"
[source]
apartment_column = "B2"
module_columns = "D"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::InvalidColumnLabel(ref l) if l == "B2"));
    }

    #[test]
    fn reject_invalid_location_mode() {
        let input = r#"
[source]
apartment_column = "A"
module_columns = "B"

[source.location]
mode = "sideways"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_blank_output_path() {
        let input = format!("{BASIC}\n[output]\njson = \"  \"\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("output.json"));
    }
}
