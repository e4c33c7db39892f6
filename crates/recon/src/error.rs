use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// Column label is empty or contains characters outside A-Z.
    InvalidColumnLabel(String),
    /// No module columns were configured.
    NoModuleColumns,
    /// Location mode is `column` but no location column was given.
    MissingLocationColumn,
    /// Source sheet has no occupied cells at all.
    EmptySource,
    /// Named sheet is not present in the source document.
    UnknownSheet(String),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (blank name, bad output settings, etc.).
    ConfigValidation(String),
}

impl ReconError {
    /// Configuration errors are fatal and surface before any extraction.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidColumnLabel(_)
                | Self::NoModuleColumns
                | Self::MissingLocationColumn
                | Self::UnknownSheet(_)
                | Self::ConfigParse(_)
                | Self::ConfigValidation(_)
        )
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColumnLabel(label) => write!(
                f,
                "invalid column label '{label}': expected letters A-Z (A, B, ..., Z, AA, ...)"
            ),
            Self::NoModuleColumns => write!(f, "at least one module column is required"),
            Self::MissingLocationColumn => {
                write!(f, "location mode 'column' requires a location column")
            }
            Self::EmptySource => write!(f, "source sheet is empty"),
            Self::UnknownSheet(name) => write!(f, "sheet '{name}' not found in source"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
