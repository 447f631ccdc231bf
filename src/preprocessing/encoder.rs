//! Categorical encoding implementations

use crate::error::{BuilderError, Result};
use super::column_strings;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Label used for a missing value in a text target
pub const MISSING_LABEL: &str = "nan";

/// Type of encoder to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EncoderType {
    /// One-hot encoding; with `drop_first` the lowest category of each
    /// column gets no indicator column
    OneHot { drop_first: bool },
    /// Label encoding (ordinal), categories in sorted order
    Label,
}

/// Categorical feature encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    encoder_type: EncoderType,
    // column name -> sorted categories
    mappings: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl Encoder {
    /// Create a new encoder
    pub fn new(encoder_type: EncoderType) -> Self {
        Self {
            encoder_type,
            mappings: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit the encoder to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.mappings.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| BuilderError::FeatureNotFound(col_name.to_string()))?;
            let categories: BTreeSet<String> =
                column_strings(column)?.into_iter().flatten().collect();
            self.mappings
                .push((col_name.to_string(), categories.into_iter().collect()));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BuilderError::ModelNotFitted);
        }

        match &self.encoder_type {
            EncoderType::OneHot { drop_first } => self.transform_onehot(df, *drop_first),
            EncoderType::Label => self.transform_label(df),
        }
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Sorted categories learned for a column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.mappings
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cats)| cats.as_slice())
    }

    /// Encoded columns are removed; indicator columns are appended after the
    /// untouched ones, grouped by source column.
    fn transform_onehot(&self, df: &DataFrame, drop_first: bool) -> Result<DataFrame> {
        let mut result = df.clone();
        let mut indicators = Vec::new();

        for (col_name, categories) in &self.mappings {
            let column = df
                .column(col_name)
                .map_err(|_| BuilderError::FeatureNotFound(col_name.clone()))?;
            let values = column_strings(column)?;

            let skip = usize::from(drop_first);
            for category in categories.iter().skip(skip) {
                let indicator: Vec<f64> = values
                    .iter()
                    .map(|v| if v.as_deref() == Some(category.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                let name = format!("{}_{}", col_name, category);
                indicators.push(Series::new(name.into(), indicator));
            }

            result = result.drop(col_name)?;
        }

        for indicator in indicators {
            result.with_column(indicator)?;
        }
        Ok(result)
    }

    fn transform_label(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();

        for (col_name, categories) in &self.mappings {
            let column = df
                .column(col_name)
                .map_err(|_| BuilderError::FeatureNotFound(col_name.clone()))?;

            let values: Vec<Option<i64>> = column_strings(column)?
                .into_iter()
                .map(|v| {
                    v.and_then(|s| categories.binary_search(&s).ok().map(|i| i as i64))
                })
                .collect();

            result.with_column(Series::new(col_name.as_str().into(), values))?;
        }

        Ok(result)
    }
}

/// Encodes a target column to contiguous integer classes `0..k`.
///
/// Classes are the sorted distinct string renderings of the values; a
/// missing value becomes the class [`MISSING_LABEL`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit on a column and return its encoded values
    pub fn fit_transform(&mut self, column: &Column) -> Result<Vec<f64>> {
        let labels: Vec<String> = column_strings(column)?
            .into_iter()
            .map(|v| v.unwrap_or_else(|| MISSING_LABEL.to_string()))
            .collect();

        let classes: BTreeSet<&String> = labels.iter().collect();
        self.classes = classes.into_iter().cloned().collect();

        labels
            .iter()
            .map(|label| {
                self.classes
                    .binary_search(label)
                    .map(|idx| idx as f64)
                    .map_err(|_| BuilderError::PreprocessingError(format!("Unknown label '{}'", label)))
            })
            .collect()
    }

    /// Learned classes; position is the encoded value
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
