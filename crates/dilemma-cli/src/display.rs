//! Table rendering for a forecast.
//!
//! Both tables are built as all-string RecordBatches so number formatting
//! stays under our control, then printed with Arrow's pretty printer.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use dilemma_core::{BiasCell, BiasTable, Forecast};
use dilemma_sync::IssueDocument;

const OPTION_COLUMNS: &[&str] = &["option", "datums", "net_result", "percent", "headline"];

/// Title, bias table, options table, then the issue links.
pub fn render(forecast: &Forecast, document: &IssueDocument) -> Result<String, ArrowError> {
    let bias = pretty_format_batches(&[bias_table_batch(&forecast.bias_table)?])?;
    let options = pretty_format_batches(&[options_batch(forecast)?])?;
    let leader = forecast
        .leader()
        .map(|o| format!("likely: {} ({}%)\n", o.display_label, optional(o.percent)))
        .unwrap_or_default();
    Ok(format!(
        "{}\n{bias}\n\n{options}\n{leader}\n{}\n{}\n",
        document.title,
        document.wiki_url(),
        document.dilemma_url()
    ))
}

pub fn bias_table_batch(table: &BiasTable) -> Result<RecordBatch, ArrowError> {
    let mut names = vec![table.census_label.clone(), "bias".to_string()];
    names.extend(table.columns.iter().cloned());

    let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(table.rows.len()); names.len()];
    for row in &table.rows {
        columns[0].push(row.category.clone());
        columns[1].push(decimal(row.bias));
        for (j, cell) in row.cells.iter().enumerate() {
            columns[2 + j].push(match cell {
                BiasCell::Delta(delta) => decimal(*delta),
                BiasCell::Percent(percent) => optional(*percent),
            });
        }
    }
    string_batch(&names, columns)
}

pub fn options_batch(forecast: &Forecast) -> Result<RecordBatch, ArrowError> {
    let behaviors = forecast.annotation_columns();
    let mut names: Vec<String> = OPTION_COLUMNS.iter().map(|s| s.to_string()).collect();
    names.extend(behaviors.iter().cloned());

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for option in &forecast.options {
        for row in option.display_rows() {
            columns[0].push(row.label.to_string());
            columns[1].push(optional(row.datums));
            columns[2].push(decimal(row.net_score));
            columns[3].push(optional(row.percent));
            columns[4].push(row.headline.to_string());
            for (j, behavior) in behaviors.iter().enumerate() {
                let policy = row.annotations.and_then(|a| a.get(behavior)).unwrap_or("");
                columns[OPTION_COLUMNS.len() + j].push(policy.to_string());
            }
        }
    }
    string_batch(&names, columns)
}

fn string_batch(names: &[String], columns: Vec<Vec<String>>) -> Result<RecordBatch, ArrowError> {
    let schema = Schema::new(
        names
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    );
    let arrays: Vec<ArrayRef> = columns
        .into_iter()
        .map(|values| Arc::new(StringArray::from(values)) as ArrayRef)
        .collect();
    RecordBatch::try_new(Arc::new(schema), arrays)
}

fn decimal(value: f64) -> String {
    format!("{value:.4}")
}

fn optional(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use dilemma_core::{
        BiasProfile, DisplayToggles, Exclusions, ForecastConfig, ForecastRequest, Forecaster,
        PolicyRules, TableRow,
    };

    fn forecast(rows: &[TableRow], exclusions: &Exclusions, toggles: DisplayToggles) -> Forecast {
        let profile: BiasProfile = [("Defense", 1.0), ("Economy", -1.0), ("Weather", 0.0)]
            .into_iter()
            .collect();
        Forecaster::new(ForecastConfig::default())
            .unwrap()
            .forecast(&ForecastRequest {
                nation: "testlandia",
                rows,
                profile: &profile,
                policies: &PolicyRules::default(),
                exclusions,
                toggles,
            })
            .unwrap()
    }

    fn rows() -> Vec<TableRow> {
        vec![
            TableRow::new(
                "1. Build tanks.",
                [
                    "2 Defense",
                    "abolishes policy: Pacifism",
                    "abolishes policy: Disarmament",
                ],
                Vec::<String>::new(),
            ),
            TableRow::new("2. Print money.", ["2 Economy", "1 Weather"], Vec::<String>::new()),
        ]
    }

    fn column<'a>(batch: &'a RecordBatch, name: &str) -> Vec<&'a str> {
        let col = batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        (0..col.len()).map(|i| col.value(i)).collect()
    }

    #[test]
    fn options_table_lays_out_sub_rows() {
        let forecast = forecast(&rows(), &Exclusions::new(), DisplayToggles::default());
        let batch = options_batch(&forecast).unwrap();
        // dismiss, option 1 over two annotation rows, option 2
        assert_eq!(batch.num_rows(), 4);
        assert_eq!(column(&batch, "option"), vec!["0.", "1.", "", "2."]);
        assert_eq!(column(&batch, "net_result")[0], "0.0000");
        assert_eq!(
            column(&batch, "abolishes"),
            vec!["", "Pacifism", "Disarmament", ""]
        );
        assert_eq!(column(&batch, "datums"), vec!["", "", "", ""]);
    }

    #[test]
    fn excluded_option_shows_negative_infinity() {
        let exclusions: Exclusions = ["1"].into_iter().collect();
        let forecast = forecast(&rows(), &exclusions, DisplayToggles::default());
        let batch = options_batch(&forecast).unwrap();
        let scores = column(&batch, "net_result");
        assert_eq!(scores[1], "-inf");
        assert_eq!(column(&batch, "percent")[1], "0");
    }

    #[test]
    fn bias_table_formats_four_decimals() {
        let forecast = forecast(&rows(), &Exclusions::new(), DisplayToggles::default());
        let batch = bias_table_batch(&forecast.bias_table).unwrap();
        assert_eq!(column(&batch, "census"), vec!["Defense", "Economy"]);
        assert_eq!(column(&batch, "bias"), vec!["1.0000", "-1.0000"]);
        assert_eq!(column(&batch, "1."), vec!["1.0000", "0.0000"]);
    }

    #[test]
    fn cumulative_bias_table_shows_percentages() {
        let toggles = DisplayToggles {
            zero_bias_filter: false,
            cumulative: true,
        };
        let forecast = forecast(&rows(), &Exclusions::new(), toggles);
        let batch = bias_table_batch(&forecast.bias_table).unwrap();
        assert_eq!(batch.num_columns(), 5);
        assert!(column(&batch, "0.").iter().all(|p| p.parse::<u32>().is_ok()));
    }

    #[test]
    fn render_includes_title_and_links() {
        let forecast = forecast(&rows(), &Exclusions::new(), DisplayToggles::default());
        let document = IssueDocument {
            number: 42,
            title: "#42 Tanks".to_string(),
            rows: rows(),
        };
        let out = render(&forecast, &document).unwrap();
        assert!(out.starts_with("#42 Tanks\n"));
        assert!(out.contains("Build tanks."));
        assert!(out.contains("likely: 1. (91%)"));
        assert!(out.contains("NationStates_Issue_No._42"));
        assert!(out.contains("dilemma=42"));
    }
}
