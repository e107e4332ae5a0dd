use csv::WriterBuilder;

use crate::extract::error::ExtractError;
use crate::extract::model::Table;

pub fn write_csv_to_string(table: &Table, delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(false)
        .from_writer(Vec::<u8>::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes).map_err(|error| ExtractError::Utf8(error.to_string()))
}
