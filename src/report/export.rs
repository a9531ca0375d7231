use std::io::Write;

use super::views::MatrixView;

/// Write a grid as CSV: a header of column labels, then one record per labelled row.
pub fn write_matrix_csv<T, W, F>(
    writer: W,
    view: &MatrixView<T>,
    cell: F,
) -> Result<(), csv::Error>
where
    W: Write,
    F: Fn(&T) -> String,
{
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(view.columns.len() + 1);
    header.push(String::new());
    header.extend(view.columns.iter().cloned());
    csv_writer.write_record(&header)?;

    for (label, row) in view.rows_with_labels() {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(label.to_string());
        record.extend(row.iter().map(&cell));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}
