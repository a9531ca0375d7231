use super::views::{MatrixView, RecordSummaryView};

/// Render a grid as a plain fixed-width table, one line per row.
pub fn render_matrix<T, F>(view: &MatrixView<T>, cell: F) -> String
where
    F: Fn(&T) -> String,
{
    let rendered: Vec<Vec<String>> = view
        .cells
        .iter()
        .map(|row| row.iter().map(&cell).collect())
        .collect();

    let label_width = view
        .rows
        .iter()
        .map(|label| label.chars().count())
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = view
        .columns
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rendered
                .iter()
                .filter_map(|row| row.get(index))
                .map(|text| text.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = format!("{:label_width$}", "");
    out.extend(
        view.columns
            .iter()
            .zip(&widths)
            .map(|(header, width)| format!(" | {header:width$}")),
    );
    out.push('\n');

    for (label, row) in view.rows.iter().zip(&rendered) {
        out.push_str(&format!("{label:label_width$}"));
        out.extend(
            row.iter()
                .zip(&widths)
                .map(|(text, width)| format!(" | {text:width$}")),
        );
        out.push('\n');
    }
    out
}

pub fn render_record_summary(view: &RecordSummaryView) -> String {
    let header = format!(
        "{} [{}, {}] mean {:.2} ({}) {}/{} applicable\n",
        view.title,
        view.assessment_type,
        view.status,
        view.summary.mean,
        view.summary.label,
        view.summary.applicable,
        view.summary.total
    );
    view.scores
        .iter()
        .map(|line| {
            let choice = line.choice.as_deref().unwrap_or("");
            format!(
                "  {} / {}: {} {}\n",
                line.question, line.metric, line.score, choice
            )
        })
        .fold(header, |mut out, line| {
            out.push_str(&line);
            out
        })
}
