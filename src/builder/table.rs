use super::FragmentBuilder;
use crate::dom;
use crate::error::BuildResult;
use crate::fragment::{FragmentData, FragmentFields, TableData};
use crate::ftype::FType;
use markup5ever_rcdom::Handle;

fn cells(row: &Handle) -> Vec<Handle> {
    dom::element_children(row)
        .into_iter()
        .filter(|c| dom::is_tag(c, "th") || dom::is_tag(c, "td"))
        .collect()
}

/// Headers from the `th` cells of the first row, data rows from the rest.
/// Cells hold their inner HTML.
pub fn table_data(table: &Handle) -> BuildResult<TableData> {
    let rows = dom::descendants_by_tag(table, "tr");
    let mut data = TableData {
        headers: Vec::new(),
        rows: Vec::new(),
    };
    let mut body = rows.as_slice();

    if let Some(first) = rows.first() {
        let first_cells = cells(first);
        if !first_cells.is_empty() && first_cells.iter().all(|c| dom::is_tag(c, "th")) {
            for cell in &first_cells {
                data.headers.push(dom::inner_html(cell)?.trim().to_string());
            }
            body = &rows[1..];
        }
    }
    for row in body {
        let mut values = Vec::new();
        for cell in cells(row) {
            values.push(dom::inner_html(&cell)?.trim().to_string());
        }
        data.rows.push(values);
    }
    Ok(data)
}

impl FragmentBuilder<'_> {
    pub(crate) fn from_table(&mut self, tag: &Handle) -> BuildResult<FragmentFields> {
        let data = table_data(tag)?;
        Ok(FragmentFields::new(FType::Table, dom::outer_html(tag)?, FragmentData::Table(data))
            .with_classes(dom::classes(tag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_and_rows_keep_inner_html() {
        let nodes = dom::parse_body_fragment(
            "<table><thead><tr><th>A</th><th><em>B</em></th></tr></thead><tbody><tr><td>1</td><td><code>x</code></td></tr><tr><td>2</td><td>y</td></tr></tbody></table>",
        );
        let data = table_data(&nodes[0]).unwrap();
        assert_eq!(data.headers, vec!["A", "<em>B</em>"]);
        assert_eq!(
            data.rows,
            vec![vec!["1", "<code>x</code>"], vec!["2", "y"]]
        );
    }

    #[test]
    fn test_table_without_header_row() {
        let nodes = dom::parse_body_fragment("<table><tr><td>1</td></tr></table>");
        let data = table_data(&nodes[0]).unwrap();
        assert!(data.headers.is_empty());
        assert_eq!(data.rows, vec![vec!["1"]]);
    }
}
