use crate::catalog::CatalogConfig;
use crate::domain::HclError;
use crate::store::Record;
use crate::table::{DisplayRow, HIDDEN_CLASS, LINE_BREAK};

pub const TABLE_ID: &str = "ups_list";
pub const BODY_ID: &str = "ups_list_body";

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn cell_html(text: &str) -> String {
    text.split(LINE_BREAK)
        .map(html_escape)
        .collect::<Vec<_>>()
        .join("<br />")
}

/// Table rows only, as placed inside the table body.
pub fn render_rows(rows: &[DisplayRow]) -> String {
    let mut s = String::new();
    for row in rows {
        s.push_str("<tr>");
        for cell in row.cells.iter() {
            s.push_str(&format!(
                "<td class='{}' rowspan='{}'>{}</td>",
                html_escape(&cell.style_class),
                cell.span,
                cell_html(&cell.text)
            ));
        }
        s.push_str("</tr>\n");
    }
    s
}

/// Complete table with header. The support level column stays in the markup
/// for text browsers but carries the hidden class.
pub fn render_table(config: &CatalogConfig, rows: &[DisplayRow]) -> String {
    let mut s = format!("<table id='{TABLE_ID}' border='1'>\n<thead><tr>");
    for column in config.columns.iter() {
        let class = if column.hidden {
            format!(" class='{HIDDEN_CLASS}'")
        } else {
            String::new()
        };
        s.push_str(&format!(
            "<td id='{}-col'{}>{}</td>",
            html_escape(&column.name),
            class,
            html_escape(&column.title)
        ));
    }
    s.push_str("</tr></thead>\n");
    s.push_str(&format!("<tbody id='{BODY_ID}'>\n"));
    s.push_str(&render_rows(rows));
    s.push_str("</tbody>\n</table>\n");
    s
}

/// Raw device data as a JSON array of field arrays, in schema order.
pub fn render_device_data(records: &[Record]) -> Result<String, HclError> {
    Ok(serde_json::to_string(records)?)
}
