use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState},
};

use crate::model::Model;
use crate::table::{BAND_CLASSES, DisplayCell, DisplayRow, LINE_BREAK};

pub const FILTER_BAR_HEIGHT: usize = 3;
pub const STATUSLINE_HEIGHT: usize = 1;
// Header line plus the table borders
pub const TABLE_HEADER_HEIGHT: usize = 3;
const HIDDEN_COLUMN_WIDTH: u16 = 15;
const ODD_BAND_BACKGROUND: Color = Color::Indexed(236);

/// For every display row, the cell visible in each column and whether the cell
/// starts in that row. Columns without any cell stay `None`.
pub fn cell_grid(rows: &[DisplayRow], ncols: usize) -> Vec<Vec<Option<(&DisplayCell, bool)>>> {
    let mut grid = Vec::with_capacity(rows.len());
    let mut open: Vec<Option<(&DisplayCell, usize)>> = vec![None; ncols];
    for row in rows {
        for cell in row.cells.iter() {
            open[cell.column] = Some((cell, cell.span));
        }
        let line = open
            .iter_mut()
            .map(|slot| match slot {
                Some((cell, remaining)) if *remaining > 0 => {
                    let first = *remaining == cell.span;
                    *remaining -= 1;
                    Some((*cell, first))
                }
                _ => None,
            })
            .collect();
        grid.push(line);
    }
    grid
}

pub fn cell_style(style_class: &str) -> Style {
    let mut style = Style::default();
    for class in style_class.split_whitespace() {
        style = match class {
            c if c == BAND_CLASSES[1] => style.bg(ODD_BAND_BACKGROUND),
            "red" => style.fg(Color::Red),
            "orange" => style.fg(Color::Indexed(208)),
            "yellow" => style.fg(Color::Yellow),
            "blue" => style.fg(Color::Blue),
            "green" => style.fg(Color::Green),
            _ => style,
        };
    }
    style
}

fn cell_text(text: &str) -> String {
    text.split(LINE_BREAK)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[derive(Default)]
pub struct CatalogUI {
    table_state: TableState,
}

impl CatalogUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let [filter_area, table_area, status_area] = Layout::vertical([
            Constraint::Length(FILTER_BAR_HEIGHT as u16),
            Constraint::Min(0),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        self.draw_filters(model, frame, filter_area);
        self.draw_table(model, frame, table_area);
        self.draw_statusline(model, frame, status_area);

        if let Some(help) = model.help() {
            let lines: Vec<Line> = help.lines().map(Line::from).collect();
            let area = centered(frame.area(), 60, lines.len() as u16 + 2);
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(lines).block(Block::bordered().title(" Help ")),
                area,
            );
        }
    }

    fn draw_filters(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for (idx, filter) in model.view().filters().iter().enumerate() {
            if idx > 0 {
                spans.push(Span::raw(" │ "));
            }
            let label = filter
                .selected_index()
                .map(|i| filter.options[i].label.clone())
                .unwrap_or_else(|| filter.selection.control_value().to_string());
            let text = format!("{}: {}", filter.title, label);
            let span = if idx == model.focused_filter() {
                Span::styled(text, Style::default().add_modifier(Modifier::REVERSED))
            } else if filter.selection.is_set() {
                Span::styled(text, Style::default().add_modifier(Modifier::BOLD))
            } else {
                Span::raw(text)
            };
            spans.push(span);
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans)).block(Block::bordered().title(" Filters ")),
            area,
        );
    }

    fn draw_table(&mut self, model: &Model, frame: &mut Frame, area: Rect) {
        let view = model.view();
        let columns = &view.config().columns;

        let header = Row::new(columns.iter().map(|c| Cell::from(c.title.clone()))).bold();
        let widths: Vec<Constraint> = columns
            .iter()
            .map(|c| {
                if c.hidden {
                    Constraint::Length(HIDDEN_COLUMN_WIDTH)
                } else {
                    Constraint::Fill(1)
                }
            })
            .collect();

        let grid = cell_grid(view.rows(), columns.len());
        let rows = grid
            .iter()
            .skip(model.offset_row())
            .take(model.table_height())
            .enumerate()
            .map(|(idx, line)| {
                // A merged cell scrolled partly out of view shows its text on the top row
                let top = idx == 0;
                Row::new(line.iter().map(move |slot| match slot {
                    Some((cell, first)) if *first || top => {
                        Cell::from(cell_text(&cell.text)).style(cell_style(&cell.style_class))
                    }
                    Some((cell, _)) => Cell::from("").style(cell_style(&cell.style_class)),
                    None => Cell::from(""),
                }))
            });

        let title = format!(
            " Hardware compatibility list [{}/{}] ",
            view.records().len(),
            view.total()
        );
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::bordered().title(title))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        *self.table_state.offset_mut() = 0;
        self.table_state.select(Some(model.curser_row()));
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_statusline(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::raw(model.status_message().to_string()),
            Span::raw("  "),
            "?".blue().bold(),
            Span::raw(" help  "),
            "q".blue().bold(),
            Span::raw(" quit"),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}
