use arboard::Clipboard;
use std::time::{Duration, Instant};
use tracing::{error, info, trace};

use crate::catalog::{MANUFACTURER, MODEL};
use crate::domain::{HELP_TEXT, HclError, Message};
use crate::filter::Selection;
use crate::ui::{FILTER_BAR_HEIGHT, STATUSLINE_HEIGHT, TABLE_HEADER_HEIGHT};
use crate::view::CatalogView;

const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    HELP,
}

pub struct Model {
    view: CatalogView,
    pub status: Status,
    modus: Modus,
    focused_filter: usize,
    curser_row: usize,
    offset_row: usize,
    table_height: usize,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(view: CatalogView, ui_height: usize) -> Self {
        let mut model = Self {
            view,
            status: Status::READY,
            modus: Modus::TABLE,
            focused_filter: 0,
            curser_row: 0,
            offset_row: 0,
            table_height: 0,
            clipboard: None,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.ui_resize(ui_height);
        model.set_status_message(format!(
            "Showing {} of {} devices",
            model.view.records().len(),
            model.view.total()
        ));
        model
    }

    pub fn view(&self) -> &CatalogView {
        &self.view
    }

    pub fn focused_filter(&self) -> usize {
        self.focused_filter
    }

    /// Selected row relative to the first visible row.
    pub fn curser_row(&self) -> usize {
        self.curser_row
    }

    pub fn offset_row(&self) -> usize {
        self.offset_row
    }

    pub fn table_height(&self) -> usize {
        self.table_height
    }

    pub fn status_message(&self) -> &str {
        if self.last_status_message_update.elapsed() > STATUS_MESSAGE_TIMEOUT {
            ""
        } else {
            &self.status_message
        }
    }

    pub fn help(&self) -> Option<&'static str> {
        (self.modus == Modus::HELP).then_some(HELP_TEXT)
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    pub fn quit(&mut self) {
        info!("Quitting");
        self.status = Status::QUITTING;
    }

    fn ui_resize(&mut self, height: usize) {
        self.table_height = height
            .saturating_sub(FILTER_BAR_HEIGHT + STATUSLINE_HEIGHT + TABLE_HEADER_HEIGHT)
            .max(1);
        trace!("Table height {}", self.table_height);
        self.move_selection_beginning();
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), HclError> {
        if let Some(msg) = message {
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::Help => self.modus = Modus::HELP,
                    Message::MoveUp => self.move_selection_up(1),
                    Message::MoveDown => self.move_selection_down(1),
                    Message::MovePageUp => self.move_selection_up(self.table_height),
                    Message::MovePageDown => self.move_selection_down(self.table_height),
                    Message::MoveBeginning => self.move_selection_beginning(),
                    Message::MoveEnd => self.move_selection_end(),
                    Message::NextFilter => self.focus_filter(1),
                    Message::PreviousFilter => self.focus_filter(-1),
                    Message::NextOption => self.cycle_option(1)?,
                    Message::PreviousOption => self.cycle_option(-1)?,
                    Message::ClearFilter => self.clear_filter()?,
                    Message::ResetFilters => self.reset_filters()?,
                    Message::CopyRow => self.copy_row(),
                    Message::Resize(_, height) => self.ui_resize(height),
                    Message::Exit => (),
                },
                Modus::HELP => match msg {
                    Message::Quit => self.quit(),
                    Message::Resize(_, height) => self.ui_resize(height),
                    Message::Help | Message::Exit => self.modus = Modus::TABLE,
                    _ => (),
                },
            }
        }
        Ok(())
    }

    // -------------------- Filter handling functions ---------------------- //

    fn focus_filter(&mut self, step: isize) {
        let n = self.view.filters().len() as isize;
        if n == 0 {
            return;
        }
        self.focused_filter = (self.focused_filter as isize + step).rem_euclid(n) as usize;
        let message = format!("Filter: {}", self.view.filters()[self.focused_filter].title);
        self.set_status_message(message);
    }

    fn cycle_option(&mut self, step: isize) -> Result<(), HclError> {
        let Some(filter) = self.view.filters().get(self.focused_filter) else {
            return Ok(());
        };
        let n = filter.options.len() as isize;
        let current = filter.selected_index().unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(n) as usize;
        let control = filter.control.clone();
        let selection = Selection::from_control(&filter.options[next].value);
        self.apply_selection(&control, selection)
    }

    fn clear_filter(&mut self) -> Result<(), HclError> {
        let Some(filter) = self.view.filters().get(self.focused_filter) else {
            return Ok(());
        };
        let control = filter.control.clone();
        self.apply_selection(&control, Selection::Unset)
    }

    fn apply_selection(&mut self, control: &str, selection: Selection) -> Result<(), HclError> {
        self.view.select(control, selection)?;
        self.move_selection_beginning();
        self.set_status_message(format!(
            "Showing {} of {} devices",
            self.view.records().len(),
            self.view.total()
        ));
        Ok(())
    }

    fn reset_filters(&mut self) -> Result<(), HclError> {
        self.view.reset()?;
        self.move_selection_beginning();
        self.set_status_message("Filters reset");
        Ok(())
    }

    // -------------------- Table navigation functions ---------------------- //

    fn nrows(&self) -> usize {
        self.view.records().len()
    }

    fn move_selection_beginning(&mut self) {
        self.curser_row = 0;
        self.offset_row = 0;
    }

    fn move_selection_end(&mut self) {
        let nrows = self.nrows();
        if nrows == 0 {
            return self.move_selection_beginning();
        }
        if nrows < self.table_height {
            self.offset_row = 0;
            self.curser_row = nrows - 1;
        } else {
            self.offset_row = nrows - self.table_height;
            self.curser_row = self.table_height - 1;
        }
    }

    fn move_selection_up(&mut self, size: usize) {
        if self.curser_row >= size {
            // Curser stays within the visible rows
            self.curser_row -= size;
        } else {
            // Curser hits the top, shift the table up by what is left
            self.offset_row = self.offset_row.saturating_sub(size - self.curser_row);
            self.curser_row = 0;
        }
    }

    fn move_selection_down(&mut self, size: usize) {
        let nrows = self.nrows();
        if self.curser_row + self.offset_row + 1 >= nrows {
            return;
        }
        if self.curser_row < self.table_height - 1 {
            self.curser_row = std::cmp::min(
                self.curser_row + size,
                std::cmp::min(self.table_height, nrows - self.offset_row) - 1,
            );
        } else {
            // At the bottom of the table, need to shift table down
            self.offset_row = std::cmp::min(self.offset_row + size, nrows - self.table_height);
        }
    }

    // -------------------- Clipboard functions ---------------------- //

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.chars().any(|c| c == '"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn selected_record_csv(&self) -> Option<String> {
        let record = self.view.records().get(self.offset_row + self.curser_row)?;
        Some(
            record
                .values()
                .iter()
                .map(|v| Model::wrap_cell_content(v))
                .collect::<Vec<String>>()
                .join(","),
        )
    }

    fn selected_device_name(&self) -> Option<String> {
        let record = self.view.records().get(self.offset_row + self.curser_row)?;
        let manufacturer = self.view.field(record, MANUFACTURER).ok()?;
        let model = self.view.field(record, MODEL).ok()?;
        Some(format!("{manufacturer} {model}"))
    }

    fn copy_row(&mut self) {
        let Some(content) = self.selected_record_csv() else {
            return;
        };
        let name = self.selected_device_name().unwrap_or_default();
        if self.clipboard.is_none() {
            self.clipboard = Clipboard::new()
                .map_err(|e| error!("Clipboard unavailable: {:?}", e))
                .ok();
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            self.set_status_message("Clipboard unavailable");
            return;
        };
        match clipboard.set_text(content) {
            Ok(_) => {
                trace!("Copied device to clipboard.");
                self.set_status_message(format!("Copied {name} to clipboard"));
            }
            Err(e) => trace!("Error copying to clipboard: {:?}", e),
        }
    }
}
