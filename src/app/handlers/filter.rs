// SPDX-License-Identifier: GPL-3.0-only

//! Filter selection handler

use crate::app::state::{AppModel, Command, Stage};
use crate::filters::FilterType;
use tracing::{debug, info};

impl AppModel {
    /// Pure state change; the preview picks it up on the next frame
    pub(crate) fn handle_select_filter(&mut self, filter: FilterType) -> Vec<Command> {
        if self.stage != Stage::Live {
            debug!(stage = ?self.stage, ?filter, "Filter bar not shown, ignoring selection");
            return Vec::new();
        }
        if self.filter != filter {
            info!(filter = ?filter, expression = filter.expression(), "Filter selected");
            self.filter = filter;
        }
        Vec::new()
    }
}
