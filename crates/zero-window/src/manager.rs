//! `WindowManager`: a plain state machine, generic over the row identity
//! type (`Id`, used for permalink/anchor matching) and the caller's opaque
//! `listContextParams` blob (`Params`) (§4.7).

/// Minimum rows fetched per page, regardless of viewport size.
pub const MIN_PAGE_SIZE: usize = 100;

/// `max(MIN_PAGE_SIZE, ceil(viewport / estimateSize) * 3)` rows per page,
/// in the scroll direction (§4.7).
pub fn page_size(viewport_px: f64, estimate_size_px: f64) -> usize {
    if estimate_size_px <= 0.0 {
        return MIN_PAGE_SIZE;
    }
    let rows_per_viewport = (viewport_px / estimate_size_px).ceil().max(0.0) as usize;
    MIN_PAGE_SIZE.max(rows_per_viewport.saturating_mul(3))
}

/// A `WindowManager` specialized to `zero_core`'s row identity type, the
/// shape most callers reach for.
pub type RowWindowManager<Params> = WindowManager<zero_core::RowId, Params>;

pub struct WindowManager<Id, Params> {
    params: Option<Params>,
    first_row_index: usize,
    loaded: Vec<Id>,
    at_start: bool,
    at_end: bool,
    /// Max of every observed `firstRowIndex + rowsLength` (§4.7).
    max_seen_end: usize,
    permalink_id: Option<Id>,
    permalink_not_found: bool,
}

impl<Id, Params> Default for WindowManager<Id, Params> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id, Params> WindowManager<Id, Params> {
    pub fn new() -> Self {
        Self {
            params: None,
            first_row_index: 0,
            loaded: Vec::new(),
            at_start: true,
            at_end: false,
            max_seen_end: 0,
            permalink_id: None,
            permalink_not_found: false,
        }
    }

    pub fn first_row_index(&self) -> usize {
        self.first_row_index
    }

    pub fn loaded(&self) -> &[Id] {
        &self.loaded
    }

    pub fn at_start(&self) -> bool {
        self.at_start
    }

    pub fn at_end(&self) -> bool {
        self.at_end
    }

    pub fn permalink_not_found(&self) -> bool {
        self.permalink_not_found
    }

    /// `undefined` (here, `None`) until both edges have been reached, then
    /// `estimatedTotal` (§4.7).
    pub fn total(&self) -> Option<usize> {
        if self.at_start && self.at_end {
            Some(self.estimated_total())
        } else {
            None
        }
    }

    /// The max observed extent, plus one skeleton row while the tail is
    /// still unknown (§4.7).
    pub fn estimated_total(&self) -> usize {
        self.max_seen_end + if self.at_end { 0 } else { 1 }
    }

    fn reset(&mut self) {
        self.first_row_index = 0;
        self.loaded.clear();
        self.at_start = true;
        self.at_end = false;
        self.max_seen_end = 0;
        self.permalink_id = None;
        self.permalink_not_found = false;
    }

    /// Anchors the initial position to a specific row id; cleared (and
    /// re-evaluated) on the next `apply_page` (§4.7).
    pub fn set_permalink(&mut self, id: Id) {
        self.permalink_id = Some(id);
        self.permalink_not_found = false;
    }
}

impl<Id: PartialEq, Params: PartialEq> WindowManager<Id, Params> {
    /// Resets all state (rows, anchors, total, permalink) when
    /// `params` differs from the currently held one (§4.7).
    pub fn set_context(&mut self, params: Params) {
        if self.params.as_ref() != Some(&params) {
            self.reset();
            self.params = Some(params);
        }
    }
}

impl<Id: PartialEq, Params> WindowManager<Id, Params> {
    /// Records a freshly fetched page as the new loaded range.
    ///
    /// A permalink is declared not-found only once both edges have been
    /// reached without ever seeing it — a single page missing the target
    /// id doesn't yet mean it isn't in the list.
    pub fn apply_page(&mut self, first_row_index: usize, ids: Vec<Id>, at_start: bool, at_end: bool) {
        let observed_end = first_row_index + ids.len();
        self.max_seen_end = self.max_seen_end.max(observed_end);
        self.first_row_index = first_row_index;
        self.at_start = at_start;
        self.at_end = at_end;

        if let Some(target) = &self.permalink_id {
            if ids.iter().any(|id| id == target) {
                self.permalink_not_found = false;
            } else if at_start && at_end {
                self.permalink_not_found = true;
            }
        }

        self.loaded = ids;
    }
}
