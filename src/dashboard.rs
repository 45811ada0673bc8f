use std::time::{Duration, Instant};

use crate::models::{CatalogEntry, Tab};
use crate::search::FuzzyIndex;

/// Grid cell width the paginator sizes against, from the original layout.
pub const ITEM_WIDTH: f32 = 154.0;
pub const ROWS_PER_SCREEN: usize = 10;
pub const SEARCH_SETTLE: Duration = Duration::from_millis(300);
pub const ALL_CATEGORIES: &str = "all";

/// Page size tracks the viewport: columns that fit × rows per screen.
/// Degenerate widths still yield one column so the page size stays positive.
pub fn page_size_for_width(width: f32) -> usize {
    let columns = (width / ITEM_WIDTH).floor().max(1.0) as usize;
    columns * ROWS_PER_SCREEN
}

/// Read-only snapshot of the active catalog handed in by the caller. The
/// generation changes whenever the catalog is replaced wholesale.
#[derive(Clone, Copy)]
pub struct CatalogRef<'a> {
    pub entries: &'a [CatalogEntry],
    pub generation: u64,
}

impl<'a> CatalogRef<'a> {
    pub fn new(entries: &'a [CatalogEntry], generation: u64) -> Self {
        Self { entries, generation }
    }
}

/// The whole browse view state as one value; every transition goes through
/// [`reduce`] and replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseState {
    pub tab: Tab,
    pub category: String,
    /// Raw text in the search box, not yet settled.
    pub search_input: String,
    /// Settled query actually feeding the pipeline.
    pub query: String,
    pub page: usize,
    pub page_size: usize,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self {
            tab: Tab::Movies,
            category: ALL_CATEGORIES.to_string(),
            search_input: String::new(),
            query: String::new(),
            page: 1,
            page_size: ROWS_PER_SCREEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BrowseEvent {
    TabSwitched(Tab),
    CategoryChanged(String),
    /// A keystroke in the search box; only starts the settle timer.
    SearchEdited(String),
    /// A query that survived the settle delay.
    QuerySettled(String),
    PageChanged(usize),
    ViewportResized(f32),
    CatalogReplaced,
}

pub fn reduce(state: &BrowseState, event: &BrowseEvent) -> BrowseState {
    let mut next = state.clone();
    match event {
        BrowseEvent::TabSwitched(tab) => {
            next.tab = *tab;
            next.search_input.clear();
            next.query.clear();
            next.category = ALL_CATEGORIES.to_string();
            next.page = 1;
        }
        BrowseEvent::CategoryChanged(category) => {
            next.category = category.clone();
            next.search_input.clear();
            next.query.clear();
            next.page = 1;
        }
        BrowseEvent::SearchEdited(text) => {
            next.search_input = text.clone();
        }
        BrowseEvent::QuerySettled(query) => {
            next.query = query.clone();
            next.page = 1;
        }
        BrowseEvent::PageChanged(page) => {
            next.page = (*page).max(1);
        }
        BrowseEvent::ViewportResized(width) => {
            next.page_size = page_size_for_width(*width);
        }
        BrowseEvent::CatalogReplaced => {
            next.page = 1;
        }
    }
    next
}

/// Category filter over indices into the catalog; `"all"` is a no-op.
pub fn filter_by_category(
    entries: &[CatalogEntry],
    indices: Vec<usize>,
    category: &str,
) -> Vec<usize> {
    if category == ALL_CATEGORIES {
        return indices;
    }
    indices
        .into_iter()
        .filter(|&i| entries.get(i).map(|e| e.category_id == category).unwrap_or(false))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageView<T> {
    pub items: Vec<T>,
    /// Page actually shown after clamping.
    pub page: usize,
    pub pages: usize,
    pub has_more: bool,
}

impl<T> PageView<T> {
    pub fn empty() -> Self {
        Self { items: Vec::new(), page: 1, pages: 0, has_more: false }
    }
}

/// Window `[(page-1)*size, min(page*size, len))` over the result set.
/// The page is clamped so the window start never exceeds the result length,
/// and a one-element result is returned whole regardless of page number.
pub fn paginate<T: Clone>(result: &[T], page: usize, page_size: usize) -> PageView<T> {
    let len = result.len();
    let size = page_size.max(1);
    if len == 0 {
        return PageView::empty();
    }
    let pages = len.div_ceil(size);
    let mut page = page.max(1);
    if (page - 1) * size >= len {
        page = pages;
    }
    if len == 1 {
        return PageView { items: result.to_vec(), page, pages, has_more: false };
    }
    let start = (page - 1) * size;
    let end = (page * size).min(len);
    PageView {
        items: result[start..end].to_vec(),
        page,
        pages,
        has_more: end != len,
    }
}

/// Settle timer for search input: every keystroke replaces the pending
/// deadline, so only the last value of a burst propagates downstream.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn push(&mut self, value: String, now: Instant) {
        self.pending = Some((value, now + SEARCH_SETTLE));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the settled value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Computing,
    Rendered,
}

/// Orchestrates search → filter → paginate over the active catalog and keeps
/// the fuzzy index cached per catalog generation.
pub struct Dashboard {
    pub state: BrowseState,
    phase: Phase,
    debounce: Debouncer,
    index: Option<(u64, FuzzyIndex)>,
    view: PageView<usize>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            state: BrowseState::default(),
            phase: Phase::Idle,
            debounce: Debouncer::default(),
            index: None,
            view: PageView::empty(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Indices into the catalog for the page currently shown.
    pub fn view(&self) -> &PageView<usize> {
        &self.view
    }

    pub fn search_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// A non-empty settled query with nothing to show.
    pub fn no_results(&self) -> bool {
        self.view.items.is_empty() && !self.state.query.trim().is_empty()
    }

    /// Raw keystroke: restart the settle timer; nothing recomputes yet.
    pub fn edit_search(&mut self, text: String, now: Instant) {
        self.state = reduce(&self.state, &BrowseEvent::SearchEdited(text.clone()));
        self.debounce.push(text, now);
    }

    /// Drive the settle timer. Returns true when a query settled and the
    /// view was recomputed.
    pub fn tick(&mut self, catalog: CatalogRef<'_>, now: Instant) -> bool {
        if let Some(query) = self.debounce.poll(now) {
            self.apply(catalog, BrowseEvent::QuerySettled(query));
            true
        } else {
            false
        }
    }

    pub fn apply(&mut self, catalog: CatalogRef<'_>, event: BrowseEvent) {
        if matches!(
            event,
            BrowseEvent::TabSwitched(_) | BrowseEvent::CategoryChanged(_)
        ) {
            self.debounce.cancel();
        }
        self.state = reduce(&self.state, &event);
        self.recompute(catalog);
    }

    fn recompute(&mut self, catalog: CatalogRef<'_>) {
        self.phase = Phase::Computing;
        if self
            .index
            .as_ref()
            .map_or(true, |(generation, _)| *generation != catalog.generation)
        {
            self.index = Some((catalog.generation, FuzzyIndex::build(catalog.entries)));
        }
        let index = match &self.index {
            Some((_, index)) => index,
            None => return,
        };
        let matched = index.query(&self.state.query);
        let filtered = filter_by_category(catalog.entries, matched, &self.state.category);
        self.view = paginate(&filtered, self.state.page, self.state.page_size);
        self.state.page = self.view.page;
        self.phase = Phase::Rendered;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str, category: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.into(),
            name: name.into(),
            category_id: category.into(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<CatalogEntry> {
        vec![
            entry("1", "Alpha", "A"),
            entry("2", "Beta", "B"),
            entry("3", "Gamma", "A"),
        ]
    }

    #[test]
    fn page_size_follows_viewport_width() {
        assert_eq!(page_size_for_width(1540.0), 100);
        assert_eq!(page_size_for_width(308.0), 20);
        // narrower than one column still yields a positive page size
        assert_eq!(page_size_for_width(10.0), ROWS_PER_SCREEN);
        assert_eq!(page_size_for_width(0.0), ROWS_PER_SCREEN);
    }

    #[test]
    fn reduce_tab_switch_resets_search_category_page() {
        let state = BrowseState {
            category: "B".into(),
            search_input: "alp".into(),
            query: "alp".into(),
            page: 3,
            ..Default::default()
        };
        let next = reduce(&state, &BrowseEvent::TabSwitched(Tab::Series));
        assert_eq!(next.tab, Tab::Series);
        assert_eq!(next.category, ALL_CATEGORIES);
        assert!(next.search_input.is_empty());
        assert!(next.query.is_empty());
        assert_eq!(next.page, 1);
    }

    #[test]
    fn reduce_category_change_clears_search_and_resets_page() {
        let state = BrowseState {
            search_input: "alp".into(),
            query: "alp".into(),
            page: 2,
            ..Default::default()
        };
        let next = reduce(&state, &BrowseEvent::CategoryChanged("B".into()));
        assert_eq!(next.category, "B");
        assert!(next.search_input.is_empty());
        assert!(next.query.is_empty());
        assert_eq!(next.page, 1);
    }

    #[test]
    fn reduce_is_pure() {
        let state = BrowseState::default();
        let event = BrowseEvent::PageChanged(4);
        let a = reduce(&state, &event);
        let b = reduce(&state, &event);
        assert_eq!(a, b);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn reduce_settled_query_resets_page() {
        let state = BrowseState { page: 5, ..Default::default() };
        let next = reduce(&state, &BrowseEvent::QuerySettled("alpha".into()));
        assert_eq!(next.query, "alpha");
        assert_eq!(next.page, 1);
    }

    #[test]
    fn filter_all_is_identity() {
        let catalog = sample();
        let indices = vec![0, 1, 2];
        assert_eq!(
            filter_by_category(&catalog, indices.clone(), ALL_CATEGORIES),
            indices
        );
    }

    #[test]
    fn filter_keeps_only_matching_category() {
        let catalog = sample();
        let filtered = filter_by_category(&catalog, vec![0, 1, 2], "A");
        assert_eq!(filtered, vec![0, 2]);
        for &i in &filtered {
            assert_eq!(catalog[i].category_id, "A");
        }
    }

    #[test]
    fn paginate_respects_page_size() {
        let data: Vec<u32> = (0..25).collect();
        let view = paginate(&data, 1, 10);
        assert_eq!(view.items.len(), 10);
        assert_eq!(view.pages, 3);
        assert!(view.has_more);
        let last = paginate(&data, 3, 10);
        assert_eq!(last.items, (20..25).collect::<Vec<_>>());
        assert!(!last.has_more);
    }

    #[test]
    fn paginate_middle_window_signals_more() {
        let data = ["x", "y", "z"];
        let view = paginate(&data, 2, 1);
        assert_eq!(view.items, vec!["y"]);
        assert!(view.has_more, "end index 2 != length 3");
    }

    #[test]
    fn paginate_singleton_ignores_page_number() {
        let data = ["only"];
        let view = paginate(&data, 9, 5);
        assert_eq!(view.items, vec!["only"]);
        assert!(!view.has_more);
    }

    #[test]
    fn paginate_clamps_page_overflow() {
        let data: Vec<u32> = (0..10).collect();
        let view = paginate(&data, 99, 4);
        assert_eq!(view.page, 3);
        assert_eq!(view.items, vec![8, 9]);
        assert!(!view.has_more);
    }

    #[test]
    fn paginate_empty_result() {
        let view = paginate::<u32>(&[], 1, 10);
        assert!(view.items.is_empty());
        assert_eq!(view.pages, 0);
        assert!(!view.has_more);
    }

    #[test]
    fn debouncer_fires_only_after_settle() {
        let mut debounce = Debouncer::default();
        let start = Instant::now();
        debounce.push("al".into(), start);
        assert_eq!(debounce.poll(start + Duration::from_millis(100)), None);
        assert_eq!(
            debounce.poll(start + SEARCH_SETTLE),
            Some("al".to_string())
        );
        assert!(!debounce.is_pending());
    }

    #[test]
    fn debouncer_keystroke_supersedes_pending() {
        let mut debounce = Debouncer::default();
        let start = Instant::now();
        debounce.push("al".into(), start);
        let later = start + Duration::from_millis(200);
        debounce.push("alp".into(), later);
        // the first deadline has passed but was superseded
        assert_eq!(debounce.poll(start + SEARCH_SETTLE), None);
        assert_eq!(
            debounce.poll(later + SEARCH_SETTLE),
            Some("alp".to_string())
        );
    }

    #[test]
    fn debouncer_cancel_drops_pending() {
        let mut debounce = Debouncer::default();
        let start = Instant::now();
        debounce.push("al".into(), start);
        debounce.cancel();
        assert_eq!(debounce.poll(start + SEARCH_SETTLE), None);
    }

    #[test]
    fn pipeline_fuzzy_search_scenario() {
        let catalog = sample();
        let mut dash = Dashboard::new();
        let cat = CatalogRef::new(&catalog, 1);
        dash.apply(cat, BrowseEvent::QuerySettled("alph".into()));
        assert_eq!(dash.phase(), Phase::Rendered);
        let shown: Vec<&str> = dash.view().items.iter().map(|&i| catalog[i].id.as_str()).collect();
        assert!(shown.contains(&"1"), "fuzzy match must include Alpha");
        assert!(!shown.contains(&"2"), "Beta must be excluded");
    }

    #[test]
    fn pipeline_category_with_empty_query() {
        let catalog = sample();
        let mut dash = Dashboard::new();
        let cat = CatalogRef::new(&catalog, 1);
        dash.apply(cat, BrowseEvent::CategoryChanged("B".into()));
        let shown: Vec<&str> = dash.view().items.iter().map(|&i| catalog[i].id.as_str()).collect();
        assert_eq!(shown, vec!["2"]);
    }

    #[test]
    fn pipeline_recompute_is_idempotent() {
        let catalog = sample();
        let mut dash = Dashboard::new();
        let cat = CatalogRef::new(&catalog, 1);
        dash.apply(cat, BrowseEvent::QuerySettled("alpha".into()));
        let first = dash.view().clone();
        dash.apply(cat, BrowseEvent::QuerySettled("alpha".into()));
        assert_eq!(*dash.view(), first);
    }

    #[test]
    fn pipeline_tab_switch_resets_everything() {
        let catalog = sample();
        let mut dash = Dashboard::new();
        let cat = CatalogRef::new(&catalog, 1);
        dash.edit_search("alp".into(), Instant::now());
        dash.apply(cat, BrowseEvent::PageChanged(2));
        dash.apply(cat, BrowseEvent::TabSwitched(Tab::Series));
        assert_eq!(dash.state.page, 1);
        assert!(dash.state.search_input.is_empty());
        assert!(dash.state.query.is_empty());
        assert!(!dash.search_pending(), "pending settle timer must be cancelled");
    }

    #[test]
    fn pipeline_rebuilds_index_on_generation_change() {
        let old = sample();
        let mut dash = Dashboard::new();
        dash.apply(CatalogRef::new(&old, 1), BrowseEvent::QuerySettled("gamma".into()));
        assert_eq!(dash.view().items, vec![2]);

        let fresh = vec![entry("9", "Gamma Ray", "C")];
        dash.apply(CatalogRef::new(&fresh, 2), BrowseEvent::CatalogReplaced);
        dash.apply(CatalogRef::new(&fresh, 2), BrowseEvent::QuerySettled("gamma".into()));
        assert_eq!(dash.view().items, vec![0]);
    }

    #[test]
    fn no_results_only_with_nonempty_query() {
        let catalog = sample();
        let mut dash = Dashboard::new();
        let cat = CatalogRef::new(&catalog, 1);
        dash.apply(cat, BrowseEvent::QuerySettled("zzzz".into()));
        assert!(dash.no_results());
        dash.apply(cat, BrowseEvent::QuerySettled(String::new()));
        assert!(!dash.no_results());
    }

    #[test]
    fn debounced_edit_settles_through_tick() {
        let catalog = sample();
        let mut dash = Dashboard::new();
        let cat = CatalogRef::new(&catalog, 1);
        let start = Instant::now();
        dash.edit_search("alph".into(), start);
        assert!(!dash.tick(cat, start + Duration::from_millis(100)));
        assert!(dash.tick(cat, start + SEARCH_SETTLE));
        assert_eq!(dash.state.query, "alph");
        assert!(dash.view().items.contains(&0));
    }
}
