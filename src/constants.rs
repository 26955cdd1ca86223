pub mod limits {

    /// Lookup results kept per search.
    pub const MAX_LOOKUP_RESULTS: usize = 50;

    /// Options a single selection menu can show.
    pub const MAX_SELECT_OPTIONS: usize = 25;

    /// Candidates checked against the collection and the media library.
    pub const DEFAULT_EXISTENCE_CHECKS: usize = 10;

    pub const EXISTENCE_CHECK_CONCURRENCY: usize = 4;

    pub const OPTION_LABEL_CHARS: usize = 100;

    pub const OPTION_DESCRIPTION_CHARS: usize = 90;
}

pub mod tracking {
    use std::time::Duration;

    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

    pub const DEFAULT_MAX_ITERATIONS: u32 = 30;

    pub const DEFAULT_BAR_WIDTH: usize = 20;

    /// A series counts as complete at this share of episodes with files.
    pub const SERIES_DONE_PERCENT: f64 = 99.9;
}

pub mod glyphs {
    pub const BAR_FILLED: char = '█';
    pub const BAR_EMPTY: char = '░';
    /// Fills the bar when the percent is unknown.
    pub const BAR_UNKNOWN: char = '∙';
}

pub mod colors {

    pub const GREEN: u32 = 0x2e_cc71;

    pub const ORANGE: u32 = 0xf3_9c12;

    pub const GREY: u32 = 0x95_a5a6;

    pub const RED: u32 = 0xe7_4c3c;
}
