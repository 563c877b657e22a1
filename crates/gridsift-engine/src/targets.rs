//! Locator strategy tables for every logical UI target.
//!
//! This is the one place that knows what the target application's DOM looks
//! like. Everything here is data: when a release renames a class or moves a
//! control, append a strategy to the relevant table and the rest of the
//! engine is untouched. Earlier entries are more specific and cheaper;
//! script strategies come last and exist for the days when every structural
//! assumption has drifted.

use gridsift_page::{Query, QuerySpec};

/// Data rows of the issue table, across the table variants the host
/// application renders (classic `<table>`, responsive list, grid).
pub const TABLE_ROWS: QuerySpec = QuerySpec::new(
    "table-rows",
    &[
        Query::Css("table[role='grid'] tbody tr:not(.header-row)"),
        Query::Css("[role='row']:not([data-header]):not(.header-row)"),
        Query::Css("ul.item-list > li.list-item"),
        Query::Css("[class*='ListItem']:not([class*='Header'])"),
        Query::Script(
            "Array.from(document.querySelectorAll('tr, li, [role=\"row\"]'))\
             .filter(function (el) {\
                 return el.innerText && el.innerText.trim().length > 0\
                     && !/header/i.test(el.className)\
                     && el.closest('[role=\"grid\"], table, ul, [class*=\"List\"]');\
             })",
        ),
    ],
);

/// Ancestor test used to tell in-row controls from table-level ones.
pub const ROW_ANCESTOR: Query = Query::Css("[role='row'], tr, li.list-item");

/// The header row, when the current variant renders one.
pub const HEADER_ROW: QuerySpec = QuerySpec::new(
    "header-row",
    &[
        Query::Css("table[role='grid'] thead tr"),
        Query::Css("[role='row'][data-header], tr.header-row"),
        Query::Css("[class*='HeaderRow']"),
    ],
);

/// Header cells, scoped to the resolved header row.
pub const HEADER_CELLS: QuerySpec = QuerySpec::new(
    "header-cells",
    &[
        Query::Css("th"),
        Query::Css("[role='columnheader']"),
        Query::Css("[class*='HeaderCell']"),
    ],
);

/// Cell segmentation ladder, scoped to one data row. Tried in priority
/// order by the extractor; the final fallback (splitting row text into
/// pseudo-cells) lives in code because it produces strings, not handles.
pub const CELL_LADDER: &[QuerySpec] = &[
    QuerySpec::new("cells-role", &[Query::Css("td, [role='gridcell']")]),
    QuerySpec::new("cells-class", &[Query::Css("[class*='cell'], [class*='Cell']")]),
    QuerySpec::new("cells-children", &[Query::Css(":scope > div, :scope > span")]),
];

/// Tab control that switches the work area to the issue list.
pub const DATA_TAB: QuerySpec = QuerySpec::new(
    "data-tab",
    &[
        Query::TextContains {
            selector: "[role='tab']",
            needle: "Issues",
        },
        Query::TextContains {
            selector: "a, li, div[class*='Tab']",
            needle: "Issues",
        },
        Query::Script(
            "Array.from(document.querySelectorAll('[role=\"tab\"]'))\
             .filter(function (el) { return /issues/i.test(el.innerText); })",
        ),
    ],
);

/// Caption carrying the authoritative row count, e.g. `Issues (137)`.
pub const COUNT_CAPTION: QuerySpec = QuerySpec::new(
    "count-caption",
    &[
        Query::TextContains {
            selector: "[role='heading'], h1, h2, h3, div[class*='Title']",
            needle: "(",
        },
        Query::Css("[class*='TabCount'], [class*='ItemCount']"),
    ],
);

/// Table-level "show more" control. Strategies deliberately match anywhere;
/// the convergence loop excludes candidates nested inside a row, because an
/// in-row "show more" expands row content, not the data set.
pub const SHOW_MORE: QuerySpec = QuerySpec::new(
    "show-more",
    &[
        Query::Css("[class*='ShowMore'], [class*='LoadMore']"),
        Query::TextContains {
            selector: "button, a",
            needle: "More",
        },
    ],
);

/// Next-page control for the paginated table variant.
pub const NEXT_PAGE: QuerySpec = QuerySpec::new(
    "next-page",
    &[
        Query::Css("[class*='Paginator'] button[aria-label*='Next']"),
        Query::Css("button[aria-label*='Next'], a[aria-label*='Next']"),
        Query::TextContains {
            selector: "button, a",
            needle: "Next",
        },
    ],
);

/// Nested scrollable containers that virtualize the table body.
pub const SCROLL_CONTAINERS: QuerySpec = QuerySpec::new(
    "scroll-containers",
    &[
        Query::Css("[class*='ScrollContainer'], [class*='scroll-container']"),
        Query::Script(
            "Array.from(document.querySelectorAll('div'))\
             .filter(function (el) { return el.scrollHeight > el.clientHeight + 16; })",
        ),
    ],
);

/// Settings (gear) control opening the view-configuration dialog.
pub const SETTINGS_BUTTON: QuerySpec = QuerySpec::new(
    "settings-button",
    &[
        Query::Css("button[aria-label*='Settings'], button[title*='Settings']"),
        Query::Css("[class*='settings'] button, button[class*='Settings']"),
    ],
);

/// "Select Columns" tab inside the settings dialog.
pub const SELECT_COLUMNS_TAB: QuerySpec = QuerySpec::new(
    "select-columns-tab",
    &[
        Query::TextContains {
            selector: "[role='dialog'] [role='tab'], [role='dialog'] button",
            needle: "Column",
        },
        Query::Css("[role='dialog'] [aria-label*='Column']"),
    ],
);

/// Select-all checkbox in the column chooser.
pub const SELECT_ALL_CHECKBOX: QuerySpec = QuerySpec::new(
    "select-all-checkbox",
    &[
        Query::Css("[role='dialog'] thead [role='checkbox'], [role='dialog'] th input[type='checkbox']"),
        Query::Css("[role='dialog'] [aria-label*='Select All']"),
    ],
);

/// Confirm/OK button closing the settings dialog.
pub const CONFIRM_BUTTON: QuerySpec = QuerySpec::new(
    "confirm-button",
    &[
        Query::TextContains {
            selector: "[role='dialog'] button",
            needle: "OK",
        },
        Query::TextContains {
            selector: "[role='dialog'] button",
            needle: "Confirm",
        },
    ],
);

/// Colored priority badges: class fragment → canonical priority. Used when
/// the priority cell carries an icon instead of text.
pub const PRIORITY_BADGES: &[(&str, &str)] = &[
    ("negative", "Very High"),
    ("critical", "High"),
    ("neutral", "Medium"),
    ("positive", "Low"),
];

/// Script forcing the host framework to flush pending renders; last-ditch
/// recovery when the row count stagnates below target.
pub const FORCE_RERENDER: &str =
    "window.dispatchEvent(new Event('resize')); \
     document.body && document.body.offsetHeight;";
