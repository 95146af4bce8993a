//! Category Catalog
//!
//! The fixed, closed set of UI presentation categories that content can be
//! classified into, plus the static similarity relation between them.
//!
//! # Design Philosophy
//!
//! The catalog is closed by construction: `Category` is a plain enum, so a
//! category outside the catalog cannot be expressed anywhere in the system.
//! Adding a category means updating this enum, [`Category::ALL`], and
//! [`Category::related`] together — there is no dynamic registration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A UI presentation category
///
/// Every classification, bandit arm, and selection result is one of these
/// values. The wire representation is the lowercase name (e.g. `"table"`),
/// matching the classify protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Plain text block
    Text,
    /// Tabular rows and columns
    Table,
    /// Chart (bar, line, etc.)
    Chart,
    /// Geographic map
    Map,
    /// Ordered or unordered list
    List,
    /// Input form
    Form,
    /// Summary card
    Card,
    /// Chronological timeline
    Timeline,
    /// Hierarchical tree
    Tree,
    /// Image gallery
    Gallery,
    /// Grid layout
    Grid,
    /// Tabbed panels
    Tabs,
    /// Collapsible accordion
    Accordion,
    /// Modal dialog
    Dialog,
    /// Node/edge graph
    Graph,
    /// Calendar view
    Calendar,
    /// Kanban board
    Kanban,
    /// Composite dashboard
    Dashboard,
    /// Rotating carousel
    Carousel,
    /// Step-by-step wizard
    Stepper,
    /// Star/score rating
    Rating,
    /// Status badge
    Badge,
    /// Progress indicator
    Progress,
    /// Loading skeleton
    Skeleton,
    /// Transient notification
    Notification,
}

impl Category {
    /// The complete catalog, in declaration order
    ///
    /// Used to initialize bandit state at startup and to enumerate the
    /// catalog in tests.
    pub const ALL: [Category; 25] = [
        Category::Text,
        Category::Table,
        Category::Chart,
        Category::Map,
        Category::List,
        Category::Form,
        Category::Card,
        Category::Timeline,
        Category::Tree,
        Category::Gallery,
        Category::Grid,
        Category::Tabs,
        Category::Accordion,
        Category::Dialog,
        Category::Graph,
        Category::Calendar,
        Category::Kanban,
        Category::Dashboard,
        Category::Carousel,
        Category::Stepper,
        Category::Rating,
        Category::Badge,
        Category::Progress,
        Category::Skeleton,
        Category::Notification,
    ];

    /// Categories considered similar to this one
    ///
    /// Widens the bandit's candidate set beyond a classifier's single
    /// suggestion. The relation is configuration data: it is symmetric in
    /// spirit but stored asymmetrically, and entries need not be mirrored.
    #[must_use]
    pub fn related(self) -> &'static [Category] {
        match self {
            Category::Text => &[Category::Card],
            Category::Table => &[Category::List, Category::Grid],
            Category::Chart => &[Category::Graph, Category::Dashboard],
            Category::List => &[Category::Table, Category::Tree],
            Category::Card => &[Category::Text, Category::Accordion],
            Category::Form => &[Category::Dialog],
            Category::Timeline => &[Category::Stepper],
            Category::Gallery => &[Category::Grid, Category::Carousel],
            Category::Tabs => &[Category::Accordion],
            Category::Map => &[Category::Dashboard],
            Category::Tree => &[Category::List],
            Category::Grid => &[Category::Table, Category::Gallery],
            Category::Accordion => &[Category::Tabs, Category::Card],
            Category::Dialog => &[Category::Form],
            Category::Graph => &[Category::Chart],
            Category::Calendar => &[Category::Timeline],
            Category::Kanban => &[Category::Dashboard],
            Category::Dashboard => &[Category::Chart, Category::Grid],
            Category::Carousel => &[Category::Gallery],
            Category::Stepper => &[Category::Timeline],
            Category::Rating => &[Category::Badge],
            Category::Badge => &[Category::Rating],
            Category::Progress => &[Category::Stepper],
            Category::Skeleton => &[Category::Text],
            Category::Notification => &[Category::Dialog],
        }
    }

    /// Lowercase name as used on the wire
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Category::Text => "text",
            Category::Table => "table",
            Category::Chart => "chart",
            Category::Map => "map",
            Category::List => "list",
            Category::Form => "form",
            Category::Card => "card",
            Category::Timeline => "timeline",
            Category::Tree => "tree",
            Category::Gallery => "gallery",
            Category::Grid => "grid",
            Category::Tabs => "tabs",
            Category::Accordion => "accordion",
            Category::Dialog => "dialog",
            Category::Graph => "graph",
            Category::Calendar => "calendar",
            Category::Kanban => "kanban",
            Category::Dashboard => "dashboard",
            Category::Carousel => "carousel",
            Category::Stepper => "stepper",
            Category::Rating => "rating",
            Category::Badge => "badge",
            Category::Progress => "progress",
            Category::Skeleton => "skeleton",
            Category::Notification => "notification",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
