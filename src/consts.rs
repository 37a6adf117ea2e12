/// Indexed by `num_days_from_sunday`, as stored in scheduling and pricing rules.
pub const WEEKDAY_NAMES_PLURAL: [&str; 7] = [
    "Sundays",
    "Mondays",
    "Tuesdays",
    "Wednesdays",
    "Thursdays",
    "Fridays",
    "Saturdays",
];

pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

pub const DEFAULT_SERVICE_DURATION_MINUTES: i64 = 60;
