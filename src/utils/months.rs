/// Three-letter month abbreviations, January first
const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Янв", "Фев", "Мар", "Апр", "Май", "Июн", "Июл", "Авг", "Сен", "Окт", "Ноя", "Дек",
];

/// Returned for anything outside 1..=12
pub const UNKNOWN_MONTH: &str = "???";

/// Month number (1-12) to its abbreviation
pub fn month_abbreviation(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_ABBREVIATIONS[(month - 1) as usize],
        _ => UNKNOWN_MONTH,
    }
}
