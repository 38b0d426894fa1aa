use chrono::{DateTime, FixedOffset, Locale, Offset, Utc};

/// Renders trip titles as "<Month> <Year> • <location>".
#[derive(Debug, Clone, Copy)]
pub struct TitleGenerator {
    locale: Locale,
    offset: FixedOffset,
}

impl Default for TitleGenerator {
    fn default() -> Self {
        Self {
            locale: Locale::en_US,
            offset: Utc.fix(),
        }
    }
}

impl TitleGenerator {
    pub fn new(locale: Locale, offset: FixedOffset) -> Self {
        Self { locale, offset }
    }

    /// Localized "<Month> <Year>" for the given instant, in the generator's offset.
    pub fn month_year(&self, date: DateTime<Utc>) -> String {
        date.with_timezone(&self.offset)
            .format_localized("%B %Y", self.locale)
            .to_string()
    }

    pub fn title(&self, location_name: &str, start_date: DateTime<Utc>) -> String {
        format!("{} • {}", self.month_year(start_date), location_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_title_format() {
        let date = Utc.with_ymd_and_hms(2024, 7, 14, 10, 0, 0).unwrap();
        assert_eq!(TitleGenerator::default().title("Italy", date), "July 2024 • Italy");
    }

    #[test]
    fn test_offset_moves_month_boundary() {
        // 23:30 UTC on Jan 31 is already February in UTC+2
        let date = Utc.with_ymd_and_hms(2024, 1, 31, 23, 30, 0).unwrap();
        let utc = TitleGenerator::default();
        let east = TitleGenerator::new(Locale::en_US, FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(utc.month_year(date), "January 2024");
        assert_eq!(east.month_year(date), "February 2024");
    }

    #[test]
    fn test_localized_month() {
        let date = Utc.with_ymd_and_hms(2024, 7, 14, 10, 0, 0).unwrap();
        let french = TitleGenerator::new(Locale::fr_FR, Utc.fix());
        assert_eq!(french.title("Rome", date), "juillet 2024 • Rome");
    }
}
