use super::cache::CachedPlace;
use crate::config::GeocodeConfig;

/// Stored when the provider returned a place without a country.
pub const UNKNOWN_COUNTRY: &str = "Unknown Country";

/// Short codes used in "City, CODE" names.
pub fn country_code(country: &str) -> &str {
    match country {
        "United States" => "USA",
        "United Kingdom" => "UK",
        "Australia" => "AUS",
        "Canada" => "CAN",
        "Germany" => "DEU",
        "France" => "FRA",
        "Italy" => "ITA",
        "Spain" => "ESP",
        other => other,
    }
}

/// Pick the name shown for a place, biased by the user's home country.
///
/// At home the city alone is enough. Abroad the country is shown, except for
/// well-known cities and large countries where "City, CODE" disambiguates.
pub fn display_name(place: &CachedPlace, home_country: Option<&str>, config: &GeocodeConfig) -> String {
    let CachedPlace { city, country } = place;

    if country == UNKNOWN_COUNTRY {
        return city.clone();
    }
    if home_country.is_some_and(|home| home.trim().eq_ignore_ascii_case(country)) {
        return city.clone();
    }

    let well_known = config.well_known_cities.iter().any(|c| c == city);
    let large_country = config.disambiguate_countries.iter().any(|c| c == country);
    if (well_known || large_country) && city != country {
        return format!("{}, {}", city, country_code(country));
    }

    country.clone()
}
