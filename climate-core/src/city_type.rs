use crate::model::City;

/// Classification for well-known cities, matched case-insensitively.
///
/// Unrecognized names yield `None`, in which case the stored type stays.
pub fn resolve_city_type(name: &str) -> Option<&'static str> {
    match name.trim().to_lowercase().as_str() {
        "москва" | "moscow" | "санкт-петербург" | "saint petersburg" | "st. petersburg" => {
            Some("Large")
        }
        "новосибирск" | "novosibirsk" | "екатеринбург" | "yekaterinburg" => Some("Medium"),
        _ => None,
    }
}

/// Type to display for `city`: the resolved classification, else the stored one.
pub fn effective_city_type(city: &City) -> String {
    resolve_city_type(&city.name).map_or_else(|| city.city_type.clone(), str::to_string)
}
