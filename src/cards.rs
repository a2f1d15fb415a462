use crate::models::{Business, CardView, CARD_PREVIEW_PLACEHOLDER};

/// Stateless card projection: the name plus a one-line preview taken from
/// the first field's value, falling back to a placeholder when the list is
/// empty or the first value is blank.
pub fn card_for(business: &Business) -> CardView {
    let preview = business
        .fields
        .first()
        .map(|field| field.value.as_str())
        .filter(|value| !value.is_empty())
        .unwrap_or(CARD_PREVIEW_PLACEHOLDER)
        .to_string();
    CardView {
        id: business.id.clone(),
        name: business.name.clone(),
        preview,
    }
}

pub fn cards_for(businesses: &[Business]) -> Vec<CardView> {
    businesses.iter().map(card_for).collect()
}
