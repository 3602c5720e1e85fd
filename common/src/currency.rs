/// Display symbol of the store's (implicit) currency.
pub const RUPEE: &str = "₹";

/// Format a price for display: whole amounts without decimals, otherwise two.
pub fn format_price(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{RUPEE}{amount:.0}")
    } else {
        format!("{RUPEE}{amount:.2}")
    }
}

/// Format a rating with at most one decimal, dropping a trailing `.0`.
pub fn format_rating(rating: f64) -> String {
    let rounded = (rating * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}
