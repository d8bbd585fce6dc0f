//! Tournament pricing. The discount rule is a pure function so payment
//! creation never embeds pricing policy.

/// Final amount after a percentage discount, rounded half-up to the
/// nearest whole unit. Discounts outside 0..=100 are clamped.
pub fn final_amount(price: i64, discount_percent: i64) -> i64 {
    let discount = discount_percent.clamp(0, 100);
    let discounted = price as f64 * (1.0 - discount as f64 / 100.0);
    discounted.round() as i64
}
