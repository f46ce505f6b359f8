//! Field rules shared by the HTTP layer and the sheet reconciliation path.

use rust_decimal::Decimal;

use crate::CoreError;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;
pub const MAX_NAME_LEN: usize = 200;
/// Fractional digits kept by `products.price NUMERIC(12, 2)`.
pub const PRICE_SCALE: u32 = 2;
/// Largest value `NUMERIC(12, 2)` holds.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Ratings are whole stars from 1 to 5.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRating`] when outside `1..=5`.
pub fn validate_rating(rating: i16) -> Result<i16, CoreError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(CoreError::InvalidRating(rating))
    }
}

/// Prices must fit the datastore column exactly: no rounding happens on write.
///
/// # Errors
///
/// Returns [`CoreError::NegativePrice`] for prices below zero and
/// [`CoreError::PriceOutOfRange`] for prices above [`MAX_PRICE`] or with more
/// than two significant decimal places.
pub fn validate_price(price: Decimal) -> Result<Decimal, CoreError> {
    if price < Decimal::ZERO {
        return Err(CoreError::NegativePrice(price));
    }
    if price > MAX_PRICE || price.normalize().scale() > PRICE_SCALE {
        return Err(CoreError::PriceOutOfRange(price));
    }
    Ok(price)
}

/// # Errors
///
/// Returns [`CoreError::NegativeStock`] for stock below zero.
pub fn validate_stock(stock: i32) -> Result<i32, CoreError> {
    if stock < 0 {
        Err(CoreError::NegativeStock(stock))
    } else {
        Ok(stock)
    }
}

/// Trims a display name and checks its length.
///
/// # Errors
///
/// Returns [`CoreError::InvalidName`] when the trimmed name is empty or too long.
pub fn normalize_name(field: &'static str, raw: &str) -> Result<String, CoreError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::InvalidName {
            field,
            max: MAX_NAME_LEN,
        });
    }
    Ok(name.to_owned())
}
