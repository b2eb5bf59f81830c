use rust_decimal::Decimal;

use super::{ValidationError, ValidationResult};

pub const MAX_DISH_NAME_LENGTH: usize = 200;
pub const MAX_DISH_DESCRIPTION_LENGTH: usize = 1000;

/// Validate a dish name: non-empty, bounded, printable
pub fn validate_dish_name(name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "name".to_string(),
        });
    }

    if trimmed.len() > MAX_DISH_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max_length: MAX_DISH_NAME_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            value: trimmed.to_string(),
            reason: "Control characters are not allowed".to_string(),
        });
    }

    Ok(())
}

/// Validate a dish description length
pub fn validate_dish_description(description: &str) -> ValidationResult<()> {
    if description.trim().is_empty() {
        return Err(ValidationError::RequiredField {
            field: "description".to_string(),
        });
    }

    if description.len() > MAX_DISH_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max_length: MAX_DISH_DESCRIPTION_LENGTH,
            actual_length: description.len(),
        });
    }

    Ok(())
}

/// Validate a dish price: 0.01 ..= 9999.99, at most two decimal places
pub fn validate_dish_price(price: &Decimal) -> ValidationResult<()> {
    let min_price = Decimal::new(1, 2); // 0.01
    let max_price = Decimal::new(999_999, 2); // 9999.99

    if *price < min_price || *price > max_price {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: min_price.to_string(),
            max: max_price.to_string(),
            value: price.to_string(),
        });
    }

    if price.scale() > 2 {
        return Err(ValidationError::InvalidValue {
            field: "price".to_string(),
            value: price.to_string(),
            reason: "At most two decimal places are allowed".to_string(),
        });
    }

    Ok(())
}
