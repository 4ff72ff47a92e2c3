//! Scan code to 13-digit PLU conversion.
//!
//! Store scan guns report short PLUs; the catalog wants the full 13-digit
//! code: the PLU left-padded to 12 digits plus the EAN-13 check digit.

use crate::error::BarcodeError;

/// Left-pad a scan code to 12 digits.
pub fn pad_to_12(code: &str) -> Result<String, BarcodeError> {
    let code = code.trim();
    if !code.chars().all(|c| c.is_ascii_digit()) || code.is_empty() {
        return Err(BarcodeError::NonDigit(code.to_string()));
    }
    if code.len() > 12 {
        return Err(BarcodeError::TooLong(code.to_string()));
    }
    Ok(format!("{:0>12}", code))
}

/// EAN-13 check digit for a 12-digit code: digits at even 0-based
/// positions weigh 1, odd positions weigh 3, check = (10 - sum mod 10)
/// mod 10.
pub fn check_digit(code12: &str) -> Result<u32, BarcodeError> {
    if code12.len() != 12 || !code12.chars().all(|c| c.is_ascii_digit()) {
        return Err(BarcodeError::NonDigit(code12.to_string()));
    }
    let sum: u32 = code12
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let d = c.to_digit(10).unwrap_or(0);
            if i % 2 == 0 {
                d
            } else {
                d * 3
            }
        })
        .sum();
    Ok((10 - sum % 10) % 10)
}

/// Convert a scan code to its 13-digit form.
pub fn to_ean13(code: &str) -> Result<String, BarcodeError> {
    let padded = pad_to_12(code)?;
    let check = check_digit(&padded)?;
    Ok(format!("{padded}{check}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_to_12() {
        assert_eq!(pad_to_12("4011").unwrap(), "000000004011");
        assert_eq!(pad_to_12("400638133393").unwrap(), "400638133393");
    }

    #[test]
    fn test_pad_rejects_bad_input() {
        assert!(matches!(pad_to_12("40a1"), Err(BarcodeError::NonDigit(_))));
        assert!(matches!(pad_to_12(""), Err(BarcodeError::NonDigit(_))));
        assert!(matches!(
            pad_to_12("4006381333931"),
            Err(BarcodeError::TooLong(_))
        ));
    }

    #[test]
    fn test_check_digit_known_codes() {
        assert_eq!(check_digit("400638133393").unwrap(), 1);
        assert_eq!(check_digit("003600029145").unwrap(), 2);
        assert_eq!(check_digit("000000000000").unwrap(), 0);
    }

    #[test]
    fn test_to_ean13() {
        assert_eq!(to_ean13("400638133393").unwrap(), "4006381333931");
        assert_eq!(to_ean13("3600029145").unwrap(), "0036000291452");
    }
}
