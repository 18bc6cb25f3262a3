use crate::error::ValidationError;

/// Compute the reporting period immediately before `period` for the given
/// `periodicity`.
///
/// `period` is `YYYYMM`; `periodicity` is the number of months between
/// reporting periods (`"01"` monthly, `"03"` quarterly, `"12"` annual).
pub fn calculate_adjacent_period(period: &str, periodicity: &str) -> Result<String, ValidationError> {
    let invalid_period = || ValidationError::InvalidValue {
        field: "period".to_string(),
        reason: format!("'{}' is not a YYYYMM period", period),
    };

    if period.len() != 6 || !period.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_period());
    }
    let year: i32 = period[..4].parse().map_err(|_| invalid_period())?;
    let month: i32 = period[4..].parse().map_err(|_| invalid_period())?;
    if year < 1 || !(1..=12).contains(&month) {
        return Err(invalid_period());
    }

    let step = periodicity
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|step| (1..=12).contains(step))
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "periodicity".to_string(),
            reason: format!("'{}' is not a number of months between 1 and 12", periodicity),
        })?;

    let (mut year, mut month) = (year, month - step);
    if month <= 0 {
        month += 12;
        year -= 1;
    }

    Ok(format!("{:04}{:02}", year, month))
}

#[cfg(test)]
mod test {
    use super::calculate_adjacent_period;

    #[test]
    fn test_adjacent_period() {
        assert_eq!(calculate_adjacent_period("201809", "03").unwrap(), "201806");
        assert_eq!(calculate_adjacent_period("201809", "01").unwrap(), "201808");
        assert_eq!(calculate_adjacent_period("201803", "03").unwrap(), "201712");
        assert_eq!(calculate_adjacent_period("201901", "12").unwrap(), "201801");
        assert_eq!(calculate_adjacent_period("201812", "12").unwrap(), "201712");
        assert_eq!(calculate_adjacent_period("201801", "1").unwrap(), "201712");
    }

    #[test]
    fn test_adjacent_period_rejects_bad_input() {
        assert!(calculate_adjacent_period("2018-09", "03").is_err());
        assert!(calculate_adjacent_period("201813", "03").is_err());
        assert!(calculate_adjacent_period("201800", "03").is_err());
        assert!(calculate_adjacent_period("201809", "00").is_err());
        assert!(calculate_adjacent_period("201809", "13").is_err());
        assert!(calculate_adjacent_period("201809", "quarterly").is_err());
    }
}
