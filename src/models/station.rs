use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// An operating MRT station with its averaged map position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MrtStation {
    #[validate(length(min = 1))]
    pub name: String,

    pub code: String,

    pub opening: NaiveDate,

    #[validate(range(min = 1))]
    pub no_of_lines: u32,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_validation() {
        let station = MrtStation {
            name: "Jurong East".to_string(),
            code: "NS1 EW24".to_string(),
            opening: NaiveDate::from_ymd_opt(1988, 11, 5).unwrap(),
            no_of_lines: 2,
            latitude: 1.3331,
            longitude: 103.7422,
        };

        assert!(station.validate().is_ok());
    }

    #[test]
    fn test_station_without_lines_is_invalid() {
        let station = MrtStation {
            name: "Nowhere".to_string(),
            code: String::new(),
            opening: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            no_of_lines: 0,
            latitude: 1.3,
            longitude: 103.8,
        };

        assert!(station.validate().is_err());
    }
}
