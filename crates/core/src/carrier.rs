//! Carrier guess from tracking-number shape.
//!
//! There is no carrier integration. The shape of the number is enough to pick
//! the usual public tracking page, and anything unrecognized is reported as
//! `Other` without a link.

use serde::Serialize;

/// Shipping carrier inferred from a tracking number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    pub name: &'static str,
    pub tracking_url: Option<String>,
}

impl Carrier {
    /// Guess the carrier for `tracking_number`.
    ///
    /// Returns `None` when there is no (non-blank) tracking number.
    ///
    /// ```
    /// use patient_dashboard_core::Carrier;
    ///
    /// let ups = Carrier::guess(Some("1Z999AA10123456784")).unwrap();
    /// assert_eq!(ups.name, "UPS");
    /// assert!(Carrier::guess(None).is_none());
    /// ```
    #[must_use]
    pub fn guess(tracking_number: Option<&str>) -> Option<Self> {
        let number = tracking_number.map(str::trim).filter(|n| !n.is_empty())?;
        let len = number.chars().count();

        let carrier = if number.starts_with("1Z") {
            Self::linked("UPS", "https://www.ups.com/track?tracknum=", number)
        } else if len == 12 || len == 15 {
            Self::linked("FedEx", "https://www.fedex.com/fedextrack/?trknbr=", number)
        } else if len == 22 || number.starts_with('9') {
            Self::linked(
                "USPS",
                "https://tools.usps.com/go/TrackConfirmAction?tLabels=",
                number,
            )
        } else {
            Self {
                name: "Other",
                tracking_url: None,
            }
        };

        Some(carrier)
    }

    fn linked(name: &'static str, base: &str, number: &str) -> Self {
        Self {
            name,
            tracking_url: Some(format!("{base}{number}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ups_prefix_wins_over_length() {
        // 12 characters, which would otherwise read as FedEx
        let carrier = Carrier::guess(Some("1Z1234567890")).unwrap();
        assert_eq!(carrier.name, "UPS");
        assert_eq!(
            carrier.tracking_url.as_deref(),
            Some("https://www.ups.com/track?tracknum=1Z1234567890")
        );
    }

    #[test]
    fn test_fedex_lengths() {
        assert_eq!(Carrier::guess(Some("123456789012")).unwrap().name, "FedEx");
        assert_eq!(
            Carrier::guess(Some("123456789012345")).unwrap().name,
            "FedEx"
        );
    }

    #[test]
    fn test_usps_by_length_or_leading_nine() {
        let by_length = Carrier::guess(Some("4201234567890123456789")).unwrap();
        assert_eq!(by_length.name, "USPS");

        let by_prefix = Carrier::guess(Some("9400111")).unwrap();
        assert_eq!(by_prefix.name, "USPS");
        assert_eq!(
            by_prefix.tracking_url.as_deref(),
            Some("https://tools.usps.com/go/TrackConfirmAction?tLabels=9400111")
        );
    }

    #[test]
    fn test_unrecognized_is_other_without_link() {
        let carrier = Carrier::guess(Some("ABC123")).unwrap();
        assert_eq!(carrier.name, "Other");
        assert_eq!(carrier.tracking_url, None);
    }

    #[test]
    fn test_missing_or_blank_number() {
        assert!(Carrier::guess(None).is_none());
        assert!(Carrier::guess(Some("   ")).is_none());
    }
}
